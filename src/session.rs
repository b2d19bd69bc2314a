//! Session identifier sanitization.

/// Reduce an arbitrary caller-supplied session id to a storage-safe key:
/// ASCII letters, digits, `_` and `-` survive, everything else is dropped.
/// An id with nothing left maps to "anonymous". Deterministic and total.
///
/// Distinct raw ids can collapse onto the same key (e.g. "user!" and
/// "user?"). They then share one record. Accepted behavior.
pub fn sanitize_session_key(raw: &str) -> String {
    let key: String = raw
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect();
    if key.is_empty() {
        "anonymous".to_string()
    } else {
        key
    }
}
