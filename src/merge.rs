//! Fragment merge.
//!
//! Pure: takes the current record and an untrusted fragment, returns the
//! merged record. Never fails — a malformed or empty sub-item is skipped on
//! its own, the rest of the fragment still lands. Evaluation order is fixed
//! (identity, instagram, linkedin, then leaves → roots) and every append is
//! guarded by a case-insensitive dedup key, so re-merging the same fragment
//! is a no-op.

use std::collections::HashSet;

use crate::record::{
    new_id, EntryFragment, Identity, IdentityFragment, Layer, MemoryFragment, ProfileEntry,
    Record, SocialItem, SocialItemFragment,
};

/// Empty and whitespace-only strings count as absent (extraction output
/// routinely carries `""` for fields it has nothing for).
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn text_key(text: &str) -> String {
    text.trim().to_lowercase()
}

pub fn merge(record: &Record, fragment: &MemoryFragment, now: i64) -> Record {
    let mut merged = record.clone();

    if let Some(identity) = &fragment.identity {
        merge_identity(&mut merged.identity, identity);
    }

    if let Some(social) = &fragment.social {
        if let Some(ig) = &social.instagram {
            if let Some(handle) = present(&ig.handle) {
                merged.social.instagram.handle = Some(handle.to_string());
            }
            if let Some(url) = present(&ig.url) {
                merged.social.instagram.url = Some(url.to_string());
            }
            merge_social_items(&mut merged.social.instagram.posts, &ig.posts);
        }
        if let Some(li) = &social.linkedin {
            if let Some(url) = present(&li.url) {
                merged.social.linkedin.url = Some(url.to_string());
            }
            merge_social_items(&mut merged.social.linkedin.activities, &li.activities);
        }
    }

    if let Some(tree) = &fragment.psycho_tree {
        for layer in Layer::ALL {
            merge_entries(merged.profile_tree.layer_mut(layer), tree.layer(layer), layer, now);
        }
    }

    merged
}

/// Fill-only: a known name or email is never erased by an absent or empty
/// incoming value.
fn merge_identity(identity: &mut Identity, incoming: &IdentityFragment) {
    if let Some(name) = present(&incoming.name) {
        identity.name = Some(name.to_string());
    }
    if let Some(email) = present(&incoming.email) {
        identity.email = Some(email.to_string());
    }
}

fn merge_social_items(target: &mut Vec<SocialItem>, incoming: &[SocialItemFragment]) {
    let mut seen: HashSet<String> = target.iter().map(|item| text_key(&item.text)).collect();
    for item in incoming {
        let text = item.text.trim();
        if text.is_empty() {
            continue;
        }
        let key = text_key(text);
        if !seen.insert(key) {
            continue;
        }
        target.push(SocialItem {
            id: new_id(),
            text: text.to_string(),
            date: present(&item.date).map(str::to_string),
            url: present(&item.url).map(str::to_string),
        });
    }
}

fn entry_key(question: Option<&str>, answer: &str) -> (String, String) {
    (
        question.map(text_key).unwrap_or_default(),
        text_key(answer),
    )
}

fn merge_entries(
    target: &mut Vec<ProfileEntry>,
    incoming: &[EntryFragment],
    layer: Layer,
    now: i64,
) {
    let mut seen: HashSet<(String, String)> = target
        .iter()
        .map(|e| entry_key(e.question.as_deref(), &e.answer))
        .collect();
    for entry in incoming {
        let answer = entry.answer.trim();
        if answer.is_empty() {
            continue;
        }
        let question = present(&entry.question);
        if !seen.insert(entry_key(question, answer)) {
            continue;
        }
        target.push(ProfileEntry {
            id: new_id(),
            layer,
            question: question.map(str::to_string),
            answer: answer.to_string(),
            evidence: present(&entry.evidence).map(str::to_string),
            tags: dedupe_tags(entry.tags.as_deref().unwrap_or_default()),
            confidence: entry.confidence,
            created_at: now,
        });
    }
}

/// Coerce to an explicit, order-preserving, deduplicated list.
fn dedupe_tags(tags: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    tags.iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .filter(|t| seen.insert(t.to_lowercase()))
        .map(str::to_string)
        .collect()
}
