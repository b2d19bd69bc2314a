//! Canonical per-session record plus the untrusted fragment input types.

use serde::{Deserialize, Serialize};

pub fn now_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("system clock before Unix epoch")
        .as_millis() as i64
}

pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Fixed depth progression of the psycho-tree, shallow → deep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layer {
    Leaves,
    Branches,
    Trunk,
    Roots,
}

impl Layer {
    pub const ALL: [Layer; 4] = [Layer::Leaves, Layer::Branches, Layer::Trunk, Layer::Roots];

    pub fn as_str(self) -> &'static str {
        match self {
            Layer::Leaves => "leaves",
            Layer::Branches => "branches",
            Layer::Trunk => "trunk",
            Layer::Roots => "roots",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    /// Sanitized session key. Set at creation, never rewritten.
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// A stored social post or activity. Posts and activities share a shape;
/// which list they live in is the only distinction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocialItem {
    pub id: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstagramProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default)]
    pub posts: Vec<SocialItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinkedinProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default)]
    pub activities: Vec<SocialItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Social {
    #[serde(default)]
    pub instagram: InstagramProfile,
    #[serde(default)]
    pub linkedin: LinkedinProfile,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileEntry {
    pub id: String,
    pub layer: Layer,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    pub answer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence: Option<String>,
    /// Always an explicit list, possibly empty — never null.
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    pub created_at: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileTree {
    #[serde(default)]
    pub leaves: Vec<ProfileEntry>,
    #[serde(default)]
    pub branches: Vec<ProfileEntry>,
    #[serde(default)]
    pub trunk: Vec<ProfileEntry>,
    #[serde(default)]
    pub roots: Vec<ProfileEntry>,
}

impl ProfileTree {
    pub fn layer(&self, layer: Layer) -> &Vec<ProfileEntry> {
        match layer {
            Layer::Leaves => &self.leaves,
            Layer::Branches => &self.branches,
            Layer::Trunk => &self.trunk,
            Layer::Roots => &self.roots,
        }
    }

    pub fn layer_mut(&mut self, layer: Layer) -> &mut Vec<ProfileEntry> {
        match layer {
            Layer::Leaves => &mut self.leaves,
            Layer::Branches => &mut self.branches,
            Layer::Trunk => &mut self.trunk,
            Layer::Roots => &mut self.roots,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FollowupAction {
    DoubleDown,
    Rephrase,
    ContinueStory,
    MoveOn,
}

/// The externally decided next conversational move. Stored, not computed,
/// by this engine; the roots gate is checked before acceptance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FollowupSignal {
    pub action: FollowupAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_layer: Option<Layer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_prompt: Option<String>,
}

/// The full durable memory state for one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub identity: Identity,
    #[serde(default)]
    pub social: Social,
    #[serde(default)]
    pub profile_tree: ProfileTree,
    #[serde(default)]
    pub transcript: Vec<Turn>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_followup: Option<FollowupSignal>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Record {
    /// Fresh empty record. `created_at == updated_at` until the first
    /// committed mutation.
    pub fn new(key: impl Into<String>, now: i64) -> Self {
        Self {
            identity: Identity { id: key.into(), name: None, email: None },
            social: Social::default(),
            profile_tree: ProfileTree::default(),
            transcript: Vec::new(),
            last_followup: None,
            created_at: now,
            updated_at: now,
        }
    }
}

// --- Fragment input types ---
//
// Produced by an external extraction step that re-reports, omits, and
// garbles fields freely. Every field is optional and defaults apply, so
// deserialization never fails on absence.

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct IdentityFragment {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SocialItemFragment {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct InstagramFragment {
    #[serde(default)]
    pub handle: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub posts: Vec<SocialItemFragment>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LinkedinFragment {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub activities: Vec<SocialItemFragment>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SocialFragment {
    #[serde(default)]
    pub instagram: Option<InstagramFragment>,
    #[serde(default)]
    pub linkedin: Option<LinkedinFragment>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct EntryFragment {
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub answer: String,
    #[serde(default)]
    pub evidence: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub confidence: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TreeFragment {
    #[serde(default)]
    pub leaves: Vec<EntryFragment>,
    #[serde(default)]
    pub branches: Vec<EntryFragment>,
    #[serde(default)]
    pub trunk: Vec<EntryFragment>,
    #[serde(default)]
    pub roots: Vec<EntryFragment>,
}

impl TreeFragment {
    pub fn layer(&self, layer: Layer) -> &Vec<EntryFragment> {
        match layer {
            Layer::Leaves => &self.leaves,
            Layer::Branches => &self.branches,
            Layer::Trunk => &self.trunk,
            Layer::Roots => &self.roots,
        }
    }
}

/// A candidate update from the extraction collaborator. Partial by design.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MemoryFragment {
    #[serde(default)]
    pub identity: Option<IdentityFragment>,
    #[serde(default)]
    pub social: Option<SocialFragment>,
    #[serde(default, alias = "psychoTree")]
    pub psycho_tree: Option<TreeFragment>,
    /// Extraction-side hint that a deep disclosure was detected. Stored
    /// nowhere; callers may use it to drive their own policy.
    #[serde(default)]
    pub has_deep_answer: Option<bool>,
}

impl EntryFragment {
    pub fn answer(answer: impl Into<String>) -> Self {
        Self { answer: answer.into(), ..Default::default() }
    }

    pub fn question(mut self, q: impl Into<String>) -> Self {
        self.question = Some(q.into());
        self
    }

    pub fn tags(mut self, tags: Vec<String>) -> Self {
        self.tags = Some(tags);
        self
    }
}

impl SocialItemFragment {
    pub fn text(text: impl Into<String>) -> Self {
        Self { text: text.into(), ..Default::default() }
    }
}
