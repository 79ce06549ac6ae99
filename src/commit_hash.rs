use derive_more::{Constructor, Deref, Display, From, Into};

/// A Git commit hash.
#[derive(
    serde::Serialize,
    serde::Deserialize,
    Debug,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    Into,
    From,
    Deref,
    Constructor,
)]
#[serde(transparent)]
pub struct CommitHash(String);

impl CommitHash {
    /// Get an abbreviated 8-character Git hash.
    pub fn abbrev(&self) -> &str {
        self.0.get(..8).unwrap_or(&self.0)
    }
}

impl From<&str> for CommitHash {
    fn from(hash: &str) -> Self {
        Self(hash.to_owned())
    }
}

impl AsRef<str> for CommitHash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
