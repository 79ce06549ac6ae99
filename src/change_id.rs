use std::sync::OnceLock;

use derive_more::{Constructor, Deref, Display, From, Into};
use regex::Regex;

/// A Gerrit change ID.
///
/// This is a string starting with `I` and followed by 40 hex characters, recorded in a
/// `Change-Id:` trailer in the commit message.
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
pub struct ChangeId(String);

impl ChangeId {
    /// Find the `Change-Id:` trailer in a commit message.
    pub fn from_commit_message(message: &str) -> Option<Self> {
        static RE: OnceLock<Regex> = OnceLock::new();
        RE.get_or_init(|| {
            Regex::new(
                r"(?xm)
                ^
                Change-Id:[[:blank:]]+(?P<change_id>[[:graph:]]+)
                [[:blank:]]*
                $
                ",
            )
            .expect("Regex parses")
        })
        .captures(message)
        .map(|captures| Self(captures["change_id"].to_owned()))
    }
}

impl From<&str> for ChangeId {
    fn from(change_id: &str) -> Self {
        Self(change_id.to_owned())
    }
}
