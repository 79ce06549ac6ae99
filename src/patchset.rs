use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;

use derive_more::{Constructor, Deref, Display, From, Into};
use serde_with::serde_as;
use serde_with::DisplayFromStr;
use serde_with::PickFirst;

use crate::commit_hash::CommitHash;

/// A patchset number within a Gerrit change.
#[derive(
    serde::Serialize,
    serde::Deserialize,
    Debug,
    Clone,
    Copy,
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
pub struct Patchset(u64);

impl FromStr for Patchset {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

/// One revision of a change, as reported by `gerrit query --patch-sets`.
#[serde_as]
#[derive(serde::Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PatchsetRecord {
    /// Patchset number.
    ///
    /// Older Gerrit versions encode this as a string.
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub number: Patchset,
    /// Git commit hash.
    pub revision: CommitHash,
    /// Git ref name, like `refs/changes/45/12345/3`.
    #[serde(rename = "ref")]
    pub ref_name: String,
}

impl Display for PatchsetRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "patchset {} ({})", self.number, self.revision.abbrev())
    }
}

/// The patchsets of a change, keyed by number.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Patchsets(BTreeMap<Patchset, PatchsetRecord>);

impl Patchsets {
    pub fn get(&self, patchset: Patchset) -> Option<&PatchsetRecord> {
        self.0.get(&patchset)
    }

    /// The highest-numbered patchset.
    pub fn latest(&self) -> Option<&PatchsetRecord> {
        self.0.values().next_back()
    }

    /// Patchsets in increasing number order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &PatchsetRecord> {
        self.0.values()
    }

    /// Patchsets numbered strictly above `patchset`, in increasing number order.
    pub fn after(&self, patchset: Patchset) -> impl Iterator<Item = &PatchsetRecord> {
        self.0
            .range((
                std::ops::Bound::Excluded(patchset),
                std::ops::Bound::Unbounded,
            ))
            .map(|(_, record)| record)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl FromIterator<PatchsetRecord> for Patchsets {
    fn from_iter<T: IntoIterator<Item = PatchsetRecord>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|record| (record.number, record))
                .collect(),
        )
    }
}

#[cfg(test)]
pub(crate) fn record(number: u64, revision: &str) -> PatchsetRecord {
    PatchsetRecord {
        number: Patchset(number),
        revision: CommitHash::from(revision),
        ref_name: format!("refs/changes/45/12345/{number}"),
    }
}
