use serde_with::serde_as;
use serde_with::DisplayFromStr;
use serde_with::PickFirst;

use crate::change_id::ChangeId;
use crate::patchset::PatchsetRecord;
use crate::patchset::Patchsets;

/// A Gerrit change and all of its patchsets, as returned by `gerrit query --patch-sets`.
///
/// Fields we don't use are ignored.
#[serde_as]
#[derive(serde::Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReviewMetadata {
    /// The change's `Change-Id`.
    pub id: ChangeId,
    /// The change number.
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub number: u64,
    pub project: String,
    /// The branch the change targets.
    #[serde(default)]
    pub branch: String,
    pub subject: String,
    pub topic: Option<String>,
    /// `NEW`, `MERGED`, or `ABANDONED`.
    pub status: Option<String>,
    pub patch_sets: Vec<PatchsetRecord>,
}

impl ReviewMetadata {
    pub fn patchsets(&self) -> Patchsets {
        self.patch_sets.iter().cloned().collect()
    }
}

#[cfg(test)]
pub(crate) fn review(patch_sets: Vec<PatchsetRecord>) -> ReviewMetadata {
    ReviewMetadata {
        id: ChangeId::from("I0123456789abcdef0123456789abcdef01234567"),
        number: 12345,
        project: "frob/nicator".to_owned(),
        branch: "main".to_owned(),
        subject: "Add frobnicator".to_owned(),
        topic: Some("frob".to_owned()),
        status: Some("NEW".to_owned()),
        patch_sets,
    }
}
