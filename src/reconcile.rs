//! Aligning a preexisting review branch with the patchsets on Gerrit.

use std::fmt::Display;
use std::str::FromStr;

use itertools::Itertools;

use crate::commit::CommitRecord;
use crate::commit_hash::CommitHash;
use crate::error::Error;
use crate::patchset::Patchset;
use crate::patchset::PatchsetRecord;
use crate::patchset::Patchsets;
use crate::review::ReviewMetadata;

/// Read access to a repository's commits.
pub trait CommitStore {
    fn read_commit(&self, rev: &str) -> miette::Result<CommitRecord>;

    /// Does `rev` name an object in the repository?
    fn exists(&self, rev: &str) -> miette::Result<bool>;

    /// Resolve `rev` to a commit hash.
    fn resolve(&self, rev: &str) -> miette::Result<CommitHash>;
}

/// A patchset commit already on a review branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedPatchset {
    pub patchset: Patchset,
    pub commit: CommitHash,
    pub record: CommitRecord,
}

/// The patchset commits on a preexisting review branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchAlignment {
    pub branch: String,
    /// Applied patchsets, in increasing patchset order.
    pub applied: Vec<AppliedPatchset>,
    /// The first commit below the patchset commits.
    pub base: CommitHash,
}

impl BranchAlignment {
    /// Walk a branch's first-parent chain down from its tip, collecting patchset commits until
    /// the first untagged commit.
    ///
    /// Every patchset commit must have exactly one parent. The untagged base's parents aren't
    /// checked, so it may be a merge or a root commit.
    #[tracing::instrument(level = "debug", skip(store))]
    pub fn walk(store: &impl CommitStore, branch: &str) -> miette::Result<Self> {
        let mut commit = store.resolve(branch)?;
        let mut applied = Vec::new();

        loop {
            let record = store.read_commit(&commit)?;
            let patchset = match record.patchset_tag() {
                Some(tag) => tag.patchset,
                None => break,
            };

            let parent = match record.parents.as_slice() {
                [parent] => parent.clone(),
                parents => {
                    return Err(Error::AmbiguousTopology {
                        branch: branch.to_owned(),
                        commit,
                        parents: parents.len(),
                    }
                    .into());
                }
            };

            tracing::debug!(%patchset, %commit, "Found patchset commit");
            applied.push(AppliedPatchset {
                patchset,
                commit,
                record,
            });
            commit = parent;
        }

        // Discovered tip-first.
        applied.reverse();
        applied.sort_by_key(|applied| applied.patchset);

        Ok(Self {
            branch: branch.to_owned(),
            applied,
            base: commit,
        })
    }

    /// Check that the branch's patchset commits all belong to `review`.
    pub fn validate_change_id(&self, review: &ReviewMetadata) -> miette::Result<()> {
        let found = self
            .applied
            .iter()
            .map(|applied| {
                applied
                    .record
                    .change_id()
                    .map(|change_id| change_id.to_string())
                    .unwrap_or_default()
            })
            .unique()
            .collect::<Vec<_>>();

        if found.len() == 1 && found[0] == *review.id {
            Ok(())
        } else {
            Err(Error::NotAReviewBranch {
                branch: self.branch.clone(),
                expected: review.id.clone(),
                found,
            }
            .into())
        }
    }
}

/// A `--base` argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BaseSpec {
    /// Rebuild on the parent of this patchset.
    Patchset(Patchset),
    /// Rebuild on this commit.
    Commit(String),
}

impl FromStr for BaseSpec {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.parse::<Patchset>() {
            Ok(patchset) if !s.is_empty() && s.bytes().all(|byte| byte.is_ascii_digit()) => {
                Self::Patchset(patchset)
            }
            _ => Self::Commit(s.to_owned()),
        })
    }
}

impl Display for BaseSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BaseSpec::Patchset(patchset) => patchset.fmt(f),
            BaseSpec::Commit(commit) => commit.fmt(f),
        }
    }
}

/// The commit patchsets are cherry-picked onto.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Base {
    /// A revision `git` can resolve, like `abcd1234^`.
    pub rev: String,
    /// How to describe the base to the user.
    pub description: String,
}

impl Display for Base {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.description.fmt(f)
    }
}

/// What needs to happen to bring a branch up to date with a change's patchsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    pub base: Base,
    /// Patchsets to cherry-pick, in increasing patchset order.
    pub to_apply: Vec<PatchsetRecord>,
    /// Patchset commits already on the branch, in increasing patchset order.
    pub applied: Vec<AppliedPatchset>,
}

impl Reconciliation {
    /// Compute the base commit and the patchsets to apply.
    ///
    /// Without `--base`, the base is the preexisting branch's base, or else the parent of the
    /// latest patchset. If both `--base` and a preexisting branch are given, they must agree.
    ///
    /// Patchset revisions must already be present in `store`.
    pub fn new(
        store: &impl CommitStore,
        patchsets: &Patchsets,
        alignment: Option<&BranchAlignment>,
        requested_base: Option<&BaseSpec>,
    ) -> miette::Result<Self> {
        let base = match (requested_base, alignment) {
            (None, Some(alignment)) => Base {
                rev: alignment.base.to_string(),
                description: alignment.base.to_string(),
            },
            (None, None) => {
                let latest = patchsets.latest().ok_or_else(|| Error::NoApplicablePatchsets {
                    base: "an empty change".to_owned(),
                })?;
                patchset_base(latest)
            }
            (Some(BaseSpec::Patchset(patchset)), _) => {
                let record = patchsets
                    .get(*patchset)
                    .ok_or(Error::UnknownPatchset {
                        patchset: *patchset,
                    })?;
                patchset_base(record)
            }
            (Some(BaseSpec::Commit(commit)), _) => {
                if !store.exists(commit)? {
                    return Err(Error::UnknownBase {
                        base: commit.clone(),
                    }
                    .into());
                }
                Base {
                    rev: commit.clone(),
                    description: commit.clone(),
                }
            }
        };

        if let (Some(requested_base), Some(alignment)) = (requested_base, alignment) {
            let requested = store.resolve(&base.rev)?;
            let derived = store.resolve(&alignment.base)?;
            if requested != derived {
                return Err(Error::BaseMismatch {
                    base: requested_base.to_string(),
                    branch: alignment.branch.clone(),
                    derived,
                }
                .into());
            }
        }

        let applied = alignment
            .map(|alignment| alignment.applied.clone())
            .unwrap_or_default();

        let to_apply = match applied.last() {
            Some(last) => patchsets.after(last.patchset).cloned().collect(),
            None => patchsets.iter().cloned().collect(),
        };

        Ok(Self {
            base,
            to_apply,
            applied,
        })
    }
}

fn patchset_base(record: &PatchsetRecord) -> Base {
    Base {
        rev: format!("{}^", record.revision),
        description: format!("patchset {}", record.number),
    }
}
