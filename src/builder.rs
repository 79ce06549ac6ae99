use std::collections::BTreeMap;
use std::fmt::Display;

use miette::miette;

use crate::commit_hash::CommitHash;
use crate::error::Error;
use crate::git::Git;
use crate::patchset::Patchset;
use crate::patchset::Patchsets;
use crate::patchset_tag::tag_message;
use crate::reconcile::Reconciliation;

/// Builds a review branch out of cherry-picked patchsets.
#[derive(Debug)]
pub struct Builder<'a> {
    git: &'a Git,
    /// The Git remote to fetch patchsets from.
    remote: String,
}

/// What happened to a patchset while building.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchsetStatus {
    /// The patchset was already on the branch.
    AlreadyApplied(CommitHash),
    /// The patchset was cherry-picked to this commit.
    Applied(CommitHash),
    /// The patchset failed to cherry-pick and was left out.
    Conflicted,
}

impl PatchsetStatus {
    pub fn commit(&self) -> Option<&CommitHash> {
        match self {
            PatchsetStatus::AlreadyApplied(commit) | PatchsetStatus::Applied(commit) => {
                Some(commit)
            }
            PatchsetStatus::Conflicted => None,
        }
    }
}

impl Display for PatchsetStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PatchsetStatus::AlreadyApplied(_) => write!(f, "already applied"),
            PatchsetStatus::Applied(_) => write!(f, "applied"),
            PatchsetStatus::Conflicted => write!(f, "conflict"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
    /// Per-patchset results, in increasing patchset order.
    pub outcomes: BTreeMap<Patchset, PatchsetStatus>,
    /// The last commit of the rebuilt history.
    pub tip: CommitHash,
    /// Were any new patchsets applied?
    pub changed: bool,
}

impl BuildReport {
    pub fn conflicted(&self) -> impl Iterator<Item = Patchset> + '_ {
        self.outcomes
            .iter()
            .filter(|(_, status)| **status == PatchsetStatus::Conflicted)
            .map(|(patchset, _)| *patchset)
    }
}

impl<'a> Builder<'a> {
    pub fn new(git: &'a Git, remote: impl Into<String>) -> Self {
        Self {
            git,
            remote: remote.into(),
        }
    }

    /// Fetch every patchset whose revision isn't present locally.
    ///
    /// Each fetched ref must point at exactly the revision Gerrit reported.
    pub fn fetch_missing(&self, patchsets: &Patchsets) -> miette::Result<()> {
        tracing::info!("Fetching {} patchset versions", patchsets.len());

        for record in patchsets.iter() {
            if self.git.object_exists(&record.revision)? {
                tracing::debug!(patchset = %record.number, "Patchset already present");
                continue;
            }

            let fetched = self.git.fetch(&self.remote, &record.ref_name)?;
            if fetched != record.revision {
                return Err(Error::FetchMismatch {
                    patchset: record.number,
                    git_ref: record.ref_name.clone(),
                    expected: record.revision.clone(),
                    fetched,
                }
                .into());
            }
            tracing::info!(patchset = %record.number, revision = record.revision.abbrev(), "Fetched");
        }

        Ok(())
    }

    /// Cherry-pick the pending patchsets onto the base and stack the results on top of the
    /// patchsets already applied, leaving `HEAD` detached at the new tip.
    ///
    /// A patchset which fails to cherry-pick is reported and left out.
    #[tracing::instrument(level = "debug", skip_all, fields(base = %reconciliation.base))]
    pub fn build(&self, reconciliation: &Reconciliation) -> miette::Result<BuildReport> {
        let base = &reconciliation.base;
        let mut outcomes = BTreeMap::new();

        for applied in &reconciliation.applied {
            outcomes.insert(
                applied.patchset,
                PatchsetStatus::AlreadyApplied(applied.commit.clone()),
            );
        }

        self.git.checkout_detach()?;

        tracing::info!("Cherry-picking patchset versions onto {base}");
        let mut picked = Vec::new();
        for record in &reconciliation.to_apply {
            self.git.reset_hard(&base.rev)?;
            if self.git.cherry_pick(&record.revision)? {
                let message = self.git.cat_commit(&record.revision)?.message;
                self.git
                    .amend_message(&tag_message(&message, record.number))?;
                picked.push((record.number, self.git.head()?));
                tracing::info!(patchset = %record.number, "Cherry-picked");
            } else {
                tracing::warn!(patchset = %record.number, "Failed to cherry-pick onto {base}");
                outcomes.insert(record.number, PatchsetStatus::Conflicted);
            }
        }

        // Stack the picked patchsets on the last one already applied, or else on the first one
        // picked.
        let (root, rest) = match (reconciliation.applied.last(), picked.split_first()) {
            (Some(last), _) => (last.commit.clone(), picked.as_slice()),
            (None, Some(((patchset, commit), rest))) => {
                outcomes.insert(*patchset, PatchsetStatus::Applied(commit.clone()));
                (commit.clone(), rest)
            }
            (None, None) => {
                self.git.reset_hard(&base.rev)?;
                return Err(Error::NoApplicablePatchsets {
                    base: base.to_string(),
                }
                .into());
            }
        };

        tracing::info!("Building patchset branch");
        self.git.reset_hard(&root)?;
        let mut tip = root;
        for (patchset, commit) in rest {
            self.git.read_tree(commit)?;
            tip = self.git.commit_reusing(commit)?;
            tracing::debug!(%patchset, %tip, "Stacked patchset");
            outcomes.insert(*patchset, PatchsetStatus::Applied(tip.clone()));
        }

        Ok(BuildReport {
            outcomes,
            tip,
            changed: !picked.is_empty(),
        })
    }

    /// Point `branch` at the rebuilt history and check it out.
    ///
    /// An existing branch is only moved if new patchsets were applied.
    pub fn finalize_branch(
        &self,
        branch: &str,
        existed: bool,
        report: &BuildReport,
    ) -> miette::Result<()> {
        if existed {
            let branch_tip = self.git.rev_parse(branch)?;
            let head = self.git.head()?;
            if (branch_tip != head) != report.changed {
                return Err(miette!(
                    "Branch {branch} is at {}, but the rebuilt history is at {}",
                    branch_tip.abbrev(),
                    head.abbrev()
                ));
            }

            if report.changed {
                tracing::info!("Updating branch {branch}");
                self.git
                    .update_ref(&format!("refs/heads/{branch}"), "HEAD")?;
            }
            tracing::info!("Checking out branch {branch}");
            self.git.checkout(branch)?;
        } else {
            tracing::info!("Creating branch {branch}");
            self.git.checkout_new_branch(branch)?;
        }

        Ok(())
    }
}
