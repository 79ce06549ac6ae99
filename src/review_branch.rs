use miette::Context;

use crate::branch_name::branch_name;
use crate::builder::BuildReport;
use crate::builder::Builder;
use crate::config::Config;
use crate::error::Error;
use crate::git::Git;
use crate::patchset::Patchsets;
use crate::reconcile::BranchAlignment;
use crate::reconcile::Reconciliation;
use crate::review::ReviewMetadata;
use crate::summary::Summary;

/// The result of building a review branch.
#[derive(Debug)]
pub struct ReviewBranch {
    pub review: ReviewMetadata,
    /// Every patchset Gerrit reported.
    pub patchsets: Patchsets,
    pub report: BuildReport,
    /// The branch created or updated, if any.
    pub branch: Option<String>,
}

impl ReviewBranch {
    pub fn summary(&self) -> Summary<'_> {
        Summary::new(&self.patchsets, &self.report)
    }
}

/// Fetch a change from Gerrit and build its review branch in the current repository.
pub fn run(git: &Git, config: &Config) -> miette::Result<ReviewBranch> {
    git.ensure_clean()?;

    tracing::info!("Downloading patchset metadata for {}", config.change);
    let review = config
        .gerrit
        .fetch_review(&config.change)
        .wrap_err_with(|| format!("Failed to get change {}", config.change))?;

    build_review_branch(git, config, review)
}

/// Build a review branch for a change whose metadata has already been fetched.
#[tracing::instrument(level = "debug", skip_all, fields(change = review.number))]
pub fn build_review_branch(
    git: &Git,
    config: &Config,
    review: ReviewMetadata,
) -> miette::Result<ReviewBranch> {
    let patchsets = review.patchsets();

    let branch = match &config.branch {
        Some(requested) => {
            let name = branch_name(requested.as_deref(), &review)?;
            if !git.is_valid_branch_name(&name)? {
                return Err(Error::InvalidBranchName { name }.into());
            }
            Some(name)
        }
        None => None,
    };

    let alignment = match &branch {
        Some(branch) if git.branch_exists(branch)? => {
            tracing::info!("Aligning with existing branch {branch}");
            let alignment = BranchAlignment::walk(git, branch)?;
            alignment.validate_change_id(&review)?;
            Some(alignment)
        }
        _ => None,
    };

    let builder = Builder::new(git, config.remote_for(&review.project));
    builder.fetch_missing(&patchsets)?;

    let reconciliation =
        Reconciliation::new(git, &patchsets, alignment.as_ref(), config.base.as_ref())?;
    let report = builder.build(&reconciliation)?;

    if let Some(branch) = &branch {
        builder.finalize_branch(branch, alignment.is_some(), &report)?;
    }

    Ok(ReviewBranch {
        review,
        patchsets,
        report,
        branch,
    })
}
