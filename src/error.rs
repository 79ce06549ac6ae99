use miette::Diagnostic;

use crate::change_id::ChangeId;
use crate::commit_hash::CommitHash;
use crate::patchset::Patchset;

/// Errors which abort a run.
///
/// Plumbing code returns [`miette::Result`]; these are the conditions callers (and tests) need to
/// tell apart.
#[derive(thiserror::Error, Diagnostic, Debug)]
pub enum Error {
    /// An external command exited unsuccessfully.
    #[error("`{command}` failed with {exit}{}", format_stderr(stderr))]
    #[diagnostic(code(git_review_branch::command_failed))]
    CommandFailed {
        /// The shell-quoted command line.
        command: String,
        /// The exit code, or `signal N`.
        exit: String,
        /// The numeric exit code, if the process exited normally.
        code: Option<i32>,
        /// Captured standard error.
        stderr: String,
    },

    /// An external command couldn't be run at all.
    #[error("Failed to execute `{command}`: {message}")]
    #[diagnostic(code(git_review_branch::exec))]
    Exec { command: String, message: String },

    #[error("No change data returned by `{query}`: {reason}")]
    #[diagnostic(
        code(git_review_branch::data_unavailable),
        help("Check that the change exists and that you can `ssh` to the Gerrit host")
    )]
    DataUnavailable { query: String, reason: String },

    #[error("Preexisting branch `{branch}` has ambiguous topology: {commit} has {parents} parents")]
    #[diagnostic(
        code(git_review_branch::ambiguous_topology),
        help("Patchset commits must form a linear history; delete or rename the branch")
    )]
    AmbiguousTopology {
        branch: String,
        commit: CommitHash,
        parents: usize,
    },

    #[error("`{branch}` is not a review branch for {expected}")]
    #[diagnostic(code(git_review_branch::not_a_review_branch))]
    NotAReviewBranch {
        branch: String,
        expected: ChangeId,
        /// The Change-Ids found on the branch's patchset commits.
        found: Vec<String>,
    },

    #[error("`--base={base}` does not match base {derived} derived from `--branch={branch}`")]
    #[diagnostic(code(git_review_branch::base_mismatch))]
    BaseMismatch {
        base: String,
        branch: String,
        derived: CommitHash,
    },

    #[error("No patchset could be cherry-picked to {base}")]
    #[diagnostic(code(git_review_branch::no_applicable_patchsets))]
    NoApplicablePatchsets { base: String },

    #[error("There are outstanding changes:\n{}", crate::format_bulleted_list(paths))]
    #[diagnostic(
        code(git_review_branch::dirty_worktree),
        help("Commit or stash your changes first")
    )]
    DirtyWorktree { paths: Vec<String> },

    #[error("There is no patchset version {patchset}")]
    #[diagnostic(code(git_review_branch::unknown_patchset))]
    UnknownPatchset { patchset: Patchset },

    #[error("Base `{base}` is not a known commit")]
    #[diagnostic(code(git_review_branch::unknown_base))]
    UnknownBase { base: String },

    #[error("Fetched {git_ref} for patchset {patchset} but got {fetched}, not {expected}")]
    #[diagnostic(
        code(git_review_branch::fetch_mismatch),
        help("Is `--remote` pointing at the right Gerrit project?")
    )]
    FetchMismatch {
        patchset: Patchset,
        git_ref: String,
        expected: CommitHash,
        fetched: CommitHash,
    },

    #[error("`{name}` is not a valid branch name")]
    #[diagnostic(code(git_review_branch::invalid_branch_name))]
    InvalidBranchName { name: String },

    #[error("Unknown key `{key}` in branch template; known keys are: {}", known.join(", "))]
    #[diagnostic(code(git_review_branch::unknown_template_key))]
    UnknownTemplateKey { key: String, known: Vec<&'static str> },

    #[error("Could not determine the Gerrit user")]
    #[diagnostic(
        code(git_review_branch::no_user),
        help("Pass `--user`, set `$GERRIT_USER`, or set `git config gitreview.username`")
    )]
    NoUser,
}

impl Error {
    /// The exit code to terminate the process with when this error aborts a run.
    pub fn exit_code(&self) -> u8 {
        match self {
            Error::CommandFailed {
                code: Some(code), ..
            } => u8::try_from(*code)
                .ok()
                .filter(|code| *code != 0)
                .unwrap_or(1),
            _ => 1,
        }
    }
}

fn format_stderr(stderr: &str) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {stderr}")
    }
}
