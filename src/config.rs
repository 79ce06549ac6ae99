use miette::Context;

use crate::cli::Opts;
use crate::error::Error;
use crate::gerrit::Gerrit;
use crate::git::Git;
use crate::reconcile::BaseSpec;

/// Settings for a run, resolved from the command line, the environment, and `git config`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// The change number or `Change-Id` to build.
    pub change: String,
    pub gerrit: Gerrit,
    /// The remote to fetch from, if not the Gerrit project URL.
    pub remote: Option<String>,
    pub base: Option<BaseSpec>,
    /// `Some(None)` requests a branch with the default name.
    pub branch: Option<Option<String>>,
}

impl Config {
    pub fn new(opts: Opts, git: &Git) -> miette::Result<Self> {
        let username = resolve_user(opts.user, git, |name| std::env::var(name).ok())?;
        tracing::debug!(%username, host = %opts.host, port = opts.port, "Resolved Gerrit user");

        Ok(Self {
            change: opts.change,
            gerrit: Gerrit::new(username, opts.host, opts.port),
            remote: opts.remote,
            base: opts.base,
            branch: opts.branch,
        })
    }

    /// The Git remote to fetch the given project's patchsets from.
    pub fn remote_for(&self, project: &str) -> String {
        match &self.remote {
            Some(remote) => remote.clone(),
            None => self.gerrit.project_url(project),
        }
    }
}

/// `--user` / `$GERRIT_USER`, then `git config gitreview.username`, then the login name.
fn resolve_user(
    explicit: Option<String>,
    git: &Git,
    env: impl Fn(&str) -> Option<String>,
) -> miette::Result<String> {
    if let Some(user) = explicit.filter(|user| !user.is_empty()) {
        return Ok(user);
    }

    if let Some(user) = git
        .config("gitreview.username")
        .wrap_err("Failed to read `gitreview.username`")?
        .filter(|user| !user.is_empty())
    {
        return Ok(user);
    }

    ["USER", "LOGNAME"]
        .into_iter()
        .find_map(|name| env(name).filter(|user| !user.is_empty()))
        .ok_or_else(|| Error::NoUser.into())
}
