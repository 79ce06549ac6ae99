use std::process::Command;

use crate::error::Error;
use crate::gerrit_query::GerritQuery;
use crate::query_result::QueryResult;
use crate::review::ReviewMetadata;
use crate::run::display_command;
use crate::run::RunExt;

/// Gerrit SSH client wrapper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gerrit {
    pub username: String,
    pub host: String,
    pub port: u16,
}

impl Gerrit {
    pub fn new(username: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self {
            username: username.into(),
            host: host.into(),
            port,
        }
    }

    /// The `ssh` destination to connect to.
    pub fn connect_to(&self) -> String {
        format!("ssh://{}@{}:{}", self.username, self.host, self.port)
    }

    /// The Git URL for a project hosted on this Gerrit.
    pub fn project_url(&self, project: &str) -> String {
        format!("{}/{project}.git", self.connect_to())
    }

    /// A `gerrit` command to run on the remote.
    pub fn command(&self, args: impl IntoIterator<Item = impl AsRef<str>>) -> Command {
        let mut cmd = Command::new("ssh");
        cmd.args([&self.connect_to(), "gerrit"]);
        cmd.args(
            args.into_iter()
                .map(|arg| shell_words::quote(arg.as_ref()).into_owned()),
        );
        cmd
    }

    /// Run a query, returning the command line and its raw output.
    ///
    /// Fails only if `ssh` or `gerrit` fail; the caller decides what the output means.
    pub fn query(&self, query: GerritQuery) -> Result<(String, String), Error> {
        let mut command = self.command(query.into_args());
        let stdout = command.run_stdout()?;
        Ok((display_command(&command), stdout))
    }

    /// Fetch a change and all of its patchsets.
    ///
    /// `change` is anything Gerrit can query a single change by: a change number or a
    /// `Change-Id`.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn fetch_review(&self, change: &str) -> miette::Result<ReviewMetadata> {
        let (query, stdout) = self.query(GerritQuery::new(change).patch_sets())?;
        parse_review(query, &stdout)
    }
}

/// Parse the first change out of `gerrit query --format json --patch-sets` output.
///
/// `query` is the command line, for error messages.
fn parse_review(query: String, stdout: &str) -> miette::Result<ReviewMetadata> {
    let review = QueryResult::<ReviewMetadata>::from_stdout(stdout)
        .into_first_change()
        .map_err(|reason| Error::DataUnavailable {
            query: query.clone(),
            reason,
        })?;

    if review.patch_sets.is_empty() {
        return Err(Error::DataUnavailable {
            query,
            reason: format!("change {} has no patchsets", review.number),
        }
        .into());
    }

    tracing::debug!(
        id = %review.id,
        project = %review.project,
        patchsets = review.patch_sets.len(),
        "Fetched change"
    );
    Ok(review)
}
