use clap::Parser;

use crate::reconcile::BaseSpec;

/// Build a Git branch from the patchsets of a Gerrit change.
///
/// Each patchset is cherry-picked onto a common base and stacked into a linear history, one
/// commit per patchset, tagged `[patchset N]`. Rerunning with `--branch` updates the branch with
/// any new patchsets.
#[derive(Debug, Clone, Parser)]
#[command(version, author, about)]
#[command(max_term_width = 100, disable_help_subcommand = true)]
pub struct Opts {
    /// The change to build a branch from: a Gerrit change number or a `Change-Id`.
    pub change: String,

    /// Gerrit user.
    ///
    /// Defaults to `git config gitreview.username`, then your login name.
    #[arg(short, long, env = "GERRIT_USER")]
    pub user: Option<String>,

    /// Gerrit SSH port.
    #[arg(short, long, default_value_t = 29418, env = "GERRIT_PORT")]
    pub port: u16,

    /// Gerrit host.
    #[arg(long, default_value = "review.openstack.org", env = "GERRIT_HOST")]
    pub host: String,

    /// Git remote (name or URL) to fetch patchsets from.
    ///
    /// Defaults to `ssh://USER@HOST:PORT/PROJECT.git`.
    #[arg(short, long)]
    pub remote: Option<String>,

    /// Patchset number or commit to align commits with.
    ///
    /// Defaults to the base of the existing `--branch`, or else the parent of the latest
    /// patchset.
    #[arg(long)]
    pub base: Option<BaseSpec>,

    /// Create or update a named branch at the resulting commit.
    ///
    /// Without a value, the branch is named `TOPIC--SUBJECT`. Values containing `{{key}}`
    /// placeholders are filled in from the change; keys are `id`, `number`, `project`, `branch`,
    /// `subject`, `topic`, and `status`.
    #[arg(short, long, num_args = 0..=1, require_equals = true)]
    pub branch: Option<Option<String>>,

    /// Show progress.
    #[arg(short, long)]
    pub verbose: bool,

    /// Trace every command run, with its output.
    #[arg(long)]
    pub debug: bool,

    /// Log filter directives, of the form `target[span{field=value}]=level`, where all components
    /// except the level are optional.
    ///
    /// Overrides `--verbose` and `--debug`.
    #[arg(long, env = "GIT_REVIEW_BRANCH_LOG")]
    pub log: Option<String>,
}

impl Opts {
    /// The tracing filter to install.
    pub fn log_filter(&self) -> &str {
        match &self.log {
            Some(log) => log,
            None if self.debug => "debug",
            None if self.verbose => "info",
            None => "warn",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patchset::Patchset;
    use pretty_assertions::assert_eq;

    fn parse(args: &[&str]) -> Opts {
        Opts::try_parse_from(std::iter::once("git-review-branch").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn test_defaults() {
        let opts = parse(&["12345"]);
        assert_eq!(opts.change, "12345");
        assert_eq!(opts.port, 29418);
        assert_eq!(opts.host, "review.openstack.org");
        assert_eq!(opts.branch, None);
        assert_eq!(opts.base, None);
        assert_eq!(opts.log_filter(), "warn");
    }

    #[test]
    fn test_branch_optional_value() {
        assert_eq!(parse(&["12345", "--branch"]).branch, Some(None));
        assert_eq!(parse(&["-b", "12345"]).branch, Some(None));
        assert_eq!(
            parse(&["12345", "--branch=review/{{number}}"]).branch,
            Some(Some("review/{{number}}".to_owned()))
        );
    }

    #[test]
    fn test_base() {
        assert_eq!(
            parse(&["12345", "--base", "2"]).base,
            Some(BaseSpec::Patchset(Patchset::new(2)))
        );
        assert_eq!(
            parse(&["12345", "--base", "origin/main"]).base,
            Some(BaseSpec::Commit("origin/main".to_owned()))
        );
    }

    #[test]
    fn test_log_filter() {
        assert_eq!(parse(&["12345", "-v"]).log_filter(), "info");
        assert_eq!(parse(&["12345", "-v", "--debug"]).log_filter(), "debug");
        assert_eq!(
            parse(&["12345", "--debug", "--log", "trace"]).log_filter(),
            "trace"
        );
    }

    #[test]
    fn test_missing_change() {
        assert!(Opts::try_parse_from(["git-review-branch"]).is_err());
    }

    #[test]
    fn test_verify() {
        use clap::CommandFactory;
        Opts::command().debug_assert();
    }
}
