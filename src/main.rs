use std::process::ExitCode;

use calm_io::stderrln;
use calm_io::stdoutln;
use clap::Parser;
use itertools::Itertools;
use owo_colors::OwoColorize;
use owo_colors::Stream;

mod branch_name;
mod builder;
mod change_id;
mod cli;
mod commit;
mod commit_hash;
mod config;
mod error;
mod format_bulleted_list;
mod gerrit;
mod gerrit_query;
mod git;
mod install_tracing;
mod patchset;
mod patchset_tag;
mod query_result;
mod reconcile;
mod review;
mod review_branch;
mod run;
mod summary;
#[cfg(test)]
mod test_repo;
mod worktree_status;

use cli::Opts;
use config::Config;
use error::Error;
use format_bulleted_list::format_bulleted_list;
use git::Git;
use install_tracing::install_tracing;

fn main() -> ExitCode {
    let opts = match Opts::try_parse() {
        Ok(opts) => opts,
        Err(error) => {
            let _ = error.print();
            // `--help` and `--version` are "errors" too.
            return if error.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    match run(opts) {
        Ok(()) => ExitCode::SUCCESS,
        Err(report) => {
            let _ = stderrln!("Error: {report:?}");
            let code = report
                .chain()
                .find_map(|error| error.downcast_ref::<Error>())
                .map(Error::exit_code)
                .unwrap_or(1);
            ExitCode::from(code)
        }
    }
}

fn run(opts: Opts) -> miette::Result<()> {
    install_tracing(opts.log_filter())?;

    let git = Git::new();
    let config = Config::new(opts, &git)?;
    let result = review_branch::run(&git, &config)?;

    let _ = stdoutln!("{}", result.summary());

    let tip = result.report.tip.abbrev();
    let _ = match &result.branch {
        Some(branch) => stdoutln!(
            "Branch {} is at {}",
            branch.if_supports_color(Stream::Stdout, |text| text.green()),
            tip.if_supports_color(Stream::Stdout, |text| text.yellow()),
        ),
        None => stdoutln!(
            "HEAD is detached at {}",
            tip.if_supports_color(Stream::Stdout, |text| text.yellow()),
        ),
    };

    let conflicted = result.report.conflicted().collect::<Vec<_>>();
    if !conflicted.is_empty() {
        tracing::warn!(
            "Patchsets {} of change {} could not be cherry-picked and were left out",
            conflicted.iter().join(", "),
            result.review.number
        );
    }

    Ok(())
}
