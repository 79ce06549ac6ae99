use std::process::Command;

use camino::Utf8PathBuf;
use miette::Context;

use crate::commit::CommitRecord;
use crate::commit_hash::CommitHash;
use crate::error::Error;
use crate::reconcile::CommitStore;
use crate::run::RunExt;
use crate::worktree_status::outstanding_changes;

/// `git` CLI wrapper.
#[derive(Debug, Clone, Default)]
pub struct Git {
    /// The repository to run commands in. Defaults to the current directory.
    dir: Option<Utf8PathBuf>,
}

impl Git {
    pub fn new() -> Self {
        Self { dir: None }
    }

    /// A `git` wrapper for the repository at `dir`.
    #[cfg(test)]
    pub fn at(dir: impl Into<Utf8PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
        }
    }

    /// Get a `git` command.
    pub fn command(&self) -> Command {
        let mut command = Command::new("git");
        if let Some(dir) = &self.dir {
            command.current_dir(dir);
        }
        #[cfg(test)]
        command.envs(crate::test_repo::ISOLATED_GIT_ENV);
        command
    }

    fn run<'a>(&self, args: impl IntoIterator<Item = &'a str>) -> Result<String, Error> {
        self.command().args(args).run_stdout()
    }

    /// Fail if there are uncommitted changes to tracked files.
    pub fn ensure_clean(&self) -> miette::Result<()> {
        let status = self
            .run(["status", "--porcelain", "-z"])
            .wrap_err("Failed to get working tree status")?;
        let paths = outstanding_changes(&status);
        if paths.is_empty() {
            Ok(())
        } else {
            Err(Error::DirtyWorktree { paths }.into())
        }
    }

    /// Does the named object exist in the repository?
    pub fn object_exists(&self, rev: &str) -> miette::Result<bool> {
        Ok(self
            .command()
            .args(["cat-file", "-e", rev])
            .run_succeeds()?)
    }

    /// Does a local branch with the given name exist?
    pub fn branch_exists(&self, branch: &str) -> miette::Result<bool> {
        Ok(self
            .command()
            .args(["show-ref", "--verify", "--quiet", &format!("refs/heads/{branch}")])
            .run_succeeds()?)
    }

    /// Is `branch` a valid branch name?
    pub fn is_valid_branch_name(&self, branch: &str) -> miette::Result<bool> {
        Ok(self
            .command()
            .args(["check-ref-format", "--branch", branch])
            .run_succeeds()?)
    }

    /// Get a `git config` value, if it's set.
    pub fn config(&self, key: &str) -> miette::Result<Option<String>> {
        let mut command = self.command();
        command.args(["config", "--get", key]);
        match command.run_stdout() {
            Ok(value) => Ok(Some(value.trim().to_owned())),
            // `git config --get` exits with 1 when the key is unset.
            Err(Error::CommandFailed { code: Some(1), .. }) => Ok(None),
            Err(error) => Err(error.into()),
        }
    }

    /// Resolve a revision to a commit hash.
    pub fn rev_parse(&self, rev: &str) -> miette::Result<CommitHash> {
        let stdout = self
            .run(["rev-parse", "--verify", &format!("{rev}^{{commit}}")])
            .wrap_err_with(|| format!("Failed to resolve `{rev}`"))?;
        Ok(CommitHash::from(stdout.trim()))
    }

    pub fn head(&self) -> miette::Result<CommitHash> {
        self.rev_parse("HEAD")
    }

    /// Read and parse a commit object.
    pub fn cat_commit(&self, rev: &str) -> miette::Result<CommitRecord> {
        let data = self
            .run(["cat-file", "commit", rev])
            .wrap_err_with(|| format!("Failed to read commit `{rev}`"))?;
        CommitRecord::parse(&data)
    }

    /// Fetch a ref from a remote, returning the fetched commit.
    pub fn fetch(&self, remote: &str, git_ref: &str) -> miette::Result<CommitHash> {
        self.run(["fetch", "--quiet", remote, git_ref])
            .wrap_err_with(|| format!("Failed to fetch {git_ref} from {remote}"))?;
        // `git fetch` doesn't write the fetched ref anywhere but `FETCH_HEAD`.
        self.rev_parse("FETCH_HEAD")
    }

    pub fn checkout_detach(&self) -> miette::Result<()> {
        self.run(["checkout", "--quiet", "--detach"])?;
        Ok(())
    }

    pub fn reset_hard(&self, rev: &str) -> miette::Result<()> {
        self.run(["reset", "--quiet", "--hard", rev])?;
        Ok(())
    }

    /// Cherry-pick a commit onto `HEAD`, keeping its author and message.
    ///
    /// Returns `false` if the cherry-pick fails, e.g. due to conflicts; the working tree is left
    /// as `git` left it.
    pub fn cherry_pick(&self, rev: &str) -> miette::Result<bool> {
        match self.run(["cherry-pick", "--allow-empty", rev]) {
            Ok(_) => Ok(true),
            Err(error @ Error::CommandFailed { .. }) => {
                tracing::debug!(%error, "Cherry-pick failed");
                Ok(false)
            }
            Err(error) => Err(error.into()),
        }
    }

    /// Replace the message of the `HEAD` commit, keeping its author.
    pub fn amend_message(&self, message: &str) -> miette::Result<()> {
        self.run([
            "commit",
            "--quiet",
            "--amend",
            "--allow-empty",
            "--no-verify",
            "--message",
            message,
        ])?;
        Ok(())
    }

    /// Make the index and working tree match `rev`'s tree exactly, including deletions.
    pub fn read_tree(&self, rev: &str) -> miette::Result<()> {
        self.run(["read-tree", "--reset", "-u", rev])?;
        Ok(())
    }

    /// Commit the index, reusing the message and authorship of `rev`.
    pub fn commit_reusing(&self, rev: &str) -> miette::Result<CommitHash> {
        self.run([
            "commit",
            "--quiet",
            "--allow-empty",
            "--no-verify",
            "--reuse-message",
            rev,
        ])?;
        self.head()
    }

    pub fn update_ref(&self, git_ref: &str, rev: &str) -> miette::Result<()> {
        self.run(["update-ref", git_ref, rev])?;
        Ok(())
    }

    pub fn checkout(&self, branch: &str) -> miette::Result<()> {
        self.run(["checkout", "--quiet", branch])?;
        Ok(())
    }

    /// Create a new branch at `HEAD` and check it out.
    pub fn checkout_new_branch(&self, branch: &str) -> miette::Result<()> {
        self.run(["checkout", "--quiet", "-b", branch])?;
        Ok(())
    }
}

impl CommitStore for Git {
    fn read_commit(&self, rev: &str) -> miette::Result<CommitRecord> {
        self.cat_commit(rev)
    }

    fn exists(&self, rev: &str) -> miette::Result<bool> {
        self.object_exists(rev)
    }

    fn resolve(&self, rev: &str) -> miette::Result<CommitHash> {
        self.rev_parse(rev)
    }
}
