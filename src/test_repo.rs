use std::process::Command;

use camino::Utf8Path;
use camino::Utf8PathBuf;
use command_error::CommandExt;

use crate::commit_hash::CommitHash;
use crate::git::Git;

/// Keeps the developer's global and system `git config` out of tests.
pub const ISOLATED_GIT_ENV: [(&str, &str); 2] = [
    ("GIT_CONFIG_GLOBAL", "/dev/null"),
    ("GIT_CONFIG_NOSYSTEM", "1"),
];

/// A throwaway Git repository for tests.
pub struct TestRepo {
    // Held so the directory is deleted when the repository is dropped.
    _tempdir: tempfile::TempDir,
    pub path: Utf8PathBuf,
    pub git: Git,
}

impl TestRepo {
    pub fn new() -> Self {
        let tempdir = tempfile::tempdir().expect("Can create temporary directory");
        let path = Utf8PathBuf::try_from(tempdir.path().to_owned()).expect("Path is UTF-8");
        let repo = Self {
            _tempdir: tempdir,
            git: Git::at(&path),
            path,
        };
        repo.run(&["init", "--quiet"]);
        repo.run(&["config", "user.name", "Rebecca Turner"]);
        repo.run(&["config", "user.email", "rbt@sent.as"]);
        repo.run(&["config", "commit.gpgsign", "false"]);
        repo
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Run `git` in the repository and return its `stdout`.
    pub fn run(&self, args: &[&str]) -> String {
        Command::new("git")
            .current_dir(&self.path)
            .envs(ISOLATED_GIT_ENV)
            .args(args)
            .output_checked_utf8()
            .expect("`git` succeeds")
            .stdout
    }

    pub fn write(&self, file: &str, contents: &str) {
        fs_err::write(self.path.join(file), contents).expect("Can write file");
    }

    /// Write a file and commit it on top of `HEAD`.
    pub fn commit(&self, file: &str, contents: &str, message: &str) -> CommitHash {
        self.write(file, contents);
        self.run(&["add", file]);
        self.run(&["commit", "--quiet", "-m", message]);
        self.head()
    }

    pub fn head(&self) -> CommitHash {
        CommitHash::from(self.run(&["rev-parse", "HEAD"]).trim())
    }

    /// Commit subjects from `rev` back to (but excluding) `base`, oldest first.
    pub fn subjects(&self, base: &str, rev: &str) -> Vec<String> {
        self.run(&[
            "log",
            "--reverse",
            "--format=%s",
            &format!("{base}..{rev}"),
        ])
        .lines()
        .map(|line| line.to_owned())
        .collect()
    }

    pub fn read(&self, rev: &str, file: &str) -> String {
        self.run(&["show", &format!("{rev}:{file}")])
    }
}
