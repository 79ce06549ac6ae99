use std::process::Command;
use std::process::ExitStatus;

use command_error::CommandExt;
use command_error::OutputContext;
use utf8_command::Utf8Output;

use crate::error::Error;

/// Extension methods for running a [`Command`] to completion and capturing its output.
///
/// Both output streams are drained concurrently while the child runs, so a chatty `stderr` can't
/// deadlock a child that's also writing to `stdout`.
pub trait RunExt {
    /// Run the command and return its `stdout`.
    ///
    /// Fails with [`Error::CommandFailed`] if the command exits unsuccessfully.
    fn run_stdout(&mut self) -> Result<String, Error>;

    /// Run a command whose exit status is the answer to a question, like `git cat-file -e`.
    ///
    /// Only failing to run the command at all is an error.
    fn run_succeeds(&mut self) -> Result<bool, Error>;
}

impl RunExt for Command {
    fn run_stdout(&mut self) -> Result<String, Error> {
        let command = display_command(self);
        self.output_checked_as(|context: OutputContext<Utf8Output>| {
            let status = context.status();
            let output = context.output();
            trace_output(&command, status, output);
            if status.success() {
                Ok(Ok(output.stdout.clone()))
            } else {
                Ok(Err(Error::CommandFailed {
                    command: command.clone(),
                    exit: describe_exit(status),
                    code: status.code(),
                    stderr: output.stderr.trim().to_owned(),
                }))
            }
        })
        .map_err(|error: command_error::Error| Error::Exec {
            command: command.clone(),
            message: error.to_string(),
        })?
    }

    fn run_succeeds(&mut self) -> Result<bool, Error> {
        let command = display_command(self);
        self.output_checked_as(|context: OutputContext<Utf8Output>| {
            trace_output(&command, context.status(), context.output());
            Ok(context.status().success())
        })
        .map_err(|error: command_error::Error| Error::Exec {
            command,
            message: error.to_string(),
        })
    }
}

/// Format a command as a shell-quoted command line, without its environment.
pub fn display_command(command: &Command) -> String {
    shell_words::join(
        std::iter::once(command.get_program())
            .chain(command.get_args())
            .map(|arg| arg.to_string_lossy()),
    )
}

/// A human-readable description of how a process exited: its exit code, or the signal that
/// killed it.
pub fn describe_exit(status: ExitStatus) -> String {
    if let Some(code) = status.code() {
        return code.to_string();
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return format!("signal {signal}");
        }
    }

    status.to_string()
}

fn trace_output(command: &str, status: ExitStatus, output: &Utf8Output) {
    tracing::debug!(
        command,
        status = %describe_exit(status),
        stdout = output.stdout.trim_end(),
        stderr = output.stderr.trim_end(),
        "Ran command"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_display_command() {
        let mut command = Command::new("git");
        command
            .args(["commit", "--amend", "-m", "Fix it [patchset 2]"])
            .env("GIT_EDITOR", "true");
        assert_eq!(
            display_command(&command),
            "git commit --amend -m 'Fix it [patchset 2]'"
        );
    }

    #[test]
    fn test_run_stdout() {
        let stdout = Command::new("sh")
            .args(["-c", "echo out; echo err >&2"])
            .run_stdout()
            .unwrap();
        assert_eq!(stdout, "out\n");
    }

    #[test]
    fn test_run_stdout_env() {
        let stdout = Command::new("sh")
            .args(["-c", "printf %s \"$PATCHSET\""])
            .env("PATCHSET", "3")
            .run_stdout()
            .unwrap();
        assert_eq!(stdout, "3");
    }

    #[test]
    fn test_run_stdout_failed() {
        let error = Command::new("sh")
            .args(["-c", "echo oops >&2; exit 3"])
            .run_stdout()
            .unwrap_err();
        match error {
            Error::CommandFailed {
                command,
                exit,
                code,
                stderr,
            } => {
                assert_eq!(command, "sh -c 'echo oops >&2; exit 3'");
                assert_eq!(exit, "3");
                assert_eq!(code, Some(3));
                assert_eq!(stderr, "oops");
            }
            other => panic!("Unexpected error: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_run_stdout_signaled() {
        let error = Command::new("sh")
            .args(["-c", "kill -9 $$"])
            .run_stdout()
            .unwrap_err();
        match error {
            Error::CommandFailed { exit, code, .. } => {
                assert_eq!(exit, "signal 9");
                assert_eq!(code, None);
            }
            other => panic!("Unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_run_stdout_large_stderr() {
        // Fill the `stderr` pipe buffer before writing anything to `stdout`.
        let stdout = Command::new("sh")
            .args([
                "-c",
                "i=0; while [ $i -lt 20000 ]; do echo 0123456789 >&2; i=$((i+1)); done; echo done",
            ])
            .run_stdout()
            .unwrap();
        assert_eq!(stdout, "done\n");
    }

    #[test]
    fn test_run_succeeds() {
        assert!(Command::new("true").run_succeeds().unwrap());
        assert!(!Command::new("false").run_succeeds().unwrap());
    }

    #[test]
    fn test_run_missing_program() {
        let error = Command::new("git-review-branch-does-not-exist")
            .run_succeeds()
            .unwrap_err();
        assert!(matches!(error, Error::Exec { .. }), "{error:?}");
    }
}
