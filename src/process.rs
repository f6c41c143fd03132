//! External command execution.
//!
//! Every process bumpr starts (VCS backends, clean/test/publish commands,
//! command hooks) is described by a [`Command`] value and executed by a
//! [`CommandRunner`], which applies the dry-run, timeout and logging policy.

use crate::error::CommandError;
use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// A program invocation: program, arguments, working directory and extra environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    program: String,
    args: Vec<String>,
    cwd: Option<PathBuf>,
    env: Vec<(String, String)>,
}

impl Command {
    pub fn new(program: impl Into<String>) -> Self {
        Command {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            env: Vec::new(),
        }
    }

    /// A single shell command line, run through `sh -c` (`cmd /C` on Windows).
    pub fn shell(line: impl Into<String>) -> Self {
        #[cfg(windows)]
        let command = Command::new("cmd").arg("/C");
        #[cfg(not(windows))]
        let command = Command::new("sh").arg("-c");
        command.arg(line)
    }

    /// Split a configured command string into one shell command per non-blank line.
    pub fn shell_lines(text: &str) -> Vec<Command> {
        text.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(Command::shell)
            .collect()
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    pub fn get_current_dir(&self) -> Option<&Path> {
        self.cwd.as_deref()
    }

    pub fn get_env(&self) -> &[(String, String)] {
        &self.env
    }

    fn to_std(&self) -> std::process::Command {
        let mut cmd = std::process::Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &self.cwd {
            cmd.current_dir(dir);
        }
        for (key, value) in &self.env {
            cmd.env(key, value);
        }
        cmd
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Shell commands read better as the line the user configured.
        if self.args.len() == 2 && (self.args[0] == "-c" || self.args[0] == "/C") {
            return f.write_str(&self.args[1]);
        }
        f.write_str(&self.program)?;
        for arg in &self.args {
            if arg.contains(char::is_whitespace) {
                write!(f, " \"{}\"", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// Captured result of a successful command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Executes [`Command`]s synchronously with a shared dry-run and timeout policy
#[derive(Debug, Clone, Default)]
pub struct CommandRunner {
    dry_run: bool,
    timeout: Option<Duration>,
}

impl CommandRunner {
    pub fn new(dry_run: bool, timeout: Option<Duration>) -> Self {
        CommandRunner { dry_run, timeout }
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Run a command that changes state.
    ///
    /// In dry-run mode the command is logged and an empty output is returned
    /// without starting any process.
    pub fn run(&self, command: &Command) -> Result<CommandOutput, CommandError> {
        if self.dry_run {
            info!(command = %command, "[dry-run] would execute");
            return Ok(CommandOutput::default());
        }
        self.execute(command)
    }

    /// Run every command in order, stopping at the first failure.
    pub fn run_all(&self, commands: &[Command]) -> Result<(), CommandError> {
        for command in commands {
            self.run(command)?;
        }
        Ok(())
    }

    /// Run a read-only command. Queries execute even in dry-run mode.
    pub fn query(&self, command: &Command) -> Result<CommandOutput, CommandError> {
        self.execute(command)
    }

    fn execute(&self, command: &Command) -> Result<CommandOutput, CommandError> {
        debug!(command = %command, cwd = ?command.get_current_dir(), "executing");

        let spawn_error = |source| CommandError::Spawn {
            command: command.to_string(),
            source,
        };

        let (status, stdout, stderr) = match self.timeout {
            None => {
                let output = command.to_std().output().map_err(spawn_error)?;
                (
                    output.status,
                    String::from_utf8_lossy(&output.stdout).into_owned(),
                    String::from_utf8_lossy(&output.stderr).into_owned(),
                )
            }
            Some(limit) => {
                let child = command.to_std().spawn().map_err(spawn_error)?;
                wait_with_timeout(child, limit, command)?
            }
        };

        if !status.success() {
            let code = status.code().unwrap_or(-1);
            warn!(command = %command, code, "command failed");
            return Err(CommandError::Failed {
                command: command.to_string(),
                code,
                stdout,
                stderr,
            });
        }

        Ok(CommandOutput { stdout, stderr })
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        String::from_utf8_lossy(&buf).into_owned()
    })
}

/// Wait for `child`, killing it once `limit` has elapsed.
///
/// Output pipes are drained on helper threads so a chatty child cannot block
/// on a full pipe while we poll.
fn wait_with_timeout(
    mut child: Child,
    limit: Duration,
    command: &Command,
) -> Result<(std::process::ExitStatus, String, String), CommandError> {
    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());
    let started = Instant::now();

    let status = loop {
        let polled = child.try_wait().map_err(|source| CommandError::Spawn {
            command: command.to_string(),
            source,
        })?;
        if let Some(status) = polled {
            break status;
        }
        if started.elapsed() >= limit {
            let _ = child.kill();
            let _ = child.wait();
            warn!(command = %command, seconds = limit.as_secs(), "command timed out");
            // Readers are left detached: grandchildren may still hold the pipes open.
            return Err(CommandError::Timeout {
                command: command.to_string(),
                seconds: limit.as_secs(),
            });
        }
        thread::sleep(POLL_INTERVAL);
    };

    let stdout = stdout.join().unwrap_or_default();
    let stderr = stderr.join().unwrap_or_default();
    Ok((status, stdout, stderr))
}
