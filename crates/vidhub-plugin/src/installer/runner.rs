//! Execution of the external package manager.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, error, info};

use vidhub_core::{AppError, AppResult};

/// Maximum time a single package-manager invocation may take.
const COMMAND_TIMEOUT: Duration = Duration::from_secs(300);

/// One invocation of the package manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageCommand {
    /// Program to run.
    pub program: String,
    /// Arguments, passed as-is (never through a shell).
    pub args: Vec<String>,
    /// Working directory.
    pub cwd: PathBuf,
}

impl fmt::Display for PackageCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.program, self.args.join(" "))
    }
}

/// Runs package-manager commands.
#[async_trait]
pub trait CommandRunner: Send + Sync + std::fmt::Debug + 'static {
    /// Runs the command to completion; a non-zero exit is an error.
    async fn run(&self, command: &PackageCommand) -> AppResult<()>;
}

/// Runs commands as child processes.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    /// Creates a new process runner.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, command: &PackageCommand) -> AppResult<()> {
        info!(command = %command, cwd = %command.cwd.display(), "Running package manager");

        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .current_dir(&command.cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = tokio::time::timeout(COMMAND_TIMEOUT, cmd.output())
            .await
            .map_err(|_| {
                AppError::installation(format!(
                    "'{command}' timed out after {} seconds",
                    COMMAND_TIMEOUT.as_secs()
                ))
            })?
            .map_err(|e| {
                AppError::with_source(
                    vidhub_core::error::ErrorKind::Installation,
                    format!("Cannot spawn '{}'", command.program),
                    e,
                )
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let code = output.status.code().unwrap_or(-1);
            error!(
                command = %command,
                exit_code = code,
                stderr = %stderr.chars().take(500).collect::<String>(),
                "Package manager failed"
            );
            return Err(AppError::installation(format!(
                "'{command}' failed with exit code {code}: {}",
                stderr.chars().take(2000).collect::<String>()
            )));
        }

        debug!(
            command = %command,
            stdout = %String::from_utf8_lossy(&output.stdout).chars().take(500).collect::<String>(),
            "Package manager finished"
        );

        Ok(())
    }
}

/// Builds `PackageCommand`s for a given program and directory.
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    program: String,
    cwd: PathBuf,
}

impl CommandBuilder {
    /// Creates a builder for `program` run inside `cwd`.
    pub fn new(program: &str, cwd: &Path) -> Self {
        Self {
            program: program.to_string(),
            cwd: cwd.to_path_buf(),
        }
    }

    /// `add <spec>`.
    pub fn add(&self, spec: &str) -> PackageCommand {
        self.build(&["add", spec])
    }

    /// `upgrade <spec>`.
    pub fn upgrade(&self, spec: &str) -> PackageCommand {
        self.build(&["upgrade", spec])
    }

    /// `remove <name>`.
    pub fn remove(&self, name: &str) -> PackageCommand {
        self.build(&["remove", name])
    }

    fn build(&self, args: &[&str]) -> PackageCommand {
        PackageCommand {
            program: self.program.clone(),
            args: args.iter().map(|a| a.to_string()).collect(),
            cwd: self.cwd.clone(),
        }
    }
}
