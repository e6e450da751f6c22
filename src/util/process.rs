//! Subprocess execution utilities.
//!
//! Every external tool (the VCS client, the code generator) goes through a
//! [`CommandRunner`]. Production code uses [`SystemRunner`]; tests substitute a
//! recording runner so no real process is spawned.

use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use thiserror::Error;

/// Error raised by the process gateway.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// The program could not be started (missing binary, permissions).
    #[error("failed to spawn `{program}`")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    /// The program ran but exited unsuccessfully.
    #[error("`{command}` {}", describe_status(.code))]
    Failed {
        command: String,
        code: Option<i32>,
        output: String,
    },
}

impl ProcessError {
    /// Captured stdout+stderr of a failed process, if any.
    pub fn output(&self) -> Option<&str> {
        match self {
            ProcessError::Failed { output, .. } if !output.trim().is_empty() => Some(output),
            _ => None,
        }
    }
}

fn describe_status(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("failed with exit code {}", code),
        None => "was terminated by a signal".to_string(),
    }
}

/// Exit status and combined output of a finished process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code, `None` when killed by a signal.
    pub code: Option<i32>,
    /// Stdout followed by stderr.
    pub output: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Builder for subprocess execution.
#[derive(Debug, Clone)]
pub struct ProcessBuilder {
    program: PathBuf,
    args: Vec<OsString>,
    env: BTreeMap<String, String>,
    cwd: Option<PathBuf>,
}

impl ProcessBuilder {
    /// Create a new process builder for the given program.
    pub fn new(program: impl AsRef<Path>) -> Self {
        ProcessBuilder {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
            env: BTreeMap::new(),
            cwd: None,
        }
    }

    /// Add a single argument.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|s| s.as_ref().to_os_string()));
        self
    }

    /// Set an environment variable.
    pub fn env(mut self, key: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.env
            .insert(key.as_ref().to_string(), value.as_ref().to_string());
        self
    }

    /// Set the working directory.
    pub fn cwd(mut self, cwd: impl AsRef<Path>) -> Self {
        self.cwd = Some(cwd.as_ref().to_path_buf());
        self
    }

    /// Get the program path.
    pub fn get_program(&self) -> &Path {
        &self.program
    }

    /// Get the arguments.
    pub fn get_args(&self) -> &[OsString] {
        &self.args
    }

    /// Get the working directory, if one was set.
    pub fn get_cwd(&self) -> Option<&Path> {
        self.cwd.as_deref()
    }

    fn build_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);

        for (key, value) in &self.env {
            cmd.env(key, value);
        }

        if let Some(ref cwd) = self.cwd {
            cmd.current_dir(cwd);
        }

        cmd
    }

    /// Execute the command and wait for completion.
    ///
    /// A non-zero exit is not an error here; see [`CommandRunner::run_checked`].
    pub fn exec(&self) -> Result<ProcessOutput, ProcessError> {
        let mut cmd = self.build_command();
        cmd.stdin(Stdio::null());

        let output = cmd.output().map_err(|source| ProcessError::Spawn {
            program: self.program.display().to_string(),
            source,
        })?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        Ok(ProcessOutput {
            code: output.status.code(),
            output: combined,
        })
    }

    /// Display the command for error messages.
    pub fn display_command(&self) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(self.args.iter().map(|arg| arg.to_string_lossy().into_owned()));
        parts.join(" ")
    }
}

/// Capability to run external commands synchronously.
pub trait CommandRunner: Send + Sync {
    /// Run the command to completion, returning its exit code and output.
    fn run(&self, cmd: &ProcessBuilder) -> Result<ProcessOutput, ProcessError>;

    /// Run the command and treat a non-zero exit as [`ProcessError::Failed`].
    fn run_checked(&self, cmd: &ProcessBuilder) -> Result<ProcessOutput, ProcessError> {
        let output = self.run(cmd)?;
        if !output.success() {
            return Err(ProcessError::Failed {
                command: cmd.display_command(),
                code: output.code,
                output: output.output,
            });
        }
        Ok(output)
    }
}

/// Runs commands as real child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, cmd: &ProcessBuilder) -> Result<ProcessOutput, ProcessError> {
        tracing::debug!("Executing {}", cmd.display_command());
        cmd.exec()
    }
}

/// Find an executable in PATH.
pub fn find_executable(name: impl AsRef<OsStr>) -> Option<PathBuf> {
    which::which(name).ok()
}
