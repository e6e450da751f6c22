//! Test doubles for the process gateway and version control.
//!
//! # Example
//!
//! ```rust,ignore
//! use protodeploy::test_support::{FakeVcs, MockProcessOutput, MockRunner, VcsOp};
//!
//! #[test]
//! fn test_example() {
//!     let mut runner = MockRunner::new();
//!     runner.expect_prefix("protoc", MockProcessOutput::success(""));
//!
//!     let vcs = FakeVcs::new().with_hash("abc1234").fail(VcsOp::Push);
//!
//!     // Use doubles in tests...
//! }
//! ```

pub mod fixtures;

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::sources::VersionControl;
use crate::util::process::{CommandRunner, ProcessBuilder, ProcessError, ProcessOutput};

pub use fixtures::*;

/// Mock process output for testing command execution.
#[derive(Debug, Clone)]
pub struct MockProcessOutput {
    /// Exit status code (0 = success).
    pub status: i32,
    /// Combined stdout and stderr.
    pub output: String,
}

impl MockProcessOutput {
    /// Create a successful output.
    pub fn success(output: impl Into<String>) -> Self {
        MockProcessOutput {
            status: 0,
            output: output.into(),
        }
    }

    /// Create a failure output with the given status code.
    pub fn failure(status: i32, output: impl Into<String>) -> Self {
        MockProcessOutput {
            status,
            output: output.into(),
        }
    }

    fn to_process_output(&self) -> ProcessOutput {
        ProcessOutput {
            code: Some(self.status),
            output: self.output.clone(),
        }
    }
}

impl Default for MockProcessOutput {
    fn default() -> Self {
        MockProcessOutput::success("")
    }
}

/// Pattern for matching commands in MockRunner.
#[derive(Debug, Clone)]
pub enum CommandPattern {
    /// Exact match on full command string.
    Exact(String),
    /// Match if command starts with prefix.
    StartsWith(String),
    /// Match if command contains substring.
    Contains(String),
}

impl CommandPattern {
    /// Check if this pattern matches the given command.
    pub fn matches(&self, cmd: &str) -> bool {
        match self {
            CommandPattern::Exact(s) => cmd == s,
            CommandPattern::StartsWith(s) => cmd.starts_with(s),
            CommandPattern::Contains(s) => cmd.contains(s),
        }
    }
}

/// Expectation for a command execution.
#[derive(Debug, Clone)]
pub struct CommandExpectation {
    /// Pattern to match against commands.
    pub pattern: CommandPattern,
    /// Output to return when matched.
    pub output: MockProcessOutput,
}

/// A command seen by [`MockRunner`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
}

impl RecordedCall {
    /// The command line as a single string.
    pub fn display(&self) -> String {
        let mut parts = vec![self.program.clone()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }
}

/// Recording [`CommandRunner`] that returns scripted outputs.
///
/// Expectations are checked in insertion order; the first match wins.
/// Unmatched commands get the default output, or fail to "spawn" when no
/// default is set.
#[derive(Debug, Default)]
pub struct MockRunner {
    expectations: Vec<CommandExpectation>,
    calls: Mutex<Vec<RecordedCall>>,
    default_output: Option<MockProcessOutput>,
}

impl MockRunner {
    /// Create a new mock runner.
    pub fn new() -> Self {
        MockRunner::default()
    }

    /// Add an expectation for an exact command match.
    pub fn expect(&mut self, cmd: &str, output: MockProcessOutput) -> &mut Self {
        self.expectations.push(CommandExpectation {
            pattern: CommandPattern::Exact(cmd.to_string()),
            output,
        });
        self
    }

    /// Add an expectation for a command starting with a prefix.
    pub fn expect_prefix(&mut self, prefix: &str, output: MockProcessOutput) -> &mut Self {
        self.expectations.push(CommandExpectation {
            pattern: CommandPattern::StartsWith(prefix.to_string()),
            output,
        });
        self
    }

    /// Add an expectation for a command containing a substring.
    pub fn expect_contains(&mut self, substring: &str, output: MockProcessOutput) -> &mut Self {
        self.expectations.push(CommandExpectation {
            pattern: CommandPattern::Contains(substring.to_string()),
            output,
        });
        self
    }

    /// Set a default output for commands that don't match any expectation.
    pub fn set_default(&mut self, output: MockProcessOutput) -> &mut Self {
        self.default_output = Some(output);
        self
    }

    /// All commands run so far, as strings.
    pub fn calls(&self) -> Vec<String> {
        self.recorded().iter().map(RecordedCall::display).collect()
    }

    /// All commands run so far, with their working directories.
    pub fn recorded(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl CommandRunner for MockRunner {
    fn run(&self, cmd: &ProcessBuilder) -> Result<ProcessOutput, ProcessError> {
        let call = RecordedCall {
            program: cmd.get_program().display().to_string(),
            args: cmd
                .get_args()
                .iter()
                .map(|arg| arg.to_string_lossy().into_owned())
                .collect(),
            cwd: cmd.get_cwd().map(Path::to_path_buf),
        };
        let full_cmd = call.display();
        self.calls.lock().unwrap().push(call);

        if let Some(exp) = self
            .expectations
            .iter()
            .find(|exp| exp.pattern.matches(&full_cmd))
        {
            return Ok(exp.output.to_process_output());
        }

        if let Some(ref default) = self.default_output {
            return Ok(default.to_process_output());
        }

        Err(ProcessError::Spawn {
            program: cmd.get_program().display().to_string(),
            source: io::Error::new(
                io::ErrorKind::NotFound,
                format!("unexpected command: {}", full_cmd),
            ),
        })
    }
}

/// Operations of [`FakeVcs`] that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VcsOp {
    Clone,
    Add,
    Commit,
    ShortHash,
    Tag,
    Push,
}

impl VcsOp {
    fn name(self) -> &'static str {
        match self {
            VcsOp::Clone => "clone",
            VcsOp::Add => "add",
            VcsOp::Commit => "commit",
            VcsOp::ShortHash => "log",
            VcsOp::Tag => "tag",
            VcsOp::Push => "push",
        }
    }
}

/// In-process [`VersionControl`] that records calls.
///
/// Cloning materializes the seed entries in the destination directory
/// (names ending in `/` become directories). Staging snapshots the top-level
/// entries of the clone so tests can inspect the state after reset and
/// generation.
#[derive(Debug)]
pub struct FakeVcs {
    seed: Vec<String>,
    hash: String,
    failures: HashSet<VcsOp>,
    failing_urls: HashSet<String>,
    discard_clone: bool,
    calls: Mutex<Vec<String>>,
    staged: Mutex<Vec<Vec<String>>>,
    clone_dirs: Mutex<Vec<PathBuf>>,
    tags: Mutex<Vec<String>>,
}

impl Default for FakeVcs {
    fn default() -> Self {
        FakeVcs::new()
    }
}

impl FakeVcs {
    /// A repository containing `README.md`, `LICENSE` and `.git/`.
    pub fn new() -> Self {
        FakeVcs {
            seed: vec!["README.md".into(), "LICENSE".into(), ".git/".into()],
            hash: "abc1234".to_string(),
            failures: HashSet::new(),
            failing_urls: HashSet::new(),
            discard_clone: false,
            calls: Mutex::new(Vec::new()),
            staged: Mutex::new(Vec::new()),
            clone_dirs: Mutex::new(Vec::new()),
            tags: Mutex::new(Vec::new()),
        }
    }

    /// Replace the entries created by a clone.
    pub fn with_seed(mut self, entries: &[&str]) -> Self {
        self.seed = entries.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Hash reported by the revision lookup.
    pub fn with_hash(mut self, hash: &str) -> Self {
        self.hash = hash.to_string();
        self
    }

    /// Make every call of `op` fail.
    pub fn fail(mut self, op: VcsOp) -> Self {
        self.failures.insert(op);
        self
    }

    /// Make cloning `url` fail.
    pub fn fail_clone_of(mut self, url: &str) -> Self {
        self.failing_urls.insert(url.to_string());
        self
    }

    /// Delete the destination right after a successful clone, so that the
    /// reset that follows cannot list it.
    pub fn discard_clone(mut self) -> Self {
        self.discard_clone = true;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn staged_entries(&self) -> Vec<Vec<String>> {
        self.staged.lock().unwrap().clone()
    }

    pub fn clone_dirs(&self) -> Vec<PathBuf> {
        self.clone_dirs.lock().unwrap().clone()
    }

    pub fn tags(&self) -> Vec<String> {
        self.tags.lock().unwrap().clone()
    }

    fn record(&self, op: VcsOp, call: String) -> Result<(), ProcessError> {
        self.calls.lock().unwrap().push(call);
        if self.failures.contains(&op) {
            return Err(failure(op));
        }
        Ok(())
    }
}

fn failure(op: VcsOp) -> ProcessError {
    ProcessError::Failed {
        command: format!("git {}", op.name()),
        code: Some(1),
        output: format!("fake {} failure", op.name()),
    }
}

impl VersionControl for FakeVcs {
    fn clone_repo(&self, url: &str, dest: &Path) -> Result<(), ProcessError> {
        self.record(VcsOp::Clone, format!("clone {}", url))?;
        self.clone_dirs.lock().unwrap().push(dest.to_path_buf());
        if self.failing_urls.contains(url) {
            return Err(failure(VcsOp::Clone));
        }

        for entry in &self.seed {
            let result = match entry.strip_suffix('/') {
                Some(dir) => std::fs::create_dir_all(dest.join(dir).join("objects"))
                    .and_then(|_| std::fs::write(dest.join(dir).join("HEAD"), "ref")),
                None => std::fs::write(dest.join(entry), entry.as_bytes()),
            };
            result.map_err(|source| ProcessError::Spawn {
                program: "fake-git".to_string(),
                source,
            })?;
        }

        if self.discard_clone {
            std::fs::remove_dir_all(dest).map_err(|source| ProcessError::Spawn {
                program: "fake-git".to_string(),
                source,
            })?;
        }
        Ok(())
    }

    fn add_all(&self, repo: &Path) -> Result<(), ProcessError> {
        self.record(VcsOp::Add, "add".to_string())?;
        let entries = crate::util::fs::list_entries(repo).map_err(|source| {
            ProcessError::Spawn {
                program: "fake-git".to_string(),
                source,
            }
        })?;
        self.staged.lock().unwrap().push(entries);
        Ok(())
    }

    fn commit(&self, _repo: &Path, message: &str) -> Result<(), ProcessError> {
        self.record(VcsOp::Commit, format!("commit {}", message))
    }

    fn short_hash(&self, _repo: &Path) -> Result<String, ProcessError> {
        self.record(VcsOp::ShortHash, "log".to_string())?;
        Ok(self.hash.clone())
    }

    fn tag(&self, _repo: &Path, name: &str, _message: &str) -> Result<(), ProcessError> {
        self.record(VcsOp::Tag, format!("tag {}", name))?;
        self.tags.lock().unwrap().push(name.to_string());
        Ok(())
    }

    fn push(&self, _repo: &Path, remote: &str, branch: &str) -> Result<(), ProcessError> {
        self.record(VcsOp::Push, format!("push {} {}", remote, branch))
    }
}
