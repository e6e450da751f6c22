//! protoc invocation.
//!
//! One generator run per proto file: a language specific output flag
//! pointing at the clone, followed by the proto path relative to the
//! monorepo root. protoc runs with the root as working directory so that
//! relative path resolves against its default include path.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::core::Language;
use crate::util::process::{CommandRunner, ProcessBuilder, ProcessError, ProcessOutput};

/// Output flag for `language`, writing into `dest`.
///
/// Returns `None` for languages protoc is not set up to generate.
pub fn output_flag(language: &Language, dest: &Path) -> Option<OsString> {
    let mut flag = match language {
        Language::Go => OsString::from("--go_out=plugins=grpc:"),
        Language::Other(_) => return None,
    };
    flag.push(dest);
    Some(flag)
}

/// Full generator argument list for one proto file.
pub fn generator_args(language: &Language, dest: &Path, proto: &Path) -> Option<Vec<OsString>> {
    let flag = output_flag(language, dest)?;
    Some(vec![flag, proto.as_os_str().to_os_string()])
}

/// Runs protoc from the monorepo root.
pub struct ProtocGenerator<'a> {
    program: PathBuf,
    root: PathBuf,
    runner: &'a dyn CommandRunner,
}

impl<'a> ProtocGenerator<'a> {
    pub fn new(
        program: impl Into<PathBuf>,
        root: impl Into<PathBuf>,
        runner: &'a dyn CommandRunner,
    ) -> Self {
        ProtocGenerator {
            program: program.into(),
            root: root.into(),
            runner,
        }
    }

    pub fn supports(&self, language: &Language) -> bool {
        output_flag(language, Path::new("")).is_some()
    }

    /// Generate `proto` (root-relative) for `language` into `dest`.
    ///
    /// Unsupported languages must be filtered out by the caller; they are
    /// reported as a spawn-free failure here.
    pub fn generate(
        &self,
        language: &Language,
        dest: &Path,
        proto: &Path,
    ) -> Result<ProcessOutput, ProcessError> {
        let Some(args) = generator_args(language, dest, proto) else {
            return Err(ProcessError::Failed {
                command: self.program.display().to_string(),
                code: None,
                output: format!("language {} not supported", language),
            });
        };

        let cmd = ProcessBuilder::new(&self.program)
            .args(args)
            .cwd(&self.root);
        tracing::info!("Executing {}", cmd.display_command());

        self.runner.run_checked(&cmd)
    }
}
