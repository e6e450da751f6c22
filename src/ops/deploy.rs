//! Deployment orchestration.
//!
//! Visits every candidate directory under the root, loads its descriptor and
//! runs the sync engine once per language target. A failure is logged with
//! its directory and target and never stops the remaining work; only an
//! unreadable root aborts the run.

use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::builder::ProtocGenerator;
use crate::core::{
    CandidateDir, DiscoveryError, LanguageTarget, PackageDescriptor, PackageDiscovery,
    PackageUnit,
};
use crate::ops::errors::DeployError;
use crate::ops::sync::{SyncEngine, SyncOutcome};
use crate::sources::GitCli;
use crate::util::diagnostic::{suggestions, Diagnostic};
use crate::util::process::{find_executable, CommandRunner};
use crate::util::DeployConfig;

/// Outcome of one directory or one (package, target) pair.
#[derive(Debug)]
pub struct UnitReport {
    /// Package directory name
    pub directory: String,

    /// The target, when the failure is not about the directory as a whole
    pub target: Option<LanguageTarget>,

    pub result: Result<SyncOutcome, DeployError>,
}

impl UnitReport {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    fn label(&self) -> String {
        match &self.target {
            Some(target) => format!(
                "{} ({} -> {})",
                self.directory, target.language, target.repository
            ),
            None => self.directory.clone(),
        }
    }
}

/// Everything a run attempted, in discovery order regardless of `jobs`.
#[derive(Debug, Default)]
pub struct DeployReport {
    /// Number of directories recognised as packages
    pub packages: usize,

    pub units: Vec<UnitReport>,
}

impl DeployReport {
    pub fn failures(&self) -> impl Iterator<Item = &UnitReport> {
        self.units.iter().filter(|unit| !unit.is_success())
    }

    /// Revisions that were pushed.
    pub fn deployed(&self) -> impl Iterator<Item = (&UnitReport, &str)> {
        self.units.iter().filter_map(|unit| match &unit.result {
            Ok(SyncOutcome::Deployed { revision, .. }) => Some((unit, revision.as_str())),
            _ => None,
        })
    }

    fn push(&mut self, unit: UnitReport) {
        self.units.push(unit);
    }
}

/// Drives discovery, descriptor loading and the sync engine.
pub struct Deployer<'a> {
    root: PathBuf,
    config: &'a DeployConfig,
    engine: SyncEngine<'a>,
}

impl<'a> Deployer<'a> {
    pub fn new(
        root: impl Into<PathBuf>,
        config: &'a DeployConfig,
        engine: SyncEngine<'a>,
    ) -> Self {
        Deployer {
            root: root.into(),
            config,
            engine,
        }
    }

    /// Deploy every package under the root.
    ///
    /// Returns `Err` only when the root cannot be enumerated.
    pub fn run(&self) -> Result<DeployReport, DiscoveryError> {
        let discovery = PackageDiscovery::new(&self.root, self.config);
        let dirs = discovery.scan()?;

        let mut report = DeployReport::default();
        let mut plan = Vec::new();

        for item in dirs {
            let Some(step) = self.load_unit(item) else {
                continue;
            };
            if step.is_ok() {
                report.packages += 1;
            }

            if self.config.jobs > 1 {
                plan.push(step);
                continue;
            }
            match step {
                Ok(unit) => {
                    for target in unit.targets() {
                        let result = self.deploy_target(&unit, target);
                        report.push(result);
                    }
                }
                Err(failed) => report.push(failed),
            }
        }

        if !plan.is_empty() {
            for unit in self.run_parallel(plan) {
                report.push(unit);
            }
        }

        Ok(report)
    }

    /// Load the descriptor of one discovered directory.
    ///
    /// `None` means the directory is not a package; `Err` carries the
    /// already logged failure of the directory as a whole.
    fn load_unit(
        &self,
        item: Result<CandidateDir, DiscoveryError>,
    ) -> Option<Result<PackageUnit, UnitReport>> {
        let candidate = match item {
            Ok(candidate) => candidate,
            Err(err) => {
                let directory = match &err {
                    DiscoveryError::ListDir { dir, .. } => dir.clone(),
                    DiscoveryError::ReadRoot { root, .. } => root.display().to_string(),
                };
                return Some(Err(self.fail_directory(directory, err.into())));
            }
        };

        match PackageDescriptor::load(&candidate.path) {
            Ok(Some(descriptor)) => Some(Ok(PackageUnit::new(candidate, descriptor))),
            Ok(None) => {
                tracing::debug!("`{}` has no descriptor, skipping", candidate.name);
                None
            }
            Err(err) => Some(Err(self.fail_directory(candidate.name, err.into()))),
        }
    }

    fn fail_directory(&self, directory: String, err: DeployError) -> UnitReport {
        tracing::error!(
            "Issue handling {}: {}",
            directory,
            err.to_diagnostic().format().trim_end()
        );
        UnitReport {
            directory,
            target: None,
            result: Err(err),
        }
    }

    /// Sync every (unit, target) pair of `plan` on a bounded pool.
    ///
    /// Reports come back in plan order, with directory failures in the
    /// position they were discovered at.
    fn run_parallel(&self, plan: Vec<Result<PackageUnit, UnitReport>>) -> Vec<UnitReport> {
        let pairs: Vec<(&PackageUnit, &LanguageTarget)> = plan
            .iter()
            .filter_map(|step| step.as_ref().ok())
            .flat_map(|unit| unit.targets().iter().map(move |target| (unit, target)))
            .collect();

        let synced: Vec<UnitReport> = match rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.jobs)
            .build()
        {
            Ok(pool) => pool.install(|| {
                pairs
                    .par_iter()
                    .map(|(unit, target)| self.deploy_target(unit, target))
                    .collect()
            }),
            Err(e) => {
                tracing::warn!("Failed to start worker pool ({}), deploying sequentially", e);
                pairs
                    .iter()
                    .map(|(unit, target)| self.deploy_target(unit, target))
                    .collect()
            }
        };

        let mut synced = synced.into_iter();
        let mut reports = Vec::with_capacity(plan.len());
        for step in plan {
            match step {
                Ok(unit) => reports.extend(synced.by_ref().take(unit.targets().len())),
                Err(failed) => reports.push(failed),
            }
        }
        reports
    }

    fn deploy_target(&self, unit: &PackageUnit, target: &LanguageTarget) -> UnitReport {
        let span = tracing::info_span!(
            "deploy",
            package = unit.directory_name(),
            language = %target.language,
            repository = %target.repository
        );
        let _guard = span.enter();

        tracing::info!(
            "Handling language {} for {}",
            target.language,
            unit.directory_name()
        );

        let result = self.engine.sync(unit, target);
        let report = UnitReport {
            directory: unit.directory_name().to_string(),
            target: Some(target.clone()),
            result: result.map_err(DeployError::from),
        };

        match &report.result {
            Ok(SyncOutcome::Deployed { revision, remote }) => {
                tracing::info!("Deployed {} to {}", revision, remote);
            }
            Ok(SyncOutcome::NothingToCommit) => {
                tracing::info!("{} is up to date", target.remote_url());
            }
            Err(err) => {
                tracing::error!(
                    "Issue handling {}: {}",
                    report.label(),
                    err.to_diagnostic().format().trim_end()
                );
            }
        }

        report
    }
}

/// Check that the external tools can be found.
pub fn preflight(config: &DeployConfig) -> Vec<Diagnostic> {
    [("protoc", &config.generator), ("git", &config.vcs)]
        .into_iter()
        .filter(|(_, program)| find_executable(program).is_none())
        .map(|(tool, program)| {
            Diagnostic::warning(format!("{} not found ({})", tool, program.display()))
                .with_suggestion(suggestions::TOOL_MISSING)
        })
        .collect()
}

/// Deploy every package under `root` using git and protoc through `runner`.
pub fn deploy(
    root: &Path,
    config: &DeployConfig,
    runner: &dyn CommandRunner,
) -> Result<DeployReport, DiscoveryError> {
    for warning in preflight(config) {
        tracing::warn!("{}", warning.format().trim_end());
    }

    let git = GitCli::new(&config.vcs, runner);
    let protoc = ProtocGenerator::new(&config.generator, root, runner);
    let engine = SyncEngine::new(config, &git, protoc).with_prefix(temp_prefix(root));

    Deployer::new(root, config, engine).run()
}

/// Temporary clone prefix derived from the root directory name.
fn temp_prefix(root: &Path) -> String {
    match root.file_name() {
        Some(name) => format!("{}-", name.to_string_lossy()),
        None => "protodeploy-".to_string(),
    }
}
