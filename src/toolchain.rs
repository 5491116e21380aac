//! Installation and activation of solc releases through svm.

use once_cell::sync::Lazy;
use semver::Version;

use crate::{
    compile::{CompilationResult, Solc, DEFAULT_OPTIMIZER_RUNS},
    error::{CompileError, ToolchainError},
    resolve::VersionSpec,
    sources::SourceUnit,
    utils,
};

/// The upstream solc releases bundled with [`svm_builds`], sorted oldest to
/// newest. This is the catalog consulted when deciding what to download.
pub static RELEASES: Lazy<Vec<Version>> = Lazy::new(|| {
    match serde_json::from_str::<svm::Releases>(svm_builds::RELEASE_LIST_JSON) {
        Ok(releases) => releases.into_versions(),
        Err(err) => {
            tracing::error!("failed to parse bundled solc release list: {}", err);
            Vec::new()
        }
    }
});

/// The toolchain surface the batch pipeline drives: activate a compiler
/// matching a version spec, then compile units with whatever is active.
pub trait Toolchain {
    /// Makes a compiler matching `spec` the active one, installing a release
    /// first when none is on disk, and returns the version now active.
    ///
    /// Re-activating the version that is already active is a no-op.
    fn ensure_active(&mut self, spec: &VersionSpec) -> Result<Version, ToolchainError>;

    /// Compiles `unit` with the active compiler.
    fn compile(&mut self, unit: &SourceUnit) -> Result<CompilationResult, CompileError>;
}

/// Manages svm-installed solc releases and tracks which one is active.
///
/// Version selection is deterministic for a fixed catalog and installed set:
/// the newest release matching the spec wins, preferring a newer
/// downloadable release over an older local install.
#[derive(Debug)]
pub struct ToolchainManager {
    /// The version currently active, with its executable.
    active: Option<(Version, Solc)>,
    /// When set, only already-installed versions are selectable and nothing
    /// is downloaded.
    offline: bool,
    /// Optimizer runs applied to every activated compiler.
    optimizer_runs: usize,
}

impl Default for ToolchainManager {
    fn default() -> Self {
        Self { active: None, offline: false, optimizer_runs: DEFAULT_OPTIMIZER_RUNS }
    }
}

impl ToolchainManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts selection to already-installed versions.
    #[must_use]
    pub fn offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    /// Overrides the optimizer run count applied to activated compilers.
    #[must_use]
    pub fn optimizer_runs(mut self, runs: usize) -> Self {
        self.optimizer_runs = runs;
        self
    }

    /// The version currently active, if any.
    pub fn active_version(&self) -> Option<&Version> {
        self.active.as_ref().map(|(version, _)| version)
    }

    /// The versions installed under the svm home directory, oldest first.
    pub fn installed_versions() -> Vec<Version> {
        utils::installed_versions(svm::SVM_HOME.as_path())
    }

    /// Assuming `versions` is sorted ascending, returns the newest one
    /// matching `spec`.
    pub fn find_matching(versions: &[Version], spec: &VersionSpec) -> Option<Version> {
        // iterate in reverse to find the newest match
        versions.iter().rev().find(|version| spec.matches(version)).cloned()
    }

    /// Returns the executable of an installed version, if its binary exists.
    pub fn find_installed(version: &Version) -> Option<Solc> {
        let path = svm::version_path(&version.to_string()).join(format!("solc-{version}"));
        path.is_file().then(|| Solc::new(path))
    }

    /// Deterministically selects the concrete release for `spec` from the
    /// installed set and the bundled catalog.
    fn select(&self, spec: &VersionSpec) -> Result<Version, ToolchainError> {
        let installed = Self::installed_versions();
        let local = Self::find_matching(&installed, spec);
        let remote = if self.offline { None } else { Self::find_matching(&RELEASES, spec) };
        match (local, remote) {
            (Some(local), Some(remote)) => Ok(if remote > local { remote } else { local }),
            (Some(local), None) => Ok(local),
            (None, Some(remote)) => Ok(remote),
            (None, None) => Err(ToolchainError::VersionNotFound { spec: spec.to_string() }),
        }
    }

    /// Installs `version` through svm and verifies the binary it leaves
    /// behind.
    fn install(version: &Version) -> Result<Solc, ToolchainError> {
        tracing::info!("installing solc version \"{}\"", version);
        svm::blocking_install(version)?;
        let solc = Self::find_installed(version).ok_or_else(|| ToolchainError::BinaryMissing {
            version: version.clone(),
            path: svm::version_path(&version.to_string()),
        })?;
        let reported = solc.version_short().map_err(|err| ToolchainError::Unverified {
            version: version.clone(),
            message: err.to_string(),
        })?;
        if reported != *version {
            return Err(ToolchainError::Unverified {
                version: version.clone(),
                message: format!("binary reports {reported}"),
            })
        }
        tracing::info!("installed solc version \"{}\"", version);
        Ok(solc)
    }
}

impl Toolchain for ToolchainManager {
    fn ensure_active(&mut self, spec: &VersionSpec) -> Result<Version, ToolchainError> {
        let version = self.select(spec)?;
        if let Some((active, _)) = &self.active {
            if *active == version {
                tracing::trace!("solc {} already active", version);
                return Ok(version)
            }
        }
        let solc = match Self::find_installed(&version) {
            Some(solc) => solc,
            None => Self::install(&version)?,
        };
        let solc = solc.optimizer(Some(self.optimizer_runs));
        tracing::debug!("activated solc {} at \"{}\"", version, solc.path().display());
        self.active = Some((version.clone(), solc));
        Ok(version)
    }

    fn compile(&mut self, unit: &SourceUnit) -> Result<CompilationResult, CompileError> {
        match &self.active {
            Some((_, solc)) => solc.compile_file(&unit.path),
            None => Err(CompileError::Solc("no solc version is active".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn version(s: &str) -> Version {
        s.parse().unwrap()
    }

    #[test]
    fn release_catalog_is_sorted_and_nonempty() {
        assert!(!RELEASES.is_empty());
        assert!(RELEASES.windows(2).all(|pair| pair[0] <= pair[1]));
    }

    #[test]
    fn picks_newest_matching_version() {
        let versions: Vec<Version> =
            ["0.4.17", "0.5.17", "0.8.19", "0.8.21"].iter().map(|v| version(v)).collect();
        let spec = VersionSpec::Pragma("^0.8.0".parse().unwrap());
        assert_eq!(
            ToolchainManager::find_matching(&versions, &spec),
            Some(version("0.8.21"))
        );
        let exact = VersionSpec::Exact(version("0.5.17"));
        assert_eq!(ToolchainManager::find_matching(&versions, &exact), Some(version("0.5.17")));
        let unsatisfied = VersionSpec::Pragma("^0.7.0".parse().unwrap());
        assert_eq!(ToolchainManager::find_matching(&versions, &unsatisfied), None);
    }

    #[test]
    fn offline_manager_rejects_unknown_versions() {
        let mut manager = ToolchainManager::new().offline(true);
        let missing = VersionSpec::Exact(version("99.99.99"));
        assert!(matches!(
            manager.ensure_active(&missing),
            Err(ToolchainError::VersionNotFound { .. })
        ));
    }

    #[test]
    fn wildcard_selects_newest_release() {
        let manager = ToolchainManager::new();
        let selected = manager.select(&VersionSpec::Pragma(semver::VersionReq::STAR)).unwrap();
        let newest = RELEASES.last().cloned().unwrap();
        assert!(selected >= newest);
    }

    #[test]
    fn absent_version_has_no_binary() {
        assert!(ToolchainManager::find_installed(&version("99.99.99")).is_none());
    }
}
