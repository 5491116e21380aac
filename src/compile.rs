//! Invocation of a `solc` binary for one source unit at a time.

use std::{
    collections::BTreeMap,
    fmt,
    io::BufRead,
    path::{Path, PathBuf},
    process::{Command, Output, Stdio},
    str::FromStr,
};

use semver::Version;
use serde::{Deserialize, Serialize};

use crate::error::{CompileError, IoError};

/// Optimizer runs applied by default. Part of the reproducibility contract:
/// identical input and settings must yield identical bytecode across runs.
pub const DEFAULT_OPTIMIZER_RUNS: usize = 1_000_000_000;

/// Abstraction over a single `solc` executable.
///
/// Invocations use the `--combined-json bin-runtime` interface, which every
/// release back to the 0.4 line understands, rather than standard-json.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Solc {
    /// Path to the `solc` executable.
    solc: PathBuf,
    /// Optimizer runs; `None` disables the optimizer.
    optimizer: Option<usize>,
    /// Additional arguments passed through to the executable.
    args: Vec<String>,
}

impl Solc {
    /// A new instance which points to `solc`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Solc { solc: path.into(), optimizer: Some(DEFAULT_OPTIMIZER_RUNS), args: Vec::new() }
    }

    /// Sets the optimizer run count, `None` disabling optimization.
    #[must_use]
    pub fn optimizer(mut self, runs: Option<usize>) -> Self {
        self.optimizer = runs;
        self
    }

    /// Adds an argument to pass to the executable.
    #[must_use]
    pub fn arg<T: Into<String>>(mut self, arg: T) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Adds multiple arguments to pass to the executable.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for arg in args {
            self = self.arg(arg);
        }
        self
    }

    /// The path to the configured executable.
    pub fn path(&self) -> &Path {
        &self.solc
    }

    /// Compiles a single source file, returning the runtime bytecode of every
    /// contract and library it defines.
    pub fn compile_file(&self, file: impl AsRef<Path>) -> Result<CompilationResult, CompileError> {
        let file = file.as_ref();
        let mut cmd = Command::new(&self.solc);
        cmd.arg("--combined-json").arg("bin-runtime");
        if let Some(runs) = self.optimizer {
            cmd.arg("--optimize").arg("--optimize-runs").arg(runs.to_string());
        }
        cmd.args(&self.args);
        cmd.arg(file);

        tracing::trace!("compiling \"{}\" with \"{}\"", file.display(), self.solc.display());
        let output = cmd
            .stdin(Stdio::null())
            .stderr(Stdio::piped())
            .stdout(Stdio::piped())
            .output()
            .map_err(|err| IoError::new(err, &self.solc))?;
        if !output.status.success() {
            return Err(CompileError::Unit {
                unit: file.to_path_buf(),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
        let parsed: CompilationResult = serde_json::from_slice(&output.stdout)
            .map_err(|source| CompileError::Output { unit: file.to_path_buf(), source })?;
        tracing::trace!(
            "solc produced {} contracts for \"{}\"",
            parsed.contracts.len(),
            file.display()
        );
        Ok(parsed)
    }

    /// Returns the version from the configured `solc`, stripped of any
    /// prerelease or build metadata.
    pub fn version_short(&self) -> Result<Version, CompileError> {
        let version = self.version()?;
        Ok(Version::new(version.major, version.minor, version.patch))
    }

    /// Returns the full version of the configured `solc`.
    pub fn version(&self) -> Result<Version, CompileError> {
        let output = Command::new(&self.solc)
            .arg("--version")
            .stdin(Stdio::null())
            .stderr(Stdio::piped())
            .stdout(Stdio::piped())
            .output()
            .map_err(|err| IoError::new(err, &self.solc))?;
        version_from_output(output)
    }
}

fn version_from_output(output: Output) -> Result<Version, CompileError> {
    if !output.status.success() {
        return Err(CompileError::Solc(String::from_utf8_lossy(&output.stderr).trim().to_string()))
    }
    let version = output
        .stdout
        .lines()
        .map_while(Result::ok)
        .filter(|l| !l.trim().is_empty())
        .last()
        .ok_or_else(|| CompileError::Solc("version not found in solc output".to_string()))?;
    // venerable solc releases report build metadata semver rejects
    Ok(Version::from_str(&version.trim_start_matches("Version: ").replace(".g++", ".gcc"))?)
}

/// The contract name portion of a fully qualified `<path>:<Name>` identifier.
pub fn contract_name(fully_qualified: &str) -> &str {
    fully_qualified.rsplit(':').next().unwrap_or(fully_qualified)
}

/// Deserialized `--combined-json bin-runtime` output: one entry per fully
/// qualified contract identifier.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct CompilationResult {
    /// Compiled contracts keyed by `<source path>:<ContractName>`.
    #[serde(default)]
    pub contracts: BTreeMap<String, ContractBytecode>,
    /// Long version string of the compiler that produced the output.
    #[serde(default)]
    pub version: String,
}

impl CompilationResult {
    /// Whether the invocation produced no contracts at all.
    pub fn is_empty(&self) -> bool {
        self.contracts.is_empty()
    }

    /// Iterates `(fully qualified identifier, contract name, runtime
    /// bytecode)` in deterministic order.
    pub fn runtime_bytecodes(&self) -> impl Iterator<Item = (&str, &str, &str)> {
        self.contracts.iter().map(|(id, contract)| {
            (id.as_str(), contract_name(id), contract.bin_runtime.as_str())
        })
    }
}

impl fmt::Display for CompilationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} contracts", self.contracts.len())
    }
}

/// Per-contract slice of the combined-json output.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct ContractBytecode {
    /// Runtime (deployed) bytecode as unprefixed hex. Empty for interfaces
    /// and abstract contracts.
    #[serde(rename = "bin-runtime", default)]
    pub bin_runtime: String,
}
