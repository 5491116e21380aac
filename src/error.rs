//! Error variants for each stage of the batch pipeline.

use semver::Version;
use std::{
    io,
    path::{Path, PathBuf},
};
use thiserror::Error;

pub type Result<T, E = BatchError> = std::result::Result<T, E>;

/// An `io::Error` decorated with the path that produced it.
#[derive(Debug, Error)]
#[error("\"{}\": {io}", self.path.display())]
pub struct IoError {
    io: io::Error,
    path: PathBuf,
}

impl IoError {
    pub fn new(io: io::Error, path: impl Into<PathBuf>) -> Self {
        Self { io, path: path.into() }
    }

    /// The path the error occurred at.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl From<IoError> for io::Error {
    fn from(err: IoError) -> Self {
        err.io
    }
}

/// Failure to determine a compiler version for a source unit.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The unit's identity has no row in the metadata table.
    #[error("no metadata record for \"{identity}\"")]
    NotFound { identity: String },
    /// A record exists but its compiler version field carries no
    /// `v<major>.<minor>.<patch>` release.
    #[error("malformed compiler version \"{field}\" in metadata record for \"{identity}\"")]
    MalformedVersion { identity: String, field: String },
    /// The version pragma is present but not a parseable semver requirement.
    #[error("invalid version pragma \"{pragma}\": {source}")]
    InvalidPragma {
        pragma: String,
        #[source]
        source: semver::Error,
    },
}

/// Failure to install or activate a compiler release.
#[derive(Debug, Error)]
pub enum ToolchainError {
    /// Neither the installed set nor the release catalog satisfies the
    /// requested version.
    #[error("no solc release found matching \"{spec}\"")]
    VersionNotFound { spec: String },
    /// An install completed but the expected binary is not on disk.
    #[error("solc {version} is installed but its binary is missing under \"{}\"", .path.display())]
    BinaryMissing { version: Version, path: PathBuf },
    /// A freshly installed binary failed its version check.
    #[error("installed solc {version} failed verification: {message}")]
    Unverified { version: Version, message: String },
    #[error(transparent)]
    Svm(#[from] svm::SolcVmError),
}

/// Failure while invoking `solc` or decoding what it produced.
#[derive(Debug, Error)]
pub enum CompileError {
    /// The compiler rejected a source unit.
    #[error("failed to compile \"{}\": {message}", .unit.display())]
    Unit { unit: PathBuf, message: String },
    /// The compiler exited successfully but its combined-json output did not
    /// deserialize.
    #[error("unreadable solc output for \"{}\": {source}", .unit.display())]
    Output {
        unit: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// Protocol-level failures such as an unparseable `--version` report.
    #[error("solc error: {0}")]
    Solc(String),
    #[error(transparent)]
    Io(#[from] IoError),
    #[error(transparent)]
    Semver(#[from] semver::Error),
}

/// Top-level error type of a batch run.
///
/// The unit-scoped kinds convert into this at the orchestration boundary and
/// are counted as per-unit failures; the remaining variants are run-scoped
/// configuration errors that abort before any unit is processed.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error(transparent)]
    Toolchain(#[from] ToolchainError),
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error(transparent)]
    Io(#[from] IoError),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    /// The input path does not exist.
    #[error("input path \"{}\" does not exist", .path.display())]
    InputNotFound { path: PathBuf },
    /// A single-file input without the `.sol` extension.
    #[error("input file \"{}\" does not have the .sol extension", .path.display())]
    NotASource { path: PathBuf },
    /// The table strategy was selected but the table file is absent.
    #[error("metadata table not found at \"{}\"", .path.display())]
    TableNotFound { path: PathBuf },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_displays_path() {
        let err = IoError::new(io::Error::new(io::ErrorKind::NotFound, "gone"), "a/b.sol");
        let display = err.to_string();
        assert!(display.contains("a/b.sol"), "{display}");
        assert!(display.contains("gone"), "{display}");
    }

    #[test]
    fn unit_errors_carry_the_unit() {
        let err = CompileError::Unit {
            unit: PathBuf::from("contracts/Token.sol"),
            message: "ParserError: Expected ';'".to_string(),
        };
        assert!(err.to_string().contains("contracts/Token.sol"));
        assert!(err.to_string().contains("ParserError"));
    }
}
