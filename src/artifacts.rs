//! Output of the pipeline: one bytecode file per compiled contract.

use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{compile::CompilationResult, error::IoError, sources::SourceUnit};

/// The extension artifacts are written with.
pub const ARTIFACT_EXTENSION: &str = "hex";

/// Writes one `.hex` file per compiled contract under an output root,
/// mirroring the relative directory structure of the input tree.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ArtifactWriter {
    root: PathBuf,
}

impl ArtifactWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The output root artifacts are written under.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The artifact file name for one contract of `unit`:
    /// `{stem}_{extension}_{ContractName}.hex`, so `Token.sol` defining
    /// `Ownable` yields `Token_sol_Ownable.hex`.
    pub fn file_name(unit: &SourceUnit, contract: &str) -> String {
        format!("{}_{}_{}.{}", unit.identity(), unit.extension(), contract, ARTIFACT_EXTENSION)
    }

    /// Persists every non-empty runtime bytecode in `result`, returning the
    /// written paths in deterministic order.
    ///
    /// An empty result writes nothing, not even the unit's output directory.
    /// Contracts without runtime bytecode, interfaces and abstract contracts
    /// among them, are skipped. Existing artifacts are overwritten.
    pub fn write(
        &self,
        unit: &SourceUnit,
        result: &CompilationResult,
    ) -> Result<Vec<PathBuf>, IoError> {
        let mut written = Vec::new();
        if result.is_empty() {
            tracing::debug!("no contracts in \"{}\", nothing to write", unit.path.display());
            return Ok(written)
        }
        let dir = self.root.join(&unit.rel_dir);
        fs::create_dir_all(&dir).map_err(|err| IoError::new(err, &dir))?;
        for (id, name, bytecode) in result.runtime_bytecodes() {
            if bytecode.is_empty() {
                tracing::debug!("skipping \"{}\": no runtime bytecode", id);
                continue
            }
            let path = dir.join(Self::file_name(unit, name));
            fs::write(&path, bytecode).map_err(|err| IoError::new(err, &path))?;
            tracing::debug!("wrote \"{}\"", path.display());
            written.push(path);
        }
        Ok(written)
    }
}
