#![doc = include_str!("../README.md")]

pub mod artifacts;
pub mod compile;
pub mod error;
pub mod resolve;
pub mod scan;
pub mod sources;
pub mod table;
pub mod toolchain;
pub mod utils;

pub use artifacts::ArtifactWriter;
pub use compile::{CompilationResult, ContractBytecode, Solc};
pub use error::{BatchError, CompileError, IoError, ResolveError, ToolchainError};
pub use resolve::{VersionResolver, VersionSpec};
pub use scan::{scan_declarations, Declaration, DeclarationKind};
pub use sources::SourceUnit;
pub use table::MetadataTable;
pub use toolchain::{Toolchain, ToolchainManager};

use std::{
    fmt,
    path::{Path, PathBuf},
};

use crate::error::Result;

/// Default directory artifacts are written under.
pub const DEFAULT_OUTPUT_DIR: &str = "bytecodes";

/// Aggregate counters of one batch run.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct BatchStats {
    /// Units that compiled and persisted successfully.
    pub processed: usize,
    /// Units that failed at any stage of their pipeline.
    pub failed: usize,
}

impl BatchStats {
    /// Total number of units the run attempted.
    pub fn total(&self) -> usize {
        self.processed + self.failed
    }
}

impl fmt::Display for BatchStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "processed {}, failed {}", self.processed, self.failed)
    }
}

/// Drives the per-unit pipeline, resolve then activate then compile then
/// write, over a source file or a directory tree.
///
/// Units are processed strictly sequentially: only one compiler release can
/// be active at a time, so every unit runs against the same toolchain in
/// turn. A failing unit is counted and logged, never letting it abort the
/// rest of the batch.
///
/// ```no_run
/// use solc_batch::BatchCompiler;
///
/// # fn main() -> Result<(), solc_batch::BatchError> {
/// let mut compiler = BatchCompiler::builder().output_dir("bytecodes").build();
/// let stats = compiler.run("contracts")?;
/// println!("{stats}");
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct BatchCompiler<T = ToolchainManager> {
    resolver: VersionResolver,
    toolchain: T,
    writer: ArtifactWriter,
}

impl BatchCompiler<ToolchainManager> {
    /// A compiler over the default svm-backed toolchain, writing artifacts
    /// under `output_dir`.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self::builder().output_dir(output_dir).build()
    }

    /// Configure a compiler step by step.
    pub fn builder() -> BatchCompilerBuilder {
        BatchCompilerBuilder::default()
    }
}

impl<T: Toolchain> BatchCompiler<T> {
    /// A compiler over a caller-provided toolchain implementation.
    pub fn with_toolchain(toolchain: T, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            resolver: VersionResolver::default(),
            toolchain,
            writer: ArtifactWriter::new(output_dir),
        }
    }

    /// Selects the version resolution strategy.
    #[must_use]
    pub fn resolver(mut self, resolver: VersionResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// The underlying toolchain.
    pub fn toolchain(&self) -> &T {
        &self.toolchain
    }

    /// The directory artifacts are written under.
    pub fn output_dir(&self) -> &Path {
        self.writer.root()
    }

    /// Runs the batch over `input`, a `.sol` file or a directory tree.
    ///
    /// Returns the aggregate stats. An error return means the run aborted
    /// before processing any unit; per-unit failures only show up in
    /// [`BatchStats::failed`].
    pub fn run(&mut self, input: impl AsRef<Path>) -> Result<BatchStats> {
        let input = input.as_ref();
        if input.is_file() {
            if !SourceUnit::is_source_path(input) {
                return Err(BatchError::NotASource { path: input.to_path_buf() })
            }
            let root = input.parent().unwrap_or_else(|| Path::new("")).to_path_buf();
            self.run_units(&root, vec![input.to_path_buf()])
        } else if input.is_dir() {
            let root = utils::canonicalize(input)?;
            let files = utils::source_files(&root);
            tracing::info!("found {} source files under \"{}\"", files.len(), input.display());
            self.run_units(&root, files)
        } else {
            Err(BatchError::InputNotFound { path: input.to_path_buf() })
        }
    }

    fn run_units(&mut self, root: &Path, files: Vec<PathBuf>) -> Result<BatchStats> {
        let mut stats = BatchStats::default();
        for file in files {
            match self.process_file(root, &file) {
                Ok(artifacts) => {
                    stats.processed += 1;
                    tracing::info!(
                        "processed \"{}\": {} artifacts",
                        file.display(),
                        artifacts.len()
                    );
                }
                Err(err) => {
                    stats.failed += 1;
                    tracing::error!("failed to process \"{}\": {}", file.display(), err);
                }
            }
        }
        tracing::info!("batch finished: {}", stats);
        Ok(stats)
    }

    /// Runs one unit through the full pipeline. Every error returned here is
    /// unit-scoped; the caller counts it and moves on to the next unit.
    fn process_file(&mut self, root: &Path, file: &Path) -> Result<Vec<PathBuf>> {
        let unit = SourceUnit::read(file, root)?;
        let spec = self.resolver.resolve(&unit)?;
        let version = self.toolchain.ensure_active(&spec)?;
        tracing::debug!("compiling \"{}\" with solc {}", file.display(), version);
        let result = self.toolchain.compile(&unit)?;
        Ok(self.writer.write(&unit, &result)?)
    }
}

/// Builder for [`BatchCompiler`] over the default svm-backed toolchain.
#[derive(Debug, Default)]
pub struct BatchCompilerBuilder {
    output_dir: Option<PathBuf>,
    resolver: VersionResolver,
    optimizer_runs: Option<usize>,
    offline: bool,
}

impl BatchCompilerBuilder {
    /// Directory artifacts are written under, `bytecodes` by default.
    #[must_use]
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    /// Version resolution strategy, the pragma scan by default.
    #[must_use]
    pub fn resolver(mut self, resolver: VersionResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Overrides the optimizer run count.
    #[must_use]
    pub fn optimizer_runs(mut self, runs: usize) -> Self {
        self.optimizer_runs = Some(runs);
        self
    }

    /// Restricts the toolchain to already-installed solc versions.
    #[must_use]
    pub fn offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    pub fn build(self) -> BatchCompiler<ToolchainManager> {
        let Self { output_dir, resolver, optimizer_runs, offline } = self;
        let mut toolchain = ToolchainManager::new().offline(offline);
        if let Some(runs) = optimizer_runs {
            toolchain = toolchain.optimizer_runs(runs);
        }
        BatchCompiler {
            resolver,
            toolchain,
            writer: ArtifactWriter::new(
                output_dir.unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
            ),
        }
    }
}
