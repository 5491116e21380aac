use std::{fs, io, path::PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use solc_batch::{
    artifacts::ArtifactWriter, scan::scan_declarations, sources::SourceUnit, utils, BatchCompiler,
    MetadataTable, VersionResolver,
};

#[derive(Parser)]
#[command(
    name = "solc-batch",
    version,
    about = "Batch-compile Solidity sources into per-contract runtime bytecode"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a source file or directory tree and write one `.hex` artifact
    /// per contract
    Compile {
        /// A Solidity file, or a directory scanned recursively for them
        input: PathBuf,
        /// Directory the bytecode artifacts are written under
        #[arg(short, long, default_value = "bytecodes")]
        output_dir: PathBuf,
        /// Metadata table with ContractAddress and CompilerVersion columns,
        /// conventionally named info.csv. When given, compiler versions come
        /// from the table instead of the version pragmas
        #[arg(short, long)]
        csv_path: Option<PathBuf>,
        /// Only use solc versions that are already installed
        #[arg(long)]
        offline: bool,
    },
    /// List every contract and library declaration as CSV
    Scan {
        /// A Solidity file, or a directory scanned recursively for them
        input: PathBuf,
        /// Write the CSV here instead of standard output
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    match Cli::parse().command {
        Commands::Compile { input, output_dir, csv_path, offline } => {
            cmd_compile(input, output_dir, csv_path, offline)
        }
        Commands::Scan { input, output } => cmd_scan(input, output),
    }
}

fn cmd_compile(
    input: PathBuf,
    output_dir: PathBuf,
    csv_path: Option<PathBuf>,
    offline: bool,
) -> anyhow::Result<()> {
    tracing::info!("input path: \"{}\"", input.display());
    tracing::info!("output directory: \"{}\"", output_dir.display());

    let resolver = match csv_path {
        Some(path) => {
            tracing::info!("metadata table: \"{}\"", path.display());
            VersionResolver::Table(MetadataTable::load(path)?)
        }
        None => VersionResolver::Pragma,
    };

    let mut compiler =
        BatchCompiler::builder().output_dir(output_dir).resolver(resolver).offline(offline).build();
    let stats = compiler.run(&input)?;

    tracing::info!("successfully processed: {} files", stats.processed);
    tracing::info!("failed: {} files", stats.failed);
    Ok(())
}

#[derive(serde::Serialize)]
struct ScanRow<'a> {
    path: &'a str,
    line: usize,
    kind: &'a str,
    name: &'a str,
    artifact: String,
}

fn cmd_scan(input: PathBuf, output: Option<PathBuf>) -> anyhow::Result<()> {
    let (root, files) = if input.is_file() {
        let root = input.parent().unwrap_or_else(|| std::path::Path::new("")).to_path_buf();
        (root, vec![input.clone()])
    } else if input.is_dir() {
        (input.clone(), utils::source_files(&input))
    } else {
        anyhow::bail!("input path \"{}\" does not exist", input.display());
    };

    let out: Box<dyn io::Write> = match &output {
        Some(path) => Box::new(
            fs::File::create(path)
                .with_context(|| format!("failed to create \"{}\"", path.display()))?,
        ),
        None => Box::new(io::stdout()),
    };
    let mut writer = csv::Writer::from_writer(out);

    for file in files {
        let unit = match SourceUnit::read(&file, &root) {
            Ok(unit) => unit,
            Err(err) => {
                tracing::error!("skipping \"{}\": {}", file.display(), err);
                continue
            }
        };
        let path = unit.path.to_string_lossy();
        for declaration in scan_declarations(&unit.content) {
            writer.serialize(ScanRow {
                path: &path,
                line: declaration.line,
                kind: declaration.kind.as_str(),
                name: &declaration.name,
                artifact: ArtifactWriter::file_name(&unit, &declaration.name),
            })?;
        }
    }
    writer.flush()?;
    Ok(())
}
