//! Representation of a single compilable source file.

use std::{
    fs,
    path::{Path, PathBuf},
};

use md5::Digest;

use crate::error::IoError;

/// The file extension a compilable source unit must carry.
pub const SOURCE_EXTENSION: &str = "sol";

/// A source file scheduled for compilation, together with its position
/// relative to the input root.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SourceUnit {
    /// Location of the file on disk.
    pub path: PathBuf,
    /// The file's directory relative to the input root. Empty for files at
    /// the root itself and for single-file inputs.
    pub rel_dir: PathBuf,
    /// Raw source text.
    pub content: String,
}

impl SourceUnit {
    /// Reads the file at `path`, recording where it sits relative to `root`.
    pub fn read(path: impl Into<PathBuf>, root: &Path) -> Result<Self, IoError> {
        let path = path.into();
        let content = fs::read_to_string(&path).map_err(|err| IoError::new(err, &path))?;
        let rel_dir = path
            .parent()
            .and_then(|dir| dir.strip_prefix(root).ok())
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Ok(Self { path, rel_dir, content })
    }

    /// The unit's identity: its file stem. For etherscan-style dumps this is
    /// the contract address the metadata table is keyed by.
    pub fn identity(&self) -> &str {
        self.path.file_stem().and_then(|stem| stem.to_str()).unwrap_or_default()
    }

    /// The unit's file extension.
    pub fn extension(&self) -> &str {
        self.path.extension().and_then(|ext| ext.to_str()).unwrap_or(SOURCE_EXTENSION)
    }

    /// Whether `path` carries the expected source extension.
    pub fn is_source_path(path: &Path) -> bool {
        path.extension().map(|ext| ext == SOURCE_EXTENSION).unwrap_or_default()
    }

    /// Returns the md5 hash of the source text, hex encoded.
    pub fn content_hash(&self) -> String {
        let mut hasher = md5::Md5::new();
        hasher.update(&self.content);
        let result = hasher.finalize();
        hex::encode(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn reads_relative_position() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("tokens/erc20")).unwrap();
        let file = tmp.path().join("tokens/erc20/Token.sol");
        fs::write(&file, "contract Token {}").unwrap();

        let unit = SourceUnit::read(&file, tmp.path()).unwrap();
        assert_eq!(unit.rel_dir, Path::new("tokens/erc20"));
        assert_eq!(unit.identity(), "Token");
        assert_eq!(unit.extension(), "sol");
        assert_eq!(unit.content, "contract Token {}");
    }

    #[test]
    fn root_level_file_has_empty_rel_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("Root.sol");
        fs::write(&file, "contract Root {}").unwrap();

        let unit = SourceUnit::read(&file, tmp.path()).unwrap();
        assert_eq!(unit.rel_dir, Path::new(""));
    }

    #[test]
    fn recognizes_source_paths() {
        assert!(SourceUnit::is_source_path(Path::new("a/b/C.sol")));
        assert!(!SourceUnit::is_source_path(Path::new("a/b/C.txt")));
        assert!(!SourceUnit::is_source_path(Path::new("a/b/sol")));
    }

    #[test]
    fn hashes_content() {
        let unit = SourceUnit {
            path: PathBuf::from("A.sol"),
            rel_dir: PathBuf::new(),
            content: "abc".to_string(),
        };
        assert_eq!(unit.content_hash(), "900150983cd24fb0d6963f7d28e17f72");
    }
}
