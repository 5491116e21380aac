//! Utility functions.

use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use semver::Version;
use walkdir::WalkDir;

use crate::{error::IoError, scan, sources::SOURCE_EXTENSION};

/// A regex that matches the version part of a solidity pragma
/// as follows: `pragma solidity ^0.5.2;` => `^0.5.2`
pub static RE_SOL_PRAGMA_VERSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"pragma\s+solidity\s+(?P<version>.+?);").unwrap());

/// A regex that matches the release triple inside an etherscan-style compiler
/// version field: `v0.4.17+commit.bdeb9e52` => `0.4.17`
pub static RE_METADATA_VERSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"v(?P<version>\d+\.\d+\.\d+)").unwrap());

/// Returns the version expression of the first `pragma solidity` directive in
/// `content`, if any.
///
/// Directives buried in line or block comments are skipped.
pub fn find_version_pragma(content: &str) -> Option<String> {
    let mut in_block_comment = false;
    for line in content.lines() {
        let code = scan::strip_comments(line, &mut in_block_comment);
        if let Some(version) =
            RE_SOL_PRAGMA_VERSION.captures(&code).and_then(|captures| captures.name("version"))
        {
            return Some(version.as_str().to_string())
        }
    }
    None
}

/// Returns the paths of all solidity files under the root, in a stable
/// directory-walk order.
///
/// NOTE: this does not resolve imports from other locations.
pub fn source_files(root: impl AsRef<Path>) -> Vec<PathBuf> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().map(|ext| ext == SOURCE_EXTENSION).unwrap_or_default())
        .map(|e| e.path().into())
        .collect()
}

/// Returns the solc versions installed as subdirectories of `root`, sorted
/// oldest to newest.
pub fn installed_versions(root: impl AsRef<Path>) -> Vec<Version> {
    let mut versions: Vec<_> = WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_dir())
        .filter_map(|e| {
            e.path().file_name().and_then(|dir| Version::parse(&dir.to_string_lossy()).ok())
        })
        .collect();
    versions.sort();
    versions
}

/// Canonicalize the path, platform-agnostic.
pub fn canonicalize(path: impl AsRef<Path>) -> Result<PathBuf, IoError> {
    let path = path.as_ref();
    dunce::canonicalize(path).map_err(|err| IoError::new(err, path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};

    #[test]
    fn can_find_version_pragma() {
        let source = "pragma solidity ^0.5.2;\ncontract A {}";
        assert_eq!(find_version_pragma(source).as_deref(), Some("^0.5.2"));
    }

    #[test]
    fn pragma_range_keeps_spaces() {
        let source = "pragma solidity >=0.4.22 <0.6.0;";
        assert_eq!(find_version_pragma(source).as_deref(), Some(">=0.4.22 <0.6.0"));
    }

    #[test]
    fn commented_out_pragma_is_ignored() {
        let source = "// pragma solidity ^0.9.9;\npragma solidity 0.8.17;\n";
        assert_eq!(find_version_pragma(source).as_deref(), Some("0.8.17"));
    }

    #[test]
    fn pragma_inside_block_comment_is_ignored() {
        let source = "/*\npragma solidity ^0.4.0;\n*/\npragma solidity ^0.6.12;\n";
        assert_eq!(find_version_pragma(source).as_deref(), Some("^0.6.12"));
    }

    #[test]
    fn missing_pragma_is_none() {
        assert_eq!(find_version_pragma("contract A {}"), None);
    }

    #[test]
    fn finds_solidity_sources() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("nested/deeper")).unwrap();
        File::create(tmp.path().join("A.sol")).unwrap();
        File::create(tmp.path().join("nested/B.sol")).unwrap();
        File::create(tmp.path().join("nested/deeper/C.sol")).unwrap();
        File::create(tmp.path().join("README.md")).unwrap();
        let files = source_files(tmp.path());
        assert_eq!(files.len(), 3);
        assert!(files.iter().all(|f| f.extension().map(|ext| ext == "sol").unwrap_or_default()));
    }

    #[test]
    fn lists_installed_versions_sorted() {
        let tmp = tempfile::tempdir().unwrap();
        for dir in ["0.8.19", "0.4.17", "0.8.1", "not-a-version"] {
            fs::create_dir(tmp.path().join(dir)).unwrap();
        }
        File::create(tmp.path().join("0.5.5")).unwrap();
        let versions = installed_versions(tmp.path());
        let expected: Vec<Version> =
            ["0.4.17", "0.8.1", "0.8.19"].iter().map(|v| v.parse().unwrap()).collect();
        assert_eq!(versions, expected);
    }
}
