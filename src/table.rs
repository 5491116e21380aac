//! Metadata table backing the table resolution strategy.

use std::{collections::HashMap, path::Path};

use semver::Version;
use serde::Deserialize;

use crate::{
    error::{BatchError, ResolveError},
    utils,
};

/// One row of the metadata table. Additional columns are ignored.
#[derive(Clone, Debug, Deserialize)]
struct Record {
    #[serde(rename = "ContractAddress")]
    contract_address: String,
    #[serde(rename = "CompilerVersion")]
    compiler_version: String,
}

/// An in-memory compiler-version table keyed by lowercased unit identity.
///
/// The on-disk format is the etherscan contract export: a CSV with at least
/// the `ContractAddress` and `CompilerVersion` columns, the latter in its
/// `v<major>.<minor>.<patch>+commit.<hash>` form.
#[derive(Clone, Debug, Default)]
pub struct MetadataTable {
    records: HashMap<String, String>,
}

impl MetadataTable {
    /// Loads the table from a CSV file. A later row for the same identity
    /// replaces an earlier one.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, BatchError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(BatchError::TableNotFound { path: path.to_path_buf() })
        }
        let mut reader = csv::Reader::from_path(path)?;
        let mut records = HashMap::new();
        for record in reader.deserialize() {
            let Record { contract_address, compiler_version } = record?;
            records.insert(contract_address.to_lowercase(), compiler_version);
        }
        tracing::debug!("loaded {} metadata records from \"{}\"", records.len(), path.display());
        Ok(Self { records })
    }

    /// Builds a table from `(identity, compiler version field)` pairs.
    pub fn from_records<I, K, V>(records: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            records: records
                .into_iter()
                .map(|(identity, field)| (identity.into().to_lowercase(), field.into()))
                .collect(),
        }
    }

    /// Number of records in the table.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Looks up `identity` case-insensitively and extracts the exact release
    /// from the record's compiler version field.
    pub fn version_of(&self, identity: &str) -> Result<Version, ResolveError> {
        let field = self
            .records
            .get(&identity.to_lowercase())
            .ok_or_else(|| ResolveError::NotFound { identity: identity.to_string() })?;
        let malformed = || ResolveError::MalformedVersion {
            identity: identity.to_string(),
            field: field.clone(),
        };
        let triple = utils::RE_METADATA_VERSION
            .captures(field)
            .and_then(|captures| captures.name("version"))
            .ok_or_else(malformed)?;
        Version::parse(triple.as_str()).map_err(|_| malformed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn extracts_release_from_field() {
        let table =
            MetadataTable::from_records([("0xabc", "v0.4.17+commit.bdeb9e52"), ("0xdef", "v0.8.19")]);
        assert_eq!(table.version_of("0xabc").unwrap(), Version::new(0, 4, 17));
        assert_eq!(table.version_of("0xdef").unwrap(), Version::new(0, 8, 19));
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let table = MetadataTable::from_records([("0xAbCdEf", "v0.6.12+commit.27d51765")]);
        assert_eq!(table.version_of("0xABCDEF").unwrap(), Version::new(0, 6, 12));
        assert_eq!(table.version_of("0xabcdef").unwrap(), Version::new(0, 6, 12));
    }

    #[test]
    fn missing_identity_is_an_error() {
        let table = MetadataTable::from_records([("0xabc", "v0.8.0+commit.c7dfd78e")]);
        assert!(matches!(
            table.version_of("0xother"),
            Err(ResolveError::NotFound { identity }) if identity == "0xother"
        ));
    }

    #[test]
    fn field_without_release_is_malformed() {
        let table = MetadataTable::from_records([("0xabc", "vyper:0.2.11")]);
        assert!(matches!(table.version_of("0xabc"), Err(ResolveError::MalformedVersion { .. })));
    }

    #[test]
    fn loads_csv_with_extra_columns() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("info.csv");
        std::fs::write(
            &path,
            "Txhash,ContractAddress,ContractName,CompilerVersion,Balance\n\
             0x01,0xAAA1,Token,v0.4.24+commit.e67f0147,0\n\
             0x02,0xBBB2,Vault,v0.8.7+commit.e28d00a7,1.5\n",
        )
        .unwrap();

        let table = MetadataTable::load(&path).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.version_of("0xaaa1").unwrap(), Version::new(0, 4, 24));
        assert_eq!(table.version_of("0xBBB2").unwrap(), Version::new(0, 8, 7));
    }

    #[test]
    fn missing_table_file_is_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("info.csv");
        assert!(matches!(
            MetadataTable::load(&missing),
            Err(BatchError::TableNotFound { path }) if path == missing
        ));
    }
}
