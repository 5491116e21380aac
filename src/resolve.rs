//! Per-unit compiler version resolution.

use std::fmt;

use semver::{Version, VersionReq};

use crate::{error::ResolveError, sources::SourceUnit, table::MetadataTable, utils};

/// The compiler version constraint resolved for one source unit.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum VersionSpec {
    /// An exact release, as pinned by a metadata record.
    Exact(Version),
    /// A semver requirement extracted from a version pragma. The wildcard
    /// requirement stands in for units without a pragma.
    Pragma(VersionReq),
}

impl VersionSpec {
    /// Whether `version` satisfies this spec.
    pub fn matches(&self, version: &Version) -> bool {
        match self {
            VersionSpec::Exact(exact) => exact == version,
            VersionSpec::Pragma(req) => req.matches(version),
        }
    }
}

impl fmt::Display for VersionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionSpec::Exact(version) => version.fmt(f),
            VersionSpec::Pragma(req) => req.fmt(f),
        }
    }
}

/// Strategy for resolving the compiler version of each unit. Exactly one
/// strategy is active for a whole run.
#[derive(Clone, Debug, Default)]
pub enum VersionResolver {
    /// Scan the unit text for a `pragma solidity` directive.
    #[default]
    Pragma,
    /// Look the unit's identity up in a metadata table.
    Table(MetadataTable),
}

impl VersionResolver {
    /// Resolves the version spec for `unit`.
    ///
    /// Under the pragma strategy the first directive line wins, and units
    /// without one fall back to the wildcard requirement, which the toolchain
    /// resolves to the newest release it knows. Under the table strategy a
    /// missing or malformed record is an error; no fallback applies.
    pub fn resolve(&self, unit: &SourceUnit) -> Result<VersionSpec, ResolveError> {
        match self {
            VersionResolver::Pragma => match utils::find_version_pragma(&unit.content) {
                Some(pragma) => Ok(VersionSpec::Pragma(version_req(&pragma)?)),
                None => {
                    tracing::debug!(
                        "no version pragma in \"{}\", using the newest known release",
                        unit.path.display()
                    );
                    Ok(VersionSpec::Pragma(VersionReq::STAR))
                }
            },
            VersionResolver::Table(table) => {
                table.version_of(unit.identity()).map(VersionSpec::Exact)
            }
        }
    }
}

/// Given a solidity pragma version expression, returns the corresponding
/// semver requirement.
///
/// Solidity separates the bounds of a range with spaces where semver expects
/// commas, and treats a bare version as exact where semver defaults to caret.
pub fn version_req(pragma: &str) -> Result<VersionReq, ResolveError> {
    let expr = pragma.trim().replace(' ', ",");
    let exact = !matches!(expr.chars().next(), Some('*' | '^' | '=' | '>' | '<' | '~'));
    let mut req = VersionReq::parse(&expr).map_err(|source| ResolveError::InvalidPragma {
        pragma: pragma.to_string(),
        source,
    })?;
    if exact && !req.comparators.is_empty() {
        // pragma adopts the exact version, not the default semver caret
        req.comparators[0].op = semver::Op::Exact;
    }
    Ok(req)
}
