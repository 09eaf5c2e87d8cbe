//! Package Name Derivation
//!
//! Maps a schema's `targetNamespace` (and optionally a version token taken
//! from its file name) to the output package of the generated sources.
//!
//! ```text
//! http://alexanderwolz.de/schema/articles   -> de.alexanderwolz.schema.articles
//! + article_v3.xsd (filename versions on)   -> de.alexanderwolz.schema.articles.v3
//! ```
//!
//! Derivation is a pure function of the namespace and the file name, so a
//! schema lands in the same package on every run and cached episodes stay
//! usable.

use std::fmt;
use std::path::Path;

use crate::error::Result;
use crate::graph::base_name;
use crate::reference::SchemaDocument;

/// Package used when a schema declares no target namespace
pub const DEFAULT_PACKAGE: &str = "generated";

/// Resolved output package for one schema unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageSpec {
    /// Supplied by the caller, used verbatim
    Override(String),
    /// Derived from the target namespace
    Derived {
        base: String,
        version: Option<String>,
    },
    /// Schema has no target namespace
    Fallback,
}

impl PackageSpec {
    pub fn name(&self) -> String {
        match self {
            PackageSpec::Override(name) => name.clone(),
            PackageSpec::Derived { base, version: Some(version) } => format!("{base}.{version}"),
            PackageSpec::Derived { base, version: None } => base.clone(),
            PackageSpec::Fallback => DEFAULT_PACKAGE.to_string(),
        }
    }
}

impl fmt::Display for PackageSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Derives packages for schema files
#[derive(Debug, Clone, Copy, Default)]
pub struct PackageResolver {
    /// Append the file name version token (`article_v3.xsd` -> `v3`)
    pub use_filename_versions: bool,
}

impl PackageResolver {
    pub fn new(use_filename_versions: bool) -> Self {
        Self { use_filename_versions }
    }

    /// Resolve the package for `schema_file`; an explicit override wins.
    pub fn resolve(&self, schema_file: &Path, explicit: Option<&str>) -> Result<PackageSpec> {
        if let Some(name) = explicit {
            return Ok(PackageSpec::Override(name.to_string()));
        }
        let document = SchemaDocument::read(schema_file)?;
        Ok(self.resolve_namespace(document.target_namespace.as_deref(), schema_file))
    }

    /// Resolve from an already known target namespace
    pub fn resolve_namespace(&self, target_namespace: Option<&str>, schema_file: &Path) -> PackageSpec {
        let Some(base) = target_namespace.map(namespace_to_package).filter(|p| !p.is_empty()) else {
            return PackageSpec::Fallback;
        };
        let version = if self.use_filename_versions {
            filename_version(schema_file)
        } else {
            None
        };
        PackageSpec::Derived { base, version }
    }
}

/// Turn a namespace URL into a dotted package path.
///
/// The scheme, a leading `www.` and a port are dropped, host labels are
/// reversed and followed by the path segments. Opaque names such as
/// `urn:example:orders` keep their segment order after the scheme. Blank
/// segments are discarded and the result is lowercased.
pub fn namespace_to_package(namespace: &str) -> String {
    let segments: Vec<&str> = match namespace.split_once("://") {
        Some((_, rest)) => host_and_path(rest),
        None => match namespace.split_once(':') {
            Some((_, rest)) => rest.split([':', '/']).collect(),
            None => host_and_path(namespace),
        },
    };

    segments
        .into_iter()
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join(".")
        .to_lowercase()
}

fn host_and_path(location: &str) -> Vec<&str> {
    let location = location.strip_prefix("www.").unwrap_or(location);
    let (authority, path) = location.split_once('/').unwrap_or((location, ""));
    let host = authority.split(':').next().unwrap_or_default();

    host.split('.').rev().chain(path.split(['/', ':'])).collect()
}

/// Version token of a schema file: the part of its base name after the
/// first underscore (`article_v3.xsd` -> `v3`).
pub fn filename_version(schema_file: &Path) -> Option<String> {
    let name = base_name(schema_file);
    name.split_once('_')
        .map(|(_, version)| version.trim().to_lowercase())
        .filter(|version| !version.is_empty())
}
