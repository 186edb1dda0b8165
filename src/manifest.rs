//! Android manifest handling.
//!
//! Reads the decoded `AndroidManifest.xml` and turns its `package` attribute
//! into the directory path where the package's classes live.

use crate::error::{ExtractError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// The subset of the manifest the extractor cares about
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    package: String,
}

impl Manifest {
    /// Parse manifest XML. `origin` is only used in error messages.
    pub fn parse(xml: &str, origin: &Path) -> Result<Self> {
        let doc = roxmltree::Document::parse(xml)
            .map_err(|e| ExtractError::manifest_malformed(origin, format!("invalid XML: {e}")))?;

        let root = doc.root_element();
        if !root.has_tag_name("manifest") {
            return Err(ExtractError::manifest_malformed(
                origin,
                format!("unexpected root element <{}>", root.tag_name().name()),
            ));
        }

        let package = root
            .attribute("package")
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .ok_or_else(|| ExtractError::manifest_malformed(origin, "missing package attribute"))?;

        if package.split('.').any(str::is_empty) {
            return Err(ExtractError::manifest_malformed(
                origin,
                format!("package has an empty segment: {package}"),
            ));
        }

        Ok(Self { package: package.to_string() })
    }

    pub fn load(path: &Path) -> Result<Self> {
        debug!("Reading manifest: {}", path.display());
        let bytes = fs::read(path).map_err(|e| {
            ExtractError::manifest_malformed(path, format!("cannot read manifest: {e}"))
        })?;
        Self::parse(&String::from_utf8_lossy(&bytes), path)
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    pub fn package_path(&self) -> PathBuf {
        package_path(&self.package)
    }
}

/// Map a dotted package identifier to a relative directory path,
/// one component per segment.
pub fn package_path(package: &str) -> PathBuf {
    package.split('.').collect()
}
