//! Scratch directory for one extraction run.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};

const WORKSPACE_PREFIX: &str = "configbytes-";

/// Owns the per-run working tree:
///
/// ```text
/// <root>/package/                unpacked package
/// <root>/classes.jar             dex2jar output
/// <root>/classes/                class tree from classes.jar
/// <root>/decompile/              apktool output (AndroidManifest.xml)
/// <root>/java/                   decompiled sources
/// ```
///
/// The tree is removed on drop unless [`Workspace::finish`] is asked to keep it.
#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    pub fn new() -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(WORKSPACE_PREFIX)
            .tempdir()
            .context("Failed to create working directory")?;
        debug!("Working directory: {}", dir.path().display());
        Ok(Self { dir })
    }

    /// Create the working directory under `parent` instead of the system temp dir
    pub fn new_in(parent: &Path) -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(WORKSPACE_PREFIX)
            .tempdir_in(parent)
            .with_context(|| format!("Failed to create working directory in {}", parent.display()))?;
        Ok(Self { dir })
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn package_dir(&self) -> PathBuf {
        self.root().join("package")
    }

    pub fn dex_file(&self) -> PathBuf {
        self.package_dir().join("classes.dex")
    }

    pub fn classes_jar(&self) -> PathBuf {
        self.root().join("classes.jar")
    }

    pub fn classes_dir(&self) -> PathBuf {
        self.root().join("classes")
    }

    pub fn decompile_dir(&self) -> PathBuf {
        self.root().join("decompile")
    }

    pub fn manifest_file(&self) -> PathBuf {
        self.decompile_dir().join("AndroidManifest.xml")
    }

    pub fn java_dir(&self) -> PathBuf {
        self.root().join("java")
    }

    /// Remove the tree, or keep it and return where it lives.
    pub fn finish(self, keep: bool) -> Result<Option<PathBuf>> {
        if keep {
            let path = self.dir.keep();
            info!("Working directory kept: {}", path.display());
            Ok(Some(path))
        } else {
            let path = self.dir.path().to_path_buf();
            self.dir
                .close()
                .with_context(|| format!("Failed to remove working directory {}", path.display()))?;
            debug!("Removed working directory {}", path.display());
            Ok(None)
        }
    }
}
