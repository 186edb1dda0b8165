//! Turns the input package into a class tree and a decoded manifest.

use crate::config::ExtractConfig;
use crate::error::{ExtractError, Result};
use crate::manifest::Manifest;
use crate::tools::{Apktool, Dex2Jar};
use crate::unpack::unpack_zip;
use crate::workspace::Workspace;
use std::path::PathBuf;
use tracing::info;

/// Everything the payload search needs from the package
#[derive(Debug, Clone)]
pub struct PreparedPackage {
    pub manifest: Manifest,
    pub class_root: PathBuf,
}

/// Converters run while preparing a package
#[derive(Debug, Clone, Default)]
pub struct Converters {
    pub dex2jar: Dex2Jar,
    pub apktool: Apktool,
}

/// Unpack the package, convert its bytecode into a class tree and decode
/// the manifest, all inside `workspace`.
pub fn prepare(config: &ExtractConfig, workspace: &Workspace, converters: &Converters) -> Result<PreparedPackage> {
    info!("Unpacking {} for classes.dex", config.apk.display());
    unpack_zip(&config.apk, &workspace.package_dir(), &config.archive_limits)?;

    let dex = workspace.dex_file();
    if !dex.is_file() {
        return Err(ExtractError::archive_extraction(format!(
            "no classes.dex in {}",
            config.apk.display()
        )));
    }

    info!("Using d2j-dex2jar on dex file to create jar file");
    let jar = workspace.classes_jar();
    let output = converters.dex2jar.convert(&dex, &jar)?;
    if !jar.is_file() {
        return Err(ExtractError::tool_failed(
            output.program.as_str(),
            output.status_display(),
            output.combined().trim(),
        ));
    }

    info!("Unpacking jar file for class files");
    let class_root = workspace.classes_dir();
    unpack_zip(&jar, &class_root, &config.archive_limits)?;

    info!("Using apktool to read AndroidManifest");
    converters.apktool.decode(&config.apk, &workspace.decompile_dir())?;

    let manifest = Manifest::load(&workspace.manifest_file())?;
    info!("Package path found: {}", manifest.package_path().display());

    Ok(PreparedPackage { manifest, class_root })
}
