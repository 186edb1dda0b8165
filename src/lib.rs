//! configbytes - recover the embedded config bytes from Android payload packages.
//!
//! The package is unpacked, its bytecode converted to a class tree, and the
//! class carrying the configuration array is located, decompiled and cut
//! out. Untouched payload builds keep the class at `<package>/Payload.class`;
//! for applications with a spliced-in payload the obfuscated
//! `<package>/?????/?????.class` candidates are searched instead.
//!
//! # Example
//!
//! ```no_run
//! use configbytes::{check_tools, run, Converters, ExtractConfig, Fernflower, REQUIRED_TOOLS};
//!
//! check_tools(REQUIRED_TOOLS).unwrap();
//! let config = ExtractConfig::new("metasploit.apk", "/opt/fernflower.jar");
//! let decompiler = Fernflower::new(&config.fernflower_jar);
//! let report = run(&config, &Converters::default(), &decompiler).unwrap();
//! println!("{} bytes written to {}", report.extraction.bytes_written, report.extraction.output.display());
//! ```

pub mod cli;
pub mod config;
pub mod decompiler;
pub mod error;
pub mod extractor;
pub mod locator;
pub mod manifest;
pub mod pipeline;
pub mod prepare;
pub mod tools;
pub mod unpack;
pub mod workspace;

pub use config::{ExtractConfig, REQUIRED_TOOLS};
pub use decompiler::{Fernflower, SourceMaterializer};
pub use error::ExtractError;
pub use locator::{locate, LocatorResult};
pub use manifest::Manifest;
pub use pipeline::{extract_payload, Extraction, Outcome, PayloadRequest, Scenario};
pub use prepare::{prepare, Converters};
pub use tools::check_tools;
pub use workspace::Workspace;

use anyhow::Result;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Summary of a successful run
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionReport {
    pub apk: PathBuf,
    pub package: String,
    #[serde(flatten)]
    pub extraction: Extraction,
    /// Set when the working directory was kept
    pub workdir: Option<PathBuf>,
}

/// Run the whole extraction for `config`.
///
/// The working directory is removed (or kept, per the config) on every
/// path out of this function, including failures.
pub fn run(
    config: &ExtractConfig,
    converters: &Converters,
    materializer: &dyn SourceMaterializer,
) -> Result<ExtractionReport> {
    config.validate()?;

    let workspace = Workspace::new()?;
    let output = config.output_path(workspace.root());
    if config.output.is_none() {
        info!("No output option selected, working in {}", workspace.root().display());
    }

    let result = run_in(config, &workspace, converters, materializer, &output);
    let cleanup = workspace.finish(config.keep_workspace());

    let (package, outcome) = result?;
    let workdir = cleanup?;

    match outcome {
        Outcome::Success(extraction) => Ok(ExtractionReport {
            apk: config.apk.clone(),
            package,
            extraction,
            workdir,
        }),
        Outcome::NoPayloadFound => Err(ExtractError::payload_class_not_found(package).into()),
    }
}

fn run_in(
    config: &ExtractConfig,
    workspace: &Workspace,
    converters: &Converters,
    materializer: &dyn SourceMaterializer,
    output: &Path,
) -> Result<(String, Outcome)> {
    let prepared = prepare(config, workspace, converters)?;

    let source_dir = workspace.java_dir();
    fs::create_dir_all(&source_dir)?;

    let package_path = prepared.manifest.package_path();
    let request = PayloadRequest {
        class_root: &prepared.class_root,
        package_path: &package_path,
        source_dir: &source_dir,
        output,
    };
    let outcome = extract_payload(&request, materializer)?;

    Ok((prepared.manifest.package().to_string(), outcome))
}
