//! Payload extraction from an unpacked class tree.
//!
//! Given the class tree and the package path this decides which class holds
//! the payload, has it decompiled, and writes the array literal out. The two
//! scenarios are picked once by [`locate`]; a well-known class that fails to
//! parse is not retried through the wildcard search.

use crate::decompiler::{source_path_for, SourceMaterializer};
use crate::error::Result;
use crate::extractor::{mentions_byte, read_source, PayloadBytes};
use crate::locator::{locate, LocatorResult};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Which discovery tier produced the payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    /// Untouched build, class kept its original name
    KnownPayload,
    /// Payload spliced into another app under an obfuscated name
    Backdoored,
}

/// A successful extraction
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Extraction {
    pub scenario: Scenario,
    pub class_file: PathBuf,
    pub source_file: PathBuf,
    pub output: PathBuf,
    pub bytes_written: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success(Extraction),
    NoPayloadFound,
}

/// Input paths for one extraction
#[derive(Debug, Clone)]
pub struct PayloadRequest<'a> {
    /// Root of the unpacked class tree
    pub class_root: &'a Path,
    /// Relative package directory from the manifest
    pub package_path: &'a Path,
    /// Where decompiled sources are written
    pub source_dir: &'a Path,
    /// Destination of the extracted bytes
    pub output: &'a Path,
}

/// Locate, decompile and extract the payload for `request`.
///
/// Errors are only returned for failures that should abort the run (I/O
/// on the output file and the like); classes that do not decompile or do
/// not contain a literal are skipped.
pub fn extract_payload(request: &PayloadRequest<'_>, materializer: &dyn SourceMaterializer) -> Result<Outcome> {
    match locate(request.class_root, request.package_path) {
        LocatorResult::KnownPayload(class_file) => extract_known(request, materializer, class_file),
        LocatorResult::SearchCandidates(candidates) => extract_search(request, materializer, &candidates),
        LocatorResult::NotFound => Ok(Outcome::NoPayloadFound),
    }
}

fn extract_known(
    request: &PayloadRequest<'_>,
    materializer: &dyn SourceMaterializer,
    class_file: PathBuf,
) -> Result<Outcome> {
    info!("Using fernflower to change class file to java file");
    materialize(materializer, &class_file, request.source_dir);

    if let Some(class_path) = class_file.parent() {
        info!("Class Path: {}", class_path.display());
    }
    let source_file = source_path_for(&class_file, request.source_dir);
    info!("Metasploit Payload Class found: {}", source_file.display());

    let payload = match read_source(&source_file).and_then(|text| PayloadBytes::from_text(&text, &source_file)) {
        Ok(payload) => payload,
        Err(e) if e.is_candidate_local() => {
            warn!("{}", e);
            return Ok(Outcome::NoPayloadFound);
        }
        Err(e) => return Err(e),
    };

    write_payload(request, Scenario::KnownPayload, class_file, &payload)
}

fn extract_search(
    request: &PayloadRequest<'_>,
    materializer: &dyn SourceMaterializer,
    candidates: &[PathBuf],
) -> Result<Outcome> {
    info!("Looking for backdoored Metasploit payload classes");
    info!("Using fernflower to change {} class files to java files", candidates.len());
    for class_file in candidates {
        materialize(materializer, class_file, &candidate_source_dir(request.source_dir, class_file));
    }

    for class_file in candidates {
        let source_file = source_path_for(class_file, &candidate_source_dir(request.source_dir, class_file));
        let text = match read_source(&source_file) {
            Ok(text) => text,
            Err(e) if e.is_candidate_local() => {
                debug!("Skipping {}: {}", class_file.display(), e);
                continue;
            }
            Err(e) => return Err(e),
        };

        if !mentions_byte(&text) {
            debug!("Skipping {}: no byte reference", source_file.display());
            continue;
        }

        match PayloadBytes::from_text(&text, &source_file) {
            Ok(payload) => {
                info!("Metasploit backdoored payload class found: {}", source_file.display());
                return write_payload(request, Scenario::Backdoored, class_file.clone(), &payload);
            }
            Err(e) if e.is_candidate_local() => debug!("Skipping {}: {}", class_file.display(), e),
            Err(e) => return Err(e),
        }
    }

    Ok(Outcome::NoPayloadFound)
}

/// Candidates share a class name across obfuscated directories, so each
/// directory gets its own output folder.
fn candidate_source_dir(source_dir: &Path, class_file: &Path) -> PathBuf {
    match class_file.parent().and_then(Path::file_name) {
        Some(dir) => source_dir.join(dir),
        None => source_dir.to_path_buf(),
    }
}

/// Decompiler failures only mean the source file will be missing
fn materialize(materializer: &dyn SourceMaterializer, class_file: &Path, source_dir: &Path) {
    if let Err(e) = materializer.decompile(class_file, source_dir) {
        warn!("Decompiling {} failed: {}", class_file.display(), e);
    }
}

fn write_payload(
    request: &PayloadRequest<'_>,
    scenario: Scenario,
    class_file: PathBuf,
    payload: &PayloadBytes,
) -> Result<Outcome> {
    payload.write_to(request.output)?;
    Ok(Outcome::Success(Extraction {
        scenario,
        class_file,
        source_file: payload.source().to_path_buf(),
        output: request.output.to_path_buf(),
        bytes_written: payload.len(),
    }))
}

#[cfg(test)]
#[path = "pipeline_test.rs"]
mod tests;
