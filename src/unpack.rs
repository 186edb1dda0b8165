//! ZIP container unpacking.
//!
//! Both the Android package and the jar produced by dex2jar are plain ZIP
//! files. Entries are written with their directory structure intact so the
//! class tree mirrors the package layout.

use crate::config::ArchiveLimits;
use crate::error::{ExtractError, Result};
use std::fs::{self, File};
use std::io::Read;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, trace, warn};

/// What an unpack run wrote to disk
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnpackStats {
    pub files: usize,
    pub bytes: u64,
    /// Entries dropped for escaping the destination or being symlinks
    pub skipped: Vec<String>,
}

/// Extract every entry of `archive_path` under `dest_dir`.
pub fn unpack_zip(archive_path: &Path, dest_dir: &Path, limits: &ArchiveLimits) -> Result<UnpackStats> {
    let file = File::open(archive_path).map_err(|e| {
        ExtractError::archive_extraction(format!("Failed to open {}: {e}", archive_path.display()))
    })?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| {
        ExtractError::archive_extraction(format!("Failed to read ZIP archive {}: {e}", archive_path.display()))
    })?;

    debug!("Unpacking {} ({} entries) into {}", archive_path.display(), archive.len(), dest_dir.display());
    fs::create_dir_all(dest_dir)?;

    let mut stats = UnpackStats::default();
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).map_err(|e| {
            ExtractError::archive_extraction(format!("Failed to access entry {i}: {e}"))
        })?;
        let entry_name = entry.name().to_string();

        let Some(outpath) = sanitize_entry_path(&entry_name, dest_dir) else {
            warn!("Skipping entry outside destination: {}", entry_name);
            stats.skipped.push(entry_name);
            continue;
        };

        // S_IFLNK = 0o120000, S_IFMT = 0o170000
        if entry.unix_mode().is_some_and(|mode| mode & 0o170000 == 0o120000) {
            warn!("Skipping symlink entry: {}", entry_name);
            stats.skipped.push(entry_name);
            continue;
        }

        if entry.is_dir() {
            fs::create_dir_all(&outpath)?;
            continue;
        }

        limits.check(stats.files, entry.size(), &entry_name)?;

        if let Some(parent) = outpath.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut outfile = File::create(&outpath)?;
        let mut limited = (&mut entry).take(limits.max_file_size);
        let written = std::io::copy(&mut limited, &mut outfile).map_err(|e| {
            ExtractError::archive_extraction(format!("Failed to extract {entry_name}: {e}"))
        })?;
        // Declared sizes can lie; data past the cap means the entry was cut short
        if written == limits.max_file_size {
            let more = entry.read(&mut [0u8; 1]).map_err(|e| {
                ExtractError::archive_extraction(format!("Failed to extract {entry_name}: {e}"))
            })?;
            if more > 0 {
                return Err(ExtractError::archive_extraction(format!(
                    "entry {entry_name} too large: more than {} bytes",
                    limits.max_file_size
                )));
            }
        }
        trace!("Extracted {} ({} bytes)", entry_name, written);

        stats.files += 1;
        stats.bytes += written;
    }

    debug!("Unpacked {} files, {} bytes", stats.files, stats.bytes);
    Ok(stats)
}

/// Join `entry_name` onto `dest_dir`, rejecting anything that could land
/// outside of it.
pub(crate) fn sanitize_entry_path(entry_name: &str, dest_dir: &Path) -> Option<PathBuf> {
    let path = Path::new(entry_name);
    if path.is_absolute() {
        return None;
    }

    let mut result = dest_dir.to_path_buf();
    for component in path.components() {
        match component {
            Component::Normal(c) => result.push(c),
            Component::CurDir => {}
            Component::ParentDir | Component::Prefix(_) | Component::RootDir => return None,
        }
    }

    if result == dest_dir || !result.starts_with(dest_dir) {
        return None;
    }
    Some(result)
}
