//! Byte array literal extraction from decompiled source.
//!
//! The payload class carries its configuration as a single array
//! initializer, `new byte[]{-37, 4, 16, ...}`. The initializer body is
//! copied out exactly as it appears in the source text; the numbers are not
//! decoded.

use crate::error::{ExtractError, Result};
use memchr::{memchr, memmem};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Opening of an array initializer with an empty dimension
const ARRAY_OPEN: &[u8] = b"[]{";
const ARRAY_CLOSE: u8 = b'}';
/// Cheap pre-filter applied to obfuscated candidates
const BYTE_MARKER: &[u8] = b"byte";

/// Initializer body recovered from one decompiled class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadBytes {
    source: PathBuf,
    bytes: Vec<u8>,
}

impl PayloadBytes {
    /// Pull the literal out of already-loaded source text
    pub fn from_text(text: &[u8], source: &Path) -> Result<Self> {
        let body = byte_array_literal(text)
            .ok_or_else(|| ExtractError::payload_pattern_not_found(source))?;
        debug!("Found {} byte literal in {}", body.len(), source.display());
        Ok(Self { source: source.to_path_buf(), bytes: body.to_vec() })
    }

    /// Decompiled file the bytes came from
    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Write the literal to `output` byte for byte
    pub fn write_to(&self, output: &Path) -> Result<()> {
        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(output, &self.bytes)?;
        info!("Saved as: {}", output.display());
        Ok(())
    }
}

/// Read a decompiled source file. A missing file means the decompiler
/// gave up on that class; any other read failure only rules out that class.
pub fn read_source(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => ExtractError::no_decompiler_output(path),
        _ => ExtractError::source_unreadable(path, e),
    })
}

/// Load `path` and extract its byte array literal
pub fn extract(path: &Path) -> Result<PayloadBytes> {
    let text = read_source(path)?;
    PayloadBytes::from_text(&text, path)
}

/// True if the text mentions `byte` anywhere
pub fn mentions_byte(text: &[u8]) -> bool {
    memmem::find(text, BYTE_MARKER).is_some()
}

/// Body of the first `[]{ ... }` initializer.
///
/// The body ends at the first `}` or at the next `[]{`, whichever comes
/// first. Returns `None` when there is no opener or nothing but further
/// openers follows it.
pub fn byte_array_literal(text: &[u8]) -> Option<&[u8]> {
    let start = memmem::find(text, ARRAY_OPEN)? + ARRAY_OPEN.len();
    let after = &text[start..];

    let segment = match memmem::find(after, ARRAY_OPEN) {
        Some(end) => &after[..end],
        None => after,
    };
    if segment.is_empty() && only_openers(after) {
        return None;
    }

    let body_end = memchr(ARRAY_CLOSE, segment).unwrap_or(segment.len());
    Some(&segment[..body_end])
}

fn only_openers(text: &[u8]) -> bool {
    text.len() % ARRAY_OPEN.len() == 0 && text.chunks(ARRAY_OPEN.len()).all(|c| c == ARRAY_OPEN)
}

#[cfg(test)]
#[path = "extractor_test.rs"]
mod tests;
