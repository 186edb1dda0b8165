use crate::error::{ExtractError, Result};
use std::path::{Path, PathBuf};

/// Simple name of the payload class in an untouched build
pub const PAYLOAD_CLASS_NAME: &str = "Payload";
/// Length of the obfuscated directory and class names in backdoored builds
pub const OBFUSCATED_NAME_LEN: usize = 5;
pub const CLASS_EXTENSION: &str = "class";
pub const SOURCE_EXTENSION: &str = "java";
/// Output file name used when the caller does not choose one
pub const DEFAULT_OUTPUT_NAME: &str = "configbytes.txt";
/// Environment fallback for the fernflower jar path
pub const FERNFLOWER_ENV: &str = "CONFIGBYTES_FERNFLOWER";

pub const DEX2JAR_TOOL: &str = "d2j-dex2jar";
pub const JAVA_TOOL: &str = "java";
pub const APKTOOL_TOOL: &str = "apktool";
/// Tools that must be on PATH before a run starts
pub const REQUIRED_TOOLS: &[&str] = &[DEX2JAR_TOOL, JAVA_TOOL, APKTOOL_TOOL];

pub const MAX_ARCHIVE_FILES: usize = 100_000;
pub const MAX_ARCHIVE_FILE_SIZE: u64 = 512 * 1024 * 1024; // 512MB

/// Limits applied while unpacking the package and the converted class archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveLimits {
    /// Maximum number of entries written to disk
    pub max_files: usize,
    /// Maximum size of any individual entry
    pub max_file_size: u64,
}

impl Default for ArchiveLimits {
    fn default() -> Self {
        Self { max_files: MAX_ARCHIVE_FILES, max_file_size: MAX_ARCHIVE_FILE_SIZE }
    }
}

impl ArchiveLimits {
    pub fn check(&self, files_extracted: usize, entry_size: u64, entry_name: &str) -> Result<()> {
        if files_extracted >= self.max_files {
            return Err(ExtractError::archive_extraction(format!(
                "too many entries: {} >= {}",
                files_extracted, self.max_files
            )));
        }
        if entry_size > self.max_file_size {
            return Err(ExtractError::archive_extraction(format!(
                "entry {entry_name} too large: {entry_size} > {} bytes",
                self.max_file_size
            )));
        }
        Ok(())
    }
}

/// Validated settings for one extraction run
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    pub apk: PathBuf,
    /// Explicit output path; `None` writes into the working directory
    pub output: Option<PathBuf>,
    pub fernflower_jar: PathBuf,
    pub keep: bool,
    pub archive_limits: ArchiveLimits,
}

impl ExtractConfig {
    pub fn new(apk: impl Into<PathBuf>, fernflower_jar: impl Into<PathBuf>) -> Self {
        Self {
            apk: apk.into(),
            output: None,
            fernflower_jar: fernflower_jar.into(),
            keep: false,
            archive_limits: ArchiveLimits::default(),
        }
    }

    #[must_use]
    pub fn with_output(mut self, output: Option<PathBuf>) -> Self {
        self.output = output;
        self
    }

    #[must_use]
    pub fn with_keep(mut self, keep: bool) -> Self {
        self.keep = keep;
        self
    }

    /// Without an explicit output the artifact lives in the working
    /// directory, so the directory has to survive the run.
    pub fn keep_workspace(&self) -> bool {
        self.keep || self.output.is_none()
    }

    /// Where the extracted bytes end up for a given working directory
    pub fn output_path(&self, workdir: &Path) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| workdir.join(DEFAULT_OUTPUT_NAME))
    }

    pub fn validate(&self) -> Result<()> {
        if !self.apk.is_file() {
            return Err(ExtractError::configuration(format!(
                "apk file does not exist: {}",
                self.apk.display()
            )));
        }
        if !self.fernflower_jar.is_file() {
            return Err(ExtractError::configuration(format!(
                "fernflower jar does not exist: {}",
                self.fernflower_jar.display()
            )));
        }
        if let Some(output) = &self.output {
            if output.is_dir() {
                return Err(ExtractError::configuration(format!(
                    "output path is a directory: {}",
                    output.display()
                )));
            }
        }
        Ok(())
    }
}
