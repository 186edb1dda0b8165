//! Class-to-source decompilation.

use crate::config::{JAVA_TOOL, SOURCE_EXTENSION};
use crate::error::Result;
use crate::tools::run_tool;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Produces decompiled text for a compiled class.
///
/// Implementations write `<out_dir>/<class stem>.java`. Producing nothing is
/// allowed; the caller checks for the file instead of trusting the result.
pub trait SourceMaterializer {
    fn decompile(&self, class_file: &Path, out_dir: &Path) -> Result<()>;
}

/// Where a materializer is expected to put the source for `class_file`
pub fn source_path_for(class_file: &Path, out_dir: &Path) -> PathBuf {
    let stem = class_file.file_stem().unwrap_or_else(|| OsStr::new(""));
    let mut name = stem.to_os_string();
    name.push(".");
    name.push(SOURCE_EXTENSION);
    out_dir.join(name)
}

/// Fernflower run as `java -jar <jar> <class> <out_dir>`
#[derive(Debug, Clone)]
pub struct Fernflower {
    jar: PathBuf,
    java: String,
}

impl Fernflower {
    pub fn new(jar: impl Into<PathBuf>) -> Self {
        Self { jar: jar.into(), java: JAVA_TOOL.to_string() }
    }

    #[must_use]
    pub fn with_java(mut self, java: impl Into<String>) -> Self {
        self.java = java.into();
        self
    }
}

impl SourceMaterializer for Fernflower {
    fn decompile(&self, class_file: &Path, out_dir: &Path) -> Result<()> {
        std::fs::create_dir_all(out_dir)?;
        let output = run_tool(
            &self.java,
            [
                OsStr::new("-jar"),
                self.jar.as_os_str(),
                class_file.as_os_str(),
                out_dir.as_os_str(),
            ],
        )?;
        if !output.success {
            warn!(
                "fernflower failed on {} (status {})",
                class_file.display(),
                output.status_display()
            );
        }
        Ok(())
    }
}
