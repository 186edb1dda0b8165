//! External tool invocation.
//!
//! Every collaborator binary is run synchronously with no timeout. The
//! captured output is kept for diagnostics only; callers decide success by
//! looking for the files the tool was supposed to produce.

use crate::config::{APKTOOL_TOOL, DEX2JAR_TOOL};
use crate::error::{ExtractError, Result};
use std::ffi::OsStr;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, warn};

/// Exit status and captured text of one tool run
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub program: String,
    /// `None` when the process was killed by a signal
    pub status: Option<i32>,
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    /// stdout followed by stderr, the way the tool would print to a terminal
    pub fn combined(&self) -> String {
        let mut text = self.stdout.clone();
        text.push_str(&self.stderr);
        text
    }

    pub fn status_display(&self) -> String {
        self.status
            .map_or_else(|| "signal".to_string(), |code| code.to_string())
    }

    /// Log a non-zero exit without failing the run
    fn warn_on_failure(&self) {
        if !self.success {
            warn!(
                "{} exited with status {}: {}",
                self.program,
                self.status_display(),
                self.stderr.trim()
            );
        }
    }
}

/// Run `program` with `args` and capture its output.
pub fn run_tool<I, S>(program: &str, args: I) -> Result<ToolOutput>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut command = Command::new(program);
    command.args(args);
    debug!("Running: {:?}", command);

    let output = command.output().map_err(|e| match e.kind() {
        ErrorKind::NotFound => ExtractError::tool_unavailable(program),
        _ => ExtractError::Io(e),
    })?;

    let result = ToolOutput {
        program: program.to_string(),
        status: output.status.code(),
        success: output.status.success(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    };
    debug!("{} output:\n{}", program, result.combined());
    Ok(result)
}

/// Resolve a tool on PATH
pub fn find_tool(tool: &str) -> Result<PathBuf> {
    which::which(tool).map_err(|_| ExtractError::tool_unavailable(tool))
}

/// Make sure every tool is present before any work starts.
pub fn check_tools(tools: &[&str]) -> Result<Vec<PathBuf>> {
    tools
        .iter()
        .map(|tool| -> Result<PathBuf> {
            let path = find_tool(tool)?;
            debug!("Tool present: {}", path.display());
            Ok(path)
        })
        .collect()
}

/// `d2j-dex2jar`: converts `classes.dex` into a jar of class files
#[derive(Debug, Clone)]
pub struct Dex2Jar {
    program: String,
}

impl Default for Dex2Jar {
    fn default() -> Self {
        Self { program: DEX2JAR_TOOL.to_string() }
    }
}

impl Dex2Jar {
    pub fn with_program(program: impl Into<String>) -> Self {
        Self { program: program.into() }
    }

    pub fn convert(&self, dex: &Path, jar: &Path) -> Result<ToolOutput> {
        let output = run_tool(
            &self.program,
            [OsStr::new("-f"), OsStr::new("-o"), jar.as_os_str(), dex.as_os_str()],
        )?;
        output.warn_on_failure();
        Ok(output)
    }
}

/// `apktool d`: decodes the binary manifest and resources
#[derive(Debug, Clone)]
pub struct Apktool {
    program: String,
}

impl Default for Apktool {
    fn default() -> Self {
        Self { program: APKTOOL_TOOL.to_string() }
    }
}

impl Apktool {
    pub fn with_program(program: impl Into<String>) -> Self {
        Self { program: program.into() }
    }

    pub fn decode(&self, apk: &Path, out_dir: &Path) -> Result<ToolOutput> {
        let output = run_tool(
            &self.program,
            [
                OsStr::new("d"),
                apk.as_os_str(),
                OsStr::new("-o"),
                out_dir.as_os_str(),
                OsStr::new("-f"),
            ],
        )?;
        output.warn_on_failure();
        Ok(output)
    }
}
