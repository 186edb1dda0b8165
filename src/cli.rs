use crate::config::{ExtractConfig, FERNFLOWER_ENV};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "configbytes")]
#[command(about = "Extract configbytes from an Android payload package")]
#[command(after_help = "Example: configbytes -a metasploit.apk -o /root/configbytes.txt -j /root/fernflower.jar")]
#[command(version)]
pub struct Args {
    /// APK to extract configbytes from
    #[arg(short, long, value_name = "PATH")]
    pub apk: PathBuf,

    /// Save configbytes to this file (default: inside the kept working directory)
    #[arg(short, long, value_name = "PATH")]
    pub out: Option<PathBuf>,

    /// Path to the fernflower decompiler jar
    #[arg(short, long, value_name = "PATH", env = FERNFLOWER_ENV)]
    pub jar: PathBuf,

    /// Verbose logging, including external tool output
    #[arg(short, long)]
    pub verbose: bool,

    /// Keep the working directory
    #[arg(short, long)]
    pub keep: bool,

    /// Output format (terminal, json)
    #[arg(short, long, default_value = "terminal")]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary
    Terminal,
    /// JSON report for machine consumption
    Json,
}

impl Args {
    pub fn to_config(&self) -> ExtractConfig {
        ExtractConfig::new(&self.apk, &self.jar)
            .with_output(self.out.clone())
            .with_keep(self.keep)
    }
}
