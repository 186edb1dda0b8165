use anyhow::{Context, Result};
use clap::Parser;
use configbytes::cli::{Args, OutputFormat};
use configbytes::{check_tools, run, Converters, ExtractionReport, Fernflower, REQUIRED_TOOLS};
use tracing::debug;
use tracing_subscriber::EnvFilter;

fn main() {
    if let Err(e) = try_main() {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn try_main() -> Result<()> {
    let args = Args::parse();

    // RUST_LOG wins over --verbose, e.g. RUST_LOG=configbytes::locator=trace
    let env_filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if args.verbose {
        EnvFilter::new("configbytes=debug")
    } else {
        EnvFilter::new("configbytes=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(args.verbose)
        .with_writer(std::io::stderr)
        .init();

    debug!("Logging initialized (verbose={})", args.verbose);

    check_tools(REQUIRED_TOOLS)?;

    let config = args.to_config();
    let decompiler = Fernflower::new(&config.fernflower_jar);
    let report = run(&config, &Converters::default(), &decompiler)?;

    print_report(&report, args.format)
}

fn print_report(report: &ExtractionReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(report).context("Failed to serialize report")?;
            println!("{json}");
        }
        OutputFormat::Terminal => {
            println!("package:  {}", report.package);
            println!("class:    {}", report.extraction.class_file.display());
            println!("output:   {} ({} bytes)", report.extraction.output.display(), report.extraction.bytes_written);
            if let Some(workdir) = &report.workdir {
                println!("workdir:  {}", workdir.display());
            }
        }
    }
    Ok(())
}
