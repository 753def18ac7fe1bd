mod segment;

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "specseg",
    about = "Split a sectioned specification into dependency-ordered execution prompts",
    version
)]
pub struct Cli {
    /// Specification document to segment
    #[arg(long, value_name = "PATH")]
    input: PathBuf,

    /// Directory for generated prompts and the manifest (created if absent)
    #[arg(long, value_name = "PATH")]
    output_dir: PathBuf,

    /// Filename prefix for generated prompts (overrides the config file)
    #[arg(long)]
    prefix: Option<String>,

    /// YAML config file
    #[arg(long, value_name = "PATH", env = "SPECSEG_CONFIG")]
    config: Option<PathBuf>,

    /// Delete previously generated prompts in the output directory first
    #[arg(long)]
    clean: bool,

    /// Render everything but write nothing
    #[arg(long)]
    dry_run: bool,

    /// Output as JSON
    #[arg(long, short = 'j')]
    json: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(long, short = 'v', action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        _ => tracing::Level::DEBUG,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = segment::run(&cli) {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
