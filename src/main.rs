use bundle_delta::cmd;
use bundle_delta::cmd::compare::CompareOptions;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;

/// Pull request bundle size reports
///
/// bundle-delta builds the baseline and the change branch of a web
/// application, compares their build output sizes, publishes an HTML report,
/// and posts a pass/fail commit status.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Settings file (defaults to ./bundle-delta.toml when present)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Disable emoji output (useful for CI/CD or accessibility)
    #[arg(long, global = true)]
    no_emoji: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process one pull request webhook payload
    Run {
        /// File holding the webhook JSON body
        #[arg(short, long, value_name = "FILE")]
        event: PathBuf,

        /// Build and compare, but keep statuses and uploads in memory
        #[arg(long)]
        dry_run: bool,
    },

    /// Process newline-delimited webhook payloads from stdin
    Consume {
        /// Build and compare, but keep statuses and uploads in memory
        #[arg(long)]
        dry_run: bool,
    },

    /// Compare two local size manifests
    Compare {
        /// Baseline manifest
        before: PathBuf,

        /// Changed manifest
        after: PathBuf,

        /// Write the HTML report to this file
        #[arg(long, value_name = "FILE")]
        html: Option<PathBuf>,

        /// Allowed total increase in bytes (defaults to the configured threshold)
        #[arg(long, value_name = "BYTES")]
        threshold: Option<i64>,

        /// Output the diff as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check that git and the configured build programs are installed
    Tools,
}

#[tokio::main]
async fn main() {
    // Initialize logger (use RUST_LOG env var to control verbosity)
    env_logger::init();

    let cli = Cli::parse();

    if cli.no_emoji {
        bundle_delta::fmt::disable_emoji();
    }

    let config = cli.config.as_deref();
    let result = match &cli.command {
        Commands::Run { event, dry_run } => cmd::cmd_run(event, config, *dry_run).await,
        Commands::Consume { dry_run } => cmd::cmd_consume(config, *dry_run).await,
        Commands::Compare {
            before,
            after,
            html,
            threshold,
            json,
        } => {
            let threshold = match threshold {
                Some(bytes) => Ok(*bytes),
                None => cmd::load_settings(config)
                    .map(|settings| settings.pipeline.size_increase_threshold_bytes),
            };
            match threshold {
                Ok(threshold) => {
                    let options = CompareOptions {
                        html: html.clone(),
                        threshold,
                        json: *json,
                    };
                    cmd::cmd_compare(before, after, &options).await
                }
                Err(e) => Err(e),
            }
        }
        Commands::Tools => cmd::cmd_tools(config).await,
    };

    if let Err(e) = result {
        use bundle_delta::error::ErrorFormatter;
        eprintln!("{}", ErrorFormatter::format(&e));
        let exit_code = ErrorFormatter::exit_code(&e);
        process::exit(exit_code);
    }
}
