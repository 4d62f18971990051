mod samples;
mod summary;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::WrapErr;
use tracing_subscriber::EnvFilter;
use verdict_core::{Config, Engine};

#[derive(Parser)]
#[command(name = "verdict")]
#[command(about = "Interceptor-driven test runner", long_about = None)]
struct Cli {
    /// Config file to use instead of the default locations
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the bundled suites
    Run {
        /// Only run these suites (repeatable)
        #[arg(long = "suite")]
        suites: Vec<String>,

        /// Regex matched against `<case>::<test>`
        #[arg(long)]
        filter: Option<String>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the bundled suites and their tests
    List,
    /// Print the default configuration
    Config,
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)
            .wrap_err_with(|| format!("Failed to load {}", path.display()))?,
        None => Config::load().wrap_err("Failed to load configuration")?,
    };
    init_logging(&config, cli.verbose);
    tracing::debug!(renderer = ?config.render.renderer, "Configuration loaded");

    match cli.command {
        Commands::Run {
            suites,
            filter,
            json,
        } => {
            if !suites.is_empty() {
                config.run.suites = suites;
            }
            if filter.is_some() {
                config.run.filter = filter;
            }
            let filter = config.filter()?;

            let engine = Engine::from_config(&config);
            let run = engine.run(samples::suites(), &filter).await;

            if json {
                println!("{}", serde_json::to_string_pretty(&summary::Report::from(&run))?);
            } else {
                summary::print(&run);
            }

            if !run.status.is_successful() {
                std::process::exit(1);
            }
        }
        Commands::List => {
            for suite in samples::suites() {
                println!("{} ({} tests)", suite.name, suite.test_count());
                for case in &suite.cases {
                    for (name, _) in case.tests() {
                        println!("  {}::{}", case.name(), name);
                    }
                }
            }
        }
        Commands::Config => {
            print!("{}", Config::default_config_string());
        }
    }

    Ok(())
}

/// Structured logging to stderr; `-v` flags override the configured level.
fn init_logging(config: &Config, verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("info")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(config.logging.ansi)
        .with_writer(std::io::stderr)
        .try_init();
}
