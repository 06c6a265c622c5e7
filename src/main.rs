mod app;
mod input;
mod render;

use anyhow::Result;
use clap::Parser;
use octopus::config::{project_paths, Overrides};
use octopus::logging::init_logging;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "octopus")]
#[command(about = "A virtual octopus that lives in your terminal", long_about = None)]
struct Args {
    /// Directory for the saved pet, settings and log
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Seconds between hunger ticks (overrides settings)
    #[arg(long)]
    decay_secs: Option<u64>,

    /// Plain white output
    #[arg(long, default_value_t = false)]
    no_color: bool,

    /// Start over with a fresh octopus
    #[arg(long, default_value_t = false)]
    reset: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let paths = project_paths(args.data_dir)?;
    init_logging(&paths.log_path)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting octopus");

    app::run(
        paths,
        app::Options {
            overrides: Overrides {
                decay_interval_secs: args.decay_secs,
                no_color: args.no_color,
            },
            reset: args.reset,
        },
    )
}
