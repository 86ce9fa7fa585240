use anyhow::{Context, Result};
use clap::Parser;

use bubblepop::cli::{Cli, Commands};
use bubblepop::configs::{ChainsConfig, PopBubblesConfig, StatsConfig};
use bubblepop::pipeline;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match &cli.command {
        Commands::PopBubbles(args) => {
            let config = PopBubblesConfig::from(args);
            let report = pipeline::run_pop_bubbles(&config)
                .with_context(|| format!("popping bubbles with coverage {}", config.node_coverage))?;
            log::info!(
                "average coverage {:.3}, {} bubbles popped, {} nodes removed",
                report.average_coverage,
                report.bubbles_popped,
                report.removed_nodes.len()
            );
        }
        Commands::Chains(args) => {
            let config = ChainsConfig::from(args);
            pipeline::run_chains(&config)
                .with_context(|| format!("clustering chains with coverage {}", config.node_coverage))?;
        }
        Commands::Stats(args) => {
            let config = StatsConfig::from(args);
            pipeline::run_stats(&config).context("computing graph statistics")?;
        }
    }

    Ok(())
}
