use clap::{Parser, Subcommand, Args};

use crate::configs::SimplificationParams;

#[derive(Parser)]
#[command(name = "bubblepop", version = "1.0", about = "Coverage guided bubble popping for bidirected assembly graphs in GFA format")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace). RUST_LOG overrides this.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {

    /// Pop bubbles inside unique coverage chains
    PopBubbles(PopBubblesArgs),

    /// Report the coverage chains of every node
    Chains(ChainsArgs),

    /// Graph statistics
    Stats(StatsArgs),
}

#[derive(Args)]
pub struct SimplificationArgs {

    /// Maximum bubble size (node-sides) to pop
    #[arg(long, default_value_t = 10)]
    pub max_pop_size: usize,

    /// Minimum node length used for the average coverage
    #[arg(long, default_value_t = 100_000)]
    pub long_node_length: usize,

    /// Maximum coverage ratio between two chains that may merge
    #[arg(long, default_value_t = 1.5)]
    pub merge_ratio: f64,

    /// Lower bound of unique chain coverage, as a fraction of the average
    #[arg(long, default_value_t = 0.5)]
    pub unique_low: f64,

    /// Upper bound of unique chain coverage, as a fraction of the average
    #[arg(long, default_value_t = 1.5)]
    pub unique_high: f64,
}

impl From<&SimplificationArgs> for SimplificationParams {
    fn from(args: &SimplificationArgs) -> Self {
        Self {
            max_pop_size: args.max_pop_size,
            long_node_length: args.long_node_length,
            merge_ratio: args.merge_ratio,
            unique_low: args.unique_low,
            unique_high: args.unique_high,
        }
    }
}

#[derive(Args)]
pub struct PopBubblesArgs {

    /// Node coverage table ("node\tcoverage")
    pub node_coverage: String,

    /// Input graph in GFA format, stdin if not given
    #[arg(short, long)]
    pub input_gfa: Option<String>,

    /// Output graph, stdout if not given
    #[arg(short, long)]
    pub output_gfa: Option<String>,

    /// Write removed nodes and edges here instead of stderr
    #[arg(short, long)]
    pub removed_out: Option<String>,

    /// Write a binary report of the run
    #[arg(short = 'b', long)]
    pub report_bin: Option<String>,

    #[command(flatten)]
    pub simplification: SimplificationArgs,
}

impl From<&PopBubblesArgs> for crate::configs::PopBubblesConfig {
    fn from(args: &PopBubblesArgs) -> Self {
        Self {
            input_gfa: args.input_gfa.clone(),
            node_coverage: args.node_coverage.clone(),
            output_gfa: args.output_gfa.clone(),
            removed_out: args.removed_out.clone(),
            report_bin: args.report_bin.clone(),
            params: SimplificationParams::from(&args.simplification),
        }
    }
}

#[derive(Args)]
pub struct ChainsArgs {

    /// Node coverage table ("node\tcoverage")
    pub node_coverage: String,

    /// Input graph in GFA format, stdin if not given
    #[arg(short, long)]
    pub input_gfa: Option<String>,

    /// Output table, stdout if not given
    #[arg(short, long)]
    pub output_tsv: Option<String>,

    #[command(flatten)]
    pub simplification: SimplificationArgs,
}

impl From<&ChainsArgs> for crate::configs::ChainsConfig {
    fn from(args: &ChainsArgs) -> Self {
        Self {
            input_gfa: args.input_gfa.clone(),
            node_coverage: args.node_coverage.clone(),
            output_tsv: args.output_tsv.clone(),
            params: SimplificationParams::from(&args.simplification),
        }
    }
}

#[derive(Args)]
pub struct StatsArgs {

    /// Input graph in GFA format, stdin if not given
    #[arg(short, long)]
    pub input_gfa: Option<String>,

    /// Also write the graph as DOT
    #[arg(short, long)]
    pub dot: Option<String>,
}

impl From<&StatsArgs> for crate::configs::StatsConfig {
    fn from(args: &StatsArgs) -> Self {
        Self {
            input_gfa: args.input_gfa.clone(),
            dot: args.dot.clone(),
        }
    }
}
