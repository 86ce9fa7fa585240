pub mod bubble_removal;
pub mod chain_clustering;
pub mod cli;
pub mod configs;
pub mod coverage_simplification;
pub mod create_assembly_graph;
pub mod error;
pub mod graph_analysis;
pub mod graph_output;
pub mod node_coverage;
pub mod pipeline;
pub mod superbubble_detection;
pub mod utils;

pub use create_assembly_graph::AssemblyGraph;
pub use error::{BubbleError, Result};
pub use utils::{NodeSide, Orientation};
