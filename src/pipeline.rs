//! Entry points of the subcommands. Inputs are read completely and the graph is
//! simplified before anything is written, so a failing run leaves no partial output.

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};

use log::info;

use crate::chain_clustering::cluster_chains;
use crate::configs::{ChainsConfig, PopBubblesConfig, StatsConfig};
use crate::coverage_simplification::simplify;
use crate::create_assembly_graph::{AssemblyGraph, GfaLines};
use crate::error::Result;
use crate::graph_analysis;
use crate::graph_output::{write_gfa, write_removed, SimplificationReport};
use crate::node_coverage::{average_coverage, NodeCoverage};

/// Open a file for reading, or stdin for None
fn open_input(path: Option<&str>) -> Result<Box<dyn BufRead>> {
    Ok(match path {
        Some(p) => Box::new(BufReader::new(File::open(p)?)),
        None => Box::new(BufReader::new(io::stdin())),
    })
}

/// Create a file for writing, or stdout for None
fn open_output(path: Option<&str>) -> Result<Box<dyn Write>> {
    Ok(match path {
        Some(p) => Box::new(BufWriter::new(File::create(p)?)),
        None => Box::new(BufWriter::new(io::stdout())),
    })
}

fn load_inputs(input_gfa: Option<&str>, node_coverage: &str) -> Result<(AssemblyGraph, GfaLines, NodeCoverage)> {
    let (graph, lines) = AssemblyGraph::from_reader(open_input(input_gfa)?)?;
    graph.check_symmetry()?;
    let coverage = NodeCoverage::from_reader(BufReader::new(File::open(node_coverage)?), &graph)?;
    Ok((graph, lines, coverage))
}

/// Pop bubbles and write the simplified graph, the removed elements and optionally a binary report
pub fn run_pop_bubbles(config: &PopBubblesConfig) -> Result<SimplificationReport> {
    info!("=== BUBBLE POPPING ===");
    let (mut graph, lines, coverage) = load_inputs(config.input_gfa.as_deref(), &config.node_coverage)?;

    let outcome = simplify(&mut graph, &coverage, &config.params)?;

    let gfa_out = open_output(config.output_gfa.as_deref())?;
    let removed_out: Box<dyn Write> = match config.removed_out.as_deref() {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(io::stderr()),
    };
    write_removed(&graph, &outcome.removed, removed_out)?;
    write_gfa(&lines, &outcome.removed, gfa_out)?;

    let report = SimplificationReport::new(&graph, &outcome);
    if let Some(path) = config.report_bin.as_deref() {
        report.write_bin(path)?;
        info!("Report written to {}", path);
    }
    info!("=== BUBBLE POPPING FINISHED ===");
    Ok(report)
}

/// Write "node\tchain\tchain_coverage\tunique" for every node
pub fn run_chains(config: &ChainsConfig) -> Result<()> {
    let (graph, _, coverage) = load_inputs(config.input_gfa.as_deref(), &config.node_coverage)?;
    let avg = average_coverage(&graph, &coverage, config.params.long_node_length)?;
    let (mut chains, _) = cluster_chains(&graph, &coverage, config.params.merge_ratio)?;
    let unique = chains.unique_roots(avg, config.params.unique_low, config.params.unique_high);

    let mut w = open_output(config.output_tsv.as_deref())?;
    writeln!(w, "node\tchain\tchain_coverage\tunique")?;
    for node in 0..graph.node_count() {
        let root = chains.find(node);
        let chain_cov = match chains.chain_coverage(node) {
            Some(c) => format!("{:.3}", c),
            None => "*".to_string(),
        };
        writeln!(
            w,
            "{}\t{}\t{}\t{}",
            graph.node_name(node),
            graph.node_name(root),
            chain_cov,
            if unique.contains(&root) { "yes" } else { "no" }
        )?;
    }
    w.flush()?;
    Ok(())
}

/// Print node, edge and component statistics
pub fn run_stats(config: &StatsConfig) -> Result<()> {
    let (graph, _) = AssemblyGraph::from_reader(open_input(config.input_gfa.as_deref())?)?;
    graph.check_symmetry()?;

    println!("Graph nodes: {}", graph.node_count());
    println!("Graph edges: {}", graph.edge_count());

    let sizes = graph_analysis::component_sizes_sorted(&graph);
    println!("Number of weakly connected components: {}", sizes.len());
    sizes.into_iter().enumerate().for_each(|(i, size)| {
        println!("Component {}: size {}", i + 1, size);
    });

    println!("\nOut-degree distribution (degree -> count):");
    for (degree, count) in graph_analysis::out_degree_distribution(&graph) {
        println!("{}: {}", degree, count);
    }

    if let Some(path) = config.dot.as_deref() {
        graph.write_dot(path)?;
        info!("DOT written to {}", path);
    }
    Ok(())
}
