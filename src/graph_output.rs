//! Output module
//! write the simplified graph, the removed elements, and a binary report of the run

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};

use serde::{Deserialize, Serialize};

use crate::bubble_removal::Removed;
use crate::coverage_simplification::SimplificationOutcome;
use crate::create_assembly_graph::{AssemblyGraph, GfaLines};
use crate::error::Result;

/// Summary of a simplification run, serialized with bincode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimplificationReport {
    pub average_coverage: f64,
    pub unique_chains: usize,
    pub merges_per_pass: Vec<usize>,
    pub bubbles_popped: usize,
    pub removed_nodes: Vec<String>,
    /// "<from>\t<to>" for removed edges between surviving nodes
    pub removed_edges: Vec<String>,
}

impl SimplificationReport {
    pub fn new(graph: &AssemblyGraph, outcome: &SimplificationOutcome) -> Self {
        Self {
            average_coverage: outcome.average_coverage,
            unique_chains: outcome.unique_chains,
            merges_per_pass: outcome.merges_per_pass.clone(),
            bubbles_popped: outcome.bubbles_popped,
            removed_nodes: outcome.removed.nodes().iter().map(|&n| graph.node_name(n).to_string()).collect(),
            removed_edges: outcome.removed.reported_edges()
                .map(|&(from, to)| format!("{}\t{}", graph.side_name(from), graph.side_name(to)))
                .collect(),
        }
    }

    /// serialize the report
    pub fn write_bin(&self, path: &str) -> Result<()> {
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        bincode::serialize_into(writer, self)?;
        Ok(())
    }

    pub fn read_bin(path: &str) -> Result<Self> {
        let file = File::open(path)?;
        let report = bincode::deserialize_from(BufReader::new(file))?;
        Ok(report)
    }
}

/// Write the input H, S and L lines minus removed nodes and edges, in input order
pub fn write_gfa<W: Write>(lines: &GfaLines, removed: &Removed, mut w: W) -> Result<()> {
    for header in &lines.headers {
        writeln!(w, "{}", header)?;
    }
    for (node, line) in &lines.segments {
        if removed.contains_node(*node) {
            continue;
        }
        writeln!(w, "{}", line)?;
    }
    for link in &lines.links {
        if removed.drops_edge(link.from, link.to) {
            continue;
        }
        writeln!(w, "{}", link.line)?;
    }
    w.flush()?;
    Ok(())
}

/// One line per removed node, one line per removed edge between surviving nodes, then a summary
pub fn write_removed<W: Write>(graph: &AssemblyGraph, removed: &Removed, mut w: W) -> Result<()> {
    for &node in removed.nodes() {
        writeln!(w, "{}", graph.node_name(node))?;
    }
    let mut edge_count = 0usize;
    for &(from, to) in removed.reported_edges() {
        writeln!(w, "{}\t{}", graph.side_name(from), graph.side_name(to))?;
        edge_count += 1;
    }
    writeln!(w, "removed {} nodes and {} edges", removed.nodes().len(), edge_count)?;
    w.flush()?;
    Ok(())
}
