//! Node coverage module
//! read the per-node coverage table and compute the global average coverage over long nodes

use std::io::BufRead;

use log::{debug, info};

use crate::create_assembly_graph::AssemblyGraph;
use crate::error::{BubbleError, Result};

/// Coverage per node index, None for nodes absent from the table
pub struct NodeCoverage {
    values: Vec<Option<f64>>,
}

impl NodeCoverage {

    /// Parse "<node>\t<coverage>" lines. The "node\tcoverage" header is skipped,
    /// rows for nodes that are not in the graph are ignored.
    pub fn from_reader<R: BufRead>(reader: R, graph: &AssemblyGraph) -> Result<Self> {
        let mut values: Vec<Option<f64>> = vec![None; graph.node_count()];
        let mut unknown = 0usize;

        for (i, line_res) in reader.lines().enumerate() {
            let line_nr = i + 1;
            let line = line_res?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() < 2 {
                return Err(BubbleError::malformed(line_nr, format!("coverage record needs 2 fields, found {}", fields.len())));
            }
            if fields[0] == "node" && fields[1] == "coverage" {
                continue;
            }
            let coverage = fields[1].parse::<f64>()
                .map_err(|_| BubbleError::malformed(line_nr, format!("invalid coverage '{}'", fields[1])))?;
            if !coverage.is_finite() || coverage < 0.0 {
                return Err(BubbleError::malformed(line_nr, format!("coverage must be a non-negative number, found {}", coverage)));
            }
            match graph.node_index(fields[0]) {
                Some(node) => values[node] = Some(coverage),
                None => {
                    debug!("coverage given for unknown node {}", fields[0]);
                    unknown += 1;
                }
            }
        }

        let covered = values.iter().filter(|v| v.is_some()).count();
        info!("Coverage known for {} of {} nodes ({} rows for unknown nodes)", covered, values.len(), unknown);
        Ok(Self { values })
    }

    /// Build directly from a node-indexed vector
    pub fn from_values(values: Vec<Option<f64>>) -> Self {
        Self { values }
    }

    pub fn get(&self, node: usize) -> Option<f64> {
        self.values.get(node).copied().flatten()
    }

    /// Coverage used as path width; nodes without coverage count as zero
    pub fn width(&self, node: usize) -> f64 {
        self.get(node).unwrap_or(0.0)
    }
}

/// Length-weighted mean coverage over covered nodes of length >= min_length.
pub fn average_coverage(graph: &AssemblyGraph, coverage: &NodeCoverage, min_length: usize) -> Result<f64> {
    let mut cov_sum = 0.0f64;
    let mut len_sum = 0.0f64;
    for node in 0..graph.node_count() {
        let Some(cov) = coverage.get(node) else { continue };
        let len = graph.node_length(node);
        if len < min_length {
            continue;
        }
        len_sum += len as f64;
        cov_sum += len as f64 * cov;
    }
    if len_sum == 0.0 {
        return Err(BubbleError::DegenerateCoverage { min_length });
    }
    Ok(cov_sum / len_sum)
}
