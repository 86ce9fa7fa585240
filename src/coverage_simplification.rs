//! Coverage based simplification
//! 1) average coverage over long nodes
//! 2) chain clustering, unique chains are those near the average coverage
//! 3) pop small bubbles starting from nodes of unique chains, in both orientations,
//!    when the sink belongs to the same chain

use log::{debug, info};

use crate::bubble_removal::{pop_bubble, Removed};
use crate::chain_clustering::cluster_chains;
use crate::configs::SimplificationParams;
use crate::create_assembly_graph::AssemblyGraph;
use crate::error::{BubbleError, Result};
use crate::node_coverage::{average_coverage, NodeCoverage};
use crate::superbubble_detection::find_bubble;
use crate::utils::NodeSide;

pub struct SimplificationOutcome {
    pub average_coverage: f64,
    pub unique_chains: usize,
    pub merges_per_pass: Vec<usize>,
    pub bubbles_popped: usize,
    pub removed: Removed,
}

/// Run all passes on the graph in place
pub fn simplify(
    graph: &mut AssemblyGraph,
    coverage: &NodeCoverage,
    params: &SimplificationParams,
) -> Result<SimplificationOutcome> {
    let avg = average_coverage(graph, coverage, params.long_node_length)?;
    info!("Average coverage {:.3}", avg);

    let (mut chains, merges_per_pass) = cluster_chains(graph, coverage, params.merge_ratio)?;
    let unique = chains.unique_roots(avg, params.unique_low, params.unique_high);
    info!("{} unique chains", unique.len());

    let mut removed = Removed::default();
    let mut bubbles_popped = 0usize;
    for node in 0..graph.node_count() {
        let key = chains.find(node);
        if !unique.contains(&key) {
            continue;
        }
        for start in [NodeSide::forward(node), NodeSide::reverse(node)] {
            if graph.is_removed(node) {
                break;
            }
            let Some(bubble) = find_bubble(graph, start, params.max_pop_size)? else { continue };
            if bubble.sink.node == node {
                return Err(BubbleError::invariant(format!(
                    "bubble from {} ends on its own node",
                    graph.side_name(start)
                )));
            }
            if chains.find(bubble.sink.node) != key {
                debug!(
                    "skip bubble {} -> {}: sink in another chain",
                    graph.side_name(bubble.source),
                    graph.side_name(bubble.sink)
                );
                continue;
            }
            let popped = pop_bubble(graph, bubble, coverage, &mut removed)?;
            debug!(
                "popped bubble {} -> {}: kept {} sides, removed {} nodes and {} edges",
                graph.side_name(bubble.source),
                graph.side_name(bubble.sink),
                popped.kept_path.len(),
                popped.removed_nodes,
                popped.removed_edges
            );
            bubbles_popped += 1;
        }
    }

    graph.check_symmetry()?;
    info!(
        "Popped {} bubbles, removed {} nodes and {} edges",
        bubbles_popped,
        removed.nodes().len(),
        removed.reported_edges().count()
    );

    Ok(SimplificationOutcome {
        average_coverage: avg,
        unique_chains: unique.len(),
        merges_per_pass,
        bubbles_popped,
        removed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::create_assembly_graph::tests::{parse, DIAMOND};

    fn long_diamond() -> String {
        // A and D long enough to set the average, B and C short
        let long = "A".repeat(100_000);
        DIAMOND.replace("S\tA\tAAAA", &format!("S\tA\t{}", long))
            .replace("S\tD\tTTTT", &format!("S\tD\t{}", long))
    }

    #[test]
    fn diamond_with_equal_coverage_keeps_three_nodes() {
        let (mut g, _) = parse(&long_diamond());
        let cov = NodeCoverage::from_values(vec![Some(20.0); 4]);
        let outcome = simplify(&mut g, &cov, &SimplificationParams::default()).unwrap();
        assert!((outcome.average_coverage - 20.0).abs() < 1e-9);
        assert_eq!(outcome.bubbles_popped, 1);
        assert_eq!(outcome.removed.nodes().len(), 1);
        assert_eq!(g.edge_count(), 2);
        let alive = (0..g.node_count()).filter(|&n| !g.is_removed(n)).count();
        assert_eq!(alive, 3);
    }

    #[test]
    fn diamond_prunes_low_coverage_branch() {
        let (mut g, _) = parse(&long_diamond());
        let cov = NodeCoverage::from_values(vec![Some(20.0), Some(5.0), Some(20.0), Some(20.0)]);
        let outcome = simplify(&mut g, &cov, &SimplificationParams::default()).unwrap();
        let b = g.node_index("B").unwrap();
        assert_eq!(outcome.removed.nodes(), &[b]);
        assert!(!g.is_removed(g.node_index("C").unwrap()));
    }

    #[test]
    fn repeat_sink_is_not_popped() {
        // D is too far from A in coverage to share its chain
        let (mut g, _) = parse(&long_diamond());
        let cov = NodeCoverage::from_values(vec![Some(20.0), Some(20.0), Some(20.0), Some(45.0)]);
        let outcome = simplify(&mut g, &cov, &SimplificationParams::default()).unwrap();
        assert_eq!(outcome.bubbles_popped, 0);
        assert!(outcome.removed.nodes().is_empty());
        assert_eq!(g.edge_count(), 4);
    }

    #[test]
    fn other_chain_sink_still_tries_reverse_side() {
        // S -> {P, Q} -> X -> {Y1, Y2} -> Z, with X listed first so it is visited before S.
        // >X ends at Z, which is in another chain; <X ends at <S in its own chain.
        // Entering X the links list Q before P, so popping from <X keeps P,
        // while popping from >S would keep Q.
        let long = "A".repeat(100_000);
        let gfa = format!(
            "S\tX\t{long}\nS\tS\t{long}\nS\tP\tCC\nS\tQ\tGG\nS\tY1\tCC\nS\tY2\tGG\nS\tZ\t{long}\n\
             L\tS\t+\tP\t+\t0M\nL\tS\t+\tQ\t+\t0M\n\
             L\tQ\t+\tX\t+\t0M\nL\tP\t+\tX\t+\t0M\n\
             L\tX\t+\tY1\t+\t0M\nL\tX\t+\tY2\t+\t0M\n\
             L\tY1\t+\tZ\t+\t0M\nL\tY2\t+\tZ\t+\t0M\n"
        );
        let (mut g, _) = parse(&gfa);
        let cov = NodeCoverage::from_values(vec![Some(20.0), Some(20.0), Some(20.0), Some(20.0), Some(20.0), Some(20.0), Some(45.0)]);
        let outcome = simplify(&mut g, &cov, &SimplificationParams::default()).unwrap();
        assert_eq!(outcome.bubbles_popped, 1);
        assert_eq!(outcome.removed.nodes(), &[g.node_index("Q").unwrap()]);
        assert!(!g.is_removed(g.node_index("P").unwrap()));
        // the bubble towards Z is untouched
        assert!(!g.is_removed(g.node_index("Y1").unwrap()));
        assert!(!g.is_removed(g.node_index("Y2").unwrap()));
    }

    #[test]
    fn missing_long_nodes_abort() {
        let (mut g, _) = parse(DIAMOND);
        let cov = NodeCoverage::from_values(vec![Some(20.0); 4]);
        assert!(matches!(
            simplify(&mut g, &cov, &SimplificationParams::default()),
            Err(BubbleError::DegenerateCoverage { .. })
        ));
    }
}
