use std::collections::HashSet;

use crate::create_assembly_graph::AssemblyGraph;
use crate::error::{BubbleError, Result};
use crate::utils::NodeSide;

/// A region where every path leaving `source` re-converges at `sink`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bubble {
    pub source: NodeSide,
    pub sink: NodeSide,
}

/// Superbubble detection from a single entrance.
/// Detecting Superbubbles in Assembly Graphs, Onodera et al. 2013, fig. 5
///
/// Sides are moved from `seen` to `visited` once popped, and a side is pushed
/// on the stack only when all of its in-neighbours are visited. The sweep aborts
/// on anything that is not a clean single-entry single-exit region: more than
/// `max_size` visited sides, a dead end, an edge into the other side of the same
/// node, a path folding back onto a visited side, or an edge back to `start`.
///
/// Returns Ok(None) when there is no bubble at `start`.
pub fn find_bubble(graph: &AssemblyGraph, start: NodeSide, max_size: usize) -> Result<Option<Bubble>> {
    if graph.out_edges(start).len() < 2 {
        return Ok(None);
    }

    let mut stack: Vec<NodeSide> = vec![start];
    let mut visited: HashSet<NodeSide> = HashSet::new();
    let mut seen: HashSet<NodeSide> = HashSet::new();
    seen.insert(start);

    while let Some(v) = stack.pop() {
        if !seen.remove(&v) || !visited.insert(v) {
            return Err(BubbleError::invariant(format!(
                "superbubble sweep popped {} twice",
                graph.side_name(v)
            )));
        }
        if visited.len() > max_size {
            return Ok(None);
        }
        let outs = graph.out_edges(v);
        if outs.is_empty() {
            return Ok(None);
        }

        for &u in outs {
            if u.node == v.node {
                return Ok(None);
            }
            if visited.contains(&u.rev()) {
                return Ok(None);
            }
            if u == start {
                return Ok(None);
            }
            if visited.contains(&u) {
                return Err(BubbleError::invariant(format!(
                    "{} reached again after it was settled",
                    graph.side_name(u)
                )));
            }
            seen.insert(u);

            let mut has_parent = false;
            let mut all_parents_visited = true;
            for parent in graph.in_edges(u) {
                has_parent = true;
                if !visited.contains(&parent) {
                    all_parents_visited = false;
                }
            }
            if !has_parent {
                return Err(BubbleError::invariant(format!(
                    "edge {} -> {} has no dual",
                    graph.side_name(v),
                    graph.side_name(u)
                )));
            }
            if all_parents_visited {
                stack.push(u);
            }
        }

        if stack.len() == 1 && seen.len() == 1 && seen.contains(&stack[0]) {
            let sink = stack[0];
            if graph.out_edges(sink).contains(&start) {
                return Ok(None);
            }
            return Ok(Some(Bubble { source: start, sink }));
        }
    }

    Ok(None)
}
