//! Bubble popping by widest path.
//!
//! The region between the source and the sink of a detected bubble is explored
//! again with a stack-based depth-first search. Every node-side remembers the
//! predecessor through which it was reached with the highest bottleneck
//! coverage (the minimum node coverage along the path). A predecessor is only
//! replaced by a strictly wider path, so among equally wide paths the first one
//! discovered is kept. The widest path is reconstructed from the sink, and
//! every other node and edge seen in the region is removed from the graph.

use std::collections::{HashMap, HashSet};

use log::trace;

use crate::create_assembly_graph::AssemblyGraph;
use crate::error::{BubbleError, Result};
use crate::node_coverage::NodeCoverage;
use crate::superbubble_detection::Bubble;
use crate::utils::NodeSide;

/// Nodes and edges removed so far, in removal order
#[derive(Default)]
pub struct Removed {
    nodes: Vec<usize>,
    node_set: HashSet<usize>,
    edges: Vec<(NodeSide, NodeSide)>,
    edge_set: HashSet<(NodeSide, NodeSide)>,
}

impl Removed {
    pub fn add_node(&mut self, node: usize) {
        if self.node_set.insert(node) {
            self.nodes.push(node);
        }
    }

    pub fn add_edge(&mut self, from: NodeSide, to: NodeSide) {
        if self.edge_set.insert((from, to)) {
            self.edges.push((from, to));
        }
    }

    pub fn contains_node(&self, node: usize) -> bool {
        self.node_set.contains(&node)
    }

    /// An edge is removed if it or its dual was recorded
    pub fn contains_edge(&self, from: NodeSide, to: NodeSide) -> bool {
        self.edge_set.contains(&(from, to)) || self.edge_set.contains(&(to.rev(), from.rev()))
    }

    /// An edge line is dropped if the edge or one of its endpoints is removed
    pub fn drops_edge(&self, from: NodeSide, to: NodeSide) -> bool {
        self.contains_node(from.node) || self.contains_node(to.node) || self.contains_edge(from, to)
    }

    pub fn nodes(&self) -> &[usize] {
        &self.nodes
    }

    pub fn edges(&self) -> &[(NodeSide, NodeSide)] {
        &self.edges
    }

    /// Removed edges that are not already implied by a removed endpoint
    pub fn reported_edges(&self) -> impl Iterator<Item = &(NodeSide, NodeSide)> + '_ {
        self.edges.iter().filter(|(from, to)| !self.contains_node(from.node) && !self.contains_node(to.node))
    }
}

/// Summary of one popped bubble
pub struct PoppedBubble {
    pub kept_path: Vec<NodeSide>,
    pub removed_nodes: usize,
    pub removed_edges: usize,
}

/// Keep the widest path from source to sink and remove the rest of the bubble.
pub fn pop_bubble(
    graph: &mut AssemblyGraph,
    bubble: Bubble,
    coverage: &NodeCoverage,
    removed: &mut Removed,
) -> Result<PoppedBubble> {
    let Bubble { source: start, sink: end } = bubble;

    let mut bubble_nodes: Vec<usize> = Vec::new();
    let mut bubble_node_set: HashSet<usize> = HashSet::new();
    let mut bubble_edges: Vec<(NodeSide, NodeSide)> = Vec::new();
    let mut bubble_edge_set: HashSet<(NodeSide, NodeSide)> = HashSet::new();
    // node-side -> (predecessor, bottleneck coverage of the best path through it)
    let mut predecessor: HashMap<NodeSide, (Option<NodeSide>, f64)> = HashMap::new();

    let mut stack: Vec<(NodeSide, Option<NodeSide>, f64)> = vec![(start, None, coverage.width(start.node))];
    while let Some((top, before, width)) = stack.pop() {
        match predecessor.get(&top) {
            Some(&(_, best)) if best >= width => {}
            _ => {
                predecessor.insert(top, (before, width));
            }
        }
        if bubble_node_set.insert(top.node) {
            bubble_nodes.push(top.node);
        }
        if let Some(before) = before {
            if bubble_edge_set.insert((before, top)) {
                bubble_edges.push((before, top));
            }
        }
        if top == end {
            continue;
        }
        for &u in graph.out_edges(top) {
            stack.push((u, Some(top), width.min(coverage.width(u.node))));
        }
    }

    let path = reconstruct_path(&predecessor, start, end, graph)?;

    let kept_nodes: HashSet<usize> = path.iter().map(|side| side.node).collect();
    let kept_edges: HashSet<(NodeSide, NodeSide)> = path.windows(2).map(|w| (w[0], w[1])).collect();
    if kept_nodes.len() != path.len() {
        return Err(BubbleError::invariant(format!(
            "widest path from {} to {} visits a node twice",
            graph.side_name(start),
            graph.side_name(end)
        )));
    }
    if kept_edges.len() != path.len() - 1 {
        return Err(BubbleError::invariant(format!(
            "widest path from {} to {} has {} nodes but {} edges",
            graph.side_name(start),
            graph.side_name(end),
            path.len(),
            kept_edges.len()
        )));
    }
    if kept_nodes.len() > bubble_nodes.len() || kept_edges.len() > bubble_edges.len() {
        return Err(BubbleError::invariant(format!(
            "widest path from {} to {} is larger than its bubble",
            graph.side_name(start),
            graph.side_name(end)
        )));
    }

    let mut removed_nodes = 0usize;
    for &node in &bubble_nodes {
        if kept_nodes.contains(&node) {
            continue;
        }
        trace!("popping node {}", graph.node_name(node));
        graph.remove_node(node)?;
        removed.add_node(node);
        removed_nodes += 1;
    }

    let mut removed_edges = 0usize;
    for &(from, to) in &bubble_edges {
        if kept_edges.contains(&(from, to)) || kept_edges.contains(&(to.rev(), from.rev())) {
            continue;
        }
        removed.add_edge(from, to);
        graph.remove_edge(from, to);
        removed_edges += 1;
    }

    Ok(PoppedBubble { kept_path: path, removed_nodes, removed_edges })
}

/// Follow predecessors back from `end` to `start`. Fails if the chain breaks or loops.
fn reconstruct_path(
    predecessor: &HashMap<NodeSide, (Option<NodeSide>, f64)>,
    start: NodeSide,
    end: NodeSide,
    graph: &AssemblyGraph,
) -> Result<Vec<NodeSide>> {
    let mut path_rev: Vec<NodeSide> = vec![end];
    let mut cur = end;
    while cur != start {
        match predecessor.get(&cur) {
            Some(&(Some(prev), _)) => {
                path_rev.push(prev);
                cur = prev;
            }
            _ => {
                return Err(BubbleError::invariant(format!(
                    "no path from {} reaches {}",
                    graph.side_name(start),
                    graph.side_name(end)
                )));
            }
        }
        if path_rev.len() > predecessor.len() {
            return Err(BubbleError::invariant(format!(
                "predecessors between {} and {} form a cycle",
                graph.side_name(start),
                graph.side_name(end)
            )));
        }
    }
    path_rev.reverse();
    Ok(path_rev)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::create_assembly_graph::tests::{fwd, parse, DIAMOND};
    use crate::superbubble_detection::find_bubble;

    fn diamond_with(b: f64, c: f64) -> (AssemblyGraph, NodeCoverage) {
        let (g, _) = parse(DIAMOND);
        let cov = NodeCoverage::from_values(vec![Some(20.0), Some(b), Some(c), Some(20.0)]);
        (g, cov)
    }

    fn pop_from_a(g: &mut AssemblyGraph, cov: &NodeCoverage, removed: &mut Removed) -> PoppedBubble {
        let bubble = find_bubble(g, fwd(g, "A"), 10).unwrap().unwrap();
        pop_bubble(g, bubble, cov, removed).unwrap()
    }

    #[test]
    fn equal_coverage_keeps_one_branch() {
        let (mut g, cov) = diamond_with(20.0, 20.0);
        let mut removed = Removed::default();
        let popped = pop_from_a(&mut g, &cov, &mut removed);
        assert_eq!(popped.kept_path.len(), 3);
        assert_eq!(popped.removed_nodes, 1);
        assert_eq!(removed.nodes().len(), 1);
        let gone = removed.nodes()[0];
        assert!(gone == g.node_index("B").unwrap() || gone == g.node_index("C").unwrap());
        assert_eq!(g.edge_count(), 2);
        g.check_symmetry().unwrap();
    }

    #[test]
    fn low_coverage_branch_is_pruned() {
        let (mut g, cov) = diamond_with(5.0, 20.0);
        let mut removed = Removed::default();
        let popped = pop_from_a(&mut g, &cov, &mut removed);
        let b = g.node_index("B").unwrap();
        assert_eq!(removed.nodes(), &[b]);
        assert_eq!(popped.kept_path, vec![fwd(&g, "A"), fwd(&g, "C"), fwd(&g, "D")]);
        assert!(g.is_removed(b));
        assert!(!g.is_removed(g.node_index("C").unwrap()));
    }

    #[test]
    fn wider_path_found_later_replaces_predecessor() {
        // C is explored first; B is wider and must win
        let (mut g, cov) = diamond_with(20.0, 5.0);
        let mut removed = Removed::default();
        let popped = pop_from_a(&mut g, &cov, &mut removed);
        assert_eq!(popped.kept_path, vec![fwd(&g, "A"), fwd(&g, "B"), fwd(&g, "D")]);
        assert_eq!(removed.nodes(), &[g.node_index("C").unwrap()]);
    }

    #[test]
    fn parallel_shortcut_edge_is_removed() {
        // A -> D directly next to A -> B -> D; the path through B is discovered first
        let text = "S\tA\tA\nS\tB\tC\nS\tD\tG\n\
            L\tA\t+\tD\t+\t0M\nL\tA\t+\tB\t+\t0M\nL\tB\t+\tD\t+\t0M\n";
        let (mut g, _) = parse(text);
        let cov = NodeCoverage::from_values(vec![Some(20.0), Some(20.0), Some(20.0)]);
        let mut removed = Removed::default();
        let a = fwd(&g, "A");
        let d = fwd(&g, "D");
        let bubble = find_bubble(&g, a, 10).unwrap().unwrap();
        assert_eq!(bubble.sink, d);
        let popped = pop_bubble(&mut g, bubble, &cov, &mut removed).unwrap();
        assert_eq!(popped.removed_nodes, 0);
        assert_eq!(popped.removed_edges, 1);
        assert_eq!(removed.edges(), &[(a, d)]);
        assert!(!g.has_edge(a, d));
        assert!(!g.has_edge(d.rev(), a.rev()));
        assert!(removed.contains_edge(d.rev(), a.rev()));
        assert_eq!(removed.reported_edges().count(), 1);
        g.check_symmetry().unwrap();
    }

    #[test]
    fn kept_path_is_simple_and_bounded() {
        // two stacked diamonds: A -> {B, C} -> D -> {E, F} -> G
        let text = "S\tA\tA\nS\tB\tA\nS\tC\tA\nS\tD\tA\nS\tE\tA\nS\tF\tA\nS\tG\tA\n\
            L\tA\t+\tB\t+\t0M\nL\tA\t+\tC\t+\t0M\nL\tB\t+\tD\t+\t0M\nL\tC\t+\tD\t+\t0M\n\
            L\tD\t+\tE\t+\t0M\nL\tD\t+\tF\t+\t0M\nL\tE\t+\tG\t+\t0M\nL\tF\t+\tG\t+\t0M\n";
        let (mut g, _) = parse(text);
        let cov = NodeCoverage::from_values(vec![Some(20.0), Some(3.0), Some(18.0), Some(20.0), Some(19.0), Some(2.0), Some(20.0)]);
        let mut removed = Removed::default();
        let bubble = find_bubble(&g, fwd(&g, "A"), 10).unwrap().unwrap();
        assert_eq!(bubble.sink, fwd(&g, "D"));
        let popped = pop_bubble(&mut g, bubble, &cov, &mut removed).unwrap();
        assert_eq!(popped.kept_path.first(), Some(&fwd(&g, "A")));
        assert_eq!(popped.kept_path.last(), Some(&fwd(&g, "D")));
        let distinct: HashSet<usize> = popped.kept_path.iter().map(|s| s.node).collect();
        assert_eq!(distinct.len(), popped.kept_path.len());
        assert!(popped.kept_path.len() <= 4);
        assert_eq!(removed.nodes(), &[g.node_index("B").unwrap()]);
        // the second diamond is untouched
        assert_eq!(g.out_edges(fwd(&g, "D")).len(), 2);
    }

    #[test]
    fn removed_edges_match_in_both_orientations() {
        let mut removed = Removed::default();
        let a = NodeSide::forward(0);
        let b = NodeSide::reverse(1);
        removed.add_edge(a, b);
        removed.add_edge(a, b);
        assert_eq!(removed.edges().len(), 1);
        assert!(removed.contains_edge(a, b));
        assert!(removed.contains_edge(b.rev(), a.rev()));
        assert!(!removed.contains_edge(b, a));
        removed.add_node(1);
        assert!(removed.drops_edge(NodeSide::forward(1), NodeSide::forward(2)));
        assert_eq!(removed.reported_edges().count(), 0);
    }
}
