use std::collections::{BTreeMap, HashSet};

use crate::create_assembly_graph::AssemblyGraph;
use crate::utils::NodeSide;

/// Find weakly connected components of the graph, as lists of node indices.
pub fn weakly_connected_components(graph: &AssemblyGraph) -> Vec<Vec<usize>> {

    // Edges are stored on both strands, so following out-edges of both sides of a
    // node reaches every neighbour regardless of direction.
    let mut visited: HashSet<usize> = HashSet::new();
    let mut components: Vec<Vec<usize>> = Vec::new();

    for start in 0..graph.node_count() {

        // check if already visited or removed
        if graph.is_removed(start) || visited.contains(&start) {
            continue;
        }

        // new component
        let mut component: Vec<usize> = Vec::new();
        let mut stack: Vec<usize> = vec![start];
        visited.insert(start);

        while let Some(current) = stack.pop() {
            component.push(current);
            for side in [NodeSide::forward(current), NodeSide::reverse(current)] {
                for neighbor in graph.out_edges(side) {
                    if visited.insert(neighbor.node) {
                        stack.push(neighbor.node);
                    }
                }
            }
        }

        components.push(component);
    }

    components
}

/// Convenience: return component sizes sorted descending
pub fn component_sizes_sorted(graph: &AssemblyGraph) -> Vec<usize> {
    let mut sizes: Vec<usize> = weakly_connected_components(graph)
        .into_iter()
        .map(|c| c.len())
        .collect();
    sizes.sort_unstable_by(|a, b| b.cmp(a));
    sizes
}

/// Out-degree distribution over node-sides (degree -> count)
pub fn out_degree_distribution(graph: &AssemblyGraph) -> BTreeMap<usize, usize> {
    let mut dist: BTreeMap<usize, usize> = BTreeMap::new();
    for side in graph.sides() {
        *dist.entry(graph.out_edges(side).len()).or_default() += 1;
    }
    dist
}
