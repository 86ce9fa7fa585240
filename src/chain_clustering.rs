//! Chain clustering module
//! group nodes into coverage-homogeneous chains with a weighted union-find:
//! 1) collect merge candidates from unbounded superbubble detection (source and sink of every bubble)
//! 2) sort the candidates by coverage similarity
//! 3) relax: merge chains whose average coverages are close, defer the others, repeat until a pass merges nothing

use std::collections::HashSet;

use log::{debug, info};
use union_find::{QuickUnionUf, Union, UnionFind, UnionResult};

use crate::create_assembly_graph::AssemblyGraph;
use crate::error::Result;
use crate::node_coverage::NodeCoverage;
use crate::superbubble_detection::find_bubble;
use crate::utils::coverage_ratio;

/// Pair of covered nodes that are the two ends of a bubble
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MergeCandidate {
    pub first: usize,
    pub second: usize,
    /// max(a/b, b/a) of the two node coverages
    pub score: f64,
}

/// Per-chain sums carried by the union-find roots
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ChainSums {
    /// sum of coverage * length over members
    pub coverage_sum: f64,
    pub length_sum: f64,
    pub covered: bool,
}

impl Union for ChainSums {
    /// The left chain stays the representative
    fn union(left: Self, right: Self) -> UnionResult<Self> {
        UnionResult::Left(ChainSums {
            coverage_sum: left.coverage_sum + right.coverage_sum,
            length_sum: left.length_sum + right.length_sum,
            covered: left.covered && right.covered,
        })
    }
}

/// Union-find over node indices, one `ChainSums` per chain
pub struct Chains {
    sets: QuickUnionUf<ChainSums>,
}

impl Chains {

    /// One singleton chain per node
    pub fn new(graph: &AssemblyGraph, coverage: &NodeCoverage) -> Self {
        let sets = (0..graph.node_count())
            .map(|node| match coverage.get(node) {
                Some(cov) => {
                    let len = graph.node_length(node) as f64;
                    ChainSums { coverage_sum: cov * len, length_sum: len, covered: true }
                }
                None => ChainSums::default(),
            })
            .collect();
        Self { sets }
    }

    /// Representative of the chain containing `node`
    pub fn find(&mut self, node: usize) -> usize {
        self.sets.find(node)
    }

    /// Sums of the chain containing `node`
    pub fn sums(&mut self, node: usize) -> ChainSums {
        *self.sets.get(node)
    }

    /// Attach the chain of `right` under the chain of `left`.
    /// Returns false if both are already in the same chain or either is uncovered.
    pub fn merge(&mut self, left: usize, right: usize) -> bool {
        if self.find(left) == self.find(right) || !self.sums(left).covered || !self.sums(right).covered {
            return false;
        }
        self.sets.union(left, right)
    }

    /// Length-weighted average coverage of the chain containing `node`
    pub fn chain_coverage(&mut self, node: usize) -> Option<f64> {
        let sums = self.sums(node);
        if !sums.covered || sums.length_sum == 0.0 {
            return None;
        }
        Some(sums.coverage_sum / sums.length_sum)
    }

    /// Number of distinct chains over covered nodes
    pub fn chain_count(&mut self) -> usize {
        let mut roots = HashSet::new();
        for node in 0..self.sets.size() {
            if self.sums(node).covered {
                roots.insert(self.find(node));
            }
        }
        roots.len()
    }

    /// Merge candidates until a full pass merges nothing. Candidates whose chains are
    /// not within `max_ratio` of each other are kept, in their current order, for the next pass.
    /// Returns the number of merges of every pass.
    pub fn relax(&mut self, candidates: Vec<MergeCandidate>, max_ratio: f64) -> Vec<usize> {
        let mut pending = candidates;
        let mut merges_per_pass: Vec<usize> = Vec::new();
        loop {
            let mut deferred: Vec<MergeCandidate> = Vec::new();
            let mut merged = 0usize;
            for candidate in pending.into_iter() {
                let key1 = self.find(candidate.first);
                let key2 = self.find(candidate.second);
                if key1 == key2 {
                    continue;
                }
                let (Some(cov1), Some(cov2)) = (self.chain_coverage(key1), self.chain_coverage(key2)) else {
                    continue;
                };
                if cov1 > cov2 * max_ratio || cov2 > cov1 * max_ratio {
                    deferred.push(candidate);
                    continue;
                }
                self.merge(candidate.first, candidate.second);
                merged += 1;
            }
            debug!("Relaxation pass {}: {} merges, {} deferred", merges_per_pass.len() + 1, merged, deferred.len());
            merges_per_pass.push(merged);
            if merged == 0 {
                break;
            }
            pending = deferred;
        }
        merges_per_pass
    }

    /// Roots of chains whose coverage lies in [low * avg, high * avg]
    pub fn unique_roots(&mut self, avg_coverage: f64, low: f64, high: f64) -> HashSet<usize> {
        let mut unique = HashSet::new();
        for node in 0..self.sets.size() {
            let Some(cov) = self.chain_coverage(node) else { continue };
            if cov >= avg_coverage * low && cov <= avg_coverage * high {
                unique.insert(self.find(node));
            }
        }
        unique
    }
}

/// Run unbounded superbubble detection from every node-side and keep the bubbles
/// whose source and sink both have coverage. Sorted by score, best first; ties keep discovery order.
pub fn collect_merge_candidates(graph: &AssemblyGraph, coverage: &NodeCoverage) -> Result<Vec<MergeCandidate>> {
    let bound = graph.node_count();
    let mut candidates: Vec<MergeCandidate> = Vec::new();
    for side in graph.sides() {
        let Some(bubble) = find_bubble(graph, side, bound)? else { continue };
        let first = bubble.source.node;
        let second = bubble.sink.node;
        let (Some(cov1), Some(cov2)) = (coverage.get(first), coverage.get(second)) else {
            continue;
        };
        candidates.push(MergeCandidate { first, second, score: coverage_ratio(cov1, cov2) });
    }
    candidates.sort_by(|a, b| a.score.total_cmp(&b.score));
    Ok(candidates)
}

/// Build the chains: candidates, relaxation, and the per-pass merge counts
pub fn cluster_chains(graph: &AssemblyGraph, coverage: &NodeCoverage, max_ratio: f64) -> Result<(Chains, Vec<usize>)> {
    let candidates = collect_merge_candidates(graph, coverage)?;
    info!("Found {} chain merge candidates", candidates.len());
    let mut chains = Chains::new(graph, coverage);
    let passes = chains.relax(candidates, max_ratio);
    info!(
        "Chain clustering converged after {} passes, {} merges, {} chains",
        passes.len(),
        passes.iter().sum::<usize>(),
        chains.chain_count()
    );
    Ok((chains, passes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::create_assembly_graph::tests::{parse, DIAMOND};
    use crate::create_assembly_graph::NodeRecord;

    fn flat_graph(n: usize) -> AssemblyGraph {
        let nodes = (0..n).map(|i| NodeRecord { name: format!("n{}", i), length: 100 }).collect();
        AssemblyGraph::load(nodes, &[]).unwrap()
    }

    fn candidate(first: usize, second: usize) -> MergeCandidate {
        MergeCandidate { first, second, score: 1.0 }
    }

    #[test]
    fn find_is_idempotent_along_a_merged_path() {
        let g = flat_graph(6);
        let cov = NodeCoverage::from_values(vec![Some(10.0); 6]);
        let mut chains = Chains::new(&g, &cov);
        // 5 under 4 under ... under 0
        for i in (0..5).rev() {
            assert!(chains.merge(i, i + 1));
        }
        let root = chains.find(5);
        assert_eq!(root, 0);
        assert_eq!(chains.find(5), root);
        assert!((0..6).all(|n| chains.find(n) == root));
        let sums = chains.sums(3);
        assert!((sums.length_sum - 600.0).abs() < 1e-9);
        assert!((sums.coverage_sum - 6000.0).abs() < 1e-9);
        assert_eq!(chains.chain_count(), 1);
    }

    #[test]
    fn merge_sums_accumulators() {
        let nodes = vec![
            NodeRecord { name: "a".to_string(), length: 100 },
            NodeRecord { name: "b".to_string(), length: 300 },
        ];
        let g = AssemblyGraph::load(nodes, &[]).unwrap();
        let cov = NodeCoverage::from_values(vec![Some(10.0), Some(20.0)]);
        let mut chains = Chains::new(&g, &cov);
        assert!(chains.merge(0, 1));
        assert!(!chains.merge(1, 0));
        assert_eq!(chains.find(1), 0);
        let merged = chains.chain_coverage(1).unwrap();
        assert!((merged - 17.5).abs() < 1e-9);
    }

    #[test]
    fn uncovered_nodes_never_merge() {
        let g = flat_graph(2);
        let cov = NodeCoverage::from_values(vec![Some(10.0), None]);
        let mut chains = Chains::new(&g, &cov);
        assert!(!chains.merge(0, 1));
        assert_eq!(chains.chain_coverage(1), None);
        assert_eq!(chains.chain_count(), 1);
    }

    #[test]
    fn close_coverage_merges() {
        let g = flat_graph(2);
        let cov = NodeCoverage::from_values(vec![Some(10.0), Some(12.0)]);
        let mut chains = Chains::new(&g, &cov);
        let passes = chains.relax(vec![candidate(0, 1)], 1.5);
        assert_eq!(chains.find(0), chains.find(1));
        assert_eq!(passes, vec![1, 0]);
    }

    #[test]
    fn distant_coverage_does_not_merge() {
        let g = flat_graph(2);
        let cov = NodeCoverage::from_values(vec![Some(10.0), Some(20.0)]);
        let mut chains = Chains::new(&g, &cov);
        let passes = chains.relax(vec![candidate(0, 1)], 1.5);
        assert_ne!(chains.find(0), chains.find(1));
        assert_eq!(passes, vec![0]);
    }

    #[test]
    fn deferred_candidate_merges_after_coverage_shifts() {
        // (0,2) and (3,2) start too far apart and stay deferred while other merges move the chains
        let g = flat_graph(4);
        let cov = NodeCoverage::from_values(vec![Some(10.0), Some(14.0), Some(20.0), Some(11.0)]);
        let mut chains = Chains::new(&g, &cov);
        let candidates = vec![candidate(0, 2), candidate(1, 2), candidate(0, 3), candidate(3, 2)];
        let passes = chains.relax(candidates, 1.5);
        // pass 1: (0,2) deferred, (1,2) merges -> 17, (0,3) merges -> 10.5, (3,2) 10.5 vs 17 deferred
        // pass 2: (0,2) 10.5 vs 17 deferred, (3,2) deferred -> stop
        assert_eq!(passes, vec![2, 0]);
        assert_eq!(chains.chain_count(), 2);
    }

    #[test]
    fn chain_count_strictly_decreases_with_merges() {
        let g = flat_graph(5);
        let cov = NodeCoverage::from_values(vec![Some(10.0), Some(11.0), Some(12.0), Some(13.0), Some(40.0)]);
        let mut chains = Chains::new(&g, &cov);
        let before = chains.chain_count();
        let candidates = vec![candidate(0, 1), candidate(1, 2), candidate(2, 3), candidate(3, 4)];
        let passes = chains.relax(candidates, 1.5);
        let merged: usize = passes.iter().sum();
        assert_eq!(chains.chain_count(), before - merged);
        assert_eq!(merged, 3);
        assert_eq!(*passes.last().unwrap(), 0);
    }

    #[test]
    fn unique_chains_within_band() {
        let g = flat_graph(3);
        let cov = NodeCoverage::from_values(vec![Some(20.0), Some(45.0), None]);
        let mut chains = Chains::new(&g, &cov);
        let unique = chains.unique_roots(20.0, 0.5, 1.5);
        assert!(unique.contains(&0));
        assert!(!unique.contains(&1));
        assert!(!unique.contains(&2));
    }

    #[test]
    fn diamond_candidates_from_both_orientations() {
        let (g, _) = parse(DIAMOND);
        let cov = NodeCoverage::from_values(vec![Some(20.0), Some(20.0), Some(20.0), Some(24.0)]);
        let candidates = collect_merge_candidates(&g, &cov).unwrap();
        assert_eq!(candidates.len(), 2);
        assert!(candidates.iter().all(|c| (c.score - 1.2).abs() < 1e-9));
        // equal scores stay in node order: >A first, then <D
        assert_eq!((candidates[0].first, candidates[0].second), (0, 3));
        assert_eq!((candidates[1].first, candidates[1].second), (3, 0));
        let (mut chains, _) = cluster_chains(&g, &cov, 1.5).unwrap();
        assert_eq!(chains.find(0), chains.find(3));
        assert_ne!(chains.find(0), chains.find(1));
    }

    #[test]
    fn candidates_need_coverage_on_both_ends() {
        let (g, _) = parse(DIAMOND);
        let cov = NodeCoverage::from_values(vec![Some(20.0), Some(20.0), Some(20.0), None]);
        assert!(collect_merge_candidates(&g, &cov).unwrap().is_empty());
    }
}
