//! Assembly graph module
//! parse S and L records of a GFA file and build the bidirected assembly graph

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufWriter, Write};

use log::{debug, info};

use crate::error::{BubbleError, Result};
use crate::utils::{NodeSide, Orientation};

/// A segment record: node name and sequence length
pub struct NodeRecord {
    pub name: String,
    pub length: usize,
}

/// A link record between two named, oriented nodes
pub struct EdgeRecord {
    pub from: String,
    pub from_orientation: Orientation,
    pub to: String,
    pub to_orientation: Orientation,
}

/// An L line kept for output, with its endpoints resolved to node-sides
pub struct LinkLine {
    pub from: NodeSide,
    pub to: NodeSide,
    pub line: String,
}

/// Header, segment and link lines of the input, in input order, kept for re-emission
#[derive(Default)]
pub struct GfaLines {
    pub headers: Vec<String>,
    pub segments: Vec<(usize, String)>,
    pub links: Vec<LinkLine>,
}

/// Bidirected assembly graph. Every node has two sides (forward and reverse),
/// and the out-edges of every side are stored in insertion order.
/// An edge a -> b is always stored together with its dual rev(b) -> rev(a).
pub struct AssemblyGraph {
    names: Vec<String>,
    lengths: Vec<usize>,
    index: HashMap<String, usize>,
    edges: Vec<Vec<NodeSide>>,
    removed: Vec<bool>,
}

impl AssemblyGraph {

    /// Create a new empty assembly graph
    pub fn new() -> Self {
        Self {
            names: Vec::new(),
            lengths: Vec::new(),
            index: HashMap::new(),
            edges: Vec::new(),
            removed: Vec::new(),
        }
    }

    /// Build the graph from node and edge records. Both the forward and the dual
    /// adjacency entry are added for every edge.
    pub fn load(node_records: Vec<NodeRecord>, edge_records: &[EdgeRecord]) -> Result<Self> {
        let mut g = Self::new();
        for record in node_records {
            g.add_node(record.name, record.length)?;
        }
        for record in edge_records {
            let from = g.side(&record.from, record.from_orientation)?;
            let to = g.side(&record.to, record.to_orientation)?;
            g.add_edge(from, to);
        }
        Ok(g)
    }

    /// Parse a GFA stream. Returns the graph and the lines needed to write it back out.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<(Self, GfaLines)> {
        let mut lines = GfaLines::default();
        let mut node_records: Vec<NodeRecord> = Vec::new();
        let mut seen_names: HashSet<String> = HashSet::new();
        let mut edge_records: Vec<EdgeRecord> = Vec::new();
        let mut link_lines: Vec<(usize, String)> = Vec::new();

        for (i, line_res) in reader.lines().enumerate() {
            let line_nr = i + 1;
            let line = line_res?;
            let line = line.trim_end();

            // skip comments and empty lines
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let fields: Vec<&str> = line.split('\t').collect();
            match fields[0] {
                "H" => lines.headers.push(line.to_string()),
                "S" => {
                    let record = parse_segment(&fields, line_nr)?;
                    if !seen_names.insert(record.name.clone()) {
                        return Err(BubbleError::malformed(line_nr, format!("duplicate segment {}", record.name)));
                    }
                    lines.segments.push((node_records.len(), line.to_string()));
                    node_records.push(record);
                }
                "L" => {
                    edge_records.push(parse_link(&fields, line_nr)?);
                    link_lines.push((line_nr, line.to_string()));
                }
                other => {
                    return Err(BubbleError::malformed(line_nr, format!("unknown record type '{}'", other)));
                }
            }
        }

        // links may precede the segments they reference, so endpoints are checked once all S lines are read
        for (record, (line_nr, _)) in edge_records.iter().zip(&link_lines) {
            for name in [&record.from, &record.to] {
                if !seen_names.contains(name) {
                    return Err(BubbleError::malformed(*line_nr, format!("link references unknown segment {}", name)));
                }
            }
        }

        let graph = Self::load(node_records, &edge_records)?;

        for (record, (_, line)) in edge_records.iter().zip(link_lines) {
            let from = graph.side(&record.from, record.from_orientation)?;
            let to = graph.side(&record.to, record.to_orientation)?;
            lines.links.push(LinkLine { from, to, line });
        }

        info!("Loaded graph with {} nodes and {} edges", graph.node_count(), graph.edge_count());
        Ok((graph, lines))
    }

    /// Add a node, returns its index
    fn add_node(&mut self, name: String, length: usize) -> Result<usize> {
        if self.index.contains_key(&name) {
            return Err(BubbleError::invariant(format!("node {} added twice", name)));
        }
        let id = self.names.len();
        self.index.insert(name.clone(), id);
        self.names.push(name);
        self.lengths.push(length);
        self.removed.push(false);
        self.edges.push(Vec::new());
        self.edges.push(Vec::new());
        Ok(id)
    }

    /// Add the edge from -> to and its dual rev(to) -> rev(from). Existing edges are ignored.
    fn add_edge(&mut self, from: NodeSide, to: NodeSide) {
        if self.edges[from.slot()].contains(&to) {
            debug!("duplicate edge {} -> {} ignored", self.side_name(from), self.side_name(to));
            return;
        }
        self.edges[from.slot()].push(to);
        let dual = &mut self.edges[to.rev().slot()];
        if !dual.contains(&from.rev()) {
            dual.push(from.rev());
        }
    }

    /// Resolve a node name and orientation to a node-side
    pub fn side(&self, name: &str, orientation: Orientation) -> Result<NodeSide> {
        match self.index.get(name) {
            Some(&id) => Ok(NodeSide::new(id, orientation)),
            None => Err(BubbleError::invariant(format!("edge references unknown node {}", name))),
        }
    }

    pub fn node_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn node_name(&self, node: usize) -> &str {
        &self.names[node]
    }

    pub fn node_length(&self, node: usize) -> usize {
        self.lengths[node]
    }

    /// Number of nodes ever loaded (removed nodes included)
    pub fn node_count(&self) -> usize {
        self.names.len()
    }

    pub fn is_removed(&self, node: usize) -> bool {
        self.removed[node]
    }

    /// Number of bidirected edges; an edge and its dual count once
    pub fn edge_count(&self) -> usize {
        let mut directed = 0usize;
        let mut self_dual = 0usize;
        for slot in 0..self.edges.len() {
            let side = slot_side(slot);
            for &u in &self.edges[slot] {
                directed += 1;
                if u == side.rev() {
                    self_dual += 1;
                }
            }
        }
        (directed + self_dual) / 2
    }

    /// Node-sides reachable by one out-edge
    pub fn out_edges(&self, side: NodeSide) -> &[NodeSide] {
        &self.edges[side.slot()]
    }

    /// Node-sides with an out-edge into `side`
    pub fn in_edges(&self, side: NodeSide) -> impl Iterator<Item = NodeSide> + '_ {
        self.edges[side.rev().slot()].iter().map(|u| u.rev())
    }

    pub fn has_edge(&self, from: NodeSide, to: NodeSide) -> bool {
        self.edges[from.slot()].contains(&to)
    }

    /// All node-sides of nodes that have not been removed, in node order, forward first
    pub fn sides(&self) -> impl Iterator<Item = NodeSide> + '_ {
        (0..self.node_count())
            .filter(|&n| !self.removed[n])
            .flat_map(|n| [NodeSide::forward(n), NodeSide::reverse(n)])
    }

    /// Name a node-side for diagnostics, e.g. ">utg1"
    pub fn side_name(&self, side: NodeSide) -> String {
        side.display_with(&self.names[side.node]).to_string()
    }

    /// Remove a node: delete the adjacency of both its sides and, for every neighbour,
    /// the reverse entry pointing back at the node.
    pub fn remove_node(&mut self, node: usize) -> Result<()> {
        if self.removed[node] {
            return Ok(());
        }
        for side in [NodeSide::forward(node), NodeSide::reverse(node)] {
            let outs = std::mem::take(&mut self.edges[side.slot()]);
            for u in outs {
                let dual = &mut self.edges[u.rev().slot()];
                match dual.iter().position(|&w| w == side.rev()) {
                    Some(pos) => {
                        dual.remove(pos);
                    }
                    // an edge between the two sides of this node was already taken with the other side
                    None if u.node == node => {}
                    None => {
                        return Err(BubbleError::invariant(format!(
                            "edge {} -> {} has no dual",
                            self.side_name(side),
                            self.side_name(u)
                        )));
                    }
                }
            }
        }
        self.removed[node] = true;
        Ok(())
    }

    /// Remove the edge from -> to and its dual. Missing directions are ignored.
    pub fn remove_edge(&mut self, from: NodeSide, to: NodeSide) {
        self.edges[from.slot()].retain(|&w| w != to);
        self.edges[to.rev().slot()].retain(|&w| w != from.rev());
    }

    /// Check the bigraph is synchronized:
    /// every edge a -> b has its dual rev(b) -> rev(a) and no edge touches a removed node.
    pub fn check_symmetry(&self) -> Result<()> {
        for slot in 0..self.edges.len() {
            let side = slot_side(slot);
            for &u in &self.edges[slot] {
                if self.removed[side.node] || self.removed[u.node] {
                    return Err(BubbleError::invariant(format!(
                        "edge {} -> {} touches a removed node",
                        self.side_name(side),
                        self.side_name(u)
                    )));
                }
                if !self.edges[u.rev().slot()].contains(&side.rev()) {
                    return Err(BubbleError::invariant(format!(
                        "edge {} -> {} has no dual",
                        self.side_name(side),
                        self.side_name(u)
                    )));
                }
            }
        }
        Ok(())
    }

    /// Write the graph to a DOT file for visualization
    pub fn write_dot<P: AsRef<std::path::Path>>(&self, path: P) -> std::io::Result<()> {

        fn escape_dot(s: &str) -> String {
            s.replace('\\', "\\\\").replace('"', "\\\"")
        }

        fn degree_color(degree: usize) -> &'static str {
            match degree {
                0 => "gray",
                1 => "black",
                2 => "blue",
                3..=5 => "orange",
                _ => "red",
            }
        }

        let file = File::create(path)?;
        let mut w = BufWriter::new(file);

        writeln!(w, "digraph AssemblyGraph {{")?;
        writeln!(w, "  rankdir=LR;")?;
        writeln!(w, "  node [shape=box fontname=\"Helvetica\"];")?;
        writeln!(w)?;

        for side in self.sides() {
            writeln!(
                w,
                "  \"{}\" [style=filled fillcolor={} ];",
                escape_dot(&self.side_name(side)), degree_color(self.out_edges(side).len())
            )?;
        }

        writeln!(w)?;

        for side in self.sides() {
            let from = escape_dot(&self.side_name(side));
            for &u in self.out_edges(side) {
                writeln!(w, "  \"{}\" -> \"{}\";", from, escape_dot(&self.side_name(u)))?;
            }
        }

        writeln!(w, "}}")?;
        Ok(())
    }
}

impl Default for AssemblyGraph {
    fn default() -> Self {
        Self::new()
    }
}

fn slot_side(slot: usize) -> NodeSide {
    if slot % 2 == 0 {
        NodeSide::forward(slot / 2)
    } else {
        NodeSide::reverse(slot / 2)
    }
}

/// S <name> <sequence> [tags]. A '*' sequence takes its length from an LN:i tag when present.
fn parse_segment(fields: &[&str], line_nr: usize) -> Result<NodeRecord> {
    if fields.len() < 3 {
        return Err(BubbleError::malformed(line_nr, format!("S record needs 3 fields, found {}", fields.len())));
    }
    let sequence = fields[2];
    let mut length = sequence.len();
    if sequence == "*" {
        if let Some(tag) = fields[3..].iter().find_map(|f| f.strip_prefix("LN:i:")) {
            length = tag.parse::<usize>()
                .map_err(|_| BubbleError::malformed(line_nr, format!("invalid LN tag '{}'", tag)))?;
        }
    }
    Ok(NodeRecord { name: fields[1].to_string(), length })
}

/// L <from> <from_orient> <to> <to_orient> <overlap> [tags]
fn parse_link(fields: &[&str], line_nr: usize) -> Result<EdgeRecord> {
    if fields.len() < 6 {
        return Err(BubbleError::malformed(line_nr, format!("L record needs 6 fields, found {}", fields.len())));
    }
    let orientation = |field: &str| {
        Orientation::from_gfa(field)
            .ok_or_else(|| BubbleError::malformed(line_nr, format!("invalid orientation '{}'", field)))
    };
    let from_orientation = orientation(fields[2])?;
    let to_orientation = orientation(fields[4])?;
    if !is_valid_overlap(fields[5]) {
        return Err(BubbleError::malformed(line_nr, format!("invalid overlap '{}'", fields[5])));
    }
    Ok(EdgeRecord {
        from: fields[1].to_string(),
        from_orientation,
        to: fields[3].to_string(),
        to_orientation,
    })
}

/// An overlap is '*' or a CIGAR string such as "0M" or "12M1I3M"
fn is_valid_overlap(overlap: &str) -> bool {
    overlap == "*"
        || (!overlap.is_empty()
            && overlap.split_inclusive(|c: char| !c.is_ascii_digit()).all(|op| {
                let mut chars = op.chars();
                matches!(chars.next_back(), Some(c) if "MIDNSHPX=".contains(c)) && !chars.as_str().is_empty()
            }))
}
