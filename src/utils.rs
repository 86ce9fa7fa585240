//! General types used across the project

use std::fmt;

/// Strand of a node-side. Forward corresponds to "+" in GFA, Reverse to "-".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Orientation {
    Forward,
    Reverse,
}

impl Orientation {
    /// Parse a GFA orientation field ("+" or "-")
    pub fn from_gfa(field: &str) -> Option<Self> {
        match field {
            "+" => Some(Orientation::Forward),
            "-" => Some(Orientation::Reverse),
            _ => None,
        }
    }

    pub fn flip(self) -> Self {
        match self {
            Orientation::Forward => Orientation::Reverse,
            Orientation::Reverse => Orientation::Forward,
        }
    }

    /// Prefix used when printing a node-side: '>' forward, '<' reverse
    pub fn arrow(self) -> char {
        match self {
            Orientation::Forward => '>',
            Orientation::Reverse => '<',
        }
    }
}

/// A node together with a polarity. Each node in the assembly graph has two
/// sides and every edge connects two sides. The node is an index into the
/// graph's node table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeSide {
    pub node: usize,
    pub orientation: Orientation,
}

impl NodeSide {
    pub fn new(node: usize, orientation: Orientation) -> Self {
        Self { node, orientation }
    }

    pub fn forward(node: usize) -> Self {
        Self::new(node, Orientation::Forward)
    }

    pub fn reverse(node: usize) -> Self {
        Self::new(node, Orientation::Reverse)
    }

    /// The reverse-complement side of the same node.
    pub fn rev(self) -> Self {
        Self::new(self.node, self.orientation.flip())
    }

    /// Dense index into per-side tables: 2 * node + (0 forward, 1 reverse)
    pub fn slot(self) -> usize {
        match self.orientation {
            Orientation::Forward => self.node * 2,
            Orientation::Reverse => self.node * 2 + 1,
        }
    }

    /// Print the side with the node name instead of its index, e.g. ">utg12"
    pub fn display_with<'a>(&self, name: &'a str) -> SideName<'a> {
        SideName { orientation: self.orientation, name }
    }
}

impl fmt::Display for NodeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.orientation.arrow(), self.node)
    }
}

/// Named rendering of a node-side for diagnostics
pub struct SideName<'a> {
    orientation: Orientation,
    name: &'a str,
}

impl fmt::Display for SideName<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.orientation.arrow(), self.name)
    }
}

/// Max-ratio similarity of two coverage values, >= 1 with 1 meaning equal.
/// A zero on either side yields infinity so the pair sorts last.
pub fn coverage_ratio(a: f64, b: f64) -> f64 {
    if a <= 0.0 || b <= 0.0 {
        if a == b {
            return 1.0;
        }
        return f64::INFINITY;
    }
    (a / b).max(b / a)
}
