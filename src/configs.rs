/// Tunable constants of the simplification
#[derive(Debug, Clone, Copy)]
pub struct SimplificationParams {
    /// Largest bubble (in visited node-sides) that may be popped
    pub max_pop_size: usize,
    /// Only nodes at least this long contribute to the average coverage
    pub long_node_length: usize,
    /// Two chains merge when their coverages are within this factor
    pub merge_ratio: f64,
    /// A chain is unique when its coverage is within [low, high] times the average
    pub unique_low: f64,
    pub unique_high: f64,
}

impl Default for SimplificationParams {
    fn default() -> Self {
        Self {
            max_pop_size: 10,
            long_node_length: 100_000,
            merge_ratio: 1.5,
            unique_low: 0.5,
            unique_high: 1.5,
        }
    }
}

pub struct PopBubblesConfig {
    pub input_gfa: Option<String>,
    pub node_coverage: String,
    pub output_gfa: Option<String>,
    pub removed_out: Option<String>,
    pub report_bin: Option<String>,
    pub params: SimplificationParams,
}

pub struct ChainsConfig {
    pub input_gfa: Option<String>,
    pub node_coverage: String,
    pub output_tsv: Option<String>,
    pub params: SimplificationParams,
}

pub struct StatsConfig {
    pub input_gfa: Option<String>,
    pub dot: Option<String>,
}
