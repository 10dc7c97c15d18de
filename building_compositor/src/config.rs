// Compositor configuration.
//
// `CompositorConfig` holds the knobs that change composition without
// changing the model: whether grime is resolved at all, which user layers
// count as painted walls for suppression and as grime sources, whether
// exterior trim is restricted to the ground floor, and when per-cell work
// may fan out over rayon. Loaded from JSON; every field has a default, so a
// partial (or empty) JSON object is valid and unknown fields are ignored.
//
// Parallelism never changes output: per-cell results are collected in cell
// order before they are written back.
//
// See also: `compositor.rs` and `grime.rs`, the only readers.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositorConfig {
    /// Resolve wall and floor grime (phase 16).
    pub grime: bool,
    /// Allow rayon for per-cell phases.
    pub parallel: bool,
    /// Smallest grid (in cells) worth splitting across threads.
    pub parallel_min_cells: usize,
    /// User layers whose painted walls suppress automatic walls.
    pub suppress_layers: Vec<String>,
    /// User layer overriding the grime source of each wall slot, in slot
    /// order.
    pub grime_layers: [String; 4],
    /// Draw the building's exterior trim on the ground floor only.
    pub exterior_trim_ground_only: bool,
}

impl Default for CompositorConfig {
    fn default() -> Self {
        Self {
            grime: true,
            parallel: true,
            parallel_min_cells: 4096,
            suppress_layers: vec!["Wall".to_string(), "Wall2".to_string()],
            grime_layers: [
                "Wall".to_string(),
                "Wall2".to_string(),
                "Wall3".to_string(),
                "Wall4".to_string(),
            ],
            exterior_trim_ground_only: true,
        }
    }
}

impl CompositorConfig {
    /// Single-threaded configuration, for callers that already parallelize
    /// across buildings.
    pub fn sequential() -> Self {
        Self {
            parallel: false,
            ..Self::default()
        }
    }

    /// Whether a grid of `cells` cells should use rayon.
    pub fn use_parallel(&self, cells: usize) -> bool {
        self.parallel && cells >= self.parallel_min_cells
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
