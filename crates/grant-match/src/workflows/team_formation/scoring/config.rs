use serde::{Deserialize, Serialize};

use crate::workflows::team_formation::domain::SectionMap;

/// Constants shaping the objective and the reported quality metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Per-section multiplier applied to the coverage score.
    pub alpha: SectionMap<f64>,
    /// A member counts toward overlap when its coverage reaches this share of the team's.
    pub overlap_ratio: f64,
    /// Minimum team coverage for a requirement to count toward breadth.
    pub breadth_threshold: f64,
    /// Share of a section's requirements, by weight rank, treated as critical.
    pub critical_share: f64,
    /// Highest redundancy a team may carry and still be reported as excellent.
    pub redundancy_ceiling: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            alpha: SectionMap::new(1.0, 1.0),
            overlap_ratio: 0.5,
            breadth_threshold: 0.5,
            critical_share: 0.25,
            redundancy_ceiling: 1.5,
        }
    }
}
