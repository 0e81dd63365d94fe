use serde_json::Value;

use super::domain::MatchRow;

/// Read-only access to the upstream rows the engine consumes for one opportunity.
pub trait MatchSource: Send + Sync {
    /// Raw keyword payload of the opportunity, `None` when the opportunity is unknown.
    fn opportunity_keywords(&self, opportunity_id: &str) -> Result<Option<Value>, SourceError>;

    /// Per-faculty match rows, at most `limit` of them.
    fn match_rows(&self, opportunity_id: &str, limit: usize) -> Result<Vec<MatchRow>, SourceError>;
}

/// Error enumeration for source failures.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("match source unavailable: {0}")]
    Unavailable(String),
}
