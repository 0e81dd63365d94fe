use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::policy::validate_indices;
use super::{Proposal, SelectionContext, SelectionProvider};
use crate::workflows::team_formation::domain::{FacultyId, SectionMap, TeamCoverage};

/// One candidate as presented to the advisory judge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvisoryCandidate {
    pub idx: usize,
    pub team: Vec<FacultyId>,
    pub score: f64,
    pub final_coverage: TeamCoverage,
    pub member_coverages: BTreeMap<FacultyId, TeamCoverage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvisoryRequest {
    pub opportunity_id: String,
    pub desired_team_count: usize,
    pub candidates: Vec<AdvisoryCandidate>,
    pub requirement_weights: SectionMap<BTreeMap<usize, f64>>,
}

/// Judge response. `selected_candidates` is accepted for compatibility and never read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdvisoryResponse {
    #[serde(default)]
    pub selected_indices: Vec<i64>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_candidates: Option<Vec<Value>>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AdvisoryError {
    #[error("advisory judge unavailable: {0}")]
    Unavailable(String),
    #[error("advisory judge timed out after {0:?}")]
    Timeout(Duration),
    #[error("advisory response rejected: {0}")]
    InvalidResponse(String),
}

/// External semantic judgment over the ranked candidates.
#[async_trait]
pub trait TeamJudge: Send + Sync {
    async fn evaluate(&self, request: &AdvisoryRequest) -> Result<AdvisoryResponse, AdvisoryError>;
}

/// Selection provider that consults a [`TeamJudge`] under a deadline.
pub struct AdvisoryProvider<J> {
    judge: Arc<J>,
    timeout: Duration,
}

impl<J> AdvisoryProvider<J>
where
    J: TeamJudge + 'static,
{
    pub fn new(judge: Arc<J>, timeout: Duration) -> Self {
        Self { judge, timeout }
    }
}

#[async_trait]
impl<J> SelectionProvider for AdvisoryProvider<J>
where
    J: TeamJudge + 'static,
{
    fn name(&self) -> &'static str {
        "advisory"
    }

    async fn propose(&self, context: &SelectionContext<'_>) -> Result<Proposal, AdvisoryError> {
        let request = context.advisory_request();
        let response = tokio::time::timeout(self.timeout, self.judge.evaluate(&request))
            .await
            .map_err(|_| AdvisoryError::Timeout(self.timeout))??;

        let indices = validate_indices(
            &response.selected_indices,
            context.desired_team_count(),
            context.candidates().len(),
        )?;
        let reason = response
            .reason
            .map(|reason| reason.trim().to_string())
            .filter(|reason| !reason.is_empty())
            .unwrap_or_else(|| "selected by advisory judge".to_string());

        Ok(Proposal { indices, reason })
    }
}
