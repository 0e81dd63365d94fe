//! Final team choice over the ranked candidates.
//!
//! Selection runs an ordered chain of providers and settles on the first valid proposal.
//! The deterministic baseline always terminates the chain, so a selection is produced
//! even when every advisory provider declines. A [`TeamSelection`] cannot be modified
//! once returned.

mod advisory;
mod policy;

pub use advisory::{
    AdvisoryCandidate, AdvisoryError, AdvisoryProvider, AdvisoryRequest, AdvisoryResponse,
    TeamJudge,
};

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::domain::{Candidate, RequirementSet};
use policy::baseline_indices;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionPath {
    Advised,
    Fallback,
}

impl SelectionPath {
    pub fn label(&self) -> &'static str {
        match self {
            SelectionPath::Advised => "advised",
            SelectionPath::Fallback => "fallback",
        }
    }
}

/// Settled choice of candidates, by position in the ranked candidate list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamSelection {
    indices: Vec<usize>,
    path: SelectionPath,
    reason: String,
    declined: Vec<String>,
}

impl TeamSelection {
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn path(&self) -> SelectionPath {
        self.path
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Why earlier providers in the chain were passed over, in chain order.
    pub fn declined(&self) -> &[String] {
        &self.declined
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Inputs shared by every provider in the chain.
pub struct SelectionContext<'a> {
    opportunity_id: &'a str,
    desired_team_count: usize,
    candidates: &'a [Candidate],
    requirements: &'a RequirementSet,
}

impl<'a> SelectionContext<'a> {
    /// The desired count is capped at the number of candidates available.
    pub fn new(
        opportunity_id: &'a str,
        desired_team_count: usize,
        candidates: &'a [Candidate],
        requirements: &'a RequirementSet,
    ) -> Self {
        Self {
            opportunity_id,
            desired_team_count: desired_team_count.min(candidates.len()),
            candidates,
            requirements,
        }
    }

    pub fn opportunity_id(&self) -> &'a str {
        self.opportunity_id
    }

    pub fn desired_team_count(&self) -> usize {
        self.desired_team_count
    }

    pub fn candidates(&self) -> &'a [Candidate] {
        self.candidates
    }

    pub fn advisory_request(&self) -> AdvisoryRequest {
        let candidates = self
            .candidates
            .iter()
            .enumerate()
            .map(|(idx, candidate)| AdvisoryCandidate {
                idx,
                team: candidate.team.clone(),
                score: candidate.objective,
                final_coverage: candidate.team_coverage.clone(),
                member_coverages: candidate.member_coverages.clone(),
            })
            .collect();

        AdvisoryRequest {
            opportunity_id: self.opportunity_id.to_string(),
            desired_team_count: self.desired_team_count,
            candidates,
            requirement_weights: self.requirements.weights(),
        }
    }
}

/// A provider's pick, already validated against the context.
#[derive(Debug, Clone, PartialEq)]
pub struct Proposal {
    pub indices: Vec<usize>,
    pub reason: String,
}

#[async_trait]
pub trait SelectionProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn propose(&self, context: &SelectionContext<'_>) -> Result<Proposal, AdvisoryError>;
}

#[derive(Clone, Default)]
pub struct TeamSelector {
    providers: Vec<Arc<dyn SelectionProvider>>,
}

impl TeamSelector {
    /// Selector that only applies the deterministic baseline.
    pub fn deterministic() -> Self {
        Self::default()
    }

    pub fn with_advisory<J>(judge: Arc<J>, timeout: Duration) -> Self
    where
        J: TeamJudge + 'static,
    {
        Self::default().with_provider(Arc::new(AdvisoryProvider::new(judge, timeout)))
    }

    /// Appends a provider ahead of the baseline.
    pub fn with_provider(mut self, provider: Arc<dyn SelectionProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    pub fn provider_names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|provider| provider.name()).collect()
    }

    pub async fn select(&self, context: &SelectionContext<'_>) -> TeamSelection {
        if context.desired_team_count() == 0 {
            return TeamSelection {
                indices: Vec::new(),
                path: SelectionPath::Fallback,
                reason: "no candidates to select from".to_string(),
                declined: Vec::new(),
            };
        }

        let mut declined = Vec::new();
        for provider in &self.providers {
            match provider.propose(context).await {
                Ok(proposal) => {
                    debug!(
                        provider = provider.name(),
                        selected = proposal.indices.len(),
                        "selection provider accepted"
                    );
                    return TeamSelection {
                        indices: proposal.indices,
                        path: SelectionPath::Advised,
                        reason: proposal.reason,
                        declined,
                    };
                }
                Err(error) => {
                    warn!(
                        provider = provider.name(),
                        opportunity_id = context.opportunity_id(),
                        %error,
                        "selection provider declined; falling back"
                    );
                    declined.push(format!("{}: {error}", provider.name()));
                }
            }
        }

        let reason = if declined.is_empty() {
            "deterministic top candidates by objective".to_string()
        } else {
            format!(
                "fallback to deterministic top candidates ({})",
                declined.join("; ")
            )
        };

        TeamSelection {
            indices: baseline_indices(context.candidates(), context.desired_team_count()),
            path: SelectionPath::Fallback,
            reason,
            declined,
        }
    }
}
