use serde::{Deserialize, Serialize};

use super::domain::{Candidate, FacultyId, SectionMap};
use super::quality::GroupQuality;
use super::selection::SelectionPath;

pub const PENALTY_SOURCE: &str = "member_overlap";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupStatus {
    Excellent,
    Redundant,
}

impl GroupStatus {
    pub fn label(&self) -> &'static str {
        match self {
            GroupStatus::Excellent => "excellent",
            GroupStatus::Redundant => "redundant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionMeta {
    pub path: SelectionPath,
    pub reason: String,
    /// Position of this team within the final selection.
    pub rank: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupMatchMeta {
    pub algo: String,
    pub penalty_source: String,
    pub lambda_grid: Vec<f64>,
    pub quality: GroupQuality,
    pub selection: SelectionMeta,
    pub search_budget: usize,
}

/// Externally visible outcome for one selected team and opportunity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupMatchResult {
    /// Candidate position in the ranked list of the run.
    pub group_id: usize,
    pub grant_id: String,
    pub team: Vec<FacultyId>,
    pub lambda: f64,
    pub k: usize,
    pub top_n: usize,
    pub objective: f64,
    pub redundancy: f64,
    pub status: GroupStatus,
    pub alpha: SectionMap<f64>,
    pub meta: GroupMatchMeta,
}

/// Run-wide values shared by every result row.
pub struct ResultContext<'a> {
    pub grant_id: &'a str,
    pub top_n: usize,
    pub lambda_grid: &'a [f64],
    pub search_budget: usize,
    pub alpha: &'a SectionMap<f64>,
    pub path: SelectionPath,
    pub reason: &'a str,
}

impl GroupMatchResult {
    pub fn from_candidate(
        context: &ResultContext<'_>,
        group_id: usize,
        rank: usize,
        candidate: &Candidate,
        quality: GroupQuality,
        status: GroupStatus,
    ) -> Self {
        Self {
            group_id,
            grant_id: context.grant_id.to_string(),
            team: candidate.team.clone(),
            lambda: candidate.lambda,
            k: candidate.k,
            top_n: context.top_n,
            objective: candidate.objective,
            redundancy: candidate.redundancy,
            status,
            alpha: context.alpha.clone(),
            meta: GroupMatchMeta {
                algo: format!("coverage_overlap_{}", candidate.strategy.label()),
                penalty_source: PENALTY_SOURCE.to_string(),
                lambda_grid: context.lambda_grid.to_vec(),
                quality,
                selection: SelectionMeta {
                    path: context.path,
                    reason: context.reason.to_string(),
                    rank,
                },
                search_budget: context.search_budget,
            },
        }
    }
}
