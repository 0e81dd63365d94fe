use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::response::Response;
use serde_json::{json, Value};

use crate::config::MatchingConfig;
use crate::workflows::team_formation::domain::{
    Candidate, CoverageMatrix, FacultyId, MatchRow, RequirementSet, SearchStrategy, Section,
    SectionMap, TeamCoverage,
};
use crate::workflows::team_formation::selection::{
    AdvisoryError, AdvisoryRequest, AdvisoryResponse, TeamJudge, TeamSelector,
};
use crate::workflows::team_formation::source::{MatchSource, SourceError};
use crate::workflows::team_formation::{parse_match_rows, CoverageAggregator, TeamFormationService};

pub(super) const LAB_OPPORTUNITY: &str = "opp-lab";

pub(super) fn fid(raw: i64) -> FacultyId {
    FacultyId(raw)
}

pub(super) fn team(raw: &[i64]) -> Vec<FacultyId> {
    raw.iter().copied().map(FacultyId).collect()
}

/// Same `{idx: value}` table for both sections.
pub(super) fn mirrored(values: &[(usize, f64)]) -> TeamCoverage {
    let table: BTreeMap<usize, f64> = values.iter().copied().collect();
    SectionMap::new(table.clone(), table)
}

pub(super) fn mirrored_requirements(weights: &[(usize, f64)]) -> RequirementSet {
    let table: BTreeMap<usize, f64> = weights.iter().copied().collect();
    RequirementSet::from_weights(&SectionMap::new(table.clone(), table))
}

pub(super) fn candidate(members: &[i64], objective: f64, coverage: TeamCoverage) -> Candidate {
    Candidate {
        team: team(members),
        k: members.len(),
        lambda: 0.0,
        team_coverage: coverage,
        member_coverages: BTreeMap::new(),
        coverage_score: objective,
        objective,
        redundancy: 0.0,
        strategy: SearchStrategy::Exhaustive,
        evaluations: 1,
    }
}

/// Keyword payload for the lab opportunity: three application requirements and one
/// research requirement, all weighted 1.0.
pub(super) fn lab_keywords() -> Value {
    json!({
        "application": {
            "domain": ["Materials"],
            "specialization": [
                {"t": "thin films", "w": 1.0},
                {"t": "spectroscopy", "w": 1.0},
                {"t": "device fabrication", "w": 1.0}
            ]
        },
        "research": {
            "domain": "Physics",
            "specialization": [
                {"t": "quantum transport", "w": 1.0}
            ]
        }
    })
}

/// Faculty 1 and 2 are near duplicates; faculty 3 complements either of them.
pub(super) fn lab_rows() -> Vec<MatchRow> {
    parse_match_rows(vec![
        json!({"faculty_id": 1, "covered": {"application": {"0": 0.9, "1": 0.8}, "research": {"0": 0.2}}}),
        json!({"faculty_id": 2, "covered": {"application": {"0": 0.85, "1": 0.75}}}),
        json!({"faculty_id": 3, "covered": {"application": {"2": 0.9}, "research": {"0": 0.8}}}),
        json!({"faculty_id": 4, "covered": {"application": {"0": 0.3}, "research": {"0": 0.3}}}),
        json!({"faculty_id": 5, "covered": {"application": {"1": 0.4, "2": 0.3}}}),
    ])
}

pub(super) fn lab_requirements() -> RequirementSet {
    crate::workflows::team_formation::RequirementExtractor::extract(&lab_keywords())
}

pub(super) fn lab_matrix() -> CoverageMatrix {
    CoverageAggregator::aggregate(&lab_rows()).expect("lab rows aggregate")
}

pub(super) fn matching_config() -> MatchingConfig {
    MatchingConfig {
        team_size: 2,
        top_n: 5,
        desired_team_count: 1,
        lambda_grid: vec![0.0, 0.5, 1.0, 2.0, 4.0],
        search_budget: 2000,
        swap_rounds: 4,
        row_limit: 100,
        advisory_timeout: Duration::from_millis(200),
        scoring: Default::default(),
    }
}

pub(super) fn lab_source() -> MemorySource {
    let source = MemorySource::default();
    source.insert(LAB_OPPORTUNITY, lab_keywords(), lab_rows());
    source
}

pub(super) fn build_service(
    selector: TeamSelector,
) -> (TeamFormationService<MemorySource>, Arc<MemorySource>) {
    let source = Arc::new(lab_source());
    let service = TeamFormationService::new(source.clone(), Arc::new(selector), matching_config());
    (service, source)
}

pub(super) fn coverage_of(matrix: &CoverageMatrix, member: i64, section: Section, index: usize) -> f64 {
    matrix.coverage(fid(member), section, index)
}

#[derive(Default)]
pub(super) struct MemorySource {
    keywords: Mutex<HashMap<String, Value>>,
    rows: Mutex<HashMap<String, Vec<MatchRow>>>,
    limits: Mutex<Vec<usize>>,
}

impl MemorySource {
    pub(super) fn insert(&self, opportunity_id: &str, keywords: Value, rows: Vec<MatchRow>) {
        self.keywords
            .lock()
            .expect("keyword mutex poisoned")
            .insert(opportunity_id.to_string(), keywords);
        self.rows
            .lock()
            .expect("row mutex poisoned")
            .insert(opportunity_id.to_string(), rows);
    }

    pub(super) fn requested_limits(&self) -> Vec<usize> {
        self.limits.lock().expect("limit mutex poisoned").clone()
    }
}

impl MatchSource for MemorySource {
    fn opportunity_keywords(&self, opportunity_id: &str) -> Result<Option<Value>, SourceError> {
        Ok(self
            .keywords
            .lock()
            .expect("keyword mutex poisoned")
            .get(opportunity_id)
            .cloned())
    }

    fn match_rows(&self, opportunity_id: &str, limit: usize) -> Result<Vec<MatchRow>, SourceError> {
        self.limits.lock().expect("limit mutex poisoned").push(limit);
        Ok(self
            .rows
            .lock()
            .expect("row mutex poisoned")
            .get(opportunity_id)
            .map(|rows| rows.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }
}

pub(super) struct UnavailableSource;

impl MatchSource for UnavailableSource {
    fn opportunity_keywords(&self, _opportunity_id: &str) -> Result<Option<Value>, SourceError> {
        Err(SourceError::Unavailable("database offline".to_string()))
    }

    fn match_rows(&self, _opportunity_id: &str, _limit: usize) -> Result<Vec<MatchRow>, SourceError> {
        Err(SourceError::Unavailable("database offline".to_string()))
    }
}

/// Judge that always answers with the same response and records what it was asked.
pub(super) struct FixedJudge {
    response: AdvisoryResponse,
    requests: Mutex<Vec<AdvisoryRequest>>,
}

impl FixedJudge {
    pub(super) fn selecting(indices: &[i64], reason: &str) -> Self {
        Self {
            response: AdvisoryResponse {
                selected_indices: indices.to_vec(),
                reason: Some(reason.to_string()),
                selected_candidates: None,
            },
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(super) fn requests(&self) -> Vec<AdvisoryRequest> {
        self.requests.lock().expect("request mutex poisoned").clone()
    }
}

#[async_trait]
impl TeamJudge for FixedJudge {
    async fn evaluate(&self, request: &AdvisoryRequest) -> Result<AdvisoryResponse, AdvisoryError> {
        self.requests
            .lock()
            .expect("request mutex poisoned")
            .push(request.clone());
        Ok(self.response.clone())
    }
}

pub(super) struct FailingJudge;

#[async_trait]
impl TeamJudge for FailingJudge {
    async fn evaluate(&self, _request: &AdvisoryRequest) -> Result<AdvisoryResponse, AdvisoryError> {
        Err(AdvisoryError::Unavailable("model endpoint refused".to_string()))
    }
}

pub(super) struct SlowJudge {
    pub(super) delay: Duration,
}

#[async_trait]
impl TeamJudge for SlowJudge {
    async fn evaluate(&self, _request: &AdvisoryRequest) -> Result<AdvisoryResponse, AdvisoryError> {
        tokio::time::sleep(self.delay).await;
        Ok(AdvisoryResponse {
            selected_indices: vec![0],
            reason: Some("too late".to_string()),
            selected_candidates: None,
        })
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body: Body = response.into_body();
    let bytes = to_bytes(body, usize::MAX).await.expect("body readable");
    serde_json::from_slice(&bytes).expect("valid json")
}

pub(super) fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}
