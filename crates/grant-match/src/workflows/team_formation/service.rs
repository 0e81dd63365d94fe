use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::coverage::CoverageAggregator;
use super::domain::{Candidate, CoverageMatrix, FacultyId, RequirementSet};
use super::error::{ConfigurationError, TeamFormationError};
use super::quality::QualityMetricsCalculator;
use super::requirements::RequirementExtractor;
use super::result::{GroupMatchResult, GroupStatus, ResultContext};
use super::scoring::ObjectiveScorer;
use super::search::{CandidateGenerator, SearchPlan};
use super::selection::{SelectionContext, TeamJudge, TeamSelection, TeamSelector};
use super::source::MatchSource;
use crate::config::MatchingConfig;

/// Per-request overrides of the configured engine defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TeamFormationOptions {
    pub team_size: Option<usize>,
    pub top_n: Option<usize>,
    pub desired_team_count: Option<usize>,
    pub lambda_grid: Option<Vec<f64>>,
    pub search_budget: Option<usize>,
    pub swap_rounds: Option<usize>,
    pub row_limit: Option<usize>,
    pub required_faculty: Vec<FacultyId>,
}

/// Everything one run produced, in the shape the HTTP and CLI adapters emit.
#[derive(Debug, Clone, Serialize)]
pub struct TeamFormationOutcome {
    pub opportunity_id: String,
    pub computed_at: DateTime<Utc>,
    pub candidates: Vec<Candidate>,
    pub selection: TeamSelection,
    pub results: Vec<GroupMatchResult>,
}

/// Service composing requirement extraction, coverage aggregation, candidate search and
/// team selection for one opportunity at a time.
pub struct TeamFormationService<S> {
    source: Arc<S>,
    selector: Arc<TeamSelector>,
    config: MatchingConfig,
}

impl<S> TeamFormationService<S>
where
    S: MatchSource + 'static,
{
    pub fn new(source: Arc<S>, selector: Arc<TeamSelector>, config: MatchingConfig) -> Self {
        Self {
            source,
            selector,
            config,
        }
    }

    /// Service whose selection consults `judge` first, cut off after the configured
    /// advisory timeout.
    pub fn with_judge<J>(source: Arc<S>, judge: Arc<J>, config: MatchingConfig) -> Self
    where
        J: TeamJudge + 'static,
    {
        let selector = TeamSelector::with_advisory(judge, config.advisory_timeout);
        Self::new(source, Arc::new(selector), config)
    }

    pub fn config(&self) -> &MatchingConfig {
        &self.config
    }

    /// Search parameters after applying request overrides.
    pub fn plan(&self, options: &TeamFormationOptions) -> SearchPlan {
        SearchPlan {
            team_size: options.team_size.unwrap_or(self.config.team_size),
            lambda_grid: options
                .lambda_grid
                .clone()
                .unwrap_or_else(|| self.config.lambda_grid.clone()),
            top_n: options.top_n.unwrap_or(self.config.top_n),
            search_budget: options.search_budget.unwrap_or(self.config.search_budget),
            swap_rounds: options.swap_rounds.unwrap_or(self.config.swap_rounds),
            required: options.required_faculty.clone(),
        }
    }

    pub async fn form_teams(
        &self,
        opportunity_id: &str,
        options: &TeamFormationOptions,
    ) -> Result<TeamFormationOutcome, TeamFormationError> {
        let plan = self.plan(options);
        let desired = options
            .desired_team_count
            .unwrap_or(self.config.desired_team_count);
        check_counts(desired, plan.top_n)?;

        let keywords = self
            .source
            .opportunity_keywords(opportunity_id)?
            .ok_or_else(|| {
                TeamFormationError::NotFound(format!(
                    "opportunity {opportunity_id} has no keyword payload"
                ))
            })?;
        let requirements = RequirementExtractor::extract(&keywords);

        let row_limit = options.row_limit.unwrap_or(self.config.row_limit);
        let mut rows = self.source.match_rows(opportunity_id, row_limit)?;
        rows.truncate(row_limit);
        let coverage = CoverageAggregator::aggregate(&rows).map_err(|error| match error {
            TeamFormationError::NotFound(_) => TeamFormationError::NotFound(format!(
                "no match rows for opportunity {opportunity_id}"
            )),
            other => other,
        })?;

        let (requirements, coverage, candidates) =
            search(requirements, coverage, &plan, &self.config).await?;
        let scoring = &self.config.scoring;

        let context = SelectionContext::new(opportunity_id, desired, &candidates, &requirements);
        let selection = self.selector.select(&context).await;

        let calculator = QualityMetricsCalculator::new(&requirements, scoring);
        let result_context = ResultContext {
            grant_id: opportunity_id,
            top_n: plan.top_n,
            lambda_grid: &plan.lambda_grid,
            search_budget: plan.search_budget,
            alpha: &scoring.alpha,
            path: selection.path(),
            reason: selection.reason(),
        };
        let results: Vec<GroupMatchResult> = selection
            .indices()
            .iter()
            .enumerate()
            .map(|(rank, &index)| {
                let candidate = &candidates[index];
                let status = if calculator.is_excellent(candidate.redundancy) {
                    GroupStatus::Excellent
                } else {
                    GroupStatus::Redundant
                };
                GroupMatchResult::from_candidate(
                    &result_context,
                    index,
                    rank,
                    candidate,
                    calculator.measure(&candidate.team_coverage),
                    status,
                )
            })
            .collect();

        info!(
            opportunity_id,
            requirements = requirements.len(),
            pool = coverage.len(),
            candidates = candidates.len(),
            selected = results.len(),
            path = selection.path().label(),
            "team formation completed"
        );

        Ok(TeamFormationOutcome {
            opportunity_id: opportunity_id.to_string(),
            computed_at: Utc::now(),
            candidates,
            selection,
            results,
        })
    }
}

/// Runs the candidate search on the blocking pool so the rayon fan-out never stalls an
/// async worker. Inputs are handed back for the selection and reporting steps.
async fn search(
    requirements: RequirementSet,
    coverage: CoverageMatrix,
    plan: &SearchPlan,
    config: &MatchingConfig,
) -> Result<(RequirementSet, CoverageMatrix, Vec<Candidate>), TeamFormationError> {
    let plan = plan.clone();
    let scoring = config.scoring.clone();

    let searched = tokio::task::spawn_blocking(move || {
        let scorer = ObjectiveScorer::new(&requirements, &coverage, &scoring);
        let candidates = CandidateGenerator::new(scorer).generate(&plan);
        (requirements, coverage, candidates)
    })
    .await
    .map_err(|error| TeamFormationError::SearchAborted(error.to_string()))?;

    let (requirements, coverage, candidates) = searched;
    Ok((requirements, coverage, candidates?))
}

fn check_counts(desired: usize, top_n: usize) -> Result<(), ConfigurationError> {
    if top_n == 0 {
        return Err(ConfigurationError::ZeroTopN);
    }
    if desired == 0 {
        return Err(ConfigurationError::ZeroDesiredTeamCount);
    }
    if desired > top_n {
        return Err(ConfigurationError::DesiredExceedsTopN { desired, top_n });
    }
    Ok(())
}
