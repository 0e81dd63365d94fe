use crate::infra::InMemoryMatchSource;
use clap::Args;
use grant_match::config::{AppConfig, MatchingConfig};
use grant_match::error::AppError;
use grant_match::telemetry;
use grant_match::workflows::team_formation::{
    FacultyId, TeamFormationOptions, TeamFormationOutcome, TeamFormationService, TeamSelector,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Args, Debug, Default)]
pub(crate) struct MatchArgs {
    /// Match document with opportunity keywords and faculty match rows
    #[arg(long)]
    pub(crate) input: PathBuf,
    /// Only form teams for this opportunity (defaults to every opportunity in the document)
    #[arg(long)]
    pub(crate) opportunity: Option<String>,
    /// Members per team
    #[arg(long)]
    pub(crate) team_size: Option<usize>,
    /// Number of ranked candidates to keep
    #[arg(long)]
    pub(crate) top_n: Option<usize>,
    /// Number of teams to select
    #[arg(long)]
    pub(crate) desired: Option<usize>,
    /// Comma separated, non-decreasing redundancy penalty weights
    #[arg(long, value_delimiter = ',')]
    pub(crate) lambda_grid: Option<Vec<f64>>,
    /// Maximum team evaluations per lambda
    #[arg(long)]
    pub(crate) search_budget: Option<usize>,
    /// Faculty ids that must be on every team
    #[arg(long, value_delimiter = ',')]
    pub(crate) required: Vec<i64>,
}

impl MatchArgs {
    pub(crate) fn options(&self) -> TeamFormationOptions {
        TeamFormationOptions {
            team_size: self.team_size,
            top_n: self.top_n,
            desired_team_count: self.desired,
            lambda_grid: self.lambda_grid.clone(),
            search_budget: self.search_budget,
            required_faculty: self.required.iter().copied().map(FacultyId).collect(),
            ..TeamFormationOptions::default()
        }
    }
}

pub(crate) async fn run_match(args: MatchArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let source = InMemoryMatchSource::load(&args.input)?;
    let opportunities = match &args.opportunity {
        Some(id) => vec![id.clone()],
        None => source.opportunity_ids(),
    };
    info!(
        input = %args.input.display(),
        opportunities = opportunities.len(),
        "forming teams from match document"
    );

    let outcomes = match_document(source, &opportunities, &args.options(), config.matching).await?;
    let rendered = serde_json::to_string_pretty(&outcomes).map_err(std::io::Error::from)?;
    println!("{rendered}");
    Ok(())
}

/// Runs the deterministic selector over each opportunity in turn; the first failure
/// aborts the run.
pub(crate) async fn match_document(
    source: InMemoryMatchSource,
    opportunities: &[String],
    options: &TeamFormationOptions,
    config: MatchingConfig,
) -> Result<Vec<TeamFormationOutcome>, AppError> {
    let service = TeamFormationService::new(
        Arc::new(source),
        Arc::new(TeamSelector::deterministic()),
        config,
    );

    let mut outcomes = Vec::with_capacity(opportunities.len());
    for opportunity_id in opportunities {
        outcomes.push(service.form_teams(opportunity_id, options).await?);
    }
    Ok(outcomes)
}
