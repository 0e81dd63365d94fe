//! Coverage-driven team formation for funding opportunities.
//!
//! A run extracts weighted requirements from the opportunity keywords, merges per-faculty
//! coverage rows, searches a lambda grid for teams that balance coverage against member
//! overlap, and settles the final teams through the selection chain.

pub mod coverage;
pub mod domain;
pub mod error;
pub mod quality;
pub mod requirements;
pub mod result;
pub mod router;
pub mod scoring;
pub mod search;
pub mod selection;
pub mod service;
pub mod source;

#[cfg(test)]
mod tests;

pub use coverage::{parse_match_rows, CoverageAggregator};
pub use domain::{
    Candidate, CoverageMatrix, FacultyId, MatchRow, Requirement, RequirementSet,
    SearchStrategy, Section, SectionCoverage, SectionMap, TeamCoverage,
};
pub use error::{ConfigurationError, TeamFormationError};
pub use quality::{GroupQuality, QualityMetricsCalculator};
pub use requirements::RequirementExtractor;
pub use result::{GroupMatchMeta, GroupMatchResult, GroupStatus, SelectionMeta};
pub use router::team_router;
pub use scoring::{ObjectiveScorer, ScoringConfig, TeamScore};
pub use search::{CandidateGenerator, SearchPlan};
pub use selection::{
    AdvisoryCandidate, AdvisoryError, AdvisoryProvider, AdvisoryRequest, AdvisoryResponse,
    Proposal, SelectionContext, SelectionPath, SelectionProvider, TeamJudge, TeamSelection,
    TeamSelector,
};
pub use service::{TeamFormationOptions, TeamFormationOutcome, TeamFormationService};
pub use source::{MatchSource, SourceError};
