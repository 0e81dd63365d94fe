use super::domain::FacultyId;
use super::source::SourceError;

/// Failure of a team formation request.
///
/// Advisory failures never appear here; the selector recovers them and records the
/// reason on the selection.
#[derive(Debug, thiserror::Error)]
pub enum TeamFormationError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("malformed input: {0}")]
    MalformedInput(String),
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error("candidate search aborted: {0}")]
    SearchAborted(String),
}

/// Caller contract violations, reported before any search runs.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("lambda grid must contain at least one value")]
    EmptyLambdaGrid,
    #[error("lambda grid must be finite and non-decreasing (offending position {position})")]
    LambdaGridOutOfOrder { position: usize },
    #[error("team size must be positive")]
    NonPositiveTeamSize,
    #[error("top_n must be positive")]
    ZeroTopN,
    #[error("desired team count must be positive")]
    ZeroDesiredTeamCount,
    #[error("desired team count {desired} exceeds top_n {top_n}")]
    DesiredExceedsTopN { desired: usize, top_n: usize },
    #[error("search budget must be positive")]
    ZeroSearchBudget,
    #[error("required faculty {0} has no coverage rows for this opportunity")]
    UnknownRequiredFaculty(FacultyId),
    #[error("{required} required faculty do not fit a team of {team_size}")]
    TooManyRequired { required: usize, team_size: usize },
}
