use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use crate::workflows::team_formation::{ScoringConfig, SectionMap};

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub matching: MatchingConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            matching: MatchingConfig::from_env()?,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Engine defaults applied when a request does not override them.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchingConfig {
    pub team_size: usize,
    pub top_n: usize,
    pub desired_team_count: usize,
    pub lambda_grid: Vec<f64>,
    pub search_budget: usize,
    pub swap_rounds: usize,
    /// Upper bound on match rows read per opportunity.
    pub row_limit: usize,
    /// Deadline applied to the judge of services built with `TeamFormationService::with_judge`.
    pub advisory_timeout: Duration,
    pub scoring: ScoringConfig,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            team_size: 3,
            top_n: 10,
            desired_team_count: 1,
            lambda_grid: vec![0.0, 0.5, 1.0, 2.0, 4.0],
            search_budget: 2000,
            swap_rounds: 4,
            row_limit: 500,
            advisory_timeout: Duration::from_millis(15_000),
            scoring: ScoringConfig::default(),
        }
    }
}

impl MatchingConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let lambda_grid = match env::var("MATCH_LAMBDA_GRID") {
            Ok(raw) => parse_lambda_grid(&raw)?,
            Err(_) => defaults.lambda_grid,
        };
        let timeout_ms = env_or(
            "MATCH_ADVISORY_TIMEOUT_MS",
            defaults.advisory_timeout.as_millis() as u64,
        )?;
        let alpha = SectionMap::new(
            env_or("MATCH_ALPHA_APPLICATION", defaults.scoring.alpha.application)?,
            env_or("MATCH_ALPHA_RESEARCH", defaults.scoring.alpha.research)?,
        );

        Ok(Self {
            team_size: env_or("MATCH_TEAM_SIZE", defaults.team_size)?,
            top_n: env_or("MATCH_TOP_N", defaults.top_n)?,
            desired_team_count: env_or("MATCH_DESIRED_TEAM_COUNT", defaults.desired_team_count)?,
            lambda_grid,
            search_budget: env_or("MATCH_SEARCH_BUDGET", defaults.search_budget)?,
            swap_rounds: env_or("MATCH_SWAP_ROUNDS", defaults.swap_rounds)?,
            row_limit: env_or("MATCH_ROW_LIMIT", defaults.row_limit)?,
            advisory_timeout: Duration::from_millis(timeout_ms),
            scoring: ScoringConfig {
                alpha,
                ..defaults.scoring
            },
        })
    }
}

fn env_or<T: FromStr>(variable: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(variable) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidValue {
                variable,
                value: raw,
            }),
        Err(_) => Ok(default),
    }
}

fn parse_lambda_grid(raw: &str) -> Result<Vec<f64>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(|token| {
            token
                .parse::<f64>()
                .ok()
                .filter(|value| value.is_finite())
                .ok_or_else(|| ConfigError::InvalidLambdaGrid {
                    value: raw.to_string(),
                })
        })
        .collect()
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidValue { variable: &'static str, value: String },
    InvalidLambdaGrid { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidValue { variable, value } => {
                write!(f, "{variable} has an unparseable value '{value}'")
            }
            ConfigError::InvalidLambdaGrid { value } => write!(
                f,
                "MATCH_LAMBDA_GRID must be a comma separated list of finite numbers, got '{value}'"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidValue { .. }
            | ConfigError::InvalidLambdaGrid { .. } => None,
        }
    }
}
