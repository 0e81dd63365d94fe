use serde_json::Value;
use tracing::{debug, warn};

use super::domain::{numeric_value, CoverageMatrix, MatchRow, Section};
use super::error::TeamFormationError;

/// Merges raw match rows into a coverage matrix using the max rule.
pub struct CoverageAggregator;

impl CoverageAggregator {
    /// Fails with `NotFound` when there is nothing to aggregate, since a team cannot be
    /// formed from an empty pool.
    pub fn aggregate(rows: &[MatchRow]) -> Result<CoverageMatrix, TeamFormationError> {
        if rows.is_empty() {
            return Err(TeamFormationError::NotFound(
                "no coverage rows to aggregate".to_string(),
            ));
        }

        let mut matrix = CoverageMatrix::default();
        let mut dropped = 0usize;

        for row in rows {
            matrix.register(row.faculty_id);

            for section in Section::ALL {
                let Some(pairs) = row.covered.get(section.label()).and_then(Value::as_object)
                else {
                    continue;
                };

                for (raw_index, raw_value) in pairs {
                    match (parse_index(raw_index), numeric_value(raw_value)) {
                        (Some(index), Some(value)) if value.is_finite() => {
                            matrix.observe(row.faculty_id, section, index, value)
                        }
                        _ => dropped += 1,
                    }
                }
            }
        }

        if dropped > 0 {
            debug!(dropped, "dropped unparseable coverage pairs");
        }

        Ok(matrix)
    }
}

/// Converts loosely typed JSON rows, dropping rows that cannot be attributed to a
/// faculty member.
pub fn parse_match_rows(values: Vec<Value>) -> Vec<MatchRow> {
    let total = values.len();
    let rows: Vec<MatchRow> = values
        .into_iter()
        .filter_map(|value| serde_json::from_value::<MatchRow>(value).ok())
        .collect();

    if rows.len() < total {
        warn!(
            dropped = total - rows.len(),
            "dropped match rows without an integer faculty_id"
        );
    }

    rows
}

fn parse_index(raw: &str) -> Option<usize> {
    raw.trim().parse::<usize>().ok()
}
