use serde_json::{Map, Value};
use tracing::debug;

use super::domain::{numeric_value, Requirement, RequirementSet, Section};

const DEFAULT_WEIGHT: f64 = 1.0;

/// Turns an opportunity keyword payload into indexed, weighted requirement tables.
///
/// Expected shape per section: `{"domain": [..], "specialization": [{"t": .., "w": ..}]}`.
/// The index of a requirement is its position in the specialization list, so skipped
/// items leave gaps and indices stay aligned with the upstream match rows.
pub struct RequirementExtractor;

impl RequirementExtractor {
    pub fn extract(payload: &Value) -> RequirementSet {
        let mut set = RequirementSet::default();

        let Some(root) = payload.as_object() else {
            if !payload.is_null() {
                debug!("keyword payload is not an object; no requirements extracted");
            }
            return set;
        };

        for section in Section::ALL {
            let Some(block) = root.get(section.label()).and_then(Value::as_object) else {
                continue;
            };

            if let Some(domains) = block.get("domain") {
                set.set_domains(section, domain_labels(domains));
            }

            let Some(items) = block.get("specialization").and_then(Value::as_array) else {
                continue;
            };

            let mut skipped = 0usize;
            for (index, item) in items.iter().enumerate() {
                match item.as_object() {
                    Some(item) => set.insert(requirement_from(section, index, item)),
                    None => skipped += 1,
                }
            }

            if skipped > 0 {
                debug!(%section, skipped, "skipped non-mapping specialization items");
            }
        }

        set
    }
}

fn requirement_from(section: Section, index: usize, item: &Map<String, Value>) -> Requirement {
    let text = match item.get("t") {
        Some(Value::String(text)) => text.trim().to_string(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    };
    let weight = item
        .get("w")
        .and_then(numeric_value)
        .filter(|weight| weight.is_finite())
        .unwrap_or(DEFAULT_WEIGHT);

    Requirement {
        section,
        index,
        weight,
        text,
    }
}

fn domain_labels(value: &Value) -> Vec<String> {
    match value {
        Value::String(label) => vec![label.trim().to_string()],
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .map(|label| label.trim().to_string())
            .filter(|label| !label.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}
