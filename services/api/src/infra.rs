use metrics_exporter_prometheus::PrometheusHandle;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use grant_match::error::AppError;
use grant_match::workflows::team_formation::{
    parse_match_rows, MatchRow, MatchSource, SourceError, TeamFormationError,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Match data document: `{"opportunities": {"<id>": {"keywords": {..}, "matches": [..]}}}`.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct MatchDocument {
    #[serde(default)]
    pub(crate) opportunities: HashMap<String, OpportunityRecord>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct OpportunityRecord {
    #[serde(default)]
    pub(crate) keywords: Value,
    #[serde(default)]
    pub(crate) matches: Vec<Value>,
}

/// Match store built once from a document and read-only afterwards.
#[derive(Debug, Default, Clone)]
pub(crate) struct InMemoryMatchSource {
    opportunities: HashMap<String, (Value, Vec<MatchRow>)>,
}

impl InMemoryMatchSource {
    pub(crate) fn from_document(document: MatchDocument) -> Self {
        let mut source = Self::default();
        for (id, record) in document.opportunities {
            source.insert(id, record);
        }
        source
    }

    pub(crate) fn load(path: &Path) -> Result<Self, AppError> {
        let raw = std::fs::read_to_string(path)?;
        let document: MatchDocument = serde_json::from_str(&raw).map_err(|err| {
            TeamFormationError::MalformedInput(format!(
                "{} is not a match document: {err}",
                path.display()
            ))
        })?;
        Ok(Self::from_document(document))
    }

    /// Replaces any record already stored under `opportunity_id`.
    pub(crate) fn insert(&mut self, opportunity_id: String, record: OpportunityRecord) {
        let rows = parse_match_rows(record.matches);
        self.opportunities.insert(opportunity_id, (record.keywords, rows));
    }

    /// Opportunity ids in ascending order.
    pub(crate) fn opportunity_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.opportunities.keys().cloned().collect();
        ids.sort();
        ids
    }
}

impl MatchSource for InMemoryMatchSource {
    fn opportunity_keywords(&self, opportunity_id: &str) -> Result<Option<Value>, SourceError> {
        Ok(self
            .opportunities
            .get(opportunity_id)
            .map(|(keywords, _)| keywords.clone())
            .filter(|keywords| !keywords.is_null()))
    }

    fn match_rows(&self, opportunity_id: &str, limit: usize) -> Result<Vec<MatchRow>, SourceError> {
        Ok(self
            .opportunities
            .get(opportunity_id)
            .map(|(_, rows)| rows.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }
}
