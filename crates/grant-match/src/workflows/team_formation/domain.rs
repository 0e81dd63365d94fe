use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Keyword taxonomy section a requirement belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Application,
    Research,
}

impl Section {
    pub const ALL: [Section; 2] = [Section::Application, Section::Research];

    pub fn label(&self) -> &'static str {
        match self {
            Section::Application => "application",
            Section::Research => "research",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Identifier of a faculty member as assigned by the storage collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FacultyId(pub i64);

impl fmt::Display for FacultyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Pair of values keyed by section, serialized as `{"application": .., "research": ..}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SectionMap<T> {
    #[serde(default)]
    pub application: T,
    #[serde(default)]
    pub research: T,
}

impl<T> SectionMap<T> {
    pub fn new(application: T, research: T) -> Self {
        Self {
            application,
            research,
        }
    }

    pub fn get(&self, section: Section) -> &T {
        match section {
            Section::Application => &self.application,
            Section::Research => &self.research,
        }
    }

    pub fn get_mut(&mut self, section: Section) -> &mut T {
        match section {
            Section::Application => &mut self.application,
            Section::Research => &mut self.research,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Section, &T)> {
        Section::ALL
            .into_iter()
            .map(move |section| (section, self.get(section)))
    }

    pub fn map<U>(&self, mut f: impl FnMut(Section, &T) -> U) -> SectionMap<U> {
        SectionMap {
            application: f(Section::Application, &self.application),
            research: f(Section::Research, &self.research),
        }
    }
}

/// Coverage values for one section keyed by requirement index.
pub type SectionCoverage = BTreeMap<usize, f64>;

/// Per-section coverage, used both for single members and for whole teams.
pub type TeamCoverage = SectionMap<SectionCoverage>;

/// One weighted capability need extracted from an opportunity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Requirement {
    pub section: Section,
    pub index: usize,
    pub weight: f64,
    pub text: String,
}

/// Indexed requirement tables for both sections of an opportunity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequirementSet {
    requirements: SectionMap<BTreeMap<usize, Requirement>>,
    #[serde(default)]
    domains: SectionMap<Vec<String>>,
}

impl RequirementSet {
    /// Builds a set from bare weights; requirement text is left empty.
    pub fn from_weights(weights: &SectionMap<BTreeMap<usize, f64>>) -> Self {
        let mut set = Self::default();
        for (section, table) in weights.iter() {
            for (&index, &weight) in table {
                set.insert(Requirement {
                    section,
                    index,
                    weight,
                    text: String::new(),
                });
            }
        }
        set
    }

    /// Inserts or replaces the requirement stored under `(section, index)`.
    pub fn insert(&mut self, requirement: Requirement) {
        let mut requirement = requirement;
        requirement.weight = sanitize_weight(requirement.weight);
        self.requirements
            .get_mut(requirement.section)
            .insert(requirement.index, requirement);
    }

    pub fn get(&self, section: Section, index: usize) -> Option<&Requirement> {
        self.requirements.get(section).get(&index)
    }

    /// Weight of a requirement; unknown indices weigh nothing.
    pub fn weight(&self, section: Section, index: usize) -> f64 {
        self.get(section, index)
            .map(|requirement| requirement.weight)
            .unwrap_or(0.0)
    }

    pub fn section(&self, section: Section) -> impl Iterator<Item = &Requirement> {
        self.requirements.get(section).values()
    }

    pub fn indices(&self, section: Section) -> impl Iterator<Item = usize> + '_ {
        self.requirements.get(section).keys().copied()
    }

    pub fn section_len(&self, section: Section) -> usize {
        self.requirements.get(section).len()
    }

    pub fn len(&self) -> usize {
        Section::ALL
            .iter()
            .map(|section| self.section_len(*section))
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn section_weight(&self, section: Section) -> f64 {
        self.section(section)
            .map(|requirement| requirement.weight)
            .sum()
    }

    pub fn total_weight(&self) -> f64 {
        Section::ALL
            .iter()
            .map(|section| self.section_weight(*section))
            .sum()
    }

    /// Weight tables in the shape the advisory contract expects.
    pub fn weights(&self) -> SectionMap<BTreeMap<usize, f64>> {
        self.requirements.map(|_, table| {
            table
                .iter()
                .map(|(index, requirement)| (*index, requirement.weight))
                .collect()
        })
    }

    pub fn domains(&self, section: Section) -> &[String] {
        self.domains.get(section)
    }

    pub(crate) fn set_domains(&mut self, section: Section, domains: Vec<String>) {
        *self.domains.get_mut(section) = domains;
    }
}

/// Raw per-faculty match row as delivered by the storage collaborator.
///
/// `covered` stays untyped until aggregation so that a single malformed value only
/// costs that value, never the row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRow {
    pub faculty_id: FacultyId,
    #[serde(default)]
    pub covered: Value,
}

/// Merged coverage observations: faculty -> section -> requirement index -> value.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CoverageMatrix {
    entries: BTreeMap<FacultyId, TeamCoverage>,
}

impl CoverageMatrix {
    /// Adds a faculty member to the pool without recording any coverage.
    pub fn register(&mut self, faculty_id: FacultyId) {
        self.entries.entry(faculty_id).or_default();
    }

    /// Records one observation using the max-merge rule. Non-finite values are ignored
    /// and finite values are clamped into `[0, 1]`.
    pub fn observe(&mut self, faculty_id: FacultyId, section: Section, index: usize, value: f64) {
        if !value.is_finite() {
            return;
        }
        let value = value.clamp(0.0, 1.0);
        let slot = self
            .entries
            .entry(faculty_id)
            .or_default()
            .get_mut(section)
            .entry(index)
            .or_insert(value);
        if value > *slot {
            *slot = value;
        }
    }

    /// Observed value, `None` when this faculty never covered the requirement.
    pub fn entry(&self, faculty_id: FacultyId, section: Section, index: usize) -> Option<f64> {
        self.entries
            .get(&faculty_id)
            .and_then(|member| member.get(section).get(&index))
            .copied()
    }

    /// Coverage with absence read as zero.
    pub fn coverage(&self, faculty_id: FacultyId, section: Section, index: usize) -> f64 {
        self.entry(faculty_id, section, index).unwrap_or(0.0)
    }

    pub fn member(&self, faculty_id: FacultyId) -> Option<&TeamCoverage> {
        self.entries.get(&faculty_id)
    }

    pub fn contains(&self, faculty_id: FacultyId) -> bool {
        self.entries.contains_key(&faculty_id)
    }

    /// Faculty pool in ascending id order.
    pub fn faculty_ids(&self) -> Vec<FacultyId> {
        self.entries.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FacultyId, &TeamCoverage)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// How the team behind a candidate was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStrategy {
    Exhaustive,
    GreedySwap,
}

impl SearchStrategy {
    pub fn label(&self) -> &'static str {
        match self {
            SearchStrategy::Exhaustive => "exhaustive",
            SearchStrategy::GreedySwap => "greedy_swap",
        }
    }
}

/// Fully scored team proposed at one lambda trade-off point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub team: Vec<FacultyId>,
    pub k: usize,
    pub lambda: f64,
    pub team_coverage: TeamCoverage,
    pub member_coverages: BTreeMap<FacultyId, TeamCoverage>,
    pub coverage_score: f64,
    pub objective: f64,
    pub redundancy: f64,
    pub strategy: SearchStrategy,
    pub evaluations: usize,
}

pub(crate) fn sanitize_weight(weight: f64) -> f64 {
    if weight.is_finite() {
        weight.max(0.0)
    } else {
        0.0
    }
}

/// Reads a JSON number or numeric string.
pub(crate) fn numeric_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(raw) => raw.trim().parse::<f64>().ok(),
        _ => None,
    }
}
