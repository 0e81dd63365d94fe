use serde::{Deserialize, Serialize};

use super::domain::{Requirement, RequirementSet, Section, TeamCoverage};
use super::scoring::ScoringConfig;

/// Reporting metrics for one team, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupQuality {
    pub cov_app: f64,
    pub cov_res: f64,
    pub cov_total: f64,
    pub breadth_app: f64,
    pub breadth_res: f64,
    pub breadth_total: f64,
    pub critical_hit_app: f64,
    pub critical_hit_res: f64,
    pub critical_hit_total: f64,
}

/// Running numerator/denominator pair; an empty tally reads as 0.
#[derive(Debug, Clone, Copy, Default)]
struct Tally {
    covered: f64,
    possible: f64,
}

impl Tally {
    fn add(&mut self, covered: f64, possible: f64) {
        self.covered += covered;
        self.possible += possible;
    }

    fn merge(self, other: Tally) -> Tally {
        Tally {
            covered: self.covered + other.covered,
            possible: self.possible + other.possible,
        }
    }

    fn ratio(self) -> f64 {
        if self.possible > 0.0 {
            (self.covered / self.possible).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct SectionTallies {
    coverage: Tally,
    breadth: Tally,
    critical: Tally,
}

pub struct QualityMetricsCalculator<'a> {
    requirements: &'a RequirementSet,
    config: &'a ScoringConfig,
}

impl<'a> QualityMetricsCalculator<'a> {
    pub fn new(requirements: &'a RequirementSet, config: &'a ScoringConfig) -> Self {
        Self {
            requirements,
            config,
        }
    }

    pub fn measure(&self, team_coverage: &TeamCoverage) -> GroupQuality {
        let app = self.tally(Section::Application, team_coverage);
        let res = self.tally(Section::Research, team_coverage);

        GroupQuality {
            cov_app: app.coverage.ratio(),
            cov_res: res.coverage.ratio(),
            cov_total: app.coverage.merge(res.coverage).ratio(),
            breadth_app: app.breadth.ratio(),
            breadth_res: res.breadth.ratio(),
            breadth_total: app.breadth.merge(res.breadth).ratio(),
            critical_hit_app: app.critical.ratio(),
            critical_hit_res: res.critical.ratio(),
            critical_hit_total: app.critical.merge(res.critical).ratio(),
        }
    }

    /// Whether the team stays within the redundancy ceiling.
    pub fn is_excellent(&self, redundancy: f64) -> bool {
        redundancy <= self.config.redundancy_ceiling
    }

    /// Top-weighted requirements of a section, extended with anything tying the cutoff.
    pub fn critical_requirements(&self, section: Section) -> Vec<&'a Requirement> {
        let mut weighted: Vec<&Requirement> = self
            .requirements
            .section(section)
            .filter(|requirement| requirement.weight > 0.0)
            .collect();
        if weighted.is_empty() {
            return weighted;
        }

        weighted.sort_by(|left, right| right.weight.total_cmp(&left.weight));
        let share = (weighted.len() as f64 * self.config.critical_share).ceil() as usize;
        let cutoff = share.clamp(1, weighted.len());
        let cutoff_weight = weighted[cutoff - 1].weight;

        weighted.retain(|requirement| requirement.weight >= cutoff_weight);
        weighted
    }

    fn tally(&self, section: Section, team_coverage: &TeamCoverage) -> SectionTallies {
        let covered = team_coverage.get(section);
        let value_of = |index: usize| covered.get(&index).copied().unwrap_or(0.0);
        let mut tallies = SectionTallies::default();

        for requirement in self.requirements.section(section) {
            if requirement.weight <= 0.0 {
                continue;
            }
            let value = value_of(requirement.index);
            tallies
                .coverage
                .add(requirement.weight * value, requirement.weight);
            let hit = if value >= self.config.breadth_threshold {
                1.0
            } else {
                0.0
            };
            tallies.breadth.add(hit, 1.0);
        }

        for requirement in self.critical_requirements(section) {
            tallies.critical.add(
                requirement.weight * value_of(requirement.index),
                requirement.weight,
            );
        }

        tallies
    }
}
