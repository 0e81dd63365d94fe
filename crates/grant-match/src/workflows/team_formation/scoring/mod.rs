mod config;
mod redundancy;

pub use config::ScoringConfig;

use std::collections::BTreeMap;

use super::domain::{
    CoverageMatrix, FacultyId, RequirementSet, Section, SectionCoverage, TeamCoverage,
};
use redundancy::overlap_redundancy;

/// Scores teams against one opportunity's requirements and coverage matrix.
///
/// Holds only shared references, so one scorer can drive every lambda grid point
/// concurrently.
#[derive(Clone, Copy)]
pub struct ObjectiveScorer<'a> {
    requirements: &'a RequirementSet,
    coverage: &'a CoverageMatrix,
    config: &'a ScoringConfig,
}

/// Components of a scored team.
#[derive(Debug, Clone, PartialEq)]
pub struct TeamScore {
    pub team_coverage: TeamCoverage,
    pub coverage_score: f64,
    pub redundancy: f64,
    pub objective: f64,
}

impl<'a> ObjectiveScorer<'a> {
    pub fn new(
        requirements: &'a RequirementSet,
        coverage: &'a CoverageMatrix,
        config: &'a ScoringConfig,
    ) -> Self {
        Self {
            requirements,
            coverage,
            config,
        }
    }

    pub fn requirements(&self) -> &'a RequirementSet {
        self.requirements
    }

    pub fn coverage(&self) -> &'a CoverageMatrix {
        self.coverage
    }

    pub fn config(&self) -> &'a ScoringConfig {
        self.config
    }

    /// Best member coverage per requirement; requirements nobody covers read 0.
    pub fn team_coverage(&self, team: &[FacultyId]) -> TeamCoverage {
        let mut covered = TeamCoverage::default();
        for section in Section::ALL {
            let table = covered.get_mut(section);
            for index in self.requirements.indices(section) {
                let best = team
                    .iter()
                    .map(|member| self.coverage.coverage(*member, section, index))
                    .fold(0.0_f64, f64::max);
                table.insert(index, best);
            }
        }
        covered
    }

    /// Alpha-weighted sum of requirement weight times team coverage.
    pub fn coverage_score(&self, team_coverage: &TeamCoverage) -> f64 {
        team_coverage
            .iter()
            .map(|(section, table)| {
                let alpha = *self.config.alpha.get(section);
                let weighted: f64 = table
                    .iter()
                    .map(|(index, value)| self.requirements.weight(section, *index) * value)
                    .sum();
                alpha * weighted
            })
            .sum()
    }

    pub fn redundancy(&self, team: &[FacultyId], team_coverage: &TeamCoverage) -> f64 {
        overlap_redundancy(
            team,
            team_coverage,
            self.requirements,
            self.coverage,
            self.config.overlap_ratio,
        )
    }

    /// `objective = coverage_score - lambda * redundancy`.
    pub fn score(&self, team: &[FacultyId], lambda: f64) -> TeamScore {
        let team_coverage = self.team_coverage(team);
        let coverage_score = self.coverage_score(&team_coverage);
        let redundancy = self.redundancy(team, &team_coverage);

        TeamScore {
            team_coverage,
            coverage_score,
            redundancy,
            objective: coverage_score - lambda * redundancy,
        }
    }

    /// Each member's own coverage restricted to the opportunity's requirements.
    pub fn member_coverages(&self, team: &[FacultyId]) -> BTreeMap<FacultyId, TeamCoverage> {
        team.iter()
            .map(|member| {
                let own = TeamCoverage::new(
                    self.member_section(*member, Section::Application),
                    self.member_section(*member, Section::Research),
                );
                (*member, own)
            })
            .collect()
    }

    fn member_section(&self, member: FacultyId, section: Section) -> SectionCoverage {
        self.requirements
            .indices(section)
            .filter_map(|index| {
                self.coverage
                    .entry(member, section, index)
                    .map(|value| (index, value))
            })
            .collect()
    }
}
