use crate::workflows::team_formation::domain::{
    CoverageMatrix, FacultyId, RequirementSet, TeamCoverage,
};

/// Weight-normalized excess coverage contributed beyond the best member on requirements
/// that two or more members cover well.
///
/// A member "covers well" when its coverage reaches `overlap_ratio` of the team's
/// coverage for that requirement. Requirements nobody covers carry no overlap.
pub(crate) fn overlap_redundancy(
    team: &[FacultyId],
    team_coverage: &TeamCoverage,
    requirements: &RequirementSet,
    coverage: &CoverageMatrix,
    overlap_ratio: f64,
) -> f64 {
    let total_weight = requirements.total_weight();
    if total_weight <= 0.0 || team.len() < 2 {
        return 0.0;
    }

    let mut excess = 0.0;
    for (section, covered) in team_coverage.iter() {
        for requirement in requirements.section(section) {
            let best = covered.get(&requirement.index).copied().unwrap_or(0.0);
            if best <= 0.0 || requirement.weight <= 0.0 {
                continue;
            }

            let floor = overlap_ratio * best;
            let mut contributors = 0usize;
            let mut contributed = 0.0;
            for member in team {
                let value = coverage.coverage(*member, section, requirement.index);
                if value > 0.0 && value >= floor {
                    contributors += 1;
                    contributed += value;
                }
            }

            if contributors >= 2 {
                excess += requirement.weight * (contributed - best).max(0.0);
            }
        }
    }

    excess / total_weight
}
