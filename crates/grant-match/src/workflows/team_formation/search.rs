use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::domain::{Candidate, FacultyId, SearchStrategy};
use super::error::ConfigurationError;
use super::scoring::{ObjectiveScorer, TeamScore};

/// Improvements smaller than this are treated as ties so float noise cannot reorder teams.
const IMPROVEMENT_EPSILON: f64 = 1e-12;

/// Parameters of one candidate search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchPlan {
    pub team_size: usize,
    pub lambda_grid: Vec<f64>,
    pub top_n: usize,
    /// Maximum team evaluations per lambda grid point.
    pub search_budget: usize,
    pub swap_rounds: usize,
    /// Faculty that must be part of every team, in the order they should be listed.
    #[serde(default)]
    pub required: Vec<FacultyId>,
}

impl SearchPlan {
    pub fn validate(&self, pool: &[FacultyId]) -> Result<(), ConfigurationError> {
        if self.lambda_grid.is_empty() {
            return Err(ConfigurationError::EmptyLambdaGrid);
        }
        for (position, lambda) in self.lambda_grid.iter().enumerate() {
            let ordered = position == 0 || self.lambda_grid[position - 1] <= *lambda;
            if !lambda.is_finite() || !ordered {
                return Err(ConfigurationError::LambdaGridOutOfOrder { position });
            }
        }
        if self.team_size == 0 {
            return Err(ConfigurationError::NonPositiveTeamSize);
        }
        if self.top_n == 0 {
            return Err(ConfigurationError::ZeroTopN);
        }
        if self.search_budget == 0 {
            return Err(ConfigurationError::ZeroSearchBudget);
        }

        let required = self.required_members();
        if let Some(missing) = required.iter().find(|member| !pool.contains(member)) {
            return Err(ConfigurationError::UnknownRequiredFaculty(*missing));
        }
        if required.len() > self.team_size {
            return Err(ConfigurationError::TooManyRequired {
                required: required.len(),
                team_size: self.team_size,
            });
        }

        Ok(())
    }

    /// Team size actually searched: a pool smaller than `team_size` yields whole-pool teams.
    pub fn effective_team_size(&self, pool: usize) -> usize {
        self.team_size.min(pool)
    }

    /// Required faculty with duplicates removed, first occurrence wins.
    pub fn required_members(&self) -> Vec<FacultyId> {
        let mut members = Vec::with_capacity(self.required.len());
        for member in &self.required {
            if !members.contains(member) {
                members.push(*member);
            }
        }
        members
    }
}

/// Searches the faculty pool for the best team at every lambda grid point.
pub struct CandidateGenerator<'a> {
    scorer: ObjectiveScorer<'a>,
}

impl<'a> CandidateGenerator<'a> {
    pub fn new(scorer: ObjectiveScorer<'a>) -> Self {
        Self { scorer }
    }

    /// One candidate per lambda, sorted by objective (ties keep grid order) and
    /// truncated to `top_n`.
    pub fn generate(&self, plan: &SearchPlan) -> Result<Vec<Candidate>, ConfigurationError> {
        let pool = self.scorer.coverage().faculty_ids();
        plan.validate(&pool)?;

        let required = plan.required_members();
        let free: Vec<FacultyId> = pool
            .iter()
            .copied()
            .filter(|member| !required.contains(member))
            .collect();
        let team_size = plan.effective_team_size(pool.len());
        if team_size < plan.team_size {
            debug!(
                requested = plan.team_size,
                pool = pool.len(),
                "faculty pool smaller than team size; capping"
            );
        }
        let slots = team_size - required.len();
        let strategy = if team_count_within(free.len(), slots, plan.search_budget) {
            SearchStrategy::Exhaustive
        } else {
            SearchStrategy::GreedySwap
        };

        let space = SearchSpace {
            required: &required,
            free: &free,
            team_size,
            budget: plan.search_budget,
            swap_rounds: plan.swap_rounds,
        };

        let mut candidates: Vec<Candidate> = plan
            .lambda_grid
            .par_iter()
            .map(|&lambda| {
                let (team, evaluations) = match strategy {
                    SearchStrategy::Exhaustive => self.exhaustive(&space, lambda),
                    SearchStrategy::GreedySwap => self.greedy_swap(&space, lambda),
                };
                let team = order_team(team, &required);
                let score = self.scorer.score(&team, lambda);
                debug!(
                    lambda,
                    strategy = strategy.label(),
                    evaluations,
                    objective = score.objective,
                    redundancy = score.redundancy,
                    "lambda grid point searched"
                );
                self.candidate(team, lambda, score, strategy, evaluations)
            })
            .collect();

        candidates.sort_by(|left, right| right.objective.total_cmp(&left.objective));
        candidates.truncate(plan.top_n);
        Ok(candidates)
    }

    fn candidate(
        &self,
        team: Vec<FacultyId>,
        lambda: f64,
        score: TeamScore,
        strategy: SearchStrategy,
        evaluations: usize,
    ) -> Candidate {
        Candidate {
            k: team.len(),
            member_coverages: self.scorer.member_coverages(&team),
            team,
            lambda,
            team_coverage: score.team_coverage,
            coverage_score: score.coverage_score,
            objective: score.objective,
            redundancy: score.redundancy,
            strategy,
            evaluations,
        }
    }

    fn exhaustive(&self, space: &SearchSpace<'_>, lambda: f64) -> (Vec<FacultyId>, usize) {
        let slots = space.team_size - space.required.len();
        let mut best: Option<(Vec<FacultyId>, f64)> = None;
        let mut evaluations = 0usize;

        for picked in Combinations::new(space.free.len(), slots) {
            let mut team = space.required.to_vec();
            team.extend(picked.iter().map(|position| space.free[*position]));
            let objective = self.scorer.score(&team, lambda).objective;
            evaluations += 1;

            let improves = match &best {
                Some((_, incumbent)) => objective > incumbent + IMPROVEMENT_EPSILON,
                None => true,
            };
            if improves {
                best = Some((team, objective));
            }
        }

        let team = best
            .map(|(team, _)| team)
            .unwrap_or_else(|| space.required.to_vec());
        (team, evaluations)
    }

    /// Greedy construction from the required members (or the best single member),
    /// followed by best-improvement single swaps. The construction always completes;
    /// the budget only bounds the swap rounds.
    fn greedy_swap(&self, space: &SearchSpace<'_>, lambda: f64) -> (Vec<FacultyId>, usize) {
        let mut team = space.required.to_vec();
        let mut evaluations = 0usize;

        while team.len() < space.team_size {
            let mut best: Option<(FacultyId, f64)> = None;
            for member in space.free.iter().filter(|member| !team.contains(member)) {
                let mut trial = team.clone();
                trial.push(*member);
                let objective = self.scorer.score(&trial, lambda).objective;
                evaluations += 1;

                let improves = match best {
                    Some((_, incumbent)) => objective > incumbent + IMPROVEMENT_EPSILON,
                    None => true,
                };
                if improves {
                    best = Some((*member, objective));
                }
            }

            match best {
                Some((member, _)) => team.push(member),
                None => break,
            }
        }

        let mut current = self.scorer.score(&team, lambda).objective;
        evaluations += 1;
        let locked = space.required.len();

        for _ in 0..space.swap_rounds {
            if evaluations >= space.budget {
                break;
            }

            let mut best_swap: Option<(usize, FacultyId, f64)> = None;
            'positions: for position in locked..team.len() {
                for member in space.free.iter().filter(|member| !team.contains(member)) {
                    if evaluations >= space.budget {
                        break 'positions;
                    }
                    let mut trial = team.clone();
                    trial[position] = *member;
                    let objective = self.scorer.score(&trial, lambda).objective;
                    evaluations += 1;

                    let threshold = best_swap.map(|(_, _, value)| value).unwrap_or(current);
                    if objective > threshold + IMPROVEMENT_EPSILON {
                        best_swap = Some((position, *member, objective));
                    }
                }
            }

            match best_swap {
                Some((position, member, objective)) => {
                    team[position] = member;
                    current = objective;
                }
                None => break,
            }
        }

        (team, evaluations)
    }
}

struct SearchSpace<'s> {
    required: &'s [FacultyId],
    free: &'s [FacultyId],
    team_size: usize,
    budget: usize,
    swap_rounds: usize,
}

/// Required members first in their given order, the rest ascending.
fn order_team(team: Vec<FacultyId>, required: &[FacultyId]) -> Vec<FacultyId> {
    let mut rest: Vec<FacultyId> = team
        .into_iter()
        .filter(|member| !required.contains(member))
        .collect();
    rest.sort();

    let mut ordered = required.to_vec();
    ordered.extend(rest);
    ordered
}

/// Whether `C(n, r)` is at most `cap`, without overflowing on large pools.
fn team_count_within(n: usize, r: usize, cap: usize) -> bool {
    if r > n {
        return true;
    }
    let r = r.min(n - r);
    let cap = cap as u128;
    let mut count: u128 = 1;
    for step in 0..r {
        count = count * (n - step) as u128 / (step + 1) as u128;
        if count > cap {
            return false;
        }
    }
    count <= cap
}

/// Lexicographic `r`-combinations of `0..n`.
struct Combinations {
    n: usize,
    indices: Vec<usize>,
    started: bool,
    done: bool,
}

impl Combinations {
    fn new(n: usize, r: usize) -> Self {
        Self {
            n,
            indices: (0..r).collect(),
            started: false,
            done: r > n,
        }
    }
}

impl Iterator for Combinations {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if !self.started {
            self.started = true;
            return Some(self.indices.clone());
        }

        let r = self.indices.len();
        let mut slot = r;
        while slot > 0 {
            slot -= 1;
            if self.indices[slot] < self.n - r + slot {
                self.indices[slot] += 1;
                for next in slot + 1..r {
                    self.indices[next] = self.indices[next - 1] + 1;
                }
                return Some(self.indices.clone());
            }
        }

        self.done = true;
        None
    }
}
