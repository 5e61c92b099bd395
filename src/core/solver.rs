use serde::Serialize;

use super::error::{CalcError, CalcResult};
use super::projection::{ContributionRoom, project_growth};

#[derive(Debug, Clone, Copy)]
pub struct ContributionGoal {
    pub starting_balance: f64,
    pub periodic_rate: f64,
    pub periods: u32,
    pub target_balance: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct GoalSolveConfig {
    pub search_min: f64,
    pub search_max: f64,
    pub tolerance: f64,
    pub max_iterations: u32,
}

impl Default for GoalSolveConfig {
    fn default() -> Self {
        Self {
            search_min: 0.0,
            search_max: 1_000_000.0,
            tolerance: 0.01,
            max_iterations: 80,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalSolveIteration {
    pub iteration: u32,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub candidate_value: f64,
    pub final_balance: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalSolveResult {
    pub solved_value: Option<f64>,
    pub achieved_balance: Option<f64>,
    pub iterations: Vec<GoalSolveIteration>,
    pub converged: bool,
    pub feasible: bool,
    pub message: String,
}

/// Smallest periodic contribution whose projection reaches the target balance.
pub fn solve_required_contribution(
    goal: ContributionGoal,
    config: GoalSolveConfig,
    room: &dyn ContributionRoom,
) -> CalcResult<GoalSolveResult> {
    validate_config(goal, config)?;

    let mut iterations = Vec::with_capacity(config.max_iterations as usize);
    let low_balance = evaluate_candidate(goal, config.search_min, room)?;
    let high_balance = evaluate_candidate(goal, config.search_max, room)?;

    let mut solved_value = None;
    let mut converged = false;
    let feasible;
    let message;

    if low_balance + 1e-9 >= goal.target_balance {
        solved_value = Some(config.search_min);
        converged = true;
        feasible = true;
        message = "Already meets target at lower contribution bound.".to_string();
    } else if high_balance + 1e-9 < goal.target_balance {
        feasible = false;
        message = "No feasible contribution found within the search bounds.".to_string();
    } else {
        let mut lo = config.search_min;
        let mut hi = config.search_max;
        let mut it = 0;
        while it < config.max_iterations {
            it += 1;
            let mid = (lo + hi) * 0.5;
            let final_balance = evaluate_candidate(goal, mid, room)?;
            iterations.push(GoalSolveIteration {
                iteration: it,
                lower_bound: lo,
                upper_bound: hi,
                candidate_value: mid,
                final_balance,
            });

            if final_balance + 1e-9 >= goal.target_balance {
                hi = mid;
            } else {
                lo = mid;
            }

            if (hi - lo).abs() <= config.tolerance {
                converged = true;
                break;
            }
        }
        solved_value = Some(hi);
        feasible = true;
        message = if converged {
            "Solved required contribution.".to_string()
        } else {
            "Reached max iterations before tolerance was met; returning best estimate."
                .to_string()
        };
    }

    let achieved_balance = match solved_value {
        Some(value) => Some(evaluate_candidate(goal, value, room)?),
        None => None,
    };

    Ok(GoalSolveResult {
        solved_value,
        achieved_balance,
        iterations,
        converged,
        feasible,
        message,
    })
}

fn evaluate_candidate(
    goal: ContributionGoal,
    contribution: f64,
    room: &dyn ContributionRoom,
) -> CalcResult<f64> {
    project_growth(
        goal.starting_balance,
        contribution.max(0.0),
        goal.periodic_rate,
        goal.periods,
        room,
    )
    .map(|projection| projection.final_balance)
}

fn validate_config(goal: ContributionGoal, config: GoalSolveConfig) -> CalcResult<()> {
    if goal.periods == 0 {
        return Err(CalcError::domain("goal horizon must be at least one period"));
    }
    if !goal.target_balance.is_finite() || goal.target_balance <= 0.0 {
        return Err(CalcError::domain("target balance must be > 0"));
    }
    if !config.search_min.is_finite() || !config.search_max.is_finite() {
        return Err(CalcError::domain("search bounds must be finite"));
    }
    if config.search_min < 0.0 {
        return Err(CalcError::domain("search_min must be >= 0"));
    }
    if config.search_max <= config.search_min {
        return Err(CalcError::domain("search_max must be greater than search_min"));
    }
    if !config.tolerance.is_finite() || config.tolerance <= 0.0 {
        return Err(CalcError::domain("tolerance must be > 0"));
    }
    if config.max_iterations == 0 {
        return Err(CalcError::domain("max_iterations must be > 0"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::projection::{LifetimeCap, Unlimited};

    fn assert_close(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected}, got {actual}, tolerance {tol}"
        );
    }

    fn zero_growth_goal() -> ContributionGoal {
        ContributionGoal {
            starting_balance: 0.0,
            periodic_rate: 0.0,
            periods: 10,
            target_balance: 1_000.0,
        }
    }

    #[test]
    fn required_contribution_solver_finds_deterministic_solution() {
        let config = GoalSolveConfig {
            search_min: 0.0,
            search_max: 500.0,
            tolerance: 0.01,
            max_iterations: 40,
        };
        let result = solve_required_contribution(zero_growth_goal(), config, &Unlimited)
            .expect("must solve");
        assert!(result.feasible);
        assert!(result.converged);
        assert_close(result.solved_value.expect("value expected"), 100.0, 0.02);
        assert!(result.achieved_balance.expect("balance expected") >= 1_000.0 - 1e-6);
    }

    #[test]
    fn solver_accounts_for_growth() {
        let goal = ContributionGoal {
            starting_balance: 0.0,
            periodic_rate: 0.10,
            periods: 2,
            target_balance: 231.0,
        };
        // (c * 1.1 + c) * 1.1 = 2.31c
        let result =
            solve_required_contribution(goal, GoalSolveConfig::default(), &Unlimited).expect("ok");
        assert_close(result.solved_value.expect("value"), 100.0, 0.02);
    }

    #[test]
    fn already_met_target_returns_lower_bound() {
        let mut goal = zero_growth_goal();
        goal.starting_balance = 2_000.0;
        let result =
            solve_required_contribution(goal, GoalSolveConfig::default(), &Unlimited).expect("ok");
        assert_eq!(result.solved_value, Some(0.0));
        assert!(result.iterations.is_empty());
    }

    #[test]
    fn room_cap_makes_goal_infeasible() {
        let result = solve_required_contribution(
            zero_growth_goal(),
            GoalSolveConfig::default(),
            &LifetimeCap(500.0),
        )
        .expect("must return result");
        assert!(!result.feasible);
        assert!(result.solved_value.is_none());
    }

    #[test]
    fn rejects_bad_config() {
        let config = GoalSolveConfig {
            search_min: 10.0,
            search_max: 5.0,
            ..GoalSolveConfig::default()
        };
        assert!(solve_required_contribution(zero_growth_goal(), config, &Unlimited).is_err());
    }
}
