use serde::{Deserialize, Serialize};

use super::{FieldKind, FieldSpec, non_negative, positive, rate_from_percent};
use crate::core::{
    CalcError, CalcResult, ContributionGoal, GoalSolveConfig, Unlimited, periodic_rate_from_annual,
    periods_to_reach, require, solve_required_contribution,
};

pub const DEFAULT_COVERAGE_MONTHS: u32 = 6;
pub const MAX_COVERAGE_MONTHS: u32 = 24;
/// Search horizon for the months-to-goal count.
pub const MAX_MONTHS_TO_GOAL: u32 = 600;

pub const FIELDS: &[FieldSpec] = &[
    FieldSpec::required("monthlyExpenses", "Essential monthly expenses", FieldKind::Dollars),
    FieldSpec::optional("coverageMonths", "Months of coverage", FieldKind::Months),
    FieldSpec::optional("currentSavings", "Current emergency savings", FieldKind::Dollars),
    FieldSpec::optional("monthlySavings", "Monthly savings", FieldKind::Dollars),
    FieldSpec::optional("annualRate", "Savings account rate", FieldKind::Percent),
    FieldSpec::optional("targetMonths", "Reach the goal within (months)", FieldKind::Months),
];

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EmergencyFundInputs {
    pub monthly_expenses: Option<f64>,
    pub coverage_months: Option<u32>,
    pub current_savings: Option<f64>,
    pub monthly_savings: Option<f64>,
    pub annual_rate: Option<f64>,
    pub target_months: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeadlinePlan {
    pub months: u32,
    pub required_monthly_savings: Option<f64>,
    pub feasible: bool,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyFundResult {
    pub target_amount: f64,
    pub current_coverage_months: f64,
    pub shortfall: f64,
    /// `None` when the goal is out of reach within the search horizon.
    pub months_to_goal: Option<u32>,
    pub deadline: Option<DeadlinePlan>,
}

pub fn calculate(inputs: &EmergencyFundInputs) -> CalcResult<EmergencyFundResult> {
    let expenses = positive(
        require(inputs.monthly_expenses, "monthlyExpenses")?,
        "monthlyExpenses",
    )?;
    let coverage_months = inputs.coverage_months.unwrap_or(DEFAULT_COVERAGE_MONTHS);
    if !(1..=MAX_COVERAGE_MONTHS).contains(&coverage_months) {
        return Err(CalcError::domain(format!(
            "coverageMonths must be between 1 and {MAX_COVERAGE_MONTHS}"
        )));
    }
    let savings = non_negative(inputs.current_savings.unwrap_or(0.0), "currentSavings")?;
    let monthly_savings = non_negative(inputs.monthly_savings.unwrap_or(0.0), "monthlySavings")?;
    let annual_rate = rate_from_percent(inputs.annual_rate.unwrap_or(0.0), "annualRate", 20.0)?;
    let monthly_rate = periodic_rate_from_annual(annual_rate, 12, 12)?;
    if inputs.target_months == Some(0) || inputs.target_months > Some(MAX_MONTHS_TO_GOAL) {
        return Err(CalcError::domain(format!(
            "targetMonths must be between 1 and {MAX_MONTHS_TO_GOAL}"
        )));
    }

    let target_amount = expenses * coverage_months as f64;
    let months_to_goal = periods_to_reach(
        savings,
        monthly_savings,
        monthly_rate,
        target_amount,
        MAX_MONTHS_TO_GOAL,
    )?;

    let deadline = inputs
        .target_months
        .map(|months| {
            let goal = ContributionGoal {
                starting_balance: savings,
                periodic_rate: monthly_rate,
                periods: months,
                target_balance: target_amount,
            };
            let config = GoalSolveConfig {
                search_max: target_amount,
                ..GoalSolveConfig::default()
            };
            solve_required_contribution(goal, config, &Unlimited).map(|solved| DeadlinePlan {
                months,
                required_monthly_savings: solved.solved_value,
                feasible: solved.feasible,
                message: solved.message,
            })
        })
        .transpose()?;

    Ok(EmergencyFundResult {
        target_amount,
        current_coverage_months: savings / expenses,
        shortfall: (target_amount - savings).max(0.0),
        months_to_goal,
        deadline,
    })
}
