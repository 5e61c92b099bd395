use serde::{Deserialize, Serialize};

use super::{FieldKind, FieldSpec, non_negative, rate_from_percent};
use crate::core::{
    CalcError, CalcResult, ContributionRoom, GrowthProjection, project_growth, require,
};

pub const FIRST_TFSA_YEAR: i32 = 2009;
pub const ELIGIBILITY_AGE: i32 = 18;
pub const DEFAULT_CURRENT_YEAR: i32 = 2025;
pub const DEFAULT_PROJECTION_YEARS: u32 = 10;
pub const MAX_PROJECTION_YEARS: u32 = 80;
/// Latest accepted `currentYear`.
pub const MAX_CURRENT_YEAR: i32 = DEFAULT_CURRENT_YEAR + MAX_PROJECTION_YEARS as i32;
/// Assumed annual limit for years past the published table.
pub const DEFAULT_FUTURE_LIMIT: f64 = 7_000.0;
/// Monthly penalty on the highest excess amount.
pub const OVER_CONTRIBUTION_PENALTY: f64 = 0.01;

/// Published annual dollar limits.
const ANNUAL_LIMITS: &[(i32, f64)] = &[
    (2009, 5_000.0),
    (2010, 5_000.0),
    (2011, 5_000.0),
    (2012, 5_000.0),
    (2013, 5_500.0),
    (2014, 5_500.0),
    (2015, 10_000.0),
    (2016, 5_500.0),
    (2017, 5_500.0),
    (2018, 5_500.0),
    (2019, 6_000.0),
    (2020, 6_000.0),
    (2021, 6_000.0),
    (2022, 6_000.0),
    (2023, 6_500.0),
    (2024, 7_000.0),
    (2025, 7_000.0),
];

pub const FIELDS: &[FieldSpec] = &[
    FieldSpec::required("birthYear", "Birth year", FieldKind::Year),
    FieldSpec::optional("currentYear", "Current year", FieldKind::Year),
    FieldSpec::optional("totalContributions", "Contributions to date", FieldKind::Dollars),
    FieldSpec::optional("priorWithdrawals", "Withdrawals before this year", FieldKind::Dollars),
    FieldSpec::optional("withdrawalsThisYear", "Withdrawals this year", FieldKind::Dollars),
    FieldSpec::optional("currentBalance", "Current balance", FieldKind::Dollars),
    FieldSpec::required("annualContribution", "Planned annual contribution", FieldKind::Dollars),
    FieldSpec::required("annualReturn", "Expected annual return", FieldKind::Percent),
    FieldSpec::optional("years", "Projection years", FieldKind::Years),
    FieldSpec::optional("futureAnnualLimit", "Assumed future annual limit", FieldKind::Dollars),
];

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TfsaInputs {
    pub birth_year: Option<i32>,
    pub current_year: Option<i32>,
    pub total_contributions: Option<f64>,
    pub prior_withdrawals: Option<f64>,
    pub withdrawals_this_year: Option<f64>,
    pub current_balance: Option<f64>,
    pub annual_contribution: Option<f64>,
    pub annual_return: Option<f64>,
    pub years: Option<u32>,
    pub future_annual_limit: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TfsaResult {
    pub eligible_since: i32,
    pub cumulative_limit: f64,
    pub available_room: f64,
    pub over_contribution: f64,
    pub monthly_penalty: f64,
    pub projection: GrowthProjection,
}

pub fn annual_limit(year: i32, future_limit: f64) -> f64 {
    ANNUAL_LIMITS
        .iter()
        .find(|(y, _)| *y == year)
        .map(|(_, limit)| *limit)
        .unwrap_or(if year < FIRST_TFSA_YEAR { 0.0 } else { future_limit })
}

/// Sum of annual limits from the first eligible year through `current_year`.
pub fn cumulative_limit(eligible_since: i32, current_year: i32, future_limit: f64) -> f64 {
    (eligible_since..=current_year)
        .map(|year| annual_limit(year, future_limit))
        .sum()
}

/// Room for a projection that starts in the current year: today's room, then
/// a fresh annual limit plus this year's withdrawals restored from year two.
struct TfsaRoom {
    initial_room: f64,
    restored_next_year: f64,
    annual_limit: f64,
}

impl ContributionRoom for TfsaRoom {
    fn available(&self, period: u32, contributed_so_far: f64) -> f64 {
        let mut room = self.initial_room;
        if period > 1 {
            room += self.restored_next_year + self.annual_limit * (period - 1) as f64;
        }
        (room - contributed_so_far).max(0.0)
    }
}

pub fn calculate(inputs: &TfsaInputs) -> CalcResult<TfsaResult> {
    let birth_year = require(inputs.birth_year, "birthYear")?;
    let annual_contribution = non_negative(
        require(inputs.annual_contribution, "annualContribution")?,
        "annualContribution",
    )?;
    let annual_return = rate_from_percent(
        require(inputs.annual_return, "annualReturn")?,
        "annualReturn",
        50.0,
    )?;

    let current_year = inputs.current_year.unwrap_or(DEFAULT_CURRENT_YEAR);
    let future_limit = non_negative(
        inputs.future_annual_limit.unwrap_or(DEFAULT_FUTURE_LIMIT),
        "futureAnnualLimit",
    )?;
    if !(FIRST_TFSA_YEAR..=MAX_CURRENT_YEAR).contains(&current_year) {
        return Err(CalcError::domain(format!(
            "currentYear must be between {FIRST_TFSA_YEAR} and {MAX_CURRENT_YEAR}"
        )));
    }
    if !(1900..=current_year).contains(&birth_year) {
        return Err(CalcError::domain(format!(
            "birthYear must be between 1900 and {current_year}"
        )));
    }
    let eligible_since = (birth_year + ELIGIBILITY_AGE).max(FIRST_TFSA_YEAR);
    if current_year < eligible_since {
        return Err(CalcError::domain(format!(
            "TFSA room starts accruing in {eligible_since}"
        )));
    }

    let contributions = non_negative(
        inputs.total_contributions.unwrap_or(0.0),
        "totalContributions",
    )?;
    let prior_withdrawals =
        non_negative(inputs.prior_withdrawals.unwrap_or(0.0), "priorWithdrawals")?;
    let withdrawals_this_year = non_negative(
        inputs.withdrawals_this_year.unwrap_or(0.0),
        "withdrawalsThisYear",
    )?;
    let current_balance = non_negative(inputs.current_balance.unwrap_or(0.0), "currentBalance")?;

    let years = inputs.years.unwrap_or(DEFAULT_PROJECTION_YEARS);
    if years == 0 || years > MAX_PROJECTION_YEARS {
        return Err(CalcError::domain(format!(
            "years must be between 1 and {MAX_PROJECTION_YEARS}"
        )));
    }

    let cumulative = cumulative_limit(eligible_since, current_year, future_limit);
    let room = cumulative + prior_withdrawals - contributions;
    let available_room = room.max(0.0);
    let over_contribution = (-room).max(0.0);

    let projection = project_growth(
        current_balance,
        annual_contribution,
        annual_return,
        years,
        &TfsaRoom {
            initial_room: available_room,
            restored_next_year: withdrawals_this_year,
            annual_limit: future_limit,
        },
    )?;

    Ok(TfsaResult {
        eligible_since,
        cumulative_limit: cumulative,
        available_room,
        over_contribution,
        monthly_penalty: over_contribution * OVER_CONTRIBUTION_PENALTY,
        projection,
    })
}
