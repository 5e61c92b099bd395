use serde::{Deserialize, Serialize};

use super::{FieldKind, FieldSpec, non_negative, rate_from_percent};
use crate::core::{
    CalcError, CalcResult, ContributionRoom, GrowthProjection, project_growth, require,
};

pub const FIRST_FHSA_YEAR: i32 = 2023;
pub const ANNUAL_LIMIT: f64 = 8_000.0;
pub const LIFETIME_LIMIT: f64 = 40_000.0;
pub const CARRY_FORWARD_MAX: f64 = 8_000.0;
/// Years an account may stay open, counting the year it was opened.
pub const MAX_PARTICIPATION_YEARS: i32 = 15;
pub const DEFAULT_CURRENT_YEAR: i32 = 2025;
pub const DEFAULT_PROJECTION_YEARS: u32 = 5;

pub const FIELDS: &[FieldSpec] = &[
    FieldSpec::optional("openedYear", "Year the FHSA was opened", FieldKind::Year),
    FieldSpec::optional("currentYear", "Current year", FieldKind::Year),
    FieldSpec::optional("contributedToDate", "Contributed in prior years", FieldKind::Dollars),
    FieldSpec::optional("contributedThisYear", "Contributed this year", FieldKind::Dollars),
    FieldSpec::optional("currentBalance", "Current balance", FieldKind::Dollars),
    FieldSpec::required("annualContribution", "Planned annual contribution", FieldKind::Dollars),
    FieldSpec::required("annualReturn", "Expected annual return", FieldKind::Percent),
    FieldSpec::optional("marginalTaxRate", "Marginal tax rate", FieldKind::Percent),
    FieldSpec::optional("years", "Projection years", FieldKind::Years),
];

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FhsaInputs {
    pub opened_year: Option<i32>,
    pub current_year: Option<i32>,
    pub contributed_to_date: Option<f64>,
    pub contributed_this_year: Option<f64>,
    pub current_balance: Option<f64>,
    pub annual_contribution: Option<f64>,
    pub annual_return: Option<f64>,
    pub marginal_tax_rate: Option<f64>,
    pub years: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FhsaResult {
    pub participation_year: i32,
    pub participation_years_left: i32,
    pub carry_forward: f64,
    pub room_this_year: f64,
    pub lifetime_room_left: f64,
    pub projection: GrowthProjection,
    /// Deductions claimed on projected contributions at the marginal rate.
    pub tax_savings: Option<f64>,
}

#[derive(Debug, Clone, Copy)]
struct FhsaRequest {
    participation_year: i32,
    carry_forward: f64,
    room_this_year: f64,
    lifetime_room_left: f64,
    current_balance: f64,
    annual_contribution: f64,
    annual_return: f64,
    marginal_tax_rate: Option<f64>,
    years: u32,
}

/// Yearly room for a fixed planned deposit. Unused room carries into the
/// next year up to the carry-forward maximum; nothing is granted once the
/// participation window closes.
struct FhsaRoom {
    yearly: Vec<f64>,
}

impl FhsaRoom {
    fn plan(request: &FhsaRequest) -> Self {
        let mut yearly = Vec::with_capacity(request.years as usize);
        let mut lifetime_left = request.lifetime_room_left;
        let mut granted = request.room_this_year;
        for offset in 0..request.years as i32 {
            if request.participation_year + offset > MAX_PARTICIPATION_YEARS {
                yearly.push(0.0);
                continue;
            }
            if offset > 0 {
                granted = ANNUAL_LIMIT + granted;
            }
            let room = granted.min(lifetime_left).max(0.0);
            let deposit = request.annual_contribution.min(room);
            yearly.push(room);
            lifetime_left -= deposit;
            granted = (granted - deposit).clamp(0.0, CARRY_FORWARD_MAX);
        }
        Self { yearly }
    }
}

impl ContributionRoom for FhsaRoom {
    fn available(&self, period: u32, _contributed_so_far: f64) -> f64 {
        self.yearly
            .get(period.saturating_sub(1) as usize)
            .copied()
            .unwrap_or(0.0)
    }
}

fn build_request(inputs: &FhsaInputs) -> CalcResult<FhsaRequest> {
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
    let opened_year = inputs.opened_year.unwrap_or(current_year);
    if opened_year < FIRST_FHSA_YEAR {
        return Err(CalcError::domain(format!(
            "FHSAs could not be opened before {FIRST_FHSA_YEAR}"
        )));
    }
    if opened_year > current_year {
        return Err(CalcError::domain("openedYear cannot be after currentYear"));
    }
    let participation_year = current_year - opened_year + 1;
    if participation_year > MAX_PARTICIPATION_YEARS {
        return Err(CalcError::domain(format!(
            "an FHSA must be closed after {MAX_PARTICIPATION_YEARS} years"
        )));
    }

    let contributed_to_date = non_negative(
        inputs.contributed_to_date.unwrap_or(0.0),
        "contributedToDate",
    )?;
    let contributed_this_year = non_negative(
        inputs.contributed_this_year.unwrap_or(0.0),
        "contributedThisYear",
    )?;
    let lifetime_room_left = LIFETIME_LIMIT - contributed_to_date - contributed_this_year;
    if lifetime_room_left < 0.0 {
        return Err(CalcError::domain(format!(
            "contributions exceed the ${LIFETIME_LIMIT:.0} lifetime limit"
        )));
    }

    // Prior-year totals only tell us how much room went unused overall,
    // so the carry-forward is that amount clamped to the yearly maximum.
    let prior_years = (participation_year - 1) as f64;
    let carry_forward =
        (ANNUAL_LIMIT * prior_years - contributed_to_date).clamp(0.0, CARRY_FORWARD_MAX);
    let room_this_year = (ANNUAL_LIMIT + carry_forward - contributed_this_year)
        .min(lifetime_room_left)
        .max(0.0);

    let marginal_tax_rate = inputs
        .marginal_tax_rate
        .map(|rate| rate_from_percent(rate, "marginalTaxRate", 100.0))
        .transpose()?;

    let years = inputs.years.unwrap_or(DEFAULT_PROJECTION_YEARS);
    if years == 0 || years > MAX_PARTICIPATION_YEARS as u32 {
        return Err(CalcError::domain(format!(
            "years must be between 1 and {MAX_PARTICIPATION_YEARS}"
        )));
    }

    Ok(FhsaRequest {
        participation_year,
        carry_forward,
        room_this_year,
        lifetime_room_left,
        current_balance: non_negative(inputs.current_balance.unwrap_or(0.0), "currentBalance")?,
        annual_contribution,
        annual_return,
        marginal_tax_rate,
        years,
    })
}

pub fn calculate(inputs: &FhsaInputs) -> CalcResult<FhsaResult> {
    let request = build_request(inputs)?;
    let room = FhsaRoom::plan(&request);
    let projection = project_growth(
        request.current_balance,
        request.annual_contribution,
        request.annual_return,
        request.years,
        &room,
    )?;
    let tax_savings = request
        .marginal_tax_rate
        .map(|rate| projection.total_contributions * rate);

    Ok(FhsaResult {
        participation_year: request.participation_year,
        participation_years_left: MAX_PARTICIPATION_YEARS - request.participation_year,
        carry_forward: request.carry_forward,
        room_this_year: request.room_this_year,
        lifetime_room_left: request.lifetime_room_left,
        projection,
        tax_savings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected}, got {actual}, tolerance {tol}"
        );
    }

    fn sample_inputs() -> FhsaInputs {
        FhsaInputs {
            annual_contribution: Some(8_000.0),
            annual_return: Some(0.0),
            ..FhsaInputs::default()
        }
    }

    fn contributions(result: &FhsaResult) -> Vec<f64> {
        result
            .projection
            .rows
            .iter()
            .map(|row| row.contribution)
            .collect()
    }

    #[test]
    fn new_account_reaches_the_lifetime_limit_in_five_years() {
        let mut inputs = sample_inputs();
        inputs.years = Some(6);
        let result = calculate(&inputs).expect("valid");
        assert_eq!(result.participation_year, 1);
        assert_close(result.room_this_year, ANNUAL_LIMIT, 1e-9);
        assert_eq!(
            contributions(&result),
            vec![8_000.0, 8_000.0, 8_000.0, 8_000.0, 8_000.0, 0.0]
        );
        assert_close(result.projection.total_contributions, LIFETIME_LIMIT, 1e-9);
    }

    #[test]
    fn unused_room_carries_forward_one_year() {
        let mut inputs = sample_inputs();
        inputs.opened_year = Some(2024);
        inputs.annual_contribution = Some(10_000.0);
        let result = calculate(&inputs).expect("valid");
        assert_close(result.carry_forward, 8_000.0, 1e-9);
        assert_close(result.room_this_year, 16_000.0, 1e-9);
        // Room runs 16k, 14k, 12k, then the lifetime limit leaves 10k.
        assert_eq!(
            contributions(&result),
            vec![10_000.0, 10_000.0, 10_000.0, 10_000.0, 0.0]
        );
    }

    #[test]
    fn contributions_this_year_reduce_room() {
        let mut inputs = sample_inputs();
        inputs.contributed_this_year = Some(3_000.0);
        let result = calculate(&inputs).expect("valid");
        assert_close(result.room_this_year, 5_000.0, 1e-9);
        assert_close(result.lifetime_room_left, 37_000.0, 1e-9);
    }

    #[test]
    fn no_room_after_the_participation_window() {
        let mut inputs = sample_inputs();
        inputs.opened_year = Some(2023);
        inputs.current_year = Some(2037);
        inputs.years = Some(3);
        let result = calculate(&inputs).expect("valid");
        assert_eq!(result.participation_year, MAX_PARTICIPATION_YEARS);
        assert_eq!(result.participation_years_left, 0);
        assert_eq!(contributions(&result), vec![8_000.0, 0.0, 0.0]);
    }

    #[test]
    fn tax_savings_use_the_marginal_rate() {
        let mut inputs = sample_inputs();
        inputs.years = Some(1);
        inputs.marginal_tax_rate = Some(30.0);
        let result = calculate(&inputs).expect("valid");
        assert_close(result.tax_savings.expect("rate given"), 2_400.0, 1e-9);
    }

    #[test]
    fn growth_compounds_on_contributions() {
        let mut inputs = sample_inputs();
        inputs.annual_return = Some(5.0);
        inputs.years = Some(2);
        let result = calculate(&inputs).expect("valid");
        // (8,000 * 1.05 + 8,000) * 1.05
        assert_close(result.projection.final_balance, 17_220.0, 1e-6);
    }

    #[test]
    fn rejects_inconsistent_years_and_excess_contributions() {
        let mut inputs = sample_inputs();
        inputs.opened_year = Some(2026);
        assert!(matches!(calculate(&inputs), Err(CalcError::Domain(_))));

        let mut inputs = sample_inputs();
        inputs.opened_year = Some(2022);
        assert!(matches!(calculate(&inputs), Err(CalcError::Domain(_))));

        let mut inputs = sample_inputs();
        inputs.contributed_to_date = Some(41_000.0);
        assert!(matches!(calculate(&inputs), Err(CalcError::Domain(_))));
    }
}
