use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{FieldKind, FieldSpec, positive, rate_from_percent};
use crate::core::{CalcError, CalcResult, ensure_finite, require};

pub const EARLIEST_START_AGE: u32 = 60;
pub const STANDARD_START_AGE: u32 = 65;
pub const LATEST_START_AGE: u32 = 70;
/// Reduction per month started before 65.
pub const EARLY_REDUCTION_PER_MONTH: f64 = 0.006;
/// Increase per month deferred past 65.
pub const DEFERRAL_INCREASE_PER_MONTH: f64 = 0.007;
/// 2025 maximum monthly retirement pension at 65.
pub const DEFAULT_MONTHLY_AT_65: f64 = 1_433.0;
pub const DEFAULT_LIFE_EXPECTANCY: u32 = 85;
pub const MAX_LIFE_EXPECTANCY: u32 = 110;

pub const FIELDS: &[FieldSpec] = &[
    FieldSpec::required("startAge", "Age you start CPP", FieldKind::Age),
    FieldSpec::optional("monthlyAt65", "Estimated monthly benefit at 65", FieldKind::Dollars),
    FieldSpec::optional("lifeExpectancy", "Life expectancy", FieldKind::Age),
    FieldSpec::optional("annualIndexation", "Annual indexation", FieldKind::Percent),
];

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CppInputs {
    pub start_age: Option<u32>,
    pub monthly_at_65: Option<f64>,
    pub life_expectancy: Option<u32>,
    pub annual_indexation: Option<f64>,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartAgeRow {
    pub start_age: u32,
    pub adjustment_factor: f64,
    pub monthly_benefit: f64,
    pub annual_benefit: f64,
    pub lifetime_total: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CppResult {
    pub start_age: u32,
    pub adjustment_factor: f64,
    pub monthly_benefit: f64,
    pub annual_benefit: f64,
    pub lifetime_total: f64,
    /// Age at which the later of this start and 65 has collected as much as
    /// the earlier one. `None` when starting at 65 or never caught up.
    pub break_even_age: Option<f64>,
    pub by_start_age: Vec<StartAgeRow>,
}

#[derive(Debug, Clone, Copy)]
struct CppRequest {
    start_age: u32,
    monthly_at_65: f64,
    life_expectancy: u32,
    indexation: f64,
}

/// Multiplier on the age-65 pension for a given start age.
pub fn adjustment_factor(start_age: u32) -> f64 {
    let months_from_65 = (start_age as f64 - STANDARD_START_AGE as f64) * 12.0;
    if months_from_65 < 0.0 {
        1.0 + months_from_65 * EARLY_REDUCTION_PER_MONTH
    } else {
        1.0 + months_from_65 * DEFERRAL_INCREASE_PER_MONTH
    }
}

fn build_request(inputs: &CppInputs) -> CalcResult<CppRequest> {
    let start_age = require(inputs.start_age, "startAge")?;
    if !(EARLIEST_START_AGE..=LATEST_START_AGE).contains(&start_age) {
        return Err(CalcError::domain(format!(
            "startAge must be between {EARLIEST_START_AGE} and {LATEST_START_AGE}"
        )));
    }
    let monthly_at_65 = positive(
        inputs.monthly_at_65.unwrap_or(DEFAULT_MONTHLY_AT_65),
        "monthlyAt65",
    )?;
    let life_expectancy = inputs.life_expectancy.unwrap_or(DEFAULT_LIFE_EXPECTANCY);
    if !(EARLIEST_START_AGE..=MAX_LIFE_EXPECTANCY).contains(&life_expectancy) {
        return Err(CalcError::domain(format!(
            "lifeExpectancy must be between {EARLIEST_START_AGE} and {MAX_LIFE_EXPECTANCY}"
        )));
    }
    let indexation = rate_from_percent(
        inputs.annual_indexation.unwrap_or(0.0),
        "annualIndexation",
        10.0,
    )?;
    Ok(CppRequest {
        start_age,
        monthly_at_65,
        life_expectancy,
        indexation,
    })
}

/// Payment received in the month the recipient turns `age_months` old, for a
/// stream starting at `start_age`. Indexation steps once per year of receipt.
fn payment_in_month(request: &CppRequest, start_age: u32, age_months: u32) -> f64 {
    let start_months = start_age * 12;
    if age_months < start_months {
        return 0.0;
    }
    let years_received = (age_months - start_months) / 12;
    request.monthly_at_65
        * adjustment_factor(start_age)
        * (1.0 + request.indexation).powi(years_received as i32)
}

fn lifetime_total(request: &CppRequest, start_age: u32) -> CalcResult<f64> {
    let total: f64 = (start_age * 12..request.life_expectancy * 12)
        .map(|age_months| payment_in_month(request, start_age, age_months))
        .sum();
    ensure_finite(total, "lifetime benefit overflowed")
}

fn break_even_age(request: &CppRequest) -> Option<f64> {
    let (earlier, later) = match request.start_age.cmp(&STANDARD_START_AGE) {
        std::cmp::Ordering::Equal => return None,
        std::cmp::Ordering::Less => (request.start_age, STANDARD_START_AGE),
        std::cmp::Ordering::Greater => (STANDARD_START_AGE, request.start_age),
    };

    let mut earlier_total = 0.0;
    let mut later_total = 0.0;
    for age_months in earlier * 12..MAX_LIFE_EXPECTANCY * 12 {
        earlier_total += payment_in_month(request, earlier, age_months);
        later_total += payment_in_month(request, later, age_months);
        if age_months >= later * 12 && later_total >= earlier_total {
            return Some((age_months + 1) as f64 / 12.0);
        }
    }
    None
}

pub fn calculate(inputs: &CppInputs) -> CalcResult<CppResult> {
    let request = build_request(inputs)?;

    let by_start_age = (EARLIEST_START_AGE..=LATEST_START_AGE)
        .map(|start_age| -> CalcResult<StartAgeRow> {
            let monthly_benefit = request.monthly_at_65 * adjustment_factor(start_age);
            Ok(StartAgeRow {
                start_age,
                adjustment_factor: adjustment_factor(start_age),
                monthly_benefit,
                annual_benefit: monthly_benefit * 12.0,
                lifetime_total: lifetime_total(&request, start_age)?,
            })
        })
        .collect::<CalcResult<Vec<_>>>()?;

    let chosen = by_start_age
        .iter()
        .find(|row| row.start_age == request.start_age)
        .copied()
        .ok_or(CalcError::Numeric("start age missing from table"))?;
    let break_even_age = break_even_age(&request);
    debug!(start_age = request.start_age, ?break_even_age, "cpp start age evaluated");

    Ok(CppResult {
        start_age: chosen.start_age,
        adjustment_factor: chosen.adjustment_factor,
        monthly_benefit: chosen.monthly_benefit,
        annual_benefit: chosen.annual_benefit,
        lifetime_total: chosen.lifetime_total,
        break_even_age,
        by_start_age,
    })
}
