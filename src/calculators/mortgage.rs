use serde::{Deserialize, Serialize};

use super::{FieldKind, FieldSpec, non_negative, positive, rate_from_percent};
use crate::core::{
    CalcError, CalcResult, PaymentRule, PayoffSchedule, annuity_payment, payoff_schedule_within,
    periodic_rate_from_annual, require,
};

pub const DEFAULT_AMORTIZATION_YEARS: u32 = 25;
pub const DEFAULT_TERM_YEARS: u32 = 5;
pub const MIN_AMORTIZATION_YEARS: u32 = 5;
pub const MAX_AMORTIZATION_YEARS: u32 = 30;
/// Fixed-rate Canadian mortgages compound semi-annually.
pub const COMPOUNDING_PER_YEAR: u32 = 2;
pub const INSURED_PRICE_CEILING: f64 = 1_500_000.0;

pub const FIELDS: &[FieldSpec] = &[
    FieldSpec::required("homePrice", "Home price", FieldKind::Dollars),
    FieldSpec::optional("downPayment", "Down payment", FieldKind::Dollars),
    FieldSpec::optional("downPaymentPercent", "Down payment (%)", FieldKind::Percent),
    FieldSpec::required("annualRate", "Interest rate", FieldKind::Percent),
    FieldSpec::optional("amortizationYears", "Amortization", FieldKind::Years),
    FieldSpec::optional("paymentFrequency", "Payment frequency", FieldKind::Choice),
    FieldSpec::optional("termYears", "Term", FieldKind::Years),
    FieldSpec::optional("compareRate", "Comparison rate", FieldKind::Percent),
    FieldSpec::optional("compareAmortizationYears", "Comparison amortization", FieldKind::Years),
    FieldSpec::optional("compareFrequency", "Comparison frequency", FieldKind::Choice),
];

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaymentFrequency {
    #[default]
    Monthly,
    #[serde(alias = "semiMonthly", alias = "semi_monthly")]
    SemiMonthly,
    #[serde(alias = "biWeekly", alias = "bi_weekly", alias = "biweekly")]
    BiWeekly,
    #[serde(alias = "acceleratedBiWeekly", alias = "accelerated_bi_weekly")]
    AcceleratedBiWeekly,
    Weekly,
    #[serde(alias = "acceleratedWeekly", alias = "accelerated_weekly")]
    AcceleratedWeekly,
}

impl PaymentFrequency {
    pub fn payments_per_year(self) -> u32 {
        match self {
            PaymentFrequency::Monthly => 12,
            PaymentFrequency::SemiMonthly => 24,
            PaymentFrequency::BiWeekly | PaymentFrequency::AcceleratedBiWeekly => 26,
            PaymentFrequency::Weekly | PaymentFrequency::AcceleratedWeekly => 52,
        }
    }

    /// Accelerated schedules pay a fixed fraction of the monthly payment.
    fn monthly_divisor(self) -> Option<f64> {
        match self {
            PaymentFrequency::AcceleratedBiWeekly => Some(2.0),
            PaymentFrequency::AcceleratedWeekly => Some(4.0),
            _ => None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MortgageInputs {
    pub home_price: Option<f64>,
    pub down_payment: Option<f64>,
    pub down_payment_percent: Option<f64>,
    pub annual_rate: Option<f64>,
    pub amortization_years: Option<u32>,
    pub payment_frequency: Option<PaymentFrequency>,
    pub term_years: Option<u32>,
    pub compare_rate: Option<f64>,
    pub compare_amortization_years: Option<u32>,
    pub compare_frequency: Option<PaymentFrequency>,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearSummary {
    pub year: u32,
    pub principal: f64,
    pub interest: f64,
    pub ending_balance: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MortgageScenario {
    pub annual_rate: f64,
    pub amortization_years: u32,
    pub payment_frequency: PaymentFrequency,
    pub periodic_payment: f64,
    pub payments: u32,
    pub payoff_years: f64,
    pub total_paid: f64,
    pub total_interest: f64,
    pub balance_at_term_end: f64,
    pub interest_over_term: f64,
    pub yearly: Vec<YearSummary>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MortgageComparison {
    pub scenario: MortgageScenario,
    /// Positive when the comparison costs more per year than the primary scenario.
    pub annual_payment_difference: f64,
    pub interest_difference: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MortgageResult {
    pub home_price: f64,
    pub down_payment: f64,
    pub down_payment_percent: f64,
    pub minimum_down_payment: f64,
    pub insurance_rate: f64,
    pub insurance_premium: f64,
    pub loan_amount: f64,
    pub scenario: MortgageScenario,
    pub comparison: Option<MortgageComparison>,
}

#[derive(Debug, Clone, Copy)]
struct ScenarioRequest {
    annual_rate: f64,
    amortization_years: u32,
    frequency: PaymentFrequency,
    term_years: u32,
}

/// 5% of the first $500k, 10% of the remainder, 20% of the whole price at $1.5M or more.
pub fn minimum_down_payment(price: f64) -> f64 {
    if price >= INSURED_PRICE_CEILING {
        price * 0.20
    } else if price <= 500_000.0 {
        price * 0.05
    } else {
        25_000.0 + (price - 500_000.0) * 0.10
    }
}

/// Mortgage default insurance premium rate by down-payment share.
pub fn insurance_rate(down_payment_fraction: f64) -> f64 {
    let share = down_payment_fraction + 1e-9;
    if share >= 0.20 {
        0.0
    } else if share >= 0.15 {
        0.028
    } else if share >= 0.10 {
        0.031
    } else {
        0.04
    }
}

fn resolve_down_payment(inputs: &MortgageInputs, price: f64) -> CalcResult<f64> {
    match (inputs.down_payment, inputs.down_payment_percent) {
        (Some(amount), _) => {
            let amount = non_negative(amount, "downPayment")?;
            if amount > price {
                return Err(CalcError::domain("downPayment cannot exceed homePrice"));
            }
            Ok(amount)
        }
        (None, Some(percent)) => {
            Ok(price * rate_from_percent(percent, "downPaymentPercent", 100.0)?)
        }
        (None, None) => Err(CalcError::MissingInput("downPayment")),
    }
}

fn validate_amortization(years: u32, field: &str) -> CalcResult<u32> {
    if !(MIN_AMORTIZATION_YEARS..=MAX_AMORTIZATION_YEARS).contains(&years) {
        return Err(CalcError::domain(format!(
            "{field} must be between {MIN_AMORTIZATION_YEARS} and {MAX_AMORTIZATION_YEARS} years"
        )));
    }
    Ok(years)
}

pub fn calculate(inputs: &MortgageInputs) -> CalcResult<MortgageResult> {
    let price = positive(require(inputs.home_price, "homePrice")?, "homePrice")?;
    let annual_rate = rate_from_percent(
        require(inputs.annual_rate, "annualRate")?,
        "annualRate",
        30.0,
    )?;
    let down_payment = resolve_down_payment(inputs, price)?;

    let minimum_down = minimum_down_payment(price);
    if down_payment + 1e-6 < minimum_down {
        return Err(CalcError::domain(format!(
            "down payment must be at least ${minimum_down:.2} for this price"
        )));
    }

    let down_fraction = down_payment / price;
    let insurance_rate = insurance_rate(down_fraction);
    let base_loan = price - down_payment;
    let insurance_premium = base_loan * insurance_rate;
    let loan_amount = base_loan + insurance_premium;
    if loan_amount <= 0.0 {
        return Err(CalcError::domain("nothing left to finance after the down payment"));
    }

    let term_years = inputs.term_years.unwrap_or(DEFAULT_TERM_YEARS);
    if !(1..=MAX_AMORTIZATION_YEARS).contains(&term_years) {
        return Err(CalcError::domain(format!(
            "termYears must be between 1 and {MAX_AMORTIZATION_YEARS}"
        )));
    }
    let primary = ScenarioRequest {
        annual_rate,
        amortization_years: validate_amortization(
            inputs.amortization_years.unwrap_or(DEFAULT_AMORTIZATION_YEARS),
            "amortizationYears",
        )?,
        frequency: inputs.payment_frequency.unwrap_or_default(),
        term_years,
    };
    let scenario = run_scenario(loan_amount, primary)?;

    let comparison = match (
        inputs.compare_rate,
        inputs.compare_amortization_years,
        inputs.compare_frequency,
    ) {
        (None, None, None) => None,
        (rate, years, frequency) => {
            let request = ScenarioRequest {
                annual_rate: match rate {
                    Some(rate) => rate_from_percent(rate, "compareRate", 30.0)?,
                    None => primary.annual_rate,
                },
                amortization_years: match years {
                    Some(years) => validate_amortization(years, "compareAmortizationYears")?,
                    None => primary.amortization_years,
                },
                frequency: frequency.unwrap_or(primary.frequency),
                term_years,
            };
            let other = run_scenario(loan_amount, request)?;
            Some(MortgageComparison {
                annual_payment_difference: annual_cost(&other) - annual_cost(&scenario),
                interest_difference: other.total_interest - scenario.total_interest,
                scenario: other,
            })
        }
    };

    Ok(MortgageResult {
        home_price: price,
        down_payment,
        down_payment_percent: down_fraction * 100.0,
        minimum_down_payment: minimum_down,
        insurance_rate,
        insurance_premium,
        loan_amount,
        scenario,
        comparison,
    })
}

fn annual_cost(scenario: &MortgageScenario) -> f64 {
    scenario.periodic_payment * scenario.payment_frequency.payments_per_year() as f64
}

fn run_scenario(principal: f64, request: ScenarioRequest) -> CalcResult<MortgageScenario> {
    let per_year = request.frequency.payments_per_year();
    let periodic_rate =
        periodic_rate_from_annual(request.annual_rate, COMPOUNDING_PER_YEAR, per_year)?;

    let periodic_payment = match request.frequency.monthly_divisor() {
        Some(divisor) => {
            let monthly_rate =
                periodic_rate_from_annual(request.annual_rate, COMPOUNDING_PER_YEAR, 12)?;
            annuity_payment(principal, monthly_rate, request.amortization_years * 12)?.payment
                / divisor
        }
        None => annuity_payment(principal, periodic_rate, request.amortization_years * per_year)?
            .payment,
    };

    // One spare year so a final cent of rounding never trips the cap.
    let max_periods = (request.amortization_years + 1) * per_year;
    let schedule = payoff_schedule_within(
        principal,
        periodic_rate,
        PaymentRule::Fixed(periodic_payment),
        max_periods,
    )?;
    if !schedule.is_paid_off() {
        return Err(CalcError::Numeric("mortgage schedule did not amortize"));
    }
    let term_periods = request.term_years * per_year;
    let interest_over_term = schedule
        .rows
        .iter()
        .take(term_periods as usize)
        .map(|row| row.interest)
        .sum();

    Ok(MortgageScenario {
        annual_rate: request.annual_rate,
        amortization_years: request.amortization_years,
        payment_frequency: request.frequency,
        periodic_payment,
        payments: schedule.periods,
        payoff_years: schedule.periods as f64 / per_year as f64,
        total_paid: schedule.total_paid,
        total_interest: schedule.total_interest,
        balance_at_term_end: schedule.balance_after(term_periods, principal),
        interest_over_term,
        yearly: yearly_summary(&schedule, per_year),
    })
}

fn yearly_summary(schedule: &PayoffSchedule, per_year: u32) -> Vec<YearSummary> {
    schedule
        .rows
        .chunks(per_year as usize)
        .enumerate()
        .map(|(idx, rows)| YearSummary {
            year: idx as u32 + 1,
            principal: rows.iter().map(|row| row.principal).sum(),
            interest: rows.iter().map(|row| row.interest).sum(),
            ending_balance: rows.last().map(|row| row.balance).unwrap_or(0.0),
        })
        .collect()
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

    fn sample_inputs() -> MortgageInputs {
        MortgageInputs {
            home_price: Some(600_000.0),
            down_payment_percent: Some(20.0),
            annual_rate: Some(5.0),
            ..MortgageInputs::default()
        }
    }

    #[test]
    fn twenty_percent_down_needs_no_insurance() {
        let result = calculate(&sample_inputs()).expect("valid");
        assert_close(result.down_payment, 120_000.0, 1e-6);
        assert_eq!(result.insurance_premium, 0.0);
        assert_close(result.loan_amount, 480_000.0, 1e-6);
        // 480k at 5% compounded semi-annually over 25 years.
        assert_close(result.scenario.periodic_payment, 2_792.0, 2.0);
        assert_eq!(result.scenario.payments, 300);
        assert_close(result.scenario.payoff_years, 25.0, 1e-9);
    }

    #[test]
    fn total_interest_matches_payments_minus_principal() {
        let result = calculate(&sample_inputs()).expect("valid");
        let scenario = &result.scenario;
        assert_close(
            scenario.total_paid - scenario.total_interest,
            result.loan_amount,
            0.05,
        );
        assert_eq!(scenario.yearly.len(), 25);
        assert!(scenario.balance_at_term_end < result.loan_amount);
        assert_close(
            scenario.yearly[4].ending_balance,
            scenario.balance_at_term_end,
            1e-9,
        );
    }

    #[test]
    fn insurance_premium_applies_below_twenty_percent() {
        let mut inputs = sample_inputs();
        inputs.down_payment_percent = None;
        inputs.down_payment = Some(60_000.0);
        let result = calculate(&inputs).expect("valid");
        assert_close(result.insurance_rate, 0.031, 1e-12);
        assert_close(result.insurance_premium, 540_000.0 * 0.031, 1e-6);
        assert_close(result.loan_amount, 540_000.0 * 1.031, 1e-6);
    }

    #[test]
    fn minimum_down_payment_tiers() {
        assert_close(minimum_down_payment(400_000.0), 20_000.0, 1e-9);
        assert_close(minimum_down_payment(600_000.0), 35_000.0, 1e-9);
        assert_close(minimum_down_payment(1_500_000.0), 300_000.0, 1e-9);
    }

    #[test]
    fn rejects_insufficient_down_payment() {
        let mut inputs = sample_inputs();
        inputs.down_payment_percent = Some(5.0);
        let err = calculate(&inputs).expect_err("30k < 35k minimum");
        assert!(err.to_string().contains("at least $35000.00"));
    }

    #[test]
    fn rejects_out_of_range_amortization_and_percent() {
        let mut inputs = sample_inputs();
        inputs.amortization_years = Some(35);
        assert!(matches!(calculate(&inputs), Err(CalcError::Domain(_))));

        let mut inputs = sample_inputs();
        inputs.down_payment_percent = Some(120.0);
        assert!(matches!(calculate(&inputs), Err(CalcError::Domain(_))));
    }

    #[test]
    fn missing_down_payment_is_empty_state() {
        let mut inputs = sample_inputs();
        inputs.down_payment_percent = None;
        assert_eq!(
            calculate(&inputs).expect_err("missing"),
            CalcError::MissingInput("downPayment")
        );
    }

    #[test]
    fn accelerated_bi_weekly_pays_off_sooner() {
        let mut inputs = sample_inputs();
        inputs.compare_frequency = Some(PaymentFrequency::AcceleratedBiWeekly);
        let result = calculate(&inputs).expect("valid");
        let comparison = result.comparison.expect("comparison");

        assert_close(
            comparison.scenario.periodic_payment,
            result.scenario.periodic_payment / 2.0,
            1e-9,
        );
        assert!(comparison.scenario.payoff_years < 23.0);
        assert!(comparison.interest_difference < 0.0);
        assert!(comparison.annual_payment_difference > 0.0);
    }

    #[test]
    fn shorter_amortization_costs_less_interest() {
        let mut inputs = sample_inputs();
        inputs.compare_amortization_years = Some(15);
        let result = calculate(&inputs).expect("valid");
        let comparison = result.comparison.expect("comparison");
        assert!(comparison.scenario.periodic_payment > result.scenario.periodic_payment);
        assert!(comparison.interest_difference < 0.0);
        assert_eq!(comparison.scenario.payments, 180);
    }

    fn scenario_for(frequency: PaymentFrequency, years: u32) -> MortgageScenario {
        let mut inputs = sample_inputs();
        inputs.payment_frequency = Some(frequency);
        inputs.amortization_years = Some(years);
        calculate(&inputs).expect("valid").scenario
    }

    #[test]
    fn every_regular_frequency_pays_off_over_the_amortization() {
        for (frequency, per_year) in [
            (PaymentFrequency::Monthly, 12),
            (PaymentFrequency::SemiMonthly, 24),
            (PaymentFrequency::BiWeekly, 26),
            (PaymentFrequency::Weekly, 52),
        ] {
            let scenario = scenario_for(frequency, 25);
            assert_eq!(scenario.payments, 25 * per_year, "{frequency:?}");
            assert_close(scenario.payoff_years, 25.0, 1e-9);
            assert_eq!(scenario.yearly.len(), 25);
            assert_close(scenario.total_paid - scenario.total_interest, 480_000.0, 0.05);
        }
    }

    #[test]
    fn weekly_thirty_year_schedule_runs_past_1200_payments() {
        let scenario = scenario_for(PaymentFrequency::Weekly, 30);
        assert_eq!(scenario.payments, 1_560);
        assert_close(scenario.payoff_years, 30.0, 1e-9);
        assert_eq!(scenario.yearly.len(), 30);
        assert!(scenario.yearly[29].ending_balance <= 0.01);
        assert!(scenario.total_interest > 0.0);
    }

    #[test]
    fn weekly_interest_totals_are_not_truncated() {
        // A schedule cut short would understate interest against monthly.
        let monthly = scenario_for(PaymentFrequency::Monthly, 30);
        let weekly = scenario_for(PaymentFrequency::Weekly, 30);
        assert!(weekly.total_interest < monthly.total_interest);
        assert_close(weekly.total_interest, monthly.total_interest, monthly.total_interest * 0.03);
    }

    #[test]
    fn accelerated_weekly_pays_a_quarter_of_monthly_and_finishes_early() {
        let monthly = scenario_for(PaymentFrequency::Monthly, 30);
        let accelerated = scenario_for(PaymentFrequency::AcceleratedWeekly, 30);
        assert_close(accelerated.periodic_payment, monthly.periodic_payment / 4.0, 1e-9);
        assert!(accelerated.payoff_years < 28.0, "{}", accelerated.payoff_years);
        assert!(accelerated.payments > 1_200);
        assert!(accelerated.total_interest < monthly.total_interest);
    }

    #[test]
    fn semi_monthly_pays_just_under_half_the_monthly_amount() {
        let monthly = scenario_for(PaymentFrequency::Monthly, 25);
        let semi = scenario_for(PaymentFrequency::SemiMonthly, 25);
        assert!(semi.periodic_payment * 2.0 < monthly.periodic_payment);
        assert_close(semi.periodic_payment * 2.0, monthly.periodic_payment, 15.0);
        assert_eq!(semi.payments, 600);
    }

    #[test]
    fn rejects_out_of_range_term() {
        let mut inputs = sample_inputs();
        inputs.term_years = Some(0);
        assert!(matches!(calculate(&inputs), Err(CalcError::Domain(_))));
        inputs.term_years = Some(u32::MAX);
        assert!(matches!(calculate(&inputs), Err(CalcError::Domain(_))));
    }

    #[test]
    fn frequency_deserializes_from_web_spellings() {
        let parsed: PaymentFrequency =
            serde_json::from_str("\"accelerated-bi-weekly\"").expect("kebab");
        assert_eq!(parsed, PaymentFrequency::AcceleratedBiWeekly);
        let parsed: PaymentFrequency = serde_json::from_str("\"biweekly\"").expect("alias");
        assert_eq!(parsed, PaymentFrequency::BiWeekly);
    }
}
