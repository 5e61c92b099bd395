use serde::{Deserialize, Serialize};

use super::{FieldKind, FieldSpec, non_negative, positive, rate_from_percent};
use crate::core::{
    CalcError, CalcResult, MinimumPayment, PaymentRule, PayoffSchedule, PayoffStatus, ScheduleRow,
    annuity_payment, payoff_schedule, periodic_rate_from_annual, require,
};

pub const DEFAULT_MINIMUM_PERCENT: f64 = 2.0;
pub const DEFAULT_MINIMUM_FLOOR: f64 = 10.0;
pub const DEFAULT_INTEREST_INCREMENT: f64 = 1.0;

pub const FIELDS: &[FieldSpec] = &[
    FieldSpec::required("balance", "Current balance", FieldKind::Dollars),
    FieldSpec::required("annualRate", "Interest rate (APR)", FieldKind::Percent),
    FieldSpec::optional("minimumPercent", "Minimum payment (% of balance)", FieldKind::Percent),
    FieldSpec::optional("minimumFloor", "Minimum payment floor", FieldKind::Dollars),
    FieldSpec::optional("interestIncrement", "Interest-plus floor increment", FieldKind::Dollars),
    FieldSpec::optional("monthlyPayment", "Fixed monthly payment", FieldKind::Dollars),
    FieldSpec::optional("targetMonths", "Pay off within (months)", FieldKind::Months),
];

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CreditCardInputs {
    pub balance: Option<f64>,
    pub annual_rate: Option<f64>,
    pub minimum_percent: Option<f64>,
    pub minimum_floor: Option<f64>,
    pub interest_increment: Option<f64>,
    pub monthly_payment: Option<f64>,
    pub target_months: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoffSummary {
    pub status: PayoffStatus,
    /// `None` when the payment never retires the balance.
    pub months: Option<u32>,
    pub years: Option<f64>,
    pub first_payment: f64,
    pub total_paid: f64,
    pub total_interest: f64,
    pub message: Option<String>,
    pub schedule: Vec<ScheduleRow>,
}

impl PayoffSummary {
    fn from_schedule(schedule: PayoffSchedule) -> Self {
        let first_payment = schedule.rows.first().map(|row| row.payment).unwrap_or(0.0);
        let (months, years, message) = match schedule.status {
            PayoffStatus::PaidOff => (
                Some(schedule.periods),
                Some(schedule.periods as f64 / 12.0),
                None,
            ),
            PayoffStatus::DoesNotAmortize => (
                None,
                None,
                Some(
                    "This payment does not cover the interest charged; the balance never reaches zero."
                        .to_string(),
                ),
            ),
        };
        Self {
            status: schedule.status,
            months,
            years,
            first_payment,
            total_paid: schedule.total_paid,
            total_interest: schedule.total_interest,
            message,
            schedule: schedule.rows,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetPayoff {
    pub months: u32,
    pub monthly_payment: f64,
    pub total_interest: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditCardResult {
    pub monthly_rate: f64,
    pub minimum_only: PayoffSummary,
    pub fixed_payment: Option<PayoffSummary>,
    pub interest_saved: Option<f64>,
    pub months_saved: Option<u32>,
    pub target: Option<TargetPayoff>,
}

#[derive(Debug, Clone, Copy)]
struct CreditCardRequest {
    balance: f64,
    monthly_rate: f64,
    minimum: MinimumPayment,
    monthly_payment: Option<f64>,
    target_months: Option<u32>,
}

fn build_request(inputs: &CreditCardInputs) -> CalcResult<CreditCardRequest> {
    let balance = positive(require(inputs.balance, "balance")?, "balance")?;
    let annual_rate = rate_from_percent(
        require(inputs.annual_rate, "annualRate")?,
        "annualRate",
        100.0,
    )?;

    let minimum = MinimumPayment {
        percent_of_balance: rate_from_percent(
            inputs.minimum_percent.unwrap_or(DEFAULT_MINIMUM_PERCENT),
            "minimumPercent",
            100.0,
        )?,
        floor: non_negative(
            inputs.minimum_floor.unwrap_or(DEFAULT_MINIMUM_FLOOR),
            "minimumFloor",
        )?,
        interest_increment: non_negative(
            inputs.interest_increment.unwrap_or(DEFAULT_INTEREST_INCREMENT),
            "interestIncrement",
        )?,
    };

    let monthly_payment = inputs
        .monthly_payment
        .map(|p| positive(p, "monthlyPayment"))
        .transpose()?;

    if inputs.target_months == Some(0) {
        return Err(CalcError::domain("targetMonths must be > 0"));
    }

    Ok(CreditCardRequest {
        balance,
        monthly_rate: periodic_rate_from_annual(annual_rate, 12, 12)?,
        minimum,
        monthly_payment,
        target_months: inputs.target_months,
    })
}

pub fn calculate(inputs: &CreditCardInputs) -> CalcResult<CreditCardResult> {
    let request = build_request(inputs)?;

    let minimum_only = PayoffSummary::from_schedule(payoff_schedule(
        request.balance,
        request.monthly_rate,
        PaymentRule::Minimum(request.minimum),
    )?);

    let fixed_payment = request
        .monthly_payment
        .map(|payment| {
            payoff_schedule(request.balance, request.monthly_rate, PaymentRule::Fixed(payment))
                .map(PayoffSummary::from_schedule)
        })
        .transpose()?;

    let (interest_saved, months_saved) = match &fixed_payment {
        Some(fixed) if fixed.status == PayoffStatus::PaidOff => {
            let interest_saved = (minimum_only.status == PayoffStatus::PaidOff)
                .then(|| minimum_only.total_interest - fixed.total_interest);
            let months_saved = match (minimum_only.months, fixed.months) {
                (Some(min_months), Some(fixed_months)) => {
                    Some(min_months.saturating_sub(fixed_months))
                }
                _ => None,
            };
            (interest_saved, months_saved)
        }
        _ => (None, None),
    };

    let target = request
        .target_months
        .map(|months| {
            annuity_payment(request.balance, request.monthly_rate, months).map(|annuity| {
                TargetPayoff {
                    months,
                    monthly_payment: annuity.payment,
                    total_interest: annuity.total_interest,
                }
            })
        })
        .transpose()?;

    Ok(CreditCardResult {
        monthly_rate: request.monthly_rate,
        minimum_only,
        fixed_payment,
        interest_saved,
        months_saved,
        target,
    })
}
