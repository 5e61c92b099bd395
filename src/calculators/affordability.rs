use serde::{Deserialize, Serialize};

use super::mortgage::{
    COMPOUNDING_PER_YEAR, DEFAULT_AMORTIZATION_YEARS, INSURED_PRICE_CEILING, MAX_AMORTIZATION_YEARS,
    MIN_AMORTIZATION_YEARS,
};
use super::{FieldKind, FieldSpec, non_negative, positive, rate_from_percent};
use crate::core::{
    CalcError, CalcResult, annuity_payment, periodic_rate_from_annual, present_value, require,
};

pub const MAX_GDS: f64 = 0.39;
pub const MAX_TDS: f64 = 0.44;
/// Qualifying rate is the greater of the contract rate plus this buffer and the floor.
pub const STRESS_TEST_BUFFER: f64 = 0.02;
pub const STRESS_TEST_FLOOR: f64 = 0.0525;
pub const DEFAULT_MONTHLY_HEATING: f64 = 100.0;
/// Share of condo fees counted toward debt service.
pub const CONDO_FEE_SHARE: f64 = 0.5;

pub const FIELDS: &[FieldSpec] = &[
    FieldSpec::required("annualIncome", "Gross household income", FieldKind::Dollars),
    FieldSpec::required("downPayment", "Down payment", FieldKind::Dollars),
    FieldSpec::required("annualRate", "Contract interest rate", FieldKind::Percent),
    FieldSpec::optional("amortizationYears", "Amortization", FieldKind::Years),
    FieldSpec::optional("annualPropertyTax", "Property tax (annual)", FieldKind::Dollars),
    FieldSpec::optional("monthlyHeating", "Heating (monthly)", FieldKind::Dollars),
    FieldSpec::optional("monthlyCondoFees", "Condo fees (monthly)", FieldKind::Dollars),
    FieldSpec::optional("monthlyDebtPayments", "Other debt payments (monthly)", FieldKind::Dollars),
];

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AffordabilityInputs {
    pub annual_income: Option<f64>,
    pub down_payment: Option<f64>,
    pub annual_rate: Option<f64>,
    pub amortization_years: Option<u32>,
    pub annual_property_tax: Option<f64>,
    pub monthly_heating: Option<f64>,
    pub monthly_condo_fees: Option<f64>,
    pub monthly_debt_payments: Option<f64>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LimitingRatio {
    Gds,
    Tds,
    DownPayment,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AffordabilityResult {
    pub qualifying_rate: f64,
    pub monthly_housing_costs: f64,
    pub max_monthly_payment: f64,
    pub max_mortgage: f64,
    pub max_purchase_price: f64,
    /// The purchase price must stay strictly below `max_purchase_price`
    /// (insured purchases under the $1.5M ceiling).
    pub max_purchase_price_exclusive: bool,
    pub limiting_ratio: LimitingRatio,
    pub gds_ratio: f64,
    pub tds_ratio: f64,
    /// Payment on `max_mortgage` at the contract rate rather than the stress-test rate.
    pub payment_at_contract_rate: f64,
}

/// Price ceiling set by the down payment alone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceCap {
    pub max_price: f64,
    /// `max_price` itself is not allowed, only prices under it.
    pub exclusive: bool,
}

impl PriceCap {
    fn inclusive(max_price: f64) -> Self {
        Self {
            max_price,
            exclusive: false,
        }
    }

    fn exceeded_by(self, price: f64) -> bool {
        if self.exclusive {
            price >= self.max_price
        } else {
            price > self.max_price
        }
    }
}

/// Highest price whose minimum down payment is covered by `down_payment`.
pub fn max_price_for_down_payment(down_payment: f64) -> PriceCap {
    if down_payment <= 25_000.0 {
        PriceCap::inclusive(down_payment / 0.05)
    } else if down_payment < 125_000.0 {
        PriceCap::inclusive(500_000.0 + (down_payment - 25_000.0) / 0.10)
    } else if down_payment < INSURED_PRICE_CEILING * 0.20 {
        PriceCap {
            max_price: INSURED_PRICE_CEILING,
            exclusive: true,
        }
    } else {
        PriceCap::inclusive(down_payment / 0.20)
    }
}

pub fn calculate(inputs: &AffordabilityInputs) -> CalcResult<AffordabilityResult> {
    let income = positive(require(inputs.annual_income, "annualIncome")?, "annualIncome")?;
    let down_payment = non_negative(require(inputs.down_payment, "downPayment")?, "downPayment")?;
    let contract_rate = rate_from_percent(
        require(inputs.annual_rate, "annualRate")?,
        "annualRate",
        30.0,
    )?;
    let years = inputs.amortization_years.unwrap_or(DEFAULT_AMORTIZATION_YEARS);
    if !(MIN_AMORTIZATION_YEARS..=MAX_AMORTIZATION_YEARS).contains(&years) {
        return Err(CalcError::domain(format!(
            "amortizationYears must be between {MIN_AMORTIZATION_YEARS} and \
             {MAX_AMORTIZATION_YEARS} years"
        )));
    }

    let property_tax = non_negative(
        inputs.annual_property_tax.unwrap_or(0.0),
        "annualPropertyTax",
    )? / 12.0;
    let heating = non_negative(
        inputs.monthly_heating.unwrap_or(DEFAULT_MONTHLY_HEATING),
        "monthlyHeating",
    )?;
    let condo = non_negative(inputs.monthly_condo_fees.unwrap_or(0.0), "monthlyCondoFees")?;
    let debts = non_negative(
        inputs.monthly_debt_payments.unwrap_or(0.0),
        "monthlyDebtPayments",
    )?;

    let monthly_income = income / 12.0;
    let housing = property_tax + heating + condo * CONDO_FEE_SHARE;
    let gds_room = MAX_GDS * monthly_income - housing;
    let tds_room = MAX_TDS * monthly_income - housing - debts;
    let (mut limiting_ratio, max_payment) = if gds_room <= tds_room {
        (LimitingRatio::Gds, gds_room.max(0.0))
    } else {
        (LimitingRatio::Tds, tds_room.max(0.0))
    };

    let qualifying_rate = (contract_rate + STRESS_TEST_BUFFER).max(STRESS_TEST_FLOOR);
    let periods = years * 12;
    let qualifying_monthly = periodic_rate_from_annual(qualifying_rate, COMPOUNDING_PER_YEAR, 12)?;
    let mut max_mortgage = present_value(max_payment, qualifying_monthly, periods)?;

    let price_cap = max_price_for_down_payment(down_payment);
    let capped = price_cap.exceeded_by(max_mortgage + down_payment);
    if capped {
        max_mortgage = (price_cap.max_price - down_payment).max(0.0);
        limiting_ratio = LimitingRatio::DownPayment;
    }
    let max_purchase_price = max_mortgage + down_payment;
    let max_purchase_price_exclusive = capped && price_cap.exclusive;

    let (stress_payment, payment_at_contract_rate) = if max_mortgage > 0.0 {
        let contract_monthly = periodic_rate_from_annual(contract_rate, COMPOUNDING_PER_YEAR, 12)?;
        (
            annuity_payment(max_mortgage, qualifying_monthly, periods)?.payment,
            annuity_payment(max_mortgage, contract_monthly, periods)?.payment,
        )
    } else {
        (0.0, 0.0)
    };

    Ok(AffordabilityResult {
        qualifying_rate,
        monthly_housing_costs: housing,
        max_monthly_payment: stress_payment,
        max_mortgage,
        max_purchase_price,
        max_purchase_price_exclusive,
        limiting_ratio,
        gds_ratio: (stress_payment + housing) / monthly_income,
        tds_ratio: (stress_payment + housing + debts) / monthly_income,
        payment_at_contract_rate,
    })
}
