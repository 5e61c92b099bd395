//! The closed set of calculators, each selected by its URL slug.
//!
//! Every calculator deserializes a loosely-typed payload into its own
//! `*Inputs` record, validates it, and returns a serializable result.
//! Missing required fields surface as [`CalcError::MissingInput`] so callers
//! can show an empty state instead of an error.

pub mod affordability;
pub mod budget;
pub mod cpp;
pub mod credit_card;
pub mod emergency_fund;
pub mod fhsa;
pub mod land_transfer;
pub mod mortgage;
pub mod net_worth;
pub mod tfsa;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::core::{CalcError, CalcResult};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Dollars,
    Percent,
    Years,
    Months,
    Age,
    Year,
    Choice,
    Flag,
    List,
}

#[derive(Copy, Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

impl FieldSpec {
    pub const fn required(name: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            label,
            kind,
            required: true,
        }
    }

    pub const fn optional(name: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            label,
            kind,
            required: false,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculatorDescriptor {
    pub slug: &'static str,
    pub title: &'static str,
    pub fields: &'static [FieldSpec],
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Calculator {
    Affordability,
    Budget,
    Cpp,
    CreditCard,
    EmergencyFund,
    Fhsa,
    LandTransfer,
    Mortgage,
    NetWorth,
    Tfsa,
}

impl Calculator {
    pub const ALL: [Calculator; 10] = [
        Calculator::Budget,
        Calculator::Cpp,
        Calculator::CreditCard,
        Calculator::EmergencyFund,
        Calculator::Fhsa,
        Calculator::LandTransfer,
        Calculator::Mortgage,
        Calculator::Affordability,
        Calculator::NetWorth,
        Calculator::Tfsa,
    ];

    pub fn slug(self) -> &'static str {
        match self {
            Calculator::Affordability => "mortgage-affordability",
            Calculator::Budget => "budget",
            Calculator::Cpp => "cpp",
            Calculator::CreditCard => "credit-card-payoff",
            Calculator::EmergencyFund => "emergency-fund",
            Calculator::Fhsa => "fhsa",
            Calculator::LandTransfer => "land-transfer-tax",
            Calculator::Mortgage => "mortgage",
            Calculator::NetWorth => "net-worth",
            Calculator::Tfsa => "tfsa",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|calc| calc.slug() == slug)
    }

    pub fn descriptor(self) -> CalculatorDescriptor {
        let (title, fields) = match self {
            Calculator::Affordability => {
                ("Mortgage Affordability (GDS/TDS)", affordability::FIELDS)
            }
            Calculator::Budget => ("Budget Planner (50/30/20)", budget::FIELDS),
            Calculator::Cpp => ("CPP Benefit Start Age", cpp::FIELDS),
            Calculator::CreditCard => ("Credit Card Payoff", credit_card::FIELDS),
            Calculator::EmergencyFund => ("Emergency Fund", emergency_fund::FIELDS),
            Calculator::Fhsa => ("FHSA Growth & Room", fhsa::FIELDS),
            Calculator::LandTransfer => ("Land Transfer Tax", land_transfer::FIELDS),
            Calculator::Mortgage => ("Mortgage Payment", mortgage::FIELDS),
            Calculator::NetWorth => ("Net Worth", net_worth::FIELDS),
            Calculator::Tfsa => ("TFSA Room & Growth", tfsa::FIELDS),
        };
        CalculatorDescriptor {
            slug: self.slug(),
            title,
            fields,
        }
    }

    pub fn evaluate(self, payload: Value) -> CalcResult<Value> {
        debug!(slug = self.slug(), "evaluating calculator");
        let result = match self {
            Calculator::Affordability => run(payload, affordability::calculate),
            Calculator::Budget => run(payload, budget::calculate),
            Calculator::Cpp => run(payload, cpp::calculate),
            Calculator::CreditCard => run(payload, credit_card::calculate),
            Calculator::EmergencyFund => run(payload, emergency_fund::calculate),
            Calculator::Fhsa => run(payload, fhsa::calculate),
            Calculator::LandTransfer => run(payload, land_transfer::calculate),
            Calculator::Mortgage => run(payload, mortgage::calculate),
            Calculator::NetWorth => run(payload, net_worth::calculate),
            Calculator::Tfsa => run(payload, tfsa::calculate),
        };
        if let Err(err) = &result {
            debug!(slug = self.slug(), kind = err.kind(), %err, "calculator produced no result");
        }
        result
    }
}

fn run<I, R>(payload: Value, calculate: fn(&I) -> CalcResult<R>) -> CalcResult<Value>
where
    I: DeserializeOwned,
    R: Serialize,
{
    let payload = if payload.is_null() {
        Value::Object(Default::default())
    } else {
        payload
    };
    let inputs: I = serde_json::from_value(payload)
        .map_err(|e| CalcError::domain(format!("invalid input: {e}")))?;
    let result = calculate(&inputs)?;
    serde_json::to_value(result).map_err(|_| CalcError::Numeric("result is not representable"))
}

pub(crate) fn rate_from_percent(value: f64, field: &str, max_percent: f64) -> CalcResult<f64> {
    if !value.is_finite() || !(0.0..=max_percent).contains(&value) {
        return Err(CalcError::domain(format!(
            "{field} must be between 0 and {max_percent}"
        )));
    }
    Ok(value / 100.0)
}

pub(crate) fn positive(value: f64, field: &str) -> CalcResult<f64> {
    if !value.is_finite() || value <= 0.0 {
        return Err(CalcError::domain(format!("{field} must be > 0")));
    }
    Ok(value)
}

pub(crate) fn non_negative(value: f64, field: &str) -> CalcResult<f64> {
    if !value.is_finite() || value < 0.0 {
        return Err(CalcError::domain(format!("{field} must be >= 0")));
    }
    Ok(value)
}
