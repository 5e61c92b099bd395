use serde::{Deserialize, Serialize};

use super::{FieldKind, FieldSpec, positive};
use crate::core::{Bracket, BracketTable, BracketedAmount, CalcResult, Rebate, require};

const ONTARIO: &[Bracket] = &[
    Bracket::new(55_000.0, 0.005),
    Bracket::new(250_000.0, 0.01),
    Bracket::new(400_000.0, 0.015),
    Bracket::new(2_000_000.0, 0.02),
    Bracket::new(f64::INFINITY, 0.025),
];

/// Municipal tax in Toronto follows the provincial schedule up to $2M,
/// then adds luxury tiers.
const TORONTO_MUNICIPAL: &[Bracket] = &[
    Bracket::new(55_000.0, 0.005),
    Bracket::new(250_000.0, 0.01),
    Bracket::new(400_000.0, 0.015),
    Bracket::new(2_000_000.0, 0.02),
    Bracket::new(3_000_000.0, 0.025),
    Bracket::new(4_000_000.0, 0.035),
    Bracket::new(5_000_000.0, 0.045),
    Bracket::new(10_000_000.0, 0.055),
    Bracket::new(20_000_000.0, 0.065),
    Bracket::new(f64::INFINITY, 0.075),
];

const BRITISH_COLUMBIA: &[Bracket] = &[
    Bracket::new(200_000.0, 0.01),
    Bracket::new(2_000_000.0, 0.02),
    Bracket::new(3_000_000.0, 0.03),
    Bracket::new(f64::INFINITY, 0.05),
];

const MANITOBA: &[Bracket] = &[
    Bracket::new(30_000.0, 0.0),
    Bracket::new(90_000.0, 0.005),
    Bracket::new(150_000.0, 0.01),
    Bracket::new(200_000.0, 0.015),
    Bracket::new(f64::INFINITY, 0.02),
];

const QUEBEC: &[Bracket] = &[
    Bracket::new(61_500.0, 0.005),
    Bracket::new(307_800.0, 0.01),
    Bracket::new(f64::INFINITY, 0.015),
];

pub const ONTARIO_FIRST_TIME_REBATE: Rebate = Rebate {
    max_amount: 4_000.0,
    eligibility_ceiling: None,
};
pub const TORONTO_FIRST_TIME_REBATE: Rebate = Rebate {
    max_amount: 4_475.0,
    eligibility_ceiling: None,
};
pub const BC_FIRST_TIME_REBATE: Rebate = Rebate {
    max_amount: 8_000.0,
    eligibility_ceiling: Some(835_000.0),
};

pub const FIELDS: &[FieldSpec] = &[
    FieldSpec::required("price", "Purchase price", FieldKind::Dollars),
    FieldSpec::optional("province", "Province or city", FieldKind::Choice),
    FieldSpec::optional("firstTimeBuyer", "First-time buyer", FieldKind::Flag),
];

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Province {
    #[default]
    #[serde(alias = "on")]
    Ontario,
    Toronto,
    #[serde(alias = "bc")]
    BritishColumbia,
    #[serde(alias = "mb")]
    Manitoba,
    #[serde(alias = "qc")]
    Quebec,
}

impl Province {
    fn provincial_schedule(self) -> &'static [Bracket] {
        match self {
            Province::Ontario | Province::Toronto => ONTARIO,
            Province::BritishColumbia => BRITISH_COLUMBIA,
            Province::Manitoba => MANITOBA,
            Province::Quebec => QUEBEC,
        }
    }

    fn provincial_rebate(self) -> Option<(&'static str, Rebate)> {
        match self {
            Province::Ontario | Province::Toronto => {
                Some(("Ontario first-time buyer refund", ONTARIO_FIRST_TIME_REBATE))
            }
            Province::BritishColumbia => {
                Some(("BC first-time buyer exemption", BC_FIRST_TIME_REBATE))
            }
            Province::Manitoba | Province::Quebec => None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LandTransferInputs {
    pub price: Option<f64>,
    pub province: Option<Province>,
    pub first_time_buyer: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedRebate {
    pub label: &'static str,
    pub amount: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LandTransferResult {
    pub province: Province,
    pub price: f64,
    pub provincial: BracketedAmount,
    pub municipal: Option<BracketedAmount>,
    pub rebates: Vec<AppliedRebate>,
    pub total_before_rebates: f64,
    pub total_rebates: f64,
    pub total_payable: f64,
    pub effective_rate: f64,
}

fn table(brackets: &[Bracket]) -> CalcResult<BracketTable> {
    BracketTable::new(brackets.to_vec())
}

pub fn calculate(inputs: &LandTransferInputs) -> CalcResult<LandTransferResult> {
    let price = positive(require(inputs.price, "price")?, "price")?;
    let province = inputs.province.unwrap_or_default();
    let first_time_buyer = inputs.first_time_buyer.unwrap_or(false);

    let provincial = table(province.provincial_schedule())?.apply(price)?;
    let municipal = match province {
        Province::Toronto => Some(table(TORONTO_MUNICIPAL)?.apply(price)?),
        _ => None,
    };

    let mut rebates = Vec::new();
    if first_time_buyer {
        if let Some((label, rebate)) = province.provincial_rebate() {
            rebates.push(AppliedRebate {
                label,
                amount: rebate.apply(provincial.total, price),
            });
        }
        if let Some(municipal) = &municipal {
            rebates.push(AppliedRebate {
                label: "Toronto first-time buyer rebate",
                amount: TORONTO_FIRST_TIME_REBATE.apply(municipal.total, price),
            });
        }
    }

    let total_before_rebates =
        provincial.total + municipal.as_ref().map_or(0.0, |tax| tax.total);
    let total_rebates: f64 = rebates.iter().map(|rebate| rebate.amount).sum();
    let total_payable = (total_before_rebates - total_rebates).max(0.0);

    Ok(LandTransferResult {
        province,
        price,
        provincial,
        municipal,
        rebates,
        total_before_rebates,
        total_rebates,
        total_payable,
        effective_rate: total_payable / price,
    })
}
