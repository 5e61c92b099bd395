use serde::Serialize;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MinimumPayment {
    pub percent_of_balance: f64,
    pub floor: f64,
    /// Added to the period's interest to form a lower bound ("interest plus $1").
    pub interest_increment: f64,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum PaymentRule {
    Fixed(f64),
    Minimum(MinimumPayment),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PayoffStatus {
    PaidOff,
    DoesNotAmortize,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRow {
    pub period: u32,
    pub payment: f64,
    pub interest: f64,
    pub principal: f64,
    pub balance: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoffSchedule {
    pub rows: Vec<ScheduleRow>,
    pub total_paid: f64,
    pub total_interest: f64,
    pub periods: u32,
    pub status: PayoffStatus,
    pub remaining_balance: f64,
}

impl PayoffSchedule {
    pub fn is_paid_off(&self) -> bool {
        self.status == PayoffStatus::PaidOff
    }

    /// Balance left after `period` payments, or the starting balance for period 0.
    pub fn balance_after(&self, period: u32, starting_balance: f64) -> f64 {
        if period == 0 {
            return starting_balance;
        }
        self.rows
            .iter()
            .take_while(|row| row.period <= period)
            .last()
            .map(|row| row.balance)
            .unwrap_or(starting_balance)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnuityPayment {
    pub payment: f64,
    pub total_paid: f64,
    pub total_interest: f64,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionRow {
    pub period: u32,
    pub contribution: f64,
    pub growth: f64,
    pub balance: f64,
    pub cumulative_contributions: f64,
    pub cumulative_growth: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GrowthProjection {
    pub rows: Vec<ProjectionRow>,
    pub final_balance: f64,
    pub total_contributions: f64,
    pub total_growth: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BracketPortion {
    pub label: String,
    pub lower: f64,
    /// `None` for the open-ended top bracket.
    pub upper: Option<f64>,
    pub rate: f64,
    pub taxable: f64,
    pub tax: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BracketedAmount {
    pub total: f64,
    pub breakdown: Vec<BracketPortion>,
}
