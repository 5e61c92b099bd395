use super::error::{CalcError, CalcResult, ensure_finite};
use super::types::{GrowthProjection, ProjectionRow};

pub const MAX_PROJECTION_PERIODS: u32 = 1200;

/// Contribution allowance consulted before each period's deposit.
pub trait ContributionRoom {
    /// Room available in `period` (1-based) given everything contributed before it.
    fn available(&self, period: u32, contributed_so_far: f64) -> f64;
}

#[derive(Copy, Clone, Debug, Default)]
pub struct Unlimited;

impl ContributionRoom for Unlimited {
    fn available(&self, _period: u32, _contributed_so_far: f64) -> f64 {
        f64::INFINITY
    }
}

/// A cumulative ceiling across the whole projection.
#[derive(Copy, Clone, Debug)]
pub struct LifetimeCap(pub f64);

impl ContributionRoom for LifetimeCap {
    fn available(&self, _period: u32, contributed_so_far: f64) -> f64 {
        (self.0 - contributed_so_far).max(0.0)
    }
}

/// Contribution lands before growth: balance <- (balance + contribution) * (1 + rate).
pub fn project_growth(
    starting_balance: f64,
    contribution: f64,
    periodic_rate: f64,
    periods: u32,
    room: &dyn ContributionRoom,
) -> CalcResult<GrowthProjection> {
    validate(starting_balance, contribution, periodic_rate, periods)?;

    let mut balance = starting_balance;
    let mut cumulative_contributions = 0.0;
    let mut cumulative_growth = 0.0;
    let mut rows = Vec::with_capacity(periods as usize);

    for period in 1..=periods {
        let applied = contribution
            .min(room.available(period, cumulative_contributions))
            .max(0.0);
        let invested = balance + applied;
        let growth = invested * periodic_rate;
        balance = ensure_finite(invested + growth, "projected balance overflowed")?;

        cumulative_contributions += applied;
        cumulative_growth += growth;
        rows.push(ProjectionRow {
            period,
            contribution: applied,
            growth,
            balance,
            cumulative_contributions,
            cumulative_growth,
        });
    }

    Ok(GrowthProjection {
        rows,
        final_balance: balance,
        total_contributions: cumulative_contributions,
        total_growth: cumulative_growth,
    })
}

/// First period whose ending balance reaches `target`; `Some(0)` if already there.
pub fn periods_to_reach(
    starting_balance: f64,
    contribution: f64,
    periodic_rate: f64,
    target: f64,
    max_periods: u32,
) -> CalcResult<Option<u32>> {
    validate(starting_balance, contribution, periodic_rate, max_periods)?;
    if !target.is_finite() {
        return Err(CalcError::domain("target must be a finite amount"));
    }
    if starting_balance >= target {
        return Ok(Some(0));
    }

    let mut balance = starting_balance;
    for period in 1..=max_periods {
        balance = (balance + contribution) * (1.0 + periodic_rate);
        if balance >= target {
            return Ok(Some(period));
        }
    }
    Ok(None)
}

fn validate(
    starting_balance: f64,
    contribution: f64,
    periodic_rate: f64,
    periods: u32,
) -> CalcResult<()> {
    if !starting_balance.is_finite() || starting_balance < 0.0 {
        return Err(CalcError::domain("starting balance must be >= 0"));
    }
    if !contribution.is_finite() || contribution < 0.0 {
        return Err(CalcError::domain("contribution must be >= 0"));
    }
    if !periodic_rate.is_finite() || periodic_rate < 0.0 {
        return Err(CalcError::domain("growth rate must be >= 0"));
    }
    if periods > MAX_PROJECTION_PERIODS {
        return Err(CalcError::domain(format!(
            "projection horizon must be at most {MAX_PROJECTION_PERIODS} periods"
        )));
    }
    Ok(())
}
