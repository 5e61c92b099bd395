use tracing::debug;

use super::error::{CalcError, CalcResult};
use super::types::{MinimumPayment, PaymentRule, PayoffSchedule, PayoffStatus, ScheduleRow};

/// Balances at or below this are treated as paid off.
pub const BALANCE_EPSILON: f64 = 0.01;
/// Hard stop for payment rules that never outpace interest (100 years of months).
pub const MAX_PERIODS: u32 = 1200;
/// Upper bound for caller-chosen caps (weekly payments over 40 years).
pub const MAX_SCHEDULE_PERIODS: u32 = 52 * 40;

pub fn payoff_schedule(
    starting_balance: f64,
    periodic_rate: f64,
    rule: PaymentRule,
) -> CalcResult<PayoffSchedule> {
    payoff_schedule_within(starting_balance, periodic_rate, rule, MAX_PERIODS)
}

/// Same loop with a caller-chosen period cap, for schedules with more than
/// twelve payments a year.
pub fn payoff_schedule_within(
    starting_balance: f64,
    periodic_rate: f64,
    rule: PaymentRule,
    max_periods: u32,
) -> CalcResult<PayoffSchedule> {
    validate(starting_balance, periodic_rate, rule)?;
    if max_periods == 0 || max_periods > MAX_SCHEDULE_PERIODS {
        return Err(CalcError::domain(format!(
            "period cap must be between 1 and {MAX_SCHEDULE_PERIODS}"
        )));
    }

    let mut balance = starting_balance;
    let mut rows = Vec::new();
    let mut total_paid = 0.0;
    let mut total_interest = 0.0;
    let mut status = PayoffStatus::DoesNotAmortize;

    for period in 1..=max_periods {
        let interest = balance * periodic_rate;
        let payment = rule_payment(rule, balance, interest).min(balance + interest);
        let principal = payment - interest;
        balance = (balance - principal).max(0.0);

        total_paid += payment;
        total_interest += interest;
        rows.push(ScheduleRow {
            period,
            payment,
            interest,
            principal,
            balance,
        });

        if balance <= BALANCE_EPSILON {
            status = PayoffStatus::PaidOff;
            break;
        }
        if !balance.is_finite() {
            break;
        }
    }

    if status == PayoffStatus::DoesNotAmortize {
        debug!(
            starting_balance,
            periodic_rate,
            remaining = balance,
            "payment rule never retires the balance"
        );
    }

    Ok(PayoffSchedule {
        periods: rows.len() as u32,
        rows,
        total_paid,
        total_interest,
        status,
        remaining_balance: balance,
    })
}

fn rule_payment(rule: PaymentRule, balance: f64, interest: f64) -> f64 {
    match rule {
        PaymentRule::Fixed(amount) => amount,
        PaymentRule::Minimum(min) => (balance * min.percent_of_balance)
            .max(min.floor)
            .max(interest + min.interest_increment),
    }
}

fn validate(balance: f64, periodic_rate: f64, rule: PaymentRule) -> CalcResult<()> {
    if !balance.is_finite() || balance <= 0.0 {
        return Err(CalcError::domain("balance must be > 0"));
    }
    if !periodic_rate.is_finite() || periodic_rate < 0.0 {
        return Err(CalcError::domain("interest rate must be >= 0"));
    }
    match rule {
        PaymentRule::Fixed(amount) => {
            if !amount.is_finite() || amount <= 0.0 {
                return Err(CalcError::domain("payment must be > 0"));
            }
        }
        PaymentRule::Minimum(MinimumPayment {
            percent_of_balance,
            floor,
            interest_increment,
        }) => {
            if !(0.0..=1.0).contains(&percent_of_balance) {
                return Err(CalcError::domain(
                    "minimum payment percentage must be between 0 and 100",
                ));
            }
            if !floor.is_finite() || floor < 0.0 {
                return Err(CalcError::domain("minimum payment floor must be >= 0"));
            }
            if !interest_increment.is_finite() || interest_increment < 0.0 {
                return Err(CalcError::domain("interest increment must be >= 0"));
            }
            if percent_of_balance == 0.0 && floor == 0.0 && interest_increment == 0.0 {
                return Err(CalcError::domain("minimum payment rule never pays principal"));
            }
        }
    }
    Ok(())
}
