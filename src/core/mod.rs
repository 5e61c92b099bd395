pub mod amortization;
pub mod annuity;
pub mod brackets;
mod error;
pub mod projection;
pub mod solver;
mod types;

pub use amortization::{
    BALANCE_EPSILON, MAX_PERIODS, MAX_SCHEDULE_PERIODS, payoff_schedule, payoff_schedule_within,
};
pub use annuity::{annuity_payment, periodic_rate_from_annual, present_value};
pub use brackets::{Bracket, BracketTable, Rebate};
pub use error::{CalcError, CalcResult, ensure_finite, require};
pub use projection::{
    ContributionRoom, LifetimeCap, MAX_PROJECTION_PERIODS, Unlimited, periods_to_reach,
    project_growth,
};
pub use solver::{ContributionGoal, GoalSolveConfig, GoalSolveResult, solve_required_contribution};
pub use types::{
    AnnuityPayment, BracketPortion, BracketedAmount, GrowthProjection, MinimumPayment,
    PaymentRule, PayoffSchedule, PayoffStatus, ProjectionRow, ScheduleRow,
};
