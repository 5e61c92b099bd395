use super::error::{CalcError, CalcResult, ensure_finite};
use super::types::AnnuityPayment;

/// Periodic rates below this use the straight-line branch.
pub const ZERO_RATE_THRESHOLD: f64 = 1e-12;

/// Fixed payment that retires `principal` in exactly `periods` payments.
pub fn annuity_payment(
    principal: f64,
    periodic_rate: f64,
    periods: u32,
) -> CalcResult<AnnuityPayment> {
    if !principal.is_finite() || principal <= 0.0 {
        return Err(CalcError::domain("principal must be > 0"));
    }
    validate_rate_and_periods(periodic_rate, periods)?;

    let n = periods as f64;
    let payment = if periodic_rate < ZERO_RATE_THRESHOLD {
        principal / n
    } else {
        let growth = (1.0 + periodic_rate).powf(n);
        principal * (periodic_rate * growth) / (growth - 1.0)
    };
    let payment = ensure_finite(payment, "payment is not a finite number")?;

    let total_paid = payment * n;
    Ok(AnnuityPayment {
        payment,
        total_paid,
        total_interest: total_paid - principal,
    })
}

/// Largest principal that `payment` retires in `periods` payments.
pub fn present_value(payment: f64, periodic_rate: f64, periods: u32) -> CalcResult<f64> {
    if !payment.is_finite() || payment < 0.0 {
        return Err(CalcError::domain("payment must be >= 0"));
    }
    validate_rate_and_periods(periodic_rate, periods)?;

    let n = periods as f64;
    let value = if periodic_rate < ZERO_RATE_THRESHOLD {
        payment * n
    } else {
        payment * (1.0 - (1.0 + periodic_rate).powf(-n)) / periodic_rate
    };
    ensure_finite(value, "present value is not a finite number")
}

/// Effective rate per payment for a nominal annual rate compounded
/// `compounding_per_year` times (2 for Canadian fixed mortgages, 12 for cards).
pub fn periodic_rate_from_annual(
    annual_rate: f64,
    compounding_per_year: u32,
    payments_per_year: u32,
) -> CalcResult<f64> {
    if !annual_rate.is_finite() || annual_rate < 0.0 {
        return Err(CalcError::domain("annual rate must be >= 0"));
    }
    if compounding_per_year == 0 || payments_per_year == 0 {
        return Err(CalcError::domain("compounding and payment frequency must be > 0"));
    }
    let per_compounding = annual_rate / compounding_per_year as f64;
    let exponent = compounding_per_year as f64 / payments_per_year as f64;
    ensure_finite(
        (1.0 + per_compounding).powf(exponent) - 1.0,
        "periodic rate is not a finite number",
    )
}

fn validate_rate_and_periods(periodic_rate: f64, periods: u32) -> CalcResult<()> {
    if !periodic_rate.is_finite() || periodic_rate < 0.0 {
        return Err(CalcError::domain("interest rate must be >= 0"));
    }
    if periods == 0 {
        return Err(CalcError::domain("number of payments must be > 0"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert, proptest};

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn zero_rate_divides_evenly() {
        let annuity = annuity_payment(12_000.0, 0.0, 24).expect("valid");
        assert_approx(annuity.payment, 500.0);
        assert_approx(annuity.total_interest, 0.0);
    }

    #[test]
    fn matches_textbook_loan_payment() {
        // 100,000 at 6% nominal monthly over 30 years.
        let annuity = annuity_payment(100_000.0, 0.005, 360).expect("valid");
        assert!((annuity.payment - 599.55).abs() < 0.01, "{}", annuity.payment);
        assert!((annuity.total_interest - 115_838.19).abs() < 5.0);
    }

    #[test]
    fn present_value_inverts_payment() {
        let annuity = annuity_payment(250_000.0, 0.004, 300).expect("valid");
        let pv = present_value(annuity.payment, 0.004, 300).expect("valid");
        assert!((pv - 250_000.0).abs() < 1e-4);
    }

    #[test]
    fn semi_annual_compounding_to_monthly_rate() {
        let rate = periodic_rate_from_annual(0.05, 2, 12).expect("valid");
        // (1.025)^(1/6) - 1
        assert!((rate - 0.004_123_915_5).abs() < 1e-8, "{rate}");
    }

    #[test]
    fn monthly_compounding_is_simple_division() {
        let rate = periodic_rate_from_annual(0.1999, 12, 12).expect("valid");
        assert_approx(rate, 0.1999 / 12.0);
    }

    #[test]
    fn rejects_zero_periods_and_negative_rates() {
        assert!(annuity_payment(1_000.0, 0.01, 0).is_err());
        assert!(annuity_payment(1_000.0, -0.01, 12).is_err());
        assert!(annuity_payment(-1.0, 0.01, 12).is_err());
        assert!(present_value(100.0, 0.01, 0).is_err());
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_total_interest_is_payment_times_n_minus_principal(
            principal in 1_000u32..2_000_000,
            rate_bp in 0u32..200,
            periods in 1u32..480
        ) {
            let principal = principal as f64;
            let rate = rate_bp as f64 / 10_000.0;
            let annuity = annuity_payment(principal, rate, periods).expect("valid");
            prop_assert!(annuity.payment >= principal / periods as f64 - 1e-9);
            prop_assert!(annuity.total_interest >= -1e-6);
            let expected = annuity.payment * periods as f64 - principal;
            prop_assert!((annuity.total_interest - expected).abs() <= 1e-9 * principal);
        }
    }
}
