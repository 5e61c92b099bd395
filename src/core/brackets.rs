use super::error::{CalcError, CalcResult};
use super::types::{BracketPortion, BracketedAmount};

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Bracket {
    /// Inclusive upper bound; `f64::INFINITY` for the top bracket.
    pub upper: f64,
    pub rate: f64,
}

impl Bracket {
    pub const fn new(upper: f64, rate: f64) -> Self {
        Self { upper, rate }
    }
}

/// Marginal-rate schedule covering `[0, inf)`.
#[derive(Clone, Debug, PartialEq)]
pub struct BracketTable {
    brackets: Vec<Bracket>,
}

impl BracketTable {
    pub fn new(brackets: Vec<Bracket>) -> CalcResult<Self> {
        let Some(last) = brackets.last() else {
            return Err(CalcError::domain("bracket table must not be empty"));
        };
        if last.upper != f64::INFINITY {
            return Err(CalcError::domain("last bracket must be unbounded"));
        }

        let mut lower = 0.0;
        for bracket in &brackets {
            if bracket.upper.is_nan() || bracket.upper <= lower {
                return Err(CalcError::domain(
                    "bracket bounds must be positive and strictly ascending",
                ));
            }
            if !bracket.rate.is_finite() || bracket.rate < 0.0 {
                return Err(CalcError::domain("bracket rates must be >= 0"));
            }
            lower = bracket.upper;
        }

        Ok(Self { brackets })
    }

    pub fn brackets(&self) -> &[Bracket] {
        &self.brackets
    }

    /// Cumulative piecewise amount plus the per-bracket breakdown that produced it.
    pub fn apply(&self, amount: f64) -> CalcResult<BracketedAmount> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(CalcError::domain("amount must be >= 0"));
        }

        let mut total = 0.0;
        let mut breakdown = Vec::new();
        let mut lower = 0.0;
        for bracket in &self.brackets {
            if amount <= lower {
                break;
            }
            let taxable = amount.min(bracket.upper) - lower;
            let tax = taxable * bracket.rate;
            total += tax;
            breakdown.push(BracketPortion {
                label: bracket_label(lower, bracket),
                lower,
                upper: bracket.upper.is_finite().then_some(bracket.upper),
                rate: bracket.rate,
                taxable,
                tax,
            });
            lower = bracket.upper;
        }

        Ok(BracketedAmount { total, breakdown })
    }
}

fn bracket_label(lower: f64, bracket: &Bracket) -> String {
    let pct = (bracket.rate * 10_000.0).round() / 100.0;
    if bracket.upper.is_finite() {
        format!("${lower:.0} - ${:.0} @ {pct}%", bracket.upper)
    } else {
        format!("over ${lower:.0} @ {pct}%")
    }
}

/// Flat rebate granted only when the amount is at or under an eligibility ceiling.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Rebate {
    pub max_amount: f64,
    pub eligibility_ceiling: Option<f64>,
}

impl Rebate {
    pub fn apply(&self, computed_tax: f64, amount: f64) -> f64 {
        match self.eligibility_ceiling {
            Some(ceiling) if amount > ceiling => 0.0,
            _ => computed_tax.min(self.max_amount).max(0.0),
        }
    }
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

    fn ontario() -> BracketTable {
        BracketTable::new(vec![
            Bracket::new(55_000.0, 0.005),
            Bracket::new(250_000.0, 0.01),
            Bracket::new(400_000.0, 0.015),
            Bracket::new(2_000_000.0, 0.02),
            Bracket::new(f64::INFINITY, 0.025),
        ])
        .expect("valid table")
    }

    #[test]
    fn ontario_300k_matches_hand_calculation() {
        let result = ontario().apply(300_000.0).expect("valid");
        // 55000*0.005 + 195000*0.01 + 50000*0.015
        assert_approx(result.total, 2_975.0);
        assert_eq!(result.breakdown.len(), 3);
        assert_approx(result.breakdown[2].taxable, 50_000.0);
        assert_approx(result.breakdown[2].tax, 750.0);
    }

    #[test]
    fn zero_amount_has_no_breakdown() {
        let result = ontario().apply(0.0).expect("valid");
        assert_eq!(result.total, 0.0);
        assert!(result.breakdown.is_empty());
    }

    #[test]
    fn top_bracket_has_open_upper_bound() {
        let result = ontario().apply(2_500_000.0).expect("valid");
        let top = result.breakdown.last().expect("top bracket");
        assert_eq!(top.upper, None);
        assert_approx(top.taxable, 500_000.0);
        assert!(top.label.starts_with("over $2000000"));
    }

    #[test]
    fn rejects_malformed_tables() {
        assert!(BracketTable::new(vec![]).is_err());
        assert!(BracketTable::new(vec![Bracket::new(100.0, 0.01)]).is_err());
        assert!(
            BracketTable::new(vec![
                Bracket::new(100.0, 0.01),
                Bracket::new(50.0, 0.02),
                Bracket::new(f64::INFINITY, 0.03),
            ])
            .is_err()
        );
        assert!(BracketTable::new(vec![Bracket::new(f64::INFINITY, -0.01)]).is_err());
    }

    #[test]
    fn rejects_negative_amount() {
        assert!(ontario().apply(-1.0).is_err());
    }

    #[test]
    fn rebate_is_capped_by_tax_and_ceiling() {
        let ontario_ftb = Rebate {
            max_amount: 4_000.0,
            eligibility_ceiling: None,
        };
        assert_approx(ontario_ftb.apply(2_975.0, 300_000.0), 2_975.0);
        assert_approx(ontario_ftb.apply(8_475.0, 600_000.0), 4_000.0);

        let capped = Rebate {
            max_amount: 8_000.0,
            eligibility_ceiling: Some(835_000.0),
        };
        assert_approx(capped.apply(10_000.0, 835_000.0), 8_000.0);
        assert_approx(capped.apply(10_000.0, 835_000.01), 0.0);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(32))]

        #[test]
        fn prop_boundary_total_is_sum_of_full_lower_brackets(index in 0usize..4) {
            let table = ontario();
            let brackets = table.brackets();
            let boundary = brackets[index].upper;

            let mut expected = 0.0;
            let mut lower = 0.0;
            for bracket in &brackets[..=index] {
                expected += (bracket.upper - lower) * bracket.rate;
                lower = bracket.upper;
            }

            let result = table.apply(boundary).expect("valid");
            prop_assert!((result.total - expected).abs() <= 1e-6);
            prop_assert!(result.breakdown.len() == index + 1);
        }

        #[test]
        fn prop_total_is_monotonic_in_amount(a in 0u32..5_000_000, b in 0u32..5_000_000) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let table = ontario();
            let lo_tax = table.apply(lo as f64).expect("valid").total;
            let hi_tax = table.apply(hi as f64).expect("valid").total;
            prop_assert!(lo_tax <= hi_tax + 1e-9);
        }
    }
}
