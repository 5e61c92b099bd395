use serde::{Deserialize, Serialize};

use super::{FieldKind, FieldSpec, non_negative, positive};
use crate::core::{CalcResult, require};

pub const FIELDS: &[FieldSpec] = &[
    FieldSpec::required("monthlyIncome", "Monthly after-tax income", FieldKind::Dollars),
    FieldSpec::optional("items", "Budget items", FieldKind::List),
    FieldSpec::optional("needs", "Needs (monthly)", FieldKind::Dollars),
    FieldSpec::optional("wants", "Wants (monthly)", FieldKind::Dollars),
    FieldSpec::optional("savings", "Savings and debt repayment (monthly)", FieldKind::Dollars),
];

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Bucket {
    Needs,
    Wants,
    Savings,
}

impl Bucket {
    pub const ALL: [Bucket; 3] = [Bucket::Needs, Bucket::Wants, Bucket::Savings];

    /// Share of income the 50/30/20 rule assigns to the bucket.
    pub fn guideline_share(self) -> f64 {
        match self {
            Bucket::Needs => 0.5,
            Bucket::Wants => 0.3,
            Bucket::Savings => 0.2,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetItem {
    #[serde(default)]
    pub label: String,
    pub amount: f64,
    pub bucket: Bucket,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BudgetInputs {
    pub monthly_income: Option<f64>,
    pub items: Vec<BudgetItem>,
    pub needs: Option<f64>,
    pub wants: Option<f64>,
    pub savings: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketSummary {
    pub bucket: Bucket,
    pub total: f64,
    pub share_of_income: f64,
    pub guideline_share: f64,
    pub guideline_amount: f64,
    /// Positive when the bucket is over its guideline amount.
    pub over_guideline: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemLine {
    pub label: String,
    pub bucket: Bucket,
    pub amount: f64,
    pub share_of_income: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetResult {
    pub monthly_income: f64,
    pub buckets: Vec<BucketSummary>,
    /// Itemised lines in input order.
    pub items: Vec<ItemLine>,
    pub total_allocated: f64,
    /// Income left unassigned; negative when overspent.
    pub surplus: f64,
    pub savings_rate: f64,
}

pub fn calculate(inputs: &BudgetInputs) -> CalcResult<BudgetResult> {
    let income = positive(
        require(inputs.monthly_income, "monthlyIncome")?,
        "monthlyIncome",
    )?;

    let mut totals = [0.0_f64; 3];
    let flat = [
        (Bucket::Needs, inputs.needs, "needs"),
        (Bucket::Wants, inputs.wants, "wants"),
        (Bucket::Savings, inputs.savings, "savings"),
    ];
    for (bucket, amount, field) in flat {
        if let Some(amount) = amount {
            totals[bucket as usize] += non_negative(amount, field)?;
        }
    }
    let mut items = Vec::with_capacity(inputs.items.len());
    for item in &inputs.items {
        let amount = non_negative(item.amount, "item amount")?;
        totals[item.bucket as usize] += amount;
        items.push(ItemLine {
            label: item.label.trim().to_string(),
            bucket: item.bucket,
            amount,
            share_of_income: amount / income,
        });
    }

    let buckets: Vec<BucketSummary> = Bucket::ALL
        .into_iter()
        .map(|bucket| {
            let total = totals[bucket as usize];
            let guideline_amount = income * bucket.guideline_share();
            BucketSummary {
                bucket,
                total,
                share_of_income: total / income,
                guideline_share: bucket.guideline_share(),
                guideline_amount,
                over_guideline: total - guideline_amount,
            }
        })
        .collect();

    let total_allocated: f64 = totals.iter().sum();
    Ok(BudgetResult {
        monthly_income: income,
        buckets,
        items,
        total_allocated,
        surplus: income - total_allocated,
        savings_rate: totals[Bucket::Savings as usize] / income,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::CalcError;

    fn assert_close(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected}, got {actual}, tolerance {tol}"
        );
    }

    fn item(label: &str, amount: f64, bucket: Bucket) -> BudgetItem {
        BudgetItem {
            label: label.to_string(),
            amount,
            bucket,
        }
    }

    #[test]
    fn items_roll_up_into_buckets() {
        let inputs = BudgetInputs {
            monthly_income: Some(5_000.0),
            items: vec![
                item("Rent", 2_000.0, Bucket::Needs),
                item("Groceries", 600.0, Bucket::Needs),
                item("Dining out", 400.0, Bucket::Wants),
                item("TFSA", 750.0, Bucket::Savings),
            ],
            ..BudgetInputs::default()
        };
        let result = calculate(&inputs).expect("valid");
        let needs = &result.buckets[0];
        assert_eq!(needs.bucket, Bucket::Needs);
        assert_close(needs.total, 2_600.0, 1e-9);
        assert_close(needs.share_of_income, 0.52, 1e-12);
        assert_close(needs.over_guideline, 100.0, 1e-9);
        assert_close(result.buckets[1].over_guideline, -1_100.0, 1e-9);
        assert_close(result.total_allocated, 3_750.0, 1e-9);
        assert_close(result.surplus, 1_250.0, 1e-9);
        assert_close(result.savings_rate, 0.15, 1e-12);
    }

    #[test]
    fn item_labels_are_echoed_with_their_bucket() {
        let inputs = BudgetInputs {
            monthly_income: Some(4_000.0),
            items: vec![
                item("Rent ", 1_600.0, Bucket::Needs),
                item("Concert", 200.0, Bucket::Wants),
            ],
            needs: Some(100.0),
            ..BudgetInputs::default()
        };
        let result = calculate(&inputs).expect("valid");
        assert_eq!(result.items.len(), 2);
        assert_eq!(result.items[0].label, "Rent");
        assert_eq!(result.items[0].bucket, Bucket::Needs);
        assert_close(result.items[0].share_of_income, 0.4, 1e-12);
        assert_eq!(result.items[1].label, "Concert");
        assert_close(result.items[1].amount, 200.0, 1e-12);

        let value = serde_json::to_value(&result).expect("serialize");
        assert_eq!(value["items"][1]["label"], "Concert");
        assert_eq!(value["items"][1]["bucket"], "wants");
    }

    #[test]
    fn flat_amounts_combine_with_items() {
        let inputs = BudgetInputs {
            monthly_income: Some(4_000.0),
            items: vec![item("Phone", 80.0, Bucket::Needs)],
            needs: Some(1_920.0),
            wants: Some(1_200.0),
            savings: Some(800.0),
        };
        let result = calculate(&inputs).expect("valid");
        for summary in &result.buckets {
            assert_close(summary.total, summary.guideline_amount, 1e-9);
        }
        assert_close(result.surplus, 0.0, 1e-9);
    }

    #[test]
    fn overspending_shows_negative_surplus() {
        let inputs = BudgetInputs {
            monthly_income: Some(3_000.0),
            needs: Some(2_500.0),
            wants: Some(1_000.0),
            ..BudgetInputs::default()
        };
        let result = calculate(&inputs).expect("valid");
        assert_close(result.surplus, -500.0, 1e-9);
    }

    #[test]
    fn bucket_names_deserialize_lowercase() {
        let inputs: BudgetInputs = serde_json::from_str(
            r#"{"monthlyIncome": 1000, "items": [{"label": "Gym", "amount": 50, "bucket": "wants"}]}"#,
        )
        .expect("valid json");
        assert_eq!(inputs.items[0].bucket, Bucket::Wants);
    }

    #[test]
    fn rejects_zero_income_and_negative_items() {
        let inputs = BudgetInputs {
            monthly_income: Some(0.0),
            ..BudgetInputs::default()
        };
        assert!(matches!(calculate(&inputs), Err(CalcError::Domain(_))));

        let inputs = BudgetInputs {
            monthly_income: Some(1_000.0),
            items: vec![item("Refund", -10.0, Bucket::Needs)],
            ..BudgetInputs::default()
        };
        assert!(matches!(calculate(&inputs), Err(CalcError::Domain(_))));
    }
}
