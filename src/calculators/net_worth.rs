use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{FieldKind, FieldSpec, non_negative};
use crate::core::{CalcError, CalcResult};

pub const DEFAULT_CATEGORY: &str = "other";

pub const FIELDS: &[FieldSpec] = &[
    FieldSpec::required("assets", "Assets", FieldKind::List),
    FieldSpec::optional("liabilities", "Liabilities", FieldKind::List),
];

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LineItem {
    pub label: String,
    pub amount: f64,
    pub category: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NetWorthInputs {
    pub assets: Vec<LineItem>,
    pub liabilities: Vec<LineItem>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTotal {
    pub category: String,
    pub total: f64,
    /// Fraction of the side (assets or liabilities) it belongs to.
    pub share: f64,
}

/// One input line echoed back with its normalised category.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemLine {
    pub label: String,
    pub category: String,
    pub amount: f64,
    pub share: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetWorthResult {
    pub total_assets: f64,
    pub total_liabilities: f64,
    pub net_worth: f64,
    pub debt_to_asset_ratio: Option<f64>,
    pub asset_categories: Vec<CategoryTotal>,
    pub liability_categories: Vec<CategoryTotal>,
    pub asset_items: Vec<ItemLine>,
    pub liability_items: Vec<ItemLine>,
}

struct SideSummary {
    total: f64,
    categories: Vec<CategoryTotal>,
    items: Vec<ItemLine>,
}

fn share_of(amount: f64, total: f64) -> f64 {
    if total > 0.0 { amount / total } else { 0.0 }
}

fn summarize(items: &[LineItem], side: &str) -> CalcResult<SideSummary> {
    let mut by_category: BTreeMap<String, f64> = BTreeMap::new();
    let mut lines = Vec::with_capacity(items.len());
    let mut total = 0.0;
    for item in items {
        let amount = non_negative(item.amount, side)?;
        let category = item
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(DEFAULT_CATEGORY)
            .to_lowercase();
        *by_category.entry(category.clone()).or_insert(0.0) += amount;
        total += amount;
        lines.push(ItemLine {
            label: item.label.trim().to_string(),
            category,
            amount,
            share: 0.0,
        });
    }
    for line in &mut lines {
        line.share = share_of(line.amount, total);
    }

    let categories = by_category
        .into_iter()
        .map(|(category, sum)| CategoryTotal {
            category,
            total: sum,
            share: share_of(sum, total),
        })
        .collect();
    Ok(SideSummary {
        total,
        categories,
        items: lines,
    })
}

pub fn calculate(inputs: &NetWorthInputs) -> CalcResult<NetWorthResult> {
    if inputs.assets.is_empty() && inputs.liabilities.is_empty() {
        return Err(CalcError::MissingInput("assets"));
    }

    let assets = summarize(&inputs.assets, "asset amounts")?;
    let liabilities = summarize(&inputs.liabilities, "liability amounts")?;

    Ok(NetWorthResult {
        total_assets: assets.total,
        total_liabilities: liabilities.total,
        net_worth: assets.total - liabilities.total,
        debt_to_asset_ratio: (assets.total > 0.0).then(|| liabilities.total / assets.total),
        asset_categories: assets.categories,
        liability_categories: liabilities.categories,
        asset_items: assets.items,
        liability_items: liabilities.items,
    })
}
