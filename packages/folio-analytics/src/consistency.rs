//! Monthly top/bottom performer tables and repeat-appearance highlighting.

use crate::leaderboard::normalize_name;
use crate::types::{compare_month_labels, parse_month_label, StockPerformanceRecord};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

/// How many repeat names get highlighted.
pub const HIGHLIGHT_COUNT: usize = 3;

/// A stock's return in one month.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RankedStock {
    pub isin: String,
    pub stock_name: String,
    pub return_pct: f64,
}

/// Best and worst performers for one month.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyRanking {
    pub month: String,
    /// Highest returns first
    pub top: Vec<RankedStock>,
    /// Lowest returns first
    pub bottom: Vec<RankedStock>,
}

/// Which side of the monthly tables to count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankingSide {
    Top,
    Bottom,
}

/// How often a stock appeared on one side of the tables.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Appearance {
    pub isin: String,
    pub stock_name: String,
    pub count: usize,
}

/// Rank stocks within every month present in the records.
///
/// Months are ordered chronologically. Labels for the same calendar month
/// (`2024-03`, `Mar 2024`) are merged under the first label seen. Each month
/// lists up to `n` top performers and `n` underperformers; equal returns keep
/// input order.
pub fn monthly_rankings(records: &[StockPerformanceRecord], n: usize) -> Vec<MonthlyRanking> {
    // month key -> first label seen for it, stocks
    let mut by_month: HashMap<String, (String, Vec<RankedStock>)> = HashMap::new();
    let mut months: Vec<String> = Vec::new();

    for record in records {
        for monthly in &record.monthly_returns {
            let key = month_key(&monthly.month);
            let (_, entries) = by_month.entry(key.clone()).or_insert_with(|| {
                months.push(key);
                (monthly.month.clone(), Vec::new())
            });
            entries.push(RankedStock {
                isin: record.isin.clone(),
                stock_name: record.stock_name.clone(),
                return_pct: monthly.return_pct,
            });
        }
    }

    months.sort_by(|a, b| compare_month_labels(a, b));

    months
        .into_iter()
        .map(|key| {
            let (month, mut entries) = by_month.remove(&key).unwrap_or_default();

            entries.sort_by(|a, b| {
                b.return_pct
                    .partial_cmp(&a.return_pct)
                    .unwrap_or(Ordering::Equal)
            });
            let top = entries.iter().take(n).cloned().collect();

            entries.sort_by(|a, b| {
                a.return_pct
                    .partial_cmp(&b.return_pct)
                    .unwrap_or(Ordering::Equal)
            });
            let bottom = entries.into_iter().take(n).collect();

            MonthlyRanking {
                month,
                top,
                bottom,
            }
        })
        .collect()
}

/// Labels naming the same calendar month share a key.
fn month_key(label: &str) -> String {
    parse_month_label(label)
        .map(|date| date.format("%Y-%m").to_string())
        .unwrap_or_else(|| label.trim().to_string())
}

/// The `k` stocks appearing most often on one side of the tables.
///
/// Ordered by count descending; ties go to the stock that appeared first.
pub fn most_frequent(rankings: &[MonthlyRanking], side: RankingSide, k: usize) -> Vec<Appearance> {
    // key -> (first seen, appearance)
    let mut counts: HashMap<String, (usize, Appearance)> = HashMap::new();
    let mut order = 0usize;

    for ranking in rankings {
        let stocks = match side {
            RankingSide::Top => &ranking.top,
            RankingSide::Bottom => &ranking.bottom,
        };

        for stock in stocks {
            let key = if stock.isin.trim().is_empty() {
                format!("name:{}", normalize_name(&stock.stock_name))
            } else {
                stock.isin.trim().to_string()
            };

            let slot = counts.entry(key).or_insert_with(|| {
                order += 1;
                (
                    order,
                    Appearance {
                        isin: stock.isin.clone(),
                        stock_name: stock.stock_name.clone(),
                        count: 0,
                    },
                )
            });
            slot.1.count += 1;
        }
    }

    let mut ranked: Vec<(usize, Appearance)> = counts.into_values().collect();
    ranked.sort_by(|(a_first, a), (b_first, b)| {
        b.count.cmp(&a.count).then(a_first.cmp(b_first))
    });

    ranked
        .into_iter()
        .take(k)
        .map(|(_, appearance)| appearance)
        .collect()
}

/// Repeat top performers and underperformers, `HIGHLIGHT_COUNT` each.
pub fn highlights(rankings: &[MonthlyRanking]) -> (Vec<Appearance>, Vec<Appearance>) {
    (
        most_frequent(rankings, RankingSide::Top, HIGHLIGHT_COUNT),
        most_frequent(rankings, RankingSide::Bottom, HIGHLIGHT_COUNT),
    )
}
