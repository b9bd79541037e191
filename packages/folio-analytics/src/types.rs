//! Input record shapes consumed from the analytics API.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// One month of percentage return for a stock.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MonthlyReturn {
    /// Month label, e.g. `2024-03` or `Mar 2024`
    pub month: String,
    /// Return for the month in percent (2.5 means +2.5%)
    #[serde(rename = "return")]
    pub return_pct: f64,
}

impl MonthlyReturn {
    /// Create a new monthly return.
    pub fn new(month: &str, return_pct: f64) -> Self {
        Self {
            month: month.to_string(),
            return_pct,
        }
    }

    /// First day of the labelled month, if the label is in a known format.
    ///
    /// Accepts `YYYY-MM`, `YYYY-MM-DD` and `Mon YYYY`.
    pub fn month_start(&self) -> Option<NaiveDate> {
        parse_month_label(&self.month)
    }
}

/// Average traded volume for one month.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyVolume {
    pub month: String,
    pub avg_volume: f64,
}

/// Per-stock performance history with the API's precomputed aggregates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StockPerformanceRecord {
    pub isin: String,
    pub stock_name: String,
    /// Monthly returns, oldest first
    #[serde(default)]
    pub monthly_returns: Vec<MonthlyReturn>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_volumes: Option<Vec<MonthlyVolume>>,
    #[serde(default)]
    pub average_return: f64,
    #[serde(default)]
    pub volatility: f64,
    #[serde(default)]
    pub consistency_index: f64,
    #[serde(default)]
    pub positive_streak: u32,
    #[serde(default)]
    pub negative_streak: u32,
    #[serde(default)]
    pub current_streak: u32,
    #[serde(default)]
    pub is_positive_streak: bool,
}

impl StockPerformanceRecord {
    /// Create a record from a return series, leaving aggregates zeroed.
    pub fn new(isin: &str, stock_name: &str, monthly_returns: Vec<MonthlyReturn>) -> Self {
        Self {
            isin: isin.to_string(),
            stock_name: stock_name.to_string(),
            monthly_returns,
            monthly_volumes: None,
            average_return: 0.0,
            volatility: 0.0,
            consistency_index: 0.0,
            positive_streak: 0,
            negative_streak: 0,
            current_streak: 0,
            is_positive_streak: false,
        }
    }

    /// Raw percentage returns, oldest first.
    pub fn returns(&self) -> Vec<f64> {
        self.monthly_returns.iter().map(|m| m.return_pct).collect()
    }

    /// Latest month's return (0 when there is no history).
    pub fn current_return(&self) -> f64 {
        self.monthly_returns
            .last()
            .map(|m| m.return_pct)
            .unwrap_or(0.0)
    }

    /// Second-latest month's return (0 when unavailable).
    pub fn previous_return(&self) -> f64 {
        let n = self.monthly_returns.len();
        if n < 2 {
            return 0.0;
        }
        self.monthly_returns[n - 2].return_pct
    }

    /// Sort the return series chronologically.
    ///
    /// Labels that cannot be parsed go after parsable ones, in lexical order.
    pub fn sort_by_month(&mut self) {
        let unparsable = self
            .monthly_returns
            .iter()
            .filter(|m| m.month_start().is_none())
            .count();
        if unparsable > 0 {
            tracing::warn!(
                "{} month label(s) for {} could not be parsed as dates",
                unparsable,
                self.isin
            );
        }

        self.monthly_returns
            .sort_by(|a, b| compare_month_labels(&a.month, &b.month));
    }

    /// Latest month's average volume relative to the mean of prior months.
    ///
    /// Returns 0 when there are fewer than two months or the prior mean is not positive.
    pub fn volume_spike(&self) -> f64 {
        let volumes = match &self.monthly_volumes {
            Some(v) if v.len() >= 2 => v,
            _ => return 0.0,
        };

        let (latest, prior) = match volumes.split_last() {
            Some(split) => split,
            None => return 0.0,
        };
        let prior_mean = prior.iter().map(|v| v.avg_volume).sum::<f64>() / prior.len() as f64;

        if prior_mean <= 0.0 {
            return 0.0;
        }
        latest.avg_volume / prior_mean
    }
}

/// A portfolio holding as supplied by the holdings upload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct HoldingRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isin: Option<String>,
    pub stock_name: String,
    #[serde(default)]
    pub market_value: f64,
    #[serde(default)]
    pub investment_amount: f64,
    #[serde(default)]
    pub profit_loss_till_date_percent: f64,
    #[serde(default)]
    pub profit_loss_till_date: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub holding_period_years: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub holding_period_months: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub as_on_date: Option<String>,
}

impl HoldingRecord {
    /// Create a holding with market value and invested amount; P&L is derived.
    pub fn new(
        isin: Option<&str>,
        stock_name: &str,
        market_value: f64,
        investment_amount: f64,
    ) -> Self {
        let profit_loss_till_date = market_value - investment_amount;
        let profit_loss_till_date_percent = if investment_amount > 0.0 {
            (profit_loss_till_date / investment_amount) * 100.0
        } else {
            0.0
        };

        Self {
            isin: isin.map(str::to_string),
            stock_name: stock_name.to_string(),
            market_value,
            investment_amount,
            profit_loss_till_date_percent,
            profit_loss_till_date,
            ..Default::default()
        }
    }

    /// Trimmed ISIN, or `None` when missing or blank.
    pub fn isin_key(&self) -> Option<&str> {
        self.isin
            .as_deref()
            .map(str::trim)
            .filter(|isin| !isin.is_empty())
    }
}

/// JSON envelope printed by the CLI: `data` on success, `error` otherwise.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Create a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    /// Create an error response.
    pub fn err(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(error.into()),
        }
    }

    /// Wrap a result, rendering the error with its full cause chain.
    pub fn from_result<E: fmt::Display>(result: std::result::Result<T, E>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => Self::err(format!("{:#}", e)),
        }
    }
}

pub(crate) fn parse_month_label(label: &str) -> Option<NaiveDate> {
    let label = label.trim();
    NaiveDate::parse_from_str(label, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(&format!("{}-01", label), "%Y-%m-%d"))
        .or_else(|_| NaiveDate::parse_from_str(&format!("01 {}", label), "%d %b %Y"))
        .ok()
}

pub(crate) fn compare_month_labels(a: &str, b: &str) -> Ordering {
    match (parse_month_label(a), parse_month_label(b)) {
        (Some(da), Some(db)) => da.cmp(&db),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}
