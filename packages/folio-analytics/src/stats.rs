//! Period-windowed return statistics.
//!
//! All inputs are monthly returns in percent (2.0 means +2%). Every function
//! tolerates empty or short series and returns zero rather than failing.

use crate::config::StatsConfig;
use crate::types::MonthlyReturn;
use serde::{Deserialize, Serialize};

/// Annual risk-free rate in percent used by the Sharpe ratio.
pub const RISK_FREE_RATE: f64 = 7.5;

/// Monthly return (percent) at or above which a month counts as consistent.
pub const CONSISTENCY_THRESHOLD: f64 = 1.5;

/// Statistics for one lookback window.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PeriodStats {
    /// Requested lookback in months
    pub period_months: usize,
    /// Months actually present in the window
    pub months: usize,
    /// Compound annual growth rate in percent
    pub cagr: f64,
    /// Population standard deviation of monthly returns
    pub volatility: f64,
    /// Annualized excess return per unit of annualized volatility
    pub sharpe: f64,
    /// Arithmetic mean monthly return
    pub average_return: f64,
    /// Months at or above the consistency threshold
    pub consistent_months: usize,
    /// `"k / n"` rendering of consistent months
    pub consistency: String,
}

impl PeriodStats {
    /// Compute all window statistics with the default constants.
    pub fn compute(series: &[MonthlyReturn], period_months: usize) -> Self {
        Self::compute_with(series, period_months, &StatsConfig::default())
    }

    /// Compute all window statistics with configurable constants.
    pub fn compute_with(
        series: &[MonthlyReturn],
        period_months: usize,
        config: &StatsConfig,
    ) -> Self {
        let window = window_returns(series, period_months);
        let cagr = cagr_of(&window);
        let volatility = std_dev(&window);
        let consistent_months = count_at_or_above(&window, config.consistency_threshold);

        Self {
            period_months,
            months: window.len(),
            cagr,
            volatility,
            sharpe: sharpe_of(cagr, volatility, config.risk_free_rate),
            average_return: mean(&window),
            consistent_months,
            consistency: format!("{} / {}", consistent_months, window.len()),
        }
    }

    /// Zero-valued statistics for a stock with no return history.
    pub fn empty(period_months: usize) -> Self {
        Self::compute(&[], period_months)
    }
}

/// The trailing `period_months` entries of a series (all of it if shorter).
pub fn trailing_window<T>(series: &[T], period_months: usize) -> &[T] {
    let start = series.len().saturating_sub(period_months);
    &series[start..]
}

/// Compound annual growth rate over the trailing window, in percent.
///
/// Monthly returns are compounded multiplicatively and annualized with
/// exponent `12 / n`. An empty window yields 0.
pub fn cagr(series: &[MonthlyReturn], period_months: usize) -> f64 {
    cagr_of(&window_returns(series, period_months))
}

/// Population standard deviation of the window's monthly returns.
pub fn volatility(series: &[MonthlyReturn], period_months: usize) -> f64 {
    std_dev(&window_returns(series, period_months))
}

/// Sharpe ratio over the trailing window.
///
/// `(cagr - risk_free) / (volatility * sqrt(12))`; zero volatility yields 0.
pub fn sharpe_ratio(series: &[MonthlyReturn], period_months: usize) -> f64 {
    sharpe_ratio_with(series, period_months, RISK_FREE_RATE)
}

/// Sharpe ratio with an explicit annual risk-free rate in percent.
pub fn sharpe_ratio_with(
    series: &[MonthlyReturn],
    period_months: usize,
    risk_free_rate: f64,
) -> f64 {
    let window = window_returns(series, period_months);
    sharpe_of(cagr_of(&window), std_dev(&window), risk_free_rate)
}

/// Consistency as `"k / n"`: months with return >= 1.5% out of the window size.
pub fn consistency(series: &[MonthlyReturn], period_months: usize) -> String {
    let window = window_returns(series, period_months);
    format!(
        "{} / {}",
        count_at_or_above(&window, CONSISTENCY_THRESHOLD),
        window.len()
    )
}

/// Arithmetic mean monthly return over the window.
///
/// Distinct from CAGR: the arithmetic mean is never below the geometric one.
pub fn average_return(series: &[MonthlyReturn], period_months: usize) -> f64 {
    mean(&window_returns(series, period_months))
}

/// Arithmetic mean (0 for empty input).
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation (0 for empty input).
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Percentile with linear interpolation between closest ranks.
///
/// # Arguments
///
/// * `values` - Sample, any order
/// * `pct` - Percentile in `[0, 100]`
///
/// # Returns
///
/// The interpolated value, or 0 for an empty sample.
pub fn percentile(values: &[f64], pct: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let rank = (pct.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;

    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

fn window_returns(series: &[MonthlyReturn], period_months: usize) -> Vec<f64> {
    trailing_window(series, period_months)
        .iter()
        .map(|m| m.return_pct)
        .collect()
}

fn cagr_of(window: &[f64]) -> f64 {
    if window.is_empty() {
        return 0.0;
    }

    let total_return = window.iter().fold(1.0, |acc, r| acc * (1.0 + r / 100.0));
    let exponent = 12.0 / window.len() as f64;

    (total_return.powf(exponent) - 1.0) * 100.0
}

fn sharpe_of(cagr: f64, volatility: f64, risk_free_rate: f64) -> f64 {
    let annualized_vol = volatility * 12.0_f64.sqrt();
    if annualized_vol <= 0.0 {
        return 0.0;
    }
    (cagr - risk_free_rate) / annualized_vol
}

fn count_at_or_above(window: &[f64], threshold: f64) -> usize {
    window.iter().filter(|&&r| r >= threshold).count()
}
