//! Trend/momentum labels from recent versus lookback averages.

use crate::stats::{mean, trailing_window};
use crate::types::StockPerformanceRecord;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Months in the "recent" average.
const RECENT_MONTHS: usize = 3;

/// Trend label for a stock over a lookback window.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TrendLabel {
    #[serde(rename = "Strong Uptrend")]
    StrongUptrend,
    Improving,
    Stable,
    Sideways,
    Recovering,
    Weakening,
    Downtrend,
    Falling,
    #[serde(rename = "Insufficient Data")]
    InsufficientData,
}

impl TrendLabel {
    pub fn label(&self) -> &'static str {
        match self {
            TrendLabel::StrongUptrend => "Strong Uptrend",
            TrendLabel::Improving => "Improving",
            TrendLabel::Stable => "Stable",
            TrendLabel::Sideways => "Sideways",
            TrendLabel::Recovering => "Recovering",
            TrendLabel::Weakening => "Weakening",
            TrendLabel::Downtrend => "Downtrend",
            TrendLabel::Falling => "Falling",
            TrendLabel::InsufficientData => "Insufficient Data",
        }
    }
}

impl fmt::Display for TrendLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Averages a trend label is decided from.
#[derive(Debug, Clone, Copy)]
struct TrendInputs {
    recent: f64,
    diff: f64,
}

type TrendRule = (fn(&TrendInputs) -> bool, TrendLabel);

/// Ordered ladder; the first matching predicate wins.
const TREND_RULES: [TrendRule; 8] = [
    (
        |t: &TrendInputs| t.diff > 1.0 && t.recent > 2.0,
        TrendLabel::StrongUptrend,
    ),
    (
        |t: &TrendInputs| t.diff > 0.5 && t.recent > 0.0,
        TrendLabel::Improving,
    ),
    (|t: &TrendInputs| t.diff > 0.5, TrendLabel::Recovering),
    (
        |t: &TrendInputs| t.diff.abs() <= 0.5 && t.recent > 1.0,
        TrendLabel::Stable,
    ),
    (
        |t: &TrendInputs| t.diff.abs() <= 0.5 && t.recent >= -1.0,
        TrendLabel::Sideways,
    ),
    (
        |t: &TrendInputs| t.diff < -1.0 && t.recent < -2.0,
        TrendLabel::Falling,
    ),
    (|t: &TrendInputs| t.recent >= 0.0, TrendLabel::Weakening),
    (|_: &TrendInputs| true, TrendLabel::Downtrend),
];

/// Classify a record's trend over the trailing `period_months`.
pub fn classify_trend(record: &StockPerformanceRecord, period_months: usize) -> TrendLabel {
    classify_returns(&record.returns(), period_months)
}

/// Classify a raw return series (oldest first) over the trailing `period_months`.
///
/// Compares the mean of the last 3 months with the mean of the whole window.
/// Fewer than 3 months in the window yields `InsufficientData`.
pub fn classify_returns(returns: &[f64], period_months: usize) -> TrendLabel {
    let window = trailing_window(returns, period_months);
    if window.len() < RECENT_MONTHS {
        return TrendLabel::InsufficientData;
    }

    let recent = mean(trailing_window(window, RECENT_MONTHS));
    let inputs = TrendInputs {
        recent,
        diff: recent - mean(window),
    };

    TREND_RULES
        .iter()
        .find(|(applies, _)| applies(&inputs))
        .map(|(_, label)| *label)
        .unwrap_or(TrendLabel::Downtrend)
}
