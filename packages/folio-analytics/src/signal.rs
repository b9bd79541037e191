//! Rule-scored buy/hold/exit signal.
//!
//! A stock starts from a neutral score of 50. Each rule in [`SCORE_RULES`]
//! whose predicate holds adds its fixed delta; rules are independent. The
//! final label comes from [`LABEL_RULES`], an ordered ladder where the first
//! satisfied predicate wins. The thresholds are heuristics, not a fitted model.

use crate::stats::{mean, percentile, std_dev, trailing_window, CONSISTENCY_THRESHOLD};
use crate::streaks::StreakSummary;
use crate::types::StockPerformanceRecord;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Most months of history considered.
pub const MAX_HISTORY_MONTHS: usize = 36;

/// Fewer observations than this yields a neutral `Hold`.
pub const MIN_HISTORY_MONTHS: usize = 6;

/// Score every stock starts from.
pub const NEUTRAL_SCORE: f64 = 50.0;

/// Standard deviation (percent) above which a stock is in a high-volatility regime.
pub const HIGH_VOLATILITY_STD: f64 = 8.0;

/// Trading signal label.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Signal {
    #[serde(rename = "Strong Buy")]
    StrongBuy,
    #[serde(rename = "Continue Hold")]
    ContinueHold,
    Hold,
    Monitor,
    #[serde(rename = "Consider Exit")]
    ConsiderExit,
    Exit,
    #[serde(rename = "Potential Buy")]
    PotentialBuy,
}

impl Signal {
    pub fn label(&self) -> &'static str {
        match self {
            Signal::StrongBuy => "Strong Buy",
            Signal::ContinueHold => "Continue Hold",
            Signal::Hold => "Hold",
            Signal::Monitor => "Monitor",
            Signal::ConsiderExit => "Consider Exit",
            Signal::Exit => "Exit",
            Signal::PotentialBuy => "Potential Buy",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Inputs to the signal classifier.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalInput {
    /// Monthly returns in percent, oldest first, current month last
    pub history: Vec<f64>,
    pub current_return: f64,
    pub previous_return: f64,
    /// Length of the run ending at the current month
    pub streak_length: u32,
    /// Whether that run is positive
    pub streak_positive: bool,
}

impl SignalInput {
    /// Build the classifier input from a performance record.
    ///
    /// Uses the last 36 months. Streak fields come from the record's
    /// precomputed aggregates, or are counted from the returns when the
    /// record carries none.
    pub fn from_record(record: &StockPerformanceRecord) -> Self {
        let returns = record.returns();
        let history = trailing_window(&returns, MAX_HISTORY_MONTHS).to_vec();

        let streak = if record.current_streak > 0 {
            StreakSummary::from_record(record)
        } else {
            StreakSummary::from_returns(&returns)
        };

        Self {
            history,
            current_return: record.current_return(),
            previous_return: record.previous_return(),
            streak_length: streak.current_streak,
            streak_positive: streak.is_positive_streak,
        }
    }
}

/// Descriptive statistics the rules are evaluated against.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SignalMetrics {
    pub observations: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    /// Standard score of the current return (0 when std-dev is 0)
    pub z_score: f64,
    pub avg_3m: f64,
    pub avg_6m: f64,
    pub avg_12m: f64,
    /// 3-month average minus 6-month average
    pub momentum_short: f64,
    /// 6-month average minus 12-month average
    pub momentum_long: f64,
    /// Current return minus previous return
    pub month_change: f64,
    /// Mean over std-dev (0 when std-dev is 0)
    pub sharpe_like: f64,
    /// Share of months with return > 0
    pub positive_ratio: f64,
    /// Share of months with return >= 1.5%
    pub above_threshold_ratio: f64,
    /// Estimated chance the current extreme reverts next month
    pub mean_reversion_probability: f64,
}

impl SignalMetrics {
    /// Compute metrics over the input history.
    pub fn compute(input: &SignalInput) -> Self {
        let history = &input.history;
        let n = history.len();
        if n == 0 {
            return Self {
                mean_reversion_probability: 0.5,
                ..Default::default()
            };
        }

        let mean_ret = mean(history);
        let std = std_dev(history);
        let p25 = percentile(history, 25.0);
        let p75 = percentile(history, 75.0);

        let z_score = if std > 0.0 {
            (input.current_return - mean_ret) / std
        } else {
            0.0
        };
        let avg_3m = mean(trailing_window(history, 3));
        let avg_6m = mean(trailing_window(history, 6));
        let avg_12m = mean(trailing_window(history, 12));

        let positive = history.iter().filter(|&&r| r > 0.0).count();
        let above = history
            .iter()
            .filter(|&&r| r >= CONSISTENCY_THRESHOLD)
            .count();

        Self {
            observations: n,
            mean: mean_ret,
            std_dev: std,
            p25,
            p50: percentile(history, 50.0),
            p75,
            z_score,
            avg_3m,
            avg_6m,
            avg_12m,
            momentum_short: avg_3m - avg_6m,
            momentum_long: avg_6m - avg_12m,
            month_change: input.current_return - input.previous_return,
            sharpe_like: if std > 0.0 { mean_ret / std } else { 0.0 },
            positive_ratio: positive as f64 / n as f64,
            above_threshold_ratio: above as f64 / n as f64,
            mean_reversion_probability: mean_reversion_probability(
                history,
                input.current_return > mean_ret,
                p25,
                p75,
            ),
        }
    }
}

/// Share of past extremes on the current side of the mean that moved back next month.
///
/// Above the mean: months above p75 followed by a lower month. At or below:
/// months below p25 followed by a higher month. No such months yields 0.5.
fn mean_reversion_probability(history: &[f64], above_mean: bool, p25: f64, p75: f64) -> f64 {
    let mut extremes = 0usize;
    let mut reverted = 0usize;

    for pair in history.windows(2) {
        let (this, next) = (pair[0], pair[1]);
        let (is_extreme, did_revert) = if above_mean {
            (this > p75, next < this)
        } else {
            (this < p25, next > this)
        };

        if is_extreme {
            extremes += 1;
            if did_revert {
                reverted += 1;
            }
        }
    }

    if extremes == 0 {
        return 0.5;
    }
    reverted as f64 / extremes as f64
}

/// Everything the score and label rules look at.
#[derive(Debug, Clone, Copy)]
pub struct SignalContext {
    pub metrics: SignalMetrics,
    pub current_return: f64,
    pub streak_length: u32,
    pub streak_positive: bool,
    /// Accumulated score (only meaningful to label rules)
    pub score: f64,
    pub uptrend: bool,
    pub high_volatility: bool,
    pub extreme_losing_streak: bool,
}

impl SignalContext {
    fn new(input: &SignalInput, metrics: SignalMetrics) -> Self {
        Self {
            metrics,
            current_return: input.current_return,
            streak_length: input.streak_length,
            streak_positive: input.streak_positive,
            score: NEUTRAL_SCORE,
            uptrend: metrics.avg_3m > metrics.avg_12m && metrics.avg_3m > 0.0,
            high_volatility: metrics.std_dev > HIGH_VOLATILITY_STD,
            extreme_losing_streak: !input.streak_positive && input.streak_length >= 4,
        }
    }

    fn positive_streak(&self) -> u32 {
        if self.streak_positive {
            self.streak_length
        } else {
            0
        }
    }

    fn negative_streak(&self) -> u32 {
        if self.streak_positive {
            0
        } else {
            self.streak_length
        }
    }
}

/// An additive score adjustment.
#[derive(Clone, Copy)]
pub struct ScoreRule {
    pub name: &'static str,
    pub applies: fn(&SignalContext) -> bool,
    pub delta: f64,
}

/// A label chosen when its predicate is the first to hold.
#[derive(Clone, Copy)]
pub struct LabelRule {
    pub applies: fn(&SignalContext) -> bool,
    pub signal: Signal,
}

/// Score adjustments, evaluated in order.
pub const SCORE_RULES: [ScoreRule; 20] = [
    // Current month magnitude
    ScoreRule {
        name: "strong_month",
        applies: |c| c.current_return > 5.0,
        delta: 10.0,
    },
    ScoreRule {
        name: "positive_month",
        applies: |c| c.current_return > 0.0 && c.current_return <= 5.0,
        delta: 5.0,
    },
    ScoreRule {
        name: "negative_month",
        applies: |c| c.current_return < 0.0 && c.current_return >= -5.0,
        delta: -5.0,
    },
    ScoreRule {
        name: "severe_month",
        applies: |c| c.current_return < -5.0,
        delta: -10.0,
    },
    // Momentum
    ScoreRule {
        name: "momentum_up",
        applies: |c| c.metrics.momentum_short > 0.0,
        delta: 5.0,
    },
    ScoreRule {
        name: "momentum_accelerating",
        applies: |c| c.metrics.momentum_short > 1.0 && c.metrics.momentum_long > 0.0,
        delta: 5.0,
    },
    ScoreRule {
        name: "momentum_down",
        applies: |c| c.metrics.momentum_short < 0.0,
        delta: -5.0,
    },
    ScoreRule {
        name: "momentum_collapsing",
        applies: |c| c.metrics.momentum_short < -1.0 && c.metrics.momentum_long < 0.0,
        delta: -5.0,
    },
    // Consistency
    ScoreRule {
        name: "consistent_gains",
        applies: |c| c.metrics.positive_ratio >= 0.6,
        delta: 10.0,
    },
    ScoreRule {
        name: "frequent_losses",
        applies: |c| c.metrics.positive_ratio < 0.4,
        delta: -10.0,
    },
    ScoreRule {
        name: "above_threshold",
        applies: |c| c.metrics.above_threshold_ratio >= 0.5,
        delta: 5.0,
    },
    // Overextension and mean reversion
    ScoreRule {
        name: "overextended",
        applies: |c| c.metrics.z_score > 2.0,
        delta: -10.0,
    },
    ScoreRule {
        name: "oversold",
        applies: |c| c.metrics.z_score < -2.0,
        delta: 5.0,
    },
    ScoreRule {
        name: "reversion_down",
        applies: |c| c.metrics.mean_reversion_probability > 0.7 && c.metrics.z_score > 1.0,
        delta: -5.0,
    },
    ScoreRule {
        name: "reversion_up",
        applies: |c| c.metrics.mean_reversion_probability > 0.7 && c.metrics.z_score < -1.0,
        delta: 5.0,
    },
    // Streaks
    ScoreRule {
        name: "winning_streak",
        applies: |c| c.positive_streak() >= 3,
        delta: 5.0,
    },
    ScoreRule {
        name: "stretched_streak",
        applies: |c| c.positive_streak() >= 6,
        delta: -5.0,
    },
    ScoreRule {
        name: "losing_streak",
        applies: |c| c.negative_streak() >= 3,
        delta: -10.0,
    },
    // Risk-adjusted return
    ScoreRule {
        name: "risk_adjusted_strong",
        applies: |c| c.metrics.sharpe_like > 0.5,
        delta: 5.0,
    },
    ScoreRule {
        name: "risk_adjusted_weak",
        applies: |c| c.metrics.sharpe_like < 0.0,
        delta: -5.0,
    },
];

/// Label ladder; the first satisfied rule wins.
pub const LABEL_RULES: [LabelRule; 8] = [
    LabelRule {
        applies: |c| c.score >= 75.0 && c.uptrend && !c.high_volatility,
        signal: Signal::StrongBuy,
    },
    LabelRule {
        applies: |c| c.score >= 65.0 && c.uptrend,
        signal: Signal::ContinueHold,
    },
    LabelRule {
        applies: |c| {
            c.extreme_losing_streak
                && c.metrics.z_score < -1.5
                && c.metrics.mean_reversion_probability >= 0.6
        },
        signal: Signal::PotentialBuy,
    },
    LabelRule {
        applies: |c| c.score <= 25.0 && !c.uptrend,
        signal: Signal::Exit,
    },
    LabelRule {
        applies: |c| c.score <= 35.0,
        signal: Signal::ConsiderExit,
    },
    LabelRule {
        applies: |c| c.high_volatility && c.score < 50.0,
        signal: Signal::Monitor,
    },
    LabelRule {
        applies: |c| c.score >= 50.0,
        signal: Signal::Hold,
    },
    LabelRule {
        applies: |_| true,
        signal: Signal::Monitor,
    },
];

/// Result of classifying one stock.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SignalAssessment {
    pub signal: Signal,
    pub score: f64,
    pub metrics: SignalMetrics,
    /// Names of score rules that fired, in evaluation order
    pub fired_rules: Vec<String>,
    /// Set when history was too short and the neutral fallback was used
    pub insufficient_data: bool,
}

/// Classify a stock from its return history.
///
/// Fewer than 6 observations yields `Hold` with the neutral score.
pub fn assess_signal(input: &SignalInput) -> SignalAssessment {
    let metrics = SignalMetrics::compute(input);

    if input.history.len() < MIN_HISTORY_MONTHS {
        return SignalAssessment {
            signal: Signal::Hold,
            score: NEUTRAL_SCORE,
            metrics,
            fired_rules: Vec::new(),
            insufficient_data: true,
        };
    }

    let mut context = SignalContext::new(input, metrics);
    let mut fired_rules = Vec::new();

    for rule in SCORE_RULES.iter() {
        if (rule.applies)(&context) {
            context.score += rule.delta;
            fired_rules.push(rule.name.to_string());
        }
    }

    let signal = LABEL_RULES
        .iter()
        .find(|rule| (rule.applies)(&context))
        .map(|rule| rule.signal)
        .unwrap_or(Signal::Monitor);

    SignalAssessment {
        signal,
        score: context.score,
        metrics,
        fired_rules,
        insufficient_data: false,
    }
}
