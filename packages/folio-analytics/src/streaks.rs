//! Streak counting over monthly returns.

use crate::types::StockPerformanceRecord;
use serde::{Deserialize, Serialize};

/// Longest and current runs of same-signed monthly returns.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct StreakSummary {
    /// Longest run of months with return > 0
    pub positive_streak: u32,
    /// Longest run of months with return < 0
    pub negative_streak: u32,
    /// Length of the run ending at the latest month
    pub current_streak: u32,
    /// Whether the current run is positive
    pub is_positive_streak: bool,
}

impl StreakSummary {
    /// Count streaks from returns ordered oldest first.
    ///
    /// A flat month (exactly 0) ends any run; if it is the latest month the
    /// current streak is 0.
    pub fn from_returns(returns: &[f64]) -> Self {
        let mut summary = Self::default();
        let mut run: u32 = 0;
        let mut run_positive = false;

        for &r in returns {
            if r == 0.0 {
                run = 0;
                continue;
            }

            let positive = r > 0.0;
            if run > 0 && positive == run_positive {
                run += 1;
            } else {
                run = 1;
                run_positive = positive;
            }

            if run_positive {
                summary.positive_streak = summary.positive_streak.max(run);
            } else {
                summary.negative_streak = summary.negative_streak.max(run);
            }
        }

        summary.current_streak = run;
        summary.is_positive_streak = run > 0 && run_positive;
        summary
    }

    /// Take the streak fields precomputed on a record.
    pub fn from_record(record: &StockPerformanceRecord) -> Self {
        Self {
            positive_streak: record.positive_streak,
            negative_streak: record.negative_streak,
            current_streak: record.current_streak,
            is_positive_streak: record.is_positive_streak,
        }
    }
}

/// Percent of months with return at or above `threshold` (0 when empty).
pub fn consistency_index(returns: &[f64], threshold: f64) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }
    let hits = returns.iter().filter(|&&r| r >= threshold).count();
    hits as f64 / returns.len() as f64 * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_streaks() {
        let summary = StreakSummary::from_returns(&[1.0, 2.0, 3.0, -1.0, -2.0, 4.0, 5.0]);

        assert_eq!(summary.positive_streak, 3);
        assert_eq!(summary.negative_streak, 2);
        assert_eq!(summary.current_streak, 2);
        assert!(summary.is_positive_streak);
    }

    #[test]
    fn test_current_negative_streak() {
        let summary = StreakSummary::from_returns(&[2.0, -1.0, -1.0, -3.0]);

        assert_eq!(summary.negative_streak, 3);
        assert_eq!(summary.current_streak, 3);
        assert!(!summary.is_positive_streak);
    }

    #[test]
    fn test_flat_month_breaks_streak() {
        let summary = StreakSummary::from_returns(&[1.0, 1.0, 0.0, 1.0]);
        assert_eq!(summary.positive_streak, 2);
        assert_eq!(summary.current_streak, 1);

        let summary = StreakSummary::from_returns(&[1.0, 0.0]);
        assert_eq!(summary.current_streak, 0);
        assert!(!summary.is_positive_streak);
    }

    #[test]
    fn test_empty() {
        assert_eq!(StreakSummary::from_returns(&[]), StreakSummary::default());
        assert_eq!(consistency_index(&[], 1.5), 0.0);
    }

    #[test]
    fn test_consistency_index() {
        assert_eq!(consistency_index(&[1.5, 2.0, 1.0, -1.0], 1.5), 50.0);
    }
}
