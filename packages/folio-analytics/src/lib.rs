//! Folio Analytics - Derived metrics for portfolio dashboards.
//!
//! This crate turns monthly return series and holdings fetched from an
//! analytics API into the rows a dashboard renders:
//!
//! - **Period statistics**: CAGR, volatility, Sharpe ratio, consistency
//! - **Trend labels**: recent momentum against the lookback window
//! - **Signals**: rule-scored Strong Buy / Hold / Exit style classification
//! - **Leaderboards**: holdings joined to performance, deduplicated and ranked
//! - **Filters**: bucketed signal filtering with draft/applied state and paging
//!
//! Metric functions never fail: empty or short inputs degrade to zero or
//! neutral values.
//!
//! # Example
//!
//! ```rust
//! use folio_analytics::{stats::PeriodStats, MonthlyReturn};
//!
//! let series: Vec<MonthlyReturn> = (1..=12)
//!     .map(|m| MonthlyReturn::new(&format!("2024-{:02}", m), 2.0))
//!     .collect();
//!
//! let stats = PeriodStats::compute(&series, 12);
//! assert_eq!(stats.consistency, "12 / 12");
//! assert!(stats.volatility.abs() < 1e-12);
//! ```

pub mod config;
pub mod consistency;
pub mod filters;
pub mod leaderboard;
pub mod signal;
pub mod stats;
pub mod streaks;
pub mod trend;
pub mod types;

// Re-export commonly used types
pub use types::{ApiResponse, HoldingRecord, MonthlyReturn, MonthlyVolume, StockPerformanceRecord};

// Re-export main functionality
pub use config::{EngineConfig, StatsConfig};
pub use consistency::{monthly_rankings, most_frequent, MonthlyRanking};
pub use filters::{
    apply_filters, paginate, AppliedFilters, DraftFilters, FilterCriteria, FilterState, Page,
    RangeBucket, SignalCategory, SignalRecord,
};
pub use leaderboard::{build_leaderboard, normalize_name, HoldingMatcher, LeaderboardEntry};
pub use signal::{assess_signal, Signal, SignalAssessment, SignalInput, SignalMetrics};
pub use stats::{average_return, cagr, consistency, sharpe_ratio, volatility, PeriodStats};
pub use streaks::{consistency_index, StreakSummary};
pub use trend::{classify_trend, TrendLabel};

/// Error types for folio-analytics operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Config serialization error: {0}")]
    ConfigWrite(#[from] toml::ser::Error),

    #[error("Invalid bucket: {0}")]
    InvalidBucket(String),
}

/// Result type for folio-analytics operations.
pub type Result<T> = std::result::Result<T, Error>;
