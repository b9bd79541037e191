//! Leaderboard assembly: join performance to holdings, dedupe, rank.
//!
//! Every holding is represented at most once, and holdings sharing an ISIN
//! collapse into the first of them. Performance records that match
//! no holding are dropped with a warning rather than shown.

use crate::config::StatsConfig;
use crate::stats::PeriodStats;
use crate::trend::{classify_returns, TrendLabel};
use crate::types::{HoldingRecord, StockPerformanceRecord};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

/// One ranked row of the leaderboard.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    /// 1-based rank after sorting
    pub rank: usize,
    pub isin: String,
    pub stock_name: String,
    pub cagr: f64,
    pub sharpe: f64,
    pub volatility: f64,
    pub average_return: f64,
    pub consistency: String,
    /// Latest monthly return
    pub current_return: f64,
    pub trend: TrendLabel,
    /// Share of the leaderboard's total market value, in percent
    pub weightage_percent: f64,
    /// False for placeholder rows synthesized from a holding alone
    pub has_performance: bool,
    pub holding: HoldingRecord,
}

/// Lowercase a stock name and drop everything but letters and digits.
pub fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Two-stage lookup: exact ISIN first, then normalized name.
#[derive(Debug)]
pub struct HoldingMatcher<'a> {
    holdings: &'a [HoldingRecord],
    by_isin: HashMap<String, usize>,
    by_name: HashMap<String, usize>,
}

impl<'a> HoldingMatcher<'a> {
    /// Index holdings. When keys collide, the first holding wins.
    pub fn new(holdings: &'a [HoldingRecord]) -> Self {
        let mut by_isin = HashMap::new();
        let mut by_name = HashMap::new();

        for (idx, holding) in holdings.iter().enumerate() {
            if let Some(isin) = holding.isin_key() {
                by_isin.entry(isin.to_string()).or_insert(idx);
            }
            let name = normalize_name(&holding.stock_name);
            if !name.is_empty() {
                by_name.entry(name).or_insert(idx);
            }
        }

        Self {
            holdings,
            by_isin,
            by_name,
        }
    }

    /// Index of the holding matching an ISIN or, failing that, a name.
    pub fn find_index(&self, isin: &str, stock_name: &str) -> Option<usize> {
        let isin = isin.trim();
        if !isin.is_empty() {
            if let Some(&idx) = self.by_isin.get(isin) {
                return Some(idx);
            }
        }

        let name = normalize_name(stock_name);
        if name.is_empty() {
            return None;
        }
        self.by_name.get(&name).copied()
    }

    /// The holding matching an ISIN or, failing that, a name.
    pub fn find(&self, isin: &str, stock_name: &str) -> Option<&'a HoldingRecord> {
        self.find_index(isin, stock_name)
            .map(|idx| &self.holdings[idx])
    }
}

/// A row before orphan removal and ranking.
struct Candidate {
    isin: String,
    stock_name: String,
    stats: PeriodStats,
    current_return: f64,
    trend: TrendLabel,
    has_performance: bool,
    holding: Option<usize>,
}

impl Candidate {
    fn dedupe_key(&self) -> String {
        if self.isin.is_empty() {
            format!("name:{}", normalize_name(&self.stock_name))
        } else {
            self.isin.clone()
        }
    }
}

/// Build a ranked leaderboard with the default statistics constants.
pub fn build_leaderboard(
    records: &[StockPerformanceRecord],
    holdings: &[HoldingRecord],
    period_months: usize,
) -> Vec<LeaderboardEntry> {
    build_leaderboard_with(records, holdings, period_months, &StatsConfig::default())
}

/// Build a ranked leaderboard.
///
/// # Arguments
///
/// * `records` - Performance records from the analytics API
/// * `holdings` - Portfolio holdings
/// * `period_months` - Lookback window for CAGR, Sharpe and the rest
/// * `config` - Statistics constants
///
/// # Returns
///
/// One entry per holding, sorted by CAGR descending. Entries with a CAGR of
/// exactly 0 come last, ordered by current return descending.
pub fn build_leaderboard_with(
    records: &[StockPerformanceRecord],
    holdings: &[HoldingRecord],
    period_months: usize,
    config: &StatsConfig,
) -> Vec<LeaderboardEntry> {
    let matcher = HoldingMatcher::new(holdings);
    let mut matched = vec![false; holdings.len()];
    let mut candidates = Vec::with_capacity(records.len() + holdings.len());

    for record in records {
        let holding = matcher.find_index(&record.isin, &record.stock_name);
        if let Some(idx) = holding {
            matched[idx] = true;
        }

        // Rows carry the holding's ISIN so the board's ISIN set is the holdings'
        let isin = holding
            .and_then(|idx| holdings[idx].isin_key())
            .unwrap_or_else(|| record.isin.trim())
            .to_string();

        candidates.push(Candidate {
            isin,
            stock_name: record.stock_name.clone(),
            stats: PeriodStats::compute_with(&record.monthly_returns, period_months, config),
            current_return: record.current_return(),
            trend: classify_returns(&record.returns(), period_months),
            has_performance: true,
            holding,
        });
    }

    for (idx, holding) in holdings.iter().enumerate() {
        if matched[idx] {
            continue;
        }
        candidates.push(Candidate {
            isin: holding.isin_key().unwrap_or_default().to_string(),
            stock_name: holding.stock_name.clone(),
            stats: PeriodStats::empty(period_months),
            current_return: 0.0,
            trend: TrendLabel::InsufficientData,
            has_performance: false,
            holding: Some(idx),
        });
    }

    let mut rows: Vec<(Candidate, usize)> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        match candidate.holding {
            Some(idx) => rows.push((candidate, idx)),
            None => tracing::warn!(
                "Dropping {} ({}) from leaderboard: no matching holding",
                candidate.isin,
                candidate.stock_name
            ),
        }
    }

    // One row per holding, and one per ISIN (or name when the ISIN is empty)
    let mut seen_holdings = HashSet::new();
    let mut seen_keys = HashSet::new();
    rows.retain(|(c, idx)| {
        let key = c.dedupe_key();
        if seen_holdings.contains(idx) || seen_keys.contains(&key) {
            return false;
        }
        seen_holdings.insert(*idx);
        seen_keys.insert(key);
        true
    });

    let mut rows: Vec<(Candidate, &HoldingRecord)> = rows
        .into_iter()
        .map(|(c, idx)| (c, &holdings[idx]))
        .collect();

    rows.sort_by(|(a, _), (b, _)| compare_rows(a, b));

    let total_value: f64 = rows.iter().map(|(_, h)| h.market_value).sum();

    let entries: Vec<LeaderboardEntry> = rows
        .into_iter()
        .enumerate()
        .map(|(i, (c, holding))| LeaderboardEntry {
            rank: i + 1,
            isin: c.isin,
            stock_name: c.stock_name,
            cagr: c.stats.cagr,
            sharpe: c.stats.sharpe,
            volatility: c.stats.volatility,
            average_return: c.stats.average_return,
            consistency: c.stats.consistency,
            current_return: c.current_return,
            trend: c.trend,
            weightage_percent: if total_value > 0.0 {
                holding.market_value / total_value * 100.0
            } else {
                0.0
            },
            has_performance: c.has_performance,
            holding: holding.clone(),
        })
        .collect();

    tracing::debug!(
        "Built leaderboard with {} rows from {} records and {} holdings",
        entries.len(),
        records.len(),
        holdings.len()
    );

    entries
}

fn compare_rows(a: &Candidate, b: &Candidate) -> Ordering {
    let a_empty = a.stats.cagr == 0.0;
    let b_empty = b.stats.cagr == 0.0;

    match (a_empty, b_empty) {
        (false, false) => b
            .stats
            .cagr
            .partial_cmp(&a.stats.cagr)
            .unwrap_or(Ordering::Equal),
        (true, true) => b
            .current_return
            .partial_cmp(&a.current_return)
            .unwrap_or(Ordering::Equal),
        (false, true) => Ordering::Less,
        (true, false) => Ordering::Greater,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MonthlyReturn;

    fn record(isin: &str, name: &str, returns: &[f64]) -> StockPerformanceRecord {
        let monthly = returns
            .iter()
            .enumerate()
            .map(|(i, r)| MonthlyReturn::new(&format!("2024-{:02}", i + 1), *r))
            .collect();
        StockPerformanceRecord::new(isin, name, monthly)
    }

    fn holding(isin: Option<&str>, name: &str, value: f64) -> HoldingRecord {
        HoldingRecord::new(isin, name, value, value * 0.8)
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("Tata Motors Ltd."), "tatamotorsltd");
        assert_eq!(normalize_name("  TATA-MOTORS  LTD "), "tatamotorsltd");
        assert_eq!(normalize_name("..."), "");
    }

    #[test]
    fn test_matcher_isin_then_name() {
        let holdings = vec![
            holding(Some("INE1"), "Alpha Industries", 100.0),
            holding(None, "Beta & Co.", 100.0),
        ];
        let matcher = HoldingMatcher::new(&holdings);

        assert_eq!(matcher.find_index("INE1", "whatever"), Some(0));
        assert_eq!(matcher.find_index("INE9", "BETA AND CO"), None);
        assert_eq!(matcher.find_index("INE9", "beta & co"), Some(1));
        assert_eq!(matcher.find_index("", "Alpha-Industries"), Some(0));
        assert!(matcher.find("", "Gamma").is_none());
    }

    #[test]
    fn test_ranks_by_cagr() {
        let records = vec![
            record("INE1", "Alpha", &[1.0, 1.0, 1.0]),
            record("INE2", "Beta", &[3.0, 3.0, 3.0]),
        ];
        let holdings = vec![
            holding(Some("INE1"), "Alpha", 300.0),
            holding(Some("INE2"), "Beta", 100.0),
        ];

        let board = build_leaderboard(&records, &holdings, 12);

        assert_eq!(board.len(), 2);
        assert_eq!(board[0].isin, "INE2");
        assert_eq!(board[0].rank, 1);
        assert_eq!(board[1].isin, "INE1");
        assert_eq!(board[1].rank, 2);
        assert!((board[0].weightage_percent - 25.0).abs() < 1e-9);
        assert!((board[1].weightage_percent - 75.0).abs() < 1e-9);
    }

    #[test]
    fn test_name_fallback_adopts_holding_isin() {
        let records = vec![record("", "Tata Motors Ltd.", &[2.0, 2.0, 2.0])];
        let holdings = vec![holding(Some("INE155A01022"), "TATA MOTORS LTD", 100.0)];

        let board = build_leaderboard(&records, &holdings, 12);

        assert_eq!(board.len(), 1);
        assert_eq!(board[0].isin, "INE155A01022");
        assert!(board[0].has_performance);
    }

    #[test]
    fn test_name_match_prefers_holding_isin() {
        let records = vec![record("INE-STALE", "Alpha", &[2.0, 2.0, 2.0])];
        let holdings = vec![holding(Some("INE1"), "Alpha", 100.0)];

        let board = build_leaderboard(&records, &holdings, 12);

        assert_eq!(board.len(), 1);
        assert_eq!(board[0].isin, "INE1");
    }

    #[test]
    fn test_placeholder_for_unmatched_holding() {
        let records = vec![record("INE1", "Alpha", &[1.0, 2.0, -0.5])];
        let holdings = vec![
            holding(Some("INE1"), "Alpha", 100.0),
            holding(Some("INE2"), "Beta", 100.0),
        ];

        let board = build_leaderboard(&records, &holdings, 12);

        assert_eq!(board.len(), 2);
        let beta = &board[1];
        assert_eq!(beta.isin, "INE2");
        assert!(!beta.has_performance);
        assert_eq!(beta.cagr, 0.0);
        assert_eq!(beta.consistency, "0 / 0");
        assert_eq!(beta.trend, TrendLabel::InsufficientData);
    }

    #[test]
    fn test_orphan_record_dropped() {
        let records = vec![
            record("INE1", "Alpha", &[1.0, 1.0, 1.0]),
            record("INE9", "Ghost", &[9.0, 9.0, 9.0]),
        ];
        let holdings = vec![holding(Some("INE1"), "Alpha", 100.0)];

        let board = build_leaderboard(&records, &holdings, 12);

        assert_eq!(board.len(), 1);
        assert_eq!(board[0].isin, "INE1");
    }

    #[test]
    fn test_duplicate_isin_holdings_single_row() {
        let records = vec![record("INE1", "Alpha", &[1.0, 1.0, 1.0])];
        let holdings = vec![
            holding(Some("INE1"), "Alpha Ltd", 100.0),
            holding(Some("INE1"), "  ALPHA   ltd ", 50.0),
        ];

        let board = build_leaderboard(&records, &holdings, 12);

        assert_eq!(board.len(), 1);
        assert_eq!(board[0].holding.market_value, 100.0);
        assert_eq!(board[0].weightage_percent, 100.0);
    }

    #[test]
    fn test_name_matches_with_different_isins_single_row() {
        let records = vec![
            record("INE5", "Foo Ltd", &[1.0, 1.0, 1.0]),
            record("INE6", "FOO LTD.", &[4.0, 4.0, 4.0]),
        ];
        let holdings = vec![
            holding(None, "Foo Ltd", 100.0),
            holding(Some("INE7"), "Bar", 100.0),
        ];

        let board = build_leaderboard(&records, &holdings, 12);

        assert_eq!(board.len(), holdings.len());
        let foo = board.iter().find(|e| e.stock_name == "Foo Ltd").unwrap();
        assert_eq!(foo.isin, "INE5");
        assert_eq!(foo.current_return, 1.0);
        assert!(board.iter().all(|e| (e.weightage_percent - 50.0).abs() < 1e-9));
    }

    #[test]
    fn test_orphan_does_not_displace_placeholder() {
        // Both normalize to an empty name, so their fallback keys collide
        let records = vec![record("", "---", &[1.0, 1.0, 1.0])];
        let holdings = vec![holding(None, "&", 100.0)];

        let board = build_leaderboard(&records, &holdings, 12);

        assert_eq!(board.len(), 1);
        assert_eq!(board[0].stock_name, "&");
        assert!(!board[0].has_performance);
    }

    #[test]
    fn test_duplicate_records_keep_first() {
        let records = vec![
            record("INE1", "Alpha", &[1.0, 1.0, 1.0]),
            record("INE1", "Alpha", &[5.0, 5.0, 5.0]),
        ];
        let holdings = vec![holding(Some("INE1"), "Alpha", 100.0)];

        let board = build_leaderboard(&records, &holdings, 12);

        assert_eq!(board.len(), 1);
        assert_eq!(board[0].current_return, 1.0);
    }

    #[test]
    fn test_zero_cagr_sorted_last_by_current_return() {
        // (1 - 0.5) * (1 + 1.0) == 1.0 exactly, so CAGR is 0
        let records = vec![
            record("INE1", "Down Last", &[100.0, -50.0]),
            record("INE2", "Up Last", &[-50.0, 100.0]),
            record("INE3", "Gainer", &[1.0]),
        ];
        let holdings = vec![
            holding(Some("INE1"), "Down Last", 100.0),
            holding(Some("INE2"), "Up Last", 100.0),
            holding(Some("INE3"), "Gainer", 100.0),
        ];

        let board = build_leaderboard(&records, &holdings, 12);
        let order: Vec<&str> = board.iter().map(|e| e.isin.as_str()).collect();

        assert_eq!(order, vec!["INE3", "INE2", "INE1"]);
        assert_eq!(board[1].cagr, 0.0);
    }

    #[test]
    fn test_idempotent() {
        let records = vec![
            record("INE1", "Alpha", &[1.0, -2.0, 3.0]),
            record("", "Beta", &[2.0, 2.0]),
        ];
        let holdings = vec![
            holding(Some("INE1"), "Alpha", 10.0),
            holding(Some("INE2"), "beta", 20.0),
            holding(None, "Gamma", 30.0),
        ];

        let first = build_leaderboard(&records, &holdings, 6);
        let second = build_leaderboard(&records, &holdings, 6);
        assert_eq!(first, second);

        let mut isins: Vec<&str> = first.iter().map(|e| e.isin.as_str()).collect();
        let total = isins.len();
        isins.sort();
        isins.dedup();
        assert_eq!(isins.len(), total);
        assert_eq!(total, 3);
    }

    #[test]
    fn test_empty_inputs() {
        assert!(build_leaderboard(&[], &[], 12).is_empty());

        let records = vec![record("INE1", "Alpha", &[1.0])];
        assert!(build_leaderboard(&records, &[], 12).is_empty());
    }
}
