//! Client-side signal filtering, draft/applied filter state, and pagination.
//!
//! Filtering always runs against the applied criteria. Edits go to the draft
//! and take effect only when applied, which also returns to page 1.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A half-open numeric bucket such as `2-5` (meaning `[2, 5)`) or `10+`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RangeBucket {
    #[default]
    All,
    /// `lo <= v < hi`
    Range { lo: f64, hi: f64 },
    /// `lo <= v`
    From { lo: f64 },
}

impl RangeBucket {
    /// Whether `value` falls in the bucket. Boundaries belong to the upper bucket.
    pub fn contains(&self, value: f64) -> bool {
        match *self {
            RangeBucket::All => true,
            RangeBucket::Range { lo, hi } => value >= lo && value < hi,
            RangeBucket::From { lo } => value >= lo,
        }
    }

    /// Find the bucket in `buckets` that holds `value`, skipping `All`.
    pub fn classify(buckets: &[RangeBucket], value: f64) -> Option<RangeBucket> {
        buckets
            .iter()
            .filter(|b| **b != RangeBucket::All)
            .find(|b| b.contains(value))
            .copied()
    }
}

impl FromStr for RangeBucket {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let label = s.trim();
        if label.eq_ignore_ascii_case("all") || label.is_empty() {
            return Ok(RangeBucket::All);
        }

        let parse = |v: &str| -> Result<f64> {
            v.trim()
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .ok_or_else(|| Error::InvalidBucket(s.to_string()))
        };

        if let Some(lo) = label.strip_suffix('+') {
            return Ok(RangeBucket::From { lo: parse(lo)? });
        }

        // The separator is a `-` past the first character; either bound may be negative
        let (lo, hi) = label
            .char_indices()
            .skip(1)
            .filter(|&(_, c)| c == '-')
            .find_map(|(i, _)| {
                let lo = parse(&label[..i]).ok()?;
                let hi = parse(&label[i + 1..]).ok()?;
                Some((lo, hi))
            })
            .ok_or_else(|| Error::InvalidBucket(s.to_string()))?;
        if lo >= hi {
            return Err(Error::InvalidBucket(s.to_string()));
        }
        Ok(RangeBucket::Range { lo, hi })
    }
}

impl TryFrom<String> for RangeBucket {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<RangeBucket> for String {
    fn from(bucket: RangeBucket) -> Self {
        bucket.to_string()
    }
}

impl fmt::Display for RangeBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RangeBucket::All => write!(f, "all"),
            RangeBucket::Range { lo, hi } => write!(f, "{}-{}", lo, hi),
            RangeBucket::From { lo } => write!(f, "{}+", lo),
        }
    }
}

/// Kind of screen a signal row came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum SignalCategory {
    VolumeSpike,
    NearHigh,
    Breakout,
    Event,
}

/// One row of a screening result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SignalRecord {
    pub isin: String,
    pub stock_name: String,
    pub category: SignalCategory,
    /// Volume relative to its recent average (2.0 = double)
    #[serde(default)]
    pub volume_spike: f64,
    /// Distance below the 52-week high, in percent
    #[serde(default)]
    pub from_high_percent: f64,
    /// Price change in percent
    #[serde(default)]
    pub change_percent: f64,
    /// Days until the associated corporate event, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days_until: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumeSpikeCriteria {
    pub min_vol_spike: f64,
    /// Minimum absolute price change in percent
    pub min_change_percent: f64,
}

impl Default for VolumeSpikeCriteria {
    fn default() -> Self {
        Self {
            min_vol_spike: 2.0,
            min_change_percent: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NearHighCriteria {
    pub max_from_high: f64,
    pub min_vol_spike: f64,
}

impl Default for NearHighCriteria {
    fn default() -> Self {
        Self {
            max_from_high: 5.0,
            min_vol_spike: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BreakoutCriteria {
    pub min_change_percent: f64,
}

impl Default for BreakoutCriteria {
    fn default() -> Self {
        Self {
            min_change_percent: 2.0,
        }
    }
}

/// Thresholds per signal category plus bucket selections.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterCriteria {
    /// Bucket on the magnitude of `change_percent`
    pub change_bucket: RangeBucket,
    /// Bucket on `days_until`
    pub days_until_bucket: RangeBucket,
    pub volume_spike: VolumeSpikeCriteria,
    pub near_high: NearHighCriteria,
    pub breakout: BreakoutCriteria,
}

impl FilterCriteria {
    /// Whether a record passes its category thresholds and both buckets.
    pub fn matches(&self, record: &SignalRecord) -> bool {
        let category_ok = match record.category {
            SignalCategory::VolumeSpike => {
                record.volume_spike >= self.volume_spike.min_vol_spike
                    && record.change_percent.abs() >= self.volume_spike.min_change_percent
            }
            SignalCategory::NearHigh => {
                record.from_high_percent <= self.near_high.max_from_high
                    && record.volume_spike >= self.near_high.min_vol_spike
            }
            SignalCategory::Breakout => record.change_percent >= self.breakout.min_change_percent,
            SignalCategory::Event => true,
        };

        let days_ok = match record.days_until {
            Some(days) => self.days_until_bucket.contains(days as f64),
            None => self.days_until_bucket == RangeBucket::All,
        };

        category_ok && days_ok && self.change_bucket.contains(record.change_percent.abs())
    }
}

/// Pending, not yet applied, filter edits.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DraftFilters(pub FilterCriteria);

/// The filter set results are computed from.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppliedFilters(pub FilterCriteria);

impl DraftFilters {
    /// Promote the draft to the applied filter set.
    pub fn apply(&self) -> AppliedFilters {
        AppliedFilters(self.0.clone())
    }
}

impl AppliedFilters {
    pub fn criteria(&self) -> &FilterCriteria {
        &self.0
    }
}

/// Filter state: draft edits, applied filters, and the current page.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterState {
    pub draft: DraftFilters,
    pub applied: AppliedFilters,
    /// 1-based page number
    pub page: usize,
    defaults: FilterCriteria,
}

impl Default for FilterState {
    fn default() -> Self {
        Self::new(FilterCriteria::default())
    }
}

impl FilterState {
    /// Start with `defaults` both drafted and applied, on page 1.
    pub fn new(defaults: FilterCriteria) -> Self {
        Self {
            draft: DraftFilters(defaults.clone()),
            applied: AppliedFilters(defaults.clone()),
            page: 1,
            defaults,
        }
    }

    /// Change the draft only; results are unaffected until `apply`.
    pub fn edit(self, change: impl FnOnce(&mut FilterCriteria)) -> Self {
        let mut draft = self.draft.0.clone();
        change(&mut draft);
        Self {
            draft: DraftFilters(draft),
            ..self
        }
    }

    /// Apply the draft and return to page 1.
    pub fn apply(self) -> Self {
        Self {
            applied: self.draft.apply(),
            page: 1,
            ..self
        }
    }

    /// Restore defaults to both draft and applied filters, on page 1.
    pub fn reset(self) -> Self {
        Self::new(self.defaults)
    }

    /// Move to a page (pages start at 1).
    pub fn goto_page(self, page: usize) -> Self {
        Self {
            page: page.max(1),
            ..self
        }
    }

    /// Whether the draft differs from what is applied.
    pub fn has_pending_changes(&self) -> bool {
        self.draft.0 != self.applied.0
    }

    /// Records passing the applied filters.
    pub fn filter<'a>(&self, records: &'a [SignalRecord]) -> Vec<&'a SignalRecord> {
        apply_filters(records, &self.applied)
    }

    /// The current page of records passing the applied filters.
    pub fn current_page<'a>(
        &self,
        records: &'a [SignalRecord],
        page_size: usize,
    ) -> Page<&'a SignalRecord> {
        paginate(&self.filter(records), self.page, page_size)
    }
}

/// Records that pass the applied filters, in input order.
pub fn apply_filters<'a>(
    records: &'a [SignalRecord],
    filters: &AppliedFilters,
) -> Vec<&'a SignalRecord> {
    let kept: Vec<&SignalRecord> = records
        .iter()
        .filter(|r| filters.criteria().matches(r))
        .collect();

    tracing::debug!("Filters kept {} of {} signals", kept.len(), records.len());
    kept
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based page number
    pub page: usize,
    pub page_size: usize,
    /// At least 1, even with no items
    pub total_pages: usize,
    pub total_items: usize,
}

/// Slice `items` into a page.
///
/// Page 0 is treated as page 1 and a page size of 0 as 1. A page past the
/// end has no items.
pub fn paginate<T: Clone>(items: &[T], page: usize, page_size: usize) -> Page<T> {
    let page = page.max(1);
    let page_size = page_size.max(1);
    let total_items = items.len();
    let total_pages = total_items.div_ceil(page_size).max(1);

    let start = (page - 1).saturating_mul(page_size);
    let page_items = items
        .iter()
        .skip(start)
        .take(page_size)
        .cloned()
        .collect();

    Page {
        items: page_items,
        page,
        page_size,
        total_pages,
        total_items,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signal(category: SignalCategory, vol: f64, from_high: f64, change: f64) -> SignalRecord {
        SignalRecord {
            isin: "INE1".to_string(),
            stock_name: "Alpha".to_string(),
            category,
            volume_spike: vol,
            from_high_percent: from_high,
            change_percent: change,
            days_until: None,
        }
    }

    #[test]
    fn test_bucket_parsing() {
        assert_eq!("all".parse::<RangeBucket>().unwrap(), RangeBucket::All);
        assert_eq!(
            "2-5".parse::<RangeBucket>().unwrap(),
            RangeBucket::Range { lo: 2.0, hi: 5.0 }
        );
        assert_eq!(
            "10+".parse::<RangeBucket>().unwrap(),
            RangeBucket::From { lo: 10.0 }
        );
        assert!(matches!(
            "5-2".parse::<RangeBucket>(),
            Err(Error::InvalidBucket(_))
        ));
        assert_eq!(
            "-5--2".parse::<RangeBucket>().unwrap(),
            RangeBucket::Range { lo: -5.0, hi: -2.0 }
        );
        assert!(matches!(
            "-2--5".parse::<RangeBucket>(),
            Err(Error::InvalidBucket(_))
        ));
        assert!(matches!(
            "abc".parse::<RangeBucket>(),
            Err(Error::InvalidBucket(_))
        ));
    }

    #[test]
    fn test_bucket_boundaries_go_up() {
        let low: RangeBucket = "1-2".parse().unwrap();
        let mid: RangeBucket = "2-5".parse().unwrap();
        let zero_one: RangeBucket = "0-1".parse().unwrap();

        assert!(!low.contains(2.0));
        assert!(mid.contains(2.0));
        assert!(!zero_one.contains(1.0));
        assert!(low.contains(1.0));

        let buckets = [
            RangeBucket::All,
            zero_one,
            low,
            mid,
            RangeBucket::From { lo: 5.0 },
        ];
        assert_eq!(RangeBucket::classify(&buckets, 2.0), Some(mid));
        assert_eq!(
            RangeBucket::classify(&buckets, 7.5),
            Some(RangeBucket::From { lo: 5.0 })
        );
        assert_eq!(RangeBucket::classify(&buckets, -1.0), None);
    }

    #[test]
    fn test_bucket_display_round_trip() {
        for label in ["all", "0-1", "2.5-7.5", "90+", "-7-0", "-5--2", "-3+"] {
            let bucket: RangeBucket = label.parse().unwrap();
            assert_eq!(bucket.to_string(), label);
        }
    }

    #[test]
    fn test_category_thresholds() {
        let criteria = FilterCriteria::default();

        assert!(criteria.matches(&signal(SignalCategory::VolumeSpike, 2.0, 0.0, -1.0)));
        assert!(!criteria.matches(&signal(SignalCategory::VolumeSpike, 1.9, 0.0, 1.0)));
        assert!(criteria.matches(&signal(SignalCategory::NearHigh, 1.0, 5.0, 0.0)));
        assert!(!criteria.matches(&signal(SignalCategory::NearHigh, 1.0, 5.1, 0.0)));
        assert!(criteria.matches(&signal(SignalCategory::Breakout, 0.0, 0.0, 2.0)));
        assert!(!criteria.matches(&signal(SignalCategory::Breakout, 0.0, 0.0, -3.0)));
        assert!(criteria.matches(&signal(SignalCategory::Event, 0.0, 0.0, 0.0)));
    }

    #[test]
    fn test_change_bucket_uses_magnitude() {
        let criteria = FilterCriteria {
            change_bucket: "2-5".parse().unwrap(),
            ..Default::default()
        };

        assert!(criteria.matches(&signal(SignalCategory::Event, 0.0, 0.0, 2.0)));
        assert!(criteria.matches(&signal(SignalCategory::Event, 0.0, 0.0, -4.9)));
        assert!(!criteria.matches(&signal(SignalCategory::Event, 0.0, 0.0, 5.0)));
        assert!(!criteria.matches(&signal(SignalCategory::Event, 0.0, 0.0, 1.99)));
    }

    #[test]
    fn test_days_until_bucket() {
        let criteria = FilterCriteria {
            days_until_bucket: "0-7".parse().unwrap(),
            ..Default::default()
        };
        let mut event = signal(SignalCategory::Event, 0.0, 0.0, 0.0);

        assert!(!criteria.matches(&event));
        event.days_until = Some(7);
        assert!(!criteria.matches(&event));
        event.days_until = Some(0);
        assert!(criteria.matches(&event));
    }

    #[test]
    fn test_draft_does_not_affect_results_until_applied() {
        let records = vec![
            signal(SignalCategory::Breakout, 0.0, 0.0, 3.0),
            signal(SignalCategory::Breakout, 0.0, 0.0, 6.0),
        ];

        let state = FilterState::default().goto_page(3);
        let state = state.edit(|c| c.breakout.min_change_percent = 5.0);

        assert!(state.has_pending_changes());
        assert_eq!(state.filter(&records).len(), 2);
        assert_eq!(state.page, 3);

        let state = state.apply();
        assert!(!state.has_pending_changes());
        assert_eq!(state.filter(&records).len(), 1);
        assert_eq!(state.page, 1);
    }

    #[test]
    fn test_reset_restores_defaults() {
        let defaults = FilterCriteria {
            change_bucket: "1-2".parse().unwrap(),
            ..Default::default()
        };
        let state = FilterState::new(defaults.clone())
            .edit(|c| c.change_bucket = RangeBucket::All)
            .apply()
            .goto_page(4)
            .reset();

        assert_eq!(state.draft.0, defaults);
        assert_eq!(state.applied.0, defaults);
        assert_eq!(state.page, 1);
    }

    #[test]
    fn test_paginate() {
        let items: Vec<u32> = (1..=45).collect();

        let page = paginate(&items, 1, 20);
        assert_eq!(page.items.len(), 20);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.total_items, 45);

        let page = paginate(&items, 3, 20);
        assert_eq!(page.items, vec![41, 42, 43, 44, 45]);

        let page = paginate(&items, 4, 20);
        assert!(page.items.is_empty());

        let page = paginate(&items, 0, 0);
        assert_eq!(page.page, 1);
        assert_eq!(page.page_size, 1);
        assert_eq!(page.items, vec![1]);

        let empty: Vec<u32> = Vec::new();
        assert_eq!(paginate(&empty, 1, 20).total_pages, 1);
    }

    #[test]
    fn test_current_page() {
        let records: Vec<SignalRecord> = (0..5)
            .map(|i| signal(SignalCategory::Event, 0.0, 0.0, i as f64))
            .collect();
        let state = FilterState::default().goto_page(2);
        let page = state.current_page(&records, 2);

        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].change_percent, 2.0);
    }

    #[test]
    fn test_record_json_shape() {
        let json = r#"{"isin":"INE1","stockName":"Alpha","category":"volumeSpike","volumeSpike":3.2,"changePercent":2.0,"daysUntil":5}"#;
        let record: SignalRecord = serde_json::from_str(json).unwrap();

        assert_eq!(record.category, SignalCategory::VolumeSpike);
        assert_eq!(record.from_high_percent, 0.0);
        assert_eq!(record.days_until, Some(5));
    }
}
