//! Time bucketing and time-based record transforms.
//!
//! Buckets are half-open intervals `[anchor + k·d, anchor + (k+1)·d)` where
//! `anchor` is local midnight of the earliest record's day. Durations made of
//! whole days step through local calendar days instead, so a bucket still
//! starts at local midnight after a DST transition. Every record lands in
//! exactly one bucket; buckets without records are not emitted.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use grid_common::{TimeInterval, TimeZoneSpec};

use crate::error::{GeneratorError, Result};
use crate::types::Record;

/// Records sharing one time bucket.
#[derive(Debug, Clone)]
pub struct TimeBucket<'a> {
    /// Inclusive start of the bucket, in UTC.
    pub start: DateTime<Utc>,
    /// Records in input order.
    pub records: Vec<&'a Record>,
}

impl TimeBucket<'_> {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

const DAY_MS: i64 = 86_400_000;

/// Group records into ordered, non-overlapping buckets of `duration`.
pub fn group_by_time<'a, I>(
    records: I,
    duration: Duration,
    tz: &TimeZoneSpec,
) -> Result<Vec<TimeBucket<'a>>>
where
    I: IntoIterator<Item = &'a Record>,
{
    let step_ms = duration.num_milliseconds();
    if step_ms <= 0 {
        return Err(GeneratorError::InvalidDuration(format!(
            "bucket duration must be positive, got {}",
            duration
        )));
    }

    let records: Vec<&'a Record> = records.into_iter().collect();
    let Some(earliest) = records.iter().map(|r| r.timestamp).min() else {
        return Ok(Vec::new());
    };
    let anchor_date = tz.local_date(&earliest);

    if step_ms % DAY_MS == 0 {
        // Whole days follow the local calendar, so DST days stay 23h or 25h long.
        let step_days = step_ms / DAY_MS;
        Ok(collect_buckets(
            records,
            |r| (tz.local_date(&r.timestamp) - anchor_date).num_days().div_euclid(step_days),
            |k| tz.midnight(anchor_date + Duration::days(k * step_days)),
        ))
    } else {
        let anchor = tz.midnight(anchor_date);
        Ok(collect_buckets(
            records,
            |r| (r.timestamp - anchor).num_milliseconds().div_euclid(step_ms),
            |k| anchor + Duration::milliseconds(k * step_ms),
        ))
    }
}

fn collect_buckets<'a>(
    records: Vec<&'a Record>,
    key: impl Fn(&Record) -> i64,
    start: impl Fn(i64) -> DateTime<Utc>,
) -> Vec<TimeBucket<'a>> {
    let mut groups: BTreeMap<i64, Vec<&'a Record>> = BTreeMap::new();
    for record in records {
        groups.entry(key(record)).or_default().push(record);
    }

    groups
        .into_iter()
        .map(|(k, records)| TimeBucket {
            start: start(k),
            records,
        })
        .collect()
}

/// Reference day every record is folded onto in approximated mode.
pub fn reference_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 2).unwrap_or_default()
}

/// Fold every record onto the reference day, keeping its local time of day.
///
/// Produces a "typical day" recordset; the input is left untouched.
pub fn fold_to_reference_day(records: &[Record], tz: &TimeZoneSpec) -> Vec<Record> {
    let day = reference_day();
    records
        .iter()
        .map(|record| Record {
            timestamp: tz.with_local_date(&record.timestamp, day),
            ..record.clone()
        })
        .collect()
}

/// Keep records whose timestamp falls within at least one interval.
///
/// An empty interval list keeps everything. Each kept record appears once,
/// in input order, even when intervals overlap.
pub fn filter_time_intervals(records: &[Record], intervals: &[TimeInterval]) -> Vec<Record> {
    if intervals.is_empty() {
        return records.to_vec();
    }
    records
        .iter()
        .filter(|record| intervals.iter().any(|i| i.contains(&record.timestamp)))
        .cloned()
        .collect()
}

/// Floor both ends of every interval to `granularity`.
pub fn clip_time_intervals(
    intervals: &[TimeInterval],
    granularity: Duration,
) -> Result<Vec<TimeInterval>> {
    intervals
        .iter()
        .map(|interval| interval.clip(granularity).map_err(GeneratorError::from))
        .collect()
}
