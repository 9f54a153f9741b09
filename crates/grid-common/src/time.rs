//! Time handling utilities: intervals, fixed durations and time zones.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{GridError, GridResult};

/// Parse an ISO 8601 timestamp into UTC.
///
/// Accepts RFC 3339, a naive `YYYY-MM-DDTHH:MM:SS` (assumed UTC) or a bare date.
pub fn parse_timestamp(s: &str) -> GridResult<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    if let Ok(ndt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Ok(Utc.from_utc_datetime(&ndt));
    }

    if let Ok(ndt) = NaiveDateTime::parse_from_str(&format!("{}T00:00:00", s), "%Y-%m-%dT%H:%M:%S") {
        return Ok(Utc.from_utc_datetime(&ndt));
    }

    Err(GridError::InvalidTime(s.to_string()))
}

/// Format a UTC timestamp as `YYYY-MM-DDTHH:MM:SSZ`.
pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Parse a fixed-length ISO 8601 duration (`PT15M`, `P1D`, `P1W`, `P1DT12H`, `PT0.5S`).
///
/// Years and months are rejected because they have no fixed length.
pub fn parse_iso8601_duration(s: &str) -> GridResult<Duration> {
    let invalid = || GridError::InvalidDuration(s.to_string());
    let body = s.trim().strip_prefix('P').ok_or_else(invalid)?;
    if body.is_empty() {
        return Err(invalid());
    }

    let (date_part, time_part) = match body.split_once('T') {
        Some((d, t)) if !t.is_empty() => (d, Some(t)),
        Some(_) => return Err(invalid()),
        None => (body, None),
    };

    let mut total_ms: f64 = 0.0;
    let mut number = String::new();

    for c in date_part.chars() {
        match c {
            '0'..='9' | '.' => number.push(c),
            'W' | 'D' => {
                let value: f64 = number.parse().map_err(|_| invalid())?;
                let unit_ms = if c == 'W' { 7.0 * 86_400_000.0 } else { 86_400_000.0 };
                total_ms += value * unit_ms;
                number.clear();
            }
            _ => return Err(invalid()),
        }
    }
    if !number.is_empty() {
        return Err(invalid());
    }

    if let Some(time_part) = time_part {
        for c in time_part.chars() {
            match c {
                '0'..='9' | '.' => number.push(c),
                'H' | 'M' | 'S' => {
                    let value: f64 = number.parse().map_err(|_| invalid())?;
                    let unit_ms = match c {
                        'H' => 3_600_000.0,
                        'M' => 60_000.0,
                        _ => 1_000.0,
                    };
                    total_ms += value * unit_ms;
                    number.clear();
                }
                _ => return Err(invalid()),
            }
        }
        if !number.is_empty() {
            return Err(invalid());
        }
    }

    Ok(Duration::milliseconds(total_ms.round() as i64))
}

/// A fixed duration that remembers its ISO 8601 spelling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IsoDuration {
    text: String,
    duration: Duration,
}

impl IsoDuration {
    pub fn parse(s: &str) -> GridResult<Self> {
        let duration = parse_iso8601_duration(s)?;
        Ok(Self {
            text: s.trim().to_string(),
            duration,
        })
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl TryFrom<String> for IsoDuration {
    type Error = GridError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<IsoDuration> for String {
    fn from(value: IsoDuration) -> Self {
        value.text
    }
}

impl std::fmt::Display for IsoDuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.text)
    }
}

/// Floor a timestamp to a multiple of `step` counted from the Unix epoch.
pub fn floor_to_step(dt: DateTime<Utc>, step: Duration) -> GridResult<DateTime<Utc>> {
    let step_ms = step.num_milliseconds();
    if step_ms <= 0 {
        return Err(GridError::InvalidDuration(format!("{} is not positive", step)));
    }
    let floored = dt.timestamp_millis().div_euclid(step_ms) * step_ms;
    Utc.timestamp_millis_opt(floored)
        .single()
        .ok_or_else(|| GridError::InvalidTime(format!("{} ms out of range", floored)))
}

/// An inclusive time interval used to filter records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "[String; 2]", into = "[String; 2]")]
pub struct TimeInterval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeInterval {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> GridResult<Self> {
        if start > end {
            return Err(GridError::InvalidTime(format!(
                "interval start {} is after end {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    /// Parse an interval from two ISO 8601 timestamps.
    pub fn parse(start: &str, end: &str) -> GridResult<Self> {
        Self::new(parse_timestamp(start)?, parse_timestamp(end)?)
    }

    pub fn contains(&self, dt: &DateTime<Utc>) -> bool {
        dt >= &self.start && dt <= &self.end
    }

    /// Floor both ends to `granularity` (midnight UTC for one day).
    pub fn clip(&self, granularity: Duration) -> GridResult<Self> {
        Ok(Self {
            start: floor_to_step(self.start, granularity)?,
            end: floor_to_step(self.end, granularity)?,
        })
    }
}

impl TryFrom<[String; 2]> for TimeInterval {
    type Error = GridError;

    fn try_from(value: [String; 2]) -> Result<Self, Self::Error> {
        Self::parse(&value[0], &value[1])
    }
}

impl From<TimeInterval> for [String; 2] {
    fn from(value: TimeInterval) -> Self {
        [format_timestamp(&value.start), format_timestamp(&value.end)]
    }
}

/// Zone rules behind a [`TimeZoneSpec`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Zone {
    Fixed(FixedOffset),
    Named(Tz),
}

/// A time zone: `UTC`, a fixed offset (`±HH:MM`, `±HHMM`, `±HH`) or an
/// IANA name such as `America/Denver`.
///
/// Named zones resolve their offset per instant, so local midnights and
/// wall-clock times stay correct across daylight-saving transitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeZoneSpec {
    name: String,
    zone: Zone,
}

impl TimeZoneSpec {
    pub fn utc() -> Self {
        Self {
            name: "UTC".to_string(),
            zone: Zone::Fixed(Utc.fix()),
        }
    }

    pub fn parse(s: &str) -> GridResult<Self> {
        let trimmed = s.trim();
        let invalid = || GridError::InvalidTimeZone(s.to_string());

        if trimmed.eq_ignore_ascii_case("utc") || trimmed == "Z" || trimmed.eq_ignore_ascii_case("gmt") {
            return Ok(Self::utc());
        }

        let zone = if trimmed.starts_with(['+', '-']) {
            Zone::Fixed(parse_fixed_offset(trimmed).ok_or_else(invalid)?)
        } else {
            Zone::Named(trimmed.parse::<Tz>().map_err(|_| invalid())?)
        };
        Ok(Self {
            name: trimmed.to_string(),
            zone,
        })
    }

    /// UTC offset in effect at `dt`.
    pub fn offset_at(&self, dt: &DateTime<Utc>) -> FixedOffset {
        match self.zone {
            Zone::Fixed(offset) => offset,
            Zone::Named(tz) => tz.offset_from_utc_datetime(&dt.naive_utc()).fix(),
        }
    }

    /// Convert a local wall-clock time in this zone back to UTC.
    ///
    /// Ambiguous wall times take their first occurrence. Wall times skipped
    /// by a forward transition resolve with the offset in effect before it.
    pub fn local_to_utc(&self, local: NaiveDateTime) -> DateTime<Utc> {
        match self.zone {
            Zone::Fixed(offset) => Utc.from_utc_datetime(&(local - offset_seconds(offset))),
            Zone::Named(tz) => match tz.from_local_datetime(&local).earliest() {
                Some(dt) => dt.with_timezone(&Utc),
                None => {
                    let before = tz
                        .offset_from_utc_datetime(&(local - Duration::days(1)))
                        .fix();
                    Utc.from_utc_datetime(&(local - offset_seconds(before)))
                }
            },
        }
    }

    /// Wall-clock time of `dt` in this zone.
    pub fn to_local(&self, dt: &DateTime<Utc>) -> NaiveDateTime {
        dt.naive_utc() + offset_seconds(self.offset_at(dt))
    }

    /// Local calendar date of `dt`.
    pub fn local_date(&self, dt: &DateTime<Utc>) -> NaiveDate {
        self.to_local(dt).date()
    }

    /// Start of local `date`, in UTC.
    pub fn midnight(&self, date: NaiveDate) -> DateTime<Utc> {
        self.local_to_utc(date.and_time(NaiveTime::MIN))
    }

    /// Local midnight (in this zone) of the day containing `dt`, expressed in UTC.
    pub fn local_midnight(&self, dt: &DateTime<Utc>) -> DateTime<Utc> {
        self.midnight(self.local_date(dt))
    }

    /// Move `dt` onto `date` in this zone, keeping its local time of day.
    pub fn with_local_date(&self, dt: &DateTime<Utc>, date: NaiveDate) -> DateTime<Utc> {
        let local = date.and_time(self.to_local(dt).time());
        self.local_to_utc(local)
    }
}

fn offset_seconds(offset: FixedOffset) -> Duration {
    Duration::seconds(i64::from(offset.local_minus_utc()))
}

/// `±HH:MM`, `±HHMM` or `±HH`, digits only after the sign.
fn parse_fixed_offset(s: &str) -> Option<FixedOffset> {
    let (sign, rest) = match s.as_bytes().first()? {
        b'+' => (1, &s[1..]),
        b'-' => (-1, &s[1..]),
        _ => return None,
    };
    if !rest.bytes().all(|b| b.is_ascii_digit() || b == b':') {
        return None;
    }

    let (hours, minutes) = match rest.split_once(':') {
        Some((h, m)) if h.len() == 2 && m.len() == 2 => (h, m),
        Some(_) => return None,
        None if rest.len() == 4 => rest.split_at(2),
        None if rest.len() == 2 => (rest, "00"),
        None => return None,
    };
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

impl Default for TimeZoneSpec {
    fn default() -> Self {
        Self::utc()
    }
}

impl TryFrom<String> for TimeZoneSpec {
    type Error = GridError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TimeZoneSpec> for String {
    fn from(value: TimeZoneSpec) -> Self {
        value.name
    }
}

impl std::fmt::Display for TimeZoneSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}
