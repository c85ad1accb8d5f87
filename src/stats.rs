use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};
use log::warn;
use serde_json::Value;

use crate::data::{BucketCounts, PackageRecord, TimestampEntry};

pub const DAY_FORMAT: &str = "%Y%m%d";
pub const MONTH_FORMAT: &str = "%Y%m";

/// date key (`YYYYMMDD` or `YYYYMM`) -> counts, in ascending key order
pub type Buckets = BTreeMap<String, BucketCounts>;

/// Author first, then maintainers; people without any usable name are left out.
pub fn authors(record: &PackageRecord) -> Vec<String> {
    record
        .author
        .iter()
        .chain(record.maintainers.iter())
        .filter_map(|person| person.display_name())
        .map(String::from)
        .collect()
}

pub fn count_contributors(records: &[PackageRecord]) -> usize {
    let mut seen: HashSet<String> = HashSet::new();

    records
        .iter()
        .flat_map(authors)
        .filter(|name| seen.insert(name.clone()))
        .count()
}

pub fn timestamps(record: &PackageRecord) -> TimestampEntry {
    let time = |label: &str| record.time.get(label).and_then(Value::as_str).map(String::from);

    let latest = record
        .dist_tags
        .get("latest")
        .and_then(Value::as_str)
        .and_then(|version| time(version));

    // the first two entries are always "created" and "modified"
    let releases = record
        .time
        .values()
        .skip(2)
        .filter_map(Value::as_str)
        .map(String::from)
        .collect();

    TimestampEntry {
        id: record.name.clone(),
        created: time("created"),
        modified: time("modified"),
        latest,
        releases,
    }
}

#[derive(Clone, Copy, Debug)]
enum Counter {
    Created,
    Modified,
    Releases,
}

impl Counter {
    fn label(self) -> &'static str {
        match self {
            Counter::Created => "created",
            Counter::Modified => "modified",
            Counter::Releases => "release",
        }
    }

    fn bump(self, counts: &mut BucketCounts) {
        match self {
            Counter::Created => counts.created += 1,
            Counter::Modified => counts.modified += 1,
            Counter::Releases => counts.releases += 1,
        }
    }
}

fn parse_timestamp(timestamp: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(timestamp) {
        return Ok(parsed.with_timezone(&Utc));
    }

    // timestamps without offset are read as UTC
    match NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%dT%H:%M:%S%.f") {
        Ok(parsed) => Ok(parsed.and_utc()),
        Err(error) => Err(format!("Invalid timestamp {:?}: {}", timestamp, error)),
    }
}

fn bucket_keys(timestamp: Option<&str>) -> Result<(String, String), String> {
    let timestamp = match timestamp {
        Some(timestamp) => parse_timestamp(timestamp)?,
        None => return Err(String::from("Missing timestamp")),
    };

    Ok((
        timestamp.format(DAY_FORMAT).to_string(),
        timestamp.format(MONTH_FORMAT).to_string(),
    ))
}

fn increment(days: &mut Buckets, months: &mut Buckets, id: &str, timestamp: Option<&str>, counter: Counter) {
    match bucket_keys(timestamp) {
        Ok((day, month)) => {
            counter.bump(days.entry(day).or_default());
            counter.bump(months.entry(month).or_default());
        },
        Err(error) => warn!("Skipping {} timestamp of {}: {}", counter.label(), id, error),
    }
}

/// Counts events per day and per month, returned as `(days, months)`.
pub fn bucket_timestamps(entries: &[TimestampEntry]) -> (Buckets, Buckets) {
    let mut days = Buckets::new();
    let mut months = Buckets::new();

    for entry in entries {
        increment(&mut days, &mut months, &entry.id, entry.created.as_deref(), Counter::Created);
        increment(&mut days, &mut months, &entry.id, entry.modified.as_deref(), Counter::Modified);

        for release in &entry.releases {
            increment(&mut days, &mut months, &entry.id, Some(release), Counter::Releases);
        }
    }

    (days, months)
}

fn days_in_month(date: NaiveDate) -> u32 {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };

    match (date.with_day(1), NaiveDate::from_ymd_opt(year, month, 1)) {
        (Some(first), Some(next)) => next.signed_duration_since(first).num_days() as u32,
        // only reachable at the end of chrono's date range, leaves counts unscaled
        _ => date.day(),
    }
}

fn scale(count: u64, factor: f64) -> u64 {
    (count as f64 * factor).round() as u64
}

/// Extrapolates the counts of the running month to the whole month.
///
/// A month without any events so far gets an empty bucket.
pub fn prorate_current_month(months: &mut Buckets, today: NaiveDate) {
    let factor = f64::from(days_in_month(today)) / f64::from(today.day());

    let counts = months.entry(today.format(MONTH_FORMAT).to_string()).or_default();

    counts.created = scale(counts.created, factor);
    counts.modified = scale(counts.modified, factor);
    counts.releases = scale(counts.releases, factor);
}
