use std::path::Path;

use log::{error, info};
use serde::Serialize;

use crate::cache::write_file;
use crate::data::{Summary, TimestampEntry};
use crate::error::{Error, Result};
use crate::stats::Buckets;

pub const PACKAGES_FILENAME: &str = "all_packages.json";
pub const DATES_JSON_FILENAME: &str = "all_dates.json";
pub const DATES_TSV_FILENAME: &str = "all_dates.tsv";
pub const MONTHS_TSV_FILENAME: &str = "all_months.tsv";
pub const STATS_FILENAME: &str = "stats.json";

const TSV_HEADER: &str = "date\tcreated\tmodified\treleased\n";

pub fn to_tsv(buckets: &Buckets) -> String {
    let mut tsv = String::from(TSV_HEADER);

    for (date, counts) in buckets {
        tsv.push_str(&format!(
            "{}\t{}\t{}\t{}\n",
            date, counts.created, counts.modified, counts.releases
        ));
    }

    tsv
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(|source| Error::Serialize {
        path: path.to_path_buf(),
        source,
    })?;

    write_file(path, &json)
}

pub struct Reports<'a> {
    pub packages: &'a [TimestampEntry],
    pub days: &'a Buckets,
    pub months: &'a Buckets,
    pub summary: &'a Summary,
}

/// Attempts every report even if an earlier one failed, returns the number of failed writes.
pub fn write_reports(dir: &Path, reports: &Reports) -> usize {
    let results = [
        (PACKAGES_FILENAME, write_json(&dir.join(PACKAGES_FILENAME), reports.packages)),
        (DATES_JSON_FILENAME, write_json(&dir.join(DATES_JSON_FILENAME), reports.days)),
        (DATES_TSV_FILENAME, write_file(&dir.join(DATES_TSV_FILENAME), &to_tsv(reports.days))),
        (MONTHS_TSV_FILENAME, write_file(&dir.join(MONTHS_TSV_FILENAME), &to_tsv(reports.months))),
        (STATS_FILENAME, write_json(&dir.join(STATS_FILENAME), reports.summary)),
    ];

    let mut failed = 0;
    for (name, result) in results {
        match result {
            Ok(()) => info!("Wrote {}", name),
            Err(error) => {
                error!("Failed to write {} report: {}", name, error);
                failed += 1;
            },
        }
    }

    failed
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::data::BucketCounts;

    fn read_tsv(tsv: &str) -> Vec<(String, u64, u64, u64)> {
        let mut lines = tsv.lines();
        assert_eq!(lines.next(), Some(TSV_HEADER.trim_end()));

        lines
            .map(|line| {
                let fields: Vec<&str> = line.split('\t').collect();
                assert_eq!(fields.len(), 4, "malformed line: {}", line);
                (
                    fields[0].to_string(),
                    fields[1].parse().unwrap(),
                    fields[2].parse().unwrap(),
                    fields[3].parse().unwrap(),
                )
            })
            .collect()
    }

    fn buckets() -> Buckets {
        let mut buckets = Buckets::new();
        buckets.insert(
            String::from("20240102"),
            BucketCounts {
                created: 0,
                modified: 3,
                releases: 12,
            },
        );
        buckets.insert(
            String::from("20231230"),
            BucketCounts {
                created: 1,
                modified: 0,
                releases: 1,
            },
        );
        buckets
    }

    #[test]
    fn tsv_layout() {
        assert_eq!(
            to_tsv(&buckets()),
            "date\tcreated\tmodified\treleased\n20231230\t1\t0\t1\n20240102\t0\t3\t12\n"
        );
        assert_eq!(to_tsv(&Buckets::new()), TSV_HEADER);
    }

    #[test]
    fn tsv_reads_back() {
        let buckets = buckets();

        let expected: Vec<(String, u64, u64, u64)> = buckets
            .iter()
            .map(|(date, counts)| (date.clone(), counts.created, counts.modified, counts.releases))
            .collect();

        assert_eq!(read_tsv(&to_tsv(&buckets)), expected);
    }

    #[test]
    fn writes_all_reports() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("out");

        let packages = vec![TimestampEntry {
            id: String::from("hubot-irc"),
            created: Some(String::from("2023-12-30T10:00:00.000Z")),
            ..TimestampEntry::default()
        }];
        let days = buckets();
        let months = Buckets::new();
        let summary = Summary {
            updated: String::from("2024-01-05T00:00:00.000Z"),
            contributors: 4,
        };

        let reports = Reports {
            packages: &packages,
            days: &days,
            months: &months,
            summary: &summary,
        };

        assert_eq!(write_reports(&dir, &reports), 0);

        let stats = std::fs::read_to_string(dir.join(STATS_FILENAME)).unwrap();
        assert_eq!(
            stats,
            "{\n  \"updated\": \"2024-01-05T00:00:00.000Z\",\n  \"contributors\": 4\n}"
        );

        let packages = std::fs::read_to_string(dir.join(PACKAGES_FILENAME)).unwrap();
        assert!(packages.contains("\"id\": \"hubot-irc\""));
        assert!(!packages.contains("\"modified\""));

        let dates: Buckets = serde_json::from_str(&std::fs::read_to_string(dir.join(DATES_JSON_FILENAME)).unwrap()).unwrap();
        assert_eq!(dates, days);

        assert_eq!(
            std::fs::read_to_string(dir.join(MONTHS_TSV_FILENAME)).unwrap(),
            TSV_HEADER
        );
        assert!(dir.join(DATES_TSV_FILENAME).exists());
    }

    #[test]
    fn failed_writes_do_not_stop_the_rest() {
        let tmp = tempfile::tempdir().unwrap();

        // a directory in place of a report file makes that single write fail
        std::fs::create_dir_all(tmp.path().join(DATES_JSON_FILENAME)).unwrap();

        let days = buckets();
        let summary = Summary {
            updated: String::from("2024-01-05T00:00:00.000Z"),
            contributors: 0,
        };

        let reports = Reports {
            packages: &[],
            days: &days,
            months: &days,
            summary: &summary,
        };

        assert_eq!(write_reports(tmp.path(), &reports), 1);
        assert!(tmp.path().join(PACKAGES_FILENAME).exists());
        assert!(tmp.path().join(MONTHS_TSV_FILENAME).exists());
        assert!(tmp.path().join(STATS_FILENAME).exists());
    }
}
