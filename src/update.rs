use chrono::{DateTime, SecondsFormat, Utc};
use log::{error, info};

use crate::config::StatsConfig;
use crate::data::{Summary, TimestampEntry};
use crate::error::Result;
use crate::registry::Registry;
use crate::report::{write_reports, Reports};
use crate::stats::{bucket_timestamps, count_contributors, prorate_current_month, timestamps};

/// Runs the whole pipeline: resolve, fetch, aggregate, write reports.
///
/// Each stage completes before the next one starts. Fetch failures abort the run,
/// report write failures are only logged.
pub async fn update(config: &StatsConfig, refresh: bool, now: DateTime<Utc>) -> Result<()> {
    let registry = Registry::new(config)?;

    info!("Resolving packages for keyword {}", &config.keyword);
    let names = registry.resolve_packages(refresh).await?;

    info!("Loading metadata for {} packages", names.len());
    let records = registry.fetch_packages(names, refresh).await?;

    let contributors = count_contributors(&records);
    let entries: Vec<TimestampEntry> = records.iter().map(timestamps).collect();

    let (days, mut months) = bucket_timestamps(&entries);
    prorate_current_month(&mut months, now.date_naive());

    let summary = Summary {
        updated: now.to_rfc3339_opts(SecondsFormat::Millis, true),
        contributors,
    };

    let reports = Reports {
        packages: &entries,
        days: &days,
        months: &months,
        summary: &summary,
    };

    let failed = write_reports(&config.storedir, &reports);
    if failed > 0 {
        error!("Failed to write {} reports to {}", failed, config.storedir.display());
    } else {
        info!(
            "Generated statistics for {} packages and {} contributors.",
            entries.len(),
            contributors
        );
    }

    Ok(())
}
