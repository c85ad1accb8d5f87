#![warn(clippy::unwrap_used)]

use chrono::Utc;
use log::{error, info};

use pkgstats::config::get_config;
use pkgstats::update::update;

/// "refresh" re-fetches everything, anything else only fetches what is not cached yet.
fn is_refresh(arg: Option<&str>) -> bool {
    arg == Some("refresh")
}

#[tokio::main]
async fn main() -> Result<(), String> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let refresh = is_refresh(std::env::args().nth(1).as_deref());

    let config = get_config()?;

    if refresh {
        info!("Refreshing all cached registry data.");
    }

    match update(&config.pkgstats, refresh, Utc::now()).await {
        Ok(()) => Ok(()),
        Err(error) => {
            error!("Failed to update package statistics: {}", error);
            Err(error.to_string())
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refresh_argument() {
        assert!(is_refresh(Some("refresh")));
        assert!(!is_refresh(Some("other")));
        assert!(!is_refresh(Some("Refresh")));
        assert!(!is_refresh(None));
    }
}
