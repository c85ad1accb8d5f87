use std::path::{Component, Path, PathBuf};

use log::{debug, info};
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};

pub fn get_list_path(store: &Path, keyword: &str) -> PathBuf {
    store.join(format!("{}.json", keyword))
}

pub fn get_dep_path(store: &Path, keyword: &str) -> PathBuf {
    store.join(format!("{}.dep.json", keyword))
}

/// Scoped package names (`@scope/name`) end up in a per-scope subdirectory.
///
/// Returns `None` for names that would leave the package cache directory.
pub fn get_package_path(store: &Path, name: &str) -> Option<PathBuf> {
    let relative = Path::new(name);

    if name.is_empty() || !relative.components().all(|component| matches!(component, Component::Normal(_))) {
        return None;
    }

    let mut path = store.join("packages");
    path.push(format!("{}.json", name));
    Some(path)
}

fn parse<T: DeserializeOwned>(path: &Path, contents: &str) -> Result<T> {
    serde_json::from_str(contents).map_err(|source| Error::Parse {
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) fn write_file(path: &Path, contents: &str) -> Result<()> {
    let write_error = |source| Error::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(write_error)?;
    }

    std::fs::write(path, contents).map_err(write_error)
}

pub fn load_cached<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = std::fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;

    parse(path, &contents)
}

/// Performs exactly one request and stores the response body verbatim, whatever its status.
pub async fn fetch_and_store<T: DeserializeOwned>(client: &Client, url: &Url, path: &Path) -> Result<T> {
    let network_error = |source| Error::Network {
        url: url.to_string(),
        source,
    };

    info!("Fetching {}", url);

    let response = client.get(url.clone()).send().await.map_err(network_error)?;
    let body = response.text().await.map_err(network_error)?;

    write_file(path, &body)?;

    parse(path, &body)
}

pub async fn load_or_fetch<T: DeserializeOwned>(client: &Client, url: &Url, path: &Path, refresh: bool) -> Result<T> {
    if refresh || !path.exists() {
        fetch_and_store(client, url, path).await
    } else {
        debug!("Using cached data from {}", path.display());
        load_cached(path)
    }
}
