use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Failed to read {}: {source}", .path.display())]
    Read { path: PathBuf, source: std::io::Error },

    #[error("Failed to write {}: {source}", .path.display())]
    Write { path: PathBuf, source: std::io::Error },

    #[error("Failed to parse {}: {source}", .path.display())]
    Parse { path: PathBuf, source: serde_json::Error },

    #[error("Failed to serialize data for {}: {source}", .path.display())]
    Serialize { path: PathBuf, source: serde_json::Error },

    #[error("Request to {url} failed: {source}")]
    Network { url: String, source: reqwest::Error },

    #[error("Failed to construct HTTP client: {0}")]
    Client(reqwest::Error),

    #[error("Invalid registry URL: {0}")]
    Url(String),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, Error>;
