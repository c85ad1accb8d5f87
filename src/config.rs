use std::fs::read_to_string;
use std::path::{Path, PathBuf};

use log::info;
use serde::Deserialize;

const CONFIG_FILENAME: &str = "pkgstats.toml";

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub pkgstats: StatsConfig,
}

#[derive(Clone, Debug, Deserialize)]
pub struct StatsConfig {
    /// keyword whose ecosystem is collected, also the name of its reference package
    #[serde(default = "default_keyword")]
    pub keyword: String,
    /// base URL of the CouchDB registry database
    #[serde(default = "default_registry")]
    pub registry: String,
    /// directory for cached registry documents and generated reports
    #[serde(default = "default_storedir")]
    pub storedir: PathBuf,
    /// request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

fn default_keyword() -> String {
    String::from("hubot")
}

fn default_registry() -> String {
    String::from("https://skimdb.npmjs.com/registry")
}

fn default_storedir() -> PathBuf {
    PathBuf::from("docs/data")
}

fn default_timeout() -> u64 {
    60
}

impl Default for StatsConfig {
    fn default() -> Self {
        StatsConfig {
            keyword: default_keyword(),
            registry: default_registry(),
            storedir: default_storedir(),
            timeout: default_timeout(),
        }
    }
}

fn get_config_path() -> Result<Option<Box<Path>>, String> {
    let local = {
        let mut path = std::env::current_dir().map_err(|error| error.to_string())?;
        path.push(CONFIG_FILENAME);
        path
    };

    if local.exists() {
        return Ok(Some(local.into_boxed_path()));
    };

    for dir in ["/etc/pkgstats/", "/usr/share/pkgstats/"] {
        let mut path = PathBuf::from(dir);
        path.push(CONFIG_FILENAME);

        if path.exists() {
            return Ok(Some(path.into_boxed_path()));
        }
    }

    Ok(None)
}

pub fn parse_config(contents: &str) -> Result<Config, String> {
    basic_toml::from_str(contents).map_err(|error| error.to_string())
}

pub fn get_config() -> Result<Config, String> {
    let path = match get_config_path()? {
        Some(path) => path,
        None => {
            info!("No configuration file was found, using defaults.");
            return Ok(Config::default());
        },
    };

    info!("Using configuration file: {}", path.to_string_lossy());

    let contents = match read_to_string(&path) {
        Ok(string) => string,
        Err(error) => return Err(error.to_string()),
    };

    parse_config(&contents)
}
