use std::path::PathBuf;
use std::time::Duration;

use log::{info, warn};
use reqwest::{Client, Url};

use crate::cache::{get_dep_path, get_list_path, get_package_path, load_or_fetch};
use crate::config::StatsConfig;
use crate::data::{DependentRow, KeywordRow, PackageRecord, ViewResponse};
use crate::error::{Error, Result};

pub struct Registry {
    client: Client,
    base: Url,
    store: PathBuf,
    keyword: String,
}

impl Registry {
    pub fn new(config: &StatsConfig) -> Result<Registry> {
        let base = Url::parse(&config.registry).map_err(|error| Error::Url(format!("{}: {}", &config.registry, error)))?;

        if base.cannot_be_a_base() {
            return Err(Error::Url(config.registry.clone()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .build()
            .map_err(Error::Client)?;

        Ok(Registry {
            client,
            base,
            store: config.storedir.clone(),
            keyword: config.keyword.clone(),
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();

        url.path_segments_mut()
            .map_err(|_| Error::Url(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);

        Ok(url)
    }

    /// Query over all view keys starting with the keyword (`["kw"]` up to `["kw", {}]`).
    fn view_url(&self, view: &str, extra: (&str, &str)) -> Result<Url> {
        let startkey = serde_json::json!([&self.keyword]).to_string();
        let endkey = serde_json::json!([&self.keyword, {}]).to_string();

        let mut url = self.endpoint(&["_design", "app", "_view", view])?;
        url.query_pairs_mut()
            .append_pair("startkey", &startkey)
            .append_pair("endkey", &endkey)
            .append_pair(extra.0, extra.1);

        Ok(url)
    }

    pub fn keyword_url(&self) -> Result<Url> {
        self.view_url("byKeyword", ("group_level", "3"))
    }

    pub fn dependents_url(&self) -> Result<Url> {
        self.view_url("dependentVersions", ("reduce", "false"))
    }

    pub fn package_url(&self, name: &str) -> Result<Url> {
        self.endpoint(&[name])
    }

    async fn get_keyword_packages(&self, refresh: bool) -> Result<Vec<String>> {
        let url = self.keyword_url()?;
        let path = get_list_path(&self.store, &self.keyword);

        let view: ViewResponse<KeywordRow> = load_or_fetch(&self.client, &url, &path, refresh).await?;

        let mut names = Vec::with_capacity(view.rows.len());
        for row in &view.rows {
            match row.package() {
                Some(name) => names.push(name.to_string()),
                None => warn!("Skipping keyword view row without package name: {:?}", row.key),
            }
        }

        Ok(names)
    }

    async fn get_dependent_packages(&self, refresh: bool) -> Result<Vec<String>> {
        let url = self.dependents_url()?;
        let path = get_dep_path(&self.store, &self.keyword);

        let view: ViewResponse<DependentRow> = load_or_fetch(&self.client, &url, &path, refresh).await?;

        Ok(view.rows.into_iter().map(|row| row.id).collect())
    }

    /// Packages tagged with the keyword plus packages depending on the keyword's package.
    pub async fn resolve_packages(&self, refresh: bool) -> Result<Vec<String>> {
        let (tagged, dependents) = tokio::try_join!(
            self.get_keyword_packages(refresh),
            self.get_dependent_packages(refresh)
        )?;

        info!(
            "Found {} packages tagged with and {} packages depending on {}.",
            tagged.len(),
            dependents.len(),
            &self.keyword
        );

        Ok(merge_identifiers(tagged, dependents))
    }

    /// Fetches all package documents at once, fails if any one of them fails.
    ///
    /// Names that cannot be stored inside the package cache are skipped.
    pub async fn fetch_packages(&self, names: Vec<String>, refresh: bool) -> Result<Vec<PackageRecord>> {
        let mut handles = Vec::with_capacity(names.len());

        for name in names {
            let path = match get_package_path(&self.store, &name) {
                Some(path) => path,
                None => {
                    warn!("Skipping package with unusable name: {:?}", &name);
                    continue;
                },
            };

            let url = self.package_url(&name)?;
            let client = self.client.clone();

            handles.push(tokio::spawn(async move {
                let mut record: PackageRecord = load_or_fetch(&client, &url, &path, refresh).await?;

                // documents of deleted packages carry no name
                if record.name.is_empty() {
                    record.name = name;
                }

                Ok::<PackageRecord, Error>(record)
            }));
        }

        let mut records = Vec::with_capacity(handles.len());
        for handle in handles {
            records.push(handle.await??);
        }

        Ok(records)
    }
}

pub fn merge_identifiers(first: Vec<String>, second: Vec<String>) -> Vec<String> {
    let mut names = first;
    names.extend(second);

    names.sort();
    names.dedup();

    names
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry(base: &str) -> Registry {
        let config = StatsConfig {
            registry: String::from(base),
            ..StatsConfig::default()
        };

        Registry::new(&config).unwrap()
    }

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn merge_deduplicates_and_sorts() {
        let merged = merge_identifiers(
            strings(&["hubot-slack", "hubot-irc", "hubot-irc"]),
            strings(&["hubot-xmpp", "hubot-slack", "a-bot"]),
        );

        assert_eq!(merged, strings(&["a-bot", "hubot-irc", "hubot-slack", "hubot-xmpp"]));
    }

    #[test]
    fn merge_of_empty_lists() {
        assert!(merge_identifiers(Vec::new(), Vec::new()).is_empty());
        assert_eq!(merge_identifiers(Vec::new(), strings(&["b", "a"])), strings(&["a", "b"]));
    }

    #[test]
    fn view_urls() {
        let registry = registry("https://registry.example.com/registry");

        let keyword = registry.keyword_url().unwrap();
        assert_eq!(keyword.path(), "/registry/_design/app/_view/byKeyword");
        let pairs: Vec<(String, String)> = keyword.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                (String::from("startkey"), String::from(r#"["hubot"]"#)),
                (String::from("endkey"), String::from(r#"["hubot",{}]"#)),
                (String::from("group_level"), String::from("3")),
            ]
        );

        let dependents = registry.dependents_url().unwrap();
        assert_eq!(dependents.path(), "/registry/_design/app/_view/dependentVersions");
        assert!(dependents
            .query_pairs()
            .any(|(key, value)| key == "reduce" && value == "false"));
    }

    #[test]
    fn package_urls_are_escaped() {
        let registry = registry("https://registry.example.com/registry/");

        assert_eq!(
            registry.package_url("hubot-irc").unwrap().as_str(),
            "https://registry.example.com/registry/hubot-irc"
        );
        assert_eq!(
            registry.package_url("@hubot/irc").unwrap().as_str(),
            "https://registry.example.com/registry/@hubot%2Firc"
        );
    }

    #[test]
    fn invalid_registry_url() {
        let config = StatsConfig {
            registry: String::from("not a url"),
            ..StatsConfig::default()
        };

        assert!(matches!(Registry::new(&config), Err(Error::Url(_))));
    }
}
