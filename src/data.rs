use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct ViewResponse<R> {
    pub rows: Vec<R>,
    // incomplete
}

/// Row of the keyword view, keyed by `[keyword, name, description]`.
#[derive(Debug, Deserialize)]
pub struct KeywordRow {
    pub key: Vec<Value>,
}

impl KeywordRow {
    pub fn package(&self) -> Option<&str> {
        self.key.get(1).and_then(Value::as_str)
    }
}

#[derive(Debug, Deserialize)]
pub struct DependentRow {
    pub id: String,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum Person {
    Name(String),
    Structured {
        name: Option<String>,
        email: Option<String>,
    },
}

impl Person {
    /// Name of a structured person is preferred over its email, raw strings are used as-is.
    pub fn display_name(&self) -> Option<&str> {
        fn non_empty(value: &Option<String>) -> Option<&str> {
            value.as_deref().filter(|value| !value.is_empty())
        }

        match self {
            Person::Name(name) => Some(name.as_str()),
            Person::Structured { name, email } => non_empty(name).or_else(|| non_empty(email)),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PackageRecord {
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_person")]
    pub author: Option<Person>,
    #[serde(default, deserialize_with = "lenient_people")]
    pub maintainers: Vec<Person>,
    /// event label -> timestamp, in document order
    #[serde(default)]
    pub time: Map<String, Value>,
    #[serde(default, rename = "dist-tags")]
    pub dist_tags: Map<String, Value>,
    // incomplete
}

fn lenient_person<'de, D>(deserializer: D) -> Result<Option<Person>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|value| serde_json::from_value(value).ok()))
}

fn lenient_people<'de, D>(deserializer: D) -> Result<Vec<Person>, D::Error>
where
    D: Deserializer<'de>,
{
    let people = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(values)) => values
            .into_iter()
            .filter_map(|value| serde_json::from_value(value).ok())
            .collect(),
        _ => Vec::new(),
    };

    Ok(people)
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct TimestampEntry {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest: Option<String>,
    pub releases: Vec<String>,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct BucketCounts {
    pub created: u64,
    pub modified: u64,
    pub releases: u64,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Summary {
    pub updated: String,
    pub contributors: usize,
}
