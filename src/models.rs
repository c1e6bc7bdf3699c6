// src/models.rs
// =============================================================================
// The data types shared by the store, the health checker and the API.
//
// - Link: one bookmark, as it is stored in links.json and sent over the API
// - Health: the outcome of the most recent probe of a link
// - Category: one node of the category tree built from link paths
//
// Field names are camelCase on the wire (statusCode, lastChecked) so files
// written by earlier versions of linksnapper load unchanged. Those files can
// also hold "path": null and the zero time 0001-01-01T00:00:00Z for links
// that were never checked; both read back as "not set".
// =============================================================================

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Path assigned to links that arrive without one
pub const DEFAULT_CATEGORY: &str = "Uncategorized";

/// A stored bookmark
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    /// Assigned by the store when empty, never changed afterwards
    #[serde(default)]
    pub id: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Category segments from the root, e.g. ["Dev", "Rust"]
    #[serde(default, deserialize_with = "null_as_empty")]
    pub path: Vec<String>,
    #[serde(default)]
    pub health: Health,
    #[serde(
        default,
        deserialize_with = "zero_time_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_checked: Option<DateTime<Utc>>,
}

// "path": null reads the same as a missing path
fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    // Option<T> accepts null as None, then None becomes an empty Vec
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

// 0001-01-01T00:00:00Z means "never checked", not a real check in year 1
fn zero_time_as_none<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let checked = Option::<DateTime<Utc>>::deserialize(deserializer)?;
    Ok(checked.filter(|at| at.year() > 1))
}

impl Link {
    /// Gives an empty path the single "Uncategorized" segment
    pub fn normalize_path(&mut self) {
        if self.path.is_empty() {
            self.path = vec![DEFAULT_CATEGORY.to_string()];
        }
    }
}

#[cfg(test)]
impl Link {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn with_path<I, S>(mut self, path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.path = path.into_iter().map(Into::into).collect();
        self
    }
}

/// Where a link stands after its last probe
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Never checked. Older files store this as an empty string.
    #[default]
    #[serde(alias = "")]
    Unknown,
    Healthy,
    Unhealthy,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Unknown => "unknown",
            HealthStatus::Healthy => "healthy",
            HealthStatus::Unhealthy => "unhealthy",
        }
    }
}

/// Result of probing a link
///
/// `status_code` is set whenever a response came back; `error` only when
/// no response did (or the URL could not be requested at all).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Health {
    #[serde(default)]
    pub status: HealthStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Health {
    pub fn healthy(status_code: u16) -> Self {
        Self {
            status: HealthStatus::Healthy,
            status_code: Some(status_code),
            error: None,
        }
    }

    /// Unhealthy because the server answered with a bad status
    pub fn bad_status(status_code: u16) -> Self {
        Self {
            status: HealthStatus::Unhealthy,
            status_code: Some(status_code),
            error: None,
        }
    }

    /// Unhealthy because no response was received
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Unhealthy,
            status_code: None,
            error: Some(error.into()),
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == HealthStatus::Healthy
    }

    pub fn is_unhealthy(&self) -> bool {
        self.status == HealthStatus::Unhealthy
    }
}

/// One node of the category tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    pub name: String,
    /// Segments from the root down to and including this node
    pub path: Vec<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub categories: BTreeMap<String, Category>,
}

impl Category {
    pub fn new(name: impl Into<String>, path: Vec<String>) -> Self {
        Self {
            name: name.into(),
            path,
            categories: BTreeMap::new(),
        }
    }
}
