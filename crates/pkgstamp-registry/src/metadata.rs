//! Canonical package metadata shared by every registry.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Download counters over fixed windows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Downloads {
    pub last_day: Option<u64>,
    pub last_week: Option<u64>,
    pub last_month: Option<u64>,
}

impl Downloads {
    /// The widest window the registry reported.
    pub fn widest(&self) -> Option<u64> {
        self.last_month.or(self.last_week).or(self.last_day)
    }
}

/// Package metadata normalized across npm, PyPI, GitHub and GitLab.
///
/// Text fields are empty when the registry doesn't expose them. Counts are
/// `None` when the registry has no such counter and `Some(0)` for a genuine
/// zero. Dates are locale date strings (`M/D/YYYY`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageMetadata {
    pub version: String,
    pub name: String,
    pub description: String,
    pub author: String,
    pub author_email: String,
    pub license: String,
    pub homepage: String,
    pub repository_url: String,
    pub last_update_date: String,
    pub keywords: Vec<String>,
    pub maintainers: Vec<String>,
    pub dependency_count: Option<u64>,
    pub requires_runtime: String,
    pub downloads: Downloads,
    pub stars: Option<u64>,
    pub forks: Option<u64>,
    pub watchers: Option<u64>,
    pub open_issues: Option<u64>,
    pub language: String,
    pub owner: String,
    pub full_name: String,
    pub default_branch: String,
    pub release_date: String,
    pub release_author: String,
    pub release_notes: String,
}

/// String value or empty.
pub(crate) fn text(value: &Value) -> String {
    value.as_str().map(str::trim).unwrap_or_default().to_string()
}

/// First non-empty string among `values`.
pub(crate) fn first_text(values: &[&Value]) -> String {
    values
        .iter()
        .map(|v| text(v))
        .find(|s| !s.is_empty())
        .unwrap_or_default()
}

/// Non-negative integer count. Registries use `-1` for "not tracked".
pub(crate) fn count(value: &Value) -> Option<u64> {
    value
        .as_u64()
        .or_else(|| value.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
}

/// Strip a leading `v` from a release tag (`v1.2.3` -> `1.2.3`).
pub fn strip_tag_prefix(tag: &str) -> &str {
    tag.strip_prefix('v').unwrap_or(tag)
}

/// Render a registry timestamp as a locale date string (`M/D/YYYY`).
///
/// Accepts RFC 3339, naive ISO datetimes (PyPI's `upload_time`) and bare
/// dates. Anything else passes through unchanged.
pub fn locale_date(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return String::new();
    }

    let date = DateTime::parse_from_rfc3339(raw)
        .map(|d| d.date_naive())
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").map(|d| d.date()))
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S").map(|d| d.date()))
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"));

    match date {
        Ok(date) => date.format("%-m/%-d/%Y").to_string(),
        Err(_) => raw.to_string(),
    }
}

/// Normalize a repository link: `git+https://x/y.git` -> `https://x/y`.
pub(crate) fn clean_repository_url(url: &str) -> String {
    let url = url.trim();
    let url = url.strip_prefix("git+").unwrap_or(url);
    let url = url.strip_suffix(".git").unwrap_or(url);
    url.to_string()
}
