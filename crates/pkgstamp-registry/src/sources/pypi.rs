//! PyPI (Python).
//!
//! ## API Strategy
//! - **fetch**: `pypi.org/pypi/{name}/json` - project document, metadata under `info`,
//!   release files of the latest version under `urls`

use super::Registry;
use crate::http::{FetchError, Fetcher};
use crate::metadata::{Downloads, PackageMetadata, count, first_text, locale_date, text};
use async_trait::async_trait;
use serde_json::Value;

/// PyPI JSON API adapter.
pub struct PyPi {
    base: String,
}

impl PyPi {
    /// Public PyPI.
    pub const DEFAULT_BASE: &'static str = "https://pypi.org";

    pub fn new(base: &str) -> Self {
        Self {
            base: base.trim_end_matches('/').to_string(),
        }
    }

    fn project_url(&self, package: &str) -> String {
        format!("{}/pypi/{}/json", self.base, package)
    }
}

#[async_trait]
impl Registry for PyPi {
    fn name(&self) -> &str {
        "pypi"
    }

    fn display_name(&self) -> &str {
        "PyPI (Python)"
    }

    async fn fetch(
        &self,
        identifier: &str,
        http: &dyn Fetcher,
    ) -> Result<PackageMetadata, FetchError> {
        let doc = http.get(&self.project_url(identifier)).await?;
        Ok(parse_pypi(&doc))
    }
}

/// Map a PyPI project document into [`PackageMetadata`].
pub fn parse_pypi(v: &Value) -> PackageMetadata {
    let info = &v["info"];
    let latest_file = &v["urls"][0];
    let urls = &info["project_urls"];

    let uploaded = locale_date(&first_text(&[
        &latest_file["upload_time_iso_8601"],
        &latest_file["upload_time"],
    ]));

    // The per-file counter is the documented source; the project-level
    // block only fills in what it lacks.
    let downloads = Downloads {
        last_day: count(&latest_file["downloads"]).or(count(&info["downloads"]["last_day"])),
        last_week: count(&info["downloads"]["last_week"]),
        last_month: count(&info["downloads"]["last_month"]),
    };

    let keywords = text(&info["keywords"])
        .split([',', ' '])
        .filter(|k| !k.is_empty())
        .map(String::from)
        .collect();

    let maintainers = [text(&info["maintainer"])]
        .into_iter()
        .filter(|m| !m.is_empty())
        .collect();

    PackageMetadata {
        version: text(&info["version"]),
        name: text(&info["name"]),
        description: text(&info["summary"]),
        author: text(&info["author"]),
        author_email: text(&info["author_email"]),
        license: first_text(&[&info["license_expression"], &info["license"]]),
        homepage: first_text(&[&info["home_page"], &urls["Homepage"], &urls["homepage"]]),
        repository_url: first_text(&[
            &urls["Source"],
            &urls["Source Code"],
            &urls["Repository"],
            &urls["GitHub"],
        ]),
        last_update_date: uploaded.clone(),
        release_date: uploaded,
        keywords,
        maintainers,
        dependency_count: info["requires_dist"].as_array().map(|deps| {
            deps.iter()
                .filter_map(|d| d.as_str())
                .filter(|d| !is_extra(d))
                .count() as u64
        }),
        requires_runtime: text(&info["requires_python"]),
        downloads,
        ..Default::default()
    }
}

/// Whether a `requires_dist` entry only applies to an optional extra.
fn is_extra(requirement: &str) -> bool {
    requirement
        .split_once(';')
        .is_some_and(|(_, marker)| marker.contains("extra"))
}
