//! npm registry (Node.js).
//!
//! ## API Strategy
//! - **fetch**: `registry.npmjs.org/{name}/latest` - latest published version document

use super::Registry;
use crate::http::{FetchError, Fetcher};
use crate::metadata::{PackageMetadata, clean_repository_url, text};
use async_trait::async_trait;
use serde_json::Value;

/// npm registry adapter.
pub struct Npm {
    registry: String,
}

impl Npm {
    /// Public npm registry.
    pub const DEFAULT_REGISTRY: &'static str = "https://registry.npmjs.org";

    pub fn new(registry: &str) -> Self {
        Self {
            registry: registry.trim_end_matches('/').to_string(),
        }
    }

    fn latest_url(&self, package: &str) -> String {
        format!("{}/{}/latest", self.registry, package)
    }
}

#[async_trait]
impl Registry for Npm {
    fn name(&self) -> &str {
        "npm"
    }

    fn display_name(&self) -> &str {
        "npm (JavaScript)"
    }

    async fn fetch(
        &self,
        identifier: &str,
        http: &dyn Fetcher,
    ) -> Result<PackageMetadata, FetchError> {
        let doc = http.get(&self.latest_url(identifier)).await?;
        Ok(parse_npm(&doc))
    }
}

/// Map an npm version document into [`PackageMetadata`].
pub fn parse_npm(v: &Value) -> PackageMetadata {
    let (author, author_email) = person(&v["author"]);

    let maintainers = v["maintainers"]
        .as_array()
        .map(|arr| {
            arr.iter()
                .map(|m| person(m).0)
                .filter(|name| !name.is_empty())
                .collect()
        })
        .unwrap_or_default();

    let keywords = v["keywords"]
        .as_array()
        .map(|arr| {
            arr.iter()
                .filter_map(|k| k.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default();

    let repository = v["repository"]
        .as_str()
        .or(v["repository"]["url"].as_str())
        .map(clean_repository_url)
        .unwrap_or_default();

    // Missing `dependencies` means none.
    let dependency_count = Some(
        v["dependencies"]
            .as_object()
            .map(|deps| deps.len() as u64)
            .unwrap_or(0),
    );

    PackageMetadata {
        version: text(&v["version"]),
        name: text(&v["name"]),
        description: text(&v["description"]),
        author,
        author_email,
        license: v["license"]
            .as_str()
            .or(v["license"]["type"].as_str())
            .unwrap_or_default()
            .to_string(),
        homepage: text(&v["homepage"]),
        repository_url: repository,
        keywords,
        maintainers,
        dependency_count,
        requires_runtime: text(&v["engines"]["node"]),
        ..Default::default()
    }
}

/// npm "person" field: `{name, email}` or `"Name <email> (url)"`.
fn person(value: &Value) -> (String, String) {
    if let Some(s) = value.as_str() {
        return parse_person_string(s);
    }
    (text(&value["name"]), text(&value["email"]))
}

fn parse_person_string(s: &str) -> (String, String) {
    let name_end = s.find(['<', '(']).unwrap_or(s.len());
    let name = s[..name_end].trim().to_string();

    let email = s
        .find('<')
        .and_then(|start| {
            s[start + 1..]
                .find('>')
                .map(|end| s[start + 1..start + 1 + end].trim().to_string())
        })
        .unwrap_or_default();

    (name, email)
}
