//! GitHub releases and repository details.
//!
//! ## API Strategy
//! - **fetch**: `api.github.com/repos/{repo}/releases/latest` for the version,
//!   `api.github.com/repos/{repo}` for stars, forks and the rest

use super::Registry;
use crate::http::{FetchError, Fetcher};
use crate::metadata::{PackageMetadata, count, first_text, locale_date, strip_tag_prefix, text};
use async_trait::async_trait;
use serde_json::Value;

/// GitHub REST API adapter. Identifiers are `owner/repo`.
pub struct GitHub {
    api: String,
}

impl GitHub {
    /// Public GitHub API.
    pub const DEFAULT_API: &'static str = "https://api.github.com";

    pub fn new(api: &str) -> Self {
        Self {
            api: api.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl Registry for GitHub {
    fn name(&self) -> &str {
        "github"
    }

    fn display_name(&self) -> &str {
        "GitHub"
    }

    async fn fetch(
        &self,
        identifier: &str,
        http: &dyn Fetcher,
    ) -> Result<PackageMetadata, FetchError> {
        let repo = identifier.trim_matches('/');
        let release_url = format!("{}/repos/{}/releases/latest", self.api, repo);
        let repo_url = format!("{}/repos/{}", self.api, repo);

        let (release, details) = tokio::try_join!(http.get(&release_url), http.get(&repo_url))?;
        Ok(parse_github(&release, &details))
    }
}

/// Combine a latest-release document and a repository document.
pub fn parse_github(release: &Value, repo: &Value) -> PackageMetadata {
    let license = &repo["license"];
    let license = match license["spdx_id"].as_str() {
        Some(id) if id != "NOASSERTION" => id.to_string(),
        _ => text(&license["name"]),
    };

    let keywords = repo["topics"]
        .as_array()
        .map(|arr| {
            arr.iter()
                .filter_map(|t| t.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default();

    PackageMetadata {
        version: strip_tag_prefix(&text(&release["tag_name"])).to_string(),
        name: text(&repo["name"]),
        description: text(&repo["description"]),
        author: text(&repo["owner"]["login"]),
        license,
        homepage: first_text(&[&repo["homepage"], &repo["html_url"]]),
        repository_url: text(&repo["html_url"]),
        last_update_date: locale_date(&first_text(&[&repo["pushed_at"], &repo["updated_at"]])),
        keywords,
        stars: count(&repo["stargazers_count"]),
        forks: count(&repo["forks_count"]),
        watchers: count(&repo["subscribers_count"]).or(count(&repo["watchers_count"])),
        open_issues: count(&repo["open_issues_count"]),
        language: text(&repo["language"]),
        owner: text(&repo["owner"]["login"]),
        full_name: text(&repo["full_name"]),
        default_branch: text(&repo["default_branch"]),
        release_date: locale_date(&first_text(&[
            &release["published_at"],
            &release["created_at"],
        ])),
        release_author: text(&release["author"]["login"]),
        release_notes: text(&release["body"]),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::MockFetcher;
    use serde_json::json;

    fn release() -> Value {
        json!({
            "tag_name": "v2.0.0",
            "published_at": "2024-03-05T10:00:00Z",
            "author": {"login": "monalisa"},
            "body": "Bug fixes."
        })
    }

    fn repo() -> Value {
        json!({
            "name": "hello-world",
            "full_name": "octocat/hello-world",
            "description": "My first repository",
            "owner": {"login": "octocat"},
            "html_url": "https://github.com/octocat/hello-world",
            "homepage": null,
            "language": "Rust",
            "license": {"spdx_id": "MIT", "name": "MIT License"},
            "stargazers_count": 1500,
            "forks_count": 0,
            "subscribers_count": 12,
            "watchers_count": 1500,
            "open_issues_count": 3,
            "default_branch": "main",
            "pushed_at": "2024-03-06T08:00:00Z",
            "topics": ["demo"]
        })
    }

    #[test]
    fn test_parse_github() {
        let meta = parse_github(&release(), &repo());
        assert_eq!(meta.version, "2.0.0");
        assert_eq!(meta.name, "hello-world");
        assert_eq!(meta.full_name, "octocat/hello-world");
        assert_eq!(meta.owner, "octocat");
        assert_eq!(meta.license, "MIT");
        assert_eq!(meta.homepage, "https://github.com/octocat/hello-world");
        assert_eq!(meta.stars, Some(1500));
        assert_eq!(meta.forks, Some(0));
        assert_eq!(meta.watchers, Some(12));
        assert_eq!(meta.open_issues, Some(3));
        assert_eq!(meta.release_date, "3/5/2024");
        assert_eq!(meta.release_author, "monalisa");
        assert_eq!(meta.release_notes, "Bug fixes.");
        assert_eq!(meta.last_update_date, "3/6/2024");
        assert_eq!(meta.keywords, vec!["demo"]);
    }

    #[test]
    fn test_tag_without_prefix_passes_through() {
        let meta = parse_github(&json!({"tag_name": "2024.1"}), &json!({}));
        assert_eq!(meta.version, "2024.1");
        assert_eq!(meta.stars, None);
    }

    #[test]
    fn test_noassertion_license_falls_back_to_name() {
        let repo = json!({"license": {"spdx_id": "NOASSERTION", "name": "Other"}});
        assert_eq!(parse_github(&json!({}), &repo).license, "Other");
    }

    #[tokio::test]
    async fn test_fetch_makes_two_lookups() {
        let http = MockFetcher::new()
            .with_json(
                "https://api.github.com/repos/octocat/hello-world/releases/latest",
                release(),
            )
            .with_json("https://api.github.com/repos/octocat/hello-world", repo());

        let meta = GitHub::new(GitHub::DEFAULT_API)
            .fetch("octocat/hello-world", &http)
            .await
            .unwrap();
        assert_eq!(meta.version, "2.0.0");
        assert_eq!(meta.stars, Some(1500));
        assert_eq!(http.calls(), 2);
    }

    #[tokio::test]
    async fn test_missing_release_fails_lookup() {
        let http = MockFetcher::new()
            .with_json("https://api.github.com/repos/octocat/hello-world", repo());

        let err = GitHub::new(GitHub::DEFAULT_API)
            .fetch("octocat/hello-world", &http)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 404, .. }));
    }
}
