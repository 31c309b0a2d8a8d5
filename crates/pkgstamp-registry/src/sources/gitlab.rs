//! GitLab releases and project details.
//!
//! ## API Strategy
//! - **fetch**: `gitlab.com/api/v4/projects/{path}/releases` (newest first) and
//!   `gitlab.com/api/v4/projects/{path}`, with the project path URL-encoded so
//!   subgroups (`group/sub/project`) address a single project

use super::Registry;
use crate::http::{FetchError, Fetcher};
use crate::metadata::{PackageMetadata, count, first_text, locale_date, strip_tag_prefix, text};
use async_trait::async_trait;
use serde_json::Value;

/// GitLab REST API (v4) adapter. Identifiers are full project paths.
pub struct GitLab {
    api: String,
}

impl GitLab {
    /// gitlab.com API.
    pub const DEFAULT_API: &'static str = "https://gitlab.com/api/v4";

    pub fn new(api: &str) -> Self {
        Self {
            api: api.trim_end_matches('/').to_string(),
        }
    }

    fn project_url(&self, path: &str) -> String {
        format!(
            "{}/projects/{}",
            self.api,
            urlencoding::encode(path.trim_matches('/'))
        )
    }
}

#[async_trait]
impl Registry for GitLab {
    fn name(&self) -> &str {
        "gitlab"
    }

    fn display_name(&self) -> &str {
        "GitLab"
    }

    async fn fetch(
        &self,
        identifier: &str,
        http: &dyn Fetcher,
    ) -> Result<PackageMetadata, FetchError> {
        let project_url = self.project_url(identifier);
        let releases_url = format!("{}/releases", project_url);

        let (releases, project) =
            tokio::try_join!(http.get(&releases_url), http.get(&project_url))?;
        if !releases.as_array().is_some_and(|list| !list.is_empty()) {
            return Err(FetchError::Missing {
                url: releases_url,
                what: "releases".to_string(),
            });
        }
        Ok(parse_gitlab(&releases, &project))
    }
}

/// Combine a releases list and a project document.
pub fn parse_gitlab(releases: &Value, project: &Value) -> PackageMetadata {
    let latest = &releases[0];

    let keywords = project["topics"]
        .as_array()
        .or(project["tag_list"].as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|t| t.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default();

    PackageMetadata {
        version: strip_tag_prefix(&text(&latest["tag_name"])).to_string(),
        name: text(&project["name"]),
        description: text(&project["description"]),
        author: text(&project["namespace"]["name"]),
        license: text(&project["license"]["name"]),
        homepage: text(&project["web_url"]),
        repository_url: text(&project["web_url"]),
        last_update_date: locale_date(&text(&project["last_activity_at"])),
        keywords,
        stars: count(&project["star_count"]),
        forks: count(&project["forks_count"]),
        open_issues: count(&project["open_issues_count"]),
        owner: text(&project["namespace"]["name"]),
        full_name: text(&project["path_with_namespace"]),
        default_branch: text(&project["default_branch"]),
        release_date: locale_date(&first_text(&[&latest["released_at"], &latest["created_at"]])),
        release_author: first_text(&[&latest["author"]["name"], &latest["author"]["username"]]),
        release_notes: text(&latest["description"]),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::MockFetcher;
    use serde_json::json;

    fn releases() -> Value {
        json!([
            {
                "tag_name": "v16.1.0",
                "released_at": "2024-05-20T12:00:00.000Z",
                "author": {"name": "Release Bot", "username": "release-bot"},
                "description": "Highlights"
            },
            {"tag_name": "v16.0.0", "released_at": "2024-04-18T12:00:00.000Z"}
        ])
    }

    fn project() -> Value {
        json!({
            "name": "runner",
            "path_with_namespace": "gitlab-org/ci/runner",
            "description": "CI runner",
            "namespace": {"name": "CI"},
            "web_url": "https://gitlab.com/gitlab-org/ci/runner",
            "star_count": 2400,
            "forks_count": 1000,
            "open_issues_count": 0,
            "default_branch": "main",
            "last_activity_at": "2024-05-21T09:30:00.000Z",
            "topics": ["ci"]
        })
    }

    #[test]
    fn test_parse_gitlab() {
        let meta = parse_gitlab(&releases(), &project());
        assert_eq!(meta.version, "16.1.0");
        assert_eq!(meta.full_name, "gitlab-org/ci/runner");
        assert_eq!(meta.owner, "CI");
        assert_eq!(meta.stars, Some(2400));
        assert_eq!(meta.open_issues, Some(0));
        assert_eq!(meta.release_date, "5/20/2024");
        assert_eq!(meta.release_author, "Release Bot");
        assert_eq!(meta.last_update_date, "5/21/2024");
        assert_eq!(meta.license, "");
    }

    #[tokio::test]
    async fn test_no_releases_is_missing() {
        let releases_url = "https://gitlab.com/api/v4/projects/g%2Ftool/releases";
        let http = MockFetcher::new()
            .with_json(releases_url, json!([]))
            .with_json("https://gitlab.com/api/v4/projects/g%2Ftool", project());

        let err = GitLab::new(GitLab::DEFAULT_API)
            .fetch("g/tool", &http)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            FetchError::Missing {
                url: releases_url.to_string(),
                what: "releases".to_string()
            }
        );
    }

    #[test]
    fn test_project_path_is_encoded() {
        let gitlab = GitLab::new("https://gitlab.example.com/api/v4/");
        assert_eq!(
            gitlab.project_url("group/sub/project"),
            "https://gitlab.example.com/api/v4/projects/group%2Fsub%2Fproject"
        );
    }

    #[tokio::test]
    async fn test_fetch_encoded_subgroup() {
        let http = MockFetcher::new()
            .with_json(
                "https://gitlab.com/api/v4/projects/gitlab-org%2Fci%2Frunner/releases",
                releases(),
            )
            .with_json(
                "https://gitlab.com/api/v4/projects/gitlab-org%2Fci%2Frunner",
                project(),
            );

        let meta = GitLab::new(GitLab::DEFAULT_API)
            .fetch("gitlab-org/ci/runner", &http)
            .await
            .unwrap();
        assert_eq!(meta.version, "16.1.0");
        assert_eq!(http.calls(), 2);
    }
}
