//! Trigger attribute grammar.
//!
//! ```text
//! <package>[,<target>[,<source>[,<format>]]]
//! <package>[,<target>[,<source>]],{<format>}
//! ```
//!
//! Whitespace around fields is insignificant and the source is
//! case-insensitive. When a `{...}` segment is present it is the format, and
//! any fourth comma field before it is ignored; the comma form is the legacy
//! spelling of the same field.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Parsed stamp request for one element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Descriptor {
    /// Package name or repository path. Never empty.
    pub package: String,
    /// Selector for the element(s) receiving the report.
    pub target: Option<String>,
    /// Lower-cased source name.
    pub source: String,
    /// Placeholder template; `None` renders the bare version.
    pub format: Option<String>,
}

/// Parameters of a programmatic stamp call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StampRequest {
    pub package_name: String,
    pub target: Option<String>,
    pub source: Option<String>,
    pub format: Option<String>,
    /// Return the metadata and report instead of writing to the document.
    pub return_data_only: bool,
}

impl Descriptor {
    pub const DEFAULT_SOURCE: &'static str = "npm";

    /// Build a descriptor from individual fields, normalizing them the same
    /// way the attribute parser does.
    pub fn new(
        package: &str,
        target: Option<&str>,
        source: Option<&str>,
        format: Option<&str>,
    ) -> Result<Self, ConfigError> {
        let package = package.trim();
        if package.is_empty() {
            return Err(ConfigError::MissingPackage);
        }

        let source = source
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(Self::DEFAULT_SOURCE)
            .to_ascii_lowercase();

        Ok(Self {
            package: package.to_string(),
            target: non_empty(target),
            source,
            format: non_empty(format),
        })
    }

    /// Parse a trigger attribute value.
    pub fn parse(attribute: &str) -> Result<Self, ConfigError> {
        let (prefix, braced) = match split_braced(attribute) {
            Some((prefix, format)) => (prefix, Some(format)),
            None => (attribute, None),
        };

        let mut fields = prefix.splitn(4, ',');
        let package = fields.next().unwrap_or_default();
        let target = fields.next();
        let source = fields.next();
        let legacy_format = fields.next();

        Self::new(package, target, source, braced.or(legacy_format))
    }

    /// Build a descriptor from a programmatic request.
    pub fn from_request(request: &StampRequest) -> Result<Self, ConfigError> {
        Self::new(
            &request.package_name,
            request.target.as_deref(),
            request.source.as_deref(),
            request.format.as_deref(),
        )
    }
}

impl FromStr for Descriptor {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Split `prefix{format}` at the first `{` and the last `}` after it.
fn split_braced(attribute: &str) -> Option<(&str, &str)> {
    let open = attribute.find('{')?;
    let close = attribute.rfind('}').filter(|close| *close > open)?;
    Some((&attribute[..open], &attribute[open + 1..close]))
}

fn non_empty(field: Option<&str>) -> Option<String> {
    field
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_only() {
        let d = Descriptor::parse("left-pad").unwrap();
        assert_eq!(d.package, "left-pad");
        assert_eq!(d.target, None);
        assert_eq!(d.source, "npm");
        assert_eq!(d.format, None);
    }

    #[test]
    fn test_all_comma_fields() {
        let d = Descriptor::parse(" octocat/hello , #status , GitHub , %version (%stars) ").unwrap();
        assert_eq!(d.package, "octocat/hello");
        assert_eq!(d.target.as_deref(), Some("#status"));
        assert_eq!(d.source, "github");
        assert_eq!(d.format.as_deref(), Some("%version (%stars)"));
    }

    #[test]
    fn test_legacy_format_keeps_commas() {
        let d = Descriptor::parse("flask,,pypi,%name, %version").unwrap();
        assert_eq!(d.format.as_deref(), Some("%name, %version"));
    }

    #[test]
    fn test_brace_and_comma_forms_agree() {
        let comma = Descriptor::parse("flask,.badge,pypi,%name %version").unwrap();
        let brace = Descriptor::parse("flask,.badge,pypi,{%name %version}").unwrap();
        assert_eq!(comma, brace);

        let comma = Descriptor::parse("left-pad,,,%version").unwrap();
        let brace = Descriptor::parse("left-pad,{%version}").unwrap();
        assert_eq!(comma, brace);
    }

    #[test]
    fn test_brace_format_may_contain_commas() {
        let d = Descriptor::parse("flask,,pypi,{%name, %version (%license)}").unwrap();
        assert_eq!(d.format.as_deref(), Some("%name, %version (%license)"));
        assert_eq!(d.source, "pypi");
        assert_eq!(d.target, None);
    }

    #[test]
    fn test_brace_wins_over_fourth_field() {
        let d = Descriptor::parse("flask,,pypi,%license,{%version}").unwrap();
        assert_eq!(d.format.as_deref(), Some("%version"));
    }

    #[test]
    fn test_empty_fields_default() {
        let d = Descriptor::parse("pkg, , ,").unwrap();
        assert_eq!(d.target, None);
        assert_eq!(d.source, "npm");
        assert_eq!(d.format, None);

        let d = Descriptor::parse("pkg,,,{ }").unwrap();
        assert_eq!(d.format, None);
    }

    #[test]
    fn test_unclosed_brace_is_literal() {
        let d = Descriptor::parse("pkg,,npm,{%version").unwrap();
        assert_eq!(d.format.as_deref(), Some("{%version"));
    }

    #[test]
    fn test_missing_package() {
        assert_eq!(Descriptor::parse(""), Err(ConfigError::MissingPackage));
        assert_eq!(Descriptor::parse(",x,npm"), Err(ConfigError::MissingPackage));
        assert_eq!(Descriptor::parse("   "), Err(ConfigError::MissingPackage));
        assert_eq!(Descriptor::parse("{%version}"), Err(ConfigError::MissingPackage));
    }

    #[test]
    fn test_from_str() {
        let d: Descriptor = "requests,,PyPI".parse().unwrap();
        assert_eq!(d.source, "pypi");
    }

    #[test]
    fn test_from_request() {
        let request = StampRequest {
            package_name: " left-pad ".to_string(),
            source: Some("".to_string()),
            format: Some("%version".to_string()),
            ..Default::default()
        };
        let d = Descriptor::from_request(&request).unwrap();
        assert_eq!(d.package, "left-pad");
        assert_eq!(d.source, "npm");
        assert_eq!(d.format.as_deref(), Some("%version"));

        let empty = StampRequest::default();
        assert_eq!(Descriptor::from_request(&empty), Err(ConfigError::MissingPackage));
    }

    #[test]
    fn test_request_from_json() {
        let request: StampRequest = serde_json::from_str(
            r#"{"packageName": "flask", "source": "pypi", "returnDataOnly": true}"#,
        )
        .unwrap();
        assert_eq!(request.package_name, "flask");
        assert!(request.return_data_only);
        assert_eq!(request.target, None);
    }
}
