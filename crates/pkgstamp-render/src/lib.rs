//! Report rendering: `%placeholder` templates over [`PackageMetadata`].
//!
//! A template mixes literal prose and punctuation with placeholders such as
//! `%version` or `%stars`. Placeholders a source can't fill resolve to the
//! empty string, so the rendered text is cleaned up afterwards: dangling
//! commas, doubled spaces and empty `()` pairs are removed.
//!
//! ```ignore
//! let report = pkgstamp_render::render(&meta, Some("%name %version (%license)"));
//! ```

use chrono::Datelike;
use pkgstamp_registry::PackageMetadata;
use regex::{Captures, Regex};
use std::sync::OnceLock;

/// Template placeholders, in matching order (longest token first where one
/// token could prefix another).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Placeholder {
    ReleaseNotes,
    ReleaseDate,
    LastUpdate,
    Maintainers,
    Description,
    Repository,
    Downloads,
    Homepage,
    Language,
    Requires,
    Version,
    License,
    Author,
    Owner,
    Stars,
    Forks,
    Name,
    Year,
    Copy,
}

impl Placeholder {
    pub const ALL: &'static [Placeholder] = &[
        Self::ReleaseNotes,
        Self::ReleaseDate,
        Self::LastUpdate,
        Self::Maintainers,
        Self::Description,
        Self::Repository,
        Self::Downloads,
        Self::Homepage,
        Self::Language,
        Self::Requires,
        Self::Version,
        Self::License,
        Self::Author,
        Self::Owner,
        Self::Stars,
        Self::Forks,
        Self::Name,
        Self::Year,
        Self::Copy,
    ];

    /// Token as written in templates, without the `%`.
    pub fn token(&self) -> &'static str {
        match self {
            Self::ReleaseNotes => "release-notes",
            Self::ReleaseDate => "release-date",
            Self::LastUpdate => "last-update",
            Self::Maintainers => "maintainers",
            Self::Description => "description",
            Self::Repository => "repository",
            Self::Downloads => "downloads",
            Self::Homepage => "homepage",
            Self::Language => "language",
            Self::Requires => "requires",
            Self::Version => "version",
            Self::License => "license",
            Self::Author => "author",
            Self::Owner => "owner",
            Self::Stars => "stars",
            Self::Forks => "forks",
            Self::Name => "name",
            Self::Year => "year",
            Self::Copy => "copy",
        }
    }

    /// Parse a token (without `%`), ignoring case.
    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .find(|p| p.token().eq_ignore_ascii_case(token))
            .copied()
    }

    /// What the placeholder expands to.
    pub fn describe(&self) -> &'static str {
        match self {
            Self::ReleaseNotes => "notes of the latest release",
            Self::ReleaseDate => "date of the latest release",
            Self::LastUpdate => "date of the last update",
            Self::Maintainers => "maintainer names, comma separated",
            Self::Description => "package description",
            Self::Repository => "source repository URL",
            Self::Downloads => "download count over the widest reported window",
            Self::Homepage => "project homepage",
            Self::Language => "primary language",
            Self::Requires => "required runtime version",
            Self::Version => "latest version",
            Self::License => "license",
            Self::Author => "author",
            Self::Owner => "repository owner",
            Self::Stars => "star count",
            Self::Forks => "fork count",
            Self::Name => "package name",
            Self::Year => "current year",
            Self::Copy => "copyright sign",
        }
    }

    /// The value this placeholder takes for `meta`.
    pub fn value(&self, meta: &PackageMetadata) -> String {
        match self {
            Self::ReleaseNotes => meta.release_notes.clone(),
            Self::ReleaseDate => meta.release_date.clone(),
            Self::LastUpdate => meta.last_update_date.clone(),
            Self::Maintainers => meta.maintainers.join(", "),
            Self::Description => meta.description.clone(),
            Self::Repository => meta.repository_url.clone(),
            Self::Downloads => digits(meta.downloads.widest()),
            Self::Homepage => meta.homepage.clone(),
            Self::Language => meta.language.clone(),
            Self::Requires => meta.requires_runtime.clone(),
            Self::Version => meta.version.clone(),
            Self::License => meta.license.clone(),
            Self::Author => meta.author.clone(),
            Self::Owner => meta.owner.clone(),
            Self::Stars => digits(meta.stars),
            Self::Forks => digits(meta.forks),
            Self::Name => meta.name.clone(),
            Self::Year => chrono::Local::now().year().to_string(),
            Self::Copy => "\u{a9}".to_string(),
        }
    }
}

fn digits(count: Option<u64>) -> String {
    count.map(|n| n.to_string()).unwrap_or_default()
}

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        let alternatives: Vec<&str> = Placeholder::ALL.iter().map(|p| p.token()).collect();
        Regex::new(&format!("(?i)%({})", alternatives.join("|"))).expect("placeholder pattern")
    })
}

/// Render a report: the bare version without a template, otherwise the
/// expanded and cleaned-up template.
pub fn render(meta: &PackageMetadata, template: Option<&str>) -> String {
    match template {
        None => meta.version.clone(),
        Some(template) => cleanup(&expand(meta, template)),
    }
}

/// Replace every known placeholder, case-insensitively, in one pass.
/// Unknown `%tokens` are left as written.
pub fn expand(meta: &PackageMetadata, template: &str) -> String {
    placeholder_regex()
        .replace_all(template, |caps: &Captures| {
            Placeholder::from_token(&caps[1])
                .map(|p| p.value(meta))
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

struct CleanupRules {
    whitespace: Regex,
    space_before_comma: Regex,
    comma_runs: Regex,
    edge_commas: Regex,
}

fn cleanup_rules() -> &'static CleanupRules {
    static RULES: OnceLock<CleanupRules> = OnceLock::new();
    RULES.get_or_init(|| CleanupRules {
        whitespace: Regex::new(r"\s+").expect("whitespace pattern"),
        space_before_comma: Regex::new(r"\s+,").expect("comma pattern"),
        comma_runs: Regex::new(r",+").expect("comma run pattern"),
        edge_commas: Regex::new(r"^,+|,+$").expect("edge comma pattern"),
    })
}

/// Normalize an expanded template so empty substitutions leave no trace.
///
/// Rules run in order, and the whole sequence repeats until nothing changes:
/// removing `()` can expose a trailing comma or a double space.
pub fn cleanup(text: &str) -> String {
    let mut current = text.to_string();
    loop {
        let next = cleanup_pass(&current);
        if next == current {
            return next;
        }
        current = next;
    }
}

fn cleanup_pass(text: &str) -> String {
    let rules = cleanup_rules();
    let s = rules.whitespace.replace_all(text, " ");
    let s = rules.space_before_comma.replace_all(&s, ",");
    let s = rules.comma_runs.replace_all(&s, ",");
    let s = s.trim();
    let s = rules.edge_commas.replace_all(s, "");
    s.replace("()", "")
}
