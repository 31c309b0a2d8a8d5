//! Configuration system for pkgstamp.
//!
//! Loads config from:
//! 1. Global: ~/.config/pkgstamp/config.toml
//! 2. Per-project: .pkgstamp/config.toml (overrides global)
//! 3. An explicit file passed with `--config` (overrides both)
//!
//! Example config.toml:
//! ```toml
//! [page]
//! attribute = "data-pkgstamp"
//! default_selectors = ["#pkgstamp", ".pkgstamp"]
//! strict_targets = true
//! fallback = "n/a"
//!
//! [registry]
//! gitlab = "https://gitlab.example.com/api/v4"
//! user_agent = "my-site/1.0"
//! timeout_secs = 10
//! ```

use pkgstamp_registry::Endpoints;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Error loading an explicitly requested config file.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Toml {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Page hydration settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct PageConfig {
    /// Trigger attribute carrying the stamp descriptor.
    pub attribute: Option<String>,
    /// Selectors used when a descriptor names no target.
    pub default_selectors: Option<Vec<String>>,
    /// Fail elements whose targets resolve to nothing (otherwise no-op).
    pub strict_targets: Option<bool>,
    /// Text written when a registry returns no data. Unset leaves targets untouched.
    pub fallback: Option<String>,
    /// Marker recording that a target already received a report.
    pub mark: Option<String>,
}

/// Registry endpoints and transport settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RegistryConfig {
    pub npm: Option<String>,
    pub pypi: Option<String>,
    pub github: Option<String>,
    pub gitlab: Option<String>,
    pub user_agent: Option<String>,
    pub timeout_secs: Option<u64>,
}

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct StampConfig {
    pub page: PageConfig,
    pub registry: RegistryConfig,
}

/// Resolved page settings, every field filled in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSettings {
    pub attribute: String,
    pub default_selectors: Vec<String>,
    pub strict_targets: bool,
    pub fallback: Option<String>,
    pub mark: String,
}

impl Default for PageSettings {
    fn default() -> Self {
        StampConfig::default().page_settings()
    }
}

impl StampConfig {
    pub const DEFAULT_ATTRIBUTE: &'static str = "data-pkgstamp";
    pub const DEFAULT_MARK: &'static str = "pkgstamp-done";
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// Load configuration for a project.
    ///
    /// Loads global config from ~/.config/pkgstamp/config.toml,
    /// then merges with per-project config from .pkgstamp/config.toml.
    /// Unreadable or malformed files are skipped with a warning.
    pub fn load(root: &Path) -> Self {
        let mut config = Self::default();

        if let Some(global_path) = Self::global_config_path() {
            if let Some(global) = Self::load_optional(&global_path) {
                config = config.merge(global);
            }
        }

        let project_path = root.join(".pkgstamp").join("config.toml");
        if let Some(project) = Self::load_optional(&project_path) {
            config = config.merge(project);
        }

        config
    }

    /// Load a single config file.
    pub fn load_file(path: &Path) -> Result<Self, LoadError> {
        let content = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| LoadError::Toml {
            path: path.to_path_buf(),
            source,
        })
    }

    fn load_optional(path: &Path) -> Option<Self> {
        if !path.exists() {
            return None;
        }
        match Self::load_file(path) {
            Ok(config) => Some(config),
            Err(e) => {
                tracing::warn!(error = %e, "ignoring config file");
                None
            }
        }
    }

    /// Get the global config path.
    fn global_config_path() -> Option<PathBuf> {
        let config_home = std::env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .ok()
            .or_else(|| dirs::home_dir().map(|h| h.join(".config")))?;
        Some(config_home.join("pkgstamp").join("config.toml"))
    }

    /// Merge another config into this one. Fields set in `other` win.
    pub fn merge(self, other: Self) -> Self {
        Self {
            page: PageConfig {
                attribute: other.page.attribute.or(self.page.attribute),
                default_selectors: other.page.default_selectors.or(self.page.default_selectors),
                strict_targets: other.page.strict_targets.or(self.page.strict_targets),
                fallback: other.page.fallback.or(self.page.fallback),
                mark: other.page.mark.or(self.page.mark),
            },
            registry: RegistryConfig {
                npm: other.registry.npm.or(self.registry.npm),
                pypi: other.registry.pypi.or(self.registry.pypi),
                github: other.registry.github.or(self.registry.github),
                gitlab: other.registry.gitlab.or(self.registry.gitlab),
                user_agent: other.registry.user_agent.or(self.registry.user_agent),
                timeout_secs: other.registry.timeout_secs.or(self.registry.timeout_secs),
            },
        }
    }

    pub fn page_settings(&self) -> PageSettings {
        let page = &self.page;
        PageSettings {
            attribute: page
                .attribute
                .clone()
                .unwrap_or_else(|| Self::DEFAULT_ATTRIBUTE.to_string()),
            default_selectors: page
                .default_selectors
                .clone()
                .unwrap_or_else(|| vec!["#pkgstamp".to_string(), ".pkgstamp".to_string()]),
            strict_targets: page.strict_targets.unwrap_or(true),
            fallback: page.fallback.clone(),
            mark: page
                .mark
                .clone()
                .unwrap_or_else(|| Self::DEFAULT_MARK.to_string()),
        }
    }

    pub fn endpoints(&self) -> Endpoints {
        let defaults = Endpoints::default();
        let registry = &self.registry;
        Endpoints {
            npm: registry.npm.clone().unwrap_or(defaults.npm),
            pypi: registry.pypi.clone().unwrap_or(defaults.pypi),
            github: registry.github.clone().unwrap_or(defaults.github),
            gitlab: registry.gitlab.clone().unwrap_or(defaults.gitlab),
        }
    }

    pub fn user_agent(&self) -> String {
        self.registry
            .user_agent
            .clone()
            .unwrap_or_else(|| format!("pkgstamp/{}", env!("CARGO_PKG_VERSION")))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(
            self.registry
                .timeout_secs
                .unwrap_or(Self::DEFAULT_TIMEOUT_SECS),
        )
    }
}
