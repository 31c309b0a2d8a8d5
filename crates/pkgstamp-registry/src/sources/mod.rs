//! Registry adapters and the named source router.
//!
//! # Extensibility
//!
//! The set of sources is open. Embedders add their own adapter with
//! [`Sources::register`]:
//!
//! ```ignore
//! use pkgstamp_registry::{FetchError, Fetcher, PackageMetadata, Registry, Sources};
//!
//! struct Crates;
//!
//! #[async_trait::async_trait]
//! impl Registry for Crates {
//!     fn name(&self) -> &str { "crates" }
//!     fn display_name(&self) -> &str { "crates.io" }
//!     async fn fetch(&self, id: &str, http: &dyn Fetcher) -> Result<PackageMetadata, FetchError> {
//!         // ...
//!     }
//! }
//!
//! sources.register(Box::new(Crates));
//! ```

mod github;
mod gitlab;
mod npm;
mod pypi;

pub use github::GitHub;
pub use gitlab::GitLab;
pub use npm::Npm;
pub use pypi::PyPi;

use crate::http::{FetchError, Fetcher};
use crate::metadata::PackageMetadata;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A named registry backend.
#[async_trait]
pub trait Registry: Send + Sync {
    /// Source name as written in markup (e.g. "npm", "pypi").
    fn name(&self) -> &str;

    /// Human-readable name (e.g. "PyPI (Python)").
    fn display_name(&self) -> &str;

    /// Look up `identifier` (package name or `owner/repo` path) and map the
    /// registry's documents into [`PackageMetadata`].
    async fn fetch(&self, identifier: &str, http: &dyn Fetcher)
    -> Result<PackageMetadata, FetchError>;
}

/// Source name with no registered adapter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported source: {0}")]
pub struct UnsupportedSource(pub String);

/// Base URLs of the builtin registries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoints {
    pub npm: String,
    pub pypi: String,
    pub github: String,
    pub gitlab: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            npm: Npm::DEFAULT_REGISTRY.to_string(),
            pypi: PyPi::DEFAULT_BASE.to_string(),
            github: GitHub::DEFAULT_API.to_string(),
            gitlab: GitLab::DEFAULT_API.to_string(),
        }
    }
}

/// Open registry of sources, dispatched by case-insensitive name.
pub struct Sources {
    registries: Vec<Box<dyn Registry>>,
}

impl Sources {
    /// A router with no sources at all.
    pub fn empty() -> Self {
        Self {
            registries: Vec::new(),
        }
    }

    /// npm, PyPI, GitHub and GitLab against `endpoints`.
    pub fn builtin(endpoints: &Endpoints) -> Self {
        let mut sources = Self::empty();
        sources.register(Box::new(Npm::new(&endpoints.npm)));
        sources.register(Box::new(PyPi::new(&endpoints.pypi)));
        sources.register(Box::new(GitHub::new(&endpoints.github)));
        sources.register(Box::new(GitLab::new(&endpoints.gitlab)));
        sources
    }

    /// Add a source. A later registration shadows an earlier one with the
    /// same name.
    pub fn register(&mut self, registry: Box<dyn Registry>) {
        self.registries.insert(0, registry);
    }

    /// Look up a source by name, ignoring case.
    pub fn get(&self, name: &str) -> Option<&dyn Registry> {
        self.registries
            .iter()
            .find(|r| r.name().eq_ignore_ascii_case(name.trim()))
            .map(|r| r.as_ref())
    }

    /// Registered source names, oldest registration first.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for registry in self.registries.iter().rev() {
            if !names.iter().any(|n| n.eq_ignore_ascii_case(registry.name())) {
                names.push(registry.name());
            }
        }
        names
    }

    /// Dispatch a lookup to the named source.
    ///
    /// Unknown names fail before any request is made. Lookup failures are
    /// logged and surface as `Ok(None)`: the source answered with no data.
    pub async fn route(
        &self,
        source: &str,
        identifier: &str,
        http: &dyn Fetcher,
    ) -> Result<Option<PackageMetadata>, UnsupportedSource> {
        let registry = self
            .get(source)
            .ok_or_else(|| UnsupportedSource(source.trim().to_string()))?;

        match registry.fetch(identifier, http).await {
            Ok(meta) => Ok(Some(meta)),
            Err(e) => {
                tracing::warn!(source = registry.name(), identifier, error = %e, "lookup failed");
                Ok(None)
            }
        }
    }
}

impl Default for Sources {
    fn default() -> Self {
        Self::builtin(&Endpoints::default())
    }
}
