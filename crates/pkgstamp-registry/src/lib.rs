//! Package metadata lookups against public registries.
//!
//! Provides the [`Registry`] trait for fetching a package's live metadata
//! (version, license, stars, ...) and normalizing it into one canonical
//! [`PackageMetadata`] record, whatever registry it came from.
//!
//! # Example
//!
//! ```ignore
//! use pkgstamp_registry::{Endpoints, Sources, UreqFetcher};
//! use std::time::Duration;
//!
//! let sources = Sources::builtin(&Endpoints::default());
//! let http = UreqFetcher::new("pkgstamp", Duration::from_secs(30));
//! if let Ok(Some(meta)) = sources.route("npm", "left-pad", &http).await {
//!     println!("{}: {}", meta.name, meta.version);
//! }
//! ```

pub mod http;
pub mod metadata;
pub mod sources;

pub use http::{FetchError, Fetcher, MockFetcher, UreqFetcher};
pub use metadata::{Downloads, PackageMetadata};
pub use sources::{Endpoints, Registry, Sources, UnsupportedSource};
