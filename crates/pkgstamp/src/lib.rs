//! Stamp live package registry metadata into page elements.
//!
//! An element declares what it wants through one attribute:
//!
//! ```html
//! <span data-pkgstamp="flask,,pypi,{%name %version (%license)}"></span>
//! ```
//!
//! [`Page::hydrate`] finds every such element, looks the package up through
//! [`Sources`](pkgstamp_registry::Sources), renders the template and writes
//! the report into the element (or the targets it names), once per target.
//!
//! # Example
//!
//! ```ignore
//! use pkgstamp::{MemoryDocument, Page, PageSettings, Stamper};
//! use pkgstamp_registry::{Sources, UreqFetcher};
//!
//! let sources = Sources::default();
//! let http = UreqFetcher::new("pkgstamp", std::time::Duration::from_secs(30));
//! let stamper = Stamper::new(&sources, &http, PageSettings::default());
//! let hydration = Page::new(&doc).hydrate(&stamper).await;
//! ```

pub mod config;
pub mod descriptor;
pub mod dom;
pub mod error;
pub mod page;
pub mod processor;

pub use config::{PageSettings, StampConfig};
pub use descriptor::{Descriptor, StampRequest};
pub use dom::{Document, Element, MemoryDocument, NodeId};
pub use error::{ConfigError, StampError};
pub use page::{Hydration, Page};
pub use processor::{Outcome, Report, Stamped, Stamper};
