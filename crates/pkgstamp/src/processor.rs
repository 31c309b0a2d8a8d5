//! Per-element pipeline: parse, route, fetch, render, write.

use crate::config::PageSettings;
use crate::descriptor::{Descriptor, StampRequest};
use crate::dom::{Document, is_script_like};
use crate::error::{ConfigError, StampError};
use pkgstamp_registry::{Fetcher, PackageMetadata, Sources};
use serde::Serialize;

/// Result of a lookup in data-only mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    /// `None` when the source answered with no data.
    pub metadata: Option<PackageMetadata>,
    /// Rendered report; empty when there was no data.
    pub text: String,
}

/// What processing one element did to its targets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Outcome {
    pub targets: usize,
    pub written: usize,
    /// Targets already marked by an earlier write.
    pub skipped: usize,
    /// The source returned no data, so nothing was rendered.
    pub no_data: bool,
}

/// Result of a programmatic stamp call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stamped {
    Data(Report),
    Written(Outcome),
}

/// Runs the stamp pipeline against a set of sources and a transport.
pub struct Stamper<'a> {
    sources: &'a Sources,
    http: &'a dyn Fetcher,
    settings: PageSettings,
}

impl<'a> Stamper<'a> {
    pub fn new(sources: &'a Sources, http: &'a dyn Fetcher, settings: PageSettings) -> Self {
        Self {
            sources,
            http,
            settings,
        }
    }

    pub fn settings(&self) -> &PageSettings {
        &self.settings
    }

    /// Fetch and render without touching any document.
    pub async fn lookup(&self, descriptor: &Descriptor) -> Result<Report, StampError> {
        let metadata = self
            .sources
            .route(&descriptor.source, &descriptor.package, self.http)
            .await?;

        let text = metadata
            .as_ref()
            .map(|meta| pkgstamp_render::render(meta, descriptor.format.as_deref()))
            .unwrap_or_default();

        Ok(Report { metadata, text })
    }

    /// Programmatic entry point.
    ///
    /// With `return_data_only` the document is not touched. Otherwise the
    /// report goes to the request's target, or the default selectors.
    pub async fn stamp<D: Document>(
        &self,
        doc: &D,
        request: &StampRequest,
    ) -> Result<Stamped, StampError> {
        let descriptor = Descriptor::from_request(request)?;
        if request.return_data_only {
            return Ok(Stamped::Data(self.lookup(&descriptor).await?));
        }
        let outcome = self.stamp_targets(doc, None, &descriptor).await?;
        Ok(Stamped::Written(outcome))
    }

    /// Process one element carrying the trigger attribute.
    ///
    /// `overrides` replaces the element's own attribute when the pipeline is
    /// driven programmatically.
    pub async fn process_element<D: Document>(
        &self,
        doc: &D,
        node: &D::Node,
        overrides: Option<&Descriptor>,
    ) -> Result<Outcome, StampError> {
        let descriptor = match overrides {
            Some(descriptor) => descriptor.clone(),
            None => {
                let raw = doc
                    .attribute(node, &self.settings.attribute)
                    .unwrap_or_default();
                Descriptor::parse(&raw)?
            }
        };

        let own_target = (descriptor.target.is_none() && !is_script_like(&doc.tag_name(node)))
            .then(|| node.clone());

        self.stamp_targets(doc, own_target, &descriptor).await
    }

    async fn stamp_targets<D: Document>(
        &self,
        doc: &D,
        own_target: Option<D::Node>,
        descriptor: &Descriptor,
    ) -> Result<Outcome, StampError> {
        if self.sources.get(&descriptor.source).is_none() {
            return Err(ConfigError::UnsupportedSource(descriptor.source.clone()).into());
        }

        let targets = match own_target {
            Some(node) => vec![node],
            None => self.resolve_targets(doc, descriptor.target.as_deref())?,
        };

        let mut outcome = Outcome {
            targets: targets.len(),
            ..Default::default()
        };

        let mark = &self.settings.mark;
        let pending: Vec<&D::Node> = targets.iter().filter(|t| !doc.has_mark(t, mark)).collect();
        outcome.skipped = targets.len() - pending.len();
        if pending.is_empty() {
            tracing::debug!(package = %descriptor.package, "all targets already stamped");
            return Ok(outcome);
        }

        let report = self.lookup(descriptor).await?;
        let text = match (&report.metadata, &self.settings.fallback) {
            (Some(_), _) => report.text,
            (None, Some(fallback)) => fallback.clone(),
            (None, None) => {
                outcome.no_data = true;
                return Ok(outcome);
            }
        };
        outcome.no_data = report.metadata.is_none();

        // Another element may have stamped a shared target while this one
        // was waiting on the network.
        for target in pending {
            if doc.has_mark(target, mark) {
                outcome.skipped += 1;
                continue;
            }
            doc.set_inner_html(target, &text);
            doc.set_mark(target, mark);
            outcome.written += 1;
        }

        tracing::debug!(
            package = %descriptor.package,
            source = %descriptor.source,
            written = outcome.written,
            "stamped"
        );
        Ok(outcome)
    }

    /// Resolve an explicit selector, or the default selectors (all matches).
    fn resolve_targets<D: Document>(
        &self,
        doc: &D,
        selector: Option<&str>,
    ) -> Result<Vec<D::Node>, StampError> {
        let selector = selector
            .map(String::from)
            .unwrap_or_else(|| self.settings.default_selectors.join(", "));

        let targets = doc.select_all(&selector);
        if targets.is_empty() && self.settings.strict_targets {
            return Err(StampError::NoTarget { selector });
        }
        Ok(targets)
    }
}
