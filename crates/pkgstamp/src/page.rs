//! Page-wide hydration: every element carrying the trigger attribute,
//! processed concurrently.

use crate::dom::Document;
use crate::processor::Stamper;
use futures_util::future::join_all;
use std::cell::OnceCell;

/// Totals for one hydration run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Hydration {
    /// Elements carrying the trigger attribute.
    pub elements: usize,
    /// Target writes across all elements.
    pub written: usize,
    /// Elements whose source returned no data.
    pub no_data: usize,
    /// Elements that failed (bad descriptor, unknown source, no target).
    pub failed: usize,
}

/// One page load.
///
/// The set of trigger elements is discovered on first use and kept for the
/// life of the `Page`; elements added later are not picked up.
pub struct Page<'d, D: Document> {
    doc: &'d D,
    discovered: OnceCell<(String, Vec<D::Node>)>,
}

impl<'d, D: Document> Page<'d, D> {
    pub fn new(doc: &'d D) -> Self {
        Self {
            doc,
            discovered: OnceCell::new(),
        }
    }

    /// Trigger elements, scanned once.
    ///
    /// The snapshot belongs to the attribute of the first scan; asking for a
    /// different attribute afterwards yields nothing.
    pub fn discovered(&self, attribute: &str) -> &[D::Node] {
        let (scanned, nodes) = self
            .discovered
            .get_or_init(|| (attribute.to_string(), self.doc.nodes_with_attribute(attribute)));
        if scanned != attribute {
            tracing::warn!(scanned = %scanned, requested = %attribute, "page already scanned for another attribute");
            return &[];
        }
        nodes
    }

    /// Process every trigger element concurrently and wait for all of them.
    ///
    /// Element failures are logged and counted; they never stop siblings.
    pub async fn hydrate(&self, stamper: &Stamper<'_>) -> Hydration {
        let attribute = &stamper.settings().attribute;
        let nodes = self.discovered(attribute);

        let mut hydration = Hydration {
            elements: nodes.len(),
            ..Default::default()
        };
        if nodes.is_empty() {
            tracing::debug!(attribute = %attribute, "no elements to stamp");
            return hydration;
        }

        let results = join_all(
            nodes
                .iter()
                .map(|node| stamper.process_element(self.doc, node, None)),
        )
        .await;

        for (node, result) in nodes.iter().zip(results) {
            match result {
                Ok(outcome) => {
                    hydration.written += outcome.written;
                    if outcome.no_data {
                        hydration.no_data += 1;
                    }
                }
                Err(e) => {
                    let raw = self.doc.attribute(node, attribute).unwrap_or_default();
                    tracing::warn!(attribute = %raw, error = %e, "element not stamped");
                    hydration.failed += 1;
                }
            }
        }

        hydration
    }
}
