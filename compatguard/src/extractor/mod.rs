//! Spec Extractor
//!
//! Turns loosely structured pasted text (spec sheets, listing copy, HTML)
//! into a [`ProductSpec`] guess.
//!
//! ```text
//! raw text ──▶ normalize ──┬──▶ CategoryDetector ──┐
//!                          ├──▶ RatingDetector   ──┤
//!                          ├──▶ BrandDetector    ──┼──▶ merge ──▶ ProductSpec
//!                          └──▶ ModelDetector    ──┘
//! ```
//!
//! Detectors run in order and are independent; the merge keeps the first
//! value written for each field. Extraction never fails: text with no usable
//! signal produces a spec whose fields (category included) are all unset.

pub mod catalog;
pub mod detectors;

use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

pub use catalog::BrandCatalog;
pub use detectors::{BrandDetector, CategoryDetector, FieldDetector, ModelDetector, RatingDetector};

use crate::product::ProductSpec;
use crate::rules::RuleSet;

static HTML_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<[^>]{0,500}>").expect("static tag pattern"));

/// Ordered list of field detectors combined by a first-writer-wins merge
pub struct SpecExtractor {
    detectors: Vec<Arc<dyn FieldDetector>>,
}

impl SpecExtractor {
    /// Create an extractor with no detectors
    pub fn new() -> Self {
        Self {
            detectors: Vec::new(),
        }
    }

    /// Standard detector chain with the given brand vocabulary
    pub fn with_catalog(catalog: BrandCatalog) -> Self {
        let mut extractor = Self::new();
        extractor.add_detector(Arc::new(CategoryDetector));
        extractor.add_detector(Arc::new(RatingDetector));
        extractor.add_detector(Arc::new(BrandDetector::new(catalog)));
        extractor.add_detector(Arc::new(ModelDetector));
        extractor
    }

    /// Standard detector chain using the brands listed in a rule set
    pub fn for_rules(rules: &RuleSet) -> Self {
        Self::with_catalog(rules.catalog().clone())
    }

    pub fn add_detector(&mut self, detector: Arc<dyn FieldDetector>) {
        self.detectors.push(detector);
    }

    pub fn detector_ids(&self) -> Vec<&str> {
        self.detectors.iter().map(|d| d.id()).collect()
    }

    /// Extract a spec guess from raw text
    pub fn extract(&self, raw: &str) -> ProductSpec {
        let text = normalize(raw);
        let mut spec = ProductSpec::default();
        if text.is_empty() {
            return spec;
        }

        for detector in &self.detectors {
            spec.merge_missing(detector.detect(&text));
        }

        tracing::debug!(
            category = ?spec.category,
            brand = ?spec.brand,
            series = ?spec.series,
            amperage = ?spec.amperage,
            "Extracted product spec"
        );
        spec
    }
}

impl Default for SpecExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Strip markup and entities, collapse whitespace
pub fn normalize(raw: &str) -> String {
    let without_tags = HTML_TAG.replace_all(raw, " ");
    let decoded = without_tags
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">");
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}
