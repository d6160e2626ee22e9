//! Core check pipeline shared by the CLI and library users.
//! Text in, report out; no I/O beyond loading the rules file.

use std::path::Path;

use serde::Serialize;

use crate::evaluator::{Evaluator, Verdict};
use crate::extractor::SpecExtractor;
use crate::product::{NemaRating, ProductSpec};
use crate::report::{render, ReportView};
use crate::rules::{ConfigError, RuleSet};

#[derive(Debug, thiserror::Error)]
pub enum CompatGuardError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("URL input is disabled ({0}); paste the product description text instead")]
    UrlInputDisabled(String),
}

/// Both extracted specs and the verdict for them
#[derive(Debug, Clone, Serialize)]
pub struct Comparison {
    pub product_a: ProductSpec,
    pub product_b: ProductSpec,
    pub verdict: Verdict,
}

/// Rule set plus the extractor built from its brand catalog
pub struct CompatibilityChecker {
    rules: RuleSet,
    extractor: SpecExtractor,
}

impl CompatibilityChecker {
    pub fn new(rules: RuleSet) -> Self {
        let extractor = SpecExtractor::for_rules(&rules);
        Self { rules, extractor }
    }

    /// Resolve the rules file (explicit path, env, default location, built-in)
    pub fn from_config(explicit: Option<&Path>) -> Result<Self, CompatGuardError> {
        Ok(Self::new(RuleSet::resolve(explicit)?))
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn extract(&self, text: &str) -> ProductSpec {
        self.extractor.extract(text)
    }

    /// Compare two pasted product descriptions
    pub fn check_text(&self, text_a: &str, text_b: &str) -> Comparison {
        self.check_specs(self.extract(text_a), self.extract(text_b))
    }

    /// Compare one product against an installation site's enclosure requirement
    pub fn check_environment(&self, text: &str, required: NemaRating) -> Comparison {
        self.check_specs(self.extract(text), ProductSpec::site_requiring(required))
    }

    pub fn check_specs(&self, product_a: ProductSpec, product_b: ProductSpec) -> Comparison {
        let verdict = Evaluator::new(&self.rules).evaluate(&product_a, &product_b);
        Comparison {
            product_a,
            product_b,
            verdict,
        }
    }

    /// URL crawling is not supported; always an error
    pub fn check_url(&self, url: &str) -> Result<Comparison, CompatGuardError> {
        Err(CompatGuardError::UrlInputDisabled(url.to_string()))
    }

    /// Report view with headline and the rule file's disclaimer
    pub fn report(&self, comparison: &Comparison) -> ReportView {
        render(&comparison.verdict)
            .with_headline(format!(
                "{} ↔ {}",
                comparison.product_a.describe(),
                comparison.product_b.describe()
            ))
            .with_disclaimer(self.rules.disclaimer())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::VerdictResult;
    use crate::product::Category;

    fn checker() -> CompatibilityChecker {
        CompatibilityChecker::new(RuleSet::builtin().unwrap())
    }

    #[test]
    fn test_check_text_keeps_specs() {
        let outcome = checker().check_text("Square D QO 20A breaker", "Square D QO panel 100A main");
        assert_eq!(outcome.product_a.category, Some(Category::Breaker));
        assert_eq!(outcome.product_b.category, Some(Category::Panel));
        assert_eq!(outcome.verdict.result, VerdictResult::Compatible);
    }

    #[test]
    fn test_environment_check() {
        let outcome = checker().check_environment("Hoffman NEMA 4X enclosure", NemaRating::Type3R);
        assert_eq!(outcome.verdict.result, VerdictResult::Compatible);
        let outcome = checker().check_environment("NEMA 1 enclosure", NemaRating::Type4X);
        assert_eq!(outcome.verdict.result, VerdictResult::Incompatible);
    }

    #[test]
    fn test_url_input_is_disabled() {
        let err = checker().check_url("https://example.com/qo120").unwrap_err();
        assert!(matches!(err, CompatGuardError::UrlInputDisabled(_)));
    }

    #[test]
    fn test_report_carries_disclaimer() {
        let checker = checker();
        let outcome = checker.check_text("unbranded breaker", "unbranded panel");
        let view = checker.report(&outcome);
        assert_eq!(view.result, VerdictResult::Undetermined);
        assert!(view.disclaimer.is_some());
        assert!(view.headline.unwrap().contains("↔"));
    }
}
