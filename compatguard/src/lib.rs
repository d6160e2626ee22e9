//! CompatGuard - electrical product compatibility checks
//!
//! This library parses loosely structured product text (spec sheets, shop
//! listings) for panels, breakers, plugs, receptacles, enclosures and EV
//! chargers, and checks pairs of products against a conservative rules table.
//!
//! # Quick Start
//!
//! ```no_run
//! use compatguard::{CompatibilityChecker, RuleSet};
//!
//! let checker = CompatibilityChecker::new(RuleSet::builtin().unwrap());
//! let outcome = checker.check_text(
//!     "Square D QO 20A breaker",
//!     "Square D QO panel 100A main, 20A slots supported",
//! );
//!
//! println!("{}", checker.report(&outcome).to_human());
//! ```
//!
//! # Features
//!
//! - **Spec extraction**: Category, brand/series, amps, volts, poles, NEMA
//! - **Rules table**: JSON, user-extensible, embedded default
//! - **Evaluation**: Compatible / incompatible / undetermined with reasons
//! - **EV sizing**: 125% continuous-load circuit sizing

pub mod core;
pub mod evaluator;
pub mod extractor;
pub mod product;
pub mod report;
pub mod rules;

// Re-export main types
pub use crate::core::{CompatGuardError, CompatibilityChecker, Comparison};
pub use evaluator::{
    size_ev_circuit, EvCircuitSizing, Evaluator, SuggestedLink, Verdict, VerdictResult,
};
pub use extractor::SpecExtractor;
pub use product::{Category, NemaRating, Phase, ProductSpec};
pub use report::{render, ReportView, Tone};
pub use rules::{CompatibilityRule, ConfigError, RuleSet};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{
        Category, CompatGuardError, CompatibilityChecker, Evaluator, NemaRating, ProductSpec,
        RuleSet, SpecExtractor, Verdict, VerdictResult,
    };
}
