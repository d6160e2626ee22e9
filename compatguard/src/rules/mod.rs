//! Compatibility Rules
//!
//! The rules table is the tool's customization surface: a JSON file with one
//! record per brand/series/category pair. Users can add records without
//! recompiling; the default table ships embedded in the binary.
//!
//! ```json
//! {
//!   "category_pair": ["panel", "breaker"],
//!   "brand": "Square D",
//!   "series": "QO",
//!   "anchor": "panel",
//!   "constraints": {
//!     "breaker.series": ["QO"],
//!     "breaker.amperage": [10, 125],
//!     "breaker_within_panel_rating": true
//!   }
//! }
//! ```

pub mod schema;
pub mod store;

pub use schema::{
    CompatibilityRule, Constraint, ConstraintKind, ConstraintValue, Expected, Field, Relation,
    RuleDefinition, RuleKey, Routes, RulesFile, WILDCARD,
};
pub use store::{ConfigError, RuleSet, RuleSource, DEFAULT_RULES_PATH, RULES_ENV_VAR};
