//! Example: using the Evaluator with an inline rules table (without CompatibilityChecker).
//! Run with: cargo run --example custom_rules [path/to/rules.json]

use compatguard::{Category, Evaluator, ProductSpec, RuleSet};
use std::path::Path;

const INLINE_RULES: &str = r#"{
    "rules": [
        {
            "id": "shop-subpanel-breakers",
            "category_pair": ["panel", "breaker"],
            "brand": "*",
            "series": "*",
            "constraints": {
                "breaker.amperage": [15, 30],
                "breaker_within_panel_rating": true
            },
            "required": ["breaker.amperage"],
            "note": "Shop subpanel circuits are limited to 30A."
        }
    ]
}"#;

fn main() -> Result<(), compatguard::ConfigError> {
    let rules = match std::env::args().nth(1) {
        Some(path) => RuleSet::load(Path::new(&path))?,
        None => RuleSet::from_json(INLINE_RULES)?,
    };
    println!("Loaded {} rules from {}", rules.len(), rules.source());

    let panel = ProductSpec {
        amperage: Some(60.0),
        ..ProductSpec::of(Category::Panel)
    };
    let evaluator = Evaluator::new(&rules);

    for amps in [20.0, 40.0] {
        let breaker = ProductSpec {
            amperage: Some(amps),
            ..ProductSpec::of(Category::Breaker)
        };
        let verdict = evaluator.evaluate(&panel, &breaker);
        println!("{} in {}: {}", breaker.describe(), panel.describe(), verdict.result);
        for reason in &verdict.reasons {
            println!("  - {}", reason);
        }
    }
    Ok(())
}
