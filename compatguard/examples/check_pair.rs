//! Example: compare two product descriptions with the built-in rules.
//! Run with: cargo run --example check_pair ["product A text" "product B text"]

use compatguard::{CompatibilityChecker, RuleSet, VerdictResult};

fn main() -> Result<(), compatguard::CompatGuardError> {
    let mut args = std::env::args().skip(1);
    let text_a = args
        .next()
        .unwrap_or_else(|| "Square D QO 20A breaker".to_string());
    let text_b = args
        .next()
        .unwrap_or_else(|| "Square D QO panel 100A main, 20A slots supported".to_string());

    let checker = CompatibilityChecker::new(RuleSet::builtin()?);
    let outcome = checker.check_text(&text_a, &text_b);

    println!("A: {:?}", outcome.product_a);
    println!("B: {:?}", outcome.product_b);
    println!();
    print!("{}", checker.report(&outcome).to_human());

    if outcome.verdict.result == VerdictResult::Incompatible {
        std::process::exit(1);
    }
    Ok(())
}
