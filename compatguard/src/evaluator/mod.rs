//! Compatibility Evaluator
//!
//! Decides a verdict for two product specs against an explicitly passed
//! [`RuleSet`]. Evaluation is pure: the same specs and rules always give the
//! same verdict, and nothing is cached between calls.
//!
//! When several rules match, the rule that could check the most constraints
//! decides. Rules tied at that count must agree; if they do not, the verdict
//! is undetermined.

pub mod checks;
pub mod links;
pub mod sizing;
pub mod verdict;

pub use checks::{check_constraint, CheckOutcome, VOLTAGE_TOLERANCE};
pub use links::suggest_links;
pub use sizing::{size_ev_circuit, EvCircuitSizing, CONTINUOUS_LOAD_FACTOR, STANDARD_BREAKER_SIZES};
pub use verdict::{SuggestedLink, Verdict, VerdictResult};

use crate::product::{format_amps, Category, Phase, ProductSpec};
use crate::rules::schema::normalize_plug_config;
use crate::rules::{CompatibilityRule, RuleKey, RuleSet};

pub const INSUFFICIENT_INFO: &str =
    "Insufficient product information: could not identify the product category";

pub const NO_RULE_COVERAGE: &str =
    "No rule coverage for this brand/series combination — consult manufacturer documentation.";

/// Constraint results of one matched rule
#[derive(Debug)]
struct RuleEvidence<'r> {
    rule: &'r CompatibilityRule,
    checked: usize,
    passed: Vec<String>,
    violations: Vec<String>,
    /// Inputs of required constraints that could not be checked
    missing: Vec<String>,
}

impl RuleEvidence<'_> {
    fn is_pass(&self) -> bool {
        self.violations.is_empty() && self.missing.is_empty()
    }

    fn is_violated(&self) -> bool {
        !self.violations.is_empty()
    }

    /// Nothing failed, but a required constraint was skipped
    fn is_incomplete(&self) -> bool {
        self.violations.is_empty() && !self.missing.is_empty()
    }
}

pub struct Evaluator<'r> {
    rules: &'r RuleSet,
}

impl<'r> Evaluator<'r> {
    pub fn new(rules: &'r RuleSet) -> Self {
        Self { rules }
    }

    pub fn evaluate(&self, a: &ProductSpec, b: &ProductSpec) -> Verdict {
        let mut verdict = self.decide(a, b);
        self.add_context(&mut verdict, a, b);
        verdict.suggested_links = suggest_links(self.rules.routes(), a, b);
        tracing::debug!(
            result = %verdict.result,
            cited = ?verdict.cited_rules,
            "Evaluated {} against {}",
            a.describe(),
            b.describe()
        );
        verdict
    }

    fn decide(&self, a: &ProductSpec, b: &ProductSpec) -> Verdict {
        let (Some(key_a), Some(key_b)) = (RuleKey::from_spec(a), RuleKey::from_spec(b)) else {
            let mut reasons = vec![INSUFFICIENT_INFO.to_string()];
            for (label, spec) in [("first", a), ("second", b)] {
                if spec.category.is_none() {
                    reasons.push(format!(
                        "The {} product's category is unknown; name it explicitly (panel, breaker, plug, receptacle, enclosure, EV charger).",
                        label
                    ));
                }
            }
            return Verdict::undetermined(reasons);
        };

        let matched = self.rules.lookup(key_a, key_b);
        tracing::debug!("{} rules matched {} ↔ {}", matched.len(), key_a.category, key_b.category);
        if matched.is_empty() {
            return Verdict::undetermined(vec![NO_RULE_COVERAGE.to_string()]);
        }

        let evidence: Vec<RuleEvidence<'_>> = matched
            .into_iter()
            .map(|rule| collect_evidence(rule, a, b))
            .collect();

        let top = evidence.iter().map(|e| e.checked).max().unwrap_or(0);
        let leaders: Vec<&RuleEvidence<'_>> = evidence
            .iter()
            .filter(|e| top > 0 && e.checked == top)
            .collect();

        // An explicit violation stands even when other inputs are unknown
        if !leaders.is_empty() && leaders.iter().all(|e| e.is_violated()) {
            return incompatible(&leaders);
        }

        let incomplete: Vec<&RuleEvidence<'_>> = evidence.iter().filter(|e| e.is_incomplete()).collect();
        if !incomplete.is_empty() {
            return missing_information(&incomplete);
        }

        if leaders.is_empty() {
            return Verdict::undetermined(vec![
                "Insufficient product information for the matching rules: none of their constraints could be checked."
                    .to_string(),
            ]);
        }

        if leaders.iter().all(|e| e.is_pass()) {
            compatible(&leaders)
        } else {
            let ids: Vec<&str> = leaders.iter().map(|e| e.rule.id.as_str()).collect();
            tracing::warn!("Matching rules disagree: {:?}", ids);
            Verdict::undetermined(vec![format!(
                "Matching rules disagree ({}); consult manufacturer documentation.",
                ids.join(", ")
            )])
        }
    }

    /// EV sizing, pole count, plug configuration details and rule file notes
    fn add_context(&self, verdict: &mut Verdict, a: &ProductSpec, b: &ProductSpec) {
        let charger = [a, b]
            .into_iter()
            .find(|s| s.category == Some(Category::EvCharger));
        if let Some(charger) = charger {
            if let Some(amps) = charger.amperage {
                verdict.reasons.push(size_ev_circuit(amps).summary());
            }
            if let Some(note) = self.rules.ev_note() {
                verdict.reasons.push(note.to_string());
            }
        }

        if let Some(hint) = pole_count_hint(a, b) {
            verdict.reasons.push(hint);
        }

        if let (Some(x), Some(y)) = (a.plug_config.as_deref(), b.plug_config.as_deref()) {
            let config = normalize_plug_config(x);
            if config.eq_ignore_ascii_case(&normalize_plug_config(y)) {
                if let Some(details) = self.rules.nema_configuration(&config) {
                    let mut hint = format!(
                        "NEMA {} is rated {} at {}",
                        config,
                        format_amps(details.amps),
                        details.voltage
                    );
                    if let Some(ref description) = details.description {
                        hint.push_str(&format!(" ({})", description));
                    }
                    hint.push('.');
                    verdict.reasons.push(hint);
                }
            }
        }
    }
}

/// Hint when a breaker's pole count is unusual for the panel's supply phase
fn pole_count_hint(a: &ProductSpec, b: &ProductSpec) -> Option<String> {
    let panel = [a, b].into_iter().find(|s| s.category == Some(Category::Panel))?;
    let breaker = [a, b].into_iter().find(|s| s.category == Some(Category::Breaker))?;
    let (phase, poles) = (panel.phase?, breaker.poles?);
    let typical: [u8; 2] = match phase {
        Phase::Single => [1, 2],
        Phase::Three => [2, 3],
    };
    if typical.contains(&poles) {
        return None;
    }
    Some(format!(
        "Pole count atypical for {} panels: a {}-pole breaker on a {} supply usually means {}- or {}-pole (check the panel spec).",
        match phase {
            Phase::Single => "single-phase",
            Phase::Three => "three-phase",
        },
        poles,
        phase,
        typical[0],
        typical[1]
    ))
}

fn collect_evidence<'r>(rule: &'r CompatibilityRule, a: &ProductSpec, b: &ProductSpec) -> RuleEvidence<'r> {
    let mut evidence = RuleEvidence {
        rule,
        checked: 0,
        passed: Vec::new(),
        violations: Vec::new(),
        missing: Vec::new(),
    };
    for constraint in &rule.constraints {
        for outcome in check_constraint(&constraint.kind, a, b) {
            match outcome {
                CheckOutcome::Skipped if constraint.required => {
                    let inputs = constraint.inputs();
                    if !evidence.missing.contains(&inputs) {
                        evidence.missing.push(inputs);
                    }
                }
                CheckOutcome::Skipped => {}
                CheckOutcome::Passed(msg) => {
                    evidence.checked += 1;
                    evidence.passed.push(msg);
                }
                CheckOutcome::Violated(msg) => {
                    evidence.checked += 1;
                    evidence.violations.push(msg);
                }
            }
        }
    }
    tracing::debug!(
        rule = %rule.id,
        checked = evidence.checked,
        violations = evidence.violations.len(),
        missing = ?evidence.missing,
        "Rule evidence"
    );
    evidence
}

fn compatible(leaders: &[&RuleEvidence<'_>]) -> Verdict {
    let mut reasons = Vec::new();
    for evidence in leaders {
        reasons.push(format!(
            "Matches rule '{}' for {} ({} checks passed).",
            evidence.rule.id,
            evidence.rule.subject(),
            evidence.checked
        ));
        reasons.extend(evidence.passed.iter().map(|m| capitalize(m)));
        if let Some(ref note) = evidence.rule.note {
            reasons.push(note.clone());
        }
    }
    Verdict {
        result: VerdictResult::Compatible,
        reasons,
        suggested_links: Vec::new(),
        cited_rules: leaders.iter().map(|e| e.rule.id.clone()).collect(),
    }
}

fn incompatible(leaders: &[&RuleEvidence<'_>]) -> Verdict {
    let mut reasons = Vec::new();
    for evidence in leaders {
        reasons.extend(evidence.violations.iter().map(|m| capitalize(m)));
        reasons.push(format!("Violates rule '{}' for {}.", evidence.rule.id, evidence.rule.subject()));
        if let Some(ref note) = evidence.rule.note {
            reasons.push(note.clone());
        }
    }
    Verdict {
        result: VerdictResult::Incompatible,
        reasons,
        suggested_links: Vec::new(),
        cited_rules: leaders.iter().map(|e| e.rule.id.clone()).collect(),
    }
}

fn missing_information(incomplete: &[&RuleEvidence<'_>]) -> Verdict {
    let mut reasons = Vec::new();
    for evidence in incomplete {
        reasons.push(format!(
            "Insufficient product information for rule '{}' ({}): the {} could not be determined.",
            evidence.rule.id,
            evidence.rule.subject(),
            evidence.missing.join(" and ")
        ));
    }
    reasons.push("Add the missing details to the product description, or consult manufacturer documentation.".to_string());
    tracing::info!(
        rules = ?incomplete.iter().map(|e| e.rule.id.as_str()).collect::<Vec<_>>(),
        "Required constraints could not be checked"
    );
    Verdict::undetermined(reasons)
}

fn capitalize(message: &str) -> String {
    let mut chars = message.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::NemaRating;

    const RULES: &str = r#"{
        "rules": [
            {
                "id": "acme-x",
                "category_pair": ["panel", "breaker"],
                "brand": "Acme",
                "series": "X",
                "anchor": "panel",
                "constraints": {
                    "breaker.series": ["X"],
                    "breaker_within_panel_rating": true
                },
                "note": "X panels take X breakers."
            },
            {
                "id": "acme-any",
                "category_pair": ["panel", "breaker"],
                "brand": "Acme",
                "series": "*",
                "anchor": "panel",
                "constraints": {
                    "breaker.series": ["Y"],
                    "breaker.amperage": [10, 50]
                }
            },
            {
                "id": "enclosures",
                "category_pair": ["enclosure", "site"],
                "brand": "*",
                "series": "*",
                "constraints": { "nema_meets_requirement": true }
            }
        ],
        "routes": { "breakers": "https://shop.test/b" }
    }"#;

    fn rules() -> RuleSet {
        RuleSet::from_json(RULES).unwrap()
    }

    fn panel() -> ProductSpec {
        ProductSpec {
            brand: Some("Acme".to_string()),
            series: Some("X".to_string()),
            amperage: Some(100.0),
            ..ProductSpec::of(Category::Panel)
        }
    }

    fn breaker(series: &str, amps: f64) -> ProductSpec {
        ProductSpec {
            series: Some(series.to_string()),
            amperage: Some(amps),
            ..ProductSpec::of(Category::Breaker)
        }
    }

    #[test]
    fn test_unknown_category_is_undetermined() {
        let rules = rules();
        let verdict = Evaluator::new(&rules).evaluate(&ProductSpec::default(), &panel());
        assert_eq!(verdict.result, VerdictResult::Undetermined);
        assert!(verdict.reasons[0].to_lowercase().contains("insufficient product information"));
        assert!(verdict.cited_rules.is_empty());
    }

    #[test]
    fn test_no_rules_is_undetermined() {
        let rules = rules();
        let verdict = Evaluator::new(&rules).evaluate(
            &ProductSpec::of(Category::Plug),
            &ProductSpec::of(Category::Receptacle),
        );
        assert_eq!(verdict.result, VerdictResult::Undetermined);
        assert_eq!(verdict.reasons, vec![NO_RULE_COVERAGE.to_string()]);
    }

    #[test]
    fn test_disagreeing_tie_is_undetermined() {
        // acme-x passes 2 checks, acme-any fails 2 checks
        let rules = rules();
        let verdict = Evaluator::new(&rules).evaluate(&panel(), &breaker("X", 20.0));
        assert_eq!(verdict.result, VerdictResult::Undetermined);
        assert!(verdict.reasons[0].contains("acme-x"));
        assert!(verdict.reasons[0].contains("acme-any"));
    }

    #[test]
    fn test_tied_rules_that_agree_are_all_cited() {
        let rules = rules();
        let verdict = Evaluator::new(&rules).evaluate(&breaker("Z", 60.0), &panel());
        assert_eq!(verdict.result, VerdictResult::Incompatible);
        assert_eq!(verdict.cited_rules, vec!["acme-x".to_string(), "acme-any".to_string()]);
    }

    #[test]
    fn test_most_checked_rule_wins() {
        let json = r#"{"rules": [
            {
                "id": "narrow",
                "category_pair": ["panel", "breaker"],
                "brand": "*",
                "series": "*",
                "constraints": { "breaker.amperage": [10, 30] }
            },
            {
                "id": "full",
                "category_pair": ["panel", "breaker"],
                "brand": "*",
                "series": "*",
                "constraints": {
                    "breaker.series": ["X"],
                    "breaker_within_panel_rating": true
                }
            }
        ]}"#;
        let rules = RuleSet::from_json(json).unwrap();
        let verdict = Evaluator::new(&rules).evaluate(&panel(), &breaker("X", 40.0));
        assert_eq!(verdict.result, VerdictResult::Compatible);
        assert_eq!(verdict.cited_rules, vec!["full".to_string()]);
    }

    #[test]
    fn test_rule_without_evidence_is_ignored() {
        let json = r#"{"rules": [{
            "id": "only-amps",
            "category_pair": ["panel", "breaker"],
            "brand": "*",
            "series": "*",
            "constraints": { "breaker.amperage": [10, 50] }
        }]}"#;
        let rules = RuleSet::from_json(json).unwrap();
        let verdict = Evaluator::new(&rules).evaluate(
            &ProductSpec::of(Category::Panel),
            &ProductSpec::of(Category::Breaker),
        );
        assert_eq!(verdict.result, VerdictResult::Undetermined);
        assert!(verdict.reasons[0].contains("Insufficient product information"));
    }

    #[test]
    fn test_compatible_cites_rule() {
        let json = r#"{"rules": [{
            "id": "only-amps",
            "category_pair": ["panel", "breaker"],
            "brand": "*",
            "series": "*",
            "constraints": { "breaker.amperage": [10, 50] },
            "note": "Amp range only."
        }]}"#;
        let rules = RuleSet::from_json(json).unwrap();
        let verdict = Evaluator::new(&rules).evaluate(&panel(), &breaker("Q", 20.0));
        assert_eq!(verdict.result, VerdictResult::Compatible);
        assert_eq!(verdict.cited_rules, vec!["only-amps".to_string()]);
        assert!(verdict.reasons[0].contains("only-amps"));
        assert!(verdict.reasons.iter().any(|r| r == "Amp range only."));
    }

    const REQUIRED_SERIES: &str = r#"{"rules": [{
        "id": "acme-x-strict",
        "category_pair": ["panel", "breaker"],
        "brand": "Acme",
        "series": "X",
        "anchor": "panel",
        "constraints": {
            "breaker.brand": "Acme",
            "breaker.series": ["X"],
            "breaker_within_panel_rating": true
        },
        "required": ["breaker.series"]
    }]}"#;

    #[test]
    fn test_unknown_required_input_is_undetermined() {
        let rules = RuleSet::from_json(REQUIRED_SERIES).unwrap();
        let breaker = ProductSpec {
            brand: Some("Acme".to_string()),
            amperage: Some(20.0),
            ..ProductSpec::of(Category::Breaker)
        };
        let verdict = Evaluator::new(&rules).evaluate(&breaker, &panel());
        assert_eq!(verdict.result, VerdictResult::Undetermined);
        assert!(verdict.cited_rules.is_empty());
        assert!(verdict.reasons[0].contains("acme-x-strict"));
        assert!(verdict.reasons[0].contains("breaker series"));
    }

    #[test]
    fn test_violation_stands_without_required_input() {
        let rules = RuleSet::from_json(REQUIRED_SERIES).unwrap();
        let breaker = ProductSpec {
            brand: Some("Other".to_string()),
            amperage: Some(20.0),
            ..ProductSpec::of(Category::Breaker)
        };
        let verdict = Evaluator::new(&rules).evaluate(&panel(), &breaker);
        assert_eq!(verdict.result, VerdictResult::Incompatible);
        assert_eq!(verdict.cited_rules, vec!["acme-x-strict".to_string()]);
    }

    #[test]
    fn test_required_input_present_allows_compatible() {
        let rules = RuleSet::from_json(REQUIRED_SERIES).unwrap();
        let breaker = ProductSpec {
            brand: Some("Acme".to_string()),
            ..breaker("X", 20.0)
        };
        let verdict = Evaluator::new(&rules).evaluate(&panel(), &breaker);
        assert_eq!(verdict.result, VerdictResult::Compatible);
    }

    #[test]
    fn test_pole_count_hint_follows_panel_phase() {
        let rules = rules();
        let three_phase = ProductSpec {
            phase: Some(Phase::Three),
            ..ProductSpec::of(Category::Panel)
        };
        let single_pole = ProductSpec {
            poles: Some(1),
            ..ProductSpec::of(Category::Breaker)
        };
        let verdict = Evaluator::new(&rules).evaluate(&three_phase, &single_pole);
        assert!(verdict
            .reasons
            .iter()
            .any(|r| r.starts_with("Pole count atypical for three-phase panels")));

        let two_pole = ProductSpec {
            poles: Some(2),
            ..ProductSpec::of(Category::Breaker)
        };
        let verdict = Evaluator::new(&rules).evaluate(&three_phase, &two_pole);
        assert!(!verdict.reasons.iter().any(|r| r.starts_with("Pole count")));
    }

    #[test]
    fn test_nema_violation_reason() {
        let rules = rules();
        let enclosure = ProductSpec {
            nema_rating: Some(NemaRating::Type1),
            ..ProductSpec::of(Category::Enclosure)
        };
        let site = ProductSpec::site_requiring(NemaRating::Type3R);
        let verdict = Evaluator::new(&rules).evaluate(&enclosure, &site);
        assert_eq!(verdict.result, VerdictResult::Incompatible);
        assert!(verdict.reasons[0].starts_with("NEMA rating conflict"));
    }

    #[test]
    fn test_links_on_every_result() {
        let rules = rules();
        let verdict = Evaluator::new(&rules).evaluate(&ProductSpec::default(), &panel());
        assert_eq!(verdict.suggested_links.len(), 1);
        assert_eq!(verdict.suggested_links[0].url, "https://shop.test/b?brand=Acme&family=X");
    }

    #[test]
    fn test_evaluation_is_deterministic() {
        let rules = rules();
        let evaluator = Evaluator::new(&rules);
        let first = evaluator.evaluate(&panel(), &breaker("Z", 60.0));
        let second = evaluator.evaluate(&panel(), &breaker("Z", 60.0));
        assert_eq!(first, second);
    }
}
