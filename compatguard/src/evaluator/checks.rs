//! Constraint checks against a product pair.
//!
//! A check whose inputs are not all known is skipped; skipped checks are
//! neither passes nor violations and do not count toward a rule's
//! specificity.

use crate::evaluator::sizing::CONTINUOUS_LOAD_FACTOR;
use crate::product::{format_amps, format_volts, Category, NemaRating, ProductSpec};
use crate::rules::schema::{normalize_plug_config, ConstraintKind, Expected, Field, Relation};

/// Relative tolerance for voltage comparisons (120 vs 125 nominal)
pub const VOLTAGE_TOLERANCE: f64 = 0.05;

#[derive(Debug, Clone, PartialEq)]
pub enum CheckOutcome {
    Skipped,
    Passed(String),
    Violated(String),
}

/// Check one constraint; unscoped field constraints produce one outcome per side
pub fn check_constraint(kind: &ConstraintKind, a: &ProductSpec, b: &ProductSpec) -> Vec<CheckOutcome> {
    match kind {
        ConstraintKind::Field {
            scope,
            field,
            expected,
        } => [a, b]
            .into_iter()
            .filter(|spec| scope.map_or(true, |s| spec.category == Some(s)))
            .map(|spec| check_field(*field, expected, spec))
            .collect(),
        ConstraintKind::Relation(relation) => vec![check_relation(*relation, a, b)],
    }
}

fn subject(spec: &ProductSpec) -> &'static str {
    spec.category.map(|c| c.display_name()).unwrap_or("product")
}

fn format_number(field: Field, value: f64) -> String {
    match field {
        Field::Amperage => format_amps(value),
        Field::Voltage => format_volts(value),
        Field::Poles => format!("{}-pole", value),
        _ => value.to_string(),
    }
}

fn numbers_equal(field: Field, actual: f64, expected: f64) -> bool {
    match field {
        Field::Voltage => (actual - expected).abs() <= expected.abs() * VOLTAGE_TOLERANCE,
        _ => (actual - expected).abs() < f64::EPSILON,
    }
}

fn voltages_match(x: f64, y: f64) -> bool {
    (x - y).abs() <= x.max(y) * VOLTAGE_TOLERANCE
}

fn text_value(field: Field, spec: &ProductSpec) -> Option<String> {
    match field {
        Field::Brand => spec.brand.clone(),
        Field::Series => spec.series.clone(),
        Field::PlugConfig => spec.plug_config.as_deref().map(normalize_plug_config),
        Field::Phase => spec.phase.map(|p| p.as_str().to_string()),
        _ => None,
    }
}

fn check_field(field: Field, expected: &Expected, spec: &ProductSpec) -> CheckOutcome {
    let who = subject(spec);
    let label = field.label();

    match field {
        Field::Amperage | Field::Voltage | Field::Poles => {
            // a dual voltage rating satisfies a constraint through either figure
            let candidates: Vec<f64> = match field {
                Field::Amperage => spec.amperage.into_iter().collect(),
                Field::Voltage => spec.voltages(),
                _ => spec.poles.map(f64::from).into_iter().collect(),
            };
            if candidates.is_empty() {
                return CheckOutcome::Skipped;
            }
            let shown = match field {
                Field::Voltage => spec.voltage_label().unwrap_or_default(),
                _ => format_number(field, candidates[0]),
            };
            match expected {
                Expected::Number(n) if candidates.iter().any(|v| numbers_equal(field, *v, *n)) => {
                    CheckOutcome::Passed(format!(
                        "{} {} {} matches the required {}",
                        who,
                        label,
                        shown,
                        format_number(field, *n)
                    ))
                }
                Expected::Number(n) => CheckOutcome::Violated(format!(
                    "{} {} {} does not match the required {}",
                    who,
                    label,
                    shown,
                    format_number(field, *n)
                )),
                Expected::Range { min, max } if candidates.iter().any(|v| v >= min && v <= max) => {
                    CheckOutcome::Passed(format!(
                        "{} {} {} is within the supported {} to {}",
                        who,
                        label,
                        shown,
                        format_number(field, *min),
                        format_number(field, *max)
                    ))
                }
                Expected::Range { min, max } => CheckOutcome::Violated(format!(
                    "{} {} {} is outside the supported {} to {}",
                    who,
                    label,
                    shown,
                    format_number(field, *min),
                    format_number(field, *max)
                )),
                _ => CheckOutcome::Skipped,
            }
        }
        Field::NemaRating => {
            let Some(actual) = spec.nema_rating else {
                return CheckOutcome::Skipped;
            };
            match expected {
                Expected::Rating(required) if actual.meets(*required) => CheckOutcome::Passed(
                    format!("{} {} meets or exceeds {}", who, actual, required),
                ),
                Expected::Rating(required) => CheckOutcome::Violated(format!(
                    "NEMA rating conflict: {} is {}, which does not meet {}",
                    who, actual, required
                )),
                Expected::Ratings(allowed) if allowed.contains(&actual) => {
                    CheckOutcome::Passed(format!("{} {} is an accepted rating", who, actual))
                }
                Expected::Ratings(allowed) => CheckOutcome::Violated(format!(
                    "NEMA rating conflict: {} is {}, expected one of {}",
                    who,
                    actual,
                    allowed
                        .iter()
                        .map(NemaRating::to_string)
                        .collect::<Vec<_>>()
                        .join(", ")
                )),
                _ => CheckOutcome::Skipped,
            }
        }
        Field::Brand | Field::Series | Field::PlugConfig | Field::Phase => {
            let Some(actual) = text_value(field, spec) else {
                return CheckOutcome::Skipped;
            };
            match expected {
                Expected::Text(want) if actual.eq_ignore_ascii_case(want) => {
                    CheckOutcome::Passed(format!("{} {} is {}", who, label, actual))
                }
                Expected::Text(want) => CheckOutcome::Violated(format!(
                    "{} {} is {}, but {} is required",
                    who, label, actual, want
                )),
                Expected::OneOf(options) if options.iter().any(|o| o.eq_ignore_ascii_case(&actual)) => {
                    CheckOutcome::Passed(format!("{} {} {} is accepted", who, label, actual))
                }
                Expected::OneOf(options) => CheckOutcome::Violated(format!(
                    "{} {} {} is not accepted (expected {})",
                    who,
                    label,
                    actual,
                    options.join(" or ")
                )),
                _ => CheckOutcome::Skipped,
            }
        }
    }
}

/// The product of the pair with the given category, first side preferred
fn side<'s>(category: Category, a: &'s ProductSpec, b: &'s ProductSpec) -> Option<&'s ProductSpec> {
    [a, b].into_iter().find(|s| s.category == Some(category))
}

fn other<'s>(this: &'s ProductSpec, a: &'s ProductSpec, b: &'s ProductSpec) -> &'s ProductSpec {
    if std::ptr::eq(this, a) {
        b
    } else {
        a
    }
}

fn check_relation(relation: Relation, a: &ProductSpec, b: &ProductSpec) -> CheckOutcome {
    match relation {
        Relation::BreakerWithinPanelRating => {
            let (Some(panel), Some(breaker)) = (side(Category::Panel, a, b), side(Category::Breaker, a, b)) else {
                return CheckOutcome::Skipped;
            };
            let (Some(panel_amps), Some(breaker_amps)) = (panel.amperage, breaker.amperage) else {
                return CheckOutcome::Skipped;
            };
            if breaker_amps <= panel_amps {
                CheckOutcome::Passed(format!(
                    "breaker {} is within the panel's {} rating",
                    format_amps(breaker_amps),
                    format_amps(panel_amps)
                ))
            } else {
                CheckOutcome::Violated(format!(
                    "breaker {} exceeds the panel's {} rating",
                    format_amps(breaker_amps),
                    format_amps(panel_amps)
                ))
            }
        }
        Relation::ContinuousLoad => {
            let (Some(charger), Some(breaker)) = (side(Category::EvCharger, a, b), side(Category::Breaker, a, b)) else {
                return CheckOutcome::Skipped;
            };
            let (Some(charger_amps), Some(breaker_amps)) = (charger.amperage, breaker.amperage) else {
                return CheckOutcome::Skipped;
            };
            let required = charger_amps * CONTINUOUS_LOAD_FACTOR;
            if breaker_amps >= required {
                CheckOutcome::Passed(format!(
                    "{} circuit covers the {} charger's continuous load (needs at least {} = {} × {})",
                    format_amps(breaker_amps),
                    format_amps(charger_amps),
                    format_amps(required),
                    format_amps(charger_amps),
                    CONTINUOUS_LOAD_FACTOR
                ))
            } else {
                CheckOutcome::Violated(format!(
                    "{} EV charger needs a circuit of at least {} ({} × {} continuous-load factor), but the breaker is rated {}",
                    format_amps(charger_amps),
                    format_amps(required),
                    format_amps(charger_amps),
                    CONTINUOUS_LOAD_FACTOR,
                    format_amps(breaker_amps)
                ))
            }
        }
        Relation::NemaMeetsRequirement => {
            let (provider, requirement) = if let Some(site) = side(Category::Site, a, b) {
                (other(site, a, b), site)
            } else if let Some(enclosure) = side(Category::Enclosure, a, b) {
                (enclosure, other(enclosure, a, b))
            } else {
                return CheckOutcome::Skipped;
            };
            let (Some(provided), Some(required)) = (provider.nema_rating, requirement.nema_rating) else {
                return CheckOutcome::Skipped;
            };
            if provided.meets(required) {
                CheckOutcome::Passed(format!(
                    "{} {} meets or exceeds the {} requirement of the {}",
                    subject(provider),
                    provided,
                    required,
                    subject(requirement)
                ))
            } else {
                CheckOutcome::Violated(format!(
                    "NEMA rating conflict: the {} is {}, but the {} requires {}",
                    subject(provider),
                    provided,
                    subject(requirement),
                    required
                ))
            }
        }
        Relation::PlugConfigMatch => {
            let (Some(x), Some(y)) = (a.plug_config.as_deref(), b.plug_config.as_deref()) else {
                return CheckOutcome::Skipped;
            };
            let (x, y) = (normalize_plug_config(x), normalize_plug_config(y));
            if x.eq_ignore_ascii_case(&y) {
                CheckOutcome::Passed(format!("both use NEMA {} configuration", x))
            } else {
                CheckOutcome::Violated(format!(
                    "NEMA configuration mismatch: {} is {}, {} is {}",
                    subject(a),
                    x,
                    subject(b),
                    y
                ))
            }
        }
        Relation::VoltageMatch => {
            let (Some(label_a), Some(label_b)) = (a.voltage_label(), b.voltage_label()) else {
                return CheckOutcome::Skipped;
            };
            let shared = a
                .voltages()
                .into_iter()
                .find_map(|x| b.voltages().into_iter().find(|y| voltages_match(x, *y)).map(|y| (x, y)));
            match shared {
                Some((x, y)) => CheckOutcome::Passed(format!(
                    "voltages agree ({} and {})",
                    format_volts(x),
                    format_volts(y)
                )),
                None => CheckOutcome::Violated(format!(
                    "voltage mismatch: {} is {}, {} is {}",
                    subject(a),
                    label_a,
                    subject(b),
                    label_b
                )),
            }
        }
    }
}
