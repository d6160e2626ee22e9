//! Compatibility Rules Schema
//!
//! Serde shapes of the rules file plus the validated, compiled form the
//! evaluator works with. A `RuleDefinition` is exactly what users write; a
//! `CompatibilityRule` is produced from it by [`CompatibilityRule::compile`]
//! and only exists if every constraint made sense.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::product::{Category, NemaRating, ProductSpec};

/// Top-level rules file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RulesFile {
    #[serde(default)]
    pub version: Option<u32>,

    /// Known brands and their series tokens (used by the extractor)
    #[serde(default)]
    pub brands: Vec<BrandEntry>,

    pub rules: Vec<RuleDefinition>,

    /// Shop/CTA base URLs
    #[serde(default)]
    pub routes: Routes,

    /// Plug/receptacle configuration details keyed by configuration, e.g. `14-50`
    #[serde(default)]
    pub nema_configurations: BTreeMap<String, NemaConfiguration>,

    #[serde(default)]
    pub disclaimer: Option<String>,

    /// Note appended to EV charger circuit sizing
    #[serde(default)]
    pub ev_note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrandEntry {
    pub name: String,

    /// Other spellings that identify the brand, e.g. `Schneider` for Square D
    #[serde(default)]
    pub aliases: Vec<String>,

    #[serde(default)]
    pub series: Vec<SeriesEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesEntry {
    pub name: String,

    /// Tokens that identify the series in text; defaults to the name
    #[serde(default)]
    pub tokens: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Routes {
    #[serde(default)]
    pub breakers: Option<String>,
    #[serde(default)]
    pub panels: Option<String>,
    #[serde(default)]
    pub receptacles: Option<String>,
    #[serde(default)]
    pub plugs: Option<String>,
    #[serde(default)]
    pub ev: Option<String>,
    #[serde(default)]
    pub accessories: Option<String>,
    #[serde(default)]
    pub enclosures: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NemaConfiguration {
    pub voltage: String,
    pub amps: f64,
    #[serde(default)]
    pub description: Option<String>,
}

/// One rule as written in the rules file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleDefinition {
    #[serde(default)]
    pub id: Option<String>,

    pub category_pair: [Category; 2],

    /// Brand name or `*`
    pub brand: String,

    /// Series name or `*`
    pub series: String,

    /// Side of the pair whose brand/series the rule keys on
    #[serde(default)]
    pub anchor: Option<Category>,

    #[serde(default)]
    pub constraints: BTreeMap<String, ConstraintValue>,

    /// Constraint keys that must be checkable before the rule can pass
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,

    #[serde(default)]
    pub note: Option<String>,
}

/// Raw constraint value: scalar, `[min, max]`, list of strings or flag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConstraintValue {
    Flag(bool),
    Number(f64),
    Text(String),
    Range([f64; 2]),
    List(Vec<String>),
}

impl fmt::Display for ConstraintValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstraintValue::Flag(b) => write!(f, "{}", b),
            ConstraintValue::Number(n) => write!(f, "{}", n),
            ConstraintValue::Text(s) => write!(f, "{}", s),
            ConstraintValue::Range([min, max]) => write!(f, "[{}, {}]", min, max),
            ConstraintValue::List(items) => write!(f, "[{}]", items.join(", ")),
        }
    }
}

/// Attribute of a single product a field constraint reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Amperage,
    Voltage,
    Poles,
    NemaRating,
    Brand,
    Series,
    PlugConfig,
    Phase,
}

impl Field {
    fn parse(name: &str) -> Option<Field> {
        match name {
            "amperage" | "amps" => Some(Field::Amperage),
            "voltage" | "volts" => Some(Field::Voltage),
            "poles" => Some(Field::Poles),
            "nema_rating" | "nema" => Some(Field::NemaRating),
            "brand" => Some(Field::Brand),
            "series" => Some(Field::Series),
            "plug_config" => Some(Field::PlugConfig),
            "phase" => Some(Field::Phase),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Field::Amperage => "amperage",
            Field::Voltage => "voltage",
            Field::Poles => "pole count",
            Field::NemaRating => "NEMA rating",
            Field::Brand => "brand",
            Field::Series => "series",
            Field::PlugConfig => "plug configuration",
            Field::Phase => "phase",
        }
    }

    fn is_numeric(&self) -> bool {
        matches!(self, Field::Amperage | Field::Voltage | Field::Poles)
    }
}

/// Relation checked across both products of a pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    /// Breaker amperage must not exceed the panel's rated amperage
    BreakerWithinPanelRating,
    /// Circuit breaker must carry the charger's draw times the continuous-load factor
    ContinuousLoad,
    /// Product (or enclosure) rating must meet or exceed the site's (or other side's) rating
    NemaMeetsRequirement,
    PlugConfigMatch,
    VoltageMatch,
}

impl Relation {
    /// What has to be known about the pair for the relation to run
    pub fn inputs(&self) -> &'static str {
        match self {
            Relation::BreakerWithinPanelRating => "breaker and panel amperage",
            Relation::ContinuousLoad => "EV charger and breaker amperage",
            Relation::NemaMeetsRequirement => "NEMA rating of both sides",
            Relation::PlugConfigMatch => "NEMA configuration of both products",
            Relation::VoltageMatch => "voltage of both products",
        }
    }

    fn parse(name: &str) -> Option<Relation> {
        match name {
            "breaker_within_panel_rating" => Some(Relation::BreakerWithinPanelRating),
            "continuous_load" => Some(Relation::ContinuousLoad),
            "nema_meets_requirement" => Some(Relation::NemaMeetsRequirement),
            "plug_config_match" => Some(Relation::PlugConfigMatch),
            "voltage_match" => Some(Relation::VoltageMatch),
            _ => None,
        }
    }

    /// Whether the relation can be evaluated for a rule's category pair
    fn check_pair(&self, pair: &[Category; 2]) -> Result<(), String> {
        let has = |c: Category| pair.contains(&c);
        match self {
            Relation::BreakerWithinPanelRating if !(has(Category::Panel) && has(Category::Breaker)) => {
                Err("needs a panel and a breaker in the category pair".to_string())
            }
            Relation::ContinuousLoad if !(has(Category::EvCharger) && has(Category::Breaker)) => {
                Err("needs an ev_charger and a breaker in the category pair".to_string())
            }
            Relation::NemaMeetsRequirement if !(has(Category::Site) || has(Category::Enclosure)) => {
                Err("needs a site or an enclosure in the category pair".to_string())
            }
            _ => Ok(()),
        }
    }
}

/// Expected value of a field constraint, typed per field
#[derive(Debug, Clone, PartialEq)]
pub enum Expected {
    Number(f64),
    Range { min: f64, max: f64 },
    Text(String),
    OneOf(Vec<String>),
    /// Meets or exceeds this rating
    Rating(NemaRating),
    /// Exactly one of these ratings
    Ratings(Vec<NemaRating>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConstraintKind {
    Field {
        scope: Option<Category>,
        field: Field,
        expected: Expected,
    },
    Relation(Relation),
}

/// A validated constraint
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    /// Attribute name as written in the rules file
    pub key: String,
    pub value: ConstraintValue,
    pub kind: ConstraintKind,
    /// Listed in the rule's `required`
    pub required: bool,
}

impl Constraint {
    /// Description of the inputs the constraint reads, e.g. `breaker series`
    pub fn inputs(&self) -> String {
        match &self.kind {
            ConstraintKind::Field {
                scope: Some(category),
                field,
                ..
            } => format!("{} {}", category.display_name(), field.label()),
            ConstraintKind::Field { scope: None, field, .. } => field.label().to_string(),
            ConstraintKind::Relation(relation) => relation.inputs().to_string(),
        }
    }
}

/// A validated compatibility rule
#[derive(Debug, Clone, PartialEq)]
pub struct CompatibilityRule {
    pub id: String,
    pub category_pair: [Category; 2],
    pub brand: String,
    pub series: String,
    pub anchor: Option<Category>,
    pub constraints: Vec<Constraint>,
    pub note: Option<String>,
}

pub const WILDCARD: &str = "*";

impl CompatibilityRule {
    /// Validate a definition; every problem is reported, none is skipped
    pub fn compile(def: RuleDefinition) -> Result<CompatibilityRule, String> {
        let brand = def.brand.trim().to_string();
        let series = def.series.trim().to_string();
        if brand.is_empty() {
            return Err("brand must not be empty (use \"*\" for any brand)".to_string());
        }
        if series.is_empty() {
            return Err("series must not be empty (use \"*\" for any series)".to_string());
        }

        let pair = def.category_pair;
        if let Some(anchor) = def.anchor {
            if !pair.contains(&anchor) {
                return Err(format!(
                    "anchor '{}' is not part of category pair [{}, {}]",
                    anchor, pair[0], pair[1]
                ));
            }
        }

        let required: Vec<String> = def
            .required
            .iter()
            .map(|k| k.trim().to_ascii_lowercase())
            .collect();

        let mut constraints = Vec::new();
        for (key, value) in def.constraints {
            if let Some(kind) = compile_constraint(&key, &value, &pair)? {
                let is_required = required.contains(&key.trim().to_ascii_lowercase());
                constraints.push(Constraint {
                    key,
                    value,
                    kind,
                    required: is_required,
                });
            }
        }

        for key in &required {
            if !constraints
                .iter()
                .any(|c| c.required && c.key.trim().eq_ignore_ascii_case(key))
            {
                return Err(format!(
                    "required constraint '{}' is not an enabled constraint of the rule",
                    key
                ));
            }
        }

        let id = def
            .id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| format!("{} {} ({} ↔ {})", brand, series, pair[0], pair[1]));

        Ok(CompatibilityRule {
            id,
            category_pair: pair,
            brand,
            series,
            anchor: def.anchor,
            constraints,
            note: def.note,
        })
    }

    pub fn pair_matches(&self, a: Category, b: Category) -> bool {
        let [x, y] = self.category_pair;
        (x == a && y == b) || (x == b && y == a)
    }

    pub fn required_constraints(&self) -> impl Iterator<Item = &Constraint> {
        self.constraints.iter().filter(|c| c.required)
    }

    pub fn is_wildcard(&self) -> bool {
        self.brand == WILDCARD && self.series == WILDCARD
    }

    /// Human label, e.g. `Square D QO` or `any brand`
    pub fn subject(&self) -> String {
        match (self.brand.as_str(), self.series.as_str()) {
            (WILDCARD, WILDCARD) => "any brand".to_string(),
            (brand, WILDCARD) => format!("{} (any series)", brand),
            (WILDCARD, series) => format!("any brand, series {}", series),
            (brand, series) => format!("{} {}", brand, series),
        }
    }
}

fn compile_constraint(
    key: &str,
    value: &ConstraintValue,
    pair: &[Category; 2],
) -> Result<Option<ConstraintKind>, String> {
    let key_lower = key.trim().to_ascii_lowercase();

    if let Some(relation) = Relation::parse(&key_lower) {
        let enabled = match value {
            ConstraintValue::Flag(b) => *b,
            other => {
                return Err(format!(
                    "relation '{}' takes true or false, got {}",
                    key, other
                ))
            }
        };
        relation
            .check_pair(pair)
            .map_err(|reason| format!("relation '{}' {}", key, reason))?;
        return Ok(enabled.then_some(ConstraintKind::Relation(relation)));
    }

    let (scope, field_name) = match key_lower.split_once('.') {
        Some((scope, field)) => {
            let category: Category = scope
                .parse()
                .map_err(|e| format!("constraint '{}': {}", key, e))?;
            if !pair.contains(&category) {
                return Err(format!(
                    "constraint '{}' is scoped to {}, which is not in the category pair",
                    key, category
                ));
            }
            (Some(category), field)
        }
        None => (None, key_lower.as_str()),
    };

    let field = Field::parse(field_name)
        .ok_or_else(|| format!("unknown constraint attribute '{}'", key))?;
    let expected = compile_expected(key, field, value)?;

    Ok(Some(ConstraintKind::Field {
        scope,
        field,
        expected,
    }))
}

fn compile_expected(key: &str, field: Field, value: &ConstraintValue) -> Result<Expected, String> {
    if field.is_numeric() {
        return match value {
            ConstraintValue::Number(n) => Ok(Expected::Number(*n)),
            ConstraintValue::Range([min, max]) if min <= max => Ok(Expected::Range {
                min: *min,
                max: *max,
            }),
            ConstraintValue::Range([min, max]) => Err(format!(
                "constraint '{}' has an empty range [{}, {}]",
                key, min, max
            )),
            other => Err(format!(
                "constraint '{}' expects a number or [min, max], got {}",
                key, other
            )),
        };
    }

    match (field, value) {
        (Field::NemaRating, ConstraintValue::Text(s)) => s
            .parse::<NemaRating>()
            .map(Expected::Rating)
            .map_err(|e| format!("constraint '{}': {}", key, e)),
        (Field::NemaRating, ConstraintValue::List(items)) => items
            .iter()
            .map(|s| s.parse::<NemaRating>())
            .collect::<Result<Vec<_>, _>>()
            .map(Expected::Ratings)
            .map_err(|e| format!("constraint '{}': {}", key, e)),
        (Field::Phase, ConstraintValue::Text(s)) => {
            normalize_phase(s).map(|p| Expected::Text(p.to_string())).ok_or_else(|| {
                format!("constraint '{}': phase must be 'single' or 'three'", key)
            })
        }
        (Field::Phase, ConstraintValue::List(items)) => items
            .iter()
            .map(|s| normalize_phase(s).map(str::to_string))
            .collect::<Option<Vec<_>>>()
            .map(Expected::OneOf)
            .ok_or_else(|| format!("constraint '{}': phase must be 'single' or 'three'", key)),
        (Field::PlugConfig, ConstraintValue::Text(s)) => {
            Ok(Expected::Text(normalize_plug_config(s)))
        }
        (Field::PlugConfig, ConstraintValue::List(items)) => Ok(Expected::OneOf(
            items.iter().map(|s| normalize_plug_config(s)).collect(),
        )),
        (_, ConstraintValue::Text(s)) => Ok(Expected::Text(s.trim().to_string())),
        (_, ConstraintValue::List(items)) if !items.is_empty() => Ok(Expected::OneOf(
            items.iter().map(|s| s.trim().to_string()).collect(),
        )),
        (_, other) => Err(format!(
            "constraint '{}' expects text or a list of text, got {}",
            key, other
        )),
    }
}

fn normalize_phase(s: &str) -> Option<&'static str> {
    match s.trim().to_ascii_lowercase().as_str() {
        "single" | "1" | "1ø" | "single-phase" => Some("single"),
        "three" | "3" | "3ø" | "three-phase" => Some("three"),
        _ => None,
    }
}

/// Normalize a NEMA wiring configuration: `NEMA 14-50R` becomes `14-50`
pub fn normalize_plug_config(s: &str) -> String {
    let upper = s.trim().to_ascii_uppercase();
    let bare = upper.trim_start_matches("NEMA").trim();
    bare.trim_end_matches(['P', 'R']).trim().to_string()
}

/// Borrowed view of the identifying fields of a product for rule lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleKey<'a> {
    pub category: Category,
    pub brand: Option<&'a str>,
    pub series: Option<&'a str>,
}

impl<'a> RuleKey<'a> {
    pub fn new(category: Category, brand: Option<&'a str>, series: Option<&'a str>) -> Self {
        Self {
            category,
            brand,
            series,
        }
    }

    /// `None` when the spec has no category
    pub fn from_spec(spec: &'a ProductSpec) -> Option<Self> {
        Some(Self {
            category: spec.category?,
            brand: spec.brand.as_deref(),
            series: spec.series.as_deref(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn definition(json: &str) -> RuleDefinition {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_constraint_value_shapes() {
        let v: BTreeMap<String, ConstraintValue> = serde_json::from_str(
            r#"{"a": true, "b": 20, "c": "QO", "d": [10, 70], "e": ["QO", "HOM"]}"#,
        )
        .unwrap();
        assert_eq!(v["a"], ConstraintValue::Flag(true));
        assert_eq!(v["b"], ConstraintValue::Number(20.0));
        assert_eq!(v["c"], ConstraintValue::Text("QO".to_string()));
        assert_eq!(v["d"], ConstraintValue::Range([10.0, 70.0]));
        assert_eq!(
            v["e"],
            ConstraintValue::List(vec!["QO".to_string(), "HOM".to_string()])
        );
    }

    #[test]
    fn test_compile_scoped_and_relation_constraints() {
        let rule = CompatibilityRule::compile(definition(
            r#"{
                "category_pair": ["panel", "breaker"],
                "brand": "Square D",
                "series": "QO",
                "anchor": "panel",
                "constraints": {
                    "breaker.amperage": [10, 70],
                    "breaker.series": ["QO"],
                    "breaker_within_panel_rating": true
                }
            }"#,
        ))
        .unwrap();

        assert_eq!(rule.id, "Square D QO (panel ↔ breaker)");
        assert_eq!(rule.constraints.len(), 3);
        assert!(rule.constraints.iter().any(|c| matches!(
            c.kind,
            ConstraintKind::Field {
                scope: Some(Category::Breaker),
                field: Field::Amperage,
                expected: Expected::Range { .. }
            }
        )));
        assert!(rule
            .constraints
            .iter()
            .any(|c| c.kind == ConstraintKind::Relation(Relation::BreakerWithinPanelRating)));
    }

    #[test]
    fn test_required_constraints_are_marked() {
        let rule = CompatibilityRule::compile(definition(
            r#"{"category_pair": ["panel", "breaker"], "brand": "Acme", "series": "X",
                "constraints": {"breaker.series": ["X"], "breaker.amperage": [10, 50]},
                "required": ["Breaker.Series"]}"#,
        ))
        .unwrap();
        let required: Vec<&Constraint> = rule.required_constraints().collect();
        assert_eq!(required.len(), 1);
        assert_eq!(required[0].key, "breaker.series");
        assert_eq!(required[0].inputs(), "breaker series");
    }

    #[test]
    fn test_required_must_name_an_enabled_constraint() {
        let cases = [
            r#"{"category_pair": ["panel", "breaker"], "brand": "X", "series": "Y",
                "constraints": {"breaker.amperage": [10, 50]}, "required": ["breaker.series"]}"#,
            r#"{"category_pair": ["plug", "receptacle"], "brand": "*", "series": "*",
                "constraints": {"plug_config_match": false}, "required": ["plug_config_match"]}"#,
        ];
        for case in cases {
            let err = CompatibilityRule::compile(definition(case)).unwrap_err();
            assert!(err.contains("required constraint"), "{}", err);
        }
    }

    #[test]
    fn test_disabled_relation_is_dropped() {
        let rule = CompatibilityRule::compile(definition(
            r#"{"category_pair": ["plug", "receptacle"], "brand": "*", "series": "*",
                "constraints": {"voltage_match": false}}"#,
        ))
        .unwrap();
        assert!(rule.constraints.is_empty());
    }

    #[test]
    fn test_compile_rejects_bad_definitions() {
        let cases = [
            r#"{"category_pair": ["panel", "breaker"], "brand": "X", "series": "Y",
                "constraints": {"color": "red"}}"#,
            r#"{"category_pair": ["panel", "breaker"], "brand": "X", "series": "Y",
                "constraints": {"breaker.amperage": [70, 10]}}"#,
            r#"{"category_pair": ["panel", "breaker"], "brand": "X", "series": "Y",
                "constraints": {"amperage": "twenty"}}"#,
            r#"{"category_pair": ["panel", "breaker"], "brand": "X", "series": "Y",
                "constraints": {"plug.amperage": 20}}"#,
            r#"{"category_pair": ["panel", "breaker"], "brand": "X", "series": "Y",
                "constraints": {"continuous_load": true}}"#,
            r#"{"category_pair": ["panel", "breaker"], "brand": "X", "series": "Y",
                "constraints": {"breaker_within_panel_rating": "yes"}}"#,
            r#"{"category_pair": ["panel", "breaker"], "brand": "X", "series": "Y",
                "anchor": "plug"}"#,
            r#"{"category_pair": ["enclosure", "site"], "brand": "*", "series": "*",
                "constraints": {"nema_rating": "9Z"}}"#,
            r#"{"category_pair": ["panel", "breaker"], "brand": "", "series": "Y"}"#,
        ];
        for case in cases {
            assert!(
                CompatibilityRule::compile(definition(case)).is_err(),
                "should reject: {}",
                case
            );
        }
    }

    #[test]
    fn test_pair_matching_is_order_independent() {
        let rule = CompatibilityRule::compile(definition(
            r#"{"category_pair": ["breaker", "panel"], "brand": "*", "series": "*"}"#,
        ))
        .unwrap();
        assert!(rule.pair_matches(Category::Panel, Category::Breaker));
        assert!(rule.pair_matches(Category::Breaker, Category::Panel));
        assert!(!rule.pair_matches(Category::Panel, Category::Plug));
        assert!(rule.is_wildcard());
        assert_eq!(rule.subject(), "any brand");
    }

    #[test]
    fn test_normalize_plug_config() {
        assert_eq!(normalize_plug_config("NEMA 14-50R"), "14-50");
        assert_eq!(normalize_plug_config("6-20p"), "6-20");
        assert_eq!(normalize_plug_config("L14-30"), "L14-30");
    }
}
