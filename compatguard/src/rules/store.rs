//! Rule Store
//!
//! Loads the compatibility rules table once and serves read-only lookups.
//! Loading fails closed: a rules file either validates completely or is
//! rejected, so checks never run against a partial table.
//!
//! Rules are resolved from, in order:
//! 1. An explicit path (CLI `--rules`)
//! 2. The `COMPATGUARD_RULES` environment variable
//! 3. `data/compatibility_rules.json` in the working directory
//! 4. The default table embedded in the binary

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::extractor::catalog::BrandCatalog;
use crate::rules::schema::*;

const EMBEDDED_RULES: &str = include_str!("../../rules/compatibility_rules.json");

pub const RULES_ENV_VAR: &str = "COMPATGUARD_RULES";
pub const DEFAULT_RULES_PATH: &str = "data/compatibility_rules.json";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Rules file not found: {}", .0.display())]
    Missing(PathBuf),

    #[error("Failed to read rules file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed rules file ({origin}): {source}")]
    Malformed {
        origin: RuleSource,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid rule '{rule}' ({origin}): {reason}")]
    InvalidRule {
        origin: RuleSource,
        rule: String,
        reason: String,
    },
}

/// Where a rule set came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleSource {
    Builtin,
    File(PathBuf),
    Inline,
}

impl fmt::Display for RuleSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleSource::Builtin => f.write_str("built-in rules"),
            RuleSource::File(path) => write!(f, "{}", path.display()),
            RuleSource::Inline => f.write_str("inline rules"),
        }
    }
}

/// Immutable, validated compatibility rules table
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<CompatibilityRule>,
    catalog: BrandCatalog,
    routes: Routes,
    nema_configurations: BTreeMap<String, NemaConfiguration>,
    disclaimer: Option<String>,
    ev_note: Option<String>,
    source: RuleSource,
}

impl RuleSet {
    /// Load and validate a rules file
    pub fn load(path: &Path) -> Result<RuleSet, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::Missing(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let rules = Self::parse(&content, RuleSource::File(path.to_path_buf()))?;
        tracing::info!("Loaded {} compatibility rules from {:?}", rules.len(), path);
        Ok(rules)
    }

    /// The default table compiled into the binary
    pub fn builtin() -> Result<RuleSet, ConfigError> {
        Self::parse(EMBEDDED_RULES, RuleSource::Builtin)
    }

    /// Parse rules from a JSON string
    pub fn from_json(json: &str) -> Result<RuleSet, ConfigError> {
        Self::parse(json, RuleSource::Inline)
    }

    /// Pick a rules file by precedence, falling back to the built-in table
    /// only when no file was named or discovered
    pub fn resolve(explicit: Option<&Path>) -> Result<RuleSet, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        if let Some(path) = std::env::var_os(RULES_ENV_VAR).filter(|v| !v.is_empty()) {
            tracing::debug!("Using rules from {}", RULES_ENV_VAR);
            return Self::load(Path::new(&path));
        }
        let default_path = Path::new(DEFAULT_RULES_PATH);
        if default_path.is_file() {
            return Self::load(default_path);
        }
        tracing::debug!("No rules file found, using built-in rules");
        Self::builtin()
    }

    fn parse(json: &str, origin: RuleSource) -> Result<RuleSet, ConfigError> {
        let file: RulesFile =
            serde_json::from_str(json).map_err(|source| ConfigError::Malformed {
                origin: origin.clone(),
                source,
            })?;

        let mut rules = Vec::with_capacity(file.rules.len());
        let mut seen_ids = HashSet::new();
        for (index, def) in file.rules.into_iter().enumerate() {
            let label = def
                .id
                .clone()
                .unwrap_or_else(|| format!("#{} {} {}", index + 1, def.brand, def.series));
            let rule = CompatibilityRule::compile(def).map_err(|reason| {
                ConfigError::InvalidRule {
                    origin: origin.clone(),
                    rule: label.clone(),
                    reason,
                }
            })?;
            if !seen_ids.insert(rule.id.to_ascii_lowercase()) {
                return Err(ConfigError::InvalidRule {
                    origin,
                    rule: rule.id,
                    reason: "duplicate rule id".to_string(),
                });
            }
            rules.push(rule);
        }

        if rules.is_empty() {
            tracing::warn!("Rule set ({}) has no rules; every check will be undetermined", origin);
        }

        let nema_configurations = file
            .nema_configurations
            .into_iter()
            .map(|(config, details)| (normalize_plug_config(&config), details))
            .collect();

        Ok(RuleSet {
            rules,
            catalog: BrandCatalog::from_entries(&file.brands),
            routes: file.routes,
            nema_configurations,
            disclaimer: file.disclaimer,
            ev_note: file.ev_note,
            source: origin,
        })
    }

    /// All rules whose category pair and brand/series match the two products
    pub fn lookup(&self, a: RuleKey<'_>, b: RuleKey<'_>) -> Vec<&CompatibilityRule> {
        self.rules
            .iter()
            .filter(|rule| rule.pair_matches(a.category, b.category))
            .filter(|rule| brand_matches(rule, &a, &b))
            .collect()
    }

    pub fn rules(&self) -> &[CompatibilityRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn catalog(&self) -> &BrandCatalog {
        &self.catalog
    }

    pub fn routes(&self) -> &Routes {
        &self.routes
    }

    pub fn nema_configuration(&self, config: &str) -> Option<&NemaConfiguration> {
        self.nema_configurations.get(&normalize_plug_config(config))
    }

    pub fn disclaimer(&self) -> Option<&str> {
        self.disclaimer.as_deref()
    }

    pub fn ev_note(&self) -> Option<&str> {
        self.ev_note.as_deref()
    }

    pub fn source(&self) -> &RuleSource {
        &self.source
    }
}

fn pattern_matches(pattern: &str, value: Option<&str>) -> bool {
    pattern == WILDCARD || value.map_or(false, |v| v.trim().eq_ignore_ascii_case(pattern))
}

fn brand_matches(rule: &CompatibilityRule, a: &RuleKey<'_>, b: &RuleKey<'_>) -> bool {
    if rule.is_wildcard() {
        return true;
    }
    [a, b]
        .into_iter()
        .filter(|key| rule.anchor.map_or(true, |anchor| key.category == anchor))
        .any(|key| pattern_matches(&rule.brand, key.brand) && pattern_matches(&rule.series, key.series))
}
