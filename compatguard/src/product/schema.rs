//! Product Specification Schema
//!
//! Structured guesses produced from pasted product text. Every field is
//! optional: an unset field means the text carried no unambiguous signal for
//! it, never a default.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::product::nema::NemaRating;

/// Product category (or installation context) a spec describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Panel,
    Breaker,
    Plug,
    Receptacle,
    Enclosure,
    #[serde(alias = "evse")]
    EvCharger,
    /// Installation environment requirement rather than a product
    Site,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Panel,
        Category::Breaker,
        Category::Plug,
        Category::Receptacle,
        Category::Enclosure,
        Category::EvCharger,
        Category::Site,
    ];

    /// Get the snake_case identifier used in rule files
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Panel => "panel",
            Category::Breaker => "breaker",
            Category::Plug => "plug",
            Category::Receptacle => "receptacle",
            Category::Enclosure => "enclosure",
            Category::EvCharger => "ev_charger",
            Category::Site => "site",
        }
    }

    /// Get a display name for reports
    pub fn display_name(&self) -> &'static str {
        match self {
            Category::Panel => "panel",
            Category::Breaker => "breaker",
            Category::Plug => "plug",
            Category::Receptacle => "receptacle",
            Category::Enclosure => "enclosure",
            Category::EvCharger => "EV charger",
            Category::Site => "installation site",
        }
    }

    /// Whether this is a physical product (everything except `Site`)
    pub fn is_product(&self) -> bool {
        !matches!(self, Category::Site)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown category '{0}'")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "panel" | "load_center" => Ok(Category::Panel),
            "breaker" => Ok(Category::Breaker),
            "plug" => Ok(Category::Plug),
            "receptacle" => Ok(Category::Receptacle),
            "enclosure" => Ok(Category::Enclosure),
            "ev_charger" | "evse" => Ok(Category::EvCharger),
            "site" => Ok(Category::Site),
            other => Err(UnknownCategory(other.to_string())),
        }
    }
}

/// Supply phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Single,
    Three,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Single => "single",
            Phase::Three => "three",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Single => f.write_str("1Ø"),
            Phase::Three => f.write_str("3Ø"),
        }
    }
}

/// Structured guess of a product's specification
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductSpec {
    pub category: Option<Category>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series: Option<String>,

    /// Rated current in amps
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amperage: Option<f64>,

    /// Nominal voltage in volts (the lower figure of a dual rating)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voltage: Option<f64>,

    /// Upper figure of a dual rating such as `125/250V`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voltage_max: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nema_rating: Option<NemaRating>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poles: Option<u8>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<Phase>,

    /// NEMA wiring configuration without the P/R suffix, e.g. `14-50`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plug_config: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl ProductSpec {
    /// Create a spec with only the category set
    pub fn of(category: Category) -> Self {
        Self {
            category: Some(category),
            ..Default::default()
        }
    }

    /// Installation context requiring (at least) the given enclosure rating
    pub fn site_requiring(rating: NemaRating) -> Self {
        Self {
            category: Some(Category::Site),
            nema_rating: Some(rating),
            ..Default::default()
        }
    }

    /// Fill every unset field from `other`; fields already set are kept
    pub fn merge_missing(&mut self, other: ProductSpec) {
        if self.category.is_none() {
            self.category = other.category;
        }
        if self.brand.is_none() {
            self.brand = other.brand;
        }
        if self.series.is_none() {
            self.series = other.series;
        }
        if self.amperage.is_none() {
            self.amperage = other.amperage;
        }
        // a dual rating is kept or taken as a whole
        if self.voltage.is_none() {
            self.voltage = other.voltage;
            self.voltage_max = other.voltage_max;
        }
        if self.nema_rating.is_none() {
            self.nema_rating = other.nema_rating;
        }
        if self.poles.is_none() {
            self.poles = other.poles;
        }
        if self.phase.is_none() {
            self.phase = other.phase;
        }
        if self.plug_config.is_none() {
            self.plug_config = other.plug_config;
        }
        if self.model.is_none() {
            self.model = other.model;
        }
    }

    /// Short description for report lines, e.g. `Square D QO breaker (20A)`
    pub fn describe(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        if let Some(ref brand) = self.brand {
            parts.push(brand.clone());
        }
        if let Some(ref series) = self.series {
            parts.push(series.clone());
        }
        parts.push(
            self.category
                .map(|c| c.display_name().to_string())
                .unwrap_or_else(|| "unidentified product".to_string()),
        );
        let mut text = parts.join(" ");
        if let Some(amps) = self.amperage {
            text.push_str(&format!(" ({})", format_amps(amps)));
        }
        text
    }

    /// Every rated voltage: one figure, or both of a dual rating
    pub fn voltages(&self) -> Vec<f64> {
        self.voltage.into_iter().chain(self.voltage_max).collect()
    }

    /// Voltage rating as written on a label, e.g. `240V` or `125/250V`
    pub fn voltage_label(&self) -> Option<String> {
        let low = self.voltage?;
        Some(match self.voltage_max {
            Some(high) => format!("{}/{}", format_volts(low).trim_end_matches('V'), format_volts(high)),
            None => format_volts(low),
        })
    }

    /// True if nothing at all was recognized
    pub fn is_empty(&self) -> bool {
        *self == ProductSpec::default()
    }
}

/// Format an amperage without a trailing `.0` for whole values
pub fn format_amps(amps: f64) -> String {
    if amps.fract() == 0.0 {
        format!("{}A", amps as i64)
    } else {
        format!("{}A", amps)
    }
}

/// Format a voltage without a trailing `.0` for whole values
pub fn format_volts(volts: f64) -> String {
    if volts.fract() == 0.0 {
        format!("{}V", volts as i64)
    } else {
        format!("{}V", volts)
    }
}
