//! Independent field detectors.
//!
//! Each detector looks at the normalized text and returns a partial
//! `ProductSpec` holding only the fields it is responsible for. A detector
//! that is not sure leaves the field unset.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

use crate::extractor::catalog::BrandCatalog;
use crate::product::{Category, NemaRating, Phase, ProductSpec};
use crate::rules::schema::normalize_plug_config;

/// A single extraction step
pub trait FieldDetector: Send + Sync {
    fn id(&self) -> &str;
    fn detect(&self, text: &str) -> ProductSpec;
}

fn keywords(words: &[&str]) -> Regex {
    let alternatives: Vec<String> = words
        .iter()
        .map(|w| {
            w.split_whitespace()
                .map(regex::escape)
                .collect::<Vec<_>>()
                .join(r"[\s-]+")
        })
        .collect();
    Regex::new(&format!(r"(?i)\b(?:{})\b", alternatives.join("|")))
        .expect("static keyword pattern")
}

/// Phrases that mention another category's word without naming that product
static QUALIFIERS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bplug[\s-]*(?:on|in)\b|\bbreaker\s+(?:panel|box)\b|\boutlet\s+box\b")
        .expect("static qualifier pattern")
});

/// Phrases naming what a product goes with rather than the product itself,
/// e.g. "for QO load centers" or "with NEMA 14-50 plug"
static TARGET_PHRASES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?i)\bfor\s+(?:use\s+(?:in|with)\s+)?(?:[\w&/.-]+\s+){0,4}?",
        r"(?:load[\s-]*centers?|loadcenters?|panelboards?|sub-?panels?|panels?|breakers?|receptacles?|outlets?|enclosures?|ev\s+chargers?)\b",
        r"|\bwith\s+(?:an?\s+)?(?:[\w-]+\s+){0,3}?(?:plug|cord)\b",
    ))
    .expect("static target phrase pattern")
});

static PRODUCT_VOCABULARY: Lazy<Vec<(Category, Regex)>> = Lazy::new(|| {
    vec![
        (
            Category::Panel,
            keywords(&[
                "load center",
                "load centers",
                "loadcenter",
                "loadcenters",
                "panelboard",
                "panelboards",
                "panel board",
                "panel",
                "panels",
                "subpanel",
                "main lug",
            ]),
        ),
        (
            Category::Breaker,
            keywords(&["breaker", "breakers", "circuit breaker", "circuit breakers"]),
        ),
        (
            Category::Plug,
            keywords(&["plug", "plugs", "cord cap", "male connector"]),
        ),
        (
            Category::Receptacle,
            keywords(&["receptacle", "receptacles", "outlet", "outlets"]),
        ),
        (
            Category::Enclosure,
            keywords(&[
                "enclosure",
                "enclosures",
                "junction box",
                "pull box",
                "cabinet",
            ]),
        ),
        (
            Category::EvCharger,
            keywords(&[
                "ev charger",
                "ev chargers",
                "evse",
                "electric vehicle charger",
                "ev charging station",
                "level 2 charger",
                "wall connector",
            ]),
        ),
    ]
});

static SITE_VOCABULARY: Lazy<Regex> = Lazy::new(|| {
    keywords(&[
        "install",
        "installation",
        "installed",
        "outdoor",
        "outdoors",
        "indoor",
        "location",
        "environment",
        "requiring",
        "requires",
        "required",
        "wet location",
        "damp location",
        "washdown",
        "corrosive",
    ])
});

/// Assigns `category` from a fixed keyword vocabulary
pub struct CategoryDetector;

impl CategoryDetector {
    fn named_categories(text: &str) -> BTreeSet<Category> {
        PRODUCT_VOCABULARY
            .iter()
            .filter(|(_, pattern)| pattern.is_match(text))
            .map(|(category, _)| *category)
            .collect()
    }
}

impl FieldDetector for CategoryDetector {
    fn id(&self) -> &str {
        "category"
    }

    fn detect(&self, text: &str) -> ProductSpec {
        let unqualified = QUALIFIERS.replace_all(text, |caps: &regex::Captures| {
            // "breaker panel" and "breaker box" still name a panel
            let phrase = caps[0].to_ascii_lowercase();
            if phrase.starts_with("breaker") {
                " panel ".to_string()
            } else {
                " ".to_string()
            }
        });

        let mut found = Self::named_categories(&unqualified);
        if found.len() > 1 {
            let focused = TARGET_PHRASES.replace_all(&unqualified, " ");
            let narrowed = Self::named_categories(&focused);
            if narrowed.len() == 1 {
                tracing::debug!("Category narrowed to {:?} by ignoring target phrases", narrowed);
                found = narrowed;
            }
        }

        let category = match found.len() {
            0 if SITE_VOCABULARY.is_match(&unqualified) => Some(Category::Site),
            0 => None,
            1 => found.iter().next().copied(),
            _ => {
                tracing::warn!(
                    "Ambiguous product text names several categories: {:?}",
                    found
                );
                None
            }
        };

        ProductSpec {
            category,
            ..Default::default()
        }
    }
}

static AMPERAGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(\d{1,4}(?:\.\d+)?)\s*-?\s*(?:a|amps?|amperes?)\b")
        .expect("static amperage pattern")
});

static VOLTAGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(\d{2,3})(?:\s*/\s*(\d{2,3}))?\s*-?\s*(?:v|vac|volts?)\b")
        .expect("static voltage pattern")
});

static POLES_NUMERIC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b([1-4])\s*-?\s*(?:p|poles?)\b").expect("static pole pattern")
});

static POLES_WORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(single|one|double|two|triple|three|four)[\s-]*poles?\b")
        .expect("static pole word pattern")
});

static PHASE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(1|single|3|three)[\s-]*(?:ø|φ|ph\b|phase\b)").expect("static phase pattern")
});

static NEMA_ENCLOSURE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bnema\s*(?:type\s*)?(\d{1,2}[a-z]{0,2})\b").expect("static nema pattern")
});

static NEMA_CONFIG_PREFIXED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bnema\s*(l?\d{1,2}-\d{2}[pr]?)\b").expect("static nema config pattern")
});

static NEMA_CONFIG_SUFFIXED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(l?\d{1,2}-\d{2}[pr])\b").expect("static nema config pattern")
});

/// Numeric ratings adjacent to unit tokens, plus NEMA and phase markers
pub struct RatingDetector;

impl RatingDetector {
    fn amperage(text: &str) -> Option<f64> {
        AMPERAGE
            .captures(text)
            .and_then(|c| c[1].parse::<f64>().ok())
            .filter(|a| *a > 0.0)
    }

    /// Nominal voltage and, for dual ratings like `120/240V`, the upper figure
    fn voltage(text: &str) -> (Option<f64>, Option<f64>) {
        let Some(caps) = VOLTAGE.captures(text) else {
            return (None, None);
        };
        let low = caps[1].parse::<f64>().ok().filter(|v| *v > 0.0);
        let high = caps
            .get(2)
            .and_then(|m| m.as_str().parse::<f64>().ok())
            .filter(|high| low.is_some_and(|low| *high > low));
        (low, high)
    }

    fn poles(text: &str) -> Option<u8> {
        if let Some(c) = POLES_NUMERIC.captures(text) {
            return c[1].parse().ok();
        }
        POLES_WORD.captures(text).and_then(|c| {
            match c[1].to_ascii_lowercase().as_str() {
                "single" | "one" => Some(1),
                "double" | "two" => Some(2),
                "triple" | "three" => Some(3),
                "four" => Some(4),
                _ => None,
            }
        })
    }

    fn phase(text: &str) -> Option<Phase> {
        PHASE.captures(text).map(|c| match c[1].to_ascii_lowercase().as_str() {
            "3" | "three" => Phase::Three,
            _ => Phase::Single,
        })
    }

    fn nema_rating(text: &str) -> Option<NemaRating> {
        for caps in NEMA_ENCLOSURE.captures_iter(text) {
            let Some(m) = caps.get(1) else { continue };
            // `NEMA 14-50` is a wiring configuration, not an enclosure type
            if text[m.end()..].starts_with('-') {
                continue;
            }
            match m.as_str().parse::<NemaRating>() {
                Ok(rating) => return Some(rating),
                Err(e) => tracing::debug!("Ignoring NEMA marker: {}", e),
            }
        }
        None
    }

    fn plug_config(text: &str) -> Option<String> {
        NEMA_CONFIG_PREFIXED
            .captures(text)
            .or_else(|| NEMA_CONFIG_SUFFIXED.captures(text))
            .map(|c| normalize_plug_config(&c[1]))
    }
}

impl FieldDetector for RatingDetector {
    fn id(&self) -> &str {
        "ratings"
    }

    fn detect(&self, text: &str) -> ProductSpec {
        let (voltage, voltage_max) = Self::voltage(text);
        ProductSpec {
            amperage: Self::amperage(text),
            voltage,
            voltage_max,
            poles: Self::poles(text),
            phase: Self::phase(text),
            nema_rating: Self::nema_rating(text),
            plug_config: Self::plug_config(text),
            ..Default::default()
        }
    }
}

/// Brand and series from the catalog
pub struct BrandDetector {
    catalog: BrandCatalog,
}

impl BrandDetector {
    pub fn new(catalog: BrandCatalog) -> Self {
        Self { catalog }
    }
}

impl FieldDetector for BrandDetector {
    fn id(&self) -> &str {
        "brand"
    }

    fn detect(&self, text: &str) -> ProductSpec {
        let (brand, series) = match self.catalog.find_brand(text) {
            Some(brand) => (
                Some(brand.to_string()),
                self.catalog
                    .find_series_of(brand, text)
                    .map(str::to_string),
            ),
            None => match self.catalog.find_series_any(text) {
                Some((brand, series)) => (Some(brand.to_string()), Some(series.to_string())),
                None => (None, None),
            },
        };

        ProductSpec {
            brand,
            series,
            ..Default::default()
        }
    }
}

static MODEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b([A-Z]{1,5}\d{2,}[A-Z0-9]*(?:-[A-Z0-9]+)*)\b").expect("static model pattern")
});

static PLUG_CONFIG_SHAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^L?\d{1,2}-\d{2}[PR]?$").expect("static config shape pattern")
});

/// Manufacturer model numbers such as `QO120` or `HOM2040M100PC`
pub struct ModelDetector;

impl FieldDetector for ModelDetector {
    fn id(&self) -> &str {
        "model"
    }

    fn detect(&self, text: &str) -> ProductSpec {
        let model = MODEL
            .captures_iter(text)
            .map(|c| c[1].to_string())
            .find(|m| !PLUG_CONFIG_SHAPE.is_match(m));

        ProductSpec {
            model,
            ..Default::default()
        }
    }
}
