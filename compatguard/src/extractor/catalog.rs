//! Brand catalog used by the extractor to recognize brands and series.

use regex::Regex;

use crate::rules::schema::BrandEntry;

#[derive(Debug, Clone)]
struct SeriesPattern {
    name: String,
    pattern: Regex,
}

#[derive(Debug, Clone)]
struct BrandPattern {
    name: String,
    pattern: Regex,
    series: Vec<SeriesPattern>,
}

/// Compiled brand/series vocabulary
#[derive(Debug, Clone, Default)]
pub struct BrandCatalog {
    brands: Vec<BrandPattern>,
}

/// Alternation of escaped, whitespace-tolerant phrases bounded by word edges
fn phrase_pattern(phrases: &[&str]) -> Option<Regex> {
    let alternatives: Vec<String> = phrases
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .map(|p| {
            p.split_whitespace()
                .map(regex::escape)
                .collect::<Vec<_>>()
                .join(r"\s+")
        })
        .collect();
    if alternatives.is_empty() {
        return None;
    }
    Regex::new(&format!(r"(?i)\b(?:{})\b", alternatives.join("|"))).ok()
}

/// Series token: word start, then either a word edge or a digit (`QO120`)
fn token_pattern(tokens: &[&str]) -> Option<Regex> {
    let alternatives: Vec<String> = tokens
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .map(regex::escape)
        .collect();
    if alternatives.is_empty() {
        return None;
    }
    Regex::new(&format!(r"(?i)\b(?:{})(?:\b|\d)", alternatives.join("|"))).ok()
}

impl BrandCatalog {
    pub fn from_entries(entries: &[BrandEntry]) -> Self {
        let mut brands = Vec::new();
        for entry in entries {
            let mut names: Vec<&str> = vec![entry.name.as_str()];
            names.extend(entry.aliases.iter().map(String::as_str));
            let Some(pattern) = phrase_pattern(&names) else {
                tracing::warn!("Skipping brand with no usable name: {:?}", entry.name);
                continue;
            };

            let series = entry
                .series
                .iter()
                .filter_map(|s| {
                    let tokens: Vec<&str> = if s.tokens.is_empty() {
                        vec![s.name.as_str()]
                    } else {
                        s.tokens.iter().map(String::as_str).collect()
                    };
                    token_pattern(&tokens).map(|pattern| SeriesPattern {
                        name: s.name.clone(),
                        pattern,
                    })
                })
                .collect();

            brands.push(BrandPattern {
                name: entry.name.clone(),
                pattern,
                series,
            });
        }
        Self { brands }
    }

    pub fn len(&self) -> usize {
        self.brands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.brands.is_empty()
    }

    pub fn brand_names(&self) -> impl Iterator<Item = &str> {
        self.brands.iter().map(|b| b.name.as_str())
    }

    /// First catalog brand named in the text, by earliest position
    pub fn find_brand(&self, text: &str) -> Option<&str> {
        self.brands
            .iter()
            .filter_map(|b| b.pattern.find(text).map(|m| (m.start(), b.name.as_str())))
            .min_by_key(|(pos, _)| *pos)
            .map(|(_, name)| name)
    }

    /// Series of `brand` named in the text
    pub fn find_series_of(&self, brand: &str, text: &str) -> Option<&str> {
        let entry = self
            .brands
            .iter()
            .find(|b| b.name.eq_ignore_ascii_case(brand))?;
        entry
            .series
            .iter()
            .filter_map(|s| s.pattern.find(text).map(|m| (m.start(), s.name.as_str())))
            .min_by_key(|(pos, _)| *pos)
            .map(|(_, name)| name)
    }

    /// Series named in the text together with its brand, if the earliest
    /// matching token belongs to exactly one brand
    pub fn find_series_any(&self, text: &str) -> Option<(&str, &str)> {
        let mut hits: Vec<(usize, &str, &str)> = Vec::new();
        for brand in &self.brands {
            for series in &brand.series {
                if let Some(m) = series.pattern.find(text) {
                    hits.push((m.start(), brand.name.as_str(), series.name.as_str()));
                }
            }
        }
        let earliest = hits.iter().map(|(pos, _, _)| *pos).min()?;
        let at_earliest: Vec<_> = hits.iter().filter(|(pos, _, _)| *pos == earliest).collect();
        let first_brand = at_earliest[0].1;
        if at_earliest.iter().all(|(_, b, _)| *b == first_brand) {
            Some((first_brand, at_earliest[0].2))
        } else {
            tracing::debug!("Series token at {} is shared by several brands", earliest);
            None
        }
    }
}
