//! Report Renderer
//!
//! Pure formatting of a [`Verdict`] into a [`ReportView`] for the terminal or
//! JSON output. The view's `result` is always the verdict's result.

use serde::Serialize;
use std::fmt::Write as _;

use crate::evaluator::{SuggestedLink, Verdict, VerdictResult};

/// Visual emphasis of a report headline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Success,
    Danger,
    Caution,
}

impl Tone {
    /// Marker used in plain-text output
    pub fn symbol(&self) -> &'static str {
        match self {
            Tone::Success => "✓",
            Tone::Danger => "✗",
            Tone::Caution => "?",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportView {
    pub result: VerdictResult,
    pub label: String,
    pub tone: Tone,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headline: Option<String>,
    pub reasons: Vec<String>,
    pub suggested_links: Vec<SuggestedLink>,
    pub cited_rules: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disclaimer: Option<String>,
}

fn label_and_tone(result: VerdictResult) -> (&'static str, Tone) {
    match result {
        VerdictResult::Compatible => ("COMPATIBLE", Tone::Success),
        VerdictResult::Incompatible => ("INCOMPATIBLE", Tone::Danger),
        VerdictResult::Undetermined => ("UNDETERMINED: consult documentation", Tone::Caution),
    }
}

/// Build the view for a verdict
pub fn render(verdict: &Verdict) -> ReportView {
    let (label, tone) = label_and_tone(verdict.result);
    ReportView {
        result: verdict.result,
        label: label.to_string(),
        tone,
        headline: None,
        reasons: verdict.reasons.clone(),
        suggested_links: verdict.suggested_links.clone(),
        cited_rules: verdict.cited_rules.clone(),
        disclaimer: None,
    }
}

impl ReportView {
    pub fn with_disclaimer(mut self, disclaimer: Option<&str>) -> Self {
        self.disclaimer = disclaimer.map(str::to_string);
        self
    }

    /// One-line summary of what was compared, e.g. `Square D QO breaker (20A) ↔ ...`
    pub fn with_headline(mut self, headline: impl Into<String>) -> Self {
        self.headline = Some(headline.into());
        self
    }

    /// Plain-text rendering for terminals
    pub fn to_human(&self) -> String {
        let mut out = String::new();
        if let Some(ref headline) = self.headline {
            let _ = writeln!(out, "{}", headline);
            let _ = writeln!(out);
        }
        let _ = writeln!(out, "{} {}", self.tone.symbol(), self.label);

        if !self.reasons.is_empty() {
            let _ = writeln!(out);
            for reason in &self.reasons {
                let _ = writeln!(out, "  • {}", reason);
            }
        }

        if !self.cited_rules.is_empty() {
            let _ = writeln!(out);
            let _ = writeln!(out, "Rules applied: {}", self.cited_rules.join(", "));
        }

        if !self.suggested_links.is_empty() {
            let _ = writeln!(out);
            for link in &self.suggested_links {
                let _ = writeln!(out, "  → {}: {}", link.label, link.url);
            }
        }

        if let Some(ref disclaimer) = self.disclaimer {
            let _ = writeln!(out);
            let _ = writeln!(out, "{}", disclaimer);
        }
        out
    }
}
