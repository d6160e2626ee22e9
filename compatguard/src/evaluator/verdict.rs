//! Verdict types
//!
//! The result of evaluating one product pair: a three-way result, the
//! reasons behind it, the rules it cites and shop links for follow-up.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictResult {
    Compatible,
    Incompatible,
    Undetermined,
}

impl VerdictResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerdictResult::Compatible => "compatible",
            VerdictResult::Incompatible => "incompatible",
            VerdictResult::Undetermined => "undetermined",
        }
    }
}

impl fmt::Display for VerdictResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestedLink {
    pub label: String,
    pub url: String,
}

/// Outcome of evaluating one product pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub result: VerdictResult,
    pub reasons: Vec<String>,
    pub suggested_links: Vec<SuggestedLink>,
    /// Ids of the rules the result is based on
    #[serde(default)]
    pub cited_rules: Vec<String>,
}

impl Verdict {
    pub fn undetermined(reasons: Vec<String>) -> Self {
        Self {
            result: VerdictResult::Undetermined,
            reasons,
            suggested_links: Vec::new(),
            cited_rules: Vec::new(),
        }
    }

    /// True for compatible or incompatible
    pub fn is_confident(&self) -> bool {
        self.result != VerdictResult::Undetermined
    }
}
