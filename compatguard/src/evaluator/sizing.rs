//! EV charger circuit sizing (continuous-load rule).

use serde::{Deserialize, Serialize};

use crate::product::format_amps;

/// Continuous loads need circuit capacity of 125% of the load
pub const CONTINUOUS_LOAD_FACTOR: f64 = 1.25;

/// Common residential breaker ratings, ascending
pub const STANDARD_BREAKER_SIZES: [u32; 12] = [15, 20, 30, 40, 50, 60, 70, 80, 90, 100, 125, 150];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvCircuitSizing {
    pub charger_amps: f64,
    pub min_circuit_amps: f64,
    /// Smallest standard breaker at or above the minimum, if any
    pub recommended_breaker: Option<u32>,
}

impl EvCircuitSizing {
    pub fn summary(&self) -> String {
        let base = format!(
            "A {} EV charger needs a circuit of at least {} ({} × {})",
            format_amps(self.charger_amps),
            format_amps(self.min_circuit_amps),
            format_amps(self.charger_amps),
            CONTINUOUS_LOAD_FACTOR
        );
        match self.recommended_breaker {
            Some(size) => format!("{}; nearest standard breaker: {}A.", base, size),
            None => format!("{}; no standard residential breaker is large enough.", base),
        }
    }
}

/// Minimum circuit and recommended breaker for a charger's continuous output
pub fn size_ev_circuit(charger_amps: f64) -> EvCircuitSizing {
    let min_circuit_amps = charger_amps * CONTINUOUS_LOAD_FACTOR;
    let recommended_breaker = STANDARD_BREAKER_SIZES
        .iter()
        .copied()
        .find(|size| f64::from(*size) >= min_circuit_amps);
    EvCircuitSizing {
        charger_amps,
        min_circuit_amps,
        recommended_breaker,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factor_is_exact() {
        let sizing = size_ev_circuit(48.0);
        assert_eq!(sizing.min_circuit_amps, 60.0);
        assert_eq!(sizing.recommended_breaker, Some(60));
    }

    #[test]
    fn test_rounds_up_to_next_standard_size() {
        assert_eq!(size_ev_circuit(32.0).recommended_breaker, Some(40));
        assert_eq!(size_ev_circuit(40.0).recommended_breaker, Some(50));
        assert_eq!(size_ev_circuit(33.0).min_circuit_amps, 41.25);
        assert_eq!(size_ev_circuit(33.0).recommended_breaker, Some(50));
        assert_eq!(size_ev_circuit(16.0).recommended_breaker, Some(20));
    }

    #[test]
    fn test_oversized_charger_has_no_recommendation() {
        assert_eq!(size_ev_circuit(200.0).recommended_breaker, None);
        assert!(size_ev_circuit(200.0).summary().contains("no standard"));
    }

    #[test]
    fn test_summary() {
        assert_eq!(
            size_ev_circuit(48.0).summary(),
            "A 48A EV charger needs a circuit of at least 60A (48A × 1.25); nearest standard breaker: 60A."
        );
    }
}
