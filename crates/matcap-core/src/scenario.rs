//! Named demand/supply scenarios.
//!
//! A scenario tag travels with the [`crate::Configuration`]. The solver
//! applies its [`ScenarioAdjustments`] to a private copy of the input before
//! planning, so `baseline` (the identity) plans the configuration exactly as
//! written.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    #[default]
    Baseline,
    HighDemand,
    LowDemand,
    SupplyConstrained,
    AcceleratedTransition,
}

/// Multipliers a scenario applies to the base configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScenarioAdjustments {
    /// Multiplies every zone's baseline peak load
    pub peak_load_multiplier: f64,
    /// Added to every zone's demand CAGR
    pub cagr_delta: f64,
    /// Multiplies every material's primary supply
    pub supply_multiplier: f64,
}

impl ScenarioAdjustments {
    pub const IDENTITY: ScenarioAdjustments = ScenarioAdjustments {
        peak_load_multiplier: 1.0,
        cagr_delta: 0.0,
        supply_multiplier: 1.0,
    };

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }
}

impl Scenario {
    pub const ALL: [Scenario; 5] = [
        Scenario::Baseline,
        Scenario::HighDemand,
        Scenario::LowDemand,
        Scenario::SupplyConstrained,
        Scenario::AcceleratedTransition,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Scenario::Baseline => "baseline",
            Scenario::HighDemand => "high_demand",
            Scenario::LowDemand => "low_demand",
            Scenario::SupplyConstrained => "supply_constrained",
            Scenario::AcceleratedTransition => "accelerated_transition",
        }
    }

    pub fn adjustments(&self) -> ScenarioAdjustments {
        match self {
            Scenario::Baseline => ScenarioAdjustments::IDENTITY,
            Scenario::HighDemand => ScenarioAdjustments {
                peak_load_multiplier: 1.15,
                cagr_delta: 0.010,
                supply_multiplier: 1.0,
            },
            Scenario::LowDemand => ScenarioAdjustments {
                peak_load_multiplier: 0.90,
                cagr_delta: -0.005,
                supply_multiplier: 1.0,
            },
            Scenario::SupplyConstrained => ScenarioAdjustments {
                peak_load_multiplier: 1.0,
                cagr_delta: 0.0,
                supply_multiplier: 0.60,
            },
            Scenario::AcceleratedTransition => ScenarioAdjustments {
                peak_load_multiplier: 1.05,
                cagr_delta: 0.005,
                supply_multiplier: 1.25,
            },
        }
    }

    /// Parse a comma separated list such as `baseline,high_demand`.
    pub fn parse_list(list: &str) -> Result<Vec<Scenario>, String> {
        list.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::parse)
            .collect()
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scenario {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().replace('-', "_");
        Scenario::ALL
            .iter()
            .copied()
            .find(|sc| sc.as_str().eq_ignore_ascii_case(&needle))
            .ok_or_else(|| {
                format!(
                    "unknown scenario '{}' (expected one of: {})",
                    s,
                    Scenario::ALL.map(|sc| sc.as_str()).join(", ")
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_baseline_is_identity() {
        assert!(Scenario::Baseline.adjustments().is_identity());
        assert!(!Scenario::HighDemand.adjustments().is_identity());
    }

    #[test]
    fn test_parse() {
        assert_eq!("high-demand".parse::<Scenario>().unwrap(), Scenario::HighDemand);
        assert_eq!(
            Scenario::parse_list("baseline, supply_constrained").unwrap(),
            vec![Scenario::Baseline, Scenario::SupplyConstrained]
        );
        let err = "doom".parse::<Scenario>().unwrap_err();
        assert!(err.contains("baseline"));
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&Scenario::AcceleratedTransition).unwrap();
        assert_eq!(json, "\"accelerated_transition\"");
    }
}
