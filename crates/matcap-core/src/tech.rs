//! Technology types and the hourly shapes used by the dispatch pass.
//!
//! The technology set is closed: every place that awards reserve credit,
//! RPS credit or an availability factor matches on [`TechType`]
//! exhaustively, so adding a variant is a compile error until each of those
//! decisions is made for it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Representative days per year (one per season).
pub const SEASONS: usize = 4;
/// Hours in a representative day.
pub const HOURS_PER_DAY: usize = 24;
/// Calendar days each representative day stands for.
pub const DAYS_PER_SEASON: f64 = 365.0 / SEASONS as f64;
/// Hours in a planning year.
pub const HOURS_PER_YEAR: f64 = 8760.0;

const LOAD_SHAPE: [f64; HOURS_PER_DAY] = [
    0.62, 0.59, 0.57, 0.56, 0.57, 0.61, 0.69, 0.77, 0.82, 0.85, 0.87, 0.89, 0.90, 0.91, 0.92,
    0.94, 0.97, 0.99, 1.00, 0.98, 0.93, 0.85, 0.76, 0.68,
];

const SEASON_LOAD: [f64; SEASONS] = [0.92, 0.80, 1.00, 0.84];

const SOLAR_SHAPE: [f64; HOURS_PER_DAY] = [
    0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.05, 0.18, 0.35, 0.52, 0.66, 0.75, 0.78, 0.75, 0.66, 0.52,
    0.35, 0.18, 0.05, 0.0, 0.0, 0.0, 0.0, 0.0,
];

const SEASON_SOLAR: [f64; SEASONS] = [0.60, 0.95, 1.10, 0.80];
const SEASON_ONSHORE_WIND: [f64; SEASONS] = [0.42, 0.38, 0.25, 0.36];
const SEASON_OFFSHORE_WIND: [f64; SEASONS] = [0.55, 0.48, 0.35, 0.50];
const SEASON_HYDRO: [f64; SEASONS] = [0.45, 0.60, 0.50, 0.40];

/// Fraction of a zone's annual peak load drawn in `season` at `hour`.
///
/// The summer evening hour (season 2, hour 18) is exactly 1.0.
pub fn load_factor(season: usize, hour: usize) -> f64 {
    SEASON_LOAD[season % SEASONS] * LOAD_SHAPE[hour % HOURS_PER_DAY]
}

/// Deployable technology variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TechType {
    /// Solar photovoltaic
    Spv,
    /// Land-based (onshore) wind
    Lbw,
    /// Offshore wind
    Osw,
    /// Battery storage
    Bse,
    /// Natural gas combined cycle
    Ngcc,
    /// Natural gas combustion turbine
    Ngct,
    /// Nuclear
    Nuc,
    /// Hydro
    Hyd,
    Coal,
    /// Biomass
    Bio,
    Oil,
}

/// Regulatory categories an RPS target can be set for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RpsCategory {
    Renewable,
    Clean,
}

impl TechType {
    pub const ALL: [TechType; 11] = [
        TechType::Spv,
        TechType::Lbw,
        TechType::Osw,
        TechType::Bse,
        TechType::Ngcc,
        TechType::Ngct,
        TechType::Nuc,
        TechType::Hyd,
        TechType::Coal,
        TechType::Bio,
        TechType::Oil,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TechType::Spv => "spv",
            TechType::Lbw => "lbw",
            TechType::Osw => "osw",
            TechType::Bse => "bse",
            TechType::Ngcc => "ngcc",
            TechType::Ngct => "ngct",
            TechType::Nuc => "nuc",
            TechType::Hyd => "hyd",
            TechType::Coal => "coal",
            TechType::Bio => "bio",
            TechType::Oil => "oil",
        }
    }

    pub fn is_storage(&self) -> bool {
        matches!(self, TechType::Bse)
    }

    pub fn is_solar(&self) -> bool {
        matches!(self, TechType::Spv)
    }

    /// Whether generation from this technology counts toward `category`.
    pub fn qualifies_for(&self, category: RpsCategory) -> bool {
        let renewable = match self {
            TechType::Spv | TechType::Lbw | TechType::Osw | TechType::Hyd | TechType::Bio => true,
            TechType::Bse
            | TechType::Ngcc
            | TechType::Ngct
            | TechType::Nuc
            | TechType::Coal
            | TechType::Oil => false,
        };
        match category {
            RpsCategory::Renewable => renewable,
            RpsCategory::Clean => renewable || matches!(self, TechType::Nuc),
        }
    }

    /// Reserve credit for existing units, which carry no product record.
    pub fn default_elcc(&self) -> f64 {
        match self {
            TechType::Spv => 0.35,
            TechType::Lbw => 0.15,
            TechType::Osw => 0.25,
            TechType::Bse => 0.90,
            TechType::Ngcc | TechType::Ngct | TechType::Nuc => 0.95,
            TechType::Hyd => 0.75,
            TechType::Coal | TechType::Oil => 0.90,
            TechType::Bio => 0.85,
        }
    }

    /// Available fraction of nameplate in `season` at `hour`.
    ///
    /// Storage has no primary energy of its own and returns 0.
    pub fn availability(&self, season: usize, hour: usize) -> f64 {
        let s = season % SEASONS;
        let h = hour % HOURS_PER_DAY;
        match self {
            TechType::Spv => (SOLAR_SHAPE[h] * SEASON_SOLAR[s]).min(1.0),
            TechType::Lbw => {
                let night = !(7..20).contains(&h);
                SEASON_ONSHORE_WIND[s] * if night { 1.10 } else { 0.92 }
            }
            TechType::Osw => SEASON_OFFSHORE_WIND[s],
            TechType::Hyd => SEASON_HYDRO[s],
            TechType::Bse => 0.0,
            TechType::Nuc => 0.92,
            TechType::Coal => 0.85,
            TechType::Ngcc | TechType::Oil => 0.90,
            TechType::Ngct => 0.95,
            TechType::Bio => 0.80,
        }
    }

    /// Dispatch rank; lower is dispatched first.
    pub fn merit_order(&self) -> u8 {
        match self {
            TechType::Spv => 0,
            TechType::Lbw => 1,
            TechType::Osw => 2,
            TechType::Hyd => 3,
            TechType::Nuc => 4,
            TechType::Bio => 5,
            TechType::Coal => 6,
            TechType::Ngcc => 7,
            TechType::Ngct => 8,
            TechType::Oil => 9,
            TechType::Bse => 10,
        }
    }
}

impl fmt::Display for TechType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TechType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TechType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown technology type '{}'", s))
    }
}

impl fmt::Display for RpsCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RpsCategory::Renewable => f.write_str("renewable"),
            RpsCategory::Clean => f.write_str("clean"),
        }
    }
}
