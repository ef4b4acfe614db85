//! Feasibility checking and proportional rescaling.
//!
//! Three constraint families are checked against a [`VariableState`]:
//!
//! ```text
//! material   util[m][y] ≤ sector_supply[m] + opening_stock[m][y]
//! land       Σ operational cap × km²/MW ≤ max_land_km2          (per zone, year)
//! lead time  online_year − decision_year ≥ lead_time_years      (per unit)
//! ```
//!
//! Rescaling only touches the units that caused a violation, so repeated
//! passes converge instead of shrinking the whole plan.

use crate::state::{UnitId, VariableState};
use matcap_core::units::Tonnes;
use matcap_core::{Configuration, MaterialId, ZoneId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    Material {
        material: MaterialId,
        year: usize,
        used_tonnes: f64,
        available_tonnes: f64,
    },
    Land {
        zone: ZoneId,
        year: usize,
        used_km2: f64,
        limit_km2: f64,
    },
    LeadTime {
        unit: UnitId,
        decision_year: usize,
        online_year: usize,
        lead_time_years: usize,
    },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::Material {
                material,
                year,
                used_tonnes,
                available_tonnes,
            } => write!(
                f,
                "material {material} year {year}: {} used, {} available",
                Tonnes(*used_tonnes),
                Tonnes(*available_tonnes)
            ),
            Violation::Land {
                zone,
                year,
                used_km2,
                limit_km2,
            } => write!(
                f,
                "zone {zone} year {year}: {used_km2:.2} km² used, limit {limit_km2:.2} km²"
            ),
            Violation::LeadTime {
                unit,
                decision_year,
                online_year,
                lead_time_years,
            } => write!(
                f,
                "unit {} online in year {online_year} but decided in year {decision_year} (lead time {lead_time_years})",
                unit.value()
            ),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeasibilityReport {
    pub violations: Vec<Violation>,
}

impl FeasibilityReport {
    pub fn is_feasible(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn material_violations(&self) -> impl Iterator<Item = &Violation> {
        self.violations
            .iter()
            .filter(|v| matches!(v, Violation::Material { .. }))
    }
}

fn exceeds(used: f64, limit: f64, tolerance: f64) -> bool {
    used > limit + tolerance * limit.abs().max(1.0)
}

/// Land occupied in `zone` during `year` by operational new units (km²).
pub fn land_used(config: &Configuration, state: &VariableState, zone: &ZoneId, year: usize) -> f64 {
    state
        .units
        .iter()
        .filter(|u| &u.zone == zone && u.is_operational(year))
        .map(|u| {
            let km2_per_mw = config
                .product(&u.product)
                .map_or(0.0, |p| p.land_use_km2_per_mw);
            u.capacity_mw * km2_per_mw
        })
        .sum()
}

/// Find every violated constraint in `state`.
pub fn check_feasibility(
    config: &Configuration,
    state: &VariableState,
    tolerance: f64,
) -> FeasibilityReport {
    let mut report = FeasibilityReport::default();

    for (material, utilization) in &state.material_utilization {
        let supply = state.material_supply.get(material).copied().unwrap_or(0.0);
        for (year, used) in utilization.iter().enumerate() {
            let available = supply + state.opening_stock(material, year).max(0.0);
            if exceeds(*used, available, tolerance) {
                report.violations.push(Violation::Material {
                    material: material.clone(),
                    year,
                    used_tonnes: *used,
                    available_tonnes: available,
                });
            }
        }
    }

    for zone in &config.zones {
        let Some(limit) = zone.max_land_km2 else {
            continue;
        };
        for year in 0..state.horizon {
            let used = land_used(config, state, &zone.id, year);
            if exceeds(used, limit, tolerance) {
                report.violations.push(Violation::Land {
                    zone: zone.id.clone(),
                    year,
                    used_km2: used,
                    limit_km2: limit,
                });
            }
        }
    }

    for unit in &state.units {
        let lead = config.product(&unit.product).map_or(0, |p| p.lead_time_years);
        if unit.online_year < unit.decision_year + lead {
            report.violations.push(Violation::LeadTime {
                unit: unit.id,
                decision_year: unit.decision_year,
                online_year: unit.online_year,
                lead_time_years: lead,
            });
        }
    }

    report
}

/// Scale factor per unit; units not implicated in any violation keep 1.0.
pub fn rescale_factors(
    config: &Configuration,
    state: &VariableState,
    report: &FeasibilityReport,
) -> BTreeMap<UnitId, f64> {
    let mut factors: BTreeMap<UnitId, f64> = state.units.iter().map(|u| (u.id, 1.0)).collect();
    let mut tighten = |id: UnitId, factor: f64| {
        if let Some(current) = factors.get_mut(&id) {
            *current = current.min(factor.clamp(0.0, 1.0));
        }
    };

    for violation in &report.violations {
        match violation {
            Violation::Material {
                material,
                year,
                used_tonnes,
                available_tonnes,
            } => {
                let factor = if *used_tonnes > 0.0 {
                    available_tonnes / used_tonnes
                } else {
                    1.0
                };
                for unit in state.units.iter().filter(|u| u.decision_year == *year) {
                    let uses = config
                        .product(&unit.product)
                        .and_then(|p| p.materials_per_mw(&config.components).get(material).copied())
                        .is_some_and(|tonnes| tonnes > 0.0);
                    if uses {
                        tighten(unit.id, factor);
                    }
                }
            }
            Violation::Land {
                zone,
                year,
                used_km2,
                limit_km2,
            } => {
                let factor = if *used_km2 > 0.0 {
                    limit_km2 / used_km2
                } else {
                    1.0
                };
                for unit in state
                    .units
                    .iter()
                    .filter(|u| &u.zone == zone && u.is_operational(*year))
                {
                    let land = config
                        .product(&unit.product)
                        .map_or(0.0, |p| p.land_use_km2_per_mw);
                    if land > 0.0 {
                        tighten(unit.id, factor);
                    }
                }
            }
            Violation::LeadTime { unit, .. } => tighten(*unit, 0.0),
        }
    }

    factors
}

/// Apply scale factors, drop units scaled to nothing and rebuild the
/// derived tables.
pub fn apply_rescale(
    config: &Configuration,
    state: &mut VariableState,
    factors: &BTreeMap<UnitId, f64>,
    tolerance: f64,
) {
    let mut changed = false;
    for unit in &mut state.units {
        let factor = factors.get(&unit.id).copied().unwrap_or(1.0);
        if factor < 1.0 {
            unit.capacity_mw *= factor;
            changed = true;
        }
    }
    if !changed {
        return;
    }
    state.units.retain(|u| u.capacity_mw > tolerance);
    state.rebuild(config);
}
