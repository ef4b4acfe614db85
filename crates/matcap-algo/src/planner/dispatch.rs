//! Representative-day merit-order dispatch.
//!
//! Each planning year is simulated as four 24-hour days, one per season,
//! each weighted by [`DAYS_PER_SEASON`]. Within an hour every zone first
//! serves its own load in merit order and from storage, then interconnectors
//! move spare generation to zones still short (in input order), then any
//! remaining spare generation charges storage. Whatever is left unserved is
//! load shed.

use crate::state::{DispatchYear, TransferRecord, VariableState, ZoneDispatch};
use matcap_core::tech::{load_factor, DAYS_PER_SEASON, HOURS_PER_DAY, SEASONS};
use matcap_core::{Configuration, TechType, Zone, ZoneId};
use std::collections::BTreeMap;

/// Energy-to-power ratio assumed for existing storage units
const EXISTING_STORAGE_HOURS: f64 = 4.0;
const EXISTING_STORAGE_EFFICIENCY: f64 = 0.85;

const EPS: f64 = 1e-9;

/// Resources available to one zone in one year.
#[derive(Debug, Clone, Default)]
struct ZoneFleet {
    /// Nameplate MW by technology, sorted by merit order
    generation: Vec<(TechType, f64)>,
    storage_power_mw: f64,
    storage_energy_mwh: f64,
    round_trip_efficiency: f64,
}

impl ZoneFleet {
    fn build(config: &Configuration, state: &VariableState, zone: &Zone, year: usize) -> Self {
        let calendar_year = config.parameters.calendar_year(year);
        let mut generation: BTreeMap<TechType, f64> = BTreeMap::new();
        let mut fleet = ZoneFleet::default();
        let mut weighted_efficiency = 0.0;

        let mut add_storage = |power: f64, hours: f64, efficiency: f64, fleet: &mut ZoneFleet| {
            let energy = power * hours;
            fleet.storage_power_mw += power;
            fleet.storage_energy_mwh += energy;
            weighted_efficiency += energy * efficiency;
        };

        for unit in zone.existing_units.iter().filter(|u| u.in_service(calendar_year)) {
            if unit.tech.is_storage() {
                add_storage(
                    unit.capacity_mw,
                    EXISTING_STORAGE_HOURS,
                    EXISTING_STORAGE_EFFICIENCY,
                    &mut fleet,
                );
            } else {
                *generation.entry(unit.tech).or_insert(0.0) += unit.capacity_mw;
            }
        }

        for unit in state
            .units
            .iter()
            .filter(|u| u.zone == zone.id && u.is_operational(year))
        {
            if unit.tech.is_storage() {
                let (hours, efficiency) = config
                    .product(&unit.product)
                    .map(|p| (p.storage_hours, p.round_trip_efficiency))
                    .unwrap_or((EXISTING_STORAGE_HOURS, EXISTING_STORAGE_EFFICIENCY));
                add_storage(unit.capacity_mw, hours, efficiency, &mut fleet);
            } else {
                *generation.entry(unit.tech).or_insert(0.0) += unit.capacity_mw;
            }
        }

        fleet.round_trip_efficiency = if fleet.storage_energy_mwh > 0.0 {
            weighted_efficiency / fleet.storage_energy_mwh
        } else {
            0.0
        };
        fleet.generation = generation.into_iter().collect();
        fleet.generation.sort_by_key(|(tech, _)| tech.merit_order());
        fleet
    }
}

fn record_generation(result: &mut ZoneDispatch, tech: TechType, mw: f64, season: usize, hour: usize) {
    if mw <= 0.0 {
        return;
    }
    result.generation_mw[season][hour] += mw;
    *result.generation_by_tech_mwh.entry(tech).or_insert(0.0) += mw * DAYS_PER_SEASON;
}

/// Take up to `amount` MW from spare generation, cheapest first.
fn draw_spare(
    spare: &mut [(TechType, f64)],
    amount: f64,
    result: &mut ZoneDispatch,
    season: usize,
    hour: usize,
) -> f64 {
    let mut taken = 0.0;
    for (tech, available) in spare.iter_mut() {
        if taken >= amount {
            break;
        }
        let used = available.min(amount - taken);
        if used > 0.0 {
            *available -= used;
            taken += used;
            record_generation(result, *tech, used, season, hour);
        }
    }
    taken
}

fn spare_total(spare: &[(TechType, f64)]) -> f64 {
    spare.iter().map(|(_, mw)| mw).sum()
}

/// Dispatch every zone for planning year `year`.
pub fn dispatch_year(config: &Configuration, state: &VariableState, year: usize) -> DispatchYear {
    let fleets: Vec<ZoneFleet> = config
        .zones
        .iter()
        .map(|zone| ZoneFleet::build(config, state, zone, year))
        .collect();
    let peaks: Vec<f64> = config.zones.iter().map(|z| z.peak_load(year)).collect();
    let index: BTreeMap<&ZoneId, usize> = config
        .zones
        .iter()
        .enumerate()
        .map(|(i, z)| (&z.id, i))
        .collect();

    let n = config.zones.len();
    let mut results = vec![ZoneDispatch::default(); n];
    let mut transfers: Vec<TransferRecord> = config
        .interconnectors
        .iter()
        .map(|link| TransferRecord {
            from: link.from.clone(),
            to: link.to.clone(),
            flow_mw: Default::default(),
        })
        .collect();

    for season in 0..SEASONS {
        // Each representative day starts half full
        let mut soc: Vec<f64> = fleets.iter().map(|f| 0.5 * f.storage_energy_mwh).collect();

        for hour in 0..HOURS_PER_DAY {
            let mut deficit = vec![0.0; n];
            let mut spare: Vec<Vec<(TechType, f64)>> = Vec::with_capacity(n);

            for z in 0..n {
                let fleet = &fleets[z];
                let result = &mut results[z];
                let demand = peaks[z] * load_factor(season, hour);
                result.demand_mw[season][hour] = demand;

                let mut remaining = demand;
                let mut left = Vec::with_capacity(fleet.generation.len());
                for (tech, capacity) in &fleet.generation {
                    let available = capacity * tech.availability(season, hour);
                    let used = available.min(remaining);
                    remaining -= used;
                    record_generation(result, *tech, used, season, hour);
                    left.push((*tech, available - used));
                }

                let discharge = remaining.min(fleet.storage_power_mw).min(soc[z]).max(0.0);
                soc[z] -= discharge;
                remaining -= discharge;
                result.storage_discharge_mw[season][hour] = discharge;

                deficit[z] = remaining.max(0.0);
                spare.push(left);
            }

            for (k, link) in config.interconnectors.iter().enumerate() {
                let (Some(&a), Some(&b)) = (index.get(&link.from), index.get(&link.to)) else {
                    continue;
                };
                if a == b {
                    continue;
                }
                let flow = if deficit[b] > EPS && spare_total(&spare[a]) > EPS {
                    let want = deficit[b].min(link.capacity_mw);
                    let sent = draw_spare(&mut spare[a], want, &mut results[a], season, hour);
                    deficit[b] -= sent;
                    sent
                } else if deficit[a] > EPS && spare_total(&spare[b]) > EPS {
                    let want = deficit[a].min(link.capacity_mw);
                    let sent = draw_spare(&mut spare[b], want, &mut results[b], season, hour);
                    deficit[a] -= sent;
                    -sent
                } else {
                    0.0
                };
                transfers[k].flow_mw[season][hour] = flow;
            }

            for z in 0..n {
                let fleet = &fleets[z];
                let result = &mut results[z];
                if fleet.round_trip_efficiency > 0.0 && deficit[z] <= EPS {
                    let room = (fleet.storage_energy_mwh - soc[z]) / fleet.round_trip_efficiency;
                    let limit = fleet.storage_power_mw.min(room.max(0.0));
                    let charge = draw_spare(&mut spare[z], limit, result, season, hour);
                    soc[z] += charge * fleet.round_trip_efficiency;
                    result.storage_charge_mw[season][hour] = charge;
                }
                result.state_of_charge_mwh[season][hour] = soc[z];
                result.load_shed_mw[season][hour] = deficit[z];
            }
        }
    }

    DispatchYear {
        zones: config
            .zones
            .iter()
            .map(|z| z.id.clone())
            .zip(results)
            .collect(),
        transfers,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use matcap_core::{ConfigurationBuilder, ExistingUnit, Interconnector, SystemParameters};

    fn params() -> SystemParameters {
        SystemParameters {
            horizon_years: 1,
            ..SystemParameters::default()
        }
    }

    #[test]
    fn test_firm_fleet_serves_all_load() {
        let config = ConfigurationBuilder::new(params())
            .zone(Zone::new("a", "A", 100.0).with_unit(ExistingUnit::new(TechType::Ngct, 200.0)))
            .build()
            .unwrap();
        let state = VariableState::new(&config);
        let year = dispatch_year(&config, &state, 0);

        let zone = &year.zones[&ZoneId::from("a")];
        assert_eq!(zone.load_shed_mwh(), 0.0);
        assert!((zone.generation_mwh() - zone.demand_mwh()).abs() < 1e-6);
        assert_eq!(zone.demand_mw[2][18], 100.0);
    }

    #[test]
    fn test_shortfall_is_shed() {
        let config = ConfigurationBuilder::new(params())
            .zone(Zone::new("a", "A", 100.0).with_unit(ExistingUnit::new(TechType::Ngct, 50.0)))
            .build()
            .unwrap();
        let state = VariableState::new(&config);
        let year = dispatch_year(&config, &state, 0);

        let zone = &year.zones[&ZoneId::from("a")];
        // Summer peak: 100 MW demand against 47.5 MW available
        assert!((zone.load_shed_mw[2][18] - 52.5).abs() < 1e-9);
        assert!(year.load_shed_mwh() > 0.0);
    }

    #[test]
    fn test_interconnector_covers_neighbour() {
        let config = ConfigurationBuilder::new(params())
            .zone(Zone::new("a", "A", 100.0).with_unit(ExistingUnit::new(TechType::Ngct, 300.0)))
            .zone(Zone::new("b", "B", 100.0).with_unit(ExistingUnit::new(TechType::Ngct, 50.0)))
            .interconnector(Interconnector::new("a", "b", 100.0))
            .build()
            .unwrap();
        let state = VariableState::new(&config);
        let year = dispatch_year(&config, &state, 0);

        assert_eq!(year.load_shed_mwh(), 0.0);
        assert!((year.transfers[0].flow_mw[2][18] - 52.5).abs() < 1e-9);
    }

    #[test]
    fn test_storage_shifts_energy() {
        let config = ConfigurationBuilder::new(params())
            .zone(
                Zone::new("a", "A", 100.0)
                    .with_unit(ExistingUnit::new(TechType::Ngct, 100.0))
                    .with_unit(ExistingUnit::new(TechType::Bse, 20.0)),
            )
            .build()
            .unwrap();
        let state = VariableState::new(&config);
        let year = dispatch_year(&config, &state, 0);

        let zone = &year.zones[&ZoneId::from("a")];
        // 95 MW available at the 100 MW summer peak; storage covers the rest
        assert!((zone.storage_discharge_mw[2][18] - 5.0).abs() < 1e-9);
        assert_eq!(zone.load_shed_mw[2][18], 0.0);
        let charged: f64 = zone.storage_charge_mw.iter().flatten().sum();
        assert!(charged > 0.0);
        for soc in zone.state_of_charge_mwh.iter().flatten() {
            assert!(*soc >= -1e-9 && *soc <= 80.0 + 1e-9);
        }
    }
}
