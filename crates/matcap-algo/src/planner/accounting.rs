//! Reliability violations, costs and metrics derived from a finished plan.

use super::feasibility::land_used;
use super::solution::{CostBreakdown, Metrics};
use crate::state::{DispatchYear, VariableState};
use matcap_core::tech::HOURS_PER_YEAR;
use matcap_core::{Configuration, RpsCategory, TechType, Zone, ZoneId};
use std::collections::BTreeMap;

/// Capacity required in `zone` during `year` (MW).
pub fn required_capacity(config: &Configuration, zone: &Zone, year: usize) -> f64 {
    zone.peak_load(year) * (1.0 + config.parameters.reserve_margin)
}

/// Nameplate capacity available in `zone` during `year` (MW).
pub fn available_capacity(
    config: &Configuration,
    state: &VariableState,
    zone: &Zone,
    year: usize,
) -> f64 {
    zone.existing_capacity(config.parameters.calendar_year(year))
        + state.operational_in_zone(&zone.id, year)
}

/// ELCC-weighted capacity credited toward the reserve margin (MW).
pub fn credited_capacity(
    config: &Configuration,
    state: &VariableState,
    zone: &Zone,
    year: usize,
) -> f64 {
    let calendar_year = config.parameters.calendar_year(year);
    let existing: f64 = zone
        .existing_units
        .iter()
        .filter(|u| u.in_service(calendar_year))
        .map(|u| u.capacity_mw * u.tech.default_elcc())
        .sum();
    let new: f64 = state
        .units
        .iter()
        .filter(|u| u.zone == zone.id && u.is_operational(year))
        .map(|u| {
            let elcc = config
                .product(&u.product)
                .map_or_else(|| u.tech.default_elcc(), |p| p.elcc);
            u.capacity_mw * elcc
        })
        .sum();
    existing + new
}

pub fn reserve_violations(
    config: &Configuration,
    state: &VariableState,
    year: usize,
) -> BTreeMap<ZoneId, f64> {
    config
        .zones
        .iter()
        .map(|zone| {
            let shortfall = required_capacity(config, zone, year)
                - credited_capacity(config, state, zone, year);
            (zone.id.clone(), shortfall.max(0.0))
        })
        .collect()
}

/// Shortfall of qualifying generation per RPS category (MWh).
pub fn rps_violations(config: &Configuration, dispatch: &DispatchYear) -> BTreeMap<RpsCategory, f64> {
    let generation = dispatch.generation_mwh();
    config
        .parameters
        .rps_targets
        .iter()
        .map(|(category, target)| {
            let qualifying = dispatch.qualifying_generation_mwh(*category);
            (*category, (target * generation - qualifying).max(0.0))
        })
        .collect()
}

pub fn compute_costs(config: &Configuration, state: &VariableState) -> CostBreakdown {
    let horizon = state.horizon;
    let params = &config.parameters;
    let mut costs = CostBreakdown {
        investment: vec![0.0; horizon],
        operational: vec![0.0; horizon],
        penalty: vec![0.0; horizon],
        total: 0.0,
    };

    for unit in &state.units {
        let Some(product) = config.product(&unit.product) else {
            continue;
        };
        if unit.decision_year < horizon {
            costs.investment[unit.decision_year] += unit.capacity_mw * product.capital_cost_per_mw;
        }
        let annual_om =
            product.fixed_om_per_mw_year + product.variable_om_per_mwh * HOURS_PER_YEAR;
        for year in unit.online_year..unit.end_year.min(horizon) {
            costs.operational[year] += unit.capacity_mw * annual_om;
        }
    }

    for year in 0..horizon {
        let shed = state.dispatch.get(year).map_or(0.0, DispatchYear::load_shed_mwh);
        let reserve: f64 = state.reserve_violation_mw[year].values().sum();
        let rps: f64 = state.rps_violation_mwh[year].values().sum();
        costs.penalty[year] = shed * params.voll_per_mwh
            + reserve * params.reserve_shortfall_penalty_per_mw
            + rps * params.rps_shortfall_penalty_per_mwh;
    }

    costs.total = costs.total_investment() + costs.total_operational() + costs.total_penalty();
    costs
}

fn percent(used: f64, capacity: f64) -> f64 {
    if capacity > 1e-9 {
        used / capacity * 100.0
    } else if used > 1e-9 {
        100.0
    } else {
        0.0
    }
}

pub fn compute_metrics(config: &Configuration, state: &VariableState) -> Metrics {
    let horizon = state.horizon;
    let mut metrics = Metrics::default();

    for year in 0..horizon {
        let calendar_year = config.parameters.calendar_year(year);
        let mut mix: BTreeMap<TechType, f64> = BTreeMap::new();
        for zone in &config.zones {
            for unit in zone.existing_units.iter().filter(|u| u.in_service(calendar_year)) {
                *mix.entry(unit.tech).or_insert(0.0) += unit.capacity_mw;
            }
        }
        for unit in state.units.iter().filter(|u| u.is_operational(year)) {
            *mix.entry(unit.tech).or_insert(0.0) += unit.capacity_mw;
        }
        metrics.capacity_by_year.push(mix);

        let satisfaction = config
            .zones
            .iter()
            .map(|zone| {
                let required = required_capacity(config, zone, year);
                percent(credited_capacity(config, state, zone, year), required).min(100.0)
            })
            .fold(100.0_f64, f64::min);
        metrics.reserve_margin_satisfaction.push(satisfaction);

        let dispatch = state.dispatch.get(year);
        let generation = dispatch.map_or(0.0, DispatchYear::generation_mwh);
        let compliance = config
            .parameters
            .rps_targets
            .iter()
            .map(|(category, target)| {
                if *target <= 0.0 {
                    return 100.0;
                }
                let qualifying = dispatch.map_or(0.0, |d| d.qualifying_generation_mwh(*category));
                let share = if generation > 0.0 { qualifying / generation } else { 0.0 };
                (share / target * 100.0).min(100.0)
            })
            .fold(100.0_f64, f64::min);
        metrics.rps_compliance.push(compliance);

        metrics
            .load_shed_mwh
            .push(dispatch.map_or(0.0, DispatchYear::load_shed_mwh));
    }

    for (material, utilization) in &state.material_utilization {
        let supply = state.material_supply.get(material).copied().unwrap_or(0.0);
        let rates = utilization.iter().map(|used| percent(*used, supply)).collect();
        metrics.material_utilization_rate.insert(material.clone(), rates);
    }

    for zone in &config.zones {
        let Some(limit) = zone.max_land_km2 else {
            continue;
        };
        let rates = (0..horizon)
            .map(|year| percent(land_used(config, state, &zone.id, year), limit))
            .collect();
        metrics.land_utilization_rate.insert(zone.id.clone(), rates);
    }

    metrics
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::dispatch::dispatch_year;
    use crate::state::Deployment;
    use matcap_core::{
        ConfigurationBuilder, ExistingUnit, Material, Product, ProductId, SystemParameters,
    };

    fn config() -> Configuration {
        let mut params = SystemParameters {
            horizon_years: 2,
            ..SystemParameters::default()
        };
        params.rps_targets.insert(RpsCategory::Renewable, 0.5);
        ConfigurationBuilder::new(params)
            .material(Material::new("steel", "Steel", 1000.0, 0.5))
            .product(
                Product::new("spv", "Solar", TechType::Spv, 1_000_000.0, 30, 0.35)
                    .with_om(20_000.0, 1.0)
                    .with_land_use(0.01),
            )
            .zone(
                Zone::new("z", "Z", 100.0)
                    .with_unit(ExistingUnit::new(TechType::Ngcc, 120.0))
                    .with_land_limit(4.0),
            )
            .build()
            .unwrap()
    }

    fn with_solar(config: &Configuration) -> VariableState {
        let mut state = VariableState::new(config);
        state.commit(
            Deployment {
                zone: ZoneId::from("z"),
                product: ProductId::from("spv"),
                tech: TechType::Spv,
                capacity_mw: 100.0,
                decision_year: 1,
                online_year: 1,
                end_year: 31,
            },
            config,
        );
        for year in 0..state.horizon {
            state.dispatch[year] = dispatch_year(config, &state, year);
            state.reserve_violation_mw[year] = reserve_violations(config, &state, year);
            state.rps_violation_mwh[year] = rps_violations(config, &state.dispatch[year]);
        }
        state
    }

    #[test]
    fn test_reserve_violation_uses_elcc() {
        let config = config();
        let state = with_solar(&config);
        let zone = &config.zones[0];
        // Required 115 MW; ngcc credits 114 MW, solar adds 35 MW from year 1
        assert!((reserve_violations(&config, &state, 0)[&zone.id] - 1.0).abs() < 1e-9);
        assert_eq!(reserve_violations(&config, &state, 1)[&zone.id], 0.0);
    }

    #[test]
    fn test_costs_by_year() {
        let config = config();
        let state = with_solar(&config);
        let costs = compute_costs(&config, &state);

        assert_eq!(costs.investment, vec![0.0, 100_000_000.0]);
        assert!((costs.operational[1] - 100.0 * (20_000.0 + 8760.0)).abs() < 1e-6);
        assert_eq!(costs.operational[0], 0.0);
        // Year 0 pays the reserve shortfall and the whole RPS target
        assert!(costs.penalty[0] >= 100_000.0);
        assert!(
            (costs.total - costs.total_investment() - costs.total_operational() - costs.total_penalty())
                .abs()
                < 1e-6
        );
    }

    #[test]
    fn test_metrics() {
        let config = config();
        let state = with_solar(&config);
        let metrics = compute_metrics(&config, &state);

        assert_eq!(metrics.capacity_by_year[0][&TechType::Ngcc], 120.0);
        assert!(!metrics.capacity_by_year[0].contains_key(&TechType::Spv));
        assert_eq!(metrics.capacity_by_year[1][&TechType::Spv], 100.0);
        assert!((metrics.reserve_margin_satisfaction[0] - 114.0 / 115.0 * 100.0).abs() < 1e-9);
        assert_eq!(metrics.reserve_margin_satisfaction[1], 100.0);
        assert_eq!(metrics.rps_compliance[0], 0.0);
        assert!(metrics.rps_compliance[1] > 0.0);
        assert_eq!(metrics.land_utilization_rate[&ZoneId::from("z")], vec![0.0, 25.0]);
        assert_eq!(metrics.load_shed_mwh, vec![0.0, 0.0]);
    }
}
