//! Mutable solution-in-progress.
//!
//! The deployed units are the source of truth. Every per-year table
//! (planned/built/operational/retired capacity, material ledgers, production)
//! is derived from them, either incrementally by [`VariableState::commit`]
//! or wholesale by [`VariableState::rebuild`] after a rescale.

use matcap_core::tech::{DAYS_PER_SEASON, HOURS_PER_DAY, SEASONS};
use matcap_core::{
    ComponentId, Configuration, MaterialId, ProductId, RpsCategory, TechType, ZoneId,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Hourly values for the four representative days of a year.
pub type DayProfile = [[f64; HOURS_PER_DAY]; SEASONS];

/// Identifier of a deployed unit, unique within one solve
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitId(pub usize);

impl UnitId {
    pub fn new(id: usize) -> Self {
        UnitId(id)
    }

    pub fn value(&self) -> usize {
        self.0
    }
}

/// One committed deployment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeployedUnit {
    pub id: UnitId,
    pub zone: ZoneId,
    pub product: ProductId,
    pub tech: TechType,
    pub capacity_mw: f64,
    /// Year the investment decision (and material consumption) happens
    pub decision_year: usize,
    /// First operational year
    pub online_year: usize,
    /// First year the unit is no longer operational (decision + lifetime)
    pub end_year: usize,
}

impl DeployedUnit {
    pub fn is_operational(&self, year: usize) -> bool {
        year >= self.online_year && year < self.end_year
    }
}

/// Dispatch results for one zone in one year.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ZoneDispatch {
    pub demand_mw: DayProfile,
    /// Primary generation, including energy exported or sent to storage
    pub generation_mw: DayProfile,
    pub storage_charge_mw: DayProfile,
    pub storage_discharge_mw: DayProfile,
    pub state_of_charge_mwh: DayProfile,
    pub load_shed_mw: DayProfile,
    /// Annual energy by technology (MWh)
    pub generation_by_tech_mwh: BTreeMap<TechType, f64>,
}

/// Hourly flow over one interconnector; positive means `from` → `to`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferRecord {
    pub from: ZoneId,
    pub to: ZoneId,
    pub flow_mw: DayProfile,
}

/// Annual energy represented by an hourly profile (MWh).
pub fn profile_energy(profile: &DayProfile) -> f64 {
    profile.iter().flatten().sum::<f64>() * DAYS_PER_SEASON
}

impl ZoneDispatch {
    pub fn demand_mwh(&self) -> f64 {
        profile_energy(&self.demand_mw)
    }

    pub fn generation_mwh(&self) -> f64 {
        self.generation_by_tech_mwh.values().sum()
    }

    pub fn load_shed_mwh(&self) -> f64 {
        profile_energy(&self.load_shed_mw)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DispatchYear {
    pub zones: BTreeMap<ZoneId, ZoneDispatch>,
    pub transfers: Vec<TransferRecord>,
}

impl DispatchYear {
    pub fn load_shed_mwh(&self) -> f64 {
        self.zones.values().map(ZoneDispatch::load_shed_mwh).sum()
    }

    pub fn generation_mwh(&self) -> f64 {
        self.zones.values().map(ZoneDispatch::generation_mwh).sum()
    }

    /// Generation from technologies that count toward `category` (MWh).
    pub fn qualifying_generation_mwh(&self, category: RpsCategory) -> f64 {
        self.zones
            .values()
            .flat_map(|z| z.generation_by_tech_mwh.iter())
            .filter(|(tech, _)| tech.qualifies_for(category))
            .map(|(_, mwh)| mwh)
            .sum()
    }
}

/// The solution being constructed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VariableState {
    pub horizon: usize,
    pub units: Vec<DeployedUnit>,
    pub planned_mw: Vec<BTreeMap<UnitId, f64>>,
    pub built_mw: Vec<BTreeMap<UnitId, f64>>,
    pub operational_mw: Vec<BTreeMap<UnitId, f64>>,
    pub retired_mw: Vec<BTreeMap<UnitId, f64>>,
    /// Annual sector supply per material (tonnes/year)
    pub material_supply: BTreeMap<MaterialId, f64>,
    pub initial_stock: BTreeMap<MaterialId, f64>,
    pub material_utilization: BTreeMap<MaterialId, Vec<f64>>,
    /// Closing stock per year (tonnes)
    pub material_stock: BTreeMap<MaterialId, Vec<f64>>,
    /// Units of component manufactured per year
    pub component_production: BTreeMap<ComponentId, Vec<f64>>,
    /// MW of product manufactured per year
    pub product_production: BTreeMap<ProductId, Vec<f64>>,
    pub dispatch: Vec<DispatchYear>,
    pub reserve_violation_mw: Vec<BTreeMap<ZoneId, f64>>,
    pub rps_violation_mwh: Vec<BTreeMap<RpsCategory, f64>>,
    next_unit: usize,
}

/// A deployment about to be committed.
#[derive(Debug, Clone)]
pub struct Deployment {
    pub zone: ZoneId,
    pub product: ProductId,
    pub tech: TechType,
    pub capacity_mw: f64,
    pub decision_year: usize,
    pub online_year: usize,
    pub end_year: usize,
}

impl VariableState {
    /// Fresh state sized to the configuration's horizon.
    pub fn new(config: &Configuration) -> Self {
        let horizon = config.horizon();
        let zeros = || vec![0.0; horizon];
        let mut state = VariableState {
            horizon,
            planned_mw: vec![BTreeMap::new(); horizon],
            built_mw: vec![BTreeMap::new(); horizon],
            operational_mw: vec![BTreeMap::new(); horizon],
            retired_mw: vec![BTreeMap::new(); horizon],
            dispatch: vec![DispatchYear::default(); horizon],
            reserve_violation_mw: vec![BTreeMap::new(); horizon],
            rps_violation_mwh: vec![BTreeMap::new(); horizon],
            ..VariableState::default()
        };
        for material in &config.materials {
            state
                .material_supply
                .insert(material.id.clone(), material.sector_supply());
            state
                .initial_stock
                .insert(material.id.clone(), material.initial_stock_tonnes);
            state
                .material_utilization
                .insert(material.id.clone(), zeros());
            state
                .material_stock
                .insert(material.id.clone(), vec![material.initial_stock_tonnes; horizon]);
        }
        for component in &config.components {
            state.component_production.insert(component.id.clone(), zeros());
        }
        for product in &config.products {
            state.product_production.insert(product.id.clone(), zeros());
        }
        state
    }

    pub fn unit(&self, id: UnitId) -> Option<&DeployedUnit> {
        self.units.iter().find(|u| u.id == id)
    }

    /// Stock available at the start of `year`.
    pub fn opening_stock(&self, material: &MaterialId, year: usize) -> f64 {
        if year == 0 {
            return self.initial_stock.get(material).copied().unwrap_or(0.0);
        }
        self.material_stock
            .get(material)
            .and_then(|s| s.get(year - 1))
            .copied()
            .unwrap_or(0.0)
    }

    /// Tonnes of `material` that can still be consumed in `year` without
    /// overdrawing the stock in this or any later year.
    pub fn material_headroom(&self, material: &MaterialId, year: usize) -> f64 {
        let supply = self.material_supply.get(material).copied().unwrap_or(0.0);
        let used = self
            .material_utilization
            .get(material)
            .and_then(|u| u.get(year))
            .copied()
            .unwrap_or(0.0);
        let annual = (supply - used).max(0.0);
        let stock = self
            .material_stock
            .get(material)
            .map(|s| s[year.min(s.len())..].iter().copied().fold(f64::INFINITY, f64::min))
            .unwrap_or(0.0);
        let stock = if stock.is_finite() { stock.max(0.0) } else { 0.0 };
        annual + stock
    }

    /// Record a deployment: capacity tables, production and material use.
    pub fn commit(&mut self, deployment: Deployment, config: &Configuration) -> UnitId {
        let id = UnitId::new(self.next_unit);
        self.next_unit += 1;
        let unit = DeployedUnit {
            id,
            zone: deployment.zone,
            product: deployment.product,
            tech: deployment.tech,
            capacity_mw: deployment.capacity_mw,
            decision_year: deployment.decision_year,
            online_year: deployment.online_year,
            end_year: deployment.end_year,
        };
        self.record_unit(&unit, config);
        self.units.push(unit);
        self.refresh_stock();
        id
    }

    /// Recompute every derived table from the unit list.
    pub fn rebuild(&mut self, config: &Configuration) {
        for year in 0..self.horizon {
            self.planned_mw[year].clear();
            self.built_mw[year].clear();
            self.operational_mw[year].clear();
            self.retired_mw[year].clear();
        }
        for series in self
            .material_utilization
            .values_mut()
            .chain(self.component_production.values_mut())
            .chain(self.product_production.values_mut())
        {
            series.iter_mut().for_each(|v| *v = 0.0);
        }
        let units = std::mem::take(&mut self.units);
        for unit in &units {
            self.record_unit(unit, config);
        }
        self.units = units;
        self.refresh_stock();
    }

    fn record_unit(&mut self, unit: &DeployedUnit, config: &Configuration) {
        let d = unit.decision_year;
        let cap = unit.capacity_mw;
        if d < self.horizon {
            self.planned_mw[d].insert(unit.id, cap);
            self.built_mw[d].insert(unit.id, cap);
        }
        for year in unit.online_year..unit.end_year.min(self.horizon) {
            self.operational_mw[year].insert(unit.id, cap);
        }
        if unit.end_year < self.horizon {
            self.retired_mw[unit.end_year].insert(unit.id, cap);
        }
        if d >= self.horizon {
            return;
        }
        let Some(product) = config.product(&unit.product) else {
            return;
        };
        if let Some(series) = self.product_production.get_mut(&product.id) {
            series[d] += cap;
        }
        for (component_id, units_per_mw) in &product.components {
            if let Some(series) = self.component_production.get_mut(component_id) {
                series[d] += cap * units_per_mw;
            }
        }
        for (material_id, tonnes_per_mw) in product.materials_per_mw(&config.components) {
            if let Some(series) = self.material_utilization.get_mut(&material_id) {
                series[d] += cap * tonnes_per_mw;
            }
        }
    }

    /// Stock draws down only where utilization exceeds the sector supply.
    fn refresh_stock(&mut self) {
        for (material, utilization) in &self.material_utilization {
            let supply = self.material_supply.get(material).copied().unwrap_or(0.0);
            let mut stock = self.initial_stock.get(material).copied().unwrap_or(0.0);
            let closing = self
                .material_stock
                .entry(material.clone())
                .or_insert_with(|| vec![0.0; utilization.len()]);
            for (year, used) in utilization.iter().enumerate() {
                stock -= (used - supply).max(0.0);
                closing[year] = stock;
            }
        }
    }

    /// Operational capacity of new units in `zone` during `year`.
    pub fn operational_in_zone(&self, zone: &ZoneId, year: usize) -> f64 {
        self.units
            .iter()
            .filter(|u| &u.zone == zone && u.is_operational(year))
            .map(|u| u.capacity_mw)
            .sum()
    }

    /// Capacity of `product` decided in `year`.
    pub fn built_product_in_year(&self, product: &ProductId, year: usize) -> f64 {
        self.product_production
            .get(product)
            .and_then(|s| s.get(year))
            .copied()
            .unwrap_or(0.0)
    }

    /// Capacity of `product` deployed over the whole plan.
    pub fn built_product_total(&self, product: &ProductId) -> f64 {
        self.product_production
            .get(product)
            .map(|s| s.iter().sum())
            .unwrap_or(0.0)
    }

    /// Total deployed capacity for one zone.
    pub fn planned_capacity_in_zone(&self, zone: &ZoneId) -> f64 {
        self.units
            .iter()
            .filter(|u| &u.zone == zone)
            .map(|u| u.capacity_mw)
            .sum()
    }
}
