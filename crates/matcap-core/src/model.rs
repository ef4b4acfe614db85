//! Planning entities: materials, components, products, zones and the
//! system-wide parameters.
//!
//! These are plain data. Referential integrity is checked on the aggregate
//! [`crate::Configuration`], which owns the entity tables.

use crate::tech::{RpsCategory, TechType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            #[inline]
            pub fn new(value: impl Into<String>) -> Self {
                $name(value.into())
            }

            #[inline]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                $name(value.to_string())
            }
        }
    };
}

string_id!(
    /// Identifier of a raw [`Material`]
    MaterialId
);
string_id!(
    /// Identifier of a manufactured [`Component`]
    ComponentId
);
string_id!(
    /// Identifier of a deployable [`Product`]
    ProductId
);
string_id!(
    /// Identifier of a planning [`Zone`]
    ZoneId
);

/// Market price metadata supplied by the price service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MaterialPrice {
    pub usd_per_tonne: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub as_of: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// A raw input such as lithium or steel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub id: MaterialId,
    pub name: String,
    /// Global primary supply (tonnes/year)
    pub primary_supply_tonnes: f64,
    /// Fraction of primary supply allocated to the energy sector
    pub energy_sector_share: f64,
    /// Stock on hand at the start of the horizon (tonnes)
    #[serde(default)]
    pub initial_stock_tonnes: f64,
    #[serde(default)]
    pub price: MaterialPrice,
}

impl Material {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        primary_supply_tonnes: f64,
        energy_sector_share: f64,
    ) -> Self {
        Self {
            id: MaterialId::new(id),
            name: name.into(),
            primary_supply_tonnes,
            energy_sector_share,
            initial_stock_tonnes: 0.0,
            price: MaterialPrice::default(),
        }
    }

    pub fn with_stock(mut self, tonnes: f64) -> Self {
        self.initial_stock_tonnes = tonnes;
        self
    }

    pub fn with_price(mut self, usd_per_tonne: f64) -> Self {
        self.price.usd_per_tonne = usd_per_tonne;
        self
    }

    /// Tonnes per year available to the energy sector.
    pub fn sector_supply(&self) -> f64 {
        self.primary_supply_tonnes * self.energy_sector_share
    }
}

/// A manufactured intermediate consumed by products.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub id: ComponentId,
    pub name: String,
    /// Tonnes of each material per unit of component
    #[serde(default)]
    pub materials: BTreeMap<MaterialId, f64>,
}

impl Component {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: ComponentId::new(id),
            name: name.into(),
            materials: BTreeMap::new(),
        }
    }

    pub fn with_material(mut self, material: impl Into<String>, tonnes_per_unit: f64) -> Self {
        self.materials
            .insert(MaterialId::new(material), tonnes_per_unit);
        self
    }
}

fn default_storage_hours() -> f64 {
    4.0
}

fn default_round_trip_efficiency() -> f64 {
    0.85
}

/// A deployable technology option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub tech: TechType,
    /// Units of each component per MW of capacity
    #[serde(default)]
    pub components: BTreeMap<ComponentId, f64>,
    /// $/MW
    pub capital_cost_per_mw: f64,
    /// $/MW-year
    #[serde(default)]
    pub fixed_om_per_mw_year: f64,
    /// $/MWh
    #[serde(default)]
    pub variable_om_per_mwh: f64,
    /// Years between investment decision and operation
    #[serde(default)]
    pub lead_time_years: usize,
    pub lifetime_years: usize,
    /// Fraction of nameplate credited toward the reserve margin
    pub elcc: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_annual_build_mw: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_total_mw: Option<f64>,
    #[serde(default)]
    pub land_use_km2_per_mw: f64,
    /// Energy-to-power ratio, storage only
    #[serde(default = "default_storage_hours")]
    pub storage_hours: f64,
    #[serde(default = "default_round_trip_efficiency")]
    pub round_trip_efficiency: f64,
}

impl Product {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        tech: TechType,
        capital_cost_per_mw: f64,
        lifetime_years: usize,
        elcc: f64,
    ) -> Self {
        Self {
            id: ProductId::new(id),
            name: name.into(),
            tech,
            components: BTreeMap::new(),
            capital_cost_per_mw,
            fixed_om_per_mw_year: 0.0,
            variable_om_per_mwh: 0.0,
            lead_time_years: 0,
            lifetime_years,
            elcc,
            max_annual_build_mw: None,
            max_total_mw: None,
            land_use_km2_per_mw: 0.0,
            storage_hours: default_storage_hours(),
            round_trip_efficiency: default_round_trip_efficiency(),
        }
    }

    pub fn with_component(mut self, component: impl Into<String>, units_per_mw: f64) -> Self {
        self.components
            .insert(ComponentId::new(component), units_per_mw);
        self
    }

    pub fn with_lead_time(mut self, years: usize) -> Self {
        self.lead_time_years = years;
        self
    }

    pub fn with_om(mut self, fixed_per_mw_year: f64, variable_per_mwh: f64) -> Self {
        self.fixed_om_per_mw_year = fixed_per_mw_year;
        self.variable_om_per_mwh = variable_per_mwh;
        self
    }

    pub fn with_land_use(mut self, km2_per_mw: f64) -> Self {
        self.land_use_km2_per_mw = km2_per_mw;
        self
    }

    pub fn with_build_caps(mut self, annual_mw: Option<f64>, total_mw: Option<f64>) -> Self {
        self.max_annual_build_mw = annual_mw;
        self.max_total_mw = total_mw;
        self
    }

    /// Tonnes of each material per MW, propagated through the component BOM.
    ///
    /// Components missing from `components` contribute nothing; validation
    /// guarantees they resolve for a checked configuration.
    pub fn materials_per_mw(&self, components: &[Component]) -> BTreeMap<MaterialId, f64> {
        let mut totals = BTreeMap::new();
        for (component_id, units_per_mw) in &self.components {
            let Some(component) = components.iter().find(|c| &c.id == component_id) else {
                continue;
            };
            for (material_id, tonnes_per_unit) in &component.materials {
                *totals.entry(material_id.clone()).or_insert(0.0) +=
                    units_per_mw * tonnes_per_unit;
            }
        }
        totals
    }

    pub fn uses_material(&self, material: &MaterialId, components: &[Component]) -> bool {
        self.components.keys().any(|component_id| {
            components
                .iter()
                .find(|c| &c.id == component_id)
                .is_some_and(|c| c.materials.contains_key(material))
        })
    }

    /// Ranking score: reliability credit, then speed, then cost.
    pub fn priority_score(&self) -> f64 {
        let capex_millions = self.capital_cost_per_mw / 1_000_000.0;
        if capex_millions <= 0.0 {
            return f64::MAX;
        }
        self.elcc / (self.lead_time_years as f64 + 1.0) / capex_millions
    }
}

/// A generation unit already in service at the start of the horizon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExistingUnit {
    pub tech: TechType,
    pub capacity_mw: f64,
    /// Calendar year the unit leaves service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retirement_year: Option<i32>,
}

impl ExistingUnit {
    pub fn new(tech: TechType, capacity_mw: f64) -> Self {
        Self {
            tech,
            capacity_mw,
            retirement_year: None,
        }
    }

    pub fn retiring_in(mut self, year: i32) -> Self {
        self.retirement_year = Some(year);
        self
    }

    pub fn in_service(&self, calendar_year: i32) -> bool {
        self.retirement_year
            .map_or(true, |retire| calendar_year < retire)
    }
}

/// A planning region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub id: ZoneId,
    pub name: String,
    pub baseline_peak_load_mw: f64,
    /// Compound annual growth rate of peak demand (0.02 = 2%/yr)
    #[serde(default)]
    pub demand_cagr: f64,
    #[serde(default)]
    pub existing_units: Vec<ExistingUnit>,
    /// Land available for new siting (km²); `None` means unconstrained
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_land_km2: Option<f64>,
}

impl Zone {
    pub fn new(id: impl Into<String>, name: impl Into<String>, baseline_peak_load_mw: f64) -> Self {
        Self {
            id: ZoneId::new(id),
            name: name.into(),
            baseline_peak_load_mw,
            demand_cagr: 0.0,
            existing_units: Vec::new(),
            max_land_km2: None,
        }
    }

    pub fn with_cagr(mut self, cagr: f64) -> Self {
        self.demand_cagr = cagr;
        self
    }

    pub fn with_unit(mut self, unit: ExistingUnit) -> Self {
        self.existing_units.push(unit);
        self
    }

    pub fn with_land_limit(mut self, km2: f64) -> Self {
        self.max_land_km2 = Some(km2);
        self
    }

    /// Peak load in planning year index `year`.
    pub fn peak_load(&self, year: usize) -> f64 {
        self.baseline_peak_load_mw * (1.0 + self.demand_cagr).powi(year as i32)
    }

    /// Existing capacity still in service in `calendar_year`.
    pub fn existing_capacity(&self, calendar_year: i32) -> f64 {
        self.existing_units
            .iter()
            .filter(|u| u.in_service(calendar_year))
            .map(|u| u.capacity_mw)
            .sum()
    }
}

/// Transfer path between two zones, used by the dispatch pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interconnector {
    pub from: ZoneId,
    pub to: ZoneId,
    pub capacity_mw: f64,
}

impl Interconnector {
    pub fn new(from: impl Into<String>, to: impl Into<String>, capacity_mw: f64) -> Self {
        Self {
            from: ZoneId::new(from),
            to: ZoneId::new(to),
            capacity_mw,
        }
    }
}

/// System-wide planning parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemParameters {
    pub horizon_years: usize,
    pub base_year: i32,
    /// Required reserve margin as a fraction (0.15 = 15%)
    pub reserve_margin: f64,
    /// Value of lost load ($/MWh)
    pub voll_per_mwh: f64,
    /// $/MW of reserve shortfall per year
    pub reserve_shortfall_penalty_per_mw: f64,
    /// $/MWh of RPS shortfall
    pub rps_shortfall_penalty_per_mwh: f64,
    /// Minimum generation share per category (0.4 = 40%)
    #[serde(default)]
    pub rps_targets: BTreeMap<RpsCategory, f64>,
    /// Only used for present-value reporting
    #[serde(default)]
    pub discount_rate: f64,
}

impl Default for SystemParameters {
    fn default() -> Self {
        Self {
            horizon_years: 10,
            base_year: 2025,
            reserve_margin: 0.15,
            voll_per_mwh: 10_000.0,
            reserve_shortfall_penalty_per_mw: 100_000.0,
            rps_shortfall_penalty_per_mwh: 50.0,
            rps_targets: BTreeMap::new(),
            discount_rate: 0.0,
        }
    }
}

impl SystemParameters {
    pub fn calendar_year(&self, year: usize) -> i32 {
        self.base_year
            .saturating_add(i32::try_from(year).unwrap_or(i32::MAX))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn battery_bom() -> Vec<Component> {
        vec![
            Component::new("cell", "Li-ion cell")
                .with_material("lithium", 0.1)
                .with_material("cobalt", 0.02),
            Component::new("rack", "Steel rack").with_material("steel", 0.5),
        ]
    }

    #[test]
    fn test_materials_per_mw_propagates_bom() {
        let components = battery_bom();
        let product = Product::new("bse", "Battery", TechType::Bse, 350_000.0, 15, 0.9)
            .with_component("cell", 10.0)
            .with_component("rack", 2.0);

        let per_mw = product.materials_per_mw(&components);
        assert!((per_mw[&MaterialId::from("lithium")] - 1.0).abs() < 1e-12);
        assert!((per_mw[&MaterialId::from("cobalt")] - 0.2).abs() < 1e-12);
        assert!((per_mw[&MaterialId::from("steel")] - 1.0).abs() < 1e-12);
        assert!(product.uses_material(&MaterialId::from("cobalt"), &components));
        assert!(!product.uses_material(&MaterialId::from("copper"), &components));
    }

    #[test]
    fn test_priority_score() {
        let fast = Product::new("a", "A", TechType::Ngct, 1_000_000.0, 30, 0.9);
        let slow = Product::new("b", "B", TechType::Nuc, 1_000_000.0, 60, 0.9).with_lead_time(5);
        assert!((fast.priority_score() - 0.9).abs() < 1e-12);
        assert!((slow.priority_score() - 0.15).abs() < 1e-12);
    }

    #[test]
    fn test_zone_growth_and_retirement() {
        let zone = Zone::new("z1", "Zone 1", 1000.0)
            .with_cagr(0.02)
            .with_unit(ExistingUnit::new(TechType::Coal, 300.0).retiring_in(2027))
            .with_unit(ExistingUnit::new(TechType::Ngcc, 500.0));

        assert!((zone.peak_load(2) - 1040.4).abs() < 1e-9);
        assert_eq!(zone.existing_capacity(2026), 800.0);
        assert_eq!(zone.existing_capacity(2027), 500.0);
    }

    #[test]
    fn test_sector_supply() {
        let cobalt = Material::new("cobalt", "Cobalt", 200_000.0, 0.4).with_stock(5_000.0);
        assert_eq!(cobalt.sector_supply(), 80_000.0);
        assert_eq!(cobalt.initial_stock_tonnes, 5_000.0);
    }

    #[test]
    fn test_calendar_year_saturates() {
        let params = SystemParameters {
            base_year: i32::MAX - 1,
            ..SystemParameters::default()
        };
        assert_eq!(params.calendar_year(0), i32::MAX - 1);
        assert_eq!(params.calendar_year(5), i32::MAX);
        assert_eq!(params.calendar_year(usize::MAX), i32::MAX);
        assert_eq!(SystemParameters::default().calendar_year(3), 2028);
    }
}
