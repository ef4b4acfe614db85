//! The aggregate planning input.
//!
//! A [`Configuration`] bundles the entity tables, the system parameters and a
//! scenario tag. It is read-only to the solver; scenario adjustments and
//! market overrides produce new values rather than mutating shared state.

use crate::diagnostics::Diagnostics;
use crate::error::ConfigurationError;
use crate::model::{
    Component, ComponentId, Interconnector, Material, MaterialId, Product, ProductId,
    SystemParameters, Zone, ZoneId,
};
use crate::scenario::Scenario;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    #[serde(default)]
    pub scenario: Scenario,
    #[serde(default)]
    pub parameters: SystemParameters,
    #[serde(default)]
    pub materials: Vec<Material>,
    #[serde(default)]
    pub components: Vec<Component>,
    /// Input order is the tie-break order for equal priority scores
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub zones: Vec<Zone>,
    #[serde(default)]
    pub interconnectors: Vec<Interconnector>,
}

/// Numeric override supplied by the market/price collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketOverride {
    pub material: MaterialId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_supply_tonnes: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usd_per_tonne: Option<f64>,
    /// Fraction of supply lost to a disruption event (0.25 = 25% lost)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disruption: Option<f64>,
}

impl Configuration {
    pub fn new(parameters: SystemParameters) -> Self {
        Self {
            scenario: Scenario::Baseline,
            parameters,
            materials: Vec::new(),
            components: Vec::new(),
            products: Vec::new(),
            zones: Vec::new(),
            interconnectors: Vec::new(),
        }
    }

    pub fn horizon(&self) -> usize {
        self.parameters.horizon_years
    }

    pub fn material(&self, id: &MaterialId) -> Option<&Material> {
        self.materials.iter().find(|m| &m.id == id)
    }

    pub fn component(&self, id: &ComponentId) -> Option<&Component> {
        self.components.iter().find(|c| &c.id == id)
    }

    pub fn product(&self, id: &ProductId) -> Option<&Product> {
        self.products.iter().find(|p| &p.id == id)
    }

    pub fn zone(&self, id: &ZoneId) -> Option<&Zone> {
        self.zones.iter().find(|z| &z.id == id)
    }

    /// Clone with a different scenario tag.
    pub fn with_scenario(&self, scenario: Scenario) -> Configuration {
        let mut clone = self.clone();
        clone.scenario = scenario;
        clone
    }

    /// The configuration the solver actually plans: scenario adjustments
    /// applied to demand and material supply.
    pub fn effective(&self) -> Configuration {
        let adj = self.scenario.adjustments();
        let mut out = self.clone();
        if adj.is_identity() {
            return out;
        }
        for zone in &mut out.zones {
            zone.baseline_peak_load_mw *= adj.peak_load_multiplier;
            zone.demand_cagr += adj.cagr_delta;
        }
        for material in &mut out.materials {
            material.primary_supply_tonnes *= adj.supply_multiplier;
        }
        out
    }

    /// Apply market data as numeric overrides.
    pub fn apply_market_overrides(
        &mut self,
        overrides: &[MarketOverride],
    ) -> Result<(), ConfigurationError> {
        for ov in overrides {
            let material = self
                .materials
                .iter_mut()
                .find(|m| m.id == ov.material)
                .ok_or_else(|| {
                    ConfigurationError::UnknownOverrideMaterial(ov.material.to_string())
                })?;
            if let Some(supply) = ov.primary_supply_tonnes {
                material.primary_supply_tonnes = supply;
            }
            if let Some(price) = ov.usd_per_tonne {
                material.price.usd_per_tonne = price;
            }
            if let Some(lost) = ov.disruption {
                check_fraction(&format!("override {}", ov.material), "disruption", lost)?;
                material.primary_supply_tonnes *= 1.0 - lost;
            }
        }
        Ok(())
    }

    /// Referential integrity and magnitude checks.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.parameters.horizon_years == 0 {
            return Err(ConfigurationError::EmptyHorizon);
        }
        let params = &self.parameters;
        check_non_negative("parameters", "reserve_margin", params.reserve_margin)?;
        check_non_negative("parameters", "voll_per_mwh", params.voll_per_mwh)?;
        check_non_negative(
            "parameters",
            "reserve_shortfall_penalty_per_mw",
            params.reserve_shortfall_penalty_per_mw,
        )?;
        check_non_negative(
            "parameters",
            "rps_shortfall_penalty_per_mwh",
            params.rps_shortfall_penalty_per_mwh,
        )?;
        check_non_negative("parameters", "discount_rate", params.discount_rate)?;
        for target in params.rps_targets.values() {
            check_fraction("parameters", "rps_targets", *target)?;
        }

        unique_ids("material", self.materials.iter().map(|m| m.id.as_str()))?;
        unique_ids("component", self.components.iter().map(|c| c.id.as_str()))?;
        unique_ids("product", self.products.iter().map(|p| p.id.as_str()))?;
        unique_ids("zone", self.zones.iter().map(|z| z.id.as_str()))?;

        for material in &self.materials {
            let entity = format!("material {}", material.id);
            check_non_negative(&entity, "primary_supply_tonnes", material.primary_supply_tonnes)?;
            check_fraction(&entity, "energy_sector_share", material.energy_sector_share)?;
            check_non_negative(&entity, "initial_stock_tonnes", material.initial_stock_tonnes)?;
            check_non_negative(&entity, "price.usd_per_tonne", material.price.usd_per_tonne)?;
        }

        for component in &self.components {
            let entity = format!("component {}", component.id);
            for (material_id, tonnes) in &component.materials {
                if self.material(material_id).is_none() {
                    return Err(ConfigurationError::UnknownMaterial {
                        component: component.id.to_string(),
                        material: material_id.to_string(),
                    });
                }
                check_non_negative(&entity, "materials", *tonnes)?;
            }
        }

        for product in &self.products {
            let entity = format!("product {}", product.id);
            for (component_id, units) in &product.components {
                if self.component(component_id).is_none() {
                    return Err(ConfigurationError::UnknownComponent {
                        product: product.id.to_string(),
                        component: component_id.to_string(),
                    });
                }
                check_non_negative(&entity, "components", *units)?;
            }
            check_non_negative(&entity, "capital_cost_per_mw", product.capital_cost_per_mw)?;
            check_non_negative(&entity, "fixed_om_per_mw_year", product.fixed_om_per_mw_year)?;
            check_non_negative(&entity, "variable_om_per_mwh", product.variable_om_per_mwh)?;
            check_fraction(&entity, "elcc", product.elcc)?;
            check_non_negative(&entity, "land_use_km2_per_mw", product.land_use_km2_per_mw)?;
            check_non_negative(&entity, "storage_hours", product.storage_hours)?;
            check_fraction(&entity, "round_trip_efficiency", product.round_trip_efficiency)?;
            if let Some(cap) = product.max_annual_build_mw {
                check_non_negative(&entity, "max_annual_build_mw", cap)?;
            }
            if let Some(cap) = product.max_total_mw {
                check_non_negative(&entity, "max_total_mw", cap)?;
            }
        }

        for zone in &self.zones {
            let entity = format!("zone {}", zone.id);
            check_non_negative(&entity, "baseline_peak_load_mw", zone.baseline_peak_load_mw)?;
            if !zone.demand_cagr.is_finite() || zone.demand_cagr <= -1.0 {
                return Err(ConfigurationError::NegativeValue {
                    entity,
                    field: "demand_cagr",
                    value: zone.demand_cagr,
                });
            }
            for unit in &zone.existing_units {
                check_non_negative(&entity, "existing_units.capacity_mw", unit.capacity_mw)?;
            }
            if let Some(limit) = zone.max_land_km2 {
                check_non_negative(&entity, "max_land_km2", limit)?;
            }
        }

        for link in &self.interconnectors {
            for end in [&link.from, &link.to] {
                if self.zone(end).is_none() {
                    return Err(ConfigurationError::UnknownZone {
                        zone: end.to_string(),
                    });
                }
            }
            check_non_negative(
                &format!("interconnector {}-{}", link.from, link.to),
                "capacity_mw",
                link.capacity_mw,
            )?;
        }

        Ok(())
    }

    /// Legal but suspicious input worth reporting.
    ///
    /// Errors mark products the planner can never deploy: their lifetime
    /// ends before they come online, or their bill of materials needs a
    /// material with neither supply nor stock. Everything else is a warning.
    pub fn diagnostics(&self) -> Diagnostics {
        let mut diag = self.material_diagnostics();
        diag.merge(self.product_diagnostics());
        diag.merge(self.zone_diagnostics());
        if self.products.is_empty() {
            diag.add_warning("capacity", "no deployable products; gaps cannot be filled");
        }
        diag
    }

    fn unavailable_materials(&self) -> Vec<&MaterialId> {
        self.materials
            .iter()
            .filter(|m| m.sector_supply() <= 0.0 && m.initial_stock_tonnes <= 0.0)
            .map(|m| &m.id)
            .collect()
    }

    fn material_diagnostics(&self) -> Diagnostics {
        let mut diag = Diagnostics::new();
        for material in self.unavailable_materials() {
            diag.add_warning_with_entity(
                "supply",
                "no sector supply and no stock",
                &format!("material {material}"),
            );
        }
        diag
    }

    fn product_diagnostics(&self) -> Diagnostics {
        let mut diag = Diagnostics::new();
        let unavailable = self.unavailable_materials();
        for product in &self.products {
            let entity = format!("product {}", product.id);
            if product.elcc <= 0.0 {
                diag.add_warning_with_entity("reliability", "ELCC is zero", &entity);
            }
            if product.lifetime_years <= product.lead_time_years {
                diag.add_error_with_entity(
                    "lifetime",
                    "lifetime does not exceed lead time; the product can never operate",
                    &entity,
                );
            }
            if product.lead_time_years >= self.parameters.horizon_years {
                diag.add_warning_with_entity(
                    "lead_time",
                    "lead time reaches past the planning horizon",
                    &entity,
                );
            }
            if let Some(material) = unavailable
                .iter()
                .find(|m| product.uses_material(m, &self.components))
            {
                diag.add_error_with_entity(
                    "supply",
                    &format!("needs material {material}, which has no supply or stock"),
                    &entity,
                );
            }
        }
        diag
    }

    fn zone_diagnostics(&self) -> Diagnostics {
        let mut diag = Diagnostics::new();
        for zone in &self.zones {
            if zone.existing_units.is_empty() {
                diag.add_warning_with_entity(
                    "capacity",
                    "zone has no existing units",
                    &format!("zone {}", zone.id),
                );
            }
        }
        diag
    }
}

/// Builder for assembling a configuration in code.
pub struct ConfigurationBuilder {
    config: Configuration,
}

impl ConfigurationBuilder {
    pub fn new(parameters: SystemParameters) -> Self {
        Self {
            config: Configuration::new(parameters),
        }
    }

    pub fn scenario(mut self, scenario: Scenario) -> Self {
        self.config.scenario = scenario;
        self
    }

    pub fn material(mut self, material: Material) -> Self {
        self.config.materials.push(material);
        self
    }

    pub fn component(mut self, component: Component) -> Self {
        self.config.components.push(component);
        self
    }

    pub fn product(mut self, product: Product) -> Self {
        self.config.products.push(product);
        self
    }

    pub fn zone(mut self, zone: Zone) -> Self {
        self.config.zones.push(zone);
        self
    }

    pub fn interconnector(mut self, link: Interconnector) -> Self {
        self.config.interconnectors.push(link);
        self
    }

    /// Validate and return the configuration.
    pub fn build(self) -> Result<Configuration, ConfigurationError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

fn check_non_negative(
    entity: &str,
    field: &'static str,
    value: f64,
) -> Result<(), ConfigurationError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigurationError::NegativeValue {
            entity: entity.to_string(),
            field,
            value,
        })
    }
}

fn check_fraction(entity: &str, field: &'static str, value: f64) -> Result<(), ConfigurationError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigurationError::FractionOutOfRange {
            entity: entity.to_string(),
            field,
            value,
        })
    }
}

fn unique_ids<'a>(
    kind: &'static str,
    ids: impl Iterator<Item = &'a str>,
) -> Result<(), ConfigurationError> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(ConfigurationError::DuplicateId {
                kind,
                id: id.to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Severity;
    use crate::model::ExistingUnit;
    use crate::tech::TechType;

    fn base() -> ConfigurationBuilder {
        ConfigurationBuilder::new(SystemParameters {
            horizon_years: 5,
            ..SystemParameters::default()
        })
        .material(Material::new("lithium", "Lithium", 100_000.0, 0.8))
        .component(Component::new("cell", "Cell").with_material("lithium", 0.01))
        .product(
            Product::new("bse", "Battery", TechType::Bse, 350_000.0, 15, 0.9)
                .with_component("cell", 100.0),
        )
        .zone(
            Zone::new("north", "North", 1000.0)
                .with_unit(ExistingUnit::new(TechType::Ngcc, 900.0)),
        )
    }

    #[test]
    fn test_valid_configuration_builds() {
        let config = base().build().expect("valid configuration");
        assert_eq!(config.horizon(), 5);
        assert!(!config.diagnostics().has_errors());
    }

    #[test]
    fn test_dangling_material_rejected() {
        let err = base()
            .component(Component::new("magnet", "Magnet").with_material("neodymium", 0.2))
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::UnknownMaterial { .. }));
    }

    #[test]
    fn test_dangling_component_rejected() {
        let err = base()
            .product(
                Product::new("spv", "Solar", TechType::Spv, 900_000.0, 30, 0.35)
                    .with_component("module", 1.0),
            )
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::UnknownComponent {
                product: "spv".into(),
                component: "module".into(),
            }
        );
    }

    #[test]
    fn test_negative_values_rejected() {
        let err = base()
            .material(Material::new("cobalt", "Cobalt", -1.0, 0.5))
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigurationError::NegativeValue {
                field: "primary_supply_tonnes",
                ..
            }
        ));

        let err = base()
            .zone(Zone::new("south", "South", 500.0).with_unit(ExistingUnit::new(TechType::Coal, -5.0)))
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::NegativeValue { .. }));
    }

    #[test]
    fn test_duplicate_and_unknown_zone() {
        let err = base()
            .zone(Zone::new("north", "Again", 10.0))
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::DuplicateId { kind: "zone", .. }));

        let err = base()
            .interconnector(Interconnector::new("north", "atlantis", 100.0))
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::UnknownZone { .. }));
    }

    #[test]
    fn test_effective_applies_scenario() {
        let config = base().scenario(Scenario::HighDemand).build().unwrap();
        let eff = config.effective();
        assert!((eff.zones[0].baseline_peak_load_mw - 1150.0).abs() < 1e-9);
        assert!((eff.zones[0].demand_cagr - 0.01).abs() < 1e-12);
        assert_eq!(eff.materials[0].primary_supply_tonnes, 100_000.0);

        let baseline = config.with_scenario(Scenario::Baseline);
        assert_eq!(baseline.effective(), baseline);
    }

    #[test]
    fn test_market_overrides() {
        let mut config = base().build().unwrap();
        config
            .apply_market_overrides(&[MarketOverride {
                material: MaterialId::from("lithium"),
                primary_supply_tonnes: Some(50_000.0),
                usd_per_tonne: Some(14_000.0),
                disruption: Some(0.2),
            }])
            .unwrap();
        assert_eq!(config.materials[0].primary_supply_tonnes, 40_000.0);
        assert_eq!(config.materials[0].price.usd_per_tonne, 14_000.0);

        let err = config
            .apply_market_overrides(&[MarketOverride {
                material: MaterialId::from("gallium"),
                primary_supply_tonnes: None,
                usd_per_tonne: None,
                disruption: None,
            }])
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::UnknownOverrideMaterial(_)));
    }

    #[test]
    fn test_diagnostics_flags_dead_products() {
        let config = base()
            .product(Product::new("nuc", "Nuclear", TechType::Nuc, 6e6, 4, 0.95).with_lead_time(6))
            .build()
            .unwrap();
        let diag = config.diagnostics();
        assert_eq!(diag.issues_by_category("lifetime").count(), 1);
        assert_eq!(diag.issues_by_category("lead_time").count(), 1);
        assert_eq!(diag.error_count(), 1);
        assert_eq!(diag.warning_count(), 1);
        assert!(diag.has_errors());
    }

    #[test]
    fn test_diagnostics_flags_products_without_material() {
        let config = base()
            .material(Material::new("gallium", "Gallium", 0.0, 0.5))
            .component(Component::new("wafer", "Wafer").with_material("gallium", 0.01))
            .product(
                Product::new("spv", "Solar", TechType::Spv, 900_000.0, 30, 0.35)
                    .with_component("wafer", 10.0),
            )
            .build()
            .unwrap();
        let diag = config.diagnostics();

        let supply: Vec<_> = diag.issues_by_category("supply").collect();
        assert_eq!(supply.len(), 2);
        assert_eq!(diag.error_count(), 1);
        let error = supply
            .iter()
            .find(|issue| issue.severity == Severity::Error)
            .unwrap();
        assert_eq!(error.entity.as_deref(), Some("product spv"));
        assert!(error.message.contains("gallium"));
    }
}
