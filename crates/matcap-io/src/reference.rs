//! Built-in reference dataset.
//!
//! A three-zone system with eight tracked materials, used by
//! `matcap reference` and as a starting point for custom studies. Supply
//! shares are the fraction of global primary production assumed available
//! to this system's energy buildout.

use matcap_core::{
    Component, Configuration, ExistingUnit, Interconnector, Material, Product, RpsCategory,
    Scenario, SystemParameters, TechType, Zone,
};

fn materials() -> Vec<Material> {
    vec![
        Material::new("lithium", "Lithium", 180_000.0, 0.02)
            .with_stock(500.0)
            .with_price(13_000.0),
        Material::new("cobalt", "Cobalt", 230_000.0, 0.004)
            .with_stock(150.0)
            .with_price(33_000.0),
        Material::new("nickel", "Nickel", 3_600_000.0, 0.002)
            .with_stock(2_000.0)
            .with_price(17_000.0),
        Material::new("graphite", "Graphite", 1_600_000.0, 0.004)
            .with_stock(1_500.0)
            .with_price(800.0),
        Material::new("neodymium", "Neodymium", 35_000.0, 0.004)
            .with_stock(20.0)
            .with_price(75_000.0),
        Material::new("silicon", "Polysilicon", 1_500_000.0, 0.01)
            .with_stock(2_000.0)
            .with_price(9_000.0),
        Material::new("copper", "Copper", 22_000_000.0, 0.002)
            .with_stock(10_000.0)
            .with_price(9_000.0),
        Material::new("steel", "Steel", 1_900_000_000.0, 0.001)
            .with_stock(100_000.0)
            .with_price(700.0),
    ]
}

fn components() -> Vec<Component> {
    vec![
        // One MWh of cells
        Component::new("li_ion_cell", "Li-ion cell (1 MWh)")
            .with_material("lithium", 0.12)
            .with_material("cobalt", 0.02)
            .with_material("nickel", 0.6)
            .with_material("graphite", 1.0),
        Component::new("pv_module", "PV module (1 MW)")
            .with_material("silicon", 4.0)
            .with_material("copper", 1.0)
            .with_material("steel", 40.0),
        Component::new("inverter", "Inverter (1 MW)")
            .with_material("copper", 1.5)
            .with_material("steel", 2.0),
        Component::new("pm_generator", "Permanent magnet generator (1 MW)")
            .with_material("neodymium", 0.2)
            .with_material("copper", 3.0)
            .with_material("steel", 20.0),
        Component::new("wind_tower", "Wind tower (1 MW)").with_material("steel", 130.0),
        Component::new("gas_turbine", "Gas turbine (1 MW)")
            .with_material("nickel", 0.3)
            .with_material("copper", 1.0)
            .with_material("steel", 20.0),
        Component::new("reactor_module", "Reactor module (1 MW)")
            .with_material("nickel", 0.5)
            .with_material("copper", 1.5)
            .with_material("steel", 50.0),
    ]
}

fn products() -> Vec<Product> {
    vec![
        Product::new("bse-4h", "Four hour battery", TechType::Bse, 1_300_000.0, 15, 0.9)
            .with_component("li_ion_cell", 4.0)
            .with_component("inverter", 1.0)
            .with_om(25_000.0, 0.0)
            .with_lead_time(1)
            .with_land_use(0.002)
            .with_build_caps(Some(3_000.0), None),
        Product::new("spv-utility", "Utility solar", TechType::Spv, 1_100_000.0, 30, 0.35)
            .with_component("pv_module", 1.0)
            .with_component("inverter", 1.0)
            .with_om(18_000.0, 0.0)
            .with_lead_time(1)
            .with_land_use(0.02),
        Product::new("lbw-onshore", "Onshore wind", TechType::Lbw, 1_450_000.0, 25, 0.15)
            .with_component("pm_generator", 0.3)
            .with_component("wind_tower", 1.0)
            .with_component("inverter", 1.0)
            .with_om(40_000.0, 0.0)
            .with_lead_time(2)
            .with_land_use(0.08),
        Product::new("osw-fixed", "Offshore wind", TechType::Osw, 3_800_000.0, 25, 0.25)
            .with_component("pm_generator", 1.0)
            .with_component("wind_tower", 1.5)
            .with_om(90_000.0, 0.0)
            .with_lead_time(4),
        Product::new("ngcc-h", "Combined cycle", TechType::Ngcc, 1_100_000.0, 35, 0.95)
            .with_component("gas_turbine", 1.0)
            .with_om(14_000.0, 3.0)
            .with_lead_time(3)
            .with_land_use(0.001),
        Product::new("ngct-aero", "Aeroderivative peaker", TechType::Ngct, 850_000.0, 30, 0.95)
            .with_component("gas_turbine", 1.0)
            .with_om(12_000.0, 5.0)
            .with_lead_time(2)
            .with_land_use(0.001),
        Product::new("nuc-smr", "Small modular reactor", TechType::Nuc, 8_000_000.0, 60, 0.95)
            .with_component("reactor_module", 1.0)
            .with_om(120_000.0, 2.5)
            .with_lead_time(7)
            .with_build_caps(Some(1_000.0), None),
        Product::new("hyd-run", "Run-of-river hydro", TechType::Hyd, 3_000_000.0, 80, 0.75)
            .with_component("inverter", 1.0)
            .with_om(30_000.0, 0.0)
            .with_lead_time(5)
            .with_build_caps(None, Some(2_000.0)),
    ]
}

fn zones() -> Vec<Zone> {
    vec![
        Zone::new("north", "North", 12_000.0)
            .with_cagr(0.015)
            .with_unit(ExistingUnit::new(TechType::Ngcc, 5_500.0))
            .with_unit(ExistingUnit::new(TechType::Coal, 3_000.0).retiring_in(2030))
            .with_unit(ExistingUnit::new(TechType::Nuc, 2_400.0))
            .with_unit(ExistingUnit::new(TechType::Hyd, 1_500.0))
            .with_unit(ExistingUnit::new(TechType::Lbw, 1_200.0))
            .with_land_limit(600.0),
        Zone::new("central", "Central", 9_000.0)
            .with_cagr(0.02)
            .with_unit(ExistingUnit::new(TechType::Ngcc, 4_200.0))
            .with_unit(ExistingUnit::new(TechType::Ngct, 1_800.0))
            .with_unit(ExistingUnit::new(TechType::Coal, 1_500.0).retiring_in(2028))
            .with_unit(ExistingUnit::new(TechType::Spv, 900.0))
            .with_unit(ExistingUnit::new(TechType::Lbw, 900.0))
            .with_land_limit(900.0),
        Zone::new("south", "South", 7_000.0)
            .with_cagr(0.03)
            .with_unit(ExistingUnit::new(TechType::Ngcc, 3_000.0))
            .with_unit(ExistingUnit::new(TechType::Ngct, 900.0))
            .with_unit(ExistingUnit::new(TechType::Spv, 1_500.0))
            .with_unit(ExistingUnit::new(TechType::Oil, 400.0).retiring_in(2027))
            .with_unit(ExistingUnit::new(TechType::Bse, 300.0))
            .with_land_limit(400.0),
    ]
}

/// The reference planning problem.
pub fn reference_configuration() -> Configuration {
    let mut parameters = SystemParameters {
        horizon_years: 10,
        base_year: 2025,
        reserve_margin: 0.15,
        voll_per_mwh: 10_000.0,
        reserve_shortfall_penalty_per_mw: 100_000.0,
        rps_shortfall_penalty_per_mwh: 50.0,
        discount_rate: 0.05,
        ..SystemParameters::default()
    };
    parameters.rps_targets.insert(RpsCategory::Renewable, 0.35);
    parameters.rps_targets.insert(RpsCategory::Clean, 0.5);

    Configuration {
        scenario: Scenario::Baseline,
        parameters,
        materials: materials(),
        components: components(),
        products: products(),
        zones: zones(),
        interconnectors: vec![
            Interconnector::new("north", "central", 1_500.0),
            Interconnector::new("central", "south", 1_200.0),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_is_valid() {
        let config = reference_configuration();
        config.validate().unwrap();
        assert_eq!(config.materials.len(), 8);
        assert_eq!(config.components.len(), 7);
        assert_eq!(config.products.len(), 8);
        assert_eq!(config.zones.len(), 3);
        assert_eq!(config.interconnectors.len(), 2);
        assert!(!config.diagnostics().has_errors());
    }
}
