use matcap_core::{MaterialId, Scenario, TechType, ZoneId};
use matcap_io::{
    load_configuration, load_market_overrides, load_overrides, read_json_report,
    reference_configuration, save_configuration, write_json_report, Report,
};
use std::fs;
use tempfile::tempdir;

#[test]
fn yaml_round_trip_preserves_configuration() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("reference.yaml");
    let config = reference_configuration();

    save_configuration(&path, &config).unwrap();
    let back = load_configuration(&path).unwrap();
    assert_eq!(back, config);
}

#[test]
fn json_round_trip_creates_parent_directories() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("inputs/2025/reference.json");
    let config = reference_configuration();

    save_configuration(&path, &config).unwrap();
    let text = fs::read_to_string(&path).unwrap();
    assert!(text.trim_start().starts_with('{'));
    let back = load_configuration(&path).unwrap();
    assert_eq!(back.zones, config.zones);
    assert_eq!(back.products.len(), 8);
}

#[test]
fn toml_configuration_loads() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("small.toml");
    fs::write(
        &path,
        r#"
scenario = "high_demand"

[parameters]
horizon_years = 5
base_year = 2030
reserve_margin = 0.2
voll_per_mwh = 9000.0
reserve_shortfall_penalty_per_mw = 80000.0
rps_shortfall_penalty_per_mwh = 40.0

[[materials]]
id = "lithium"
name = "Lithium"
primary_supply_tonnes = 1000.0
energy_sector_share = 0.5

[[products]]
id = "bse"
name = "Battery"
tech = "bse"
capital_cost_per_mw = 350000.0
lifetime_years = 15
elcc = 0.9

[[zones]]
id = "north"
name = "North"
baseline_peak_load_mw = 1000.0
max_land_km2 = 25.0

[[zones.existing_units]]
tech = "coal"
capacity_mw = 900.0
retirement_year = 2032
"#,
    )
    .unwrap();

    let config = load_configuration(&path).unwrap();
    config.validate().unwrap();
    assert_eq!(config.scenario, Scenario::HighDemand);
    assert_eq!(config.horizon(), 5);
    assert_eq!(config.products[0].tech, TechType::Bse);
    assert_eq!(config.products[0].storage_hours, 4.0);
    let zone = config.zone(&ZoneId::from("north")).unwrap();
    assert_eq!(zone.max_land_km2, Some(25.0));
    assert_eq!(zone.existing_capacity(2031), 900.0);
    assert_eq!(zone.existing_capacity(2032), 0.0);
}

#[test]
fn unknown_extension_falls_back_to_yaml_then_json() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.input");
    fs::write(
        &path,
        r#"{"parameters": {"horizon_years": 3, "base_year": 2025, "reserve_margin": 0.15,
            "voll_per_mwh": 10000.0, "reserve_shortfall_penalty_per_mw": 100000.0,
            "rps_shortfall_penalty_per_mwh": 50.0}}"#,
    )
    .unwrap();

    let config = load_configuration(&path).unwrap();
    assert_eq!(config.horizon(), 3);
    assert!(config.zones.is_empty());
}

#[test]
fn missing_file_reports_path() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("absent.yaml");
    let err = load_configuration(&path).unwrap_err();
    assert!(format!("{err:#}").contains("absent.yaml"));
}

#[test]
fn overrides_file_layers_over_reference() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("overrides.yaml");
    fs::write(
        &path,
        r#"
scenario: supply_constrained
materials:
  - id: lithium
    name: Lithium
    primary_supply_tonnes: 90000.0
    energy_sector_share: 0.02
market:
  - material: cobalt
    disruption: 0.5
"#,
    )
    .unwrap();

    let mut config = reference_configuration();
    let cobalt_before = config
        .material(&MaterialId::from("cobalt"))
        .unwrap()
        .primary_supply_tonnes;
    let overrides = load_overrides(&path).unwrap();
    assert!(!overrides.is_empty());
    overrides.apply(&mut config).unwrap();

    assert_eq!(config.scenario, Scenario::SupplyConstrained);
    assert_eq!(config.materials.len(), 8);
    let lithium = config.material(&MaterialId::from("lithium")).unwrap();
    assert_eq!(lithium.primary_supply_tonnes, 90_000.0);
    // Replaced entities take the override as written
    assert_eq!(lithium.initial_stock_tonnes, 0.0);
    let cobalt = config.material(&MaterialId::from("cobalt")).unwrap();
    assert_eq!(cobalt.primary_supply_tonnes, cobalt_before * 0.5);
    config.validate().unwrap();
}

#[test]
fn market_overrides_load_as_list() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("market.json");
    fs::write(
        &path,
        r#"[{"material": "nickel", "usd_per_tonne": 21000.0},
            {"material": "copper", "primary_supply_tonnes": 20000000.0}]"#,
    )
    .unwrap();

    let market = load_market_overrides(&path).unwrap();
    assert_eq!(market.len(), 2);
    assert_eq!(market[0].usd_per_tonne, Some(21_000.0));
    assert_eq!(market[1].disruption, None);

    let mut config = reference_configuration();
    config.apply_market_overrides(&market).unwrap();
    let nickel = config.material(&MaterialId::from("nickel")).unwrap();
    assert_eq!(nickel.price.usd_per_tonne, 21_000.0);
}

#[test]
fn report_wraps_payload_with_metadata() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("out/config-report.json");
    let report = Report::new("configuration", reference_configuration());

    write_json_report(&path, &report).unwrap();
    let back: Report<matcap_core::Configuration> = read_json_report(&path).unwrap();
    assert_eq!(back.kind, "configuration");
    assert_eq!(back.tool_version, env!("CARGO_PKG_VERSION"));
    assert_eq!(back.payload.zones.len(), 3);
}
