use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

const WORKED_EXAMPLE: &str = r#"{
  "products": [
    {"id": "bse", "name": "Battery", "tech": "bse",
     "capital_cost_per_mw": 350000.0, "lifetime_years": 15, "elcc": 0.9}
  ],
  "zones": [
    {"id": "z1", "name": "Zone 1", "baseline_peak_load_mw": 1000.0,
     "existing_units": [{"tech": "ngcc", "capacity_mw": 900.0}]}
  ]
}"#;

fn write_config(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, body).unwrap();
    path
}

#[test]
fn help_lists_subcommands() {
    let mut cmd = cargo_bin_cmd!("matcap");
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("solve"))
        .stdout(predicate::str::contains("bottlenecks"))
        .stdout(predicate::str::contains("compare"))
        .stdout(predicate::str::contains("reference"));
}

#[test]
fn reference_round_trips_through_validate() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("reference.yaml");

    cargo_bin_cmd!("matcap")
        .args(["reference", "--out", path.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Reference configuration written"));
    assert!(path.exists());

    cargo_bin_cmd!("matcap")
        .args(["validate", path.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"))
        .stdout(predicate::str::contains("8 material(s)"))
        .stdout(predicate::str::contains("3 zone(s)"));
}

#[test]
fn reference_prints_json_to_stdout() {
    cargo_bin_cmd!("matcap")
        .args(["reference", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("{"))
        .stdout(predicate::str::contains("\"neodymium\""));
}

#[test]
fn solve_worked_example_writes_report() {
    let tmp = tempdir().unwrap();
    let config = write_config(tmp.path(), "example.json", WORKED_EXAMPLE);
    let out = tmp.path().join("out/solution.json");

    cargo_bin_cmd!("matcap")
        .args([
            "solve",
            config.to_str().unwrap(),
            "--out",
            out.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Capacity Plan Summary"))
        .stdout(predicate::str::contains("Status: optimal"))
        .stdout(predicate::str::contains("250.0"));

    let report = fs::read_to_string(&out).unwrap();
    let json: serde_json::Value = serde_json::from_str(&report).unwrap();
    assert_eq!(json["kind"], "solution");
    assert_eq!(json["payload"]["feasible"], true);
    assert_eq!(json["payload"]["state"]["units"].as_array().unwrap().len(), 1);
}

#[test]
fn bottlenecks_on_unconstrained_plan() {
    let tmp = tempdir().unwrap();
    let config = write_config(tmp.path(), "example.json", WORKED_EXAMPLE);

    cargo_bin_cmd!("matcap")
        .args(["bottlenecks", config.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Bottleneck analysis (baseline)"));
}

#[test]
fn compare_prints_table_and_insights() {
    let tmp = tempdir().unwrap();
    let config = write_config(tmp.path(), "example.json", WORKED_EXAMPLE);
    let out = tmp.path().join("comparison.json");

    cargo_bin_cmd!("matcap")
        .args([
            "compare",
            config.to_str().unwrap(),
            "--scenarios",
            "baseline,high_demand",
            "--threads",
            "2",
            "--out",
            out.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("high_demand"))
        .stdout(predicate::str::contains("Insights:"))
        .stdout(predicate::str::contains("Investment ranges from"));

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(json["kind"], "comparison");
    assert_eq!(json["payload"]["results"][0]["scenario"], "baseline");
    assert_eq!(json["payload"]["results"][1]["scenario"], "high_demand");
}

#[test]
fn invalid_configuration_fails() {
    let tmp = tempdir().unwrap();
    let config = write_config(
        tmp.path(),
        "broken.yaml",
        "components:\n  - id: cell\n    name: Cell\n    materials:\n      unobtainium: 1.0\n",
    );

    cargo_bin_cmd!("matcap")
        .args(["validate", config.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown material 'unobtainium'"));
}

#[test]
fn unknown_scenario_is_rejected() {
    let tmp = tempdir().unwrap();
    let config = write_config(tmp.path(), "example.json", WORKED_EXAMPLE);

    cargo_bin_cmd!("matcap")
        .args(["solve", config.to_str().unwrap(), "--scenario", "doomsday"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown scenario 'doomsday'"));
}

#[test]
fn bad_thread_hint_is_rejected() {
    let tmp = tempdir().unwrap();
    let config = write_config(tmp.path(), "example.json", WORKED_EXAMPLE);

    cargo_bin_cmd!("matcap")
        .args(["compare", config.to_str().unwrap(), "--threads", "lots"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid thread count"));
}

#[test]
fn validate_fails_on_product_that_never_operates() {
    let tmp = tempdir().unwrap();
    let config = write_config(
        tmp.path(),
        "dead.json",
        r#"{
  "products": [
    {"id": "nuc", "name": "Nuclear", "tech": "nuc",
     "capital_cost_per_mw": 6000000.0, "lifetime_years": 2,
     "lead_time_years": 3, "elcc": 0.95}
  ],
  "zones": [
    {"id": "z1", "name": "Zone 1", "baseline_peak_load_mw": 1000.0,
     "existing_units": [{"tech": "ngcc", "capacity_mw": 900.0}]}
  ]
}"#,
    );

    cargo_bin_cmd!("matcap")
        .args(["validate", config.to_str().unwrap()])
        .assert()
        .failure()
        .stdout(predicate::str::contains("can never operate"))
        .stderr(predicate::str::contains("1 error"));
}
