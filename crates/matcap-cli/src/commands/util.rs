use anyhow::{bail, Context, Result};
use matcap_core::{Configuration, Scenario};
use matcap_io::{load_configuration, load_market_overrides, load_overrides, write_json_report, Report};
use serde::Serialize;
use std::path::Path;
use tracing::info;

use matcap_cli::cli::InputArgs;

/// Threading hint: `auto` or a positive integer.
pub fn parse_threads(hint: &str) -> Result<usize> {
    if hint.eq_ignore_ascii_case("auto") {
        return Ok(num_cpus::get());
    }
    let count: usize = hint
        .trim()
        .parse()
        .with_context(|| format!("invalid thread count '{hint}' (expected `auto` or an integer)"))?;
    if count == 0 {
        bail!("thread count must be at least 1");
    }
    Ok(count)
}

/// Load, layer overrides, retag and validate the planning input.
pub fn load_input(input: &InputArgs, scenario: Option<Scenario>) -> Result<Configuration> {
    let mut config = load_configuration(&input.config)?;
    if let Some(path) = &input.overrides {
        let overrides = load_overrides(path)?;
        overrides
            .apply(&mut config)
            .with_context(|| format!("applying overrides from '{}'", path.display()))?;
    }
    if let Some(path) = &input.market {
        let market = load_market_overrides(path)?;
        config
            .apply_market_overrides(&market)
            .with_context(|| format!("applying market data from '{}'", path.display()))?;
    }
    if let Some(scenario) = scenario {
        config.scenario = scenario;
    }
    config
        .validate()
        .with_context(|| format!("validating '{}'", input.config.display()))?;
    info!(
        config = %input.config.display(),
        scenario = %config.scenario,
        horizon = config.horizon(),
        zones = config.zones.len(),
        products = config.products.len(),
        "loaded configuration"
    );
    Ok(config)
}

/// Wrap `payload` in a [`Report`] and write it when an output path was given.
pub fn write_report<T: Serialize>(out: Option<&Path>, kind: &str, payload: T) -> Result<()> {
    if let Some(path) = out {
        write_json_report(path, &Report::new(kind, payload))?;
        println!("\nResults written to {}", path.display());
    }
    Ok(())
}

pub fn format_millions(usd: f64) -> String {
    format!("{:.1}", usd / 1_000_000.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thread_hint() {
        assert_eq!(parse_threads("3").unwrap(), 3);
        assert!(parse_threads("auto").unwrap() >= 1);
        assert!(parse_threads("0").is_err());
        assert!(parse_threads("many").is_err());
    }
}
