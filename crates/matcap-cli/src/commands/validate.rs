use anyhow::{bail, Result};
use matcap_cli::cli::InputArgs;

use crate::commands::util::load_input;

pub fn handle(input: &InputArgs) -> Result<()> {
    let config = load_input(input, None)?;

    println!("Configuration is valid: {}", input.config.display());
    println!(
        "  {} material(s), {} component(s), {} product(s), {} zone(s), {} interconnector(s)",
        config.materials.len(),
        config.components.len(),
        config.products.len(),
        config.zones.len(),
        config.interconnectors.len()
    );
    println!(
        "  Horizon: {} year(s) from {}, scenario {}",
        config.horizon(),
        config.parameters.base_year,
        config.scenario
    );

    let diagnostics = config.diagnostics();
    if diagnostics.has_issues() {
        print!("\n{diagnostics}");
    }
    if diagnostics.has_errors() {
        bail!("configuration has {}", diagnostics.summary());
    }
    Ok(())
}
