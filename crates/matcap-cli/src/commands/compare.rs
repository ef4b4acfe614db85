use anyhow::{Context, Result};
use matcap_algo::{PlannerConfig, ScenarioComparator, ScenarioComparison};
use matcap_cli::cli::CompareArgs;
use matcap_core::Scenario;
use std::io::{self, Write};
use tabwriter::TabWriter;

use crate::commands::util::{format_millions, load_input, parse_threads, write_report};

pub fn handle(args: &CompareArgs) -> Result<()> {
    let threads = parse_threads(&args.threads)?;
    let scenarios: Vec<Scenario> = if args.scenarios.is_empty() {
        Scenario::ALL.to_vec()
    } else {
        args.scenarios.clone()
    };
    let config = load_input(&args.input, None)?;

    let comparison = ScenarioComparator::new()
        .with_threads(threads)
        .with_planner_config(PlannerConfig {
            max_iterations: args.max_iterations,
            ..PlannerConfig::default()
        })
        .compare(&scenarios, &config)
        .context("comparing scenarios")?;

    print_comparison(&comparison)?;
    write_report(args.out.as_deref(), "comparison", &comparison)
}

fn print_comparison(comparison: &ScenarioComparison) -> Result<()> {
    let mut writer = TabWriter::new(io::stdout());
    writeln!(
        writer,
        "SCENARIO\tSTATUS\tOBJECTIVE ($M)\tINVEST ($M)\tOPER ($M)\tPENALTY ($M)\tSHED (MWh)\tCONSTRAINED YEARS"
    )?;
    for r in &comparison.results {
        writeln!(
            writer,
            "{}\t{}\t{}\t{}\t{}\t{}\t{:.1}\t{}",
            r.scenario,
            r.convergence,
            format_millions(r.objective),
            format_millions(r.total_investment),
            format_millions(r.total_operational),
            format_millions(r.total_penalty),
            r.total_load_shed_mwh,
            r.material_constrained_years
        )?;
    }
    writer.flush()?;

    if !comparison.insights.is_empty() {
        println!("\nInsights:");
        for insight in &comparison.insights {
            println!("  - {insight}");
        }
    }
    Ok(())
}
