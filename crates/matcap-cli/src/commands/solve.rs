//! `matcap solve`: plan one scenario and print the deployment schedule.

use anyhow::{Context, Result};
use matcap_algo::{CapacityPlanner, PlannerConfig, Solution};
use matcap_cli::cli::SolveArgs;
use std::io::{self, Write};
use tabwriter::TabWriter;
use tracing::warn;

use crate::commands::util::{load_input, write_report};

pub fn handle(args: &SolveArgs) -> Result<()> {
    let config = load_input(&args.input, args.scenario)?;
    let planner = CapacityPlanner::new(PlannerConfig {
        max_iterations: args.max_iterations,
        ..PlannerConfig::default()
    });
    let solution = planner.solve(&config).context("solving capacity plan")?;
    if let Some(warning) = &solution.warning {
        warn!("plan is infeasible: {warning}");
    }

    println!("{}", solution.summary());
    print_units(&solution)?;
    print_yearly(&solution)?;
    write_report(args.out.as_deref(), "solution", &solution)
}

fn print_units(solution: &Solution) -> Result<()> {
    if solution.state.units.is_empty() {
        println!("No new capacity deployed");
        return Ok(());
    }
    let mut writer = TabWriter::new(io::stdout());
    writeln!(writer, "UNIT\tZONE\tPRODUCT\tTECH\tMW\tDECIDED\tONLINE\tEND")?;
    for unit in &solution.state.units {
        writeln!(
            writer,
            "{}\t{}\t{}\t{}\t{:.1}\t{}\t{}\t{}",
            unit.id.value(),
            unit.zone,
            unit.product,
            unit.tech,
            unit.capacity_mw,
            unit.decision_year,
            unit.online_year,
            unit.end_year
        )?;
    }
    writer.flush()?;
    Ok(())
}

fn print_yearly(solution: &Solution) -> Result<()> {
    let metrics = &solution.metrics;
    let costs = &solution.costs;
    println!();
    let mut writer = TabWriter::new(io::stdout());
    writeln!(
        writer,
        "YEAR\tINVEST ($M)\tOPER ($M)\tPENALTY ($M)\tRESERVE %\tRPS %\tSHED (MWh)"
    )?;
    for year in 0..solution.horizon() {
        let value = |series: &[f64]| series.get(year).copied().unwrap_or(0.0);
        writeln!(
            writer,
            "{}\t{:.1}\t{:.1}\t{:.1}\t{:.1}\t{:.1}\t{:.1}",
            year,
            value(&costs.investment) / 1e6,
            value(&costs.operational) / 1e6,
            value(&costs.penalty) / 1e6,
            value(&metrics.reserve_margin_satisfaction),
            value(&metrics.rps_compliance),
            value(&metrics.load_shed_mwh)
        )?;
    }
    writer.flush()?;
    Ok(())
}
