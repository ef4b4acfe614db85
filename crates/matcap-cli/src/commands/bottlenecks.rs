use anyhow::{Context, Result};
use matcap_algo::{bottleneck, BottleneckReport, CapacityPlanner, PlannerConfig};
use matcap_cli::cli::BottlenecksArgs;
use std::io::{self, Write};
use tabwriter::TabWriter;

use crate::commands::util::{load_input, write_report};

pub fn handle(args: &BottlenecksArgs) -> Result<()> {
    let config = load_input(&args.input, args.scenario)?;
    let solution = CapacityPlanner::new(PlannerConfig {
        max_iterations: args.max_iterations,
        ..PlannerConfig::default()
    })
    .solve(&config)
    .context("solving capacity plan")?;
    let report = bottleneck::analyze(&solution, &config).context("analyzing bottlenecks")?;

    print_report(&report)?;
    write_report(args.out.as_deref(), "bottlenecks", &report)
}

fn print_report(report: &BottleneckReport) -> Result<()> {
    println!("Bottleneck analysis ({})", report.scenario);
    if report.is_clear() {
        println!("No material bottlenecks or reliability issues");
        return Ok(());
    }

    if report.materials.is_empty() {
        println!("No material bottlenecks");
    } else {
        let mut writer = TabWriter::new(io::stdout());
        writeln!(
            writer,
            "MATERIAL\tSEVERITY\tPEAK %\tPEAK YEAR\tCONSTRAINED YEARS\tTECHNOLOGIES"
        )?;
        for m in &report.materials {
            let techs: Vec<&str> = m.affected_technologies.iter().map(|t| t.as_str()).collect();
            writeln!(
                writer,
                "{}\t{}\t{:.1}\t{}\t{}\t{}",
                m.material,
                m.severity,
                m.peak_utilization,
                m.peak_year,
                m.constrained_years.len(),
                techs.join(",")
            )?;
        }
        writer.flush()?;
        for m in &report.materials {
            println!("  {}: {}", m.name, m.impact);
        }
    }

    if !report.reliability.is_empty() {
        println!();
        let mut writer = TabWriter::new(io::stdout());
        writeln!(writer, "YEAR\tZONES\tSHED (MWh)\tRESERVE SHORTFALL (MW)")?;
        for issue in &report.reliability {
            let zones: Vec<&str> = issue.zones.iter().map(|z| z.as_str()).collect();
            writeln!(
                writer,
                "{}\t{}\t{:.1}\t{:.1}",
                issue.year,
                zones.join(","),
                issue.load_shed_mwh,
                issue.reserve_shortfall_mw
            )?;
        }
        writer.flush()?;
    }
    Ok(())
}
