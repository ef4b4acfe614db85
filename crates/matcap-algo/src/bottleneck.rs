//! Post-solve material bottleneck and reliability analysis.
//!
//! A material is *constrained* in any year its utilization exceeds 85% of
//! the sector supply. Severity is graded on the peak year:
//!
//! | peak utilization | severity |
//! |------------------|----------|
//! | > 95%            | critical |
//! | > 85%            | high     |
//! | > 70%            | medium   |
//! | otherwise        | low      |
//!
//! Every tracked material gets an entry; a report is clear when nothing is
//! graded medium or worse and no year has a reliability issue.

use crate::planner::Solution;
use matcap_core::{Configuration, MatcapError, MatcapResult, MaterialId, Scenario, TechType, ZoneId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Utilization (%) above which a material-year counts as constrained
pub const CONSTRAINED_THRESHOLD: f64 = 85.0;

const EPS: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BottleneckSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl BottleneckSeverity {
    pub fn from_peak(peak_utilization: f64) -> Self {
        if peak_utilization > 95.0 {
            BottleneckSeverity::Critical
        } else if peak_utilization > 85.0 {
            BottleneckSeverity::High
        } else if peak_utilization > 70.0 {
            BottleneckSeverity::Medium
        } else {
            BottleneckSeverity::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BottleneckSeverity::Low => "low",
            BottleneckSeverity::Medium => "medium",
            BottleneckSeverity::High => "high",
            BottleneckSeverity::Critical => "critical",
        }
    }
}

impl fmt::Display for BottleneckSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialBottleneck {
    pub material: MaterialId,
    pub name: String,
    pub severity: BottleneckSeverity,
    /// Highest utilization rate over the horizon (%)
    pub peak_utilization: f64,
    pub peak_year: usize,
    /// Years above [`CONSTRAINED_THRESHOLD`]
    pub constrained_years: Vec<usize>,
    /// Technologies whose products consume this material
    pub affected_technologies: Vec<TechType>,
    pub impact: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReliabilityIssue {
    pub year: usize,
    pub zones: Vec<ZoneId>,
    pub load_shed_mwh: f64,
    pub reserve_shortfall_mw: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BottleneckReport {
    pub scenario: Scenario,
    /// Sorted by severity, then peak utilization, highest first
    pub materials: Vec<MaterialBottleneck>,
    pub reliability: Vec<ReliabilityIssue>,
}

impl BottleneckReport {
    pub fn is_clear(&self) -> bool {
        self.count_at_least(BottleneckSeverity::Medium) == 0 && self.reliability.is_empty()
    }

    pub fn count_at_least(&self, severity: BottleneckSeverity) -> usize {
        self.materials
            .iter()
            .filter(|m| m.severity >= severity)
            .count()
    }
}

fn impact_line(
    severity: BottleneckSeverity,
    peak: f64,
    peak_year: usize,
    constrained: usize,
    techs: &[TechType],
) -> String {
    let techs = if techs.is_empty() {
        "no deployable product".to_string()
    } else {
        techs
            .iter()
            .map(TechType::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    };
    format!(
        "{severity}: peaks at {peak:.1}% of sector supply in year {peak_year}, \
         constrained in {constrained} year(s); limits {techs}"
    )
}

fn check_preconditions(solution: &Solution, config: &Configuration) -> MatcapResult<()> {
    let horizon = solution.horizon();
    if horizon == 0 {
        return Err(MatcapError::AnalysisPrecondition(
            "solution has no planning years; run a solve first".into(),
        ));
    }
    if horizon != config.horizon() {
        return Err(MatcapError::AnalysisPrecondition(format!(
            "solution horizon {horizon} does not match configuration horizon {}",
            config.horizon()
        )));
    }
    if solution.metrics.load_shed_mwh.len() != horizon {
        return Err(MatcapError::AnalysisPrecondition(
            "solution metrics are incomplete".into(),
        ));
    }
    for material in solution.metrics.material_utilization_rate.keys() {
        if config.material(material).is_none() {
            return Err(MatcapError::AnalysisPrecondition(format!(
                "solution references material '{material}' unknown to the configuration"
            )));
        }
    }
    Ok(())
}

/// Scan a completed solve for material bottlenecks and reliability issues.
pub fn analyze(solution: &Solution, config: &Configuration) -> MatcapResult<BottleneckReport> {
    check_preconditions(solution, config)?;

    let mut materials = Vec::new();
    for (material_id, rates) in &solution.metrics.material_utilization_rate {
        let Some(material) = config.material(material_id) else {
            continue;
        };
        let (peak_year, peak) = rates
            .iter()
            .copied()
            .enumerate()
            .fold((0, f64::NEG_INFINITY), |best, (year, rate)| {
                if rate > best.1 {
                    (year, rate)
                } else {
                    best
                }
            });
        let peak = peak.max(0.0);
        let constrained_years: Vec<usize> = rates
            .iter()
            .enumerate()
            .filter(|(_, rate)| **rate > CONSTRAINED_THRESHOLD)
            .map(|(year, _)| year)
            .collect();
        let severity = BottleneckSeverity::from_peak(peak);

        let affected: BTreeSet<TechType> = config
            .products
            .iter()
            .filter(|p| p.uses_material(material_id, &config.components))
            .map(|p| p.tech)
            .collect();
        let affected_technologies: Vec<TechType> = affected.into_iter().collect();
        let impact = impact_line(
            severity,
            peak,
            peak_year,
            constrained_years.len(),
            &affected_technologies,
        );

        materials.push(MaterialBottleneck {
            material: material_id.clone(),
            name: material.name.clone(),
            severity,
            peak_utilization: peak,
            peak_year,
            constrained_years,
            affected_technologies,
            impact,
        });
    }
    materials.sort_by(|a, b| {
        b.severity
            .cmp(&a.severity)
            .then_with(|| b.peak_utilization.total_cmp(&a.peak_utilization))
            .then_with(|| a.material.cmp(&b.material))
    });

    let mut reliability = Vec::new();
    for year in 0..solution.horizon() {
        let state = &solution.state;
        let mut zones: BTreeSet<ZoneId> = BTreeSet::new();
        let mut load_shed = 0.0;
        if let Some(dispatch) = state.dispatch.get(year) {
            for (zone, result) in &dispatch.zones {
                let shed = result.load_shed_mwh();
                if shed > EPS {
                    zones.insert(zone.clone());
                    load_shed += shed;
                }
            }
        }
        let mut shortfall = 0.0;
        if let Some(violations) = state.reserve_violation_mw.get(year) {
            for (zone, mw) in violations {
                if *mw > EPS {
                    zones.insert(zone.clone());
                    shortfall += mw;
                }
            }
        }
        if !zones.is_empty() {
            reliability.push(ReliabilityIssue {
                year,
                zones: zones.into_iter().collect(),
                load_shed_mwh: load_shed,
                reserve_shortfall_mw: shortfall,
            });
        }
    }

    Ok(BottleneckReport {
        scenario: solution.scenario,
        materials,
        reliability,
    })
}
