//! Planner output data structures.

use super::feasibility::Violation;
use crate::state::VariableState;
use matcap_core::units::{MegawattHours, Megawatts, Usd};
use matcap_core::{MaterialId, Scenario, TechType, ZoneId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// How the solve terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Convergence {
    /// Feasible before the iteration cap
    Optimal,
    /// Feasible on the final permitted iteration
    Feasible,
    Infeasible,
    /// Reserved for exact solvers; the heuristic never reports it
    Unbounded,
}

impl Convergence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Convergence::Optimal => "optimal",
            Convergence::Feasible => "feasible",
            Convergence::Infeasible => "infeasible",
            Convergence::Unbounded => "unbounded",
        }
    }
}

impl fmt::Display for Convergence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Costs per planning year ($).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub investment: Vec<f64>,
    pub operational: Vec<f64>,
    pub penalty: Vec<f64>,
    pub total: f64,
}

impl CostBreakdown {
    pub fn total_investment(&self) -> f64 {
        self.investment.iter().sum()
    }

    pub fn total_operational(&self) -> f64 {
        self.operational.iter().sum()
    }

    pub fn total_penalty(&self) -> f64 {
        self.penalty.iter().sum()
    }

    pub fn year_total(&self, year: usize) -> f64 {
        [&self.investment, &self.operational, &self.penalty]
            .iter()
            .filter_map(|series| series.get(year))
            .sum()
    }

    /// Present value of the yearly totals, year 0 undiscounted.
    pub fn net_present_value(&self, rate: f64) -> f64 {
        (0..self.investment.len())
            .map(|year| self.year_total(year) / (1.0 + rate).powi(year as i32))
            .sum()
    }
}

/// Derived indicators, one entry per planning year.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    /// Existing (net of retirements) plus operational new capacity (MW)
    pub capacity_by_year: Vec<BTreeMap<TechType, f64>>,
    /// Utilization / sector supply × 100
    pub material_utilization_rate: BTreeMap<MaterialId, Vec<f64>>,
    /// Land used / land limit × 100, zones with a limit only
    pub land_utilization_rate: BTreeMap<ZoneId, Vec<f64>>,
    /// Worst zone's credited / required capacity × 100, capped at 100
    pub reserve_margin_satisfaction: Vec<f64>,
    /// Worst category's share / target × 100, capped at 100
    pub rps_compliance: Vec<f64>,
    pub load_shed_mwh: Vec<f64>,
}

impl Metrics {
    pub fn total_load_shed_mwh(&self) -> f64 {
        self.load_shed_mwh.iter().sum()
    }

    pub fn final_year_mix(&self) -> BTreeMap<TechType, f64> {
        self.capacity_by_year.last().cloned().unwrap_or_default()
    }

    /// Years in which any material runs above `threshold` percent.
    pub fn material_constrained_years(&self, threshold: f64) -> usize {
        let years = self
            .material_utilization_rate
            .values()
            .map(Vec::len)
            .max()
            .unwrap_or(0);
        (0..years)
            .filter(|&year| {
                self.material_utilization_rate
                    .values()
                    .any(|series| series.get(year).is_some_and(|rate| *rate > threshold))
            })
            .count()
    }
}

/// Attached to a solution whose constraints could not all be satisfied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfeasibleSolutionWarning {
    pub iterations: usize,
    pub violations: Vec<Violation>,
}

impl fmt::Display for InfeasibleSolutionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} constraint violation(s) remain after {} iteration(s)",
            self.violations.len(),
            self.iterations
        )?;
        for violation in self.violations.iter().take(5) {
            write!(f, "\n  - {violation}")?;
        }
        if self.violations.len() > 5 {
            write!(f, "\n  ... and {} more", self.violations.len() - 5)?;
        }
        Ok(())
    }
}

/// Complete result of one planning solve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    pub scenario: Scenario,
    /// Sum of investment, operational and penalty cost ($)
    pub objective: f64,
    pub feasible: bool,
    pub convergence: Convergence,
    pub solve_time: Duration,
    /// Feasibility checks performed
    pub iterations: usize,
    /// Penalty share of the objective
    pub optimality_gap: f64,
    pub state: VariableState,
    pub costs: CostBreakdown,
    pub metrics: Metrics,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<InfeasibleSolutionWarning>,
}

impl Solution {
    pub fn horizon(&self) -> usize {
        self.state.horizon
    }

    /// Total new capacity committed over the plan (MW).
    pub fn total_planned_mw(&self) -> f64 {
        self.state.units.iter().map(|u| u.capacity_mw).sum()
    }

    /// Format a human-readable summary
    pub fn summary(&self) -> String {
        let mut s = String::new();
        s.push_str(&format!("Capacity Plan Summary\n{}\n", "=".repeat(40)));
        s.push_str(&format!("Scenario: {}\n", self.scenario));
        s.push_str(&format!(
            "Status: {} ({} iteration(s))\n",
            self.convergence, self.iterations
        ));
        s.push_str(&format!("Objective: {}\n", Usd(self.objective)));
        s.push_str(&format!(
            "  Investment: {}\n",
            Usd(self.costs.total_investment())
        ));
        s.push_str(&format!(
            "  Operational: {}\n",
            Usd(self.costs.total_operational())
        ));
        s.push_str(&format!("  Penalty: {}\n", Usd(self.costs.total_penalty())));
        s.push_str(&format!(
            "Units Deployed: {} ({})\n",
            self.state.units.len(),
            Megawatts(self.total_planned_mw())
        ));
        s.push_str(&format!(
            "Load Shed: {}\n",
            MegawattHours(self.metrics.total_load_shed_mwh())
        ));
        s.push_str(&format!("Optimality Gap: {:.4}%\n", self.optimality_gap * 100.0));
        s.push_str(&format!("Solve Time: {:.2?}\n", self.solve_time));
        if let Some(warning) = &self.warning {
            s.push_str(&format!("\nWarning: {warning}\n"));
        }
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cost_breakdown_totals_and_npv() {
        let costs = CostBreakdown {
            investment: vec![100.0, 0.0],
            operational: vec![10.0, 10.0],
            penalty: vec![0.0, 100.0],
            total: 220.0,
        };
        assert_eq!(costs.total_investment(), 100.0);
        assert_eq!(costs.year_total(1), 110.0);
        assert_eq!(costs.net_present_value(0.0), 220.0);
        assert!((costs.net_present_value(0.1) - 210.0).abs() < 1e-9);
    }

    #[test]
    fn test_material_constrained_years() {
        let mut metrics = Metrics::default();
        metrics
            .material_utilization_rate
            .insert(MaterialId::from("a"), vec![90.0, 10.0, 10.0]);
        metrics
            .material_utilization_rate
            .insert(MaterialId::from("b"), vec![95.0, 10.0, 86.0]);
        assert_eq!(metrics.material_constrained_years(85.0), 2);
    }

    #[test]
    fn test_summary_mentions_warning() {
        let solution = Solution {
            scenario: Scenario::Baseline,
            objective: 1.0,
            feasible: false,
            convergence: Convergence::Infeasible,
            solve_time: Duration::from_millis(3),
            iterations: 50,
            optimality_gap: 0.0,
            state: VariableState::default(),
            costs: CostBreakdown::default(),
            metrics: Metrics::default(),
            warning: Some(InfeasibleSolutionWarning {
                iterations: 50,
                violations: vec![],
            }),
        };
        let summary = solution.summary();
        assert!(summary.contains("Status: infeasible"));
        assert!(summary.contains("Warning: 0 constraint violation(s)"));
    }
}
