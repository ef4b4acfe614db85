//! Multi-scenario comparison.
//!
//! Each scenario is an independent solve of the base configuration with a
//! different scenario tag. Solves share nothing mutable, so they fan out
//! across a dedicated rayon pool; results come back in input order.

use crate::bottleneck::CONSTRAINED_THRESHOLD;
use crate::planner::{CancellationToken, CapacityPlanner, Convergence, PlannerConfig, Solution};
use matcap_core::{Configuration, MatcapError, MatcapResult, Scenario, TechType};
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

/// Headline figures for one scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario: Scenario,
    pub objective: f64,
    pub total_investment: f64,
    pub total_operational: f64,
    pub total_penalty: f64,
    pub total_load_shed_mwh: f64,
    /// Capacity by technology in the last planning year (MW)
    pub final_year_mix: BTreeMap<TechType, f64>,
    /// Years in which any material runs above the constrained threshold
    pub material_constrained_years: usize,
    pub feasible: bool,
    pub convergence: Convergence,
}

impl ScenarioResult {
    pub fn from_solution(solution: &Solution) -> Self {
        Self {
            scenario: solution.scenario,
            objective: solution.objective,
            total_investment: solution.costs.total_investment(),
            total_operational: solution.costs.total_operational(),
            total_penalty: solution.costs.total_penalty(),
            total_load_shed_mwh: solution.metrics.total_load_shed_mwh(),
            final_year_mix: solution.metrics.final_year_mix(),
            material_constrained_years: solution
                .metrics
                .material_constrained_years(CONSTRAINED_THRESHOLD),
            feasible: solution.feasible,
            convergence: solution.convergence,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioComparison {
    /// One entry per requested scenario, in request order
    pub results: Vec<ScenarioResult>,
    pub insights: Vec<String>,
}

impl ScenarioComparison {
    pub fn result(&self, scenario: Scenario) -> Option<&ScenarioResult> {
        self.results.iter().find(|r| r.scenario == scenario)
    }
}

/// Runs one solve per scenario on a rayon pool.
#[derive(Debug, Clone, Default)]
pub struct ScenarioComparator {
    /// Worker threads; 0 means one per CPU
    pub threads: usize,
    pub planner: PlannerConfig,
    pub cancellation: Option<CancellationToken>,
}

impl ScenarioComparator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    pub fn with_planner_config(mut self, planner: PlannerConfig) -> Self {
        self.planner = planner;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    fn planner(&self) -> CapacityPlanner {
        let planner = CapacityPlanner::new(self.planner.clone());
        match &self.cancellation {
            Some(token) => planner.with_cancellation(token.clone()),
            None => planner,
        }
    }

    /// Solve `base` once per scenario.
    pub fn solve_all(
        &self,
        scenarios: &[Scenario],
        base: &Configuration,
    ) -> MatcapResult<Vec<Solution>> {
        if scenarios.is_empty() {
            return Err(MatcapError::AnalysisPrecondition(
                "no scenarios to compare".into(),
            ));
        }
        base.validate()?;

        let thread_count = if self.threads == 0 {
            num_cpus::get()
        } else {
            self.threads
        };
        let pool = ThreadPoolBuilder::new()
            .num_threads(thread_count.min(scenarios.len()).max(1))
            .build()
            .map_err(|e| MatcapError::Other(format!("building rayon thread pool: {e}")))?;

        info!(
            scenarios = scenarios.len(),
            threads = thread_count,
            "comparing scenarios"
        );

        let results: Vec<MatcapResult<Solution>> = pool.install(|| {
            scenarios
                .par_iter()
                .map(|scenario| self.planner().solve(&base.with_scenario(*scenario)))
                .collect()
        });
        results.into_iter().collect()
    }

    pub fn compare(
        &self,
        scenarios: &[Scenario],
        base: &Configuration,
    ) -> MatcapResult<ScenarioComparison> {
        let solutions = self.solve_all(scenarios, base)?;
        Ok(summarize(&solutions))
    }
}

/// Compare `scenarios` with default settings.
pub fn compare(scenarios: &[Scenario], base: &Configuration) -> MatcapResult<ScenarioComparison> {
    ScenarioComparator::new().compare(scenarios, base)
}

/// Build the comparison table and insights from finished solves.
pub fn summarize(solutions: &[Solution]) -> ScenarioComparison {
    let results: Vec<ScenarioResult> = solutions.iter().map(ScenarioResult::from_solution).collect();
    let insights = insights(&results);
    ScenarioComparison { results, insights }
}

fn millions(usd: f64) -> String {
    format!("${:.1}M", usd / 1_000_000.0)
}

fn range_insight(
    results: &[ScenarioResult],
    label: &str,
    value: impl Fn(&ScenarioResult) -> f64,
    format: impl Fn(f64) -> String,
) -> Option<String> {
    let low = results
        .iter()
        .reduce(|best, r| if value(r) < value(best) { r } else { best })?;
    let high = results
        .iter()
        .reduce(|best, r| if value(r) > value(best) { r } else { best })?;
    Some(format!(
        "{label} ranges from {} ({}) to {} ({})",
        format(value(low)),
        low.scenario,
        format(value(high)),
        high.scenario
    ))
}

fn insights(results: &[ScenarioResult]) -> Vec<String> {
    let mut out = Vec::new();
    out.extend(range_insight(
        results,
        "Investment",
        |r| r.total_investment,
        millions,
    ));
    out.extend(range_insight(
        results,
        "Penalty cost",
        |r| r.total_penalty,
        millions,
    ));
    out.extend(range_insight(
        results,
        "Load shedding",
        |r| r.total_load_shed_mwh,
        |mwh| format!("{mwh:.0} MWh"),
    ));
    if let Some(worst) = results.iter().reduce(|best, r| {
        if r.material_constrained_years > best.material_constrained_years {
            r
        } else {
            best
        }
    }) {
        if worst.material_constrained_years > 0 {
            out.push(format!(
                "{} is the most material-constrained scenario ({} constrained year(s))",
                worst.scenario, worst.material_constrained_years
            ));
        } else {
            out.push("No scenario runs any material above 85% of supply".to_string());
        }
    }
    let infeasible: Vec<&str> = results
        .iter()
        .filter(|r| !r.feasible)
        .map(|r| r.scenario.as_str())
        .collect();
    if !infeasible.is_empty() {
        out.push(format!("Infeasible scenarios: {}", infeasible.join(", ")));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use matcap_core::{ConfigurationBuilder, ExistingUnit, Product, SystemParameters, Zone};

    fn config() -> Configuration {
        ConfigurationBuilder::new(SystemParameters {
            horizon_years: 4,
            ..SystemParameters::default()
        })
        .product(Product::new("bse", "Battery", TechType::Bse, 350_000.0, 15, 0.9))
        .zone(Zone::new("z", "Z", 1000.0).with_unit(ExistingUnit::new(TechType::Ngcc, 900.0)))
        .build()
        .unwrap()
    }

    #[test]
    fn test_empty_scenario_list() {
        assert!(matches!(
            compare(&[], &config()),
            Err(MatcapError::AnalysisPrecondition(_))
        ));
    }

    #[test]
    fn test_results_follow_request_order() {
        let scenarios = [Scenario::HighDemand, Scenario::Baseline, Scenario::LowDemand];
        let comparison = ScenarioComparator::new()
            .with_threads(2)
            .compare(&scenarios, &config())
            .unwrap();

        let order: Vec<Scenario> = comparison.results.iter().map(|r| r.scenario).collect();
        assert_eq!(order, scenarios);
        let high = comparison.result(Scenario::HighDemand).unwrap();
        let low = comparison.result(Scenario::LowDemand).unwrap();
        assert!(high.total_investment > low.total_investment);
        assert!(comparison.insights[0].starts_with("Investment ranges from"));
        assert!(comparison.insights[0].contains("(high_demand)"));
    }

    #[test]
    fn test_cancelled_comparison() {
        let token = CancellationToken::new();
        token.cancel();
        let err = ScenarioComparator::new()
            .with_cancellation(token)
            .compare(&[Scenario::Baseline], &config())
            .unwrap_err();
        assert!(matches!(err, MatcapError::Cancelled { .. }));
    }
}
