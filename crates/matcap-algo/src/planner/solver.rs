//! Greedy capacity expansion with feasibility repair.

use super::accounting::{
    available_capacity, compute_costs, compute_metrics, required_capacity, reserve_violations,
    rps_violations,
};
use super::dispatch::dispatch_year;
use super::feasibility::{apply_rescale, check_feasibility, rescale_factors};
use super::solution::{Convergence, InfeasibleSolutionWarning, Solution};
use crate::policy::{DeploymentPolicy, GreedyPolicy, ProposalContext};
use crate::state::{Deployment, VariableState};
use matcap_core::{Configuration, MatcapError, MatcapResult, Product, Zone};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Planner tunables
#[derive(Debug, Clone)]
pub struct PlannerConfig {
    /// Maximum feasibility check-and-rescale passes
    pub max_iterations: usize,
    /// Numerical tolerance for gaps and constraint checks
    pub tolerance: f64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            max_iterations: 50,
            tolerance: 1e-6,
        }
    }
}

/// Cooperative cancellation flag shared with a running solve.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Iterative heuristic planner.
///
/// # Example
///
/// ```
/// use matcap_algo::{CapacityPlanner, PlannerConfig};
/// use matcap_core::*;
///
/// let config = ConfigurationBuilder::new(SystemParameters::default())
///     .product(Product::new("bse", "Battery", TechType::Bse, 350_000.0, 15, 0.9))
///     .zone(Zone::new("north", "North", 1_000.0).with_unit(ExistingUnit::new(TechType::Ngcc, 900.0)))
///     .build()?;
///
/// let solution = CapacityPlanner::new(PlannerConfig::default()).solve(&config)?;
/// assert!(solution.feasible);
/// println!("{}", solution.summary());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct CapacityPlanner {
    config: PlannerConfig,
    policy: Box<dyn DeploymentPolicy>,
    cancellation: Option<CancellationToken>,
}

impl Default for CapacityPlanner {
    fn default() -> Self {
        Self::new(PlannerConfig::default())
    }
}

impl CapacityPlanner {
    pub fn new(config: PlannerConfig) -> Self {
        Self {
            config,
            policy: Box::new(GreedyPolicy::default()),
            cancellation: None,
        }
    }

    pub fn with_policy(mut self, policy: Box<dyn DeploymentPolicy>) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    fn check_cancelled(&self, completed_years: usize) -> MatcapResult<()> {
        match &self.cancellation {
            Some(token) if token.is_cancelled() => Err(MatcapError::Cancelled { completed_years }),
            _ => Ok(()),
        }
    }

    /// Plan capacity for `config` under its scenario tag.
    ///
    /// Fails only for malformed input or cancellation; an infeasible plan is
    /// returned with `feasible == false` and a warning attached.
    pub fn solve(&self, config: &Configuration) -> MatcapResult<Solution> {
        let start = Instant::now();
        config.validate()?;
        let cfg = config.effective();
        let tolerance = self.config.tolerance;
        let max_iterations = self.config.max_iterations.max(1);

        info!(
            scenario = %cfg.scenario,
            policy = self.policy.id(),
            horizon = cfg.horizon(),
            zones = cfg.zones.len(),
            products = cfg.products.len(),
            "starting capacity expansion solve"
        );

        let mut state = VariableState::new(&cfg);
        self.deploy(&cfg, &mut state)?;

        let mut iterations = 0;
        let report = loop {
            iterations += 1;
            let report = check_feasibility(&cfg, &state, tolerance);
            if report.is_feasible() || iterations >= max_iterations {
                break report;
            }
            self.check_cancelled(state.horizon)?;
            warn!(
                iteration = iterations,
                violations = report.len(),
                "plan infeasible, rescaling"
            );
            let factors = rescale_factors(&cfg, &state, &report);
            apply_rescale(&cfg, &mut state, &factors, tolerance);
        };

        let feasible = report.is_feasible();
        let convergence = match (feasible, iterations < max_iterations) {
            (true, true) => Convergence::Optimal,
            (true, false) => Convergence::Feasible,
            (false, _) => Convergence::Infeasible,
        };

        for year in 0..state.horizon {
            state.dispatch[year] = dispatch_year(&cfg, &state, year);
            state.reserve_violation_mw[year] = reserve_violations(&cfg, &state, year);
            state.rps_violation_mwh[year] = rps_violations(&cfg, &state.dispatch[year]);
        }

        let costs = compute_costs(&cfg, &state);
        let metrics = compute_metrics(&cfg, &state);
        let objective = costs.total;
        let optimality_gap = if objective > 0.0 {
            costs.total_penalty() / objective
        } else {
            0.0
        };

        let warning = if feasible {
            None
        } else {
            let warning = InfeasibleSolutionWarning {
                iterations,
                violations: report.violations,
            };
            warn!(scenario = %cfg.scenario, "{warning}");
            Some(warning)
        };

        let solve_time = start.elapsed();
        info!(
            scenario = %cfg.scenario,
            %convergence,
            iterations,
            units = state.units.len(),
            objective,
            elapsed = ?solve_time,
            "solve complete"
        );

        Ok(Solution {
            scenario: cfg.scenario,
            objective,
            feasible,
            convergence,
            solve_time,
            iterations,
            optimality_gap,
            state,
            costs,
            metrics,
            warning,
        })
    }

    /// Year-by-year, zone-by-zone greedy gap filling.
    fn deploy(&self, cfg: &Configuration, state: &mut VariableState) -> MatcapResult<()> {
        let ranked = self.policy.rank(&cfg.products);
        for year in 0..state.horizon {
            self.check_cancelled(year)?;
            for zone in &cfg.zones {
                self.fill_gap(cfg, state, zone, year, &ranked);
            }
        }
        Ok(())
    }

    fn fill_gap(
        &self,
        cfg: &Configuration,
        state: &mut VariableState,
        zone: &Zone,
        year: usize,
        ranked: &[&Product],
    ) {
        let tolerance = self.config.tolerance;
        let mut gap =
            required_capacity(cfg, zone, year) - available_capacity(cfg, state, zone, year);
        if gap <= tolerance {
            return;
        }

        // Products whose decision year is inside the horizon and that would
        // still be operating in `year`
        let eligible: Vec<(&Product, usize)> = ranked
            .iter()
            .filter_map(|product| {
                let decision = year.checked_sub(product.lead_time_years)?;
                (decision.saturating_add(product.lifetime_years) > year)
                    .then_some((*product, decision))
            })
            .collect();

        for (position, (product, decision)) in eligible.iter().enumerate() {
            if gap <= tolerance {
                break;
            }
            let ctx = ProposalContext {
                zone,
                year,
                remaining_gap_mw: gap,
                position,
                candidates: eligible.len(),
            };
            let mut proposal = self.policy.propose(product, &ctx);
            if let Some(cap) = product.max_annual_build_mw {
                proposal = proposal.min(cap - state.built_product_in_year(&product.id, *decision));
            }
            if let Some(cap) = product.max_total_mw {
                proposal = proposal.min(cap - state.built_product_total(&product.id));
            }
            if proposal <= tolerance {
                continue;
            }

            let requirements = product.materials_per_mw(&cfg.components);
            let supportable = requirements
                .iter()
                .filter(|(_, tonnes_per_mw)| **tonnes_per_mw > 0.0)
                .map(|(material, tonnes_per_mw)| {
                    state.material_headroom(material, *decision) / tonnes_per_mw
                })
                .fold(f64::INFINITY, f64::min);
            if let Some((material, _)) = requirements.iter().find(|(material, tonnes_per_mw)| {
                proposal * **tonnes_per_mw > state.material_headroom(material, *decision) + tolerance
            }) {
                let limited = self
                    .policy
                    .on_material_shortfall(product, proposal, supportable);
                if limited <= tolerance {
                    debug!(
                        zone = %zone.id,
                        year,
                        product = %product.id,
                        %material,
                        "insufficient material, skipping product"
                    );
                    continue;
                }
                debug!(
                    zone = %zone.id,
                    year,
                    product = %product.id,
                    %material,
                    proposed_mw = proposal,
                    capacity_mw = limited,
                    "insufficient material, deploying what the headroom supports"
                );
                proposal = limited.min(supportable);
            }

            let unit = state.commit(
                Deployment {
                    zone: zone.id.clone(),
                    product: product.id.clone(),
                    tech: product.tech,
                    capacity_mw: proposal,
                    decision_year: *decision,
                    online_year: year,
                    end_year: decision.saturating_add(product.lifetime_years),
                },
                cfg,
            );
            debug!(
                unit = unit.value(),
                zone = %zone.id,
                year,
                decision_year = *decision,
                product = %product.id,
                capacity_mw = proposal,
                "deployed"
            );
            gap -= proposal;
        }
    }
}

/// Solve with the default planner and greedy policy.
pub fn solve(config: &Configuration) -> MatcapResult<Solution> {
    CapacityPlanner::default().solve(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use matcap_core::{
        ConfigurationBuilder, ConfigurationError, ExistingUnit, Product, SystemParameters, TechType,
    };

    fn single_zone(peak: f64) -> Configuration {
        ConfigurationBuilder::new(SystemParameters::default())
            .product(Product::new("bse", "Battery", TechType::Bse, 350_000.0, 15, 0.9))
            .zone(Zone::new("north", "North", peak).with_unit(ExistingUnit::new(TechType::Ngcc, 900.0)))
            .build()
            .unwrap()
    }

    #[test]
    fn test_battery_fills_reserve_gap() {
        let solution = solve(&single_zone(1000.0)).unwrap();

        assert_eq!(solution.state.units.len(), 1);
        let unit = &solution.state.units[0];
        assert!((unit.capacity_mw - 250.0).abs() < 1e-6);
        assert_eq!(unit.decision_year, 0);
        assert!(solution.feasible);
        assert_eq!(solution.convergence, Convergence::Optimal);
        assert_eq!(solution.iterations, 1);
        assert!((solution.costs.investment[0] - 87_500_000.0).abs() < 1e-3);
        assert!(solution.costs.investment[1..].iter().all(|c| *c == 0.0));
        assert!(solution.warning.is_none());
    }

    #[test]
    fn test_invalid_configuration_is_rejected() {
        let mut config = single_zone(1000.0);
        config.zones[0].baseline_peak_load_mw = -5.0;
        let err = solve(&config).unwrap_err();
        assert!(matches!(
            err,
            MatcapError::Configuration(ConfigurationError::NegativeValue { .. })
        ));
    }

    #[test]
    fn test_cancelled_solve() {
        let token = CancellationToken::new();
        token.cancel();
        let err = CapacityPlanner::default()
            .with_cancellation(token)
            .solve(&single_zone(1000.0))
            .unwrap_err();
        assert!(matches!(err, MatcapError::Cancelled { completed_years: 0 }));
    }

    #[test]
    fn test_no_gap_means_no_units() {
        let solution = solve(&single_zone(700.0)).unwrap();
        assert!(solution.state.units.is_empty());
        assert_eq!(solution.costs.total_investment(), 0.0);
    }

    struct NothingPolicy;

    impl DeploymentPolicy for NothingPolicy {
        fn id(&self) -> &str {
            "nothing"
        }

        fn rank<'a>(&self, products: &'a [Product]) -> Vec<&'a Product> {
            products.iter().collect()
        }

        fn propose(&self, _product: &Product, _ctx: &ProposalContext<'_>) -> f64 {
            0.0
        }
    }

    #[test]
    fn test_custom_policy_is_used() {
        let solution = CapacityPlanner::default()
            .with_policy(Box::new(NothingPolicy))
            .solve(&single_zone(1000.0))
            .unwrap();
        assert!(solution.state.units.is_empty());
        assert!(solution.costs.total_penalty() > 0.0);
        assert!(solution.optimality_gap > 0.0);
    }

    #[test]
    fn test_huge_lifetime_does_not_overflow() {
        let mut config = single_zone(1000.0);
        config.products[0].lifetime_years = usize::MAX;
        config.parameters.horizon_years = 3;
        let solution = solve(&config).unwrap();

        assert_eq!(solution.state.units.len(), 1);
        let unit = &solution.state.units[0];
        assert_eq!(unit.end_year, usize::MAX);
        assert!((0..3).all(|year| unit.is_operational(year)));
        assert!(solution.feasible);
    }
}
