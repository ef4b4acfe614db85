//! # matcap-algo: Capacity Expansion Planning Algorithms
//!
//! The planning engine and the analyses that consume its output.
//!
//! ## Planning
//!
//! [`CapacityPlanner`] fills reserve-margin gaps year by year and zone by
//! zone, checks the plan against material, land and lead-time constraints,
//! rescales offending deployments until the plan is feasible (or the
//! iteration cap is hit), then dispatches each year on representative days
//! and prices the result.
//!
//! The deployment heuristic sits behind [`DeploymentPolicy`];
//! [`GreedyPolicy`] is the default.
//!
//! ## Analysis
//!
//! - [`bottleneck::analyze`]: materials running close to their supply and
//!   years with reliability shortfalls
//! - [`compare::compare`]: one solve per [`matcap_core::Scenario`], run in
//!   parallel, with summary insights
//!
//! ## Example
//!
//! ```
//! use matcap_algo::{bottleneck, solve};
//! use matcap_core::*;
//!
//! let config = ConfigurationBuilder::new(SystemParameters::default())
//!     .product(Product::new("bse", "Battery", TechType::Bse, 350_000.0, 15, 0.9))
//!     .zone(Zone::new("north", "North", 1_000.0).with_unit(ExistingUnit::new(TechType::Ngcc, 900.0)))
//!     .build()?;
//!
//! let solution = solve(&config)?;
//! let report = bottleneck::analyze(&solution, &config)?;
//! assert!(report.materials.is_empty());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod bottleneck;
pub mod compare;
pub mod planner;
pub mod policy;
pub mod state;

pub use bottleneck::{BottleneckReport, BottleneckSeverity, MaterialBottleneck, ReliabilityIssue};
pub use compare::{ScenarioComparator, ScenarioComparison, ScenarioResult};
pub use planner::{
    solve, CancellationToken, CapacityPlanner, Convergence, CostBreakdown, FeasibilityReport,
    InfeasibleSolutionWarning, Metrics, PlannerConfig, Solution, Violation,
};
pub use policy::{DeploymentPolicy, GreedyPolicy, ProposalContext};
pub use state::{DeployedUnit, DispatchYear, UnitId, VariableState, ZoneDispatch};
