//! Material-constrained capacity expansion planning
//!
//! This module implements the deterministic heuristic that decides how much
//! capacity of which product to build in each zone and year.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CAPACITY EXPANSION PLANNING                                             │
//! │  ───────────────────────────                                             │
//! │                                                                          │
//! │  for year, for zone:                                                     │
//! │    gap = peak(y) × (1 + reserve margin) − (existing + operational new)   │
//! │    for product in policy.rank():                                         │
//! │      d = y − lead time; propose; check material headroom at d; commit    │
//! │                                                                          │
//! │  repeat ≤ max_iterations:                                                │
//! │    check materials, land, lead times → rescale offending units           │
//! │                                                                          │
//! │  per year: dispatch 4 representative days → reserve/RPS violations       │
//! │            → investment, operational and penalty cost → metrics          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The objective is the sum of all yearly costs; penalty cost prices load
//! shedding at VOLL and reserve/RPS shortfalls at their configured rates.

pub mod accounting;
pub mod dispatch;
pub mod feasibility;
mod solution;
mod solver;

pub use feasibility::{FeasibilityReport, Violation};
pub use solution::{CostBreakdown, Convergence, InfeasibleSolutionWarning, Metrics, Solution};
pub use solver::{solve, CancellationToken, CapacityPlanner, PlannerConfig};
