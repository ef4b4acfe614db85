//! # matcap-core: Planning Domain Model
//!
//! Data structures describing a material-constrained capacity expansion
//! problem: which raw materials exist and how much of them reaches the energy
//! sector each year, how components and deployable products consume them,
//! and which zones need capacity under which system parameters.
//!
//! ## Structure
//!
//! ```text
//! Material ──< Component ──< Product          (bill of materials)
//!                               │
//! Zone (peak load, CAGR, existing units) ── needs capacity from ──┘
//! ```
//!
//! - [`Configuration`] - aggregate input plus scenario tag, with validation
//! - [`Material`], [`Component`], [`Product`], [`Zone`] - entity tables
//! - [`TechType`] - closed technology enumeration
//! - [`Scenario`] - named demand/supply scenarios
//! - Type-safe IDs: [`MaterialId`], [`ComponentId`], [`ProductId`], [`ZoneId`]
//!
//! ## Quick Start
//!
//! ```rust
//! use matcap_core::*;
//!
//! let config = ConfigurationBuilder::new(SystemParameters::default())
//!     .material(Material::new("lithium", "Lithium", 180_000.0, 0.7))
//!     .component(Component::new("cell", "Li-ion cell").with_material("lithium", 0.0006))
//!     .product(
//!         Product::new("bse-4h", "4h battery", TechType::Bse, 350_000.0, 15, 0.9)
//!             .with_component("cell", 1_000.0),
//!     )
//!     .zone(Zone::new("north", "North", 1_000.0).with_unit(ExistingUnit::new(TechType::Ngcc, 900.0)))
//!     .build()
//!     .expect("valid configuration");
//!
//! assert_eq!(config.products.len(), 1);
//! ```

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod model;
pub mod scenario;
pub mod tech;
pub mod units;

pub use config::{Configuration, ConfigurationBuilder, MarketOverride};
pub use diagnostics::{DiagnosticIssue, Diagnostics, Severity};
pub use error::{ConfigurationError, MatcapError, MatcapResult};
pub use model::{
    Component, ComponentId, ExistingUnit, Interconnector, Material, MaterialId, MaterialPrice,
    Product, ProductId, SystemParameters, Zone, ZoneId,
};
pub use scenario::{Scenario, ScenarioAdjustments};
pub use tech::{RpsCategory, TechType};
pub use units::{MegawattHours, Megawatts, Tonnes, Usd};
