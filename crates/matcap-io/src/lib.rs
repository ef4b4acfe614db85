//! # matcap-io: Configuration Files and Reports
//!
//! - [`load_configuration`] / [`save_configuration`]: planning input as YAML,
//!   JSON or TOML, picked by file extension
//! - [`ConfigurationOverrides`]: partial tables and market data layered over
//!   a base configuration
//! - [`write_json_report`]: pretty JSON output with parent directories created
//! - [`reference_configuration`]: built-in three-zone reference system

pub mod loader;
pub mod overrides;
pub mod reference;
pub mod report;

pub use loader::{configuration_to_string, load_configuration, save_configuration, ConfigFormat};
pub use overrides::{load_market_overrides, load_overrides, ConfigurationOverrides};
pub use reference::reference_configuration;
pub use report::{read_json_report, write_json_report, Report};
