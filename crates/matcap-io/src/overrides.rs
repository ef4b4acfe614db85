//! Partial tables layered over a base configuration.
//!
//! Entities in an override file replace base entities with the same id and
//! are appended otherwise. Market overrides (supply, price, disruption) are
//! applied last.

use crate::loader::read_document;
use anyhow::{Context, Result};
use matcap_core::{
    Component, Configuration, Interconnector, MarketOverride, Material, Product, Scenario,
    SystemParameters, Zone,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigurationOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenario: Option<Scenario>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<SystemParameters>,
    #[serde(default)]
    pub materials: Vec<Material>,
    #[serde(default)]
    pub components: Vec<Component>,
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub zones: Vec<Zone>,
    /// Replaces the whole interconnector list when non-empty
    #[serde(default)]
    pub interconnectors: Vec<Interconnector>,
    #[serde(default)]
    pub market: Vec<MarketOverride>,
}

fn merge_by_id<T, K: PartialEq>(base: &mut Vec<T>, overrides: Vec<T>, key: impl Fn(&T) -> &K) {
    for item in overrides {
        match base.iter_mut().find(|existing| key(existing) == key(&item)) {
            Some(existing) => *existing = item,
            None => base.push(item),
        }
    }
}

impl ConfigurationOverrides {
    pub fn is_empty(&self) -> bool {
        self.scenario.is_none()
            && self.parameters.is_none()
            && self.materials.is_empty()
            && self.components.is_empty()
            && self.products.is_empty()
            && self.zones.is_empty()
            && self.interconnectors.is_empty()
            && self.market.is_empty()
    }

    /// Layer these overrides over `base`.
    pub fn apply(self, base: &mut Configuration) -> Result<()> {
        if let Some(scenario) = self.scenario {
            base.scenario = scenario;
        }
        if let Some(parameters) = self.parameters {
            base.parameters = parameters;
        }
        merge_by_id(&mut base.materials, self.materials, |m| &m.id);
        merge_by_id(&mut base.components, self.components, |c| &c.id);
        merge_by_id(&mut base.products, self.products, |p| &p.id);
        merge_by_id(&mut base.zones, self.zones, |z| &z.id);
        if !self.interconnectors.is_empty() {
            base.interconnectors = self.interconnectors;
        }
        base.apply_market_overrides(&self.market)
            .context("applying market overrides")?;
        Ok(())
    }
}

pub fn load_overrides(path: &Path) -> Result<ConfigurationOverrides> {
    read_document(path, "configuration overrides")
}

/// Load a bare list of market overrides.
pub fn load_market_overrides(path: &Path) -> Result<Vec<MarketOverride>> {
    read_document(path, "market overrides")
}
