//! Deployment policies: which products to try first and how much to propose.
//!
//! The planner owns the year/zone loop and all feasibility bookkeeping; a
//! policy only orders the candidates and sizes each proposal.

use matcap_core::{Product, Zone};

/// What a policy sees when sizing one proposal.
#[derive(Debug, Clone, Copy)]
pub struct ProposalContext<'a> {
    pub zone: &'a Zone,
    /// Planning year the capacity must be online in
    pub year: usize,
    /// Capacity still missing in this zone/year (MW)
    pub remaining_gap_mw: f64,
    /// Position of this product among the eligible candidates
    pub position: usize,
    /// Number of eligible candidates for this zone/year
    pub candidates: usize,
}

impl ProposalContext<'_> {
    pub fn is_last_candidate(&self) -> bool {
        self.position + 1 >= self.candidates
    }
}

/// A strategy for filling reserve gaps.
///
/// Implementations must be deterministic: the same inputs give the same
/// ranking and proposals.
pub trait DeploymentPolicy: Send + Sync {
    /// Unique identifier (e.g., "greedy")
    fn id(&self) -> &str;

    /// Order products from most to least preferred.
    fn rank<'a>(&self, products: &'a [Product]) -> Vec<&'a Product>;

    /// Capacity (MW) to propose for `product`; 0 means skip.
    fn propose(&self, product: &Product, ctx: &ProposalContext<'_>) -> f64;

    /// Called when `proposed_mw` needs more material than is left at the
    /// decision year; `supportable_mw` is the most the headroom allows.
    /// Returns the capacity to commit instead, 0 to skip the product.
    fn on_material_shortfall(
        &self,
        _product: &Product,
        _proposed_mw: f64,
        _supportable_mw: f64,
    ) -> f64 {
        0.0
    }
}

/// Storage first, then solar, then everything else by priority score.
///
/// Each candidate proposes a share of the remaining gap capped at one unit
/// size; the last candidate proposes the whole gap (still capped).
///
/// A product whose proposal is short of material is skipped outright. With
/// `material_limited` set it is instead deployed at the largest capacity the
/// material headroom supports, which keeps planned capacity monotone in peak
/// load when materials bind.
#[derive(Debug, Clone)]
pub struct GreedyPolicy {
    pub gap_share: f64,
    pub unit_cap_mw: f64,
    pub material_limited: bool,
}

impl Default for GreedyPolicy {
    fn default() -> Self {
        Self {
            gap_share: 0.30,
            unit_cap_mw: 500.0,
            material_limited: false,
        }
    }
}

impl GreedyPolicy {
    pub fn material_limited() -> Self {
        Self {
            material_limited: true,
            ..Self::default()
        }
    }

    fn class(product: &Product) -> u8 {
        if product.tech.is_storage() {
            0
        } else if product.tech.is_solar() {
            1
        } else {
            2
        }
    }
}

impl DeploymentPolicy for GreedyPolicy {
    fn id(&self) -> &str {
        "greedy"
    }

    fn rank<'a>(&self, products: &'a [Product]) -> Vec<&'a Product> {
        let mut ranked: Vec<&Product> = products.iter().collect();
        // Stable sort keeps input order for ties
        ranked.sort_by(|a, b| {
            let (ca, cb) = (Self::class(a), Self::class(b));
            ca.cmp(&cb).then_with(|| {
                if ca == 2 {
                    b.priority_score().total_cmp(&a.priority_score())
                } else {
                    std::cmp::Ordering::Equal
                }
            })
        });
        ranked
    }

    fn propose(&self, _product: &Product, ctx: &ProposalContext<'_>) -> f64 {
        if ctx.remaining_gap_mw <= 0.0 {
            return 0.0;
        }
        let share = if ctx.is_last_candidate() {
            ctx.remaining_gap_mw
        } else {
            ctx.remaining_gap_mw * self.gap_share
        };
        share.min(self.unit_cap_mw)
    }

    fn on_material_shortfall(
        &self,
        _product: &Product,
        proposed_mw: f64,
        supportable_mw: f64,
    ) -> f64 {
        if self.material_limited {
            supportable_mw.clamp(0.0, proposed_mw)
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use matcap_core::TechType;

    fn products() -> Vec<Product> {
        vec![
            Product::new("ngct", "Peaker", TechType::Ngct, 1_000_000.0, 30, 0.95),
            Product::new("nuc", "Nuclear", TechType::Nuc, 6_000_000.0, 60, 0.95).with_lead_time(6),
            Product::new("spv", "Solar", TechType::Spv, 900_000.0, 30, 0.35),
            Product::new("lbw", "Wind", TechType::Lbw, 1_300_000.0, 25, 0.15),
            Product::new("bse", "Battery", TechType::Bse, 350_000.0, 15, 0.9),
            Product::new("ngct-b", "Peaker B", TechType::Ngct, 1_000_000.0, 30, 0.95),
        ]
    }

    #[test]
    fn test_rank_storage_then_solar_then_score() {
        let products = products();
        let ranked: Vec<&str> = GreedyPolicy::default()
            .rank(&products)
            .iter()
            .map(|p| p.id.as_str())
            .collect();
        assert_eq!(ranked, vec!["bse", "spv", "ngct", "ngct-b", "lbw", "nuc"]);
    }

    #[test]
    fn test_propose_share_and_cap() {
        let zone = Zone::new("z", "Z", 1000.0);
        let product = &products()[0];
        let policy = GreedyPolicy::default();
        let ctx = |gap, position| ProposalContext {
            zone: &zone,
            year: 0,
            remaining_gap_mw: gap,
            position,
            candidates: 3,
        };

        assert!((policy.propose(product, &ctx(100.0, 0)) - 30.0).abs() < 1e-9);
        assert_eq!(policy.propose(product, &ctx(4000.0, 0)), 500.0);
        assert_eq!(policy.propose(product, &ctx(250.0, 2)), 250.0);
        assert_eq!(policy.propose(product, &ctx(900.0, 2)), 500.0);
        assert_eq!(policy.propose(product, &ctx(0.0, 2)), 0.0);
    }

    #[test]
    fn test_material_shortfall() {
        let product = &products()[4];
        assert_eq!(GreedyPolicy::default().on_material_shortfall(product, 69.0, 40.0), 0.0);
        let limited = GreedyPolicy::material_limited();
        assert_eq!(limited.on_material_shortfall(product, 69.0, 40.0), 40.0);
        assert_eq!(limited.on_material_shortfall(product, 69.0, -1.0), 0.0);
    }
}
