//! Per-share valuation model: the multiplier set derived from the authoritative snapshot
//! and the recomputation of dependent tiles from a single price input.

pub mod derive;
pub mod recompute;

pub use derive::derive_multipliers;
pub use recompute::{parse_price_input, recompute, render_scenario, Scenario, ScenarioTiles};

use crate::snapshot::Snapshot;
use serde::Serialize;

const DEFAULT_SHARES_PER_UNIT_RATIO: f64 = 0.002;
const DEFAULT_MULTIPLIER_BASE: f64 = 1.42;
const DEFAULT_MULTIPLIER_INCLUSION: f64 = 1.71;
const DEFAULT_MULTIPLIER_PREFERRED_BASE: f64 = 1.55;
const DEFAULT_MULTIPLIER_PREFERRED_INCLUSION: f64 = 1.85;

/// Ratios of each target valuation to the per-share base quantity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MultiplierSet {
    pub base: f64,
    pub inclusion: f64,
    pub preferred_base: f64,
    pub preferred_inclusion: f64,
}

/// Fallback constants used until (or unless) a snapshot supplies real values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValuationDefaults {
    pub shares_per_unit_ratio: f64,
    pub multipliers: MultiplierSet,
}

impl Default for ValuationDefaults {
    fn default() -> Self {
        Self {
            shares_per_unit_ratio: DEFAULT_SHARES_PER_UNIT_RATIO,
            multipliers: MultiplierSet {
                base: DEFAULT_MULTIPLIER_BASE,
                inclusion: DEFAULT_MULTIPLIER_INCLUSION,
                preferred_base: DEFAULT_MULTIPLIER_PREFERRED_BASE,
                preferred_inclusion: DEFAULT_MULTIPLIER_PREFERRED_INCLUSION,
            },
        }
    }
}

impl ValuationDefaults {
    pub fn from_env() -> Self {
        let mut out = Self::default();

        override_positive(&mut out.shares_per_unit_ratio, "SHARES_PER_UNIT_RATIO");
        override_positive(&mut out.multipliers.base, "DEFAULT_MULTIPLIER_BASE");
        override_positive(&mut out.multipliers.inclusion, "DEFAULT_MULTIPLIER_INCLUSION");
        override_positive(
            &mut out.multipliers.preferred_base,
            "DEFAULT_MULTIPLIER_PREFERRED_BASE",
        );
        override_positive(
            &mut out.multipliers.preferred_inclusion,
            "DEFAULT_MULTIPLIER_PREFERRED_INCLUSION",
        );

        out
    }
}

fn override_positive(slot: &mut f64, var: &str) {
    let Ok(s) = std::env::var(var) else {
        return;
    };
    match s.trim().parse::<f64>() {
        Ok(n) if n.is_finite() && n > 0.0 => *slot = n,
        _ => tracing::warn!(var, value = %s, "ignoring invalid valuation default"),
    }
}

/// The value object every recomputation reads. Only [`ValuationModel::absorb`] changes it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ValuationModel {
    pub shares_per_unit_ratio: f64,
    pub multipliers: MultiplierSet,
}

impl ValuationModel {
    pub fn new(defaults: ValuationDefaults) -> Self {
        Self {
            shares_per_unit_ratio: defaults.shares_per_unit_ratio,
            multipliers: defaults.multipliers,
        }
    }

    /// Adopts the snapshot's share ratio (when usable) and re-derives the multipliers.
    pub fn absorb(&mut self, snapshot: &Snapshot) {
        if let Some(ratio) = snapshot
            .shares_per_unit_ratio
            .filter(|r| r.is_finite() && *r > 0.0)
        {
            self.shares_per_unit_ratio = ratio;
        }
        self.multipliers = derive_multipliers(self.multipliers, snapshot);
        tracing::debug!(
            shares_per_unit_ratio = self.shares_per_unit_ratio,
            multipliers = ?self.multipliers,
            "valuation model updated"
        );
    }
}

impl Default for ValuationModel {
    fn default() -> Self {
        Self::new(ValuationDefaults::default())
    }
}
