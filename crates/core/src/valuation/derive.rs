use super::MultiplierSet;
use crate::snapshot::Snapshot;

/// Derives the multiplier set from `snapshot`, starting from `prior`.
///
/// base_quantity = asset_a_price * shares_per_unit_ratio. When either operand is missing or
/// the product is not a positive finite number, `prior` is returned untouched. Otherwise each
/// valuation present in the snapshot replaces its multiplier; absent ones keep the prior value.
pub fn derive_multipliers(prior: MultiplierSet, snapshot: &Snapshot) -> MultiplierSet {
    let (Some(price), Some(ratio)) = (snapshot.asset_a_price, snapshot.shares_per_unit_ratio)
    else {
        return prior;
    };

    let base_quantity = price * ratio;
    if !(base_quantity.is_finite() && base_quantity > 0.0) {
        tracing::debug!(base_quantity, "multipliers kept; base quantity unusable");
        return prior;
    }

    let ratio_of = |valuation: Option<f64>, previous: f64| {
        valuation
            .map(|v| v / base_quantity)
            .filter(|m| m.is_finite())
            .unwrap_or(previous)
    };

    MultiplierSet {
        base: ratio_of(snapshot.base_valuation, prior.base),
        inclusion: ratio_of(snapshot.inclusion_valuation, prior.inclusion),
        preferred_base: ratio_of(snapshot.preferred_base_valuation, prior.preferred_base),
        preferred_inclusion: ratio_of(
            snapshot.preferred_inclusion_valuation,
            prior.preferred_inclusion,
        ),
    }
}
