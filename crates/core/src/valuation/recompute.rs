use super::ValuationModel;
use crate::error::DashboardError;
use crate::format::format_currency_rounded;
use crate::render::{write_tile, InputWidget, RenderSurface, TargetKey};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    Current,
    EndOfPeriod,
}

impl Scenario {
    pub const ALL: [Scenario; 2] = [Scenario::Current, Scenario::EndOfPeriod];

    /// The widget holding this scenario's asset A price.
    pub fn price_widget(&self) -> InputWidget {
        match self {
            Scenario::Current => InputWidget::AssetAPrice,
            Scenario::EndOfPeriod => InputWidget::EndOfPeriodAssetAPrice,
        }
    }

    /// Floor, base, inclusion, preferred base, preferred inclusion.
    pub fn tile_keys(&self) -> [TargetKey; 5] {
        match self {
            Scenario::Current => [
                TargetKey::CurrentFloor,
                TargetKey::CurrentBase,
                TargetKey::CurrentInclusion,
                TargetKey::CurrentPreferredBase,
                TargetKey::CurrentPreferredInclusion,
            ],
            Scenario::EndOfPeriod => [
                TargetKey::EndOfPeriodFloor,
                TargetKey::EndOfPeriodBase,
                TargetKey::EndOfPeriodInclusion,
                TargetKey::EndOfPeriodPreferredBase,
                TargetKey::EndOfPeriodPreferredInclusion,
            ],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScenarioTiles {
    pub scenario: Scenario,
    pub floor: f64,
    pub base: f64,
    pub inclusion: f64,
    pub preferred_base: f64,
    pub preferred_inclusion: f64,
}

impl ScenarioTiles {
    fn values(&self) -> [f64; 5] {
        [
            self.floor,
            self.base,
            self.inclusion,
            self.preferred_base,
            self.preferred_inclusion,
        ]
    }
}

/// Computes the five dependent tiles for one scenario. `None` when the price is not finite,
/// in which case nothing should be written.
pub fn recompute(scenario: Scenario, price: f64, model: &ValuationModel) -> Option<ScenarioTiles> {
    if !price.is_finite() {
        return None;
    }

    let floor = price * model.shares_per_unit_ratio;
    let m = &model.multipliers;
    Some(ScenarioTiles {
        scenario,
        floor,
        base: floor * m.base,
        inclusion: floor * m.inclusion,
        preferred_base: floor * m.preferred_base,
        preferred_inclusion: floor * m.preferred_inclusion,
    })
}

/// Writes the tiles of one scenario. Missing targets are skipped.
pub fn render_scenario<S: RenderSurface + ?Sized>(surface: &mut S, tiles: &ScenarioTiles) {
    for (key, value) in tiles.scenario.tile_keys().into_iter().zip(tiles.values()) {
        write_tile(surface, key, &format_currency_rounded(value));
    }
}

/// Parses a free-text price field. Accepts an optional leading `$` and thousands commas.
pub fn parse_price_input(widget: InputWidget, raw: &str) -> Result<f64, DashboardError> {
    let cleaned = raw.trim().trim_start_matches('$').replace(',', "");
    cleaned
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|p| p.is_finite())
        .ok_or_else(|| DashboardError::InvalidUserInput {
            widget,
            raw: raw.to_string(),
        })
}
