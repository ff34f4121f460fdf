pub mod page;
pub mod tile;

pub use page::{Layout, Page};
pub use tile::{write_rows, write_tile};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifiers for text targets. Data binding goes through these keys, never through
/// the caption shown next to a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKey {
    AssetAEcho,
    AssetAMetric,
    AssetBEcho,
    AssetBMetric,
    CurrentFloor,
    CurrentBase,
    CurrentInclusion,
    CurrentPreferredBase,
    CurrentPreferredInclusion,
    EndOfPeriodFloor,
    EndOfPeriodBase,
    EndOfPeriodInclusion,
    EndOfPeriodPreferredBase,
    EndOfPeriodPreferredInclusion,
    Recommendation,
    Bluf,
    TradeRecStamp,
    LastRevised,
}

impl TargetKey {
    pub const ALL: [TargetKey; 18] = [
        TargetKey::AssetAEcho,
        TargetKey::AssetAMetric,
        TargetKey::AssetBEcho,
        TargetKey::AssetBMetric,
        TargetKey::CurrentFloor,
        TargetKey::CurrentBase,
        TargetKey::CurrentInclusion,
        TargetKey::CurrentPreferredBase,
        TargetKey::CurrentPreferredInclusion,
        TargetKey::EndOfPeriodFloor,
        TargetKey::EndOfPeriodBase,
        TargetKey::EndOfPeriodInclusion,
        TargetKey::EndOfPeriodPreferredBase,
        TargetKey::EndOfPeriodPreferredInclusion,
        TargetKey::Recommendation,
        TargetKey::Bluf,
        TargetKey::TradeRecStamp,
        TargetKey::LastRevised,
    ];

    /// Both regions that echo the asset A price.
    pub const ASSET_A_ECHOES: [TargetKey; 2] = [TargetKey::AssetAEcho, TargetKey::AssetAMetric];
    /// Both regions that echo the asset B price.
    pub const ASSET_B_ECHOES: [TargetKey; 2] = [TargetKey::AssetBEcho, TargetKey::AssetBMetric];

    pub fn as_str(&self) -> &'static str {
        match self {
            TargetKey::AssetAEcho => "asset_a_echo",
            TargetKey::AssetAMetric => "asset_a_metric",
            TargetKey::AssetBEcho => "asset_b_echo",
            TargetKey::AssetBMetric => "asset_b_metric",
            TargetKey::CurrentFloor => "current_floor",
            TargetKey::CurrentBase => "current_base",
            TargetKey::CurrentInclusion => "current_inclusion",
            TargetKey::CurrentPreferredBase => "current_preferred_base",
            TargetKey::CurrentPreferredInclusion => "current_preferred_inclusion",
            TargetKey::EndOfPeriodFloor => "end_of_period_floor",
            TargetKey::EndOfPeriodBase => "end_of_period_base",
            TargetKey::EndOfPeriodInclusion => "end_of_period_inclusion",
            TargetKey::EndOfPeriodPreferredBase => "end_of_period_preferred_base",
            TargetKey::EndOfPeriodPreferredInclusion => "end_of_period_preferred_inclusion",
            TargetKey::Recommendation => "recommendation",
            TargetKey::Bluf => "bluf",
            TargetKey::TradeRecStamp => "trade_rec_stamp",
            TargetKey::LastRevised => "last_revised",
        }
    }
}

impl fmt::Display for TargetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKey {
    Catalysts,
    Media,
    MacroSignals,
    Institutions,
    Corporate,
    RegLive,
    RegPending,
    TradeScenarios,
    TradeTripwires,
}

impl TableKey {
    pub const ALL: [TableKey; 9] = [
        TableKey::Catalysts,
        TableKey::Media,
        TableKey::MacroSignals,
        TableKey::Institutions,
        TableKey::Corporate,
        TableKey::RegLive,
        TableKey::RegPending,
        TableKey::TradeScenarios,
        TableKey::TradeTripwires,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TableKey::Catalysts => "catalysts",
            TableKey::Media => "media",
            TableKey::MacroSignals => "macro_signals",
            TableKey::Institutions => "institutions",
            TableKey::Corporate => "corporate",
            TableKey::RegLive => "reg_live",
            TableKey::RegPending => "reg_pending",
            TableKey::TradeScenarios => "trade_scenarios",
            TableKey::TradeTripwires => "trade_tripwires",
        }
    }
}

impl fmt::Display for TableKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Free-text numeric fields the user can edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputWidget {
    AssetAPrice,
    AssetBPrice,
    EndOfPeriodAssetAPrice,
}

impl InputWidget {
    pub const ALL: [InputWidget; 3] = [
        InputWidget::AssetAPrice,
        InputWidget::AssetBPrice,
        InputWidget::EndOfPeriodAssetAPrice,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InputWidget::AssetAPrice => "asset_a_price",
            InputWidget::AssetBPrice => "asset_b_price",
            InputWidget::EndOfPeriodAssetAPrice => "end_of_period_asset_a_price",
        }
    }
}

impl fmt::Display for InputWidget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque decorative fragment (e.g. a status dot). Never interpreted, only carried along.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Marker {
    pub class: String,
}

impl Marker {
    pub fn new(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Node {
    Text(String),
    Marker(Marker),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RenderTarget {
    pub label: Option<String>,
    pub nodes: Vec<Node>,
}

impl RenderTarget {
    pub fn labeled(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            nodes: Vec::new(),
        }
    }

    pub fn with_marker(marker: Marker) -> Self {
        Self {
            label: None,
            nodes: vec![Node::Marker(marker)],
        }
    }

    /// Concatenated text content, markers excluded.
    pub fn text(&self) -> String {
        self.nodes
            .iter()
            .filter_map(|n| match n {
                Node::Text(s) => Some(s.as_str()),
                Node::Marker(_) => None,
            })
            .collect()
    }

    pub fn trailing_marker(&self) -> Option<&Marker> {
        match self.nodes.last() {
            Some(Node::Marker(m)) => Some(m),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TableTarget {
    pub rows: Vec<Vec<String>>,
}

/// The addressable surface the engine renders into.
pub trait RenderSurface {
    fn target_mut(&mut self, key: TargetKey) -> Option<&mut RenderTarget>;

    /// Returns the existing target for `key`, or installs `make()` first.
    fn ensure_target(
        &mut self,
        key: TargetKey,
        make: &dyn Fn() -> RenderTarget,
    ) -> &mut RenderTarget;

    fn table_mut(&mut self, key: TableKey) -> Option<&mut TableTarget>;

    /// Last-modified metadata of the hosting document, if it has any.
    fn last_modified(&self) -> Option<DateTime<Utc>>;
}
