pub mod resolver;

pub use resolver::{resolve_snapshot, HttpSnapshotSource, ResolvedSnapshot, SnapshotSource};

use crate::render::TableKey;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

// Prices may be nested under one of these records; nested values win over flat ones.
const NESTED_RECORDS: [&str; 2] = ["raw", "raw_data"];

const ASSET_A_PRICE: &[&str] = &["asset_a_price", "btc", "current_btc_price"];
const ASSET_B_PRICE: &[&str] = &["asset_b_price", "mstr", "current_mstr_price"];
const NAV_FLOOR: &[&str] = &["nav_floor"];
const END_OF_PERIOD_ASSET_A_PRICE: &[&str] = &["end_of_period_asset_a_price"];
const SHARES_PER_UNIT_RATIO: &[&str] = &["shares_per_unit_ratio", "btc_per_share"];
const BASE_VALUATION: &[&str] = &["base_valuation", "mnv_equity_base"];
const INCLUSION_VALUATION: &[&str] = &["inclusion_valuation", "mnv_equity_inclusion"];
const PREFERRED_BASE_VALUATION: &[&str] = &["preferred_base_valuation", "preferred_engine_base"];
const PREFERRED_INCLUSION_VALUATION: &[&str] =
    &["preferred_inclusion_valuation", "preferred_engine_inclusion"];
const AS_OF_TIMESTAMP: &[&str] = &["as_of_timestamp", "last_updated"];

/// The authoritative record. Every field is read independently: a missing or malformed
/// field leaves only that field empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Snapshot {
    pub asset_a_price: Option<f64>,
    pub asset_b_price: Option<f64>,
    pub nav_floor: Option<f64>,
    pub base_valuation: Option<f64>,
    pub inclusion_valuation: Option<f64>,
    pub preferred_base_valuation: Option<f64>,
    pub preferred_inclusion_valuation: Option<f64>,
    pub shares_per_unit_ratio: Option<f64>,
    pub end_of_period_asset_a_price: Option<f64>,
    pub as_of_timestamp: Option<String>,
    pub recommendation_text: Option<String>,
    pub trade_recommendation: Option<TradeRecommendation>,
    pub meta: SnapshotMeta,
    pub tables: BTreeMap<TableKey, Vec<Value>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TradeRecommendation {
    pub core_position: Option<String>,
    pub risk_management: Option<String>,
    pub generated_at_utc: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SnapshotMeta {
    pub last_updated_utc: Option<String>,
    pub trade_rec_last_generated: Option<String>,
}

impl Snapshot {
    pub fn parse(text: &str) -> anyhow::Result<Self> {
        let value = serde_json::from_str::<Value>(text)
            .map_err(|e| anyhow::anyhow!("snapshot body is not valid JSON: {e}"))?;
        Self::from_value(&value)
    }

    pub fn from_value(root: &Value) -> anyhow::Result<Self> {
        anyhow::ensure!(
            root.is_object(),
            "snapshot must be a JSON object (got {})",
            kind(root)
        );

        let trade_recommendation = root
            .get("trade_recommendation")
            .filter(|v| v.is_object())
            .map(|tr| TradeRecommendation {
                core_position: text_at(tr, &["core_position"]),
                risk_management: text_at(tr, &["risk_management"]),
                generated_at_utc: text_at(tr, &["generated_at_utc"]),
            });

        let meta = SnapshotMeta {
            last_updated_utc: text_at(root, &["meta", "last_updated_utc"]),
            trade_rec_last_generated: text_at(root, &["meta", "trade_rec_last_generated"]),
        };

        let mut tables = BTreeMap::new();
        for key in TableKey::ALL {
            if let Some(rows) = table_rows(root, key) {
                tables.insert(key, rows);
            }
        }

        Ok(Self {
            asset_a_price: number_field(root, ASSET_A_PRICE),
            asset_b_price: number_field(root, ASSET_B_PRICE),
            nav_floor: number_field(root, NAV_FLOOR),
            base_valuation: number_field(root, BASE_VALUATION),
            inclusion_valuation: number_field(root, INCLUSION_VALUATION),
            preferred_base_valuation: number_field(root, PREFERRED_BASE_VALUATION),
            preferred_inclusion_valuation: number_field(root, PREFERRED_INCLUSION_VALUATION),
            shares_per_unit_ratio: number_field(root, SHARES_PER_UNIT_RATIO),
            end_of_period_asset_a_price: number_field(root, END_OF_PERIOD_ASSET_A_PRICE),
            as_of_timestamp: AS_OF_TIMESTAMP.iter().find_map(|k| text_at(root, &[*k])),
            recommendation_text: text_at(root, &["recommendation_text"])
                .or_else(|| text_at(root, &["trade", "rec"])),
            trade_recommendation,
            meta,
            tables,
        })
    }
}

fn kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn lookup<'a>(root: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(root, |cur, key| cur.get(key))
}

fn number_field(root: &Value, keys: &[&str]) -> Option<f64> {
    NESTED_RECORDS
        .iter()
        .filter_map(|record| root.get(record).filter(|v| v.is_object()))
        .chain(std::iter::once(root))
        .find_map(|record| keys.iter().find_map(|k| record.get(k).and_then(as_number)))
}

/// Accepts JSON numbers and numeric strings such as `"$1,234.5"`.
pub(crate) fn as_number(v: &Value) -> Option<f64> {
    let n = match v {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s
            .trim()
            .trim_start_matches('$')
            .replace(',', "")
            .parse::<f64>()
            .ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

fn text_at(root: &Value, path: &[&str]) -> Option<String> {
    match lookup(root, path)? {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn table_paths(key: TableKey) -> &'static [&'static [&'static str]] {
    match key {
        TableKey::Catalysts => &[&["catalysts"], &["catalysts", "timeline"]],
        TableKey::Media => &[&["media"]],
        TableKey::MacroSignals => &[&["macro_signals"]],
        TableKey::Institutions => &[&["institutions"]],
        TableKey::Corporate => &[&["corporate"]],
        TableKey::RegLive => &[&["reg_live"]],
        TableKey::RegPending => &[&["reg_pending"]],
        TableKey::TradeScenarios => &[&["trade", "scenarios"]],
        TableKey::TradeTripwires => &[&["trade", "tripwires"]],
    }
}

fn table_rows(root: &Value, key: TableKey) -> Option<Vec<Value>> {
    table_paths(key)
        .iter()
        .find_map(|path| lookup(root, path).and_then(Value::as_array))
        .cloned()
}
