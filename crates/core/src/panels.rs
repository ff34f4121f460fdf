//! Auxiliary panels fed straight from the snapshot: recommendation block, BLUF line,
//! trade-rec stamp and the data tables.

use crate::format::format_cell;
use crate::render::{write_rows, write_tile, RenderSurface, RenderTarget, TableKey, TargetKey};
use crate::snapshot::Snapshot;
use serde_json::Value;

pub const RECOMMENDATION_LABEL: &str = "Auto Trade Recommendation";

pub fn table_columns(key: TableKey) -> &'static [&'static str] {
    match key {
        TableKey::Catalysts => &["horizon", "catalyst", "date", "prob", "impact", "ngu"],
        TableKey::Media => &["theme", "signal", "implication", "status"],
        TableKey::MacroSignals => &["signal", "latest", "implication", "status"],
        TableKey::Institutions => &["rank", "name", "shares", "last", "trend", "status"],
        TableKey::Corporate => &["date", "entity", "amount_btc", "usd", "notes", "sig"],
        TableKey::RegLive | TableKey::RegPending => &["item", "status"],
        TableKey::TradeScenarios => &["name", "prob", "btc", "mstr"],
        TableKey::TradeTripwires => &["signal", "current", "status", "critical"],
    }
}

/// Writes the recommendation into its labeled block, creating the block on first use and
/// updating it in place afterwards.
pub fn render_recommendation<S: RenderSurface + ?Sized>(surface: &mut S, snapshot: &Snapshot) -> bool {
    let Some(text) = snapshot.recommendation_text.as_deref() else {
        return false;
    };
    surface.ensure_target(TargetKey::Recommendation, &|| {
        RenderTarget::labeled(RECOMMENDATION_LABEL)
    });
    write_tile(surface, TargetKey::Recommendation, text)
}

pub fn bluf_line(snapshot: &Snapshot) -> Option<String> {
    let tr = snapshot.trade_recommendation.as_ref()?;
    let core = tr.core_position.as_deref()?;
    let mut line = format!("BLUF: Core: {core}.");
    if let Some(risk) = tr.risk_management.as_deref() {
        line.push_str(&format!(" Risk: {}.", risk.trim_end_matches('.')));
    }
    Some(line)
}

pub fn render_bluf<S: RenderSurface + ?Sized>(surface: &mut S, snapshot: &Snapshot) -> bool {
    match bluf_line(snapshot) {
        Some(line) => write_tile(surface, TargetKey::Bluf, &line),
        None => false,
    }
}

pub fn render_trade_rec_stamp<S: RenderSurface + ?Sized>(surface: &mut S, snapshot: &Snapshot) -> bool {
    let ts = snapshot.meta.trade_rec_last_generated.as_deref().or_else(|| {
        snapshot
            .trade_recommendation
            .as_ref()
            .and_then(|t| t.generated_at_utc.as_deref())
    });
    match ts {
        Some(ts) => write_tile(surface, TargetKey::TradeRecStamp, &format!("(auto @ {ts} UTC)")),
        None => false,
    }
}

/// Fills every table present both in the snapshot and on the surface. Returns how many
/// tables were written.
pub fn render_tables<S: RenderSurface + ?Sized>(surface: &mut S, snapshot: &Snapshot) -> usize {
    let mut written = 0;
    for (key, rows) in &snapshot.tables {
        if write_rows(surface, *key, table_cells(rows, table_columns(*key))) {
            written += 1;
        }
    }
    written
}

fn table_cells(rows: &[Value], columns: &[&str]) -> Vec<Vec<String>> {
    rows.iter()
        .map(|row| {
            columns
                .iter()
                .map(|col| row.get(col).map(format_cell).unwrap_or_default())
                .collect()
        })
        .collect()
}
