use crate::error::DashboardError;
use crate::format::{format_currency_cents, format_currency_rounded, format_grouped_integer};
use crate::panels;
use crate::render::{write_tile, InputWidget, Page, RenderSurface, TargetKey};
use crate::snapshot::{resolve_snapshot, Snapshot, SnapshotSource};
use crate::time::revised::{last_revised_text, snapshot_revision_time};
use crate::valuation::{
    parse_price_input, recompute, render_scenario, Scenario, ScenarioTiles, ValuationDefaults,
    ValuationModel,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// What a single edit changed on the page.
#[derive(Debug, Clone, PartialEq)]
pub struct InputOutcome {
    /// Fresh tiles of the scenario the edit feeds, if it could be recomputed.
    pub tiles: Option<ScenarioTiles>,
    /// Text written to the asset B echoes, when the asset B price parsed.
    pub asset_b_echo: Option<String>,
    /// Why the tiles were left as rendered when another widget's value blocked them.
    pub blocked_by: Option<DashboardError>,
}

/// One dashboard session: the page, and the valuation model derived for it.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    page: Page,
    model: ValuationModel,
    source_location: Option<String>,
}

impl Dashboard {
    pub fn new(page: Page, defaults: ValuationDefaults) -> Self {
        Self {
            page,
            model: ValuationModel::new(defaults),
            source_location: None,
        }
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn model(&self) -> &ValuationModel {
        &self.model
    }

    pub fn source_location(&self) -> Option<&str> {
        self.source_location.as_deref()
    }

    /// Resolves the snapshot and applies it. Without a snapshot the page keeps its defaults
    /// and stays interactive; the returned location is `None` in that case.
    pub async fn load<S: SnapshotSource + ?Sized>(
        &mut self,
        source: &S,
        locations: &[String],
    ) -> Option<String> {
        match resolve_snapshot(source, locations).await {
            Ok(resolved) => {
                apply_snapshot(
                    &mut self.page,
                    &mut self.model,
                    &resolved.snapshot,
                    resolved.last_modified,
                );
                self.source_location = Some(resolved.location.clone());
                Some(resolved.location)
            }
            Err(err) => {
                tracing::warn!(error = %err, "continuing without snapshot");
                let modified = self.page.last_modified();
                if let Err(err) = stamp_last_revised(&mut self.page, modified) {
                    let detail = format!("{err:#}");
                    tracing::debug!(error = %detail, "last-revised stamp skipped");
                }
                None
            }
        }
    }

    /// Records a user edit and synchronously recomputes the scenario that depends on it.
    ///
    /// Errors only concern the edited widget itself. An asset B edit that parses is echoed
    /// even when the asset A price blocks the current tiles; that is reported in
    /// [`InputOutcome::blocked_by`].
    pub fn on_input(
        &mut self,
        widget: InputWidget,
        value: &str,
    ) -> Result<InputOutcome, DashboardError> {
        if !self.page.user_edit(widget, value) {
            return Err(DashboardError::WidgetMissing(widget));
        }

        match widget {
            InputWidget::AssetBPrice => {
                let echoed = echo_asset_b(&mut self.page)?;
                let (tiles, blocked_by) =
                    match refresh_scenario(&mut self.page, Scenario::Current, &self.model) {
                        Ok(tiles) => (Some(tiles), None),
                        Err(err) => (None, Some(err)),
                    };
                Ok(InputOutcome {
                    tiles,
                    asset_b_echo: Some(echoed),
                    blocked_by,
                })
            }
            InputWidget::AssetAPrice => {
                let asset_b_echo = echo_asset_b(&mut self.page).ok();
                let tiles = refresh_scenario(&mut self.page, Scenario::Current, &self.model)?;
                Ok(InputOutcome {
                    tiles: Some(tiles),
                    asset_b_echo,
                    blocked_by: None,
                })
            }
            InputWidget::EndOfPeriodAssetAPrice => {
                let tiles = refresh_scenario(&mut self.page, Scenario::EndOfPeriod, &self.model)?;
                Ok(InputOutcome {
                    tiles: Some(tiles),
                    asset_b_echo: None,
                    blocked_by: None,
                })
            }
        }
    }
}

/// Projects a resolved snapshot onto the page. Steps that can fail log and leave their
/// targets as rendered; the following steps still run.
pub fn apply_snapshot(
    page: &mut Page,
    model: &mut ValuationModel,
    snapshot: &Snapshot,
    response_modified: Option<DateTime<Utc>>,
) {
    prefill_inputs(page, snapshot);
    echo_raw_prices(page, snapshot);
    model.absorb(snapshot);

    if let Err(err) = echo_asset_b(page) {
        tracing::debug!(error = %err, "asset B echo skipped");
    }
    for scenario in Scenario::ALL {
        if let Err(err) = refresh_scenario(page, scenario, model) {
            tracing::debug!(?scenario, error = %err, "scenario left as rendered");
        }
    }

    panels::render_recommendation(page, snapshot);
    panels::render_bluf(page, snapshot);
    panels::render_trade_rec_stamp(page, snapshot);
    let written = panels::render_tables(page, snapshot);
    tracing::debug!(written, "tables rendered");

    let revised = snapshot_revision_time(snapshot)
        .or(response_modified)
        .or(page.last_modified());
    if let Err(err) = stamp_last_revised(page, revised) {
        let detail = format!("{err:#}");
        tracing::warn!(error = %detail, "last-revised stamp skipped");
    }
}

fn prefill_inputs(page: &mut Page, snapshot: &Snapshot) {
    let prices = [
        (InputWidget::AssetAPrice, snapshot.asset_a_price),
        (InputWidget::AssetBPrice, snapshot.asset_b_price),
        (
            InputWidget::EndOfPeriodAssetAPrice,
            snapshot.end_of_period_asset_a_price,
        ),
    ];
    for (widget, price) in prices {
        if let Some(price) = price.filter(|p| p.is_finite() && *p > 0.0) {
            if page.prefill(widget, &price.to_string()) {
                tracing::debug!(%widget, price, "input prefilled");
            }
        }
    }
}

fn echo_raw_prices(page: &mut Page, snapshot: &Snapshot) {
    if let Some(price) = snapshot.asset_a_price {
        echo(page, &TargetKey::ASSET_A_ECHOES, &asset_a_echo_text(price));
    }
    if let Some(price) = snapshot.asset_b_price {
        echo(page, &TargetKey::ASSET_B_ECHOES, &format_currency_cents(price));
    }
    if let Some(nav_floor) = snapshot.nav_floor {
        write_tile(page, TargetKey::CurrentFloor, &format_currency_rounded(nav_floor));
    }
}

fn echo(page: &mut Page, keys: &[TargetKey], text: &str) {
    for key in keys {
        write_tile(page, *key, text);
    }
}

// Raw asset A price as typed: `$` + grouped integer.
fn asset_a_echo_text(price: f64) -> String {
    format!("${}", format_grouped_integer(price))
}

/// Echoes the asset B widget into both asset B targets with cents. No multiplier math.
pub fn echo_asset_b(page: &mut Page) -> Result<String, DashboardError> {
    let raw = page.input_value(InputWidget::AssetBPrice).unwrap_or_default();
    let text = format_currency_cents(parse_price_input(InputWidget::AssetBPrice, raw)?);
    echo(page, &TargetKey::ASSET_B_ECHOES, &text);
    Ok(text)
}

/// Recomputes one scenario from its widget. An invalid asset A price leaves that scenario's
/// tiles untouched. The current scenario also echoes the asset A input.
pub fn refresh_scenario(
    page: &mut Page,
    scenario: Scenario,
    model: &ValuationModel,
) -> Result<ScenarioTiles, DashboardError> {
    let widget = scenario.price_widget();
    let raw = page
        .input_value(widget)
        .ok_or(DashboardError::WidgetMissing(widget))?;
    let price = parse_price_input(widget, raw)?;

    let tiles = recompute(scenario, price, model).ok_or_else(|| {
        DashboardError::InvalidUserInput {
            widget,
            raw: raw.to_string(),
        }
    })?;

    render_scenario(page, &tiles);
    if scenario == Scenario::Current {
        echo(page, &TargetKey::ASSET_A_ECHOES, &asset_a_echo_text(price));
    }
    Ok(tiles)
}

fn stamp_last_revised(page: &mut Page, revised: Option<DateTime<Utc>>) -> anyhow::Result<()> {
    let revised = revised.ok_or_else(|| anyhow::anyhow!("no revision time available"))?;
    write_tile(page, TargetKey::LastRevised, &last_revised_text(revised));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{Layout, Marker};
    use crate::snapshot::resolver::SnapshotResponse;
    use chrono::TimeZone;
    use serde_json::json;

    struct FixedSource(Option<serde_json::Value>);

    #[async_trait::async_trait]
    impl SnapshotSource for FixedSource {
        fn source_name(&self) -> &'static str {
            "fixed"
        }

        async fn fetch(&self, _location: &str) -> anyhow::Result<SnapshotResponse> {
            let value = self.0.as_ref().ok_or_else(|| anyhow::anyhow!("HTTP 404 Not Found"))?;
            Ok(SnapshotResponse {
                snapshot: Snapshot::from_value(value)?,
                last_modified: None,
            })
        }
    }

    fn page_modified() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 9, 4, 6, 30, 59).unwrap()
    }

    fn dashboard() -> Dashboard {
        Dashboard::new(
            Page::new(Layout::full(), Some(page_modified())),
            ValuationDefaults::default(),
        )
    }

    fn reference_snapshot() -> serde_json::Value {
        json!({
            "asset_a_price": 100000,
            "shares_per_unit_ratio": 0.002,
            "base_valuation": 284,
            "inclusion_valuation": 342,
        })
    }

    fn text(d: &Dashboard, key: TargetKey) -> String {
        d.page().text(key).unwrap_or_default()
    }

    #[tokio::test]
    async fn reference_end_to_end() {
        let mut d = dashboard();
        let loaded = d
            .load(&FixedSource(Some(reference_snapshot())), &["data.json".to_string()])
            .await;
        assert_eq!(loaded.as_deref(), Some("data.json"));
        assert!((d.model().multipliers.base - 1.42).abs() < 1e-12);
        assert!((d.model().multipliers.inclusion - 1.71).abs() < 1e-12);

        // Prefilled price drives the first render.
        assert_eq!(d.page().input_value(InputWidget::AssetAPrice), Some("100000"));
        assert_eq!(text(&d, TargetKey::CurrentFloor), "$200");
        assert_eq!(text(&d, TargetKey::CurrentBase), "$284");

        let outcome = d.on_input(InputWidget::AssetAPrice, "150000").unwrap();
        assert_eq!(outcome.tiles.map(|t| t.scenario), Some(Scenario::Current));
        assert_eq!(outcome.blocked_by, None);
        assert_eq!(text(&d, TargetKey::CurrentFloor), "$300");
        assert_eq!(text(&d, TargetKey::CurrentBase), "$426");
        assert_eq!(text(&d, TargetKey::CurrentInclusion), "$513");
        assert_eq!(text(&d, TargetKey::AssetAEcho), "$150,000");
        assert_eq!(text(&d, TargetKey::AssetAMetric), "$150,000");
    }

    #[tokio::test]
    async fn invalid_input_keeps_prior_tiles() {
        let mut d = dashboard();
        d.load(&FixedSource(Some(reference_snapshot())), &["data.json".to_string()])
            .await;
        d.on_input(InputWidget::AssetAPrice, "150000").unwrap();

        let err = d.on_input(InputWidget::AssetAPrice, "").unwrap_err();
        assert!(matches!(err, DashboardError::InvalidUserInput { .. }));
        assert_eq!(text(&d, TargetKey::CurrentBase), "$426");

        d.on_input(InputWidget::AssetAPrice, "abc").unwrap_err();
        assert_eq!(text(&d, TargetKey::CurrentFloor), "$300");
    }

    #[tokio::test]
    async fn scenarios_are_independent() {
        let mut d = dashboard();
        d.load(&FixedSource(Some(reference_snapshot())), &["data.json".to_string()])
            .await;

        d.on_input(InputWidget::EndOfPeriodAssetAPrice, "250000").unwrap();
        assert_eq!(text(&d, TargetKey::EndOfPeriodFloor), "$500");
        assert_eq!(text(&d, TargetKey::EndOfPeriodBase), "$710");
        assert_eq!(text(&d, TargetKey::CurrentFloor), "$200");
    }

    #[tokio::test]
    async fn asset_b_edit_echoes_cents() {
        let mut d = dashboard();
        d.load(&FixedSource(Some(reference_snapshot())), &["data.json".to_string()])
            .await;

        d.on_input(InputWidget::AssetBPrice, "1234.5").unwrap();
        assert_eq!(text(&d, TargetKey::AssetBEcho), "$1,234.50");
        assert_eq!(text(&d, TargetKey::AssetBMetric), "$1,234.50");
        assert_eq!(
            d.page()
                .target(TargetKey::AssetBMetric)
                .and_then(|t| t.trailing_marker()),
            Some(&Marker::new("status-dot"))
        );
    }

    #[test]
    fn asset_b_edit_is_echoed_even_when_asset_a_is_empty() {
        let mut d = dashboard();

        let outcome = d.on_input(InputWidget::AssetBPrice, "350").unwrap();
        assert_eq!(outcome.asset_b_echo.as_deref(), Some("$350.00"));
        assert_eq!(outcome.tiles, None);
        assert_eq!(
            outcome.blocked_by,
            Some(DashboardError::InvalidUserInput {
                widget: InputWidget::AssetAPrice,
                raw: String::new(),
            })
        );
        assert_eq!(text(&d, TargetKey::AssetBEcho), "$350.00");
        assert_eq!(text(&d, TargetKey::CurrentBase), "");
    }

    #[test]
    fn invalid_asset_b_edit_is_its_own_error() {
        let mut d = dashboard();
        d.on_input(InputWidget::AssetAPrice, "150000").unwrap();

        assert_eq!(
            d.on_input(InputWidget::AssetBPrice, "n/a"),
            Err(DashboardError::InvalidUserInput {
                widget: InputWidget::AssetBPrice,
                raw: "n/a".to_string(),
            })
        );
        assert_eq!(text(&d, TargetKey::CurrentBase), "$426");
    }

    #[test]
    fn asset_a_echo_is_a_grouped_whole_number() {
        assert_eq!(asset_a_echo_text(111250.0), "$111,250");
        assert_eq!(asset_a_echo_text(99.6), "$100");
    }

    #[test]
    fn later_steps_run_when_no_scenario_or_timestamp_is_available() {
        let mut page = Page::new(Layout::full(), None);
        let mut model = ValuationModel::default();
        let snapshot = Snapshot::from_value(&json!({
            "asset_b_price": "not a price",
            "recommendation_text": "Hold",
            "reg_live": [{"item": "Custody rule", "status": "Live"}],
        }))
        .unwrap();

        apply_snapshot(&mut page, &mut model, &snapshot, None);

        assert_eq!(page.text(TargetKey::CurrentBase).as_deref(), Some(""));
        assert_eq!(page.text(TargetKey::AssetBEcho).as_deref(), Some(""));
        assert_eq!(page.text(TargetKey::LastRevised).as_deref(), Some(""));
        assert_eq!(page.text(TargetKey::Recommendation).as_deref(), Some("Hold"));
        assert_eq!(
            page.table(crate::render::TableKey::RegLive).map(|t| t.rows.clone()),
            Some(vec![vec!["Custody rule".to_string(), "Live".to_string()]])
        );
    }

    #[tokio::test]
    async fn missing_source_keeps_defaults_and_stays_interactive() {
        let mut d = dashboard();
        let loaded = d
            .load(&FixedSource(None), &["data.json".to_string(), "data-3.json".to_string()])
            .await;
        assert_eq!(loaded, None);
        assert_eq!(*d.model(), ValuationModel::default());
        assert_eq!(
            text(&d, TargetKey::LastRevised),
            "Last Revised: 2025-09-04 06:30 UTC"
        );

        // Defaults: ratio 0.002, base multiplier 1.42.
        d.on_input(InputWidget::AssetAPrice, "150000").unwrap();
        assert_eq!(text(&d, TargetKey::CurrentBase), "$426");
    }

    #[test]
    fn prefill_respects_user_edits() {
        let mut page = Page::new(Layout::full(), None);
        page.user_edit(InputWidget::AssetAPrice, "120000");
        let mut model = ValuationModel::default();
        let snapshot = Snapshot::from_value(&reference_snapshot()).unwrap();

        apply_snapshot(&mut page, &mut model, &snapshot, None);

        assert_eq!(page.input_value(InputWidget::AssetAPrice), Some("120000"));
        assert_eq!(page.text(TargetKey::CurrentFloor).as_deref(), Some("$240"));
        assert_eq!(page.text(TargetKey::AssetAEcho).as_deref(), Some("$120,000"));
    }

    #[test]
    fn applies_panels_and_timestamp() {
        let mut page = Page::new(Layout::full(), Some(page_modified()));
        let mut model = ValuationModel::default();
        let snapshot = Snapshot::from_value(&json!({
            "raw": {"btc": 111250, "mstr": 339.1, "nav_floor": 228.4},
            "last_updated": "2025-09-02 08:00:17Z",
            "trade": {
                "rec": "Hold / Add (small)",
                "tripwires": [{"signal": "DXY", "current": 98.2, "status": "OK", "critical": "No"}],
            },
            "trade_recommendation": {"core_position": "Hold / Add (small)"},
        }))
        .unwrap();

        apply_snapshot(&mut page, &mut model, &snapshot, None);

        assert_eq!(
            page.text(TargetKey::LastRevised).as_deref(),
            Some("Last Revised: 2025-09-02 08:00 UTC")
        );
        assert_eq!(
            page.text(TargetKey::Recommendation).as_deref(),
            Some("Hold / Add (small)")
        );
        assert_eq!(
            page.text(TargetKey::Bluf).as_deref(),
            Some("BLUF: Core: Hold / Add (small).")
        );
        assert_eq!(page.text(TargetKey::AssetBEcho).as_deref(), Some("$339.10"));
        assert_eq!(
            page.table(crate::render::TableKey::TradeTripwires)
                .map(|t| t.rows.len()),
            Some(1)
        );
        // No ratio in the snapshot: the default ratio drives the floor.
        assert_eq!(page.text(TargetKey::CurrentFloor).as_deref(), Some("$223"));
    }

    #[test]
    fn response_last_modified_beats_document_metadata() {
        let mut page = Page::new(Layout::full(), Some(page_modified()));
        let mut model = ValuationModel::default();
        let header_time = Utc.with_ymd_and_hms(2025, 9, 3, 22, 15, 0).unwrap();

        apply_snapshot(&mut page, &mut model, &Snapshot::default(), Some(header_time));

        assert_eq!(
            page.text(TargetKey::LastRevised).as_deref(),
            Some("Last Revised: 2025-09-03 22:15 UTC")
        );
    }

    #[test]
    fn missing_targets_are_tolerated() {
        let mut page = Page::new(
            Layout::empty().with_widget(InputWidget::AssetAPrice),
            None,
        );
        let mut model = ValuationModel::default();
        let snapshot = Snapshot::from_value(&reference_snapshot()).unwrap();

        apply_snapshot(&mut page, &mut model, &snapshot, None);

        assert!((model.multipliers.base - 1.42).abs() < 1e-12);
        assert!(page.target(TargetKey::CurrentBase).is_none());
        assert_eq!(page.input_value(InputWidget::AssetAPrice), Some("100000"));
    }

    #[test]
    fn editing_absent_widget_is_reported() {
        let mut d = Dashboard::new(
            Page::new(Layout::empty().with_widget(InputWidget::AssetAPrice), None),
            ValuationDefaults::default(),
        );
        assert_eq!(
            d.on_input(InputWidget::EndOfPeriodAssetAPrice, "1"),
            Err(DashboardError::WidgetMissing(
                InputWidget::EndOfPeriodAssetAPrice
            ))
        );
    }
}
