use clap::Parser;
use anyhow::Context;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use navdash_core::apply::Dashboard;
use navdash_core::render::{InputWidget, Layout, Page, TableKey, TargetKey};
use navdash_core::snapshot::HttpSnapshotSource;
use navdash_core::valuation::ValuationDefaults;

#[derive(Debug, Parser)]
#[command(name = "navdash")]
struct Args {
    /// Directory URL the snapshot locations are relative to. Defaults to SNAPSHOT_BASE_URL.
    #[arg(long)]
    base_url: Option<String>,

    /// Snapshot location, tried in the order given. Defaults to SNAPSHOT_LOCATIONS.
    #[arg(long = "location")]
    locations: Vec<String>,

    /// Edit the current asset A price after the snapshot is applied.
    #[arg(long)]
    asset_a_price: Option<String>,

    /// Edit the current asset B price after the snapshot is applied.
    #[arg(long)]
    asset_b_price: Option<String>,

    /// Edit the end-of-period asset A price after the snapshot is applied.
    #[arg(long)]
    end_of_period_asset_a_price: Option<String>,

    /// Print the whole session as JSON instead of a target listing.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let mut settings = navdash_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    if let Some(base_url) = args.base_url.clone() {
        settings.snapshot_base_url = Some(base_url);
    }
    if !args.locations.is_empty() {
        settings.snapshot_locations = args.locations.clone();
    }

    let page = Page::new(Layout::full(), Some(chrono::Utc::now()));
    let mut dashboard = Dashboard::new(page, ValuationDefaults::from_env());

    let source = HttpSnapshotSource::from_settings(&settings)
        .context("snapshot source configuration is incomplete")?;

    match dashboard.load(&source, &settings.snapshot_locations).await {
        Some(location) => tracing::info!(%location, "dashboard loaded"),
        None => {
            let err = anyhow::anyhow!(
                "no snapshot available from {:?}",
                settings.snapshot_locations
            );
            sentry_anyhow::capture_anyhow(&err);
            tracing::warn!(error = %err, "rendering with defaults");
        }
    }

    let edits = [
        (InputWidget::AssetAPrice, args.asset_a_price.as_deref()),
        (InputWidget::AssetBPrice, args.asset_b_price.as_deref()),
        (
            InputWidget::EndOfPeriodAssetAPrice,
            args.end_of_period_asset_a_price.as_deref(),
        ),
    ];
    for (widget, value) in edits {
        let Some(value) = value else { continue };
        match dashboard.on_input(widget, value) {
            Ok(outcome) => {
                if let Some(err) = outcome.blocked_by {
                    tracing::warn!(%widget, error = %err, "edit recorded; tiles unchanged");
                }
            }
            Err(err) => tracing::warn!(%widget, error = %err, "edit left tiles unchanged"),
        }
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&dashboard)?);
    } else {
        print!("{}", render_listing(&dashboard));
    }

    Ok(())
}

fn render_listing(dashboard: &Dashboard) -> String {
    let page = dashboard.page();
    let mut out = String::new();

    if let Some(location) = dashboard.source_location() {
        out.push_str(&format!("source: {location}\n"));
    }

    for key in TargetKey::ALL {
        let Some(target) = page.target(key) else {
            continue;
        };
        let text = target.text();
        if text.is_empty() {
            continue;
        }
        match target.label.as_deref() {
            Some(label) => out.push_str(&format!("{:<34} {label}: {text}\n", key.as_str())),
            None => out.push_str(&format!("{:<34} {text}\n", key.as_str())),
        }
    }

    for key in TableKey::ALL {
        let Some(table) = page.table(key) else {
            continue;
        };
        if table.rows.is_empty() {
            continue;
        }
        out.push_str(&format!("\n[{key}]\n"));
        for row in &table.rows {
            out.push_str(&format!("  {}\n", row.join(" | ")));
        }
    }

    out
}

fn init_sentry(settings: &navdash_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_skips_empty_targets() {
        let mut dashboard = Dashboard::new(
            Page::new(Layout::full(), None),
            ValuationDefaults::default(),
        );
        dashboard
            .on_input(InputWidget::AssetAPrice, "150000")
            .unwrap();

        let listing = render_listing(&dashboard);
        assert!(listing.contains("current_base"));
        assert!(listing.contains("$426"));
        assert!(!listing.contains("recommendation"));
        assert!(!listing.contains("source:"));
    }

    #[test]
    fn args_accept_repeated_locations() {
        let args = Args::parse_from([
            "navdash",
            "--location",
            "data.json",
            "--location",
            "data-3.json",
            "--asset-a-price",
            "150000",
        ]);
        assert_eq!(args.locations, vec!["data.json", "data-3.json"]);
        assert_eq!(args.asset_a_price.as_deref(), Some("150000"));
        assert!(!args.json);
    }
}
