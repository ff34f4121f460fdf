use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use navdash_core::apply::Dashboard;
use navdash_core::error::DashboardError;
use navdash_core::render::{InputWidget, Layout, Page, TargetKey};
use navdash_core::snapshot::HttpSnapshotSource;
use navdash_core::valuation::{ScenarioTiles, ValuationDefaults, ValuationModel};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = navdash_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let page = Page::new(Layout::full(), Some(chrono::Utc::now()));
    let mut dashboard = Dashboard::new(page, ValuationDefaults::from_env());

    match HttpSnapshotSource::from_settings(&settings) {
        Ok(source) => {
            if dashboard
                .load(&source, &settings.snapshot_locations)
                .await
                .is_none()
            {
                tracing::warn!("no snapshot loaded; serving defaults");
            }
        }
        Err(e) => {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(error = %e, "snapshot source unavailable; serving defaults");
        }
    }

    let state = AppState {
        dashboard: Arc::new(Mutex::new(dashboard)),
    };

    let app = router(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], settings.port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/dashboard", get(get_dashboard))
        .route("/dashboard/model", get(get_model))
        .route("/dashboard/targets/:key", get(get_target))
        .route("/dashboard/inputs", post(post_input))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn healthz() -> &'static str {
    "ok"
}

// One session; handlers only hold the lock for a synchronous recomputation.
#[derive(Debug, Clone)]
struct AppState {
    dashboard: Arc<Mutex<Dashboard>>,
}

impl AppState {
    fn with_dashboard<T>(&self, f: impl FnOnce(&mut Dashboard) -> T) -> Result<T, StatusCode> {
        let mut guard = self.dashboard.lock().map_err(|_| {
            tracing::error!("dashboard lock poisoned");
            StatusCode::INTERNAL_SERVER_ERROR
        })?;
        Ok(f(&mut guard))
    }
}

async fn get_dashboard(State(state): State<AppState>) -> Result<Json<Dashboard>, StatusCode> {
    state.with_dashboard(|d| Json(d.clone()))
}

async fn get_model(State(state): State<AppState>) -> Result<Json<ValuationModel>, StatusCode> {
    state.with_dashboard(|d| Json(*d.model()))
}

#[derive(Debug, Serialize)]
struct ApiTarget {
    key: TargetKey,
    text: String,
}

async fn get_target(
    State(state): State<AppState>,
    Path(key): Path<TargetKey>,
) -> Result<Json<ApiTarget>, StatusCode> {
    let text = state
        .with_dashboard(|d| d.page().text(key))?
        .ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(ApiTarget { key, text }))
}

#[derive(Debug, Deserialize)]
struct InputEdit {
    widget: InputWidget,
    value: String,
}

#[derive(Debug, Serialize)]
struct ApiInputResult {
    widget: InputWidget,
    /// Present when the edit produced fresh tiles.
    tiles: Option<ScenarioTiles>,
    /// Text written to the asset B echoes by this edit.
    asset_b_echo: Option<String>,
    /// Why the tiles were left as they were.
    skipped: Option<String>,
}

async fn post_input(
    State(state): State<AppState>,
    Json(edit): Json<InputEdit>,
) -> Result<Json<ApiInputResult>, StatusCode> {
    let result = state.with_dashboard(|d| d.on_input(edit.widget, &edit.value))?;

    match result {
        Ok(outcome) => Ok(Json(ApiInputResult {
            widget: edit.widget,
            tiles: outcome.tiles,
            asset_b_echo: outcome.asset_b_echo,
            skipped: outcome.blocked_by.map(|err| err.to_string()),
        })),
        Err(DashboardError::WidgetMissing(_)) => Err(StatusCode::NOT_FOUND),
        Err(err) => {
            tracing::debug!(error = %err, "input accepted without recomputation");
            Ok(Json(ApiInputResult {
                widget: edit.widget,
                tiles: None,
                asset_b_echo: None,
                skipped: Some(err.to_string()),
            }))
        }
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
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
