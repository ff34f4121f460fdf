use crate::config::Settings;
use crate::error::{DashboardError, LocationFailure};
use crate::snapshot::Snapshot;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::Url;
use std::time::Duration;

/// Body and metadata of one successful fetch.
#[derive(Debug, Clone)]
pub struct SnapshotResponse {
    pub snapshot: Snapshot,
    pub last_modified: Option<DateTime<Utc>>,
}

/// A snapshot together with the location it was read from.
#[derive(Debug, Clone)]
pub struct ResolvedSnapshot {
    pub location: String,
    pub snapshot: Snapshot,
    pub last_modified: Option<DateTime<Utc>>,
}

#[async_trait::async_trait]
pub trait SnapshotSource: Send + Sync {
    fn source_name(&self) -> &'static str;

    /// Fetches and parses one location. Transport errors, non-success statuses and
    /// unparseable bodies are all errors.
    async fn fetch(&self, location: &str) -> Result<SnapshotResponse>;
}

#[derive(Debug, Clone)]
pub struct HttpSnapshotSource {
    http: reqwest::Client,
    base_url: Url,
}

impl HttpSnapshotSource {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let base_url = settings.require_snapshot_base_url()?;
        Self::new(base_url, Duration::from_secs(settings.snapshot_timeout_secs))
    }

    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        // Relative locations resolve against the directory, so keep a trailing slash.
        let base = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };
        let base_url =
            Url::parse(&base).with_context(|| format!("invalid snapshot base url: {base}"))?;

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(no_cache_headers())
            .build()
            .context("failed to build snapshot http client")?;

        Ok(Self { http, base_url })
    }

    fn url(&self, location: &str) -> Result<Url> {
        let mut url = self
            .base_url
            .join(location)
            .with_context(|| format!("invalid snapshot location: {location}"))?;
        url.query_pairs_mut()
            .append_pair("ts", &Utc::now().timestamp_millis().to_string());
        Ok(url)
    }
}

fn no_cache_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-cache, no-store"),
    );
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    headers
}

#[async_trait::async_trait]
impl SnapshotSource for HttpSnapshotSource {
    fn source_name(&self) -> &'static str {
        "http_json"
    }

    async fn fetch(&self, location: &str) -> Result<SnapshotResponse> {
        let url = self.url(location)?;

        let res = self
            .http
            .get(url)
            .send()
            .await
            .context("snapshot request failed")?;

        let status = res.status();
        if !status.is_success() {
            anyhow::bail!("HTTP {status}");
        }

        let last_modified = res
            .headers()
            .get(header::LAST_MODIFIED)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| DateTime::parse_from_rfc2822(s).ok())
            .map(|dt| dt.with_timezone(&Utc));

        let text = res
            .text()
            .await
            .context("failed to read snapshot response")?;

        let snapshot = Snapshot::parse(&text).map_err(|e| DashboardError::MalformedSnapshot {
            location: location.to_string(),
            detail: e.to_string(),
        })?;

        Ok(SnapshotResponse {
            snapshot,
            last_modified,
        })
    }
}

/// Tries `locations` in order and returns the first one that yields a snapshot. Later
/// locations are never contacted once one succeeds.
pub async fn resolve_snapshot<S: SnapshotSource + ?Sized>(
    source: &S,
    locations: &[String],
) -> std::result::Result<ResolvedSnapshot, DashboardError> {
    let mut attempts = Vec::with_capacity(locations.len());

    for location in locations {
        tracing::debug!(source = source.source_name(), %location, "trying snapshot location");
        match source.fetch(location).await {
            Ok(res) => {
                tracing::info!(%location, "snapshot loaded");
                return Ok(ResolvedSnapshot {
                    location: location.clone(),
                    snapshot: res.snapshot,
                    last_modified: res.last_modified,
                });
            }
            Err(err) => {
                let detail = format!("{err:#}");
                tracing::warn!(%location, error = %detail, "snapshot location skipped");
                attempts.push(LocationFailure {
                    location: location.clone(),
                    detail,
                });
            }
        }
    }

    Err(DashboardError::SourceUnavailable { attempts })
}
