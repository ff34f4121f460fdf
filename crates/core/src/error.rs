use crate::render::{InputWidget, TargetKey};
use std::fmt;

/// Recoverable conditions of the dashboard engine. None of them is fatal: callers log
/// and carry on with whatever state is already rendered.
#[derive(Debug, Clone, PartialEq)]
pub enum DashboardError {
    /// Every candidate snapshot location failed.
    SourceUnavailable { attempts: Vec<LocationFailure> },
    /// The body was fetched but is not a usable snapshot record.
    MalformedSnapshot { location: String, detail: String },
    /// A price widget holds empty or non-numeric text.
    InvalidUserInput { widget: InputWidget, raw: String },
    /// The current page variant has no such render target.
    RenderTargetMissing(TargetKey),
    /// The current page variant has no such input widget.
    WidgetMissing(InputWidget),
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocationFailure {
    pub location: String,
    pub detail: String,
}

impl fmt::Display for DashboardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DashboardError::SourceUnavailable { attempts } => {
                write!(f, "no snapshot available ({} locations tried", attempts.len())?;
                for attempt in attempts {
                    write!(f, "; {}: {}", attempt.location, attempt.detail)?;
                }
                write!(f, ")")
            }
            DashboardError::MalformedSnapshot { location, detail } => {
                write!(f, "malformed snapshot at {location}: {detail}")
            }
            DashboardError::InvalidUserInput { widget, raw } => {
                write!(f, "invalid price input for {widget}: {raw:?}")
            }
            DashboardError::RenderTargetMissing(key) => {
                write!(f, "render target {key} is not present on this page")
            }
            DashboardError::WidgetMissing(widget) => {
                write!(f, "input widget {widget} is not present on this page")
            }
        }
    }
}

impl std::error::Error for DashboardError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_unavailable_lists_attempts() {
        let err = DashboardError::SourceUnavailable {
            attempts: vec![
                LocationFailure {
                    location: "data.json".to_string(),
                    detail: "HTTP 404 Not Found".to_string(),
                },
                LocationFailure {
                    location: "data-3.json".to_string(),
                    detail: "connection refused".to_string(),
                },
            ],
        };
        assert_eq!(
            err.to_string(),
            "no snapshot available (2 locations tried; data.json: HTTP 404 Not Found; data-3.json: connection refused)"
        );
    }

    #[test]
    fn messages_use_stable_keys() {
        let err = DashboardError::RenderTargetMissing(TargetKey::CurrentBase);
        assert_eq!(
            err.to_string(),
            "render target current_base is not present on this page"
        );
    }
}
