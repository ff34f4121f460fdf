use crate::snapshot::Snapshot;
use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// Parses `YYYY-MM-DD[ T]HH:MM[:SS[.fff]][Z|±HH:MM]`. A missing zone means UTC; explicit
/// offsets are converted to UTC.
pub fn normalize_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim().replacen(' ', "T", 1);
    let (body, offset) = split_zone(&s)?;

    let naive = NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(body, fmt).ok())?;

    let local = offset.from_local_datetime(&naive).single()?;
    Some(local.with_timezone(&Utc))
}

fn split_zone(s: &str) -> Option<(&str, FixedOffset)> {
    let utc = FixedOffset::east_opt(0)?;
    if let Some(body) = s.strip_suffix('Z').or_else(|| s.strip_suffix('z')) {
        return Some((body, utc));
    }

    let tail = s.len().checked_sub(6).and_then(|at| s.get(at..));
    if let Some(tail) = tail.filter(|_| s.len() > 6) {
        let tb = tail.as_bytes();
        if matches!(tb[0], b'+' | b'-') && tb[3] == b':' {
            let hours: i32 = tail.get(1..3)?.parse().ok()?;
            let minutes: i32 = tail.get(4..6)?.parse().ok()?;
            let secs = (hours * 3600 + minutes * 60) * if tb[0] == b'-' { -1 } else { 1 };
            return Some((&s[..s.len() - 6], FixedOffset::east_opt(secs)?));
        }
    }

    Some((s, utc))
}

/// `YYYY-MM-DD HH:MM`, seconds trimmed.
pub fn revised_stamp(dt: DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d %H:%M").to_string()
}

pub fn last_revised_text(dt: DateTime<Utc>) -> String {
    format!("Last Revised: {} UTC", revised_stamp(dt))
}

/// First parseable revision time carried by the snapshot itself. Unparseable candidates
/// fall through to the next one.
pub fn snapshot_revision_time(snapshot: &Snapshot) -> Option<DateTime<Utc>> {
    let tr = snapshot.trade_recommendation.as_ref();
    [
        snapshot.meta.last_updated_utc.as_deref(),
        snapshot.as_of_timestamp.as_deref(),
        tr.and_then(|t| t.generated_at_utc.as_deref()),
        snapshot.meta.trade_rec_last_generated.as_deref(),
    ]
    .into_iter()
    .flatten()
    .find_map(|candidate| {
        let parsed = normalize_timestamp(candidate);
        if parsed.is_none() {
            tracing::debug!(candidate, "unparseable snapshot timestamp");
        }
        parsed
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{SnapshotMeta, TradeRecommendation};

    fn stamp(s: &str) -> Option<String> {
        normalize_timestamp(s).map(last_revised_text)
    }

    #[test]
    fn missing_zone_is_utc_and_seconds_are_trimmed() {
        assert_eq!(
            stamp("2025-09-01 14:05:09").as_deref(),
            Some("Last Revised: 2025-09-01 14:05 UTC")
        );
        assert_eq!(
            stamp("2025-09-01 14:05").as_deref(),
            Some("Last Revised: 2025-09-01 14:05 UTC")
        );
    }

    #[test]
    fn accepts_z_fractions_and_offsets() {
        assert_eq!(
            stamp("2025-09-01T14:05:09.123Z").as_deref(),
            Some("Last Revised: 2025-09-01 14:05 UTC")
        );
        assert_eq!(
            stamp("2025-09-02T08:00Z").as_deref(),
            Some("Last Revised: 2025-09-02 08:00 UTC")
        );
        assert_eq!(
            stamp("2025-09-01T20:30:00-07:00").as_deref(),
            Some("Last Revised: 2025-09-02 03:30 UTC")
        );
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(normalize_timestamp(""), None);
        assert_eq!(normalize_timestamp("yesterday"), None);
        assert_eq!(normalize_timestamp("2025-13-01 00:00"), None);
    }

    #[test]
    fn snapshot_candidates_fall_through() {
        let snapshot = Snapshot {
            as_of_timestamp: Some("not a time".to_string()),
            trade_recommendation: Some(TradeRecommendation {
                generated_at_utc: Some("2025-09-03 12:00:00".to_string()),
                ..Default::default()
            }),
            meta: SnapshotMeta {
                last_updated_utc: None,
                trade_rec_last_generated: Some("2025-01-01 00:00:00".to_string()),
            },
            ..Default::default()
        };
        assert_eq!(
            snapshot_revision_time(&snapshot).map(revised_stamp).as_deref(),
            Some("2025-09-03 12:00")
        );
        assert_eq!(snapshot_revision_time(&Snapshot::default()), None);
    }
}
