use crate::datasets::{DatasetSpec, FailureReporting, ShapeValidator};
use crate::domain::indicators::SnapshotHeader;
use anyhow::{bail, Context};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};

const LOAD_FAILED_MESSAGE: &str = "Failed to load snapshot data";

/// A parsed, shape-checked snapshot document.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub last_update: DateTime<Utc>,
    pub body: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotSource {
    Live,
    Missing,
    Invalid { error: String },
}

impl SnapshotSource {
    pub fn is_fallback(&self) -> bool {
        !matches!(self, SnapshotSource::Live)
    }
}

#[derive(Debug, Clone)]
pub struct DatasetResponse {
    pub body: Map<String, Value>,
    pub source: SnapshotSource,
    pub last_update: DateTime<Utc>,
    pub stale: bool,
}

pub fn parse_snapshot(bytes: &[u8], validator: ShapeValidator) -> anyhow::Result<Snapshot> {
    let value: Value = serde_json::from_slice(bytes).context("snapshot is not valid JSON")?;
    let header = SnapshotHeader::deserialize(&value)
        .context("snapshot is missing lastUpdate/source")?;
    validator(&value)?;

    let Value::Object(body) = value else {
        bail!("snapshot must be a JSON object");
    };

    Ok(Snapshot {
        last_update: header.last_update,
        body,
    })
}

/// Strictly older than the threshold; a snapshot exactly `threshold` old is fresh.
pub fn is_stale(last_update: DateTime<Utc>, now: DateTime<Utc>, threshold: chrono::Duration) -> bool {
    now.signed_duration_since(last_update) > threshold
}

async fn read_snapshot(spec: &DatasetSpec) -> anyhow::Result<Option<Snapshot>> {
    let bytes = match tokio::time::timeout(spec.read_timeout, tokio::fs::read(&spec.path)).await {
        Err(_) => bail!(
            "snapshot read timed out after {}ms ({})",
            spec.read_timeout.as_millis(),
            spec.path.display()
        ),
        Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Ok(res) => res.with_context(|| format!("failed to read {}", spec.path.display()))?,
    };

    parse_snapshot(&bytes, spec.validator).map(Some)
}

/// Read the dataset snapshot, falling back to the configured record on any
/// failure. Never errors: the worst case is the fallback body with `stale: true`.
pub async fn load_cached_dataset(spec: &DatasetSpec, now: DateTime<Utc>) -> DatasetResponse {
    let (snapshot, source) = match read_snapshot(spec).await {
        Ok(Some(snapshot)) => (snapshot, SnapshotSource::Live),
        Ok(None) => {
            tracing::debug!(dataset = %spec.id, path = %spec.path.display(), "snapshot missing; serving fallback");
            (spec.fallback.clone(), SnapshotSource::Missing)
        }
        Err(err) => {
            tracing::warn!(dataset = %spec.id, error = %format!("{err:#}"), "snapshot unreadable; serving fallback");
            (
                spec.fallback.clone(),
                SnapshotSource::Invalid {
                    error: format!("{err:#}"),
                },
            )
        }
    };

    let stale = match source {
        SnapshotSource::Live => is_stale(snapshot.last_update, now, spec.stale_after),
        _ => true,
    };

    let mut body = snapshot.body;
    if spec.reporting == FailureReporting::SuccessFlag {
        match &source {
            SnapshotSource::Invalid { .. } => {
                body.insert("success".to_string(), Value::Bool(false));
                body.insert("error".to_string(), Value::String(LOAD_FAILED_MESSAGE.to_string()));
            }
            _ => {
                body.insert("success".to_string(), Value::Bool(true));
            }
        }
    }
    body.insert("stale".to_string(), Value::Bool(stale));

    DatasetResponse {
        body,
        source,
        last_update: snapshot.last_update,
        stale,
    }
}
