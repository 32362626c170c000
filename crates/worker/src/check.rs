use anyhow::Context;
use chrono::{DateTime, Utc};
use patrimonio_core::config::Settings;
use patrimonio_core::datasets::{
    load_cached_dataset, DatasetId, DatasetRegistry, DatasetResponse, SnapshotSource,
};
use serde_json::{json, Value};

pub async fn run(settings: &Settings, dataset: Option<&str>, fail_on_stale: bool) -> anyhow::Result<()> {
    let registry = DatasetRegistry::from_settings(settings)?;
    let only = dataset
        .map(|slug| DatasetId::from_slug(slug).with_context(|| format!("unknown dataset: {slug}")))
        .transpose()?;

    let now = Utc::now();
    let mut unhealthy = Vec::new();
    for spec in registry.iter().filter(|s| only.map_or(true, |id| s.id == id)) {
        let res = load_cached_dataset(spec, now).await;
        let report = report_line(spec.id, &res, now);

        match &res.source {
            SnapshotSource::Live if !res.stale => {
                tracing::info!(dataset = %spec.id, last_update = %res.last_update, "snapshot fresh")
            }
            SnapshotSource::Live => {
                tracing::warn!(dataset = %spec.id, last_update = %res.last_update, "snapshot stale")
            }
            SnapshotSource::Missing => {
                tracing::warn!(dataset = %spec.id, path = %spec.path.display(), "snapshot missing")
            }
            SnapshotSource::Invalid { error } => {
                tracing::error!(dataset = %spec.id, path = %spec.path.display(), %error, "snapshot invalid")
            }
        }

        if res.stale {
            unhealthy.push(spec.id.slug());
        }
        println!("{report}");
    }

    if fail_on_stale && !unhealthy.is_empty() {
        anyhow::bail!("stale or missing snapshots: {}", unhealthy.join(", "));
    }
    Ok(())
}

fn report_line(id: DatasetId, res: &DatasetResponse, now: DateTime<Utc>) -> Value {
    let (source, error) = match &res.source {
        SnapshotSource::Live => ("live", None),
        SnapshotSource::Missing => ("missing", None),
        SnapshotSource::Invalid { error } => ("invalid", Some(error.as_str())),
    };

    json!({
        "dataset": id.slug(),
        "source": source,
        "lastUpdate": res.last_update,
        "ageHours": now.signed_duration_since(res.last_update).num_hours(),
        "staleAfterHours": id.stale_after().num_hours(),
        "stale": res.stale,
        "error": error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use patrimonio_core::datasets::load_fallback;
    use serde_json::Map;
    use std::path::PathBuf;

    fn settings_with_data_dir() -> (Settings, PathBuf) {
        let dir = std::env::temp_dir().join(format!("patrimonio-worker-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let settings = Settings {
            anthropic_api_key: None,
            sentry_dsn: None,
            data_dir: dir.clone(),
            fallback_dir: None,
            site_base_url: "https://example.it".to_string(),
        };
        (settings, dir)
    }

    fn write_fresh_snapshot(dir: &std::path::Path, id: DatasetId) {
        let mut doc = Value::Object(load_fallback(id, None).unwrap().body);
        doc["lastUpdate"] = json!(Utc::now());
        std::fs::write(dir.join(id.file_name()), doc.to_string()).unwrap();
    }

    #[tokio::test]
    async fn unknown_dataset_is_an_error() {
        let (settings, dir) = settings_with_data_dir();
        let err = run(&settings, Some("oro"), false).await.unwrap_err();
        assert!(err.to_string().contains("unknown dataset: oro"), "{err}");
        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn missing_snapshots_fail_only_when_asked() {
        let (settings, dir) = settings_with_data_dir();
        run(&settings, None, false).await.unwrap();

        let err = run(&settings, None, true).await.unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("stale or missing snapshots"), "{message}");
        for id in DatasetId::ALL {
            assert!(message.contains(id.slug()), "{message}");
        }
        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn fresh_dataset_passes_fail_on_stale() {
        let (settings, dir) = settings_with_data_dir();
        write_fresh_snapshot(&dir, DatasetId::BtpYields);

        run(&settings, Some("btp-yields"), true).await.unwrap();
        let err = run(&settings, Some("bce-rates"), true).await.unwrap_err();
        assert!(err.to_string().contains("bce-rates"), "{err}");
        assert!(!err.to_string().contains("btp-yields"), "{err}");
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn report_line_for_invalid_snapshot() {
        let now = Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap();
        let res = DatasetResponse {
            body: Map::new(),
            source: SnapshotSource::Invalid {
                error: "snapshot is not valid JSON".to_string(),
            },
            last_update: now - chrono::Duration::hours(72),
            stale: true,
        };

        let line = report_line(DatasetId::BtpYields, &res, now);
        assert_eq!(line["source"], "invalid");
        assert_eq!(line["ageHours"], 72);
        assert_eq!(line["staleAfterHours"], 48);
        assert_eq!(line["error"], "snapshot is not valid JSON");
    }

    #[test]
    fn report_line_for_live_snapshot_has_null_error() {
        let now = Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap();
        let res = DatasetResponse {
            body: Map::new(),
            source: SnapshotSource::Live,
            last_update: now,
            stale: false,
        };

        let line = report_line(DatasetId::LuxuryRealEstate, &res, now);
        assert_eq!(line["source"], "live");
        assert_eq!(line["staleAfterHours"], 720);
        assert!(line["error"].is_null());
    }
}
