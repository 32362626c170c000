pub mod loader;

use crate::config::Settings;
use crate::domain::indicators::{
    validate_shape, BceRates, BtpYields, IstatInflazione, LuxuryRealEstate,
};
use anyhow::Context;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub use loader::{is_stale, load_cached_dataset, parse_snapshot, DatasetResponse, Snapshot, SnapshotSource};

const DEFAULT_READ_TIMEOUT_MS: u64 = 2000;

pub type ShapeValidator = fn(&Value) -> anyhow::Result<()>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatasetId {
    BceRates,
    BtpYields,
    IstatInflazione,
    LuxuryRealEstate,
}

impl DatasetId {
    pub const ALL: [DatasetId; 4] = [
        DatasetId::BceRates,
        DatasetId::BtpYields,
        DatasetId::IstatInflazione,
        DatasetId::LuxuryRealEstate,
    ];

    pub fn slug(&self) -> &'static str {
        match self {
            DatasetId::BceRates => "bce-rates",
            DatasetId::BtpYields => "btp-yields",
            DatasetId::IstatInflazione => "istat-inflazione",
            DatasetId::LuxuryRealEstate => "luxury-real-estate",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.slug() == slug)
    }

    pub fn file_name(&self) -> String {
        format!("{}.json", self.slug())
    }

    pub fn stale_after(&self) -> chrono::Duration {
        match self {
            DatasetId::LuxuryRealEstate => chrono::Duration::days(30),
            _ => chrono::Duration::hours(48),
        }
    }

    /// Revalidation hint for the HTTP layer (`Cache-Control: max-age`).
    pub fn revalidate(&self) -> Duration {
        match self {
            DatasetId::LuxuryRealEstate => Duration::from_secs(24 * 3600),
            _ => Duration::from_secs(3600),
        }
    }

    pub fn reporting(&self) -> FailureReporting {
        match self {
            DatasetId::IstatInflazione => FailureReporting::SuccessFlag,
            _ => FailureReporting::Silent,
        }
    }

    pub fn validator(&self) -> ShapeValidator {
        match self {
            DatasetId::BceRates => validate_shape::<BceRates>,
            DatasetId::BtpYields => validate_shape::<BtpYields>,
            DatasetId::IstatInflazione => validate_shape::<IstatInflazione>,
            DatasetId::LuxuryRealEstate => validate_shape::<LuxuryRealEstate>,
        }
    }

    fn bundled_fallback(&self) -> &'static str {
        match self {
            DatasetId::BceRates => include_str!("fallbacks/bce-rates.json"),
            DatasetId::BtpYields => include_str!("fallbacks/btp-yields.json"),
            DatasetId::IstatInflazione => include_str!("fallbacks/istat-inflazione.json"),
            DatasetId::LuxuryRealEstate => include_str!("fallbacks/luxury-real-estate.json"),
        }
    }
}

impl std::fmt::Display for DatasetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.slug())
    }
}

/// How a failed snapshot read is reported to callers.
///
/// Both modes answer 200 with fallback data. `SuccessFlag` additionally adds a
/// `success` boolean to every body (and `error` when the read failed), which is
/// what existing inflation-widget clients read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReporting {
    Silent,
    SuccessFlag,
}

#[derive(Debug, Clone)]
pub struct DatasetSpec {
    pub id: DatasetId,
    pub path: PathBuf,
    pub stale_after: chrono::Duration,
    pub revalidate: Duration,
    pub reporting: FailureReporting,
    pub validator: ShapeValidator,
    pub fallback: Snapshot,
    pub read_timeout: Duration,
}

impl DatasetSpec {
    pub fn new(id: DatasetId, data_dir: &Path, fallback: Snapshot) -> Self {
        Self {
            id,
            path: data_dir.join(id.file_name()),
            stale_after: id.stale_after(),
            revalidate: id.revalidate(),
            reporting: id.reporting(),
            validator: id.validator(),
            fallback,
            read_timeout: Duration::from_millis(DEFAULT_READ_TIMEOUT_MS),
        }
    }

    pub fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }
}

/// Parse and validate the fallback record for `id`: an override from
/// `fallback_dir` when one exists, otherwise the bundled document.
pub fn load_fallback(id: DatasetId, fallback_dir: Option<&Path>) -> anyhow::Result<Snapshot> {
    if let Some(dir) = fallback_dir {
        let path = dir.join(id.file_name());
        if path.exists() {
            let bytes = std::fs::read(&path)
                .with_context(|| format!("failed to read fallback override {}", path.display()))?;
            return parse_snapshot(&bytes, id.validator())
                .with_context(|| format!("invalid fallback override {}", path.display()));
        }
    }

    parse_snapshot(id.bundled_fallback().as_bytes(), id.validator())
        .with_context(|| format!("invalid bundled fallback for {id}"))
}

#[derive(Debug, Clone)]
pub struct DatasetRegistry {
    specs: Vec<DatasetSpec>,
}

impl DatasetRegistry {
    pub fn new(specs: Vec<DatasetSpec>) -> Self {
        Self { specs }
    }

    /// Builds one spec per dataset. Fallbacks are parsed here so a broken
    /// override fails startup instead of the first request.
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let read_timeout_ms = std::env::var("SNAPSHOT_READ_TIMEOUT_MS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_READ_TIMEOUT_MS);

        let mut specs = Vec::with_capacity(DatasetId::ALL.len());
        for id in DatasetId::ALL {
            let fallback = load_fallback(id, settings.fallback_dir.as_deref())?;
            specs.push(
                DatasetSpec::new(id, &settings.data_dir, fallback)
                    .with_read_timeout(Duration::from_millis(read_timeout_ms)),
            );
        }

        tracing::debug!(
            data_dir = %settings.data_dir.display(),
            read_timeout_ms,
            "dataset registry ready"
        );
        Ok(Self { specs })
    }

    pub fn get(&self, id: DatasetId) -> Option<&DatasetSpec> {
        self.specs.iter().find(|s| s.id == id)
    }

    pub fn get_by_slug(&self, slug: &str) -> Option<&DatasetSpec> {
        DatasetId::from_slug(slug).and_then(|id| self.get(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &DatasetSpec> {
        self.specs.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_fallbacks_are_valid() {
        for id in DatasetId::ALL {
            let snapshot = load_fallback(id, None).unwrap();
            assert!(snapshot.body.contains_key("history"), "{id} fallback has no history");
        }
    }

    #[test]
    fn slugs_round_trip() {
        for id in DatasetId::ALL {
            assert_eq!(DatasetId::from_slug(id.slug()), Some(id));
        }
        assert_eq!(DatasetId::from_slug("bce"), None);
    }

    #[test]
    fn thresholds_match_dataset_cadence() {
        assert_eq!(DatasetId::BceRates.stale_after(), chrono::Duration::hours(48));
        assert_eq!(DatasetId::BtpYields.stale_after(), chrono::Duration::hours(48));
        assert_eq!(DatasetId::IstatInflazione.stale_after(), chrono::Duration::hours(48));
        assert_eq!(DatasetId::LuxuryRealEstate.stale_after(), chrono::Duration::days(30));
        assert_eq!(DatasetId::LuxuryRealEstate.revalidate(), Duration::from_secs(86_400));
        assert_eq!(DatasetId::BtpYields.revalidate(), Duration::from_secs(3_600));
    }

    #[test]
    fn only_inflation_reports_success_flag() {
        let flagged: Vec<_> = DatasetId::ALL
            .into_iter()
            .filter(|id| id.reporting() == FailureReporting::SuccessFlag)
            .collect();
        assert_eq!(flagged, vec![DatasetId::IstatInflazione]);
    }

    #[test]
    fn fallback_override_replaces_bundled_record() {
        let dir = std::env::temp_dir().join(format!("fallbacks-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("btp-yields.json"),
            r#"{"lastUpdate":"2026-01-02T00:00:00Z","source":"test","btp10y":4.0,"bund10y":3.0,"spread":100.0,"history":[]}"#,
        )
        .unwrap();

        let snapshot = load_fallback(DatasetId::BtpYields, Some(&dir)).unwrap();
        assert_eq!(snapshot.body["source"], "test");

        // No override for this one: bundled record is used.
        let bundled = load_fallback(DatasetId::BceRates, Some(&dir)).unwrap();
        assert_eq!(bundled.body["source"], "Banca Centrale Europea");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn broken_fallback_override_is_an_error() {
        let dir = std::env::temp_dir().join(format!("fallbacks-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("bce-rates.json"), "{not json").unwrap();

        assert!(load_fallback(DatasetId::BceRates, Some(&dir)).is_err());

        std::fs::remove_dir_all(&dir).ok();
    }
}
