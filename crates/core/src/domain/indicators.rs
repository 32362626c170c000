//! Typed views over the dataset snapshots produced by the scraper.
//!
//! Snapshots are served back to callers as raw JSON objects; these structs
//! only exist to reject documents that do not have the expected shape.
//! Business rules (history order, rate corridor, prices) never reject a
//! snapshot: they are reported as anomalies and logged.

use anyhow::Context;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Fields every snapshot carries regardless of dataset.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotHeader {
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub last_update: DateTime<Utc>,
    pub source: String,
}

/// Parse an ISO 8601 timestamp. Offset-less date-times and bare dates are
/// taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn deserialize_timestamp<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
    let raw = String::deserialize(d)?;
    parse_timestamp(&raw).ok_or_else(|| D::Error::custom(format!("invalid timestamp: {raw:?}")))
}

pub trait IndicatorShape: DeserializeOwned {
    /// Rule violations worth logging; they never reject the snapshot.
    fn anomalies(&self) -> Vec<String> {
        Vec::new()
    }
}

fn shape_name<T>() -> &'static str {
    std::any::type_name::<T>().rsplit("::").next().unwrap_or("dataset")
}

/// Deserialize `value` as `T`, logging its anomalies. Only a structural
/// mismatch (missing field, wrong type) is an error.
pub fn validate_shape<T: IndicatorShape>(value: &Value) -> anyhow::Result<()> {
    let parsed = T::deserialize(value)
        .with_context(|| format!("snapshot does not match {} shape", shape_name::<T>()))?;
    for anomaly in parsed.anomalies() {
        tracing::warn!(shape = shape_name::<T>(), %anomaly, "serving snapshot with anomaly");
    }
    Ok(())
}

/// Histories may be written oldest-first or newest-first; only a mix of the
/// two is reported.
fn ordering_anomaly<'a>(keys: impl Iterator<Item = &'a str>, what: &str) -> Option<String> {
    let keys: Vec<&str> = keys.collect();
    let ascending = keys.windows(2).all(|w| w[0] <= w[1]);
    let descending = keys.windows(2).all(|w| w[0] >= w[1]);
    (!ascending && !descending).then(|| format!("{what} history is not sorted by date"))
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BceRates {
    pub main_refinancing_rate: f64,
    pub deposit_facility_rate: f64,
    pub marginal_lending_rate: f64,
    pub history: Vec<RatePoint>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RatePoint {
    pub date: String,
    pub rate: f64,
}

impl IndicatorShape for BceRates {
    fn anomalies(&self) -> Vec<String> {
        let mut out = Vec::new();
        if !(self.deposit_facility_rate <= self.main_refinancing_rate
            && self.main_refinancing_rate <= self.marginal_lending_rate)
        {
            out.push(format!(
                "ECB corridor out of order: deposit={} main={} marginal={}",
                self.deposit_facility_rate, self.main_refinancing_rate, self.marginal_lending_rate
            ));
        }
        out.extend(ordering_anomaly(self.history.iter().map(|p| p.date.as_str()), "rates"));
        out
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BtpYields {
    pub btp10y: f64,
    pub bund10y: f64,
    pub spread: f64,
    pub history: Vec<YieldPoint>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct YieldPoint {
    pub date: String,
    pub btp10y: f64,
    pub spread: f64,
}

impl IndicatorShape for BtpYields {
    fn anomalies(&self) -> Vec<String> {
        ordering_anomaly(self.history.iter().map(|p| p.date.as_str()), "yields")
            .into_iter()
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IstatInflazione {
    pub current: f64,
    pub previous: f64,
    pub core: Option<f64>,
    pub reference_month: String,
    pub history: Vec<InflationPoint>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InflationPoint {
    pub month: String,
    pub value: f64,
}

impl IndicatorShape for IstatInflazione {
    fn anomalies(&self) -> Vec<String> {
        let mut out = Vec::new();
        if self.reference_month.trim().is_empty() {
            out.push("referenceMonth is empty".to_string());
        }
        out.extend(ordering_anomaly(self.history.iter().map(|p| p.month.as_str()), "inflation"));
        out
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LuxuryRealEstate {
    pub cities: Vec<CityPrice>,
    pub history: Vec<RealEstatePoint>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CityPrice {
    pub city: String,
    pub price_per_sqm: f64,
    pub yearly_change: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RealEstatePoint {
    pub period: String,
    pub average_price_per_sqm: f64,
}

impl IndicatorShape for LuxuryRealEstate {
    fn anomalies(&self) -> Vec<String> {
        let mut out = Vec::new();
        if self.cities.is_empty() {
            out.push("cities is empty".to_string());
        }
        for city in &self.cities {
            if city.city.trim().is_empty() {
                out.push("city name is empty".to_string());
            }
            if city.price_per_sqm <= 0.0 {
                out.push(format!(
                    "pricePerSqm is not positive (city={}, got {})",
                    city.city, city.price_per_sqm
                ));
            }
        }
        out.extend(ordering_anomaly(self.history.iter().map(|p| p.period.as_str()), "real estate"));
        out
    }
}
