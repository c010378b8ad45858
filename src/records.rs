// 📂 Historical Records - city/day air quality readings
// CSV → records, with rows missing any reading dropped at load

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use crate::category::{classify, AqiCategory, AqiValue};
use crate::pollutants::{Pollutant, PollutantReadings};

// ============================================================================
// RECORD
// ============================================================================

/// One day of readings for one city. Serialized column names match the
/// source dataset so exports can be re-imported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirQualityRecord {
    #[serde(rename = "City")]
    pub city: String,

    #[serde(rename = "Date")]
    pub date: NaiveDate,

    #[serde(rename = "PM2.5")]
    pub pm25: f64,

    #[serde(rename = "PM10")]
    pub pm10: f64,

    #[serde(rename = "NO2")]
    pub no2: f64,

    #[serde(rename = "CO")]
    pub co: f64,

    #[serde(rename = "O3")]
    pub o3: f64,

    #[serde(rename = "AQI")]
    pub aqi: AqiValue,
}

impl AirQualityRecord {
    pub fn readings(&self) -> PollutantReadings {
        PollutantReadings::new(self.pm25, self.pm10, self.no2, self.co, self.o3)
    }

    pub fn reading(&self, pollutant: Pollutant) -> f64 {
        self.readings().get(pollutant)
    }

    pub fn category(&self) -> AqiCategory {
        classify(self.aqi)
    }
}

/// A row as it appears in the dataset: any reading may be blank, and the
/// remaining columns (NO, NOx, SO2, AQI_Bucket, ...) are ignored.
#[derive(Debug, Deserialize)]
struct RawRecord {
    #[serde(rename = "City")]
    city: String,

    #[serde(rename = "Date")]
    date: NaiveDate,

    #[serde(rename = "PM2.5", deserialize_with = "reading")]
    pm25: Option<f64>,

    #[serde(rename = "PM10", deserialize_with = "reading")]
    pm10: Option<f64>,

    #[serde(rename = "NO2", deserialize_with = "reading")]
    no2: Option<f64>,

    #[serde(rename = "CO", deserialize_with = "reading")]
    co: Option<f64>,

    #[serde(rename = "O3", deserialize_with = "reading")]
    o3: Option<f64>,

    #[serde(rename = "AQI", deserialize_with = "reading")]
    aqi: Option<f64>,
}

/// Cell texts treated as a missing reading, alongside blanks.
const MISSING_TOKENS: [&str; 9] = ["na", "n/a", "nan", "-nan", "null", "none", "#n/a", "#na", "<na>"];

/// A reading cell: blanks, NA-style tokens and non-finite numbers are
/// missing; anything else must parse as a number.
fn reading<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };

    let text = raw.trim();
    if text.is_empty() || MISSING_TOKENS.contains(&text.to_lowercase().as_str()) {
        return Ok(None);
    }

    let value: f64 = text
        .parse()
        .map_err(|_| serde::de::Error::custom(format!("invalid reading: {:?}", text)))?;

    Ok(Some(value).filter(|v| v.is_finite()))
}

impl RawRecord {
    /// `None` when any of the six readings is missing or not finite.
    fn complete(self) -> Option<AirQualityRecord> {
        Some(AirQualityRecord {
            city: self.city,
            date: self.date,
            pm25: self.pm25?,
            pm10: self.pm10?,
            no2: self.no2?,
            co: self.co?,
            o3: self.o3?,
            aqi: self.aqi?,
        })
    }
}

// ============================================================================
// LOADING / EXPORT
// ============================================================================

pub fn load_csv(csv_path: &Path) -> Result<Vec<AirQualityRecord>> {
    let file = std::fs::File::open(csv_path)
        .with_context(|| format!("Failed to open CSV file: {:?}", csv_path))?;
    let records = load_csv_from_reader(file)?;

    log::info!("Loaded {} complete records from {:?}", records.len(), csv_path);
    Ok(records)
}

pub fn load_csv_from_reader<R: Read>(reader: R) -> Result<Vec<AirQualityRecord>> {
    let mut rdr = csv::Reader::from_reader(reader);

    let mut records = Vec::new();
    let mut dropped = 0usize;

    for result in rdr.deserialize() {
        let raw: RawRecord = result.context("Failed to deserialize air quality record")?;

        match raw.complete() {
            Some(record) => records.push(record),
            None => dropped += 1,
        }
    }

    if dropped > 0 {
        log::debug!("Dropped {} rows with missing readings", dropped);
    }

    Ok(records)
}

pub fn write_csv<W: Write>(writer: W, records: &[&AirQualityRecord]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for record in records {
        wtr.serialize(record).context("Failed to write air quality record")?;
    }
    wtr.flush().context("Failed to flush CSV output")?;
    Ok(())
}

/// CSV text for a set of records, header included.
pub fn export_csv(records: &[&AirQualityRecord]) -> Result<String> {
    let mut buffer = Vec::new();
    write_csv(&mut buffer, records)?;
    String::from_utf8(buffer).context("CSV output was not valid UTF-8")
}

// ============================================================================
// DATA PORT
// ============================================================================

/// Source of historical records. Implementations hand out a read-only view;
/// nothing downstream mutates it.
pub trait HistoricalDataPort {
    fn records(&self) -> &[AirQualityRecord];
}

/// Records loaded once from a CSV file.
pub struct CsvHistoricalSource {
    path: PathBuf,
    records: Vec<AirQualityRecord>,
}

impl CsvHistoricalSource {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let records = load_csv(&path)?;
        Ok(CsvHistoricalSource { path, records })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HistoricalDataPort for CsvHistoricalSource {
    fn records(&self) -> &[AirQualityRecord] {
        &self.records
    }
}

/// Records held in memory, for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct InMemoryHistoricalSource {
    records: Vec<AirQualityRecord>,
}

impl InMemoryHistoricalSource {
    pub fn new(records: Vec<AirQualityRecord>) -> Self {
        InMemoryHistoricalSource { records }
    }
}

impl HistoricalDataPort for InMemoryHistoricalSource {
    fn records(&self) -> &[AirQualityRecord] {
        &self.records
    }
}

// ============================================================================
// TESTS
// ============================================================================
