//! Loading and validation of the daily rental dataset.
//!
//! The dataset is read once and never mutated afterwards. Each record keeps
//! its source CSV row so a filtered subset can be exported with the exact
//! schema it was loaded with.

use anyhow::{Context, Result, anyhow, bail};
use chrono::{Datelike, NaiveDate};
use csv::StringRecord;
use flate2::read::GzDecoder;
use serde::Deserialize;
use std::collections::{BTreeSet, HashSet};
use std::io::Read;
use tracing::{debug, info, warn};

use crate::domain::{DayOfWeek, DayType, HolidayClass, Season, Weather, YearMonth};
use crate::fetch::read_source;

/// Columns written for records built in code rather than loaded from a file.
pub const CANONICAL_HEADERS: [&str; 8] = [
    "dteday",
    "season",
    "holiday",
    "workingday",
    "weathersit",
    "casual",
    "registered",
    "cnt",
];

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Fails unless every column the report reads is present in `headers`.
fn check_headers(headers: &StringRecord) -> Result<()> {
    let missing: Vec<&str> = CANONICAL_HEADERS
        .iter()
        .copied()
        .filter(|name| !headers.iter().any(|h| h == *name))
        .collect();

    if !missing.is_empty() {
        bail!("dataset header is missing columns: {}", missing.join(", "));
    }
    Ok(())
}

/// The subset of dataset columns the report reads. Extra columns are ignored.
#[derive(Debug, Deserialize)]
struct DayRow {
    dteday: NaiveDate,
    season: u8,
    holiday: u8,
    workingday: u8,
    weathersit: u8,
    casual: u32,
    registered: u32,
    cnt: u32,
}

/// One day of rentals, with its categorical codes already mapped.
#[derive(Debug, Clone)]
pub struct RentalRecord {
    pub date: NaiveDate,
    pub season: Season,
    pub holiday: HolidayClass,
    pub day_type: DayType,
    pub weather: Weather,
    pub casual: u32,
    pub registered: u32,
    /// Always `casual + registered`, widened so the sum cannot overflow.
    pub total: u64,

    // derived from `date`
    pub year: i32,
    pub month: u32,
    pub day_of_week: DayOfWeek,

    raw: StringRecord,
}

impl RentalRecord {
    /// Builds a record in code. `total` is always `casual + registered`.
    pub fn new(
        date: NaiveDate,
        season: Season,
        holiday: HolidayClass,
        day_type: DayType,
        weather: Weather,
        casual: u32,
        registered: u32,
    ) -> Self {
        let total = u64::from(casual) + u64::from(registered);
        let raw = StringRecord::from(vec![
            date.format("%Y-%m-%d").to_string(),
            season.code().to_string(),
            holiday.code().to_string(),
            day_type.code().to_string(),
            weather.code().to_string(),
            casual.to_string(),
            registered.to_string(),
            total.to_string(),
        ]);

        RentalRecord {
            date,
            season,
            holiday,
            day_type,
            weather,
            casual,
            registered,
            total,
            year: date.year(),
            month: date.month(),
            day_of_week: date.weekday().into(),
            raw,
        }
    }

    fn from_row(row: DayRow, raw: StringRecord) -> Result<Self> {
        let season = Season::from_code(row.season)
            .ok_or_else(|| anyhow!("season code {} is not in 1..=4", row.season))?;
        let weather = Weather::from_code(row.weathersit)
            .ok_or_else(|| anyhow!("weathersit code {} is not in 1..=4", row.weathersit))?;
        let holiday = HolidayClass::from_code(row.holiday)
            .ok_or_else(|| anyhow!("holiday flag {} is not 0 or 1", row.holiday))?;
        let day_type = DayType::from_code(row.workingday)
            .ok_or_else(|| anyhow!("workingday flag {} is not 0 or 1", row.workingday))?;

        if u64::from(row.casual) + u64::from(row.registered) != u64::from(row.cnt) {
            bail!(
                "cnt {} is not casual {} + registered {}",
                row.cnt,
                row.casual,
                row.registered
            );
        }

        Ok(RentalRecord {
            date: row.dteday,
            season,
            holiday,
            day_type,
            weather,
            casual: row.casual,
            registered: row.registered,
            total: u64::from(row.cnt),
            year: row.dteday.year(),
            month: row.dteday.month(),
            day_of_week: row.dteday.weekday().into(),
            raw,
        })
    }

    pub fn year_month(&self) -> YearMonth {
        YearMonth {
            year: self.year,
            month: self.month,
        }
    }

    /// The CSV row this record was loaded from.
    pub fn raw(&self) -> &StringRecord {
        &self.raw
    }
}

/// The full, immutable set of rental days.
#[derive(Debug, Clone)]
pub struct Dataset {
    headers: StringRecord,
    records: Vec<RentalRecord>,
}

impl Dataset {
    /// Loads a dataset from a file path or an HTTP(S) URL.
    #[tracing::instrument]
    pub fn load(source: &str) -> Result<Self> {
        let bytes = read_source(source)?;
        let dataset =
            Self::from_bytes(&bytes).with_context(|| format!("failed to load dataset '{source}'"))?;

        if dataset.is_empty() {
            warn!("Dataset has a header but no rows");
        }
        info!(records = dataset.len(), "Dataset loaded");
        Ok(dataset)
    }

    /// Parses CSV bytes, transparently decompressing gzip input.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.starts_with(&GZIP_MAGIC) {
            debug!("Gzip input detected");
            Self::from_reader(GzDecoder::new(bytes))
        } else {
            Self::from_reader(bytes)
        }
    }

    /// Parses and validates CSV input with a header row.
    ///
    /// # Errors
    ///
    /// Any unreadable or invalid row is fatal. The message names the 1-based
    /// data row (the header is not counted).
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::Reader::from_reader(reader);
        let headers = rdr.headers().context("failed to read dataset header")?.clone();
        check_headers(&headers)?;

        let mut records = Vec::new();
        let mut seen = HashSet::new();

        for (idx, result) in rdr.records().enumerate() {
            let row_number = idx + 1;
            let raw = result.with_context(|| format!("failed to read data row {row_number}"))?;
            let row: DayRow = raw
                .deserialize(Some(&headers))
                .with_context(|| format!("failed to parse data row {row_number}"))?;
            let record = RentalRecord::from_row(row, raw)
                .with_context(|| format!("invalid data row {row_number}"))?;

            if !seen.insert(record.date) {
                bail!("duplicate date {} on data row {row_number}", record.date);
            }
            records.push(record);
        }

        Ok(Dataset { headers, records })
    }

    /// Wraps records built in code, using [`CANONICAL_HEADERS`].
    pub fn from_records(records: Vec<RentalRecord>) -> Result<Self> {
        let mut seen = HashSet::new();
        for record in &records {
            if !seen.insert(record.date) {
                bail!("duplicate date {}", record.date);
            }
        }

        Ok(Dataset {
            headers: StringRecord::from(CANONICAL_HEADERS.to_vec()),
            records,
        })
    }

    pub fn headers(&self) -> &StringRecord {
        &self.headers
    }

    pub fn records(&self) -> &[RentalRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct years present, ascending.
    pub fn years(&self) -> Vec<i32> {
        self.distinct(|r| r.year)
    }

    /// Distinct seasons present, in domain order.
    pub fn seasons(&self) -> Vec<Season> {
        self.distinct(|r| r.season)
    }

    /// Distinct day types present, in domain order.
    pub fn day_types(&self) -> Vec<DayType> {
        self.distinct(|r| r.day_type)
    }

    fn distinct<K: Ord>(&self, key: impl Fn(&RentalRecord) -> K) -> Vec<K> {
        self.records
            .iter()
            .map(key)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}
