//! CSV encoding of odds tables.
//!
//! Tables have the columns `timestamp,selection,odds,inplay`. Timestamps are
//! written as `YYYY-MM-DD HH:MM:SS` and booleans as `True`/`False`, the
//! layout of the tables already sitting in the bucket. Reading is lenient:
//! unknown columns (such as an unnamed index column) are skipped.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use crate::Result;
use crate::series::OddsRecord;

/// Column order of the odds table.
pub const COLUMNS: [&str; 4] = ["timestamp", "selection", "odds", "inplay"];

/// Writes `records` as CSV, header included even for an empty table.
///
/// # Errors
///
/// Returns [`OddsError::Csv`](crate::OddsError::Csv) or
/// [`OddsError::Io`](crate::OddsError::Io) if writing fails.
pub fn write_csv<W: Write>(records: &[OddsRecord], writer: W) -> Result<()> {
    let mut csv = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    csv.write_record(COLUMNS)?;
    for record in records {
        csv.serialize(record)?;
    }
    csv.flush()?;
    Ok(())
}

/// Encodes `records` into an in-memory CSV document.
pub fn to_csv_bytes(records: &[OddsRecord]) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    write_csv(records, &mut buf)?;
    Ok(buf)
}

/// Writes `records` to a CSV file at `path`, replacing any existing file.
pub fn write_csv_file(path: &Path, records: &[OddsRecord]) -> Result<()> {
    let file = File::create(path)?;
    write_csv(records, std::io::BufWriter::new(file))
}

/// Reads an odds table.
///
/// # Errors
///
/// Returns [`OddsError::Csv`](crate::OddsError::Csv) if a row is missing a
/// column or holds a value of the wrong type.
pub fn read_csv<R: Read>(reader: R) -> Result<Vec<OddsRecord>> {
    let mut csv = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);
    let records = csv
        .deserialize::<OddsRecord>()
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(records)
}

/// Serde adapter for `YYYY-MM-DD HH:MM:SS` timestamps.
///
/// Deserialization also accepts a `T` separator and fractional seconds.
pub mod timestamp_format {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer, de};

    const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S: Serializer>(
        timestamp: &NaiveDateTime,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&timestamp.format(FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, "%Y-%m-%d %H:%M:%S%.f")
            .or_else(|_| NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f"))
            .map_err(|e| de::Error::custom(format!("invalid timestamp {raw:?}: {e}")))
    }
}

/// Serde adapter writing `True`/`False` and reading either capitalisation.
pub mod bool_format {
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(if *value { "True" } else { "False" })
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        let raw = String::deserialize(deserializer)?;
        match raw.trim() {
            "True" | "true" | "TRUE" | "1" => Ok(true),
            "False" | "false" | "FALSE" | "0" => Ok(false),
            other => Err(de::Error::custom(format!("invalid boolean {other:?}"))),
        }
    }
}
