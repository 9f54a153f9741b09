//! Record loading.
//!
//! The JSON loader reads an array of flat row objects:
//!
//! ```json
//! [{"start_date": "2012-08-07T14:10:30Z", "lon": -105.0, "lat": 39.7,
//!   "weight": 2.5, "category_type": "theft"}]
//! ```
//!
//! Columns prefixed with `category_` become category columns (sorted by
//! name); other unknown columns are ignored.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use grid_common::time::parse_timestamp;
use serde_json::{Map, Value};

use crate::error::{GeneratorError, Result};
use crate::subsets::CATEGORY_PREFIX;
use crate::types::{Record, RecordSet};

pub const START_DATE_COLUMN: &str = "start_date";
pub const LON_COLUMN: &str = "lon";
pub const LAT_COLUMN: &str = "lat";
pub const WEIGHT_COLUMN: &str = "weight";

/// Loads a tabular recordset from a byte source.
pub trait RecordLoader {
    fn load(&self, reader: &mut dyn Read) -> Result<RecordSet>;

    /// Load from a file on disk.
    fn load_path(&self, path: &Path) -> Result<RecordSet> {
        let file = File::open(path)
            .map_err(|e| GeneratorError::load(format!("{}: {}", path.display(), e)))?;
        self.load(&mut BufReader::new(file))
    }
}

/// Reads a JSON array of row objects.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRecordLoader;

impl RecordLoader for JsonRecordLoader {
    fn load(&self, reader: &mut dyn Read) -> Result<RecordSet> {
        let rows: Vec<Map<String, Value>> = serde_json::from_reader(reader)?;

        let columns: Vec<String> = rows
            .iter()
            .flat_map(|row| row.keys())
            .filter(|key| key.starts_with(CATEGORY_PREFIX))
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut set = RecordSet::new(columns);
        for (n, row) in rows.iter().enumerate() {
            let record = parse_row(row, &set.category_columns)
                .map_err(|e| GeneratorError::load(format!("row {}: {}", n, e)))?;
            set.push(record)?;
        }
        Ok(set)
    }
}

fn parse_row(row: &Map<String, Value>, columns: &[String]) -> std::result::Result<Record, String> {
    let start = row
        .get(START_DATE_COLUMN)
        .and_then(Value::as_str)
        .ok_or_else(|| format!("missing '{}'", START_DATE_COLUMN))?;
    let timestamp = parse_timestamp(start).map_err(|e| e.to_string())?;

    let number = |name: &str| -> std::result::Result<f64, String> {
        row.get(name)
            .and_then(Value::as_f64)
            .ok_or_else(|| format!("missing or non-numeric '{}'", name))
    };
    let lon = number(LON_COLUMN)?;
    let lat = number(LAT_COLUMN)?;

    let weight = match row.get(WEIGHT_COLUMN) {
        None | Some(Value::Null) => None,
        Some(value) => Some(
            value
                .as_f64()
                .ok_or_else(|| format!("non-numeric '{}'", WEIGHT_COLUMN))?,
        ),
    };

    let categories = columns
        .iter()
        .map(|column| match row.get(column) {
            Some(Value::String(s)) => Ok(s.clone()),
            Some(Value::Null) | None => Err(format!("missing '{}'", column)),
            Some(other) => Ok(other.to_string()),
        })
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(Record {
        timestamp,
        lon,
        lat,
        weight,
        categories,
    })
}
