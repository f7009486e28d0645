//! CSV backup of a generated series.
//!
//! The backup is written before anything touches the warehouse so a failed
//! load can be retried from disk. Columns follow the destination schema;
//! nulls are empty cells.

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;

use tracing::info;

use crate::{BackupError, DailyPriceRecord};

/// Write `records` to any writer, header first.
pub fn write_records<W: Write>(writer: W, records: &[DailyPriceRecord]) -> Result<(), BackupError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for record in records {
        csv_writer.serialize(record)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Read and validate records from any reader.
pub fn read_records<R: Read>(reader: R) -> Result<Vec<DailyPriceRecord>, BackupError> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut records = Vec::new();
    for row in csv_reader.deserialize::<DailyPriceRecord>() {
        let record = row?;
        record
            .validate()
            .map_err(|source| BackupError::InvalidRecord {
                // header is line 1
                line: records.len() as u64 + 2,
                source,
            })?;
        records.push(record);
    }
    Ok(records)
}

/// Write the backup file, creating parent directories as needed.
pub fn write_csv(path: &Path, records: &[DailyPriceRecord]) -> Result<(), BackupError> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    write_records(File::create(path)?, records)?;
    info!(path = %path.display(), rows = records.len(), "wrote csv backup");
    Ok(())
}

/// Read a backup file written by [`write_csv`].
pub fn read_csv(path: &Path) -> Result<Vec<DailyPriceRecord>, BackupError> {
    let records = read_records(File::open(path)?)?;
    info!(path = %path.display(), rows = records.len(), "read csv backup");
    Ok(records)
}
