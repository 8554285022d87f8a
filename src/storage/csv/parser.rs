//! CSV reader and writer wrapper with configurable options.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Result, VecformError};

/// Typed CSV access that wraps the csv crate with the store's delimiter.
#[derive(Debug, Clone, Copy)]
pub struct CsvParser {
    delimiter: u8,
}

impl Default for CsvParser {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

impl CsvParser {
    /// Creates a parser using `delimiter` as field separator.
    ///
    /// Non-ASCII delimiters are rejected by `CsvStoreConfig::validate`;
    /// here they fall back to a comma.
    #[must_use]
    pub fn new(delimiter: char) -> Self {
        let delimiter = u8::try_from(delimiter).ok().filter(u8::is_ascii).unwrap_or(b',');
        Self { delimiter }
    }

    /// Returns the field separator.
    #[must_use]
    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }

    /// Builds a `csv::Reader` from any Read impl.
    fn build_reader<R: std::io::Read>(&self, rdr: R) -> csv::Reader<R> {
        csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(rdr)
    }

    fn build_writer<W: Write>(&self, wtr: W, write_header: bool) -> csv::Writer<W> {
        csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(write_header)
            .from_writer(wtr)
    }

    /// Reads every record of a headed CSV file.
    ///
    /// # Errors
    ///
    /// Returns a `StorageError` if the file cannot be opened, or a CSV error
    /// naming the offending record if a row cannot be deserialized.
    pub fn read_records<T: DeserializeOwned>(&self, path: &Path) -> Result<Vec<T>> {
        let file = File::open(path).map_err(|e| {
            VecformError::StorageError(format!("Failed to open {}: {e}", path.display()))
        })?;

        let mut reader = self.build_reader(file);
        let mut records = Vec::new();
        for result in reader.deserialize() {
            records.push(result?);
        }
        Ok(records)
    }

    /// Like [`read_records`](Self::read_records), but a missing file reads as empty.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing file cannot be read or parsed.
    pub fn read_records_if_exists<T: DeserializeOwned>(&self, path: &Path) -> Result<Vec<T>> {
        if path.exists() {
            self.read_records(path)
        } else {
            Ok(Vec::new())
        }
    }

    /// Appends records to a file, creating it if needed.
    ///
    /// The header row is written only when the file is new or empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or written.
    pub fn append_records<T: Serialize>(&self, path: &Path, records: &[T]) -> Result<()> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let write_header = file.metadata()?.len() == 0;

        let mut writer = self.build_writer(file, write_header);
        for record in records {
            writer.serialize(record)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Replaces the contents of a file with `records`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or written.
    pub fn rewrite_records<T: Serialize>(&self, path: &Path, records: &[T]) -> Result<()> {
        let file = File::create(path)?;

        let mut writer = self.build_writer(file, true);
        for record in records {
            writer.serialize(record)?;
        }
        writer.flush()?;
        Ok(())
    }
}
