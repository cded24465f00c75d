//! Synchronous CSV reader with iterator interface
//!
//! Provides a streaming iterator over wallet commands from a CSV file.
//! Delegates CSV format concerns to the csv_format module.
//!
//! # Iterator Interface
//!
//! SyncReader implements the Iterator trait, yielding
//! `Result<CommandRecord, LedgerError>` for each CSV row:
//!
//! ```no_run
//! use wallet_ledger::io::sync_reader::SyncReader;
//! use std::path::Path;
//!
//! let reader = SyncReader::new(Path::new("commands.csv")).unwrap();
//! for result in reader {
//!     match result {
//!         Ok(record) => println!("Replaying command: {:?}", record),
//!         Err(e) => eprintln!("Error: {}", e),
//!     }
//! }
//! ```
//!
//! # Error Handling
//!
//! - Fatal errors (file not found, I/O errors) are returned from `new()`
//! - Individual record errors are yielded as `ParseError`s carrying the line
//!   number (the header is line 1)
//!
//! Records are read one at a time; memory use does not grow with the file.

use crate::io::csv_format::{at_line, convert_csv_record, CsvRecord};
use crate::types::{CommandRecord, LedgerError};
use csv::{Position, ReaderBuilder, StringRecord, Trim};
use std::fs::File;
use std::io::ErrorKind;
use std::path::Path;

/// Synchronous CSV reader
#[derive(Debug)]
pub struct SyncReader {
    reader: csv::Reader<File>,
    headers: StringRecord,
    record: StringRecord,
}

/// Open `path`, telling a missing file apart from other I/O failures
pub(crate) fn open_error(path: &Path, error: std::io::Error) -> LedgerError {
    if error.kind() == ErrorKind::NotFound {
        LedgerError::FileNotFound {
            path: path.display().to_string(),
        }
    } else {
        LedgerError::IoError {
            message: format!("Failed to open file '{}': {}", path.display(), error),
        }
    }
}

impl SyncReader {
    /// Create a new SyncReader from a file path
    ///
    /// The CSV reader is configured to:
    /// - Trim whitespace from all fields
    /// - Allow flexible field counts (trailing optional columns may be omitted)
    /// - Use an 8KB buffer
    ///
    /// # Returns
    ///
    /// * `Ok(SyncReader)` if the file opened successfully
    /// * `Err(LedgerError::FileNotFound)` if the file does not exist
    /// * `Err(LedgerError::IoError)` for any other open failure
    pub fn new(path: &Path) -> Result<Self, LedgerError> {
        let file = File::open(path).map_err(|e| open_error(path, e))?;

        let mut reader = ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .buffer_capacity(8 * 1024)
            .from_reader(file);
        let headers = reader.headers()?.clone();

        Ok(Self {
            reader,
            headers,
            record: StringRecord::new(),
        })
    }
}

impl Iterator for SyncReader {
    type Item = Result<CommandRecord, LedgerError>;

    /// Get the next command from the CSV file
    ///
    /// # Returns
    ///
    /// * `Some(Ok(CommandRecord))` - Successfully parsed command
    /// * `Some(Err(LedgerError::ParseError))` - Parse or conversion error with line number
    /// * `None` - End of file reached
    fn next(&mut self) -> Option<Self::Item> {
        match self.reader.read_record(&mut self.record) {
            Ok(false) => None,
            Ok(true) => {
                // A quoted field may span several physical lines
                let line = self.record.position().map_or(0, Position::line);
                let converted = self
                    .record
                    .deserialize::<CsvRecord>(Some(&self.headers))
                    .map_err(LedgerError::from)
                    .and_then(convert_csv_record)
                    .map_err(|e| at_line(e, line));
                Some(converted)
            }
            Err(e) => Some(Err(LedgerError::from(e))),
        }
    }
}
