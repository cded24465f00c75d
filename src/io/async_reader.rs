//! Asynchronous CSV reader with batch interface
//!
//! Provides batch reading over wallet commands from any `futures` async
//! reader, for the async replay strategy.
//!
//! # Architecture
//!
//! ```text
//! CSV Reader → AsyncReader → Batches of CommandRecords
//!                  ↓
//!           csv_format module
//!           (CsvRecord, convert_csv_record)
//! ```

use crate::io::csv_format::{at_line, convert_csv_record, CsvRecord};
use crate::types::{CommandRecord, LedgerError};
use csv_async::AsyncReaderBuilder;
use futures::io::AsyncRead;
use futures::stream::StreamExt;
use tracing::warn;

/// Asynchronous CSV reader
pub struct AsyncReader<R: AsyncRead + Unpin> {
    csv_reader: csv_async::AsyncDeserializer<R>,
}

impl<R: AsyncRead + Unpin + Send + 'static> AsyncReader<R> {
    /// Create a new AsyncReader, trimming fields and allowing short rows
    pub fn new(reader: R) -> Self {
        let csv_reader = AsyncReaderBuilder::new()
            .flexible(true)
            .trim(csv_async::Trim::All)
            .create_deserializer(reader);

        Self { csv_reader }
    }

    /// Read a batch of commands
    ///
    /// Reads up to `batch_size` rows, converting them to CommandRecords.
    /// Invalid rows are logged with their line number and skipped, so a
    /// batch may hold fewer than `batch_size` commands, or none at all when
    /// every row in it was malformed.
    ///
    /// # Returns
    ///
    /// * `Some(batch)` - The converted commands in file order
    /// * `None` - End of file reached before any row was read
    pub async fn read_batch(&mut self, batch_size: usize) -> Option<Vec<CommandRecord>> {
        let mut batch = Vec::with_capacity(batch_size);
        let mut rows = 0;
        let mut records = self.csv_reader.deserialize_with_pos::<CsvRecord>();

        while rows < batch_size {
            let Some((next, position)) = records.next().await else {
                break;
            };
            rows += 1;

            let converted = next
                .map_err(|e| LedgerError::ParseError {
                    line: None,
                    message: e.to_string(),
                })
                .and_then(convert_csv_record);

            match converted {
                Ok(record) => batch.push(record),
                Err(e) => warn!(
                    error = %at_line(e, position.line()),
                    "skipping malformed command"
                ),
            }
        }

        (rows > 0).then_some(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CommandType;
    use futures::io::Cursor;
    use rust_decimal::Decimal;

    const HEADER: &str = "type,wallet,counterparty,amount,currency,key\n";

    fn reader(rows: &str) -> AsyncReader<Cursor<Vec<u8>>> {
        AsyncReader::new(Cursor::new(format!("{}{}", HEADER, rows).into_bytes()))
    }

    #[tokio::test]
    async fn test_async_reader_read_batch() {
        let mut async_reader = reader(
            "create,alice,,,,\n\
             fund,alice,,100.0,,\n\
             transfer,alice,bob,50,,t1\n",
        );

        let batch = async_reader.read_batch(2).await.unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].command, CommandType::Create);
        assert_eq!(batch[1].amount, Some(Decimal::new(1000, 1)));

        let batch = async_reader.read_batch(2).await.unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].counterparty.as_deref(), Some("bob"));
        assert_eq!(batch[0].idempotency_key.as_deref(), Some("t1"));

        assert!(async_reader.read_batch(2).await.is_none());
    }

    #[tokio::test]
    async fn test_async_reader_empty_csv() {
        let mut async_reader = reader("");

        assert!(async_reader.read_batch(10).await.is_none());
    }

    #[tokio::test]
    async fn test_async_reader_skips_invalid_record() {
        let mut async_reader = reader("withdraw,alice,,1,,\nfund,alice,,50.0,,\n");

        let batch = async_reader.read_batch(10).await.unwrap();

        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].command, CommandType::Fund);
    }

    #[tokio::test]
    async fn test_async_reader_malformed_batch_is_not_end_of_file() {
        let mut async_reader = reader(
            "fund,alice,,oops,,\n\
             withdraw,alice,,1,,\n\
             create,alice,,,,\n\
             fund,alice,,75,,\n",
        );

        let first = async_reader.read_batch(2).await;
        let second = async_reader.read_batch(2).await.unwrap();

        assert_eq!(first, Some(Vec::new()));
        assert_eq!(second.len(), 2);
        assert_eq!(second[1].amount, Some(Decimal::new(75, 0)));
        assert!(async_reader.read_batch(2).await.is_none());
    }

    #[tokio::test]
    async fn test_async_reader_multiline_field_keeps_following_rows() {
        let mut async_reader = reader(
            "fund,\"ali\nce\",,oops,,\n\
             fund,bob,,2,,\n",
        );

        let batch = async_reader.read_batch(10).await.unwrap();

        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].wallet, "bob");
    }

    #[tokio::test]
    async fn test_async_reader_whitespace_and_case() {
        let mut async_reader = reader("  FUND  ,  alice  ,, 100.0 ,,\n");

        let batch = async_reader.read_batch(10).await.unwrap();

        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].command, CommandType::Fund);
        assert_eq!(batch[0].wallet, "alice");
    }
}
