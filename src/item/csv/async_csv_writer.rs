use std::borrow::Borrow;

use log::{debug, error};
use serde::Serialize;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;

use crate::{
    core::{
        schema::{DynamicRecord, JsonRecord, Tabular, to_json_record},
        table::{TableEncoder, TableStatus},
    },
    error::{Result, TabularError},
};

use super::csv_writer::CsvItemWriterBuilder;

/// Asynchronous counterpart of
/// [`CsvItemWriter`](super::csv_writer::CsvItemWriter) for tokio sinks.
///
/// Every chunk is awaited before the next one is issued, so header and rows
/// reach the sink strictly in order, followed by a single flush. When a
/// [`CancellationToken`] is attached it is checked between rows; a cancelled
/// table returns [`TabularError::Cancelled`] and the sink is not flushed.
pub struct AsyncCsvItemWriter<R, W> {
    stream: W,
    encoder: TableEncoder<R>,
    buffer: String,
    cancellation: Option<CancellationToken>,
}

impl<R, W: AsyncWrite + Unpin> AsyncCsvItemWriter<R, W> {
    fn new(encoder: TableEncoder<R>, wtr: W) -> AsyncCsvItemWriter<R, W> {
        AsyncCsvItemWriter {
            stream: wtr,
            encoder,
            buffer: String::new(),
            cancellation: None,
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> AsyncCsvItemWriter<R, W> {
        self.cancellation = Some(token);
        self
    }

    /// Writes a whole table and returns the number of data rows.
    pub async fn write_table<I>(&mut self, records: I) -> Result<usize>
    where
        I: IntoIterator,
        I::Item: Borrow<R>,
    {
        self.run(records.into_iter().map(Ok)).await
    }

    /// Writes a single record, preceded by the header if it is the first one.
    pub async fn write_record(&mut self, record: &R) -> Result<()> {
        self.buffer.clear();
        self.encoder.encode(record, &mut self.buffer)?;
        self.stream.write_all(self.buffer.as_bytes()).await?;
        Ok(())
    }

    pub fn status(&self) -> TableStatus {
        self.encoder.status()
    }

    pub fn into_inner(self) -> W {
        self.stream
    }

    async fn run<I, B>(&mut self, records: I) -> Result<usize>
    where
        I: Iterator<Item = Result<B>>,
        B: Borrow<R>,
    {
        self.encoder.reset();

        let result = self.emit_all(records).await;
        if let Err(err) = &result {
            error!("Table write aborted: {}", err);
        }
        result
    }

    async fn emit_all<I, B>(&mut self, records: I) -> Result<usize>
    where
        I: Iterator<Item = Result<B>>,
        B: Borrow<R>,
    {
        self.buffer.clear();
        self.encoder.begin(&mut self.buffer)?;
        self.stream.write_all(self.buffer.as_bytes()).await?;

        for record in records {
            if self.is_cancelled() {
                debug!("Table cancelled after {} rows", self.encoder.rows());
                return Err(TabularError::Cancelled);
            }
            self.write_record(record?.borrow()).await?;
        }

        self.stream.flush().await?;
        Ok(self.encoder.finish())
    }

    fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    }
}

impl<W: AsyncWrite + Unpin> AsyncCsvItemWriter<JsonRecord, W> {
    /// Writes serializable records through the first-record schema path.
    pub async fn write_serialized<I, S>(&mut self, records: I) -> Result<usize>
    where
        I: IntoIterator<Item = S>,
        S: Serialize,
    {
        self.run(records.into_iter().map(|record| to_json_record(&record)))
            .await
    }
}

impl CsvItemWriterBuilder {
    /// Asynchronous writer for a [`Tabular`] record type.
    pub fn from_async_writer<R: Tabular, W: AsyncWrite + Unpin>(
        self,
        wtr: W,
    ) -> AsyncCsvItemWriter<R, W> {
        AsyncCsvItemWriter::new(TableEncoder::declared(self.dialect, self.has_headers), wtr)
    }

    /// Asynchronous writer for keyed mappings.
    pub fn dynamic_from_async_writer<R: DynamicRecord, W: AsyncWrite + Unpin>(
        self,
        wtr: W,
    ) -> AsyncCsvItemWriter<R, W> {
        AsyncCsvItemWriter::new(
            TableEncoder::first_record(self.dialect, self.has_headers),
            wtr,
        )
    }
}
