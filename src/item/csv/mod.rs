//! CSV support for writing tabular data.
//!
//! This module turns records into delimited text following a configurable
//! [`Dialect`](crate::core::dialect::Dialect): delimiter, quote, line
//! terminator, null and newline substitutions, forced quoting, column sorting
//! and number locale.
//!
//! # Module Architecture
//!
//! 1. **CsvItemWriter**: a blocking writer over any `std::io::Write` sink. It
//!    implements the [`ItemWriter`](crate::core::item::ItemWriter) trait and
//!    offers `write_table` to write a complete table in one call.
//!
//! 2. **AsyncCsvItemWriter** (feature `async`): the same table semantics over a
//!    `tokio::io::AsyncWrite` sink, with optional cooperative cancellation.
//!
//! Both writers are created from a `CsvItemWriterBuilder`.
//!
//! # Record sources
//!
//! - Types implementing [`Tabular`](crate::core::schema::Tabular) list their
//!   columns up front; the header is written even for an empty table.
//! - Mappings implementing [`DynamicRecord`](crate::core::schema::DynamicRecord)
//!   take their columns from the first record. Later records are read through
//!   that same schema: a missing key is written as null and an extra key is
//!   ignored.
//! - Any `serde::Serialize` type can be written through `write_serialized`,
//!   which converts each record into an ordered JSON object first.
//!
//! # Ownership and Borrowing Considerations
//!
//! Writers own their sink. Use `into_inner` to get it back once the table has
//! been written, for instance to inspect an in-memory buffer.
//!
//! # Examples
//!
//! ```
//! use std::collections::BTreeMap;
//! use tabular_csv::core::{dialect::DialectBuilder, value::Value};
//! use tabular_csv::item::csv::csv_writer::CsvItemWriterBuilder;
//!
//! let mut row = BTreeMap::new();
//! row.insert("note".to_string(), Value::from("first\r\nsecond"));
//! row.insert("missing".to_string(), Value::Null);
//!
//! let dialect = DialectBuilder::new()
//!     .delimiter(",")
//!     .null_substitution("NULL")
//!     .newline_substitution(" ")
//!     .build()
//!     .unwrap();
//!
//! let wtr = CsvItemWriterBuilder::new()
//!     .dialect(dialect)
//!     .has_headers(false)
//!     .dynamic_from_writer::<BTreeMap<String, Value>, _>(vec![]);
//! wtr.write_table(vec![row]).unwrap();
//!
//! assert_eq!(String::from_utf8(wtr.into_inner()).unwrap(), "NULL,first second\r\n");
//! ```

/// A module providing facilities for writing CSV data records.
pub mod csv_writer;

#[cfg(feature = "async")]
/// A module providing an asynchronous CSV writer on top of tokio.
pub mod async_csv_writer;
