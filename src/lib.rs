#![cfg_attr(docsrs, feature(doc_cfg))]
//#![warn(missing_docs)]

/*!
 # Tabular CSV for Rust

 **Tabular CSV** writes sequences of records as delimited text (the CSV family)
 following a configurable dialect. Records are either statically typed values
 that list their own columns, or dynamically keyed mappings whose columns are
 taken from the first record.

 ## Core Concepts

- **Dialect:** delimiter, quote, line terminator, null and newline substitutions,
  forced quoting, column sorting and the number formatting locale.
- **Schema:** the ordered columns of one table, each a name plus a value accessor.
  It is resolved once per table and shared by the header and every row.
- **Field encoding:** how one raw value becomes a safely escaped field.
- **Writers:** `CsvItemWriter` for `std::io::Write` sinks and, with the `async`
  feature, `AsyncCsvItemWriter` for tokio sinks.

 ## Features

| **Feature**   | **Description**                                               |
|---------------|---------------------------------------------------------------|
| async         | Enables `AsyncCsvItemWriter` over `tokio::io::AsyncWrite`     |
| full          | Enables all available features                                |

 ## Getting Started

```rust
use tabular_csv::{
    core::schema::{Column, Tabular},
    error::TabularError,
    item::csv::csv_writer::CsvItemWriterBuilder,
};

struct Person {
    name: String,
    age: u32,
}

impl Tabular for Person {
    fn columns() -> Vec<Column<Self>> {
        vec![
            Column::new("Name", |p: &Person| p.name.as_str().into()),
            Column::new("Age", |p: &Person| p.age.into()),
        ]
    }
}

fn main() -> Result<(), TabularError> {
    let people = vec![
        Person { name: "A;B".to_string(), age: 5 },
        Person { name: "C\"D".to_string(), age: 7 },
    ];

    let writer = CsvItemWriterBuilder::new()
        .has_headers(true)
        .from_writer::<Person, _>(Vec::new());

    let rows = writer.write_table(&people)?;
    assert_eq!(rows, 2);

    let csv = String::from_utf8(writer.into_inner()).unwrap();
    assert_eq!(csv, "\"Name\";\"Age\"\r\n\"A;B\";5\r\n\"C\"\"D\";7\r\n");

    Ok(())
}
```

 ## License
 Licensed under either of

 -   Apache License, Version 2.0
     ([LICENSE-APACHE](LICENSE-APACHE) or <http://www.apache.org/licenses/LICENSE-2.0>)
 -   MIT license
     ([LICENSE-MIT](LICENSE-MIT) or <http://opensource.org/licenses/MIT>)

 at your option.

 ## Contribution
 Unless you explicitly state otherwise, any contribution intentionally submitted
 for inclusion in the work by you, as defined in the Apache-2.0 license, shall be
 dual licensed as above, without any additional terms or conditions

 */

/// Core module: dialect, values, field encoding, schemas and table state
pub mod core;

/// Error types for table writing
pub mod error;

#[doc(inline)]
pub use error::*;

/// Set of item writers (csv blocking and async writers)
pub mod item;
