use log::debug;

use super::{
    dialect::Dialect,
    field::{encode_header, encode_value},
    schema::{DynamicRecord, Schema, Tabular},
};
use crate::error::{Result, TabularError};

/// Where the columns of a table come from.
enum SchemaSource<R> {
    /// Known from the record type, resolved before the first row.
    Declared(fn(bool) -> Result<Schema<R>>),
    /// Taken from the keys of the first record and reused for all others.
    FirstRecord(fn(&R, bool) -> Result<Schema<R>>),
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum TableStatus {
    /// Nothing rendered yet.
    Start,
    /// Header written (or skipped), rows are being emitted.
    Emitting,
    /// The table has been closed.
    Done,
}

enum TableState<R> {
    Start,
    Emitting { schema: Schema<R>, rows: usize },
    Done { rows: usize },
}

/// Renders one table, header then rows, into text chunks.
///
/// The encoder owns the table state machine but never touches a sink: the
/// blocking and async writers feed it records and write out whatever it
/// appends to their buffer, in order.
pub struct TableEncoder<R> {
    dialect: Dialect,
    has_headers: bool,
    source: SchemaSource<R>,
    state: TableState<R>,
}

impl<R> TableEncoder<R> {
    /// Encoder for a statically known type; the schema is resolved once when
    /// the table begins, so an empty table still gets its header.
    pub fn declared(dialect: Dialect, has_headers: bool) -> TableEncoder<R>
    where
        R: Tabular,
    {
        TableEncoder {
            dialect,
            has_headers,
            source: SchemaSource::Declared(Schema::from_type),
            state: TableState::Start,
        }
    }

    /// Encoder for keyed mappings; the schema comes from the first record.
    pub fn first_record(dialect: Dialect, has_headers: bool) -> TableEncoder<R>
    where
        R: DynamicRecord,
    {
        TableEncoder {
            dialect,
            has_headers,
            source: SchemaSource::FirstRecord(Schema::from_mapping),
            state: TableState::Start,
        }
    }

    pub fn dialect(&self) -> &Dialect {
        &self.dialect
    }

    pub fn status(&self) -> TableStatus {
        match self.state {
            TableState::Start => TableStatus::Start,
            TableState::Emitting { .. } => TableStatus::Emitting,
            TableState::Done { .. } => TableStatus::Done,
        }
    }

    /// Number of data rows rendered so far.
    pub fn rows(&self) -> usize {
        match self.state {
            TableState::Start => 0,
            TableState::Emitting { rows, .. } | TableState::Done { rows } => rows,
        }
    }

    /// Column names, once the schema is known.
    pub fn column_names(&self) -> Option<Vec<&str>> {
        match &self.state {
            TableState::Emitting { schema, .. } => Some(schema.names()),
            _ => None,
        }
    }

    /// Forgets the previous table so a new one can be written.
    pub fn reset(&mut self) {
        self.state = TableState::Start;
    }

    /// Validates the dialect and, for declared schemas, resolves the columns
    /// and appends the header to `out`. Does nothing once the table has begun.
    pub fn begin(&mut self, out: &mut String) -> Result<()> {
        if !matches!(self.state, TableState::Start) {
            return Ok(());
        }

        self.dialect.validate()?;

        if let SchemaSource::Declared(resolve) = self.source {
            let schema = resolve(self.dialect.sort_columns)?;
            self.start_emitting(schema, out);
        }

        Ok(())
    }

    /// Appends the row for `record` to `out`, preceded by the header when
    /// this record is the one the schema is taken from.
    pub fn encode(&mut self, record: &R, out: &mut String) -> Result<()> {
        self.begin(out)?;

        if matches!(self.state, TableState::Start) {
            if let SchemaSource::FirstRecord(resolve) = self.source {
                let schema = resolve(record, self.dialect.sort_columns)?;
                self.start_emitting(schema, out);
            }
        }

        match &mut self.state {
            TableState::Emitting { schema, rows } => {
                let mut fields = Vec::with_capacity(schema.len());
                for column in schema.columns() {
                    let value = column.get(record)?;
                    fields.push(encode_value(&value, &self.dialect));
                }
                push_line(out, &fields, &self.dialect);
                *rows += 1;
                Ok(())
            }
            TableState::Done { .. } => Err(TabularError::Configuration(
                "table already closed, reset it before writing again".to_string(),
            )),
            TableState::Start => unreachable!("schema is resolved before the first row"),
        }
    }

    /// Closes the table and returns the number of data rows.
    pub fn finish(&mut self) -> usize {
        let rows = self.rows();
        if !matches!(self.state, TableState::Done { .. }) {
            debug!("Table finished with {} rows", rows);
        }
        self.state = TableState::Done { rows };
        rows
    }

    fn start_emitting(&mut self, schema: Schema<R>, out: &mut String) {
        if self.has_headers {
            let fields: Vec<String> = schema
                .names()
                .into_iter()
                .map(|name| encode_header(name, &self.dialect))
                .collect();
            push_line(out, &fields, &self.dialect);
            debug!("Header written with {} columns", schema.len());
        } else {
            debug!("Header skipped");
        }

        self.state = TableState::Emitting { schema, rows: 0 };
    }
}

fn push_line(out: &mut String, fields: &[String], dialect: &Dialect) {
    out.push_str(&fields.join(&dialect.delimiter));
    out.push_str(&dialect.line_terminator);
}

#[cfg(test)]
mod tests {
    use super::{TableEncoder, TableStatus};
    use crate::{
        TabularError,
        core::{
            dialect::{Dialect, DialectBuilder},
            schema::{Column, Tabular},
            value::Value,
        },
    };

    struct Person {
        name: &'static str,
        age: u32,
    }

    impl Tabular for Person {
        fn columns() -> Vec<Column<Self>> {
            vec![
                Column::new("Name", |p: &Person| p.name.into()),
                Column::new("Age", |p: &Person| p.age.into()),
            ]
        }
    }

    struct Nothing;

    impl Tabular for Nothing {
        fn columns() -> Vec<Column<Self>> {
            Vec::new()
        }
    }

    type Pairs = Vec<(String, Value)>;

    fn pairs(items: &[(&str, i32)]) -> Pairs {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), Value::from(*v)))
            .collect()
    }

    #[test]
    fn declared_table_renders_header_at_begin() {
        let mut encoder = TableEncoder::<Person>::declared(Dialect::default(), true);
        let mut out = String::new();

        encoder.begin(&mut out).unwrap();
        assert_eq!(out, "\"Name\";\"Age\"\r\n");
        assert_eq!(encoder.status(), TableStatus::Emitting);
        assert_eq!(encoder.column_names(), Some(vec!["Name", "Age"]));

        // begin is idempotent
        encoder.begin(&mut out).unwrap();
        assert_eq!(out, "\"Name\";\"Age\"\r\n");
    }

    #[test]
    fn declared_rows_follow_schema_order() {
        let dialect = DialectBuilder::new().sort_columns(true).build().unwrap();
        let mut encoder = TableEncoder::<Person>::declared(dialect, true);
        let mut out = String::new();

        encoder
            .encode(&Person { name: "A;B", age: 5 }, &mut out)
            .unwrap();

        assert_eq!(out, "\"Age\";\"Name\"\r\n5;\"A;B\"\r\n");
        assert_eq!(encoder.rows(), 1);
        assert_eq!(encoder.finish(), 1);
        assert_eq!(encoder.status(), TableStatus::Done);
    }

    #[test]
    fn header_can_be_skipped() {
        let mut encoder = TableEncoder::<Person>::declared(Dialect::default(), false);
        let mut out = String::new();

        encoder.encode(&Person { name: "x", age: 1 }, &mut out).unwrap();

        assert_eq!(out, "x;1\r\n");
    }

    #[test]
    fn quote_all_applies_to_rows() {
        let dialect = DialectBuilder::new().quote_all_fields(true).build().unwrap();
        let mut encoder = TableEncoder::<Person>::declared(dialect, true);
        let mut out = String::new();

        encoder.encode(&Person { name: "x", age: 1 }, &mut out).unwrap();

        assert_eq!(out, "\"Name\";\"Age\"\r\n\"x\";\"1\"\r\n");
    }

    #[test]
    fn empty_schema_renders_terminated_empty_lines() {
        let mut encoder = TableEncoder::<Nothing>::declared(Dialect::default(), true);
        let mut out = String::new();

        encoder.encode(&Nothing, &mut out).unwrap();
        encoder.encode(&Nothing, &mut out).unwrap();

        assert_eq!(out, "\r\n\r\n\r\n");
    }

    #[test]
    fn first_record_fixes_the_schema() {
        let mut encoder = TableEncoder::<Pairs>::first_record(Dialect::default(), true);
        let mut out = String::new();

        encoder.begin(&mut out).unwrap();
        assert!(out.is_empty());
        assert_eq!(encoder.status(), TableStatus::Start);

        encoder
            .encode(&pairs(&[("b", 1), ("a", 2)]), &mut out)
            .unwrap();
        encoder
            .encode(&pairs(&[("a", 3), ("c", 4)]), &mut out)
            .unwrap();

        assert_eq!(out, "\"b\";\"a\"\r\n1;2\r\n;3\r\n");
    }

    #[test]
    fn first_record_schema_can_be_sorted() {
        let dialect = DialectBuilder::new().sort_columns(true).build().unwrap();
        let mut encoder = TableEncoder::<Pairs>::first_record(dialect, true);
        let mut out = String::new();

        encoder
            .encode(&pairs(&[("b", 1), ("a", 2)]), &mut out)
            .unwrap();

        assert_eq!(out, "\"a\";\"b\"\r\n2;1\r\n");
    }

    #[test]
    fn invalid_dialect_fails_before_rendering() {
        let dialect = Dialect {
            delimiter: String::new(),
            ..Dialect::default()
        };
        let mut encoder = TableEncoder::<Person>::declared(dialect, true);
        let mut out = String::new();

        let result = encoder.encode(&Person { name: "x", age: 1 }, &mut out);

        assert!(matches!(result, Err(TabularError::Configuration(_))));
        assert!(out.is_empty());
    }

    #[test]
    fn closed_table_rejects_rows_until_reset() {
        let mut encoder = TableEncoder::<Person>::declared(Dialect::default(), false);
        let mut out = String::new();

        assert_eq!(encoder.finish(), 0);
        let result = encoder.encode(&Person { name: "x", age: 1 }, &mut out);
        assert!(matches!(result, Err(TabularError::Configuration(_))));

        encoder.reset();
        encoder.encode(&Person { name: "x", age: 1 }, &mut out).unwrap();
        assert_eq!(out, "x;1\r\n");
    }
}
