use std::{
    borrow::Borrow,
    cell::RefCell,
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use log::error;
use serde::Serialize;

use crate::{
    core::{
        dialect::Dialect,
        item::ItemWriter,
        schema::{DynamicRecord, JsonRecord, Tabular, to_json_record},
        table::{TableEncoder, TableStatus},
    },
    error::Result,
};

/// Writes records as delimited text to any [`Write`] sink.
///
/// The writer renders a header (optional) and one line per record, following
/// its [`Dialect`]. Columns are resolved once per table, either from the
/// record type ([`Tabular`]) or from the first record ([`DynamicRecord`]).
pub struct CsvItemWriter<R, W: Write> {
    stream: RefCell<W>,
    encoder: RefCell<TableEncoder<R>>,
    buffer: RefCell<String>,
}

impl<R, W: Write> ItemWriter<R> for CsvItemWriter<R, W> {
    /// Validates the dialect and writes the header when the columns are
    /// already known from the record type.
    fn open(&self) -> Result<()> {
        let mut buffer = self.buffer.borrow_mut();
        buffer.clear();
        self.encoder.borrow_mut().begin(&mut buffer)?;
        self.stream.borrow_mut().write_all(buffer.as_bytes())?;
        Ok(())
    }

    fn write(&self, items: &[R]) -> Result<()> {
        for item in items {
            self.write_record(item)?;
        }
        Ok(())
    }

    /// Flush the contents of the sink.
    fn flush(&self) -> Result<()> {
        self.stream.borrow_mut().flush()?;
        Ok(())
    }

    /// Flushes the sink and ends the table.
    fn close(&self) -> Result<()> {
        self.flush()?;
        self.encoder.borrow_mut().finish();
        Ok(())
    }
}

impl<R, W: Write> CsvItemWriter<R, W> {
    fn new(encoder: TableEncoder<R>, wtr: W) -> CsvItemWriter<R, W> {
        CsvItemWriter {
            stream: RefCell::new(wtr),
            encoder: RefCell::new(encoder),
            buffer: RefCell::new(String::new()),
        }
    }

    /// Writes a whole table: header, one row per record, then a single flush.
    ///
    /// Returns the number of data rows written. Any error aborts the table
    /// immediately; rows already handed to the sink stay there, unflushed.
    pub fn write_table<I>(&self, records: I) -> Result<usize>
    where
        I: IntoIterator,
        I::Item: Borrow<R>,
    {
        self.run(records.into_iter().map(Ok))
    }

    /// Writes a single record, preceded by the header if it is the first one.
    pub fn write_record(&self, record: &R) -> Result<()> {
        let mut buffer = self.buffer.borrow_mut();
        buffer.clear();
        self.encoder.borrow_mut().encode(record, &mut buffer)?;
        self.stream.borrow_mut().write_all(buffer.as_bytes())?;
        Ok(())
    }

    pub fn dialect(&self) -> Dialect {
        self.encoder.borrow().dialect().clone()
    }

    pub fn status(&self) -> TableStatus {
        self.encoder.borrow().status()
    }

    pub fn into_inner(self) -> W {
        self.stream.into_inner()
    }

    fn run<I, B>(&self, records: I) -> Result<usize>
    where
        I: Iterator<Item = Result<B>>,
        B: Borrow<R>,
    {
        self.encoder.borrow_mut().reset();

        let result = self.emit_all(records);
        if let Err(err) = &result {
            error!("Table write aborted: {}", err);
        }
        result
    }

    fn emit_all<I, B>(&self, records: I) -> Result<usize>
    where
        I: Iterator<Item = Result<B>>,
        B: Borrow<R>,
    {
        self.open()?;
        for record in records {
            self.write_record(record?.borrow())?;
        }
        self.close()?;
        Ok(self.encoder.borrow().rows())
    }
}

impl<W: Write> CsvItemWriter<JsonRecord, W> {
    /// Writes any serializable records as a table. Each record is converted
    /// to an ordered JSON object and goes through the first-record schema
    /// path, so struct fields appear in declaration order.
    ///
    /// # Example
    ///
    /// ```
    /// use serde::Serialize;
    /// use tabular_csv::core::schema::JsonRecord;
    /// use tabular_csv::item::csv::csv_writer::CsvItemWriterBuilder;
    ///
    /// #[derive(Serialize)]
    /// struct Row<'a> {
    ///     city: &'a str,
    ///     #[serde(rename = "popcount")]
    ///     population: u64,
    /// }
    ///
    /// let wtr = CsvItemWriterBuilder::new().dynamic_from_writer::<JsonRecord, _>(vec![]);
    ///
    /// let rows = wtr
    ///     .write_serialized(vec![
    ///         Row { city: "Boston", population: 4628910 },
    ///         Row { city: "Concord", population: 42695 },
    ///     ])
    ///     .unwrap();
    ///
    /// assert_eq!(rows, 2);
    /// assert_eq!(
    ///     String::from_utf8(wtr.into_inner()).unwrap(),
    ///     "\"city\";\"popcount\"\r\nBoston;4628910\r\nConcord;42695\r\n"
    /// );
    /// ```
    pub fn write_serialized<I, S>(&self, records: I) -> Result<usize>
    where
        I: IntoIterator<Item = S>,
        S: Serialize,
    {
        self.run(records.into_iter().map(|record| to_json_record(&record)))
    }
}

pub struct CsvItemWriterBuilder {
    pub(super) dialect: Dialect,
    pub(super) has_headers: bool,
}

impl Default for CsvItemWriterBuilder {
    fn default() -> Self {
        CsvItemWriterBuilder::new()
    }
}

impl CsvItemWriterBuilder {
    pub fn new() -> CsvItemWriterBuilder {
        CsvItemWriterBuilder {
            dialect: Dialect::default(),
            has_headers: true,
        }
    }

    pub fn dialect(mut self, dialect: Dialect) -> CsvItemWriterBuilder {
        self.dialect = dialect;
        self
    }

    /// Shortcut for changing only the delimiter of the current dialect.
    pub fn delimiter(mut self, delimiter: &str) -> CsvItemWriterBuilder {
        self.dialect.delimiter = delimiter.to_string();
        self
    }

    pub fn has_headers(mut self, yes: bool) -> CsvItemWriterBuilder {
        self.has_headers = yes;
        self
    }

    /// Writer for a [`Tabular`] record type.
    ///
    /// # Example
    ///
    /// ```
    /// use tabular_csv::core::schema::{Column, Tabular};
    /// use tabular_csv::item::csv::csv_writer::CsvItemWriterBuilder;
    ///
    /// struct Person { name: &'static str, age: u32 }
    ///
    /// impl Tabular for Person {
    ///     fn columns() -> Vec<Column<Self>> {
    ///         vec![
    ///             Column::new("Name", |p: &Person| p.name.into()),
    ///             Column::new("Age", |p: &Person| p.age.into()),
    ///         ]
    ///     }
    /// }
    ///
    /// let wtr = CsvItemWriterBuilder::new().from_writer::<Person, _>(vec![]);
    /// wtr.write_table(&[
    ///     Person { name: "A;B", age: 5 },
    ///     Person { name: "C\"D", age: 7 },
    /// ]).unwrap();
    ///
    /// let data = String::from_utf8(wtr.into_inner()).unwrap();
    /// assert_eq!(data, "\"Name\";\"Age\"\r\n\"A;B\";5\r\n\"C\"\"D\";7\r\n");
    /// ```
    pub fn from_writer<R: Tabular, W: Write>(self, wtr: W) -> CsvItemWriter<R, W> {
        CsvItemWriter::new(TableEncoder::declared(self.dialect, self.has_headers), wtr)
    }

    /// Writer for a [`Tabular`] record type, creating (or truncating) the file at `path`.
    pub fn from_path<R: Tabular, P: AsRef<Path>>(
        self,
        path: P,
    ) -> Result<CsvItemWriter<R, BufWriter<File>>> {
        let file = File::create(path)?;
        Ok(self.from_writer(BufWriter::new(file)))
    }

    /// Writer for keyed mappings whose columns come from the first record.
    pub fn dynamic_from_writer<R: DynamicRecord, W: Write>(self, wtr: W) -> CsvItemWriter<R, W> {
        CsvItemWriter::new(
            TableEncoder::first_record(self.dialect, self.has_headers),
            wtr,
        )
    }

    pub fn dynamic_from_path<R: DynamicRecord, P: AsRef<Path>>(
        self,
        path: P,
    ) -> Result<CsvItemWriter<R, BufWriter<File>>> {
        let file = File::create(path)?;
        Ok(self.dynamic_from_writer(BufWriter::new(file)))
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::BTreeMap, env::temp_dir, error::Error, fs};

    use rand::distr::{Alphanumeric, SampleString};

    use crate::{
        TabularError,
        core::{
            dialect::DialectBuilder,
            item::ItemWriter,
            schema::{Column, JsonRecord, Tabular},
            table::TableStatus,
            value::Value,
        },
        item::csv::csv_writer::CsvItemWriterBuilder,
    };

    struct Row {
        city: &'static str,
        country: &'static str,
        population: u64,
    }

    impl Tabular for Row {
        fn columns() -> Vec<Column<Self>> {
            vec![
                Column::new("city", |r: &Row| r.city.into()),
                Column::new("country", |r: &Row| r.country.into()),
                Column::new("popcount", |r: &Row| r.population.into()),
            ]
        }
    }

    fn rows() -> Vec<Row> {
        vec![
            Row {
                city: "Boston",
                country: "United States",
                population: 4628910,
            },
            Row {
                city: "Concord",
                country: "United States",
                population: 42695,
            },
        ]
    }

    #[test]
    fn this_test_will_pass() -> Result<(), Box<dyn Error>> {
        let wtr = CsvItemWriterBuilder::new()
            .dialect(DialectBuilder::new().delimiter(",").line_terminator("\n").build()?)
            .from_writer::<Row, _>(vec![]);

        let count = wtr.write_table(rows())?;

        let data = String::from_utf8(wtr.into_inner())?;
        assert_eq!(count, 2);
        assert_eq!(
            data,
            "\"city\",\"country\",\"popcount\"
Boston,United States,4628910
Concord,United States,42695
"
        );

        Ok(())
    }

    #[test]
    fn records_should_be_written_without_header() -> Result<(), Box<dyn Error>> {
        let wtr = CsvItemWriterBuilder::new()
            .has_headers(false)
            .from_writer::<Row, _>(vec![]);

        wtr.write_table(rows())?;

        let data = String::from_utf8(wtr.into_inner())?;
        assert_eq!(
            data,
            "Boston;United States;4628910\r\nConcord;United States;42695\r\n"
        );
        Ok(())
    }

    #[test]
    fn empty_table_still_gets_a_header() -> Result<(), Box<dyn Error>> {
        let wtr = CsvItemWriterBuilder::new().from_writer::<Row, _>(vec![]);

        let count = wtr.write_table(Vec::<Row>::new())?;

        assert_eq!(count, 0);
        assert_eq!(wtr.status(), TableStatus::Done);
        assert_eq!(String::from_utf8(wtr.into_inner())?, "\"city\";\"country\";\"popcount\"\r\n");
        Ok(())
    }

    #[test]
    fn item_writer_contract_streams_rows() -> Result<(), Box<dyn Error>> {
        let wtr = CsvItemWriterBuilder::new()
            .has_headers(true)
            .from_writer::<Row, _>(vec![]);

        wtr.open()?;
        let all = rows();
        wtr.write(&all[..1])?;
        wtr.write(&all[1..])?;
        wtr.close()?;

        let data = String::from_utf8(wtr.into_inner())?;
        assert_eq!(data.lines().count(), 3);
        assert!(data.starts_with("\"city\";\"country\";\"popcount\"\r\nBoston"));
        Ok(())
    }

    #[test]
    fn writer_can_be_reused_for_another_table() -> Result<(), Box<dyn Error>> {
        let wtr = CsvItemWriterBuilder::new().from_writer::<Row, _>(vec![]);

        wtr.write_table(rows())?;
        wtr.write_table(rows())?;

        let data = String::from_utf8(wtr.into_inner())?;
        assert_eq!(data.matches("\"city\";\"country\";\"popcount\"").count(), 2);
        Ok(())
    }

    #[test]
    fn mappings_should_take_schema_from_first_record() -> Result<(), Box<dyn Error>> {
        let mut first = BTreeMap::new();
        first.insert("b".to_string(), Value::from("x"));
        first.insert("a".to_string(), Value::from(1));

        let mut second = BTreeMap::new();
        second.insert("a".to_string(), Value::from(2));
        second.insert("c".to_string(), Value::from(true));

        let wtr = CsvItemWriterBuilder::new()
            .dynamic_from_writer::<BTreeMap<String, Value>, _>(vec![]);
        wtr.write_table(vec![first, second])?;

        let data = String::from_utf8(wtr.into_inner())?;
        assert_eq!(data, "\"a\";\"b\"\r\n1;x\r\n2;\r\n");
        Ok(())
    }

    #[test]
    fn empty_dynamic_table_writes_nothing() -> Result<(), Box<dyn Error>> {
        let wtr = CsvItemWriterBuilder::new().dynamic_from_writer::<JsonRecord, _>(vec![]);

        let count = wtr.write_table(Vec::<JsonRecord>::new())?;

        assert_eq!(count, 0);
        assert!(wtr.into_inner().is_empty());
        Ok(())
    }

    #[test]
    fn serialized_records_keep_field_order() -> Result<(), Box<dyn Error>> {
        #[derive(serde::Serialize)]
        struct Product {
            id: &'static str,
            price: f64,
            description: Option<&'static str>,
        }

        let wtr = CsvItemWriterBuilder::new()
            .dialect(DialectBuilder::new().null_substitution("N/A").build()?)
            .dynamic_from_writer::<JsonRecord, _>(vec![]);

        wtr.write_serialized(vec![
            Product {
                id: "P001",
                price: 79.99,
                description: Some("Wireless; noise-cancelling"),
            },
            Product {
                id: "P002",
                price: 12.5,
                description: None,
            },
        ])?;

        let data = String::from_utf8(wtr.into_inner())?;
        assert_eq!(
            data,
            "\"id\";\"price\";\"description\"\r\nP001;79.99;\"Wireless; noise-cancelling\"\r\nP002;12.5;N/A\r\n"
        );
        Ok(())
    }

    #[test]
    fn invalid_dialect_writes_nothing() {
        let wtr = CsvItemWriterBuilder::new()
            .delimiter("\"")
            .from_writer::<Row, _>(vec![]);

        let result = wtr.write_table(rows());

        assert!(matches!(result, Err(TabularError::Configuration(_))));
        assert!(wtr.into_inner().is_empty());
    }

    #[test]
    fn records_should_be_written_to_path() -> Result<(), Box<dyn Error>> {
        let file_name = Alphanumeric.sample_string(&mut rand::rng(), 16);
        let path = temp_dir().join(format!("{}.csv", file_name));
        {
            let wtr = CsvItemWriterBuilder::new().from_path::<Row, _>(&path)?;
            wtr.write_table(rows())?;
        }

        let data = fs::read_to_string(&path)?;
        assert!(data.ends_with("Concord;United States;42695\r\n"));
        fs::remove_file(&path).ok();
        Ok(())
    }
}
