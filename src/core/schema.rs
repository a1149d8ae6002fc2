use std::{
    collections::{BTreeMap, HashMap, HashSet},
    fmt::{self, Debug},
    hash::BuildHasher,
};

use log::debug;
use serde::Serialize;

use super::value::Value;
use crate::error::{Result, TabularError};

type Accessor<R> = Box<dyn Fn(&R) -> Result<Value> + Send + Sync>;

/// A named value accessor: one column of a table.
pub struct Column<R> {
    name: String,
    accessor: Accessor<R>,
}

impl<R> Column<R> {
    /// Creates a column whose accessor cannot fail.
    ///
    /// # Examples
    ///
    /// ```
    /// use tabular_csv::core::{schema::Column, value::Value};
    ///
    /// struct Person { name: String }
    ///
    /// let column = Column::new("Name", |p: &Person| p.name.as_str().into());
    /// let person = Person { name: "Ada".to_string() };
    ///
    /// assert_eq!(column.name(), "Name");
    /// assert_eq!(column.get(&person).unwrap(), Value::from("Ada"));
    /// ```
    pub fn new<F>(name: &str, accessor: F) -> Column<R>
    where
        F: Fn(&R) -> Value + Send + Sync + 'static,
    {
        Column {
            name: name.to_string(),
            accessor: Box::new(move |record| Ok(accessor(record))),
        }
    }

    /// Creates a column whose accessor may fail. The failure aborts the
    /// write as [`TabularError::Access`].
    pub fn try_new<F, E>(name: &str, accessor: F) -> Column<R>
    where
        F: Fn(&R) -> std::result::Result<Value, E> + Send + Sync + 'static,
        E: fmt::Display,
    {
        let column = name.to_string();
        Column {
            name: name.to_string(),
            accessor: Box::new(move |record| {
                accessor(record).map_err(|err| TabularError::access(&column, err))
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Reads this column's raw value from `record`.
    pub fn get(&self, record: &R) -> Result<Value> {
        (self.accessor)(record)
    }
}

impl<R> Debug for Column<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Column").field("name", &self.name).finish()
    }
}

/// Lists the readable members of a statically known record type.
///
/// This is the field lister used by [`Schema::from_type`]: implementations
/// return one [`Column`] per member, in declaration order.
///
/// ```
/// use tabular_csv::core::schema::{Column, Schema, Tabular};
///
/// struct Person { name: String, age: u32 }
///
/// impl Tabular for Person {
///     fn columns() -> Vec<Column<Self>> {
///         vec![
///             Column::new("Name", |p: &Person| p.name.as_str().into()),
///             Column::new("Age", |p: &Person| p.age.into()),
///         ]
///     }
/// }
///
/// let schema = Schema::<Person>::from_type(true).unwrap();
/// assert_eq!(schema.names(), vec!["Age", "Name"]);
/// ```
pub trait Tabular: Sized {
    fn columns() -> Vec<Column<Self>>;
}

/// A record whose columns are its keys.
pub trait DynamicRecord {
    /// Keys in iteration order, without duplicates.
    fn keys(&self) -> Vec<String>;

    /// Value stored under `key`, `None` when the key is absent.
    fn value(&self, key: &str) -> Option<Value>;
}

impl<V> DynamicRecord for BTreeMap<String, V>
where
    V: Clone + Into<Value>,
{
    fn keys(&self) -> Vec<String> {
        BTreeMap::keys(self).cloned().collect()
    }

    fn value(&self, key: &str) -> Option<Value> {
        self.get(key).cloned().map(Into::into)
    }
}

impl<V, S> DynamicRecord for HashMap<String, V, S>
where
    V: Clone + Into<Value>,
    S: BuildHasher,
{
    fn keys(&self) -> Vec<String> {
        HashMap::keys(self).cloned().collect()
    }

    fn value(&self, key: &str) -> Option<Value> {
        self.get(key).cloned().map(Into::into)
    }
}

impl<V> DynamicRecord for Vec<(String, V)>
where
    V: Clone + Into<Value>,
{
    fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = Vec::with_capacity(self.len());
        for (key, _) in self {
            if !keys.contains(key) {
                keys.push(key.clone());
            }
        }
        keys
    }

    fn value(&self, key: &str) -> Option<Value> {
        self.iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone().into())
    }
}

impl DynamicRecord for serde_json::Map<String, serde_json::Value> {
    fn keys(&self) -> Vec<String> {
        serde_json::Map::keys(self).cloned().collect()
    }

    fn value(&self, key: &str) -> Option<Value> {
        self.get(key).map(Value::from)
    }
}

/// A record converted from any `Serialize` type, fields in declaration order.
pub type JsonRecord = serde_json::Map<String, serde_json::Value>;

/// Serializes `item` into a [`JsonRecord`].
///
/// The item must serialize to a JSON object (a struct or a map); anything
/// else cannot be split into columns and is an access error.
pub fn to_json_record<S: Serialize>(item: &S) -> Result<JsonRecord> {
    match serde_json::to_value(item)? {
        serde_json::Value::Object(record) => Ok(record),
        other => Err(TabularError::access(
            "<record>",
            format!("expected an object, got `{}`", other),
        )),
    }
}

/// Ordered columns shared by the header and every row of one table.
#[derive(Debug)]
pub struct Schema<R> {
    columns: Vec<Column<R>>,
}

impl<R> Schema<R> {
    /// Builds a schema, sorting columns by name when `sort_columns` is set.
    /// Column names must be unique.
    pub fn new(mut columns: Vec<Column<R>>, sort_columns: bool) -> Result<Schema<R>> {
        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.name()) {
                return Err(TabularError::Configuration(format!(
                    "duplicate column `{}`",
                    column.name()
                )));
            }
        }

        if sort_columns {
            columns.sort_by(|a, b| a.name.cmp(&b.name));
        }

        Ok(Schema { columns })
    }

    /// Resolves the columns of a statically known type.
    pub fn from_type(sort_columns: bool) -> Result<Schema<R>>
    where
        R: Tabular,
    {
        let schema = Schema::new(R::columns(), sort_columns)?;
        debug!(
            "Resolved schema of {} with {} columns",
            std::any::type_name::<R>(),
            schema.len()
        );
        Ok(schema)
    }

    /// Resolves columns from the keys of a mapping. Every accessor looks its
    /// key up and reads an absent key as null.
    pub fn from_mapping(record: &R, sort_columns: bool) -> Result<Schema<R>>
    where
        R: DynamicRecord,
    {
        let columns = record
            .keys()
            .into_iter()
            .map(|key| {
                let lookup = key.clone();
                Column::new(&key, move |r: &R| r.value(&lookup).unwrap_or(Value::Null))
            })
            .collect();

        let schema = Schema::new(columns, sort_columns)?;
        debug!("Resolved schema from first record with {} columns", schema.len());
        Ok(schema)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.columns.iter().map(Column::name).collect()
    }

    pub fn columns(&self) -> &[Column<R>] {
        &self.columns
    }
}
