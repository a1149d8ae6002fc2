/// Dialect configuration and number formatting locale.
pub mod dialect;

/// Field escaping.
pub mod field;

pub mod item;

/// Column discovery for typed records and keyed mappings.
pub mod schema;

pub mod table;

/// Raw scalar values.
pub mod value;
