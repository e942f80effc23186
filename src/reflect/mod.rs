//! Reflection Adapter (C1): enumerates schemas, tables, columns, keys, and
//! foreign keys from the live database.

pub mod adapter;
pub mod raw_schema;

pub use adapter::{reflect, ReflectOptions};
pub use raw_schema::{table_key, RawColumn, RawForeignKey, RawSchema, RawTable, TableKey};
