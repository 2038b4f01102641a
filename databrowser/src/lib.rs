//! The query model of a data browser: a tool that lets its users define saved
//! "views" over an application's data models.
//!
//! A [`Query`] is parsed from request parameters (or from its canonical URL),
//! then bound to a [`Schema`] snapshot to produce a [`BoundQuery`], whose
//! fields and filters are resolved to concrete kinds of [`Field`] and checked
//! for well-formedness. Executing queries and rendering their results are left
//! to other layers.

mod bound;
mod config;
mod datetime;
mod error;
mod field;
mod filter;
mod loader;
mod query;
mod schema;
pub mod url;

pub use bound::BoundQuery;
pub use config::Config;
pub use datetime::Timestamp;
pub use error::{Error, LookupError};
pub use field::{
    BaseField, BooleanField, CalculatedField, Field, FieldKind, FieldType, Literal, Lookups,
    NumberField, StringField, TimeField, ValueParser,
};
pub use filter::Filter;
pub use loader::FileFormat;
pub use query::{FilterSpec, Query, SaveParams, SortDirection, DEFAULT_NAMESPACE, PATH_SEPARATOR};
pub use schema::{ModelSchema, Schema};
