//! # Tablature - Schema-Driven Tabular Rendering
//!
//! `tablature` lets you declare a tabular schema once — an ordered list of
//! logical columns, each with a name, optional key, value rule, and fixed
//! width — then repeatedly project arbitrary records through it to produce
//! header and body rows.
//!
//! ## Core Concepts
//!
//! - [`Schema`]: immutable definition — column declarations plus named
//!   context builders, converters, and result builders
//! - [`Table`]: a compiled render session; declarations compile exactly once
//!   at instantiation, renders never re-compile
//! - [`ColumnSpec`]: one column declaration; width is inferred from constant
//!   name/key lists or declared explicitly
//! - [`Converter`]: named per-cell transform, scoped to header and/or body
//! - [`ResultBuilder`]: named whole-row transform, e.g. array-to-map
//! - [`Declaration`]: the accepted declaration shapes, including lazy rules
//!   and nested schemas
//!
//! ## Quick Start
//!
//! ```rust
//! use serde_json::{json, Value};
//! use tablature::{ColumnSpec, Schema};
//!
//! let schema = Schema::builder("users")
//!     .column(ColumnSpec::new().named("ID").value_with(|row, _| row["id"].clone()))
//!     .column(ColumnSpec::new().named("Name").value_with(|row, _| row["name"].clone()))
//!     .column(ColumnSpec::new()
//!         .names(["Pet 1", "Pet 2", "Pet 3"])
//!         .value_with(|row, _| row["pets"].clone()))
//!     .build();
//!
//! let table = schema.instantiate(Value::Null).unwrap();
//!
//! assert_eq!(
//!     table.header(&Value::Null),
//!     json!(["ID", "Name", "Pet 1", "Pet 2", "Pet 3"])
//! );
//! assert_eq!(
//!     table.row(&json!({ "id": 1, "name": "Taro", "pets": ["cat", "dog"] })),
//!     json!([1, "Taro", "cat", "dog", null])
//! );
//! ```
//!
//! Every column occupies a fixed number of cells in every row: short results
//! are right-padded with `null`, long ones are right-truncated. The three
//! pet columns above always contribute exactly three cells.
//!
//! ## Map-Shaped Output
//!
//! With [`RowShape::Map`], rows render as maps keyed by column keys, with
//! positional indices filling in for keyless cells:
//!
//! ```rust
//! use serde_json::{json, Value};
//! use tablature::{ColumnSpec, Schema, TableOptions};
//!
//! let schema = Schema::builder("users")
//!     .column(ColumnSpec::new().named("ID").key("id").value_with(|row, _| row["id"].clone()))
//!     .build();
//!
//! let table = schema.instantiate_with(Value::Null, TableOptions::map()).unwrap();
//! assert_eq!(table.row(&json!({ "id": 3 })), json!({ "id": 3 }));
//! ```
//!
//! ## Converters and Result Builders
//!
//! Converters run per cell in registration order; result builders then run
//! over the whole row. Both are named, and re-registering a name replaces
//! the earlier entry — which is also how [`Schema::merge`] lets later
//! schemas override earlier ones:
//!
//! ```rust
//! use serde_json::{json, Value};
//! use tablature::{ColumnSpec, Converter, Schema};
//!
//! let base = Schema::builder("base")
//!     .column(ColumnSpec::new().named("n").value(1))
//!     .converter("to_s", Converter::new(|v, _, _| json!(v.to_string())))
//!     .build();
//! let strict = Schema::builder("strict")
//!     .converter("to_s", Converter::new(|v, _, _| json!(format!("<{v}>"))))
//!     .build();
//!
//! let merged = Schema::merge("report", &[&base, &strict]).unwrap();
//! let table = merged.instantiate(Value::Null).unwrap();
//! assert_eq!(table.row(&Value::Null), json!(["<1>"]));
//! ```
//!
//! ## Lazy Bodies
//!
//! [`Table::body`] maps rendering lazily over its input, so unbounded
//! generators are fine as long as you only pull what you need:
//!
//! ```rust
//! use serde_json::{json, Value};
//! use tablature::{ColumnSpec, Schema};
//!
//! let schema = Schema::builder("seq")
//!     .column(ColumnSpec::new().named("n").value_with(|row, _| row.clone()))
//!     .build();
//! let table = schema.instantiate(Value::Null).unwrap();
//!
//! let rows: Vec<Value> = table.body((0..).map(|n| json!(n))).take(2).collect();
//! assert_eq!(rows, vec![json!([0]), json!([1])]);
//! ```

mod column;
mod compile;
mod error;
mod pipeline;
pub mod prelude;
mod rule;
mod schema;
mod table;

pub use column::{Column, ColumnSpec};
pub use compile::{Declaration, LazyFn};
pub use error::SchemaError;
pub use pipeline::{BuildFn, ConvertFn, Converter, ResultBuilder};
pub use rule::{CtxFn, KeyRule, NameRule, OmitFn, OmitRule, RenderFn, ValueRule, WidthFn, WidthRule};
pub use schema::{Schema, SchemaBuilder};
pub use table::{Body, RowShape, Table, TableOptions};
