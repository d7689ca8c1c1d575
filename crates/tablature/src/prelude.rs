//! Convenience re-exports for the common path.
//!
//! ```rust
//! use tablature::prelude::*;
//! ```

pub use crate::{
    Column, ColumnSpec, Converter, Declaration, ResultBuilder, RowShape, Schema, SchemaBuilder,
    SchemaError, Table, TableOptions,
};
