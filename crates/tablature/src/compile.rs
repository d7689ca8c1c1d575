//! The definition compiler: declarations in, flat column list out.
//!
//! Compilation happens exactly once, when a schema is instantiated with a
//! context. Lazy declarations are invoked with that context and flattened
//! one level; omitted columns are dropped; nested schemas compile into
//! sub-column groups with their own tables. Everything keeps strict
//! registration order, and every error carries the schema name and the
//! 1-based position of the declaration that produced it.

use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::column::{Column, ColumnSpec};
use crate::error::SchemaError;
use crate::schema::Schema;
use crate::table::{Table, TableOptions};

/// A lazy declaration rule: compile context in, declarations out.
pub type LazyFn = Arc<dyn Fn(&Value) -> Vec<Declaration> + Send + Sync>;

/// One column declaration, in any of the accepted shapes.
#[derive(Clone)]
pub enum Declaration {
    /// A plain column record.
    Column(ColumnSpec),
    /// A schema to instantiate with the compile context, spliced in as a
    /// sub-column group.
    Nested(Schema),
    /// An already-instantiated table, spliced in as-is.
    Prebuilt(Table),
    /// A function of the compile context expanding to further declarations.
    /// Expansion is flattened one level; a lazy rule may not produce
    /// another lazy rule.
    Lazy(LazyFn),
    /// A nil placeholder. Dropped when
    /// [`TableOptions::ignore_nil_declarations`] is set, an error otherwise.
    Skip,
}

impl Declaration {
    /// A lazy declaration from a closure.
    pub fn lazy<F>(f: F) -> Self
    where
        F: Fn(&Value) -> Vec<Declaration> + Send + Sync + 'static,
    {
        Declaration::Lazy(Arc::new(f))
    }
}

impl fmt::Debug for Declaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Declaration::Column(spec) => f.debug_tuple("Column").field(spec).finish(),
            Declaration::Nested(schema) => f.debug_tuple("Nested").field(&schema.name()).finish(),
            Declaration::Prebuilt(table) => f.debug_tuple("Prebuilt").field(&table.name()).finish(),
            Declaration::Lazy(_) => f.write_str("Lazy(..)"),
            Declaration::Skip => f.write_str("Skip"),
        }
    }
}

/// A compiled column slot: either a leaf column or a nested-table group
/// that answers names, keys, and values for its whole cell range.
#[derive(Clone, Debug)]
pub(crate) enum CompiledColumn {
    Leaf(Column),
    Group(Table),
}

impl CompiledColumn {
    pub(crate) fn width(&self) -> usize {
        match self {
            CompiledColumn::Leaf(column) => column.width(),
            CompiledColumn::Group(table) => table.width(),
        }
    }

    pub(crate) fn push_keys(&self, out: &mut Vec<Value>) {
        match self {
            CompiledColumn::Leaf(column) => out.extend(column.keys().iter().cloned()),
            CompiledColumn::Group(table) => out.extend(table.keys().iter().cloned()),
        }
    }

    pub(crate) fn push_name_cells(&self, out: &mut Vec<Value>, header_ctx: &Value, table_ctx: &Value) {
        match self {
            CompiledColumn::Leaf(column) => {
                push_normalized(out, column.resolve_name(header_ctx, table_ctx))
            }
            CompiledColumn::Group(table) => out.extend(table.header_cells(header_ctx)),
        }
    }

    pub(crate) fn push_value_cells(&self, out: &mut Vec<Value>, row_ctx: &Value, table_ctx: &Value) {
        match self {
            CompiledColumn::Leaf(column) => {
                push_normalized(out, column.resolve_value(row_ctx, table_ctx))
            }
            CompiledColumn::Group(table) => out.extend(table.row_cells(row_ctx)),
        }
    }
}

fn push_normalized(out: &mut Vec<Value>, resolved: Value) {
    match resolved {
        Value::Array(cells) => out.extend(cells),
        scalar => out.push(scalar),
    }
}

/// Compile a schema's declarations against a context into the flat column
/// list, in strict registration order.
pub(crate) fn compile_declarations(
    schema_name: &str,
    declarations: &[Declaration],
    ctx: &Value,
    options: &TableOptions,
) -> Result<Vec<CompiledColumn>, SchemaError> {
    let mut columns = Vec::new();
    for (index, declaration) in declarations.iter().enumerate() {
        let position = index + 1;
        match declaration {
            Declaration::Lazy(f) => {
                for expanded in f(ctx) {
                    compile_one(schema_name, position, &expanded, ctx, options, &mut columns)?;
                }
            }
            other => compile_one(schema_name, position, other, ctx, options, &mut columns)?,
        }
    }
    Ok(columns)
}

fn compile_one(
    schema_name: &str,
    position: usize,
    declaration: &Declaration,
    ctx: &Value,
    options: &TableOptions,
    out: &mut Vec<CompiledColumn>,
) -> Result<(), SchemaError> {
    match declaration {
        Declaration::Column(spec) => {
            if spec.omit.applies(ctx) {
                return Ok(());
            }
            let column = spec
                .compile(
                    ctx,
                    options.key_prefix.as_deref(),
                    options.key_suffix.as_deref(),
                )
                .map_err(|reason| SchemaError::invalid_column(schema_name, position, reason))?;
            out.push(CompiledColumn::Leaf(column));
        }
        Declaration::Nested(schema) => {
            let table = Table::create(schema, ctx.clone(), nested_options(options))?;
            out.push(CompiledColumn::Group(table));
        }
        Declaration::Prebuilt(table) => out.push(CompiledColumn::Group(table.clone())),
        Declaration::Skip => {
            if !options.ignore_nil_declarations {
                return Err(SchemaError::invalid_declaration(
                    schema_name,
                    position,
                    "nil declaration; enable ignore_nil_declarations to skip it",
                ));
            }
        }
        Declaration::Lazy(_) => {
            return Err(SchemaError::invalid_declaration(
                schema_name,
                position,
                "lazy declaration expanded to another lazy declaration",
            ));
        }
    }
    Ok(())
}

/// Options handed to a nested table. Key affixes stay with the table that
/// declared them; nil handling is inherited.
fn nested_options(parent: &TableOptions) -> TableOptions {
    TableOptions {
        ignore_nil_declarations: parent.ignore_nil_declarations,
        ..TableOptions::default()
    }
}
