//! Render sessions: a compiled [`Table`] and its header/row/body operations.
//!
//! A table is born when a schema is instantiated with a context. The table
//! context builder runs once at that moment; declarations compile exactly
//! once; converters and result builders flatten into one pipeline per
//! render kind. Every later `header`/`row` call is an independent, pure
//! function of the compiled state and the call's own context.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::iter;

use crate::compile::{compile_declarations, CompiledColumn};
use crate::error::SchemaError;
use crate::pipeline::{map_shape_builder, Pipeline, RenderKind};
use crate::schema::{ContextBuilders, Schema};

/// Shape of rendered rows: ordered cell lists or key/value maps.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowShape {
    /// Rows render as ordered lists of cells.
    #[default]
    Array,
    /// Rows render as maps, keyed by column keys with positional-index
    /// fallback for keyless cells.
    Map,
}

/// Options fixed at instantiation time.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableOptions {
    /// Output shape for header and body rows.
    pub shape: RowShape,
    /// Prefix prepended to every string key at compile time.
    pub key_prefix: Option<String>,
    /// Suffix appended to every string key at compile time.
    pub key_suffix: Option<String>,
    /// Drop nil declarations instead of failing compilation.
    pub ignore_nil_declarations: bool,
}

impl TableOptions {
    /// Options for map-shaped output.
    pub fn map() -> Self {
        TableOptions {
            shape: RowShape::Map,
            ..TableOptions::default()
        }
    }
}

/// A compiled render session. Immutable after construction; cheap to clone
/// (all shared parts are reference-counted) and safe to use from
/// independent instances.
#[derive(Clone)]
pub struct Table {
    name: String,
    columns: Vec<CompiledColumn>,
    keys: Vec<Value>,
    context: Value,
    builders: ContextBuilders,
    header_pipeline: Pipeline,
    body_pipeline: Pipeline,
}

impl Table {
    pub(crate) fn create(
        schema: &Schema,
        ctx: Value,
        options: TableOptions,
    ) -> Result<Table, SchemaError> {
        let builders = schema.context_builders().clone();
        let context = builders.apply_table(ctx);

        let columns = compile_declarations(schema.name(), schema.declarations(), &context, &options)?;
        let mut keys = Vec::new();
        for column in &columns {
            column.push_keys(&mut keys);
        }

        let shape_builder = match options.shape {
            RowShape::Map => Some(map_shape_builder()),
            RowShape::Array => None,
        };
        let header_pipeline = Pipeline::assemble(
            RenderKind::Header,
            schema.converters(),
            shape_builder.clone(),
            schema.result_builders(),
        );
        let body_pipeline = Pipeline::assemble(
            RenderKind::Body,
            schema.converters(),
            shape_builder,
            schema.result_builders(),
        );

        Ok(Table {
            name: schema.name().to_string(),
            columns,
            keys,
            context,
            builders,
            header_pipeline,
            body_pipeline,
        })
    }

    /// The name of the schema this table was compiled from.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Total cell count of one rendered row.
    pub fn width(&self) -> usize {
        self.columns.iter().map(CompiledColumn::width).sum()
    }

    /// The flattened, normalized key cells across all columns.
    pub fn keys(&self) -> &[Value] {
        &self.keys
    }

    /// The table context, after the table context builder.
    pub fn context(&self) -> &Value {
        &self.context
    }

    /// Render the header row.
    pub fn header(&self, ctx: &Value) -> Value {
        let header_ctx = self.builders.apply_header(ctx.clone());
        let cells = self.cells(RenderKind::Header, &header_ctx);
        self.header_pipeline
            .apply_rows(Value::Array(cells), &self.keys, &header_ctx, &self.context)
    }

    /// Render one body row from a row context.
    pub fn row(&self, ctx: &Value) -> Value {
        let row_ctx = self.builders.apply_row(ctx.clone());
        let cells = self.cells(RenderKind::Body, &row_ctx);
        self.body_pipeline
            .apply_rows(Value::Array(cells), &self.keys, &row_ctx, &self.context)
    }

    /// Render body rows lazily over an input sequence.
    ///
    /// The returned iterator does no work for rows that are never pulled,
    /// so unbounded input generators are fine.
    pub fn body<I>(&self, items: I) -> Body<'_, I::IntoIter>
    where
        I: IntoIterator<Item = Value>,
    {
        Body {
            table: self,
            items: items.into_iter(),
        }
    }

    /// Render the header followed by body rows as one lazy stream.
    pub fn render<I>(
        &self,
        header_ctx: &Value,
        items: I,
    ) -> iter::Chain<iter::Once<Value>, Body<'_, I::IntoIter>>
    where
        I: IntoIterator<Item = Value>,
    {
        iter::once(self.header(header_ctx)).chain(self.body(items))
    }

    /// Converted header cells for splicing into a parent row. The context
    /// is the parent's render context; this table's own header context
    /// builder and per-value converters still apply.
    pub(crate) fn header_cells(&self, ctx: &Value) -> Vec<Value> {
        let header_ctx = self.builders.apply_header(ctx.clone());
        self.cells(RenderKind::Header, &header_ctx)
    }

    /// Converted body cells for splicing into a parent row.
    pub(crate) fn row_cells(&self, ctx: &Value) -> Vec<Value> {
        let row_ctx = self.builders.apply_row(ctx.clone());
        self.cells(RenderKind::Body, &row_ctx)
    }

    fn cells(&self, kind: RenderKind, render_ctx: &Value) -> Vec<Value> {
        let mut cells = Vec::with_capacity(self.keys.len());
        for column in &self.columns {
            match kind {
                RenderKind::Header => column.push_name_cells(&mut cells, render_ctx, &self.context),
                RenderKind::Body => column.push_value_cells(&mut cells, render_ctx, &self.context),
            }
        }
        let pipeline = match kind {
            RenderKind::Header => &self.header_pipeline,
            RenderKind::Body => &self.body_pipeline,
        };
        pipeline.apply_values(&mut cells, render_ctx, &self.context);
        cells
    }
}

impl fmt::Debug for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("name", &self.name)
            .field("columns", &self.columns.len())
            .field("width", &self.width())
            .finish_non_exhaustive()
    }
}

/// Lazy body iterator returned by [`Table::body`].
///
/// Restartable whenever the underlying input iterator is `Clone`.
#[derive(Clone, Debug)]
pub struct Body<'a, I> {
    table: &'a Table,
    items: I,
}

impl<I> Iterator for Body<'_, I>
where
    I: Iterator<Item = Value>,
{
    type Item = Value;

    fn next(&mut self) -> Option<Self::Item> {
        self.items.next().map(|ctx| self.table.row(&ctx))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.items.size_hint()
    }
}
