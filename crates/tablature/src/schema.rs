//! Schema definitions: declarations plus named post-processing registrations.
//!
//! A [`Schema`] is an immutable definition record — ordered column
//! declarations, optional context builders, and named converter/builder
//! maps — assembled once through [`SchemaBuilder`] and instantiated into a
//! [`Table`] per render session. Registering a converter or result builder
//! under an existing name replaces the earlier entry in place: later wins,
//! original order kept.

use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::column::ColumnSpec;
use crate::compile::Declaration;
use crate::error::SchemaError;
use crate::pipeline::{Converter, ResultBuilder};
use crate::rule::CtxFn;
use crate::table::{Table, TableOptions};

/// The three optional context rewrite functions of a schema.
#[derive(Clone, Default)]
pub(crate) struct ContextBuilders {
    pub(crate) table: Option<CtxFn>,
    pub(crate) header: Option<CtxFn>,
    pub(crate) row: Option<CtxFn>,
}

impl ContextBuilders {
    pub(crate) fn apply_table(&self, ctx: Value) -> Value {
        match &self.table {
            Some(f) => f(ctx),
            None => ctx,
        }
    }

    pub(crate) fn apply_header(&self, ctx: Value) -> Value {
        match &self.header {
            Some(f) => f(ctx),
            None => ctx,
        }
    }

    pub(crate) fn apply_row(&self, ctx: Value) -> Value {
        match &self.row {
            Some(f) => f(ctx),
            None => ctx,
        }
    }

    fn override_with(&mut self, other: &ContextBuilders) {
        if other.table.is_some() {
            self.table = other.table.clone();
        }
        if other.header.is_some() {
            self.header = other.header.clone();
        }
        if other.row.is_some() {
            self.row = other.row.clone();
        }
    }
}

impl fmt::Debug for ContextBuilders {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextBuilders")
            .field("table", &self.table.is_some())
            .field("header", &self.header.is_some())
            .field("row", &self.row.is_some())
            .finish()
    }
}

fn upsert<T>(entries: &mut Vec<(String, T)>, name: String, value: T) {
    match entries.iter_mut().find(|(existing, _)| *existing == name) {
        Some(slot) => slot.1 = value,
        None => entries.push((name, value)),
    }
}

/// An immutable schema definition.
///
/// Schemas carry no run-time state; instantiation compiles the declarations
/// against a context and yields an independent [`Table`].
///
/// ```rust
/// use serde_json::{json, Value};
/// use tablature::{ColumnSpec, Schema};
///
/// let schema = Schema::builder("users")
///     .column(ColumnSpec::new().named("ID").value_with(|row, _| row["id"].clone()))
///     .column(ColumnSpec::new().named("Name").value_with(|row, _| row["name"].clone()))
///     .build();
///
/// let table = schema.instantiate(Value::Null).unwrap();
/// assert_eq!(table.header(&Value::Null), json!(["ID", "Name"]));
/// ```
#[derive(Clone)]
pub struct Schema {
    name: String,
    declarations: Vec<Declaration>,
    context_builders: ContextBuilders,
    converters: Vec<(String, Converter)>,
    result_builders: Vec<(String, ResultBuilder)>,
}

impl Schema {
    /// Start a new schema definition.
    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder {
            schema: Schema {
                name: name.into(),
                declarations: Vec::new(),
                context_builders: ContextBuilders::default(),
                converters: Vec::new(),
                result_builders: Vec::new(),
            },
        }
    }

    /// The schema's name, used in compile error messages.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Merge schemas into a new definition under the given name.
    ///
    /// Column declarations concatenate in argument order. Context builders,
    /// converters, and result builders merge by name with later schemas
    /// overriding earlier ones. Inputs are not mutated.
    pub fn merge(name: impl Into<String>, schemas: &[&Schema]) -> Result<Schema, SchemaError> {
        if schemas.is_empty() {
            return Err(SchemaError::Composition(
                "merge requires at least one schema".to_string(),
            ));
        }
        Ok(Schema::merged(name.into(), schemas.iter().copied()))
    }

    /// Instance-level additive composition: this schema's declarations and
    /// registrations, extended (and overridden, name-for-name) by `other`'s.
    pub fn compose(&self, other: &Schema) -> Schema {
        Schema::merged(self.name.clone(), [self, other])
    }

    fn merged<'a>(name: String, schemas: impl IntoIterator<Item = &'a Schema>) -> Schema {
        let mut merged = Schema {
            name,
            declarations: Vec::new(),
            context_builders: ContextBuilders::default(),
            converters: Vec::new(),
            result_builders: Vec::new(),
        };
        for schema in schemas {
            merged
                .declarations
                .extend(schema.declarations.iter().cloned());
            merged.context_builders.override_with(&schema.context_builders);
            for (name, converter) in &schema.converters {
                upsert(&mut merged.converters, name.clone(), converter.clone());
            }
            for (name, builder) in &schema.result_builders {
                upsert(&mut merged.result_builders, name.clone(), builder.clone());
            }
        }
        merged
    }

    /// Compile this schema against a context with default [`TableOptions`].
    pub fn instantiate(&self, ctx: Value) -> Result<Table, SchemaError> {
        self.instantiate_with(ctx, TableOptions::default())
    }

    /// Compile this schema against a context with explicit options.
    pub fn instantiate_with(&self, ctx: Value, options: TableOptions) -> Result<Table, SchemaError> {
        Table::create(self, ctx, options)
    }

    pub(crate) fn declarations(&self) -> &[Declaration] {
        &self.declarations
    }

    pub(crate) fn context_builders(&self) -> &ContextBuilders {
        &self.context_builders
    }

    pub(crate) fn converters(&self) -> &[(String, Converter)] {
        &self.converters
    }

    pub(crate) fn result_builders(&self) -> &[(String, ResultBuilder)] {
        &self.result_builders
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("name", &self.name)
            .field("declarations", &self.declarations.len())
            .field("converters", &self.converters.iter().map(|(n, _)| n).collect::<Vec<_>>())
            .field(
                "result_builders",
                &self.result_builders.iter().map(|(n, _)| n).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Assembles a [`Schema`] definition.
pub struct SchemaBuilder {
    schema: Schema,
}

impl SchemaBuilder {
    /// Append a column declaration.
    pub fn column(self, spec: ColumnSpec) -> Self {
        self.declaration(Declaration::Column(spec))
    }

    /// Append a raw declaration of any shape.
    pub fn declaration(mut self, declaration: Declaration) -> Self {
        self.schema.declarations.push(declaration);
        self
    }

    /// Append a nested schema, instantiated with the compile context when
    /// this schema is instantiated.
    pub fn nested(self, schema: Schema) -> Self {
        self.declaration(Declaration::Nested(schema))
    }

    /// Append an already-instantiated table as a sub-column group.
    pub fn prebuilt(self, table: Table) -> Self {
        self.declaration(Declaration::Prebuilt(table))
    }

    /// Append a lazy declaration: a function of the compile context that
    /// expands to a list of declarations at instantiation time.
    pub fn lazy<F>(self, f: F) -> Self
    where
        F: Fn(&Value) -> Vec<Declaration> + Send + Sync + 'static,
    {
        self.declaration(Declaration::Lazy(Arc::new(f)))
    }

    /// Set the table context builder, applied once at instantiation.
    pub fn table_context<F>(mut self, f: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.schema.context_builders.table = Some(Arc::new(f));
        self
    }

    /// Set the header context builder, applied per header render.
    pub fn header_context<F>(mut self, f: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.schema.context_builders.header = Some(Arc::new(f));
        self
    }

    /// Set the row context builder, applied per row render.
    pub fn row_context<F>(mut self, f: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.schema.context_builders.row = Some(Arc::new(f));
        self
    }

    /// Register a named converter. Re-registering a name replaces the
    /// earlier converter in place.
    pub fn converter(mut self, name: impl Into<String>, converter: Converter) -> Self {
        upsert(&mut self.schema.converters, name.into(), converter);
        self
    }

    /// Register a named result builder. Re-registering a name replaces the
    /// earlier builder in place.
    pub fn result_builder(mut self, name: impl Into<String>, builder: ResultBuilder) -> Self {
        upsert(&mut self.schema.result_builders, name.into(), builder);
        self
    }

    /// Finish the definition.
    pub fn build(self) -> Schema {
        self.schema
    }
}
