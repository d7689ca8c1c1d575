//! Post-processing stages applied around header and body production.
//!
//! Two capabilities exist: per-value [`Converter`]s transform each resolved
//! cell, whole-row [`ResultBuilder`]s transform the entire rendered row.
//! A table flattens its schema's registrations into one ordered [`Pipeline`]
//! per render kind at construction time; rendering then just iterates the
//! stage list.

use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// A per-cell transform: `(value, render_context, table_context) -> value`.
pub type ConvertFn = Arc<dyn Fn(&Value, &Value, &Value) -> Value + Send + Sync>;

/// A whole-row transform: `(row, keys, render_context, table_context) -> row`.
pub type BuildFn = Arc<dyn Fn(Value, &[Value], &Value, &Value) -> Value + Send + Sync>;

/// Which kind of render call a stage applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum RenderKind {
    Header,
    Body,
}

/// A named, scoped per-cell transform.
///
/// Converters run in registration order after width normalization, each
/// receiving the previous converter's output.
#[derive(Clone)]
pub struct Converter {
    header: bool,
    body: bool,
    f: ConvertFn,
}

impl Converter {
    /// A converter applied to both header and body cells.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Value, &Value, &Value) -> Value + Send + Sync + 'static,
    {
        Converter {
            header: true,
            body: true,
            f: Arc::new(f),
        }
    }

    /// A converter applied to header cells only.
    pub fn header_only<F>(f: F) -> Self
    where
        F: Fn(&Value, &Value, &Value) -> Value + Send + Sync + 'static,
    {
        Converter {
            header: true,
            body: false,
            f: Arc::new(f),
        }
    }

    /// A converter applied to body cells only.
    pub fn body_only<F>(f: F) -> Self
    where
        F: Fn(&Value, &Value, &Value) -> Value + Send + Sync + 'static,
    {
        Converter {
            header: false,
            body: true,
            f: Arc::new(f),
        }
    }

    pub(crate) fn applies_to(&self, kind: RenderKind) -> bool {
        match kind {
            RenderKind::Header => self.header,
            RenderKind::Body => self.body,
        }
    }

    pub(crate) fn func(&self) -> ConvertFn {
        Arc::clone(&self.f)
    }
}

impl fmt::Debug for Converter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Converter")
            .field("header", &self.header)
            .field("body", &self.body)
            .finish_non_exhaustive()
    }
}

/// A named, scoped whole-row transform.
///
/// Builders run in registration order after all per-cell conversion, each
/// consuming the previous builder's output as its row.
#[derive(Clone)]
pub struct ResultBuilder {
    header: bool,
    body: bool,
    f: BuildFn,
}

impl ResultBuilder {
    /// A builder applied to both header and body rows.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Value, &[Value], &Value, &Value) -> Value + Send + Sync + 'static,
    {
        ResultBuilder {
            header: true,
            body: true,
            f: Arc::new(f),
        }
    }

    /// A builder applied to header rows only.
    pub fn header_only<F>(f: F) -> Self
    where
        F: Fn(Value, &[Value], &Value, &Value) -> Value + Send + Sync + 'static,
    {
        ResultBuilder {
            header: true,
            body: false,
            f: Arc::new(f),
        }
    }

    /// A builder applied to body rows only.
    pub fn body_only<F>(f: F) -> Self
    where
        F: Fn(Value, &[Value], &Value, &Value) -> Value + Send + Sync + 'static,
    {
        ResultBuilder {
            header: false,
            body: true,
            f: Arc::new(f),
        }
    }

    pub(crate) fn applies_to(&self, kind: RenderKind) -> bool {
        match kind {
            RenderKind::Header => self.header,
            RenderKind::Body => self.body,
        }
    }

    pub(crate) fn func(&self) -> BuildFn {
        Arc::clone(&self.f)
    }
}

impl fmt::Debug for ResultBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultBuilder")
            .field("header", &self.header)
            .field("body", &self.body)
            .finish_non_exhaustive()
    }
}

/// One stage of a compiled pipeline.
#[derive(Clone)]
pub(crate) enum Stage {
    PerValue(ConvertFn),
    WholeRow(BuildFn),
}

impl fmt::Debug for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::PerValue(_) => f.write_str("PerValue(..)"),
            Stage::WholeRow(_) => f.write_str("WholeRow(..)"),
        }
    }
}

/// The ordered stage list for one render kind, flattened once at table
/// construction: scoped converters first, then the shape builder (map
/// output only), then scoped result builders.
#[derive(Clone, Debug, Default)]
pub(crate) struct Pipeline {
    stages: Vec<Stage>,
}

impl Pipeline {
    pub(crate) fn assemble(
        kind: RenderKind,
        converters: &[(String, Converter)],
        shape_builder: Option<BuildFn>,
        builders: &[(String, ResultBuilder)],
    ) -> Self {
        let mut stages = Vec::new();
        for (_, converter) in converters {
            if converter.applies_to(kind) {
                stages.push(Stage::PerValue(converter.func()));
            }
        }
        if let Some(f) = shape_builder {
            stages.push(Stage::WholeRow(f));
        }
        for (_, builder) in builders {
            if builder.applies_to(kind) {
                stages.push(Stage::WholeRow(builder.func()));
            }
        }
        Pipeline { stages }
    }

    /// Run only the per-value stages over a flattened cell list. Used for
    /// nested-table groups, whose cells are spliced into a parent row
    /// before the parent's own stages run.
    pub(crate) fn apply_values(&self, cells: &mut Vec<Value>, ctx: &Value, table_ctx: &Value) {
        for stage in &self.stages {
            if let Stage::PerValue(f) = stage {
                for cell in cells.iter_mut() {
                    *cell = f(cell, ctx, table_ctx);
                }
            }
        }
    }

    /// Run only the whole-row stages over an already-converted row.
    pub(crate) fn apply_rows(
        &self,
        mut row: Value,
        keys: &[Value],
        ctx: &Value,
        table_ctx: &Value,
    ) -> Value {
        for stage in &self.stages {
            if let Stage::WholeRow(f) = stage {
                row = f(row, keys, ctx, table_ctx);
            }
        }
        row
    }
}

/// The built-in map-shape builder: zips keys with values, falling back to
/// the positional index rendered as a decimal string when a key is `Null`.
pub(crate) fn map_shape_builder() -> BuildFn {
    Arc::new(|row, keys, _ctx, _table_ctx| {
        let cells = match row {
            Value::Array(cells) => cells,
            other => return other,
        };
        let mut map = serde_json::Map::with_capacity(cells.len());
        for (index, cell) in cells.into_iter().enumerate() {
            let key = match keys.get(index) {
                Some(Value::String(s)) => s.clone(),
                Some(Value::Null) | None => index.to_string(),
                Some(other) => other.to_string(),
            };
            map.insert(key, cell);
        }
        Value::Object(map)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn upcase() -> Converter {
        Converter::new(|v, _, _| match v {
            Value::String(s) => Value::String(s.to_uppercase()),
            other => other.clone(),
        })
    }

    fn suffix(tag: &'static str) -> Converter {
        Converter::new(move |v, _, _| match v {
            Value::String(s) => Value::String(format!("{s}{tag}")),
            other => other.clone(),
        })
    }

    #[test]
    fn converters_apply_in_registration_order() {
        let converters = vec![
            ("up".to_string(), upcase()),
            ("tag".to_string(), suffix("!")),
        ];
        let pipeline = Pipeline::assemble(RenderKind::Body, &converters, None, &[]);

        let mut cells = vec![json!("ab")];
        pipeline.apply_values(&mut cells, &Value::Null, &Value::Null);
        assert_eq!(cells, vec![json!("AB!")]);

        let reversed = vec![
            ("tag".to_string(), suffix("!")),
            ("up".to_string(), upcase()),
        ];
        let pipeline = Pipeline::assemble(RenderKind::Body, &reversed, None, &[]);
        let mut cells = vec![json!("ab")];
        pipeline.apply_values(&mut cells, &Value::Null, &Value::Null);
        assert_eq!(cells, vec![json!("AB!")]);
    }

    #[test]
    fn scoped_converters_are_filtered_by_kind() {
        let converters = vec![(
            "body".to_string(),
            Converter::body_only(|_, _, _| json!("body")),
        )];
        let header = Pipeline::assemble(RenderKind::Header, &converters, None, &[]);
        let body = Pipeline::assemble(RenderKind::Body, &converters, None, &[]);

        let mut cells = vec![json!("x")];
        header.apply_values(&mut cells, &Value::Null, &Value::Null);
        assert_eq!(cells, vec![json!("x")]);

        body.apply_values(&mut cells, &Value::Null, &Value::Null);
        assert_eq!(cells, vec![json!("body")]);
    }

    #[test]
    fn builders_chain_on_previous_output() {
        let builders = vec![
            (
                "wrap".to_string(),
                ResultBuilder::new(|row, _, _, _| json!({ "row": row })),
            ),
            (
                "label".to_string(),
                ResultBuilder::new(|row, _, _, _| json!({ "labeled": row })),
            ),
        ];
        let pipeline = Pipeline::assemble(RenderKind::Body, &[], None, &builders);
        let out = pipeline.apply_rows(json!([1]), &[], &Value::Null, &Value::Null);
        assert_eq!(out, json!({ "labeled": { "row": [1] } }));
    }

    #[test]
    fn map_shape_builder_zips_keys_and_indexes() {
        let build = map_shape_builder();
        let keys = vec![json!("id"), Value::Null, json!("name")];
        let out = build(json!([1, 2, 3]), &keys, &Value::Null, &Value::Null);
        assert_eq!(out, json!({ "id": 1, "1": 2, "name": 3 }));
    }

    #[test]
    fn shape_builder_runs_before_registered_builders() {
        let builders = vec![(
            "count".to_string(),
            ResultBuilder::new(|row, _, _, _| match row {
                Value::Object(map) => json!({ "size": map.len() }),
                other => other,
            }),
        )];
        let pipeline = Pipeline::assemble(
            RenderKind::Body,
            &[],
            Some(map_shape_builder()),
            &builders,
        );
        let keys = vec![json!("a"), json!("b")];
        let out = pipeline.apply_rows(json!([1, 2]), &keys, &Value::Null, &Value::Null);
        assert_eq!(out, json!({ "size": 2 }));
    }
}
