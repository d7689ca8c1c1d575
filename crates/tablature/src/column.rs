//! Column declarations and their compiled form.
//!
//! A [`ColumnSpec`] is the user-facing declaration record: name, key, value,
//! width, and omission rules, assembled with a fluent API. Compilation
//! resolves the width exactly once and produces an immutable [`Column`]
//! whose rendered name/key/value sequences always have that exact width —
//! shorter raw results are right-padded with `Null`, longer ones are
//! right-truncated.

use serde_json::Value;

use crate::rule::{KeyRule, NameRule, OmitRule, ValueRule, WidthRule};

/// Declaration record for one logical column.
///
/// All setters are by-value and chainable, in the usual builder style:
///
/// ```rust
/// use tablature::ColumnSpec;
///
/// let spec = ColumnSpec::new()
///     .named("ID")
///     .key("id")
///     .value_with(|row, _| row["id"].clone());
/// ```
#[derive(Clone, Debug, Default)]
pub struct ColumnSpec {
    pub(crate) name: Option<NameRule>,
    pub(crate) key: KeyRule,
    pub(crate) value: ValueRule,
    pub(crate) width: WidthRule,
    pub(crate) omit: OmitRule,
}

impl ColumnSpec {
    /// Create an empty declaration. Without further setters it renders a
    /// single `Null` header cell and `Null` body cells.
    pub fn new() -> Self {
        ColumnSpec::default()
    }

    /// Set a single constant name.
    pub fn named(mut self, name: impl Into<Value>) -> Self {
        self.name = Some(NameRule::Constant(name.into()));
        self
    }

    /// Set an ordered list of constant names, one per cell. The list length
    /// doubles as the inferred width when no explicit width is declared.
    pub fn names<I>(mut self, names: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        self.name = Some(NameRule::Many(names.into_iter().map(Into::into).collect()));
        self
    }

    /// Derive the name from `(header_context, table_context)`.
    pub fn name_with<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value, &Value) -> Value + Send + Sync + 'static,
    {
        self.name = Some(NameRule::derived(f));
        self
    }

    /// Set a single key.
    pub fn key(mut self, key: impl Into<Value>) -> Self {
        self.key = KeyRule::One(key.into());
        self
    }

    /// Set one key per cell. Pass `Value::Null` entries for cells without a
    /// key; those fall back to positional indices in map-shaped output.
    pub fn keys<I>(mut self, keys: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        self.key = KeyRule::Many(keys.into_iter().map(Into::into).collect());
        self
    }

    /// Set a constant value, emitted for every row.
    pub fn value(mut self, value: impl Into<Value>) -> Self {
        self.value = ValueRule::Constant(value.into());
        self
    }

    /// Derive the value from `(row_context, table_context)`.
    pub fn value_with<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value, &Value) -> Value + Send + Sync + 'static,
    {
        self.value = ValueRule::derived(f);
        self
    }

    /// Declare an explicit width. Takes precedence over inference.
    pub fn width(mut self, width: usize) -> Self {
        self.width = WidthRule::Fixed(width);
        self
    }

    /// Derive the width from the compile-time context.
    pub fn width_with<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value) -> usize + Send + Sync + 'static,
    {
        self.width = WidthRule::derived(f);
        self
    }

    /// Unconditionally drop this column at compile time.
    pub fn omitted(mut self) -> Self {
        self.omit = OmitRule::Always;
        self
    }

    /// Drop this column when the predicate holds for the compile context.
    pub fn omitted_when<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.omit = OmitRule::when(f);
        self
    }

    /// Resolve the declared width against the compile context, or infer it
    /// from the constant lengths of the name and key rules.
    fn resolve_width(&self, ctx: &Value) -> Result<usize, String> {
        let explicit = match &self.width {
            WidthRule::Fixed(w) => Some(*w),
            WidthRule::Derived(f) => Some(f(ctx)),
            WidthRule::Infer => None,
        };

        let width = match explicit {
            Some(width) => {
                let key_len = match &self.key {
                    KeyRule::None => None,
                    KeyRule::One(_) => Some(1),
                    KeyRule::Many(keys) => Some(keys.len()),
                };
                if let Some(key_len) = key_len {
                    if key_len < width {
                        return Err(format!(
                            "key length {key_len} is shorter than declared width {width}"
                        ));
                    }
                }
                width
            }
            None => {
                let name_len = match &self.name {
                    Some(NameRule::Constant(_)) => Some(1),
                    Some(NameRule::Many(names)) => Some(names.len()),
                    Some(NameRule::Derived(_)) | None => None,
                };
                let key_len = match &self.key {
                    KeyRule::None => None,
                    KeyRule::One(_) => Some(1),
                    KeyRule::Many(keys) => Some(keys.len()),
                };
                match (name_len, key_len) {
                    (None, None) => {
                        return Err(
                            "width cannot be inferred; declare an explicit width, \
                             a constant name, or a key"
                                .to_string(),
                        )
                    }
                    _ => name_len.unwrap_or(0).max(key_len.unwrap_or(0)),
                }
            }
        };

        if width == 0 {
            return Err("width must be positive".to_string());
        }
        Ok(width)
    }

    /// Compile this declaration into an immutable [`Column`].
    ///
    /// Errors carry only the reason; the definition compiler wraps them
    /// with the schema name and declaration position.
    pub(crate) fn compile(
        &self,
        ctx: &Value,
        key_prefix: Option<&str>,
        key_suffix: Option<&str>,
    ) -> Result<Column, String> {
        let width = self.resolve_width(ctx)?;

        let mut keys = match &self.key {
            KeyRule::None => Vec::new(),
            KeyRule::One(key) => vec![key.clone()],
            KeyRule::Many(keys) => keys.clone(),
        };
        keys.resize(width, Value::Null);

        if key_prefix.is_some() || key_suffix.is_some() {
            let prefix = key_prefix.unwrap_or("");
            let suffix = key_suffix.unwrap_or("");
            for key in &mut keys {
                if let Value::String(s) = key {
                    *key = Value::String(format!("{prefix}{s}{suffix}"));
                }
            }
        }

        Ok(Column {
            name: self.name.clone(),
            keys,
            value: self.value.clone(),
            width,
        })
    }
}

/// A compiled column: fixed width, pre-normalized keys, name and value
/// rules. Immutable after compilation.
#[derive(Clone, Debug)]
pub struct Column {
    name: Option<NameRule>,
    keys: Vec<Value>,
    value: ValueRule,
    width: usize,
}

impl Column {
    /// The fixed number of cells this column occupies in every row.
    pub fn width(&self) -> usize {
        self.width
    }

    /// The normalized key cells, exactly [`width`](Self::width) entries.
    pub fn keys(&self) -> &[Value] {
        &self.keys
    }

    /// Evaluate the name rule and width-normalize the result.
    pub fn resolve_name(&self, header_ctx: &Value, table_ctx: &Value) -> Value {
        let raw = match &self.name {
            None => Value::Null,
            Some(NameRule::Constant(v)) => v.clone(),
            Some(NameRule::Many(names)) => Value::Array(names.clone()),
            Some(NameRule::Derived(f)) => f(header_ctx, table_ctx),
        };
        self.normalize(raw)
    }

    /// Evaluate the value rule and width-normalize the result.
    pub fn resolve_value(&self, row_ctx: &Value, table_ctx: &Value) -> Value {
        let raw = match &self.value {
            ValueRule::Constant(v) => v.clone(),
            ValueRule::Derived(f) => f(row_ctx, table_ctx),
        };
        self.normalize(raw)
    }

    /// Width normalization: at width 1 a non-list result passes through as
    /// a scalar; anything else becomes a list padded with `Null` or
    /// truncated on the right to exactly `width` elements.
    fn normalize(&self, raw: Value) -> Value {
        if self.width == 1 && !raw.is_array() {
            return raw;
        }
        let mut cells = match raw {
            Value::Array(cells) => cells,
            other => vec![other],
        };
        cells.resize(self.width, Value::Null);
        Value::Array(cells)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    proptest! {
        #[test]
        fn normalized_length_is_exactly_the_declared_width(
            width in 1usize..8,
            len in 0usize..12,
        ) {
            let items: Vec<Value> = (0..len).map(|i| json!(i)).collect();
            let source = items.clone();
            let spec = ColumnSpec::new()
                .width(width)
                .value_with(move |_, _| Value::Array(source.clone()));
            let col = spec.compile(&Value::Null, None, None).unwrap();

            let resolved = col.resolve_value(&Value::Null, &Value::Null);
            let cells = resolved.as_array().expect("width-normalized list");
            prop_assert_eq!(cells.len(), width);

            for (i, cell) in cells.iter().enumerate() {
                if i < len.min(width) {
                    prop_assert_eq!(cell, &items[i]);
                } else {
                    prop_assert_eq!(cell, &Value::Null);
                }
            }
        }

        #[test]
        fn key_cells_always_match_width(
            width in 1usize..8,
            key_count in 0usize..8,
        ) {
            let keys: Vec<Value> = (0..key_count).map(|i| json!(format!("k{i}"))).collect();
            let spec = ColumnSpec::new().width(width).keys(keys);
            let compiled = spec.compile(&Value::Null, None, None);

            if key_count < width {
                prop_assert!(compiled.is_err());
            } else {
                prop_assert_eq!(compiled.unwrap().keys().len(), width);
            }
        }
    }
}
