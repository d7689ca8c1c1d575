//! Rule variants backing column declarations.
//!
//! Every dynamic aspect of a column — its name, value, width, and omission —
//! is expressed as a tagged variant: either a constant known at declaration
//! time or a function evaluated against a context. Keys are the exception:
//! a key must be structurally knowable without row data, so [`KeyRule`] has
//! no derived variant at all.
//!
//! Derived rules receive two contexts: the render context for the current
//! call (header or row) and the table context fixed at instantiation.

use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// A derived name or value rule: `(render_context, table_context) -> value`.
pub type RenderFn = Arc<dyn Fn(&Value, &Value) -> Value + Send + Sync>;

/// A context transformation applied before rendering.
pub type CtxFn = Arc<dyn Fn(Value) -> Value + Send + Sync>;

/// A derived width rule, evaluated against the compile-time context.
pub type WidthFn = Arc<dyn Fn(&Value) -> usize + Send + Sync>;

/// A derived omission rule, evaluated against the compile-time context.
pub type OmitFn = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// How a column produces its header cell(s).
#[derive(Clone)]
pub enum NameRule {
    /// A single constant name.
    Constant(Value),
    /// An ordered list of constant names, one per cell.
    Many(Vec<Value>),
    /// A function of `(header_context, table_context)`.
    Derived(RenderFn),
}

impl NameRule {
    /// A derived name rule from a closure.
    pub fn derived<F>(f: F) -> Self
    where
        F: Fn(&Value, &Value) -> Value + Send + Sync + 'static,
    {
        NameRule::Derived(Arc::new(f))
    }
}

impl fmt::Debug for NameRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NameRule::Constant(v) => f.debug_tuple("Constant").field(v).finish(),
            NameRule::Many(v) => f.debug_tuple("Many").field(v).finish(),
            NameRule::Derived(_) => f.write_str("Derived(..)"),
        }
    }
}

/// How a column produces its body cell(s).
#[derive(Clone)]
pub enum ValueRule {
    /// A constant value, repeated for every row.
    Constant(Value),
    /// A function of `(row_context, table_context)`.
    Derived(RenderFn),
}

impl ValueRule {
    /// A derived value rule from a closure.
    pub fn derived<F>(f: F) -> Self
    where
        F: Fn(&Value, &Value) -> Value + Send + Sync + 'static,
    {
        ValueRule::Derived(Arc::new(f))
    }
}

impl Default for ValueRule {
    fn default() -> Self {
        ValueRule::Constant(Value::Null)
    }
}

impl fmt::Debug for ValueRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueRule::Constant(v) => f.debug_tuple("Constant").field(v).finish(),
            ValueRule::Derived(_) => f.write_str("Derived(..)"),
        }
    }
}

/// The key(s) identifying a column's cells in map-shaped output.
///
/// Keys are constants by construction. `Null` entries in [`KeyRule::Many`]
/// mark cells that fall back to their positional index when building maps.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum KeyRule {
    /// No key; map output falls back to positional indices.
    #[default]
    None,
    /// A single key for a single-cell column.
    One(Value),
    /// One key per cell, `Null` where a cell has no key.
    Many(Vec<Value>),
}

/// How a column's width is determined at compile time.
#[derive(Clone, Default)]
pub enum WidthRule {
    /// Infer from the constant lengths of the name and key rules.
    #[default]
    Infer,
    /// An explicit width; takes precedence over inference.
    Fixed(usize),
    /// A function of the compile-time context.
    Derived(WidthFn),
}

impl WidthRule {
    /// A derived width rule from a closure.
    pub fn derived<F>(f: F) -> Self
    where
        F: Fn(&Value) -> usize + Send + Sync + 'static,
    {
        WidthRule::Derived(Arc::new(f))
    }
}

impl fmt::Debug for WidthRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WidthRule::Infer => f.write_str("Infer"),
            WidthRule::Fixed(w) => f.debug_tuple("Fixed").field(w).finish(),
            WidthRule::Derived(_) => f.write_str("Derived(..)"),
        }
    }
}

/// Whether a column is dropped before compilation.
#[derive(Clone, Default)]
pub enum OmitRule {
    /// Keep the column.
    #[default]
    Never,
    /// Always drop the column.
    Always,
    /// Drop the column when the predicate holds for the compile context.
    When(OmitFn),
}

impl OmitRule {
    /// A conditional omission rule from a closure.
    pub fn when<F>(f: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        OmitRule::When(Arc::new(f))
    }

    pub(crate) fn applies(&self, ctx: &Value) -> bool {
        match self {
            OmitRule::Never => false,
            OmitRule::Always => true,
            OmitRule::When(f) => f(ctx),
        }
    }
}

impl fmt::Debug for OmitRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OmitRule::Never => f.write_str("Never"),
            OmitRule::Always => f.write_str("Always"),
            OmitRule::When(_) => f.write_str("When(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn omit_rule_evaluation() {
        assert!(!OmitRule::Never.applies(&Value::Null));
        assert!(OmitRule::Always.applies(&Value::Null));

        let when = OmitRule::when(|ctx| ctx["hide"] == json!(true));
        assert!(when.applies(&json!({ "hide": true })));
        assert!(!when.applies(&json!({ "hide": false })));
        assert!(!when.applies(&Value::Null));
    }

    #[test]
    fn derived_rules_see_both_contexts() {
        let rule = NameRule::derived(|render, table| json!([render["a"], table["b"]]));
        let NameRule::Derived(f) = rule else {
            panic!("expected derived rule");
        };
        let out = f(&json!({ "a": 1 }), &json!({ "b": 2 }));
        assert_eq!(out, json!([1, 2]));
    }

    #[test]
    fn debug_formatting_is_shallow_for_closures() {
        let rule = ValueRule::derived(|_, _| Value::Null);
        assert_eq!(format!("{:?}", rule), "Derived(..)");
        assert_eq!(
            format!("{:?}", ValueRule::Constant(json!(1))),
            "Constant(Number(1))"
        );
    }
}
