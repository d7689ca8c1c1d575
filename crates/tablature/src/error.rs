//! Error types for schema compilation.
//!
//! All failures surface at compile time — when a [`Schema`](crate::Schema) is
//! instantiated into a [`Table`](crate::Table). Rendering itself is total:
//! once a table exists, `header`/`row` cannot fail.

use thiserror::Error;

/// Errors raised while compiling a schema into a table.
///
/// Positions are 1-based and refer to the declaration's place in the
/// schema's registration order. Declarations expanded out of a lazy rule
/// report the position of the rule that produced them.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    /// A column declaration violates a column invariant (unresolvable or
    /// zero width, key list shorter than an explicit width).
    #[error("invalid column in schema `{schema}` at position {position}: {reason}")]
    InvalidColumn {
        /// Name of the schema being compiled.
        schema: String,
        /// 1-based position of the offending declaration.
        position: usize,
        /// Human-readable description of the violated invariant.
        reason: String,
    },

    /// A declaration is not one of the accepted shapes, or is a nil
    /// placeholder while nil declarations are not being ignored.
    #[error("invalid declaration in schema `{schema}` at position {position}: {reason}")]
    InvalidDeclaration {
        /// Name of the schema being compiled.
        schema: String,
        /// 1-based position of the offending declaration.
        position: usize,
        /// Human-readable description of the problem.
        reason: String,
    },

    /// A schema merge could not be performed.
    #[error("schema composition failed: {0}")]
    Composition(String),
}

impl SchemaError {
    pub(crate) fn invalid_column(schema: &str, position: usize, reason: impl Into<String>) -> Self {
        SchemaError::InvalidColumn {
            schema: schema.to_string(),
            position,
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_declaration(
        schema: &str,
        position: usize,
        reason: impl Into<String>,
    ) -> Self {
        SchemaError::InvalidDeclaration {
            schema: schema.to_string(),
            position,
            reason: reason.into(),
        }
    }
}
