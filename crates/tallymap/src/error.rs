use crate::{schema::SchemaError, total::ValueFormatError};
use thiserror::Error as ThisError;

///
/// TallyError
///
/// The one error surface every fallible aggregator operation returns.
/// Schema and value-format violations keep their structured causes;
/// unknown field names are flat because the name is the whole story.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum TallyError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("unknown field: {field}")]
    UnknownField { field: String },

    #[error(transparent)]
    Value(#[from] ValueFormatError),
}

impl TallyError {
    pub(crate) fn unknown_field(field: &str) -> Self {
        Self::UnknownField {
            field: field.to_string(),
        }
    }

    ///
    /// CLASSIFICATION
    ///

    /// True for key-arity and field-list mismatches.
    #[must_use]
    pub const fn is_schema_mismatch(&self) -> bool {
        matches!(self, Self::Schema(_))
    }

    /// True when a referenced field name is not in the schema.
    #[must_use]
    pub const fn is_unknown_field(&self) -> bool {
        matches!(self, Self::UnknownField { .. })
    }

    /// True when a supplied value could not be normalized.
    #[must_use]
    pub const fn is_value_format(&self) -> bool {
        matches!(self, Self::Value(_))
    }
}

///
/// TESTS
///
