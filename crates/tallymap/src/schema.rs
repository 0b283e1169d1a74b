use crate::{error::TallyError, key::Key, value::Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error as ThisError;

///
/// SchemaError
///
/// Field-list and key-arity violations.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum SchemaError {
    #[error("field list must not be empty")]
    Empty,

    #[error("duplicate field name: {field}")]
    DuplicateField { field: String },

    #[error("key arity {found} does not match schema arity {expected}")]
    ArityMismatch { expected: usize, found: usize },

    #[error("field lists differ: expected {expected:?}, found {found:?}")]
    FieldsMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },
}

///
/// FieldSchema
///
/// Ordered field names, fixed at construction; defines key arity and
/// field→position resolution. Equality is order-sensitive — two schemas
/// with the same names in a different order are different schemas.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct FieldSchema {
    fields: Vec<String>,
}

impl FieldSchema {
    ///
    /// CONSTRUCTION
    ///

    /// Validated constructor: rejects an empty field list and duplicate
    /// names. Field order is preserved exactly as given.
    pub fn new<I, S>(fields: I) -> Result<Self, SchemaError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields = fields.into_iter().map(Into::into).collect::<Vec<_>>();
        if fields.is_empty() {
            return Err(SchemaError::Empty);
        }

        let mut seen = BTreeSet::new();
        for field in &fields {
            if !seen.insert(field.as_str()) {
                return Err(SchemaError::DuplicateField {
                    field: field.clone(),
                });
            }
        }

        Ok(Self { fields })
    }

    /// Internal constructor for derived schemas whose field lists are
    /// already known valid (or validly empty, after a final collapse).
    pub(crate) const fn from_vec(fields: Vec<String>) -> Self {
        Self { fields }
    }

    ///
    /// ACCESS
    ///

    #[must_use]
    pub fn arity(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Position of `field`, or `None` if the schema does not carry it.
    #[must_use]
    pub fn position(&self, field: &str) -> Option<usize> {
        self.fields.iter().position(|f| f == field)
    }

    /// Position of `field`, failing with `UnknownField`.
    pub(crate) fn resolve(&self, field: &str) -> Result<usize, TallyError> {
        self.position(field)
            .ok_or_else(|| TallyError::unknown_field(field))
    }

    ///
    /// CHECKS
    ///

    /// Arity check applied to every key-bearing operation.
    pub(crate) fn check_key(&self, key: &Key) -> Result<(), SchemaError> {
        if key.arity() == self.arity() {
            Ok(())
        } else {
            Err(SchemaError::ArityMismatch {
                expected: self.arity(),
                found: key.arity(),
            })
        }
    }

    /// Order-sensitive field-list equality, the merge precondition.
    pub(crate) fn check_same(&self, other: &Self) -> Result<(), SchemaError> {
        if self.fields == other.fields {
            Ok(())
        } else {
            Err(SchemaError::FieldsMismatch {
                expected: self.fields.clone(),
                found: other.fields.clone(),
            })
        }
    }

    ///
    /// DERIVATION
    ///

    /// The schema minus one resolved position. Collapsing the last field
    /// yields the empty schema, whose only key is the empty tuple.
    pub(crate) fn without(&self, position: usize) -> Self {
        let fields = self
            .fields
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != position)
            .map(|(_, f)| f.clone())
            .collect();

        Self::from_vec(fields)
    }

    /// Deterministic union: `self`'s fields in order, then `other`'s
    /// fields not already present, in `other`'s order. Returns the union
    /// schema plus one projection per side.
    pub(crate) fn union(&self, other: &Self) -> (Self, SchemaProjection, SchemaProjection) {
        let mut fields = self.fields.clone();
        for field in &other.fields {
            if !self.fields.contains(field) {
                fields.push(field.clone());
            }
        }
        let union = Self::from_vec(fields);

        let from_self = SchemaProjection::resolve(self, &union);
        let from_other = SchemaProjection::resolve(other, &union);

        (union, from_self, from_other)
    }
}

///
/// SchemaProjection
///
/// Source positions resolved once per union slot; `None` slots are
/// filled with `Value::Null` during projection. Resolving up front keeps
/// the per-key projection loop free of field-name scans.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct SchemaProjection {
    slots: Vec<Option<usize>>,
}

impl SchemaProjection {
    fn resolve(source: &FieldSchema, union: &FieldSchema) -> Self {
        let slots = union
            .fields()
            .iter()
            .map(|field| source.position(field))
            .collect();

        Self { slots }
    }

    /// Re-seat a source key into union order, `Null`-filling the slots
    /// the source schema does not carry.
    pub(crate) fn project(&self, key: &Key) -> Key {
        self.slots
            .iter()
            .map(|slot| slot.map_or(Value::Null, |i| key[i].clone()))
            .collect()
    }
}

///
/// TESTS
///
