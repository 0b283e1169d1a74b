//! Module: aggregate
//! Responsibility: the Key → Total mapping and its accumulation, merge,
//! filter, and dimension-reduction semantics, plus sorted/CSV views.
//! Does not own: value normalization rules (total module) or field-list
//! validation rules (schema module).

mod csv;
mod order;

#[cfg(test)]
mod tests;

use crate::{
    error::TallyError,
    key::Key,
    schema::FieldSchema,
    total::{Observation, Total},
    value::Value,
};
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
};

// re-exports
pub use csv::CsvExportError;
pub use order::{Direction, ValueOrder};

///
/// Aggregator
///
/// Order-irrelevant mapping from fixed-arity keys to running totals.
/// The container iterates in canonical key order; sorted views are
/// produced on demand and never reorder the container itself.
///
/// Every mutating operation validates and normalizes its input before
/// touching any bucket, so a failed call leaves the container unchanged.
///

#[derive(Clone, Debug, PartialEq)]
pub struct Aggregator {
    schema: FieldSchema,
    buckets: BTreeMap<Key, Total>,
}

impl Aggregator {
    ///
    /// CONSTRUCTION
    ///

    #[must_use]
    pub const fn new(schema: FieldSchema) -> Self {
        Self {
            schema,
            buckets: BTreeMap::new(),
        }
    }

    /// An aggregator pre-seeded with zero totals at the given keys.
    ///
    /// Each key is arity-checked against the schema; any mismatch fails
    /// the whole construction.
    pub fn seeded<I>(schema: FieldSchema, keys: I) -> Result<Self, TallyError>
    where
        I: IntoIterator<Item = Key>,
    {
        let mut agg = Self::new(schema);
        for key in keys {
            agg.schema.check_key(&key)?;
            agg.buckets.entry(key).or_insert(Total::ZERO);
        }

        Ok(agg)
    }

    ///
    /// ACCESS
    ///

    #[must_use]
    pub const fn schema(&self) -> &FieldSchema {
        &self.schema
    }

    /// Number of buckets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// The total at `key`, if that bucket exists.
    #[must_use]
    pub fn get(&self, key: &Key) -> Option<Total> {
        self.buckets.get(key).copied()
    }

    /// Entries in canonical key order.
    pub fn entries(&self) -> impl Iterator<Item = (&Key, Total)> {
        self.buckets.iter().map(|(key, total)| (key, *total))
    }

    /// Owned snapshot of all entries, canonical key order.
    ///
    /// The sorted views start from this and reorder their copy.
    #[must_use]
    pub(crate) fn rows(&self) -> Vec<(Key, Total)> {
        self.buckets
            .iter()
            .map(|(key, total)| (key.clone(), *total))
            .collect()
    }

    ///
    /// ACCUMULATION
    ///

    /// Fold one observation into the bucket at `key`.
    ///
    /// A bare number is one observation of that amount; a (count, amount)
    /// pair is explicit. An existing bucket sums elementwise — repeated
    /// calls are associative and commutative per key, and accumulated
    /// mass is never lost.
    pub fn accumulate(
        &mut self,
        key: Key,
        value: impl Into<Observation>,
    ) -> Result<(), TallyError> {
        let total = value.into().normalize()?;
        self.schema.check_key(&key)?;
        self.fold(key, total);

        Ok(())
    }

    /// Accumulate from a raw [`Value`], the external-producer path:
    /// numeric scalars count once, 2-element numeric lists are explicit
    /// (count, amount) pairs.
    pub fn accumulate_value(&mut self, key: Key, value: &Value) -> Result<(), TallyError> {
        let observation = Observation::try_from_value(value)?;
        self.accumulate(key, observation)
    }

    /// Bulk intake from any producer of (key, raw value) entries.
    ///
    /// The batch stages into a scratch aggregator first; the target is
    /// only touched once every entry has normalized, so a failed batch
    /// changes nothing.
    pub fn extend_entries<I>(&mut self, entries: I) -> Result<(), TallyError>
    where
        I: IntoIterator<Item = (Key, Value)>,
    {
        let mut staged = Self::new(self.schema.clone());
        for (key, value) in entries {
            staged.accumulate_value(key, &value)?;
        }

        self.merge(&staged)
    }

    /// Pre-validated fold; the one place buckets are written.
    fn fold(&mut self, key: Key, total: Total) {
        *self.buckets.entry(key).or_insert(Total::ZERO) += total;
    }

    ///
    /// MERGE / COMBINE
    ///

    /// Fold every entry of `other` into `self`.
    ///
    /// Requires the exact same field list, order-sensitive; `other` is
    /// untouched. On a schema mismatch nothing is mutated.
    pub fn merge(&mut self, other: &Self) -> Result<(), TallyError> {
        self.schema.check_same(&other.schema)?;
        for (key, total) in &other.buckets {
            self.fold(key.clone(), *total);
        }

        Ok(())
    }

    /// Non-mutating combination over possibly different schemas.
    ///
    /// The result schema is the union of both field lists — `left`'s
    /// fields in order, then `right`'s unseen fields in its order. Keys
    /// re-seat by field name into union order, with `Value::Null` filling
    /// the slots a source schema lacks. Content is commutative and
    /// associative under that projection; only the union field order
    /// depends on argument order.
    #[must_use]
    pub fn combine(left: &Self, right: &Self) -> Self {
        let (schema, from_left, from_right) = left.schema.union(&right.schema);

        let mut out = Self::new(schema);
        for (key, total) in &left.buckets {
            out.fold(from_left.project(key), *total);
        }
        for (key, total) in &right.buckets {
            out.fold(from_right.project(key), *total);
        }

        out
    }

    ///
    /// DERIVED VIEWS
    ///

    /// The entries whose key tuple contains at least one of `values` in
    /// any position — whole-tuple membership, not a per-field predicate.
    /// Same schema; no values means an empty result.
    #[must_use]
    pub fn filter(&self, values: &[Value]) -> Self {
        let buckets = self
            .buckets
            .iter()
            .filter(|(key, _)| key.contains_any(values))
            .map(|(key, total)| (key.clone(), *total))
            .collect();

        Self {
            schema: self.schema.clone(),
            buckets,
        }
    }

    /// Drop one field dimension: remove the named field from the schema
    /// and that slot from every key, summing the totals of keys that
    /// become identical.
    ///
    /// Collapsing the last remaining field yields a single empty-tuple
    /// bucket holding the grand total.
    pub fn collapse(&self, field: &str) -> Result<Self, TallyError> {
        let position = self.schema.resolve(field)?;

        let mut out = Self::new(self.schema.without(position));
        for (key, total) in &self.buckets {
            out.fold(key.without(position), *total);
        }

        Ok(out)
    }

    /// The distinct values observed in the named field's position.
    pub fn field_values(&self, field: &str) -> Result<BTreeSet<Value>, TallyError> {
        let position = self.schema.resolve(field)?;

        Ok(self
            .buckets
            .keys()
            .map(|key| key[position].clone())
            .collect())
    }

    ///
    /// DIAGNOSTICS
    ///

    /// On-demand snapshot: totals across all buckets plus per-field
    /// distinct-value cardinality, fields in schema order.
    #[must_use]
    pub fn report(&self) -> AggregateReport {
        let mut observations = 0u64;
        let mut amount = 0.0f64;
        for total in self.buckets.values() {
            observations = observations.saturating_add(total.count);
            amount += total.amount;
        }

        let field_cardinality = self
            .schema
            .fields()
            .iter()
            .enumerate()
            .map(|(position, field)| {
                let distinct = self
                    .buckets
                    .keys()
                    .map(|key| &key[position])
                    .collect::<BTreeSet<_>>()
                    .len() as u64;

                FieldCardinality {
                    field: field.clone(),
                    distinct,
                }
            })
            .collect();

        AggregateReport {
            fields: self.schema.fields().to_vec(),
            buckets: self.buckets.len() as u64,
            observations,
            amount,
            field_cardinality,
        }
    }
}

impl fmt::Display for Aggregator {
    /// Banner plus one `key: total` line per bucket, canonical key order.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Aggregate:")?;
        for (key, total) in &self.buckets {
            write!(f, "\n{key}: {total}")?;
        }

        Ok(())
    }
}

///
/// AggregateReport
///
/// Diagnostics snapshot of one aggregator.
///

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct AggregateReport {
    pub fields: Vec<String>,
    pub buckets: u64,
    pub observations: u64,
    pub amount: f64,
    pub field_cardinality: Vec<FieldCardinality>,
}

///
/// FieldCardinality
///
/// Distinct-value count for one field position.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct FieldCardinality {
    pub field: String,
    pub distinct: u64,
}
