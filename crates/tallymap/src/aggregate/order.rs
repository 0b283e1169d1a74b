use crate::{
    aggregate::Aggregator, error::TallyError, key::Key, schema::FieldSchema, total::Total,
};
use std::cmp::Ordering;

///
/// Direction
///
/// Ascending/descending switch applied at the comparator, so ties keep
/// their canonical relative order under either direction.
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    pub(crate) fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Self::Asc => ordering,
            Self::Desc => ordering.reverse(),
        }
    }
}

///
/// ValueOrder
///
/// Which total element leads a value sort; the other breaks ties.
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ValueOrder {
    #[default]
    Amount,
    Count,
}

impl ValueOrder {
    fn compare(self, a: Total, b: Total) -> Ordering {
        // total_cmp is plain numeric order here: amounts are finite by
        // the normalization invariant.
        match self {
            Self::Amount => a
                .amount
                .total_cmp(&b.amount)
                .then_with(|| a.count.cmp(&b.count)),
            Self::Count => a
                .count
                .cmp(&b.count)
                .then_with(|| a.amount.total_cmp(&b.amount)),
        }
    }
}

///
/// ResolvedFieldOrder
///
/// Field names resolved to key positions once, before any comparison,
/// keeping the comparator loop free of name scans.
///

struct ResolvedFieldOrder {
    positions: Vec<usize>,
}

impl ResolvedFieldOrder {
    fn resolve(schema: &FieldSchema, fields: &[&str]) -> Result<Self, TallyError> {
        let positions = fields
            .iter()
            .map(|field| schema.resolve(field))
            .collect::<Result<_, _>>()?;

        Ok(Self { positions })
    }

    /// Walk the resolved slots; the first non-equal slot decides.
    fn compare(&self, left: &Key, right: &Key) -> Ordering {
        for &position in &self.positions {
            let slot = left[position].cmp(&right[position]);
            if slot != Ordering::Equal {
                return slot;
            }
        }

        Ordering::Equal
    }
}

impl Aggregator {
    /// Entries sorted by their totals: (amount, count) under
    /// [`ValueOrder::Amount`], (count, amount) under
    /// [`ValueOrder::Count`]; ties break on the secondary element.
    #[must_use]
    pub fn value_sorted(&self, order: ValueOrder, direction: Direction) -> Vec<(Key, Total)> {
        let mut rows = self.rows();
        rows.sort_by(|(_, a), (_, b)| direction.apply(order.compare(*a, *b)));

        rows
    }

    /// Entries sorted lexicographically by the values at the named field
    /// positions, in the order given. Any unrecognized name fails with an
    /// unknown-field error; an empty list yields canonical key order.
    pub fn field_sorted(
        &self,
        fields: &[&str],
        direction: Direction,
    ) -> Result<Vec<(Key, Total)>, TallyError> {
        let resolved = ResolvedFieldOrder::resolve(self.schema(), fields)?;

        let mut rows = self.rows();
        rows.sort_by(|(a, _), (b, _)| direction.apply(resolved.compare(a, b)));

        Ok(rows)
    }
}
