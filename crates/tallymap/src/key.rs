use crate::value::Value;
use derive_more::Deref;
use serde::{Deserialize, Serialize};
use std::fmt;

///
/// Key
///
/// One bucket identity: a tuple of values, one per schema field, in schema
/// field order. Keys are plain data — arity checking against a schema
/// happens in the aggregator, not here.
///
/// Ordering is slot-wise canonical value order, then arity, which makes
/// `BTreeMap<Key, _>` iteration deterministic for any variant mix.
///

#[derive(Clone, Debug, Deref, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Key(Vec<Value>);

impl Key {
    #[must_use]
    pub const fn new(parts: Vec<Value>) -> Self {
        Self(parts)
    }

    #[must_use]
    pub fn arity(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn parts(&self) -> &[Value] {
        &self.0
    }

    /// Returns true if any slot equals `needle`.
    #[must_use]
    pub fn contains(&self, needle: &Value) -> bool {
        self.0.iter().any(|v| v == needle)
    }

    /// Returns true if any slot equals any of `needles`.
    ///
    /// This is positional membership across the whole tuple, not a
    /// per-field predicate.
    #[must_use]
    pub fn contains_any(&self, needles: &[Value]) -> bool {
        needles.iter().any(|n| self.contains(n))
    }

    /// The same key with one positional slot removed.
    ///
    /// Caller resolves `position` against a schema first; out-of-range
    /// positions cannot occur on schema-checked keys.
    #[must_use]
    pub(crate) fn without(&self, position: usize) -> Self {
        let parts = self
            .0
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != position)
            .map(|(_, v)| v.clone())
            .collect();

        Self(parts)
    }
}

impl fmt::Display for Key {
    /// Tuple form: `(EUR, de)`; the empty key renders as `()`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, part) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{part}")?;
        }
        write!(f, ")")
    }
}

impl From<Vec<Value>> for Key {
    fn from(parts: Vec<Value>) -> Self {
        Self(parts)
    }
}

impl FromIterator<Value> for Key {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Build a [`Key`] from anything convertible into [`Value`] slots.
///
/// ```ignore
/// let k = key!["EUR", "de"];
/// ```
#[macro_export]
macro_rules! key {
    ( $( $part:expr ),* $(,)? ) => {
        $crate::key::Key::new(vec![ $( $crate::value::Value::from($part) ),* ])
    };
}

///
/// TESTS
///
