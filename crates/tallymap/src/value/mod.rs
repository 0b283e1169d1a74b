mod float64;


use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, fmt};

// re-exports
pub use float64::Float64;

///
/// CONSTANTS
///

const F64_SAFE_I64: i64 = 1i64 << 53;
const F64_SAFE_U64: u64 = 1u64 << 53;
const F64_SAFE_WHOLE: f64 = 9_007_199_254_740_992.0; // 2^53

///
/// Value
///
/// The scalar vocabulary for key slots and raw observed values.
///
/// Null → a slot with no value (combine projection fills absent fields
///        with it; CSV renders it as an empty cell).
/// List → ordered values; a 2-element numeric list is the explicit
///        (count, amount) observation form.
///
/// Cross-variant ordering is canonical-rank first, payload second, so any
/// mix of variants orders deterministically. Eq/Hash are lawful because
/// floats are carried in the finite-only [`Float64`] newtype.
///

#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum Value {
    Bool(bool),
    Float(Float64),
    Int(i64),
    List(Vec<Self>),
    Null,
    Text(String),
    Uint(u64),
}

impl Value {
    ///
    /// CONSTRUCTION
    ///

    /// Build a `Value::List` from owned items.
    pub fn from_list<T>(items: Vec<T>) -> Self
    where
        T: Into<Self>,
    {
        Self::List(items.into_iter().map(Into::into).collect())
    }

    /// Build a `Value::Float`, rejecting non-finite input.
    #[must_use]
    pub fn float(v: f64) -> Option<Self> {
        Float64::try_new(v).map(Self::Float)
    }

    ///
    /// TYPES
    ///

    /// Returns true if the value is one of the numeric variants.
    #[must_use]
    pub const fn is_numeric(&self) -> bool {
        matches!(self, Self::Float(_) | Self::Int(_) | Self::Uint(_))
    }

    /// Returns true if the value is Text.
    #[must_use]
    pub const fn is_text(&self) -> bool {
        matches!(self, Self::Text(_))
    }

    /// Returns true if the value is Null.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Stable canonical rank used by cross-variant ordering.
    ///
    /// Rank order is part of deterministic view behavior and must remain
    /// fixed; mixed-variant comparisons are rank-only.
    #[must_use]
    pub(crate) const fn canonical_rank(&self) -> u8 {
        match self {
            Self::Null => 0,
            Self::Bool(_) => 1,
            Self::Int(_) => 2,
            Self::Uint(_) => 3,
            Self::Float(_) => 4,
            Self::Text(_) => 5,
            Self::List(_) => 6,
        }
    }

    ///
    /// CONVERSION
    ///

    #[must_use]
    pub const fn as_text(&self) -> Option<&str> {
        if let Self::Text(s) = self {
            Some(s.as_str())
        } else {
            None
        }
    }

    #[must_use]
    pub const fn as_list(&self) -> Option<&[Self]> {
        if let Self::List(xs) = self {
            Some(xs.as_slice())
        } else {
            None
        }
    }

    /// Lossless numeric widening to f64; `None` outside the exact range.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn to_f64_lossless(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(f.get()),
            Self::Int(i) if (-F64_SAFE_I64..=F64_SAFE_I64).contains(i) => Some(*i as f64),
            Self::Uint(u) if *u <= F64_SAFE_U64 => Some(*u as f64),
            _ => None,
        }
    }

    /// Exact non-negative integer reading; whole-valued floats qualify.
    ///
    /// Fractional, negative, and out-of-range input all return `None` —
    /// a count is never silently truncated.
    #[expect(clippy::cast_possible_truncation)]
    #[expect(clippy::cast_sign_loss)]
    #[must_use]
    pub fn to_count(&self) -> Option<u64> {
        match self {
            Self::Uint(u) => Some(*u),
            Self::Int(i) if *i >= 0 => Some(*i as u64),
            Self::Float(f) => {
                let v = f.get();
                ((0.0..=F64_SAFE_WHOLE).contains(&v) && v.fract() == 0.0).then_some(v as u64)
            }
            _ => None,
        }
    }
}

impl Ord for Value {
    /// Total canonical comparator used by every ordering surface.
    ///
    /// Ordering rules:
    /// 1. Canonical variant rank
    /// 2. Variant-specific comparison for same-ranked values
    fn cmp(&self, other: &Self) -> Ordering {
        let rank = self.canonical_rank().cmp(&other.canonical_rank());
        if rank != Ordering::Equal {
            return rank;
        }

        #[allow(clippy::match_same_arms)]
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => a.cmp(b),
            (Self::Float(a), Self::Float(b)) => a.cmp(b),
            (Self::Int(a), Self::Int(b)) => a.cmp(b),
            (Self::List(a), Self::List(b)) => a.cmp(b),
            (Self::Null, Self::Null) => Ordering::Equal,
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            (Self::Uint(a), Self::Uint(b)) => a.cmp(b),
            _ => Ordering::Equal,
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Value {
    /// Cell rendering: Null is an empty cell, scalars render bare, lists
    /// render bracketed.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Self::Null => Ok(()),
            Self::Text(v) => write!(f, "{v}"),
            Self::Uint(v) => write!(f, "{v}"),
        }
    }
}

macro_rules! impl_value_from {
    ( $( $type:ty => $variant:ident ),* $(,)? ) => {
        $(
            impl From<$type> for Value {
                fn from(v: $type) -> Self {
                    Self::$variant(v.into())
                }
            }
        )*
    };
}

impl_value_from! {
    bool    => Bool,
    Float64 => Float,
    i8      => Int,
    i16     => Int,
    i32     => Int,
    i64     => Int,
    &str    => Text,
    String  => Text,
    u8      => Uint,
    u16     => Uint,
    u32     => Uint,
    u64     => Uint,
}

impl From<Vec<Self>> for Value {
    fn from(vec: Vec<Self>) -> Self {
        Self::List(vec)
    }
}

impl From<()> for Value {
    fn from((): ()) -> Self {
        Self::Null
    }
}

impl TryFrom<f64> for Value {
    type Error = ();

    fn try_from(v: f64) -> Result<Self, Self::Error> {
        Self::float(v).ok_or(())
    }
}
