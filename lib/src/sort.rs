//! Ordering heterogeneous collections without coercion.
//!
//! Sort keys are only ever compared against keys of the same kind: strings
//! with strings, signed integers with signed integers (of any width), unsigned
//! with unsigned, floats with floats. Any other pair is "not less" in either
//! direction. Since the sort is stable, such pairs keep their input order.

use std::cmp::Ordering;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::value::{Num, Value};

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Order {
    #[default]
    Asc,
    Desc,
}

impl FromStr for Order {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "asc" => Ok(Order::Asc),
            "desc" => Ok(Order::Desc),
            _ => err! {
                "invalid sort order",
                "expected" => "`asc` or `desc`",
                "found" => s,
            },
        }
    }
}

/// The comparable projection of a value.
#[derive(Debug, Clone, PartialEq)]
pub enum SortKey {
    Str(Arc<str>),
    Signed(i128),
    Unsigned(u128),
    Float(f64),
    /// Null, booleans, sequences, mappings: never less than anything.
    Incomparable,
}

impl PartialOrd for SortKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (SortKey::Str(a), SortKey::Str(b)) => Some(a.as_bytes().cmp(b.as_bytes())),
            (SortKey::Signed(a), SortKey::Signed(b)) => Some(a.cmp(b)),
            (SortKey::Unsigned(a), SortKey::Unsigned(b)) => Some(a.cmp(b)),
            (SortKey::Float(a), SortKey::Float(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

impl From<Num> for SortKey {
    fn from(num: Num) -> Self {
        if let Some(v) = num.as_signed() {
            SortKey::Signed(v)
        } else if let Some(v) = num.as_unsigned() {
            SortKey::Unsigned(v)
        } else if let Some(v) = num.as_float() {
            SortKey::Float(v)
        } else {
            SortKey::Incomparable
        }
    }
}

/// The shape of a collection handed to [`sort()`].
pub enum Shape<T> {
    /// `(key, value)` pairs in the mapping's iteration order.
    Map(Vec<(T, T)>),
    Seq(Vec<T>),
    Other,
}

/// A value that can be sorted, or used as a sort key, by [`sort()`].
pub trait Sortable: Clone {
    /// Snapshots `self` as a mapping or a sequence.
    fn shape(&self) -> Shape<Self>;

    /// `None` if `self` isn't a mapping, `Some(None)` if it is but has no
    /// entry named `field`.
    fn field(&self, field: &str) -> Option<Option<Self>>;

    fn sort_key(&self) -> SortKey;

    /// A name for the kind of `self`, for error messages.
    fn kind_name(&self) -> String;
}

/// Sorts the elements of `collection` by themselves or by their `field`.
///
/// For a mapping, the elements are its values and the default sort key is the
/// entry's key. A `field` that is empty is treated as absent. The input is
/// never modified.
pub fn sort<T: Sortable>(collection: &T, field: Option<&str>, order: Order) -> Result<Vec<T>> {
    let field = field.filter(|f| !f.is_empty());
    let pairs = match collection.shape() {
        Shape::Map(entries) => entries,
        Shape::Seq(items) => items.into_iter().map(|v| (v.clone(), v)).collect(),
        Shape::Other => return err! {
            "unsortable type",
            "expected" => "a mapping or a sequence",
            "found" => collection.kind_name(),
        },
    };

    let mut keyed = Vec::with_capacity(pairs.len());
    for (default_key, value) in pairs {
        let key = match field {
            None => default_key.sort_key(),
            Some(field) => match value.field(field) {
                Some(Some(v)) => v.sort_key(),
                Some(None) => return err! {
                    "missing sort field",
                    "field" => field,
                    "element" => value.kind_name(),
                },
                None => return err! {
                    "sort by field requires mapping elements",
                    "field" => field,
                    "found" => value.kind_name(),
                },
            },
        };

        keyed.push((key, value));
    }

    let sorted = match order {
        Order::Asc => merge_sort(keyed, &|a: &(SortKey, T), b: &(SortKey, T)| a.0 < b.0),
        Order::Desc => merge_sort(keyed, &|a: &(SortKey, T), b: &(SortKey, T)| b.0 < a.0),
    };

    Ok(sorted.into_iter().map(|(_, v)| v).collect())
}

/// A stable merge sort that only asks whether one item is strictly less than
/// another. Nothing is assumed about transitivity or totality.
fn merge_sort<T, F: Fn(&T, &T) -> bool>(mut items: Vec<T>, less: &F) -> Vec<T> {
    if items.len() <= 1 {
        return items;
    }

    let right = items.split_off(items.len() / 2);
    let left = merge_sort(items, less).into_iter();
    let right = merge_sort(right, less).into_iter();

    let mut merged = Vec::with_capacity(left.len() + right.len());
    let (mut left, mut right) = (left.peekable(), right.peekable());
    loop {
        let take_right = match (left.peek(), right.peek()) {
            (Some(l), Some(r)) => less(r, l),
            (Some(_), None) => false,
            (None, Some(_)) => true,
            (None, None) => break,
        };

        merged.extend(if take_right { right.next() } else { left.next() });
    }

    merged
}

impl Sortable for Value {
    fn shape(&self) -> Shape<Self> {
        match self {
            Value::Dict(dict) => Shape::Map(dict.iter()
                .map(|(k, v)| (Value::from(k.clone()), v.clone()))
                .collect()),
            Value::Array(items) => Shape::Seq(items.to_vec()),
            _ => Shape::Other,
        }
    }

    fn field(&self, field: &str) -> Option<Option<Self>> {
        self.as_dict().map(|dict| dict.get(field).cloned())
    }

    fn sort_key(&self) -> SortKey {
        match self {
            Value::String(s) => SortKey::Str(s.clone()),
            Value::Num(n) => SortKey::from(*n),
            _ => SortKey::Incomparable,
        }
    }

    fn kind_name(&self) -> String {
        self.kind().to_string()
    }
}

impl Sortable for minijinja::Value {
    fn shape(&self) -> Shape<Self> {
        use minijinja::value::ValueKind;

        let Ok(iter) = self.try_iter() else {
            return Shape::Other;
        };

        match self.kind() {
            ValueKind::Map => Shape::Map(iter
                .map(|key| {
                    let value = self.get_item(&key).unwrap_or(minijinja::Value::UNDEFINED);
                    (key, value)
                })
                .collect()),
            ValueKind::Seq | ValueKind::Iterable => Shape::Seq(iter.collect()),
            _ => Shape::Other,
        }
    }

    fn field(&self, field: &str) -> Option<Option<Self>> {
        if self.kind() != minijinja::value::ValueKind::Map {
            return None;
        }

        let value = self.get_attr(field).unwrap_or(minijinja::Value::UNDEFINED);
        Some((!value.is_undefined()).then_some(value))
    }

    fn sort_key(&self) -> SortKey {
        use minijinja::value::ValueKind;

        match self.kind() {
            ValueKind::String => self.as_str().map_or(SortKey::Incomparable, |s| SortKey::Str(s.into())),
            // Anything that fits an `i64` is signed; larger positives are
            // unsigned, as in JSON decoding.
            ValueKind::Number if self.is_integer() => {
                if let Ok(v) = i64::try_from(self.clone()) {
                    SortKey::Signed(v.into())
                } else if let Ok(v) = u128::try_from(self.clone()) {
                    SortKey::Unsigned(v)
                } else if let Ok(v) = i128::try_from(self.clone()) {
                    SortKey::Signed(v)
                } else {
                    SortKey::Incomparable
                }
            }
            ValueKind::Number => f64::try_from(self.clone())
                .map_or(SortKey::Incomparable, SortKey::Float),
            _ => SortKey::Incomparable,
        }
    }

    fn kind_name(&self) -> String {
        self.kind().to_string()
    }
}
