//! Order-independent equality for lists and maps of API values.
//!
//! Lists in API payloads carry no meaningful order, so two lists are equal when
//! their elements can be paired one-to-one. Pairing is first-match: each
//! element of `a` consumes the first unconsumed element of `b` it is equal to.
//! When the predicate is not an equivalence relation, the answer may depend on
//! the order of `a`.

use std::collections::BTreeMap;

/// Unordered (multiset) equality under a custom predicate.
pub fn slice_eq_unordered_by<T, F>(a: &[T], b: &[T], mut eq: F) -> bool
where
    F: FnMut(&T, &T) -> bool,
{
    if a.len() != b.len() {
        return false;
    }

    let mut rest: Vec<&T> = b.iter().collect();

    for x in a {
        match rest.iter().position(|y| eq(x, *y)) {
            Some(i) => {
                rest.remove(i);
            }
            None => return false,
        }
    }

    rest.is_empty()
}

/// Unordered (multiset) equality using the elements' own `PartialEq`.
pub fn slice_eq_unordered<T: PartialEq>(a: &[T], b: &[T]) -> bool {
    slice_eq_unordered_by(a, b, |x, y| x == y)
}

/// Unordered equality for values with total equality, such as key strings.
pub fn slice_eq_eq_unordered<T: Eq>(a: &[T], b: &[T]) -> bool {
    slice_eq_unordered_by(a, b, |x, y| x == y)
}

/// Ordered, element-wise equality.
pub fn slice_eq<T: PartialEq>(a: &[T], b: &[T]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x == y)
}

/// Equality of optional values: both absent is equal, exactly one absent is
/// not, and two present values must satisfy `eq`.
pub fn option_eq_by<T, F>(a: Option<&T>, b: Option<&T>, eq: F) -> bool
where
    F: FnOnce(&T, &T) -> bool,
{
    match (a, b) {
        (None, None) => true,
        (Some(x), Some(y)) => eq(x, y),
        _ => false,
    }
}

/// [`option_eq_by`] using the values' own `PartialEq`.
pub fn option_eq<T: PartialEq>(a: &Option<T>, b: &Option<T>) -> bool {
    option_eq_by(a.as_ref(), b.as_ref(), |x, y| x == y)
}

/// Map equality: same key set, and `pred` holds for every pair of values.
pub fn map_eq_by<K, V, F>(a: &BTreeMap<K, V>, b: &BTreeMap<K, V>, mut pred: F) -> bool
where
    K: Ord,
    F: FnMut(&V, &V) -> bool,
{
    if a.len() != b.len() {
        return false;
    }

    a.iter().all(|(k, va)| match b.get(k) {
        Some(vb) => pred(va, vb),
        None => false,
    })
}

/// Map equality using the values' own `PartialEq`.
pub fn map_eq<K: Ord, V: PartialEq>(a: &BTreeMap<K, V>, b: &BTreeMap<K, V>) -> bool {
    map_eq_by(a, b, |x, y| x == y)
}
