//! Plan annotations: free-form `key=value` metadata.

use crate::cmp;
use crate::error::TypesError;
use crate::tags::assert_user_key;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A single `key=value` annotation.
///
/// Ordering is by key, then by value, comparing bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Annotation {
    pub key: String,
    pub value: String,
}

impl Annotation {
    /// Create an annotation without trimming.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Parse a `key=value` expression. The first `=` separates key from
    /// value; both are trimmed.
    pub fn parse(s: &str) -> Result<Self, TypesError> {
        let (k, v) = s
            .split_once('=')
            .ok_or_else(|| TypesError::grammar("annotation", s, '='))?;
        Ok(Self::new(k.trim(), v.trim()))
    }
}

impl fmt::Display for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

impl FromStr for Annotation {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Annotation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Annotation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(de::Error::custom)
    }
}

/// An unordered collection of annotations.
///
/// Equality ignores order. Serialization emits a copy sorted by
/// `(key, value)` so the output is deterministic; input may come in any order
/// and may hold duplicates.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct Annotations(Vec<Annotation>);

impl Annotations {
    /// An empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// True if there are no annotations.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of annotations, duplicates included.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Annotation> {
        self.0.iter()
    }

    /// The annotations in insertion order.
    pub fn as_slice(&self) -> &[Annotation] {
        &self.0
    }

    /// Consume and return the annotations in insertion order.
    pub fn into_inner(self) -> Vec<Annotation> {
        self.0
    }

    /// A copy of the annotations in canonical order.
    pub fn sorted(&self) -> Vec<Annotation> {
        let mut sorted = self.0.clone();
        sorted.sort();
        sorted
    }
}

impl PartialEq for Annotations {
    fn eq(&self, other: &Self) -> bool {
        cmp::slice_eq_unordered(&self.0, &other.0)
    }
}

impl Serialize for Annotations {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.sorted())
    }
}

impl From<Vec<Annotation>> for Annotations {
    fn from(v: Vec<Annotation>) -> Self {
        Self(v)
    }
}

impl FromIterator<Annotation> for Annotations {
    fn from_iter<I: IntoIterator<Item = Annotation>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Annotations {
    type Item = &'a Annotation;
    type IntoIter = std::slice::Iter<'a, Annotation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Change set of a Plan's annotations.
///
/// The platform applies `remove` and `remove_key` first, then `add`. Keys
/// reserved for the system may not appear in any list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "RawAnnotationChange")]
pub struct AnnotationChange {
    /// Annotations to be added. An existing key gets its value replaced; if
    /// a key is repeated, the last one wins.
    #[serde(skip_serializing_if = "Annotations::is_empty")]
    add: Annotations,

    /// Annotations to be removed, matched on key and value.
    #[serde(skip_serializing_if = "Annotations::is_empty")]
    remove: Annotations,

    /// Keys whose annotations are removed regardless of value.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    remove_key: Vec<String>,
}

impl AnnotationChange {
    /// Build a change set, rejecting reserved keys in every list.
    pub fn new(
        add: Annotations,
        remove: Annotations,
        remove_key: Vec<String>,
    ) -> Result<Self, TypesError> {
        let keys = add
            .iter()
            .chain(remove.iter())
            .map(|a| a.key.as_str())
            .chain(remove_key.iter().map(String::as_str));
        for key in keys {
            assert_user_key(key)?;
        }

        Ok(Self {
            add,
            remove,
            remove_key,
        })
    }

    /// Annotations to be added.
    pub fn add(&self) -> &Annotations {
        &self.add
    }

    /// Annotations to be removed.
    pub fn remove(&self) -> &Annotations {
        &self.remove
    }

    /// Keys whose annotations are removed.
    pub fn remove_key(&self) -> &[String] {
        &self.remove_key
    }
}

impl PartialEq for AnnotationChange {
    fn eq(&self, other: &Self) -> bool {
        self.add == other.add
            && self.remove == other.remove
            && cmp::slice_eq_eq_unordered(&self.remove_key, &other.remove_key)
    }
}

#[derive(Deserialize)]
struct RawAnnotationChange {
    #[serde(default)]
    add: Annotations,
    #[serde(default)]
    remove: Annotations,
    #[serde(default)]
    remove_key: Vec<String>,
}

impl TryFrom<RawAnnotationChange> for AnnotationChange {
    type Error = TypesError;

    fn try_from(raw: RawAnnotationChange) -> Result<Self, Self::Error> {
        Self::new(raw.add, raw.remove, raw.remove_key)
    }
}
