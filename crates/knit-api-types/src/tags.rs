//! Tags attached to Data and to Plan mountpoints.
//!
//! A tag is written `KEY:VALUE` on the wire. Keys starting with
//! [`SYSTEM_TAG_PREFIX`] belong to the platform: they are readable by users,
//! but never writable through a [`UserTag`] or a [`Change`].

use crate::cmp;
use crate::error::{FieldProblem, TypesError};
use crate::ids::KnitId;
use crate::rfctime::Rfc3339;
use serde::de::{self, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Prefix of keys reserved for system tags.
pub const SYSTEM_TAG_PREFIX: &str = "knit#";

/// Key of the system tag holding the Data's id.
pub const KEY_KNIT_ID: &str = "knit#id";

/// Key of the system tag holding the Data's creation time.
pub const KEY_KNIT_TIMESTAMP: &str = "knit#timestamp";

/// Key of the system tag marking Data which is not (or no longer) usable.
pub const KEY_KNIT_TRANSIENT: &str = "knit#transient";

/// True if `key` is reserved for system tags.
pub fn is_system_key(key: &str) -> bool {
    key.starts_with(SYSTEM_TAG_PREFIX)
}

/// Fail with [`TypesError::Policy`] if `key` is reserved for system tags.
pub fn assert_user_key(key: &str) -> Result<(), TypesError> {
    if is_system_key(key) {
        return Err(TypesError::Policy {
            key: key.to_owned(),
        });
    }
    Ok(())
}

/// Value of the `knit#transient` system tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transient {
    /// The upstream Run is processing and the Data is under creation.
    Processing,
    /// The upstream Run has failed.
    Failed,
    /// The Data has been purged.
    ///
    /// Runs using it cannot be retried and it cannot be downloaded.
    Purged,
}

impl Transient {
    pub const ALL: [Transient; 3] = [Self::Processing, Self::Failed, Self::Purged];

    /// Value as written in the tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Processing => "processing",
            Self::Failed => "failed",
            Self::Purged => "purged",
        }
    }
}

impl fmt::Display for Transient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Transient {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| TypesError::Constraint {
                key: KEY_KNIT_TRANSIENT.to_owned(),
                value: s.to_owned(),
                reason: r#"should be one of "processing", "failed", or "purged""#.to_owned(),
            })
    }
}

/// A key/value pair attached to Data, or required by a Plan's mountpoint.
///
/// Build one from user input with [`Tag::parse`]. [`Tag::new`] trusts its
/// arguments as they are.
#[derive(Debug, Clone)]
pub struct Tag {
    key: String,
    value: String,
}

impl Tag {
    /// Create a tag without validation.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// `knit#id:<id>`
    pub fn knit_id(id: &KnitId) -> Self {
        Self::new(KEY_KNIT_ID, id.as_str())
    }

    /// `knit#timestamp:<time>`
    pub fn timestamp(at: &Rfc3339) -> Self {
        Self::new(KEY_KNIT_TIMESTAMP, at.to_string())
    }

    /// `knit#transient:<state>`
    pub fn transient(state: Transient) -> Self {
        Self::new(KEY_KNIT_TRANSIENT, state.as_str())
    }

    /// Parse and validate a `KEY:VALUE` expression.
    ///
    /// The first `:` separates key from value; both are trimmed. Values of
    /// `knit#timestamp` must be RFC 3339 date-times and values of
    /// `knit#transient` one of [`Transient`]. Other keys, system or not,
    /// accept any value.
    pub fn parse(s: &str) -> Result<Self, TypesError> {
        let (k, v) = s
            .split_once(':')
            .ok_or_else(|| TypesError::grammar("tag", s, ':'))?;
        let (k, v) = (k.trim(), v.trim());

        match k {
            KEY_KNIT_TIMESTAMP => {
                if let Err(e) = Rfc3339::parse(v) {
                    return Err(TypesError::Constraint {
                        key: k.to_owned(),
                        value: v.to_owned(),
                        reason: format!("should be a RFC3339 date-time ({e})"),
                    });
                }
            }
            KEY_KNIT_TRANSIENT => {
                v.parse::<Transient>()?;
            }
            _ => {}
        }

        Ok(Self::new(k, v))
    }

    /// The key, as parsed.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The value, as parsed.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// True if the key is reserved for system tags.
    pub fn is_system(&self) -> bool {
        is_system_key(&self.key)
    }

    /// Copy this tag as a [`UserTag`], or `None` if it is a system tag.
    pub fn as_user_tag(&self) -> Option<UserTag> {
        if self.is_system() {
            return None;
        }
        Some(UserTag(self.clone()))
    }

    /// Build a tag from the fields of its object form,
    /// `{"key": KEY, "value": VALUE}`. `None` is an absent field.
    ///
    /// Both fields must be strings. They are taken verbatim: no trimming and
    /// no system-key value check.
    pub fn from_object(
        key: Option<TagField>,
        value: Option<TagField>,
    ) -> Result<Self, TypesError> {
        let key = TagField::require("key", key)?;
        let value = TagField::require("value", value)?;
        Ok(Self::new(key, value))
    }
}

impl PartialEq for Tag {
    /// Keys must match exactly. Values of `knit#timestamp` are compared as
    /// instants, and never match if either side is not a valid date-time.
    fn eq(&self, other: &Self) -> bool {
        if self.key != other.key {
            return false;
        }

        if self.key != KEY_KNIT_TIMESTAMP {
            return self.value == other.value;
        }

        match (Rfc3339::parse(&self.value), Rfc3339::parse(&other.value)) {
            (Ok(a), Ok(b)) => a.equiv(&b),
            _ => false,
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.key, self.value)
    }
}

impl FromStr for Tag {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Tag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Tag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(TagVisitor)
    }
}

/// Accepts either `"KEY:VALUE"` or `{"key": KEY, "value": VALUE}`.
struct TagVisitor;

impl<'de> Visitor<'de> for TagVisitor {
    type Value = Tag;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(r#"a "KEY:VALUE" string or an object with "key" and "value""#)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Tag, E> {
        Tag::parse(v).map_err(E::custom)
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Tag, A::Error> {
        let mut key = None;
        let mut value = None;

        while let Some(name) = map.next_key::<String>()? {
            match name.as_str() {
                "key" => key = Some(map.next_value::<TagField>()?),
                "value" => value = Some(map.next_value::<TagField>()?),
                _ => {
                    map.next_value::<IgnoredAny>()?;
                }
            }
        }

        Tag::from_object(key, value).map_err(de::Error::custom)
    }
}

/// A field of a tag's object form, decoded without assuming its type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagField {
    /// An explicit `null`.
    Null,
    Str(String),
    /// Any other value: number, boolean, list or object.
    Other,
}

impl From<&str> for TagField {
    fn from(s: &str) -> Self {
        Self::Str(s.to_owned())
    }
}

impl From<String> for TagField {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl TagField {
    fn require(name: &'static str, field: Option<TagField>) -> Result<String, TypesError> {
        let problem = match field {
            Some(TagField::Str(s)) => return Ok(s),
            None => FieldProblem::Missing,
            Some(TagField::Null) => FieldProblem::Null,
            Some(TagField::Other) => FieldProblem::Invalid,
        };
        Err(TypesError::Shape {
            field: name,
            problem,
        })
    }
}

impl<'de> Deserialize<'de> for TagField {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(FieldVisitor)
    }
}

struct FieldVisitor;

impl<'de> Visitor<'de> for FieldVisitor {
    type Value = TagField;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("any value")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<TagField, E> {
        Ok(TagField::Str(v.to_owned()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<TagField, E> {
        Ok(TagField::Str(v))
    }

    fn visit_unit<E: de::Error>(self) -> Result<TagField, E> {
        Ok(TagField::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<TagField, E> {
        Ok(TagField::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<TagField, D::Error> {
        deserializer.deserialize_any(FieldVisitor)
    }

    fn visit_bool<E: de::Error>(self, _: bool) -> Result<TagField, E> {
        Ok(TagField::Other)
    }

    fn visit_i64<E: de::Error>(self, _: i64) -> Result<TagField, E> {
        Ok(TagField::Other)
    }

    fn visit_u64<E: de::Error>(self, _: u64) -> Result<TagField, E> {
        Ok(TagField::Other)
    }

    fn visit_f64<E: de::Error>(self, _: f64) -> Result<TagField, E> {
        Ok(TagField::Other)
    }

    fn visit_bytes<E: de::Error>(self, _: &[u8]) -> Result<TagField, E> {
        Ok(TagField::Other)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<TagField, A::Error> {
        while seq.next_element::<IgnoredAny>()?.is_some() {}
        Ok(TagField::Other)
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<TagField, A::Error> {
        while map.next_entry::<IgnoredAny, IgnoredAny>()?.is_some() {}
        Ok(TagField::Other)
    }
}

/// A [`Tag`] whose key is never reserved for system tags.
///
/// Obtain one with [`UserTag::parse`], `UserTag::try_from(tag)` or
/// [`Tag::as_user_tag`].
#[derive(Debug, Clone, PartialEq)]
pub struct UserTag(Tag);

impl UserTag {
    /// Parse a `KEY:VALUE` expression, rejecting reserved keys.
    pub fn parse(s: &str) -> Result<Self, TypesError> {
        Self::try_from(Tag::parse(s)?)
    }

    /// The key, never a reserved one.
    pub fn key(&self) -> &str {
        self.0.key()
    }

    /// The value.
    pub fn value(&self) -> &str {
        self.0.value()
    }

    /// Borrow as a plain [`Tag`].
    pub fn as_tag(&self) -> &Tag {
        &self.0
    }

    /// Consume and return the plain [`Tag`].
    pub fn into_tag(self) -> Tag {
        self.0
    }
}

impl TryFrom<Tag> for UserTag {
    type Error = TypesError;

    fn try_from(tag: Tag) -> Result<Self, Self::Error> {
        assert_user_key(tag.key())?;
        Ok(Self(tag))
    }
}

impl From<UserTag> for Tag {
    fn from(tag: UserTag) -> Self {
        tag.0
    }
}

impl fmt::Display for UserTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for UserTag {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for UserTag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for UserTag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = Tag::deserialize(deserializer)?;
        Self::try_from(tag).map_err(de::Error::custom)
    }
}

/// Request body to change tags of a Data.
///
/// Used for `PUT /api/data/{knitId}`. No list may mention a system tag key.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "RawChange")]
pub struct Change {
    #[serde(rename = "add")]
    add_tags: Vec<UserTag>,
    #[serde(rename = "remove")]
    remove_tags: Vec<UserTag>,
    remove_key: Vec<String>,
}

impl Change {
    /// Build a change set, rejecting reserved keys in `remove_key`.
    pub fn new(
        add_tags: Vec<UserTag>,
        remove_tags: Vec<UserTag>,
        remove_key: Vec<String>,
    ) -> Result<Self, TypesError> {
        for key in &remove_key {
            assert_user_key(key)?;
        }
        Ok(Self {
            add_tags,
            remove_tags,
            remove_key,
        })
    }

    /// Build a change set from plain tags, rejecting reserved keys in every
    /// list with [`TypesError::Policy`].
    pub fn from_tags(
        add: Vec<Tag>,
        remove: Vec<Tag>,
        remove_key: Vec<String>,
    ) -> Result<Self, TypesError> {
        let add = add
            .into_iter()
            .map(UserTag::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        let remove = remove
            .into_iter()
            .map(UserTag::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(add, remove, remove_key)
    }

    /// Tags to be attached.
    pub fn add_tags(&self) -> &[UserTag] {
        &self.add_tags
    }

    /// Tags to be detached.
    pub fn remove_tags(&self) -> &[UserTag] {
        &self.remove_tags
    }

    /// Keys whose tags are all detached.
    pub fn remove_key(&self) -> &[String] {
        &self.remove_key
    }

    /// True if no list has an entry.
    pub fn is_empty(&self) -> bool {
        self.add_tags.is_empty() && self.remove_tags.is_empty() && self.remove_key.is_empty()
    }
}

impl PartialEq for Change {
    fn eq(&self, other: &Self) -> bool {
        cmp::slice_eq_unordered(&self.add_tags, &other.add_tags)
            && cmp::slice_eq_unordered(&self.remove_tags, &other.remove_tags)
            && cmp::slice_eq_eq_unordered(&self.remove_key, &other.remove_key)
    }
}

/// Wire shape of [`Change`] before the reserved-key check.
#[derive(Deserialize)]
struct RawChange {
    #[serde(default)]
    add: Vec<Tag>,
    #[serde(default)]
    remove: Vec<Tag>,
    #[serde(default)]
    remove_key: Vec<String>,
}

impl TryFrom<RawChange> for Change {
    type Error = TypesError;

    fn try_from(raw: RawChange) -> Result<Self, Self::Error> {
        Self::from_tags(raw.add, raw.remove, raw.remove_key)
    }
}
