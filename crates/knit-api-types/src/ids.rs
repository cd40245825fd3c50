//! Newtype wrappers for identifiers to ensure type safety.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            #[doc = concat!("Create a new ", stringify!($name), " from a string.")]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            #[doc = concat!("Generate a new random ", stringify!($name), ".")]
            pub fn generate() -> Self {
                Self(Uuid::new_v4().to_string())
            }

            /// Get the inner string reference.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume and return the inner string.
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(
    /// Identifier of a Data. Also carried by its `knit#id` system tag.
    KnitId
);

string_id!(
    /// Identifier of a Plan.
    PlanId
);

string_id!(
    /// Identifier of a Run.
    RunId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_knit_id_generate() {
        let id1 = KnitId::generate();
        let id2 = KnitId::generate();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_id_display() {
        let id = PlanId::new("plan-123");
        assert_eq!(format!("{}", id), "plan-123");
    }

    #[test]
    fn test_id_serializes_as_plain_string() {
        let id = RunId::from("run-1");
        assert_eq!(serde_json::to_string(&id).unwrap(), r#""run-1""#);
        let back: RunId = serde_json::from_str(r#""run-1""#).unwrap();
        assert_eq!(back, id);
    }
}
