//! Knitfab API Types
//!
//! Shared vocabulary of the Knitfab web API: identifiers, tags, annotations,
//! images, resource quantities, and the Plan/Run/Data descriptions built
//! from them. Every type parses and validates its wire form, and defines the
//! equality the API means: lists compare as multisets, and `knit#timestamp`
//! tags compare as instants.
//!
//! This crate has no dependencies on:
//! - Network/HTTP
//! - Database
//! - Runtime specifics

pub mod annotation;
pub mod cmp;
pub mod data;
pub mod error;
pub mod ids;
pub mod image;
pub mod plans;
pub mod quantity;
pub mod rfctime;
pub mod runs;
pub mod status;
pub mod tags;

// Re-export commonly used types
pub use annotation::{Annotation, AnnotationChange, Annotations};
pub use error::{ErrorKind, FieldProblem, TypesError};
pub use ids::{KnitId, PlanId, RunId};
pub use image::Image;
pub use plans::{PlanSpec, Resources};
pub use quantity::Quantity;
pub use rfctime::{Rfc3339, TimestampError};
pub use status::RunStatus;
pub use tags::{Change, Tag, TagField, Transient, UserTag, SYSTEM_TAG_PREFIX};
