//! Request documents the lint understands.

use clap::ValueEnum;
use knit_api_types::{AnnotationChange, Change, PlanSpec};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::config::Format;

/// Kind of request document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Kind {
    /// Body of `POST /api/plans/`.
    PlanSpec,
    /// Body of `PUT /api/data/{knitId}`.
    Change,
    /// Body of `PUT /api/plans/{planId}/annotations`.
    AnnotationChange,
}

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("format must be resolved before decoding")]
    Unresolved,
}

/// A decoded, validated document.
#[derive(Debug, Clone, PartialEq)]
pub enum Document {
    PlanSpec(PlanSpec),
    Change(Change),
    AnnotationChange(AnnotationChange),
}

impl Document {
    /// Decode `text` as a document of `kind`. `format` must not be `Auto`.
    pub fn decode(kind: Kind, format: Format, text: &str) -> Result<Self, DocumentError> {
        Ok(match kind {
            Kind::PlanSpec => Document::PlanSpec(decode_as(format, text)?),
            Kind::Change => Document::Change(decode_as(format, text)?),
            Kind::AnnotationChange => Document::AnnotationChange(decode_as(format, text)?),
        })
    }

    pub fn kind(&self) -> Kind {
        match self {
            Document::PlanSpec(_) => Kind::PlanSpec,
            Document::Change(_) => Kind::Change,
            Document::AnnotationChange(_) => Kind::AnnotationChange,
        }
    }

    /// Canonical JSON: compact tag and annotation forms, annotations sorted.
    pub fn to_json(&self, pretty: bool) -> Result<String, DocumentError> {
        let value = match self {
            Document::PlanSpec(v) => serde_json::to_value(v)?,
            Document::Change(v) => serde_json::to_value(v)?,
            Document::AnnotationChange(v) => serde_json::to_value(v)?,
        };
        let out = if pretty {
            serde_json::to_string_pretty(&value)?
        } else {
            serde_json::to_string(&value)?
        };
        Ok(out)
    }
}

fn decode_as<T: DeserializeOwned>(format: Format, text: &str) -> Result<T, DocumentError> {
    match format {
        Format::Json => Ok(serde_json::from_str(text)?),
        Format::Yaml => Ok(serde_yaml::from_str(text)?),
        Format::Auto => Err(DocumentError::Unresolved),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PLAN_YAML: &str = r#"
image: "repo.invalid/trainer:v1"
annotations:
  - "owner=alice"
  - "team=ml"
inputs:
  - path: /in/data
    tags:
      - "type:csv"
      - key: project
        value: demo
outputs:
  - path: /out/model
    tags: ["type:model"]
log:
  tags: ["type:log"]
resources:
  cpu: "500m"
  memory: 1Gi
"#;

    #[test]
    fn test_plan_spec_yaml_to_canonical_json() {
        let doc = Document::decode(Kind::PlanSpec, Format::Yaml, PLAN_YAML).unwrap();
        assert_eq!(doc.kind(), Kind::PlanSpec);

        let json = doc.to_json(false).unwrap();
        assert!(json.contains(r#""image":"repo.invalid/trainer:v1""#));
        assert!(json.contains(r#""tags":["type:csv","project:demo"]"#));
        assert!(json.contains(r#""annotations":["owner=alice","team=ml"]"#));

        let again = Document::decode(Kind::PlanSpec, Format::Json, &json).unwrap();
        assert_eq!(again, doc);
    }

    #[test]
    fn test_change_ignores_list_order() {
        let a = Document::decode(
            Kind::Change,
            Format::Json,
            r#"{"add":["a:1","b:2"],"remove":[],"remove_key":["c"]}"#,
        )
        .unwrap();
        let b = Document::decode(
            Kind::Change,
            Format::Yaml,
            "add: [\"b:2\", \"a:1\"]\nremove_key: [c]\n",
        )
        .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_reserved_key_rejected() {
        let err = Document::decode(
            Kind::AnnotationChange,
            Format::Json,
            r#"{"add":["knit#id=x"]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, DocumentError::Json(_)));
        assert!(err.to_string().contains("knit#"));
    }

    #[test]
    fn test_auto_is_rejected() {
        let err = Document::decode(Kind::Change, Format::Auto, "{}").unwrap_err();
        assert!(matches!(err, DocumentError::Unresolved));
    }

    #[test]
    fn test_different_kinds_never_equal() {
        let change = Document::decode(Kind::Change, Format::Json, "{}").unwrap();
        let annotations = Document::decode(Kind::AnnotationChange, Format::Json, "{}").unwrap();
        assert_ne!(change, annotations);
    }
}
