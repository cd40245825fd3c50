//! Plan descriptions: request bodies to register Plans and the views the API
//! returns for them.
//!
//! Lists in these types are unordered: equality pairs elements one-to-one
//! regardless of position. `entrypoint` and `args` are the exception, being
//! command lines. Optional parts are equal only if both are absent or both
//! present and equal.

use crate::annotation::Annotations;
use crate::cmp;
use crate::error::TypesError;
use crate::ids::PlanId;
use crate::image::Image;
use crate::quantity::Quantity;
use crate::tags::Tag;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Computational resources of a Plan, keyed by resource name (`cpu`,
/// `memory`, `nvidia.com/gpu`, ...).
pub type Resources = BTreeMap<String, Quantity>;

/// Brief view of a Plan, embedded in other responses.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Summary {
    #[serde(rename = "planId")]
    pub plan_id: PlanId,

    /// Container image. Exclusive with `name`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<Image>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entrypoint: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,

    /// Name of a system-builtin Plan, which has no image.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    #[serde(default, skip_serializing_if = "Annotations::is_empty")]
    pub annotations: Annotations,
}

impl PartialEq for Summary {
    fn eq(&self, other: &Self) -> bool {
        self.plan_id == other.plan_id
            && cmp::option_eq(&self.image, &other.image)
            && cmp::slice_eq(&self.entrypoint, &other.entrypoint)
            && cmp::slice_eq(&self.args, &other.args)
            && self.name == other.name
            && self.annotations == other.annotations
    }
}

/// Full view of a Plan.
///
/// Returned by `GET /api/plans/`, `POST /api/plans/`,
/// `GET /api/plans/{planId}`, `PUT /api/plans/{planId}/active` and
/// `PUT /api/plans/{planId}/resources`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Detail {
    #[serde(flatten)]
    pub summary: Summary,

    #[serde(default)]
    pub inputs: Vec<Input>,

    #[serde(default)]
    pub outputs: Vec<Output>,

    /// Log point. `None` if the Plan does not record logs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log: Option<Log>,

    /// Whether new Runs of this Plan may start.
    #[serde(default)]
    pub active: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_node: Option<OnNode>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub resources: Resources,

    /// ServiceAccount the Plan's workers run with.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub service_account: String,
}

impl PartialEq for Detail {
    fn eq(&self, other: &Self) -> bool {
        self.summary == other.summary
            && self.active == other.active
            && self.service_account == other.service_account
            && cmp::option_eq(&self.log, &other.log)
            && cmp::option_eq(&self.on_node, &other.on_node)
            && cmp::map_eq(&self.resources, &other.resources)
            && cmp::slice_eq_unordered(&self.inputs, &other.inputs)
            && cmp::slice_eq_unordered(&self.outputs, &other.outputs)
    }
}

/// An input or output directory of a Plan's container.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Mountpoint {
    /// Path in the container where Data is mounted.
    pub path: String,

    /// For inputs, Data must carry all of these to be mounted. For outputs,
    /// these are attached to the Data produced.
    #[serde(default)]
    pub tags: Vec<Tag>,
}

impl PartialEq for Mountpoint {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path && cmp::slice_eq_unordered(&self.tags, &other.tags)
    }
}

/// A Plan and its output (or log) feeding an input.
///
/// `mountpoint` and `log` are mutually exclusive.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Upstream {
    pub plan: Summary,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mountpoint: Option<Mountpoint>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log: Option<LogPoint>,
}

impl PartialEq for Upstream {
    fn eq(&self, other: &Self) -> bool {
        self.plan == other.plan
            && cmp::option_eq(&self.mountpoint, &other.mountpoint)
            && cmp::option_eq(&self.log, &other.log)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Input {
    #[serde(flatten)]
    pub mountpoint: Mountpoint,

    /// Plans whose outputs can be mounted here.
    #[serde(default)]
    pub upstreams: Vec<Upstream>,
}

impl PartialEq for Input {
    fn eq(&self, other: &Self) -> bool {
        self.mountpoint == other.mountpoint
            && cmp::slice_eq_unordered(&self.upstreams, &other.upstreams)
    }
}

/// A Plan and its input fed by an output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Downstream {
    pub plan: Summary,
    pub mountpoint: Mountpoint,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Output {
    #[serde(flatten)]
    pub mountpoint: Mountpoint,

    /// Plans whose inputs can take Data from here.
    #[serde(default)]
    pub downstreams: Vec<Downstream>,
}

impl PartialEq for Output {
    fn eq(&self, other: &Self) -> bool {
        self.mountpoint == other.mountpoint
            && cmp::slice_eq_unordered(&self.downstreams, &other.downstreams)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Log {
    #[serde(flatten)]
    pub log_point: LogPoint,

    #[serde(default)]
    pub downstreams: Vec<Downstream>,
}

impl PartialEq for Log {
    fn eq(&self, other: &Self) -> bool {
        self.log_point == other.log_point
            && cmp::slice_eq_unordered(&self.downstreams, &other.downstreams)
    }
}

/// Where a Plan's stdout and stderr are recorded, and the tags put on it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogPoint {
    #[serde(default)]
    pub tags: Vec<Tag>,
}

impl PartialEq for LogPoint {
    fn eq(&self, other: &Self) -> bool {
        cmp::slice_eq_unordered(&self.tags, &other.tags)
    }
}

/// Node affinity and toleration of a Plan, by node label.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OnNode {
    /// Nodes the workers may be scheduled on.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub may: Vec<OnSpecLabel>,

    /// Nodes the workers prefer.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub prefer: Vec<OnSpecLabel>,

    /// Nodes the workers must be scheduled on.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub must: Vec<OnSpecLabel>,
}

impl PartialEq for OnNode {
    fn eq(&self, other: &Self) -> bool {
        cmp::slice_eq_unordered(&self.may, &other.may)
            && cmp::slice_eq_unordered(&self.prefer, &other.prefer)
            && cmp::slice_eq_unordered(&self.must, &other.must)
    }
}

/// A node label written `key=value`. Unlike annotations, nothing is trimmed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OnSpecLabel {
    pub key: String,
    pub value: String,
}

impl OnSpecLabel {
    /// Create a label without validation.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Parse `key=value`, splitting on the first `=`. Nothing is trimmed.
    pub fn parse(s: &str) -> Result<Self, TypesError> {
        let (k, v) = s
            .split_once('=')
            .ok_or_else(|| TypesError::grammar("label", s, '='))?;
        Ok(Self::new(k, v))
    }
}

impl fmt::Display for OnSpecLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

impl FromStr for OnSpecLabel {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for OnSpecLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for OnSpecLabel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(de::Error::custom)
    }
}

/// Request body of `POST /api/plans/`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlanSpec {
    /// If a key is repeated, the last one wins.
    #[serde(default, skip_serializing_if = "Annotations::is_empty")]
    pub annotations: Annotations,

    pub image: Image,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entrypoint: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,

    /// Where input Data is mounted, and which tags it must carry. A Run
    /// starts when Data matching every input is found.
    #[serde(default)]
    pub inputs: Vec<Mountpoint>,

    /// Where outputs are written, and which tags the output Data gets.
    #[serde(default)]
    pub outputs: Vec<Mountpoint>,

    /// Record stdout and stderr as Data with these tags. `None` for no log.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log: Option<LogPoint>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_node: Option<OnNode>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub resources: Resources,

    /// Kubernetes ServiceAccount of the Plan's workers.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub service_account: String,

    /// `None` or `Some(true)`: Runs start as soon as they can. `Some(false)`:
    /// Runs are created but held until the Plan is activated.
    #[serde(default)]
    pub active: Option<bool>,
}

impl PartialEq for PlanSpec {
    fn eq(&self, other: &Self) -> bool {
        self.annotations == other.annotations
            && self.image == other.image
            && cmp::slice_eq(&self.entrypoint, &other.entrypoint)
            && cmp::slice_eq(&self.args, &other.args)
            && cmp::slice_eq_unordered(&self.inputs, &other.inputs)
            && cmp::slice_eq_unordered(&self.outputs, &other.outputs)
            && cmp::option_eq(&self.log, &other.log)
            && cmp::option_eq(&self.on_node, &other.on_node)
            && cmp::map_eq(&self.resources, &other.resources)
            && self.service_account == other.service_account
            && self.active == other.active
    }
}

/// Change of a Plan's resource limits.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceLimitChange {
    /// Resources to be set.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub set: Resources,

    /// Resource types to be unset. Wins over `set` for the same type.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unset: Vec<String>,
}

/// New ServiceAccount of a Plan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetServiceAccount {
    pub service_account: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::Annotation;
    use crate::tags::KEY_KNIT_TIMESTAMP;
    use pretty_assertions::assert_eq;

    fn summary(id: &str) -> Summary {
        Summary {
            plan_id: PlanId::new(id),
            image: Some(Image::new("repo", "1.0")),
            entrypoint: vec!["python".into(), "main.py".into()],
            args: vec!["--verbose".into()],
            annotations: Annotations::from(vec![
                Annotation::new("b", "2"),
                Annotation::new("a", "1"),
            ]),
            ..Default::default()
        }
    }

    #[test]
    fn test_summary_json() {
        let json = serde_json::to_string(&summary("p1")).unwrap();
        assert_eq!(
            json,
            r#"{"planId":"p1","image":"repo:1.0","entrypoint":["python","main.py"],"args":["--verbose"],"annotations":["a=1","b=2"]}"#
        );

        let back: Summary = serde_json::from_str(&json).unwrap();
        assert_eq!(back, summary("p1"));
    }

    #[test]
    fn test_builtin_summary_has_no_image() {
        let s: Summary = serde_json::from_str(r#"{"planId":"p0","name":"knit#uploaded"}"#).unwrap();
        assert!(s.image.is_none());
        assert_eq!(s.name, "knit#uploaded");
        assert_ne!(s, Summary { image: Some(Image::default()), ..s.clone() });
    }

    #[test]
    fn test_summary_entrypoint_order_matters() {
        let mut other = summary("p1");
        other.entrypoint.reverse();
        assert_ne!(summary("p1"), other);
    }

    #[test]
    fn test_mountpoint_tags_unordered() {
        let a = Mountpoint {
            path: "/in".into(),
            tags: vec![
                Tag::new("x", "1"),
                Tag::new(KEY_KNIT_TIMESTAMP, "2024-01-01T00:00:00Z"),
            ],
        };
        let b = Mountpoint {
            path: "/in".into(),
            tags: vec![
                Tag::new(KEY_KNIT_TIMESTAMP, "2024-01-01T09:00:00+09:00"),
                Tag::new("x", "1"),
            ],
        };
        assert_eq!(a, b);
    }

    #[test]
    fn test_upstream_nil_pairing() {
        let with_log = Upstream {
            plan: summary("p1"),
            mountpoint: None,
            log: Some(LogPoint::default()),
        };
        let with_mountpoint = Upstream {
            plan: summary("p1"),
            mountpoint: Some(Mountpoint::default()),
            log: None,
        };
        let empty = Upstream {
            plan: summary("p1"),
            ..Default::default()
        };

        assert_ne!(with_log, with_mountpoint);
        assert_ne!(with_log, empty);
        assert_eq!(empty, empty.clone());
    }

    #[test]
    fn test_detail_json_flattens_summary() {
        let detail: Detail = serde_json::from_str(
            r#"{
                "planId": "plan-1",
                "image": "registry.invalid:5000/train:v2",
                "inputs": [
                    {
                        "path": "/in/data",
                        "tags": ["type:dataset", {"key":"project","value":"x"}],
                        "upstreams": [
                            {"plan": {"planId": "plan-0", "name": "knit#uploaded"}, "log": {"tags": []}}
                        ]
                    }
                ],
                "outputs": [
                    {"path": "/out/model", "tags": ["type:model"], "downstreams": []}
                ],
                "log": {"tags": ["type:log"], "downstreams": []},
                "active": true,
                "on_node": {"may": ["gpu=a100"]},
                "resources": {"cpu": "1", "memory": "1Gi"},
                "service_account": "trainer"
            }"#,
        )
        .unwrap();

        assert_eq!(detail.summary.plan_id.as_str(), "plan-1");
        assert_eq!(
            detail.summary.image,
            Some(Image::new("registry.invalid:5000/train", "v2"))
        );
        assert_eq!(detail.inputs[0].mountpoint.tags.len(), 2);
        assert!(detail.inputs[0].upstreams[0].log.is_some());
        assert_eq!(detail.on_node.as_ref().unwrap().may, vec![OnSpecLabel::new("gpu", "a100")]);
        assert_eq!(detail.resources["memory"], "1024Mi".parse::<Quantity>().unwrap());
        assert!(detail.active);

        let json = serde_json::to_string(&detail).unwrap();
        let back: Detail = serde_json::from_str(&json).unwrap();
        assert_eq!(back, detail);
    }

    #[test]
    fn test_detail_equality_ignores_list_order() {
        let out = |path: &str| Output {
            mountpoint: Mountpoint {
                path: path.into(),
                tags: vec![],
            },
            downstreams: vec![],
        };
        let a = Detail {
            summary: summary("p1"),
            outputs: vec![out("/a"), out("/b")],
            ..Default::default()
        };
        let b = Detail {
            summary: summary("p1"),
            outputs: vec![out("/b"), out("/a")],
            ..Default::default()
        };
        assert_eq!(a, b);

        let c = Detail {
            on_node: Some(OnNode::default()),
            ..b.clone()
        };
        assert_ne!(a, c);
    }

    #[test]
    fn test_on_spec_label_is_not_trimmed() {
        let label = OnSpecLabel::parse(" k = v ").unwrap();
        assert_eq!(label, OnSpecLabel::new(" k ", " v "));
        assert!(OnSpecLabel::parse("novalue").is_err());
        assert_eq!(serde_json::to_string(&label).unwrap(), r#"" k = v ""#);
    }

    #[test]
    fn test_plan_spec_yaml() {
        let spec: PlanSpec = serde_yaml::from_str(
            r#"
annotations:
  - "owner=team-a"
image: "repo:1.0"
inputs:
  - path: /in/1
    tags:
      - "type:csv"
      - "project:x"
outputs:
  - path: /out/1
    tags:
      - "type:model"
log:
  tags:
    - "type:log"
resources:
  cpu: 500m
  memory: 1Gi
active: false
"#,
        )
        .unwrap();

        assert_eq!(spec.image, Image::new("repo", "1.0"));
        assert_eq!(spec.active, Some(false));
        assert_eq!(spec.resources["cpu"], "0.5".parse::<Quantity>().unwrap());

        let reordered = PlanSpec {
            inputs: vec![Mountpoint {
                path: "/in/1".into(),
                tags: vec![Tag::new("project", "x"), Tag::new("type", "csv")],
            }],
            ..spec.clone()
        };
        assert_eq!(spec, reordered);

        let yaml = serde_yaml::to_string(&spec).unwrap();
        let back: PlanSpec = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back, spec);
    }

    #[test]
    fn test_plan_spec_active_is_tristate() {
        let spec = PlanSpec {
            image: Image::new("repo", "1.0"),
            ..Default::default()
        };
        let json = serde_json::to_string(&spec).unwrap();
        assert_eq!(json, r#"{"image":"repo:1.0","inputs":[],"outputs":[],"active":null}"#);

        let activated = PlanSpec {
            active: Some(true),
            ..spec.clone()
        };
        assert_ne!(spec, activated);
    }

    #[test]
    fn test_resource_limit_change() {
        let change: ResourceLimitChange =
            serde_json::from_str(r#"{"set":{"cpu":"2"},"unset":["memory"]}"#).unwrap();
        assert_eq!(change.set["cpu"], "2000m".parse::<Quantity>().unwrap());
        assert_eq!(change.unset, vec!["memory".to_string()]);
    }
}
