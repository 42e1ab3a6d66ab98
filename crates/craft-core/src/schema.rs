// Starter documents and presence/shape checks for the supported config kinds.
// The checks only look at the keys each kind cannot do without.
use std::fmt;
use std::str::FromStr;

use serde_yaml::{Mapping, Value};

use crate::Document;
use crate::error::SchemaError;
use crate::navigate::NodeKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaKind {
    DockerCompose,
    Kubernetes,
    Kafka,
    Custom,
}

impl SchemaKind {
    pub const ALL: [SchemaKind; 4] = [
        SchemaKind::DockerCompose,
        SchemaKind::Kubernetes,
        SchemaKind::Kafka,
        SchemaKind::Custom,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SchemaKind::DockerCompose => "docker-compose",
            SchemaKind::Kubernetes => "kubernetes",
            SchemaKind::Kafka => "kafka",
            SchemaKind::Custom => "custom",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            SchemaKind::DockerCompose => "Docker Compose",
            SchemaKind::Kubernetes => "Kubernetes",
            SchemaKind::Kafka => "Kafka Configuration",
            SchemaKind::Custom => "Custom",
        }
    }

    pub fn default_structure(self) -> Document {
        match self {
            SchemaKind::DockerCompose => mapping([
                ("version", Value::from("3")),
                ("services", Value::Mapping(Mapping::new())),
            ]),
            SchemaKind::Kubernetes => mapping([
                ("apiVersion", Value::from("v1")),
                ("kind", Value::from("Service")),
                ("metadata", mapping([("name", Value::from(""))])),
            ]),
            SchemaKind::Kafka => mapping([(
                "cluster",
                mapping([
                    ("zookeeper", Value::from("")),
                    ("brokers", Value::Mapping(Mapping::new())),
                ]),
            )]),
            SchemaKind::Custom => mapping([("root", mapping([("sample", Value::from(1))]))]),
        }
    }

    pub fn validate(self, doc: &Document) -> Result<(), SchemaError> {
        let top = doc.as_mapping().ok_or(SchemaError::NotAMapping)?;
        match self {
            SchemaKind::DockerCompose => {
                let services = top
                    .get("services")
                    .ok_or_else(|| SchemaError::MissingKey("services".into()))?;
                require_kind(services, "services", NodeKind::Mapping)
            }
            SchemaKind::Kubernetes => {
                if !top.contains_key("apiVersion") {
                    return Err(SchemaError::MissingKey("apiVersion".into()));
                }
                Ok(())
            }
            SchemaKind::Kafka => {
                let cluster = top
                    .get("cluster")
                    .ok_or_else(|| SchemaError::MissingKey("cluster".into()))?;
                require_kind(cluster, "cluster", NodeKind::Mapping)?;
                if !cluster.as_mapping().is_some_and(|m| m.contains_key("brokers")) {
                    return Err(SchemaError::MissingKey("cluster.brokers".into()));
                }
                Ok(())
            }
            SchemaKind::Custom => Ok(()),
        }
    }
}

fn require_kind(v: &Value, key: &str, kind: NodeKind) -> Result<(), SchemaError> {
    if NodeKind::of(v) == kind {
        Ok(())
    } else {
        Err(SchemaError::WrongShape {
            key: key.to_string(),
            expected: match kind {
                NodeKind::Mapping => "mapping",
                NodeKind::Sequence => "sequence",
                _ => "scalar",
            },
        })
    }
}

fn mapping<const N: usize>(entries: [(&str, Value); N]) -> Value {
    let mut map = Mapping::new();
    for (k, v) in entries {
        map.insert(Value::from(k), v);
    }
    Value::Mapping(map)
}

impl fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SchemaKind {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        SchemaKind::ALL
            .into_iter()
            .find(|k| k.name() == s || k.title().eq_ignore_ascii_case(&s))
            .or(match s.as_str() {
                "compose" | "docker" => Some(SchemaKind::DockerCompose),
                "k8s" => Some(SchemaKind::Kubernetes),
                _ => None,
            })
            .ok_or(SchemaError::UnknownSchema(s))
    }
}
