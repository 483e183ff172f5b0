use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use warren_ports::{parse_scalar, BindingHints};

use crate::{BuildError, ConfigError, FabricConfig};

/// Already-parsed description of a platform: which components to instantiate and how to bind
/// their ports.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlatformDescription {
    #[serde(default)]
    pub fabric: FabricConfig,
    #[serde(default)]
    pub components: Vec<ComponentDescription>,
    #[serde(default)]
    pub bindings: Vec<BindingRequest>,
}

impl PlatformDescription {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let description: Self = serde_json::from_str(json)?;
        description.fabric.validate()?;
        Ok(description)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ComponentDescription {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub params: Parameters,
}

impl ComponentDescription {
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            params: Parameters::default(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.0.insert(key.into(), value.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BindingRequestKind {
    /// `from` and `to` are siblings.
    #[default]
    Peer,
    /// `from` delegates to `to`, a port of its composite parent.
    Hierarchical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BindingRequest {
    pub from: PortRef,
    pub to: PortRef,
    #[serde(default)]
    pub kind: BindingRequestKind,
    #[serde(default, skip_serializing_if = "BindingHints::is_empty")]
    pub hints: BindingHints,
}

impl BindingRequest {
    pub fn peer(from: PortRef, to: PortRef) -> Self {
        Self {
            from,
            to,
            kind: BindingRequestKind::Peer,
            hints: BindingHints::new(),
        }
    }

    pub fn hierarchical(child: PortRef, parent: PortRef) -> Self {
        Self {
            kind: BindingRequestKind::Hierarchical,
            ..Self::peer(child, parent)
        }
    }

    pub fn with_hint(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.hints.insert(key, value);
        self
    }
}

/// `component.port`. Component names may themselves contain dots; the port is whatever follows
/// the last one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PortRef {
    pub component: String,
    pub port: String,
}

impl PortRef {
    pub fn new(component: impl Into<String>, port: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            port: port.into(),
        }
    }
}

impl FromStr for PortRef {
    type Err = BuildError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        match text.rsplit_once('.') {
            Some((component, port)) if !component.is_empty() && !port.is_empty() => {
                Ok(Self::new(component, port))
            }
            _ => Err(BuildError::InvalidPortRef {
                text: text.to_owned(),
            }),
        }
    }
}

impl TryFrom<String> for PortRef {
    type Error = BuildError;

    fn try_from(text: String) -> Result<Self, Self::Error> {
        text.parse()
    }
}

impl From<PortRef> for String {
    fn from(port: PortRef) -> Self {
        port.to_string()
    }
}

impl fmt::Display for PortRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.component, self.port)
    }
}

/// Free-form component parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Parameters(BTreeMap<String, Value>);

impl Parameters {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Unsigned integer parameter, given either as a JSON number or as a decimal/hex string.
    pub fn u64(&self, component: &str, key: &str) -> Result<Option<u64>, BuildError> {
        let Some(value) = self.0.get(key) else {
            return Ok(None);
        };
        let parsed = match value {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => parse_scalar(s),
            _ => None,
        };
        parsed
            .map(Some)
            .ok_or_else(|| BuildError::InvalidParameter {
                component: component.to_owned(),
                key: key.to_owned(),
                value: value.to_string(),
            })
    }

    pub fn require_u64(&self, component: &str, key: &str) -> Result<u64, BuildError> {
        self.u64(component, key)?
            .ok_or_else(|| BuildError::MissingParameter {
                component: component.to_owned(),
                key: key.to_owned(),
            })
    }

    pub fn str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }
}
