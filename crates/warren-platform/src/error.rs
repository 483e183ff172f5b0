use thiserror::Error;
use warren_bus::{MemoryError, RouterError};
use warren_ports::BindingError;

use crate::{BootError, ConfigError};

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("unknown component type `{kind}`")]
    UnknownComponentType { kind: String },

    #[error("component type `{kind}` is already registered")]
    DuplicateComponentType { kind: String },

    #[error("duplicate component name `{name}`")]
    DuplicateComponent { name: String },

    #[error("no component named `{name}`")]
    UnknownComponent { name: String },

    #[error("component `{component}` has no port `{port}`")]
    UnknownPort { component: String, port: String },

    #[error("`{text}` is not a `component.port` reference")]
    InvalidPortRef { text: String },

    #[error("component `{component}`: missing parameter `{key}`")]
    MissingParameter { component: String, key: String },

    #[error("component `{component}`: invalid parameter `{key}` = {value}")]
    InvalidParameter {
        component: String,
        key: String,
        value: String,
    },

    #[error("binding `{from}` -> `{to}` failed")]
    Binding {
        from: String,
        to: String,
        #[source]
        source: BindingError,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Boot(#[from] BootError),

    #[error(transparent)]
    Memory(#[from] MemoryError),

    #[error(transparent)]
    Router(#[from] RouterError),
}
