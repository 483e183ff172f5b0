use thiserror::Error;
use warren_bus::{RangeError, RouterError};

use crate::ProtocolKind;

/// Why two ports could not be bound. Returned to the platform builder, which decides whether the
/// build continues.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindingError {
    #[error("`{port}` ({port_protocol}) cannot be bound to `{peer}` ({peer_protocol})")]
    ProtocolMismatch {
        port: String,
        peer: String,
        port_protocol: ProtocolKind,
        peer_protocol: ProtocolKind,
    },

    #[error("`{port}` has no strategy that can bind to `{peer}`")]
    NotConnectable { port: String, peer: String },

    #[error("`{port}` cannot be bound to itself")]
    SelfBinding { port: String },

    #[error("cannot bind a {protocol} {mode} to another {protocol} {mode}")]
    SameMode {
        protocol: ProtocolKind,
        mode: &'static str,
    },

    #[error("a {protocol} {left} cannot be bound to a {protocol} {right}")]
    IncompatibleModes {
        protocol: ProtocolKind,
        left: &'static str,
        right: &'static str,
    },

    #[error("missing `{key}` binding attribute")]
    MissingHint { key: &'static str },

    #[error("invalid `{key}` binding attribute `{value}`")]
    MalformedHint { key: &'static str, value: String },

    #[error("{protocol} {mode} ports cannot be bound hierarchically")]
    HierarchicalUnsupported {
        protocol: ProtocolKind,
        mode: &'static str,
    },

    #[error("{protocol} {child} port cannot delegate to a {protocol} {parent} port")]
    HierarchicalTypeMismatch {
        protocol: ProtocolKind,
        child: &'static str,
        parent: &'static str,
    },

    #[error("a multi-drop slave is already bound at address 0x{address:02x}")]
    DuplicateAddress { address: u16 },

    #[error("a chip-select slave is already bound on chip select {cs}")]
    DuplicateChipSelect { cs: u32 },

    #[error("{what} is already bound")]
    AlreadyBound { what: String },

    #[error(transparent)]
    Range(#[from] RangeError),

    #[error(transparent)]
    Router(#[from] RouterError),
}

impl BindingError {
    /// Whether this is a mode mismatch of a hierarchical binding rather than a hard failure.
    pub fn is_hierarchical_type_mismatch(&self) -> bool {
        matches!(self, BindingError::HierarchicalTypeMismatch { .. })
    }
}
