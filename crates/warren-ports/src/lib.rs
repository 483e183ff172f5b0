#![forbid(unsafe_code)]

//! Ports and the build-time binder.
//!
//! Every component exposes named [`Port`]s. A port speaks one [`ProtocolKind`] and carries the
//! [`ConnectionStrategy`] deciding how it may be bound:
//!
//! - bus ports map targets into a [`warren_bus::BusRouter`] (`base`/`size` hints) or attach
//!   initiators to it;
//! - character-stream ports are symmetric and get one channel per direction;
//! - multi-drop ports register a slave's self-declared address with its master;
//! - chip-select ports register a slave under the select line given by the `cs` hint.
//!
//! [`bind_peer`] joins two sibling ports and [`bind_hierarchical`] delegates a port to its
//! composite parent's port. Both return a [`BindingError`] to the caller instead of failing
//! loudly; the platform builder decides whether the build goes on.

mod binder;
mod bus;
mod char_stream;
mod chip_select;
mod error;
mod hints;
mod info;
mod multi_drop;
mod port;
mod protocol;
mod strategy;

pub use binder::{bind_hierarchical, bind_peer};
pub use bus::{BusInitiatorSocket, BusStrategy, BusTargetSocket, BASE_HINT, SIZE_HINT};
pub use char_stream::{CharChannel, CharStreamEndpoint, CharStreamStrategy, ChannelError};
pub use chip_select::{
    ChipSelectFrame, ChipSelectMaster, ChipSelectSlave, ChipSelectSlaveRef, ChipSelectStrategy,
    CHIP_SELECT_HINT,
};
pub use error::BindingError;
pub use hints::{parse_scalar, BindingHints};
pub use info::{BindingKind, ConnectionDescriptor, ConnectionInfo};
pub use multi_drop::{
    AddressClass, Direction, MultiDropFrame, MultiDropMaster, MultiDropSlave, MultiDropSlaveRef,
    MultiDropStrategy,
};
pub use port::Port;
pub use protocol::ProtocolKind;
pub use strategy::ConnectionStrategy;

#[cfg(test)]
mod tests;
