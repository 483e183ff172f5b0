#![forbid(unsafe_code)]

//! Memory-bus fabric: address decoding, blocking transaction dispatch, direct-access windows and
//! the reference flat memory target.
//!
//! A [`BusRouter`] owns one bus's memory map. Targets are registered with
//! [`BusRouter::connect_target`] while the platform is being built; afterwards every transaction
//! issued by an initiator is decoded by a linear scan in registration order, rebased into the
//! target's local address space and forwarded.
//!
//! Misconfigured address maps are loud: routing to unmapped memory and out-of-bounds accesses on
//! a target are fatal (see [`fatal`]).

mod dmi;
mod fault;
mod master;
mod memory;
mod range;
mod router;
mod target;
mod transaction;

pub use dmi::{DirectAccessWindow, DmiAccess, DmiCache, SharedStore};
pub use fault::{fatal, BoundsFault, RoutingFault, UnsupportedModeFault};
pub use master::{AccessError, BusMaster};
pub use memory::{FlatMemory, MemoryError};
pub use range::{AddressRange, RangeError};
pub use router::{BusRouter, BusRouterRef, InitiatorId, Route, RouterError, RouterTiming, TargetId};
pub use target::{BusTarget, TargetRef};
pub use transaction::{Command, Payload, Phase, ResponseStatus, Transaction};

#[cfg(test)]
mod tests;
