use core::fmt::Display;

use thiserror::Error;

use crate::Phase;

/// A transaction addressed memory that no target on the bus claims.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("bus `{bus}`: no target mapped at address 0x{address:x}")]
pub struct RoutingFault {
    pub bus: String,
    pub address: u64,
}

/// An access ran past the end of a target.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("`{component}`: access out of bounds: offset=0x{offset:x} len={len} size=0x{size:x}")]
pub struct BoundsFault {
    pub component: String,
    pub offset: u64,
    pub len: usize,
    pub size: u64,
}

/// A non-blocking (phased) transport call reached a component that only does blocking transport.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("`{component}`: non-blocking transport is not implemented (phase {phase:?}, address 0x{address:x})")]
pub struct UnsupportedModeFault {
    pub component: String,
    pub phase: Phase,
    pub address: u64,
}

/// Reports a fatal fault and terminates the simulation.
///
/// Faults reaching this point are static configuration defects (bad address maps, targets sized
/// too small); they are logged with their full context and then raised as a panic on the
/// simulation thread, which aborts the process in release builds.
#[track_caller]
pub fn fatal(fault: impl Display) -> ! {
    tracing::error!(%fault, "fatal fabric fault");
    panic!("{fault}");
}
