#![forbid(unsafe_code)]

//! Component port binding and memory-bus routing for cooperative, single-threaded platform
//! simulation.
//!
//! This facade re-exports the workspace crates:
//! - [`time`]: virtual time and the scheduling seam;
//! - [`bus`]: address ranges, transactions, the bus router and flat memory;
//! - [`ports`]: ports, connection strategies and the binder;
//! - [`platform`]: the component registry, platform builder and build hooks.

pub use warren_bus as bus;
pub use warren_platform as platform;
pub use warren_ports as ports;
pub use warren_time as time;
