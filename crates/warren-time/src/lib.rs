#![forbid(unsafe_code)]

//! Deterministic virtual time and the cooperative scheduling seam used by the fabric.
//!
//! # Design
//!
//! The whole platform runs on a single logical thread. Component "processes" only give up
//! control at explicit suspension points:
//! - [`Scheduler::wait_ns`] parks the caller for a span of virtual time; and
//! - [`Scheduler::wait_event`] parks the caller until a [`SimEvent`] is notified.
//!
//! Bus routers, memories and character channels only ever talk to the [`Scheduler`] trait, so
//! the real scheduling substrate can be swapped in by the embedding simulator.
//! [`EventScheduler`] is a small deterministic implementation: other processes are modelled as
//! timed actions that fire, in deadline order, while the current process is parked.

mod clock;
mod event;
mod scheduler;

pub use clock::Clock;
pub use event::SimEvent;
pub use scheduler::{EventScheduler, Scheduler, SchedulerError, TimedActionId};
