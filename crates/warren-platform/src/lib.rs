#![forbid(unsafe_code)]

//! Platform assembly on top of the bus fabric and port binder.
//!
//! A [`PlatformBuilder`] turns an already-structured [`PlatformDescription`] into a running
//! [`Platform`]: components come from an explicit [`ComponentRegistry`], ports are bound as
//! requested, buses are frozen and [`BuildHook`]s (such as the [`Bootloader`]) get a look at the
//! result.

mod bootloader;
mod builder;
mod component;
mod config;
mod description;
mod error;
mod hooks;
mod registry;
mod report;

pub use bootloader::{BootError, BootImage, Bootloader};
pub use builder::{BindingFailure, Platform, PlatformBuilder};
pub use component::{BuildContext, BusComponent, Component, MemoryComponent};
pub use config::{BuildPolicy, ConfigError, FabricConfig, MemoryConfig, RouterConfig};
pub use description::{
    BindingRequest, BindingRequestKind, ComponentDescription, Parameters, PlatformDescription,
    PortRef,
};
pub use error::BuildError;
pub use hooks::BuildHook;
pub use registry::{ComponentFactory, ComponentRegistry};
pub use report::TopologyReport;
