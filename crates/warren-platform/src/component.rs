use std::any::Any;
use std::rc::Rc;

use warren_bus::{BusRouter, BusRouterRef, FlatMemory, TargetRef};
use warren_ports::{BusTargetSocket, Port};
use warren_time::Scheduler;

use crate::{BuildError, ComponentDescription, FabricConfig};

/// Anything the builder can instantiate: a named bag of ports.
pub trait Component {
    fn name(&self) -> &str;

    /// Registry type name the component was created from.
    fn kind(&self) -> &str;

    fn ports(&self) -> &[Port];

    fn port(&self, name: &str) -> Option<&Port> {
        self.ports().iter().find(|port| port.name() == name)
    }

    /// The router a bus component owns. The builder freezes it once binding is over.
    fn bus_router(&self) -> Option<&BusRouterRef> {
        None
    }

    fn as_any(&self) -> &dyn Any;
}

/// What factories get to see while a platform is instantiated.
pub struct BuildContext {
    pub scheduler: Rc<dyn Scheduler>,
    pub fabric: FabricConfig,
}

/// A bus: one router exposed through a single `bus` port.
pub struct BusComponent {
    name: String,
    router: BusRouterRef,
    ports: Vec<Port>,
}

impl BusComponent {
    pub const KIND: &'static str = "bus";
    pub const PORT: &'static str = "bus";

    pub fn new(name: &str, ctx: &BuildContext) -> Self {
        let router = BusRouter::with_timing(name, ctx.scheduler.clone(), ctx.fabric.router_timing())
            .into_shared();
        let ports = vec![Port::bus_router(name, Self::PORT, router.clone())];
        Self {
            name: name.to_owned(),
            router,
            ports,
        }
    }

    pub fn from_description(
        description: &ComponentDescription,
        ctx: &BuildContext,
    ) -> Result<Self, BuildError> {
        Ok(Self::new(&description.name, ctx))
    }

    pub fn router(&self) -> &BusRouterRef {
        &self.router
    }
}

impl Component for BusComponent {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &str {
        Self::KIND
    }

    fn ports(&self) -> &[Port] {
        &self.ports
    }

    fn bus_router(&self) -> Option<&BusRouterRef> {
        Some(&self.router)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Flat RAM behind a `mem` bus-target port. Parameters: `size` (bytes, required).
pub struct MemoryComponent {
    name: String,
    memory: Rc<FlatMemory>,
    socket: BusTargetSocket,
    ports: Vec<Port>,
}

impl MemoryComponent {
    pub const KIND: &'static str = "memory";
    pub const PORT: &'static str = "mem";

    pub fn from_description(
        description: &ComponentDescription,
        ctx: &BuildContext,
    ) -> Result<Self, BuildError> {
        let name = description.name.as_str();
        let size = description.params.require_u64(name, "size")?;
        let latencies = ctx.fabric.memory;
        let memory = FlatMemory::new(name, size, ctx.scheduler.clone())?
            .with_latencies(latencies.read_latency_ns, latencies.write_latency_ns);
        let memory = Rc::new(memory);

        let target: TargetRef = memory.clone();
        let (port, socket) = Port::bus_target(name, Self::PORT, target);
        Ok(Self {
            name: name.to_owned(),
            memory,
            socket,
            ports: vec![port],
        })
    }

    pub fn memory(&self) -> &Rc<FlatMemory> {
        &self.memory
    }

    pub fn socket(&self) -> &BusTargetSocket {
        &self.socket
    }
}

impl Component for MemoryComponent {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &str {
        Self::KIND
    }

    fn ports(&self) -> &[Port] {
        &self.ports
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
