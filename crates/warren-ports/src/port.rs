use std::cell::RefCell;
use std::rc::Rc;

use warren_bus::{BusRouterRef, TargetRef};
use warren_time::Scheduler;

use crate::{
    BindingError, BusInitiatorSocket, BusStrategy, BusTargetSocket, CharStreamEndpoint,
    CharStreamStrategy, ChipSelectMaster, ChipSelectSlaveRef, ChipSelectStrategy,
    ConnectionDescriptor, ConnectionStrategy, MultiDropMaster, MultiDropSlaveRef,
    MultiDropStrategy, ProtocolKind,
};

/// Named attachment point of a component.
///
/// A port speaks exactly one protocol and holds one or more candidate strategies for it. The
/// owning component is referred to by name only.
pub struct Port {
    owner: String,
    name: String,
    protocol: ProtocolKind,
    strategies: Vec<ConnectionStrategy>,
    connections: RefCell<Vec<ConnectionDescriptor>>,
}

impl Port {
    pub fn new(
        owner: impl Into<String>,
        name: impl Into<String>,
        strategy: impl Into<ConnectionStrategy>,
    ) -> Self {
        let strategy = strategy.into();
        Self {
            owner: owner.into(),
            name: name.into(),
            protocol: strategy.protocol(),
            strategies: vec![strategy],
            connections: RefCell::default(),
        }
    }

    /// Adds a fallback strategy, tried after the existing ones.
    pub fn add_strategy(
        &mut self,
        strategy: impl Into<ConnectionStrategy>,
    ) -> Result<(), BindingError> {
        let strategy = strategy.into();
        if strategy.protocol() != self.protocol {
            return Err(BindingError::ProtocolMismatch {
                port: self.full_name(),
                peer: format!("{} strategy", strategy.mode()),
                port_protocol: self.protocol,
                peer_protocol: strategy.protocol(),
            });
        }
        self.strategies.push(strategy);
        Ok(())
    }

    pub fn char_stream(owner: &str, name: &str) -> (Self, CharStreamEndpoint) {
        let strategy = CharStreamStrategy::new();
        let port = Self::new(owner, name, strategy.clone());
        let endpoint = strategy.endpoint(port.full_name());
        (port, endpoint)
    }

    pub fn multi_drop_master(owner: &str, name: &str) -> (Self, MultiDropMaster) {
        let master = MultiDropMaster::new(format!("{owner}.{name}"));
        let port = Self::new(owner, name, MultiDropStrategy::Master(master.clone()));
        (port, master)
    }

    pub fn multi_drop_slave(
        owner: &str,
        name: &str,
        address: u16,
        slave: MultiDropSlaveRef,
    ) -> Self {
        Self::new(owner, name, MultiDropStrategy::Slave { address, slave })
    }

    pub fn chip_select_master(owner: &str, name: &str) -> (Self, ChipSelectMaster) {
        let master = ChipSelectMaster::new(format!("{owner}.{name}"));
        let port = Self::new(owner, name, ChipSelectStrategy::Master(master.clone()));
        (port, master)
    }

    pub fn chip_select_slave(owner: &str, name: &str, slave: ChipSelectSlaveRef) -> Self {
        Self::new(owner, name, ChipSelectStrategy::Slave(slave))
    }

    pub fn bus_router(owner: &str, name: &str, router: BusRouterRef) -> Self {
        Self::new(owner, name, BusStrategy::Router(router))
    }

    pub fn bus_target(owner: &str, name: &str, target: TargetRef) -> (Self, BusTargetSocket) {
        let socket = BusTargetSocket::new(target);
        (Self::new(owner, name, BusStrategy::Target(socket.clone())), socket)
    }

    pub fn bus_initiator(
        owner: &str,
        name: &str,
        scheduler: Rc<dyn Scheduler>,
    ) -> (Self, BusInitiatorSocket) {
        let socket = BusInitiatorSocket::new(format!("{owner}.{name}"), scheduler);
        (Self::new(owner, name, BusStrategy::Initiator(socket.clone())), socket)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// `owner.name`.
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.owner, self.name)
    }

    pub fn protocol(&self) -> ProtocolKind {
        self.protocol
    }

    pub fn strategies(&self) -> &[ConnectionStrategy] {
        &self.strategies
    }

    pub fn is_connected(&self) -> bool {
        !self.connections.borrow().is_empty()
    }

    pub fn connections(&self) -> Vec<ConnectionDescriptor> {
        self.connections.borrow().clone()
    }

    pub(crate) fn record(&self, descriptor: ConnectionDescriptor) {
        self.connections.borrow_mut().push(descriptor);
    }
}

impl core::fmt::Debug for Port {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Port")
            .field("owner", &self.owner)
            .field("name", &self.name)
            .field("protocol", &self.protocol)
            .field("strategies", &self.strategies.len())
            .field("connections", &self.connections.borrow())
            .finish()
    }
}
