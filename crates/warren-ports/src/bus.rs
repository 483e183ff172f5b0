use std::cell::{Ref, RefCell};
use std::rc::Rc;

use warren_bus::{AddressRange, BusMaster, BusRouterRef, TargetRef};
use warren_time::Scheduler;

use crate::{BindingError, BindingHints, ConnectionInfo, ProtocolKind};

/// Hint giving the bus address a target is mapped at.
pub const BASE_HINT: &str = "base";
/// Hint giving the size of a target's mapping.
pub const SIZE_HINT: &str = "size";

type MappedListener = Box<dyn FnMut(AddressRange)>;

#[derive(Default)]
struct TargetState {
    mapping: Option<AddressRange>,
    listeners: Vec<MappedListener>,
}

/// A component's memory-mapped target, waiting to be placed on a bus.
#[derive(Clone)]
pub struct BusTargetSocket {
    target: TargetRef,
    state: Rc<RefCell<TargetState>>,
}

impl BusTargetSocket {
    pub fn new(target: TargetRef) -> Self {
        Self {
            target,
            state: Rc::default(),
        }
    }

    pub fn target(&self) -> &TargetRef {
        &self.target
    }

    /// Range the target was mapped at, once bound.
    pub fn mapping(&self) -> Option<AddressRange> {
        self.state.borrow().mapping
    }

    /// Registers a callback run with the mapped range when the target is placed on a bus.
    pub fn on_mapped(&self, listener: impl FnMut(AddressRange) + 'static) {
        self.state.borrow_mut().listeners.push(Box::new(listener));
    }

    fn mapped(&self, range: AddressRange) {
        let mut listeners = {
            let mut state = self.state.borrow_mut();
            state.mapping = Some(range);
            std::mem::take(&mut state.listeners)
        };
        for listener in &mut listeners {
            listener(range);
        }
        let mut state = self.state.borrow_mut();
        listeners.append(&mut state.listeners);
        state.listeners = listeners;
    }
}

/// A component's initiator side. Binding it to a router creates the [`BusMaster`] the component
/// issues transactions through.
#[derive(Clone)]
pub struct BusInitiatorSocket {
    name: Rc<str>,
    scheduler: Rc<dyn Scheduler>,
    master: Rc<RefCell<Option<BusMaster>>>,
}

impl BusInitiatorSocket {
    pub fn new(name: impl Into<String>, scheduler: Rc<dyn Scheduler>) -> Self {
        let name: String = name.into();
        Self {
            name: Rc::from(name),
            scheduler,
            master: Rc::default(),
        }
    }

    pub fn is_bound(&self) -> bool {
        self.master.borrow().is_some()
    }

    /// The bus master, once the socket is bound to a router.
    pub fn master(&self) -> Option<Ref<'_, BusMaster>> {
        Ref::filter_map(self.master.borrow(), Option::as_ref).ok()
    }
}

/// Negotiation state of a bus port. Routers accept both targets and initiators.
#[derive(Clone)]
pub enum BusStrategy {
    Router(BusRouterRef),
    Target(BusTargetSocket),
    Initiator(BusInitiatorSocket),
}

impl BusStrategy {
    pub fn mode(&self) -> &'static str {
        match self {
            BusStrategy::Router(_) => "router",
            BusStrategy::Target(_) => "target",
            BusStrategy::Initiator(_) => "initiator",
        }
    }

    pub(crate) fn bind_peer(
        &self,
        peer: &Self,
        hints: &BindingHints,
    ) -> Result<ConnectionInfo, BindingError> {
        use BusStrategy::*;

        match (self, peer) {
            (Router(router), Target(socket)) | (Target(socket), Router(router)) => {
                Self::map_target(router, socket, hints)
            }
            (Router(router), Initiator(socket)) | (Initiator(socket), Router(router)) => {
                Self::attach_initiator(router, socket)
            }
            _ if self.mode() == peer.mode() => Err(BindingError::SameMode {
                protocol: ProtocolKind::Bus,
                mode: self.mode(),
            }),
            _ => Err(BindingError::IncompatibleModes {
                protocol: ProtocolKind::Bus,
                left: self.mode(),
                right: peer.mode(),
            }),
        }
    }

    fn map_target(
        router: &BusRouterRef,
        socket: &BusTargetSocket,
        hints: &BindingHints,
    ) -> Result<ConnectionInfo, BindingError> {
        if socket.mapping().is_some() {
            return Err(BindingError::AlreadyBound {
                what: format!("bus target `{}`", socket.target.name()),
            });
        }
        let base = hints.scalar(BASE_HINT)?;
        let size = hints.scalar(SIZE_HINT)?;
        let range = AddressRange::from_base_size(base, size)?;

        router
            .borrow_mut()
            .connect_target(socket.target.clone(), range)?;
        socket.mapped(range);

        let mut info = ConnectionInfo::new();
        info.add("address range", range);
        Ok(info)
    }

    fn attach_initiator(
        router: &BusRouterRef,
        socket: &BusInitiatorSocket,
    ) -> Result<ConnectionInfo, BindingError> {
        if socket.is_bound() {
            return Err(BindingError::AlreadyBound {
                what: format!("bus initiator `{}`", socket.name),
            });
        }
        let master = BusMaster::connect(&*socket.name, router, socket.scheduler.clone())?;
        *socket.master.borrow_mut() = Some(master);

        let mut info = ConnectionInfo::new();
        info.add("bus", router.borrow().name());
        Ok(info)
    }

    pub(crate) fn bind_hierarchical(&self, parent: &Self) -> Result<ConnectionInfo, BindingError> {
        if self.mode() != parent.mode() {
            return Err(BindingError::HierarchicalTypeMismatch {
                protocol: ProtocolKind::Bus,
                child: self.mode(),
                parent: parent.mode(),
            });
        }
        Err(BindingError::HierarchicalUnsupported {
            protocol: ProtocolKind::Bus,
            mode: self.mode(),
        })
    }
}
