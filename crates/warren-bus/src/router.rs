use std::cell::RefCell;
use std::rc::Rc;

use thiserror::Error;
use warren_time::Scheduler;

use crate::{
    fatal, AddressRange, DirectAccessWindow, DmiCache, Phase, RoutingFault, TargetRef,
    Transaction, UnsupportedModeFault,
};

pub type BusRouterRef = Rc<RefCell<BusRouter>>;

/// Index of a target entry in a router's memory map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetId(usize);

/// Index of an initiator adapter record in a router.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InitiatorId(usize);

impl TargetId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl InitiatorId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Fixed latencies modelling the address and completion phases of a blocking transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouterTiming {
    pub pre_dispatch_ns: u64,
    pub post_dispatch_ns: u64,
}

impl Default for RouterTiming {
    fn default() -> Self {
        Self {
            pre_dispatch_ns: 3,
            post_dispatch_ns: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouterError {
    #[error("bus `{bus}` is frozen; targets and initiators can only be connected while building")]
    Frozen { bus: String },

    #[error("bus `{bus}` has no target with index {index}")]
    UnknownTarget { bus: String, index: usize },
}

/// Result of decoding an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    pub target: TargetId,
    pub range: AddressRange,
}

struct TargetEntry {
    range: AddressRange,
    target: TargetRef,
    name: String,
}

struct InitiatorEntry {
    name: String,
    dmi: Rc<RefCell<DmiCache>>,
}

/// Address decoder and dispatcher for one bus.
///
/// The memory map is an append-only list populated while the platform is built, then frozen.
/// Lookups scan it in registration order and the first range containing the address wins, so
/// overlapping registrations resolve deterministically to the earliest one.
pub struct BusRouter {
    name: String,
    scheduler: Rc<dyn Scheduler>,
    timing: RouterTiming,
    targets: Vec<TargetEntry>,
    initiators: Vec<InitiatorEntry>,
    frozen: bool,
}

impl BusRouter {
    pub fn new(name: impl Into<String>, scheduler: Rc<dyn Scheduler>) -> Self {
        Self::with_timing(name, scheduler, RouterTiming::default())
    }

    pub fn with_timing(
        name: impl Into<String>,
        scheduler: Rc<dyn Scheduler>,
        timing: RouterTiming,
    ) -> Self {
        Self {
            name: name.into(),
            scheduler,
            timing,
            targets: Vec::new(),
            initiators: Vec::new(),
            frozen: false,
        }
    }

    pub fn into_shared(self) -> BusRouterRef {
        Rc::new(RefCell::new(self))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn timing(&self) -> RouterTiming {
        self.timing
    }

    /// Maps `target` at `range`. Overlaps with earlier entries are accepted; the earlier entry
    /// keeps priority.
    pub fn connect_target(
        &mut self,
        target: TargetRef,
        range: AddressRange,
    ) -> Result<TargetId, RouterError> {
        self.ensure_open()?;

        let name = target.name().to_owned();
        if let Some(shadowing) = self.targets.iter().find(|e| e.range.overlaps(&range)) {
            tracing::debug!(
                bus = %self.name,
                target = %name,
                %range,
                shadowed_by = %shadowing.name,
                "overlapping target range; earlier registration wins"
            );
        }

        tracing::debug!(bus = %self.name, target = %name, %range, "target mapped");
        self.targets.push(TargetEntry {
            range,
            target,
            name,
        });
        Ok(TargetId(self.targets.len() - 1))
    }

    /// Records an initiator adapter. `dmi` is the initiator's window cache; the router only uses
    /// it to forward invalidations.
    pub fn connect_initiator(
        &mut self,
        name: impl Into<String>,
        dmi: Rc<RefCell<DmiCache>>,
    ) -> Result<InitiatorId, RouterError> {
        self.ensure_open()?;
        let name = name.into();
        tracing::debug!(bus = %self.name, initiator = %name, "initiator connected");
        self.initiators.push(InitiatorEntry { name, dmi });
        Ok(InitiatorId(self.initiators.len() - 1))
    }

    /// Ends the construction phase; later `connect_*` calls fail.
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    fn ensure_open(&self) -> Result<(), RouterError> {
        if self.frozen {
            return Err(RouterError::Frozen {
                bus: self.name.clone(),
            });
        }
        Ok(())
    }

    /// The memory map in registration order, as `(range, target name)`.
    pub fn memory_map(&self) -> impl Iterator<Item = (AddressRange, &str)> + '_ {
        self.targets.iter().map(|e| (e.range, e.name.as_str()))
    }

    pub fn initiator_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.initiators.iter().map(|e| e.name.as_str())
    }

    pub fn target(&self, id: TargetId) -> Option<&TargetRef> {
        self.targets.get(id.0).map(|e| &e.target)
    }

    /// Decodes `address` without side effects.
    pub fn route(&self, address: u64) -> Result<Route, RoutingFault> {
        self.targets
            .iter()
            .enumerate()
            .find(|(_, e)| e.range.contains(address))
            .map(|(i, e)| Route {
                target: TargetId(i),
                range: e.range,
            })
            .ok_or_else(|| RoutingFault {
                bus: self.name.clone(),
                address,
            })
    }

    /// Decodes `address`, terminating the simulation if nothing is mapped there.
    fn route_or_abort(&self, address: u64) -> Route {
        match self.route(address) {
            Ok(route) => route,
            Err(fault) => {
                for (range, target) in self.memory_map() {
                    tracing::error!(bus = %self.name, %range, target, "memory map entry");
                }
                fatal(fault)
            }
        }
    }

    /// Blocking transport: address phase latency, decode, rebase into the target's local space,
    /// forward, completion phase latency.
    pub fn dispatch_blocking(&self, tx: &mut Transaction<'_>, delay_ns: &mut u64) {
        self.scheduler.wait_ns(self.timing.pre_dispatch_ns);

        let route = self.route_or_abort(tx.address());
        tracing::trace!(
            bus = %self.name,
            address = tx.address(),
            len = tx.len(),
            command = ?tx.command(),
            target = %self.targets[route.target.0].name,
            "bus transaction"
        );

        tx.set_address(tx.address() - route.range.begin());
        self.targets[route.target.0].target.transport(tx, delay_ns);

        self.scheduler.wait_ns(self.timing.post_dispatch_ns);
    }

    /// Asks the target behind `tx.address()` for a direct-access window and returns it in
    /// bus-global addresses. Unmapped addresses simply get no window.
    pub fn probe_direct_access(&self, tx: &mut Transaction<'_>) -> Option<DirectAccessWindow> {
        let route = self.route(tx.address()).ok()?;
        tx.set_address(tx.address() - route.range.begin());

        let window = self.targets[route.target.0].target.direct_access(tx)?;

        match window.translated(route.range.begin()) {
            Ok(window) => Some(window),
            Err(err) => {
                tracing::warn!(bus = %self.name, %err, "direct-access window not representable");
                None
            }
        }
    }

    /// Untimed transport for inspection and loading. Unmapped addresses are fatal.
    pub fn debug_access(&self, tx: &mut Transaction<'_>) -> usize {
        let route = self.route_or_abort(tx.address());
        tx.set_address(tx.address() - route.range.begin());
        self.targets[route.target.0].target.debug_transport(tx)
    }

    /// Non-blocking transport is not part of this fabric; any attempt is fatal.
    pub fn nb_transport(&self, tx: &mut Transaction<'_>, phase: Phase) -> ! {
        fatal(UnsupportedModeFault {
            component: self.name.clone(),
            phase,
            address: tx.address(),
        })
    }

    /// Forwards a target's invalidation of `local` (target-local addresses) to every connected
    /// initiator, translated into bus-global addresses.
    pub fn invalidate_direct_access(
        &self,
        target: TargetId,
        local: AddressRange,
    ) -> Result<(), RouterError> {
        let entry = self
            .targets
            .get(target.0)
            .ok_or_else(|| RouterError::UnknownTarget {
                bus: self.name.clone(),
                index: target.0,
            })?;

        // A local range that cannot be shifted into the bus space cannot be cached by anyone.
        let Ok(global) = local.offset_by(entry.range.begin()) else {
            return Ok(());
        };

        for initiator in &self.initiators {
            let dropped = initiator.dmi.borrow_mut().invalidate(global);
            if dropped > 0 {
                tracing::debug!(
                    bus = %self.name,
                    initiator = %initiator.name,
                    range = %global,
                    dropped,
                    "direct-access windows invalidated"
                );
            }
        }
        Ok(())
    }
}
