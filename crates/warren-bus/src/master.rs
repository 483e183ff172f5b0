use std::cell::RefCell;
use std::rc::Rc;

use thiserror::Error;
use warren_time::Scheduler;

use crate::{
    AddressRange, BusRouterRef, Command, DmiAccess, DmiCache, InitiatorId, ResponseStatus,
    RouterError, Transaction,
};

/// A timed access completed with an error status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("bus access at 0x{address:x} failed with {status:?}")]
pub struct AccessError {
    pub address: u64,
    pub status: ResponseStatus,
}

/// Initiator-side helper for components that issue bus transactions.
///
/// Accesses covered by a cached direct-access window are served straight from the target's
/// store and charged the window's latency; everything else goes through the router.
pub struct BusMaster {
    name: String,
    router: BusRouterRef,
    scheduler: Rc<dyn Scheduler>,
    dmi: Rc<RefCell<DmiCache>>,
    id: InitiatorId,
}

impl BusMaster {
    pub fn connect(
        name: impl Into<String>,
        router: &BusRouterRef,
        scheduler: Rc<dyn Scheduler>,
    ) -> Result<Self, RouterError> {
        let name = name.into();
        let dmi = Rc::new(RefCell::new(DmiCache::new()));
        let id = router
            .borrow_mut()
            .connect_initiator(name.clone(), dmi.clone())?;
        Ok(Self {
            name,
            router: router.clone(),
            scheduler,
            dmi,
            id,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> InitiatorId {
        self.id
    }

    pub fn dmi_cache(&self) -> &Rc<RefCell<DmiCache>> {
        &self.dmi
    }

    pub fn bus_read(&self, address: u64, dst: &mut [u8]) -> Result<(), AccessError> {
        let latency = {
            let cache = self.dmi.borrow();
            cache
                .lookup(address, dst.len(), DmiAccess::READ)
                .filter(|w| w.read(address, dst))
                .map(|w| w.read_latency_ns())
        };
        if let Some(latency) = latency {
            self.scheduler.wait_ns(latency);
            return Ok(());
        }

        let mut tx = Transaction::read(address, dst);
        self.dispatch(&mut tx)
    }

    pub fn bus_write(&self, address: u64, src: &[u8]) -> Result<(), AccessError> {
        let latency = {
            let cache = self.dmi.borrow();
            cache
                .lookup(address, src.len(), DmiAccess::WRITE)
                .filter(|w| w.write(address, src))
                .map(|w| w.write_latency_ns())
        };
        if let Some(latency) = latency {
            self.scheduler.wait_ns(latency);
            return Ok(());
        }

        let mut tx = Transaction::write(address, src);
        self.dispatch(&mut tx)
    }

    fn dispatch(&self, tx: &mut Transaction<'_>) -> Result<(), AccessError> {
        let address = tx.address();
        let mut delay_ns = 0;
        self.router.borrow().dispatch_blocking(tx, &mut delay_ns);
        // Annotated delay is consumed here so the initiator's notion of time stays exact.
        if delay_ns > 0 {
            self.scheduler.wait_ns(delay_ns);
        }

        match tx.response() {
            status if status.is_error() => Err(AccessError { address, status }),
            _ => Ok(()),
        }
    }

    /// Untimed read through the router. Returns the number of bytes transferred.
    pub fn debug_read(&self, address: u64, dst: &mut [u8]) -> usize {
        let mut tx = Transaction::read(address, dst);
        self.router.borrow().debug_access(&mut tx)
    }

    pub fn debug_write(&self, address: u64, src: &[u8]) -> usize {
        let mut tx = Transaction::write(address, src);
        self.router.borrow().debug_access(&mut tx)
    }

    /// Requests a read-write direct-access window that covers exactly `[start, start + size)`.
    ///
    /// The window is cached only on an exact match; a target offering a larger or smaller region
    /// leaves the cache untouched and the call returns `false`.
    pub fn dmi_hint(&self, start: u64, size: u64) -> bool {
        let Ok(wanted) = AddressRange::from_base_size(start, size) else {
            return false;
        };

        let mut probe = Transaction::probe(start, Command::Read);
        let Some(window) = self.router.borrow().probe_direct_access(&mut probe) else {
            tracing::debug!(initiator = %self.name, range = %wanted, "no direct-access window offered");
            return false;
        };

        if window.access() != DmiAccess::READ_WRITE || window.range() != wanted {
            tracing::debug!(
                initiator = %self.name,
                wanted = %wanted,
                offered = %window.range(),
                access = ?window.access(),
                "direct-access window rejected"
            );
            return false;
        }

        tracing::debug!(initiator = %self.name, range = %wanted, "direct-access window cached");
        self.dmi.borrow_mut().insert(window);
        true
    }
}
