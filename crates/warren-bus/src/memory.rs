use std::cell::RefCell;
use std::rc::Rc;

use thiserror::Error;
use warren_time::Scheduler;

use crate::{
    fatal, AddressRange, BoundsFault, BusTarget, DirectAccessWindow, DmiAccess, Payload,
    ResponseStatus, SharedStore, Transaction,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryError {
    #[error("memory size {size} does not fit in usize")]
    SizeTooLarge { size: u64 },

    #[error("memory size must be non-zero")]
    ZeroSize,
}

/// Byte-addressable RAM sized at construction.
///
/// Timed accesses must stay within the store; anything else is a [`BoundsFault`] and terminates
/// the simulation. Debug accesses are clamped to the store instead.
pub struct FlatMemory {
    name: String,
    store: SharedStore,
    size: u64,
    scheduler: Rc<dyn Scheduler>,
    read_latency_ns: u64,
    write_latency_ns: u64,
}

impl FlatMemory {
    pub const DEFAULT_READ_LATENCY_NS: u64 = 3;
    pub const DEFAULT_WRITE_LATENCY_NS: u64 = 3;

    pub fn new(
        name: impl Into<String>,
        size: u64,
        scheduler: Rc<dyn Scheduler>,
    ) -> Result<Self, MemoryError> {
        if size == 0 {
            return Err(MemoryError::ZeroSize);
        }
        let len = usize::try_from(size).map_err(|_| MemoryError::SizeTooLarge { size })?;
        Ok(Self {
            name: name.into(),
            store: Rc::new(RefCell::new(vec![0u8; len].into_boxed_slice())),
            size,
            scheduler,
            read_latency_ns: Self::DEFAULT_READ_LATENCY_NS,
            write_latency_ns: Self::DEFAULT_WRITE_LATENCY_NS,
        })
    }

    pub fn with_latencies(mut self, read_ns: u64, write_ns: u64) -> Self {
        self.read_latency_ns = read_ns;
        self.write_latency_ns = write_ns;
        self
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Validates a timed access; the range of `store` it touches on success.
    fn checked_span(&self, offset: u64, len: usize) -> Result<(usize, usize), BoundsFault> {
        let fault = || BoundsFault {
            component: self.name.clone(),
            offset,
            len,
            size: self.size,
        };
        let end = offset.checked_add(len as u64).ok_or_else(fault)?;
        if end > self.size {
            return Err(fault());
        }
        Ok((offset as usize, end as usize))
    }

    /// Clamps a debug access to the store.
    fn clamped_span(&self, offset: u64, len: usize) -> (usize, usize) {
        if offset >= self.size {
            return (0, 0);
        }
        let start = offset as usize;
        let available = (self.size - offset) as usize;
        (start, start + len.min(available))
    }
}

impl BusTarget for FlatMemory {
    fn name(&self) -> &str {
        &self.name
    }

    fn transport(&self, tx: &mut Transaction<'_>, _delay_ns: &mut u64) {
        let (start, end) = match self.checked_span(tx.address(), tx.len()) {
            Ok(span) => span,
            Err(fault) => fatal(fault),
        };

        match tx.payload_mut() {
            Payload::Read(dst) => {
                dst.copy_from_slice(&self.store.borrow()[start..end]);
                self.scheduler.wait_ns(self.read_latency_ns);
            }
            Payload::Write(src) => {
                self.scheduler.wait_ns(self.write_latency_ns);
                self.store.borrow_mut()[start..end].copy_from_slice(src);
            }
        }
        tx.set_response(ResponseStatus::Ok);
    }

    fn debug_transport(&self, tx: &mut Transaction<'_>) -> usize {
        let (start, end) = self.clamped_span(tx.address(), tx.len());
        let n = end - start;

        match tx.payload_mut() {
            Payload::Read(dst) => dst[..n].copy_from_slice(&self.store.borrow()[start..end]),
            Payload::Write(src) => self.store.borrow_mut()[start..end].copy_from_slice(&src[..n]),
        }
        tx.set_response(ResponseStatus::Ok);
        n
    }

    fn direct_access(&self, tx: &Transaction<'_>) -> Option<DirectAccessWindow> {
        if tx.address() >= self.size {
            return None;
        }
        let range = AddressRange::new(0, self.size).ok()?;
        Some(
            DirectAccessWindow::new(range, DmiAccess::READ_WRITE, self.store.clone())
                .with_latencies(self.read_latency_ns, self.write_latency_ns),
        )
    }
}
