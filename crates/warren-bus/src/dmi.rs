use std::cell::RefCell;
use std::rc::Rc;

use bitflags::bitflags;

use crate::{AddressRange, RangeError};

/// Backing bytes of a target that can be handed out through a direct-access window.
pub type SharedStore = Rc<RefCell<Box<[u8]>>>;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DmiAccess: u8 {
        const READ = 1 << 0;
        const WRITE = 1 << 1;
        const READ_WRITE = Self::READ.bits() | Self::WRITE.bits();
    }
}

/// A region an initiator may access directly, bypassing per-access dispatch.
///
/// `range` is expressed in the address space of whoever holds the window: target-local when a
/// target returns it, bus-global once a router has translated it. Byte `range.begin()` maps to
/// `store[0]`.
#[derive(Clone)]
pub struct DirectAccessWindow {
    range: AddressRange,
    access: DmiAccess,
    read_latency_ns: u64,
    write_latency_ns: u64,
    store: SharedStore,
}

impl DirectAccessWindow {
    pub fn new(range: AddressRange, access: DmiAccess, store: SharedStore) -> Self {
        Self {
            range,
            access,
            read_latency_ns: 0,
            write_latency_ns: 0,
            store,
        }
    }

    pub fn with_latencies(mut self, read_ns: u64, write_ns: u64) -> Self {
        self.read_latency_ns = read_ns;
        self.write_latency_ns = write_ns;
        self
    }

    #[inline]
    pub fn range(&self) -> AddressRange {
        self.range
    }

    #[inline]
    pub fn start(&self) -> u64 {
        self.range.begin()
    }

    /// Exclusive end address.
    #[inline]
    pub fn end(&self) -> u64 {
        self.range.end()
    }

    pub fn access(&self) -> DmiAccess {
        self.access
    }

    pub fn read_latency_ns(&self) -> u64 {
        self.read_latency_ns
    }

    pub fn write_latency_ns(&self) -> u64 {
        self.write_latency_ns
    }

    /// Returns the same window shifted up by `base`.
    pub fn translated(&self, base: u64) -> Result<Self, RangeError> {
        Ok(Self {
            range: self.range.offset_by(base)?,
            ..self.clone()
        })
    }

    pub fn covers(&self, addr: u64, len: usize, access: DmiAccess) -> bool {
        self.access.contains(access) && self.range.contains_span(addr, len as u64)
    }

    /// Copies `dst.len()` bytes starting at `addr`. Returns `false` without touching `dst` when
    /// the window does not cover the span or forbids reads.
    pub fn read(&self, addr: u64, dst: &mut [u8]) -> bool {
        if !self.covers(addr, dst.len(), DmiAccess::READ) {
            return false;
        }
        let start = (addr - self.range.begin()) as usize;
        let store = self.store.borrow();
        dst.copy_from_slice(&store[start..start + dst.len()]);
        true
    }

    pub fn write(&self, addr: u64, src: &[u8]) -> bool {
        if !self.covers(addr, src.len(), DmiAccess::WRITE) {
            return false;
        }
        let start = (addr - self.range.begin()) as usize;
        let mut store = self.store.borrow_mut();
        store[start..start + src.len()].copy_from_slice(src);
        true
    }
}

impl core::fmt::Debug for DirectAccessWindow {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DirectAccessWindow")
            .field("range", &self.range)
            .field("access", &self.access)
            .field("read_latency_ns", &self.read_latency_ns)
            .field("write_latency_ns", &self.write_latency_ns)
            .finish_non_exhaustive()
    }
}

/// Per-initiator cache of granted direct-access windows, in bus-global addresses.
#[derive(Debug, Default)]
pub struct DmiCache {
    windows: Vec<DirectAccessWindow>,
}

impl DmiCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Caches `window`, replacing any window already cached for the same range.
    pub fn insert(&mut self, window: DirectAccessWindow) {
        match self.windows.iter_mut().find(|w| w.range() == window.range()) {
            Some(existing) => *existing = window,
            None => self.windows.push(window),
        }
    }

    pub fn lookup(&self, addr: u64, len: usize, access: DmiAccess) -> Option<&DirectAccessWindow> {
        self.windows.iter().find(|w| w.covers(addr, len, access))
    }

    /// Drops every window overlapping `range`. Returns how many were dropped.
    pub fn invalidate(&mut self, range: AddressRange) -> usize {
        let before = self.windows.len();
        self.windows.retain(|w| !w.range().overlaps(&range));
        before - self.windows.len()
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
}
