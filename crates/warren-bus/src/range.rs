use core::fmt;

use thiserror::Error;

/// A half-open bus address range `[begin, end)`.
///
/// Ranges on one bus may overlap; see [`crate::BusRouter`] for how lookups resolve that.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AddressRange {
    begin: u64,
    end: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RangeError {
    #[error("empty address range: begin=0x{begin:x} end=0x{end:x}")]
    Empty { begin: u64, end: u64 },

    #[error("address range overflows u64: base=0x{base:x} size=0x{size:x}")]
    Overflow { base: u64, size: u64 },
}

impl AddressRange {
    pub fn new(begin: u64, end: u64) -> Result<Self, RangeError> {
        if begin >= end {
            return Err(RangeError::Empty { begin, end });
        }
        Ok(Self { begin, end })
    }

    pub fn from_base_size(base: u64, size: u64) -> Result<Self, RangeError> {
        let end = base
            .checked_add(size)
            .ok_or(RangeError::Overflow { base, size })?;
        Self::new(base, end)
    }

    #[inline]
    pub const fn begin(&self) -> u64 {
        self.begin
    }

    /// Exclusive end address.
    #[inline]
    pub const fn end(&self) -> u64 {
        self.end
    }

    #[inline]
    pub const fn len(&self) -> u64 {
        self.end - self.begin
    }

    #[inline]
    pub const fn contains(&self, addr: u64) -> bool {
        addr >= self.begin && addr < self.end
    }

    /// Whether `[addr, addr + len)` lies entirely within this range.
    pub fn contains_span(&self, addr: u64, len: u64) -> bool {
        match addr.checked_add(len) {
            Some(span_end) => addr >= self.begin && span_end <= self.end,
            None => false,
        }
    }

    pub const fn overlaps(&self, other: &AddressRange) -> bool {
        self.begin < other.end && other.begin < self.end
    }

    /// Shifts the range up by `delta`, e.g. from a target-local space into bus-global space.
    pub fn offset_by(&self, delta: u64) -> Result<Self, RangeError> {
        let overflow = RangeError::Overflow {
            base: self.begin,
            size: delta,
        };
        let begin = self.begin.checked_add(delta).ok_or(overflow.clone())?;
        let end = self.end.checked_add(delta).ok_or(overflow)?;
        Ok(Self { begin, end })
    }
}

impl fmt::Display for AddressRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[0x{:x}, 0x{:x})", self.begin, self.end)
    }
}
