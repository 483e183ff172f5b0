#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Clock {
    now_ns: u64,
}

impl Clock {
    pub const fn new() -> Self {
        Self { now_ns: 0 }
    }

    /// Returns the current monotonic virtual time, in nanoseconds.
    #[inline]
    pub const fn now_ns(&self) -> u64 {
        self.now_ns
    }

    /// Advances the clock by `ns` nanoseconds.
    ///
    /// # Panics
    ///
    /// Panics if advancing would overflow `u64`. (`u64` nanoseconds is ~584 years.)
    #[inline]
    pub fn advance(&mut self, ns: u64) {
        self.now_ns = self
            .now_ns
            .checked_add(ns)
            .expect("virtual clock overflowed u64::MAX");
    }

    /// Moves the clock forward to `deadline_ns`. Deadlines in the past leave the clock untouched;
    /// virtual time never runs backwards.
    #[inline]
    pub fn advance_to(&mut self, deadline_ns: u64) {
        self.now_ns = self.now_ns.max(deadline_ns);
    }
}
