use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

/// A notification point a process can park on.
///
/// Cloning a `SimEvent` yields another handle to the same event. A notification stays pending
/// until a waiter consumes it, so a `notify` issued before the matching `wait_event` is not lost.
#[derive(Clone, Default)]
pub struct SimEvent {
    inner: Rc<EventState>,
}

#[derive(Default)]
struct EventState {
    pending: Cell<bool>,
    notifications: Cell<u64>,
}

impl SimEvent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notify(&self) {
        self.inner.pending.set(true);
        self.inner
            .notifications
            .set(self.inner.notifications.get().wrapping_add(1));
    }

    pub fn is_pending(&self) -> bool {
        self.inner.pending.get()
    }

    /// Consumes a pending notification. Returns `false` when nothing was pending.
    pub fn take(&self) -> bool {
        self.inner.pending.replace(false)
    }

    /// Total number of notifications ever issued on this event.
    pub fn notifications(&self) -> u64 {
        self.inner.notifications.get()
    }
}

impl fmt::Debug for SimEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimEvent")
            .field("pending", &self.is_pending())
            .field("notifications", &self.notifications())
            .finish()
    }
}
