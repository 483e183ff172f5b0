use std::cell::RefCell;
use std::rc::Rc;

use thiserror::Error;
use warren_time::{Scheduler, SchedulerError, SimEvent};

use crate::{BindingError, ConnectionInfo};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    #[error("char-stream port `{port}` is not bound")]
    Unbound { port: String },

    #[error(transparent)]
    Stalled(#[from] SchedulerError),
}

/// One direction of a character stream: a byte buffer plus the event its reader parks on.
#[derive(Clone, Default)]
pub struct CharChannel {
    inner: Rc<ChannelState>,
}

#[derive(Default)]
struct ChannelState {
    buffer: RefCell<Vec<u8>>,
    event: SimEvent,
}

impl CharChannel {
    pub fn send(&self, data: &[u8]) {
        self.inner.buffer.borrow_mut().extend_from_slice(data);
        self.inner.event.notify();
    }

    /// Takes everything buffered so far.
    pub fn drain(&self) -> Vec<u8> {
        std::mem::take(&mut *self.inner.buffer.borrow_mut())
    }

    pub fn is_empty(&self) -> bool {
        self.inner.buffer.borrow().is_empty()
    }

    pub fn event(&self) -> &SimEvent {
        &self.inner.event
    }

    fn same(&self, other: &CharChannel) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

/// Where a port's transmit or receive side ends up: nothing yet, a channel, or (after
/// hierarchical binding) whatever the composite parent's slot ends up with.
#[derive(Clone, Default)]
struct ChannelSlot(Rc<RefCell<SlotState>>);

#[derive(Default)]
enum SlotState {
    #[default]
    Unbound,
    Bound(CharChannel),
    Delegated(ChannelSlot),
}

impl ChannelSlot {
    fn terminal(&self) -> ChannelSlot {
        let mut slot = self.clone();
        loop {
            let next = match &*slot.0.borrow() {
                SlotState::Delegated(parent) => parent.clone(),
                _ => return slot.clone(),
            };
            slot = next;
        }
    }

    fn resolve(&self) -> Option<CharChannel> {
        match &*self.terminal().0.borrow() {
            SlotState::Bound(channel) => Some(channel.clone()),
            _ => None,
        }
    }

    fn is_free(&self) -> bool {
        matches!(*self.terminal().0.borrow(), SlotState::Unbound)
    }

    fn is_undelegated(&self) -> bool {
        matches!(*self.0.borrow(), SlotState::Unbound)
    }

    fn same(&self, other: &ChannelSlot) -> bool {
        Rc::ptr_eq(&self.terminal().0, &other.terminal().0)
    }

    fn bind(&self, channel: CharChannel) {
        *self.terminal().0.borrow_mut() = SlotState::Bound(channel);
    }

    fn delegate_to(&self, parent: &ChannelSlot) {
        *self.0.borrow_mut() = SlotState::Delegated(parent.clone());
    }
}

/// Negotiation state of a character-stream port. Always symmetric.
#[derive(Clone, Default)]
pub struct CharStreamStrategy {
    tx: ChannelSlot,
    rx: ChannelSlot,
}

impl CharStreamStrategy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle the owning component uses to move bytes once the port is bound.
    pub fn endpoint(&self, port: impl Into<String>) -> CharStreamEndpoint {
        CharStreamEndpoint {
            port: port.into(),
            tx: self.tx.clone(),
            rx: self.rx.clone(),
        }
    }

    /// Allocates one channel per direction and cross-wires them: our transmit feeds the peer's
    /// receive and the other way round.
    pub(crate) fn bind_peer(&self, peer: &Self) -> Result<ConnectionInfo, BindingError> {
        let slots = [&self.tx, &self.rx, &peer.tx, &peer.rx];
        if slots.iter().any(|s| !s.is_free()) {
            return Err(BindingError::AlreadyBound {
                what: "char-stream port".into(),
            });
        }
        // Delegated slots of two ports may share a terminal; binding would then overwrite itself.
        for (i, a) in slots.iter().enumerate() {
            if slots[i + 1..].iter().any(|b| a.same(b)) {
                return Err(BindingError::AlreadyBound {
                    what: "char-stream port (shared channel slot)".into(),
                });
            }
        }

        let forward = CharChannel::default();
        let backward = CharChannel::default();
        self.tx.bind(forward.clone());
        peer.rx.bind(forward);
        self.rx.bind(backward.clone());
        peer.tx.bind(backward);
        Ok(ConnectionInfo::new())
    }

    /// Re-exports the parent's transmit and receive sides as our own.
    pub(crate) fn bind_hierarchical(&self, parent: &Self) -> Result<ConnectionInfo, BindingError> {
        if !self.tx.is_undelegated() || !self.rx.is_undelegated() {
            return Err(BindingError::AlreadyBound {
                what: "char-stream port".into(),
            });
        }
        if self.tx.same(&parent.tx) || self.rx.same(&parent.rx) {
            return Err(BindingError::AlreadyBound {
                what: "char-stream port (delegation cycle)".into(),
            });
        }
        self.tx.delegate_to(&parent.tx);
        self.rx.delegate_to(&parent.rx);
        Ok(ConnectionInfo::new())
    }
}

/// Component-side view of a bound character-stream port.
#[derive(Clone)]
pub struct CharStreamEndpoint {
    port: String,
    tx: ChannelSlot,
    rx: ChannelSlot,
}

impl CharStreamEndpoint {
    pub fn is_bound(&self) -> bool {
        self.tx.resolve().is_some() && self.rx.resolve().is_some()
    }

    fn channel(&self, slot: &ChannelSlot) -> Result<CharChannel, ChannelError> {
        slot.resolve().ok_or_else(|| ChannelError::Unbound {
            port: self.port.clone(),
        })
    }

    /// Appends `data` to the peer's receive buffer and wakes its reader.
    pub fn send(&self, data: &[u8]) -> Result<(), ChannelError> {
        let channel = self.channel(&self.tx)?;
        tracing::trace!(port = %self.port, len = data.len(), "char-stream send");
        channel.send(data);
        Ok(())
    }

    /// Non-blocking receive: whatever is buffered, possibly nothing.
    pub fn try_recv(&self) -> Result<Vec<u8>, ChannelError> {
        Ok(self.channel(&self.rx)?.drain())
    }

    /// Blocking receive: parks on the channel's event until at least one byte is buffered, then
    /// drains the buffer.
    pub fn recv(&self, scheduler: &dyn Scheduler) -> Result<Vec<u8>, ChannelError> {
        let channel = self.channel(&self.rx)?;
        while channel.is_empty() {
            scheduler.wait_event(channel.event())?;
        }
        Ok(channel.drain())
    }

    pub fn has_data(&self) -> bool {
        self.rx.resolve().is_some_and(|c| !c.is_empty())
    }

    /// Whether `self` transmits into the channel `other` receives from.
    pub fn feeds(&self, other: &CharStreamEndpoint) -> bool {
        match (self.tx.resolve(), other.rx.resolve()) {
            (Some(a), Some(b)) => a.same(&b),
            _ => false,
        }
    }
}
