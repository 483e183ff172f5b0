use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

use thiserror::Error;

use crate::{Clock, SimEvent};

/// The suspension points a component process may use.
///
/// All methods take `&self`: schedulers are shared (`Rc<dyn Scheduler>`) between every component
/// of a platform and are only ever driven from the single simulation thread.
pub trait Scheduler {
    /// Current virtual time, in nanoseconds.
    fn now_ns(&self) -> u64;

    /// Suspends the calling process for `ns` nanoseconds of virtual time.
    fn wait_ns(&self, ns: u64);

    /// Suspends the calling process until `event` is notified, consuming the notification.
    fn wait_event(&self, event: &SimEvent) -> Result<(), SchedulerError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    /// Nothing left to run could ever notify the awaited event.
    #[error("scheduler stalled at {now_ns} ns: no pending action can notify the awaited event")]
    Stalled { now_ns: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimedActionId(u64);

type Action = Box<dyn FnOnce()>;

/// Deterministic single-threaded scheduler.
///
/// Work belonging to other processes is registered as timed actions. While the current process
/// is parked in [`Scheduler::wait_ns`] or [`Scheduler::wait_event`], due actions run in
/// `(deadline, registration order)` order and the clock jumps to each deadline in turn.
#[derive(Default)]
pub struct EventScheduler {
    clock: Cell<Clock>,
    next_seq: Cell<u64>,
    queue: RefCell<BTreeMap<(u64, u64), Action>>,
}

impl EventScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `action` to run `delay_ns` after the current time.
    pub fn schedule_in(&self, delay_ns: u64, action: impl FnOnce() + 'static) -> TimedActionId {
        let deadline = self.now_ns().saturating_add(delay_ns);
        self.schedule_at(deadline, action)
    }

    /// Registers `action` to run at the absolute time `deadline_ns`. Deadlines in the past fire
    /// at the next suspension point.
    pub fn schedule_at(&self, deadline_ns: u64, action: impl FnOnce() + 'static) -> TimedActionId {
        let seq = self.next_seq.get();
        self.next_seq.set(seq + 1);
        self.queue
            .borrow_mut()
            .insert((deadline_ns, seq), Box::new(action));
        TimedActionId(seq)
    }

    /// Drops a not-yet-fired action. Returns `false` if it already ran or was cancelled.
    pub fn cancel(&self, id: TimedActionId) -> bool {
        let mut queue = self.queue.borrow_mut();
        let key = queue.keys().find(|(_, seq)| *seq == id.0).copied();
        key.and_then(|k| queue.remove(&k)).is_some()
    }

    pub fn pending_actions(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Runs every registered action, including ones registered while running.
    pub fn run_until_idle(&self) {
        while self.fire_next(u64::MAX) {}
    }

    /// Pops and runs the earliest action if its deadline is `<= limit_ns`.
    fn fire_next(&self, limit_ns: u64) -> bool {
        // The queue borrow must end before the action runs: actions may schedule more work.
        let next = {
            let mut queue = self.queue.borrow_mut();
            match queue.first_key_value() {
                Some((&(deadline, _), _)) if deadline <= limit_ns => queue.pop_first(),
                _ => None,
            }
        };
        let Some(((deadline, _), action)) = next else {
            return false;
        };

        self.advance_to(deadline);
        action();
        true
    }

    fn advance_to(&self, deadline_ns: u64) {
        let mut clock = self.clock.get();
        clock.advance_to(deadline_ns);
        self.clock.set(clock);
    }
}

impl Scheduler for EventScheduler {
    fn now_ns(&self) -> u64 {
        self.clock.get().now_ns()
    }

    fn wait_ns(&self, ns: u64) {
        let target = self.now_ns().saturating_add(ns);
        while self.fire_next(target) {}
        self.advance_to(target);
    }

    fn wait_event(&self, event: &SimEvent) -> Result<(), SchedulerError> {
        loop {
            if event.take() {
                return Ok(());
            }
            if !self.fire_next(u64::MAX) {
                let now_ns = self.now_ns();
                tracing::debug!(now_ns, "wait_event with an empty action queue");
                return Err(SchedulerError::Stalled { now_ns });
            }
        }
    }
}
