use std::cell::RefCell;
use std::rc::Rc;

use warren_time::{EventScheduler, Scheduler};

use crate::{BusRouter, BusRouterRef, BusTarget, Payload, ResponseStatus, TargetRef, Transaction};

/// What a [`RecordingTarget`] saw, in target-local addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Seen {
    Read { address: u64, len: usize },
    Write { address: u64, data: Vec<u8> },
    Debug { address: u64 },
}

pub(crate) type SeenLog = Rc<RefCell<Vec<Seen>>>;

/// Answers every read with `fill` and records each access.
pub(crate) struct RecordingTarget {
    name: String,
    fill: u8,
    seen: SeenLog,
    delay_ns: u64,
}

impl RecordingTarget {
    pub(crate) fn new(name: &str, fill: u8) -> (TargetRef, SeenLog) {
        Self::with_delay(name, fill, 0)
    }

    pub(crate) fn with_delay(name: &str, fill: u8, delay_ns: u64) -> (TargetRef, SeenLog) {
        let seen = SeenLog::default();
        let target: TargetRef = Rc::new(Self {
            name: name.to_owned(),
            fill,
            seen: seen.clone(),
            delay_ns,
        });
        (target, seen)
    }
}

impl BusTarget for RecordingTarget {
    fn name(&self) -> &str {
        &self.name
    }

    fn transport(&self, tx: &mut Transaction<'_>, delay_ns: &mut u64) {
        let address = tx.address();
        match tx.payload_mut() {
            Payload::Read(dst) => {
                dst.fill(self.fill);
                self.seen.borrow_mut().push(Seen::Read {
                    address,
                    len: dst.len(),
                });
            }
            Payload::Write(src) => self.seen.borrow_mut().push(Seen::Write {
                address,
                data: src.to_vec(),
            }),
        }
        *delay_ns += self.delay_ns;
        tx.set_response(ResponseStatus::Ok);
    }

    fn debug_transport(&self, tx: &mut Transaction<'_>) -> usize {
        self.seen.borrow_mut().push(Seen::Debug {
            address: tx.address(),
        });
        tx.len()
    }
}

pub(crate) fn scheduler() -> Rc<EventScheduler> {
    Rc::new(EventScheduler::new())
}

pub(crate) fn router(sched: &Rc<EventScheduler>) -> BusRouterRef {
    let sched: Rc<dyn Scheduler> = sched.clone();
    BusRouter::new("sysbus", sched).into_shared()
}
