use std::rc::Rc;

use crate::{DirectAccessWindow, Transaction};

/// A component that answers bus transactions.
///
/// Addresses seen by a target are local: the router subtracts the base of the range the target
/// was mapped at before forwarding.
///
/// Targets are shared and may be re-entered by another initiator while one access is suspended
/// in the scheduler. Mutable state lives behind interior mutability and is never borrowed across
/// a suspension point.
pub trait BusTarget {
    fn name(&self) -> &str;

    /// Blocking transport. Implementations may suspend through their scheduler and may add to
    /// `delay_ns` for timing the initiator should account for on return.
    fn transport(&self, tx: &mut Transaction<'_>, delay_ns: &mut u64);

    /// Untimed access for inspection and loading. Returns the number of bytes transferred.
    fn debug_transport(&self, tx: &mut Transaction<'_>) -> usize;

    /// Offers a direct-access window covering `tx.address()`, in target-local addresses.
    fn direct_access(&self, _tx: &Transaction<'_>) -> Option<DirectAccessWindow> {
        None
    }
}

pub type TargetRef = Rc<dyn BusTarget>;
