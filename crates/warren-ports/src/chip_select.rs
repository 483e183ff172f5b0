use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::{BindingError, BindingHints, ConnectionInfo, ProtocolKind};

/// Hint carrying the select line a slave is wired to.
pub const CHIP_SELECT_HINT: &str = "cs";

/// A full-duplex transfer. The master fills `send_data`; the slave consumes it with
/// [`ChipSelectFrame::send_pop`] and answers through [`ChipSelectFrame::recv_push`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChipSelectFrame {
    send_data: Vec<u8>,
    recv_data: Vec<u8>,
    send_idx: usize,
}

impl ChipSelectFrame {
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self {
            send_data: data.into(),
            ..Self::default()
        }
    }

    pub fn send_data(&self) -> &[u8] {
        &self.send_data
    }

    pub fn recv_data(&self) -> &[u8] {
        &self.recv_data
    }

    /// Next byte from the master, or 0 once everything has been consumed.
    pub fn send_pop(&mut self) -> u8 {
        match self.send_data.get(self.send_idx) {
            Some(&byte) => {
                self.send_idx += 1;
                byte
            }
            None => {
                tracing::debug!("chip-select frame: send data underflow");
                0
            }
        }
    }

    pub fn send_remaining(&self) -> usize {
        self.send_data.len() - self.send_idx
    }

    pub fn send_is_empty(&self) -> bool {
        self.send_remaining() == 0
    }

    /// Marks every remaining byte as consumed.
    pub fn send_clear(&mut self) {
        self.send_idx = self.send_data.len();
    }

    /// Appends a response byte. A slave never answers with more bytes than were sent; extra
    /// bytes are dropped.
    pub fn recv_push(&mut self, byte: u8) {
        if self.recv_data.len() >= self.send_data.len() {
            tracing::debug!("chip-select frame: slave answered with more data than sent, dropping");
            return;
        }
        self.recv_data.push(byte);
    }

    pub fn clear(&mut self) {
        self.send_data.clear();
        self.recv_data.clear();
        self.send_idx = 0;
    }

    fn pad_response(&mut self) {
        if self.recv_data.len() < self.send_data.len() {
            tracing::debug!(
                sent = self.send_data.len(),
                received = self.recv_data.len(),
                "chip-select slave did not respond with enough data, padding"
            );
            self.recv_data.resize(self.send_data.len(), 0);
        }
    }
}

pub trait ChipSelectSlave {
    fn transfer(&mut self, frame: &mut ChipSelectFrame);

    fn select(&mut self) {}

    fn deselect(&mut self) {}
}

pub type ChipSelectSlaveRef = Rc<RefCell<dyn ChipSelectSlave>>;

#[derive(Default)]
struct MasterTable {
    slaves: Vec<ChipSelectSlaveRef>,
    index_by_cs: HashMap<u32, usize>,
    selected: Option<(u32, usize)>,
}

/// Master side of a chip-select bus.
///
/// Select lines are supplied by the binding (`cs` hint) rather than declared by slaves. Frames go
/// either to an explicit select line ([`ChipSelectMaster::send_to`]) or to whichever slave is
/// currently selected ([`ChipSelectMaster::transfer`]).
#[derive(Clone)]
pub struct ChipSelectMaster {
    name: Rc<str>,
    table: Rc<RefCell<MasterTable>>,
}

impl ChipSelectMaster {
    pub fn new(name: impl Into<String>) -> Self {
        let name: String = name.into();
        Self {
            name: Rc::from(name),
            table: Rc::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn slave_index(&self, cs: u32) -> Option<usize> {
        self.table.borrow().index_by_cs.get(&cs).copied()
    }

    pub fn slave_count(&self) -> usize {
        self.table.borrow().slaves.len()
    }

    /// Select line currently asserted, if any.
    pub fn selected(&self) -> Option<u32> {
        self.table.borrow().selected.map(|(cs, _)| cs)
    }

    fn register(&self, cs: u32, slave: ChipSelectSlaveRef) -> usize {
        let mut table = self.table.borrow_mut();
        let index = table.slaves.len();
        table.slaves.push(slave);
        table.index_by_cs.insert(cs, index);
        index
    }

    fn lookup(&self, cs: u32) -> Option<(usize, ChipSelectSlaveRef)> {
        let table = self.table.borrow();
        let index = *table.index_by_cs.get(&cs)?;
        Some((index, table.slaves[index].clone()))
    }

    /// Asserts `cs`, deasserting any other line first. Unknown lines are ignored.
    pub fn select(&self, cs: u32) -> bool {
        let Some((index, slave)) = self.lookup(cs) else {
            tracing::debug!(master = %self.name, cs, "select of unknown chip-select slave");
            return false;
        };
        if self.selected() == Some(cs) {
            return true;
        }
        self.deselect();
        self.table.borrow_mut().selected = Some((cs, index));
        slave.borrow_mut().select();
        true
    }

    pub fn deselect(&self) {
        let previous = {
            let mut table = self.table.borrow_mut();
            table
                .selected
                .take()
                .map(|(_, index)| table.slaves[index].clone())
        };
        if let Some(slave) = previous {
            slave.borrow_mut().deselect();
        }
    }

    /// Exchanges `frame` with the selected slave. Without a selection the frame is left as is.
    pub fn transfer(&self, frame: &mut ChipSelectFrame) -> bool {
        let slave = {
            let table = self.table.borrow();
            table.selected.map(|(_, index)| table.slaves[index].clone())
        };
        match slave {
            Some(slave) => {
                Self::exchange(&slave, frame);
                true
            }
            None => {
                tracing::debug!(master = %self.name, "chip-select transfer with no slave selected");
                false
            }
        }
    }

    /// Exchanges `frame` with the slave on `cs` without touching the current selection.
    pub fn send_to(&self, frame: &mut ChipSelectFrame, cs: u32) -> bool {
        match self.lookup(cs) {
            Some((_, slave)) => {
                Self::exchange(&slave, frame);
                true
            }
            None => {
                tracing::debug!(master = %self.name, cs, "frame sent to unknown chip-select slave");
                false
            }
        }
    }

    fn exchange(slave: &ChipSelectSlaveRef, frame: &mut ChipSelectFrame) {
        slave.borrow_mut().transfer(frame);
        frame.pad_response();
    }
}

/// Negotiation state of a chip-select port.
#[derive(Clone)]
pub enum ChipSelectStrategy {
    Master(ChipSelectMaster),
    Slave(ChipSelectSlaveRef),
}

impl ChipSelectStrategy {
    pub fn mode(&self) -> &'static str {
        match self {
            ChipSelectStrategy::Master(_) => "master",
            ChipSelectStrategy::Slave(_) => "slave",
        }
    }

    pub(crate) fn bind_peer(
        &self,
        peer: &Self,
        hints: &BindingHints,
    ) -> Result<ConnectionInfo, BindingError> {
        let (master, slave) = match (self, peer) {
            (ChipSelectStrategy::Master(master), ChipSelectStrategy::Slave(slave))
            | (ChipSelectStrategy::Slave(slave), ChipSelectStrategy::Master(master)) => {
                (master, slave)
            }
            _ => {
                return Err(BindingError::SameMode {
                    protocol: ProtocolKind::ChipSelect,
                    mode: self.mode(),
                })
            }
        };

        let raw = hints.scalar(CHIP_SELECT_HINT)?;
        let cs = u32::try_from(raw).map_err(|_| BindingError::MalformedHint {
            key: CHIP_SELECT_HINT,
            value: raw.to_string(),
        })?;
        if master.slave_index(cs).is_some() {
            return Err(BindingError::DuplicateChipSelect { cs });
        }
        master.register(cs, slave.clone());

        let mut info = ConnectionInfo::new();
        info.add("chip select", cs);
        Ok(info)
    }

    pub(crate) fn bind_hierarchical(&self, parent: &Self) -> Result<ConnectionInfo, BindingError> {
        if self.mode() != parent.mode() {
            return Err(BindingError::HierarchicalTypeMismatch {
                protocol: ProtocolKind::ChipSelect,
                child: self.mode(),
                parent: parent.mode(),
            });
        }
        Err(BindingError::HierarchicalUnsupported {
            protocol: ProtocolKind::ChipSelect,
            mode: self.mode(),
        })
    }
}
