use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::{BindingError, ConnectionInfo, ProtocolKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Write,
    Read,
}

/// How a 7-bit address on the wire is interpreted. Only [`AddressClass::Slave`] addresses are
/// routed to bound slaves; the rest are reserved by the bus protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressClass {
    GeneralCall,
    StartByte,
    Cbus,
    OtherBus,
    Reserved,
    HighSpeedMode,
    TenBit,
    DeviceId,
    Slave,
}

impl AddressClass {
    pub fn of(address: u16, direction: Direction) -> Self {
        match address {
            0 if direction == Direction::Write => AddressClass::GeneralCall,
            0 => AddressClass::StartByte,
            1 => AddressClass::Cbus,
            2 => AddressClass::OtherBus,
            3 => AddressClass::Reserved,
            4..=7 => AddressClass::HighSpeedMode,
            0x78..=0x7b => AddressClass::TenBit,
            0x7c..=0x7f if direction == Direction::Read => AddressClass::DeviceId,
            _ => AddressClass::Slave,
        }
    }
}

/// A transfer addressed to one slave. The slave reads `send_data` and appends its answer to
/// `recv_data`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiDropFrame {
    pub address: u16,
    pub direction: Direction,
    pub stop: bool,
    pub send_data: Vec<u8>,
    pub recv_data: Vec<u8>,
}

impl MultiDropFrame {
    pub fn write(address: u16, data: impl Into<Vec<u8>>) -> Self {
        Self {
            address,
            direction: Direction::Write,
            stop: true,
            send_data: data.into(),
            recv_data: Vec::new(),
        }
    }

    pub fn read(address: u16) -> Self {
        Self {
            address,
            direction: Direction::Read,
            stop: true,
            send_data: Vec::new(),
            recv_data: Vec::new(),
        }
    }

    pub fn clear(&mut self) {
        self.send_data.clear();
        self.recv_data.clear();
        self.stop = false;
    }
}

pub trait MultiDropSlave {
    fn transfer(&mut self, frame: &mut MultiDropFrame);
}

pub type MultiDropSlaveRef = Rc<RefCell<dyn MultiDropSlave>>;

type BindingListener = Box<dyn FnMut(u16, usize)>;

#[derive(Default)]
struct MasterTable {
    slaves: Vec<MultiDropSlaveRef>,
    index_by_address: HashMap<u16, usize>,
    listeners: Vec<BindingListener>,
}

/// Master side of a multi-drop bus: an append-only table mapping slave addresses to indices in
/// binding order, and frame delivery through it.
#[derive(Clone)]
pub struct MultiDropMaster {
    name: Rc<str>,
    table: Rc<RefCell<MasterTable>>,
}

impl MultiDropMaster {
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

    pub fn slave_index(&self, address: u16) -> Option<usize> {
        self.table.borrow().index_by_address.get(&address).copied()
    }

    pub fn slave_count(&self) -> usize {
        self.table.borrow().slaves.len()
    }

    /// Registers a callback run after every slave binding with `(address, index)`.
    pub fn on_slave_bound(&self, listener: impl FnMut(u16, usize) + 'static) {
        self.table.borrow_mut().listeners.push(Box::new(listener));
    }

    fn register(&self, address: u16, slave: MultiDropSlaveRef) -> usize {
        let (index, mut listeners) = {
            let mut table = self.table.borrow_mut();
            let index = table.slaves.len();
            table.slaves.push(slave);
            table.index_by_address.insert(address, index);
            (index, std::mem::take(&mut table.listeners))
        };

        // Listeners run unborrowed so they may query the table.
        for listener in &mut listeners {
            listener(address, index);
        }
        let mut table = self.table.borrow_mut();
        listeners.append(&mut table.listeners);
        table.listeners = listeners;
        index
    }

    /// Delivers `frame` to the slave bound at `frame.address`. Reserved and unknown addresses are
    /// ignored. Returns whether a slave handled the frame.
    pub fn send(&self, frame: &mut MultiDropFrame) -> bool {
        let class = AddressClass::of(frame.address, frame.direction);
        if class != AddressClass::Slave {
            tracing::debug!(
                master = %self.name,
                address = frame.address,
                ?class,
                "unsupported special address"
            );
            return false;
        }

        let slave = {
            let table = self.table.borrow();
            match table.index_by_address.get(&frame.address) {
                Some(&index) => table.slaves[index].clone(),
                None => {
                    tracing::debug!(
                        master = %self.name,
                        address = frame.address,
                        "frame sent to unknown multi-drop slave"
                    );
                    return false;
                }
            }
        };
        slave.borrow_mut().transfer(frame);
        true
    }
}

/// Negotiation state of a multi-drop port.
#[derive(Clone)]
pub enum MultiDropStrategy {
    Master(MultiDropMaster),
    Slave {
        address: u16,
        slave: MultiDropSlaveRef,
    },
}

impl MultiDropStrategy {
    pub fn mode(&self) -> &'static str {
        match self {
            MultiDropStrategy::Master(_) => "master",
            MultiDropStrategy::Slave { .. } => "slave",
        }
    }

    pub(crate) fn bind_peer(&self, peer: &Self) -> Result<ConnectionInfo, BindingError> {
        let (master, address, slave) = match (self, peer) {
            (MultiDropStrategy::Master(master), MultiDropStrategy::Slave { address, slave })
            | (MultiDropStrategy::Slave { address, slave }, MultiDropStrategy::Master(master)) => {
                (master, *address, slave)
            }
            _ => {
                return Err(BindingError::SameMode {
                    protocol: ProtocolKind::MultiDrop,
                    mode: self.mode(),
                })
            }
        };

        if master.slave_index(address).is_some() {
            return Err(BindingError::DuplicateAddress { address });
        }
        let index = master.register(address, slave.clone());

        let mut info = ConnectionInfo::new();
        info.add("address", format_args!("0x{address:02x}"));
        info.add("index", index);
        Ok(info)
    }

    pub(crate) fn bind_hierarchical(&self, parent: &Self) -> Result<ConnectionInfo, BindingError> {
        if self.mode() != parent.mode() {
            return Err(BindingError::HierarchicalTypeMismatch {
                protocol: ProtocolKind::MultiDrop,
                child: self.mode(),
                parent: parent.mode(),
            });
        }
        Err(BindingError::HierarchicalUnsupported {
            protocol: ProtocolKind::MultiDrop,
            mode: self.mode(),
        })
    }
}
