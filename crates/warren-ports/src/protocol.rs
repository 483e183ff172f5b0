use core::fmt;

use serde::{Deserialize, Serialize};

/// Protocol family a port speaks. Two ports can only be bound when their families agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProtocolKind {
    /// Memory-mapped bus (routers, targets, initiators).
    Bus,
    /// Symmetric byte stream, e.g. a UART line.
    CharStream,
    /// One master addressing many slaves by a 7-bit address carried in each frame.
    MultiDrop,
    /// One master selecting slaves through out-of-band select lines.
    ChipSelect,
}

impl ProtocolKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            ProtocolKind::Bus => "bus",
            ProtocolKind::CharStream => "char-stream",
            ProtocolKind::MultiDrop => "multi-drop",
            ProtocolKind::ChipSelect => "chip-select",
        }
    }
}

impl fmt::Display for ProtocolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
