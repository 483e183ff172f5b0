use core::fmt;

use crate::ProtocolKind;

/// Diagnostic key/value pairs a strategy records about a successful binding, e.g.
/// `chip select: 3` or `address range: [0x1000, 0x2000)`. Insertion order is preserved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionInfo {
    entries: Vec<(String, String)>,
}

impl ConnectionInfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, key: impl Into<String>, value: impl fmt::Display) {
        self.entries.push((key.into(), value.to_string()));
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for ConnectionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{key}: {value}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    Peer,
    Hierarchical,
}

impl fmt::Display for BindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BindingKind::Peer => "peer",
            BindingKind::Hierarchical => "hierarchical",
        })
    }
}

/// One realized binding of a port, as seen from that port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionDescriptor {
    /// Full name (`component.port`) of the other end.
    pub peer: String,
    pub kind: BindingKind,
    pub protocol: ProtocolKind,
    /// Role the local strategy played, e.g. `master` or `target`.
    pub mode: &'static str,
    pub info: ConnectionInfo,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn info_renders_in_insertion_order() {
        let mut info = ConnectionInfo::new();
        info.add("chip select", 3);
        info.add("address", "0x50");
        assert_eq!(info.to_string(), "chip select: 3, address: 0x50");
        assert_eq!(info.get("chip select"), Some("3"));
        assert_eq!(info.get("missing"), None);
    }
}
