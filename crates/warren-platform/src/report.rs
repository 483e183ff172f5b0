use std::fmt;

use crate::Platform;

/// Human-readable listing of a platform: every component with its ports and their bindings, then
/// every bus with its memory map.
///
/// ```text
/// ram (memory)
///   mem [bus]
///     -> sysbus.bus (peer, target) address range: [0x0, 0x1000)
/// bus sysbus
///   [0x0, 0x1000) ram
///   initiator cpu.bus
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopologyReport {
    text: String,
}

impl TopologyReport {
    pub fn new(platform: &Platform) -> Self {
        Self {
            text: Listing(platform).to_string(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for TopologyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

struct Listing<'a>(&'a Platform);

impl fmt::Display for Listing<'_> {
    fn fmt(&self, out: &mut fmt::Formatter<'_>) -> fmt::Result {
        let platform = self.0;
        for component in platform.components() {
            writeln!(out, "{} ({})", component.name(), component.kind())?;
            for port in component.ports() {
                writeln!(out, "  {} [{}]", port.name(), port.protocol())?;
                for connection in port.connections() {
                    write!(
                        out,
                        "    -> {} ({}, {})",
                        connection.peer, connection.kind, connection.mode
                    )?;
                    if !connection.info.is_empty() {
                        write!(out, " {}", connection.info)?;
                    }
                    writeln!(out)?;
                }
            }
        }

        for component in platform.components() {
            let Some(router) = component.bus_router() else {
                continue;
            };
            let router = router.borrow();
            writeln!(out, "bus {}", router.name())?;
            for (range, target) in router.memory_map() {
                writeln!(out, "  {range} {target}")?;
            }
            for initiator in router.initiator_names() {
                writeln!(out, "  initiator {initiator}")?;
            }
        }

        for failure in platform.binding_failures() {
            writeln!(
                out,
                "unbound {} -> {}: {}",
                failure.request.from, failure.request.to, failure.error
            )?;
        }
        Ok(())
    }
}
