use std::any::Any;
use std::io::Write;
use std::rc::Rc;

use warren_bus::{AddressRange, RouterError};
use warren_platform::{
    BindingRequest, BootError, BootImage, Bootloader, BuildContext, BuildError, BuildHook,
    BuildPolicy, Component, ComponentDescription, ComponentRegistry, MemoryComponent, Platform,
    PlatformBuilder, PlatformDescription, PortRef,
};
use warren_ports::{BindingError, BindingKind, BusInitiatorSocket, CharStreamEndpoint, Port};
use warren_time::{EventScheduler, Scheduler};

/// Bus initiator with a single `bus` port.
struct Cpu {
    name: String,
    socket: BusInitiatorSocket,
    ports: Vec<Port>,
}

impl Component for Cpu {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &str {
        "cpu"
    }

    fn ports(&self) -> &[Port] {
        &self.ports
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Character device with a single `line` port.
struct Uart {
    name: String,
    endpoint: CharStreamEndpoint,
    ports: Vec<Port>,
}

impl Component for Uart {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &str {
        "uart"
    }

    fn ports(&self) -> &[Port] {
        &self.ports
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn create_cpu(
    description: &ComponentDescription,
    ctx: &BuildContext,
) -> Result<Box<dyn Component>, BuildError> {
    let (port, socket) = Port::bus_initiator(&description.name, "bus", ctx.scheduler.clone());
    Ok(Box::new(Cpu {
        name: description.name.clone(),
        socket,
        ports: vec![port],
    }))
}

fn create_uart(
    description: &ComponentDescription,
    _ctx: &BuildContext,
) -> Result<Box<dyn Component>, BuildError> {
    let (port, endpoint) = Port::char_stream(&description.name, "line");
    Ok(Box::new(Uart {
        name: description.name.clone(),
        endpoint,
        ports: vec![port],
    }))
}

fn registry() -> ComponentRegistry {
    let mut registry = ComponentRegistry::with_builtin();
    registry.register("cpu", create_cpu).unwrap();
    registry.register("uart", create_uart).unwrap();
    registry
}

fn port(text: &str) -> PortRef {
    text.parse().unwrap()
}

fn soc() -> PlatformDescription {
    PlatformDescription {
        components: vec![
            ComponentDescription::new("sysbus", "bus"),
            ComponentDescription::new("ram", "memory").with_param("size", 0x1000),
            ComponentDescription::new("cpu", "cpu"),
        ],
        bindings: vec![
            BindingRequest::peer(port("ram.mem"), port("sysbus.bus"))
                .with_hint("base", "0x1000")
                .with_hint("size", "0x1000"),
            BindingRequest::peer(port("cpu.bus"), port("sysbus.bus")),
        ],
        ..PlatformDescription::default()
    }
}

fn build(description: &PlatformDescription) -> (Rc<EventScheduler>, Result<Platform, BuildError>) {
    let sched = Rc::new(EventScheduler::new());
    let platform = PlatformBuilder::new(registry(), sched.clone()).build(description);
    (sched, platform)
}

#[test]
fn initiators_reach_memory_through_the_built_bus() {
    let (sched, platform) = build(&soc());
    let platform = platform.unwrap();

    let cpu = platform.component_as::<Cpu>("cpu").unwrap();
    let master = cpu.socket.master().unwrap();
    master.bus_write(0x1010, &[1, 2, 3, 4]).unwrap();
    let mut buf = [0u8; 4];
    master.bus_read(0x1010, &mut buf).unwrap();

    assert_eq!(buf, [1, 2, 3, 4]);
    assert_eq!(sched.now_ns(), 14);

    let ram = platform.component_as::<MemoryComponent>("ram").unwrap();
    assert_eq!(
        ram.socket().mapping(),
        Some(AddressRange::new(0x1000, 0x2000).unwrap())
    );
    assert!(platform.component_as::<Cpu>("ram").is_none());
}

#[test]
fn routers_are_frozen_once_built() {
    let (sched, platform) = build(&soc());
    let platform = platform.unwrap();
    let router = platform.router("sysbus").unwrap();

    assert!(router.borrow().is_frozen());
    let late = warren_bus::BusMaster::connect("late", router, sched.clone());
    assert!(matches!(late, Err(RouterError::Frozen { .. })));
}

#[test]
fn the_report_lists_ports_and_the_memory_map() {
    let (_, platform) = build(&soc());
    let report = platform.unwrap().report().to_string();

    assert!(report.contains("ram (memory)\n  mem [bus]\n"));
    assert!(report.contains("-> sysbus.bus (peer, target) address range: [0x1000, 0x2000)"));
    assert!(report.contains("bus sysbus\n  [0x1000, 0x2000) ram\n  initiator cpu.bus\n"));
}

#[test]
fn the_report_renders_every_section_in_order() {
    let (_, platform) = build(&soc());
    let report = platform.unwrap().report();
    let text = report.as_str();

    assert_eq!(report.to_string(), text);
    assert!(text.ends_with("  initiator cpu.bus\n"));
    let ports = text.find("ram (memory)").unwrap();
    let buses = text.find("bus sysbus").unwrap();
    assert!(ports < buses);
    assert!(!text.contains("unbound"));
}

#[test]
fn a_failed_binding_aborts_the_build_by_default() {
    let mut description = soc();
    description.components.push(ComponentDescription::new("uart0", "uart"));
    description
        .bindings
        .insert(0, BindingRequest::peer(port("uart0.line"), port("sysbus.bus")));

    let (_, platform) = build(&description);
    match platform {
        Err(BuildError::Binding { from, source, .. }) => {
            assert_eq!(from, "uart0.line");
            assert!(matches!(source, BindingError::ProtocolMismatch { .. }));
        }
        other => panic!("unexpected build result: {:?}", other.err()),
    }
}

#[test]
fn the_continue_policy_records_failures_and_binds_the_rest() {
    let mut description = soc();
    description.fabric.build_policy = BuildPolicy::Continue;
    description.components.push(ComponentDescription::new("uart0", "uart"));
    description
        .bindings
        .insert(0, BindingRequest::peer(port("uart0.line"), port("sysbus.bus")));

    let (_, platform) = build(&description);
    let platform = platform.unwrap();

    let failures = platform.binding_failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].request.from, port("uart0.line"));
    assert!(!platform.port(&port("uart0.line")).unwrap().is_connected());
    assert!(platform.port(&port("cpu.bus")).unwrap().is_connected());
    assert!(platform
        .report()
        .to_string()
        .contains("unbound uart0.line -> sysbus.bus: "));
}

#[test]
fn description_errors_are_not_subject_to_the_policy() {
    let mut description = soc();
    description.fabric.build_policy = BuildPolicy::Continue;
    description
        .bindings
        .push(BindingRequest::peer(port("cpu.irq"), port("sysbus.bus")));
    assert!(matches!(
        build(&description).1,
        Err(BuildError::UnknownPort { component, port }) if component == "cpu" && port == "irq"
    ));

    let mut description = soc();
    description.components.push(ComponentDescription::new("ram", "memory"));
    assert!(matches!(
        build(&description).1,
        Err(BuildError::DuplicateComponent { name }) if name == "ram"
    ));
}

/// Wires every uart to the console it is told about.
struct ConsoleWiring {
    console: &'static str,
}

impl BuildHook for ConsoleWiring {
    fn after_component_instantiation(
        &mut self,
        platform: &Platform,
        bindings: &mut Vec<BindingRequest>,
    ) -> Result<(), BuildError> {
        for component in platform.components() {
            if component.kind() == "uart" && component.name() != self.console {
                bindings.push(BindingRequest::peer(
                    PortRef::new(component.name(), "line"),
                    PortRef::new(self.console, "line"),
                ));
            }
        }
        Ok(())
    }
}

#[test]
fn instantiation_hooks_can_add_bindings() {
    let description = PlatformDescription {
        components: vec![
            ComponentDescription::new("uart0", "uart"),
            ComponentDescription::new("console", "uart"),
        ],
        ..PlatformDescription::default()
    };
    let platform = PlatformBuilder::new(registry(), Rc::new(EventScheduler::new()))
        .with_hook(ConsoleWiring { console: "console" })
        .build(&description)
        .unwrap();

    let uart = platform.component_as::<Uart>("uart0").unwrap();
    let console = platform.component_as::<Uart>("console").unwrap();
    uart.endpoint.send(b"hello").unwrap();
    assert_eq!(console.endpoint.try_recv().unwrap(), b"hello");

    let connections = platform.port(&port("console.line")).unwrap().connections();
    assert_eq!(connections.len(), 1);
    assert_eq!(connections[0].peer, "uart0.line");
    assert_eq!(connections[0].kind, BindingKind::Peer);
}

#[test]
fn the_bootloader_writes_images_after_the_build() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&[0xde, 0xad, 0xbe, 0xef]).unwrap();
    file.flush().unwrap();

    let bootloader = Bootloader::new()
        .with_image(BootImage::from_file(file.path(), "sysbus", 0x1000).unwrap())
        .with_image(BootImage::from_bytes("args", "sysbus", 0x1ffe, vec![7, 8]));
    let sched = Rc::new(EventScheduler::new());
    let platform = PlatformBuilder::new(registry(), sched.clone())
        .with_hook(bootloader)
        .build(&soc())
        .unwrap();

    let master = platform.component_as::<Cpu>("cpu").unwrap().socket.master().unwrap();
    let mut buf = [0u8; 4];
    assert_eq!(master.debug_read(0x1000, &mut buf), 4);
    assert_eq!(buf, [0xde, 0xad, 0xbe, 0xef]);
    assert_eq!(master.debug_read(0x1ffe, &mut buf[..2]), 2);
    assert_eq!(&buf[..2], &[7, 8]);
    // Loading is untimed.
    assert_eq!(sched.now_ns(), 0);
}

#[test]
fn boot_images_must_land_whole() {
    let builder = |image| {
        PlatformBuilder::new(registry(), Rc::new(EventScheduler::new()))
            .with_hook(Bootloader::new().with_image(image))
            .build(&soc())
    };

    assert!(matches!(
        builder(BootImage::from_bytes("fw", "sysbus", 0x1ffe, vec![0; 4])),
        Err(BuildError::Boot(BootError::ShortWrite {
            written: 2,
            expected: 4,
            ..
        }))
    ));
    assert!(matches!(
        builder(BootImage::from_bytes("fw", "iobus", 0, vec![0])),
        Err(BuildError::Boot(BootError::UnknownBus { .. }))
    ));

    let missing = tempfile::tempdir().unwrap().path().join("missing.bin");
    assert!(matches!(
        BootImage::from_file(&missing, "sysbus", 0),
        Err(BootError::Io { .. })
    ));
}

#[test]
#[should_panic(expected = "no target mapped at address 0x0")]
fn boot_images_on_unmapped_memory_abort() {
    let _ = PlatformBuilder::new(registry(), Rc::new(EventScheduler::new()))
        .with_hook(Bootloader::new().with_image(BootImage::from_bytes("fw", "sysbus", 0, vec![1])))
        .build(&soc());
}
