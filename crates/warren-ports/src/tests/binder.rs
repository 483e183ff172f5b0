use std::cell::RefCell;
use std::rc::Rc;

use crate::{
    bind_hierarchical, bind_peer, BindingError, BindingHints, BindingKind, ChipSelectFrame,
    ChipSelectSlave, ChipSelectSlaveRef, MultiDropFrame, MultiDropSlave, MultiDropSlaveRef, Port,
    ChipSelectStrategy, ProtocolKind, CHIP_SELECT_HINT,
};

#[derive(Default)]
struct Eeprom {
    frames: Vec<Vec<u8>>,
}

impl MultiDropSlave for Eeprom {
    fn transfer(&mut self, frame: &mut MultiDropFrame) {
        self.frames.push(frame.send_data.clone());
    }
}

#[derive(Default)]
struct Flash {
    frames: u32,
}

impl ChipSelectSlave for Flash {
    fn transfer(&mut self, frame: &mut ChipSelectFrame) {
        self.frames += 1;
        frame.send_clear();
        frame.recv_push(0xa5);
    }
}

#[test]
fn protocol_mismatch_is_detected_before_any_strategy_runs() {
    let (i2c, master) = Port::multi_drop_master("soc", "i2c");
    let (spi, cs_master) = Port::chip_select_master("soc", "spi");
    let eeprom: MultiDropSlaveRef = Rc::new(RefCell::new(Eeprom::default()));
    let slave = Port::multi_drop_slave("eeprom", "i2c", 0x50, eeprom);

    let err = bind_peer(&slave, &spi, &BindingHints::new().with(CHIP_SELECT_HINT, "0"));
    assert_eq!(
        err,
        Err(BindingError::ProtocolMismatch {
            port: "eeprom.i2c".into(),
            peer: "soc.spi".into(),
            port_protocol: ProtocolKind::MultiDrop,
            peer_protocol: ProtocolKind::ChipSelect,
        })
    );
    assert_eq!(master.slave_count(), 0);
    assert_eq!(cs_master.slave_count(), 0);
    assert!(!slave.is_connected());
    assert!(!spi.is_connected());

    bind_peer(&i2c, &slave, &BindingHints::new()).unwrap();
    assert_eq!(master.slave_index(0x50), Some(0));
}

#[test]
fn chip_select_hint_routes_frames_and_unknown_selects_are_harmless() {
    let (spi, master) = Port::chip_select_master("soc", "spi0");
    let flash = Rc::new(RefCell::new(Flash::default()));
    let flash_ref: ChipSelectSlaveRef = flash.clone();
    let slave = Port::chip_select_slave("flash", "spi", flash_ref);

    let info = bind_peer(&spi, &slave, &BindingHints::new().with(CHIP_SELECT_HINT, "3")).unwrap();
    assert_eq!(info.get("chip select"), Some("3"));

    assert!(master.select(3));
    let mut frame = ChipSelectFrame::new(vec![0x9f, 0, 0]);
    assert!(master.transfer(&mut frame));
    assert_eq!(frame.recv_data(), &[0xa5, 0, 0]);

    assert!(!master.select(7));
    assert_eq!(master.selected(), Some(3));
    assert_eq!(flash.borrow().frames, 1);
}

#[test]
fn descriptors_are_recorded_on_both_ends() {
    let (spi, _master) = Port::chip_select_master("soc", "spi0");
    let slave = Port::chip_select_slave("flash", "spi", Rc::new(RefCell::new(Flash::default())));
    bind_peer(&slave, &spi, &BindingHints::new().with(CHIP_SELECT_HINT, "0x2")).unwrap();

    let ours = slave.connections();
    assert_eq!(ours.len(), 1);
    assert_eq!(ours[0].peer, "soc.spi0");
    assert_eq!(ours[0].kind, BindingKind::Peer);
    assert_eq!(ours[0].mode, "slave");
    assert_eq!(ours[0].info.to_string(), "chip select: 2");

    let theirs = spi.connections();
    assert_eq!(theirs[0].peer, "flash.spi");
    assert_eq!(theirs[0].mode, "master");
}

#[test]
fn failed_bindings_record_nothing() {
    let (a, _) = Port::chip_select_master("a", "spi");
    let (b, _) = Port::chip_select_master("b", "spi");
    assert!(matches!(
        bind_peer(&a, &b, &BindingHints::new()),
        Err(BindingError::SameMode { .. })
    ));
    assert!(a.connections().is_empty());
    assert!(b.connections().is_empty());
}

#[test]
fn the_first_failing_strategy_pair_ends_the_search() {
    let (mut spi, primary) = Port::chip_select_master("soc", "spi");
    let (_, fallback) = Port::chip_select_master("soc", "spi-alt");
    spi.add_strategy(ChipSelectStrategy::Master(fallback.clone()))
        .unwrap();
    let hints = BindingHints::new().with(CHIP_SELECT_HINT, "3");

    let first = Port::chip_select_slave("flash0", "spi", Rc::new(RefCell::new(Flash::default())));
    bind_peer(&first, &spi, &hints).unwrap();
    assert_eq!(primary.slave_index(3), Some(0));

    // The primary master rejects cs 3; the fallback would accept it but is never tried.
    let second = Port::chip_select_slave("flash1", "spi", Rc::new(RefCell::new(Flash::default())));
    assert_eq!(
        bind_peer(&second, &spi, &hints),
        Err(BindingError::DuplicateChipSelect { cs: 3 })
    );
    assert_eq!(fallback.slave_count(), 0);
    assert!(second.connections().is_empty());
    assert_eq!(spi.connections().len(), 1);
}

#[test]
fn a_port_cannot_bind_to_itself() {
    let (uart, _) = Port::char_stream("uart0", "line");
    assert_eq!(
        bind_peer(&uart, &uart, &BindingHints::new()),
        Err(BindingError::SelfBinding {
            port: "uart0.line".into()
        })
    );
}

#[test]
fn composite_char_stream_ports_forward_through_their_parent() {
    let (inner, inner_end) = Port::char_stream("soc.uart0", "line");
    let (outer, _) = Port::char_stream("soc", "uart0");
    let (term, term_end) = Port::char_stream("console", "line");

    bind_hierarchical(&inner, &outer).unwrap();
    bind_peer(&outer, &term, &BindingHints::new()).unwrap();

    inner_end.send(b"login: ").unwrap();
    assert_eq!(term_end.try_recv().unwrap(), b"login: ");

    let delegated = inner.connections();
    assert_eq!(delegated[0].kind, BindingKind::Hierarchical);
    assert_eq!(delegated[0].peer, "soc.uart0");
}

#[test]
fn hierarchical_mode_mismatch_is_reported_as_such() {
    let (master, _) = Port::multi_drop_master("soc.ctrl", "i2c");
    let parent = Port::multi_drop_slave(
        "soc",
        "i2c",
        0x20,
        Rc::new(RefCell::new(Eeprom::default())),
    );
    let err = bind_hierarchical(&master, &parent).unwrap_err();
    assert!(err.is_hierarchical_type_mismatch());

    let (parent_master, _) = Port::multi_drop_master("soc", "i2c");
    assert!(matches!(
        bind_hierarchical(&master, &parent_master),
        Err(BindingError::HierarchicalUnsupported {
            protocol: ProtocolKind::MultiDrop,
            ..
        })
    ));
}

#[test]
fn fallback_strategies_must_share_the_port_protocol() {
    let (mut port, _) = Port::char_stream("uart0", "line");
    let (_, master) = Port::chip_select_master("x", "y");
    let err = port
        .add_strategy(crate::ChipSelectStrategy::Master(master))
        .unwrap_err();
    assert!(matches!(err, BindingError::ProtocolMismatch { .. }));
    assert_eq!(port.strategies().len(), 1);
}
