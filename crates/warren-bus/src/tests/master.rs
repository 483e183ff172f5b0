use std::rc::Rc;

use warren_time::Scheduler;

use super::helpers::{router, scheduler, RecordingTarget, Seen};
use crate::{AddressRange, BusMaster, BusRouterRef, FlatMemory, TargetRef};

fn ram_at(bus: &BusRouterRef, sched: &Rc<warren_time::EventScheduler>, base: u64, size: u64) {
    let ram = FlatMemory::new("ram", size, sched.clone()).unwrap();
    let ram: TargetRef = Rc::new(ram);
    bus.borrow_mut()
        .connect_target(ram, AddressRange::from_base_size(base, size).unwrap())
        .unwrap();
}

#[test]
fn timed_accesses_go_through_the_router() {
    let sched = scheduler();
    let bus = router(&sched);
    ram_at(&bus, &sched, 0x1000, 0x100);
    let cpu = BusMaster::connect("cpu", &bus, sched.clone()).unwrap();

    cpu.bus_write(0x1010, &[1, 2, 3, 4]).unwrap();
    let mut buf = [0u8; 4];
    cpu.bus_read(0x1010, &mut buf).unwrap();

    assert_eq!(buf, [1, 2, 3, 4]);
    // Two dispatches of 3 + 1 ns around a 3 ns memory access each.
    assert_eq!(sched.now_ns(), 14);
    assert_eq!(
        bus.borrow().initiator_names().collect::<Vec<_>>(),
        vec!["cpu"]
    );
}

#[test]
fn a_second_initiator_may_run_while_an_access_is_suspended() {
    let sched = scheduler();
    let bus = router(&sched);
    ram_at(&bus, &sched, 0, 0x100);
    let cpu = BusMaster::connect("cpu", &bus, sched.clone()).unwrap();
    let dma = BusMaster::connect("dma", &bus, sched.clone()).unwrap();
    cpu.debug_write(0x10, &[0x11]);

    // Fires while the cpu read waits out the memory latency.
    sched.schedule_in(4, move || dma.bus_write(0x20, &[0xaa]).unwrap());
    let mut buf = [0u8; 1];
    cpu.bus_read(0x10, &mut buf).unwrap();

    assert_eq!(buf, [0x11]);
    let mut written = [0u8; 1];
    assert_eq!(cpu.debug_read(0x20, &mut written), 1);
    assert_eq!(written, [0xaa]);
    // The dma write completes at 11; the cpu read resumes there and pays its completion phase.
    assert_eq!(sched.now_ns(), 12);
    assert_eq!(sched.pending_actions(), 0);
}

#[test]
fn annotated_target_delay_is_synchronised() {
    let sched = scheduler();
    let bus = router(&sched);
    let (slow, seen) = RecordingTarget::with_delay("slow", 0x5a, 20);
    bus.borrow_mut()
        .connect_target(slow, AddressRange::new(0, 0x10).unwrap())
        .unwrap();
    let cpu = BusMaster::connect("cpu", &bus, sched.clone()).unwrap();

    let mut buf = [0u8; 2];
    cpu.bus_read(0x4, &mut buf).unwrap();

    assert_eq!(buf, [0x5a; 2]);
    assert_eq!(seen.borrow().as_slice(), &[Seen::Read { address: 4, len: 2 }]);
    assert_eq!(sched.now_ns(), 24);
}

#[test]
fn exact_dmi_hint_enables_the_fast_path() {
    let sched = scheduler();
    let bus = router(&sched);
    ram_at(&bus, &sched, 0x2000, 0x1000);
    let cpu = BusMaster::connect("cpu", &bus, sched.clone()).unwrap();

    assert!(cpu.dmi_hint(0x2000, 0x1000));
    assert!(cpu.dmi_hint(0x2000, 0x1000));
    assert_eq!(cpu.dmi_cache().borrow().len(), 1);

    cpu.bus_write(0x2ff0, &[0xaa; 16]).unwrap();
    let mut buf = [0u8; 16];
    cpu.bus_read(0x2ff0, &mut buf).unwrap();
    assert_eq!(buf, [0xaa; 16]);

    // Only the memory latencies are charged; the router is bypassed.
    assert_eq!(
        sched.now_ns(),
        FlatMemory::DEFAULT_READ_LATENCY_NS + FlatMemory::DEFAULT_WRITE_LATENCY_NS
    );
}

#[test]
fn inexact_dmi_hints_are_rejected() {
    let sched = scheduler();
    let bus = router(&sched);
    ram_at(&bus, &sched, 0x2000, 0x1000);
    let cpu = BusMaster::connect("cpu", &bus, sched.clone()).unwrap();

    assert!(!cpu.dmi_hint(0x2000, 0x800));
    assert!(!cpu.dmi_hint(0x2000, 0x2000));
    assert!(!cpu.dmi_hint(0x9000, 0x10));
    assert!(!cpu.dmi_hint(0x2000, 0));
    assert!(cpu.dmi_cache().borrow().is_empty());
}

#[test]
fn invalidation_forces_the_slow_path_again() {
    let sched = scheduler();
    let bus = router(&sched);
    ram_at(&bus, &sched, 0, 0x100);
    let cpu = BusMaster::connect("cpu", &bus, sched.clone()).unwrap();
    assert!(cpu.dmi_hint(0, 0x100));

    let ram = bus.borrow().route(0).unwrap().target;
    bus.borrow()
        .invalidate_direct_access(ram, AddressRange::new(0x80, 0x90).unwrap())
        .unwrap();
    assert!(cpu.dmi_cache().borrow().is_empty());

    cpu.bus_write(0, &[1]).unwrap();
    assert_eq!(sched.now_ns(), 3 + 3 + 1);
}

#[test]
fn debug_accesses_bypass_timing() {
    let sched = scheduler();
    let bus = router(&sched);
    ram_at(&bus, &sched, 0x100, 0x10);
    let cpu = BusMaster::connect("loader", &bus, sched.clone()).unwrap();

    assert_eq!(cpu.debug_write(0x10c, &[1, 2, 3, 4, 5, 6]), 4);
    let mut buf = [0u8; 4];
    assert_eq!(cpu.debug_read(0x10c, &mut buf), 4);
    assert_eq!(buf, [1, 2, 3, 4]);
    assert_eq!(sched.now_ns(), 0);
}

#[test]
#[should_panic(expected = "`ram`: access out of bounds")]
fn access_straddling_the_end_of_a_target_is_fatal() {
    let sched = scheduler();
    let bus = router(&sched);
    // The router maps more than the memory holds.
    let ram = FlatMemory::new("ram", 4096, sched.clone()).unwrap();
    let ram: TargetRef = Rc::new(ram);
    bus.borrow_mut()
        .connect_target(ram, AddressRange::new(0, 0x2000).unwrap())
        .unwrap();
    let cpu = BusMaster::connect("cpu", &bus, sched.clone()).unwrap();

    let _ = cpu.bus_write(4094, &[0; 4]);
}
