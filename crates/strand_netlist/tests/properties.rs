//! Structural properties that every validated netlist must satisfy.
//!
//! Each test builds a small design, validates it through the full store
//! pipeline and checks one property on the result.

mod common;

use common::{loc, register, register_design, validate};
use strand_diagnostics::DiagnosticSink;
use strand_netlist::errors::{E204, E209, W303};
use strand_netlist::{ConnectionRef, DrcStatus, Netlist, NetlistStore};
use strand_schematic::{CircuitId, Component, GateKind, Schematic};

/// Every bound component bit appears in the role list of its root bit, and
/// every role entry points back at a bound bit.
fn assert_net_closure(nl: &Netlist) {
    for comp in nl.components() {
        for (e, end) in comp.ends().iter().enumerate() {
            for (b, point) in end.points().iter().enumerate() {
                let Some(net) = point.net() else {
                    continue;
                };
                let conn = ConnectionRef::new(comp.id(), e as u32, b as u32);
                assert!(
                    nl.connections(net, point.bit(), end.is_output()).contains(&conn),
                    "{conn:?} missing from {net}[{}]",
                    point.bit()
                );
            }
        }
    }
    for (id, net) in nl.root_nets() {
        for bit in 0..net.width() {
            for output in [true, false] {
                for conn in nl.connections(id, bit, output) {
                    let point = nl
                        .component(conn.component)
                        .and_then(|c| c.end(conn.end as usize))
                        .and_then(|e| e.point(conn.bit));
                    let Some(point) = point else {
                        panic!("{conn:?} names no component bit");
                    };
                    assert!(point.is(id, bit));
                }
            }
        }
    }
}

fn tunnel_chain(order: &[usize]) -> (Schematic, CircuitId) {
    let mut s = Schematic::new();
    let main = s.add_circuit("main");
    s.add_component(main, Component::input_pin("a", loc(0, 0), 1));
    s.add_component(main, Component::output_pin("y", loc(0, 200), 1));
    s.add_wire(main, loc(0, 0), loc(20, 0));
    s.add_wire(main, loc(0, 100), loc(20, 100));
    s.add_wire(main, loc(0, 200), loc(20, 200));
    let tunnels = [
        ("x", loc(20, 0)),
        ("x", loc(0, 100)),
        ("y", loc(20, 100)),
        ("y", loc(20, 200)),
    ];
    for &i in order {
        let (label, at) = tunnels[i];
        s.add_component(main, Component::tunnel(label, at, 1));
    }
    (s, main)
}

#[test]
fn net_closure_holds_across_hierarchy() {
    let (s, main, reg) = register_design(false, true);
    let mut store = NetlistStore::new();
    let outcome = validate(&mut store, &s, main);
    assert!(outcome.status.is_passed(), "{:?}", outcome.diagnostics);
    for circuit in [main, reg] {
        let nl = store.netlist(circuit).expect("netlist built");
        assert_net_closure(nl);
    }
}

#[test]
fn every_bit_resolves_to_a_root() {
    let mut s = Schematic::new();
    let main = s.add_circuit("main");
    s.add_component(main, Component::input_pin("bus", loc(0, 0), 4));
    s.add_component(
        main,
        Component::splitter(loc(20, 0), &[loc(40, 0), loc(40, 10)], vec![1, 1, 2, 2]),
    );
    s.add_component(main, Component::output_pin("lo", loc(80, 0), 2));
    s.add_component(main, Component::output_pin("hi", loc(80, 10), 2));
    s.add_wire(main, loc(0, 0), loc(20, 0));
    s.add_wire(main, loc(40, 0), loc(80, 0));
    s.add_wire(main, loc(40, 10), loc(80, 10));

    let mut store = NetlistStore::new();
    let outcome = validate(&mut store, &s, main);
    assert!(outcome.status.is_passed(), "{:?}", outcome.diagnostics);
    let nl = store.netlist(main).expect("netlist built");
    for (id, net) in nl.nets() {
        for bit in 0..net.width() {
            let Some((root, root_bit)) = nl.root_bit(id, bit) else {
                panic!("bit {bit} of {id} has no root");
            };
            assert!(nl.net(root).is_some_and(|r| r.is_root()));
            assert!(root_bit < nl.net(root).map_or(0, |r| r.width()));
        }
    }
    assert_eq!(nl.number_of_busses(), 1);
    assert_net_closure(nl);
}

/// Input pin `a` wired to output pin `y`. With `second_driver`, pin `b`
/// drives the same wire through an inverter.
fn shorted(second_driver: bool) -> (Schematic, CircuitId) {
    let mut s = Schematic::new();
    let main = s.add_circuit("main");
    s.add_component(main, Component::input_pin("a", loc(0, 0), 1));
    s.add_component(main, Component::output_pin("y", loc(60, 0), 1));
    s.add_wire(main, loc(0, 0), loc(60, 0));
    if second_driver {
        s.add_component(main, Component::input_pin("b", loc(0, 20), 1));
        s.add_component(
            main,
            Component::gate(GateKind::Not, &[loc(20, 20)], loc(40, 20), 1),
        );
        s.add_wire(main, loc(0, 20), loc(20, 20));
        s.add_wire(main, loc(40, 20), loc(40, 0));
        s.add_wire(main, loc(40, 0), loc(60, 0));
    }
    (s, main)
}

#[test]
fn two_drivers_on_one_bit_are_a_short_circuit() {
    let (s, main) = shorted(true);
    let mut store = NetlistStore::new();
    let outcome = validate(&mut store, &s, main);
    assert!(outcome.status.contains(DrcStatus::ERROR));
    assert_eq!(outcome.count(E204), 1);
    assert_eq!(store.status(main), DrcStatus::ERROR);

    let (s, main) = shorted(false);
    let mut store = NetlistStore::new();
    let outcome = validate(&mut store, &s, main);
    assert!(outcome.status.is_passed(), "{:?}", outcome.diagnostics);
    assert_eq!(outcome.count(E204), 0);
    assert!(store.netlist(main).is_some_and(|nl| nl.is_valid()));
}

#[test]
fn splitter_round_trip_keeps_bit_order() {
    let mut s = Schematic::new();
    let main = s.add_circuit("main");
    let input = s.add_component(main, Component::input_pin("a", loc(0, 0), 4));
    s.add_component(main, Component::output_pin("y", loc(120, 0), 4));
    let fan_a: Vec<_> = (0..4).map(|k| loc(40, 10 * k)).collect();
    let fan_b: Vec<_> = (0..4).map(|k| loc(80, 10 * k)).collect();
    s.add_component(main, Component::splitter(loc(20, 0), &fan_a, vec![1, 2, 3, 4]));
    s.add_component(main, Component::splitter(loc(100, 0), &fan_b, vec![1, 2, 3, 4]));
    s.add_wire(main, loc(0, 0), loc(20, 0));
    s.add_wire(main, loc(100, 0), loc(120, 0));
    for (a, b) in fan_a.iter().zip(&fan_b) {
        s.add_wire(main, *a, *b);
    }

    let mut store = NetlistStore::new();
    let outcome = validate(&mut store, &s, main);
    assert!(outcome.status.is_passed(), "{:?}", outcome.diagnostics);
    let nl = store.netlist(main).expect("netlist built");
    let out = nl.output_ports().next().expect("output pin");
    let end = out.end(0).expect("pin end");
    let sink = DiagnosticSink::new();
    for bit in 0..4 {
        let point = end.point(bit).expect("bit in range");
        let net = point.net().expect("output bit connected");
        let Ok((driver, _)) = nl.hidden_source(net, point.bit(), &sink) else {
            panic!("no unique driver for bit {bit}: {:?}", sink.take_all());
        };
        assert_eq!(driver, ConnectionRef::new(input, 0, bit));
    }
}

#[test]
fn tunnel_merging_is_order_independent() {
    let mut counts = Vec::new();
    for order in [[0, 1, 2, 3], [3, 2, 1, 0], [2, 0, 3, 1]] {
        let (s, main) = tunnel_chain(&order);
        let mut store = NetlistStore::new();
        let outcome = validate(&mut store, &s, main);
        assert!(outcome.status.is_passed(), "{:?}", outcome.diagnostics);
        let nl = store.netlist(main).expect("netlist built");
        counts.push(nl.number_of_nets());
    }
    assert_eq!(counts, vec![1, 1, 1]);
}

#[test]
fn tunnel_merging_is_transitive() {
    let (s, main) = tunnel_chain(&[3, 0, 2, 1]);
    let mut store = NetlistStore::new();
    let outcome = validate(&mut store, &s, main);
    assert!(outcome.status.is_passed(), "{:?}", outcome.diagnostics);
    let nl = store.netlist(main).expect("netlist built");
    let first = nl.net_at(loc(0, 0));
    assert!(first.is_some());
    assert_eq!(first, nl.net_at(loc(0, 200)));
    let net = first.expect("net exists");
    assert_eq!(nl.connections(net, 0, true).len(), 1);
    assert_eq!(nl.connections(net, 0, false).len(), 1);
}

#[test]
fn tunnel_labels_are_case_sensitive() {
    let mut s = Schematic::new();
    let main = s.add_circuit("main");
    for (k, (pin, out, label)) in [("p", "yp", "sig"), ("q", "yq", "SIG")].into_iter().enumerate() {
        let y = 200 * k as i32;
        s.add_component(main, Component::input_pin(pin, loc(0, y), 1));
        s.add_wire(main, loc(0, y), loc(20, y));
        s.add_component(main, Component::tunnel(label, loc(20, y), 1));
        s.add_component(main, Component::tunnel(label, loc(0, y + 100), 1));
        s.add_wire(main, loc(0, y + 100), loc(20, y + 100));
        s.add_component(main, Component::output_pin(out, loc(20, y + 100), 1));
    }

    let mut store = NetlistStore::new();
    let outcome = validate(&mut store, &s, main);
    assert!(outcome.status.is_passed(), "{:?}", outcome.diagnostics);
    assert_eq!(outcome.count(E204), 0);
    let nl = store.netlist(main).expect("netlist built");
    assert_eq!(nl.number_of_nets(), 2);
    assert_eq!(nl.net_at(loc(0, 0)), nl.net_at(loc(20, 100)));
    assert_eq!(nl.net_at(loc(0, 200)), nl.net_at(loc(20, 300)));
    assert_ne!(nl.net_at(loc(0, 0)), nl.net_at(loc(0, 200)));
    assert_net_closure(nl);
}

/// `main` clocks instance `u0` of sheet `mid`, which passes its `clk` pin on
/// to register instance `l0`.
fn two_level_clock() -> (Schematic, CircuitId, CircuitId, CircuitId) {
    let mut s = Schematic::new();
    let reg = register(&mut s);
    let mid = s.add_circuit("mid");
    s.add_component(mid, Component::input_pin("d", loc(0, 0), 1));
    s.add_component(mid, Component::input_pin("clk", loc(0, 20), 1));
    s.add_component(mid, Component::output_pin("q", loc(200, 0), 1));
    s.add_wire(mid, loc(0, 0), loc(100, 0));
    s.add_wire(mid, loc(0, 20), loc(100, 20));
    s.add_wire(mid, loc(150, 0), loc(200, 0));
    s.instantiate(
        mid,
        reg,
        "l0",
        &[("d", loc(100, 0)), ("clk", loc(100, 20)), ("q", loc(150, 0))],
    )
    .expect("register ports exist");

    let main = s.add_circuit("main");
    s.set_top(main);
    s.add_component(main, Component::input_pin("d", loc(0, 0), 1));
    s.add_component(main, Component::clock(loc(0, 40)));
    s.add_component(main, Component::output_pin("q0", loc(200, 0), 1));
    s.add_wire(main, loc(0, 0), loc(100, 0));
    s.add_wire(main, loc(0, 40), loc(100, 40));
    s.add_wire(main, loc(150, 0), loc(200, 0));
    s.instantiate(
        main,
        mid,
        "u0",
        &[("d", loc(100, 0)), ("clk", loc(100, 40)), ("q", loc(150, 0))],
    )
    .expect("mid ports exist");
    (s, main, mid, reg)
}

#[test]
fn clock_id_is_the_same_at_every_level() {
    let (s, main, mid, reg) = two_level_clock();
    let mut store = NetlistStore::new();
    let outcome = validate(&mut store, &s, main);
    assert!(outcome.status.is_passed(), "{:?}", outcome.diagnostics);
    assert_eq!(store.number_of_clock_trees(), 1);
    let Some((id, _, _)) = store.clock_sources().sources().next() else {
        panic!("no clock source registered");
    };

    let levels = [
        (main, store.path(&[]), loc(0, 40)),
        (mid, store.path(&["u0"]), loc(0, 20)),
        (reg, store.path(&["u0", "l0"]), loc(0, 20)),
    ];
    for (circuit, path, at) in levels {
        let nl = store.netlist(circuit).expect("netlist built");
        let net = nl.net_at(at).expect("clock net");
        assert_eq!(nl.clock_id(&path, net, 0), Some(id), "at {}", path.display(store.interner()));
    }
}

#[test]
fn clock_ids_are_stable_across_runs() {
    let (s, main, _) = register_design(false, true);
    let mut store = NetlistStore::new();
    let first = validate(&mut store, &s, main);
    assert!(first.status.is_passed(), "{:?}", first.diagnostics);
    let before: Vec<_> = store.clock_sources().sources().collect();

    store.invalidate_all();
    let second = validate(&mut store, &s, main);
    assert!(second.status.is_passed());
    let after: Vec<_> = store.clock_sources().sources().collect();
    assert_eq!(before, after);
    assert_eq!(store.number_of_clock_trees(), 1);

    let mut fresh = NetlistStore::new();
    validate(&mut fresh, &s, main);
    let again: Vec<_> = fresh.clock_sources().sources().collect();
    assert_eq!(before, again);
}

#[test]
fn gated_clock_through_pin_is_reported_with_trace() {
    let (s, main, _) = register_design(true, false);
    let mut store = NetlistStore::new();
    let outcome = validate(&mut store, &s, main);
    assert!(outcome.status.is_passed(), "{:?}", outcome.diagnostics);
    let warnings = outcome.with_code(W303);
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].notes.len() > 1, "{:?}", warnings[0].notes);
}

#[test]
fn sheet_used_gated_and_not_gated_is_fatal() {
    let (s, main, _) = register_design(true, true);
    let mut store = NetlistStore::new();
    let outcome = validate(&mut store, &s, main);
    assert_eq!(outcome.status, DrcStatus::ERROR);
    let conflicts = outcome.with_code(E209);
    assert_eq!(conflicts.len(), 1);
    let notes = &conflicts[0].notes;
    assert!(notes.iter().any(|n| n.starts_with("gated:") && n.contains("u0")));
    assert!(notes.iter().any(|n| n.starts_with("not gated:") && n.contains("u1")));
    assert_eq!(store.number_of_clock_trees(), 0);
}

#[test]
fn revalidation_is_idempotent() {
    let (s, main, _) = register_design(false, true);
    let mut store = NetlistStore::new();
    let outcome = validate(&mut store, &s, main);
    assert!(outcome.status.is_passed(), "{:?}", outcome.diagnostics);
    let before = store.fingerprint(main);

    validate(&mut store, &s, main);
    assert_eq!(store.fingerprint(main), before);

    store.invalidate_all();
    let rebuilt = validate(&mut store, &s, main);
    assert!(rebuilt.status.is_passed());
    assert_eq!(store.fingerprint(main), before);
}
