//! Shared design builders for the netlist integration tests.

#![allow(dead_code)]

use strand_config::HdlDialect;
use strand_diagnostics::{Diagnostic, DiagnosticCode, DiagnosticSink};
use strand_netlist::{AnalysisOptions, DrcStatus, NetlistStore};
use strand_schematic::{CircuitId, Component, GateKind, Location, Schematic, Trigger};

/// Result of one validation run.
pub struct Outcome {
    pub status: DrcStatus,
    pub diagnostics: Vec<Diagnostic>,
}

impl Outcome {
    pub fn count(&self, code: DiagnosticCode) -> usize {
        self.diagnostics.iter().filter(|d| d.code == code).count()
    }

    pub fn with_code(&self, code: DiagnosticCode) -> Vec<&Diagnostic> {
        self.diagnostics.iter().filter(|d| d.code == code).collect()
    }
}

pub fn loc(x: i32, y: i32) -> Location {
    Location::new(x, y)
}

pub fn validate(store: &mut NetlistStore, s: &Schematic, top: CircuitId) -> Outcome {
    let sink = DiagnosticSink::new();
    let status = store
        .validate(s, top, &mut AnalysisOptions::new(HdlDialect::Vhdl), &sink)
        .expect("top sheet exists");
    Outcome {
        status,
        diagnostics: sink.take_all(),
    }
}

/// A sheet `dreg` holding one rising-edge flip-flop behind pins `d`, `clk`
/// and `q`.
pub fn register(s: &mut Schematic) -> CircuitId {
    let reg = s.add_circuit("dreg");
    s.add_component(reg, Component::input_pin("d", loc(0, 0), 1));
    s.add_component(reg, Component::input_pin("clk", loc(0, 20), 1));
    s.add_component(
        reg,
        Component::d_flip_flop("r", loc(40, 0), loc(40, 20), loc(80, 0), Trigger::Rising),
    );
    s.add_component(reg, Component::output_pin("q", loc(120, 0), 1));
    s.add_wire(reg, loc(0, 0), loc(40, 0));
    s.add_wire(reg, loc(0, 20), loc(40, 20));
    s.add_wire(reg, loc(80, 0), loc(120, 0));
    reg
}

/// Top sheet `main` with a clock generator at (0, 40) and an input pin `d`
/// at (0, 0) feeding register instance `u0`, whose output drives pin `q0`.
///
/// With `gate_u0` the clock of `u0` goes through an AND gate enabled by pin
/// `en`. With `plain_u1` a second instance `u1` is clocked straight from the
/// generator.
pub fn register_design(gate_u0: bool, plain_u1: bool) -> (Schematic, CircuitId, CircuitId) {
    let mut s = Schematic::new();
    let reg = register(&mut s);
    let main = s.add_circuit("main");
    s.add_component(main, Component::input_pin("d", loc(0, 0), 1));
    s.add_component(main, Component::clock(loc(0, 40)));
    s.add_component(main, Component::output_pin("q0", loc(200, 0), 1));
    s.add_wire(main, loc(0, 0), loc(100, 0));
    s.add_wire(main, loc(150, 0), loc(200, 0));

    let u0_clk = if gate_u0 {
        s.add_component(main, Component::input_pin("en", loc(0, 60), 1));
        s.add_component(
            main,
            Component::gate(GateKind::And, &[loc(40, 40), loc(40, 60)], loc(80, 50), 1),
        );
        s.add_wire(main, loc(0, 40), loc(40, 40));
        s.add_wire(main, loc(0, 60), loc(40, 60));
        loc(80, 50)
    } else {
        s.add_wire(main, loc(0, 40), loc(100, 40));
        loc(100, 40)
    };
    s.instantiate(
        main,
        reg,
        "u0",
        &[("d", loc(100, 0)), ("clk", u0_clk), ("q", loc(150, 0))],
    )
    .expect("register ports exist");

    if plain_u1 {
        s.add_component(main, Component::output_pin("q1", loc(200, 100), 1));
        s.instantiate(
            main,
            reg,
            "u1",
            &[("d", loc(100, 100)), ("clk", loc(100, 140)), ("q", loc(150, 100))],
        )
        .expect("register ports exist");
        s.add_wire(main, loc(100, 0), loc(100, 100));
        s.add_wire(main, loc(0, 40), loc(-20, 40));
        s.add_wire(main, loc(-20, 40), loc(-20, 140));
        s.add_wire(main, loc(-20, 140), loc(100, 140));
        s.add_wire(main, loc(150, 100), loc(200, 100));
    }
    (s, main, reg)
}
