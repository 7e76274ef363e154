//! Diagnostic codes and helper functions for netlist errors and warnings.
//!
//! Codes `E101`--`E110` are design-rule failures found before any net is
//! built. `E201`--`E210` abort netlist construction or the top-level clock
//! analysis. `W201`--`W209` are structural warnings, `W301`--`W303` clocking
//! warnings, and `I001`--`I003` progress messages.

use strand_diagnostics::{Category, Diagnostic, DiagnosticCode, Label, Mark};

/// A build stage stopped after emitting its diagnostics to the sink.
///
/// Carries no payload: the reason is already in the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Aborted;

pub(crate) type Stage<T> = Result<T, Aborted>;

/// Component not supported by the chosen HDL.
pub const E101: DiagnosticCode = DiagnosticCode::new(Category::Error, 101);

/// Component requires a label but has none.
pub const E102: DiagnosticCode = DiagnosticCode::new(Category::Error, 102);

/// Label equals the HDL name of a component.
pub const E103: DiagnosticCode = DiagnosticCode::new(Category::Error, 103);

/// Label is not a valid identifier in the chosen HDL.
pub const E104: DiagnosticCode = DiagnosticCode::new(Category::Error, 104);

/// Two components share a label.
pub const E105: DiagnosticCode = DiagnosticCode::new(Category::Error, 105);

/// Tri-state driver, not supported by netlisting.
pub const E106: DiagnosticCode = DiagnosticCode::new(Category::Error, 106);

/// Sheet with an empty name.
pub const E107: DiagnosticCode = DiagnosticCode::new(Category::Error, 107);

/// Two sheets with the same name in one hierarchy.
pub const E108: DiagnosticCode = DiagnosticCode::new(Category::Error, 108);

/// A sheet instantiates itself, directly or indirectly.
pub const E109: DiagnosticCode = DiagnosticCode::new(Category::Error, 109);

/// Sub-circuit whose sheet name is not a valid identifier.
pub const E110: DiagnosticCode = DiagnosticCode::new(Category::Error, 110);

/// Two ends of different widths on one net.
pub const E201: DiagnosticCode = DiagnosticCode::new(Category::Error, 201);

/// Coinciding component ends of different widths.
pub const E202: DiagnosticCode = DiagnosticCode::new(Category::Error, 202);

/// Tunnel joins nets of different widths.
pub const E203: DiagnosticCode = DiagnosticCode::new(Category::Error, 203);

/// More than one driver on a bit.
pub const E204: DiagnosticCode = DiagnosticCode::new(Category::Error, 204);

/// Sub-circuit end without a matching pin in the sub-circuit.
pub const E205: DiagnosticCode = DiagnosticCode::new(Category::Error, 205);

/// Tracing through splitters found no driver or several drivers.
pub const E206: DiagnosticCode = DiagnosticCode::new(Category::Error, 206);

/// Internal invariant of the netlist violated.
pub const E207: DiagnosticCode = DiagnosticCode::new(Category::Error, 207);

/// Top-level sheet without any port.
pub const E208: DiagnosticCode = DiagnosticCode::new(Category::Error, 208);

/// Sheet used both with gated and with non-gated clocks.
pub const E209: DiagnosticCode = DiagnosticCode::new(Category::Error, 209);

/// Clock generator not shaped as one 1-bit end.
pub const E210: DiagnosticCode = DiagnosticCode::new(Category::Error, 210);

/// Net with no connected end, removed.
pub const W201: DiagnosticCode = DiagnosticCode::new(Category::Warning, 201);

/// Duplicate splitter, removed.
pub const W202: DiagnosticCode = DiagnosticCode::new(Category::Warning, 202);

/// One-to-one splitter with an unconnected side.
pub const W203: DiagnosticCode = DiagnosticCode::new(Category::Warning, 203);

/// Unconnected splitter fanout end.
pub const W204: DiagnosticCode = DiagnosticCode::new(Category::Warning, 204);

/// Connected splitter end that carries no bits.
pub const W205: DiagnosticCode = DiagnosticCode::new(Category::Warning, 205);

/// Splitter whose combined end is unconnected.
pub const W206: DiagnosticCode = DiagnosticCode::new(Category::Warning, 206);

/// Driven bit without any reader.
pub const W207: DiagnosticCode = DiagnosticCode::new(Category::Warning, 207);

/// Read bit without any driver.
pub const W208: DiagnosticCode = DiagnosticCode::new(Category::Warning, 208);

/// Unconnected input.
pub const W209: DiagnosticCode = DiagnosticCode::new(Category::Warning, 209);

/// Unconnected clock input.
pub const W301: DiagnosticCode = DiagnosticCode::new(Category::Warning, 301);

/// Clock input driven by logic.
pub const W302: DiagnosticCode = DiagnosticCode::new(Category::Warning, 302);

/// Clock input driven by a sheet pin that may carry a gated clock.
pub const W303: DiagnosticCode = DiagnosticCode::new(Category::Warning, 303);

/// Netlist construction started.
pub const I001: DiagnosticCode = DiagnosticCode::new(Category::Info, 1);

/// Net and bus count of a finished netlist.
pub const I002: DiagnosticCode = DiagnosticCode::new(Category::Info, 2);

/// Sheet passed all checks.
pub const I003: DiagnosticCode = DiagnosticCode::new(Category::Info, 3);

fn instance(id: u32) -> Mark {
    Mark::Instance(id)
}

/// Creates a diagnostic for a component the HDL dialect cannot express.
pub fn error_unsupported_component(circuit: &str, what: &str, dialect: &str, id: u32) -> Diagnostic {
    Diagnostic::error(E101, format!("{what} is not supported for {dialect}"))
        .in_circuit(circuit)
        .with_marks([instance(id)])
        .with_help("remove the component or replace it by a synthesizable one")
}

/// Creates a diagnostic for a component without its required label.
pub fn error_missing_label(circuit: &str, what: &str, id: u32) -> Diagnostic {
    Diagnostic::error(E102, format!("{what} has no label"))
        .in_circuit(circuit)
        .with_marks([instance(id)])
        .with_help("annotate the sheet to give every pin and instance a label")
}

/// Creates a diagnostic for a label that collides with a component name.
pub fn error_label_is_component_name(circuit: &str, label: &str, id: u32) -> Diagnostic {
    Diagnostic::error(
        E103,
        format!("label `{label}` is the name of a component or sheet"),
    )
    .in_circuit(circuit)
    .with_label(Label::primary(Mark::InstanceLabel(id), "rename this label"))
}

/// Creates a diagnostic for a label the HDL dialect rejects.
pub fn error_invalid_label(circuit: &str, label: &str, dialect: &str, id: u32) -> Diagnostic {
    Diagnostic::error(E104, format!("label `{label}` is not a valid {dialect} identifier"))
        .in_circuit(circuit)
        .with_marks([Mark::InstanceLabel(id)])
}

/// Creates a diagnostic for two components sharing a label.
pub fn error_duplicate_label(circuit: &str, label: &str, id: u32, prev: u32) -> Diagnostic {
    Diagnostic::error(E105, format!("duplicate label `{label}`"))
        .in_circuit(circuit)
        .with_label(Label::primary(Mark::InstanceLabel(id), ""))
        .with_label(Label::secondary(Mark::InstanceLabel(prev), "first used here"))
        .with_note("labels are compared without regard to case")
}

/// Creates a diagnostic for a tri-state driver.
pub fn error_tri_state(circuit: &str, what: &str, id: u32) -> Diagnostic {
    Diagnostic::error(E106, format!("{what} drives a tri-state output"))
        .in_circuit(circuit)
        .with_marks([instance(id)])
        .with_help("tri-state drivers cannot be netlisted; use a multiplexer")
}

/// Creates a diagnostic for a sheet with an empty name.
pub fn error_empty_sheet_name() -> Diagnostic {
    Diagnostic::fatal(E107, "sheet has an empty name")
}

/// Creates a diagnostic for two sheets with the same name.
pub fn error_duplicate_sheet_name(name: &str) -> Diagnostic {
    Diagnostic::fatal(E108, format!("more than one sheet is named `{name}`"))
        .in_circuit(name)
        .with_note("sheet names are compared without regard to case")
}

/// Creates a diagnostic for a sheet that instantiates itself.
pub fn error_recursive_instantiation(chain: &[&str]) -> Diagnostic {
    let name = chain.last().copied().unwrap_or_default();
    Diagnostic::fatal(E109, format!("sheet `{name}` instantiates itself"))
        .in_circuit(name)
        .with_note(format!("instantiation chain: {}", chain.join(" -> ")))
}

/// Creates a diagnostic for a sub-circuit whose sheet name is not an identifier.
pub fn error_invalid_subcircuit_name(circuit: &str, name: &str, dialect: &str, id: u32) -> Diagnostic {
    Diagnostic::error(
        E110,
        format!("sheet name `{name}` is not a valid {dialect} identifier"),
    )
    .in_circuit(circuit)
    .with_marks([instance(id)])
    .with_help("rename the sheet")
}

/// Creates a diagnostic for a net whose ends disagree on width.
pub fn error_bitwidth(circuit: &str) -> Diagnostic {
    Diagnostic::fatal(E201, "bit width conflict on net")
        .in_circuit(circuit)
        .with_help("all ends connected to a net must have the same width")
}

/// Creates a diagnostic for coinciding ends of different widths.
pub fn error_component_width(circuit: &str) -> Diagnostic {
    Diagnostic::fatal(E202, "component ends of different widths touch each other")
        .in_circuit(circuit)
}

/// Creates a diagnostic for a tunnel joining nets of different widths.
pub fn error_tunnel_width(circuit: &str, tunnel: &str) -> Diagnostic {
    Diagnostic::fatal(
        E203,
        format!("tunnel `{tunnel}` connects nets of different widths"),
    )
    .in_circuit(circuit)
}

/// Creates a diagnostic for a bit with several drivers.
pub fn error_short_circuit(circuit: &str, bit: u32) -> Diagnostic {
    Diagnostic::fatal(E204, format!("short circuit on bit {bit}"))
        .in_circuit(circuit)
        .with_note("more than one output drives the same bit")
}

/// Creates a diagnostic for a sub-circuit end with no matching pin.
pub fn error_port_not_found(circuit: &str, port: &str, sheet: &str, id: u32) -> Diagnostic {
    Diagnostic::fatal(E205, format!("sheet `{sheet}` has no pin `{port}`"))
        .in_circuit(circuit)
        .with_marks([instance(id)])
}

/// Creates a diagnostic for splitter tracing that found no unique driver.
pub fn error_ambiguous_hidden_source(circuit: &str, bit: u32, found: usize) -> Diagnostic {
    let what = if found == 0 {
        "no driver".to_string()
    } else {
        format!("{found} drivers")
    };
    Diagnostic::fatal(
        E206,
        format!("tracing bit {bit} through splitters found {what}"),
    )
    .in_circuit(circuit)
    .with_help("a bit reached through splitters needs exactly one driver")
}

/// Creates a diagnostic for a broken netlist invariant.
pub fn error_internal(circuit: &str, what: &str) -> Diagnostic {
    Diagnostic::fatal(E207, format!("internal netlist error: {what}")).in_circuit(circuit)
}

/// Creates a diagnostic for a top-level sheet without ports.
pub fn error_no_ports(circuit: &str) -> Diagnostic {
    Diagnostic::fatal(E208, "top-level sheet has no input or output")
        .in_circuit(circuit)
        .with_help("add at least one pin or board I/O component")
}

/// Creates a diagnostic for a sheet used with gated and non-gated clocks.
pub fn error_gated_and_not_gated(circuit: &str) -> Diagnostic {
    Diagnostic::fatal(
        E209,
        format!("sheet `{circuit}` is used both with a gated and with a non-gated clock"),
    )
    .in_circuit(circuit)
}

/// Creates a diagnostic for a clock generator of the wrong shape.
pub fn error_clock_shape(circuit: &str, id: u32) -> Diagnostic {
    Diagnostic::fatal(E210, "clock generator must have exactly one 1-bit end")
        .in_circuit(circuit)
        .with_marks([instance(id)])
}

/// Creates a warning for a removed empty net.
pub fn warn_empty_net(circuit: &str) -> Diagnostic {
    Diagnostic::warning(W201, "net is not connected to any component and was removed")
        .in_circuit(circuit)
}

/// Creates a warning for a removed duplicate splitter.
pub fn warn_duplicate_splitter(circuit: &str, id: u32) -> Diagnostic {
    Diagnostic::severe(W202, "duplicate splitter removed")
        .in_circuit(circuit)
        .with_marks([instance(id)])
}

/// Creates a warning for a one-to-one splitter with an unconnected side.
pub fn warn_degenerate_splitter(circuit: &str, id: u32) -> Diagnostic {
    Diagnostic::severe(W203, "splitter has an unconnected end")
        .in_circuit(circuit)
        .with_marks([instance(id)])
}

/// Creates a warning for unconnected splitter fanout ends.
pub fn warn_splitter_fanout_unconnected(circuit: &str, id: u32) -> Diagnostic {
    Diagnostic::warning(W204, "splitter has unconnected fanout ends")
        .in_circuit(circuit)
        .with_marks([instance(id)])
}

/// Creates a warning for a connected splitter end without bits.
pub fn warn_splitter_end_without_bits(circuit: &str, id: u32, end: usize) -> Diagnostic {
    Diagnostic::severe(
        W205,
        format!("splitter end {end} carries no bits but is connected"),
    )
    .in_circuit(circuit)
    .with_marks([instance(id)])
}

/// Creates a warning for a splitter with an unconnected combined end.
pub fn warn_splitter_bus_unconnected(circuit: &str, id: u32) -> Diagnostic {
    Diagnostic::severe(W206, "splitter combined end is not connected")
        .in_circuit(circuit)
        .with_marks([instance(id)])
        .with_note("the splitter is ignored")
}

/// Creates a warning for driven bits nobody reads.
pub fn warn_source_without_sink(circuit: &str, bits: &[u32]) -> Diagnostic {
    let bits: Vec<String> = bits.iter().map(|b| b.to_string()).collect();
    Diagnostic::warning(
        W207,
        format!("net is driven but not read on bit(s) {}", bits.join(", ")),
    )
    .in_circuit(circuit)
}

/// Creates a warning for a read bit without any driver.
pub fn warn_sink_without_source(circuit: &str, what: &str, bit: u32) -> Diagnostic {
    Diagnostic::severe(W208, format!("{what} reads bit {bit} of a net without driver"))
        .in_circuit(circuit)
}

/// Creates a warning for an unconnected input.
pub fn warn_unconnected_input(circuit: &str, what: &str, end: usize, severe: bool) -> Diagnostic {
    let msg = format!("input {end} of {what} is not connected");
    let diag = if severe {
        Diagnostic::severe(W209, msg)
    } else {
        Diagnostic::warning(W209, msg)
    };
    diag.in_circuit(circuit)
}

/// Creates a warning for an unconnected clock input.
pub fn warn_unconnected_clock(circuit: &str, what: &str, id: u32) -> Diagnostic {
    Diagnostic::severe(W301, format!("clock input of {what} is not connected"))
        .in_circuit(circuit)
        .with_marks([instance(id)])
}

/// Creates a warning for a clock input driven by logic.
pub fn warn_gated_clock(circuit: &str) -> Diagnostic {
    Diagnostic::severe(W302, "gated clock: clock input is driven by logic")
        .in_circuit(circuit)
        .with_help("drive clocked components from a clock generator")
}

/// Creates a warning for a clock input driven by a sheet pin.
pub fn warn_possibly_gated_clock(circuit: &str) -> Diagnostic {
    Diagnostic::severe(
        W303,
        "possible gated clock: clock input is driven by a sheet pin",
    )
    .in_circuit(circuit)
}

/// Creates the message announcing netlist construction.
pub fn info_building(circuit: &str) -> Diagnostic {
    Diagnostic::info(I001, format!("building netlist for sheet `{circuit}`")).in_circuit(circuit)
}

/// Creates the net count summary.
pub fn info_net_summary(circuit: &str, nets: usize, busses: usize) -> Diagnostic {
    Diagnostic::info(I002, format!("{nets} nets and {busses} busses")).in_circuit(circuit)
}

/// Creates the message for a sheet that passed.
pub fn info_passed(circuit: &str) -> Diagnostic {
    Diagnostic::info(I003, format!("sheet `{circuit}` passed all checks")).in_circuit(circuit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use strand_diagnostics::Severity;

    #[test]
    fn error_code_formats() {
        assert_eq!(format!("{E101}"), "E101");
        assert_eq!(format!("{E210}"), "E210");
        assert_eq!(format!("{W208}"), "W208");
        assert_eq!(format!("{W303}"), "W303");
        assert_eq!(format!("{I001}"), "I001");
    }

    #[test]
    fn short_circuit_is_fatal() {
        let d = error_short_circuit("main", 3);
        assert_eq!(d.code, E204);
        assert_eq!(d.severity, Severity::Fatal);
        assert!(d.message.contains('3'));
        assert_eq!(d.circuit.as_deref(), Some("main"));
    }

    #[test]
    fn duplicate_label_marks_both() {
        let d = error_duplicate_label("main", "a", 4, 1);
        assert_eq!(d.labels.len(), 2);
        assert_eq!(d.marks().collect::<Vec<_>>(), [Mark::InstanceLabel(4), Mark::InstanceLabel(1)]);
    }

    #[test]
    fn recursion_chain_note() {
        let d = error_recursive_instantiation(&["top", "alu", "top"]);
        assert_eq!(d.code, E109);
        assert!(d.notes[0].contains("top -> alu -> top"));
    }

    #[test]
    fn ambiguous_source_wording() {
        assert!(error_ambiguous_hidden_source("m", 0, 0).message.contains("no driver"));
        assert!(error_ambiguous_hidden_source("m", 0, 2).message.contains("2 drivers"));
    }

    #[test]
    fn unconnected_input_severity() {
        assert_eq!(
            warn_unconnected_input("m", "and gate", 0, true).severity,
            Severity::SevereWarning
        );
        assert_eq!(
            warn_unconnected_input("m", "and gate", 0, false).severity,
            Severity::Warning
        );
    }

    #[test]
    fn source_without_sink_lists_bits() {
        let d = warn_source_without_sink("m", &[0, 2]);
        assert!(d.message.ends_with("0, 2"));
    }
}
