//! Placed components and the closed set of component kinds.
//!
//! Every question the netlist builder asks about a component (is it
//! supported by the target HDL, does it need a label, does it drive a
//! tri-state output, which ends are clock pins) is answered by an exhaustive
//! match on [`ComponentKind`].

use crate::geometry::{End, Location};
use crate::ids::CircuitId;
use serde::{Deserialize, Serialize};
use strand_config::HdlDialect;

/// Logic gate flavours.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateKind {
    /// AND gate.
    And,
    /// OR gate.
    Or,
    /// XOR gate.
    Xor,
    /// NAND gate.
    Nand,
    /// NOR gate.
    Nor,
    /// XNOR gate.
    Xnor,
    /// Inverter.
    Not,
    /// Non-inverting buffer.
    Buffer,
}

impl GateKind {
    fn hdl_name(self) -> &'static str {
        match self {
            GateKind::And => "AND_GATE",
            GateKind::Or => "OR_GATE",
            GateKind::Xor => "XOR_GATE",
            GateKind::Nand => "NAND_GATE",
            GateKind::Nor => "NOR_GATE",
            GateKind::Xnor => "XNOR_GATE",
            GateKind::Not => "INVERTER",
            GateKind::Buffer => "BUFFER",
        }
    }
}

/// Clocked storage elements.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SequentialKind {
    /// D flip-flop.
    DFlipFlop,
    /// T flip-flop.
    TFlipFlop,
    /// JK flip-flop.
    JkFlipFlop,
    /// SR flip-flop.
    SrFlipFlop,
    /// Multi-bit register.
    Register,
    /// Counter.
    Counter,
    /// Shift register.
    ShiftRegister,
    /// Random access memory.
    Ram,
    /// Pseudo random generator.
    Random,
}

impl SequentialKind {
    fn hdl_name(self) -> &'static str {
        match self {
            SequentialKind::DFlipFlop => "D_FLIPFLOP",
            SequentialKind::TFlipFlop => "T_FLIPFLOP",
            SequentialKind::JkFlipFlop => "J_K_FLIPFLOP",
            SequentialKind::SrFlipFlop => "S_R_FLIPFLOP",
            SequentialKind::Register => "REGISTER_FILE",
            SequentialKind::Counter => "COUNTER",
            SequentialKind::ShiftRegister => "SHIFTREGISTER",
            SequentialKind::Ram => "RAMCONTENTS",
            SequentialKind::Random => "RNG",
        }
    }
}

/// When a sequential component samples its inputs.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    /// Rising clock edge.
    #[default]
    Rising,
    /// Falling clock edge.
    Falling,
    /// Transparent while the clock is high (latch).
    High,
    /// Transparent while the clock is low (latch).
    Low,
}

impl Trigger {
    /// Returns `true` for edge triggers. Only edge-triggered components are
    /// checked for gated clocks.
    pub fn is_edge(self) -> bool {
        matches!(self, Trigger::Rising | Trigger::Falling)
    }
}

/// Board-mappable I/O devices.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IoKind {
    /// Single LED.
    Led,
    /// Three-channel LED.
    RgbLed,
    /// Push button.
    Button,
    /// Bank of DIP switches.
    DipSwitch {
        /// Number of switches.
        size: u32,
    },
    /// Seven-segment display with decimal point.
    SevenSegment,
    /// Bidirectional board port.
    PortIo {
        /// Number of pins.
        size: u32,
    },
}

impl IoKind {
    /// Returns the number of `(input, output, inout)` board bubbles the device
    /// occupies. Inputs are signals coming from the board into the design.
    pub fn bubbles(self) -> (u32, u32, u32) {
        match self {
            IoKind::Led => (0, 1, 0),
            IoKind::RgbLed => (0, 3, 0),
            IoKind::Button => (1, 0, 0),
            IoKind::DipSwitch { size } => (size, 0, 0),
            IoKind::SevenSegment => (0, 8, 0),
            IoKind::PortIo { size } => (0, 0, size),
        }
    }

    fn hdl_name(self) -> &'static str {
        match self {
            IoKind::Led => "LED",
            IoKind::RgbLed => "RGB_LED",
            IoKind::Button => "BUTTON",
            IoKind::DipSwitch { .. } => "DIPSWITCH",
            IoKind::SevenSegment => "SEVENSEGMENT",
            IoKind::PortIo { .. } => "PORTIO",
        }
    }
}

/// The kind of a placed component.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ComponentKind {
    /// A sheet port. Its single end drives the sheet (input port), is read
    /// by it (output port), or both.
    Pin,
    /// A clock generator with one 1-bit output.
    Clock,
    /// Bus splitter. End 0 is the combined end; `bit_map[b]` names the fanout
    /// end (1-based) carrying combined bit `b`, or 0 if the bit is dropped.
    Splitter {
        /// Combined bit to fanout end mapping.
        bit_map: Vec<u32>,
    },
    /// Named pseudo-connection; same-labelled tunnels are one net.
    Tunnel,
    /// Simulation probe, transparent for netlisting.
    Probe,
    /// Instance of another sheet. `ports[i]` is the label of the sheet pin
    /// behind end `i`.
    Subcircuit {
        /// The instantiated sheet.
        circuit: CircuitId,
        /// Pin label per end.
        ports: Vec<String>,
    },
    /// Logic gate.
    Gate {
        /// Gate flavour.
        gate: GateKind,
    },
    /// Tri-state buffer.
    ControlledBuffer,
    /// Constant driver.
    Constant {
        /// Driven value.
        value: u64,
    },
    /// Multiplexer.
    Multiplexer,
    /// Clocked storage element.
    Sequential {
        /// Storage flavour.
        kind: SequentialKind,
        /// Clock sensitivity.
        #[serde(default)]
        trigger: Trigger,
        /// Indices of the ends that are clock inputs.
        clock_pins: Vec<usize>,
    },
    /// Board I/O device.
    Io {
        /// The device.
        device: IoKind,
    },
    /// A component that only exists in simulation (e.g. a TTY or a logger).
    SimulationOnly {
        /// Display name.
        name: String,
    },
}

impl ComponentKind {
    /// Returns `true` if the component can be generated for `dialect`.
    pub fn hdl_supported(&self, _dialect: HdlDialect) -> bool {
        !matches!(self, ComponentKind::SimulationOnly { .. })
    }

    /// Returns `true` if the component needs a non-empty identifying label.
    pub fn requires_label(&self) -> bool {
        matches!(
            self,
            ComponentKind::Pin | ComponentKind::Subcircuit { .. } | ComponentKind::Io { .. }
        )
    }

    /// Returns `true` if the component drives a tri-state output.
    pub fn has_tri_state_driver(&self) -> bool {
        matches!(self, ComponentKind::ControlledBuffer)
    }

    /// Returns `true` if the component needs the fast global clock of the target.
    pub fn requires_global_clock(&self) -> bool {
        matches!(
            self,
            ComponentKind::Sequential {
                kind: SequentialKind::Ram,
                ..
            }
        )
    }

    /// Returns `true` if the component is checked for gated clocks.
    pub fn checks_gated_clock(&self) -> bool {
        matches!(self, ComponentKind::Sequential { trigger, .. } if trigger.is_edge())
    }

    /// Returns the end indices that are clock inputs.
    pub fn clock_pins(&self) -> &[usize] {
        match self {
            ComponentKind::Sequential { clock_pins, .. } => clock_pins,
            _ => &[],
        }
    }

    /// Returns `true` for clock generators.
    pub fn is_clock(&self) -> bool {
        matches!(self, ComponentKind::Clock)
    }

    /// Returns `true` for sheet pins.
    pub fn is_pin(&self) -> bool {
        matches!(self, ComponentKind::Pin)
    }

    /// Returns the instantiated sheet for sub-circuit components.
    pub fn subcircuit(&self) -> Option<CircuitId> {
        match self {
            ComponentKind::Subcircuit { circuit, .. } => Some(*circuit),
            _ => None,
        }
    }

    /// Returns the splitter bit map for splitters.
    pub fn bit_map(&self) -> Option<&[u32]> {
        match self {
            ComponentKind::Splitter { bit_map } => Some(bit_map),
            _ => None,
        }
    }

    /// Returns the board bubbles of I/O devices.
    pub fn io_bubbles(&self) -> Option<(u32, u32, u32)> {
        match self {
            ComponentKind::Io { device } => Some(device.bubbles()),
            _ => None,
        }
    }

    /// Returns the generated entity name of built-in components.
    ///
    /// Sub-circuits are named after their sheet, which the kind alone does not
    /// know; netlist-transparent kinds have no name.
    pub fn hdl_name(&self) -> Option<&'static str> {
        match self {
            ComponentKind::Pin => Some("PIN"),
            ComponentKind::Clock => Some("LOGISIM_CLOCK_TREE"),
            ComponentKind::Gate { gate } => Some(gate.hdl_name()),
            ComponentKind::ControlledBuffer => Some("TRISTATE_BUFFER"),
            ComponentKind::Constant { .. } => Some("CONSTANT"),
            ComponentKind::Multiplexer => Some("MULTIPLEXER"),
            ComponentKind::Sequential { kind, .. } => Some(kind.hdl_name()),
            ComponentKind::Io { device } => Some(device.hdl_name()),
            ComponentKind::SimulationOnly { .. } => Some("UNSUPPORTED"),
            ComponentKind::Splitter { .. }
            | ComponentKind::Tunnel
            | ComponentKind::Probe
            | ComponentKind::Subcircuit { .. } => None,
        }
    }

    /// Returns a short human-readable name.
    pub fn display_name(&self) -> String {
        match self {
            ComponentKind::Pin => "pin".to_string(),
            ComponentKind::Clock => "clock".to_string(),
            ComponentKind::Splitter { .. } => "splitter".to_string(),
            ComponentKind::Tunnel => "tunnel".to_string(),
            ComponentKind::Probe => "probe".to_string(),
            ComponentKind::Subcircuit { .. } => "sub-circuit".to_string(),
            ComponentKind::Gate { gate } => format!("{gate:?} gate").to_lowercase(),
            ComponentKind::ControlledBuffer => "controlled buffer".to_string(),
            ComponentKind::Constant { .. } => "constant".to_string(),
            ComponentKind::Multiplexer => "multiplexer".to_string(),
            ComponentKind::Sequential { kind, .. } => format!("{kind:?}"),
            ComponentKind::Io { device } => format!("{device:?}"),
            ComponentKind::SimulationOnly { name } => name.clone(),
        }
    }
}

/// A component placed on a sheet.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Component {
    /// What the component is.
    pub kind: ComponentKind,
    /// Free-text label; empty when unset.
    #[serde(default)]
    pub label: String,
    /// Anchor location.
    pub location: Location,
    /// Connection ends in the component's own order.
    pub ends: Vec<End>,
}

impl Component {
    /// Creates a component from its parts.
    pub fn new(
        kind: ComponentKind,
        label: impl Into<String>,
        location: Location,
        ends: Vec<End>,
    ) -> Self {
        Self {
            kind,
            label: label.into(),
            location,
            ends,
        }
    }

    /// A sheet input port driving `width` bits at `at`.
    pub fn input_pin(label: impl Into<String>, at: Location, width: u32) -> Self {
        Self::new(ComponentKind::Pin, label, at, vec![End::output(at, width)])
    }

    /// A sheet output port reading `width` bits at `at`.
    pub fn output_pin(label: impl Into<String>, at: Location, width: u32) -> Self {
        Self::new(ComponentKind::Pin, label, at, vec![End::input(at, width)])
    }

    /// A bidirectional sheet port.
    pub fn inout_pin(label: impl Into<String>, at: Location, width: u32) -> Self {
        Self::new(ComponentKind::Pin, label, at, vec![End::inout(at, width)])
    }

    /// A clock generator.
    pub fn clock(at: Location) -> Self {
        Self::new(ComponentKind::Clock, "", at, vec![End::output(at, 1)])
    }

    /// A tunnel carrying `width` bits.
    pub fn tunnel(label: impl Into<String>, at: Location, width: u32) -> Self {
        Self::new(ComponentKind::Tunnel, label, at, vec![End::inout(at, width)])
    }

    /// A probe.
    pub fn probe(at: Location, width: u32) -> Self {
        Self::new(ComponentKind::Probe, "", at, vec![End::input(at, width)])
    }

    /// A constant driver.
    pub fn constant(value: u64, at: Location, width: u32) -> Self {
        Self::new(
            ComponentKind::Constant { value },
            "",
            at,
            vec![End::output(at, width)],
        )
    }

    /// A splitter whose combined end is at `combined` and whose fanout end
    /// `i + 1` is at `fanouts[i]`. End widths follow from `bit_map`.
    pub fn splitter(combined: Location, fanouts: &[Location], bit_map: Vec<u32>) -> Self {
        let mut ends = vec![End::inout(combined, bit_map.len() as u32)];
        for (i, loc) in fanouts.iter().enumerate() {
            let width = bit_map.iter().filter(|&&e| e == i as u32 + 1).count() as u32;
            ends.push(End::inout(*loc, width));
        }
        Self::new(ComponentKind::Splitter { bit_map }, "", combined, ends)
    }

    /// A gate with the given inputs followed by its output.
    pub fn gate(gate: GateKind, inputs: &[Location], output: Location, width: u32) -> Self {
        let mut ends: Vec<End> = inputs.iter().map(|l| End::input(*l, width)).collect();
        ends.push(End::output(output, width));
        Self::new(ComponentKind::Gate { gate }, "", output, ends)
    }

    /// A tri-state buffer with data input, control input and output.
    pub fn controlled_buffer(input: Location, control: Location, output: Location) -> Self {
        Self::new(
            ComponentKind::ControlledBuffer,
            "",
            output,
            vec![
                End::input(input, 1),
                End::input(control, 1),
                End::output(output, 1),
            ],
        )
    }

    /// A multiplexer with data inputs, a select input and an output.
    pub fn multiplexer(
        inputs: &[Location],
        select: Location,
        select_width: u32,
        output: Location,
        width: u32,
    ) -> Self {
        let mut ends: Vec<End> = inputs.iter().map(|l| End::input(*l, width)).collect();
        ends.push(End::input(select, select_width));
        ends.push(End::output(output, width));
        Self::new(ComponentKind::Multiplexer, "", output, ends)
    }

    /// A D flip-flop with ends `[D, CLK, Q]`.
    pub fn d_flip_flop(
        label: impl Into<String>,
        d: Location,
        clk: Location,
        q: Location,
        trigger: Trigger,
    ) -> Self {
        Self::sequential(SequentialKind::DFlipFlop, label, d, clk, q, 1, trigger)
    }

    /// A sequential component with ends `[D, CLK, Q]` of the given data width.
    pub fn sequential(
        kind: SequentialKind,
        label: impl Into<String>,
        d: Location,
        clk: Location,
        q: Location,
        width: u32,
        trigger: Trigger,
    ) -> Self {
        Self::new(
            ComponentKind::Sequential {
                kind,
                trigger,
                clock_pins: vec![1],
            },
            label,
            clk,
            vec![End::input(d, width), End::input(clk, 1), End::output(q, width)],
        )
    }

    /// A board I/O device with a single end at `at`.
    pub fn io(device: IoKind, label: impl Into<String>, at: Location) -> Self {
        let end = match device {
            IoKind::Led => End::input(at, 1),
            IoKind::RgbLed => End::input(at, 3),
            IoKind::SevenSegment => End::input(at, 8),
            IoKind::Button => End::output(at, 1),
            IoKind::DipSwitch { size } => End::output(at, size),
            IoKind::PortIo { size } => End::inout(at, size),
        };
        Self::new(ComponentKind::Io { device }, label, at, vec![end])
    }

    /// A simulation-only component with a single input.
    pub fn simulation_only(name: impl Into<String>, at: Location, width: u32) -> Self {
        Self::new(
            ComponentKind::SimulationOnly { name: name.into() },
            "",
            at,
            vec![End::input(at, width)],
        )
    }

    /// Returns the end at `index`.
    pub fn end(&self, index: usize) -> Option<&End> {
        self.ends.get(index)
    }

    /// Returns `true` if the label is empty or whitespace.
    pub fn is_unlabelled(&self) -> bool {
        self.label.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Direction;

    #[test]
    fn splitter_end_widths_follow_bit_map() {
        let s = Component::splitter(
            Location::new(0, 0),
            &[Location::new(10, 0), Location::new(10, 10)],
            vec![1, 1, 2, 0],
        );
        assert_eq!(s.ends[0].width, 4);
        assert_eq!(s.ends[1].width, 2);
        assert_eq!(s.ends[2].width, 1);
        assert_eq!(s.kind.bit_map(), Some(&[1, 1, 2, 0][..]));
    }

    #[test]
    fn pin_directions() {
        let input = Component::input_pin("a", Location::new(0, 0), 1);
        let output = Component::output_pin("y", Location::new(0, 0), 1);
        assert_eq!(input.ends[0].direction, Direction::Output);
        assert_eq!(output.ends[0].direction, Direction::Input);
        assert!(input.kind.requires_label());
    }

    #[test]
    fn kind_predicates_are_total() {
        let ff = Component::d_flip_flop(
            "r",
            Location::new(0, 0),
            Location::new(0, 10),
            Location::new(20, 0),
            Trigger::Rising,
        );
        assert!(ff.kind.checks_gated_clock());
        assert_eq!(ff.kind.clock_pins(), &[1]);
        let latch = Component::sequential(
            SequentialKind::DFlipFlop,
            "l",
            Location::new(0, 0),
            Location::new(0, 10),
            Location::new(20, 0),
            1,
            Trigger::High,
        );
        assert!(!latch.kind.checks_gated_clock());
        assert!(ComponentKind::ControlledBuffer.has_tri_state_driver());
        assert!(!ComponentKind::SimulationOnly { name: "tty".into() }
            .hdl_supported(HdlDialect::Vhdl));
        assert!(ComponentKind::Multiplexer.hdl_supported(HdlDialect::Verilog));
    }

    #[test]
    fn io_bubbles() {
        assert_eq!(IoKind::DipSwitch { size: 4 }.bubbles(), (4, 0, 0));
        assert_eq!(IoKind::SevenSegment.bubbles(), (0, 8, 0));
        let led = Component::io(IoKind::Led, "led0", Location::new(0, 0));
        assert_eq!(led.kind.io_bubbles(), Some((0, 1, 0)));
        assert_eq!(led.ends[0].direction, Direction::Input);
    }

    #[test]
    fn hdl_names() {
        assert_eq!(
            ComponentKind::Gate { gate: GateKind::And }.hdl_name(),
            Some("AND_GATE")
        );
        assert_eq!(ComponentKind::Tunnel.hdl_name(), None);
        assert_eq!(
            ComponentKind::Gate { gate: GateKind::Nand }.display_name(),
            "nand gate"
        );
    }

    #[test]
    fn kind_serde_is_tagged() {
        let kind = ComponentKind::Splitter {
            bit_map: vec![1, 2],
        };
        let json = serde_json::to_string(&kind).unwrap();
        assert_eq!(json, r#"{"type":"splitter","bit_map":[1,2]}"#);
        let back: ComponentKind = serde_json::from_str(&json).unwrap();
        assert_eq!(back, kind);
    }
}
