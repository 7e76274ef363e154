//! The whole design: a set of sheets, one of which is the top level.

use crate::arena::Arena;
use crate::circuit::Circuit;
use crate::component::{Component, ComponentKind};
use crate::geometry::{Direction, End, Location, Wire};
use crate::ids::{CircuitId, ComponentId, WireId};
use serde::{Deserialize, Serialize};
use std::path::Path;
use strand_diagnostics::{Mark, MarkResolver};

/// Errors raised while editing or loading a schematic.
#[derive(Debug, thiserror::Error)]
pub enum SchematicError {
    /// No sheet with this name exists.
    #[error("unknown circuit '{0}'")]
    UnknownCircuit(String),

    /// The instantiated sheet has no pin with this label.
    #[error("circuit '{circuit}' has no pin labelled '{port}'")]
    UnknownPort {
        /// The instantiated sheet.
        circuit: String,
        /// The requested pin label.
        port: String,
    },

    /// A sub-circuit reference points outside the schematic.
    #[error("component references missing circuit {0}")]
    DanglingReference(CircuitId),

    /// The schematic file could not be read.
    #[error("failed to read schematic: {0}")]
    Io(#[from] std::io::Error),

    /// The schematic file is not valid JSON for this model.
    #[error("failed to parse schematic: {0}")]
    Parse(#[from] serde_json::Error),
}

/// A design made of circuit sheets.
///
/// All edits go through the schematic so that revision stamps stay honest:
/// an edit bumps the edited sheet, and adding, removing or relabelling a pin
/// bumps every sheet (any parent's port correlation may change).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Schematic {
    circuits: Arena<CircuitId, Circuit>,
    #[serde(default)]
    top: Option<CircuitId>,
}

impl Schematic {
    /// Creates an empty schematic.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a schematic from JSON and checks sub-circuit references.
    pub fn from_json(json: &str) -> Result<Self, SchematicError> {
        let schematic: Schematic = serde_json::from_str(json)?;
        for (_, circuit) in schematic.circuits.iter() {
            for (_, comp) in circuit.components() {
                if let Some(sub) = comp.kind.subcircuit() {
                    if schematic.circuits.try_get(sub).is_none() {
                        return Err(SchematicError::DanglingReference(sub));
                    }
                }
            }
        }
        Ok(schematic)
    }

    /// Loads a schematic from a JSON file.
    pub fn load(path: &Path) -> Result<Self, SchematicError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Serialises the schematic to pretty JSON.
    pub fn to_json(&self) -> Result<String, SchematicError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Adds an empty sheet. The first sheet added becomes the top level.
    pub fn add_circuit(&mut self, name: impl Into<String>) -> CircuitId {
        let id = self.circuits.alloc(Circuit::new(name));
        if self.top.is_none() {
            self.top = Some(id);
        }
        id
    }

    /// Returns the sheet with the given ID.
    ///
    /// # Panics
    ///
    /// Panics if the ID does not belong to this schematic.
    pub fn circuit(&self, id: CircuitId) -> &Circuit {
        &self.circuits[id]
    }

    /// Returns the sheet with the given ID, if any.
    pub fn try_circuit(&self, id: CircuitId) -> Option<&Circuit> {
        self.circuits.try_get(id)
    }

    /// Iterates over all sheets.
    pub fn circuits(&self) -> impl Iterator<Item = (CircuitId, &Circuit)> {
        self.circuits.iter()
    }

    /// Finds a sheet by exact name.
    pub fn circuit_by_name(&self, name: &str) -> Option<CircuitId> {
        self.circuits
            .iter()
            .find(|(_, c)| c.name() == name)
            .map(|(id, _)| id)
    }

    /// Returns the top-level sheet.
    pub fn top(&self) -> Option<CircuitId> {
        self.top
    }

    /// Makes `id` the top-level sheet.
    pub fn set_top(&mut self, id: CircuitId) {
        self.top = Some(id);
    }

    /// Renames a sheet.
    pub fn rename_circuit(&mut self, id: CircuitId, name: impl Into<String>) {
        self.circuits[id].rename(name.into());
    }

    /// Places a component on a sheet.
    pub fn add_component(&mut self, circuit: CircuitId, component: Component) -> ComponentId {
        let is_pin = component.kind.is_pin();
        let id = self.circuits[circuit].insert_component(component);
        if is_pin {
            self.bump_others(circuit);
        }
        id
    }

    /// Removes a component from a sheet.
    pub fn remove_component(&mut self, circuit: CircuitId, id: ComponentId) -> Option<Component> {
        let removed = self.circuits[circuit].take_component(id);
        if removed.as_ref().is_some_and(|c| c.kind.is_pin()) {
            self.bump_others(circuit);
        }
        removed
    }

    /// Changes a component's label. Returns `false` if the component does not exist.
    pub fn set_label(
        &mut self,
        circuit: CircuitId,
        id: ComponentId,
        label: impl Into<String>,
    ) -> bool {
        let sheet = &mut self.circuits[circuit];
        let Some(comp) = sheet.component_mut(id) else {
            return false;
        };
        comp.label = label.into();
        let is_pin = comp.kind.is_pin();
        sheet.bump();
        if is_pin {
            self.bump_others(circuit);
        }
        true
    }

    /// Draws a wire segment on a sheet.
    pub fn add_wire(&mut self, circuit: CircuitId, from: Location, to: Location) -> WireId {
        self.circuits[circuit].insert_wire(Wire::new(from, to))
    }

    /// Removes a wire segment.
    pub fn remove_wire(&mut self, circuit: CircuitId, id: WireId) -> Option<Wire> {
        self.circuits[circuit].take_wire(id)
    }

    /// Places an instance of `child` on `parent`.
    ///
    /// `ports` lists, per instance end, the child pin label and where the end
    /// sits on the parent sheet. End directions and widths are taken from the
    /// child's pins: a child input port becomes an input end of the instance.
    pub fn instantiate(
        &mut self,
        parent: CircuitId,
        child: CircuitId,
        label: impl Into<String>,
        ports: &[(&str, Location)],
    ) -> Result<ComponentId, SchematicError> {
        let child_sheet = self
            .circuits
            .try_get(child)
            .ok_or(SchematicError::DanglingReference(child))?;
        let mut ends = Vec::with_capacity(ports.len());
        let mut names = Vec::with_capacity(ports.len());
        for (port, at) in ports {
            let pin_end = child_sheet
                .components()
                .find(|(_, c)| c.kind.is_pin() && c.label == *port)
                .and_then(|(_, c)| c.ends.first().copied())
                .ok_or_else(|| SchematicError::UnknownPort {
                    circuit: child_sheet.name().to_string(),
                    port: port.to_string(),
                })?;
            let direction = match pin_end.direction {
                Direction::Output => Direction::Input,
                Direction::Input => Direction::Output,
                Direction::InOut => Direction::InOut,
            };
            ends.push(End {
                location: *at,
                direction,
                width: pin_end.width,
            });
            names.push(port.to_string());
        }
        let anchor = ports.first().map_or(Location::new(0, 0), |(_, at)| *at);
        let comp = Component::new(
            ComponentKind::Subcircuit {
                circuit: child,
                ports: names,
            },
            label,
            anchor,
            ends,
        );
        Ok(self.add_component(parent, comp))
    }

    /// Returns the generated entity name of a component.
    ///
    /// Sub-circuit instances are named after their sheet; transparent kinds
    /// (splitters, tunnels, probes) have an empty name.
    pub fn hdl_name(&self, component: &Component) -> String {
        match &component.kind {
            ComponentKind::Subcircuit { circuit, .. } => self
                .try_circuit(*circuit)
                .map(|c| c.name().to_string())
                .unwrap_or_default(),
            kind => kind.hdl_name().unwrap_or_default().to_string(),
        }
    }

    /// Returns the distinct sheets instantiated on `circuit`, in first-use order.
    pub fn subcircuits_of(&self, circuit: CircuitId) -> Vec<CircuitId> {
        let mut subs = Vec::new();
        for (_, comp) in self.circuits[circuit].components() {
            if let Some(sub) = comp.kind.subcircuit() {
                if !subs.contains(&sub) {
                    subs.push(sub);
                }
            }
        }
        subs
    }

    fn bump_others(&mut self, except: CircuitId) {
        for (id, circuit) in self.circuits.iter_mut() {
            if id != except {
                circuit.bump();
            }
        }
    }
}

impl MarkResolver for Schematic {
    fn describe(&self, circuit: &str, mark: Mark) -> Option<String> {
        let sheet = self.circuit(self.circuit_by_name(circuit)?);
        match mark {
            Mark::Instance(raw) | Mark::InstanceLabel(raw) => {
                let comp = sheet.component(ComponentId::from_raw(raw))?;
                let mut text = comp.kind.display_name();
                if !comp.is_unlabelled() {
                    text.push_str(&format!(" `{}`", comp.label));
                }
                text.push_str(&format!(" at {}", comp.location));
                if matches!(mark, Mark::InstanceLabel(_)) {
                    text = format!("label of {text}");
                }
                Some(text)
            }
            Mark::Wire(raw) => {
                let wire = sheet.wire(WireId::from_raw(raw))?;
                Some(format!("wire {wire}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::GateKind;

    fn adder() -> (Schematic, CircuitId, CircuitId) {
        let mut s = Schematic::new();
        let top = s.add_circuit("top");
        let sub = s.add_circuit("half");
        s.add_component(sub, Component::input_pin("a", Location::new(0, 0), 1));
        s.add_component(sub, Component::output_pin("s", Location::new(50, 0), 1));
        (s, top, sub)
    }

    #[test]
    fn first_circuit_is_top() {
        let (s, top, _) = adder();
        assert_eq!(s.top(), Some(top));
        assert_eq!(s.circuit_by_name("half").map(|c| c.as_raw()), Some(1));
    }

    #[test]
    fn pin_edits_bump_every_sheet() {
        let (mut s, top, sub) = adder();
        let before_top = s.circuit(top).revision();
        let before_sub = s.circuit(sub).revision();
        s.add_component(sub, Component::input_pin("b", Location::new(0, 10), 1));
        assert_eq!(s.circuit(top).revision(), before_top + 1);
        assert_eq!(s.circuit(sub).revision(), before_sub + 1);

        let gate = s.add_component(
            sub,
            Component::gate(GateKind::Xor, &[Location::new(10, 0)], Location::new(20, 0), 1),
        );
        assert_eq!(s.circuit(top).revision(), before_top + 1);
        assert!(s.set_label(sub, gate, "x1"));
    }

    #[test]
    fn instantiate_derives_directions() {
        let (mut s, top, sub) = adder();
        let inst = s
            .instantiate(
                top,
                sub,
                "u1",
                &[("a", Location::new(100, 0)), ("s", Location::new(150, 0))],
            )
            .unwrap();
        let comp = s.circuit(top).component(inst).unwrap();
        assert_eq!(comp.ends[0].direction, Direction::Input);
        assert_eq!(comp.ends[1].direction, Direction::Output);
        assert_eq!(s.hdl_name(comp), "half");
        assert_eq!(s.subcircuits_of(top), vec![sub]);
    }

    #[test]
    fn instantiate_unknown_port() {
        let (mut s, top, sub) = adder();
        let err = s
            .instantiate(top, sub, "u1", &[("nope", Location::new(0, 0))])
            .unwrap_err();
        assert!(matches!(err, SchematicError::UnknownPort { .. }));
    }

    #[test]
    fn json_roundtrip_and_dangling_reference() {
        let (mut s, top, sub) = adder();
        s.instantiate(top, sub, "u1", &[("a", Location::new(100, 0))])
            .unwrap();
        s.add_wire(top, Location::new(0, 0), Location::new(100, 0));
        let json = s.to_json().unwrap();
        let back = Schematic::from_json(&json).unwrap();
        assert_eq!(back.circuit(top).wire_count(), 1);
        assert_eq!(back.circuit(top).component_count(), 1);

        let broken = json.replace("\"circuit\": 1", "\"circuit\": 9");
        assert!(matches!(
            Schematic::from_json(&broken),
            Err(SchematicError::DanglingReference(_))
        ));
    }

    #[test]
    fn describes_marks() {
        let (mut s, top, _) = adder();
        let w = s.add_wire(top, Location::new(0, 0), Location::new(10, 0));
        let pin = s.add_component(top, Component::input_pin("clk", Location::new(0, 0), 1));
        assert_eq!(
            s.describe("top", Mark::Wire(w.as_raw())).as_deref(),
            Some("wire (0, 0) to (10, 0)")
        );
        assert_eq!(
            s.describe("top", Mark::Instance(pin.as_raw())).as_deref(),
            Some("pin `clk` at (0, 0)")
        );
        assert!(s.describe("missing", Mark::Wire(0)).is_none());
    }

    #[test]
    fn load_from_file() {
        let (s, _, _) = adder();
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("design.json");
        std::fs::write(&path, s.to_json().unwrap()).unwrap();
        let loaded = Schematic::load(&path).unwrap();
        assert_eq!(loaded.circuits().count(), 2);
    }
}
