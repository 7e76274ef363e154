//! A single circuit sheet.

use crate::component::Component;
use crate::geometry::Wire;
use crate::ids::{ComponentId, WireId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A circuit sheet: placed components and drawn wires.
///
/// Component and wire IDs come from monotonic counters and are never reused.
/// The revision stamp is bumped by every structural edit made through the
/// owning [`Schematic`](crate::Schematic).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Circuit {
    name: String,
    #[serde(default)]
    components: BTreeMap<ComponentId, Component>,
    #[serde(default)]
    wires: BTreeMap<WireId, Wire>,
    #[serde(default)]
    next_component: u32,
    #[serde(default)]
    next_wire: u32,
    #[serde(default)]
    revision: u64,
}

impl Circuit {
    /// Creates an empty sheet.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            components: BTreeMap::new(),
            wires: BTreeMap::new(),
            next_component: 0,
            next_wire: 0,
            revision: 0,
        }
    }

    /// Returns the sheet name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the revision stamp.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Returns the component with the given ID.
    pub fn component(&self, id: ComponentId) -> Option<&Component> {
        self.components.get(&id)
    }

    /// Iterates over components in ID order.
    pub fn components(&self) -> impl Iterator<Item = (ComponentId, &Component)> {
        self.components.iter().map(|(id, c)| (*id, c))
    }

    /// Returns the number of components.
    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// Returns the wire with the given ID.
    pub fn wire(&self, id: WireId) -> Option<&Wire> {
        self.wires.get(&id)
    }

    /// Iterates over wires in ID order.
    pub fn wires(&self) -> impl Iterator<Item = (WireId, &Wire)> {
        self.wires.iter().map(|(id, w)| (*id, w))
    }

    /// Returns the number of wires.
    pub fn wire_count(&self) -> usize {
        self.wires.len()
    }

    pub(crate) fn bump(&mut self) {
        self.revision += 1;
    }

    pub(crate) fn rename(&mut self, name: String) {
        self.name = name;
        self.bump();
    }

    pub(crate) fn insert_component(&mut self, component: Component) -> ComponentId {
        // Keep the counter ahead of ids read from a hand-written file.
        let floor = self
            .components
            .keys()
            .next_back()
            .map_or(0, |id| id.as_raw() + 1);
        self.next_component = self.next_component.max(floor);
        let id = ComponentId::from_raw(self.next_component);
        self.next_component += 1;
        self.components.insert(id, component);
        self.bump();
        id
    }

    pub(crate) fn take_component(&mut self, id: ComponentId) -> Option<Component> {
        let removed = self.components.remove(&id);
        if removed.is_some() {
            self.bump();
        }
        removed
    }

    pub(crate) fn component_mut(&mut self, id: ComponentId) -> Option<&mut Component> {
        self.components.get_mut(&id)
    }

    pub(crate) fn insert_wire(&mut self, wire: Wire) -> WireId {
        let floor = self
            .wires
            .keys()
            .next_back()
            .map_or(0, |id| id.as_raw() + 1);
        self.next_wire = self.next_wire.max(floor);
        let id = WireId::from_raw(self.next_wire);
        self.next_wire += 1;
        self.wires.insert(id, wire);
        self.bump();
        id
    }

    pub(crate) fn take_wire(&mut self, id: WireId) -> Option<Wire> {
        let removed = self.wires.remove(&id);
        if removed.is_some() {
            self.bump();
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Location;

    #[test]
    fn ids_are_not_reused() {
        let mut c = Circuit::new("main");
        let a = c.insert_component(Component::clock(Location::new(0, 0)));
        let b = c.insert_component(Component::clock(Location::new(10, 0)));
        c.take_component(b);
        let d = c.insert_component(Component::clock(Location::new(20, 0)));
        assert_ne!(b, d);
        assert!(a < d);
        assert_eq!(c.component_count(), 2);
    }

    #[test]
    fn edits_bump_revision() {
        let mut c = Circuit::new("main");
        assert_eq!(c.revision(), 0);
        let w = c.insert_wire(Wire::new(Location::new(0, 0), Location::new(0, 10)));
        assert_eq!(c.revision(), 1);
        c.take_wire(w);
        assert_eq!(c.revision(), 2);
        assert!(c.take_wire(w).is_none());
        assert_eq!(c.revision(), 2);
    }

    #[test]
    fn deserialized_counters_catch_up() {
        let json = r#"{
            "name": "main",
            "wires": { "4": { "from": { "x": 0, "y": 0 }, "to": { "x": 10, "y": 0 } } }
        }"#;
        let mut c: Circuit = serde_json::from_str(json).unwrap();
        let id = c.insert_wire(Wire::new(Location::new(10, 0), Location::new(20, 0)));
        assert_eq!(id.as_raw(), 5);
    }
}
