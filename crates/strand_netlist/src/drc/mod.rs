//! Design rule checks run on a sheet before any net is built.
//!
//! Each rule looks at the placed components of one sheet and reports every
//! violation it finds; the engine runs all rules so that problems are reported
//! together. A sheet with any DRC error is not netlisted.
//!
//! Sheet-name checks span the whole hierarchy and are run separately by
//! [`check_sheet_names`].

mod e101;
mod e102;
mod e103;
mod e104;
mod e105;
mod e106;
mod e110;

pub use e101::UnsupportedComponent;
pub use e102::MissingLabel;
pub use e103::LabelIsComponentName;
pub use e104::InvalidLabel;
pub use e105::DuplicateLabel;
pub use e106::TriStateDriver;
pub use e110::InvalidSubcircuitName;

use std::collections::HashMap;

use strand_config::HdlDialect;
use strand_diagnostics::{DiagnosticCode, DiagnosticSink};
use strand_schematic::{Circuit, CircuitId, Component, ComponentId, ComponentKind, Schematic};
use tracing::debug;

use crate::errors;
use crate::label::label_key;
use crate::status::DrcStatus;

/// What a rule gets to look at.
#[derive(Clone, Copy)]
pub struct DrcContext<'a> {
    /// The whole design, for sub-circuit lookups.
    pub schematic: &'a Schematic,
    /// The sheet under check.
    pub circuit_id: CircuitId,
    /// The sheet under check.
    pub circuit: &'a Circuit,
    /// The target dialect.
    pub dialect: HdlDialect,
}

impl<'a> DrcContext<'a> {
    /// Creates a context for sheet `circuit_id`.
    pub fn new(schematic: &'a Schematic, circuit_id: CircuitId, dialect: HdlDialect) -> Self {
        Self {
            schematic,
            circuit_id,
            circuit: schematic.circuit(circuit_id),
            dialect,
        }
    }

    /// The sheet name.
    pub fn name(&self) -> &'a str {
        self.circuit.name()
    }

    /// Components that become HDL entities: everything except splitters,
    /// tunnels and probes.
    pub fn hdl_components(&self) -> impl Iterator<Item = (ComponentId, &'a Component)> + 'a {
        let circuit: &'a Circuit = self.circuit;
        circuit.components().filter(|(_, c)| {
            !matches!(
                c.kind,
                ComponentKind::Splitter { .. } | ComponentKind::Tunnel | ComponentKind::Probe
            )
        })
    }
}

/// A single design rule.
pub trait DrcRule: Send + Sync {
    /// The diagnostic code this rule reports under.
    fn code(&self) -> DiagnosticCode;

    /// Short kebab-case name.
    fn name(&self) -> &str;

    /// What the rule checks.
    fn description(&self) -> &str;

    /// Checks one sheet and emits every violation to `sink`.
    fn check(&self, ctx: &DrcContext<'_>, sink: &DiagnosticSink);

    /// Status contributed when the rule reports an error.
    fn failure(&self) -> DrcStatus {
        DrcStatus::ERROR
    }
}

/// Runs a set of design rules over a sheet.
pub struct DrcEngine {
    rules: Vec<Box<dyn DrcRule>>,
}

impl DrcEngine {
    /// Creates an engine with every built-in rule registered.
    pub fn new() -> Self {
        let mut engine = Self::empty();
        register_builtin_rules(&mut engine);
        engine
    }

    /// Creates an engine without rules.
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Adds a rule.
    pub fn register(&mut self, rule: Box<dyn DrcRule>) {
        self.rules.push(rule);
    }

    /// Number of registered rules.
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Names of the registered rules, in registration order.
    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Runs every rule on the sheet. Each rule that reported an error adds its
    /// [`DrcRule::failure`] status.
    pub fn run(&self, ctx: &DrcContext<'_>, sink: &DiagnosticSink) -> DrcStatus {
        let mut status = DrcStatus::PASSED;
        for rule in &self.rules {
            let temp_sink = DiagnosticSink::new();
            rule.check(ctx, &temp_sink);
            if temp_sink.has_errors() {
                status |= rule.failure();
            }
            for diag in temp_sink.take_all() {
                sink.emit(diag);
            }
        }
        debug!(sheet = ctx.name(), %status, "ran design rules");
        status
    }
}

impl Default for DrcEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Registers the built-in rules E101-E106 and E110.
pub fn register_builtin_rules(engine: &mut DrcEngine) {
    engine.register(Box::new(UnsupportedComponent));
    engine.register(Box::new(MissingLabel));
    engine.register(Box::new(LabelIsComponentName));
    engine.register(Box::new(InvalidLabel));
    engine.register(Box::new(DuplicateLabel));
    engine.register(Box::new(TriStateDriver));
    engine.register(Box::new(InvalidSubcircuitName));
}

/// Checks that every sheet reachable from `top` has a non-empty name and that
/// no two of them share a name (compared case-insensitively).
pub fn check_sheet_names(schematic: &Schematic, top: CircuitId, sink: &DiagnosticSink) -> DrcStatus {
    let mut reachable = vec![top];
    let mut i = 0;
    while i < reachable.len() {
        for sub in schematic.subcircuits_of(reachable[i]) {
            if !reachable.contains(&sub) {
                reachable.push(sub);
            }
        }
        i += 1;
    }

    let mut status = DrcStatus::PASSED;
    let mut seen: HashMap<String, CircuitId> = HashMap::new();
    for id in reachable {
        let name = schematic.circuit(id).name();
        if name.trim().is_empty() {
            sink.emit(errors::error_empty_sheet_name());
            status |= DrcStatus::ERROR;
            continue;
        }
        if seen.insert(label_key(name), id).is_some() {
            sink.emit(errors::error_duplicate_sheet_name(name));
            status |= DrcStatus::ERROR;
        }
    }
    status
}
