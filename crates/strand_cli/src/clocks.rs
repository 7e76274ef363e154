//! `strand clocks`: lists clock sources and the nets each clock reaches.

use serde::Serialize;

use crate::pipeline::{load_project, validate_project};
use crate::{ClocksArgs, GlobalArgs, ReportFormat};

#[derive(Debug, Serialize)]
struct ClockReport {
    requires_global_clock: bool,
    sources: Vec<SourceEntry>,
    marks: Vec<MarkEntry>,
}

#[derive(Debug, Serialize)]
struct SourceEntry {
    clock: String,
    sheet: String,
    component: String,
}

/// A root-net bit reached by a clock, in one instance of a sheet.
#[derive(Debug, Serialize)]
struct MarkEntry {
    sheet: String,
    path: String,
    net: String,
    bit: u32,
    clock: String,
}

/// Runs the `strand clocks` command.
///
/// Clock trees are only traced once the whole hierarchy passes, so a failing
/// design exits with 1 and lists nothing.
pub fn run(args: &ClocksArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let project = load_project(global, None)?;
    let (store, status, _) = validate_project(&project)?;
    if !status.is_passed() {
        eprintln!("error: design rule check failed ({status}); run `strand check` for details");
        return Ok(1);
    }

    let sources: Vec<SourceEntry> = store
        .clock_sources()
        .sources()
        .map(|(id, circuit, component)| SourceEntry {
            clock: id.to_string(),
            sheet: project.schematic.circuit(circuit).name().to_string(),
            component: store
                .netlist(circuit)
                .and_then(|nl| nl.component(component))
                .map(|c| c.describe())
                .unwrap_or_else(|| component.to_string()),
        })
        .collect();

    let mut marks = Vec::new();
    for (circuit, sheet) in project.schematic.circuits() {
        let Some(netlist) = store.netlist(circuit) else {
            continue;
        };
        let tree = netlist.clock_tree();
        for path in tree.paths() {
            for (net, bit, id) in tree.marks_at(path) {
                marks.push(MarkEntry {
                    sheet: sheet.name().to_string(),
                    path: path.display(store.interner()),
                    net: net.to_string(),
                    bit,
                    clock: id.to_string(),
                });
            }
        }
    }
    marks.sort_by(|a, b| (&a.path, &a.net, a.bit).cmp(&(&b.path, &b.net, b.bit)));

    let report = ClockReport {
        requires_global_clock: store.requires_global_clock(),
        sources,
        marks,
    };

    match args.format {
        ReportFormat::Text => {
            if !global.quiet {
                eprintln!(
                    "   {} clock tree(s){}",
                    store.number_of_clock_trees(),
                    if report.requires_global_clock {
                        ", global clock required"
                    } else {
                        ""
                    }
                );
            }
            for s in &report.sources {
                println!("{:<10} {} in `{}`", s.clock, s.component, s.sheet);
            }
            for m in &report.marks {
                println!("{:<10} {} {}[{}] ({})", m.clock, m.path, m.net, m.bit, m.sheet);
            }
        }
        ReportFormat::Json => {
            let json = serde_json::to_string_pretty(&report).unwrap_or_else(|_| "{}".to_string());
            println!("{json}");
        }
    }
    Ok(0)
}
