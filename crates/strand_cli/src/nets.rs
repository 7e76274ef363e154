//! `strand nets`: lists the nets of one circuit.
//!
//! The hierarchy below the top circuit is validated first, then the nets of
//! the requested circuit are printed with their width, tunnels, drivers and
//! readers. Child nets of a bus are shown only with `--all`.

use serde::Serialize;
use strand_netlist::{Net, NetId, Netlist};

use crate::pipeline::{load_project, validate_project};
use crate::{GlobalArgs, NetsArgs, ReportFormat};

/// One line of the report.
#[derive(Debug, Serialize)]
struct NetReport {
    id: String,
    width: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent: Option<String>,
    tunnels: Vec<String>,
    drivers: Vec<String>,
    readers: Vec<String>,
}

/// Runs the `strand nets` command.
///
/// Returns exit code 0 once the nets were listed, 1 if the circuit has no
/// netlist because its design rule check failed.
pub fn run(args: &NetsArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let project = load_project(global, None)?;
    let circuit = match args.circuit.as_deref() {
        Some(name) => project
            .schematic
            .circuit_by_name(name)
            .ok_or_else(|| format!("unknown circuit '{name}'"))?,
        None => project.top,
    };
    let name = project.schematic.circuit(circuit).name().to_string();

    let (store, _, _) = validate_project(&project)?;
    let Some(netlist) = store.netlist(circuit).filter(|nl| nl.is_valid()) else {
        eprintln!(
            "error: circuit `{name}` has no netlist ({}); run `strand check` for details",
            store.status(circuit)
        );
        return Ok(1);
    };

    let reports: Vec<NetReport> = netlist
        .nets()
        .filter(|(_, net)| args.all || net.is_root())
        .map(|(id, net)| report(netlist, id, net))
        .collect();

    match args.format {
        ReportFormat::Text => {
            if !global.quiet {
                eprintln!(
                    "   Circuit `{}`: {} net(s), {} bus(ses)",
                    name,
                    netlist.number_of_nets(),
                    netlist.number_of_busses()
                );
            }
            for r in &reports {
                println!("{}", render_line(r));
            }
        }
        ReportFormat::Json => {
            let json = serde_json::to_string_pretty(&reports).unwrap_or_else(|_| "[]".to_string());
            println!("{json}");
        }
    }
    Ok(0)
}

fn report(netlist: &Netlist, id: NetId, net: &Net) -> NetReport {
    let mut drivers = Vec::new();
    let mut readers = Vec::new();
    if net.is_root() {
        for bit in 0..net.width() {
            for (output, out) in [(true, &mut drivers), (false, &mut readers)] {
                for conn in netlist.connections(id, bit, output) {
                    let what = netlist
                        .component(conn.component)
                        .map(|c| c.describe())
                        .unwrap_or_else(|| conn.component.to_string());
                    let entry = if net.is_bus() {
                        format!("{what}[{bit}]")
                    } else {
                        what
                    };
                    if !out.contains(&entry) {
                        out.push(entry);
                    }
                }
            }
        }
    }
    NetReport {
        id: id.to_string(),
        width: net.width(),
        parent: net.parent().map(|p| p.to_string()),
        tunnels: net.tunnels().map(str::to_string).collect(),
        drivers,
        readers,
    }
}

fn render_line(r: &NetReport) -> String {
    let mut line = format!("{:<8} width {:<3}", r.id, r.width);
    if let Some(ref parent) = r.parent {
        line.push_str(&format!(" child of {parent}"));
    }
    if !r.tunnels.is_empty() {
        line.push_str(&format!(" tunnels [{}]", r.tunnels.join(", ")));
    }
    if !r.drivers.is_empty() {
        line.push_str(&format!(" <- {}", r.drivers.join(", ")));
    }
    if !r.readers.is_empty() {
        line.push_str(&format!(" -> {}", r.readers.join(", ")));
    }
    line
}
