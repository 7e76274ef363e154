//! Tunnel merging.
//!
//! Tunnels connect every net carrying the same label. Labels match exactly as
//! written, apart from surrounding whitespace; unlabelled tunnels connect
//! nothing.

use strand_diagnostics::Mark;
use strand_schematic::ComponentKind;
use tracing::debug;

use crate::builder::SheetBuild;
use crate::errors::{self, Aborted, Stage};
use crate::net::find_net;

/// Attaches each tunnel's label to the net its end touches.
pub(crate) fn attach_tunnel_labels(build: &mut SheetBuild<'_>) {
    for (_, comp) in build.components() {
        if !matches!(comp.kind, ComponentKind::Tunnel) {
            continue;
        }
        let label = comp.label.trim();
        if label.is_empty() {
            continue;
        }
        for end in &comp.ends {
            if let Some(i) = find_net(&build.nets, end.location) {
                build.nets[i].add_tunnel(label.to_string());
            }
        }
    }
}

/// Merges nets sharing a tunnel label. The first net found absorbs the rest.
///
/// Every width conflict is reported before the stage aborts.
pub(crate) fn merge_tunnels(build: &mut SheetBuild<'_>) -> Stage<()> {
    let before = build.nets.len();
    let mut failed = false;
    let mut i = 0;
    while i < build.nets.len() {
        if build.nets[i].tunnels().next().is_none() {
            i += 1;
            continue;
        }
        let mut j = i + 1;
        while j < build.nets.len() {
            if !build.nets[i].shares_tunnel(&build.nets[j]) {
                j += 1;
                continue;
            }
            let label = build.nets[j]
                .tunnels()
                .find(|t| build.nets[i].tunnels().any(|o| o == *t))
                .unwrap_or_default()
                .to_string();
            let absorbed = build.nets.remove(j);
            let absorbed_marks: Vec<Mark> = absorbed.wire_marks().collect();
            if !build.nets[i].merge(absorbed) {
                failed = true;
                let own: Vec<Mark> = build.nets[i].wire_marks().collect();
                build.sink.emit(
                    errors::error_tunnel_width(build.name, &label)
                        .with_marks(own)
                        .with_marks(absorbed_marks),
                );
            }
            // Labels brought in by the merge may match nets already passed.
            j = i + 1;
        }
        i += 1;
    }
    debug!(merged = before - build.nets.len(), "merged tunnels");
    if failed {
        Err(Aborted)
    } else {
        Ok(())
    }
}
