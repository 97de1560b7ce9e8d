// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Indented text dumps of visual trees.

use std::fmt::Write;

use stratum_core::visual::{TargetId, VisualField, VisualRef, VisualStore};

/// Renders target `id`'s visual tree as indented text, one visual per line.
///
/// Each line shows the visual id, its kind, the transformed bounds from the
/// last update pass and its flags. Animated fields are listed by name.
/// Returns `None` if the target does not exist.
#[must_use]
pub fn dump_tree(store: &VisualStore, id: TargetId) -> Option<String> {
    let target = store.target(id)?;
    let mut out = String::new();
    let _ = writeln!(
        out,
        "target {} scaling={} revision={}",
        id.0,
        target.scaling(),
        target.revision()
    );
    if let Some(root) = target.root().and_then(|r| store.visual(r)) {
        dump_visual(&mut out, root, 1);
    }
    Some(out)
}

fn dump_visual(out: &mut String, visual: VisualRef<'_>, depth: usize) {
    let b = visual.transformed_bounds();
    let _ = write!(
        out,
        "{:indent$}visual {} {} [{}, {}, {}, {}]",
        "",
        visual.id().0,
        visual.kind().name(),
        b.x0,
        b.y0,
        b.x1,
        b.y1,
        indent = depth * 2,
    );
    if visual.visible_in_frame() {
        out.push_str(" visible");
    }
    if visual.is_backface() {
        out.push_str(" backface");
    }
    if let Some(adorned) = visual.adorned_visual() {
        let _ = write!(out, " adorns={}", adorned.0);
    }
    for field in VisualField::ALL {
        if visual.is_animated(field) {
            let _ = write!(out, " ~{}", field.name());
        }
    }
    out.push('\n');
    for child in visual.children() {
        dump_visual(out, child, depth + 1);
    }
}
