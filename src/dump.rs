// SPDX-License-Identifier: Unlicense
use std::fmt;

use crate::ast::{Arena, Id, Role};

#[derive(Debug, Clone)]
pub struct DumpOptions {
    /// Append leaf payloads (`--nometa` turns this off)
    pub show_payload: bool,
    /// Append the time each promoted node took to build
    pub show_build_time: bool,
}

impl Default for DumpOptions {
    fn default() -> Self {
        Self {
            show_payload: true,
            show_build_time: false,
        }
    }
}

/// Renders the subtree at `root` one node per line with box-drawing
/// connectors.
pub fn dump(arena: &Arena, root: Id, options: &DumpOptions) -> String {
    Tree {
        arena,
        root,
        options,
    }
    .to_string()
}

/// Displays a subtree the way [`dump`] renders it.
pub struct Tree<'a> {
    pub arena: &'a Arena,
    pub root: Id,
    pub options: &'a DumpOptions,
}

impl fmt::Display for Tree<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_node(f, self.root, "", "")
    }
}

impl Tree<'_> {
    fn write_node(&self, f: &mut fmt::Formatter<'_>, id: Id, lead: &str, indent: &str) -> fmt::Result {
        let node = &self.arena[id];

        write!(f, "{lead}{}", node.kind())?;
        if self.options.show_build_time && !node.has_role(&[Role::Terminal]) {
            if let Some(elapsed) = node.build_time {
                write!(f, " - BT: {:.3} ms", elapsed.as_secs_f64() * 1000.0)?;
            }
        }
        if self.options.show_payload {
            if let Some(value) = node.value() {
                write!(f, " - {value}")?;
            }
        }
        writeln!(f)?;

        let children = node.children();
        let last = children.len().saturating_sub(1);
        for (index, child) in children.into_iter().enumerate() {
            let (lead, rest) = if index == last {
                ("└╴", "  ")
            } else {
                ("├╴", "│ ")
            };
            self.write_node(f, child, &format!("{indent}{lead}"), &format!("{indent}{rest}"))?;
        }
        Ok(())
    }
}
