//! Box-drawing rendering of the lock forest.
//!
//! ```text
//! inventory-sync
//!   holds <0x00000007ffe01230> (Inventory), blocking 2 threads
//! ├── order-worker-1
//! └── order-worker-2
//! ```

use super::graph::LockNode;
use crate::styling::{HINT, ROOT, RenderConfig, THREAD};

const BRANCH: &str = "├── ";
const LAST_BRANCH: &str = "└── ";
const PIPE: &str = "│   ";
const SPACE: &str = "    ";

/// Render every tree, separated by an empty line.
pub fn render_forest(roots: &[LockNode], config: &RenderConfig) -> Vec<String> {
    let mut lines = Vec::new();
    for (i, root) in roots.iter().enumerate() {
        if i > 0 {
            lines.push(String::new());
        }
        lines.extend(render_tree(root, config, true));
    }
    lines
}

/// Render one node and everything below it.
pub fn render_node(node: &LockNode, config: &RenderConfig) -> Vec<String> {
    render_tree(node, config, false)
}

fn render_tree(node: &LockNode, config: &RenderConfig, is_root: bool) -> Vec<String> {
    let style = if is_root { ROOT } else { THREAD };
    let mut lines = vec![config.paint(&node.name, style)];

    if !node.children.is_empty() {
        lines.push(config.paint(&holds_line(node), HINT));
    }

    let count = node.children.len();
    for (i, child) in node.children.iter().enumerate() {
        let (first, rest) = if i + 1 == count {
            (LAST_BRANCH, SPACE)
        } else {
            (BRANCH, PIPE)
        };
        for (j, line) in render_tree(child, config, false).into_iter().enumerate() {
            let prefix = if j == 0 { first } else { rest };
            lines.push(format!("{prefix}{line}"));
        }
    }

    lines
}

fn holds_line(node: &LockNode) -> String {
    let blocked = node.blocked_count();
    let class = node
        .lock
        .short_class()
        .map(|class| format!(" ({class})"))
        .unwrap_or_default();
    let plural = if blocked == 1 { "" } else { "s" };
    format!(
        "  holds <{}>{class}, blocking {blocked} thread{plural}",
        node.lock.object_id
    )
}
