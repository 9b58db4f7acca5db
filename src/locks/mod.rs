//! Lock ownership and the transitive wait-for forest.
//!
//! # Usage
//!
//! ```ignore
//! use jstack_tree::locks::{LockGraph, reconcile_dump, render_forest};
//! use jstack_tree::styling::RenderConfig;
//!
//! reconcile_dump(&mut dump);
//! let graph = LockGraph::build(&dump);
//! for line in render_forest(graph.roots(), &RenderConfig::PLAIN) {
//!     println!("{line}");
//! }
//! ```

pub mod graph;
pub mod reconcile;
pub mod tree;

pub use graph::{Blocked, LockGraph, LockNode};
pub use reconcile::{reconcile, reconcile_dump};
pub use tree::{render_forest, render_node};
