//! Knowledge Base module - the lore of the ruined world as an associative graph.
//!
//! The knowledge graph consists of:
//! - **Tags**: Nodes representing concepts, lore fragments, enemies, items and flags
//! - **Facts**: Lore texts and Oracle hints associated with one or more tags
//! - **Associations**: Weighted edges between tags

mod fact;
mod graph;
mod tag;

pub use fact::*;
pub use graph::*;
pub use tag::*;
