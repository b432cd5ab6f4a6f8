//! # Echo Narrative
//!
//! The story side of "Echo of the Last System" and the session that runs a
//! playthrough. This crate drives `echo_rules`, keeps the lore in an
//! associative knowledge graph, and lets the Oracle pick what to say by
//! spreading activation over it.
//!
//! ## Core Components
//!
//! - **session**: the action API and the single owner of game state
//! - **events**: game events and the results of each action
//! - **exploration**, **world**: what the ruins hold and how they decay
//! - **knowledge_base**: lore facts, tags and associations
//! - **recall**: spreading activation over the lore graph
//! - **lore**, **dialogue**, **voice**, **epilogue**: authored content
//! - **snapshot**: serializable session state and the three save slots
//!
//! ## Design Philosophy
//!
//! - **State-Driven**: every narrative choice reads current state and recent events
//! - **Deterministic**: one seeded generator per session; the same seed and the same actions replay exactly
//! - **Narrow API**: presentation layers call actions and read snapshots, nothing else

pub mod dialogue;
pub mod epilogue;
pub mod events;
pub mod exploration;
pub mod knowledge_base;
pub mod lore;
pub mod recall;
pub mod session;
pub mod snapshot;
pub mod voice;
pub mod world;

pub use dialogue::*;
pub use epilogue::*;
pub use events::*;
pub use exploration::*;
pub use knowledge_base::*;
pub use lore::*;
pub use recall::*;
pub use session::*;
pub use snapshot::*;
pub use voice::*;
pub use world::*;
