//! # Echo Rules
//!
//! The rule book of "Echo of the Last System": stats, enemies, combat, the
//! glitching System layer, quests and endings.
//! This crate holds no story text beyond names and never performs I/O; every
//! roll goes through an injected [`GameRng`].

pub mod combat;
pub mod config;
pub mod enemies;
pub mod endings;
pub mod entities;
pub mod error;
pub mod glitch;
pub mod mechanics;
pub mod quests;
pub mod rng;

pub use combat::*;
pub use config::*;
pub use enemies::*;
pub use endings::*;
pub use entities::*;
pub use error::*;
pub use glitch::*;
pub use mechanics::*;
pub use quests::*;
pub use rng::*;
