//! # Delve Gameplay
//!
//! Gameplay data consumed and produced by the world core:
//! - Items, potions, equipment and the inventory
//! - Monster species, stats and tier scaling
//! - Vendor pricing
//! - Fetch quests, item predicates and the player's quest log

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod economy;
pub mod item;
pub mod monster;
pub mod quest;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::economy::*;
    pub use crate::item::*;
    pub use crate::monster::*;
    pub use crate::quest::*;
}

pub use prelude::*;
