//! # Delve World
//!
//! The chunked world core.
//!
//! This crate handles:
//! - Seeded, per-chunk random streams
//! - Procedural chunk generation and biome tiering
//! - Chunk persistence behind pluggable storage backends
//! - Edge travel between chunks with safe landings
//! - Restoring quest predicates on loaded chunks

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod biome;
pub mod chunk;
pub mod context;
pub mod events;
pub mod generation;
pub mod navigator;
pub mod rehydrate;
pub mod ring;
pub mod rng;
pub mod store;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::biome::*;
    pub use crate::chunk::*;
    pub use crate::context::*;
    pub use crate::events::*;
    pub use crate::generation::*;
    pub use crate::navigator::*;
    pub use crate::rehydrate::*;
    pub use crate::ring::*;
    pub use crate::rng::*;
    pub use crate::store::*;
}

pub use prelude::*;
