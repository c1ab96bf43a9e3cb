//! # Delve Common
//!
//! Common types shared by every Delve crate:
//! - Coordinate types (chunk, local, grid size)
//! - The world seed
//! - Version information for persisted schemas
//! - Common error types
//! - Prelude for convenient imports

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod coords;
pub mod error;
pub mod ids;
pub mod version;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::coords::*;
    pub use crate::error::*;
    pub use crate::ids::*;
    pub use crate::version::*;
}

pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_chunk_coord_manhattan() {
        assert_eq!(ChunkCoord::ORIGIN.manhattan(), 0);
        assert_eq!(ChunkCoord::new(-3, 2).manhattan(), 5);
        assert_eq!(ChunkCoord::new(1, 0).offset(-2, 1), ChunkCoord::new(-1, 1));
    }

    #[test]
    fn test_chunk_coord_saturates_at_range_edges() {
        assert_eq!(ChunkCoord::new(i32::MIN, i32::MIN).manhattan(), u32::MAX);
        assert_eq!(
            ChunkCoord::new(i32::MAX, 0).offset(1, 0),
            ChunkCoord::new(i32::MAX, 0)
        );
        assert_eq!(
            ChunkCoord::new(0, i32::MIN).offset(0, -1),
            ChunkCoord::new(0, i32::MIN)
        );
    }

    #[test]
    fn test_grid_bounds() {
        let size = GridSize::new(48, 22);
        assert!(size.contains(0, 0));
        assert!(size.contains(47, 21));
        assert!(!size.contains(-1, 5));
        assert!(!size.contains(48, 5));
        assert!(!size.contains(3, 22));
        assert_eq!(size.center(), LocalCoord::new(24, 11));
        assert_eq!(size.clamp(-7, 99), LocalCoord::new(0, 21));
        assert_eq!(size.local(3, 4), Some(LocalCoord::new(3, 4)));
        assert_eq!(size.local(3, -4), None);
    }

    #[test]
    fn test_version_compatibility() {
        assert!(SchemaVersion::CHUNK_RECORD.can_read(&SchemaVersion::CHUNK_RECORD_LEGACY));
        assert!(!SchemaVersion::CHUNK_RECORD.can_read(&SchemaVersion::new(2, 0, 0)));
    }

    proptest! {
        #[test]
        fn local_index_roundtrip(x in 0u16..48, y in 0u16..22) {
            let size = GridSize::new(48, 22);
            let local = LocalCoord::new(x, y);
            prop_assert_eq!(LocalCoord::from_index(local.to_index(size), size), local);
        }
    }
}
