//! World event bus.
//!
//! The navigator publishes here; the embedding application drains the bus
//! between turns to refresh its view, log, or play transition effects.

use crossbeam_channel::{bounded, Receiver, Sender};
use serde::{Deserialize, Serialize};

use delve_common::{ChunkCoord, LocalCoord};

/// Events raised by the world core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorldEvent {
    /// The actor is about to leave the current chunk
    WillTransition {
        /// Chunk being left
        from: ChunkCoord,
        /// Chunk being entered
        to: ChunkCoord,
    },
    /// The actor arrived in a new chunk
    DidTransition {
        /// Chunk that was left
        from: ChunkCoord,
        /// Chunk now current
        to: ChunkCoord,
        /// Landing cell
        landing: LocalCoord,
        /// Biome id of the new chunk
        biome: String,
    },
    /// A chunk was generated from the seed
    ChunkGenerated {
        /// Chunk coordinate
        coord: ChunkCoord,
    },
    /// A chunk was restored from storage
    ChunkLoaded {
        /// Chunk coordinate
        coord: ChunkCoord,
    },
    /// Saving a chunk failed; play continued
    ChunkSaveFailed {
        /// Chunk coordinate
        coord: ChunkCoord,
        /// Error message
        reason: String,
    },
    /// Every persisted chunk was removed
    WorldCleared {
        /// Number of records removed
        removed: usize,
    },
}

/// Bounded event queue.
#[derive(Debug)]
pub struct EventBus {
    sender: Sender<WorldEvent>,
    receiver: Receiver<WorldEvent>,
    capacity: usize,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

impl EventBus {
    /// Creates a new event bus with the given capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity.max(1));
        Self {
            sender,
            receiver,
            capacity: capacity.max(1),
        }
    }

    /// Publishes an event. Events are dropped when the queue is full.
    pub fn publish(&self, event: WorldEvent) {
        if self.sender.try_send(event).is_err() {
            tracing::trace!("world event queue full, dropping event");
        }
    }

    /// Drains all pending events.
    pub fn drain(&self) -> Vec<WorldEvent> {
        self.receiver.try_iter().collect()
    }

    /// Returns the number of pending events.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }

    /// Returns the channel capacity.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Creates a new sender handle for publishing events.
    #[must_use]
    pub fn sender(&self) -> Sender<WorldEvent> {
        self.sender.clone()
    }
}
