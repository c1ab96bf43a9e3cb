//! Edge travel between chunks.

use delve_common::{ChunkCoord, GridSize, LocalCoord};
use tracing::{debug, info, warn};

use crate::chunk::{Chunk, TileGrid};
use crate::context::WorldContext;
use crate::events::WorldEvent;
use crate::rehydrate::rehydrate_chunk;
use crate::ring::{nearest_walkable, RingMetric};
use crate::store::ChunkSource;

/// How the landing cell of a transition was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LandingKind {
    /// The snapped cell was walkable
    Direct,
    /// Found by ring search around the snapped cell
    RingSearch,
    /// Nothing walkable nearby; placed at the grid center
    CenterFallback,
}

/// A completed chunk transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// Chunk that was left
    pub from: ChunkCoord,
    /// Chunk now current
    pub to: ChunkCoord,
    /// Where the actor now stands
    pub landing: LocalCoord,
    /// How the landing was found
    pub landing_kind: LandingKind,
    /// Biome id of the new chunk
    pub biome: String,
    /// Whether the new chunk was loaded or generated
    pub source: ChunkSource,
}

/// Result of [`WorldNavigator::attempt_move`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Target lies inside the current chunk
    Local(LocalCoord),
    /// The actor crossed into another chunk
    Transitioned(Transition),
}

/// Chunk offset implied by an out-of-bounds target; each axis is -1, 0 or +1.
#[must_use]
pub fn exit_offset(size: GridSize, nx: i32, ny: i32) -> (i32, i32) {
    let axis = |v: i32, len: u16| {
        if v < 0 {
            -1
        } else if v >= i32::from(len) {
            1
        } else {
            0
        }
    };
    (axis(nx, size.width), axis(ny, size.height))
}

/// Entry cell on the far side of a crossing: the opposite edge on crossed
/// axes, the clamped target elsewhere.
#[must_use]
pub fn snap_to_opposite_edge(size: GridSize, nx: i32, ny: i32) -> LocalCoord {
    let (dx, dy) = exit_offset(size, nx, ny);
    let last_x = i32::from(size.width) - 1;
    let last_y = i32::from(size.height) - 1;
    let x = match dx {
        -1 => last_x,
        1 => 0,
        _ => nx,
    };
    let y = match dy {
        -1 => last_y,
        1 => 0,
        _ => ny,
    };
    size.clamp(x, y)
}

/// Picks a safe cell at or near `snapped`.
#[must_use]
pub fn resolve_landing(
    grid: &TileGrid,
    snapped: LocalCoord,
    radius: u8,
    metric: RingMetric,
) -> (LocalCoord, LandingKind) {
    if grid.at(snapped).is_walkable() {
        return (snapped, LandingKind::Direct);
    }
    match nearest_walkable(grid, snapped, radius, metric) {
        Some(cell) => (cell, LandingKind::RingSearch),
        None => (grid.size().center(), LandingKind::CenterFallback),
    }
}

/// Drives one actor through the world, one active chunk at a time.
#[derive(Debug)]
pub struct WorldNavigator {
    ctx: WorldContext,
    current: Chunk,
    metric: RingMetric,
}

impl WorldNavigator {
    /// Enters the world at the origin chunk and returns the spawn cell.
    #[must_use]
    pub fn spawn(ctx: WorldContext) -> (Self, LocalCoord) {
        let (current, _) = Self::enter(&ctx, ChunkCoord::ORIGIN);
        let navigator = Self {
            ctx,
            current,
            metric: RingMetric::default(),
        };
        let position = navigator.spawn_point();
        info!(
            "Spawned in chunk {} ({}) at ({}, {})",
            ChunkCoord::ORIGIN,
            navigator.current.biome(),
            position.x,
            position.y
        );
        (navigator, position)
    }

    /// Uses a different ring metric for landing searches.
    #[must_use]
    pub fn with_metric(mut self, metric: RingMetric) -> Self {
        self.metric = metric;
        self
    }

    fn spawn_point(&self) -> LocalCoord {
        let grid = self.current.grid();
        let radius = u8::try_from(grid.size().width.max(grid.size().height)).unwrap_or(u8::MAX);
        resolve_landing(grid, grid.size().center(), radius, self.metric).0
    }

    /// Load-or-generate plus rehydration; publishes the source event.
    fn enter(ctx: &WorldContext, coord: ChunkCoord) -> (Chunk, ChunkSource) {
        let (mut chunk, source) =
            ctx.store()
                .load_or_generate(ctx.seed(), coord, ctx.generator());
        match source {
            ChunkSource::Loaded => {
                rehydrate_chunk(&mut chunk, ctx.registry());
                ctx.events().publish(WorldEvent::ChunkLoaded { coord });
            },
            ChunkSource::Generated => {
                ctx.events().publish(WorldEvent::ChunkGenerated { coord });
            },
        }
        debug!("entered chunk {coord} via {source:?}");
        (chunk, source)
    }

    /// Handles a move to `(nx, ny)` in the current chunk's local space.
    pub fn attempt_move(&mut self, nx: i32, ny: i32) -> MoveOutcome {
        let size = self.current.grid().size();
        if let Some(local) = size.local(nx, ny) {
            return MoveOutcome::Local(local);
        }

        let (dx, dy) = exit_offset(size, nx, ny);
        let from = self.current.coord();
        let to = from.offset(dx, dy);
        self.ctx
            .events()
            .publish(WorldEvent::WillTransition { from, to });

        self.save_current();

        let (chunk, source) = Self::enter(&self.ctx, to);
        self.current = chunk;

        let snapped = snap_to_opposite_edge(self.current.grid().size(), nx, ny);
        let (landing, landing_kind) = resolve_landing(
            self.current.grid(),
            snapped,
            self.ctx.config().ring_radius,
            self.metric,
        );
        let biome = self.current.biome().to_string();

        info!(
            "Travelled {from} -> {to} ({biome}), landed at ({}, {}) {landing_kind:?}",
            landing.x, landing.y
        );
        self.ctx.events().publish(WorldEvent::DidTransition {
            from,
            to,
            landing,
            biome: biome.clone(),
        });

        MoveOutcome::Transitioned(Transition {
            from,
            to,
            landing,
            landing_kind,
            biome,
            source,
        })
    }

    /// Saves the active chunk. Failures are logged and published, never raised.
    pub fn save_current(&mut self) -> bool {
        let coord = self.current.coord();
        match self.ctx.store().try_save(self.ctx.seed(), &mut self.current) {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to save chunk {coord}: {e}");
                self.ctx.events().publish(WorldEvent::ChunkSaveFailed {
                    coord,
                    reason: e.to_string(),
                });
                false
            },
        }
    }

    /// Deletes every stored chunk of this world and regenerates the current one.
    pub fn reset_world(&mut self) -> usize {
        let removed = self.ctx.store().clear(self.ctx.seed());
        let coord = self.current.coord();
        self.current = self.ctx.generator().generate(self.ctx.seed(), coord);
        info!("Reset world {}: removed {removed} chunks", self.ctx.seed());
        self.ctx
            .events()
            .publish(WorldEvent::WorldCleared { removed });
        removed
    }

    /// Active chunk.
    #[must_use]
    pub const fn chunk(&self) -> &Chunk {
        &self.current
    }

    /// Active chunk, mutable.
    pub fn chunk_mut(&mut self) -> &mut Chunk {
        &mut self.current
    }

    /// Coordinate of the active chunk.
    #[must_use]
    pub const fn coord(&self) -> ChunkCoord {
        self.current.coord()
    }

    /// Session context.
    #[must_use]
    pub const fn context(&self) -> &WorldContext {
        &self.ctx
    }
}
