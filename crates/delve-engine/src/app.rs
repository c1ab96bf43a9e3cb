//! Headless exploration driver.
//!
//! A scripted explorer walks the world: it picks a door, paths to it, steps
//! through, and picks up whatever lies along the way. This exercises
//! generation, persistence, and edge travel end to end.

use anyhow::{Context, Result};
use std::collections::VecDeque;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use delve_common::{ChunkCoord, LocalCoord, WorldSeed};
use delve_gameplay::{Inventory, Item, QuestLog};
use delve_world::{
    Border, MoveOutcome, Tile, WorldContext, WorldEvent, WorldItemKind, WorldNavigator,
};

use crate::config::{EngineConfig, StorageKind};

/// Inventory slots carried by the explorer.
const INVENTORY_CAPACITY: u32 = 24;

/// What happened during a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExploreSummary {
    /// World seed used
    pub seed: u32,
    /// Steps taken
    pub steps: u32,
    /// Chunk boundaries crossed
    pub transitions: u32,
    /// Chunks generated fresh
    pub chunks_generated: u32,
    /// Chunks restored from storage
    pub chunks_loaded: u32,
    /// Saves that failed
    pub save_failures: u32,
    /// Stored chunks removed by a reset
    pub chunks_cleared: usize,
    /// Items picked up
    pub items_collected: u32,
    /// Gold taken from chests
    pub gold: u32,
    /// Shrines prayed at
    pub blessings: u32,
    /// Fetch quests accepted
    pub quests_accepted: u32,
    /// Accepted quests the inventory satisfies at the end
    pub quests_satisfied: usize,
    /// Chunk the explorer ended in
    pub final_chunk: ChunkCoord,
}

struct Explorer {
    navigator: WorldNavigator,
    position: LocalCoord,
    route: VecDeque<(i32, i32)>,
    rng: fastrand::Rng,
    inventory: Inventory,
    quests: QuestLog,
    summary: ExploreSummary,
}

impl Explorer {
    fn step(&mut self) {
        if self.route.is_empty() {
            self.plan_route();
        }
        let (x, y) = match self.route.pop_front() {
            Some(next) => next,
            None => self.blind_exit(),
        };

        match self.navigator.attempt_move(x, y) {
            MoveOutcome::Local(cell) => {
                if self.navigator.chunk().grid().at(cell).is_walkable() {
                    self.position = cell;
                    self.interact();
                } else {
                    self.route.clear();
                }
            },
            MoveOutcome::Transitioned(t) => {
                self.summary.transitions += 1;
                self.position = t.landing;
                self.route.clear();
                self.interact();
            },
        }
        self.summary.steps += 1;
        self.drain_events();
    }

    /// Paths to a random door and queues the step through it.
    fn plan_route(&mut self) {
        let grid = self.navigator.chunk().grid();
        let doors: Vec<(LocalCoord, Border)> = Border::ALL
            .iter()
            .flat_map(|&border| {
                grid.border_cells(border)
                    .filter(|&c| grid.at(c) == Tile::Door)
                    .map(move |c| (c, border))
                    .collect::<Vec<_>>()
            })
            .collect();
        let Some(&(door, border)) = doors.get(self.rng.usize(..doors.len().max(1))) else {
            return;
        };
        let Some(path) = find_path(grid, self.position, door) else {
            debug!("no path from {:?} to door {:?}", self.position, door);
            return;
        };

        let (x, y) = (i32::from(door.x), i32::from(door.y));
        let beyond = match border {
            Border::North => (x, y - 1),
            Border::South => (x, y + 1),
            Border::West => (x - 1, y),
            Border::East => (x + 1, y),
        };
        self.route.extend(path);
        self.route.push_back(beyond);
    }

    /// An out-of-bounds target on a random side, used when no door is reachable.
    fn blind_exit(&mut self) -> (i32, i32) {
        let size = self.navigator.chunk().grid().size();
        let (x, y) = (i32::from(self.position.x), i32::from(self.position.y));
        match self.rng.u8(..4) {
            0 => (x, -1),
            1 => (x, i32::from(size.height)),
            2 => (-1, y),
            _ => (i32::from(size.width), y),
        }
    }

    fn interact(&mut self) {
        let pos = self.position;
        let origin = self.navigator.coord();
        let chunk = self.navigator.chunk_mut();

        if let Some(gold) = chunk.open_chest(pos) {
            debug!("opened chest for {gold} gold");
            self.summary.gold += gold;
        }
        if let Some(blessing) = chunk.use_shrine(pos) {
            debug!("received blessing of {blessing}");
            self.summary.blessings += 1;
        }
        if let Some(item) = chunk.item_at(pos) {
            if let WorldItemKind::Vendor {
                quest: Some(offer), ..
            } = &item.kind
            {
                if self.quests.accept(origin, offer).is_ok() {
                    info!("Accepted quest from {}: bring {}", offer.giver, offer.target.name);
                    self.summary.quests_accepted += 1;
                }
            }
        }
        if self.inventory.slot_count() < self.inventory.capacity() {
            if let Some(taken) = chunk.take_item_at(pos) {
                let item = match taken.kind {
                    WorldItemKind::Potion { effect } => Item::potion(effect),
                    WorldItemKind::Equipment { item } => Item::Equipment(item),
                    WorldItemKind::Artifact { name } => Item::Artifact { name },
                    _ => return,
                };
                debug!("picked up {}", item.name());
                match self.inventory.add(item, 1) {
                    Ok(()) => self.summary.items_collected += 1,
                    Err(e) => warn!("Dropped item: {e}"),
                }
            }
        }
    }

    fn drain_events(&mut self) {
        for event in self.navigator.context().events().drain() {
            match event {
                WorldEvent::ChunkGenerated { .. } => self.summary.chunks_generated += 1,
                WorldEvent::ChunkLoaded { .. } => self.summary.chunks_loaded += 1,
                WorldEvent::ChunkSaveFailed { .. } => self.summary.save_failures += 1,
                WorldEvent::WorldCleared { removed } => self.summary.chunks_cleared += removed,
                WorldEvent::DidTransition { to, biome, .. } => {
                    debug!("now in {to} ({biome})");
                },
                WorldEvent::WillTransition { .. } => {},
            }
        }
    }
}

/// Shortest 4-connected walkable path, excluding `from`, ending at `to`.
fn find_path(
    grid: &delve_world::TileGrid,
    from: LocalCoord,
    to: LocalCoord,
) -> Option<Vec<(i32, i32)>> {
    let size = grid.size();
    let mut previous: Vec<Option<usize>> = vec![None; size.area()];
    let start = from.to_index(size);
    let goal = to.to_index(size);
    let mut seen = vec![false; size.area()];
    seen[start] = true;
    let mut queue = VecDeque::from([from]);

    while let Some(cell) = queue.pop_front() {
        if cell == to {
            break;
        }
        let (x, y) = (i32::from(cell.x), i32::from(cell.y));
        for (dx, dy) in [(0, -1), (0, 1), (-1, 0), (1, 0)] {
            let Some(next) = size.local(x + dx, y + dy) else {
                continue;
            };
            let index = next.to_index(size);
            if !seen[index] && grid.at(next).is_walkable() {
                seen[index] = true;
                previous[index] = Some(cell.to_index(size));
                queue.push_back(next);
            }
        }
    }

    if !seen[goal] {
        return None;
    }
    let mut path = Vec::new();
    let mut index = goal;
    while index != start {
        let cell = LocalCoord::from_index(index, size);
        path.push((i32::from(cell.x), i32::from(cell.y)));
        index = previous[index]?;
    }
    path.reverse();
    Some(path)
}

fn session_path(save_dir: &std::path::Path, seed: WorldSeed) -> PathBuf {
    save_dir.join(format!("quests-{seed}.json"))
}

fn restore_quests(path: &std::path::Path, navigator: &WorldNavigator) -> QuestLog {
    let Ok(json) = fs::read_to_string(path) else {
        return QuestLog::new();
    };
    match QuestLog::restore(&json, navigator.context().registry()) {
        Ok((log, report)) => {
            info!(
                "Restored {} quests ({} predicates rehydrated, {} missing)",
                log.quests().len(),
                report.restored,
                report.missing
            );
            log
        },
        Err(e) => {
            warn!("Discarding quest log {}: {e}", path.display());
            QuestLog::new()
        },
    }
}

/// Runs the scripted explorer.
pub fn run(config: &EngineConfig) -> Result<ExploreSummary> {
    let mut config = config.clone();
    config.validate();

    let seed = config.resolve_seed();
    let save_dir = config.resolve_save_dir();
    let ctx = match config.storage {
        StorageKind::Memory => WorldContext::in_memory(seed, config.world.clone()),
        StorageKind::File => {
            WorldContext::with_save_dir(seed, config.world.clone(), save_dir.join("chunks"))
        },
    };
    info!("Exploring world {seed} for {} steps", config.walk_steps);

    let (mut navigator, position) = WorldNavigator::spawn(ctx);
    let session = session_path(&save_dir, seed);
    let mut quests = if config.storage == StorageKind::File {
        restore_quests(&session, &navigator)
    } else {
        QuestLog::new()
    };
    if config.reset_on_start {
        navigator.reset_world();
        quests = QuestLog::new();
    }

    let walk_seed = config.walk_seed.unwrap_or_else(|| u64::from(seed.raw()));
    let mut explorer = Explorer {
        navigator,
        position,
        route: VecDeque::new(),
        rng: fastrand::Rng::with_seed(walk_seed),
        inventory: Inventory::new(INVENTORY_CAPACITY),
        quests,
        summary: ExploreSummary {
            seed: seed.raw(),
            ..ExploreSummary::default()
        },
    };
    explorer.drain_events();

    for _ in 0..config.walk_steps {
        explorer.step();
    }

    explorer.navigator.save_current();
    explorer.drain_events();

    if config.storage == StorageKind::File {
        let json = explorer.quests.to_json()?;
        fs::create_dir_all(&save_dir)
            .with_context(|| format!("creating {}", save_dir.display()))?;
        fs::write(&session, json).with_context(|| format!("writing {}", session.display()))?;
    }

    let mut summary = explorer.summary;
    summary.final_chunk = explorer.navigator.coord();
    summary.quests_satisfied = explorer.quests.satisfied(&explorer.inventory).count();
    Ok(summary)
}
