//! Procedural chunk generation.
//!
//! [`ChunkGenerator::generate`] is a pure function of the world seed and the
//! chunk coordinate: it builds a fresh [`SeededRng`] per call and consults
//! only immutable tables.

use std::sync::Arc;

use delve_common::{ChunkCoord, GridSize, LocalCoord, WorldSeed};
use delve_gameplay::{
    equipment_price_band, potion_price, scaled_for_tier, tier_prefix, Equipment, EquipmentSlot,
    FetchItemRegistry, FetchQuestOffer, Item, MonsterKind, PotionEffect, VendorListing,
    COMMON_POOL,
};
use tracing::{debug, trace};

use crate::biome::{tier_for_coord, BiomeDef, BiomeTable};
use crate::chunk::{Border, Chunk, MonsterInstance, Tile, TileGrid, WorldItem, WorldItemKind};
use crate::rng::SeededRng;

const SHRINE_BLESSINGS: &[&str] = &["Vigor", "Might", "Warding", "Fortune", "Clarity"];
const VENDOR_NAMES: &[&str] = &["Odo the Peddler", "Marisa", "Old Fenwick", "Tamsin", "Quill"];
const ARTIFACT_NAMES: &[&str] = &[
    "a cracked idol",
    "a rusted key",
    "a faded map",
    "a carved bone",
    "a glass eye",
    "a tarnished locket",
];

/// Chunk generator configuration.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Tile grid dimensions
    pub grid: GridSize,
    /// Random probes per structure placement before giving up
    pub placement_tries: u32,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            grid: GridSize::default(),
            placement_tries: 1000,
        }
    }
}

impl GeneratorConfig {
    /// Config for a grid size with default tries.
    #[must_use]
    pub fn with_grid(grid: GridSize) -> Self {
        Self {
            grid,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Room {
    x: i32,
    y: i32,
    w: i32,
    h: i32,
}

impl Room {
    const fn center(self) -> (i32, i32) {
        (self.x + self.w / 2, self.y + self.h / 2)
    }
}

/// Working state of a single generation call.
struct Layout<'a> {
    grid: TileGrid,
    rooms: Vec<Room>,
    occupied: Vec<bool>,
    rng: &'a mut SeededRng,
    tries: u32,
}

impl Layout<'_> {
    fn width(&self) -> i32 {
        i32::from(self.grid.size().width)
    }

    fn height(&self) -> i32 {
        i32::from(self.grid.size().height)
    }

    /// Clamps into the 1-cell interior margin.
    fn interior(&self, x: i32, y: i32) -> (i32, i32) {
        (
            x.clamp(1, (self.width() - 2).max(1)),
            y.clamp(1, (self.height() - 2).max(1)),
        )
    }

    fn carve(&mut self, x: i32, y: i32) {
        let (ix, iy) = self.interior(x, y);
        if (ix, iy) == (x, y) {
            self.grid.set(x, y, Tile::Floor);
        }
    }

    fn carve_rooms(&mut self) {
        let count = self.rng.between(3, 7);
        for _ in 0..count {
            let w = self.rng.between(4, 10);
            let h = self.rng.between(3, 6);
            let x = self.rng.between(1, (self.width() - w - 1).max(1));
            let y = self.rng.between(1, (self.height() - h - 1).max(1));
            let room = Room { x, y, w, h };
            for ry in y..y + h {
                for rx in x..x + w {
                    self.carve(rx, ry);
                }
            }
            self.rooms.push(room);
        }
    }

    fn room_center(&self, room: Room) -> (i32, i32) {
        let (cx, cy) = room.center();
        self.interior(cx, cy)
    }

    /// Horizontal leg first, then vertical.
    fn corridor(&mut self, from: (i32, i32), to: (i32, i32)) {
        let (x1, y1) = from;
        let (x2, y2) = to;
        for x in x1.min(x2)..=x1.max(x2) {
            self.carve(x, y1);
        }
        for y in y1.min(y2)..=y1.max(y2) {
            self.carve(x2, y);
        }
    }

    fn connect_rooms(&mut self) {
        for i in 1..self.rooms.len() {
            let a = self.room_center(self.rooms[i - 1]);
            let b = self.room_center(self.rooms[i]);
            self.corridor(a, b);
        }
    }

    fn random_walks(&mut self) {
        const STEPS: [(i32, i32); 4] = [(0, -1), (0, 1), (-1, 0), (1, 0)];
        let walks = self.rng.between(5, 10);
        for _ in 0..walks {
            let Some(&room) = self.rng.pick(&self.rooms) else {
                return;
            };
            let (mut x, mut y) = self.room_center(room);
            let steps = self.rng.between(10, 30);
            for _ in 0..steps {
                let (dx, dy) = STEPS[self.rng.int(4) as usize];
                (x, y) = self.interior(x + dx, y + dy);
                self.carve(x, y);
            }
        }
    }

    fn nearest_room_center(&self, x: i32, y: i32) -> (i32, i32) {
        self.rooms
            .iter()
            .map(|&r| self.room_center(r))
            .min_by_key(|&(cx, cy)| (cx - x).abs() + (cy - y).abs())
            .unwrap_or_else(|| self.interior(self.width() / 2, self.height() / 2))
    }

    /// Cuts 1..=2 door stubs into every border and joins them to the rooms.
    fn edge_exits(&mut self) {
        let (w, h) = (self.width(), self.height());
        for border in Border::ALL {
            let stubs = self.rng.between(1, 2);
            for _ in 0..stubs {
                let (bx, by, dx, dy) = match border {
                    Border::North => (self.rng.between(1, w - 2), 0, 0, 1),
                    Border::South => (self.rng.between(1, w - 2), h - 1, 0, -1),
                    Border::West => (0, self.rng.between(1, h - 2), 1, 0),
                    Border::East => (w - 1, self.rng.between(1, h - 2), -1, 0),
                };
                self.grid.set(bx, by, Tile::Door);
                let length = self.rng.between(4, 5);
                let mut end = self.interior(bx + dx, by + dy);
                for step in 1..=length {
                    end = self.interior(bx + dx * step, by + dy * step);
                    self.carve(end.0, end.1);
                }
                let target = self.nearest_room_center(end.0, end.1);
                self.corridor(end, target);
            }
        }
    }

    fn is_free_floor(&self, x: i32, y: i32) -> bool {
        let Some(local) = self.grid.size().local(x, y) else {
            return false;
        };
        self.grid.at(local) == Tile::Floor && !self.occupied[local.to_index(self.grid.size())]
    }

    /// Claims a random unoccupied floor cell.
    fn claim_floor(&mut self) -> Option<LocalCoord> {
        let size = self.grid.size();
        for _ in 0..self.tries {
            let x = self.rng.int(u32::from(size.width)) as i32;
            let y = self.rng.int(u32::from(size.height)) as i32;
            if self.is_free_floor(x, y) {
                let local = size.local(x, y)?;
                self.occupied[local.to_index(size)] = true;
                return Some(local);
            }
        }
        trace!("no free floor cell after {} tries", self.tries);
        None
    }
}

/// Generates chunks from the world seed.
#[derive(Debug, Clone)]
pub struct ChunkGenerator {
    config: GeneratorConfig,
    biomes: BiomeTable,
    registry: Arc<FetchItemRegistry>,
}

impl ChunkGenerator {
    /// Creates a generator.
    #[must_use]
    pub fn new(
        config: GeneratorConfig,
        biomes: BiomeTable,
        registry: Arc<FetchItemRegistry>,
    ) -> Self {
        Self {
            config,
            biomes,
            registry,
        }
    }

    /// Generator with the built-in biome table and fetch registry.
    #[must_use]
    pub fn with_grid(grid: GridSize) -> Self {
        Self::new(
            GeneratorConfig::with_grid(grid),
            BiomeTable::default(),
            Arc::new(FetchItemRegistry::with_defaults()),
        )
    }

    /// Returns the generator configuration.
    #[must_use]
    pub const fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Returns the biome table.
    #[must_use]
    pub const fn biomes(&self) -> &BiomeTable {
        &self.biomes
    }

    /// Generates the chunk at `coord`.
    #[must_use]
    pub fn generate(&self, seed: WorldSeed, coord: ChunkCoord) -> Chunk {
        let mut rng = SeededRng::for_chunk(seed, coord);
        let size = self.config.grid;
        let mut layout = Layout {
            grid: TileGrid::walls(size),
            rooms: Vec::new(),
            occupied: vec![false; size.area()],
            rng: &mut rng,
            tries: self.config.placement_tries,
        };

        layout.carve_rooms();
        layout.connect_rooms();
        layout.random_walks();
        layout.edge_exits();

        let tier = tier_for_coord(coord);
        let biome = self.biomes.choose(tier, layout.rng).clone();

        let items = self.place_structures(&mut layout, tier);
        let monsters = Self::spawn_monsters(&mut layout, &biome);

        debug!(
            "generated chunk {coord} biome={} tier={tier} monsters={} items={}",
            biome.id,
            monsters.len(),
            items.len()
        );
        Chunk::new(coord, biome.id, tier, layout.grid, monsters, items)
    }

    fn place_structures(&self, layout: &mut Layout<'_>, tier: u8) -> Vec<WorldItem> {
        let mut items = Vec::new();
        let tier_scale = u32::from(tier);

        for _ in 0..layout.rng.between(1, 3) {
            let gold = layout.rng.between(10, 30).unsigned_abs() * tier_scale;
            if let Some(pos) = layout.claim_floor() {
                items.push(WorldItem {
                    pos,
                    kind: WorldItemKind::Chest {
                        gold,
                        opened: false,
                    },
                });
            }
        }

        if layout.rng.chance(0.3) {
            if let Some(pos) = layout.claim_floor() {
                let blessing = pick_str(layout.rng, SHRINE_BLESSINGS);
                layout
                    .grid
                    .set(i32::from(pos.x), i32::from(pos.y), Tile::Special);
                items.push(WorldItem {
                    pos,
                    kind: WorldItemKind::Shrine {
                        blessing,
                        used: false,
                    },
                });
            }
        }

        if layout.rng.chance(0.7) {
            if let Some(pos) = layout.claim_floor() {
                let kind = self.vendor(layout.rng, tier);
                items.push(WorldItem { pos, kind });
            }
        }

        for _ in 0..layout.rng.between(2, 5) {
            if let Some(pos) = layout.claim_floor() {
                let name = pick_str(layout.rng, ARTIFACT_NAMES);
                items.push(WorldItem {
                    pos,
                    kind: WorldItemKind::Artifact { name },
                });
            }
        }

        for _ in 0..layout.rng.between(1, 3) {
            if let Some(pos) = layout.claim_floor() {
                let effect = roll_potion(layout.rng);
                items.push(WorldItem {
                    pos,
                    kind: WorldItemKind::Potion { effect },
                });
            }
        }

        if layout.rng.chance(0.4) {
            if let Some(pos) = layout.claim_floor() {
                let slot = EquipmentSlot::ALL[layout.rng.int(3) as usize];
                let item = roll_equipment(layout.rng, slot, tier);
                items.push(WorldItem {
                    pos,
                    kind: WorldItemKind::Equipment { item },
                });
            }
        }

        items
    }

    fn vendor(&self, rng: &mut SeededRng, tier: u8) -> WorldItemKind {
        let name = pick_str(rng, VENDOR_NAMES);
        let mut stock = Vec::new();

        for _ in 0..rng.between(1, 3) {
            let effect = roll_potion(rng);
            stock.push(VendorListing {
                item: Item::potion(effect),
                price: potion_price(effect, rng.signed_unit()),
            });
        }
        for (slot, p) in [
            (EquipmentSlot::Weapon, 0.6),
            (EquipmentSlot::Armor, 0.6),
            (EquipmentSlot::Headgear, 0.4),
        ] {
            if rng.chance(p) {
                let (lo, hi) = equipment_price_band(slot);
                let item = roll_equipment(rng, slot, tier);
                let price = rng.between(lo as i32, hi as i32).unsigned_abs();
                stock.push(VendorListing {
                    item: Item::Equipment(item),
                    price,
                });
            }
        }

        let quest = if rng.chance(0.5) {
            rng.pick(self.registry.templates())
                .map(|template| FetchQuestOffer {
                    giver: name.clone(),
                    target: template.target(),
                    quantity: 1,
                    reward_gold: rng.between(15, 35).unsigned_abs() * u32::from(tier),
                })
        } else {
            None
        };

        WorldItemKind::Vendor { name, stock, quest }
    }

    fn spawn_monsters(layout: &mut Layout<'_>, biome: &BiomeDef) -> Vec<MonsterInstance> {
        let mut pool: Vec<MonsterKind> = biome.monster_pool.to_vec();
        for kind in COMMON_POOL {
            if !pool.contains(&kind) {
                pool.push(kind);
            }
        }

        let mut monsters = Vec::new();
        for _ in 0..layout.rng.between(8, 15) {
            let Some(&kind) = layout.rng.pick(&pool) else {
                break;
            };
            let roll = layout.rng.next_f64();
            let tier = if roll < 0.70 {
                1
            } else if roll < 0.95 {
                2
            } else {
                3
            };
            if let Some(pos) = layout.claim_floor() {
                monsters.push(spawn(kind, tier, pos, false));
            }
        }

        if layout.rng.chance(0.1) {
            if let Some(pos) = layout.claim_floor() {
                monsters.push(spawn(biome.boss, 3, pos, true));
            }
        }
        monsters
    }
}

fn spawn(kind: MonsterKind, tier: u8, pos: LocalCoord, boss: bool) -> MonsterInstance {
    let (stats, ability) = scaled_for_tier(kind, tier);
    let name = if boss {
        kind.display_name().to_string()
    } else {
        format!("{}{}", tier_prefix(tier), kind.display_name())
    };
    MonsterInstance {
        kind,
        name,
        tier,
        stats,
        pos,
        ability,
        boss,
        alive: true,
    }
}

fn pick_str(rng: &mut SeededRng, names: &[&str]) -> String {
    rng.pick(names).map(ToString::to_string).unwrap_or_default()
}

fn roll_potion(rng: &mut SeededRng) -> PotionEffect {
    PotionEffect::ALL[rng.int(PotionEffect::ALL.len() as u32) as usize]
}

fn roll_equipment(rng: &mut SeededRng, slot: EquipmentSlot, tier: u8) -> Equipment {
    let (lo, hi) = slot.bonus_range();
    Equipment {
        slot,
        name: pick_str(rng, slot.base_names()),
        bonus: rng.between(lo, hi) + i32::from(tier) - 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use delve_gameplay::{Inventory, ItemPredicate};
    use proptest::prelude::*;
    use std::collections::VecDeque;

    fn generator() -> ChunkGenerator {
        ChunkGenerator::with_grid(GridSize::default())
    }

    fn doors(grid: &TileGrid) -> Vec<LocalCoord> {
        Border::ALL
            .iter()
            .flat_map(|&b| grid.border_cells(b).collect::<Vec<_>>())
            .filter(|&c| grid.at(c) == Tile::Door)
            .collect()
    }

    fn reachable_from(grid: &TileGrid, start: LocalCoord) -> Vec<bool> {
        let size = grid.size();
        let mut seen = vec![false; size.area()];
        let mut queue = VecDeque::from([start]);
        seen[start.to_index(size)] = true;
        while let Some(cell) = queue.pop_front() {
            let (x, y) = (i32::from(cell.x), i32::from(cell.y));
            for (dx, dy) in [(0, -1), (0, 1), (-1, 0), (1, 0)] {
                if let Some(next) = size.local(x + dx, y + dy) {
                    let index = next.to_index(size);
                    if !seen[index] && grid.at(next).is_walkable() {
                        seen[index] = true;
                        queue.push_back(next);
                    }
                }
            }
        }
        seen
    }

    #[test]
    fn test_same_seed_same_chunk() {
        let generator = generator();
        let seed = WorldSeed::new(12345);
        let a = generator.generate(seed, ChunkCoord::ORIGIN);
        let b = generator.generate(seed, ChunkCoord::ORIGIN);
        assert_eq!(a.monsters().len(), b.monsters().len());
        assert_eq!(a.biome(), b.biome());
        assert_eq!(a, b);
    }

    #[test]
    fn test_generation_independent_of_order() {
        let generator = generator();
        let seed = WorldSeed::new(99);
        let first = generator.generate(seed, ChunkCoord::new(2, -1));
        let _ = generator.generate(seed, ChunkCoord::new(5, 5));
        let _ = generator.generate(WorldSeed::new(100), ChunkCoord::new(2, -1));
        assert_eq!(generator.generate(seed, ChunkCoord::new(2, -1)), first);
    }

    #[test]
    fn test_fresh_chunk_is_clean() {
        let chunk = generator().generate(WorldSeed::new(1), ChunkCoord::ORIGIN);
        assert!(!chunk.is_dirty());
        assert_eq!(chunk.tier(), 1);
    }

    #[test]
    fn test_entities_on_distinct_walkable_cells() {
        let chunk = generator().generate(WorldSeed::new(4242), ChunkCoord::new(-3, 7));
        let mut cells: Vec<LocalCoord> = chunk.items().iter().map(|i| i.pos).collect();
        cells.extend(chunk.monsters().iter().map(|m| m.pos));
        for cell in &cells {
            assert!(chunk.grid().at(*cell).is_walkable());
        }
        let total = cells.len();
        cells.sort_by_key(|c| (c.y, c.x));
        cells.dedup();
        assert_eq!(cells.len(), total);
    }

    #[test]
    fn test_shrine_marks_special_tile() {
        let generator = generator();
        let seed = WorldSeed::new(777);
        for x in 0..40 {
            let chunk = generator.generate(seed, ChunkCoord::new(x, 0));
            for item in chunk.items() {
                if matches!(item.kind, WorldItemKind::Shrine { .. }) {
                    assert_eq!(chunk.grid().at(item.pos), Tile::Special);
                }
            }
        }
    }

    #[test]
    fn test_vendor_quests_are_live() {
        let generator = generator();
        let seed = WorldSeed::new(31337);
        let mut offers = 0;
        for x in 0..40 {
            let mut chunk = generator.generate(seed, ChunkCoord::new(x, x));
            for offer in chunk.vendor_offers_mut() {
                assert!(offer.target.is_live());
                assert_eq!(offer.quantity, 1);
                offers += 1;
            }
        }
        assert!(offers > 0);
    }

    #[test]
    fn test_empty_registry_means_no_quests() {
        let generator = ChunkGenerator::new(
            GeneratorConfig::default(),
            BiomeTable::default(),
            Arc::new(FetchItemRegistry::new()),
        );
        for x in 0..20 {
            let mut chunk = generator.generate(WorldSeed::new(5), ChunkCoord::new(x, 0));
            assert_eq!(chunk.vendor_offers_mut().count(), 0);
        }
    }

    #[test]
    fn test_healing_quest_satisfiable() {
        let mut registry = FetchItemRegistry::new();
        registry.register(
            "a healing potion",
            ItemPredicate::PotionEffectIs {
                effect: PotionEffect::Heal,
            },
        );
        let generator = ChunkGenerator::new(
            GeneratorConfig::default(),
            BiomeTable::default(),
            Arc::new(registry),
        );
        let mut inventory = Inventory::new(8);
        inventory
            .add(Item::potion(PotionEffect::Heal), 1)
            .expect("add");
        let offer = (0..100)
            .find_map(|x| {
                let mut chunk = generator.generate(WorldSeed::new(8), ChunkCoord::new(x, 0));
                let offer = chunk.vendor_offers_mut().next().cloned();
                offer
            })
            .expect("some vendor offers a quest");
        assert!(offer.is_satisfied_by(&inventory));
    }

    #[test]
    fn test_far_chunks_use_high_tier_biomes() {
        let generator = generator();
        let chunk = generator.generate(WorldSeed::new(3), ChunkCoord::new(30, -30));
        assert_eq!(chunk.tier(), 6);
        let biome = generator.biomes().get(chunk.biome()).expect("known biome");
        assert!(biome.tier >= 5);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn every_border_has_an_opening(seed in any::<u32>(), cx in -50i32..50, cy in -50i32..50) {
            let chunk = generator().generate(WorldSeed::new(seed), ChunkCoord::new(cx, cy));
            for border in Border::ALL {
                prop_assert!(chunk.grid().border_has_opening(border));
            }
        }

        #[test]
        fn doors_are_connected(seed in any::<u32>(), cx in -10i32..10, cy in -10i32..10) {
            let chunk = generator().generate(WorldSeed::new(seed), ChunkCoord::new(cx, cy));
            let grid = chunk.grid();
            let doors = doors(grid);
            prop_assert!(doors.len() >= 4);
            let seen = reachable_from(grid, doors[0]);
            for door in &doors {
                prop_assert!(seen[door.to_index(grid.size())]);
            }
        }

        #[test]
        fn generation_is_pure(seed in any::<u32>(), cx in -100i32..100, cy in -100i32..100) {
            let generator = generator();
            let coord = ChunkCoord::new(cx, cy);
            prop_assert_eq!(
                generator.generate(WorldSeed::new(seed), coord),
                generator.generate(WorldSeed::new(seed), coord)
            );
        }

        #[test]
        fn monster_tiers_in_range(seed in any::<u32>()) {
            let chunk = generator().generate(WorldSeed::new(seed), ChunkCoord::ORIGIN);
            prop_assert!(chunk.monsters().len() <= 16);
            for monster in chunk.monsters() {
                prop_assert!((1..=3).contains(&monster.tier));
                prop_assert!(!monster.boss || monster.tier == 3);
            }
        }
    }
}
