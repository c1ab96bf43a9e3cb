//! Biome table and distance-based tiering.

use delve_common::ChunkCoord;
use delve_gameplay::MonsterKind;

use crate::rng::SeededRng;

/// Highest biome tier.
pub const MAX_TIER: u8 = 6;

/// Chunks per tier step along Manhattan distance.
pub const TIER_BUCKET: u32 = 4;

/// A biome definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BiomeDef {
    /// Stable identifier stored in chunk records
    pub id: &'static str,
    /// Display name
    pub name: &'static str,
    /// Difficulty tier, 1..=6
    pub tier: u8,
    /// Species native to the biome
    pub monster_pool: &'static [MonsterKind],
    /// Boss species
    pub boss: MonsterKind,
}

/// Built-in biomes.
pub const DEFAULT_BIOMES: &[BiomeDef] = &[
    BiomeDef {
        id: "meadow",
        name: "Verdant Meadow",
        tier: 1,
        monster_pool: &[MonsterKind::Wolf, MonsterKind::Boar],
        boss: MonsterKind::Warden,
    },
    BiomeDef {
        id: "forest",
        name: "Whispering Forest",
        tier: 1,
        monster_pool: &[MonsterKind::Wolf, MonsterKind::Spider, MonsterKind::Bandit],
        boss: MonsterKind::Warden,
    },
    BiomeDef {
        id: "marsh",
        name: "Sunken Marsh",
        tier: 2,
        monster_pool: &[MonsterKind::Bogling, MonsterKind::Spider, MonsterKind::Ghoul],
        boss: MonsterKind::Lich,
    },
    BiomeDef {
        id: "barrows",
        name: "Old Barrows",
        tier: 2,
        monster_pool: &[MonsterKind::Skeleton, MonsterKind::Ghoul, MonsterKind::Bandit],
        boss: MonsterKind::Lich,
    },
    BiomeDef {
        id: "caverns",
        name: "Echoing Caverns",
        tier: 3,
        monster_pool: &[MonsterKind::Troll, MonsterKind::Spider, MonsterKind::Golem],
        boss: MonsterKind::Behemoth,
    },
    BiomeDef {
        id: "ruins",
        name: "Drowned Ruins",
        tier: 3,
        monster_pool: &[MonsterKind::Wraith, MonsterKind::Skeleton, MonsterKind::Ghoul],
        boss: MonsterKind::Behemoth,
    },
    BiomeDef {
        id: "badlands",
        name: "Ashen Badlands",
        tier: 4,
        monster_pool: &[MonsterKind::Salamander, MonsterKind::Golem, MonsterKind::Troll],
        boss: MonsterKind::Wyrm,
    },
    BiomeDef {
        id: "glacier",
        name: "Rime Glacier",
        tier: 5,
        monster_pool: &[MonsterKind::Frostling, MonsterKind::Wraith, MonsterKind::Golem],
        boss: MonsterKind::Wyrm,
    },
    BiomeDef {
        id: "abyss",
        name: "Hollow Abyss",
        tier: 6,
        monster_pool: &[MonsterKind::Horror, MonsterKind::Drake, MonsterKind::Wraith],
        boss: MonsterKind::Wyrm,
    },
];

/// Tier of a chunk: `clamp(1 + distance / 4, 1, 6)`.
#[must_use]
pub fn tier_for_distance(distance: u32) -> u8 {
    (1 + distance / TIER_BUCKET).clamp(1, u32::from(MAX_TIER)) as u8
}

/// Tier of the chunk at `coord`.
#[must_use]
pub fn tier_for_coord(coord: ChunkCoord) -> u8 {
    tier_for_distance(coord.manhattan())
}

/// The biome table consulted by the generator.
#[derive(Debug, Clone)]
pub struct BiomeTable {
    biomes: Vec<BiomeDef>,
}

impl Default for BiomeTable {
    fn default() -> Self {
        Self::new(DEFAULT_BIOMES.to_vec())
    }
}

impl BiomeTable {
    /// Creates a table from definitions. An empty list falls back to the
    /// built-in biomes.
    #[must_use]
    pub fn new(biomes: Vec<BiomeDef>) -> Self {
        if biomes.is_empty() {
            return Self::default();
        }
        Self { biomes }
    }

    /// All biomes.
    #[must_use]
    pub fn biomes(&self) -> &[BiomeDef] {
        &self.biomes
    }

    /// Looks up a biome by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&BiomeDef> {
        self.biomes.iter().find(|b| b.id == id)
    }

    /// Biomes eligible at `tier`: those with tier in `[tier-1, tier]`.
    #[must_use]
    pub fn candidates(&self, tier: u8) -> Vec<&BiomeDef> {
        let low = tier.saturating_sub(1);
        self.biomes
            .iter()
            .filter(|b| b.tier >= low && b.tier <= tier)
            .collect()
    }

    /// Picks a biome for `tier`.
    ///
    /// Without eligible entries, falls back to the highest tier below `tier`,
    /// then to the first biome.
    pub fn choose(&self, tier: u8, rng: &mut SeededRng) -> &BiomeDef {
        let candidates = self.candidates(tier);
        if let Some(&biome) = rng.pick(&candidates) {
            return biome;
        }
        self.biomes
            .iter()
            .filter(|b| b.tier < tier)
            .max_by_key(|b| b.tier)
            .unwrap_or(&self.biomes[0])
    }
}
