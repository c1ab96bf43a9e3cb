//! Chunk data structure and its persisted projection.

use delve_common::{ChunkCoord, GridSize, LocalCoord, SchemaVersion, WorldError, WorldResult};
use delve_gameplay::{
    Equipment, FetchQuestOffer, MonsterKind, MonsterStats, PotionEffect, SpecialAbility,
    VendorListing,
};
use serde::{Deserialize, Serialize};

/// A single map cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Tile {
    /// Impassable rock
    #[default]
    Wall,
    /// Open ground
    Floor,
    /// Exit doorway on a chunk border
    Door,
    /// Marked ground under a shrine
    Special,
}

impl Tile {
    /// Glyph used in records and text dumps.
    #[must_use]
    pub const fn glyph(self) -> char {
        match self {
            Self::Wall => '#',
            Self::Floor => '.',
            Self::Door => '+',
            Self::Special => '*',
        }
    }

    /// Parses a glyph.
    #[must_use]
    pub const fn from_glyph(glyph: char) -> Option<Self> {
        match glyph {
            '#' => Some(Self::Wall),
            '.' => Some(Self::Floor),
            '+' => Some(Self::Door),
            '*' => Some(Self::Special),
            _ => None,
        }
    }

    /// Whether an actor can stand here.
    #[must_use]
    pub const fn is_walkable(self) -> bool {
        !matches!(self, Self::Wall)
    }
}

/// One of the four border lines of a grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Border {
    /// y = 0
    North,
    /// y = H-1
    South,
    /// x = 0
    West,
    /// x = W-1
    East,
}

impl Border {
    /// All four borders.
    pub const ALL: [Self; 4] = [Self::North, Self::South, Self::West, Self::East];
}

/// Fixed-size tile grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileGrid {
    size: GridSize,
    tiles: Vec<Tile>,
}

impl TileGrid {
    /// Creates a grid filled with walls.
    #[must_use]
    pub fn walls(size: GridSize) -> Self {
        Self {
            size,
            tiles: vec![Tile::Wall; size.area()],
        }
    }

    /// Grid dimensions.
    #[must_use]
    pub const fn size(&self) -> GridSize {
        self.size
    }

    /// Tile at a signed position; `None` out of bounds.
    #[must_use]
    pub fn get(&self, x: i32, y: i32) -> Option<Tile> {
        let local = self.size.local(x, y)?;
        self.tiles.get(local.to_index(self.size)).copied()
    }

    /// Tile at a local coordinate.
    #[must_use]
    pub fn at(&self, pos: LocalCoord) -> Tile {
        self.get(i32::from(pos.x), i32::from(pos.y))
            .unwrap_or(Tile::Wall)
    }

    /// Sets a tile; out-of-bounds writes are ignored.
    pub fn set(&mut self, x: i32, y: i32, tile: Tile) -> bool {
        let Some(local) = self.size.local(x, y) else {
            return false;
        };
        let index = local.to_index(self.size);
        self.tiles[index] = tile;
        true
    }

    /// Whether the cell at a signed position is walkable.
    #[must_use]
    pub fn is_walkable(&self, x: i32, y: i32) -> bool {
        self.get(x, y).is_some_and(Tile::is_walkable)
    }

    /// Cells along a border line.
    pub fn border_cells(&self, border: Border) -> impl Iterator<Item = LocalCoord> {
        let GridSize { width, height } = self.size;
        let (horizontal, fixed) = match border {
            Border::North => (true, 0),
            Border::South => (true, height - 1),
            Border::West => (false, 0),
            Border::East => (false, width - 1),
        };
        let len = if horizontal { width } else { height };
        (0..len).map(move |i| {
            if horizontal {
                LocalCoord::new(i, fixed)
            } else {
                LocalCoord::new(fixed, i)
            }
        })
    }

    /// Whether a border line has at least one walkable cell.
    #[must_use]
    pub fn border_has_opening(&self, border: Border) -> bool {
        self.border_cells(border).any(|c| self.at(c).is_walkable())
    }

    /// Rows as glyph strings.
    #[must_use]
    pub fn to_rows(&self) -> Vec<String> {
        self.tiles
            .chunks(usize::from(self.size.width))
            .map(|row| row.iter().map(|t| t.glyph()).collect())
            .collect()
    }

    /// Parses glyph rows. All rows must share one width.
    pub fn from_rows(rows: &[String]) -> Result<Self, String> {
        let height = rows.len();
        let width = rows.first().map_or(0, |r| r.chars().count());
        if width == 0 || height == 0 {
            return Err("empty tile grid".into());
        }
        let size = GridSize::new(
            u16::try_from(width).map_err(|_| "grid too wide".to_string())?,
            u16::try_from(height).map_err(|_| "grid too tall".to_string())?,
        );
        let mut tiles = Vec::with_capacity(size.area());
        for (y, row) in rows.iter().enumerate() {
            if row.chars().count() != width {
                return Err(format!("row {y} has the wrong width"));
            }
            for glyph in row.chars() {
                tiles.push(Tile::from_glyph(glyph).ok_or_else(|| format!("bad glyph {glyph:?}"))?);
            }
        }
        Ok(Self { size, tiles })
    }
}

/// A monster living in a chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonsterInstance {
    /// Species
    pub kind: MonsterKind,
    /// Display name including tier prefix
    pub name: String,
    /// 1..=3
    pub tier: u8,
    /// Tier-scaled stats
    pub stats: MonsterStats,
    /// Position in the chunk
    pub pos: LocalCoord,
    /// Tier-scaled special ability
    #[serde(default)]
    pub ability: Option<SpecialAbility>,
    /// Whether this is the chunk's boss
    #[serde(default)]
    pub boss: bool,
    /// Cleared when killed
    pub alive: bool,
}

/// What a world item is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WorldItemKind {
    /// Treasure chest
    Chest {
        /// Gold inside
        gold: u32,
        /// Already looted
        opened: bool,
    },
    /// Blessing shrine
    Shrine {
        /// Blessing name
        blessing: String,
        /// Already prayed at
        used: bool,
    },
    /// Wandering merchant
    Vendor {
        /// Merchant name
        name: String,
        /// Items for sale
        stock: Vec<VendorListing>,
        /// Optional fetch quest
        #[serde(default)]
        quest: Option<FetchQuestOffer>,
    },
    /// Potion lying on the ground
    Potion {
        /// Effect
        effect: PotionEffect,
    },
    /// Equipment lying on the ground
    Equipment {
        /// The piece
        item: Equipment,
    },
    /// Cosmetic oddity
    Artifact {
        /// Display name
        name: String,
    },
}

impl WorldItemKind {
    /// Whether picking it up removes it from the map.
    #[must_use]
    pub const fn is_pickup(&self) -> bool {
        matches!(
            self,
            Self::Potion { .. } | Self::Equipment { .. } | Self::Artifact { .. }
        )
    }
}

/// A positioned object in a chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldItem {
    /// Position in the chunk
    pub pos: LocalCoord,
    /// What it is
    #[serde(flatten)]
    pub kind: WorldItemKind,
}

/// A chunk of the world.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    coord: ChunkCoord,
    biome: String,
    tier: u8,
    grid: TileGrid,
    monsters: Vec<MonsterInstance>,
    items: Vec<WorldItem>,
    dirty: bool,
}

impl Chunk {
    /// Assembles a chunk. Fresh chunks start clean.
    #[must_use]
    pub fn new(
        coord: ChunkCoord,
        biome: impl Into<String>,
        tier: u8,
        grid: TileGrid,
        monsters: Vec<MonsterInstance>,
        items: Vec<WorldItem>,
    ) -> Self {
        Self {
            coord,
            biome: biome.into(),
            tier,
            grid,
            monsters,
            items,
            dirty: false,
        }
    }

    /// Returns the chunk coordinate.
    #[must_use]
    pub const fn coord(&self) -> ChunkCoord {
        self.coord
    }

    /// Biome id.
    #[must_use]
    pub fn biome(&self) -> &str {
        &self.biome
    }

    /// Biome tier.
    #[must_use]
    pub const fn tier(&self) -> u8 {
        self.tier
    }

    /// Tile grid.
    #[must_use]
    pub const fn grid(&self) -> &TileGrid {
        &self.grid
    }

    /// Monsters, living and dead.
    #[must_use]
    pub fn monsters(&self) -> &[MonsterInstance] {
        &self.monsters
    }

    /// Items in placement order.
    #[must_use]
    pub fn items(&self) -> &[WorldItem] {
        &self.items
    }

    /// Returns whether the chunk changed since it was generated or saved.
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Marks the chunk as clean.
    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// Marks a monster dead. Returns false if it was already dead or absent.
    pub fn mark_monster_dead(&mut self, index: usize) -> bool {
        match self.monsters.get_mut(index) {
            Some(monster) if monster.alive => {
                monster.alive = false;
                monster.stats.hp = 0;
                self.dirty = true;
                true
            },
            _ => false,
        }
    }

    /// Item at `pos`.
    #[must_use]
    pub fn item_at(&self, pos: LocalCoord) -> Option<&WorldItem> {
        self.items.iter().find(|i| i.pos == pos)
    }

    /// Removes a pickup item from `pos`.
    pub fn take_item_at(&mut self, pos: LocalCoord) -> Option<WorldItem> {
        let index = self
            .items
            .iter()
            .position(|i| i.pos == pos && i.kind.is_pickup())?;
        self.dirty = true;
        Some(self.items.remove(index))
    }

    /// Opens the chest at `pos`, returning its gold the first time.
    pub fn open_chest(&mut self, pos: LocalCoord) -> Option<u32> {
        let item = self.items.iter_mut().find(|i| i.pos == pos)?;
        match &mut item.kind {
            WorldItemKind::Chest { gold, opened } if !*opened => {
                *opened = true;
                self.dirty = true;
                Some(*gold)
            },
            _ => None,
        }
    }

    /// Uses the shrine at `pos`, returning its blessing the first time.
    pub fn use_shrine(&mut self, pos: LocalCoord) -> Option<String> {
        let item = self.items.iter_mut().find(|i| i.pos == pos)?;
        match &mut item.kind {
            WorldItemKind::Shrine { blessing, used } if !*used => {
                *used = true;
                self.dirty = true;
                Some(blessing.clone())
            },
            _ => None,
        }
    }

    /// Fetch quest offers held by vendors.
    pub fn vendor_offers_mut(&mut self) -> impl Iterator<Item = &mut FetchQuestOffer> {
        self.items.iter_mut().filter_map(|i| match &mut i.kind {
            WorldItemKind::Vendor {
                quest: Some(offer),
                ..
            } => Some(offer),
            _ => None,
        })
    }

    /// Projects the chunk to its plain-data record.
    #[must_use]
    pub fn to_record(&self) -> PersistedChunkRecord {
        PersistedChunkRecord {
            version: SchemaVersion::CHUNK_RECORD,
            coord: self.coord,
            biome: self.biome.clone(),
            tier: self.tier,
            tiles: self.grid.to_rows(),
            monsters: self.monsters.clone(),
            items: Some(self.items.clone()),
        }
    }

    /// Rebuilds a chunk from a record stored under `key`.
    ///
    /// A record without an item list yields an empty one.
    pub fn from_record(record: PersistedChunkRecord, key: &str) -> WorldResult<Self> {
        if !SchemaVersion::CHUNK_RECORD.can_read(&record.version) {
            return Err(WorldError::VersionMismatch {
                expected: SchemaVersion::CHUNK_RECORD.to_string(),
                actual: record.version.to_string(),
            });
        }
        let grid = TileGrid::from_rows(&record.tiles).map_err(|reason| WorldError::Corrupt {
            key: key.to_string(),
            reason,
        })?;
        Ok(Self::new(
            record.coord,
            record.biome,
            record.tier,
            grid,
            record.monsters,
            record.items.unwrap_or_default(),
        ))
    }
}

/// Plain-data projection of a [`Chunk`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedChunkRecord {
    /// Record schema; absent means 1.0
    #[serde(default)]
    pub version: SchemaVersion,
    /// Chunk coordinate
    pub coord: ChunkCoord,
    /// Biome id
    pub biome: String,
    /// Biome tier
    #[serde(default)]
    pub tier: u8,
    /// Tile rows as glyph strings
    pub tiles: Vec<String>,
    /// Monsters
    #[serde(default)]
    pub monsters: Vec<MonsterInstance>,
    /// Items; missing in partial records
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<WorldItem>>,
}
