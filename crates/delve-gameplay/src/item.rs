//! Items and the inventory they are carried in.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Inventory error types.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InventoryError {
    /// Not enough matching items
    #[error("Not enough items: need {needed}, have {have}")]
    NotEnough {
        /// Amount needed
        needed: u32,
        /// Amount available
        have: u32,
    },
    /// Inventory full
    #[error("Inventory full: capacity {capacity}")]
    Full {
        /// Inventory capacity
        capacity: u32,
    },
}

/// Result type for inventory operations.
pub type InventoryResult<T> = Result<T, InventoryError>;

/// What a potion does when quaffed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PotionEffect {
    /// Restores a little health.
    Heal,
    /// Restores a lot of health.
    GreaterHeal,
    /// Restores all health.
    FullHeal,
    /// Temporary attack buff.
    Strength,
    /// Temporary defense buff.
    Defense,
    /// Temporary extra action.
    Haste,
}

impl PotionEffect {
    /// Every effect, in price order (cheapest first).
    pub const ALL: [Self; 6] = [
        Self::Strength,
        Self::Defense,
        Self::Haste,
        Self::Heal,
        Self::GreaterHeal,
        Self::FullHeal,
    ];

    /// Display name of a potion with this effect.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Heal => "Potion of Healing",
            Self::GreaterHeal => "Potion of Greater Healing",
            Self::FullHeal => "Elixir of Life",
            Self::Strength => "Tonic of Strength",
            Self::Defense => "Tonic of Stoneskin",
            Self::Haste => "Draught of Haste",
        }
    }

    /// Hit points restored. Zero for buffs.
    #[must_use]
    pub const fn healing(self) -> i32 {
        match self {
            Self::Heal => 20,
            Self::GreaterHeal => 50,
            Self::FullHeal => 999,
            Self::Strength | Self::Defense | Self::Haste => 0,
        }
    }

    /// Vendor base price before jitter.
    #[must_use]
    pub const fn base_price(self) -> u32 {
        match self {
            Self::Strength | Self::Defense => 12,
            Self::Haste => 18,
            Self::Heal => 20,
            Self::GreaterHeal => 40,
            Self::FullHeal => 90,
        }
    }
}

/// Body slot a piece of equipment occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquipmentSlot {
    /// Held in hand, adds attack.
    Weapon,
    /// Worn on the body, adds defense.
    Armor,
    /// Worn on the head, adds defense.
    Headgear,
}

impl EquipmentSlot {
    /// Every slot.
    pub const ALL: [Self; 3] = [Self::Weapon, Self::Armor, Self::Headgear];

    /// Base names a generated piece may take.
    #[must_use]
    pub fn base_names(self) -> &'static [&'static str] {
        match self {
            Self::Weapon => &["Dagger", "Shortsword", "Mace", "Spear", "Longsword", "War Axe"],
            Self::Armor => &["Padded Vest", "Leather Jerkin", "Chain Shirt", "Scale Hauberk"],
            Self::Headgear => &["Hood", "Leather Cap", "Iron Helm", "Great Helm"],
        }
    }

    /// Inclusive stat bonus range of a generated piece.
    #[must_use]
    pub const fn bonus_range(self) -> (i32, i32) {
        match self {
            Self::Weapon => (2, 8),
            Self::Armor => (1, 6),
            Self::Headgear => (1, 3),
        }
    }
}

/// A piece of equipment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Equipment {
    /// Slot it occupies
    pub slot: EquipmentSlot,
    /// Display name
    pub name: String,
    /// Attack bonus for weapons, defense bonus otherwise
    pub bonus: i32,
}

/// Coarse item category used by quest predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    /// Any potion
    Potion,
    /// Weapon equipment
    Weapon,
    /// Body armor
    Armor,
    /// Headgear
    Headgear,
    /// Cosmetic oddity
    Artifact,
}

/// A numeric property of an item that predicates can compare against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStat {
    /// Hit points restored
    Healing,
    /// Attack granted
    Attack,
    /// Defense granted
    Defense,
}

/// Anything that can sit in an inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Item {
    /// A consumable potion
    Potion {
        /// What it does
        effect: PotionEffect,
    },
    /// A wearable or wieldable piece
    Equipment(Equipment),
    /// Flavor object with no mechanical use
    Artifact {
        /// Display name
        name: String,
    },
}

impl Item {
    /// Convenience constructor for a potion.
    #[must_use]
    pub const fn potion(effect: PotionEffect) -> Self {
        Self::Potion { effect }
    }

    /// Category of this item.
    #[must_use]
    pub const fn kind(&self) -> ItemKind {
        match self {
            Self::Potion { .. } => ItemKind::Potion,
            Self::Equipment(eq) => match eq.slot {
                EquipmentSlot::Weapon => ItemKind::Weapon,
                EquipmentSlot::Armor => ItemKind::Armor,
                EquipmentSlot::Headgear => ItemKind::Headgear,
            },
            Self::Artifact { .. } => ItemKind::Artifact,
        }
    }

    /// Value of a numeric stat, zero when the item has none.
    #[must_use]
    pub fn stat(&self, stat: ItemStat) -> i32 {
        match (self, stat) {
            (Self::Potion { effect }, ItemStat::Healing) => effect.healing(),
            (Self::Potion { effect: PotionEffect::Strength }, ItemStat::Attack) => 3,
            (Self::Potion { effect: PotionEffect::Defense }, ItemStat::Defense) => 3,
            (Self::Equipment(eq), ItemStat::Attack) if eq.slot == EquipmentSlot::Weapon => {
                eq.bonus
            },
            (Self::Equipment(eq), ItemStat::Defense) if eq.slot != EquipmentSlot::Weapon => {
                eq.bonus
            },
            _ => 0,
        }
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Potion { effect } => effect.display_name(),
            Self::Equipment(eq) => &eq.name,
            Self::Artifact { name } => name,
        }
    }
}

/// A stack of identical items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStack {
    /// The item
    pub item: Item,
    /// How many
    pub quantity: u32,
}

impl ItemStack {
    /// Creates a stack.
    #[must_use]
    pub const fn new(item: Item, quantity: u32) -> Self {
        Self { item, quantity }
    }
}

/// An inventory container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    /// Stacks in pickup order
    stacks: Vec<ItemStack>,
    /// Maximum number of stacks
    capacity: u32,
}

impl Inventory {
    /// Creates a new inventory with the given capacity.
    #[must_use]
    pub fn new(capacity: u32) -> Self {
        Self {
            stacks: Vec::new(),
            capacity,
        }
    }

    /// Returns the number of stacks.
    #[must_use]
    pub fn slot_count(&self) -> u32 {
        self.stacks.len() as u32
    }

    /// Returns the capacity.
    #[must_use]
    pub const fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Returns the total quantity of items equal to `item`.
    #[must_use]
    pub fn count(&self, item: &Item) -> u32 {
        self.stacks
            .iter()
            .filter(|s| &s.item == item)
            .map(|s| s.quantity)
            .sum()
    }

    /// Adds items, merging into an existing stack of the same item.
    pub fn add(&mut self, item: Item, amount: u32) -> InventoryResult<()> {
        if let Some(stack) = self.stacks.iter_mut().find(|s| s.item == item) {
            stack.quantity += amount;
            return Ok(());
        }
        if self.slot_count() >= self.capacity {
            return Err(InventoryError::Full {
                capacity: self.capacity,
            });
        }
        self.stacks.push(ItemStack::new(item, amount));
        Ok(())
    }

    /// Removes `amount` items taken from stacks accepted by `filter`.
    pub fn remove_matching(
        &mut self,
        amount: u32,
        filter: impl Fn(&ItemStack) -> bool,
    ) -> InventoryResult<()> {
        let have: u32 = self
            .stacks
            .iter()
            .filter(|s| filter(s))
            .map(|s| s.quantity)
            .sum();
        if have < amount {
            return Err(InventoryError::NotEnough {
                needed: amount,
                have,
            });
        }
        let mut remaining = amount;
        for stack in self.stacks.iter_mut().filter(|s| filter(s)) {
            let taken = stack.quantity.min(remaining);
            stack.quantity -= taken;
            remaining -= taken;
            if remaining == 0 {
                break;
            }
        }
        self.stacks.retain(|s| s.quantity > 0);
        Ok(())
    }

    /// Returns an iterator over all stacks.
    pub fn iter(&self) -> impl Iterator<Item = &ItemStack> + '_ {
        self.stacks.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sword(bonus: i32) -> Item {
        Item::Equipment(Equipment {
            slot: EquipmentSlot::Weapon,
            name: "Shortsword".into(),
            bonus,
        })
    }

    #[test]
    fn test_inventory_add_merges_stacks() {
        let mut inv = Inventory::new(2);
        inv.add(Item::potion(PotionEffect::Heal), 1).expect("add");
        inv.add(Item::potion(PotionEffect::Heal), 2).expect("add");
        assert_eq!(inv.slot_count(), 1);
        assert_eq!(inv.count(&Item::potion(PotionEffect::Heal)), 3);

        inv.add(sword(4), 1).expect("add");
        assert_eq!(
            inv.add(Item::potion(PotionEffect::Haste), 1),
            Err(InventoryError::Full { capacity: 2 })
        );
    }

    #[test]
    fn test_inventory_remove_matching() {
        let mut inv = Inventory::new(10);
        inv.add(Item::potion(PotionEffect::Heal), 2).expect("add");
        inv.add(Item::potion(PotionEffect::GreaterHeal), 1).expect("add");

        let heals = |s: &ItemStack| s.item.stat(ItemStat::Healing) > 0;
        assert_eq!(
            inv.remove_matching(5, heals),
            Err(InventoryError::NotEnough { needed: 5, have: 3 })
        );
        inv.remove_matching(3, heals).expect("remove");
        assert_eq!(inv.slot_count(), 0);
    }

    #[test]
    fn test_item_kind_and_stats() {
        assert_eq!(sword(5).kind(), ItemKind::Weapon);
        assert_eq!(sword(5).stat(ItemStat::Attack), 5);
        assert_eq!(sword(5).stat(ItemStat::Defense), 0);

        let helm = Item::Equipment(Equipment {
            slot: EquipmentSlot::Headgear,
            name: "Iron Helm".into(),
            bonus: 2,
        });
        assert_eq!(helm.kind(), ItemKind::Headgear);
        assert_eq!(helm.stat(ItemStat::Defense), 2);

        assert_eq!(Item::potion(PotionEffect::FullHeal).stat(ItemStat::Healing), 999);
        assert_eq!(Item::potion(PotionEffect::Strength).stat(ItemStat::Healing), 0);
    }

    #[test]
    fn test_potion_price_order() {
        let prices: Vec<u32> = PotionEffect::ALL.iter().map(|e| e.base_price()).collect();
        let mut sorted = prices.clone();
        sorted.sort_unstable();
        assert_eq!(prices, sorted);
        assert_eq!(PotionEffect::FullHeal.base_price(), *prices.iter().max().unwrap_or(&0));
    }
}
