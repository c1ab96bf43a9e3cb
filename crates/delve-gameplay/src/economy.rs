//! Vendor stock and pricing.

use serde::{Deserialize, Serialize};

use crate::item::{EquipmentSlot, Item, PotionEffect};

/// Maximum relative deviation applied to potion base prices.
pub const POTION_PRICE_JITTER: f64 = 0.2;

/// An item offered for sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorListing {
    /// What is sold
    pub item: Item,
    /// Price in gold
    pub price: u32,
}

/// Price of a potion given a jitter factor in `[-1, 1]`.
///
/// The factor is scaled by [`POTION_PRICE_JITTER`], so the result stays
/// within +/-20% of the base price and never drops below 1.
#[must_use]
pub fn potion_price(effect: PotionEffect, jitter: f64) -> u32 {
    let factor = 1.0 + jitter.clamp(-1.0, 1.0) * POTION_PRICE_JITTER;
    ((f64::from(effect.base_price()) * factor).round() as u32).max(1)
}

/// Inclusive price band for equipment in a slot.
#[must_use]
pub const fn equipment_price_band(slot: EquipmentSlot) -> (u32, u32) {
    match slot {
        EquipmentSlot::Weapon => (20, 60),
        EquipmentSlot::Armor => (25, 70),
        EquipmentSlot::Headgear => (15, 45),
    }
}
