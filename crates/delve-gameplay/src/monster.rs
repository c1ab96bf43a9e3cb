//! Monster kinds, base stats and tier scaling.
//!
//! Combat resolution lives elsewhere; this module only describes what a
//! spawned monster looks like.

use serde::{Deserialize, Serialize};

/// Every monster species the generator can spawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonsterKind {
    /// Giant rat.
    Rat,
    /// Cave bat.
    Bat,
    /// Green slime.
    Slime,
    /// Grey wolf.
    Wolf,
    /// Wild boar.
    Boar,
    /// Venomous spider.
    Spider,
    /// Roadside bandit.
    Bandit,
    /// Bog-dwelling imp.
    Bogling,
    /// Restless skeleton.
    Skeleton,
    /// Corpse eater.
    Ghoul,
    /// Cave troll.
    Troll,
    /// Drowned spirit.
    Wraith,
    /// Fire lizard.
    Salamander,
    /// Animated stone.
    Golem,
    /// Frost spirit.
    Frostling,
    /// Winged lesser dragon.
    Drake,
    /// Void horror.
    Horror,
    /// Boss of the meadows and woods.
    Warden,
    /// Boss of the marshes and barrows.
    Lich,
    /// Boss of the caverns and ruins.
    Behemoth,
    /// Boss of the far reaches.
    Wyrm,
}

/// Flat stat block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonsterStats {
    /// Current hit points
    pub hp: i32,
    /// Maximum hit points
    pub max_hp: i32,
    /// Attack
    pub attack: i32,
    /// Defense
    pub defense: i32,
    /// Experience awarded on kill
    pub xp: u32,
    /// Gold dropped on kill
    pub gold: u32,
}

impl MonsterStats {
    const fn base(hp: i32, attack: i32, defense: i32, xp: u32, gold: u32) -> Self {
        Self {
            hp,
            max_hp: hp,
            attack,
            defense,
            xp,
            gold,
        }
    }

    /// Multiplies every stat, rounding to nearest.
    #[must_use]
    pub fn scaled(self, factor: f64) -> Self {
        let scale_i = |v: i32| (f64::from(v) * factor).round() as i32;
        let scale_u = |v: u32| (f64::from(v) * factor).round() as u32;
        let hp = scale_i(self.max_hp);
        Self {
            hp,
            max_hp: hp,
            attack: scale_i(self.attack),
            defense: scale_i(self.defense),
            xp: scale_u(self.xp),
            gold: scale_u(self.gold),
        }
    }
}

/// Kind of on-hit special effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbilityKind {
    /// Damage over time.
    Poison,
    /// Heals the attacker.
    LifeDrain,
    /// Skips the target's next turn.
    Stun,
    /// Fire damage over time.
    Burn,
    /// Slows the target.
    Frost,
}

/// A special ability with its trigger chance and damage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpecialAbility {
    /// Effect kind
    pub kind: AbilityKind,
    /// Probability of triggering on hit, 0..=1
    pub chance: f64,
    /// Extra damage when it triggers
    pub damage: i32,
}

/// Upper bound for a scaled ability trigger chance.
pub const MAX_ABILITY_CHANCE: f64 = 0.9;

/// Stat multiplier for each tier, indexed by `tier - 1`.
pub const TIER_STAT_MULTIPLIER: [f64; 3] = [1.0, 1.5, 2.2];

/// Ability chance multiplier for each tier, indexed by `tier - 1`.
pub const TIER_ABILITY_MULTIPLIER: [f64; 3] = [1.0, 1.25, 1.5];

/// Kinds every biome can spawn regardless of its own pool.
pub const COMMON_POOL: [MonsterKind; 3] = [MonsterKind::Rat, MonsterKind::Bat, MonsterKind::Slime];

impl MonsterKind {
    /// Display name.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Rat => "Giant Rat",
            Self::Bat => "Cave Bat",
            Self::Slime => "Slime",
            Self::Wolf => "Grey Wolf",
            Self::Boar => "Wild Boar",
            Self::Spider => "Spider",
            Self::Bandit => "Bandit",
            Self::Bogling => "Bogling",
            Self::Skeleton => "Skeleton",
            Self::Ghoul => "Ghoul",
            Self::Troll => "Cave Troll",
            Self::Wraith => "Wraith",
            Self::Salamander => "Salamander",
            Self::Golem => "Stone Golem",
            Self::Frostling => "Frostling",
            Self::Drake => "Drake",
            Self::Horror => "Void Horror",
            Self::Warden => "Grove Warden",
            Self::Lich => "Barrow Lich",
            Self::Behemoth => "Deep Behemoth",
            Self::Wyrm => "Elder Wyrm",
        }
    }

    /// Tier-1 stat block.
    #[must_use]
    pub const fn base_stats(self) -> MonsterStats {
        match self {
            Self::Rat => MonsterStats::base(6, 2, 0, 3, 1),
            Self::Bat => MonsterStats::base(5, 2, 1, 3, 1),
            Self::Slime => MonsterStats::base(9, 1, 1, 4, 2),
            Self::Wolf => MonsterStats::base(12, 4, 1, 7, 2),
            Self::Boar => MonsterStats::base(15, 3, 2, 7, 3),
            Self::Spider => MonsterStats::base(10, 4, 1, 8, 2),
            Self::Bandit => MonsterStats::base(14, 4, 2, 9, 8),
            Self::Bogling => MonsterStats::base(13, 5, 2, 10, 4),
            Self::Skeleton => MonsterStats::base(16, 5, 3, 12, 5),
            Self::Ghoul => MonsterStats::base(20, 6, 2, 14, 5),
            Self::Troll => MonsterStats::base(34, 8, 4, 22, 10),
            Self::Wraith => MonsterStats::base(22, 8, 3, 20, 8),
            Self::Salamander => MonsterStats::base(26, 9, 4, 24, 10),
            Self::Golem => MonsterStats::base(44, 9, 8, 30, 12),
            Self::Frostling => MonsterStats::base(30, 10, 5, 30, 12),
            Self::Drake => MonsterStats::base(48, 13, 7, 42, 20),
            Self::Horror => MonsterStats::base(56, 15, 8, 55, 25),
            Self::Warden => MonsterStats::base(40, 8, 4, 40, 30),
            Self::Lich => MonsterStats::base(55, 11, 5, 60, 45),
            Self::Behemoth => MonsterStats::base(80, 14, 9, 90, 60),
            Self::Wyrm => MonsterStats::base(110, 18, 11, 140, 100),
        }
    }

    /// Tier-1 special ability, if the species has one.
    #[must_use]
    pub fn base_ability(self) -> Option<SpecialAbility> {
        let (kind, chance, damage) = match self {
            Self::Spider => (AbilityKind::Poison, 0.25, 2),
            Self::Bogling => (AbilityKind::Poison, 0.2, 3),
            Self::Ghoul | Self::Wraith => (AbilityKind::LifeDrain, 0.2, 4),
            Self::Troll | Self::Golem => (AbilityKind::Stun, 0.15, 3),
            Self::Salamander | Self::Drake => (AbilityKind::Burn, 0.25, 5),
            Self::Frostling => (AbilityKind::Frost, 0.3, 4),
            Self::Horror => (AbilityKind::LifeDrain, 0.3, 7),
            Self::Lich => (AbilityKind::LifeDrain, 0.35, 8),
            Self::Behemoth => (AbilityKind::Stun, 0.3, 9),
            Self::Wyrm => (AbilityKind::Burn, 0.4, 12),
            Self::Warden => (AbilityKind::Stun, 0.25, 5),
            Self::Rat
            | Self::Bat
            | Self::Slime
            | Self::Wolf
            | Self::Boar
            | Self::Bandit
            | Self::Skeleton => return None,
        };
        Some(SpecialAbility {
            kind,
            chance,
            damage,
        })
    }
}

/// Display prefix for a tier.
#[must_use]
pub fn tier_prefix(tier: u8) -> &'static str {
    match tier {
        2 => "Veteran ",
        3 => "Elite ",
        _ => "",
    }
}

/// Stats and ability of `kind` at the given tier (clamped to 1..=3).
#[must_use]
pub fn scaled_for_tier(kind: MonsterKind, tier: u8) -> (MonsterStats, Option<SpecialAbility>) {
    let index = usize::from(tier.clamp(1, 3) - 1);
    let stats = kind.base_stats().scaled(TIER_STAT_MULTIPLIER[index]);
    let ability = kind.base_ability().map(|a| SpecialAbility {
        kind: a.kind,
        chance: (a.chance * TIER_ABILITY_MULTIPLIER[index]).min(MAX_ABILITY_CHANCE),
        damage: (f64::from(a.damage) * TIER_STAT_MULTIPLIER[index]).round() as i32,
    });
    (stats, ability)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_scaling_is_multiplicative() {
        let (t1, _) = scaled_for_tier(MonsterKind::Wolf, 1);
        let (t2, _) = scaled_for_tier(MonsterKind::Wolf, 2);
        let (t3, _) = scaled_for_tier(MonsterKind::Wolf, 3);
        assert_eq!(t1, MonsterKind::Wolf.base_stats());
        assert_eq!(t2.max_hp, 18);
        assert_eq!(t3.max_hp, 26);
        assert!(t1.attack <= t2.attack && t2.attack <= t3.attack);
        assert_eq!(t3.hp, t3.max_hp);
    }

    #[test]
    fn test_ability_scaling() {
        let (_, a1) = scaled_for_tier(MonsterKind::Spider, 1);
        let (_, a3) = scaled_for_tier(MonsterKind::Spider, 3);
        let (a1, a3) = (a1.expect("spider ability"), a3.expect("spider ability"));
        assert!(a3.chance > a1.chance);
        assert!(a3.damage > a1.damage);

        let (_, wyrm) = scaled_for_tier(MonsterKind::Wyrm, 3);
        assert!(wyrm.expect("wyrm ability").chance <= MAX_ABILITY_CHANCE);

        assert!(scaled_for_tier(MonsterKind::Rat, 3).1.is_none());
    }

    #[test]
    fn test_tier_out_of_range_is_clamped() {
        assert_eq!(scaled_for_tier(MonsterKind::Bat, 0), scaled_for_tier(MonsterKind::Bat, 1));
        assert_eq!(scaled_for_tier(MonsterKind::Bat, 9), scaled_for_tier(MonsterKind::Bat, 3));
    }
}
