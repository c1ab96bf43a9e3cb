//! Fetch quests: item predicates, the named template registry, and the
//! player's quest log.
//!
//! A fetch quest is complete when the player holds an item matching the
//! target's [`ItemPredicate`]. Predicates are plain data so they survive
//! persistence; records written before that was true carry only the
//! target's display name, and [`FetchItemRegistry::rehydrate`] restores the
//! predicate from it.

use ahash::AHashMap;
use delve_common::{ChunkCoord, SchemaVersion};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::item::{Inventory, ItemKind, ItemStack, ItemStat, PotionEffect};

/// Error types for quest operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QuestError {
    /// A quest from this vendor is already in the log
    #[error("Quest from chunk {0} already accepted")]
    AlreadyAccepted(ChunkCoord),
    /// No quest from this vendor in the log
    #[error("No quest from chunk {0}")]
    NotFound(ChunkCoord),
    /// Session state could not be parsed or written
    #[error("Quest log state invalid: {0}")]
    InvalidState(String),
}

/// Result type for quest operations.
pub type QuestResult<T> = Result<T, QuestError>;

/// Which inventory stacks satisfy a fetch target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ItemPredicate {
    /// Item category matches
    KindEquals {
        /// Required category
        kind: ItemKind,
    },
    /// Item category matches and a stat meets a minimum
    KindAndStatAtLeast {
        /// Required category
        kind: ItemKind,
        /// Stat to compare
        stat: ItemStat,
        /// Minimum value
        value: i32,
    },
    /// Potion with exactly this effect
    PotionEffectIs {
        /// Required effect
        effect: PotionEffect,
    },
    /// Any of the nested predicates
    AnyOf {
        /// Alternatives
        predicates: Vec<ItemPredicate>,
    },
}

impl ItemPredicate {
    /// Evaluates the predicate against one stack.
    #[must_use]
    pub fn matches(&self, stack: &ItemStack) -> bool {
        if stack.quantity == 0 {
            return false;
        }
        match self {
            Self::KindEquals { kind } => stack.item.kind() == *kind,
            Self::KindAndStatAtLeast { kind, stat, value } => {
                stack.item.kind() == *kind && stack.item.stat(*stat) >= *value
            },
            Self::PotionEffectIs { effect } => {
                matches!(&stack.item, crate::item::Item::Potion { effect: e } if e == effect)
            },
            Self::AnyOf { predicates } => predicates.iter().any(|p| p.matches(stack)),
        }
    }
}

/// The item a fetch quest asks for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetItem {
    /// Stable display name, also the registry key
    pub name: String,
    /// Matching rule; absent in legacy records until rehydrated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predicate: Option<ItemPredicate>,
}

impl TargetItem {
    /// Creates a target with a live predicate.
    #[must_use]
    pub fn new(name: impl Into<String>, predicate: ItemPredicate) -> Self {
        Self {
            name: name.into(),
            predicate: Some(predicate),
        }
    }

    /// Whether the predicate is present.
    #[must_use]
    pub const fn is_live(&self) -> bool {
        self.predicate.is_some()
    }

    /// Total quantity of matching items in the inventory.
    ///
    /// Always zero without a predicate.
    #[must_use]
    pub fn matching_count(&self, inventory: &Inventory) -> u32 {
        let Some(predicate) = &self.predicate else {
            return 0;
        };
        inventory
            .iter()
            .filter(|s| predicate.matches(s))
            .map(|s| s.quantity)
            .sum()
    }

    /// Whether the inventory holds at least `quantity` matching items.
    #[must_use]
    pub fn is_satisfied_by(&self, inventory: &Inventory, quantity: u32) -> bool {
        self.is_live() && self.matching_count(inventory) >= quantity.max(1)
    }
}

/// A vendor's offer of a fetch quest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchQuestOffer {
    /// Name of the vendor handing it out
    pub giver: String,
    /// What to bring
    pub target: TargetItem,
    /// How many
    pub quantity: u32,
    /// Gold paid on turn-in
    pub reward_gold: u32,
}

impl FetchQuestOffer {
    /// Whether the inventory satisfies this offer.
    #[must_use]
    pub fn is_satisfied_by(&self, inventory: &Inventory) -> bool {
        self.target.is_satisfied_by(inventory, self.quantity)
    }
}

/// A named fetch-item template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchItemTemplate {
    /// Stable display name
    pub name: String,
    /// Live predicate
    pub predicate: ItemPredicate,
}

impl FetchItemTemplate {
    /// Builds a live target from this template.
    #[must_use]
    pub fn target(&self) -> TargetItem {
        TargetItem::new(self.name.clone(), self.predicate.clone())
    }
}

/// Result of rehydrating a single target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RehydrateOutcome {
    /// The predicate was already present; nothing changed
    AlreadyLive,
    /// The predicate was restored from the registry
    Restored,
    /// No registry entry has this name; the target stays unsatisfiable
    Missing,
}

/// Tally of a rehydration pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RehydrationReport {
    /// Targets already carrying a predicate
    pub live: usize,
    /// Targets restored from the registry
    pub restored: usize,
    /// Targets with no registry match
    pub missing: usize,
}

impl RehydrationReport {
    /// Records one outcome.
    pub fn record(&mut self, outcome: RehydrateOutcome) {
        match outcome {
            RehydrateOutcome::AlreadyLive => self.live += 1,
            RehydrateOutcome::Restored => self.restored += 1,
            RehydrateOutcome::Missing => self.missing += 1,
        }
    }
}

/// Registry of fetch-item templates keyed by display name.
#[derive(Debug, Clone, Default)]
pub struct FetchItemRegistry {
    /// Templates in registration order
    templates: Vec<FetchItemTemplate>,
    /// Display name -> index into `templates`
    by_name: AHashMap<String, usize>,
}

impl FetchItemRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with the built-in templates.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(
            "a healing potion",
            ItemPredicate::KindAndStatAtLeast {
                kind: ItemKind::Potion,
                stat: ItemStat::Healing,
                value: 1,
            },
        );
        registry.register(
            "a strength tonic",
            ItemPredicate::PotionEffectIs {
                effect: PotionEffect::Strength,
            },
        );
        registry.register(
            "a sturdy weapon",
            ItemPredicate::KindAndStatAtLeast {
                kind: ItemKind::Weapon,
                stat: ItemStat::Attack,
                value: 4,
            },
        );
        registry.register(
            "a piece of armor",
            ItemPredicate::KindEquals {
                kind: ItemKind::Armor,
            },
        );
        registry.register(
            "a helmet",
            ItemPredicate::KindEquals {
                kind: ItemKind::Headgear,
            },
        );
        registry.register(
            "a curious trinket",
            ItemPredicate::AnyOf {
                predicates: vec![
                    ItemPredicate::KindEquals {
                        kind: ItemKind::Artifact,
                    },
                    ItemPredicate::PotionEffectIs {
                        effect: PotionEffect::Haste,
                    },
                ],
            },
        );
        registry
    }

    /// Registers a template, replacing any with the same name.
    pub fn register(&mut self, name: impl Into<String>, predicate: ItemPredicate) {
        let name = name.into();
        if let Some(&index) = self.by_name.get(&name) {
            self.templates[index].predicate = predicate;
            return;
        }
        self.by_name.insert(name.clone(), self.templates.len());
        self.templates.push(FetchItemTemplate { name, predicate });
    }

    /// All templates in registration order.
    #[must_use]
    pub fn templates(&self) -> &[FetchItemTemplate] {
        &self.templates
    }

    /// Looks up a template by exact display name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FetchItemTemplate> {
        self.by_name.get(name).map(|&i| &self.templates[i])
    }

    /// Number of templates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Restores a missing predicate by exact name match.
    pub fn rehydrate(&self, target: &mut TargetItem) -> RehydrateOutcome {
        if target.is_live() {
            return RehydrateOutcome::AlreadyLive;
        }
        match self.get(&target.name) {
            Some(template) => {
                target.predicate = Some(template.predicate.clone());
                debug!("Rehydrated fetch target '{}'", target.name);
                RehydrateOutcome::Restored
            },
            None => {
                warn!(
                    "No fetch template named '{}'; quest is unsatisfiable",
                    target.name
                );
                RehydrateOutcome::Missing
            },
        }
    }
}

/// A fetch quest the player has taken on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptedQuest {
    /// Chunk of the vendor that offered it
    pub origin: ChunkCoord,
    /// The player's own copy of the offer
    pub offer: FetchQuestOffer,
}

/// The player's accepted fetch quests.
///
/// Holds its own copy of each offer, independent of the vendor's copy in
/// the chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestLog {
    /// Session state schema
    #[serde(default)]
    version: SchemaVersion,
    /// Accepted quests in acceptance order
    #[serde(default)]
    quests: Vec<AcceptedQuest>,
}

impl Default for QuestLog {
    fn default() -> Self {
        Self::new()
    }
}

impl QuestLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self {
            version: SchemaVersion::QUEST_LOG,
            quests: Vec::new(),
        }
    }

    /// Accepts a vendor's offer.
    pub fn accept(&mut self, origin: ChunkCoord, offer: &FetchQuestOffer) -> QuestResult<()> {
        if self.get(origin).is_some() {
            return Err(QuestError::AlreadyAccepted(origin));
        }
        self.quests.push(AcceptedQuest {
            origin,
            offer: offer.clone(),
        });
        Ok(())
    }

    /// Removes a quest, returning it.
    pub fn abandon(&mut self, origin: ChunkCoord) -> QuestResult<AcceptedQuest> {
        let index = self
            .quests
            .iter()
            .position(|q| q.origin == origin)
            .ok_or(QuestError::NotFound(origin))?;
        Ok(self.quests.remove(index))
    }

    /// Looks up the quest from a vendor chunk.
    #[must_use]
    pub fn get(&self, origin: ChunkCoord) -> Option<&AcceptedQuest> {
        self.quests.iter().find(|q| q.origin == origin)
    }

    /// All accepted quests.
    #[must_use]
    pub fn quests(&self) -> &[AcceptedQuest] {
        &self.quests
    }

    /// Quests the inventory currently satisfies.
    pub fn satisfied<'a>(
        &'a self,
        inventory: &'a Inventory,
    ) -> impl Iterator<Item = &'a AcceptedQuest> + 'a {
        self.quests
            .iter()
            .filter(move |q| q.offer.is_satisfied_by(inventory))
    }

    /// Restores missing predicates in the player's copies.
    pub fn rehydrate(&mut self, registry: &FetchItemRegistry) -> RehydrationReport {
        let mut report = RehydrationReport::default();
        for quest in &mut self.quests {
            report.record(registry.rehydrate(&mut quest.offer.target));
        }
        report
    }

    /// Serializes the log as session state.
    pub fn to_json(&self) -> QuestResult<String> {
        serde_json::to_string(self).map_err(|e| QuestError::InvalidState(e.to_string()))
    }

    /// Restores the log from session state and rehydrates it.
    pub fn restore(
        json: &str,
        registry: &FetchItemRegistry,
    ) -> QuestResult<(Self, RehydrationReport)> {
        let mut log: Self =
            serde_json::from_str(json).map_err(|e| QuestError::InvalidState(e.to_string()))?;
        if !SchemaVersion::QUEST_LOG.can_read(&log.version) {
            return Err(QuestError::InvalidState(format!(
                "unsupported quest log version {}",
                log.version
            )));
        }
        log.version = SchemaVersion::QUEST_LOG;
        let report = log.rehydrate(registry);
        Ok((log, report))
    }
}
