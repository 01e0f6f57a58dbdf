//! Battle-facing view of a character: equipment resolved to plain numbers.

use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use crate::error::{EquipmentSlot, StoreError, ValidationReason};
use crate::roster::{CharacterId, Roster};
use crate::rules::BattleRules;

/// Equipment as the collaborator stores it; optional stats are still unresolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterRecord {
    pub id: CharacterId,
    pub name: String,
    pub weapon: Option<WeaponRecord>,
    pub armor: Option<ArmorRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeaponRecord {
    pub damage: i32,
    pub accuracy: Option<u8>,
    pub critic: Option<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArmorRecord {
    pub defense: Option<i32>,
}

/// Lookup of characters and their equipment.
pub trait CombatantSource: Send + Sync {
    fn lookup(&self, id: CharacterId) -> Result<Option<CharacterRecord>, StoreError>;

    /// Ids of every character with both equipment slots filled, in roster order.
    fn eligible_ids(&self) -> Result<Vec<CharacterId>, StoreError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeaponStats {
    pub damage: i32,
    pub accuracy: u8,
    pub critic: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArmorStats {
    pub defense: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Combatant {
    pub id: CharacterId,
    pub name: String,
    pub weapon: WeaponStats,
    pub armor: ArmorStats,
}

impl Combatant {
    /// Applies the rule defaults to missing stats. The only place defaults are decided.
    pub fn resolve(record: &CharacterRecord, rules: &BattleRules) -> Result<Self, ValidationReason> {
        let weapon = record.weapon.ok_or(ValidationReason::NotEquipped {
            id: record.id,
            slot: EquipmentSlot::Weapon,
        })?;
        let armor = record.armor.ok_or(ValidationReason::NotEquipped {
            id: record.id,
            slot: EquipmentSlot::Armor,
        })?;
        Ok(Self {
            id: record.id,
            name: record.name.clone(),
            weapon: WeaponStats {
                damage: weapon.damage.max(0),
                accuracy: weapon.accuracy.unwrap_or(rules.default_accuracy).min(100),
                critic: weapon.critic.unwrap_or(rules.default_critic).min(100),
            },
            armor: ArmorStats {
                defense: armor.defense.unwrap_or(rules.default_defense).max(0),
            },
        })
    }
}

impl Roster {
    pub fn record(&self, id: CharacterId) -> Option<CharacterRecord> {
        let character = self.character(id)?;
        let weapon = character
            .equipped_weapon
            .and_then(|w| self.weapon(w))
            .map(|w| WeaponRecord {
                damage: w.damage,
                accuracy: w.accuracy,
                critic: w.critic,
            });
        let armor = character
            .equipped_armor
            .and_then(|a| self.armor(a))
            .map(|a| ArmorRecord { defense: a.defense });
        Some(CharacterRecord {
            id: character.id,
            name: character.name.clone(),
            weapon,
            armor,
        })
    }
}

impl CombatantSource for Roster {
    fn lookup(&self, id: CharacterId) -> Result<Option<CharacterRecord>, StoreError> {
        Ok(self.record(id))
    }

    fn eligible_ids(&self) -> Result<Vec<CharacterId>, StoreError> {
        Ok(self.eligible().map(|c| c.id).collect())
    }
}

/// Shared roster that the CRUD side may edit while battles are running.
impl CombatantSource for RwLock<Roster> {
    fn lookup(&self, id: CharacterId) -> Result<Option<CharacterRecord>, StoreError> {
        let roster = self.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(roster.record(id))
    }

    fn eligible_ids(&self) -> Result<Vec<CharacterId>, StoreError> {
        let roster = self.read().map_err(|_| StoreError::LockPoisoned)?;
        roster.eligible_ids()
    }
}

impl<T: CombatantSource + ?Sized> CombatantSource for Arc<T> {
    fn lookup(&self, id: CharacterId) -> Result<Option<CharacterRecord>, StoreError> {
        (**self).lookup(id)
    }

    fn eligible_ids(&self) -> Result<Vec<CharacterId>, StoreError> {
        (**self).eligible_ids()
    }
}

impl<T: CombatantSource + ?Sized> CombatantSource for &T {
    fn lookup(&self, id: CharacterId) -> Result<Option<CharacterRecord>, StoreError> {
        (**self).lookup(id)
    }

    fn eligible_ids(&self) -> Result<Vec<CharacterId>, StoreError> {
        (**self).eligible_ids()
    }
}
