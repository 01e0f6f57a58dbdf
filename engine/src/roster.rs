//! Catalogue of factions, characters and equipment the battle engine reads from.

use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CharacterId(pub u64);

impl fmt::Display for CharacterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for CharacterId {
    fn from(id: u64) -> Self {
        CharacterId(id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Faction {
    pub id: u64,
    pub name: String,
    pub location: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Weapon {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub damage: i32,
    #[serde(default)]
    pub accuracy: Option<u8>,
    #[serde(default)]
    pub critic: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Armor {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub defense: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    pub id: CharacterId,
    pub name: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub faction: Option<u64>,
    #[serde(default)]
    pub equipped_weapon: Option<u64>,
    #[serde(default)]
    pub equipped_armor: Option<u64>,
    #[serde(default)]
    pub inventory: Inventory,
}

impl Character {
    pub fn is_battle_ready(&self) -> bool {
        self.equipped_weapon.is_some() && self.equipped_armor.is_some()
    }
}

/// Items a character carries and may equip.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    #[serde(default)]
    pub weapons: IndexSet<u64>,
    #[serde(default)]
    pub armors: IndexSet<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipKind {
    Friend,
    Enemy,
    Ally,
    Rival,
    #[default]
    Neutral,
}

impl RelationshipKind {
    pub fn label(self) -> &'static str {
        match self {
            RelationshipKind::Friend => "Amigo",
            RelationshipKind::Enemy => "Enemigo",
            RelationshipKind::Ally => "Aliado",
            RelationshipKind::Rival => "Rival",
            RelationshipKind::Neutral => "Neutral",
        }
    }
}

/// Directed link between two characters; at most one per ordered pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    pub character1: CharacterId,
    pub character2: CharacterId,
    #[serde(default)]
    pub kind: RelationshipKind,
}

/// On-disk shape of a roster file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RosterData {
    #[serde(default)]
    pub factions: Vec<Faction>,
    #[serde(default)]
    pub weapons: Vec<Weapon>,
    #[serde(default)]
    pub armors: Vec<Armor>,
    #[serde(default)]
    pub characters: Vec<Character>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RosterError {
    #[error("duplicate {kind} id {id}")]
    DuplicateId { kind: &'static str, id: u64 },

    #[error("unknown character {0}")]
    UnknownCharacter(CharacterId),

    #[error("character {character} references unknown {kind} {id}")]
    UnknownReference {
        character: CharacterId,
        kind: &'static str,
        id: u64,
    },

    #[error("weapon {weapon} has negative damage {damage}")]
    NegativeDamage { weapon: u64, damage: i32 },

    #[error("weapon {weapon} has {field} {value} outside 0..=100")]
    ChanceOutOfRange {
        weapon: u64,
        field: &'static str,
        value: u8,
    },

    #[error("armor {armor} has negative defense {defense}")]
    NegativeDefense { armor: u64, defense: i32 },

    #[error("{kind} {id} is not in character {character}'s inventory")]
    NotInInventory {
        character: CharacterId,
        kind: &'static str,
        id: u64,
    },

    #[error("character {0} cannot have a relationship with itself")]
    SelfRelationship(CharacterId),

    #[error("relationship {character1} -> {character2} already exists")]
    DuplicateRelationship {
        character1: CharacterId,
        character2: CharacterId,
    },

    #[error("no weapon or armor selected")]
    NoEquipmentSelected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RosterFormat {
    Json,
    Yaml,
}

impl RosterFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                RosterFormat::Yaml
            }
            _ => RosterFormat::Json,
        }
    }
}

/// Validated roster. Iteration follows file order.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    factions: IndexMap<u64, Faction>,
    weapons: IndexMap<u64, Weapon>,
    armors: IndexMap<u64, Armor>,
    characters: IndexMap<CharacterId, Character>,
    relationships: IndexMap<(CharacterId, CharacterId), RelationshipKind>,
}

impl Roster {
    pub fn from_data(data: RosterData) -> std::result::Result<Self, RosterError> {
        let mut roster = Roster::default();

        for faction in data.factions {
            if roster.factions.contains_key(&faction.id) {
                return Err(RosterError::DuplicateId { kind: "faction", id: faction.id });
            }
            roster.factions.insert(faction.id, faction);
        }

        for weapon in data.weapons {
            if roster.weapons.contains_key(&weapon.id) {
                return Err(RosterError::DuplicateId { kind: "weapon", id: weapon.id });
            }
            if weapon.damage < 0 {
                return Err(RosterError::NegativeDamage { weapon: weapon.id, damage: weapon.damage });
            }
            for (field, value) in [("accuracy", weapon.accuracy), ("critic", weapon.critic)] {
                if let Some(value) = value.filter(|v| *v > 100) {
                    return Err(RosterError::ChanceOutOfRange { weapon: weapon.id, field, value });
                }
            }
            roster.weapons.insert(weapon.id, weapon);
        }

        for armor in data.armors {
            if roster.armors.contains_key(&armor.id) {
                return Err(RosterError::DuplicateId { kind: "armor", id: armor.id });
            }
            if let Some(defense) = armor.defense.filter(|d| *d < 0) {
                return Err(RosterError::NegativeDefense { armor: armor.id, defense });
            }
            roster.armors.insert(armor.id, armor);
        }

        for character in data.characters {
            if roster.characters.contains_key(&character.id) {
                return Err(RosterError::DuplicateId { kind: "character", id: character.id.0 });
            }
            roster.check_references(&character)?;
            roster.characters.insert(character.id, character);
        }

        for rel in data.relationships {
            roster.relate(rel.character1, rel.character2, rel.kind)?;
        }

        Ok(roster)
    }

    pub fn parse(text: &str, format: RosterFormat) -> Result<Self> {
        let data: RosterData = match format {
            RosterFormat::Json => serde_json::from_str(text).context("failed to parse roster JSON")?,
            RosterFormat::Yaml => serde_yaml::from_str(text).context("failed to parse roster YAML")?,
        };
        Ok(Roster::from_data(data)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read roster: {}", path.display()))?;
        Roster::parse(&text, RosterFormat::from_path(path))
            .with_context(|| format!("invalid roster: {}", path.display()))
    }

    pub fn to_data(&self) -> RosterData {
        RosterData {
            factions: self.factions.values().cloned().collect(),
            weapons: self.weapons.values().cloned().collect(),
            armors: self.armors.values().cloned().collect(),
            characters: self.characters.values().cloned().collect(),
            relationships: self.relationships().collect(),
        }
    }

    fn check_references(&self, character: &Character) -> std::result::Result<(), RosterError> {
        let dangling = |kind: &'static str, id: u64| RosterError::UnknownReference { character: character.id, kind, id };
        if let Some(id) = character.faction.filter(|id| !self.factions.contains_key(id)) {
            return Err(dangling("faction", id));
        }
        if let Some(id) = character.equipped_weapon.filter(|id| !self.weapons.contains_key(id)) {
            return Err(dangling("weapon", id));
        }
        if let Some(id) = character.equipped_armor.filter(|id| !self.armors.contains_key(id)) {
            return Err(dangling("armor", id));
        }
        if let Some(id) = character.inventory.weapons.iter().find(|id| !self.weapons.contains_key(*id)) {
            return Err(dangling("weapon", *id));
        }
        if let Some(id) = character.inventory.armors.iter().find(|id| !self.armors.contains_key(*id)) {
            return Err(dangling("armor", *id));
        }
        Ok(())
    }

    pub fn character(&self, id: CharacterId) -> Option<&Character> {
        self.characters.get(&id)
    }

    pub fn characters(&self) -> impl Iterator<Item = &Character> {
        self.characters.values()
    }

    pub fn weapon(&self, id: u64) -> Option<&Weapon> {
        self.weapons.get(&id)
    }

    pub fn armor(&self, id: u64) -> Option<&Armor> {
        self.armors.get(&id)
    }

    pub fn faction(&self, id: u64) -> Option<&Faction> {
        self.factions.get(&id)
    }

    /// Characters with both equipment slots filled.
    pub fn eligible(&self) -> impl Iterator<Item = &Character> {
        self.characters.values().filter(|c| c.is_battle_ready())
    }

    pub fn faction_members(&self, faction: u64) -> impl Iterator<Item = &Character> {
        self.characters.values().filter(move |c| c.faction == Some(faction))
    }

    /// Faction name paired with its member count, in faction order.
    pub fn member_counts(&self) -> Vec<(String, usize)> {
        self.factions
            .values()
            .map(|f| (f.name.clone(), self.faction_members(f.id).count()))
            .collect()
    }

    /// Characters wearing the given weapon and/or armor. At least one must be given.
    pub fn equipped_with(
        &self,
        weapon: Option<u64>,
        armor: Option<u64>,
    ) -> std::result::Result<Vec<&Character>, RosterError> {
        if weapon.is_none() && armor.is_none() {
            return Err(RosterError::NoEquipmentSelected);
        }
        Ok(self
            .characters
            .values()
            .filter(|c| weapon.is_none_or(|w| c.equipped_weapon == Some(w)))
            .filter(|c| armor.is_none_or(|a| c.equipped_armor == Some(a)))
            .collect())
    }

    /// Equips a weapon from the character's inventory; the one it replaces goes back there.
    pub fn equip_weapon(&mut self, id: CharacterId, weapon: u64) -> std::result::Result<Option<u64>, RosterError> {
        if !self.weapons.contains_key(&weapon) {
            return Err(RosterError::UnknownReference { character: id, kind: "weapon", id: weapon });
        }
        let character = self.character_mut(id)?;
        if !character.inventory.weapons.contains(&weapon) {
            return Err(RosterError::NotInInventory { character: id, kind: "weapon", id: weapon });
        }
        let previous = character.equipped_weapon.replace(weapon);
        if let Some(old) = previous {
            character.inventory.weapons.insert(old);
        }
        Ok(previous)
    }

    pub fn equip_armor(&mut self, id: CharacterId, armor: u64) -> std::result::Result<Option<u64>, RosterError> {
        if !self.armors.contains_key(&armor) {
            return Err(RosterError::UnknownReference { character: id, kind: "armor", id: armor });
        }
        let character = self.character_mut(id)?;
        if !character.inventory.armors.contains(&armor) {
            return Err(RosterError::NotInInventory { character: id, kind: "armor", id: armor });
        }
        let previous = character.equipped_armor.replace(armor);
        if let Some(old) = previous {
            character.inventory.armors.insert(old);
        }
        Ok(previous)
    }

    /// Empties the weapon slot, keeping the weapon in the inventory.
    pub fn unequip_weapon(&mut self, id: CharacterId) -> std::result::Result<Option<u64>, RosterError> {
        let character = self.character_mut(id)?;
        let previous = character.equipped_weapon.take();
        if let Some(old) = previous {
            character.inventory.weapons.insert(old);
        }
        Ok(previous)
    }

    pub fn unequip_armor(&mut self, id: CharacterId) -> std::result::Result<Option<u64>, RosterError> {
        let character = self.character_mut(id)?;
        let previous = character.equipped_armor.take();
        if let Some(old) = previous {
            character.inventory.armors.insert(old);
        }
        Ok(previous)
    }

    /// Adds a catalogue weapon to the inventory. `false` if it was already there.
    pub fn stock_weapon(&mut self, id: CharacterId, weapon: u64) -> std::result::Result<bool, RosterError> {
        if !self.weapons.contains_key(&weapon) {
            return Err(RosterError::UnknownReference { character: id, kind: "weapon", id: weapon });
        }
        Ok(self.character_mut(id)?.inventory.weapons.insert(weapon))
    }

    pub fn stock_armor(&mut self, id: CharacterId, armor: u64) -> std::result::Result<bool, RosterError> {
        if !self.armors.contains_key(&armor) {
            return Err(RosterError::UnknownReference { character: id, kind: "armor", id: armor });
        }
        Ok(self.character_mut(id)?.inventory.armors.insert(armor))
    }

    /// Removes a weapon from the inventory. An equipped copy stays equipped.
    pub fn discard_weapon(&mut self, id: CharacterId, weapon: u64) -> std::result::Result<bool, RosterError> {
        Ok(self.character_mut(id)?.inventory.weapons.shift_remove(&weapon))
    }

    pub fn discard_armor(&mut self, id: CharacterId, armor: u64) -> std::result::Result<bool, RosterError> {
        Ok(self.character_mut(id)?.inventory.armors.shift_remove(&armor))
    }

    /// Records how `character1` regards `character2`.
    pub fn relate(
        &mut self,
        character1: CharacterId,
        character2: CharacterId,
        kind: RelationshipKind,
    ) -> std::result::Result<(), RosterError> {
        if character1 == character2 {
            return Err(RosterError::SelfRelationship(character1));
        }
        for id in [character1, character2] {
            if !self.characters.contains_key(&id) {
                return Err(RosterError::UnknownCharacter(id));
            }
        }
        if self.relationships.contains_key(&(character1, character2)) {
            return Err(RosterError::DuplicateRelationship { character1, character2 });
        }
        self.relationships.insert((character1, character2), kind);
        Ok(())
    }

    pub fn relationships(&self) -> impl Iterator<Item = Relationship> + '_ {
        self.relationships
            .iter()
            .map(|(&(character1, character2), &kind)| Relationship { character1, character2, kind })
    }

    /// Relationships where `id` is on either side.
    pub fn relationships_of(&self, id: CharacterId) -> impl Iterator<Item = Relationship> + '_ {
        self.relationships()
            .filter(move |r| r.character1 == id || r.character2 == id)
    }

    fn character_mut(&mut self, id: CharacterId) -> std::result::Result<&mut Character, RosterError> {
        self.characters
            .get_mut(&id)
            .ok_or(RosterError::UnknownCharacter(id))
    }
}
