#![allow(dead_code)]

use engine::roster::{Armor, Character, Inventory, RosterData, Weapon};
use engine::{
    BattleRules, BattleService, CharacterId, Dice, InMemorySessionStore, Roster, SessionId,
};

pub const A: CharacterId = CharacterId(1);
pub const B: CharacterId = CharacterId(2);

/// One character with its own weapon and armor, both keyed by the character id.
#[derive(Clone, Copy)]
pub struct Fighter {
    pub id: u64,
    pub name: &'static str,
    pub damage: i32,
    pub accuracy: Option<u8>,
    pub critic: Option<u8>,
    pub defense: Option<i32>,
}

impl Fighter {
    /// Always hits, never crits, no armor.
    pub fn new(id: u64, name: &'static str) -> Self {
        Self {
            id,
            name,
            damage: 50,
            accuracy: Some(100),
            critic: Some(0),
            defense: Some(0),
        }
    }

    pub fn damage(mut self, damage: i32) -> Self {
        self.damage = damage;
        self
    }

    pub fn accuracy(mut self, accuracy: Option<u8>) -> Self {
        self.accuracy = accuracy;
        self
    }

    pub fn critic(mut self, critic: Option<u8>) -> Self {
        self.critic = critic;
        self
    }

    pub fn defense(mut self, defense: Option<i32>) -> Self {
        self.defense = defense;
        self
    }
}

pub fn roster_data(fighters: &[Fighter]) -> RosterData {
    let mut data = RosterData::default();
    for f in fighters {
        data.weapons.push(Weapon {
            id: f.id,
            name: format!("{}'s weapon", f.name),
            description: String::new(),
            damage: f.damage,
            accuracy: f.accuracy,
            critic: f.critic,
        });
        data.armors.push(Armor {
            id: f.id,
            name: format!("{}'s armor", f.name),
            description: String::new(),
            defense: f.defense,
        });
        data.characters.push(Character {
            id: CharacterId(f.id),
            name: f.name.to_string(),
            location: String::new(),
            faction: None,
            equipped_weapon: Some(f.id),
            equipped_armor: Some(f.id),
            inventory: Inventory::default(),
        });
    }
    data
}

pub fn roster(fighters: &[Fighter]) -> Roster {
    Roster::from_data(roster_data(fighters)).expect("valid roster")
}

pub fn pair(a: Fighter, b: Fighter) -> Roster {
    roster(&[a, b])
}

pub fn service(roster: Roster, rolls: Vec<u8>) -> BattleService<Roster, InMemorySessionStore> {
    service_with(roster, Dice::from_scripted(rolls))
}

pub fn service_with(roster: Roster, dice: Dice) -> BattleService<Roster, InMemorySessionStore> {
    BattleService::new(roster, InMemorySessionStore::new(), BattleRules::default(), dice)
}

pub fn session() -> SessionId {
    SessionId::from("test-session")
}
