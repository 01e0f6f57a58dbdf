use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Dice;
use crate::combatant::Combatant;
use crate::error::BattleError;
use crate::roster::CharacterId;

pub const OPENING_LINE: &str = "Que comience la batalla!";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackKind {
    Strong,
    Weak,
}

impl AttackKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AttackKind::Strong => "strong",
            AttackKind::Weak => "weak",
        }
    }

    /// Damage multiplier expressed in half points: strong is x1.5, weak is x1.
    fn half_multiplier(self) -> i64 {
        match self {
            AttackKind::Strong => 3,
            AttackKind::Weak => 2,
        }
    }
}

impl FromStr for AttackKind {
    type Err = BattleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "strong" => Ok(AttackKind::Strong),
            "weak" => Ok(AttackKind::Weak),
            other => Err(BattleError::InvalidAttackKind(other.to_string())),
        }
    }
}

impl fmt::Display for AttackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-session record of an in-progress battle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleState {
    pub char1_id: CharacterId,
    pub char2_id: CharacterId,
    pub char1_hp: i32,
    pub char2_hp: i32,
    pub turn_player: CharacterId,
    pub last_message: String,
}

impl BattleState {
    pub fn new(char1_id: CharacterId, char2_id: CharacterId, starting_hp: i32) -> Self {
        Self {
            char1_id,
            char2_id,
            char1_hp: starting_hp,
            char2_hp: starting_hp,
            turn_player: char1_id,
            last_message: OPENING_LINE.to_string(),
        }
    }

    pub fn involves(&self, id: CharacterId) -> bool {
        id == self.char1_id || id == self.char2_id
    }

    /// The other combatant, or `None` when `id` is not in this battle.
    pub fn opponent_of(&self, id: CharacterId) -> Option<CharacterId> {
        if id == self.char1_id {
            Some(self.char2_id)
        } else if id == self.char2_id {
            Some(self.char1_id)
        } else {
            None
        }
    }

    pub fn hp_of(&self, id: CharacterId) -> Option<i32> {
        if id == self.char1_id {
            Some(self.char1_hp)
        } else if id == self.char2_id {
            Some(self.char2_hp)
        } else {
            None
        }
    }

    /// Subtracts `damage` from `target`. HP may go below zero here; callers clamp when reporting.
    pub fn apply_damage(&mut self, target: CharacterId, damage: i32) {
        if target == self.char1_id {
            self.char1_hp = self.char1_hp.saturating_sub(damage);
        } else if target == self.char2_id {
            self.char2_hp = self.char2_hp.saturating_sub(damage);
        }
    }

    pub fn is_over(&self) -> bool {
        self.char1_hp <= 0 || self.char2_hp <= 0
    }

    /// Surviving combatant once the battle is over.
    pub fn winner(&self) -> Option<CharacterId> {
        if self.char1_hp <= 0 {
            Some(self.char2_id)
        } else if self.char2_hp <= 0 {
            Some(self.char1_id)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Strike {
    pub kind: AttackKind,
    pub hit: bool,
    /// Only set on hits.
    pub critical: bool,
    pub damage: i32,
}

/// Rolls one attack. Both rolls use the attacker's weapon; hit is rolled before critical.
///
/// Damage is kept in half points until the end so the x1.5 of a strong attack is
/// exact, then truncated once after armor: 75 strong vs 15 defense deals 97.
pub fn resolve_strike(
    attacker: &Combatant,
    defender: &Combatant,
    kind: AttackKind,
    dice: &mut Dice,
) -> Strike {
    let hit = dice.chance(attacker.weapon.accuracy);
    let critical = dice.chance(attacker.weapon.critic);

    let mut half_points = i64::from(attacker.weapon.damage) * kind.half_multiplier();
    if critical {
        half_points *= 2;
    }
    half_points = (half_points - 2 * i64::from(defender.armor.defense)).max(0);

    let damage = if hit {
        i32::try_from(half_points / 2).unwrap_or(i32::MAX)
    } else {
        0
    };

    Strike {
        kind,
        hit,
        critical: hit && critical,
        damage,
    }
}

/// Narrative line for a strike, naming the character who attacked.
pub fn narrate(attacker_name: &str, strike: &Strike) -> String {
    if !strike.hit {
        format!("{} lanza un ataque y falla!!", attacker_name)
    } else if strike.critical {
        format!(
            "{} lanza un ataque crítico y realiza {} de daño!!",
            attacker_name, strike.damage
        )
    } else {
        format!(
            "{} lanza un ataque y realiza {} de daño!!",
            attacker_name, strike.damage
        )
    }
}

pub fn victory_line(winner_name: &str) -> String {
    format!("{} gana la batalla!! 🏆", winner_name)
}
