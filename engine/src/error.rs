//! Error taxonomy shared by the battle service and its front ends.

use std::fmt;

use thiserror::Error;

use crate::roster::CharacterId;

/// Failures of the storage behind sessions or the roster.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("store lock was poisoned")]
    LockPoisoned,

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EquipmentSlot {
    Weapon,
    Armor,
}

impl fmt::Display for EquipmentSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EquipmentSlot::Weapon => f.write_str("weapon"),
            EquipmentSlot::Armor => f.write_str("armor"),
        }
    }
}

/// Why a start request (or a combatant re-read mid-battle) was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationReason {
    #[error("a combatant cannot fight itself")]
    SameCombatant,

    #[error("character {0} does not exist")]
    UnknownCharacter(CharacterId),

    #[error("character {id} has no {slot} equipped")]
    NotEquipped { id: CharacterId, slot: EquipmentSlot },

    #[error("malformed request: {0}")]
    MalformedRequest(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BattleError {
    #[error("{0}")]
    Validation(#[from] ValidationReason),

    #[error("no battle in progress")]
    InvalidState,

    #[error("character {0} is not part of this battle")]
    InvalidAttacker(CharacterId),

    #[error("not your turn: it is character {turn_player}'s turn")]
    OutOfTurn {
        attacker: CharacterId,
        turn_player: CharacterId,
    },

    #[error("invalid attack kind '{0}' (expected 'strong' or 'weak')")]
    InvalidAttackKind(String),

    #[error("character {0} not found")]
    NotFound(CharacterId),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl BattleError {
    /// Stable, machine-checkable reason code.
    pub fn code(&self) -> &'static str {
        match self {
            BattleError::Validation(_) => "validation_error",
            BattleError::InvalidState => "invalid_state",
            BattleError::InvalidAttacker(_) => "invalid_attacker",
            BattleError::OutOfTurn { .. } => "out_of_turn",
            BattleError::InvalidAttackKind(_) => "invalid_attack_kind",
            BattleError::NotFound(_) => "not_found",
            BattleError::Store(_) | BattleError::Internal(_) => "internal_error",
        }
    }

    /// Client errors are the caller's fault and safe to echo back verbatim.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, BattleError::Store(_) | BattleError::Internal(_))
    }
}

pub type Result<T> = std::result::Result<T, BattleError>;
