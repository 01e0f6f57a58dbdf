//! JSON request/response shapes for front ends.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::battle::BattleState;
use crate::combatant::Combatant;
use crate::error::{BattleError, ValidationReason};
use crate::roster::CharacterId;
use crate::service::{AttackOutcome, BattleStart};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartBattleRequest {
    pub char1_id: CharacterId,
    pub char2_id: CharacterId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartBattleResponse {
    pub state: BattleState,
    pub combatants: [Combatant; 2],
}

impl From<BattleStart> for StartBattleResponse {
    fn from(start: BattleStart) -> Self {
        Self {
            state: start.state,
            combatants: start.combatants,
        }
    }
}

/// `attack_kind` stays a string so unknown kinds reach the resolver and fail as
/// `invalid_attack_kind` instead of as a decoding error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackRequest {
    pub attacker_id: CharacterId,
    pub attack_kind: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AttackResponse {
    InProgress {
        char1_id: CharacterId,
        char1_hp: i32,
        char2_id: CharacterId,
        char2_hp: i32,
        turn_player: CharacterId,
        message: String,
        hit: bool,
        critical: bool,
        damage: i32,
    },
    Ended {
        winner_id: CharacterId,
        winner_name: String,
        char1_hp: i32,
        char2_hp: i32,
        message: String,
        winner_message: String,
    },
}

impl From<AttackOutcome> for AttackResponse {
    fn from(outcome: AttackOutcome) -> Self {
        match outcome {
            AttackOutcome::InProgress { state, strike } => AttackResponse::InProgress {
                char1_id: state.char1_id,
                char1_hp: state.char1_hp.max(0),
                char2_id: state.char2_id,
                char2_hp: state.char2_hp.max(0),
                turn_player: state.turn_player,
                message: state.last_message,
                hit: strike.hit,
                critical: strike.critical,
                damage: strike.damage,
            },
            AttackOutcome::Ended(end) => AttackResponse::Ended {
                winner_id: end.winner_id,
                winner_name: end.winner_name,
                char1_hp: end.char1_hp,
                char2_hp: end.char2_hp,
                message: end.message,
                winner_message: end.winner_message,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error_code: String,
    pub error_message: String,
}

impl From<&BattleError> for ErrorBody {
    fn from(err: &BattleError) -> Self {
        let error_message = if err.is_client_error() {
            err.to_string()
        } else {
            "internal server error".to_string()
        };
        Self {
            error_code: err.code().to_string(),
            error_message,
        }
    }
}

/// `{"ok":true,"result":...}` or `{"ok":false,"error":{...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply<T> {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl<T> Reply<T> {
    pub fn success(result: T) -> Self {
        Self {
            ok: true,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(err: &BattleError) -> Self {
        Self {
            ok: false,
            result: None,
            error: Some(err.into()),
        }
    }
}

impl<T, U: Into<T>> From<Result<U, BattleError>> for Reply<T> {
    fn from(res: Result<U, BattleError>) -> Self {
        match res {
            Ok(value) => Reply::success(value.into()),
            Err(err) => Reply::failure(&err),
        }
    }
}

/// Decodes a request body; malformed or incomplete input is a validation error.
pub fn decode<T: DeserializeOwned>(json: &str) -> Result<T, BattleError> {
    serde_json::from_str(json)
        .map_err(|e| ValidationReason::MalformedRequest(e.to_string()).into())
}
