//! Battle Initiator and Attack Resolver over a session store.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::Dice;
use crate::battle::{self, AttackKind, BattleState, Strike};
use crate::combatant::{Combatant, CombatantSource};
use crate::error::{BattleError, Result, ValidationReason};
use crate::roster::CharacterId;
use crate::rules::BattleRules;
use crate::store::{SessionId, SessionStore};

/// Result of a successful start: the new state plus both resolved combatants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleStart {
    pub state: BattleState,
    pub combatants: [Combatant; 2],
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleEnd {
    pub winner_id: CharacterId,
    pub winner_name: String,
    pub char1_id: CharacterId,
    pub char1_hp: i32,
    pub char2_id: CharacterId,
    pub char2_hp: i32,
    pub strike: Strike,
    pub message: String,
    pub winner_message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttackOutcome {
    InProgress { state: BattleState, strike: Strike },
    Ended(BattleEnd),
}

pub struct BattleService<C, S> {
    source: C,
    store: S,
    rules: BattleRules,
    dice: Mutex<Dice>,
}

impl<C: CombatantSource, S: SessionStore> BattleService<C, S> {
    pub fn new(source: C, store: S, rules: BattleRules, dice: Dice) -> Self {
        Self {
            source,
            store,
            rules,
            dice: Mutex::new(dice),
        }
    }

    pub fn rules(&self) -> &BattleRules {
        &self.rules
    }

    pub fn source(&self) -> &C {
        &self.source
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Starts a battle in `session`, replacing whatever battle was there.
    pub fn start_battle(
        &self,
        session: &SessionId,
        char1_id: CharacterId,
        char2_id: CharacterId,
    ) -> Result<BattleStart> {
        self.try_start(session, char1_id, char2_id)
            .inspect_err(|e| report("start_battle", session, e))
    }

    fn try_start(
        &self,
        session: &SessionId,
        char1_id: CharacterId,
        char2_id: CharacterId,
    ) -> Result<BattleStart> {
        if char1_id == char2_id {
            return Err(ValidationReason::SameCombatant.into());
        }
        let first = self.entrant(char1_id)?;
        let second = self.entrant(char2_id)?;

        let state = BattleState::new(char1_id, char2_id, self.rules.starting_hp);
        self.store.put(session, state.clone())?;
        info!(
            %session,
            char1 = %first.name,
            char2 = %second.name,
            hp = self.rules.starting_hp,
            "battle started"
        );
        Ok(BattleStart {
            state,
            combatants: [first, second],
        })
    }

    /// Resolves one attack by `attacker_id`. Nothing is written unless every check passes.
    pub fn attack(
        &self,
        session: &SessionId,
        attacker_id: CharacterId,
        attack_kind: &str,
    ) -> Result<AttackOutcome> {
        self.store
            .with_session(session, |slot| self.resolve(slot, attacker_id, attack_kind))
            .inspect_err(|e| report("attack", session, e))
            .inspect(|outcome| {
                if let AttackOutcome::Ended(end) = outcome {
                    info!(%session, winner = %end.winner_name, "battle ended");
                }
            })
    }

    fn resolve(
        &self,
        slot: &mut Option<BattleState>,
        attacker_id: CharacterId,
        attack_kind: &str,
    ) -> Result<AttackOutcome> {
        let state = slot.as_mut().ok_or(BattleError::InvalidState)?;
        let defender_id = state
            .opponent_of(attacker_id)
            .ok_or(BattleError::InvalidAttacker(attacker_id))?;
        if state.turn_player != attacker_id {
            return Err(BattleError::OutOfTurn {
                attacker: attacker_id,
                turn_player: state.turn_player,
            });
        }
        let kind: AttackKind = attack_kind.parse()?;

        // Stats are re-read every turn so equipment edits apply to the next attack.
        let attacker = self.combatant(attacker_id)?;
        let defender = self.combatant(defender_id)?;

        let strike = {
            let mut dice = self
                .dice
                .lock()
                .map_err(|_| BattleError::Internal("dice lock poisoned".to_string()))?;
            battle::resolve_strike(&attacker, &defender, kind, &mut dice)
        };
        debug!(
            attacker = %attacker.name,
            defender = %defender.name,
            kind = %kind,
            hit = strike.hit,
            critical = strike.critical,
            damage = strike.damage,
            "strike resolved"
        );

        state.apply_damage(defender_id, strike.damage);
        let message = battle::narrate(&attacker.name, &strike);

        if let Some(winner_id) = state.winner() {
            let winner_name = if winner_id == attacker.id {
                attacker.name
            } else {
                defender.name
            };
            let end = BattleEnd {
                winner_id,
                char1_id: state.char1_id,
                char1_hp: state.char1_hp.max(0),
                char2_id: state.char2_id,
                char2_hp: state.char2_hp.max(0),
                strike,
                message,
                winner_message: battle::victory_line(&winner_name),
                winner_name,
            };
            *slot = None;
            return Ok(AttackOutcome::Ended(end));
        }

        state.turn_player = defender_id;
        state.last_message = message;
        Ok(AttackOutcome::InProgress {
            state: state.clone(),
            strike,
        })
    }

    /// The battle in progress for `session`, if any.
    pub fn current(&self, session: &SessionId) -> Result<Option<BattleState>> {
        Ok(self.store.load(session)?)
    }

    /// Every character that could enter a battle right now. Characters that stop
    /// qualifying between the listing and the lookup are left out.
    pub fn eligible(&self) -> Result<Vec<Combatant>> {
        let mut ready = Vec::new();
        for id in self.source.eligible_ids()? {
            match self.entrant(id) {
                Ok(c) => ready.push(c),
                Err(BattleError::Validation(reason)) => {
                    debug!(%id, "skipping character that is no longer eligible: {}", reason);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(ready)
    }

    fn entrant(&self, id: CharacterId) -> Result<Combatant> {
        let record = self
            .source
            .lookup(id)?
            .ok_or(ValidationReason::UnknownCharacter(id))?;
        Ok(Combatant::resolve(&record, &self.rules)?)
    }

    fn combatant(&self, id: CharacterId) -> Result<Combatant> {
        let record = self.source.lookup(id)?.ok_or(BattleError::NotFound(id))?;
        Ok(Combatant::resolve(&record, &self.rules)?)
    }
}

fn report(op: &str, session: &SessionId, err: &BattleError) {
    if err.is_client_error() {
        warn!(%session, op, code = err.code(), "request rejected: {}", err);
    } else {
        error!(%session, op, "internal failure: {}", err);
    }
}
