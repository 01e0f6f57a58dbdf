use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

pub mod api;
pub mod battle;
pub mod combatant;
pub mod content;
pub mod error;
pub mod protocol;
pub mod roster;
pub mod rules;
pub mod service;
pub mod store;

pub use battle::{AttackKind, BattleState, Strike};
pub use combatant::{ArmorStats, Combatant, CombatantSource, WeaponStats};
pub use error::{BattleError, StoreError, ValidationReason};
pub use roster::{CharacterId, Roster};
pub use rules::BattleRules;
pub use service::{AttackOutcome, BattleEnd, BattleService, BattleStart};
pub use store::{InMemorySessionStore, SessionId, SessionStore};

enum Source {
    Seeded(ChaCha8Rng),
    Scripted { rolls: Vec<u8>, next: usize },
}

/// Uniform percentile roller behind every hit and critical check.
pub struct Dice {
    source: Source,
}

impl Dice {
    pub fn from_seed(seed: u64) -> Self {
        Self { source: Source::Seeded(ChaCha8Rng::seed_from_u64(seed)) }
    }

    pub fn from_entropy() -> Self {
        Self::from_seed(rand::random())
    }

    /// Replays `rolls` in order, wrapping around at the end. An empty script always rolls 0.
    pub fn from_scripted(rolls: Vec<u8>) -> Self {
        Self { source: Source::Scripted { rolls, next: 0 } }
    }

    /// Roll in `0..=99`. A check against chance `c` passes when the roll is below `c`.
    pub fn percent(&mut self) -> u8 {
        match &mut self.source {
            Source::Seeded(rng) => rng.gen_range(0..100),
            Source::Scripted { rolls, next } => {
                if rolls.is_empty() {
                    return 0;
                }
                let roll = rolls[*next % rolls.len()];
                *next += 1;
                roll
            }
        }
    }

    pub fn chance(&mut self, percent: u8) -> bool {
        self.percent() < percent
    }
}

impl std::fmt::Debug for Dice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.source {
            Source::Seeded(_) => f.write_str("Dice(seeded)"),
            Source::Scripted { rolls, next } => {
                write!(f, "Dice(scripted {:?} @{})", rolls, next)
            }
        }
    }
}
