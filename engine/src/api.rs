use serde::{Deserialize, Serialize};

use crate::battle::{AttackKind, Strike};
use crate::error::BattleError;
use crate::roster::{CharacterId, Roster};
use crate::rules::BattleRules;
use crate::service::{AttackOutcome, BattleService};
use crate::store::{InMemorySessionStore, SessionId};
use crate::Dice;

/// Attacks after which a duel is called unresolved.
pub const MAX_TURNS: u32 = 1000;

/// How each side picks its attack kind during an automated duel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackPolicy {
    Strong,
    Weak,
    /// Each side opens strong, then alternates.
    #[default]
    Alternate,
}

impl AttackPolicy {
    /// `turn` counts attacks from 1 across both sides.
    pub fn kind_for(self, turn: u32) -> AttackKind {
        match self {
            AttackPolicy::Strong => AttackKind::Strong,
            AttackPolicy::Weak => AttackKind::Weak,
            AttackPolicy::Alternate => {
                if (turn.saturating_sub(1) / 2) % 2 == 0 {
                    AttackKind::Strong
                } else {
                    AttackKind::Weak
                }
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DuelConfig {
    pub char1_id: CharacterId,
    pub char2_id: CharacterId,
    #[serde(default)]
    pub policy: AttackPolicy,
    #[serde(default)]
    pub seed: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct DuelResult {
    pub winner: Option<CharacterId>,
    pub winner_name: Option<String>,
    pub turns: u32,
    pub char1_hp_end: i32,
    pub char2_hp_end: i32,
    pub hits: u32,
    pub misses: u32,
    pub crits: u32,
    pub log: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct DuelStats {
    pub samples: u32,
    pub char1_wins: u32,
    pub char2_wins: u32,
    pub unresolved: u32,
    pub avg_turns: f64,
    pub hit_rate: f64,
    pub crit_rate: f64,
}

#[derive(Default)]
struct Tally {
    hits: u32,
    misses: u32,
    crits: u32,
}

impl Tally {
    fn record(&mut self, strike: &Strike) {
        if strike.hit {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
        if strike.critical {
            self.crits += 1;
        }
    }
}

/// Plays one battle to the end through the same service a front end would use.
pub fn simulate_duel(
    roster: &Roster,
    rules: &BattleRules,
    cfg: &DuelConfig,
) -> Result<DuelResult, BattleError> {
    let service = BattleService::new(
        roster,
        InMemorySessionStore::new(),
        *rules,
        Dice::from_seed(cfg.seed),
    );
    let session = SessionId::from("duel");

    let start = service.start_battle(&session, cfg.char1_id, cfg.char2_id)?;
    let [first, second] = &start.combatants;
    let mut log = vec![
        format!(
            "[START] {} vs {} ({} HP each)",
            first.name, second.name, rules.starting_hp
        ),
        start.state.last_message.clone(),
    ];

    let mut attacker = start.state.turn_player;
    let mut char1_hp = start.state.char1_hp;
    let mut char2_hp = start.state.char2_hp;
    let mut tally = Tally::default();

    for turn in 1..=MAX_TURNS {
        let kind = cfg.policy.kind_for(turn);
        match service.attack(&session, attacker, kind.as_str())? {
            AttackOutcome::InProgress { state, strike } => {
                tally.record(&strike);
                log.push(format!("[TURN {}][{}] {}", turn, kind, state.last_message));
                char1_hp = state.char1_hp;
                char2_hp = state.char2_hp;
                attacker = state.turn_player;
            }
            AttackOutcome::Ended(end) => {
                tally.record(&end.strike);
                log.push(format!("[TURN {}][{}] {}", turn, kind, end.message));
                log.push(format!("[END] {}", end.winner_message));
                return Ok(DuelResult {
                    winner: Some(end.winner_id),
                    winner_name: Some(end.winner_name),
                    turns: turn,
                    char1_hp_end: end.char1_hp,
                    char2_hp_end: end.char2_hp,
                    hits: tally.hits,
                    misses: tally.misses,
                    crits: tally.crits,
                    log,
                });
            }
        }
    }

    log.push(format!("[END] no winner after {} turns", MAX_TURNS));
    Ok(DuelResult {
        winner: None,
        winner_name: None,
        turns: MAX_TURNS,
        char1_hp_end: char1_hp,
        char2_hp_end: char2_hp,
        hits: tally.hits,
        misses: tally.misses,
        crits: tally.crits,
        log,
    })
}

/// Runs `samples` duels; trial `i` is seeded with `cfg.seed + i`.
pub fn simulate_duel_many(
    roster: &Roster,
    rules: &BattleRules,
    cfg: &DuelConfig,
    samples: u32,
) -> Result<DuelStats, BattleError> {
    let mut stats = DuelStats {
        samples,
        char1_wins: 0,
        char2_wins: 0,
        unresolved: 0,
        avg_turns: 0.0,
        hit_rate: 0.0,
        crit_rate: 0.0,
    };
    let mut resolved_turns = 0u64;
    let mut tally = Tally::default();

    for i in 0..samples {
        let trial = DuelConfig {
            seed: cfg.seed.wrapping_add(u64::from(i)),
            ..cfg.clone()
        };
        let res = simulate_duel(roster, rules, &trial)?;
        tally.hits += res.hits;
        tally.misses += res.misses;
        tally.crits += res.crits;
        match res.winner {
            Some(id) if id == cfg.char1_id => stats.char1_wins += 1,
            Some(_) => stats.char2_wins += 1,
            None => stats.unresolved += 1,
        }
        if res.winner.is_some() {
            resolved_turns += u64::from(res.turns);
        }
    }

    let resolved = stats.char1_wins + stats.char2_wins;
    if resolved > 0 {
        stats.avg_turns = resolved_turns as f64 / f64::from(resolved);
    }
    let attempts = tally.hits + tally.misses;
    if attempts > 0 {
        stats.hit_rate = f64::from(tally.hits) / f64::from(attempts);
    }
    if tally.hits > 0 {
        stats.crit_rate = f64::from(tally.crits) / f64::from(tally.hits);
    }
    Ok(stats)
}
