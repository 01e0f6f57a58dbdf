mod common;

use std::sync::{Arc, Mutex, RwLock};

use common::{Fighter, A, B};
use engine::combatant::CharacterRecord;
use engine::error::EquipmentSlot;
use engine::roster::Weapon;
use engine::{
    AttackOutcome, BattleError, BattleRules, BattleService, BattleState, CharacterId,
    CombatantSource, Dice, InMemorySessionStore, Roster, StoreError, ValidationReason,
};

fn in_progress(outcome: AttackOutcome) -> (BattleState, engine::Strike) {
    match outcome {
        AttackOutcome::InProgress { state, strike } => (state, strike),
        AttackOutcome::Ended(end) => panic!("battle ended unexpectedly: {:?}", end),
    }
}

#[test]
fn strong_hit_through_armor_truncates_half_points() {
    let roster = common::pair(
        Fighter::new(1, "Aria").damage(75).accuracy(Some(100)).critic(Some(0)),
        Fighter::new(2, "Borin").defense(Some(15)),
    );
    let svc = common::service(roster, vec![42]);
    let session = common::session();
    svc.start_battle(&session, A, B).unwrap();

    let (state, strike) = in_progress(svc.attack(&session, A, "strong").unwrap());
    assert!(strike.hit);
    assert!(!strike.critical);
    assert_eq!(strike.damage, 97);
    assert_eq!(state.char1_hp, 1000);
    assert_eq!(state.char2_hp, 903);
    assert_eq!(state.turn_player, B);
    assert_eq!(state.last_message, "Aria lanza un ataque y realiza 97 de daño!!");
}

#[test]
fn weak_hit_uses_raw_weapon_damage() {
    let roster = common::pair(
        Fighter::new(1, "Aria").damage(75),
        Fighter::new(2, "Borin").defense(Some(15)),
    );
    let svc = common::service(roster, vec![42]);
    let session = common::session();
    svc.start_battle(&session, A, B).unwrap();

    let (state, strike) = in_progress(svc.attack(&session, A, "weak").unwrap());
    assert_eq!(strike.damage, 60);
    assert_eq!(state.char2_hp, 940);
}

#[test]
fn critical_doubles_before_armor() {
    let roster = common::pair(
        Fighter::new(1, "Aria").damage(50).critic(Some(100)),
        Fighter::new(2, "Borin").defense(Some(10)),
    );
    let svc = common::service(roster, vec![0]);
    let session = common::session();
    svc.start_battle(&session, A, B).unwrap();

    let (state, strike) = in_progress(svc.attack(&session, A, "weak").unwrap());
    assert!(strike.critical);
    assert_eq!(strike.damage, 90);
    assert_eq!(state.char2_hp, 910);
    assert_eq!(
        state.last_message,
        "Aria lanza un ataque crítico y realiza 90 de daño!!"
    );
}

#[test]
fn hit_and_crit_rolls_come_from_the_attacker_weapon() {
    // Aria: 30% to hit, Borin: 100%. The first roll (29) only hits if Aria's accuracy is used.
    let roster = common::pair(
        Fighter::new(1, "Aria").accuracy(Some(30)).critic(Some(20)),
        Fighter::new(2, "Borin").accuracy(Some(100)).critic(Some(100)),
    );
    let svc = common::service(roster, vec![29, 20]);
    let session = common::session();
    svc.start_battle(&session, A, B).unwrap();

    let (_, strike) = in_progress(svc.attack(&session, A, "weak").unwrap());
    assert!(strike.hit);
    assert!(!strike.critical, "a roll of 20 misses a 20% crit chance");
}

#[test]
fn armor_heavier_than_the_blow_deals_nothing() {
    let roster = common::pair(
        Fighter::new(1, "Aria").damage(10),
        Fighter::new(2, "Borin").defense(Some(50)),
    );
    let svc = common::service(roster, vec![0]);
    let session = common::session();
    svc.start_battle(&session, A, B).unwrap();

    let (state, strike) = in_progress(svc.attack(&session, A, "strong").unwrap());
    assert!(strike.hit);
    assert_eq!(strike.damage, 0);
    assert_eq!(state.char2_hp, 1000);
    assert_eq!(state.last_message, "Aria lanza un ataque y realiza 0 de daño!!");
}

#[test]
fn zero_accuracy_always_misses_but_the_turn_still_passes() {
    let roster = common::pair(
        Fighter::new(1, "Aria").damage(500).accuracy(Some(0)).critic(Some(100)),
        Fighter::new(2, "Borin").damage(500).accuracy(Some(0)),
    );
    let svc = common::service_with(roster, Dice::from_seed(99));
    let session = common::session();
    svc.start_battle(&session, A, B).unwrap();

    let mut attacker = A;
    for _ in 0..40 {
        let (state, strike) = in_progress(svc.attack(&session, attacker, "strong").unwrap());
        assert!(!strike.hit);
        assert!(!strike.critical);
        assert_eq!(strike.damage, 0);
        assert_eq!((state.char1_hp, state.char2_hp), (1000, 1000));
        assert_ne!(state.turn_player, attacker);
        assert!(state.last_message.ends_with("lanza un ataque y falla!!"));
        attacker = state.turn_player;
    }
}

#[test]
fn turns_alternate_between_the_two_combatants() {
    let svc = common::service(common::pair(Fighter::new(1, "Aria"), Fighter::new(2, "Borin")), vec![0]);
    let session = common::session();
    svc.start_battle(&session, A, B).unwrap();

    let (state, _) = in_progress(svc.attack(&session, A, "weak").unwrap());
    assert_eq!(state.turn_player, B);
    let (state, _) = in_progress(svc.attack(&session, B, "weak").unwrap());
    assert_eq!(state.turn_player, A);
    assert_eq!((state.char1_hp, state.char2_hp), (950, 950));
    assert_eq!(state.last_message, "Borin lanza un ataque y realiza 50 de daño!!");
}

#[test]
fn out_of_turn_attack_changes_nothing() {
    let svc = common::service(common::pair(Fighter::new(1, "Aria"), Fighter::new(2, "Borin")), vec![0]);
    let session = common::session();
    svc.start_battle(&session, A, B).unwrap();
    let before = svc.current(&session).unwrap();

    let err = svc.attack(&session, B, "strong").unwrap_err();
    assert_eq!(
        err,
        BattleError::OutOfTurn {
            attacker: B,
            turn_player: A,
        }
    );
    assert_eq!(err.code(), "out_of_turn");
    assert_eq!(svc.current(&session).unwrap(), before);
}

#[test]
fn out_of_turn_is_reported_before_a_bad_attack_kind() {
    let svc = common::service(common::pair(Fighter::new(1, "Aria"), Fighter::new(2, "Borin")), vec![0]);
    let session = common::session();
    svc.start_battle(&session, A, B).unwrap();

    let err = svc.attack(&session, B, "fuerte").unwrap_err();
    assert_eq!(err.code(), "out_of_turn");
}

#[test]
fn unknown_attack_kind_changes_nothing() {
    let svc = common::service(common::pair(Fighter::new(1, "Aria"), Fighter::new(2, "Borin")), vec![0]);
    let session = common::session();
    svc.start_battle(&session, A, B).unwrap();
    let before = svc.current(&session).unwrap();

    for kind in ["fuerte", "STRONG", "", "medium"] {
        let err = svc.attack(&session, A, kind).unwrap_err();
        assert_eq!(err, BattleError::InvalidAttackKind(kind.to_string()));
        assert_eq!(svc.current(&session).unwrap(), before);
    }
}

#[test]
fn outsider_is_an_invalid_attacker() {
    let svc = common::service(common::pair(Fighter::new(1, "Aria"), Fighter::new(2, "Borin")), vec![0]);
    let session = common::session();
    svc.start_battle(&session, A, B).unwrap();

    let err = svc.attack(&session, CharacterId(7), "weak").unwrap_err();
    assert_eq!(err, BattleError::InvalidAttacker(CharacterId(7)));
    assert_eq!(err.code(), "invalid_attacker");
}

#[test]
fn attacking_without_a_battle_is_invalid_state() {
    let svc = common::service(common::pair(Fighter::new(1, "Aria"), Fighter::new(2, "Borin")), vec![0]);
    let err = svc.attack(&common::session(), A, "weak").unwrap_err();
    assert_eq!(err, BattleError::InvalidState);
    assert_eq!(err.code(), "invalid_state");
}

#[test]
fn lethal_blow_ends_the_battle_and_clears_the_session() {
    let roster = common::pair(
        Fighter::new(1, "Aria").damage(1000),
        Fighter::new(2, "Borin"),
    );
    let svc = common::service(roster, vec![0]);
    let session = common::session();
    svc.start_battle(&session, A, B).unwrap();

    let end = match svc.attack(&session, A, "strong").unwrap() {
        AttackOutcome::Ended(end) => end,
        other => panic!("expected the battle to end, got {:?}", other),
    };
    assert_eq!(end.winner_id, A);
    assert_eq!(end.winner_name, "Aria");
    assert_eq!(end.char1_hp, 1000);
    assert_eq!(end.char2_hp, 0);
    assert_eq!(end.strike.damage, 1500);
    assert_eq!(end.message, "Aria lanza un ataque y realiza 1500 de daño!!");
    assert_eq!(end.winner_message, "Aria gana la batalla!! 🏆");

    assert_eq!(svc.current(&session).unwrap(), None);
    assert_eq!(svc.attack(&session, B, "weak").unwrap_err(), BattleError::InvalidState);
    assert_eq!(svc.attack(&session, A, "weak").unwrap_err(), BattleError::InvalidState);
}

#[test]
fn reaching_exactly_zero_hp_ends_the_battle() {
    let roster = common::pair(
        Fighter::new(1, "Aria").damage(0),
        Fighter::new(2, "Borin").damage(500),
    );
    let svc = common::service(roster, vec![0]);
    let session = common::session();
    svc.start_battle(&session, A, B).unwrap();

    in_progress(svc.attack(&session, A, "weak").unwrap());
    in_progress(svc.attack(&session, B, "weak").unwrap());
    in_progress(svc.attack(&session, A, "weak").unwrap());
    match svc.attack(&session, B, "weak").unwrap() {
        AttackOutcome::Ended(end) => {
            assert_eq!(end.winner_id, B);
            assert_eq!(end.winner_name, "Borin");
            assert_eq!((end.char1_hp, end.char2_hp), (0, 1000));
        }
        other => panic!("expected the battle to end, got {:?}", other),
    }
}

fn shared_service(roster: Roster) -> (Arc<RwLock<Roster>>, BattleService<Arc<RwLock<Roster>>, InMemorySessionStore>) {
    let shared = Arc::new(RwLock::new(roster));
    let svc = BattleService::new(
        Arc::clone(&shared),
        InMemorySessionStore::new(),
        BattleRules::default(),
        Dice::from_scripted(vec![0]),
    );
    (shared, svc)
}

#[test]
fn equipment_removed_mid_battle_rejects_the_attack() {
    let (shared, svc) = shared_service(common::pair(Fighter::new(1, "Aria"), Fighter::new(2, "Borin")));
    let session = common::session();
    svc.start_battle(&session, A, B).unwrap();
    let before = svc.current(&session).unwrap();

    let weapon = shared.write().unwrap().unequip_weapon(A).unwrap();
    let err = svc.attack(&session, A, "weak").unwrap_err();
    assert_eq!(
        err,
        BattleError::Validation(ValidationReason::NotEquipped {
            id: A,
            slot: EquipmentSlot::Weapon,
        })
    );
    assert_eq!(svc.current(&session).unwrap(), before);

    shared.write().unwrap().equip_weapon(A, weapon.unwrap()).unwrap();
    let (state, _) = in_progress(svc.attack(&session, A, "weak").unwrap());
    assert_eq!(state.char2_hp, 950);
}

#[test]
fn weapon_swaps_apply_from_the_next_attack() {
    let mut data = common::roster_data(&[Fighter::new(1, "Aria"), Fighter::new(2, "Borin")]);
    data.weapons.push(Weapon {
        id: 99,
        name: "Mandoble".to_string(),
        description: String::new(),
        damage: 200,
        accuracy: Some(100),
        critic: Some(0),
    });
    data.characters[0].inventory.weapons.insert(99);
    let (shared, svc) = shared_service(Roster::from_data(data).unwrap());
    let session = common::session();
    svc.start_battle(&session, A, B).unwrap();

    in_progress(svc.attack(&session, A, "weak").unwrap());
    in_progress(svc.attack(&session, B, "weak").unwrap());
    shared.write().unwrap().equip_weapon(A, 99).unwrap();
    let (state, strike) = in_progress(svc.attack(&session, A, "weak").unwrap());
    assert_eq!(strike.damage, 200);
    assert_eq!(state.char2_hp, 1000 - 50 - 200);
}

/// Source that can hide a character or fail outright.
struct FlakySource {
    roster: Roster,
    hidden: Mutex<Option<CharacterId>>,
    down: Mutex<bool>,
}

impl CombatantSource for FlakySource {
    fn lookup(&self, id: CharacterId) -> Result<Option<CharacterRecord>, StoreError> {
        if *self.down.lock().unwrap() {
            return Err(StoreError::Unavailable("database offline".to_string()));
        }
        if *self.hidden.lock().unwrap() == Some(id) {
            return Ok(None);
        }
        self.roster.lookup(id)
    }

    fn eligible_ids(&self) -> Result<Vec<CharacterId>, StoreError> {
        self.roster.eligible_ids()
    }
}

fn flaky_service() -> BattleService<Arc<FlakySource>, InMemorySessionStore> {
    let source = Arc::new(FlakySource {
        roster: common::pair(Fighter::new(1, "Aria"), Fighter::new(2, "Borin")),
        hidden: Mutex::new(None),
        down: Mutex::new(false),
    });
    BattleService::new(
        source,
        InMemorySessionStore::new(),
        BattleRules::default(),
        Dice::from_scripted(vec![0]),
    )
}

#[test]
fn vanished_combatant_is_not_found() {
    let svc = flaky_service();
    let session = common::session();
    svc.start_battle(&session, A, B).unwrap();
    let before = svc.current(&session).unwrap();

    *svc.source().hidden.lock().unwrap() = Some(B);
    let err = svc.attack(&session, A, "weak").unwrap_err();
    assert_eq!(err, BattleError::NotFound(B));
    assert_eq!(err.code(), "not_found");
    assert_eq!(svc.current(&session).unwrap(), before);
}

#[test]
fn storage_outage_is_an_internal_error() {
    let svc = flaky_service();
    let session = common::session();
    svc.start_battle(&session, A, B).unwrap();

    *svc.source().down.lock().unwrap() = true;
    let err = svc.attack(&session, A, "weak").unwrap_err();
    assert!(!err.is_client_error());
    assert_eq!(err.code(), "internal_error");
    assert_eq!(svc.current(&session).unwrap().unwrap().char2_hp, 1000);
}
