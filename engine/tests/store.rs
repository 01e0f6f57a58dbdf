mod common;

use std::sync::Barrier;
use std::thread;

use common::{Fighter, A, B};
use engine::{
    AttackOutcome, BattleError, BattleState, CharacterId, InMemorySessionStore, SessionId,
    SessionStore, StoreError,
};

fn sample_state() -> BattleState {
    BattleState::new(CharacterId(1), CharacterId(2), 1000)
}

#[test]
fn put_load_remove() {
    let store = InMemorySessionStore::new();
    let session = SessionId::from("s1");

    assert_eq!(store.load(&session).unwrap(), None);
    store.put(&session, sample_state()).unwrap();
    assert_eq!(store.load(&session).unwrap(), Some(sample_state()));
    assert_eq!(store.remove(&session).unwrap(), Some(sample_state()));
    assert_eq!(store.load(&session).unwrap(), None);
}

#[test]
fn failed_update_is_not_committed() {
    let store = InMemorySessionStore::new();
    let session = SessionId::from("s1");
    store.put(&session, sample_state()).unwrap();

    let res: Result<(), StoreError> = store.with_session(&session, |slot| {
        if let Some(state) = slot.as_mut() {
            state.char1_hp = 1;
            state.turn_player = CharacterId(2);
        }
        *slot = None;
        Err(StoreError::Unavailable("abort".to_string()))
    });
    assert!(res.is_err());
    assert_eq!(store.load(&session).unwrap(), Some(sample_state()));
}

#[test]
fn sessions_lists_only_active_battles() {
    let store = InMemorySessionStore::new();
    store.put(&SessionId::from("b"), sample_state()).unwrap();
    store.put(&SessionId::from("a"), sample_state()).unwrap();
    store.put(&SessionId::from("c"), sample_state()).unwrap();
    store.remove(&SessionId::from("c")).unwrap();
    let _ = store.load(&SessionId::from("never-used")).unwrap();

    assert_eq!(
        store.sessions().unwrap(),
        vec![SessionId::from("a"), SessionId::from("b")]
    );
}

#[test]
fn concurrent_attacks_on_one_session_serialize() {
    let svc = common::service(
        common::pair(Fighter::new(1, "Aria"), Fighter::new(2, "Borin")),
        vec![0],
    );
    let session = common::session();
    svc.start_battle(&session, A, B).unwrap();

    let racers = 8;
    let barrier = Barrier::new(racers);
    let results: Vec<Result<AttackOutcome, BattleError>> = thread::scope(|scope| {
        let handles: Vec<_> = (0..racers)
            .map(|_| {
                scope.spawn(|| {
                    barrier.wait();
                    svc.attack(&session, A, "weak")
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let wins = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(wins, 1, "exactly one attack may land on A's turn");
    for res in results.iter().filter(|r| r.is_err()) {
        assert_eq!(
            res.as_ref().unwrap_err(),
            &BattleError::OutOfTurn {
                attacker: A,
                turn_player: B,
            }
        );
    }

    let state = svc.current(&session).unwrap().unwrap();
    assert_eq!(state.char2_hp, 950);
    assert_eq!(state.turn_player, B);
}

#[test]
fn separate_sessions_run_in_parallel() {
    let svc = common::service(
        common::pair(Fighter::new(1, "Aria"), Fighter::new(2, "Borin")),
        vec![0],
    );
    let sessions: Vec<SessionId> = (0..6).map(|i| SessionId::new(format!("table-{}", i))).collect();

    thread::scope(|scope| {
        for session in &sessions {
            let svc = &svc;
            scope.spawn(move || {
                svc.start_battle(session, A, B).unwrap();
                let mut attacker = A;
                for _ in 0..10 {
                    match svc.attack(session, attacker, "weak").unwrap() {
                        AttackOutcome::InProgress { state, .. } => attacker = state.turn_player,
                        AttackOutcome::Ended(end) => panic!("ended early: {:?}", end),
                    }
                }
            });
        }
    });

    for session in &sessions {
        let state = svc.current(session).unwrap().unwrap();
        assert_eq!((state.char1_hp, state.char2_hp), (750, 750));
        assert_eq!(state.turn_player, A);
    }
}
