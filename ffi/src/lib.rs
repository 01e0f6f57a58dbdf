use std::sync::RwLock;

use engine::protocol::{
    decode, AttackRequest, AttackResponse, ErrorBody, Reply, StartBattleRequest,
    StartBattleResponse,
};
use engine::roster::RosterFormat;
use engine::{
    BattleError, BattleRules, BattleService, BattleState, Dice, InMemorySessionStore, Roster,
    SessionId,
};
use jni::objects::{JClass, JString};
use jni::sys::{jlong, jstring};
use jni::JNIEnv;
use serde::Serialize;

type Service = BattleService<Roster, InMemorySessionStore>;

static SERVICE: RwLock<Option<Service>> = RwLock::new(None);

const VERSION: &str = concat!("skirmish-ffi ", env!("CARGO_PKG_VERSION"));

fn respond(env: &JNIEnv, body: String) -> jstring {
    env.new_string(body)
        .map(|s| s.into_raw())
        .unwrap_or(std::ptr::null_mut())
}

fn encode<T: Serialize>(reply: &Reply<T>) -> String {
    serde_json::to_string(reply).unwrap_or_else(|_| {
        r#"{"ok":false,"error":{"error_code":"internal_error","error_message":"internal server error"}}"#
            .to_string()
    })
}

fn bad_input(e: impl std::fmt::Display) -> String {
    encode(&Reply::<()> {
        ok: false,
        result: None,
        error: Some(ErrorBody {
            error_code: "validation_error".to_string(),
            error_message: e.to_string(),
        }),
    })
}

fn with_service<T>(f: impl FnOnce(&Service) -> Result<T, BattleError>) -> Result<T, BattleError> {
    let guard = SERVICE
        .read()
        .map_err(|_| BattleError::Internal("service lock poisoned".to_string()))?;
    match guard.as_ref() {
        Some(service) => f(service),
        None => Err(BattleError::Internal("init was not called".to_string())),
    }
}

// Internal functions for testing without JNI overhead

/// Installs a fresh service over `roster_json`, dropping every session in progress.
pub fn init_internal(roster_json: &str, seed: i64) -> String {
    let roster = match Roster::parse(roster_json, RosterFormat::Json) {
        Ok(r) => r,
        Err(e) => return bad_input(format!("{:#}", e)),
    };
    let eligible = roster.eligible().count();
    let service = BattleService::new(
        roster,
        InMemorySessionStore::new(),
        BattleRules::default(),
        Dice::from_seed(seed as u64),
    );
    match SERVICE.write() {
        Ok(mut slot) => {
            *slot = Some(service);
            encode(&Reply::success(serde_json::json!({ "eligible": eligible })))
        }
        Err(_) => encode(&Reply::<()>::failure(&BattleError::Internal(
            "service lock poisoned".to_string(),
        ))),
    }
}

pub fn start_battle_internal(session: &str, json: &str) -> String {
    let session = SessionId::from(session);
    let reply: Reply<StartBattleResponse> = decode::<StartBattleRequest>(json)
        .and_then(|req| with_service(|svc| svc.start_battle(&session, req.char1_id, req.char2_id)))
        .into();
    encode(&reply)
}

pub fn attack_internal(session: &str, json: &str) -> String {
    let session = SessionId::from(session);
    let reply: Reply<AttackResponse> = decode::<AttackRequest>(json)
        .and_then(|req| with_service(|svc| svc.attack(&session, req.attacker_id, &req.attack_kind)))
        .into();
    encode(&reply)
}

pub fn battle_state_internal(session: &str) -> String {
    let session = SessionId::from(session);
    let reply: Reply<Option<BattleState>> = with_service(|svc| svc.current(&session)).into();
    encode(&reply)
}

fn read_string(env: &mut JNIEnv, s: &JString) -> Result<String, String> {
    env.get_string(s).map(Into::into).map_err(bad_input)
}

#[no_mangle]
pub extern "system" fn Java_com_skirmish_Ffi_version(env: JNIEnv, _class: JClass) -> jstring {
    respond(&env, VERSION.to_string())
}

#[no_mangle]
pub extern "system" fn Java_com_skirmish_Ffi_init(
    mut env: JNIEnv,
    _class: JClass,
    roster_json: JString,
    seed: jlong,
) -> jstring {
    let body = match read_string(&mut env, &roster_json) {
        Ok(json) => init_internal(&json, seed),
        Err(body) => body,
    };
    respond(&env, body)
}

#[no_mangle]
pub extern "system" fn Java_com_skirmish_Ffi_startBattleJson(
    mut env: JNIEnv,
    _class: JClass,
    session: JString,
    json: JString,
) -> jstring {
    let body = match (read_string(&mut env, &session), read_string(&mut env, &json)) {
        (Ok(session), Ok(json)) => start_battle_internal(&session, &json),
        (Err(body), _) | (_, Err(body)) => body,
    };
    respond(&env, body)
}

#[no_mangle]
pub extern "system" fn Java_com_skirmish_Ffi_attackJson(
    mut env: JNIEnv,
    _class: JClass,
    session: JString,
    json: JString,
) -> jstring {
    let body = match (read_string(&mut env, &session), read_string(&mut env, &json)) {
        (Ok(session), Ok(json)) => attack_internal(&session, &json),
        (Err(body), _) | (_, Err(body)) => body,
    };
    respond(&env, body)
}

#[no_mangle]
pub extern "system" fn Java_com_skirmish_Ffi_battleStateJson(
    mut env: JNIEnv,
    _class: JClass,
    session: JString,
) -> jstring {
    let body = match read_string(&mut env, &session) {
        Ok(session) => battle_state_internal(&session),
        Err(body) => body,
    };
    respond(&env, body)
}
