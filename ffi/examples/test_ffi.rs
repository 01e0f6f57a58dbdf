use engine::content::builtin_rosters;
use skirmish_ffi::{attack_internal, battle_state_internal, init_internal, start_battle_internal};

fn main() {
    println!("{}", init_internal(builtin_rosters()["demo"], 2025));

    let session = "example";
    println!("{}", start_battle_internal(session, r#"{"char1_id":1,"char2_id":2}"#));

    // Alternate strong/weak until someone drops.
    let mut attacker = 1u64;
    let mut defender = 2u64;
    for turn in 0..200 {
        let kind = if turn % 2 == 0 { "strong" } else { "weak" };
        let body = attack_internal(
            session,
            &format!(r#"{{"attacker_id":{},"attack_kind":"{}"}}"#, attacker, kind),
        );
        println!("{}", body);
        if body.contains(r#""status":"ended""#) || body.contains(r#""ok":false"#) {
            break;
        }
        std::mem::swap(&mut attacker, &mut defender);
    }

    println!("{}", battle_state_internal(session));
}
