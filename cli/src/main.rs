use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use engine::api::{simulate_duel, AttackPolicy, DuelConfig};
use engine::content::{load_roster, load_rules};
use engine::protocol::{AttackResponse, Reply, StartBattleResponse};
use engine::{
    BattleError, BattleRules, BattleService, BattleState, CharacterId, Dice,
    InMemorySessionStore, Roster, SessionId, ValidationReason,
};
use tracing::Level;

#[derive(Copy, Clone, ValueEnum)]
enum Policy {
    Strong,
    Weak,
    Alternate,
}

#[derive(Subcommand)]
enum Cmd {
    /// List battle-ready characters and faction head counts
    Roster {
        /// Dump the whole roster as JSON instead
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// List characters wearing a weapon and/or an armor
    Equipped {
        /// Weapon id
        #[arg(long)]
        weapon: Option<u64>,
        /// Armor id
        #[arg(long)]
        armor: Option<u64>,
    },
    /// List a character's relationships
    Relations {
        #[arg(long = "char")]
        character: u64,
    },
    /// Run one automated battle between two characters
    Duel {
        #[arg(long)]
        char1: u64,
        #[arg(long)]
        char2: u64,
        /// RNG seed for determinism
        #[arg(long, default_value_t = 42)]
        seed: u64,
        /// How both sides pick strong/weak attacks
        #[arg(long, value_enum, default_value_t = Policy::Alternate)]
        policy: Policy,
        /// Print the result as JSON instead of the narrative log
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Line-oriented battle session on stdin, one JSON reply per line
    Play {
        /// RNG seed; omitted means a fresh random seed
        #[arg(long)]
        seed: Option<u64>,
        /// Session key the battle is stored under
        #[arg(long, default_value = "cli")]
        session: String,
    },
}

#[derive(Parser)]
#[command(name = "skirmish")]
#[command(about = "Skirmish battle engine CLI")]
struct Cli {
    /// Built-in roster id or path to a JSON/YAML roster
    #[arg(long, global = true, default_value = "demo")]
    roster: String,
    /// Path to a YAML/JSON battle rules file (built-in defaults if omitted)
    #[arg(long, global = true)]
    rules: Option<PathBuf>,
    /// Log resolved strikes to stderr
    #[arg(long, global = true, default_value_t = false)]
    verbose: bool,
    #[command(subcommand)]
    cmd: Cmd,
}

fn to_policy(p: Policy) -> AttackPolicy {
    match p {
        Policy::Strong => AttackPolicy::Strong,
        Policy::Weak => AttackPolicy::Weak,
        Policy::Alternate => AttackPolicy::Alternate,
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> anyhow::Result<(Roster, BattleRules)> {
    let roster = load_roster(&cli.roster)?;
    let rules = match &cli.rules {
        Some(path) => BattleRules::load(path)?,
        None => load_rules("default")?,
    };
    Ok((roster, rules))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let (roster, rules) = load_config(&cli)?;

    match cli.cmd {
        Cmd::Roster { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(&roster.to_data())?);
            } else {
                print_roster(&roster, &rules);
            }
        }
        Cmd::Equipped { weapon, armor } => {
            for c in roster.equipped_with(weapon, armor)? {
                println!("{:>4}  {}", c.id.0, c.name);
            }
        }
        Cmd::Relations { character } => {
            let id = CharacterId(character);
            roster
                .character(id)
                .with_context(|| format!("unknown character {}", character))?;
            for rel in roster.relationships_of(id) {
                println!(
                    "{} -> {}: {}",
                    name_of(&roster, rel.character1),
                    name_of(&roster, rel.character2),
                    rel.kind.label()
                );
            }
        }
        Cmd::Duel {
            char1,
            char2,
            seed,
            policy,
            json,
        } => {
            let cfg = DuelConfig {
                char1_id: CharacterId(char1),
                char2_id: CharacterId(char2),
                policy: to_policy(policy),
                seed,
            };
            let res = simulate_duel(&roster, &rules, &cfg)
                .with_context(|| format!("cannot run duel {} vs {}", char1, char2))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&res)?);
            } else {
                for line in &res.log {
                    println!("{}", line);
                }
            }
        }
        Cmd::Play { seed, session } => {
            let dice = seed.map(Dice::from_seed).unwrap_or_else(Dice::from_entropy);
            let service = BattleService::new(roster, InMemorySessionStore::new(), rules, dice);
            play(&service, &SessionId::new(session), io::stdin().lock(), io::stdout().lock())?;
        }
    }
    Ok(())
}

fn name_of(roster: &Roster, id: CharacterId) -> String {
    roster
        .character(id)
        .map(|c| c.name.clone())
        .unwrap_or_else(|| format!("#{}", id.0))
}

fn print_roster(roster: &Roster, rules: &BattleRules) {
    let service = BattleService::new(roster, InMemorySessionStore::new(), *rules, Dice::from_seed(0));
    println!("battle-ready characters");
    println!("-----------------------");
    match service.eligible() {
        Ok(combatants) => {
            for c in combatants {
                println!(
                    "{:>4}  {:<16} dmg {:>4}  acc {:>3}%  crit {:>3}%  def {:>3}",
                    c.id.0, c.name, c.weapon.damage, c.weapon.accuracy, c.weapon.critic, c.armor.defense
                );
            }
        }
        Err(e) => println!("unavailable: {}", e),
    }
    println!();
    println!("factions");
    println!("--------");
    for (name, count) in roster.member_counts() {
        println!("{:<24} {}", name, count);
    }
}

/// One command per line: `start <a> <b>`, `attack <id> <strong|weak>`, `status`, `quit`.
fn play<C, R, W>(
    service: &BattleService<C, InMemorySessionStore>,
    session: &SessionId,
    input: R,
    mut out: W,
) -> anyhow::Result<()>
where
    C: engine::CombatantSource,
    R: BufRead,
    W: Write,
{
    for line in input.lines() {
        let line = line.context("failed to read stdin")?;
        let words: Vec<&str> = line.split_whitespace().collect();
        let reply = match words.as_slice() {
            [] => continue,
            ["quit"] | ["exit"] => break,
            ["start", a, b] => {
                let reply: Reply<StartBattleResponse> = parse_id(a)
                    .and_then(|a| Ok((a, parse_id(b)?)))
                    .and_then(|(a, b)| service.start_battle(session, a, b))
                    .into();
                serde_json::to_string(&reply)?
            }
            ["attack", id, kind] => {
                let reply: Reply<AttackResponse> = parse_id(id)
                    .and_then(|id| service.attack(session, id, kind))
                    .into();
                serde_json::to_string(&reply)?
            }
            ["status"] => {
                let reply: Reply<Option<BattleState>> = service.current(session).into();
                serde_json::to_string(&reply)?
            }
            _ => {
                let err: BattleError =
                    ValidationReason::MalformedRequest(format!("unknown command: {}", line.trim())).into();
                serde_json::to_string(&Reply::<()>::failure(&err))?
            }
        };
        writeln!(out, "{}", reply)?;
        out.flush()?;
    }
    Ok(())
}

fn parse_id(s: &str) -> Result<CharacterId, BattleError> {
    s.parse::<u64>()
        .map(CharacterId)
        .map_err(|_| ValidationReason::MalformedRequest(format!("not a character id: {}", s)).into())
}
