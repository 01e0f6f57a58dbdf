use clap::{Parser, ValueEnum};
use encoding_rs::Encoding;
use engine::api::{simulate_duel_many, AttackPolicy, DuelConfig};
use engine::content::{builtin_rosters, load_rules};
use engine::roster::RosterFormat;
use engine::{BattleRules, CharacterId, Roster};
use std::{fs, path::PathBuf};
use tracing::Level;

#[derive(Copy, Clone, ValueEnum)]
enum Policy {
    Strong,
    Weak,
    Alternate,
}

#[derive(Parser)]
#[command(name = "simulate-vs")]
#[command(about = "Monte Carlo sim: many battles between two characters")]
struct Args {
    /// First character (attacks first)
    #[arg(long)]
    char1: u64,

    /// Second character
    #[arg(long)]
    char2: u64,

    /// Number of trials
    #[arg(long, default_value_t = 1000)]
    trials: u32,

    /// Roster file (JSON/YAML) or built-in roster id
    #[arg(long, default_value = "demo")]
    roster: String,

    /// Optional battle rules file (YAML/JSON)
    #[arg(long)]
    rules: Option<PathBuf>,

    /// How both sides pick strong/weak attacks
    #[arg(long, value_enum, default_value_t = Policy::Alternate)]
    policy: Policy,

    /// RNG base seed (trial i uses seed+i)
    #[arg(long, default_value_t = 12345)]
    seed: u64,
}

fn to_policy(p: Policy) -> AttackPolicy {
    match p {
        Policy::Strong => AttackPolicy::Strong,
        Policy::Weak => AttackPolicy::Weak,
        Policy::Alternate => AttackPolicy::Alternate,
    }
}

fn read_text_auto(path: &std::path::Path) -> anyhow::Result<String> {
    let bytes = fs::read(path)?;
    if let Some((enc, bom_len)) = Encoding::for_bom(&bytes) {
        let (cow, _, _) = enc.decode(&bytes[bom_len..]);
        Ok(cow.into_owned())
    } else {
        Ok(String::from_utf8(bytes)?)
    }
}

fn read_roster_auto(source: &str) -> anyhow::Result<Roster> {
    if let Some(text) = builtin_rosters().get(source) {
        return Roster::parse(text, RosterFormat::Json);
    }
    let path = std::path::Path::new(source);
    let text = read_text_auto(path)?;
    Roster::parse(&text, RosterFormat::from_path(path))
}

fn read_rules_auto(path: Option<&PathBuf>) -> anyhow::Result<BattleRules> {
    match path {
        Some(p) => BattleRules::from_yaml_str(&read_text_auto(p)?),
        None => load_rules("default"),
    }
}

fn name_of(roster: &Roster, id: u64) -> String {
    roster
        .character(CharacterId(id))
        .map(|c| c.name.clone())
        .unwrap_or_else(|| format!("#{}", id))
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_max_level(Level::WARN)
        .with_writer(std::io::stderr)
        .init();

    let roster = read_roster_auto(&args.roster)?;
    let rules = read_rules_auto(args.rules.as_ref())?;
    let cfg = DuelConfig {
        char1_id: CharacterId(args.char1),
        char2_id: CharacterId(args.char2),
        policy: to_policy(args.policy),
        seed: args.seed,
    };

    let stats = simulate_duel_many(&roster, &rules, &cfg, args.trials)?;
    let trials_f = f64::from(args.trials.max(1));

    println!("simulate-vs results");
    println!("-------------------");
    println!("trials:             {}", args.trials);
    println!(
        "matchup:            {} vs {} ({} HP each)",
        name_of(&roster, args.char1),
        name_of(&roster, args.char2),
        rules.starting_hp
    );
    let policy = args.policy.to_possible_value().map(|v| v.get_name().to_string()).unwrap_or_default();
    println!("policy:             {}", policy);
    println!();
    println!(
        "{:<20}{:.1}%",
        format!("{} wins:", name_of(&roster, args.char1)),
        f64::from(stats.char1_wins) / trials_f * 100.0
    );
    println!(
        "{:<20}{:.1}%",
        format!("{} wins:", name_of(&roster, args.char2)),
        f64::from(stats.char2_wins) / trials_f * 100.0
    );
    println!("unresolved:         {}", stats.unresolved);
    println!("hit rate:           {:.1}%", stats.hit_rate * 100.0);
    println!("crit rate:          {:.1}%", stats.crit_rate * 100.0);
    println!("avg turns (wins):   {:.2}", stats.avg_turns);

    Ok(())
}
