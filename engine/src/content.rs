use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};

use crate::roster::{Roster, RosterFormat};
use crate::rules::BattleRules;

pub fn builtin_rosters() -> HashMap<&'static str, &'static str> {
    HashMap::from([("demo", include_str!("../content/rosters/demo.json"))])
}

pub fn builtin_rules() -> HashMap<&'static str, &'static str> {
    HashMap::from([("default", include_str!("../content/rules/default.yaml"))])
}

/// `source` is either a built-in roster id or a path to a JSON/YAML file.
pub fn load_roster(source: &str) -> Result<Roster> {
    if let Some(text) = builtin_rosters().get(source) {
        return Roster::parse(text, RosterFormat::Json)
            .with_context(|| format!("built-in roster '{}' is invalid", source));
    }
    Roster::load(Path::new(source))
}

/// Same lookup rules as [`load_roster`], for battle rules.
pub fn load_rules(source: &str) -> Result<BattleRules> {
    if let Some(text) = builtin_rules().get(source) {
        return BattleRules::from_yaml_str(text)
            .with_context(|| format!("built-in rules '{}' are invalid", source));
    }
    BattleRules::load(Path::new(source))
}
