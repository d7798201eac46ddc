use std::path::PathBuf;

use crate::config::AppConfig;
use crate::data::{AbilityCatalog, ModifierTable};
use crate::parallel::{evaluate_catalog, explain_catalog, WorkerPool};
use crate::report::{
    format_explanation, format_levels, format_report, validation_report, write_levels_file,
};

const USAGE: &str = "usage: spellcost <spells|items> [-v|--verbose] [-t|--tofile] [-a NAME|--ability NAME] [--json]\n       spellcost validate [spells|items]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Spells,
    Items,
}

impl Source {
    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "spells" => Some(Self::Spells),
            "items" => Some(Self::Items),
            _ => None,
        }
    }

    pub fn path(self, config: &AppConfig) -> PathBuf {
        match self {
            Self::Spells => config.spells_path.clone(),
            Self::Items => config.items_path.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LevelOptions {
    pub verbose: bool,
    pub to_file: bool,
    pub ability: Option<String>,
    pub json: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Levels(Source, LevelOptions),
    Validate(Source),
}

pub fn parse_command(args: &[String]) -> Result<Command, String> {
    let Some(first) = args.get(1).map(String::as_str) else {
        return Err("missing command".to_string());
    };
    if first == "validate" {
        return match args.get(2).map(String::as_str) {
            None => Ok(Command::Validate(Source::Spells)),
            Some(raw) => match (Source::parse(raw), args.len()) {
                (Some(source), 3) => Ok(Command::Validate(source)),
                (None, _) => Err(format!("unknown catalogue '{raw}'")),
                _ => Err("validate takes at most one argument".to_string()),
            },
        };
    }
    let Some(source) = Source::parse(first) else {
        return Err(format!("unknown command '{first}'"));
    };

    let mut options = LevelOptions::default();
    let mut rest = args[2..].iter();
    while let Some(arg) = rest.next() {
        match arg.as_str() {
            "-v" | "--verbose" => options.verbose = true,
            "-t" | "--tofile" => options.to_file = true,
            "--json" => options.json = true,
            "-a" | "--ability" => match rest.next() {
                Some(name) => options.ability = Some(name.clone()),
                None => return Err(format!("{arg} needs an ability name")),
            },
            other => {
                if let Some(name) = other.strip_prefix("--ability=") {
                    options.ability = Some(name.to_string());
                } else {
                    return Err(format!("unknown option '{other}'"));
                }
            }
        }
    }
    // a single ability is always explained
    if options.ability.is_some() {
        options.verbose = true;
    }
    Ok(Command::Levels(source, options))
}

pub fn run_with_args(args: &[String]) -> i32 {
    let config = AppConfig::from_env();
    match parse_command(args) {
        Ok(Command::Levels(source, options)) => handle_levels(&config, source, &options),
        Ok(Command::Validate(source)) => handle_validate(&config, source),
        Err(message) => {
            eprintln!("{message}");
            eprintln!("{USAGE}");
            2
        }
    }
}

fn load_inputs(config: &AppConfig, source: Source) -> Option<(ModifierTable, AbilityCatalog)> {
    let table = match ModifierTable::load(&config.modifiers_path) {
        Ok(table) => table,
        Err(err) => {
            eprintln!("failed to load modifiers: {err}");
            return None;
        }
    };
    match AbilityCatalog::load(source.path(config)) {
        Ok(catalog) => Some((table, catalog)),
        Err(err) => {
            eprintln!("failed to load abilities: {err}");
            None
        }
    }
}

fn handle_levels(config: &AppConfig, source: Source, options: &LevelOptions) -> i32 {
    let Some((table, mut catalog)) = load_inputs(config, source) else {
        return 1;
    };
    if let Some(name) = &options.ability {
        match catalog.only(name) {
            Some(single) => catalog = single,
            None => {
                eprintln!("unknown ability '{name}'");
                return 1;
            }
        }
    }
    let settings = config.engine_settings();
    let pool = WorkerPool::with_workers(config.workers);
    let mut failed = false;

    if options.verbose || options.json {
        let mut explanations = Vec::new();
        for (name, result) in explain_catalog(&catalog, &table, &settings, &pool) {
            match result {
                Ok(explanation) => explanations.push(explanation),
                Err(err) => {
                    eprintln!("{name}: {err}");
                    failed = true;
                }
            }
        }
        if options.json {
            match serde_json::to_string_pretty(&explanations) {
                Ok(payload) => println!("{payload}"),
                Err(err) => {
                    eprintln!("failed to serialize explanations: {err}");
                    return 1;
                }
            }
        } else {
            for explanation in &explanations {
                print!("{}", format_explanation(explanation));
            }
        }
        return i32::from(failed);
    }

    let mut levels = Vec::new();
    for (name, result) in evaluate_catalog(&catalog, &table, &settings, &pool) {
        match result {
            Ok(evaluation) => levels.push((name, evaluation.spell_level)),
            Err(err) => {
                eprintln!("{name}: {err}");
                failed = true;
            }
        }
    }
    let rows = levels.iter().map(|(name, level)| (name.as_str(), *level));
    if options.to_file {
        if let Err(err) = write_levels_file(&config.levels_out_path, rows) {
            eprintln!(
                "failed to write '{}': {err}",
                config.levels_out_path.display()
            );
            return 1;
        }
    } else {
        print!("{}", format_levels(rows));
    }
    i32::from(failed)
}

fn handle_validate(config: &AppConfig, source: Source) -> i32 {
    let Some((table, catalog)) = load_inputs(config, source) else {
        return 1;
    };
    let pool = WorkerPool::with_workers(config.workers);
    let results = evaluate_catalog(&catalog, &table, &config.engine_settings(), &pool);
    let report = validation_report(&results);
    print!("{}", format_report(&report));
    if report.has_errors() {
        1
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> Vec<String> {
        std::iter::once("spellcost")
            .chain(raw.iter().copied())
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn parses_level_flags() {
        let command = parse_command(&args(&["items", "-t", "--json"])).unwrap();
        assert_eq!(
            command,
            Command::Levels(
                Source::Items,
                LevelOptions {
                    to_file: true,
                    json: true,
                    ..LevelOptions::default()
                }
            )
        );
    }

    #[test]
    fn ability_implies_verbose() {
        for raw in [&["spells", "-a", "bolt"][..], &["spells", "--ability=bolt"][..]] {
            let Command::Levels(_, options) = parse_command(&args(raw)).unwrap() else {
                panic!("expected levels command");
            };
            assert_eq!(options.ability.as_deref(), Some("bolt"));
            assert!(options.verbose);
        }
    }

    #[test]
    fn validate_defaults_to_spells() {
        assert_eq!(
            parse_command(&args(&["validate"])).unwrap(),
            Command::Validate(Source::Spells)
        );
        assert_eq!(
            parse_command(&args(&["validate", "items"])).unwrap(),
            Command::Validate(Source::Items)
        );
    }

    #[test]
    fn rejects_bad_usage() {
        assert!(parse_command(&args(&[])).is_err());
        assert!(parse_command(&args(&["serve"])).is_err());
        assert!(parse_command(&args(&["spells", "--ability"])).is_err());
        assert!(parse_command(&args(&["spells", "--fast"])).is_err());
        assert!(parse_command(&args(&["validate", "potions"])).is_err());
    }
}
