//! Rules command - check, list and try out user rules.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Subcommand};
use console::style;
use serde::Serialize;
use tracing::info;

use pickup_core::{
    evaluate, FieldRule, ParcelField, PickupConfig, Rule, RuleBook, RuleEvalResult, RuleSet,
};

/// Arguments for the rules command.
#[derive(Args)]
pub struct RulesArgs {
    #[command(subcommand)]
    command: RulesCommand,
}

#[derive(Subcommand)]
enum RulesCommand {
    /// Validate every rule in a rule book
    Check(BookArgs),

    /// List the rules in a rule book
    List(BookArgs),

    /// Evaluate rules against a sample message
    Test(TestArgs),
}

#[derive(Args)]
struct BookArgs {
    /// Rule book file (default: rules.rules_file from config)
    #[arg(short, long)]
    rules: Option<PathBuf>,
}

#[derive(Args)]
struct TestArgs {
    /// Sample message
    text: String,

    /// Rule book file (default: rules.rules_file from config)
    #[arg(short, long)]
    rules: Option<PathBuf>,

    /// Only evaluate the rule with this name
    #[arg(short, long)]
    name: Option<String>,
}

/// Outcome of one rule against a sample, as printed by `rules test`.
#[derive(Serialize)]
struct RuleReport<'a> {
    rule: &'a str,
    enabled: bool,
    #[serde(flatten)]
    result: RuleEvalResult,
}

pub fn run(args: RulesArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = super::config::load(config_path)?;
    match args.command {
        RulesCommand::Check(book_args) => check(&book_args, &config),
        RulesCommand::List(book_args) => list(&book_args, &config),
        RulesCommand::Test(test_args) => test(&test_args, &config),
    }
}

/// Read a rule book from disk without compiling it.
pub fn load_book(path: &Path) -> anyhow::Result<RuleBook> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read rule book {}", path.display()))?;
    let book = RuleBook::from_json(&content)
        .with_context(|| format!("Invalid rule book {}", path.display()))?;
    info!("Loaded {} rules from {}", book.rules.len(), path.display());
    Ok(book)
}

/// Rule book path from the flag, falling back to the config.
pub fn resolve_book_path(flag: Option<&Path>, config: &PickupConfig) -> Option<PathBuf> {
    flag.map(Path::to_path_buf)
        .or_else(|| config.rules.rules_file.clone())
}

/// Compile the rule set named by the flag or config, if any.
pub fn load_rule_set(
    flag: Option<&Path>,
    config: &PickupConfig,
) -> anyhow::Result<Option<RuleSet>> {
    let Some(path) = resolve_book_path(flag, config) else {
        return Ok(None);
    };
    let book = load_book(&path)?;
    let rules = RuleSet::from_book(&book)
        .with_context(|| format!("Invalid rule in {}", path.display()))?
        .with_disabled(config.rules.include_disabled);
    Ok(Some(rules))
}

fn require_book(flag: Option<&Path>, config: &PickupConfig) -> anyhow::Result<(PathBuf, RuleBook)> {
    let path = resolve_book_path(flag, config).ok_or_else(|| {
        anyhow::anyhow!("No rule book given. Pass --rules or set rules.rules_file in the config.")
    })?;
    let book = load_book(&path)?;
    Ok((path, book))
}

fn check(args: &BookArgs, config: &PickupConfig) -> anyhow::Result<()> {
    let (path, book) = require_book(args.rules.as_deref(), config)?;
    let errors = book.validate();

    if errors.is_empty() {
        println!(
            "{} {} rules in {} are valid",
            style("✓").green(),
            book.rules.len(),
            path.display()
        );
        return Ok(());
    }

    eprintln!("{}", style("Invalid rules:").red());
    for error in &errors {
        eprintln!("  - {}", error);
    }
    anyhow::bail!("{} of {} rules are invalid", errors.len(), book.rules.len());
}

fn list(args: &BookArgs, config: &PickupConfig) -> anyhow::Result<()> {
    let (_, book) = require_book(args.rules.as_deref(), config)?;
    let rules = book.compile()?;

    if rules.is_empty() {
        println!("{} No rules defined.", style("ℹ").blue());
        return Ok(());
    }

    for rule in &rules {
        let status = if rule.enabled {
            style("enabled").green()
        } else {
            style("disabled").yellow()
        };
        println!("{} [{}]", style(&rule.name).bold(), status);
        if let Some(description) = &rule.description {
            println!("  {}", description);
        }
        for field in ParcelField::ALL {
            println!("  {:<8} {}", field, describe(rule.field(field)));
        }
    }

    Ok(())
}

fn describe(spec: &FieldRule) -> String {
    match spec {
        FieldRule::Regex(pattern) => format!("regex /{}/", pattern.as_str()),
        FieldRule::PrefixSuffix { prefix, suffix } if prefix.is_empty() && suffix.is_empty() => {
            "(whole text)".to_string()
        }
        FieldRule::PrefixSuffix { prefix, suffix } => {
            format!("after {:?} before {:?}", prefix, suffix)
        }
    }
}

fn test(args: &TestArgs, config: &PickupConfig) -> anyhow::Result<()> {
    let (_, book) = require_book(args.rules.as_deref(), config)?;
    let rules = book.compile()?;

    let selected: Vec<&Rule> = match &args.name {
        Some(name) => {
            let rule = rules
                .iter()
                .find(|r| &r.name == name)
                .ok_or_else(|| anyhow::anyhow!("Rule not found: {}", name))?;
            vec![rule]
        }
        None => rules.iter().collect(),
    };

    let reports: Vec<RuleReport> = selected
        .into_iter()
        .map(|rule| RuleReport {
            rule: &rule.name,
            enabled: rule.enabled,
            result: evaluate(rule, &args.text),
        })
        .collect();

    let output = if config.output.pretty_json {
        serde_json::to_string_pretty(&reports)?
    } else {
        serde_json::to_string(&reports)?
    };
    println!("{}", output);

    Ok(())
}
