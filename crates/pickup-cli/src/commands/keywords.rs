//! Keywords command - inspect keyword lexicons.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use console::style;
use serde::Serialize;

use pickup_core::{KeywordHit, KeywordLexicon, KeywordScope, PickupConfig};

/// Arguments for the keywords command.
#[derive(Args)]
pub struct KeywordsArgs {
    #[command(subcommand)]
    command: KeywordsCommand,
}

#[derive(Subcommand)]
enum KeywordsCommand {
    /// List keyword categories
    List {
        /// Only show this category
        #[arg(long)]
        category: Option<String>,

        /// Rule book whose user keywords are included
        #[arg(short, long)]
        rules: Option<PathBuf>,
    },

    /// Show which keywords occur in a message
    Match {
        /// Message text
        text: String,

        /// Sender identifier, tested by sender-scoped categories
        #[arg(short, long)]
        sender: Option<String>,

        /// Rule book whose user keywords are included
        #[arg(short, long)]
        rules: Option<PathBuf>,
    },
}

#[derive(Serialize)]
struct MatchReport<'a> {
    categories: Vec<&'a str>,
    hits: Vec<KeywordHit<'a>>,
}

pub fn run(args: KeywordsArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = super::config::load(config_path)?;
    match args.command {
        KeywordsCommand::List { category, rules } => {
            let lexicon = build_lexicon(rules, &config)?;
            list(&lexicon, category.as_deref())
        }
        KeywordsCommand::Match { text, sender, rules } => {
            let lexicon = build_lexicon(rules, &config)?;
            let report = MatchReport {
                categories: lexicon.matching_categories(&text, sender.as_deref()),
                hits: lexicon.hits(&text, sender.as_deref()),
            };
            let output = if config.output.pretty_json {
                serde_json::to_string_pretty(&report)?
            } else {
                serde_json::to_string(&report)?
            };
            println!("{}", output);
            Ok(())
        }
    }
}

/// Built-in categories plus the user keywords of the rule book, if any.
fn build_lexicon(rules: Option<PathBuf>, config: &PickupConfig) -> anyhow::Result<KeywordLexicon> {
    let mut lexicon = KeywordLexicon::builtin().clone();
    if let Some(path) = super::rules::resolve_book_path(rules.as_deref(), config) {
        let book = super::rules::load_book(&path)?;
        for category in book.keyword_categories() {
            lexicon = lexicon.with_category(category);
        }
    }
    Ok(lexicon)
}

fn list(lexicon: &KeywordLexicon, only: Option<&str>) -> anyhow::Result<()> {
    let categories: Vec<_> = match only {
        Some(name) => vec![lexicon
            .category(name)
            .ok_or_else(|| anyhow::anyhow!("Unknown keyword category: {}", name))?],
        None => lexicon.categories().iter().collect(),
    };

    for category in categories {
        let scope = match category.scope() {
            KeywordScope::Content => "content",
            KeywordScope::Sender => "sender",
        };
        println!(
            "{} ({}, {} keywords)",
            style(category.name()).bold(),
            scope,
            category.keywords().len()
        );
        println!("  {}", category.keywords().join(" "));
    }

    Ok(())
}
