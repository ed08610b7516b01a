//! Parse command - extract fields from a single message.

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use clap::Args;
use console::style;
use serde::Serialize;
use tracing::{debug, info};

use pickup_core::{ParcelExtractor, ParseResult, PatternHit, PatternParser, PickupConfig, RuleSet};

/// Arguments for the parse command.
#[derive(Args)]
pub struct ParseArgs {
    /// Message text (reads --input or stdin when omitted)
    text: Option<String>,

    /// Read the message from a file
    #[arg(short, long, conflicts_with = "text")]
    input: Option<PathBuf>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Rule book to try before the built-in patterns
    #[arg(short, long)]
    rules: Option<PathBuf>,

    /// Only use the rule book, never the built-in patterns
    #[arg(long, requires = "rules")]
    rules_only: bool,

    /// Report every built-in pattern that matched
    #[arg(long)]
    explain: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

/// Which strategy produced a result.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "source", rename_all = "lowercase")]
pub enum Source {
    /// Built-in pattern library.
    Builtin,
    /// A user rule, by name.
    Rule { rule: String },
    /// No strategy found anything.
    None,
}

/// A parse result with where it came from.
#[derive(Debug, Clone, Serialize)]
pub struct ParseOutput {
    #[serde(flatten)]
    pub result: ParseResult,

    #[serde(flatten)]
    pub source: Source,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub hits: Vec<PatternHit>,
}

/// Extraction strategies in the order they are tried.
pub struct Pipeline {
    rules: Option<RuleSet>,
    parser: Option<PatternParser<'static>>,
}

impl Pipeline {
    pub fn new(config: &PickupConfig, rules: Option<RuleSet>, rules_only: bool) -> Self {
        let parser = (!rules_only).then(|| PatternParser::from_config(&config.extraction));
        Self { rules, parser }
    }

    /// Rules first, then the built-in patterns.
    pub fn run(&self, text: &str, explain: bool) -> ParseOutput {
        if let Some(m) = self.rules.as_ref().and_then(|rules| rules.first_match(text)) {
            debug!("Matched user rule {}", m.rule.name);
            return ParseOutput {
                source: Source::Rule {
                    rule: m.rule.name.clone(),
                },
                result: m.into_parse_result(),
                hits: Vec::new(),
            };
        }

        let Some(parser) = &self.parser else {
            return ParseOutput {
                result: ParseResult::default(),
                source: Source::None,
                hits: Vec::new(),
            };
        };

        let (result, hits) = if explain {
            let explanation = parser.explain(text);
            (explanation.result, explanation.hits)
        } else {
            (parser.extract(text), Vec::new())
        };
        let source = if result.is_empty() {
            Source::None
        } else {
            Source::Builtin
        };
        ParseOutput { result, source, hits }
    }
}

pub fn run(args: ParseArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = super::config::load(config_path)?;

    let text = read_message(&args)?;
    info!("Parsing message of {} characters", text.chars().count());

    let rules = super::rules::load_rule_set(args.rules.as_deref(), &config)?;
    let pipeline = Pipeline::new(&config, rules, args.rules_only);
    let parsed = pipeline.run(&text, args.explain);

    let output = match args.format {
        OutputFormat::Json => format_json(&parsed, &config)?,
        OutputFormat::Csv => format_csv(&parsed)?,
        OutputFormat::Text => format_text(&parsed),
    };

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output.trim_end());
    }

    Ok(())
}

fn read_message(args: &ParseArgs) -> anyhow::Result<String> {
    if let Some(text) = &args.text {
        return Ok(text.clone());
    }
    if let Some(path) = &args.input {
        if !path.exists() {
            anyhow::bail!("Input file not found: {}", path.display());
        }
        return Ok(fs::read_to_string(path)?);
    }
    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    Ok(buffer)
}

pub fn format_json(parsed: &ParseOutput, config: &PickupConfig) -> anyhow::Result<String> {
    if config.output.pretty_json {
        Ok(serde_json::to_string_pretty(parsed)?)
    } else {
        Ok(serde_json::to_string(parsed)?)
    }
}

fn format_csv(parsed: &ParseOutput) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record(["code", "station", "address", "source"])?;
    wtr.write_record([
        parsed.result.code.as_deref().unwrap_or_default(),
        parsed.result.station.as_deref().unwrap_or_default(),
        parsed.result.address.as_deref().unwrap_or_default(),
        source_label(&parsed.source).as_str(),
    ])?;

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(parsed: &ParseOutput) -> String {
    let mut output = String::new();
    let missing = "-";

    output.push_str(&format!("Code:    {}\n", parsed.result.code.as_deref().unwrap_or(missing)));
    output.push_str(&format!("Station: {}\n", parsed.result.station.as_deref().unwrap_or(missing)));
    output.push_str(&format!("Address: {}\n", parsed.result.address.as_deref().unwrap_or(missing)));
    output.push_str(&format!("Source:  {}\n", source_label(&parsed.source)));

    if !parsed.hits.is_empty() {
        output.push_str("\nMatched patterns:\n");
        for hit in &parsed.hits {
            let verdict = match &hit.accepted {
                Some(value) => format!("accepted {:?}", value),
                None => "rejected".to_string(),
            };
            output.push_str(&format!(
                "  {:<8} {:<24} {:?} {}\n",
                hit.field.as_str(),
                hit.pattern,
                hit.candidate,
                verdict
            ));
        }
    }

    output
}

fn source_label(source: &Source) -> String {
    match source {
        Source::Builtin => "builtin".to_string(),
        Source::Rule { rule } => format!("rule:{}", rule),
        Source::None => "none".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pickup_core::{FieldRule, ParcelField, Rule};

    const SAMPLE: &str = "【菜鸟驿站】您的取件码为AB-1234，请到沃尔玛超市东门取件";

    #[test]
    fn test_builtin_pipeline() {
        let pipeline = Pipeline::new(&PickupConfig::default(), None, false);
        let parsed = pipeline.run(SAMPLE, false);
        assert!(matches!(parsed.source, Source::Builtin));
        assert_eq!(parsed.result.code.as_deref(), Some("AB-1234"));
        assert!(parsed.hits.is_empty());
    }

    #[test]
    fn test_rule_wins_over_builtin() {
        let rules = RuleSet::new(vec![Rule::new("dash")
            .with_field(ParcelField::Code, FieldRule::prefix_suffix("码为", "，"))
            .with_field(ParcelField::Address, FieldRule::prefix_suffix("请到", "取件"))]);
        let pipeline = Pipeline::new(&PickupConfig::default(), Some(rules), false);

        let parsed = pipeline.run(SAMPLE, true);
        assert!(matches!(parsed.source, Source::Rule { ref rule } if rule == "dash"));
        assert_eq!(parsed.result.address.as_deref(), Some("沃尔玛超市东门"));
        assert!(parsed.hits.is_empty());
    }

    #[test]
    fn test_rules_only_without_match() {
        let pipeline = Pipeline::new(&PickupConfig::default(), Some(RuleSet::default()), true);
        let parsed = pipeline.run(SAMPLE, false);
        assert!(matches!(parsed.source, Source::None));
        assert!(parsed.result.is_empty());
    }

    #[test]
    fn test_json_shape() {
        let pipeline = Pipeline::new(&PickupConfig::default(), None, false);
        let parsed = pipeline.run(SAMPLE, false);
        let value: serde_json::Value = serde_json::to_value(&parsed).unwrap();
        assert_eq!(value["code"], "AB-1234");
        assert_eq!(value["source"], "builtin");
        assert!(value.get("hits").is_none());
    }

    #[test]
    fn test_csv_and_text() {
        let pipeline = Pipeline::new(&PickupConfig::default(), None, false);
        let parsed = pipeline.run(SAMPLE, true);

        let csv = format_csv(&parsed).unwrap();
        assert!(csv.starts_with("code,station,address,source\n"));
        assert!(csv.contains("AB-1234,菜鸟驿站,沃尔玛超市东门,builtin"));

        let text = format_text(&parsed);
        assert!(text.contains("Code:    AB-1234"));
        assert!(text.contains("dashed_code"));
    }
}
