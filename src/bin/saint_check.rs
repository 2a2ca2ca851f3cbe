//! saint-check
//!
//! Evaluates dispatch orders against a facts file and prints the results
//! as JSON.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing_subscriber::EnvFilter;

use saint::{
    load_stored_rules, EngineConfig, FactSnapshot, FactStore, FeasibilityEngine, OntologyRegistry,
    OperationalSnapshot, PatternCatalog, RuleSet, SaintError, SaintResult, StoredRule, ValidationError,
};

/// Command-line configuration
struct Args {
    /// Operational facts (JSON)
    facts: PathBuf,
    /// Stored rule records (JSON array)
    rules: Option<PathBuf>,
    /// Ontology override (JSON)
    ontology: Option<PathBuf>,
    /// Engine configuration (TOML)
    config: Option<PathBuf>,
    /// Skip the built-in pattern catalog
    no_builtin: bool,
    /// Evaluation instant
    at: Option<DateTime<Utc>>,
    /// Order texts, evaluated in sequence
    texts: Vec<String>,
}

fn value_of(args: &[String], i: usize, flag: &str) -> String {
    if i + 1 < args.len() {
        args[i + 1].clone()
    } else {
        eprintln!("error: {flag} requires a value");
        std::process::exit(1);
    }
}

fn print_help() {
    println!("saint-check - feasibility check for dispatch orders");
    println!();
    println!("USAGE:");
    println!("    saint-check --facts <FILE> [OPTIONS] (--text <ORDER>... | --file <FILE>)");
    println!();
    println!("OPTIONS:");
    println!("    -f, --facts <FILE>        Operational facts JSON (required)");
    println!("    -r, --rules <FILE>        Stored rule records JSON");
    println!("    -o, --ontology <FILE>     Ontology JSON [default: railway]");
    println!("    -c, --config <FILE>       Engine config TOML");
    println!("        --no-builtin          Use only the stored rules' patterns");
    println!("        --at <RFC3339>        Evaluation instant [default: now]");
    println!("    -t, --text <ORDER>        Order text (repeatable, evaluated in sequence)");
    println!("        --file <FILE>         Read orders from a file, one per line");
    println!("    -h, --help                Print help information");
}

fn parse_args() -> Args {
    let args: Vec<String> = std::env::args().collect();
    let mut facts = None;
    let mut parsed = Args {
        facts: PathBuf::new(),
        rules: None,
        ontology: None,
        config: None,
        no_builtin: false,
        at: None,
        texts: Vec::new(),
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--facts" | "-f" => {
                facts = Some(PathBuf::from(value_of(&args, i, "--facts")));
                i += 2;
            }
            "--rules" | "-r" => {
                parsed.rules = Some(PathBuf::from(value_of(&args, i, "--rules")));
                i += 2;
            }
            "--ontology" | "-o" => {
                parsed.ontology = Some(PathBuf::from(value_of(&args, i, "--ontology")));
                i += 2;
            }
            "--config" | "-c" => {
                parsed.config = Some(PathBuf::from(value_of(&args, i, "--config")));
                i += 2;
            }
            "--no-builtin" => {
                parsed.no_builtin = true;
                i += 1;
            }
            "--at" => {
                let raw = value_of(&args, i, "--at");
                let at = DateTime::parse_from_rfc3339(&raw).unwrap_or_else(|_| {
                    eprintln!("error: invalid RFC 3339 time: {raw}");
                    std::process::exit(1);
                });
                parsed.at = Some(at.with_timezone(&Utc));
                i += 2;
            }
            "--text" | "-t" => {
                parsed.texts.push(value_of(&args, i, "--text"));
                i += 2;
            }
            "--file" => {
                let path = value_of(&args, i, "--file");
                let contents = std::fs::read_to_string(&path).unwrap_or_else(|e| {
                    eprintln!("error: cannot read {path}: {e}");
                    std::process::exit(1);
                });
                parsed.texts.extend(
                    contents
                        .lines()
                        .map(str::trim)
                        .filter(|line| !line.is_empty())
                        .map(str::to_string),
                );
                i += 2;
            }
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            arg => {
                eprintln!("error: unknown argument: {arg}");
                std::process::exit(1);
            }
        }
    }

    let Some(facts) = facts else {
        eprintln!("error: --facts is required");
        std::process::exit(1);
    };
    if parsed.texts.is_empty() {
        eprintln!("error: no order text given (use --text or --file)");
        std::process::exit(1);
    }
    parsed.facts = facts;
    parsed
}

fn read(path: &Path) -> SaintResult<String> {
    std::fs::read_to_string(path).map_err(|e| SaintError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

fn run(args: Args) -> SaintResult<String> {
    let config = match &args.config {
        Some(path) => EngineConfig::from_path(path)?,
        None => EngineConfig::default(),
    };
    let engine = FeasibilityEngine::new(config)?;

    let facts = FactSnapshot::from_json(&read(&args.facts)?)?;
    tracing::debug!(collections = ?facts.collection_names(), records = facts.len(), "facts loaded");

    let ontology = match &args.ontology {
        Some(path) => OntologyRegistry::from_json(&read(path)?)?,
        None => OntologyRegistry::railway(),
    };

    let (catalog, rules) = match &args.rules {
        Some(path) => {
            let records: Vec<StoredRule> =
                serde_json::from_str(&read(path)?).map_err(|e| ValidationError::InvalidRuleDefinition {
                    rule: path.display().to_string(),
                    reason: e.to_string(),
                })?;
            load_stored_rules(&records, !args.no_builtin)?
        }
        None => (PatternCatalog::builtin()?, RuleSet::empty()),
    };

    let snapshot = OperationalSnapshot::new(facts, ontology, args.at.unwrap_or_else(Utc::now));
    let mut pending = Vec::new();
    let results = engine.evaluate_sequence(&args.texts, &snapshot, &catalog, &rules, &mut pending)?;

    serde_json::to_string_pretty(&results)
        .map_err(|e| SaintError::inconsistency(format!("result serialization failed: {e}")))
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,saint=debug".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = parse_args();
    match run(args) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            tracing::error!(error = %e, "evaluation failed");
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    }
}
