//! kcmap CLI
//!
//! Command-line interface for a KC map database document:
//! - `propagate`: derive every forced relation and operation fact
//! - `check`: run the consistency validator and list violations
//! - `explain`: render the stored derivation of one fact
//! - `clear`: reset relations (or every dataset) to an empty, well-formed state

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use kcmap_engine::{ConsistencyValidator, PropagationConfig, Propagator, ReachabilityValidator};
use kcmap_model::{render, Claim, Graph, LemmaTable, NameResolver};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

mod database;

use database::Database;

#[derive(Parser)]
#[command(name = "kcmap")]
#[command(author, version, about = "Knowledge-compilation map relation inference")]
struct Cli {
    /// More logging (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Derive every relation and operation fact the asserted ones force.
    ///
    /// Without `--out` or `--in-place` the result is printed to stdout.
    /// Nothing is written when propagation fails.
    Propagate {
        /// Database document (JSON)
        db: PathBuf,
        /// Lemma table (JSON); defaults to the built-in standard table
        #[arg(long)]
        lemmas: Option<PathBuf>,
        /// Propagation settings (JSON)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Write the result here
        #[arg(short, long, conflicts_with = "in_place")]
        out: Option<PathBuf>,
        /// Overwrite the input document
        #[arg(long)]
        in_place: bool,
    },

    /// Validate the asserted facts without deriving anything.
    Check {
        db: PathBuf,
        #[arg(long)]
        lemmas: Option<PathBuf>,
    },

    /// Show why a relation (or an operation fact) holds.
    Explain {
        db: PathBuf,
        /// Source language id (or the language, with `--op`)
        from: String,
        /// Target language id
        #[arg(required_unless_present = "op")]
        to: Option<String>,
        /// Explain this operation on `from` instead of a relation
        #[arg(long)]
        op: Option<String>,
    },

    /// Reset every relation to null for the current languages.
    Clear {
        db: PathBuf,
        /// Also remove languages, references and separating functions
        #[arg(long)]
        all: bool,
        /// Write the result here instead of overwriting the input
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Propagate {
            db,
            lemmas,
            config,
            out,
            in_place,
        } => {
            let target = if in_place { Some(db.clone()) } else { out };
            cmd_propagate(&db, lemmas.as_deref(), config.as_deref(), target.as_deref())
        }
        Commands::Check { db, lemmas } => cmd_check(&db, lemmas.as_deref()),
        Commands::Explain { db, from, to, op } => {
            cmd_explain(&db, &from, to.as_deref(), op.as_deref())
        }
        Commands::Clear { db, all, out } => cmd_clear(&db, all, out.as_deref()),
    }
}

fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("warn")
    } else {
        match verbose {
            0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_lemmas(path: Option<&Path>) -> Result<LemmaTable> {
    match path {
        None => Ok(LemmaTable::standard()),
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read lemma table {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("failed to parse lemma table {}", path.display()))
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<PropagationConfig> {
    match path {
        None => Ok(PropagationConfig::default()),
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("failed to parse config {}", path.display()))
        }
    }
}

fn cmd_propagate(
    db_path: &Path,
    lemmas: Option<&Path>,
    config: Option<&Path>,
    out: Option<&Path>,
) -> Result<()> {
    let mut db = Database::load(db_path)?;
    let table = load_lemmas(lemmas)?;
    info!(
        path = %db_path.display(),
        languages = db.languages.len(),
        lemmas = table.lemmas.len(),
        "loaded database"
    );
    let propagator = Propagator::new(ReachabilityValidator::new(&table), table)
        .with_config(load_config(config)?);

    let mut graph = db.take_graph();
    let summary = propagator
        .run(&mut graph)
        .context("propagation failed; nothing was written")?;
    db.put_graph(graph);

    eprintln!(
        "{} {} upgraded, {} downgraded, {} operation facts refined ({} round(s))",
        "ok".green().bold(),
        summary.upgrades,
        summary.downgrades,
        summary.operation_changes,
        summary.rounds
    );

    match out {
        Some(path) => {
            db.save(path)?;
            eprintln!("{} {}", "wrote".green().bold(), path.display().to_string().bold());
        }
        None => println!("{}", serde_json::to_string_pretty(&db)?),
    }
    Ok(())
}

fn cmd_check(db_path: &Path, lemmas: Option<&Path>) -> Result<()> {
    let mut db = Database::load(db_path)?;
    let table = load_lemmas(lemmas)?;
    let mut graph = db.take_graph();
    graph.prepare()?;

    let report = ReachabilityValidator::new(&table).validate(&graph)?;
    debug!(violations = report.violations.len(), "validator finished");
    if report.ok() {
        println!("{} no contradictions", "ok".green().bold());
        return Ok(());
    }

    let names = graph.names();
    for v in &report.violations {
        let path: Vec<&str> = v.witness_path.iter().map(|id| names.name(id)).collect();
        println!("{} {}", "violation:".red().bold(), v.message);
        println!("  {} {}", "path:".yellow(), path.join(" → "));
        if let Some(caveat) = v.caveat() {
            println!("  {} {}", "assuming:".yellow(), caveat);
        }
    }
    bail!("{} violation(s) found", report.violations.len())
}

fn cmd_explain(db_path: &Path, from: &str, to: Option<&str>, op: Option<&str>) -> Result<()> {
    let mut db = Database::load(db_path)?;
    let mut graph = db.take_graph();
    graph.prepare()?;
    let names = graph.names();

    if let Some(op) = op {
        return explain_operation(&graph, &names, from, op);
    }
    let to = to.ok_or_else(|| anyhow!("a target language is required"))?;
    let rel = graph
        .relation(from, to)?
        .ok_or_else(|| anyhow!("nothing is known about {} → {}", names.name(from), names.name(to)))?;

    println!(
        "{} → {}: {} ({})",
        names.name(from).bold(),
        names.name(to).bold(),
        rel.status.phrase().cyan(),
        if rel.derived { "derived" } else { "asserted" }
    );
    print_support(&rel.refs, rel.caveat.as_ref());
    match rel.justification(|status| Claim::edge(from, to, status)) {
        Some(proof) => println!("{}", render::proof(&proof, &names)),
        None => println!("asserted{}", render::citations(&rel.refs)),
    }
    Ok(())
}

fn explain_operation(graph: &Graph, names: &NameResolver, language: &str, op: &str) -> Result<()> {
    let fact = graph
        .operation(language, op)
        .ok_or_else(|| anyhow!("nothing is known about {op} on {}", names.name(language)))?;
    println!(
        "{op} on {}: {} ({})",
        names.name(language).bold(),
        fact.status.phrase().cyan(),
        if fact.derived { "derived" } else { "asserted" }
    );
    print_support(&fact.refs, fact.caveat.as_ref());
    let claim = Claim::Operation {
        language: language.to_string(),
        operation: op.to_string(),
        status: fact.status,
    };
    match fact.justification(claim) {
        Some(proof) => println!("{}", render::proof(&proof, names)),
        None => println!("asserted{}", render::citations(&fact.refs)),
    }
    Ok(())
}

fn print_support(refs: &[String], caveat: Option<&kcmap_model::Caveat>) {
    if !refs.is_empty() {
        println!("  {} {}", "refs:".yellow(), refs.join(", "));
    }
    if let Some(caveat) = caveat {
        println!("  {} {}", "assuming:".yellow(), caveat);
    }
}

fn cmd_clear(db_path: &Path, all: bool, out: Option<&Path>) -> Result<()> {
    let mut db = Database::load(db_path)?;
    if all {
        db.clear_all();
    } else {
        db.clear_relations();
    }
    let target = out.unwrap_or(db_path);
    db.save(target)?;
    eprintln!(
        "{} {} {}",
        "cleared".green().bold(),
        if all { "all datasets in" } else { "relations in" },
        target.display().to_string().bold()
    );
    Ok(())
}
