//! dbguard CLI entry point.
//!
//! Provides `check`, `scope`, and `resolve` subcommands for evaluating a
//! database access decision against a workspace config, extracting the
//! environments a condition expression grants, and reconciling approval rules.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Deserialize;
use tracing::info;

use dbguard::approval::{LocalApprovalRule, ParsedApprovalRule, UnrecognizedApprovalRule};
use dbguard::config::{default_config_path, load_config};
use dbguard::types::{DataSourceKind, Database};
use dbguard::workspace::Workspace;
use dbguard::{extract_scope_values, logging, resolve, Expr};

/// dbguard — database access decisions and approval-rule reconciliation.
#[derive(Parser)]
#[command(name = "dbguard", version, about)]
struct Cli {
    /// Config file (default: `$DBGUARD_CONFIG` or `~/.dbguard/config.toml`).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Write JSON decision logs to this directory.
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

/// Available CLI subcommands.
#[derive(Subcommand)]
enum Command {
    /// Decide whether a workspace member may access a database.
    Check {
        /// Member email.
        #[arg(long)]
        user: String,
        /// Database name.
        #[arg(long)]
        database: String,
        /// Instance hosting the database.
        #[arg(long)]
        instance: String,
        /// Environment the instance belongs to.
        #[arg(long)]
        environment: String,
        /// Also run the data-source guard for this connection kind.
        #[arg(long, value_enum)]
        connection: Option<Connection>,
        /// Include the step of the access chain that decided.
        #[arg(long)]
        explain: bool,
    },
    /// Print the environments a condition expression (JSON) grants.
    Scope {
        /// Expression as JSON.
        #[arg(long)]
        expr: String,
    },
    /// Reconcile an approval document (JSON) and report unbound outcomes.
    Resolve {
        /// Path to the approval document.
        #[arg(long)]
        file: PathBuf,
    },
}

/// Connection kinds accepted on the command line.
#[derive(Clone, Copy, ValueEnum)]
enum Connection {
    /// Administrative connection.
    Admin,
    /// Read-only connection.
    ReadOnly,
}

impl From<Connection> for DataSourceKind {
    fn from(c: Connection) -> Self {
        match c {
            Connection::Admin => DataSourceKind::Admin,
            Connection::ReadOnly => DataSourceKind::ReadOnly,
        }
    }
}

/// Input for `resolve`.
#[derive(Deserialize)]
struct ApprovalDocument {
    #[serde(default)]
    rules: Vec<LocalApprovalRule>,
    #[serde(default)]
    parsed: Vec<ParsedApprovalRule>,
    #[serde(default)]
    unrecognized: Vec<UnrecognizedApprovalRule>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Check {
            user,
            database,
            instance,
            environment,
            connection,
            explain,
        } => {
            let database = Database::new(database, instance, environment);
            handle_check(
                cli.config,
                cli.log_dir,
                &user,
                &database,
                connection.map(DataSourceKind::from),
                explain,
            )
        }
        Command::Scope { expr } => {
            logging::init_cli("warn");
            handle_scope(&expr)
        }
        Command::Resolve { file } => {
            logging::init_cli("warn");
            handle_resolve(&file)
        }
    }
}

/// Evaluate access for one member on one database.
fn handle_check(
    config_path: Option<PathBuf>,
    log_dir: Option<PathBuf>,
    user: &str,
    database: &Database,
    connection: Option<DataSourceKind>,
    explain: bool,
) -> anyhow::Result<()> {
    let config_path = match config_path {
        Some(p) => p,
        None => default_config_path()?,
    };
    let config = load_config(&config_path)?;

    let _logging_guard = match log_dir.or_else(|| config.logging.dir.clone()) {
        Some(dir) => Some(logging::init_production(&dir, &config.logging.level)?),
        None => {
            logging::init_cli(&config.logging.level);
            None
        }
    };

    let workspace = Workspace::from_snapshot(config.workspace)
        .with_context(|| format!("invalid workspace in {}", config_path.display()))?;
    let principal = workspace
        .principal(user)
        .ok_or_else(|| anyhow::anyhow!("unknown user: {user}"))?;

    let gate = workspace.gate();
    let decision = gate.evaluate(&principal, database);
    info!(
        user = %principal.email,
        database = %database.resource_name(),
        granted = decision.is_granted(),
        "access evaluated"
    );

    let mut report = serde_json::json!({
        "user": principal.email,
        "database": database.resource_name(),
        "granted": decision.is_granted(),
    });
    if explain {
        report["decision"] = serde_json::to_value(decision)?;
    }
    if let Some(kind) = connection {
        report["connection_allowed"] =
            serde_json::Value::Bool(gate.check_access(database, &principal, kind));
    }

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Print the scope values of an expression.
fn handle_scope(expr_json: &str) -> anyhow::Result<()> {
    let expr: Expr = serde_json::from_str(expr_json).context("invalid expression JSON")?;
    let values = extract_scope_values(&expr);
    println!("{}", serde_json::to_string(&values)?);
    Ok(())
}

/// Reconcile an approval document and print a summary.
fn handle_resolve(path: &Path) -> anyhow::Result<()> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let doc: ApprovalDocument = serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse {}", path.display()))?;

    let config = resolve(doc.rules, doc.parsed, doc.unrecognized)?;

    let orphaned: Vec<&str> = config
        .orphaned_rules()
        .into_iter()
        .map(|r| r.uid.as_str())
        .collect();
    let report = serde_json::json!({
        "rules": config.rules.len(),
        "parsed": config.parsed.len(),
        "unrecognized": config.unrecognized.len(),
        "unbound": config.unbound_outcomes(),
        "orphaned": orphaned,
    });

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
