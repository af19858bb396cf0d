//! Purpose: `blendb` CLI entry point and command definitions.
//! Role: Binary crate root; parses args, runs commands, emits JSON on stdout.
//! Invariants: Non-interactive errors are emitted as JSON on stderr.
//! Invariants: Process exit code is derived from `api::to_exit_code`.
//! Invariants: All store access goes through `api::SessionFactory` (one
//! federated session per command).
use std::path::PathBuf;

use clap::{Args, CommandFactory, Parser, Subcommand, ValueHint, error::ErrorKind as ClapErrorKind};
use clap_complete::aot::Shell;
use serde_json::json;

use blendb::api::{BackendId, Error, ErrorKind, to_exit_code};

mod command_dispatch;
mod record_json;
mod serve;
mod store_paths;

use store_paths::default_store_path;

#[derive(Copy, Clone, Debug)]
struct RunOutcome {
    exit_code: i32,
}

impl RunOutcome {
    fn ok() -> Self {
        Self { exit_code: 0 }
    }

    fn with_code(exit_code: i32) -> Self {
        Self { exit_code }
    }
}

#[derive(Parser)]
#[command(name = "blendb", version, about = "Federated sessions over two SQLite stores")]
struct Cli {
    /// Primary store database file (owns users).
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    primary: Option<PathBuf>,

    /// Secondary store database file (owns orders).
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    secondary: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the read endpoints over HTTP.
    Serve(ServeArgs),
    /// Seed the stores with sample or demo data.
    Seed(SeedArgs),
    /// Stage one record and commit it.
    Add {
        #[command(subcommand)]
        record: AddRecord,
    },
    /// List committed records of one type as JSON.
    List {
        /// Record type: `users` or `orders`.
        kind: String,
    },
    /// Generate shell completions.
    Completion {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args)]
struct ServeArgs {
    /// Address to bind, host:port.
    #[arg(long, default_value = "127.0.0.1:9800")]
    bind: String,

    /// Permit binding a non-loopback address.
    #[arg(long)]
    allow_non_loopback: bool,

    /// Use throwaway in-memory stores instead of the database files.
    #[arg(long)]
    memory: bool,

    /// Seed the fixed sample records at startup.
    #[arg(long)]
    seed_sample: bool,

    /// Seed N demo users and N demo orders at startup.
    #[arg(long, value_name = "N")]
    seed_demo: Option<usize>,

    /// RNG seed for demo data.
    #[arg(long, default_value_t = 42)]
    rng_seed: u64,
}

#[derive(Args)]
struct SeedArgs {
    /// Seed the fixed sample records instead of demo data.
    #[arg(long)]
    sample: bool,

    /// Number of demo users and orders.
    #[arg(long, default_value_t = 10)]
    count: usize,

    /// RNG seed for demo data.
    #[arg(long, default_value_t = 42)]
    rng_seed: u64,
}

#[derive(Subcommand)]
enum AddRecord {
    /// Add a user to the primary store.
    User {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
    },
    /// Add an order to the secondary store.
    Order {
        #[arg(long)]
        item: String,
        #[arg(long)]
        quantity: i64,
    },
}

fn main() {
    let exit_code = match run() {
        Ok(outcome) => outcome.exit_code,
        Err(err) => {
            emit_error(&err);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn run() -> Result<RunOutcome, Error> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp
            | ClapErrorKind::DisplayVersion
            | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                err.print().map_err(|io_err| {
                    Error::new(ErrorKind::Io)
                        .with_message("failed to write help")
                        .with_source(io_err)
                })?;
                let exit_code = if matches!(
                    err.kind(),
                    ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) {
                    2
                } else {
                    0
                };
                return Ok(RunOutcome::with_code(exit_code));
            }
            _ => {
                return Err(Error::new(ErrorKind::Usage)
                    .with_message(err.to_string().trim_end().to_string())
                    .with_hint("Run with --help for usage."));
            }
        },
    };

    let primary = cli
        .primary
        .unwrap_or_else(|| default_store_path(BackendId::Primary));
    let secondary = cli
        .secondary
        .unwrap_or_else(|| default_store_path(BackendId::Secondary));

    command_dispatch::dispatch_command(cli.command, primary, secondary)
}

fn emit_error(err: &Error) {
    let mut body = json!({
        "error": {
            "kind": format!("{:?}", err.kind()),
            "message": err.message().unwrap_or("error"),
        }
    });
    if let Some(hint) = err.hint() {
        body["error"]["hint"] = json!(hint);
    }
    if let Some(backend) = err.backend() {
        body["error"]["backend"] = json!(backend.as_str());
    }
    eprintln!("{body}");
}
