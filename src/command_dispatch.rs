//! Purpose: Hold top-level CLI command dispatch for `blendb`.
//! Exports: `dispatch_command`.
//! Role: Keep `main.rs` focused on parse/bootstrap and delegate command execution.
//! Invariants: Every command acquires at most one federated session and closes it.
//! Invariants: Command output envelopes and exit-code semantics stay unchanged.

use super::*;

use std::net::SocketAddr;

use blendb::api::{
    BackendId, Order, Record, RecordType, SessionFactory, StoreConfig, StoreRegistry, User,
    seed_demo, seed_sample,
};
use crate::record_json::records_json;

pub(super) fn dispatch_command(
    command: Command,
    primary: PathBuf,
    secondary: PathBuf,
) -> Result<RunOutcome, Error> {
    match command {
        Command::Completion { shell } => {
            let mut cmd = Cli::command();
            clap_complete::aot::generate(shell, &mut cmd, "blendb", &mut std::io::stdout());
            Ok(RunOutcome::ok())
        }
        Command::Serve(args) => {
            let bind: SocketAddr = args.bind.parse().map_err(|_| {
                Error::new(ErrorKind::Usage)
                    .with_message("invalid bind address")
                    .with_hint("Use a host:port value like 127.0.0.1:9800.")
            })?;
            let (primary_config, secondary_config) = if args.memory {
                (
                    StoreConfig::memory(BackendId::Primary, "blendb_primary"),
                    StoreConfig::memory(BackendId::Secondary, "blendb_secondary"),
                )
            } else {
                (
                    StoreConfig::file(BackendId::Primary, primary),
                    StoreConfig::file(BackendId::Secondary, secondary),
                )
            };
            let config = serve::ServeConfig {
                bind,
                primary: primary_config,
                secondary: secondary_config,
                seed_sample: args.seed_sample,
                seed_demo: args.seed_demo,
                demo_rng_seed: args.rng_seed,
                allow_non_loopback: args.allow_non_loopback,
            };
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .map_err(|err| {
                    Error::new(ErrorKind::Internal)
                        .with_message("failed to start runtime")
                        .with_source(err)
                })?;
            runtime.block_on(serve::serve(config))?;
            Ok(RunOutcome::ok())
        }
        Command::Seed(args) => {
            let factory = file_factory(primary, secondary)?;
            let (users, orders) = if args.sample {
                factory.with_session(seed_sample)?;
                (1, 1)
            } else {
                factory.with_session(|session| seed_demo(session, args.count, args.rng_seed))?;
                (args.count, args.count)
            };
            emit_json(json!({ "seeded": { "users": users, "orders": orders } }));
            Ok(RunOutcome::ok())
        }
        Command::Add { record } => {
            let factory = file_factory(primary, secondary)?;
            let (record, record_type) = match record {
                AddRecord::User { name, email } => {
                    (Record::User(User::new(name, email)), RecordType::User)
                }
                AddRecord::Order { item, quantity } => {
                    (Record::Order(Order::new(item, quantity)), RecordType::Order)
                }
            };
            factory.with_session(|session| {
                session.add(record)?;
                session.commit()
            })?;
            emit_json(json!({ "ok": true, "type": record_type.as_str() }));
            Ok(RunOutcome::ok())
        }
        Command::List { kind } => {
            let record_type = RecordType::parse(&kind).ok_or_else(|| {
                Error::new(ErrorKind::Usage)
                    .with_message(format!("unknown record type: {kind}"))
                    .with_hint("Use `users` or `orders`.")
            })?;
            let factory = file_factory(primary, secondary)?;
            let records =
                factory.with_session(|session| session.query(record_type)?.fetch_all())?;
            let mut body = serde_json::Map::new();
            body.insert(
                record_type.table().to_string(),
                serde_json::Value::Array(records_json(&records)),
            );
            emit_json(serde_json::Value::Object(body));
            Ok(RunOutcome::ok())
        }
    }
}

fn file_factory(primary: PathBuf, secondary: PathBuf) -> Result<SessionFactory, Error> {
    SessionFactory::new(
        StoreRegistry::standard(),
        vec![
            StoreConfig::file(BackendId::Primary, primary),
            StoreConfig::file(BackendId::Secondary, secondary),
        ],
    )
}

fn emit_json(value: serde_json::Value) {
    println!("{value}");
}
