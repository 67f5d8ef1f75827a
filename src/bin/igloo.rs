//! igloo CLI: runs the lock/increment replay scenario against a live store.

use clap::{Parser, Subcommand};
use igloo_rs::config::Config;
use igloo_rs::event::StoreEvent;
use igloo_rs::telemetry::{TelemetryConfig, init_telemetry};
use igloo_rs::{Action, Dispatcher, HandlerTable, Request, Store};
use serde::Serialize;
use std::path::PathBuf;
use tokio::sync::broadcast::error::TryRecvError;

#[derive(Parser)]
#[command(name = "igloo", about = "Conditional dispatch with pending-task replay")]
struct Cli {
    /// TOML config file. Environment variables are used when absent.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Defer increments behind a lock, unlock, and watch them replay
    Demo {
        /// Number of increments dispatched while locked
        #[arg(long, default_value_t = 3)]
        deferred: u32,
        /// Print the final state and events as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the resolved configuration
    Config,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum CounterAction {
    Increment,
    Unlock,
}

#[derive(Debug, Default, Serialize)]
struct Counter {
    locked: bool,
    count: u32,
}

type CounterHandler = HandlerTable<Counter, CounterAction, u32>;
type CounterRequest = Request<CounterHandler>;

#[derive(Serialize)]
struct DemoReport {
    count: u32,
    locked: bool,
    events: Vec<StoreEvent>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = match cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env()?,
    };

    match cli.command {
        Command::Demo { deferred, json } => cmd_demo(config, deferred, json).await,
        Command::Config => {
            println!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

async fn cmd_demo(config: Config, deferred: u32, json: bool) -> anyhow::Result<()> {
    let _guard = init_telemetry(TelemetryConfig {
        endpoint: config.otel_endpoint.clone(),
        service_name: "igloo".to_string(),
        log_level: config.log_level.clone(),
    })?;

    let handler = CounterHandler::new()
        .on(CounterAction::Increment, |state, _| {
            state.count += 1;
            Ok(Some(state.count))
        })
        .on(CounterAction::Unlock, |state, _| {
            state.locked = false;
            Ok(None)
        });

    let dispatcher = Dispatcher::new(config.store)?;
    let store: Store<CounterHandler> = dispatcher.spawn_store(
        "demo-counter",
        handler,
        Counter {
            locked: true,
            count: 0,
        },
    )?;
    let mut events = store.subscribe();

    for _ in 0..deferred {
        let request = CounterRequest::action(Action::sync(CounterAction::Increment))
            .when(|s: &Counter| !s.locked);
        dispatcher.dispatch(&store, request).await?;
    }
    let waiting = dispatcher.pending(&store).await?;
    println!("locked: {} increment(s) waiting", waiting.actions.len());

    dispatcher
        .dispatch_action(&store, Action::sync(CounterAction::Unlock))
        .await?;

    let (count, locked) = dispatcher
        .read(&store, |s: &Counter| Ok((s.count, s.locked)))
        .await?;

    let mut seen = Vec::new();
    loop {
        match events.try_recv() {
            Ok(event) => seen.push(event),
            Err(TryRecvError::Lagged(missed)) => eprintln!("missed {missed} events"),
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
        }
    }

    if json {
        let report = DemoReport {
            count,
            locked,
            events: seen,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for event in &seen {
            println!("{:>4}  {:?}", event.seq, event.kind);
        }
        println!("count: {count}, locked: {locked}");
    }

    store.shutdown();
    Ok(())
}
