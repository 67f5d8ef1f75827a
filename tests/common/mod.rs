//! Shared fixture: a lockable ledger with a handful of routed actions.

#![allow(dead_code)]

use igloo_rs::config::StoreConfig;
use igloo_rs::{Error, HandlerTable, Request, Result, Store};
use tokio::runtime::Handle;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Increment,
    Lock,
    Unlock,
    A,
    B,
    C,
    Fail,
}

#[derive(Debug, Default)]
pub struct Ledger {
    pub locked: bool,
    pub count: u32,
    pub log: Vec<String>,
}

pub type LedgerHandler = HandlerTable<Ledger, Kind, u32>;
pub type LedgerRequest = Request<LedgerHandler>;

pub fn ledger_handler() -> LedgerHandler {
    LedgerHandler::new()
        .on(Kind::Increment, |s, _| {
            s.count += 1;
            s.log.push("increment".into());
            Ok(Some(s.count))
        })
        .on(Kind::Lock, |s, _| {
            s.locked = true;
            s.log.push("lock".into());
            Ok(None)
        })
        .on(Kind::Unlock, |s, _| {
            s.locked = false;
            s.log.push("unlock".into());
            Ok(None)
        })
        .on(Kind::A, |s, _| {
            s.log.push("a".into());
            Ok(None)
        })
        .on(Kind::B, |s, _| {
            s.log.push("b".into());
            Ok(None)
        })
        .on(Kind::C, |s, _| {
            s.log.push("c".into());
            Ok(None)
        })
        .on(Kind::Fail, |s, _| {
            s.log.push("fail".into());
            Err(Error::domain("rejected"))
        })
}

/// Unique id per test; the registry is process-wide.
pub fn unique_id(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::new_v4())
}

/// A fresh ledger store, locked, on the current runtime.
pub fn locked_store(prefix: &str) -> Store<LedgerHandler> {
    Store::spawn_local(
        unique_id(prefix),
        ledger_handler(),
        Ledger {
            locked: true,
            ..Ledger::default()
        },
        &StoreConfig::default(),
    )
    .expect("store should spawn inside a runtime")
}

/// Operation that appends `label` to the log.
pub fn note(label: &'static str) -> impl FnOnce(&mut Ledger) -> Result<Option<u32>> + Send + 'static {
    move |s: &mut Ledger| {
        s.log.push(label.to_string());
        Ok(None)
    }
}

pub fn unlocked(s: &Ledger) -> bool {
    !s.locked
}

pub async fn log_of(store: &Store<LedgerHandler>) -> Vec<String> {
    store
        .read(&Handle::current(), |s: &Ledger| Ok(s.log.clone()))
        .await
        .unwrap()
}

pub async fn count_of(store: &Store<LedgerHandler>) -> u32 {
    store
        .read(&Handle::current(), |s: &Ledger| Ok(s.count))
        .await
        .unwrap()
}
