//! Integration tests for handlers and operations: routing, background
//! execution, permissions, reads, serialization and shutdown.

mod common;

use async_trait::async_trait;
use common::*;
use igloo_rs::config::StoreConfig;
use igloo_rs::event::EventKind;
use igloo_rs::model::DomainPermissions;
use igloo_rs::{Action, Error, Handler, HandlerTable, Operation, Request, Result, Store};
use std::time::Duration;
use tokio::runtime::Handle;

// ---------------------------------------------------------------------------
// Routing
// ---------------------------------------------------------------------------

#[tokio::test]
async fn missing_route_fails_with_missing_handler() {
    let handler = LedgerHandler::new().on(Kind::Increment, |s, _| {
        s.count += 1;
        Ok(Some(s.count))
    });
    assert!(handler.handles(Kind::Increment));
    assert!(!handler.handles(Kind::Unlock));

    let store = Store::spawn_local(
        unique_id("missing-route"),
        handler,
        Ledger::default(),
        &StoreConfig::default(),
    )
    .unwrap();

    let result = store
        .dispatch(LedgerRequest::action(Action::sync(Kind::Unlock)))
        .await;

    assert!(matches!(result, Err(Error::MissingHandler(ref kind)) if kind == "Unlock"));
}

#[tokio::test]
async fn later_route_replaces_earlier_one() {
    let handler = LedgerHandler::new()
        .on(Kind::A, |_, _| Ok(Some(1)))
        .on(Kind::A, |_, _| Ok(Some(2)));
    assert_eq!(handler.len(), 1);

    let store = Store::spawn_local(
        unique_id("replace-route"),
        handler,
        Ledger::default(),
        &StoreConfig::default(),
    )
    .unwrap();

    let result = store
        .dispatch(LedgerRequest::action(Action::sync(Kind::A)))
        .await
        .unwrap();
    assert_eq!(result, Some(2));
}

// ---------------------------------------------------------------------------
// Custom handler and operation types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Doc {
    Append,
}

/// Handler that yields before mutating, standing in for real async work.
struct SlowAppender;

#[async_trait]
impl Handler for SlowAppender {
    type State = Vec<String>;
    type Kind = Doc;
    type Output = usize;

    async fn handle(&self, state: &mut Vec<String>, action: Action<Doc>) -> Result<Option<usize>> {
        tokio::time::sleep(Duration::from_millis(5)).await;
        state.push(format!("{:?}/{}", action.kind(), action.mode()));
        Ok(Some(state.len()))
    }
}

struct AppendLater(&'static str);

#[async_trait]
impl Operation<Vec<String>, usize> for AppendLater {
    async fn run(self: Box<Self>, state: &mut Vec<String>) -> Result<Option<usize>> {
        tokio::task::yield_now().await;
        state.push(self.0.to_string());
        Ok(Some(state.len()))
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn background_actions_run_on_the_executor() {
    let store = Store::spawn_local(
        unique_id("background"),
        SlowAppender,
        Vec::new(),
        &StoreConfig::default(),
    )
    .unwrap();

    let first = store
        .dispatch(Request::<SlowAppender>::action(Action::background(Doc::Append)))
        .await
        .unwrap();
    let second = store
        .dispatch(Request::<SlowAppender>::action(Action::sync(Doc::Append)))
        .await
        .unwrap();

    assert_eq!(first, Some(1));
    assert_eq!(second, Some(2));
    let entries = store
        .read(&Handle::current(), |s: &Vec<String>| Ok(s.clone()))
        .await
        .unwrap();
    assert_eq!(entries, vec!["Append/async", "Append/sync"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn deferred_background_action_replays() {
    let store = Store::spawn_local(
        unique_id("background-replay"),
        SlowAppender,
        Vec::new(),
        &StoreConfig::default(),
    )
    .unwrap();

    let deferred = store
        .dispatch(
            Request::<SlowAppender>::action(Action::background(Doc::Append))
                .when(|s: &Vec<String>| s.iter().any(|e| e == "ready")),
        )
        .await
        .unwrap();
    assert_eq!(deferred, None);

    store
        .dispatch(Request::<SlowAppender>::operation(AppendLater("ready")))
        .await
        .unwrap();

    let entries = store
        .read(&Handle::current(), |s: &Vec<String>| Ok(s.clone()))
        .await
        .unwrap();
    assert_eq!(entries, vec!["ready", "Append/async"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn background_handler_error_reaches_the_caller() {
    let store = Store::spawn_local(
        unique_id("background-error"),
        ledger_handler(),
        Ledger::default(),
        &StoreConfig::default(),
    )
    .unwrap();

    let result = store
        .dispatch(LedgerRequest::action(Action::background(Kind::Fail)))
        .await;
    assert!(matches!(result, Err(Error::Domain(ref m)) if m == "rejected"));

    let next = store
        .dispatch(LedgerRequest::action(Action::background(Kind::Increment)))
        .await
        .unwrap();
    assert_eq!(next, Some(1));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn background_handler_panic_surfaces_as_join_error() {
    let handler = LedgerHandler::new()
        .on(Kind::Fail, |_, _| panic!("boom"))
        .on(Kind::Increment, |s, _| {
            s.count += 1;
            Ok(Some(s.count))
        });
    let store = Store::spawn_local(
        unique_id("background-panic"),
        handler,
        Ledger::default(),
        &StoreConfig::default(),
    )
    .unwrap();

    let result = store
        .dispatch(LedgerRequest::action(Action::background(Kind::Fail)))
        .await;
    assert!(matches!(result, Err(Error::Join(ref e)) if e.is_panic()));

    // The store survives and its state lock is usable again.
    let next = store
        .dispatch(LedgerRequest::action(Action::sync(Kind::Increment)))
        .await
        .unwrap();
    assert_eq!(next, Some(1));
}

// ---------------------------------------------------------------------------
// Permissions
// ---------------------------------------------------------------------------

#[tokio::test]
async fn permission_checks_reject_writes() {
    let perms = DomainPermissions::read_only("ledger");
    let handler = LedgerHandler::new().on(Kind::Increment, move |s, _| {
        perms.check_write("ledger")?;
        s.count += 1;
        Ok(Some(s.count))
    });
    let store = Store::spawn_local(
        unique_id("permissions"),
        handler,
        Ledger::default(),
        &StoreConfig::default(),
    )
    .unwrap();

    let result = store
        .dispatch(LedgerRequest::action(Action::sync(Kind::Increment)))
        .await;

    assert!(matches!(result, Err(Error::Permission { ref domain, .. }) if domain == "ledger"));
    assert_eq!(count_of(&store).await, 0);
}

#[test]
fn permissions_are_scoped_to_one_domain() {
    let perms = DomainPermissions::read_write("ledger");

    assert!(perms.check_read("ledger").is_ok());
    assert!(perms.check_write("ledger").is_ok());
    assert!(perms.check_read("inventory").is_err());
    assert!(DomainPermissions::read_only("ledger").check_read("ledger").is_ok());
    assert!(DomainPermissions::new("ledger", false, false)
        .check_read("ledger")
        .is_err());
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

#[tokio::test]
async fn read_errors_reach_the_caller() {
    let store = locked_store("read-error");

    let result = store
        .read(&Handle::current(), |_: &Ledger| {
            Err::<(), _>(Error::domain("not readable"))
        })
        .await;

    assert!(matches!(result, Err(Error::Domain(_))));
}

#[tokio::test]
async fn read_sees_committed_state() {
    let store = locked_store("read-state");
    store
        .dispatch(LedgerRequest::action(Action::sync(Kind::Unlock)))
        .await
        .unwrap();

    let locked = store
        .read(&Handle::current(), |s: &Ledger| Ok(s.locked))
        .await
        .unwrap();

    assert!(!locked);
}

// ---------------------------------------------------------------------------
// Serialization
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_dispatches_are_serialized() {
    let store = Store::spawn_local(
        unique_id("concurrent"),
        ledger_handler(),
        Ledger::default(),
        &StoreConfig::default(),
    )
    .unwrap();

    let mut tasks = Vec::new();
    for i in 0..8 {
        let store = store.clone();
        tasks.push(tokio::spawn(async move {
            for _ in 0..25 {
                let action = if i % 2 == 0 {
                    Action::sync(Kind::Increment)
                } else {
                    Action::background(Kind::Increment)
                };
                store.dispatch(LedgerRequest::action(action)).await.unwrap();
            }
        }));
    }
    for result in futures::future::join_all(tasks).await {
        result.unwrap();
    }

    assert_eq!(count_of(&store).await, 200);
}

// ---------------------------------------------------------------------------
// Shutdown
// ---------------------------------------------------------------------------

async fn wait_closed<H: Handler>(store: &Store<H>) {
    for _ in 0..100 {
        if store.is_closed() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("store {} did not close", store.id());
}

#[tokio::test]
async fn shutdown_drops_pending_and_closes_the_store() {
    let store = locked_store("shutdown");
    let mut events = store.subscribe();
    store
        .dispatch(LedgerRequest::action(Action::sync(Kind::Increment)).when(unlocked))
        .await
        .unwrap();

    store.shutdown();
    wait_closed(&store).await;

    let result = store
        .dispatch(LedgerRequest::action(Action::sync(Kind::Unlock)))
        .await;
    assert!(matches!(result, Err(Error::StoreClosed(_))));

    let kinds: Vec<EventKind> = std::iter::from_fn(|| events.try_recv().ok())
        .map(|e| e.kind)
        .collect();
    assert_eq!(kinds.last(), Some(&EventKind::Stopped { dropped: 1 }));
}

#[test]
fn spawning_outside_a_runtime_fails() {
    let result = Store::spawn_local(
        "no-runtime",
        HandlerTable::<Ledger, Kind, u32>::new(),
        Ledger::default(),
        &StoreConfig::default(),
    )
    .map(|_| ());

    assert!(matches!(result, Err(Error::NoRuntime)));
}

#[tokio::test]
async fn invalid_store_config_is_rejected() {
    let config = StoreConfig {
        mailbox_capacity: 0,
        ..StoreConfig::default()
    };

    let result = Store::spawn_local("zero-mailbox", ledger_handler(), Ledger::default(), &config);

    assert!(matches!(result, Err(Error::Config(_))));
}
