//! Process-wide store registry.
//!
//! Maps a [`StoreId`] to its live store handle. Lives for the whole process
//! and only grows: there is no deregistration. The global instance is
//! created on first use and reached through [`Registry::global`].

use parking_lot::RwLock;
use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use tracing::{debug, warn};

use crate::handler::Handler;
use crate::store::{Store, StoreId};

type Entry = Arc<dyn Any + Send + Sync>;

#[derive(Default)]
pub struct Registry {
    stores: RwLock<HashMap<StoreId, Entry>>,
}

impl Registry {
    /// The process-wide registry.
    pub fn global() -> &'static Registry {
        static GLOBAL: OnceLock<Registry> = OnceLock::new();
        GLOBAL.get_or_init(Registry::default)
    }

    /// Insert `store` under its id. Idempotent: if the id is already taken
    /// the existing entry is kept and `false` is returned.
    pub fn register<H: Handler>(&self, store: &Store<H>) -> bool {
        let mut stores = self.stores.write();
        if stores.contains_key(store.id()) {
            debug!(store = %store.id(), "store already registered");
            return false;
        }
        stores.insert(store.id().clone(), Arc::new(store.clone()));
        debug!(store = %store.id(), "store registered");
        true
    }

    /// Typed lookup. Returns `None` when the id is unknown or was registered
    /// with a different handler type.
    pub fn get<H: Handler>(&self, id: &StoreId) -> Option<Store<H>> {
        let entry = self.stores.read().get(id).cloned()?;
        match entry.downcast_ref::<Store<H>>() {
            Some(store) => Some(store.clone()),
            None => {
                warn!(store = %id, "registered store has a different handler type");
                None
            }
        }
    }

    pub fn contains(&self, id: &StoreId) -> bool {
        self.stores.read().contains_key(id)
    }

    pub fn ids(&self) -> Vec<StoreId> {
        let mut ids: Vec<StoreId> = self.stores.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.stores.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.stores.read().is_empty()
    }
}
