//! Session-keyed storage for battle state.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, RwLock};

use serde::{Deserialize, Serialize};

use crate::battle::BattleState;
use crate::error::StoreError;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        SessionId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SessionId {
    fn from(id: &str) -> Self {
        SessionId::new(id)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Storage of at most one battle per session.
///
/// `with_session` is the only primitive that must be atomic: the closure sees a
/// working copy of the slot while the session is locked, and the copy replaces the
/// stored value only if the closure returns `Ok`.
pub trait SessionStore: Send + Sync {
    fn with_session<T, E, F>(&self, session: &SessionId, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Option<BattleState>) -> Result<T, E>,
        E: From<StoreError>;

    /// Sessions that currently hold a battle.
    fn sessions(&self) -> Result<Vec<SessionId>, StoreError>;

    fn load(&self, session: &SessionId) -> Result<Option<BattleState>, StoreError> {
        self.with_session(session, |slot| Ok(slot.clone()))
    }

    /// Stores `state`, replacing any battle already in the session.
    fn put(&self, session: &SessionId, state: BattleState) -> Result<(), StoreError> {
        self.with_session(session, |slot| {
            *slot = Some(state);
            Ok(())
        })
    }

    fn remove(&self, session: &SessionId) -> Result<Option<BattleState>, StoreError> {
        self.with_session(session, |slot| Ok(slot.take()))
    }
}

type Slot = Arc<Mutex<Option<BattleState>>>;

/// In-memory store with one mutex per session. Empty sessions keep no entry.
#[derive(Default)]
pub struct InMemorySessionStore {
    slots: RwLock<HashMap<SessionId, Slot>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, session: &SessionId) -> Result<Slot, StoreError> {
        {
            let slots = self.slots.read().map_err(|_| StoreError::LockPoisoned)?;
            if let Some(slot) = slots.get(session) {
                return Ok(Arc::clone(slot));
            }
        }
        let mut slots = self.slots.write().map_err(|_| StoreError::LockPoisoned)?;
        Ok(Arc::clone(slots.entry(session.clone()).or_default()))
    }

    /// Drops the entry for `session` once it is empty and nobody else holds it.
    ///
    /// Slots are only cloned under the map lock, so a strong count of two (the map
    /// and `slot`) under the write lock means no other caller is using it.
    fn evict_if_idle(&self, session: &SessionId, slot: Slot) {
        let Ok(mut slots) = self.slots.write() else {
            return;
        };
        let idle = slots.get(session).is_some_and(|s| Arc::ptr_eq(s, &slot))
            && Arc::strong_count(&slot) == 2
            && slot.lock().map(|s| s.is_none()).unwrap_or(false);
        if idle {
            slots.remove(session);
        }
    }
}

impl SessionStore for InMemorySessionStore {
    fn with_session<T, E, F>(&self, session: &SessionId, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Option<BattleState>) -> Result<T, E>,
        E: From<StoreError>,
    {
        let slot = self.slot(session)?;
        let (res, empty) = {
            let mut stored = slot.lock().map_err(|_| StoreError::LockPoisoned)?;
            let mut working = stored.clone();
            let res = f(&mut working);
            if res.is_ok() {
                *stored = working;
            }
            (res, stored.is_none())
        };
        if empty {
            self.evict_if_idle(session, slot);
        }
        res
    }

    fn sessions(&self) -> Result<Vec<SessionId>, StoreError> {
        let slots = self.slots.read().map_err(|_| StoreError::LockPoisoned)?;
        let mut active = Vec::new();
        for (session, slot) in slots.iter() {
            let state = slot.lock().map_err(|_| StoreError::LockPoisoned)?;
            if state.is_some() {
                active.push(session.clone());
            }
        }
        active.sort();
        Ok(active)
    }
}

impl<S: SessionStore> SessionStore for Arc<S> {
    fn with_session<T, E, F>(&self, session: &SessionId, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Option<BattleState>) -> Result<T, E>,
        E: From<StoreError>,
    {
        (**self).with_session(session, f)
    }

    fn sessions(&self) -> Result<Vec<SessionId>, StoreError> {
        (**self).sessions()
    }
}
