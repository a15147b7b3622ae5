use easytalk_session::ConversationSession;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// State of one caller's slot.
#[derive(Debug, Default)]
pub enum Slot {
    /// Registered but no session built yet.
    #[default]
    Vacant,
    Live(ConversationSession),
    /// Unregistered by end of call; holders must re-acquire.
    Closed,
}

pub type SlotGuard = OwnedMutexGuard<Slot>;

/// Live sessions keyed by caller id.
///
/// Each caller owns one slot behind its own async mutex, held for the whole of
/// an orchestrator operation: operations for the same caller queue, different
/// callers run in parallel. The map lock is only held to look up or insert a
/// slot, never across provider or store calls.
#[derive(Default)]
pub struct SessionRegistry {
    slots: Mutex<HashMap<String, Arc<Mutex<Slot>>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock the caller's slot, registering a vacant one if none exists.
    pub async fn acquire(&self, caller_id: &str) -> SlotGuard {
        loop {
            let slot = {
                let mut slots = self.slots.lock().await;
                slots
                    .entry(caller_id.to_string())
                    .or_insert_with(|| Arc::new(Mutex::new(Slot::Vacant)))
                    .clone()
            };
            let guard = slot.lock_owned().await;
            if !matches!(*guard, Slot::Closed) {
                return guard;
            }
        }
    }

    /// Lock the caller's slot only if one is registered.
    pub async fn acquire_existing(&self, caller_id: &str) -> Option<SlotGuard> {
        loop {
            let slot = self.slots.lock().await.get(caller_id).cloned()?;
            let guard = slot.lock_owned().await;
            if !matches!(*guard, Slot::Closed) {
                return Some(guard);
            }
        }
    }

    /// Close a held slot and unregister it, so later callers start fresh.
    pub async fn discard(&self, caller_id: &str, mut guard: SlotGuard) {
        *guard = Slot::Closed;
        let mut slots = self.slots.lock().await;
        if slots
            .get(caller_id)
            .is_some_and(|registered| Arc::ptr_eq(registered, OwnedMutexGuard::mutex(&guard)))
        {
            slots.remove(caller_id);
        }
    }

    /// Number of registered slots, live or in use.
    ///
    /// Unlocked vacant slots are left behind by operations that were
    /// cancelled before building a session; they are closed and dropped here
    /// so they are not counted. Anyone already waiting on one re-acquires.
    pub async fn len(&self) -> usize {
        let mut slots = self.slots.lock().await;
        slots.retain(|_, slot| match slot.try_lock() {
            Ok(mut state) if matches!(*state, Slot::Vacant) => {
                *state = Slot::Closed;
                false
            }
            _ => true,
        });
        slots.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
