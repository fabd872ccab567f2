use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use coder_logging::{coder_error, coder_trace};

use crate::update::{update, TransitionError};
use crate::{Action, ActionKind, AppState};

type Listener = Box<dyn FnMut(&AppState, &Action) + Send>;

/// Handle returned by `subscribe`; pass it back to `unsubscribe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "dropping a subscription handle makes the listener impossible to remove"]
pub struct Subscription {
    id: u64,
    kind: Option<ActionKind>,
}

/// Owns the application state and notifies listeners after each transition.
pub struct Store {
    state: AppState,
    next_id: u64,
    by_kind: HashMap<ActionKind, Vec<(u64, Listener)>>,
    wildcard: Vec<(u64, Listener)>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new(AppState::default())
    }
}

impl Store {
    pub fn new(initial: AppState) -> Self {
        Self {
            state: initial,
            next_id: 0,
            by_kind: HashMap::new(),
            wildcard: Vec::new(),
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Applies `action`. A failed transition is logged and leaves both the
    /// state and every listener untouched.
    pub fn dispatch(&mut self, action: Action) -> Result<(), TransitionError> {
        let kind = action.kind();
        let next = match update(self.state.clone(), &action) {
            Ok(next) => next,
            Err(err) => {
                coder_error!("Dispatch of {:?} rejected: {}", kind, err);
                return Err(err);
            }
        };
        self.state = next;
        coder_trace!("Dispatched {:?}", kind);

        if let Some(listeners) = self.by_kind.get_mut(&kind) {
            for (_, listener) in listeners.iter_mut() {
                listener(&self.state, &action);
            }
        }
        for (_, listener) in self.wildcard.iter_mut() {
            listener(&self.state, &action);
        }
        Ok(())
    }

    pub fn subscribe<F>(&mut self, kind: ActionKind, listener: F) -> Subscription
    where
        F: FnMut(&AppState, &Action) + Send + 'static,
    {
        let id = self.allocate_id();
        self.by_kind
            .entry(kind)
            .or_default()
            .push((id, Box::new(listener)));
        Subscription {
            id,
            kind: Some(kind),
        }
    }

    /// Listener invoked after every successful dispatch, after the per-kind ones.
    pub fn subscribe_all<F>(&mut self, listener: F) -> Subscription
    where
        F: FnMut(&AppState, &Action) + Send + 'static,
    {
        let id = self.allocate_id();
        self.wildcard.push((id, Box::new(listener)));
        Subscription { id, kind: None }
    }

    /// Removes exactly the listener behind `subscription`. Returns false if it
    /// was already gone.
    pub fn unsubscribe(&mut self, subscription: Subscription) -> bool {
        let listeners = match subscription.kind {
            Some(kind) => match self.by_kind.get_mut(&kind) {
                Some(listeners) => listeners,
                None => return false,
            },
            None => &mut self.wildcard,
        };
        let before = listeners.len();
        listeners.retain(|(id, _)| *id != subscription.id);
        listeners.len() != before
    }

    pub fn into_shared(self) -> StoreHandle {
        StoreHandle {
            inner: Arc::new(Mutex::new(self)),
        }
    }

    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Cloneable handle for flows that outlive a single borrow, such as a sync
/// running on the async runtime.
///
/// Listeners run while the store is locked and must not dispatch through the
/// same handle.
#[derive(Clone)]
pub struct StoreHandle {
    inner: Arc<Mutex<Store>>,
}

impl StoreHandle {
    pub fn new(store: Store) -> Self {
        store.into_shared()
    }

    pub fn dispatch(&self, action: Action) -> Result<(), TransitionError> {
        self.lock().dispatch(action)
    }

    /// Clone of the current state.
    pub fn snapshot(&self) -> AppState {
        self.lock().state().clone()
    }

    pub fn with_state<R>(&self, read: impl FnOnce(&AppState) -> R) -> R {
        read(self.lock().state())
    }

    pub fn lock(&self) -> MutexGuard<'_, Store> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
