//! Shared cart store behind the synchronizer.
//!
//! Every write is a full replacement made under one short lock that is never
//! held across an await.

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use jiff::Timestamp;
use rusty_money::iso::Currency;
use tokio::sync::broadcast;
use tracing::trace;

use crate::{
    cart::CartSnapshot,
    config::SyncConfig,
    gateway::CartGateway,
    materializer::MaterializeError,
    synchronizer::{
        notifier::{CartNotifier, Notice},
        state::{CartEvent, CartState},
    },
};

/// Cart shown before an optimistic update, kept for rollback.
#[derive(Debug, Clone)]
pub(super) struct Rollback {
    cart: Option<Arc<CartSnapshot>>,
    authoritative: bool,
    revision: u64,
}

#[derive(Debug, Default)]
struct Shared {
    state: CartState,

    /// `updated_at` of the last authoritative cart.
    last_updated_at: Option<Timestamp>,

    /// Whether the displayed cart is the last authoritative one.
    authoritative: bool,

    /// Last authoritative cart, displayed or not.
    confirmed: Option<Arc<CartSnapshot>>,

    /// Bumped by every authoritative publish and every rollback.
    revision: u64,

    known_currency: Option<&'static Currency>,

    in_flight: usize,
}

pub(super) struct Store {
    pub(super) gateway: Arc<dyn CartGateway>,
    pub(super) config: SyncConfig,
    notifier: Option<Arc<dyn CartNotifier>>,
    shared: Mutex<Shared>,
    events: broadcast::Sender<CartEvent>,
}

impl Debug for Store {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("Store")
            .field("config", &self.config)
            .field("shared", &self.shared)
            .finish_non_exhaustive()
    }
}

impl Store {
    pub(super) fn new(
        gateway: Arc<dyn CartGateway>,
        config: SyncConfig,
        notifier: Option<Arc<dyn CartNotifier>>,
    ) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));

        Self {
            gateway,
            config,
            notifier,
            shared: Mutex::new(Shared {
                authoritative: true,
                ..Shared::default()
            }),
            events,
        }
    }

    fn shared(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: CartEvent) {
        if self.events.send(event).is_err() {
            trace!("no cart subscribers");
        }
    }

    pub(super) fn subscribe(&self) -> broadcast::Receiver<CartEvent> {
        self.events.subscribe()
    }

    pub(super) fn state(&self) -> CartState {
        self.shared().state.clone()
    }

    pub(super) fn has_cart(&self) -> bool {
        self.shared().state.cart.is_some()
    }

    /// Build an optimistic cart from the displayed one and show it.
    ///
    /// Reading the base and publishing the result happen under the same lock.
    pub(super) fn show_optimistic<F>(&self, materialize: F) -> Result<Rollback, MaterializeError>
    where
        F: FnOnce(Option<&CartSnapshot>, &'static Currency) -> Result<CartSnapshot, MaterializeError>,
    {
        let mut shared = self.shared();

        let fallback = shared
            .known_currency
            .unwrap_or(self.config.default_currency);

        let optimistic = materialize(shared.state.cart.as_deref(), fallback)?;

        let rollback = Rollback {
            cart: shared.state.cart.clone(),
            authoritative: shared.authoritative,
            revision: shared.revision,
        };

        shared.known_currency = Some(optimistic.currency);
        shared.state.cart = Some(Arc::new(optimistic));
        shared.authoritative = false;

        self.emit(CartEvent::CartChanged);

        Ok(rollback)
    }

    /// Replace the displayed cart with a server cart.
    ///
    /// Signals a change unless the same server cart is already displayed.
    pub(super) fn show_authoritative(&self, cart: Option<CartSnapshot>) -> bool {
        let mut shared = self.shared();

        self.replace_authoritative(&mut shared, cart)
    }

    /// Replace the displayed cart only if its fingerprint differs from the last server cart.
    ///
    /// A missing fingerprint on either side counts as a change.
    pub(super) fn show_external(&self, cart: CartSnapshot) -> bool {
        let mut shared = self.shared();

        if shared.last_updated_at.is_some() && shared.last_updated_at == cart.updated_at {
            trace!(cart_id = %cart.id, "external cart unchanged");

            return false;
        }

        self.replace_authoritative(&mut shared, Some(cart))
    }

    fn replace_authoritative(&self, shared: &mut Shared, cart: Option<CartSnapshot>) -> bool {
        let updated_at = cart.as_ref().and_then(|cart| cart.updated_at);
        let same_fingerprint = match (shared.last_updated_at, updated_at) {
            (Some(last), Some(next)) => last == next,
            (None, None) => shared.state.cart.is_none() && cart.is_none(),
            _ => false,
        };
        let changed = !shared.authoritative || !same_fingerprint;

        if let Some(cart) = &cart {
            shared.known_currency = Some(cart.currency);
        }

        let cart = cart.map(Arc::new);

        shared.state.cart.clone_from(&cart);
        shared.confirmed = cart;
        shared.last_updated_at = updated_at;
        shared.authoritative = true;
        shared.revision += 1;

        if changed {
            self.emit(CartEvent::CartChanged);
        }

        changed
    }

    /// Put back the cart shown before an optimistic update.
    ///
    /// If a server cart was published or another update rolled back since the
    /// snapshot was taken, the last server cart is shown instead.
    pub(super) fn roll_back(&self, rollback: Rollback) {
        let mut shared = self.shared();

        if shared.revision == rollback.revision {
            shared.state.cart = rollback.cart;
            shared.authoritative = rollback.authoritative;
        } else {
            trace!("cart moved on since the optimistic update, restoring the server cart");
            shared.state.cart = shared.confirmed.clone();
            shared.authoritative = true;
        }

        shared.revision += 1;

        self.emit(CartEvent::CartChanged);
    }

    pub(super) fn set_error(&self, error: Option<String>) {
        let mut shared = self.shared();

        if shared.state.last_error != error {
            shared.state.last_error.clone_from(&error);
            self.emit(CartEvent::ErrorChanged(error));
        }
    }

    pub(super) fn notify(&self, notice: Notice) {
        if let Some(notifier) = &self.notifier {
            notifier.notify(notice);
        }
    }

    fn begin_sync(&self) {
        let mut shared = self.shared();

        shared.in_flight += 1;

        if !shared.state.is_syncing {
            shared.state.is_syncing = true;
            self.emit(CartEvent::SyncingChanged(true));
        }
    }

    fn end_sync(&self) {
        let mut shared = self.shared();

        shared.in_flight = shared.in_flight.saturating_sub(1);

        if shared.in_flight == 0 && shared.state.is_syncing {
            shared.state.is_syncing = false;
            self.emit(CartEvent::SyncingChanged(false));
        }
    }

    fn set_removing(&self, line_id: &str, removing: bool) {
        let mut shared = self.shared();

        let changed = if removing {
            shared.state.removing_line_ids.insert(line_id.to_string())
        } else {
            shared.state.removing_line_ids.remove(line_id)
        };

        if changed {
            self.emit(CartEvent::RemovingChanged {
                line_id: line_id.to_string(),
                removing,
            });
        }
    }
}

/// Keeps `is_syncing` raised until dropped.
#[derive(Debug)]
pub(super) struct SyncingGuard(Arc<Store>);

impl SyncingGuard {
    pub(super) fn begin(store: &Arc<Store>) -> Self {
        store.begin_sync();

        Self(Arc::clone(store))
    }
}

impl Drop for SyncingGuard {
    fn drop(&mut self) {
        self.0.end_sync();
    }
}

/// Keeps a line marked as removing until dropped.
#[derive(Debug)]
pub(super) struct RemovingGuard {
    store: Arc<Store>,
    line_id: String,
}

impl RemovingGuard {
    pub(super) fn begin(store: &Arc<Store>, line_id: &str) -> Self {
        store.set_removing(line_id, true);

        Self {
            store: Arc::clone(store),
            line_id: line_id.to_string(),
        }
    }
}

impl Drop for RemovingGuard {
    fn drop(&mut self) {
        self.store.set_removing(&self.line_id, false);
    }
}
