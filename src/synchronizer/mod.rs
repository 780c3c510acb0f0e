//! Cart Synchronizer
//!
//! Owns the cart the user sees and keeps it consistent with the cart service.
//! Mutations show their result immediately, then run against the service
//! through a per-kind [`MutationQueue`]; the confirmed server cart replaces
//! the optimistic one on success, and a failed add rolls back.

use std::{
    fmt::{Debug, Display, Formatter, Result as FmtResult},
    sync::{Arc, Mutex, PoisonError},
};

use tokio::sync::broadcast;
use tracing::{debug, info, instrument, warn};

use crate::{
    cart::CartSnapshot,
    catalog::{Product, Variant},
    config::SyncConfig,
    errors::SyncError,
    gateway::{AddLineItem, CartGateway, GatewayError},
    idempotency::IdempotencyKey,
    materializer::materialize_add,
    metadata::Metadata,
    queue::{MutationHandle, MutationKind, MutationQueue},
};

pub mod notifier;
pub mod state;
mod store;

pub use notifier::{CartNotifier, MockCartNotifier, Notice, TracingNotifier};
pub use state::{CartEvent, CartState};

use store::{RemovingGuard, Rollback, Store, SyncingGuard};

const ADD_FAILED: &str = "Failed to add item to cart";
const REMOVE_FAILED: &str = "Failed to remove item from cart";
const LOAD_FAILED: &str = "Failed to load cart";

const ITEM_ADDED: &str = "Item added to cart";
const ITEM_REMOVED: &str = "Item removed from cart";

/// An add-to-cart action.
#[derive(Debug, Clone, PartialEq)]
pub struct AddToCart {
    /// Product the variant belongs to
    pub product: Product,

    /// Variant to add
    pub variant: Variant,

    /// Units to add
    pub quantity: u32,

    /// Pricing country; the configured default when absent.
    pub country_code: Option<String>,

    /// Line metadata
    pub metadata: Metadata,
}

impl AddToCart {
    /// Add `quantity` units of `variant` with no metadata.
    pub fn new(product: Product, variant: Variant, quantity: u32) -> Self {
        Self {
            product,
            variant,
            quantity,
            country_code: None,
            metadata: Metadata::new(),
        }
    }

    /// Price the line for the given country.
    #[must_use]
    pub fn with_country_code(mut self, country_code: impl Into<String>) -> Self {
        self.country_code = Some(country_code.into());
        self
    }

    /// Attach line metadata.
    #[must_use]
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }
}

/// How a removal settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    /// The line is gone and the server cart is displayed.
    Removed,

    /// The service call failed; the line is still displayed and `last_error` is set.
    Failed,

    /// There was no cart to remove from.
    NoCart,
}

/// Builds a [`CartSynchronizer`].
pub struct SynchronizerBuilder {
    gateway: Arc<dyn CartGateway>,
    config: SyncConfig,
    initial_cart: Option<CartSnapshot>,
    notifier: Option<Arc<dyn CartNotifier>>,
}

impl Debug for SynchronizerBuilder {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("SynchronizerBuilder")
            .field("config", &self.config)
            .field("initial_cart", &self.initial_cart)
            .finish_non_exhaustive()
    }
}

impl SynchronizerBuilder {
    /// Use the given defaults.
    #[must_use]
    pub fn config(mut self, config: SyncConfig) -> Self {
        self.config = config;
        self
    }

    /// Start from a cart already loaded from the server.
    #[must_use]
    pub fn initial_cart(mut self, cart: CartSnapshot) -> Self {
        self.initial_cart = Some(cart);
        self
    }

    /// Deliver success and error notices to `notifier`.
    #[must_use]
    pub fn notifier(mut self, notifier: Arc<dyn CartNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Create the synchronizer and start its queues.
    ///
    /// Must be called from within a tokio runtime.
    pub fn build(self) -> CartSynchronizer {
        let store = Arc::new(Store::new(self.gateway, self.config, self.notifier));

        if let Some(cart) = self.initial_cart {
            store.show_authoritative(Some(cart));
        }

        CartSynchronizer {
            store,
            add_order: Mutex::new(()),
            add_queue: MutationQueue::new(MutationKind::Add),
            remove_queue: MutationQueue::new(MutationKind::Remove),
        }
    }
}

/// Keeps a locally displayed cart in step with the cart service.
#[derive(Debug)]
pub struct CartSynchronizer {
    store: Arc<Store>,

    /// Held from publishing an optimistic cart until its step is queued.
    add_order: Mutex<()>,

    add_queue: MutationQueue,
    remove_queue: MutationQueue,
}

impl CartSynchronizer {
    /// Start building a synchronizer over `gateway`.
    pub fn builder(gateway: Arc<dyn CartGateway>) -> SynchronizerBuilder {
        SynchronizerBuilder {
            gateway,
            config: SyncConfig::default(),
            initial_cart: None,
            notifier: None,
        }
    }

    /// Snapshot of everything a cart view renders from.
    pub fn state(&self) -> CartState {
        self.store.state()
    }

    /// Cart currently displayed.
    pub fn cart(&self) -> Option<Arc<CartSnapshot>> {
        self.state().cart
    }

    /// Whether an add or reload is in flight.
    pub fn is_syncing(&self) -> bool {
        self.state().is_syncing
    }

    /// Text of the most recent failure.
    pub fn last_error(&self) -> Option<String> {
        self.state().last_error
    }

    /// Whether a removal of `line_id` is in flight.
    pub fn is_removing(&self, line_id: &str) -> bool {
        self.state().is_removing(line_id)
    }

    /// Receive a signal whenever the state changes.
    pub fn subscribe(&self) -> broadcast::Receiver<CartEvent> {
        self.store.subscribe()
    }

    /// Clear the last error once the user has seen it.
    pub fn dismiss_error(&self) {
        self.store.set_error(None);
    }

    /// Add a line, showing the result before the cart service answers.
    ///
    /// The optimistic cart is visible to every reader by the time this method
    /// returns, and the service call is queued behind earlier adds. Concurrent
    /// callers stack their optimistic lines in the same order their calls
    /// reach the service. The handle resolves once this add has been
    /// confirmed or rolled back.
    pub fn optimistic_add(&self, request: AddToCart) -> MutationHandle<()> {
        let _order = self.add_order.lock().unwrap_or_else(PoisonError::into_inner);

        self.store.set_error(None);

        let AddToCart {
            product,
            variant,
            quantity,
            country_code,
            metadata,
        } = request;

        let rollback = self.store.show_optimistic(|base, fallback_currency| {
            materialize_add(
                base,
                &product,
                &variant,
                quantity,
                &metadata,
                fallback_currency,
            )
        });

        let rollback = match rollback {
            Ok(rollback) => rollback,
            Err(error) => {
                warn!("could not build optimistic cart: {error}");
                self.store.set_error(Some(error.to_string()));

                return MutationHandle::ready(Err(error.into()));
            }
        };

        let pending = PendingAdd {
            variant_id: variant.id,
            quantity,
            country_code: country_code
                .unwrap_or_else(|| self.store.config.default_country_code.clone()),
            metadata,
            rollback,
        };

        let syncing = SyncingGuard::begin(&self.store);

        self.add_queue
            .enqueue(add_line(Arc::clone(&self.store), pending, syncing))
    }

    /// Remove a line once the cart service confirms it.
    ///
    /// The line stays displayed, flagged by [`Self::is_removing`], until the
    /// server cart without it arrives. A failed removal leaves it in place.
    pub fn optimistic_remove(&self, line_id: impl Into<String>) -> MutationHandle<RemoveOutcome> {
        let line_id = line_id.into();

        if !self.store.has_cart() {
            self.store.set_error(Some(SyncError::NoCart.to_string()));

            return MutationHandle::ready(Ok(RemoveOutcome::NoCart));
        }

        let removing = RemovingGuard::begin(&self.store, &line_id);

        self.remove_queue
            .enqueue(remove_line(Arc::clone(&self.store), line_id, removing))
    }

    /// Fetch the server cart and display it.
    ///
    /// On failure the displayed cart is kept and `last_error` is set.
    #[instrument(skip_all)]
    pub async fn reload_from_server(&self) {
        let _syncing = SyncingGuard::begin(&self.store);

        match self.store.gateway.fetch_cart().await {
            Ok(cart) => {
                debug!(found = cart.is_some(), "cart reloaded");
                self.store.show_authoritative(cart);
            }
            Err(error) => {
                warn!("failed to load cart: {error}");
                let message = failure_message(&error, LOAD_FAILED);

                self.store.set_error(Some(message.clone()));
                self.store.notify(Notice::Error(message));
            }
        }
    }

    /// Replace the displayed cart with one the server just produced.
    pub fn set_from_server(&self, cart: Option<CartSnapshot>) {
        self.store.show_authoritative(cart);
    }

    /// Offer a cart from an outside source such as a page payload.
    ///
    /// Only replaces the displayed cart when its `updated_at` differs from the
    /// last server cart, so a repeated payload never clobbers an in-flight
    /// optimistic update. Returns whether the cart was replaced.
    pub fn sync_external(&self, cart: CartSnapshot) -> bool {
        self.store.show_external(cart)
    }

    /// Stop accepting mutations and wait for queued ones to settle.
    pub async fn shutdown(self) {
        let Self {
            add_queue,
            remove_queue,
            ..
        } = self;

        tokio::join!(add_queue.shutdown(), remove_queue.shutdown());
    }
}

struct PendingAdd {
    variant_id: String,
    quantity: u32,
    country_code: String,
    metadata: Metadata,
    rollback: Rollback,
}

#[instrument(skip_all, fields(variant_id = %pending.variant_id, quantity = pending.quantity))]
async fn add_line(
    store: Arc<Store>,
    pending: PendingAdd,
    _syncing: SyncingGuard,
) -> Result<(), SyncError> {
    let PendingAdd {
        variant_id,
        quantity,
        country_code,
        metadata,
        rollback,
    } = pending;

    let request = AddLineItem {
        variant_id,
        quantity,
        country_code,
        metadata,
        idempotency_key: IdempotencyKey::generate(),
    };

    debug!(idempotency_key = %request.idempotency_key, "adding line item");

    match store.gateway.add_line_item(request).await {
        Ok(canonical) => {
            if let Some(cart) = canonical {
                store.show_authoritative(Some(cart));
            }

            refresh_after_add(&store).await;

            info!("line item added");
            store.notify(Notice::Success(ITEM_ADDED.to_string()));

            Ok(())
        }
        Err(error) => {
            warn!("failed to add line item: {error}");
            let message = failure_message(&error, ADD_FAILED);

            store.set_error(Some(message.clone()));
            store.roll_back(rollback);
            store.notify(Notice::Error(message));

            Err(error.into())
        }
    }
}

/// The add response may not be fully priced, so read the cart back.
async fn refresh_after_add(store: &Store) {
    match store.gateway.fetch_cart().await {
        Ok(Some(cart)) => {
            store.show_authoritative(Some(cart));
        }
        Ok(None) => warn!("cart missing right after add, keeping add response"),
        Err(error) => warn!("failed to refresh cart after add: {error}"),
    }
}

#[instrument(skip_all, fields(line_id = %line_id))]
async fn remove_line(
    store: Arc<Store>,
    line_id: String,
    _removing: RemovingGuard,
) -> Result<RemoveOutcome, SyncError> {
    match remove_and_fetch(store.gateway.as_ref(), line_id).await {
        Ok(cart) => {
            store.show_authoritative(cart);

            info!("line item removed");
            store.notify(Notice::Success(ITEM_REMOVED.to_string()));

            Ok(RemoveOutcome::Removed)
        }
        Err(error) => {
            warn!("failed to remove line item: {error}");
            let message = failure_message(&error, REMOVE_FAILED);

            store.set_error(Some(message.clone()));
            store.notify(Notice::Error(message));

            Ok(RemoveOutcome::Failed)
        }
    }
}

async fn remove_and_fetch(
    gateway: &dyn CartGateway,
    line_id: String,
) -> Result<Option<CartSnapshot>, GatewayError> {
    gateway.remove_line_item(line_id).await?;

    gateway.fetch_cart().await
}

fn failure_message(error: &impl Display, fallback: &str) -> String {
    let message = error.to_string();

    if message.trim().is_empty() {
        fallback.to_string()
    } else {
        message
    }
}
