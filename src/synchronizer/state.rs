//! Subscriber-visible cart state.

use std::{collections::BTreeSet, sync::Arc};

use crate::cart::CartSnapshot;

/// Everything a cart view renders from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CartState {
    /// Cart currently displayed; optimistic while a mutation is in flight.
    pub cart: Option<Arc<CartSnapshot>>,

    /// Whether an add or reload is talking to the cart service.
    pub is_syncing: bool,

    /// Text of the most recent failure.
    pub last_error: Option<String>,

    /// Lines with a removal in flight.
    pub removing_line_ids: BTreeSet<String>,
}

impl CartState {
    /// Whether a removal of `line_id` is in flight.
    pub fn is_removing(&self, line_id: &str) -> bool {
        self.removing_line_ids.contains(line_id)
    }
}

/// Change signal; subscribers re-read [`CartState`] when they receive one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartEvent {
    /// The displayed cart was replaced.
    CartChanged,

    /// The syncing flag flipped.
    SyncingChanged(bool),

    /// The last error was set or cleared.
    ErrorChanged(Option<String>),

    /// A line's removal started or settled.
    RemovingChanged {
        /// Line being removed
        line_id: String,

        /// Whether the removal is now in flight
        removing: bool,
    },
}
