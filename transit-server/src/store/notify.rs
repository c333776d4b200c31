//! Change notification.
//!
//! Subscribers receive an ordered list of [`FeedItem`]s whenever the store
//! wants to show something new: the route list after an import, or the
//! results of a search. Delivery is synchronous, in subscription order.

use std::fmt;

use tracing::{debug, warn};

use crate::feed::{Route, Stop, StopTime, Trip};

/// One entry of a notification payload.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedItem {
    /// A heading introducing the records after it.
    Section(String),
    Route(Route),
    Stop(Stop),
    Trip(Trip),
    StopTime(StopTime),
}

impl FeedItem {
    pub fn section(label: impl Into<String>) -> Self {
        FeedItem::Section(label.into())
    }
}

impl fmt::Display for FeedItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedItem::Section(label) => f.write_str(label),
            FeedItem::Route(route) => write!(f, "Route {}", route.id),
            FeedItem::Stop(stop) => write!(f, "Stop {}", stop.id),
            FeedItem::Trip(trip) => write!(f, "Trip {}", trip.id),
            FeedItem::StopTime(st) => write!(f, "StopTime {} @ {}", st.trip_id, st.stop_id),
        }
    }
}

/// Error a subscriber may report from a delivery.
pub type SubscriberError = Box<dyn std::error::Error + Send + Sync>;

/// Receives data-changed notifications from the store.
pub trait Subscriber: Send {
    fn on_change(&mut self, items: &[FeedItem]) -> Result<(), SubscriberError>;
}

impl<F> Subscriber for F
where
    F: FnMut(&[FeedItem]) -> Result<(), SubscriberError> + Send,
{
    fn on_change(&mut self, items: &[FeedItem]) -> Result<(), SubscriberError> {
        self(items)
    }
}

/// Handle returned by subscribing, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

/// The registered subscribers, in subscription order.
#[derive(Default)]
pub struct Subscribers {
    next_id: u64,
    entries: Vec<(SubscriberId, Box<dyn Subscriber>)>,
}

impl Subscribers {
    /// Register a subscriber and deliver `priming` to it alone.
    pub fn add(&mut self, mut subscriber: Box<dyn Subscriber>, priming: &[FeedItem]) -> SubscriberId {
        let id = SubscriberId(self.next_id);
        self.next_id += 1;
        if let Err(e) = subscriber.on_change(priming) {
            warn!(subscriber = id.0, error = %e, "subscriber failed on priming event");
        }
        self.entries.push((id, subscriber));
        debug!(subscriber = id.0, total = self.entries.len(), "subscriber added");
        id
    }

    /// Remove a subscriber. Returns false if it was not registered.
    pub fn remove(&mut self, id: SubscriberId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(sid, _)| *sid != id);
        self.entries.len() != before
    }

    /// Deliver `items` to every subscriber.
    ///
    /// A subscriber that fails is logged and skipped; the rest still
    /// receive the payload. Returns the number of failed deliveries.
    pub fn notify(&mut self, items: &[FeedItem]) -> usize {
        let mut failures = 0;
        for (id, subscriber) in &mut self.entries {
            if let Err(e) = subscriber.on_change(items) {
                warn!(subscriber = id.0, error = %e, "subscriber failed");
                failures += 1;
            }
        }
        failures
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for Subscribers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscribers")
            .field("count", &self.entries.len())
            .finish()
    }
}
