// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Discovery stream of unconfigured accessories.
//!
//! [`UnconfiguredAccessoryBrowser`] is a [`Publisher`] of [`BrowserEvent`]s.
//! Subscribing does nothing by itself; the platform search starts with the
//! first positive demand and stops when the subscription is cancelled.
//!
//! # Termination
//!
//! | Browser state | Stream |
//! |---------------|--------|
//! | `WifiUnavailable` | fails with [`BrowserError::WifiUnavailable`] |
//! | `Stopped` | finishes |
//! | `Configuring` | finishes |
//! | `Searching`, unknown | ignored |
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use wac_accessory::platform::InMemoryPlatform;
//! use wac_accessory::reactive::PublisherExt;
//! use wac_accessory::{BrowserEvent, UnconfiguredAccessory, UnconfiguredAccessoryBrowser};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let platform = InMemoryPlatform::new();
//! platform.advertise([UnconfiguredAccessory::new("Speaker", "00:11:22:33:44:55".parse()?)]);
//!
//! let browser = UnconfiguredAccessoryBrowser::new(Arc::new(platform.clone()));
//! let mut events = browser.into_receiver();
//!
//! match events.next().await {
//!     Some(Ok(BrowserEvent::Found(found))) => assert_eq!(found[0].name(), "Speaker"),
//!     other => panic!("unexpected {other:?}"),
//! }
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::accessory::UnconfiguredAccessory;
use crate::error::BrowserError;
use crate::platform::{
    AccessoryBrowser, AccessoryPlatform, AccessoryPredicate, BrowserDelegate, BrowserState,
};
use crate::reactive::{
    AnyPublisher, BufferHandle, Completion, Publisher, SimpleSubscription, Subscriber,
    SubscriptionHooks,
};

/// Event published by the discovery stream.
///
/// Each carries the whole batch the platform reported in one callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "accessories", rename_all = "snake_case")]
pub enum BrowserEvent {
    /// Accessories appeared.
    Found(Vec<UnconfiguredAccessory>),
    /// Accessories disappeared.
    Removed(Vec<UnconfiguredAccessory>),
}

impl BrowserEvent {
    /// Returns the accessories carried by the event.
    #[must_use]
    pub fn accessories(&self) -> &[UnconfiguredAccessory] {
        match self {
            Self::Found(accessories) | Self::Removed(accessories) => accessories,
        }
    }
}

/// Options for a discovery stream.
///
/// # Examples
///
/// ```
/// use wac_accessory::browser::DiscoveryOptions;
///
/// let options = DiscoveryOptions::new()
///     .with_predicate(|acc| acc.properties().supports_airplay)
///     .with_queue_capacity(16);
/// ```
#[derive(Debug, Clone, Default)]
pub struct DiscoveryOptions {
    /// Platform-side filter applied while searching.
    predicate: Option<AccessoryPredicate>,
    /// Number of events each subscription buffer pre-allocates.
    queue_capacity: usize,
}

impl DiscoveryOptions {
    /// Creates options with no filter and no pre-allocation.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Limits the search to accessories matching `predicate`.
    #[must_use]
    pub fn with_predicate<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&UnconfiguredAccessory) -> bool + Send + Sync + 'static,
    {
        self.predicate = Some(AccessoryPredicate::new(predicate));
        self
    }

    /// Pre-allocates room for `capacity` undelivered events per subscription.
    #[must_use]
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Returns the search filter.
    #[must_use]
    pub fn predicate(&self) -> Option<&AccessoryPredicate> {
        self.predicate.as_ref()
    }

    /// Returns the buffer pre-allocation hint.
    #[must_use]
    pub fn queue_capacity(&self) -> usize {
        self.queue_capacity
    }
}

/// Publisher of unconfigured accessories found by the platform.
///
/// Every subscription gets its own platform browser and search.
#[derive(Clone)]
pub struct UnconfiguredAccessoryBrowser {
    platform: Arc<dyn AccessoryPlatform>,
    options: DiscoveryOptions,
}

impl UnconfiguredAccessoryBrowser {
    /// Creates an unfiltered discovery stream.
    #[must_use]
    pub fn new(platform: Arc<dyn AccessoryPlatform>) -> Self {
        Self::with_options(platform, DiscoveryOptions::default())
    }

    /// Creates a discovery stream with explicit options.
    #[must_use]
    pub fn with_options(platform: Arc<dyn AccessoryPlatform>, options: DiscoveryOptions) -> Self {
        Self { platform, options }
    }

    /// Limits the search to accessories matching `predicate`.
    #[must_use]
    pub fn with_predicate<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&UnconfiguredAccessory) -> bool + Send + Sync + 'static,
    {
        self.options = self.options.with_predicate(predicate);
        self
    }

    /// Returns the options.
    #[must_use]
    pub fn options(&self) -> &DiscoveryOptions {
        &self.options
    }
}

impl std::fmt::Debug for UnconfiguredAccessoryBrowser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnconfiguredAccessoryBrowser")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Publisher for UnconfiguredAccessoryBrowser {
    type Output = BrowserEvent;
    type Failure = BrowserError;

    fn subscribe<S>(&self, subscriber: S)
    where
        S: Subscriber<Input = BrowserEvent, Failure = BrowserError>,
    {
        let subscriber = Arc::new(subscriber);
        let browser = self.platform.make_browser();
        let predicate = self.options.predicate.clone();

        let subscription = SimpleSubscription::with_capacity(
            Arc::clone(&subscriber),
            self.options.queue_capacity,
            |handle| DiscoveryHooks::new(browser, predicate, handle),
        );
        subscriber.receive_subscription(subscription);
    }
}

/// Type-erased discovery stream.
pub type BrowserPublisher = AnyPublisher<BrowserEvent, BrowserError>;

impl From<UnconfiguredAccessoryBrowser> for BrowserPublisher {
    fn from(browser: UnconfiguredAccessoryBrowser) -> Self {
        AnyPublisher::new(browser)
    }
}

/// Starts and stops one platform search.
struct DiscoveryHooks {
    browser: Arc<dyn AccessoryBrowser>,
    delegate: Arc<BrowserDelegate>,
    predicate: Option<AccessoryPredicate>,
}

impl DiscoveryHooks {
    fn new<S>(
        browser: Arc<dyn AccessoryBrowser>,
        predicate: Option<AccessoryPredicate>,
        handle: BufferHandle<S>,
    ) -> Self
    where
        S: Subscriber<Input = BrowserEvent, Failure = BrowserError>,
    {
        let on_state = handle.clone();
        let on_found = handle.clone();
        let on_removed = handle;

        let delegate = BrowserDelegate::new()
            .on_update_state(move |state| match state {
                BrowserState::WifiUnavailable => {
                    on_state.complete(Completion::Failure(BrowserError::WifiUnavailable));
                }
                BrowserState::Stopped | BrowserState::Configuring => {
                    on_state.complete(Completion::Finished);
                }
                BrowserState::Searching | BrowserState::Unknown(_) => {
                    tracing::trace!(?state, "Ignoring browser state");
                }
            })
            .on_find_accessories(move |batch| {
                on_found.buffer(BrowserEvent::Found(batch.to_vec()));
            })
            .on_remove_accessories(move |batch| {
                on_removed.buffer(BrowserEvent::Removed(batch.to_vec()));
            });

        Self {
            browser,
            delegate: Arc::new(delegate),
            predicate,
        }
    }
}

impl SubscriptionHooks for DiscoveryHooks {
    fn start(&self) {
        tracing::debug!(filtered = self.predicate.is_some(), "Starting accessory search");
        self.browser.set_delegate(&self.delegate);
        self.browser.start_searching(self.predicate.clone());
    }

    fn stop(&self) {
        tracing::debug!("Stopping accessory search");
        self.browser.stop_searching();
    }
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;

    use super::*;
    use crate::accessory::MacAddress;
    use crate::platform::InMemoryPlatform;
    use crate::reactive::PublisherExt;

    fn accessory(last: u8) -> UnconfiguredAccessory {
        UnconfiguredAccessory::new(format!("acc-{last}"), MacAddress::new([4, 0, 0, 0, 0, last]))
    }

    #[test]
    fn subscribing_does_not_search() {
        let platform = InMemoryPlatform::new();
        let browser = UnconfiguredAccessoryBrowser::new(Arc::new(platform.clone()));

        let receiver = browser.into_receiver();

        assert_eq!(platform.search_starts(), 0);
        drop(receiver);
        assert_eq!(platform.search_starts(), 0);
    }

    #[test]
    fn sink_sees_batches_and_completion() {
        let platform = InMemoryPlatform::new();
        let browser = UnconfiguredAccessoryBrowser::new(Arc::new(platform.clone()));
        let events = Arc::new(Mutex::new(Vec::new()));
        let completion = Arc::new(Mutex::new(None));

        let _cancellable = browser.sink(
            {
                let events = Arc::clone(&events);
                move |event| events.lock().push(event)
            },
            {
                let completion = Arc::clone(&completion);
                move |c| *completion.lock() = Some(c)
            },
        );
        platform.advertise([accessory(1), accessory(2)]);
        platform.withdraw(&[accessory(1)]);
        platform.broadcast_state(BrowserState::Stopped);
        platform.advertise([accessory(3)]);

        assert_eq!(
            *events.lock(),
            vec![
                BrowserEvent::Found(vec![accessory(1), accessory(2)]),
                BrowserEvent::Removed(vec![accessory(1)]),
            ]
        );
        assert_eq!(*completion.lock(), Some(Completion::Finished));
    }

    #[test]
    fn event_serializes_with_kind_tag() {
        let event = BrowserEvent::Removed(vec![accessory(7)]);
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["kind"], "removed");
        assert_eq!(json["accessories"][0]["mac_address"], "04:00:00:00:00:07");
        assert_eq!(event.accessories().len(), 1);
    }
}
