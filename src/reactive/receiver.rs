// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Async pull-based bridge from a publisher to a tokio task.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc;

use super::{Completion, Demand, Subscriber, Subscription};
use crate::error::Error;

type SharedSubscription = Arc<Mutex<Option<Arc<dyn Subscription>>>>;

enum Signal<O, F> {
    Value(O),
    Completion(Completion<F>),
}

/// Subscriber half of an [`EventReceiver`]. Forwards into a channel and never
/// asks for demand on its own.
pub struct ChannelSubscriber<O, F> {
    tx: mpsc::UnboundedSender<Signal<O, F>>,
    subscription: SharedSubscription,
}

impl<O, F> Subscriber for ChannelSubscriber<O, F>
where
    O: Send + 'static,
    F: Send + 'static,
{
    type Input = O;
    type Failure = F;

    fn receive_subscription(&self, subscription: Arc<dyn Subscription>) {
        *self.subscription.lock() = Some(subscription);
    }

    fn receive(&self, input: O) -> Demand {
        if self.tx.send(Signal::Value(input)).is_err() {
            tracing::trace!("Receiver dropped, discarding value");
        }
        Demand::NONE
    }

    fn receive_completion(&self, completion: Completion<F>) {
        self.subscription.lock().take();
        if self.tx.send(Signal::Completion(completion)).is_err() {
            tracing::trace!("Receiver dropped, discarding completion");
        }
    }
}

impl<O, F> fmt::Debug for ChannelSubscriber<O, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelSubscriber").finish_non_exhaustive()
    }
}

/// Receives values from a publisher one at a time.
///
/// Every call to [`next`](Self::next) requests exactly one value from the
/// subscription, so the publisher never runs ahead of the consumer. The
/// first call is also what starts a lazily started producer. Dropping the
/// receiver cancels the subscription.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use wac_accessory::platform::InMemoryPlatform;
/// use wac_accessory::reactive::PublisherExt;
/// use wac_accessory::{BrowserEvent, UnconfiguredAccessoryBrowser};
///
/// # async fn example() {
/// let platform = InMemoryPlatform::new();
/// let browser = UnconfiguredAccessoryBrowser::new(Arc::new(platform));
/// let mut events = browser.into_receiver();
///
/// while let Some(event) = events.next().await {
///     match event {
///         Ok(BrowserEvent::Found(found)) => println!("found {}", found.len()),
///         Ok(BrowserEvent::Removed(removed)) => println!("removed {}", removed.len()),
///         Err(error) => eprintln!("browsing failed: {error}"),
///     }
/// }
/// # }
/// ```
pub struct EventReceiver<O, F> {
    rx: mpsc::UnboundedReceiver<Signal<O, F>>,
    subscription: SharedSubscription,
    done: bool,
}

impl<O, F> EventReceiver<O, F>
where
    O: Send + 'static,
    F: Send + 'static,
{
    /// Creates a connected subscriber/receiver pair.
    #[must_use]
    pub fn channel() -> (ChannelSubscriber<O, F>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        let subscription: SharedSubscription = Arc::new(Mutex::new(None));
        (
            ChannelSubscriber {
                tx,
                subscription: Arc::clone(&subscription),
            },
            Self {
                rx,
                subscription,
                done: false,
            },
        )
    }

    /// Requests one value and waits for it.
    ///
    /// Returns `Some(Ok(value))` for a value, `Some(Err(failure))` once for a
    /// failed completion, and `None` after a normal completion, after a
    /// failure has been returned, or when the subscription went away.
    pub async fn next(&mut self) -> Option<Result<O, F>> {
        if self.done {
            return None;
        }
        self.request(Demand::max(1));

        match self.rx.recv().await {
            Some(Signal::Value(value)) => Some(Ok(value)),
            Some(Signal::Completion(Completion::Failure(error))) => {
                self.done = true;
                Some(Err(error))
            }
            Some(Signal::Completion(Completion::Finished)) | None => {
                self.done = true;
                None
            }
        }
    }

    /// Requests unlimited demand, discards values and waits for the
    /// publisher to complete.
    ///
    /// Publishers are not required to ever complete; this puts an upper
    /// bound on the wait. The subscription is cancelled when the receiver is
    /// dropped at the end of the call.
    ///
    /// # Errors
    ///
    /// - The publisher's failure, converted into [`Error`]
    /// - [`Error::Timeout`] if nothing completed within `timeout`
    /// - [`Error::Cancelled`] if the subscription went away without completing
    pub async fn wait_for_completion(mut self, timeout: Duration) -> crate::Result<()>
    where
        F: Into<Error>,
    {
        if self.done {
            return Err(Error::Cancelled);
        }
        self.request(Demand::Unlimited);

        let wait = async {
            loop {
                match self.rx.recv().await {
                    Some(Signal::Value(_)) => {}
                    Some(Signal::Completion(completion)) => {
                        return completion.into_result().map_err(Into::into);
                    }
                    None => return Err(Error::Cancelled),
                }
            }
        };

        let result = tokio::time::timeout(timeout, wait)
            .await
            .unwrap_or(Err(Error::Timeout(timeout)));
        self.done = true;
        result
    }

    /// Cancels the subscription. Later calls to [`next`](Self::next) return
    /// `None`.
    pub fn cancel(&mut self) {
        self.done = true;
        let subscription = self.subscription.lock().take();
        if let Some(subscription) = subscription {
            subscription.cancel();
        }
    }

    fn request(&self, demand: Demand) {
        let subscription = self.subscription.lock().clone();
        if let Some(subscription) = subscription {
            subscription.request(demand);
        }
    }
}

impl<O, F> Drop for EventReceiver<O, F> {
    fn drop(&mut self) {
        let subscription = self.subscription.lock().take();
        if let Some(subscription) = subscription {
            subscription.cancel();
        }
    }
}

impl<O, F> fmt::Debug for EventReceiver<O, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventReceiver")
            .field("done", &self.done)
            .finish_non_exhaustive()
    }
}
