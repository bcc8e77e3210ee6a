// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Publisher contract and its type-erased form.

use std::fmt;
use std::sync::Arc;

use super::{AnyCancellable, AnySubscriber, Completion, EventReceiver, Sink, Subscriber};

/// A source of values that subscribers attach to.
///
/// Attaching a subscriber must not start any work: the publisher hands the
/// subscriber a [`Subscription`](super::Subscription) and waits for demand.
pub trait Publisher {
    /// The type of values published.
    type Output: Send + 'static;
    /// The failure type of an unsuccessful completion.
    type Failure: Send + 'static;

    /// Attaches `subscriber` to this publisher.
    fn subscribe<S>(&self, subscriber: S)
    where
        S: Subscriber<Input = Self::Output, Failure = Self::Failure>;
}

/// Convenience consumers available on every [`Publisher`].
pub trait PublisherExt: Publisher {
    /// Erases the concrete publisher type.
    fn boxed(self) -> AnyPublisher<Self::Output, Self::Failure>
    where
        Self: Sized + Send + Sync + 'static,
    {
        AnyPublisher::new(self)
    }

    /// Subscribes with closures and unlimited demand.
    ///
    /// The returned handle cancels the subscription when dropped.
    fn sink<V, C>(&self, receive_value: V, receive_completion: C) -> AnyCancellable
    where
        V: Fn(Self::Output) + Send + Sync + 'static,
        C: FnOnce(Completion<Self::Failure>) + Send + 'static,
    {
        let (sink, cancellable) = Sink::new(receive_value, receive_completion);
        self.subscribe(sink);
        cancellable
    }

    /// Subscribes with a pull-based async receiver.
    ///
    /// Each call to [`EventReceiver::next`] requests exactly one value.
    fn into_receiver(&self) -> EventReceiver<Self::Output, Self::Failure> {
        let (subscriber, receiver) = EventReceiver::channel();
        self.subscribe(subscriber);
        receiver
    }
}

impl<P: Publisher> PublisherExt for P {}

type OnSubscribe<O, F> = dyn Fn(AnySubscriber<O, F>) + Send + Sync;

/// A publisher that hides the type of the publisher it wraps.
///
/// It stores nothing but a closure describing how to attach a subscriber, so
/// call sites can depend on one nominal type whichever producer is behind it.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use wac_accessory::platform::InMemoryPlatform;
/// use wac_accessory::{BrowserPublisher, UnconfiguredAccessoryBrowser};
///
/// let platform = InMemoryPlatform::new();
/// let browser = UnconfiguredAccessoryBrowser::new(Arc::new(platform));
/// let publisher: BrowserPublisher = browser.into();
/// # let _ = publisher;
/// ```
pub struct AnyPublisher<O, F> {
    on_subscribe: Arc<OnSubscribe<O, F>>,
}

impl<O, F> AnyPublisher<O, F>
where
    O: Send + 'static,
    F: Send + 'static,
{
    /// Wraps `publisher`.
    pub fn new<P>(publisher: P) -> Self
    where
        P: Publisher<Output = O, Failure = F> + Send + Sync + 'static,
    {
        Self {
            on_subscribe: Arc::new(move |subscriber| publisher.subscribe(subscriber)),
        }
    }

    /// Builds a publisher from a subscribe closure.
    pub fn from_fn<G>(on_subscribe: G) -> Self
    where
        G: Fn(AnySubscriber<O, F>) + Send + Sync + 'static,
    {
        Self {
            on_subscribe: Arc::new(on_subscribe),
        }
    }
}

impl<O, F> Publisher for AnyPublisher<O, F>
where
    O: Send + 'static,
    F: Send + 'static,
{
    type Output = O;
    type Failure = F;

    fn subscribe<S>(&self, subscriber: S)
    where
        S: Subscriber<Input = O, Failure = F>,
    {
        (self.on_subscribe)(AnySubscriber::new(subscriber));
    }
}

impl<O, F> Clone for AnyPublisher<O, F> {
    fn clone(&self) -> Self {
        Self {
            on_subscribe: Arc::clone(&self.on_subscribe),
        }
    }
}

impl<O, F> fmt::Debug for AnyPublisher<O, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnyPublisher").finish_non_exhaustive()
    }
}
