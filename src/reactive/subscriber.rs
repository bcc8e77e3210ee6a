// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Subscriber and subscription contracts.

use std::fmt;
use std::sync::Arc;

use super::{Completion, Demand};

/// A handle a subscriber uses to control the flow of values.
///
/// Both methods may be called from any thread, any number of times.
pub trait Subscription: Send + Sync {
    /// Tells the publisher it may send up to `demand` more values.
    fn request(&self, demand: Demand);

    /// Stops the flow of values and releases the resources of the
    /// subscription. Calling this more than once has no further effect on
    /// delivery.
    fn cancel(&self);
}

/// A consumer of values published by a [`Publisher`](super::Publisher).
///
/// Subscribers use interior mutability: every method takes `&self` because
/// a subscriber is shared between the subscription that feeds it and the
/// thread that requests demand.
pub trait Subscriber: Send + Sync + 'static {
    /// The type of values received.
    type Input: Send + 'static;
    /// The failure type carried by an unsuccessful completion.
    type Failure: Send + 'static;

    /// Called once, when the subscriber is attached to a publisher.
    ///
    /// Nothing is produced until the subscriber requests demand on the
    /// given subscription.
    fn receive_subscription(&self, subscription: Arc<dyn Subscription>);

    /// Receives a value and returns any additional demand.
    fn receive(&self, input: Self::Input) -> Demand;

    /// Receives the terminal signal. Called at most once.
    fn receive_completion(&self, completion: Completion<Self::Failure>);
}

/// A type-erased [`Subscriber`].
pub struct AnySubscriber<I, F> {
    inner: Arc<dyn Subscriber<Input = I, Failure = F>>,
}

impl<I, F> AnySubscriber<I, F>
where
    I: Send + 'static,
    F: Send + 'static,
{
    /// Wraps a concrete subscriber.
    pub fn new<S>(subscriber: S) -> Self
    where
        S: Subscriber<Input = I, Failure = F>,
    {
        Self {
            inner: Arc::new(subscriber),
        }
    }
}

impl<I, F> Clone for AnySubscriber<I, F> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<I, F> fmt::Debug for AnySubscriber<I, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnySubscriber").finish_non_exhaustive()
    }
}

impl<I, F> Subscriber for AnySubscriber<I, F>
where
    I: Send + 'static,
    F: Send + 'static,
{
    type Input = I;
    type Failure = F;

    fn receive_subscription(&self, subscription: Arc<dyn Subscription>) {
        self.inner.receive_subscription(subscription);
    }

    fn receive(&self, input: I) -> Demand {
        self.inner.receive(input)
    }

    fn receive_completion(&self, completion: Completion<F>) {
        self.inner.receive_completion(completion);
    }
}
