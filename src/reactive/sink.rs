// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Closure-based subscriber and cancellation handle.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use super::{Completion, Demand, Subscriber, Subscription};

/// Subscription shared between a subscriber and its cancellation handle.
type SharedSubscription = Arc<Mutex<Option<Arc<dyn Subscription>>>>;

type ValueCallback<O> = Box<dyn Fn(O) + Send + Sync>;
type CompletionCallback<F> = Box<dyn FnOnce(Completion<F>) + Send>;

/// A subscriber that requests unlimited demand and forwards everything to
/// closures.
///
/// Usually created through
/// [`PublisherExt::sink`](super::PublisherExt::sink).
pub struct Sink<O, F> {
    receive_value: ValueCallback<O>,
    receive_completion: Mutex<Option<CompletionCallback<F>>>,
    subscription: SharedSubscription,
}

impl<O, F> Sink<O, F> {
    /// Creates a sink and the handle that cancels it.
    pub fn new<V, C>(receive_value: V, receive_completion: C) -> (Self, AnyCancellable)
    where
        V: Fn(O) + Send + Sync + 'static,
        C: FnOnce(Completion<F>) + Send + 'static,
    {
        let subscription: SharedSubscription = Arc::new(Mutex::new(None));
        let cancellable = AnyCancellable::from_shared(Arc::clone(&subscription));
        let sink = Self {
            receive_value: Box::new(receive_value),
            receive_completion: Mutex::new(Some(Box::new(receive_completion))),
            subscription,
        };
        (sink, cancellable)
    }
}

impl<O, F> Subscriber for Sink<O, F>
where
    O: Send + 'static,
    F: Send + 'static,
{
    type Input = O;
    type Failure = F;

    fn receive_subscription(&self, subscription: Arc<dyn Subscription>) {
        *self.subscription.lock() = Some(Arc::clone(&subscription));
        subscription.request(Demand::Unlimited);
    }

    fn receive(&self, input: O) -> Demand {
        (self.receive_value)(input);
        Demand::NONE
    }

    fn receive_completion(&self, completion: Completion<F>) {
        self.subscription.lock().take();
        let callback = self.receive_completion.lock().take();
        if let Some(callback) = callback {
            callback(completion);
        }
    }
}

impl<O, F> fmt::Debug for Sink<O, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sink")
            .field("subscribed", &self.subscription.lock().is_some())
            .finish_non_exhaustive()
    }
}

/// Cancels a subscription when cancelled explicitly or dropped.
#[must_use = "dropping the handle cancels the subscription"]
pub struct AnyCancellable {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl AnyCancellable {
    /// Creates a handle running `cancel` once.
    pub fn new<C>(cancel: C) -> Self
    where
        C: FnOnce() + Send + 'static,
    {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Creates a handle cancelling `subscription`.
    pub fn from_subscription(subscription: Arc<dyn Subscription>) -> Self {
        Self::new(move || subscription.cancel())
    }

    fn from_shared(subscription: SharedSubscription) -> Self {
        Self::new(move || {
            let current = subscription.lock().take();
            if let Some(current) = current {
                current.cancel();
            }
        })
    }

    /// Cancels now instead of on drop.
    pub fn cancel(mut self) {
        self.run();
    }

    /// Keeps the subscription alive for as long as its publisher runs.
    pub fn detach(mut self) {
        self.cancel = None;
    }

    fn run(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for AnyCancellable {
    fn drop(&mut self) {
        self.run();
    }
}

impl fmt::Debug for AnyCancellable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnyCancellable")
            .field("armed", &self.cancel.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    #[derive(Default)]
    struct CountingSubscription {
        requests: Mutex<Vec<Demand>>,
        cancels: AtomicU32,
    }

    impl Subscription for CountingSubscription {
        fn request(&self, demand: Demand) {
            self.requests.lock().push(demand);
        }

        fn cancel(&self) {
            self.cancels.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn sink_requests_unlimited() {
        let subscription = Arc::new(CountingSubscription::default());
        let (sink, _cancellable) = Sink::<u32, ()>::new(|_| {}, |_| {});

        sink.receive_subscription(Arc::clone(&subscription) as Arc<dyn Subscription>);

        assert_eq!(*subscription.requests.lock(), vec![Demand::Unlimited]);
    }

    #[test]
    fn dropping_the_handle_cancels() {
        let subscription = Arc::new(CountingSubscription::default());
        let (sink, cancellable) = Sink::<u32, ()>::new(|_| {}, |_| {});
        sink.receive_subscription(Arc::clone(&subscription) as Arc<dyn Subscription>);

        drop(cancellable);
        assert_eq!(subscription.cancels.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn completed_sink_is_not_cancelled() {
        let subscription = Arc::new(CountingSubscription::default());
        let completions = Arc::new(AtomicU32::new(0));
        let completions_clone = Arc::clone(&completions);
        let (sink, cancellable) = Sink::<u32, ()>::new(
            |_| {},
            move |_| {
                completions_clone.fetch_add(1, Ordering::SeqCst);
            },
        );
        sink.receive_subscription(Arc::clone(&subscription) as Arc<dyn Subscription>);

        sink.receive_completion(Completion::Finished);
        sink.receive_completion(Completion::Finished);
        cancellable.cancel();

        assert_eq!(completions.load(Ordering::SeqCst), 1);
        assert_eq!(subscription.cancels.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn detached_handle_does_not_cancel() {
        let subscription = Arc::new(CountingSubscription::default());
        let cancellable = AnyCancellable::from_subscription(Arc::clone(&subscription) as Arc<dyn Subscription>);

        cancellable.detach();
        assert_eq!(subscription.cancels.load(Ordering::SeqCst), 0);
    }
}
