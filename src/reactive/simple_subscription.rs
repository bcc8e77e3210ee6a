// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Lazily started subscription over a callback-driven producer.
//!
//! [`SimpleSubscription`] owns the [`DemandBuffer`] of one subscriber and a
//! `started` flag. The producer's side effect is started by the first
//! strictly positive request, never at subscribe time, and is stopped on
//! cancellation. Producers plug in through [`SubscriptionHooks`] and push
//! into the buffer through a [`BufferHandle`].

use std::cell::Cell;
use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, ReentrantMutex};

use super::{Completion, Demand, DemandBuffer, Subscriber, Subscription};

/// Start and stop actions of a concrete producer.
///
/// Both methods must be non-blocking; results are expected to arrive later
/// through platform callbacks wired to a [`BufferHandle`].
pub trait SubscriptionHooks: Send + Sync + 'static {
    /// Begins the producer's operation. Called at most once per subscription.
    fn start(&self);

    /// Ends the operation and releases producer resources. Called on every
    /// cancellation, whether or not the producer was started.
    fn stop(&self);
}

/// Slot holding the buffer until cancellation or completion releases it.
struct BufferSlot<S: Subscriber> {
    buffer: Mutex<Option<Arc<DemandBuffer<S>>>>,
}

impl<S: Subscriber> BufferSlot<S> {
    fn current(&self) -> Option<Arc<DemandBuffer<S>>> {
        self.buffer.lock().clone()
    }

    fn release(&self) -> Option<Arc<DemandBuffer<S>>> {
        self.buffer.lock().take()
    }

    /// Drops the buffer once it has recorded a completion.
    fn release_if_terminated(&self, buffer: &Arc<DemandBuffer<S>>) {
        if !buffer.is_terminated() {
            return;
        }
        let mut current = self.buffer.lock();
        if current
            .as_ref()
            .is_some_and(|held| Arc::ptr_eq(held, buffer))
        {
            current.take();
        }
    }
}

/// Producer-side access to a subscription's buffer.
///
/// The handle holds the subscription weakly. Once the subscription is
/// dropped, cancelled or completed, every call is a silent no-op, so late
/// platform callbacks cannot reach the subscriber.
pub struct BufferHandle<S: Subscriber> {
    slot: Weak<BufferSlot<S>>,
}

impl<S: Subscriber> BufferHandle<S> {
    /// Buffers a value for the subscriber.
    ///
    /// Returns the demand still outstanding, or [`Demand::NONE`] when the
    /// buffer has been released.
    pub fn buffer(&self, value: S::Input) -> Demand {
        let Some(slot) = self.slot.upgrade() else {
            return Demand::NONE;
        };
        let Some(buffer) = slot.current() else {
            tracing::trace!("Dropping value for released subscription");
            return Demand::NONE;
        };
        let remaining = buffer.buffer(value);
        // A completion may have been recorded while this drain was running.
        slot.release_if_terminated(&buffer);
        remaining
    }

    /// Completes the subscription.
    ///
    /// The completion reaches the subscriber right away, values still waiting
    /// for demand are discarded, and the buffer is released.
    pub fn complete(&self, completion: Completion<S::Failure>) {
        let Some(slot) = self.slot.upgrade() else {
            return;
        };
        let Some(buffer) = slot.current() else {
            tracing::trace!("Dropping completion for released subscription");
            return;
        };
        tracing::debug!(
            finished = completion.is_finished(),
            "Completing subscription"
        );
        buffer.complete(completion);
        slot.release_if_terminated(&buffer);
    }

    /// Returns `true` while the subscription can still deliver.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.slot
            .upgrade()
            .is_some_and(|slot| slot.buffer.lock().is_some())
    }
}

impl<S: Subscriber> Clone for BufferHandle<S> {
    fn clone(&self) -> Self {
        Self {
            slot: Weak::clone(&self.slot),
        }
    }
}

impl<S: Subscriber> fmt::Debug for BufferHandle<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferHandle")
            .field("active", &self.is_active())
            .finish()
    }
}

/// A subscription that starts its producer on the first positive demand.
///
/// # Lifecycle
///
/// ```text
/// not started --request(n > 0)--> started --completion--> released
///      |                             |
///      +-----------cancel------------+--> released
/// ```
///
/// Requests with zero demand never start the producer. The started flag is
/// guarded by a re-entrant lock that is released before
/// [`SubscriptionHooks::start`] runs, because starting a producer may
/// synchronously deliver callbacks that request more demand.
pub struct SimpleSubscription<S: Subscriber, H> {
    slot: Arc<BufferSlot<S>>,
    started: ReentrantMutex<Cell<bool>>,
    hooks: H,
}

impl<S, H> SimpleSubscription<S, H>
where
    S: Subscriber,
    H: SubscriptionHooks,
{
    /// Creates a subscription feeding `subscriber`.
    ///
    /// `make_hooks` receives the producer's handle to the buffer, typically
    /// captured by the platform callbacks it wires up.
    pub fn new<F>(subscriber: Arc<S>, make_hooks: F) -> Arc<Self>
    where
        F: FnOnce(BufferHandle<S>) -> H,
    {
        Self::with_capacity(subscriber, 0, make_hooks)
    }

    /// Creates a subscription whose buffer pre-allocates `capacity` slots.
    pub fn with_capacity<F>(subscriber: Arc<S>, capacity: usize, make_hooks: F) -> Arc<Self>
    where
        F: FnOnce(BufferHandle<S>) -> H,
    {
        let slot = Arc::new(BufferSlot {
            buffer: Mutex::new(Some(Arc::new(DemandBuffer::with_capacity(
                subscriber, capacity,
            )))),
        });
        let handle = BufferHandle {
            slot: Arc::downgrade(&slot),
        };
        Arc::new(Self {
            slot,
            started: ReentrantMutex::new(Cell::new(false)),
            hooks: make_hooks(handle),
        })
    }

    /// Returns `true` once the producer has been started and not cancelled.
    #[must_use]
    pub fn is_started(&self) -> bool {
        self.started.lock().get()
    }

    /// Returns `true` until cancellation or completion releases the buffer.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.slot.buffer.lock().is_some()
    }

    /// Returns the producer hooks.
    #[must_use]
    pub fn hooks(&self) -> &H {
        &self.hooks
    }
}

impl<S, H> Subscription for SimpleSubscription<S, H>
where
    S: Subscriber,
    H: SubscriptionHooks,
{
    fn request(&self, demand: Demand) {
        let Some(buffer) = self.slot.current() else {
            return;
        };

        let first_demand = {
            let started = self.started.lock();
            if !started.get() && demand.is_positive() {
                started.set(true);
                true
            } else {
                false
            }
        };

        if first_demand {
            tracing::debug!(%demand, "First demand, starting producer");
            self.hooks.start();
        }

        // Remaining demand is tracked by the buffer; values buffered later
        // are flushed against it.
        let _ = buffer.demand(demand);
        self.slot.release_if_terminated(&buffer);
    }

    fn cancel(&self) {
        // A drain in progress holds its own reference to the buffer.
        if let Some(buffer) = self.slot.release() {
            buffer.cancel();
            tracing::debug!("Subscription cancelled");
        }
        self.started.lock().set(false);
        self.hooks.stop();
    }
}

impl<S: Subscriber, H> fmt::Debug for SimpleSubscription<S, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimpleSubscription")
            .field("started", &self.started.lock().get())
            .field("active", &self.slot.buffer.lock().is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    #[derive(Default)]
    struct Recorder {
        values: Mutex<Vec<u32>>,
        completions: Mutex<Vec<Completion<()>>>,
    }

    impl Subscriber for Recorder {
        type Input = u32;
        type Failure = ();

        fn receive_subscription(&self, _subscription: Arc<dyn Subscription>) {}

        fn receive(&self, input: u32) -> Demand {
            self.values.lock().push(input);
            Demand::NONE
        }

        fn receive_completion(&self, completion: Completion<()>) {
            self.completions.lock().push(completion);
        }
    }

    /// Counts start/stop calls and exposes the buffer handle.
    struct Counting {
        starts: AtomicU32,
        stops: AtomicU32,
        handle: BufferHandle<Recorder>,
        emit_on_start: Vec<u32>,
    }

    impl SubscriptionHooks for Counting {
        fn start(&self) {
            self.starts.fetch_add(1, Ordering::SeqCst);
            for value in &self.emit_on_start {
                self.handle.buffer(*value);
            }
        }

        fn stop(&self) {
            self.stops.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn subscription(
        emit_on_start: Vec<u32>,
    ) -> (Arc<Recorder>, Arc<SimpleSubscription<Recorder, Counting>>) {
        let recorder = Arc::new(Recorder::default());
        let subscription = SimpleSubscription::new(Arc::clone(&recorder), |handle| Counting {
            starts: AtomicU32::new(0),
            stops: AtomicU32::new(0),
            handle,
            emit_on_start,
        });
        (recorder, subscription)
    }

    #[test]
    fn zero_demand_does_not_start() {
        let (_recorder, subscription) = subscription(vec![]);

        subscription.request(Demand::NONE);
        subscription.request(Demand::NONE);

        assert_eq!(subscription.hooks().starts.load(Ordering::SeqCst), 0);
        assert!(!subscription.is_started());
    }

    #[test]
    fn starts_exactly_once() {
        let (_recorder, subscription) = subscription(vec![]);

        subscription.request(Demand::max(1));
        subscription.request(Demand::max(3));
        subscription.request(Demand::Unlimited);

        assert_eq!(subscription.hooks().starts.load(Ordering::SeqCst), 1);
        assert!(subscription.is_started());
    }

    #[test]
    fn values_emitted_during_start_respect_demand() {
        let (recorder, subscription) = subscription(vec![10, 20, 30]);

        subscription.request(Demand::max(2));
        assert_eq!(*recorder.values.lock(), vec![10, 20]);

        subscription.request(Demand::max(1));
        assert_eq!(*recorder.values.lock(), vec![10, 20, 30]);
    }

    #[test]
    fn values_buffered_before_demand_arrive_in_order() {
        let (recorder, subscription) = subscription(vec![]);
        let handle = subscription.hooks().handle.clone();

        handle.buffer(1);
        handle.buffer(2);
        handle.buffer(3);
        assert!(recorder.values.lock().is_empty());

        subscription.request(Demand::Unlimited);
        assert_eq!(*recorder.values.lock(), vec![1, 2, 3]);
    }

    #[test]
    fn cancel_stops_and_silences_late_callbacks() {
        let (recorder, subscription) = subscription(vec![]);
        let handle = subscription.hooks().handle.clone();

        subscription.request(Demand::Unlimited);
        subscription.cancel();

        assert_eq!(handle.buffer(5), Demand::NONE);
        handle.complete(Completion::Finished);
        assert!(recorder.values.lock().is_empty());
        assert!(recorder.completions.lock().is_empty());
        assert_eq!(subscription.hooks().stops.load(Ordering::SeqCst), 1);
        assert!(!subscription.is_started());
        assert!(!handle.is_active());
    }

    #[test]
    fn cancel_is_safe_before_start_and_repeatedly() {
        let (_recorder, subscription) = subscription(vec![]);

        subscription.cancel();
        subscription.cancel();
        subscription.request(Demand::max(1));

        assert_eq!(subscription.hooks().starts.load(Ordering::SeqCst), 0);
        assert_eq!(subscription.hooks().stops.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn completion_is_delivered_once_and_releases_buffer() {
        let (recorder, subscription) = subscription(vec![]);
        let handle = subscription.hooks().handle.clone();

        subscription.request(Demand::max(1));
        handle.complete(Completion::Finished);
        handle.complete(Completion::Failure(()));
        handle.buffer(1);

        assert_eq!(*recorder.completions.lock(), vec![Completion::Finished]);
        assert!(recorder.values.lock().is_empty());
        assert!(!subscription.is_active());

        subscription.cancel();
        assert_eq!(subscription.hooks().stops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn completion_during_start_discards_undelivered_values() {
        let (recorder, subscription) = subscription(vec![1, 2]);
        let handle = subscription.hooks().handle.clone();

        subscription.request(Demand::max(1));
        handle.complete(Completion::Finished);
        assert_eq!(*recorder.values.lock(), vec![1]);
        assert_eq!(*recorder.completions.lock(), vec![Completion::Finished]);
        assert!(!subscription.is_active());

        subscription.request(Demand::max(1));
        assert_eq!(*recorder.values.lock(), vec![1]);
    }

    /// Cancels its own subscription from inside the first `receive`.
    #[derive(Default)]
    struct SelfCancelling {
        subscription: Mutex<Option<Arc<dyn Subscription>>>,
        values: Mutex<Vec<u32>>,
        completions: Mutex<Vec<Completion<()>>>,
    }

    impl Subscriber for SelfCancelling {
        type Input = u32;
        type Failure = ();

        fn receive_subscription(&self, subscription: Arc<dyn Subscription>) {
            *self.subscription.lock() = Some(subscription);
        }

        fn receive(&self, input: u32) -> Demand {
            self.values.lock().push(input);
            let subscription = self.subscription.lock().take();
            if let Some(subscription) = subscription {
                subscription.cancel();
            }
            Demand::NONE
        }

        fn receive_completion(&self, completion: Completion<()>) {
            self.completions.lock().push(completion);
        }
    }

    struct Emitting {
        handle: BufferHandle<SelfCancelling>,
        stops: AtomicU32,
    }

    impl SubscriptionHooks for Emitting {
        fn start(&self) {
            for value in [1, 2, 3] {
                self.handle.buffer(value);
            }
        }

        fn stop(&self) {
            self.stops.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn cancel_from_receive_stops_delivery_at_once() {
        let subscriber = Arc::new(SelfCancelling::default());
        let subscription = SimpleSubscription::new(Arc::clone(&subscriber), |handle| Emitting {
            handle,
            stops: AtomicU32::new(0),
        });
        subscriber.receive_subscription(Arc::clone(&subscription) as Arc<dyn Subscription>);
        let handle = subscription.hooks().handle.clone();

        for value in [10, 20, 30] {
            handle.buffer(value);
        }
        subscription.request(Demand::Unlimited);
        handle.buffer(40);
        handle.complete(Completion::Finished);

        assert_eq!(*subscriber.values.lock(), vec![10]);
        assert!(subscriber.completions.lock().is_empty());
        assert_eq!(subscription.hooks().stops.load(Ordering::SeqCst), 1);
        assert!(!subscription.is_active());
    }

    #[test]
    fn handle_outliving_subscription_is_inert() {
        let (recorder, subscription) = subscription(vec![]);
        let handle = subscription.hooks().handle.clone();
        subscription.request(Demand::Unlimited);
        drop(subscription);

        assert_eq!(handle.buffer(1), Demand::NONE);
        assert!(recorder.values.lock().is_empty());
    }
}
