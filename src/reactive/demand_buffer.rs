// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Demand-aware value buffer between a producer and one subscriber.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use super::{Completion, Demand, Subscriber};

/// Buffers producer values until the subscriber asks for them.
///
/// The producer side calls [`buffer`](Self::buffer) and
/// [`complete`](Self::complete); the subscription calls
/// [`demand`](Self::demand) whenever the subscriber requests more and
/// [`cancel`](Self::cancel) when it is torn down. Values are released in the
/// order they were buffered and only up to the outstanding demand.
///
/// A completion needs no demand. It is delivered as soon as it is recorded
/// and discards values still waiting for demand. Nothing is delivered after a
/// completion has been recorded or after cancellation.
///
/// # Thread Safety
///
/// All methods may be called concurrently. The subscriber is never invoked
/// while the internal lock is held, and only one caller drains at a time:
/// a call that arrives while another one is delivering (including a
/// subscriber requesting more demand from inside
/// [`Subscriber::receive`]) records its work and returns, and the active
/// drainer delivers it. The drainer re-checks for completion and
/// cancellation after every value it hands over.
pub struct DemandBuffer<S: Subscriber> {
    subscriber: Arc<S>,
    state: Mutex<BufferState<S::Input, S::Failure>>,
}

struct BufferState<I, F> {
    queue: VecDeque<I>,
    /// Outstanding demand not yet satisfied.
    demand: Demand,
    /// Recorded completion waiting for the active drainer.
    completion: Option<Completion<F>>,
    /// Set by completion or cancellation. No value is accepted or delivered
    /// afterwards.
    terminated: bool,
    draining: bool,
}

impl<S: Subscriber> DemandBuffer<S> {
    /// Creates an empty buffer feeding `subscriber`.
    #[must_use]
    pub fn new(subscriber: Arc<S>) -> Self {
        Self::with_capacity(subscriber, 0)
    }

    /// Creates an empty buffer with room for `capacity` values before the
    /// queue reallocates. The queue itself is unbounded.
    #[must_use]
    pub fn with_capacity(subscriber: Arc<S>, capacity: usize) -> Self {
        Self {
            subscriber,
            state: Mutex::new(BufferState {
                queue: VecDeque::with_capacity(capacity),
                demand: Demand::NONE,
                completion: None,
                terminated: false,
                draining: false,
            }),
        }
    }

    /// Queues a value and delivers whatever the current demand allows.
    ///
    /// Returns the demand still outstanding. Values buffered after
    /// completion or cancellation are dropped.
    pub fn buffer(&self, value: S::Input) -> Demand {
        {
            let mut state = self.state.lock();
            if state.terminated {
                tracing::trace!("Dropping value buffered after termination");
                return Demand::NONE;
            }
            state.queue.push_back(value);
        }
        self.drain()
    }

    /// Delivers the completion, discarding values that are still queued.
    ///
    /// Only the first completion is kept. If another caller is delivering a
    /// value at that moment, it hands the completion over as soon as that
    /// value returns.
    pub fn complete(&self, completion: Completion<S::Failure>) {
        {
            let mut state = self.state.lock();
            if state.terminated {
                tracing::trace!("Ignoring completion after termination");
                return;
            }
            state.terminated = true;
            state.demand = Demand::NONE;
            let discarded = state.queue.len();
            state.queue.clear();
            if discarded > 0 {
                tracing::trace!(discarded, "Discarding undelivered values on completion");
            }
            state.completion = Some(completion);
        }
        self.drain();
    }

    /// Stops all delivery. Queued values and a pending completion are
    /// discarded.
    pub fn cancel(&self) {
        let mut state = self.state.lock();
        state.terminated = true;
        state.demand = Demand::NONE;
        state.queue.clear();
        state.completion = None;
    }

    /// Adds demand and flushes buffered values.
    ///
    /// Returns the demand still outstanding after the flush. The caller may
    /// ignore it: values buffered later are flushed right away while demand
    /// remains.
    pub fn demand(&self, demand: Demand) -> Demand {
        {
            let mut state = self.state.lock();
            if state.terminated {
                return Demand::NONE;
            }
            state.demand += demand;
        }
        self.drain()
    }

    /// Returns `true` once a completion has been recorded or the buffer has
    /// been cancelled.
    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.state.lock().terminated
    }

    /// Returns the number of values waiting for demand.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.state.lock().queue.len()
    }

    fn drain(&self) -> Demand {
        let mut state = self.state.lock();
        if state.draining {
            return state.demand;
        }
        state.draining = true;

        loop {
            if let Some(completion) = state.completion.take() {
                MutexGuard::unlocked(&mut state, || {
                    self.subscriber.receive_completion(completion);
                });
                continue;
            }

            if !state.terminated
                && state.demand.is_positive()
                && let Some(value) = state.queue.pop_front()
            {
                state.demand -= 1;
                let additional =
                    MutexGuard::unlocked(&mut state, || self.subscriber.receive(value));
                if !state.terminated {
                    state.demand += additional;
                }
                continue;
            }

            state.draining = false;
            return state.demand;
        }
    }
}

impl<S: Subscriber> std::fmt::Debug for DemandBuffer<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("DemandBuffer")
            .field("pending", &state.queue.len())
            .field("demand", &state.demand)
            .field("terminated", &state.terminated)
            .finish_non_exhaustive()
    }
}
