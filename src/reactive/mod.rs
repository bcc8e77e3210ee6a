// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Demand-driven publisher/subscriber core.
//!
//! This module adapts callback-based event sources to a reactive interface
//! with backpressure. It is independent of the accessory APIs and can wrap
//! any producer that reports its results through callbacks.
//!
//! # Overview
//!
//! - [`Publisher`] / [`Subscriber`] / [`Subscription`] - The reactive contract
//! - [`Demand`] - How many values a subscriber is willing to accept
//! - [`DemandBuffer`] - Holds producer values until there is demand for them
//! - [`SimpleSubscription`] - Starts a producer on the first positive demand
//! - [`AnyPublisher`] - Hides the concrete type of a publisher
//! - [`Sink`] / [`EventReceiver`] - Ready-made consumers
//!
//! # Flow
//!
//! ```text
//! subscribe ──> Subscription ──request(n)──> start() (first demand only)
//!                                                │
//!                      platform callbacks ──> DemandBuffer ──> Subscriber
//! ```

mod completion;
mod demand;
mod demand_buffer;
mod publisher;
mod receiver;
mod simple_subscription;
mod sink;
mod subscriber;

pub use completion::Completion;
pub use demand::Demand;
pub use demand_buffer::DemandBuffer;
pub use publisher::{AnyPublisher, Publisher, PublisherExt};
pub use receiver::{ChannelSubscriber, EventReceiver};
pub use simple_subscription::{BufferHandle, SimpleSubscription, SubscriptionHooks};
pub use sink::{AnyCancellable, Sink};
pub use subscriber::{AnySubscriber, Subscriber, Subscription};
