// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use parking_lot::Mutex;
use wac_accessory::reactive::{Completion, Demand, Subscriber, Subscription};
use wac_accessory::{AccessoryProperties, MacAddress, UnconfiguredAccessory};

/// Subscriber that records everything and requests only what the test asks.
///
/// Clones share the same records, so a test can keep one clone and hand the
/// other to `subscribe`.
pub struct Recorder<O, F> {
    inner: Arc<Records<O, F>>,
}

struct Records<O, F> {
    subscription: Mutex<Option<Arc<dyn Subscription>>>,
    values: Mutex<Vec<O>>,
    completions: Mutex<Vec<Completion<F>>>,
}

impl<O, F> Recorder<O, F> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Records {
                subscription: Mutex::new(None),
                values: Mutex::new(Vec::new()),
                completions: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn request(&self, demand: Demand) {
        let subscription = self.inner.subscription.lock().clone();
        subscription
            .expect("recorder has no subscription")
            .request(demand);
    }

    pub fn cancel(&self) {
        let subscription = self.inner.subscription.lock().clone();
        subscription
            .expect("recorder has no subscription")
            .cancel();
    }

    pub fn values(&self) -> Vec<O>
    where
        O: Clone,
    {
        self.inner.values.lock().clone()
    }

    pub fn completions(&self) -> Vec<Completion<F>>
    where
        F: Clone,
    {
        self.inner.completions.lock().clone()
    }
}

impl<O, F> Clone for Recorder<O, F> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<O, F> Subscriber for Recorder<O, F>
where
    O: Send + 'static,
    F: Send + 'static,
{
    type Input = O;
    type Failure = F;

    fn receive_subscription(&self, subscription: Arc<dyn Subscription>) {
        *self.inner.subscription.lock() = Some(subscription);
    }

    fn receive(&self, input: O) -> Demand {
        self.inner.values.lock().push(input);
        Demand::NONE
    }

    fn receive_completion(&self, completion: Completion<F>) {
        self.inner.completions.lock().push(completion);
    }
}

/// A plausible speaker descriptor whose MAC ends in `last`.
pub fn speaker(last: u8) -> UnconfiguredAccessory {
    UnconfiguredAccessory::new(
        format!("Speaker {last}"),
        MacAddress::new([0x00, 0x1c, 0xb3, 0x10, 0x20, last]),
    )
    .with_manufacturer("Teufel")
    .with_model("Cinebar Lux")
    .with_ssid(format!("Teufel-Setup-{last:02X}"))
    .with_properties(AccessoryProperties {
        supports_airplay: true,
        supports_airprint: false,
        supports_homekit: true,
    })
}
