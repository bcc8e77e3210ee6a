// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Closure-based browser delegate.

use std::fmt;
use std::sync::Arc;

use super::{BrowserState, ConfigurationStatus};
use crate::accessory::UnconfiguredAccessory;

/// Type alias for state update callbacks.
type StateCallback = Arc<dyn Fn(BrowserState) + Send + Sync>;

/// Type alias for found/removed callbacks.
type AccessoriesCallback = Arc<dyn Fn(&[UnconfiguredAccessory]) + Send + Sync>;

/// Type alias for configuration finished callbacks.
type ConfiguredCallback = Arc<dyn Fn(&UnconfiguredAccessory, ConfigurationStatus) + Send + Sync>;

/// Receiver of accessory browser events.
///
/// Each event kind has one optional closure slot. Events for an empty slot
/// are dropped. Slots are filled with the `on_*` builders before the delegate
/// is handed to [`AccessoryBrowser::set_delegate`](super::AccessoryBrowser::set_delegate).
///
/// # Examples
///
/// ```
/// use wac_accessory::platform::{BrowserDelegate, BrowserState};
///
/// let delegate = BrowserDelegate::new()
///     .on_update_state(|state| println!("browser is now {state:?}"));
///
/// delegate.update_state(BrowserState::Searching);
/// ```
#[derive(Clone, Default)]
pub struct BrowserDelegate {
    /// Called when the browser state changes.
    pub did_update_state: Option<StateCallback>,
    /// Called with each batch of newly found accessories.
    pub did_find_unconfigured_accessories: Option<AccessoriesCallback>,
    /// Called with each batch of accessories that disappeared.
    pub did_remove_unconfigured_accessories: Option<AccessoriesCallback>,
    /// Called when configuring an accessory ends.
    pub did_finish_configuring_accessory: Option<ConfiguredCallback>,
}

impl BrowserDelegate {
    /// Creates a delegate with every slot empty.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the state update callback.
    #[must_use]
    pub fn on_update_state<F>(mut self, callback: F) -> Self
    where
        F: Fn(BrowserState) + Send + Sync + 'static,
    {
        self.did_update_state = Some(Arc::new(callback));
        self
    }

    /// Sets the callback for found accessories.
    #[must_use]
    pub fn on_find_accessories<F>(mut self, callback: F) -> Self
    where
        F: Fn(&[UnconfiguredAccessory]) + Send + Sync + 'static,
    {
        self.did_find_unconfigured_accessories = Some(Arc::new(callback));
        self
    }

    /// Sets the callback for removed accessories.
    #[must_use]
    pub fn on_remove_accessories<F>(mut self, callback: F) -> Self
    where
        F: Fn(&[UnconfiguredAccessory]) + Send + Sync + 'static,
    {
        self.did_remove_unconfigured_accessories = Some(Arc::new(callback));
        self
    }

    /// Sets the configuration finished callback.
    #[must_use]
    pub fn on_finish_configuring<F>(mut self, callback: F) -> Self
    where
        F: Fn(&UnconfiguredAccessory, ConfigurationStatus) + Send + Sync + 'static,
    {
        self.did_finish_configuring_accessory = Some(Arc::new(callback));
        self
    }

    /// Dispatches a state update.
    pub fn update_state(&self, state: BrowserState) {
        if let Some(callback) = &self.did_update_state {
            callback(state);
        }
    }

    /// Dispatches a batch of found accessories.
    pub fn find_accessories(&self, accessories: &[UnconfiguredAccessory]) {
        if let Some(callback) = &self.did_find_unconfigured_accessories {
            callback(accessories);
        }
    }

    /// Dispatches a batch of removed accessories.
    pub fn remove_accessories(&self, accessories: &[UnconfiguredAccessory]) {
        if let Some(callback) = &self.did_remove_unconfigured_accessories {
            callback(accessories);
        }
    }

    /// Dispatches the end of a configuration.
    pub fn finish_configuring(&self, accessory: &UnconfiguredAccessory, status: ConfigurationStatus) {
        if let Some(callback) = &self.did_finish_configuring_accessory {
            callback(accessory, status);
        }
    }
}

impl fmt::Debug for BrowserDelegate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrowserDelegate")
            .field("did_update_state", &self.did_update_state.is_some())
            .field(
                "did_find_unconfigured_accessories",
                &self.did_find_unconfigured_accessories.is_some(),
            )
            .field(
                "did_remove_unconfigured_accessories",
                &self.did_remove_unconfigured_accessories.is_some(),
            )
            .field(
                "did_finish_configuring_accessory",
                &self.did_finish_configuring_accessory.is_some(),
            )
            .finish()
    }
}
