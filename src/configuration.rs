// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Configuring a single accessory.
//!
//! [`ConfigurationPublisher`] publishes no values. It completes once the
//! platform reports the end of the configuration it started: normally on
//! success, with [`ConfigurationError`] otherwise.
//!
//! The platform announces configuration results to every browser, so each
//! subscription ignores results for accessories other than its own. Starting
//! a configuration also ends any discovery stream that is searching.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use crate::accessory::UnconfiguredAccessory;
use crate::error::{ConfigurationError, Result};
use crate::platform::{
    AccessoryBrowser, AccessoryPlatform, BrowserDelegate, ConfigurationStatus, Presenter,
};
use crate::reactive::{
    BufferHandle, Completion, Publisher, PublisherExt, SimpleSubscription, Subscriber,
    SubscriptionHooks,
};

/// Default upper bound for [`ConfigurationPublisher::wait`].
pub const DEFAULT_CONFIGURATION_TIMEOUT: Duration = Duration::from_secs(120);

/// Options for awaiting a configuration.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use wac_accessory::configuration::ConfigurationOptions;
///
/// let options = ConfigurationOptions::new().with_timeout(Duration::from_secs(30));
/// assert_eq!(options.timeout(), Duration::from_secs(30));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigurationOptions {
    timeout: Duration,
}

impl ConfigurationOptions {
    /// Creates options with the default timeout of two minutes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets how long to wait for the platform to report a result.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for ConfigurationOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_CONFIGURATION_TIMEOUT,
        }
    }
}

/// Publisher that configures one accessory when demand first arrives.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use wac_accessory::platform::{ConfigurationStatus, InMemoryPlatform, Presenter};
/// use wac_accessory::reactive::{Completion, PublisherExt};
/// use wac_accessory::UnconfiguredAccessory;
///
/// let platform = InMemoryPlatform::new();
/// let speaker = platform
///     .advertise([UnconfiguredAccessory::new("Speaker", "00:11:22:33:44:55".parse()?)])
///     .remove(0);
///
/// let outcome = Arc::new(parking_lot::Mutex::new(None));
/// let sink_outcome = Arc::clone(&outcome);
/// let _cancellable = speaker
///     .configure(Arc::new(platform.clone()), Presenter::detached())
///     .sink(|never| match never {}, move |c| *sink_outcome.lock() = Some(c));
///
/// platform.finish_configuration(&speaker, ConfigurationStatus::Success);
/// assert_eq!(*outcome.lock(), Some(Completion::Finished));
/// # Ok::<(), wac_accessory::ValueError>(())
/// ```
#[derive(Clone)]
pub struct ConfigurationPublisher {
    platform: Arc<dyn AccessoryPlatform>,
    accessory: UnconfiguredAccessory,
    presenter: Presenter,
}

impl ConfigurationPublisher {
    /// Creates a publisher configuring `accessory` with UI on `presenter`.
    ///
    /// An unbound descriptor is resolved by MAC address among the
    /// accessories the platform knows when the configuration starts.
    #[must_use]
    pub fn new(
        platform: Arc<dyn AccessoryPlatform>,
        accessory: UnconfiguredAccessory,
        presenter: Presenter,
    ) -> Self {
        Self {
            platform,
            accessory,
            presenter,
        }
    }

    /// Returns the accessory to configure.
    #[must_use]
    pub fn accessory(&self) -> &UnconfiguredAccessory {
        &self.accessory
    }

    /// Runs the configuration and waits for its result.
    ///
    /// # Errors
    ///
    /// - [`Error::Configuration`](crate::Error::Configuration) if the user
    ///   cancelled or the platform failed
    /// - [`Error::Timeout`](crate::Error::Timeout) if the platform reported
    ///   nothing within the configured timeout, which includes a descriptor
    ///   that could not be resolved
    pub async fn wait(&self, options: &ConfigurationOptions) -> Result<()> {
        self.into_receiver()
            .wait_for_completion(options.timeout())
            .await
    }
}

impl std::fmt::Debug for ConfigurationPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigurationPublisher")
            .field("accessory", &self.accessory)
            .finish_non_exhaustive()
    }
}

impl Publisher for ConfigurationPublisher {
    type Output = Infallible;
    type Failure = ConfigurationError;

    fn subscribe<S>(&self, subscriber: S)
    where
        S: Subscriber<Input = Infallible, Failure = ConfigurationError>,
    {
        let subscriber = Arc::new(subscriber);
        let browser = self.platform.make_browser();

        let subscription = SimpleSubscription::new(Arc::clone(&subscriber), |handle| {
            ConfigurationHooks::new(
                browser,
                self.accessory.clone(),
                self.presenter.clone(),
                handle,
            )
        });
        subscriber.receive_subscription(subscription);
    }
}

impl UnconfiguredAccessory {
    /// Returns a publisher that configures this accessory.
    ///
    /// Configuring ends every running discovery stream, since the platform
    /// stops searching while it configures.
    #[must_use]
    pub fn configure(
        &self,
        platform: Arc<dyn AccessoryPlatform>,
        presenter: Presenter,
    ) -> ConfigurationPublisher {
        ConfigurationPublisher::new(platform, self.clone(), presenter)
    }
}

struct ConfigurationHooks {
    browser: Arc<dyn AccessoryBrowser>,
    delegate: Arc<BrowserDelegate>,
    target: UnconfiguredAccessory,
    presenter: Presenter,
}

impl ConfigurationHooks {
    fn new<S>(
        browser: Arc<dyn AccessoryBrowser>,
        target: UnconfiguredAccessory,
        presenter: Presenter,
        handle: BufferHandle<S>,
    ) -> Self
    where
        S: Subscriber<Input = Infallible, Failure = ConfigurationError>,
    {
        let wanted = target.clone();
        let delegate = BrowserDelegate::new().on_finish_configuring(move |accessory, status| {
            if !is_same_accessory(&wanted, accessory) {
                tracing::trace!(mac = %accessory.mac_address(), "Ignoring result for other accessory");
                return;
            }
            match status {
                ConfigurationStatus::Success => handle.complete(Completion::Finished),
                ConfigurationStatus::Failed => {
                    handle.complete(Completion::Failure(ConfigurationError::Failed));
                }
                ConfigurationStatus::UserCancelledConfiguration => {
                    handle.complete(Completion::Failure(ConfigurationError::Cancelled));
                }
                ConfigurationStatus::Unknown(raw) => {
                    tracing::trace!(raw, "Ignoring unknown configuration status");
                }
            }
        });

        Self {
            browser,
            delegate: Arc::new(delegate),
            target,
            presenter,
        }
    }

    /// Finds the live accessory to hand to the platform.
    fn resolve(&self) -> Option<UnconfiguredAccessory> {
        if self.target.is_bound() {
            return Some(self.target.clone());
        }
        let mac = self.target.mac_address();
        self.browser
            .unconfigured_accessories()
            .into_iter()
            .find(|acc| acc.mac_address() == mac)
    }
}

/// A bound target matches by descriptor, an unbound one by MAC address.
fn is_same_accessory(target: &UnconfiguredAccessory, reported: &UnconfiguredAccessory) -> bool {
    if target.is_bound() {
        target == reported
    } else {
        target.mac_address() == reported.mac_address()
    }
}

impl SubscriptionHooks for ConfigurationHooks {
    fn start(&self) {
        let Some(accessory) = self.resolve() else {
            tracing::debug!(
                mac = %self.target.mac_address(),
                "No known accessory with this MAC address, not configuring"
            );
            return;
        };
        tracing::debug!(mac = %accessory.mac_address(), "Configuring accessory");
        self.browser.set_delegate(&self.delegate);
        self.browser.configure_accessory(&accessory, &self.presenter);
    }

    fn stop(&self) {}
}
