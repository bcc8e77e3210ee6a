// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Seam between the reactive adapters and the host accessory browser.
//!
//! The host platform is an external service. It is reached only through
//! [`AccessoryPlatform`] and [`AccessoryBrowser`], and reports back through a
//! [`BrowserDelegate`]. [`InMemoryPlatform`] implements both traits without
//! any hardware and is what the test suite runs against.

mod delegate;
mod memory;

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::accessory::UnconfiguredAccessory;

pub use delegate::BrowserDelegate;
pub use memory::{InMemoryBrowser, InMemoryPlatform};

/// State reported by an accessory browser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BrowserState {
    /// Wi-Fi is off or unavailable.
    WifiUnavailable,
    /// The browser is idle.
    Stopped,
    /// The browser is searching for unconfigured accessories.
    Searching,
    /// The browser is busy configuring an accessory.
    Configuring,
    /// A raw state this library does not know about.
    Unknown(i64),
}

impl From<i64> for BrowserState {
    fn from(raw: i64) -> Self {
        match raw {
            0 => Self::WifiUnavailable,
            1 => Self::Stopped,
            2 => Self::Searching,
            3 => Self::Configuring,
            other => Self::Unknown(other),
        }
    }
}

/// Outcome of configuring one accessory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConfigurationStatus {
    /// The accessory joined the network.
    Success,
    /// The user dismissed the configuration UI.
    UserCancelledConfiguration,
    /// Configuration failed for any other reason.
    Failed,
    /// A raw status this library does not know about.
    Unknown(i64),
}

impl From<i64> for ConfigurationStatus {
    fn from(raw: i64) -> Self {
        match raw {
            0 => Self::Success,
            1 => Self::UserCancelledConfiguration,
            2 => Self::Failed,
            other => Self::Unknown(other),
        }
    }
}

type PredicateFn = dyn Fn(&UnconfiguredAccessory) -> bool + Send + Sync;

/// Filter applied by the platform while searching.
///
/// # Examples
///
/// ```
/// use wac_accessory::platform::AccessoryPredicate;
/// use wac_accessory::UnconfiguredAccessory;
///
/// let speakers = AccessoryPredicate::new(|acc: &UnconfiguredAccessory| {
///     acc.manufacturer() == "Teufel"
/// });
/// let acc = UnconfiguredAccessory::new("a", "00:00:00:00:00:01".parse()?)
///     .with_manufacturer("Teufel");
/// assert!(speakers.matches(&acc));
/// # Ok::<(), wac_accessory::ValueError>(())
/// ```
#[derive(Clone)]
pub struct AccessoryPredicate(Arc<PredicateFn>);

impl AccessoryPredicate {
    /// Wraps a filter closure.
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&UnconfiguredAccessory) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(predicate))
    }

    /// Returns `true` if `accessory` passes the filter.
    #[must_use]
    pub fn matches(&self, accessory: &UnconfiguredAccessory) -> bool {
        (self.0)(accessory)
    }
}

impl fmt::Debug for AccessoryPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessoryPredicate(..)")
    }
}

/// Host UI context the platform presents configuration UI on.
///
/// The library never looks inside; platform implementations downcast it to
/// whatever their windowing layer expects.
#[derive(Clone)]
pub struct Presenter(Arc<dyn Any + Send + Sync>);

impl Presenter {
    /// Wraps a host UI context.
    pub fn new<T: Any + Send + Sync>(context: T) -> Self {
        Self(Arc::new(context))
    }

    /// A presenter without UI context, for headless platforms.
    #[must_use]
    pub fn detached() -> Self {
        Self::new(())
    }

    /// Returns the context if it is a `T`.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref()
    }
}

impl fmt::Debug for Presenter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Presenter(..)")
    }
}

/// An accessory browser provided by the host platform.
///
/// All methods must return promptly. Results are reported later, on any
/// thread, through the registered [`BrowserDelegate`].
pub trait AccessoryBrowser: Send + Sync {
    /// Registers the delegate that receives this browser's events.
    ///
    /// Implementations hold the delegate weakly; the caller keeps it alive
    /// for as long as it wants events.
    fn set_delegate(&self, delegate: &Arc<BrowserDelegate>);

    /// Starts searching, optionally limited to accessories matching
    /// `predicate`.
    fn start_searching(&self, predicate: Option<AccessoryPredicate>);

    /// Stops searching.
    fn stop_searching(&self);

    /// Presents the configuration UI for `accessory` on `presenter`.
    fn configure_accessory(&self, accessory: &UnconfiguredAccessory, presenter: &Presenter);

    /// Returns the unconfigured accessories the platform currently knows.
    fn unconfigured_accessories(&self) -> Vec<UnconfiguredAccessory>;
}

/// Factory for platform browsers.
///
/// Every subscription asks for its own browser: moving the delegate of a
/// browser that is already searching would silence that search.
pub trait AccessoryPlatform: Send + Sync {
    /// Creates a new browser.
    fn make_browser(&self) -> Arc<dyn AccessoryBrowser>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_states_map_to_variants() {
        assert_eq!(BrowserState::from(0), BrowserState::WifiUnavailable);
        assert_eq!(BrowserState::from(3), BrowserState::Configuring);
        assert_eq!(BrowserState::from(42), BrowserState::Unknown(42));
        assert_eq!(
            ConfigurationStatus::from(1),
            ConfigurationStatus::UserCancelledConfiguration
        );
        assert_eq!(ConfigurationStatus::from(-1), ConfigurationStatus::Unknown(-1));
    }

    #[test]
    fn presenter_downcasts_to_context() {
        let presenter = Presenter::new(String::from("main window"));
        assert_eq!(
            presenter.downcast_ref::<String>().map(String::as_str),
            Some("main window")
        );
        assert!(presenter.downcast_ref::<u32>().is_none());
        assert!(Presenter::detached().downcast_ref::<()>().is_some());
    }
}
