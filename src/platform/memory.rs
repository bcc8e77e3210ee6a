// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! In-memory accessory platform.
//!
//! Keeps a registry of unconfigured accessories shared by every browser it
//! creates, and lets the caller play the part of the host: advertise and
//! withdraw accessories, toggle Wi-Fi, and finish configurations.
//!
//! Like the host platform, configuration results are announced to every
//! browser that has a delegate, not only the one that asked.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};

use super::{
    AccessoryBrowser, AccessoryPlatform, AccessoryPredicate, BrowserDelegate, BrowserState,
    ConfigurationStatus, Presenter,
};
use crate::accessory::{AccessoryHandle, UnconfiguredAccessory};

/// Shared in-memory accessory registry.
///
/// Cloning yields another handle to the same registry.
///
/// # Examples
///
/// ```
/// use wac_accessory::platform::{AccessoryPlatform, InMemoryPlatform};
/// use wac_accessory::UnconfiguredAccessory;
///
/// let platform = InMemoryPlatform::new();
/// let advertised = platform.advertise([UnconfiguredAccessory::new(
///     "Speaker",
///     "00:11:22:33:44:55".parse()?,
/// )]);
///
/// assert!(advertised[0].is_bound());
/// assert_eq!(platform.make_browser().unconfigured_accessories(), advertised);
/// # Ok::<(), wac_accessory::ValueError>(())
/// ```
#[derive(Clone)]
pub struct InMemoryPlatform {
    inner: Arc<PlatformInner>,
}

struct PlatformInner {
    accessories: RwLock<Vec<UnconfiguredAccessory>>,
    browsers: Mutex<Vec<Weak<InMemoryBrowser>>>,
    wifi_available: AtomicBool,
    search_starts: AtomicUsize,
    configuration_requests: Mutex<Vec<UnconfiguredAccessory>>,
}

/// Browser created by [`InMemoryPlatform`].
pub struct InMemoryBrowser {
    platform: Arc<PlatformInner>,
    delegate: Mutex<Weak<BrowserDelegate>>,
    search: Mutex<Option<Search>>,
}

/// An active search and its filter.
#[derive(Clone)]
struct Search {
    predicate: Option<AccessoryPredicate>,
}

impl Search {
    fn admits(&self, accessory: &UnconfiguredAccessory) -> bool {
        self.predicate
            .as_ref()
            .is_none_or(|predicate| predicate.matches(accessory))
    }

    fn filter(&self, accessories: &[UnconfiguredAccessory]) -> Vec<UnconfiguredAccessory> {
        accessories
            .iter()
            .filter(|acc| self.admits(acc))
            .cloned()
            .collect()
    }
}

impl InMemoryPlatform {
    /// Creates an empty platform with Wi-Fi available.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(PlatformInner {
                accessories: RwLock::new(Vec::new()),
                browsers: Mutex::new(Vec::new()),
                wifi_available: AtomicBool::new(true),
                search_starts: AtomicUsize::new(0),
                configuration_requests: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Makes accessories known to the platform.
    ///
    /// Each accessory is bound to a fresh handle unless it already has one,
    /// and replaces any known accessory with the same MAC address. Searching
    /// browsers receive the accessories their filter admits as one batch.
    /// Returns the bound descriptors.
    pub fn advertise<I>(&self, accessories: I) -> Vec<UnconfiguredAccessory>
    where
        I: IntoIterator<Item = UnconfiguredAccessory>,
    {
        let bound: Vec<_> = accessories
            .into_iter()
            .map(|acc| match acc.handle() {
                Some(_) => acc,
                None => acc.bound_to(AccessoryHandle::new()),
            })
            .collect();

        {
            let mut known = self.inner.accessories.write();
            for acc in &bound {
                known.retain(|existing| existing.mac_address() != acc.mac_address());
                known.push(acc.clone());
            }
        }
        tracing::info!(count = bound.len(), "Advertising accessories");

        for (_browser, search, delegate) in self.inner.searching_browsers() {
            let batch = search.filter(&bound);
            if !batch.is_empty() {
                tracing::trace!(count = batch.len(), "Reporting found accessories");
                delegate.find_accessories(&batch);
            }
        }
        bound
    }

    /// Removes accessories, matched by MAC address.
    ///
    /// Searching browsers receive the removed accessories their filter
    /// admits as one batch.
    pub fn withdraw(&self, accessories: &[UnconfiguredAccessory]) {
        let removed: Vec<_> = {
            let mut known = self.inner.accessories.write();
            let (gone, kept): (Vec<_>, Vec<_>) = known.drain(..).partition(|existing| {
                accessories
                    .iter()
                    .any(|acc| acc.mac_address() == existing.mac_address())
            });
            *known = kept;
            gone
        };
        if removed.is_empty() {
            return;
        }
        tracing::info!(count = removed.len(), "Withdrawing accessories");

        for (_browser, search, delegate) in self.inner.searching_browsers() {
            let batch = search.filter(&removed);
            if !batch.is_empty() {
                delegate.remove_accessories(&batch);
            }
        }
    }

    /// Turns Wi-Fi on or off.
    ///
    /// Turning it off ends every search with [`BrowserState::WifiUnavailable`].
    pub fn set_wifi_available(&self, available: bool) {
        self.inner.wifi_available.store(available, Ordering::SeqCst);
        if !available {
            tracing::info!("Wi-Fi turned off");
            self.broadcast_state(BrowserState::WifiUnavailable);
        }
    }

    /// Reports `state` to every browser with a delegate.
    ///
    /// Any state other than [`BrowserState::Searching`] ends active searches.
    pub fn broadcast_state(&self, state: BrowserState) {
        for (browser, delegate) in self.inner.delegated_browsers() {
            if state != BrowserState::Searching {
                browser.search.lock().take();
            }
            delegate.update_state(state);
        }
    }

    /// Announces the end of a configuration to every browser with a delegate.
    ///
    /// A successful configuration also removes the accessory from the
    /// registry.
    pub fn finish_configuration(&self, accessory: &UnconfiguredAccessory, status: ConfigurationStatus) {
        if status == ConfigurationStatus::Success {
            self.inner
                .accessories
                .write()
                .retain(|known| known.mac_address() != accessory.mac_address());
        }
        tracing::info!(mac = %accessory.mac_address(), ?status, "Configuration finished");

        for (_browser, delegate) in self.inner.delegated_browsers() {
            delegate.finish_configuring(accessory, status);
        }
    }

    /// Returns the accessories currently known.
    #[must_use]
    pub fn known_accessories(&self) -> Vec<UnconfiguredAccessory> {
        self.inner.accessories.read().clone()
    }

    /// Returns how many times any browser started searching.
    #[must_use]
    pub fn search_starts(&self) -> usize {
        self.inner.search_starts.load(Ordering::SeqCst)
    }

    /// Returns the accessories configuration was requested for, in order.
    #[must_use]
    pub fn configuration_requests(&self) -> Vec<UnconfiguredAccessory> {
        self.inner.configuration_requests.lock().clone()
    }

    /// Returns the number of browsers currently searching.
    #[must_use]
    pub fn active_searches(&self) -> usize {
        self.inner
            .live_browsers()
            .iter()
            .filter(|browser| browser.search.lock().is_some())
            .count()
    }
}

impl Default for InMemoryPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl AccessoryPlatform for InMemoryPlatform {
    fn make_browser(&self) -> Arc<dyn AccessoryBrowser> {
        let browser = Arc::new(InMemoryBrowser {
            platform: Arc::clone(&self.inner),
            delegate: Mutex::new(Weak::new()),
            search: Mutex::new(None),
        });
        let mut browsers = self.inner.browsers.lock();
        browsers.retain(|weak| weak.strong_count() > 0);
        browsers.push(Arc::downgrade(&browser));
        browser
    }
}

impl PlatformInner {
    fn live_browsers(&self) -> Vec<Arc<InMemoryBrowser>> {
        self.browsers.lock().iter().filter_map(Weak::upgrade).collect()
    }

    /// Snapshot of browsers with a live delegate. Delegates are called only
    /// after every platform lock is released.
    fn delegated_browsers(&self) -> Vec<(Arc<InMemoryBrowser>, Arc<BrowserDelegate>)> {
        self.live_browsers()
            .into_iter()
            .filter_map(|browser| {
                let delegate = browser.delegate()?;
                Some((browser, delegate))
            })
            .collect()
    }

    fn searching_browsers(&self) -> Vec<(Arc<InMemoryBrowser>, Search, Arc<BrowserDelegate>)> {
        self.delegated_browsers()
            .into_iter()
            .filter_map(|(browser, delegate)| {
                let search = browser.search.lock().clone()?;
                Some((browser, search, delegate))
            })
            .collect()
    }
}

impl InMemoryBrowser {
    fn delegate(&self) -> Option<Arc<BrowserDelegate>> {
        self.delegate.lock().upgrade()
    }

    /// Returns `true` while this browser is searching.
    #[must_use]
    pub fn is_searching(&self) -> bool {
        self.search.lock().is_some()
    }
}

impl AccessoryBrowser for InMemoryBrowser {
    fn set_delegate(&self, delegate: &Arc<BrowserDelegate>) {
        *self.delegate.lock() = Arc::downgrade(delegate);
    }

    fn start_searching(&self, predicate: Option<AccessoryPredicate>) {
        self.platform.search_starts.fetch_add(1, Ordering::SeqCst);
        let delegate = self.delegate();

        if !self.platform.wifi_available.load(Ordering::SeqCst) {
            tracing::info!("Cannot search, Wi-Fi unavailable");
            if let Some(delegate) = delegate {
                delegate.update_state(BrowserState::WifiUnavailable);
            }
            return;
        }

        let search = Search { predicate };
        *self.search.lock() = Some(search.clone());
        tracing::info!(filtered = search.predicate.is_some(), "Search started");

        if let Some(delegate) = delegate {
            delegate.update_state(BrowserState::Searching);
            let known = search.filter(&self.platform.accessories.read());
            if !known.is_empty() {
                delegate.find_accessories(&known);
            }
        }
    }

    fn stop_searching(&self) {
        if self.search.lock().take().is_none() {
            return;
        }
        tracing::info!("Search stopped");
        if let Some(delegate) = self.delegate() {
            delegate.update_state(BrowserState::Stopped);
        }
    }

    fn configure_accessory(&self, accessory: &UnconfiguredAccessory, _presenter: &Presenter) {
        tracing::info!(mac = %accessory.mac_address(), "Configuration requested");
        self.platform
            .configuration_requests
            .lock()
            .push(accessory.clone());

        // The host pauses every search while it configures an accessory.
        for (browser, _search, delegate) in self.platform.searching_browsers() {
            browser.search.lock().take();
            delegate.update_state(BrowserState::Configuring);
        }
    }

    fn unconfigured_accessories(&self) -> Vec<UnconfiguredAccessory> {
        self.platform.accessories.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accessory::MacAddress;

    fn accessory(last: u8) -> UnconfiguredAccessory {
        UnconfiguredAccessory::new(format!("acc-{last}"), MacAddress::new([2, 0, 0, 0, 0, last]))
    }

    #[derive(Default)]
    struct Log {
        states: Mutex<Vec<BrowserState>>,
        found: Mutex<Vec<Vec<UnconfiguredAccessory>>>,
        removed: Mutex<Vec<Vec<UnconfiguredAccessory>>>,
        finished: Mutex<Vec<ConfigurationStatus>>,
    }

    fn delegate(log: &Arc<Log>) -> Arc<BrowserDelegate> {
        let (a, b, c, d) = (
            Arc::clone(log),
            Arc::clone(log),
            Arc::clone(log),
            Arc::clone(log),
        );
        Arc::new(
            BrowserDelegate::new()
                .on_update_state(move |state| a.states.lock().push(state))
                .on_find_accessories(move |batch| b.found.lock().push(batch.to_vec()))
                .on_remove_accessories(move |batch| c.removed.lock().push(batch.to_vec()))
                .on_finish_configuring(move |_, status| d.finished.lock().push(status)),
        )
    }

    #[test]
    fn search_reports_state_then_known_accessories() {
        let platform = InMemoryPlatform::new();
        let known = platform.advertise([accessory(1), accessory(2)]);
        let log = Arc::new(Log::default());
        let delegate = delegate(&log);
        let browser = platform.make_browser();
        browser.set_delegate(&delegate);

        browser.start_searching(None);

        assert_eq!(*log.states.lock(), vec![BrowserState::Searching]);
        assert_eq!(*log.found.lock(), vec![known]);
        assert_eq!(platform.search_starts(), 1);
        assert_eq!(platform.active_searches(), 1);

        browser.stop_searching();
        browser.stop_searching();
        assert_eq!(
            *log.states.lock(),
            vec![BrowserState::Searching, BrowserState::Stopped]
        );
        assert_eq!(platform.active_searches(), 0);
    }

    #[test]
    fn predicate_filters_batches() {
        let platform = InMemoryPlatform::new();
        let log = Arc::new(Log::default());
        let delegate = delegate(&log);
        let browser = platform.make_browser();
        browser.set_delegate(&delegate);
        browser.start_searching(Some(AccessoryPredicate::new(|acc| {
            acc.mac_address().octets()[5] % 2 == 0
        })));

        platform.advertise([accessory(1), accessory(2), accessory(4)]);
        platform.withdraw(&[accessory(1), accessory(2)]);

        let found = log.found.lock();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0], vec![accessory(2), accessory(4)]);
        assert_eq!(*log.removed.lock(), vec![vec![accessory(2)]]);
        assert_eq!(platform.known_accessories(), vec![accessory(4)]);
    }

    #[test]
    fn advertise_replaces_same_mac_and_binds() {
        let platform = InMemoryPlatform::new();
        platform.advertise([accessory(1)]);
        let renamed = UnconfiguredAccessory::new("renamed", accessory(1).mac_address());
        platform.advertise([renamed.clone()]);

        let known = platform.known_accessories();
        assert_eq!(known, vec![renamed]);
        assert!(known[0].is_bound());
    }

    #[test]
    fn wifi_off_fails_searches() {
        let platform = InMemoryPlatform::new();
        let log = Arc::new(Log::default());
        let delegate = delegate(&log);
        let browser = platform.make_browser();
        browser.set_delegate(&delegate);

        browser.start_searching(None);
        platform.set_wifi_available(false);
        browser.start_searching(None);

        assert_eq!(
            *log.states.lock(),
            vec![
                BrowserState::Searching,
                BrowserState::WifiUnavailable,
                BrowserState::WifiUnavailable,
            ]
        );
        assert_eq!(platform.active_searches(), 0);
    }

    #[test]
    fn configuration_result_reaches_every_delegate() {
        let platform = InMemoryPlatform::new();
        let known = platform.advertise([accessory(1)]);
        let (log_a, log_b) = (Arc::new(Log::default()), Arc::new(Log::default()));
        let (delegate_a, delegate_b) = (delegate(&log_a), delegate(&log_b));
        let (a, b) = (platform.make_browser(), platform.make_browser());
        a.set_delegate(&delegate_a);
        b.set_delegate(&delegate_b);
        b.start_searching(None);

        a.configure_accessory(&known[0], &Presenter::detached());
        platform.finish_configuration(&known[0], ConfigurationStatus::Success);

        assert_eq!(platform.configuration_requests(), known);
        assert_eq!(
            *log_b.states.lock(),
            vec![BrowserState::Searching, BrowserState::Configuring]
        );
        assert_eq!(*log_a.finished.lock(), vec![ConfigurationStatus::Success]);
        assert_eq!(*log_b.finished.lock(), vec![ConfigurationStatus::Success]);
        assert!(platform.known_accessories().is_empty());
    }

    #[test]
    fn dropped_delegate_is_not_called() {
        let platform = InMemoryPlatform::new();
        let log = Arc::new(Log::default());
        let browser = platform.make_browser();
        browser.set_delegate(&delegate(&log));

        browser.start_searching(None);
        platform.finish_configuration(&accessory(1), ConfigurationStatus::Failed);

        assert!(log.states.lock().is_empty());
        assert!(log.finished.lock().is_empty());
    }
}
