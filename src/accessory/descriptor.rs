// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Description of an unconfigured accessory.

use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use super::{AccessoryHandle, MacAddress};

/// Capabilities an accessory advertises while it is unconfigured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccessoryProperties {
    /// The accessory supports `AirPlay`.
    pub supports_airplay: bool,
    /// The accessory supports `AirPrint`.
    pub supports_airprint: bool,
    /// The accessory supports `HomeKit`.
    pub supports_homekit: bool,
}

/// An accessory that is waiting to be joined to a Wi-Fi network.
///
/// # Equality
///
/// Two descriptors are equal when name, manufacturer, model, SSID, MAC
/// address and properties are equal. The platform handle takes no part in
/// `==` or in hashing, so a descriptor built from known values matches the
/// one the platform reports for the same device.
///
/// # Examples
///
/// ```
/// use wac_accessory::{AccessoryProperties, UnconfiguredAccessory};
///
/// let speaker = UnconfiguredAccessory::new("Living Room", "aa:bb:cc:dd:ee:ff".parse()?)
///     .with_manufacturer("Teufel")
///     .with_model("Cinebar")
///     .with_ssid("Teufel-Setup-EEFF")
///     .with_properties(AccessoryProperties {
///         supports_airplay: true,
///         ..AccessoryProperties::default()
///     });
///
/// assert!(!speaker.is_bound());
/// assert_eq!(speaker.mac_address().to_string(), "aa:bb:cc:dd:ee:ff");
/// # Ok::<(), wac_accessory::ValueError>(())
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnconfiguredAccessory {
    name: String,
    manufacturer: String,
    model: String,
    ssid: String,
    mac_address: MacAddress,
    properties: AccessoryProperties,
    #[serde(skip)]
    handle: Option<AccessoryHandle>,
}

impl UnconfiguredAccessory {
    /// Creates an unbound descriptor with empty manufacturer, model and SSID.
    #[must_use]
    pub fn new(name: impl Into<String>, mac_address: MacAddress) -> Self {
        Self {
            name: name.into(),
            manufacturer: String::new(),
            model: String::new(),
            ssid: String::new(),
            mac_address,
            properties: AccessoryProperties::default(),
            handle: None,
        }
    }

    /// Sets the manufacturer.
    #[must_use]
    pub fn with_manufacturer(mut self, manufacturer: impl Into<String>) -> Self {
        self.manufacturer = manufacturer.into();
        self
    }

    /// Sets the model name.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the SSID the accessory broadcasts while unconfigured.
    #[must_use]
    pub fn with_ssid(mut self, ssid: impl Into<String>) -> Self {
        self.ssid = ssid.into();
        self
    }

    /// Sets the advertised properties.
    #[must_use]
    pub fn with_properties(mut self, properties: AccessoryProperties) -> Self {
        self.properties = properties;
        self
    }

    /// Returns a copy bound to a live platform handle.
    #[must_use]
    pub fn bound_to(mut self, handle: AccessoryHandle) -> Self {
        self.handle = Some(handle);
        self
    }

    /// Returns a copy with the platform handle removed.
    #[must_use]
    pub fn unbound(mut self) -> Self {
        self.handle = None;
        self
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the manufacturer.
    #[must_use]
    pub fn manufacturer(&self) -> &str {
        &self.manufacturer
    }

    /// Returns the model name.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Returns the SSID.
    #[must_use]
    pub fn ssid(&self) -> &str {
        &self.ssid
    }

    /// Returns the MAC address.
    #[must_use]
    pub fn mac_address(&self) -> MacAddress {
        self.mac_address
    }

    /// Returns the advertised properties.
    #[must_use]
    pub fn properties(&self) -> AccessoryProperties {
        self.properties
    }

    /// Returns the platform handle, if bound.
    #[must_use]
    pub fn handle(&self) -> Option<AccessoryHandle> {
        self.handle
    }

    /// Returns `true` if this descriptor came from the platform.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.handle.is_some()
    }
}

impl PartialEq for UnconfiguredAccessory {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.manufacturer == other.manufacturer
            && self.model == other.model
            && self.ssid == other.ssid
            && self.mac_address == other.mac_address
            && self.properties == other.properties
    }
}

impl Eq for UnconfiguredAccessory {}

impl Hash for UnconfiguredAccessory {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.manufacturer.hash(state);
        self.model.hash(state);
        self.ssid.hash(state);
        self.mac_address.hash(state);
        self.properties.hash(state);
    }
}
