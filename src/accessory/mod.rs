// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types describing unconfigured accessories.
//!
//! - [`UnconfiguredAccessory`] - Name, manufacturer, model, SSID, MAC and properties
//! - [`MacAddress`] - Hardware address used to resolve descriptors against the platform
//! - [`AccessoryProperties`] - Advertised capabilities
//! - [`AccessoryHandle`] - Identity of an accessory the platform currently knows

mod descriptor;
mod handle;
mod mac_address;

pub use descriptor::{AccessoryProperties, UnconfiguredAccessory};
pub use handle::AccessoryHandle;
pub use mac_address::MacAddress;
