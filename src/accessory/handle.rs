// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Platform handle for a live accessory.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque identity the platform assigns to an accessory it currently knows.
///
/// A descriptor carrying a handle is *bound*: it came from the platform and
/// can be configured directly. Descriptors built from plain values are
/// unbound and have to be resolved by MAC address first.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessoryHandle(Uuid);

impl AccessoryHandle {
    /// Creates a new unique handle.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a handle from an existing UUID.
    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for AccessoryHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for AccessoryHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Show only first 8 characters for readability
        let short = &self.0.to_string()[..8];
        write!(f, "AccessoryHandle({short}...)")
    }
}

impl fmt::Display for AccessoryHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for AccessoryHandle {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_are_unique() {
        assert_ne!(AccessoryHandle::new(), AccessoryHandle::new());
    }

    #[test]
    fn debug_is_shortened() {
        let uuid = Uuid::parse_str("67e55044-10b1-426f-9247-bb680e5fe0c8").unwrap();
        let handle = AccessoryHandle::from_uuid(uuid);
        assert_eq!(format!("{handle:?}"), "AccessoryHandle(67e55044...)");
        assert_eq!(handle.to_string(), "67e55044-10b1-426f-9247-bb680e5fe0c8");
    }

    #[test]
    fn serializes_as_plain_uuid() {
        let handle = AccessoryHandle::new();
        let json = serde_json::to_string(&handle).unwrap();
        assert_eq!(json, format!("\"{handle}\""));
        assert_eq!(serde_json::from_str::<AccessoryHandle>(&json).unwrap(), handle);
    }
}
