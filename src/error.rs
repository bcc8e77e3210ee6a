// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `wac_accessory` library.
//!
//! Each producer has its own closed failure set, delivered through the
//! completion channel of its subscription:
//!
//! - [`BrowserError`] for the accessory discovery stream
//! - [`ConfigurationError`] for the single-accessory configuration action
//!
//! [`Error`] wraps both for callers that await completions through the async
//! bridge, together with value validation failures and timeouts.

use std::time::Duration;

use thiserror::Error;

/// The main error type for this library.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// Error occurred during value validation.
    #[error("value error: {0}")]
    Value(#[from] ValueError),

    /// The discovery stream failed.
    #[error("browser error: {0}")]
    Browser(#[from] BrowserError),

    /// Configuring an accessory failed.
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// No completion arrived within the allotted time.
    #[error("no completion after {} ms", .0.as_millis())]
    Timeout(Duration),

    /// The subscription was torn down before it completed.
    #[error("subscription was cancelled before completion")]
    Cancelled,
}

/// Failures of the accessory discovery stream.
///
/// Every other terminal browser state completes the stream normally.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BrowserError {
    /// Wi-Fi is turned off or not available on this host, so the browser
    /// cannot search for accessories.
    #[error("wifi is unavailable")]
    WifiUnavailable,
}

/// The reason why configuring an accessory can be unsuccessful.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigurationError {
    /// User cancelled the process.
    #[error("configuration was cancelled by the user")]
    Cancelled,

    /// The process failed in any other way.
    #[error("configuration failed")]
    Failed,
}

/// Errors related to value validation and constraints.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// A MAC address string could not be parsed.
    #[error("invalid MAC address: {0}")]
    InvalidMacAddress(String),
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;
