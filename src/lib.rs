// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `wac_accessory` - Reactive publishers for Wi-Fi accessory configuration.
//!
//! The host platform reports accessory discovery and configuration through a
//! delegate with callbacks. This library turns those callbacks into
//! demand-driven publishers:
//!
//! - Nothing happens on the platform until a subscriber requests values
//! - Values are buffered until the subscriber asks for them
//! - Completion, failure and cancellation flow between the two sides
//!
//! # Supported Features
//!
//! - **Discovery**: [`UnconfiguredAccessoryBrowser`] publishes batches of found
//!   and removed accessories, optionally filtered
//! - **Configuration**: [`ConfigurationPublisher`] configures one accessory and
//!   completes with the outcome
//! - **Type erasure**: [`BrowserPublisher`] and
//!   [`AnyPublisher`](reactive::AnyPublisher) hide concrete publisher types
//! - **Consumers**: closure sinks and an async receiver for tokio tasks
//! - **Testing**: [`InMemoryPlatform`](platform::InMemoryPlatform) plays the
//!   host without hardware
//!
//! # Quick Start
//!
//! ## Discover accessories
//!
//! ```
//! use std::sync::Arc;
//! use wac_accessory::platform::{BrowserState, InMemoryPlatform};
//! use wac_accessory::reactive::PublisherExt;
//! use wac_accessory::{BrowserEvent, UnconfiguredAccessory, UnconfiguredAccessoryBrowser};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let platform = InMemoryPlatform::new();
//!     let browser = UnconfiguredAccessoryBrowser::new(Arc::new(platform.clone()))
//!         .with_predicate(|acc| acc.manufacturer() == "Teufel");
//!     let mut events = browser.into_receiver();
//!
//!     platform.advertise([
//!         UnconfiguredAccessory::new("Cinebar", "00:11:22:33:44:55".parse()?)
//!             .with_manufacturer("Teufel"),
//!     ]);
//!
//!     // The first request starts the search, which reports known accessories.
//!     if let Some(Ok(BrowserEvent::Found(found))) = events.next().await {
//!         println!("found {} accessories", found.len());
//!     }
//!
//!     platform.broadcast_state(BrowserState::Stopped);
//!     assert!(events.next().await.is_none());
//!     Ok(())
//! }
//! ```
//!
//! ## Configure an accessory
//!
//! ```no_run
//! use std::sync::Arc;
//! use wac_accessory::configuration::ConfigurationOptions;
//! use wac_accessory::platform::{InMemoryPlatform, Presenter};
//! use wac_accessory::UnconfiguredAccessory;
//!
//! # async fn example() -> wac_accessory::Result<()> {
//! let platform = Arc::new(InMemoryPlatform::new());
//! let speaker = UnconfiguredAccessory::new("Cinebar", "00:11:22:33:44:55".parse()?);
//!
//! // Resolved by MAC address among the accessories the platform knows.
//! speaker
//!     .configure(platform, Presenter::detached())
//!     .wait(&ConfigurationOptions::default())
//!     .await?;
//! # Ok(())
//! # }
//! ```

mod accessory;
pub mod browser;
pub mod configuration;
pub mod error;
pub mod platform;
pub mod reactive;

pub use accessory::{AccessoryHandle, AccessoryProperties, MacAddress, UnconfiguredAccessory};
pub use browser::{BrowserEvent, BrowserPublisher, DiscoveryOptions, UnconfiguredAccessoryBrowser};
pub use configuration::{ConfigurationOptions, ConfigurationPublisher};
pub use error::{BrowserError, ConfigurationError, Error, Result, ValueError};
