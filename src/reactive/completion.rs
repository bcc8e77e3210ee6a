// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Terminal signal of a subscription.

/// How a publisher ended.
///
/// A completion is delivered at most once per subscription; nothing is
/// delivered after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Completion<E> {
    /// The publisher finished normally.
    Finished,
    /// The publisher terminated with an error.
    Failure(E),
}

impl<E> Completion<E> {
    /// Returns `true` for a normal completion.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Finished)
    }

    /// Returns the failure, if any.
    #[must_use]
    pub fn failure(&self) -> Option<&E> {
        match self {
            Self::Finished => None,
            Self::Failure(error) => Some(error),
        }
    }

    /// Converts into a `Result`, mapping `Finished` to `Ok(())`.
    ///
    /// # Errors
    ///
    /// Returns the failure carried by [`Completion::Failure`].
    pub fn into_result(self) -> Result<(), E> {
        match self {
            Self::Finished => Ok(()),
            Self::Failure(error) => Err(error),
        }
    }
}

impl<E> From<Result<(), E>> for Completion<E> {
    fn from(result: Result<(), E>) -> Self {
        match result {
            Ok(()) => Self::Finished,
            Err(error) => Self::Failure(error),
        }
    }
}
