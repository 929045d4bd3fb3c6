// Copyright 2026 the Parallax Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors reported by hosts.

use thiserror::Error;

/// Why a host could not measure an element.
///
/// Measurement failures never abort an update: the tree logs the error and
/// continues with a zero-size box.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq, Hash)]
pub enum MeasureError {
    /// The element is no longer attached to the host's tree.
    #[error("element is detached")]
    Detached,
    /// The host does not know the element.
    #[error("unknown element")]
    Unknown,
}
