// Copyright (c) the opaque-core authors.
//
// This source code is dual-licensed under either the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree or the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree. You may select, at your option, one of the above-listed
// licenses.

//! Error types returned at the crate boundary.
//!
//! The taxonomy follows four kinds: invalid input, authentication failure,
//! resource exhaustion, and internal error. Every sub-step that can fail for
//! a password- or transcript-related reason collapses onto the single
//! [`Error::Authentication`] variant so that no caller can distinguish a
//! wrong password from an unregistered identifier from a tampered message.

use displaydoc::Display;

/// Top-level error returned by every fallible operation in this crate.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum Error {
    /// invalid input: {0}
    Invalid(InvalidInput),
    /// authentication failed
    Authentication,
    /// resource exhausted: {0}
    ResourceExhausted(ResourceExhausted),
    /// internal error: {0}
    Internal(InternalError),
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Malformed or structurally invalid caller input.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum InvalidInput {
    /// byte slice has the wrong length
    SliceLength,
    /// point is the identity element
    IdentityElement,
    /// point is not on the curve or not in the prime-order subgroup
    PointNotOnCurve,
    /// scalar is zero
    ZeroScalar,
    /// scalar is out of range for the group order
    ScalarOutOfRange,
    /// unrecognized or unsupported cipher suite name
    UnknownSuite,
    /// deployment `context` string must be non-empty
    EmptyContext,
}

/// A capacity limit imposed by an external collaborator was reached.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum ResourceExhausted {
    /// the pending-session store is at capacity
    SessionStoreFull,
}

/// A failure that should never occur given a correctly configured runtime.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum InternalError {
    /// HKDF output length exceeds the hash's maximum expansion
    HkdfLengthInvalid,
    /// HMAC could not be initialized from the given key length
    HmacKeyInvalid,
    /// the random byte source failed
    RngFailure,
    /// `derive_key_pair` failed to produce a non-zero scalar after 256 tries
    DeriveKeyPairExhausted,
}

impl From<hkdf::InvalidLength> for Error {
    fn from(_: hkdf::InvalidLength) -> Self {
        Error::Internal(InternalError::HkdfLengthInvalid)
    }
}

impl From<hmac::digest::InvalidLength> for Error {
    fn from(_: hmac::digest::InvalidLength) -> Self {
        Error::Internal(InternalError::HmacKeyInvalid)
    }
}
