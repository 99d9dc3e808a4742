// Copyright (c) the opaque-core authors.
//
// This source code is dual-licensed under either the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree or the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree. You may select, at your option, one of the above-listed
// licenses.

//! Cipher suite descriptors.
//!
//! A suite fixes the curve `G`, the hash `H`, and the key-stretching
//! function. Three suites are mandatory: [`P256Sha256`], [`P384Sha384`],
//! and [`P521Sha512`]. [`CipherSuiteId`] is the runtime-facing tagged enum
//! a deployment selecting a suite by name at runtime uses; each arm is backed
//! by one of the marker types below implementing [`CipherSuite`].

use crate::group::SuiteGroup;
use crate::hash_to_curve::ExpandHash;
use crate::ksf::Ksf;

/// The fixed bundle of primitives a deployment agrees on ahead of time:
/// group `G`, hash `H`, and key-stretching function.
///
/// Bundles what a real-world deployment fixes ahead of time: the OPRF and
/// AKE group, the hash, and the key-stretching function, collapsed to a
/// single `Group` because this design uses the same curve for the OPRF and
/// the AKE rather than allowing them to differ.
pub trait CipherSuite {
    /// The prime-order group used for both the OPRF and the 3DH AKE.
    type Group: SuiteGroup;
    /// The hash function `H`, also used as the OPRF/HKDF/HMAC hash.
    type Hash: ExpandHash;
    /// The key-stretching function applied client-side to the raw OPRF
    /// output before `HKDF-Extract`.
    type Ksf: Ksf<Self::Hash>;

    /// Context string suffix identifying this suite, e.g. `"P256-SHA256"`.
    const NAME: &'static str;
}

/// P-256 with SHA-256, using the given key-stretching function `K`.
pub struct P256Sha256<K>(core::marker::PhantomData<K>);

impl<K: Ksf<sha2::Sha256>> CipherSuite for P256Sha256<K> {
    type Group = p256::NistP256;
    type Hash = sha2::Sha256;
    type Ksf = K;
    const NAME: &'static str = "P256-SHA256";
}

/// P-384 with SHA-384, using the given key-stretching function `K`.
pub struct P384Sha384<K>(core::marker::PhantomData<K>);

impl<K: Ksf<sha2::Sha384>> CipherSuite for P384Sha384<K> {
    type Group = p384::NistP384;
    type Hash = sha2::Sha384;
    type Ksf = K;
    const NAME: &'static str = "P384-SHA384";
}

/// P-521 with SHA-512, using the given key-stretching function `K`.
pub struct P521Sha512<K>(core::marker::PhantomData<K>);

impl<K: Ksf<sha2::Sha512>> CipherSuite for P521Sha512<K> {
    type Group = p521::NistP521;
    type Hash = sha2::Sha512;
    type Ksf = K;
    const NAME: &'static str = "P521-SHA512";
}

/// Runtime-facing suite name, for deployments that select a suite from
/// configuration rather than at the type level.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum CipherSuiteId {
    /// P-256 / SHA-256.
    P256Sha256,
    /// P-384 / SHA-384.
    P384Sha384,
    /// P-521 / SHA-512.
    P521Sha512,
}

impl CipherSuiteId {
    /// Parses a suite name, rejecting anything not in the mandatory set,
    /// including an optional `RISTRETTO255-SHA512` suite this crate does not
    /// implement.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "P256-SHA256" => Some(Self::P256Sha256),
            "P384-SHA384" => Some(Self::P384Sha384),
            "P521-SHA512" => Some(Self::P521Sha512),
            _ => None,
        }
    }

    /// The canonical name for this suite, matching [`CipherSuite::NAME`].
    pub const fn name(self) -> &'static str {
        match self {
            Self::P256Sha256 => "P256-SHA256",
            Self::P384Sha384 => "P384-SHA384",
            Self::P521Sha512 => "P521-SHA512",
        }
    }
}
