// Copyright (c) the opaque-core authors.
//
// This source code is dual-licensed under either the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree or the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree. You may select, at your option, one of the above-listed
// licenses.

//! AKE and OPRF key pairs.

use alloc::vec::Vec;

use elliptic_curve::{ProjectivePoint, Scalar};
use rand::{CryptoRng, RngCore};
use zeroize::Zeroize;

use crate::errors::Error;
use crate::group::{self, SuiteGroup};

/// A public key: a compressed, non-identity, in-subgroup group element.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PublicKey<C: SuiteGroup>(pub(crate) ProjectivePoint<C>);

impl<C: SuiteGroup> PublicKey<C> {
    /// Serializes to `Npk` compressed bytes.
    pub fn serialize(&self) -> Vec<u8> {
        group::serialize_point::<C>(&self.0)
    }

    /// Deserializes and validates a compressed point.
    pub fn deserialize(bytes: &[u8]) -> Result<Self, Error> {
        Ok(Self(group::deserialize_point::<C>(bytes)?))
    }
}

/// A private scalar paired with its public point. Zeroized on drop.
pub struct PrivateKey<C: SuiteGroup> {
    scalar: Scalar<C>,
    public: PublicKey<C>,
}

impl<C: SuiteGroup> Drop for PrivateKey<C> {
    fn drop(&mut self) {
        self.scalar.zeroize();
    }
}

impl<C: SuiteGroup> PrivateKey<C> {
    /// Samples a fresh, uniformly random key pair.
    pub fn random<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        let scalar = group::random_scalar::<C, R>(rng);
        Self::from_scalar(scalar)
    }

    /// Builds a key pair from an already-sampled non-zero scalar, e.g. the
    /// output of [`crate::oprf::derive_key_pair`] or an envelope recovery.
    pub fn from_scalar(scalar: Scalar<C>) -> Self {
        let public = PublicKey(group::scalar_mul_generator::<C>(&scalar));
        Self { scalar, public }
    }

    /// Deserializes a raw scalar as a private key, rejecting zero and
    /// out-of-range encodings.
    pub fn deserialize(bytes: &[u8]) -> Result<Self, Error> {
        Ok(Self::from_scalar(group::deserialize_scalar::<C>(bytes)?))
    }

    /// Serializes the raw scalar to `Nsk` bytes.
    pub fn serialize(&self) -> Vec<u8> {
        group::serialize_scalar::<C>(&self.scalar)
    }

    /// The corresponding public key.
    pub fn public_key(&self) -> &PublicKey<C> {
        &self.public
    }

    /// `sk * peer_public`, a single Diffie-Hellman evaluation.
    pub fn diffie_hellman(&self, peer: &PublicKey<C>) -> ProjectivePoint<C> {
        group::scalar_mul::<C>(&self.scalar, &peer.0)
    }

    pub(crate) fn scalar(&self) -> &Scalar<C> {
        &self.scalar
    }
}
