// Copyright (c) the opaque-core authors.
//
// This source code is dual-licensed under either the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree or the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree. You may select, at your option, one of the above-listed
// licenses.

//! The Oblivious Pseudorandom Function (RFC 9497 base mode).

use alloc::vec::Vec;

use digest::Digest;
use elliptic_curve::hash2curve::FromOkm;
use elliptic_curve::{ProjectivePoint, Scalar};
use rand::{CryptoRng, RngCore};
use zeroize::Zeroize;

use crate::errors::{Error, InternalError};
use crate::group::{self, SuiteGroup};
use crate::hash_to_curve::ExpandHash;
use crate::suite::CipherSuite;

/// The suite's context string: `"OPRFV1-" || 0x00 || "-" || suiteName`.
///
/// The `0x00` byte at offset 7 is load-bearing: it is the
/// mode byte for the base (non-verifiable) OPRF mode.
pub(crate) fn context_string<CS: CipherSuite>() -> Vec<u8> {
    let mut ctx = Vec::with_capacity(8 + CS::NAME.len() + 1);
    ctx.extend_from_slice(b"OPRFV1-");
    ctx.push(0x00);
    ctx.push(b'-');
    ctx.extend_from_slice(CS::NAME.as_bytes());
    ctx
}

pub(crate) fn hash_to_group_dst<CS: CipherSuite>() -> Vec<u8> {
    [b"HashToGroup-".as_slice(), &context_string::<CS>()].concat()
}

pub(crate) fn hash_to_scalar_dst<CS: CipherSuite>() -> Vec<u8> {
    [b"HashToScalar-".as_slice(), &context_string::<CS>()].concat()
}

pub(crate) fn derive_key_pair_dst<CS: CipherSuite>() -> Vec<u8> {
    // No dash between the label and the context string — a deliberate
    // deviation from the other two DSTs.
    [b"DeriveKeyPair".as_slice(), &context_string::<CS>()].concat()
}

/// The client's blind: a secret scalar kept until `finalize`, and the
/// blinded element sent to the server. Zeroized on drop.
pub struct Blind<CS: CipherSuite> {
    r: Scalar<CS::Group>,
}

impl<CS: CipherSuite> Drop for Blind<CS> {
    fn drop(&mut self) {
        self.r.zeroize();
    }
}

/// `blind(input) -> (blind, blinded_element)`.
pub fn blind<CS, R>(
    rng: &mut R,
    input: &[u8],
) -> Result<(Blind<CS>, ProjectivePoint<CS::Group>), Error>
where
    CS: CipherSuite,
    Scalar<CS::Group>: FromOkm,
    R: RngCore + CryptoRng,
{
    let r = group::random_scalar::<CS::Group, R>(rng);
    let p = group::hash_to_group::<CS::Group, CS::Hash>(input, &hash_to_group_dst::<CS>())?;
    let blinded = group::scalar_mul::<CS::Group>(&r, &p);
    Ok((Blind { r }, blinded))
}

/// `evaluate(skS, blinded_element) -> skS * blinded_element`. The blinded
/// element must already have been validated by
/// [`crate::group::deserialize_point`].
pub fn evaluate<CS: CipherSuite>(
    sk_s: &Scalar<CS::Group>,
    blinded_element: &ProjectivePoint<CS::Group>,
) -> ProjectivePoint<CS::Group> {
    group::scalar_mul::<CS::Group>(sk_s, blinded_element)
}

/// `finalize(input, blind, evaluated_element) -> Nh` bytes.
pub fn finalize<CS: CipherSuite>(
    input: &[u8],
    blind: &Blind<CS>,
    evaluated_element: &ProjectivePoint<CS::Group>,
) -> Result<Vec<u8>, Error> {
    let inverted = group::invert_scalar::<CS::Group>(&blind.r);
    let unblinded = group::scalar_mul::<CS::Group>(&inverted, evaluated_element);
    let unblinded_bytes = group::serialize_point::<CS::Group>(&unblinded);

    let mut hasher = CS::Hash::new();
    hasher.update((input.len() as u16).to_be_bytes());
    hasher.update(input);
    hasher.update((unblinded_bytes.len() as u16).to_be_bytes());
    hasher.update(&unblinded_bytes);
    hasher.update(b"Finalize");
    Ok(hasher.finalize().to_vec())
}

/// `derive_key_pair(seed, info) -> skS != 0`.
///
/// Loops with a one-byte counter appended to
/// `seed || I2OSP(|info|, 2) || info`, hashing to a scalar under the
/// `DeriveKeyPair` DST. Fails after 256 iterations, which RFC 9497 notes is
/// never observed in practice.
pub fn derive_key_pair<CS>(seed: &[u8], info: &[u8]) -> Result<Scalar<CS::Group>, Error>
where
    CS: CipherSuite,
    Scalar<CS::Group>: FromOkm,
{
    let dst = derive_key_pair_dst::<CS>();
    let mut deriver = Vec::with_capacity(seed.len() + 2 + info.len() + 1);
    deriver.extend_from_slice(seed);
    deriver.extend_from_slice(&(info.len() as u16).to_be_bytes());
    deriver.extend_from_slice(info);
    deriver.push(0);

    for counter in 0u16..256 {
        *deriver.last_mut().expect("counter byte pushed above") = counter as u8;
        if let Ok(scalar) = group::hash_to_scalar::<CS::Group, CS::Hash>(&deriver, &dst) {
            return Ok(scalar);
        }
    }
    Err(Error::Internal(InternalError::DeriveKeyPairExhausted))
}

/// Deserializes, validates, and evaluates a blinded element in one step —
/// the shape the server-side handshake needs.
pub fn evaluate_serialized<CS: CipherSuite>(
    sk_s: &Scalar<CS::Group>,
    blinded_element: &[u8],
) -> Result<ProjectivePoint<CS::Group>, Error> {
    let point = group::deserialize_point::<CS::Group>(blinded_element)?;
    Ok(evaluate::<CS>(sk_s, &point))
}
