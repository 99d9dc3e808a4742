// Copyright (c) the opaque-core authors.
//
// This source code is dual-licensed under either the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree or the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree. You may select, at your option, one of the above-listed
// licenses.

//! The 3DH AKE: preamble assembly, key schedule, and MAC generation/
//! verification.

use alloc::vec::Vec;

use digest::Digest;
use elliptic_curve::ProjectivePoint;
use hkdf::Hkdf;
use hmac::{Hmac, Mac};
use subtle::ConstantTimeEq;

use crate::errors::Error;
use crate::group::{self, SuiteGroup};
use crate::hash_to_curve::ExpandHash;
use crate::suite::CipherSuite;

/// Assembles the length-prefixed preamble transcript:
///
/// ```text
/// "OPAQUEv1-" ||
///  I2OSP(|context|,2) || context ||
///  I2OSP(|clientId|,2) || clientId ||
///  KE1 ||
///  I2OSP(|serverId|,2) || serverId ||
///  evaluatedElement || maskingNonce || maskedResponse ||
///  serverNonce || serverEphPk
/// ```
#[allow(clippy::too_many_arguments)]
pub fn preamble(
    context: &[u8],
    client_id: &[u8],
    ke1: &[u8],
    server_id: &[u8],
    evaluated_element: &[u8],
    masking_nonce: &[u8],
    masked_response: &[u8],
    server_nonce: &[u8],
    server_eph_pk: &[u8],
) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(b"OPAQUEv1-");
    out.extend_from_slice(&(context.len() as u16).to_be_bytes());
    out.extend_from_slice(context);
    out.extend_from_slice(&(client_id.len() as u16).to_be_bytes());
    out.extend_from_slice(client_id);
    out.extend_from_slice(ke1);
    out.extend_from_slice(&(server_id.len() as u16).to_be_bytes());
    out.extend_from_slice(server_id);
    out.extend_from_slice(evaluated_element);
    out.extend_from_slice(masking_nonce);
    out.extend_from_slice(masked_response);
    out.extend_from_slice(server_nonce);
    out.extend_from_slice(server_eph_pk);
    out
}

/// `HKDF-Expand-Label(secret, label, ctx, len)`:
/// `info = I2OSP(len,2) || I2OSP(|"OPAQUE-"||label|,1) || "OPAQUE-" || label
///         || I2OSP(|ctx|,1) || ctx`.
pub fn expand_label<H: ExpandHash>(
    secret: &Hkdf<H>,
    label: &[u8],
    context: &[u8],
    len: usize,
) -> Result<Vec<u8>, Error> {
    let mut full_label = Vec::with_capacity(7 + label.len());
    full_label.extend_from_slice(b"OPAQUE-");
    full_label.extend_from_slice(label);

    let mut info = Vec::with_capacity(2 + 1 + full_label.len() + 1 + context.len());
    info.extend_from_slice(&(len as u16).to_be_bytes());
    info.push(full_label.len() as u8);
    info.extend_from_slice(&full_label);
    info.push(context.len() as u8);
    info.extend_from_slice(context);

    let mut out = alloc::vec![0u8; len];
    secret.expand(&info, &mut out)?;
    Ok(out)
}

/// The key schedule's four derived secrets: `handshakeSecret`,
/// `sessionKey`, `km2` (server MAC key), `km3` (client MAC key).
pub struct KeySchedule {
    pub session_key: Vec<u8>,
    pub km2: Vec<u8>,
    pub km3: Vec<u8>,
}

/// Runs the key schedule over `ikm = dh1 || dh2 || dh3` and the preamble
/// hash `ph = H(preamble)`.
pub fn key_schedule<CS: CipherSuite>(ikm: &[u8], preamble_bytes: &[u8]) -> Result<KeySchedule, Error> {
    let hash_len = <CS::Hash as Digest>::output_size();
    let ph = CS::Hash::digest(preamble_bytes);

    let prk = Hkdf::<CS::Hash>::new(None, ikm);
    let handshake_secret_bytes = expand_label(&prk, b"HandshakeSecret", &ph, hash_len)?;
    let session_key = expand_label(&prk, b"SessionKey", &ph, hash_len)?;

    let handshake_secret = Hkdf::<CS::Hash>::from_prk(&handshake_secret_bytes)
        .map_err(|_| Error::Internal(crate::errors::InternalError::HkdfLengthInvalid))?;
    let km2 = expand_label(&handshake_secret, b"ServerMAC", b"", hash_len)?;
    let km3 = expand_label(&handshake_secret, b"ClientMAC", b"", hash_len)?;

    Ok(KeySchedule {
        session_key,
        km2,
        km3,
    })
}

/// `HMAC(key, message)`.
pub fn mac<H: ExpandHash>(key: &[u8], message: &[u8]) -> Result<Vec<u8>, Error> {
    let mut m = Hmac::<H>::new_from_slice(key)?;
    m.update(message);
    Ok(m.finalize().into_bytes().to_vec())
}

/// Constant-time MAC verification.
pub fn verify_mac(expected: &[u8], received: &[u8]) -> bool {
    expected.ct_eq(received).unwrap_u8() == 1
}

/// `dh1, dh2, dh3`, the three Diffie-Hellman evaluations that give 3DH its
/// name, serialized to fixed-width compressed points for the key schedule.
pub fn concat_dh<C: SuiteGroup>(
    dh1: &ProjectivePoint<C>,
    dh2: &ProjectivePoint<C>,
    dh3: &ProjectivePoint<C>,
) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&group::serialize_point::<C>(dh1));
    out.extend_from_slice(&group::serialize_point::<C>(dh2));
    out.extend_from_slice(&group::serialize_point::<C>(dh3));
    out
}

/// Derives the XOR pad used to mask `serverPk || envelope` in a
/// [`crate::messages::Ke2`]:
/// `HKDF-Expand(maskingKey, maskingNonce || "CredentialResponsePad", len)`.
pub fn masking_pad<H: ExpandHash>(
    masking_key: &[u8],
    masking_nonce: &[u8],
    len: usize,
) -> Result<Vec<u8>, Error> {
    let hk = Hkdf::<H>::from_prk(masking_key)
        .map_err(|_| Error::Internal(crate::errors::InternalError::HkdfLengthInvalid))?;
    let mut info = Vec::with_capacity(masking_nonce.len() + 24);
    info.extend_from_slice(masking_nonce);
    info.extend_from_slice(b"CredentialResponsePad");
    let mut out = alloc::vec![0u8; len];
    hk.expand(&info, &mut out)?;
    Ok(out)
}

/// XORs `data` with a pad of the same length, in place.
pub fn xor_in_place(data: &mut [u8], pad: &[u8]) {
    for (d, p) in data.iter_mut().zip(pad.iter()) {
        *d ^= p;
    }
}
