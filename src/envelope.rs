// Copyright (c) the opaque-core authors.
//
// This source code is dual-licensed under either the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree or the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree. You may select, at your option, one of the above-listed
// licenses.

//! The envelope: store/recover and masking-key derivation.

use alloc::vec::Vec;

use elliptic_curve::hash2curve::FromOkm;
use elliptic_curve::Scalar;
use hkdf::Hkdf;
use hmac::{Hmac, Mac};
use rand::{CryptoRng, RngCore};
use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use crate::errors::Error;
use crate::keypair::{PrivateKey, PublicKey};
use crate::oprf;
use crate::suite::CipherSuite;

const NONCE_LEN: usize = 32;

/// Client and server identities bound into the envelope's cleartext.
/// When absent, each party's identity defaults to its own static public key.
#[derive(Clone, Copy, Debug, Default)]
pub struct Identifiers<'a> {
    /// The client's identity, or `None` to default to the client's public key.
    pub client: Option<&'a [u8]>,
    /// The server's identity, or `None` to default to the server's public key.
    pub server: Option<&'a [u8]>,
}

fn resolved_id<'a>(id: Option<&'a [u8]>, fallback_pk: &'a [u8]) -> &'a [u8] {
    id.unwrap_or(fallback_pk)
}

/// The server-stored `{nonce, authTag}` authenticator.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Envelope {
    pub(crate) nonce: [u8; NONCE_LEN],
    pub(crate) auth_tag: Vec<u8>,
}

impl Envelope {
    /// Serializes to `nonce || authTag` (`Nn + Nh` bytes).
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(NONCE_LEN + self.auth_tag.len());
        out.extend_from_slice(&self.nonce);
        out.extend_from_slice(&self.auth_tag);
        out
    }

    /// Deserializes `nonce || authTag`; `auth_tag_len` is `Nh` for the suite.
    pub fn deserialize(bytes: &[u8], auth_tag_len: usize) -> Result<Self, Error> {
        if bytes.len() != NONCE_LEN + auth_tag_len {
            return Err(Error::Invalid(crate::errors::InvalidInput::SliceLength));
        }
        let mut nonce = [0u8; NONCE_LEN];
        nonce.copy_from_slice(&bytes[..NONCE_LEN]);
        Ok(Self {
            nonce,
            auth_tag: bytes[NONCE_LEN..].to_vec(),
        })
    }

    /// An all-zero envelope used to fake a [`crate::messages::Ke2`]
    /// for an unregistered identifier (user-enumeration
    /// protection). Its `authTag` never validates.
    pub(crate) fn dummy(auth_tag_len: usize) -> Self {
        Self {
            nonce: [0u8; NONCE_LEN],
            auth_tag: alloc::vec![0u8; auth_tag_len],
        }
    }
}

fn cleartext(server_pk: &[u8], server_id: &[u8], client_id: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(server_pk.len() + 2 + server_id.len() + 2 + client_id.len());
    out.extend_from_slice(server_pk);
    out.extend_from_slice(&(server_id.len() as u16).to_be_bytes());
    out.extend_from_slice(server_id);
    out.extend_from_slice(&(client_id.len() as u16).to_be_bytes());
    out.extend_from_slice(client_id);
    out
}

/// `maskingKey = HKDF-Expand(randomizedPwd, "MaskingKey", Nh)`.
///
/// Independent of the envelope nonce, so the client can derive this before
/// it has unmasked the credential response and learned the nonce.
pub fn masking_key<CS: CipherSuite>(randomized_pwd: &Hkdf<CS::Hash>) -> Result<Vec<u8>, Error> {
    let hash_len = <CS::Hash as digest::Digest>::output_size();
    let mut masking_key = alloc::vec![0u8; hash_len];
    randomized_pwd.expand(b"MaskingKey", &mut masking_key)?;
    Ok(masking_key)
}

fn derived_keys<CS: CipherSuite>(
    randomized_pwd: &Hkdf<CS::Hash>,
    nonce: &[u8; NONCE_LEN],
) -> Result<(Vec<u8>, Vec<u8>, Vec<u8>, Vec<u8>), Error>
where
    Scalar<CS::Group>: FromOkm,
{
    let hash_len = <CS::Hash as digest::Digest>::output_size();

    let masking_key = masking_key::<CS>(randomized_pwd)?;

    let mut auth_key = alloc::vec![0u8; hash_len];
    randomized_pwd.expand_multi_info(&[nonce, b"AuthKey"], &mut auth_key)?;

    let mut export_key = alloc::vec![0u8; hash_len];
    randomized_pwd.expand_multi_info(&[nonce, b"ExportKey"], &mut export_key)?;

    let mut seed = alloc::vec![0u8; NONCE_LEN];
    randomized_pwd.expand_multi_info(&[nonce, b"PrivateKey"], &mut seed)?;

    Ok((masking_key, auth_key, export_key, seed))
}

/// `Envelope::store`: seals a fresh envelope for the client's (re-)derived
/// AKE key pair, returning the envelope, the client's public key, the
/// masking key, and the export key.
#[allow(clippy::type_complexity)]
pub fn store<CS, R>(
    rng: &mut R,
    randomized_pwd: &Hkdf<CS::Hash>,
    server_pk: &PublicKey<CS::Group>,
    ids: Identifiers<'_>,
) -> Result<(Envelope, PublicKey<CS::Group>, Vec<u8>, Vec<u8>), Error>
where
    CS: CipherSuite,
    Scalar<CS::Group>: FromOkm,
    R: RngCore + CryptoRng,
{
    let mut nonce = [0u8; NONCE_LEN];
    rng.fill_bytes(&mut nonce);

    let (masking_key, auth_key, export_key, seed) = derived_keys::<CS>(randomized_pwd, &nonce)?;

    let sk_u = oprf::derive_key_pair::<CS>(&seed, b"OPAQUE-DeriveDiffieHellmanKeyPair")?;
    let client_key = PrivateKey::<CS::Group>::from_scalar(sk_u);
    let client_pk_bytes = client_key.public_key().serialize();
    let server_pk_bytes = server_pk.serialize();

    let client_id = resolved_id(ids.client, &client_pk_bytes).to_vec();
    let server_id = resolved_id(ids.server, &server_pk_bytes).to_vec();

    let mut mac = Hmac::<CS::Hash>::new_from_slice(&auth_key)?;
    mac.update(&nonce);
    mac.update(&cleartext(&server_pk_bytes, &server_id, &client_id));
    let auth_tag = mac.finalize().into_bytes().to_vec();

    let mut seed_scrub = seed;
    seed_scrub.zeroize();

    Ok((
        Envelope { nonce, auth_tag },
        client_key.public_key().clone(),
        masking_key,
        export_key,
    ))
}

/// `Envelope::recover`: recovers the client's AKE key pair and export key,
/// verifying the auth tag in constant time. Any mismatch — wrong password,
/// tampered envelope, or wrong server key — reports the single generic
/// [`Error::Authentication`].
pub fn recover<CS>(
    randomized_pwd: &Hkdf<CS::Hash>,
    server_pk: &PublicKey<CS::Group>,
    ids: Identifiers<'_>,
    envelope: &Envelope,
) -> Result<(PrivateKey<CS::Group>, Vec<u8>), Error>
where
    CS: CipherSuite,
    Scalar<CS::Group>: FromOkm,
{
    let (_, auth_key, export_key, seed) = derived_keys::<CS>(randomized_pwd, &envelope.nonce)?;

    let sk_u = oprf::derive_key_pair::<CS>(&seed, b"OPAQUE-DeriveDiffieHellmanKeyPair")
        .map_err(|_| Error::Authentication)?;
    let client_key = PrivateKey::<CS::Group>::from_scalar(sk_u);
    let client_pk_bytes = client_key.public_key().serialize();
    let server_pk_bytes = server_pk.serialize();

    let client_id = resolved_id(ids.client, &client_pk_bytes).to_vec();
    let server_id = resolved_id(ids.server, &server_pk_bytes).to_vec();

    let mut mac =
        Hmac::<CS::Hash>::new_from_slice(&auth_key).map_err(|_| Error::Authentication)?;
    mac.update(&envelope.nonce);
    mac.update(&cleartext(&server_pk_bytes, &server_id, &client_id));
    let expected = mac.finalize().into_bytes();

    if expected.ct_eq(&envelope.auth_tag).unwrap_u8() != 1 {
        return Err(Error::Authentication);
    }

    let mut seed_scrub = seed;
    seed_scrub.zeroize();

    Ok((client_key, export_key))
}
