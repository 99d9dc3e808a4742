// Copyright (c) the opaque-core authors.
//
// This source code is dual-licensed under either the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree or the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree. You may select, at your option, one of the above-listed
// licenses.

//! Wire formats for the registration and authentication messages: fixed
//! concatenations with no length prefixes except where the preamble needs
//! one to disambiguate variable-length identities.
//!
//! Every message here is a flat `Vec<u8>` concatenation rather than a
//! type-level-sized `GenericArray<u8, Sum<...>>` field layout — the field
//! widths are recovered at parse time from the cipher suite's sizes instead
//! of being encoded in the type system.

use alloc::vec::Vec;

use digest::Digest;
use elliptic_curve::ProjectivePoint;

use crate::errors::{Error, InvalidInput};
use crate::group;
use crate::keypair::PublicKey;
use crate::suite::CipherSuite;

fn split_at<'a>(bytes: &'a [u8], len: usize, out: &mut &'a [u8]) -> Result<&'a [u8], Error> {
    if bytes.len() < len {
        return Err(Error::Invalid(InvalidInput::SliceLength));
    }
    let (head, tail) = bytes.split_at(len);
    *out = tail;
    Ok(head)
}

/// `createRegistrationRequest` output: `blindedElement(Npk)`.
pub struct RegistrationRequest<CS: CipherSuite> {
    pub blinded_element: ProjectivePoint<CS::Group>,
}

impl<CS: CipherSuite> RegistrationRequest<CS> {
    pub fn serialize(&self) -> Vec<u8> {
        group::serialize_point::<CS::Group>(&self.blinded_element)
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() != group::element_len::<CS::Group>() {
            return Err(Error::Invalid(InvalidInput::SliceLength));
        }
        Ok(Self {
            blinded_element: group::deserialize_point::<CS::Group>(bytes)?,
        })
    }
}

/// `createRegistrationResponse` output: `evaluatedElement(Npk) || serverPublicKey(Npk)`.
pub struct RegistrationResponse<CS: CipherSuite> {
    pub evaluated_element: ProjectivePoint<CS::Group>,
    pub server_public_key: PublicKey<CS::Group>,
}

impl<CS: CipherSuite> RegistrationResponse<CS> {
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = group::serialize_point::<CS::Group>(&self.evaluated_element);
        out.extend_from_slice(&self.server_public_key.serialize());
        out
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Self, Error> {
        let npk = group::element_len::<CS::Group>();
        if bytes.len() != 2 * npk {
            return Err(Error::Invalid(InvalidInput::SliceLength));
        }
        let mut rest = bytes;
        let evaluated_element =
            group::deserialize_point::<CS::Group>(split_at(rest, npk, &mut rest)?)?;
        let server_public_key = PublicKey::<CS::Group>::deserialize(split_at(rest, npk, &mut rest)?)?;
        Ok(Self {
            evaluated_element,
            server_public_key,
        })
    }
}

/// The persisted `RegistrationRecord` and the wire message
/// `finalizeRegistration` sends to the server to produce one:
/// `clientPk(Npk) || maskingKey(Nh) || envelope(Nn+Nh)`.
pub struct RegistrationRecord<CS: CipherSuite> {
    pub client_public_key: PublicKey<CS::Group>,
    pub masking_key: Vec<u8>,
    pub envelope: crate::envelope::Envelope,
}

impl<CS: CipherSuite> RegistrationRecord<CS> {
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = self.client_public_key.serialize();
        out.extend_from_slice(&self.masking_key);
        out.extend_from_slice(&self.envelope.serialize());
        out
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Self, Error> {
        let npk = group::element_len::<CS::Group>();
        let nh = <CS::Hash as Digest>::output_size();
        if bytes.len() != npk + nh + (32 + nh) {
            return Err(Error::Invalid(InvalidInput::SliceLength));
        }
        let mut rest = bytes;
        let client_public_key = PublicKey::<CS::Group>::deserialize(split_at(rest, npk, &mut rest)?)?;
        let masking_key = split_at(rest, nh, &mut rest)?.to_vec();
        let envelope = crate::envelope::Envelope::deserialize(split_at(rest, 32 + nh, &mut rest)?, nh)?;
        Ok(Self {
            client_public_key,
            masking_key,
            envelope,
        })
    }
}

/// `KE1 = blindedElement(Npk) || clientNonce(Nn) || clientEphPk(Npk)`.
pub struct Ke1<CS: CipherSuite> {
    pub blinded_element: ProjectivePoint<CS::Group>,
    pub client_nonce: [u8; 32],
    pub client_eph_pk: PublicKey<CS::Group>,
}

impl<CS: CipherSuite> Ke1<CS> {
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = group::serialize_point::<CS::Group>(&self.blinded_element);
        out.extend_from_slice(&self.client_nonce);
        out.extend_from_slice(&self.client_eph_pk.serialize());
        out
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Self, Error> {
        let npk = group::element_len::<CS::Group>();
        if bytes.len() != npk + 32 + npk {
            return Err(Error::Invalid(InvalidInput::SliceLength));
        }
        let mut rest = bytes;
        let blinded_element =
            group::deserialize_point::<CS::Group>(split_at(rest, npk, &mut rest)?)?;
        let mut client_nonce = [0u8; 32];
        client_nonce.copy_from_slice(split_at(rest, 32, &mut rest)?);
        let client_eph_pk = PublicKey::<CS::Group>::deserialize(split_at(rest, npk, &mut rest)?)?;
        Ok(Self {
            blinded_element,
            client_nonce,
            client_eph_pk,
        })
    }
}

/// `KE2 = evaluatedElement(Npk) || maskingNonce(Nn) || maskedResponse(Npk+Nn+Nh)
///        || serverNonce(Nn) || serverEphPk(Npk) || serverMac(Nh)`.
pub struct Ke2<CS: CipherSuite> {
    pub evaluated_element: ProjectivePoint<CS::Group>,
    pub masking_nonce: [u8; 32],
    pub masked_response: Vec<u8>,
    pub server_nonce: [u8; 32],
    pub server_eph_pk: PublicKey<CS::Group>,
    pub server_mac: Vec<u8>,
}

impl<CS: CipherSuite> Ke2<CS> {
    /// Length of `maskedResponse`: `Npk + Nn + Nh`.
    pub fn masked_response_len() -> usize {
        group::element_len::<CS::Group>() + 32 + <CS::Hash as Digest>::output_size()
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut out = group::serialize_point::<CS::Group>(&self.evaluated_element);
        out.extend_from_slice(&self.masking_nonce);
        out.extend_from_slice(&self.masked_response);
        out.extend_from_slice(&self.server_nonce);
        out.extend_from_slice(&self.server_eph_pk.serialize());
        out.extend_from_slice(&self.server_mac);
        out
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Self, Error> {
        let npk = group::element_len::<CS::Group>();
        let nh = <CS::Hash as Digest>::output_size();
        let masked_len = Self::masked_response_len();
        if bytes.len() != npk + 32 + masked_len + 32 + npk + nh {
            return Err(Error::Invalid(InvalidInput::SliceLength));
        }
        let mut rest = bytes;
        let evaluated_element =
            group::deserialize_point::<CS::Group>(split_at(rest, npk, &mut rest)?)?;
        let mut masking_nonce = [0u8; 32];
        masking_nonce.copy_from_slice(split_at(rest, 32, &mut rest)?);
        let masked_response = split_at(rest, masked_len, &mut rest)?.to_vec();
        let mut server_nonce = [0u8; 32];
        server_nonce.copy_from_slice(split_at(rest, 32, &mut rest)?);
        let server_eph_pk = PublicKey::<CS::Group>::deserialize(split_at(rest, npk, &mut rest)?)?;
        let server_mac = split_at(rest, nh, &mut rest)?.to_vec();
        Ok(Self {
            evaluated_element,
            masking_nonce,
            masked_response,
            server_nonce,
            server_eph_pk,
            server_mac,
        })
    }
}

/// `KE3 = clientMac(Nh)`.
pub struct Ke3<CS: CipherSuite> {
    pub client_mac: Vec<u8>,
    _marker: core::marker::PhantomData<CS>,
}

impl<CS: CipherSuite> Ke3<CS> {
    pub fn new(client_mac: Vec<u8>) -> Self {
        Self {
            client_mac,
            _marker: core::marker::PhantomData,
        }
    }

    pub fn serialize(&self) -> Vec<u8> {
        self.client_mac.clone()
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() != <CS::Hash as Digest>::output_size() {
            return Err(Error::Invalid(InvalidInput::SliceLength));
        }
        Ok(Self::new(bytes.to_vec()))
    }
}
