// Copyright (c) the opaque-core authors.
//
// This source code is dual-licensed under either the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree or the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree. You may select, at your option, one of the above-listed
// licenses.

//! Registration and authentication orchestration.
//!
//! Ties the curve adapter, OPRF, envelope, and AKE layers into the six
//! public operations a deployment calls: `createRegistrationRequest`,
//! `createRegistrationResponse`, `finalizeRegistration`, `generateKE1`,
//! `generateKE2`, `generateKE3`, and `serverFinish`.

use alloc::vec::Vec;

use digest::Digest;
use elliptic_curve::hash2curve::FromOkm;
use elliptic_curve::Scalar;
use hkdf::Hkdf;
use rand::{CryptoRng, RngCore};
use zeroize::Zeroize;

use crate::ake;
use crate::envelope::{self, Envelope, Identifiers};
use crate::errors::{Error, InvalidInput};
use crate::group;
use crate::keypair::{PrivateKey, PublicKey};
use crate::ksf::Ksf;
use crate::messages::{Ke1, Ke2, Ke3, RegistrationRecord, RegistrationRequest, RegistrationResponse};
use crate::oprf;
use crate::suite::CipherSuite;

fn randomized_pwd<CS: CipherSuite>(oprf_output: &[u8]) -> Result<Hkdf<CS::Hash>, Error> {
    let stretched = CS::Ksf::stretch(oprf_output)?;
    let mut ikm = Vec::with_capacity(oprf_output.len() + stretched.len());
    ikm.extend_from_slice(oprf_output);
    ikm.extend_from_slice(&stretched);
    Ok(Hkdf::<CS::Hash>::new(None, &ikm))
}

fn derive_oprf_key<CS>(oprf_seed: &[u8], credential_id: &[u8]) -> Result<Scalar<CS::Group>, Error>
where
    CS: CipherSuite,
    Scalar<CS::Group>: FromOkm,
{
    let mut info = credential_id.to_vec();
    info.extend_from_slice(b"OprfKey");
    oprf::derive_key_pair::<CS>(oprf_seed, &info)
}

/// A server's long-term identity: its static AKE key pair and the seed
/// from which per-credential OPRF keys are derived.
pub struct ServerSetup<CS: CipherSuite> {
    ake_keypair: PrivateKey<CS::Group>,
    oprf_seed: Vec<u8>,
    context: Vec<u8>,
}

impl<CS: CipherSuite> ServerSetup<CS> {
    /// Samples a fresh long-term key pair and OPRF seed. The deployment is
    /// responsible for persisting both; see [`Self::from_parts`] to restore
    /// a previously-sampled setup.
    pub fn new<R: RngCore + CryptoRng>(rng: &mut R, context: &[u8]) -> Result<Self, Error> {
        if context.is_empty() {
            return Err(Error::Invalid(InvalidInput::EmptyContext));
        }
        let mut oprf_seed = alloc::vec![0u8; <CS::Hash as Digest>::output_size()];
        rng.fill_bytes(&mut oprf_seed);
        Ok(Self {
            ake_keypair: PrivateKey::random(rng),
            oprf_seed,
            context: context.to_vec(),
        })
    }

    /// Restores a setup from a previously-persisted key pair and OPRF seed.
    pub fn from_parts(
        ake_keypair: PrivateKey<CS::Group>,
        oprf_seed: Vec<u8>,
        context: &[u8],
    ) -> Result<Self, Error> {
        if context.is_empty() {
            return Err(Error::Invalid(InvalidInput::EmptyContext));
        }
        if oprf_seed.len() != <CS::Hash as Digest>::output_size() {
            return Err(Error::Invalid(InvalidInput::SliceLength));
        }
        Ok(Self {
            ake_keypair,
            oprf_seed,
            context: context.to_vec(),
        })
    }

    /// The server's long-term AKE public key.
    pub fn public_key(&self) -> &PublicKey<CS::Group> {
        self.ake_keypair.public_key()
    }
}

/// Transient client-side registration state. Scrubs the password and
/// blind scalar on drop.
pub struct ClientRegistrationState<CS: CipherSuite> {
    password: Vec<u8>,
    blind: oprf::Blind<CS>,
}

impl<CS: CipherSuite> Drop for ClientRegistrationState<CS> {
    fn drop(&mut self) {
        self.password.zeroize();
    }
}

impl<CS> ClientRegistrationState<CS>
where
    CS: CipherSuite,
    Scalar<CS::Group>: FromOkm,
{
    /// `createRegistrationRequest(password)`.
    pub fn start<R: RngCore + CryptoRng>(
        rng: &mut R,
        password: &[u8],
    ) -> Result<(Self, RegistrationRequest<CS>), Error> {
        let (blind, blinded_element) = oprf::blind::<CS, R>(rng, password)?;
        let state = Self {
            password: password.to_vec(),
            blind,
        };
        Ok((state, RegistrationRequest { blinded_element }))
    }

    /// `finalizeRegistration(state, response, serverId?, clientId?)`,
    /// returning the record to persist and the caller's export key.
    pub fn finish<R: RngCore + CryptoRng>(
        self,
        rng: &mut R,
        response: &RegistrationResponse<CS>,
        ids: Identifiers<'_>,
    ) -> Result<(RegistrationRecord<CS>, Vec<u8>), Error> {
        let oprf_output = oprf::finalize::<CS>(&self.password, &self.blind, &response.evaluated_element)?;
        let randomized_pwd = randomized_pwd::<CS>(&oprf_output)?;

        let (envelope, client_public_key, masking_key, export_key) =
            envelope::store::<CS, R>(rng, &randomized_pwd, &response.server_public_key, ids)?;

        Ok((
            RegistrationRecord {
                client_public_key,
                masking_key,
                envelope,
            },
            export_key,
        ))
    }
}

/// `createRegistrationResponse(request, credentialId)`: stateless, server-side.
pub fn create_registration_response<CS>(
    setup: &ServerSetup<CS>,
    request: &RegistrationRequest<CS>,
    credential_id: &[u8],
) -> Result<RegistrationResponse<CS>, Error>
where
    CS: CipherSuite,
    Scalar<CS::Group>: FromOkm,
{
    let oprf_key = derive_oprf_key::<CS>(&setup.oprf_seed, credential_id)?;
    let evaluated_element = oprf::evaluate::<CS>(&oprf_key, &request.blinded_element);
    Ok(RegistrationResponse {
        evaluated_element,
        server_public_key: setup.public_key().clone(),
    })
}

/// Transient client-side authentication state. Scrubs the password and
/// ephemeral key pair on drop.
pub struct ClientAuthState<CS: CipherSuite> {
    password: Vec<u8>,
    blind: oprf::Blind<CS>,
    client_eph_sk: PrivateKey<CS::Group>,
    ke1_bytes: Vec<u8>,
}

impl<CS: CipherSuite> Drop for ClientAuthState<CS> {
    fn drop(&mut self) {
        self.password.zeroize();
    }
}

impl<CS> ClientAuthState<CS>
where
    CS: CipherSuite,
    Scalar<CS::Group>: FromOkm,
{
    /// `generateKE1(password)`.
    pub fn start<R: RngCore + CryptoRng>(
        rng: &mut R,
        password: &[u8],
    ) -> Result<(Self, Ke1<CS>), Error> {
        let (blind, blinded_element) = oprf::blind::<CS, R>(rng, password)?;
        let client_eph_sk = PrivateKey::<CS::Group>::random(rng);
        let mut client_nonce = [0u8; 32];
        rng.fill_bytes(&mut client_nonce);

        let ke1 = Ke1 {
            blinded_element,
            client_nonce,
            client_eph_pk: client_eph_sk.public_key().clone(),
        };
        let ke1_bytes = ke1.serialize();

        Ok((
            Self {
                password: password.to_vec(),
                blind,
                client_eph_sk,
                ke1_bytes,
            },
            ke1,
        ))
    }

    /// `generateKE3(state, clientId?, serverId?, KE2)`, returning `KE3`, the
    /// session key, and the export key. Every failure path — wrong
    /// password, tampered KE2, server impersonation — reports the single
    /// generic [`Error::Authentication`].
    pub fn finish(
        self,
        context: &[u8],
        ke2: &Ke2<CS>,
        ids: Identifiers<'_>,
    ) -> Result<(Ke3<CS>, Vec<u8>, Vec<u8>), Error> {
        let oprf_output = oprf::finalize::<CS>(&self.password, &self.blind, &ke2.evaluated_element)
            .map_err(|_| Error::Authentication)?;
        let randomized_pwd = randomized_pwd::<CS>(&oprf_output)?;

        let masking_key = envelope::masking_key::<CS>(&randomized_pwd)?;
        let pad = ake::masking_pad::<CS::Hash>(&masking_key, &ke2.masking_nonce, ke2.masked_response.len())?;
        let mut unmasked = ke2.masked_response.clone();
        ake::xor_in_place(&mut unmasked, &pad);

        let npk = group::element_len::<CS::Group>();
        if unmasked.len() < npk {
            return Err(Error::Authentication);
        }
        let server_public_key =
            PublicKey::<CS::Group>::deserialize(&unmasked[..npk]).map_err(|_| Error::Authentication)?;
        let envelope = Envelope::deserialize(&unmasked[npk..], <CS::Hash as Digest>::output_size())
            .map_err(|_| Error::Authentication)?;

        let (client_ake_sk, export_key) =
            envelope::recover::<CS>(&randomized_pwd, &server_public_key, ids, &envelope)?;

        let client_pk_bytes = client_ake_sk.public_key().serialize();
        let server_pk_bytes = server_public_key.serialize();
        let client_id = ids.client.unwrap_or(&client_pk_bytes).to_vec();
        let server_id = ids.server.unwrap_or(&server_pk_bytes).to_vec();

        let evaluated_element_bytes = group::serialize_point::<CS::Group>(&ke2.evaluated_element);
        let preamble = ake::preamble(
            context,
            &client_id,
            &self.ke1_bytes,
            &server_id,
            &evaluated_element_bytes,
            &ke2.masking_nonce,
            &ke2.masked_response,
            &ke2.server_nonce,
            &ke2.server_eph_pk.serialize(),
        );

        let dh1 = self.client_eph_sk.diffie_hellman(&ke2.server_eph_pk);
        let dh2 = self.client_eph_sk.diffie_hellman(&server_public_key);
        let dh3 = client_ake_sk.diffie_hellman(&ke2.server_eph_pk);
        let ikm = ake::concat_dh::<CS::Group>(&dh1, &dh2, &dh3);

        let schedule = ake::key_schedule::<CS>(&ikm, &preamble)?;
        let ph = CS::Hash::digest(&preamble);
        let expected_server_mac = ake::mac::<CS::Hash>(&schedule.km2, &ph)?;
        if !ake::verify_mac(&expected_server_mac, &ke2.server_mac) {
            return Err(Error::Authentication);
        }

        let mut transcript = preamble;
        transcript.extend_from_slice(&ke2.server_mac);
        let transcript_hash = CS::Hash::digest(&transcript);
        let client_mac = ake::mac::<CS::Hash>(&schedule.km3, &transcript_hash)?;

        Ok((Ke3::new(client_mac), schedule.session_key, export_key))
    }
}

/// Expected client MAC and session key stashed by `generateKE2`, indexed by
/// an opaque token supplied by the external session store. Scrubbed on drop.
pub struct ServerAuthState {
    expected_client_mac: Vec<u8>,
    session_key: Vec<u8>,
    credential_id: Vec<u8>,
}

impl ServerAuthState {
    /// The credential identifier this session was issued against, for
    /// callers that key a [`crate::store::SessionStore`] by it (e.g. to
    /// revoke every pending session for a credential on password change).
    pub fn credential_id(&self) -> &[u8] {
        &self.credential_id
    }
}

impl Drop for ServerAuthState {
    fn drop(&mut self) {
        self.expected_client_mac.zeroize();
        self.session_key.zeroize();
    }
}

fn fake_client_key<CS>(oprf_seed: &[u8], credential_id: &[u8]) -> Result<PrivateKey<CS::Group>, Error>
where
    CS: CipherSuite,
    Scalar<CS::Group>: FromOkm,
{
    let mut info = credential_id.to_vec();
    info.extend_from_slice(b"FakeClientKeyPair");
    let scalar = oprf::derive_key_pair::<CS>(oprf_seed, &info)?;
    Ok(PrivateKey::from_scalar(scalar))
}

fn fake_masking_key<CS: CipherSuite>(oprf_seed: &[u8], credential_id: &[u8]) -> Result<Vec<u8>, Error> {
    let hk = Hkdf::<CS::Hash>::new(None, oprf_seed);
    let mut info = credential_id.to_vec();
    info.extend_from_slice(b"MaskingKey");
    let mut out = alloc::vec![0u8; <CS::Hash as Digest>::output_size()];
    hk.expand(&info, &mut out)?;
    Ok(out)
}

/// `generateKE2(serverId?, record | fake-inputs, credentialId, KE1, clientId?)`.
///
/// When `record` is `None`, runs the deterministic fake path for
/// user-enumeration protection: a plausible `clientPk` and
/// `maskingKey` are derived from `oprfSeed` and `credentialId` so the
/// response is byte-indistinguishable in size and timing from a real one.
pub fn generate_ke2<CS, R>(
    rng: &mut R,
    setup: &ServerSetup<CS>,
    record: Option<&RegistrationRecord<CS>>,
    credential_id: &[u8],
    ke1: &Ke1<CS>,
    ids: Identifiers<'_>,
) -> Result<(Ke2<CS>, ServerAuthState), Error>
where
    CS: CipherSuite,
    Scalar<CS::Group>: FromOkm,
    R: RngCore + CryptoRng,
{
    let oprf_key = derive_oprf_key::<CS>(&setup.oprf_seed, credential_id)?;
    let evaluated_element = oprf::evaluate::<CS>(&oprf_key, &ke1.blinded_element);

    let (client_public_key, masking_key, envelope_bytes) = match record {
        Some(rec) => (
            rec.client_public_key.clone(),
            rec.masking_key.clone(),
            rec.envelope.serialize(),
        ),
        None => {
            let fake_key = fake_client_key::<CS>(&setup.oprf_seed, credential_id)?;
            let fake_mk = fake_masking_key::<CS>(&setup.oprf_seed, credential_id)?;
            let dummy_env = Envelope::dummy(<CS::Hash as Digest>::output_size()).serialize();
            (fake_key.public_key().clone(), fake_mk, dummy_env)
        }
    };

    let mut masking_nonce = [0u8; 32];
    rng.fill_bytes(&mut masking_nonce);

    let mut masked_response = setup.public_key().serialize();
    masked_response.extend_from_slice(&envelope_bytes);
    let pad = ake::masking_pad::<CS::Hash>(&masking_key, &masking_nonce, masked_response.len())?;
    ake::xor_in_place(&mut masked_response, &pad);

    let server_eph_sk = PrivateKey::<CS::Group>::random(rng);
    let mut server_nonce = [0u8; 32];
    rng.fill_bytes(&mut server_nonce);

    let client_pk_bytes = client_public_key.serialize();
    let server_pk_bytes = setup.public_key().serialize();
    let client_id = ids.client.unwrap_or(&client_pk_bytes).to_vec();
    let server_id = ids.server.unwrap_or(&server_pk_bytes).to_vec();

    let evaluated_element_bytes = group::serialize_point::<CS::Group>(&evaluated_element);
    let preamble = ake::preamble(
        &setup.context,
        &client_id,
        &ke1.serialize(),
        &server_id,
        &evaluated_element_bytes,
        &masking_nonce,
        &masked_response,
        &server_nonce,
        &server_eph_sk.public_key().serialize(),
    );

    let dh1 = server_eph_sk.diffie_hellman(&ke1.client_eph_pk);
    let dh2 = setup.ake_keypair.diffie_hellman(&ke1.client_eph_pk);
    let dh3 = server_eph_sk.diffie_hellman(&client_public_key);
    let ikm = ake::concat_dh::<CS::Group>(&dh1, &dh2, &dh3);

    let schedule = ake::key_schedule::<CS>(&ikm, &preamble)?;
    let ph = CS::Hash::digest(&preamble);
    let server_mac = ake::mac::<CS::Hash>(&schedule.km2, &ph)?;

    let mut transcript = preamble;
    transcript.extend_from_slice(&server_mac);
    let transcript_hash = CS::Hash::digest(&transcript);
    let expected_client_mac = ake::mac::<CS::Hash>(&schedule.km3, &transcript_hash)?;

    Ok((
        Ke2 {
            evaluated_element,
            masking_nonce,
            masked_response,
            server_nonce,
            server_eph_pk: server_eph_sk.public_key().clone(),
            server_mac,
        },
        ServerAuthState {
            expected_client_mac,
            session_key: schedule.session_key,
            credential_id: credential_id.to_vec(),
        },
    ))
}

/// `serverFinish(serverAuthState, KE3)`: constant-time compare against the
/// stashed expected client MAC, returning the session key on match.
pub fn server_finish(state: ServerAuthState, received_client_mac: &[u8]) -> Result<Vec<u8>, Error> {
    if !ake::verify_mac(&state.expected_client_mac, received_client_mac) {
        return Err(Error::Authentication);
    }
    Ok(state.session_key.clone())
}
