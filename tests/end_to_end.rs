// Copyright (c) the opaque-core authors.
//
// This source code is dual-licensed under either the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree or the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree. You may select, at your option, one of the above-listed
// licenses.

//! End-to-end registration/authentication scenarios, mirroring the
//! invariants and scenarios described for the full protocol.

use opaque_core::ksf::Identity;
use opaque_core::suite::P256Sha256;
use opaque_core::{
    create_registration_response, generate_ke2, server_finish, ClientAuthState,
    ClientRegistrationState, Identifiers, ServerSetup,
};
use rand::rngs::OsRng;

type Suite = P256Sha256<Identity>;

struct Fixture {
    setup: ServerSetup<Suite>,
    record: opaque_core::RegistrationRecord<Suite>,
    credential_id: &'static [u8],
}

fn register(password: &'static [u8], credential_id: &'static [u8], context: &'static [u8]) -> Fixture {
    let setup = ServerSetup::<Suite>::new(&mut OsRng, context).unwrap();

    let (client_state, request) = ClientRegistrationState::<Suite>::start(&mut OsRng, password).unwrap();
    let response = create_registration_response::<Suite>(&setup, &request, credential_id).unwrap();
    let (record, _export_key) = client_state
        .finish(&mut OsRng, &response, Identifiers::default())
        .unwrap();

    Fixture {
        setup,
        record,
        credential_id,
    }
}

fn full_login(
    fixture: &Fixture,
    password: &[u8],
    context: &[u8],
) -> Result<(Vec<u8>, Vec<u8>), opaque_core::Error> {
    let (client_state, ke1) = ClientAuthState::<Suite>::start(&mut OsRng, password).unwrap();
    let (ke2, server_auth_state) = generate_ke2(
        &mut OsRng,
        &fixture.setup,
        Some(&fixture.record),
        fixture.credential_id,
        &ke1,
        Identifiers::default(),
    )
    .unwrap();

    let (ke3, session_key, export_key) = client_state.finish(context, &ke2, Identifiers::default())?;
    let server_session_key = server_finish(server_auth_state, &ke3.client_mac)?;
    assert_eq!(session_key, server_session_key);
    Ok((session_key, export_key))
}

#[test]
fn two_round_trips_yield_distinct_session_keys_equal_export_keys() {
    let fixture = register(b"correct-password", b"user@example.com", b"opaque-core-tests");

    let (session_key_1, export_key_1) =
        full_login(&fixture, b"correct-password", b"opaque-core-tests").unwrap();
    let (session_key_2, export_key_2) =
        full_login(&fixture, b"correct-password", b"opaque-core-tests").unwrap();

    assert_ne!(session_key_1, session_key_2);
    assert_eq!(export_key_1, export_key_2);
}

#[test]
fn wrong_password_fails_with_generic_authentication_error() {
    let fixture = register(b"correct-password", b"user@example.com", b"opaque-core-tests");
    let err = full_login(&fixture, b"wrong-password", b"opaque-core-tests").unwrap_err();
    assert_eq!(err, opaque_core::Error::Authentication);
}

#[test]
fn unregistered_credential_fails_with_the_same_error_as_wrong_password() {
    let fixture = register(b"correct-password", b"user@example.com", b"opaque-core-tests");

    let (client_state, ke1) =
        ClientAuthState::<Suite>::start(&mut OsRng, b"correct-password").unwrap();
    let (ke2, server_auth_state) = generate_ke2(
        &mut OsRng,
        &fixture.setup,
        None, // no record: the fake-KE2 path
        b"nobody@example.com",
        &ke1,
        Identifiers::default(),
    )
    .unwrap();

    let err = client_state
        .finish(b"opaque-core-tests", &ke2, Identifiers::default())
        .unwrap_err();
    assert_eq!(err, opaque_core::Error::Authentication);

    // The server still reaches a consistent (wrong) verdict rather than panicking.
    assert!(server_finish(server_auth_state, &[0u8; 32]).is_err());
}

#[test]
fn tampering_any_field_of_ke2_breaks_generate_ke3() {
    let fixture = register(b"correct-password", b"user@example.com", b"opaque-core-tests");

    for field in 0..6 {
        let (client_state, ke1) =
            ClientAuthState::<Suite>::start(&mut OsRng, b"correct-password").unwrap();
        let (mut ke2, _server_auth_state) = generate_ke2(
            &mut OsRng,
            &fixture.setup,
            Some(&fixture.record),
            fixture.credential_id,
            &ke1,
            Identifiers::default(),
        )
        .unwrap();

        match field {
            0 => {
                let fresh = opaque_core::group::random_scalar::<p256::NistP256, _>(&mut OsRng);
                ke2.evaluated_element = opaque_core::group::scalar_mul_generator::<p256::NistP256>(&fresh);
            }
            1 => ke2.masking_nonce[0] ^= 0xff,
            2 => ke2.masked_response[0] ^= 0xff,
            3 => ke2.server_nonce[0] ^= 0xff,
            4 => {
                ke2.server_eph_pk =
                    opaque_core::PrivateKey::<p256::NistP256>::random(&mut OsRng)
                        .public_key()
                        .clone();
            }
            5 => ke2.server_mac[0] ^= 0xff,
            _ => unreachable!(),
        }

        let result = client_state.finish(b"opaque-core-tests", &ke2, Identifiers::default());
        assert!(result.is_err(), "field {field} tamper should break generateKE3");
    }
}

#[test]
fn reregistration_gets_fresh_nonce_but_same_masking_key() {
    let fixture_1 = register(b"correct-password", b"user@example.com", b"opaque-core-tests");

    let (client_state, request) =
        ClientRegistrationState::<Suite>::start(&mut OsRng, b"correct-password").unwrap();
    let response =
        create_registration_response::<Suite>(&fixture_1.setup, &request, fixture_1.credential_id)
            .unwrap();
    let (record_2, _export_key) = client_state
        .finish(&mut OsRng, &response, Identifiers::default())
        .unwrap();

    assert_ne!(fixture_1.record.envelope, record_2.envelope);
    assert_eq!(fixture_1.record.masking_key, record_2.masking_key);
}

#[test]
fn different_context_strings_fail_at_server_mac_verification() {
    let fixture = register(b"correct-password", b"user@example.com", b"context-a");
    let err = full_login(&fixture, b"correct-password", b"context-b").unwrap_err();
    assert_eq!(err, opaque_core::Error::Authentication);
}

#[test]
fn same_ake_identity_different_oprf_seeds_fails_at_envelope_recovery() {
    let context: &[u8] = b"opaque-core-tests";
    let credential_id: &[u8] = b"user@example.com";

    // Two setups share an AKE long-term key pair (same serialized scalar,
    // reconstructed independently since `PrivateKey` does not implement
    // `Clone`) but sample independent OPRF seeds.
    let ake_sk_bytes = opaque_core::PrivateKey::<p256::NistP256>::random(&mut OsRng).serialize();
    let mut oprf_seed_1 = vec![0u8; 32];
    rand::RngCore::fill_bytes(&mut OsRng, &mut oprf_seed_1);
    let mut oprf_seed_2 = vec![0u8; 32];
    rand::RngCore::fill_bytes(&mut OsRng, &mut oprf_seed_2);

    let setup_1 = ServerSetup::<Suite>::from_parts(
        opaque_core::PrivateKey::<p256::NistP256>::deserialize(&ake_sk_bytes).unwrap(),
        oprf_seed_1,
        context,
    )
    .unwrap();
    let setup_2 = ServerSetup::<Suite>::from_parts(
        opaque_core::PrivateKey::<p256::NistP256>::deserialize(&ake_sk_bytes).unwrap(),
        oprf_seed_2,
        context,
    )
    .unwrap();

    let (client_state, request) =
        ClientRegistrationState::<Suite>::start(&mut OsRng, b"correct-password").unwrap();
    let response = create_registration_response::<Suite>(&setup_1, &request, credential_id).unwrap();
    let (record, _export_key) = client_state
        .finish(&mut OsRng, &response, Identifiers::default())
        .unwrap();

    let (client_state, ke1) =
        ClientAuthState::<Suite>::start(&mut OsRng, b"correct-password").unwrap();
    let (ke2, _server_auth_state) = generate_ke2(
        &mut OsRng,
        &setup_2,
        Some(&record),
        credential_id,
        &ke1,
        Identifiers::default(),
    )
    .unwrap();

    let err = client_state
        .finish(context, &ke2, Identifiers::default())
        .unwrap_err();
    assert_eq!(err, opaque_core::Error::Authentication);
}
