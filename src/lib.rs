// Copyright (c) the opaque-core authors.
//
// This source code is dual-licensed under either the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree or the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree. You may select, at your option, one of the above-listed
// licenses.

//! `opaque-core`: the cryptographic core of an OPAQUE-style asymmetric
//! password-authenticated key exchange.
//!
//! This crate implements three layered standards, each independently usable
//! and independently testable against its own RFC vectors:
//!
//! - RFC 9380 hash-to-curve ([`hash_to_curve`], [`group`]).
//! - RFC 9497 OPRF, base mode ([`oprf`]).
//! - A 3DH asymmetric PAKE built on the OPRF ([`envelope`], [`ake`],
//!   [`messages`], [`opaque`]).
//!
//! The top-level orchestration — [`opaque::ServerSetup`],
//! [`opaque::ClientRegistrationState`], [`opaque::ClientAuthState`],
//! [`opaque::generate_ke2`], [`opaque::server_finish`] — is what most callers
//! want; the lower layers are exposed for RFC-vector testing and for callers
//! who need the OPRF or hash-to-curve primitives standalone.
//!
//! This crate never performs I/O. Credential and session persistence are
//! modeled as the [`store::CredentialStore`] and [`store::SessionStore`]
//! traits; a deployment wires them to a real database and an HTTP handler.
#![cfg_attr(not(feature = "std"), no_std)]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![cfg_attr(not(test), deny(unsafe_code))]
#![warn(missing_docs, rustdoc::all)]
#![allow(clippy::type_complexity)]

extern crate alloc;

#[cfg(any(feature = "std", test))]
extern crate std;

pub mod ake;
pub mod envelope;
pub mod errors;
pub mod group;
pub mod hash_to_curve;
pub mod keypair;
pub mod ksf;
pub mod messages;
pub mod opaque;
pub mod oprf;
pub mod store;
pub mod suite;

pub use envelope::{Envelope, Identifiers};
pub use errors::{Error, InternalError, InvalidInput, ResourceExhausted};
pub use keypair::{PrivateKey, PublicKey};
pub use messages::{Ke1, Ke2, Ke3, RegistrationRecord, RegistrationRequest, RegistrationResponse};
pub use opaque::{
    create_registration_response, generate_ke2, server_finish, ClientAuthState,
    ClientRegistrationState, ServerAuthState, ServerSetup,
};
pub use suite::{CipherSuite, CipherSuiteId, P256Sha256, P384Sha384, P521Sha512};
