// Copyright (c) the opaque-core authors.
//
// This source code is dual-licensed under either the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree or the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree. You may select, at your option, one of the above-listed
// licenses.

//! Key-stretching functions.
//!
//! The KSF runs client-side only, on the raw OPRF output, before
//! `HKDF-Extract` folds it into `randomizedPwd`. [`Identity`] is a no-op,
//! used for tests and offline vectors; with the `argon2` feature,
//! [`Argon2id`] applies real memory-hard stretching.

use alloc::vec::Vec;

use digest::{Digest, OutputSizeUser};

use crate::errors::{Error, InternalError};

/// `stretch(input) -> bytes` of length `Nh`.
pub trait Ksf<H: OutputSizeUser> {
    /// Applies the key-stretching function to a raw `Nh`-byte OPRF output.
    fn stretch(input: &[u8]) -> Result<Vec<u8>, Error>;
}

/// The no-op key-stretching function: `stretch(x) = x`.
///
/// Only appropriate for tests and RFC vector validation — a real deployment
/// must use [`Argon2id`] or an equivalent memory-hard function.
pub struct Identity;

impl<H: OutputSizeUser> Ksf<H> for Identity {
    fn stretch(input: &[u8]) -> Result<Vec<u8>, Error> {
        Ok(input.to_vec())
    }
}

/// Argon2id stretching, parameterized by memory (KiB), iterations, and
/// parallelism, with a fixed 32-byte zero salt.
#[cfg(feature = "argon2")]
pub struct Argon2id<const MEM_KIB: u32, const ITERATIONS: u32, const PARALLELISM: u32>;

#[cfg(feature = "argon2")]
impl<H, const MEM_KIB: u32, const ITERATIONS: u32, const PARALLELISM: u32> Ksf<H>
    for Argon2id<MEM_KIB, ITERATIONS, PARALLELISM>
where
    H: Digest + OutputSizeUser,
{
    fn stretch(input: &[u8]) -> Result<Vec<u8>, Error> {
        const ZERO_SALT: [u8; 32] = [0u8; 32];

        let params = argon2::Params::new(MEM_KIB, ITERATIONS, PARALLELISM, None)
            .map_err(|_| Error::Internal(InternalError::HkdfLengthInvalid))?;
        let argon2 = argon2::Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);

        let mut out = alloc::vec![0u8; <H as OutputSizeUser>::output_size()];
        argon2
            .hash_password_into(input, &ZERO_SALT, &mut out)
            .map_err(|_| Error::Internal(InternalError::HkdfLengthInvalid))?;
        Ok(out)
    }
}

/// Default Argon2id parameterization suggested for interactive logins:
/// 19 MiB, 2 iterations, 1 degree of parallelism (OWASP's minimum
/// recommendation for password hashing as of 2024).
#[cfg(feature = "argon2")]
pub type DefaultArgon2id = Argon2id<19456, 2, 1>;
