// Copyright (c) the opaque-core authors.
//
// This source code is dual-licensed under either the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree or the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree. You may select, at your option, one of the above-listed
// licenses.

//! RFC 9380 `expand_message_xmd`, including the oversize-DST path.
//!
//! This is deliberately a standalone, directly-testable function (see
//! `src/tests.rs` for its determinism and length properties) even though
//! [`crate::group::hash_to_group`] additionally delegates the full
//! `hash_to_curve` construction (expand, map to curve, sum, clear cofactor)
//! to `elliptic_curve::hash2curve`, which implements the same RFC for the
//! NIST curves this crate supports.

use alloc::vec;
use alloc::vec::Vec;

use digest::core_api::{BlockSizeUser, CoreProxy, FixedOutputCore, OutputSizeUser, UpdateCore};
use digest::typenum::{IsLess, Le, NonZero, U256};
use digest::{Digest, HashMarker};

use crate::errors::{Error, InternalError};

const MAX_DST_LEN: usize = 255;
const OVERSIZE_DST_PREFIX: &[u8] = b"H2C-OVERSIZE-DST-";

/// Digests usable as the `H` parameter of `expand_message_xmd`.
///
/// This bound is the standard "proxy hash" shape required by RFC 9380: `H`
/// must be a block-oriented Merkle-Damgard hash exposing its block size at
/// the type level.
pub trait ExpandHash: Digest + Clone {
    /// The hash's block size in bytes (`r_in_bytes` in RFC 9380 §5.4.1).
    fn block_size_bytes() -> usize;
}

impl<D> ExpandHash for D
where
    D: CoreProxy + Digest + Clone,
    D::Core: HashMarker + UpdateCore + FixedOutputCore + BlockSizeUser<BlockSize: IsLess<U256>>,
    Le<<D::Core as BlockSizeUser>::BlockSize, U256>: NonZero,
    D::Core: OutputSizeUser<OutputSize: IsLess<U256>>,
{
    fn block_size_bytes() -> usize {
        <D::Core as BlockSizeUser>::block_size()
    }
}

/// `expand_message_xmd(msg, DST, len_in_bytes)` per RFC 9380 §5.4.1.
///
/// `dst` longer than 255 bytes is folded down via
/// `DST' = H(H2C-OVERSIZE-DST- || DST)` before use, per §5.3.3.
pub fn expand_message_xmd<H: ExpandHash>(
    msg: &[u8],
    dst: &[u8],
    len_in_bytes: usize,
) -> Result<Vec<u8>, Error> {
    let b_in_bytes = <H as Digest>::output_size();
    let r_in_bytes = H::block_size_bytes();

    let folded_dst;
    let dst = if dst.len() > MAX_DST_LEN {
        let mut hasher = H::new();
        hasher.update(OVERSIZE_DST_PREFIX);
        hasher.update(dst);
        folded_dst = hasher.finalize().to_vec();
        folded_dst.as_slice()
    } else {
        dst
    };

    let ell = len_in_bytes.div_ceil(b_in_bytes);
    if ell > 255 || len_in_bytes > 65535 || dst.len() > 255 {
        return Err(Error::Internal(InternalError::HkdfLengthInvalid));
    }
    let dst_prime = [dst, &[dst.len() as u8]].concat();

    let z_pad = vec![0u8; r_in_bytes];
    let l_i_b_str = (len_in_bytes as u16).to_be_bytes();

    let mut hasher = H::new();
    hasher.update(&z_pad);
    hasher.update(msg);
    hasher.update(l_i_b_str);
    hasher.update([0u8]);
    hasher.update(&dst_prime);
    let b_0 = hasher.finalize();

    let mut hasher = H::new();
    hasher.update(&b_0);
    hasher.update([1u8]);
    hasher.update(&dst_prime);
    let mut b_i = hasher.finalize();

    let mut out = Vec::with_capacity(ell * b_in_bytes);
    out.extend_from_slice(&b_i);

    for i in 2..=ell {
        let mut strxor = vec![0u8; b_in_bytes];
        for (s, (a, b)) in strxor.iter_mut().zip(b_0.iter().zip(b_i.iter())) {
            *s = a ^ b;
        }
        let mut hasher = H::new();
        hasher.update(&strxor);
        hasher.update([i as u8]);
        hasher.update(&dst_prime);
        b_i = hasher.finalize();
        out.extend_from_slice(&b_i);
    }

    out.truncate(len_in_bytes);
    Ok(out)
}
