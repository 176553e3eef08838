// Copyright 2021-2023 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

use crate::Bytes32;

/// Blake2b-256, the hash used to derive storage positions and identities.
pub fn blake2b256(parts: &[&[u8]]) -> Bytes32 {
    let mut state = blake2b_simd::Params::new().hash_length(32).to_state();
    for part in parts {
        state.update(part);
    }
    Bytes32::from_slice(state.finalize().as_bytes())
}

/// Keccak-256, the hash behind ABI selectors and event topics.
pub fn keccak256(data: &[u8]) -> Bytes32 {
    keccak_hash::keccak(data)
}
