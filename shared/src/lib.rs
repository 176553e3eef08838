// Copyright 2021-2023 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

pub mod abi;
pub mod context;
pub mod econ;
pub mod hash;
pub mod keys;

pub use context::{BlockContext, ForkConfig, TxContext};
pub use econ::TokenAmount;

/// 20-byte account or contract identity.
pub type Address = ethereum_types::H160;

/// 32-byte tag used for block/transaction IDs, storage keys and identities.
pub type Bytes32 = ethereum_types::H256;

/// Unsigned Unix seconds, monotonic across a chain.
pub type BlockTime = u64;

/// Block height.
pub type BlockNum = u32;

/// Derives the well-known address of a built-in contract from its name.
/// The name occupies the low-order bytes, as in `BytesToAddress`.
pub fn address_from_name(name: &[u8]) -> Address {
    assert!(name.len() <= 20, "address label too long");
    let mut buf = [0u8; 20];
    buf[20 - name.len()..].copy_from_slice(name);
    Address::from(buf)
}

/// Builds a `Bytes32` from an ascii label, label first, zero padded.
pub fn bytes32_from_label(label: &[u8]) -> Bytes32 {
    assert!(label.len() <= 32, "bytes32 label too long");
    let mut buf = [0u8; 32];
    buf[..label.len()].copy_from_slice(label);
    Bytes32::from(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_address_is_right_aligned() {
        let addr = address_from_name(b"Params");
        assert!(addr.as_bytes().starts_with(&[0u8; 14]));
        assert_eq!(&addr.as_bytes()[14..], b"Params");
    }

    #[test]
    fn label_key_starts_with_ascii() {
        let key = bytes32_from_label(b"key");
        assert_eq!(&key.as_bytes()[..3], b"key");
        assert_eq!(&key.as_bytes()[3..], &[0u8; 29]);
    }
}
