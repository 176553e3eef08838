// Copyright 2021-2023 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

use crate::Result;

/// Storage-value encoding. The zero value encodes to empty bytes, so absence
/// and zero are indistinguishable on chain; decoding empty bytes yields the
/// zero value.
pub trait StorageValue: Sized {
    fn encode_value(&self) -> Vec<u8>;
    fn decode_value(raw: &[u8]) -> Result<Self>;
}

impl<T> StorageValue for T
where
    T: rlp::Encodable + rlp::Decodable + Default + PartialEq,
{
    fn encode_value(&self) -> Vec<u8> {
        if *self == T::default() {
            return Vec::new();
        }
        rlp::encode(self).to_vec()
    }

    fn decode_value(raw: &[u8]) -> Result<Self> {
        if raw.is_empty() {
            return Ok(T::default());
        }
        Ok(rlp::decode(raw)?)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use thor_shared::{Address, Bytes32, TokenAmount};

    use super::*;

    #[test]
    fn zero_values_encode_empty() {
        assert!(0u64.encode_value().is_empty());
        assert!(false.encode_value().is_empty());
        assert!(Address::zero().encode_value().is_empty());
        assert!(Bytes32::zero().encode_value().is_empty());
        assert!(TokenAmount::default().encode_value().is_empty());
    }

    #[test]
    fn empty_decodes_to_zero() {
        assert_eq!(u64::decode_value(&[]).unwrap(), 0);
        assert_eq!(Address::decode_value(&[]).unwrap(), Address::zero());
        assert_eq!(
            TokenAmount::decode_value(&[]).unwrap(),
            TokenAmount::default()
        );
    }

    #[test]
    fn round_trips() {
        let addr = thor_shared::address_from_name(b"Energy");
        assert_eq!(
            Address::decode_value(&addr.encode_value()).unwrap(),
            addr
        );
        let amount = TokenAmount::from_whole(42);
        assert_eq!(
            TokenAmount::decode_value(&amount.encode_value()).unwrap(),
            amount
        );
        assert_eq!(u64::decode_value(&7u64.encode_value()).unwrap(), 7);
    }
}
