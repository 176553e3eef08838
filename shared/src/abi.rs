// Copyright 2021-2023 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

//! Thin ABI layer over `ethabi`: method selectors, event topics and the two
//! Solidity revert payload shapes.

use ethabi::{ParamType, Token};
use thiserror::Error;

use crate::econ::TokenAmount;
use crate::{Address, Bytes32};

/// First 4 bytes of the keccak hash of a canonical signature.
pub type MethodSelector = [u8; 4];

#[derive(Error, Debug)]
pub enum AbiError {
    #[error("abi: {0}")]
    Codec(#[from] ethabi::Error),
    #[error("abi: input shorter than a selector")]
    ShortInput,
    #[error("abi: output arity mismatch, expected {expected} got {got}")]
    OutputArity { expected: usize, got: usize },
}

/// A native method's wire shape: canonical name plus input/output tuples.
#[derive(Clone, Debug)]
pub struct MethodSig {
    pub name: &'static str,
    pub inputs: Vec<ParamType>,
    pub outputs: Vec<ParamType>,
    pub selector: MethodSelector,
}

impl MethodSig {
    pub fn new(name: &'static str, inputs: &[ParamType], outputs: &[ParamType]) -> Self {
        Self {
            name,
            inputs: inputs.to_vec(),
            outputs: outputs.to_vec(),
            selector: ethabi::short_signature(name, inputs),
        }
    }

    /// Decodes the post-selector bytes of a CALL input.
    pub fn decode_input(&self, data: &[u8]) -> Result<Vec<Token>, AbiError> {
        Ok(ethabi::decode(&self.inputs, data)?)
    }

    /// Encodes a method's returned tuple into ABI output bytes.
    pub fn encode_output(&self, tokens: &[Token]) -> Result<Vec<u8>, AbiError> {
        if tokens.len() != self.outputs.len() {
            return Err(AbiError::OutputArity {
                expected: self.outputs.len(),
                got: tokens.len(),
            });
        }
        Ok(ethabi::encode(tokens))
    }
}

/// Splits CALL input into `(selector, args)`.
pub fn split_input(input: &[u8]) -> Result<(MethodSelector, &[u8]), AbiError> {
    if input.len() < 4 {
        return Err(AbiError::ShortInput);
    }
    let mut sel = [0u8; 4];
    sel.copy_from_slice(&input[..4]);
    Ok((sel, &input[4..]))
}

/// An emitted log entry, already topic-packed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Log {
    pub address: Address,
    pub topics: Vec<Bytes32>,
    pub data: Vec<u8>,
}

/// An event's wire shape. Indexed parameters become topics after topic0.
#[derive(Clone, Debug)]
pub struct EventSig {
    pub name: &'static str,
    pub topic0: Bytes32,
    pub indexed: Vec<ParamType>,
    pub data: Vec<ParamType>,
}

impl EventSig {
    pub fn new(name: &'static str, indexed: &[ParamType], data: &[ParamType]) -> Self {
        let all: Vec<ParamType> = indexed.iter().chain(data.iter()).cloned().collect();
        Self {
            name,
            topic0: ethabi::long_signature(name, &all),
            indexed: indexed.to_vec(),
            data: data.to_vec(),
        }
    }

    /// Packs an emission into topics + data. Indexed arguments must be value
    /// types; each occupies one 32-byte topic word.
    pub fn encode(&self, address: Address, indexed: &[Token], data: &[Token]) -> Log {
        debug_assert_eq!(indexed.len(), self.indexed.len());
        debug_assert_eq!(data.len(), self.data.len());
        let mut topics = Vec::with_capacity(1 + indexed.len());
        topics.push(self.topic0);
        for token in indexed {
            topics.push(token_to_topic(token));
        }
        Log {
            address,
            topics,
            data: ethabi::encode(data),
        }
    }
}

fn token_to_topic(token: &Token) -> Bytes32 {
    let word = ethabi::encode(std::slice::from_ref(token));
    debug_assert_eq!(word.len(), 32, "indexed arguments must be value types");
    Bytes32::from_slice(&word[..32])
}

/// Payload of a Solidity `Error(string)` revert.
pub fn error_string_payload(msg: &str) -> Vec<u8> {
    let mut out = ethabi::short_signature("Error", &[ParamType::String]).to_vec();
    out.extend(ethabi::encode(&[Token::String(msg.to_string())]));
    out
}

/// Payload of a custom-error revert: 4-byte error selector plus encoded args.
pub fn custom_error_payload(name: &str, params: &[ParamType], args: &[Token]) -> Vec<u8> {
    let mut out = ethabi::short_signature(name, params).to_vec();
    out.extend(ethabi::encode(args));
    out
}

/// Recovers the message of an `Error(string)` payload, for tests and traces.
pub fn decode_error_string(payload: &[u8]) -> Option<String> {
    let (sel, rest) = split_input(payload).ok()?;
    if sel != ethabi::short_signature("Error", &[ParamType::String]) {
        return None;
    }
    match ethabi::decode(&[ParamType::String], rest).ok()?.pop()? {
        Token::String(s) => Some(s),
        _ => None,
    }
}

// Token construction/extraction helpers. Extractors panic on shape mismatch:
// the dispatch bridge has already decoded against the method's declared
// tuple, so a mismatch is a table bug, not input.

pub fn token_address(addr: Address) -> Token {
    Token::Address(addr)
}

pub fn token_bytes32(b: Bytes32) -> Token {
    Token::FixedBytes(b.as_bytes().to_vec())
}

pub fn token_amount(v: &TokenAmount) -> Token {
    Token::Uint(v.to_uint256())
}

pub fn token_u64(v: u64) -> Token {
    Token::Uint(v.into())
}

pub fn token_bool(v: bool) -> Token {
    Token::Bool(v)
}

pub fn token_string(v: &str) -> Token {
    Token::String(v.to_string())
}

pub fn as_address(token: &Token) -> Address {
    match token {
        Token::Address(a) => *a,
        other => panic!("expected address token, got {:?}", other),
    }
}

pub fn as_bytes32(token: &Token) -> Bytes32 {
    match token {
        Token::FixedBytes(b) if b.len() == 32 => Bytes32::from_slice(b),
        other => panic!("expected bytes32 token, got {:?}", other),
    }
}

pub fn as_amount(token: &Token) -> TokenAmount {
    match token {
        Token::Uint(v) => TokenAmount::from_uint256(*v),
        other => panic!("expected uint token, got {:?}", other),
    }
}

/// Oversized words saturate: decoding guarantees the token shape, not the
/// range, and a panic inside a native method would abort the block.
pub fn as_u64(token: &Token) -> u64 {
    match token {
        Token::Uint(v) if *v > ethereum_types::U256::from(u64::MAX) => u64::MAX,
        Token::Uint(v) => v.as_u64(),
        other => panic!("expected uint token, got {:?}", other),
    }
}

pub fn as_u8(token: &Token) -> u8 {
    match token {
        Token::Uint(v) if *v > ethereum_types::U256::from(u8::MAX) => u8::MAX,
        Token::Uint(v) => v.as_u64() as u8,
        other => panic!("expected uint token, got {:?}", other),
    }
}

/// Block-height argument; saturated heights land past any real chain head.
pub fn as_block_num(token: &Token) -> u32 {
    let v = as_u64(token);
    if v > u32::MAX as u64 {
        u32::MAX
    } else {
        v as u32
    }
}

pub fn as_bool(token: &Token) -> bool {
    match token {
        Token::Bool(v) => *v,
        other => panic!("expected bool token, got {:?}", other),
    }
}

pub fn as_bytes(token: &Token) -> Vec<u8> {
    match token {
        Token::Bytes(b) => b.clone(),
        other => panic!("expected bytes token, got {:?}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address_from_name;

    #[test]
    fn transfer_selector_matches_erc20() {
        let m = MethodSig::new(
            "transfer",
            &[ParamType::Address, ParamType::Uint(256)],
            &[ParamType::Bool],
        );
        assert_eq!(m.selector, [0xa9, 0x05, 0x9c, 0xbb]);
    }

    #[test]
    fn input_round_trip() {
        let m = MethodSig::new(
            "set",
            &[ParamType::FixedBytes(32), ParamType::Uint(256)],
            &[],
        );
        let key = crate::bytes32_from_label(b"key");
        let encoded = ethabi::encode(&[token_bytes32(key), token_u64(999)]);
        let tokens = m.decode_input(&encoded).unwrap();
        assert_eq!(as_bytes32(&tokens[0]), key);
        assert_eq!(as_u64(&tokens[1]), 999);
    }

    #[test]
    fn error_string_round_trip() {
        let payload = error_string_payload("builtin: not executor");
        assert_eq!(
            decode_error_string(&payload).as_deref(),
            Some("builtin: not executor")
        );
    }

    #[test]
    fn custom_error_payload_is_selector_prefixed() {
        let payload = custom_error_payload("StakerPaused", &[], &[]);
        assert_eq!(payload.len(), 4);
        assert_eq!(payload, ethabi::short_signature("StakerPaused", &[]));
    }

    #[test]
    fn event_packs_indexed_topics() {
        let sig = EventSig::new(
            "Set",
            &[ParamType::FixedBytes(32)],
            &[ParamType::Uint(256)],
        );
        let contract = address_from_name(b"Params");
        let key = crate::bytes32_from_label(b"key");
        let log = sig.encode(contract, &[token_bytes32(key)], &[token_u64(999)]);
        assert_eq!(log.address, contract);
        assert_eq!(log.topics.len(), 2);
        assert_eq!(log.topics[1], key);
        assert_eq!(log.data, ethabi::encode(&[token_u64(999)]));
    }
}
