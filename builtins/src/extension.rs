// Copyright 2021-2023 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

//! The chain extension: hashing, block header lookups and transaction
//! context getters, exposed to contracts as read-only natives.

use ethabi::{ParamType, Token};
use lazy_static::lazy_static;

use thor_shared::abi::{self, MethodSig};
use thor_shared::hash::blake2b256;
use thor_shared::{address_from_name, Address, BlockNum, Bytes32};
use thor_vm::{ChainLookup, Environment, HeaderInfo, NativeContract, NativeMethod, Result};

use crate::energy::Energy;

lazy_static! {
    pub static ref ADDRESS: Address = address_from_name(b"Extension");
}

/// Header lookup honoring the "future and self forbidden" rule: heights at
/// or beyond the current block yield `None`.
fn past_header(env: &Environment, num: BlockNum) -> Result<Option<HeaderInfo>> {
    if num >= env.block_context().number {
        return Ok(None);
    }
    Ok(env.chain().header(num)?)
}

fn native_blake2b256(env: &mut Environment) -> Result<Vec<Token>> {
    let data = abi::as_bytes(&env.args()[0]);
    let digest = blake2b256(&[&data]);
    Ok(vec![abi::token_bytes32(digest)])
}

fn native_block_id(env: &mut Environment) -> Result<Vec<Token>> {
    let num = abi::as_block_num(&env.args()[0]);
    let id = past_header(env, num)?
        .map(|h| h.id)
        .unwrap_or_else(Bytes32::zero);
    Ok(vec![abi::token_bytes32(id)])
}

fn native_block_total_score(env: &mut Environment) -> Result<Vec<Token>> {
    let num = abi::as_block_num(&env.args()[0]);
    let score = past_header(env, num)?.map(|h| h.total_score).unwrap_or(0);
    Ok(vec![abi::token_u64(score)])
}

fn native_block_time(env: &mut Environment) -> Result<Vec<Token>> {
    let num = abi::as_block_num(&env.args()[0]);
    let time = past_header(env, num)?.map(|h| h.time).unwrap_or(0);
    Ok(vec![abi::token_u64(time)])
}

fn native_block_signer(env: &mut Environment) -> Result<Vec<Token>> {
    let num = abi::as_block_num(&env.args()[0]);
    let signer = past_header(env, num)?
        .map(|h| h.signer)
        .unwrap_or_else(Address::zero);
    Ok(vec![abi::token_address(signer)])
}

fn native_total_supply(env: &mut Environment) -> Result<Vec<Token>> {
    let t = env.block_context().time;
    let supply = Energy::new().total_supply(env, t)?;
    Ok(vec![abi::token_amount(&supply)])
}

fn native_tx_proved_work(env: &mut Environment) -> Result<Vec<Token>> {
    let work = env.tx_context().proved_work.clone();
    Ok(vec![abi::token_amount(&work)])
}

fn native_tx_id(env: &mut Environment) -> Result<Vec<Token>> {
    Ok(vec![abi::token_bytes32(env.tx_context().id)])
}

fn native_tx_block_ref(env: &mut Environment) -> Result<Vec<Token>> {
    let block_ref = env.tx_context().block_ref;
    Ok(vec![Token::FixedBytes(block_ref.to_vec())])
}

fn native_tx_expiration(env: &mut Environment) -> Result<Vec<Token>> {
    Ok(vec![abi::token_u64(env.tx_context().expiration as u64)])
}

fn native_tx_gas_payer(env: &mut Environment) -> Result<Vec<Token>> {
    Ok(vec![abi::token_address(env.tx_context().gas_payer)])
}

fn native_tx_clause_index(env: &mut Environment) -> Result<Vec<Token>> {
    Ok(vec![abi::token_u64(env.tx_context().clause_index as u64)])
}

fn native_tx_clause_count(env: &mut Environment) -> Result<Vec<Token>> {
    Ok(vec![abi::token_u64(env.tx_context().clause_count as u64)])
}

pub fn native_contract() -> NativeContract {
    NativeContract::new(
        "Extension",
        *ADDRESS,
        vec![
            NativeMethod::new(
                MethodSig::new(
                    "blake2b256",
                    &[ParamType::Bytes],
                    &[ParamType::FixedBytes(32)],
                ),
                native_blake2b256,
            ),
            NativeMethod::new(
                MethodSig::new(
                    "blockID",
                    &[ParamType::Uint(32)],
                    &[ParamType::FixedBytes(32)],
                ),
                native_block_id,
            ),
            NativeMethod::new(
                MethodSig::new(
                    "blockTotalScore",
                    &[ParamType::Uint(32)],
                    &[ParamType::Uint(64)],
                ),
                native_block_total_score,
            ),
            NativeMethod::new(
                MethodSig::new(
                    "blockTime",
                    &[ParamType::Uint(32)],
                    &[ParamType::Uint(256)],
                ),
                native_block_time,
            ),
            NativeMethod::new(
                MethodSig::new(
                    "blockSigner",
                    &[ParamType::Uint(32)],
                    &[ParamType::Address],
                ),
                native_block_signer,
            ),
            NativeMethod::new(
                MethodSig::new("totalSupply", &[], &[ParamType::Uint(256)]),
                native_total_supply,
            ),
            NativeMethod::new(
                MethodSig::new("txProvedWork", &[], &[ParamType::Uint(256)]),
                native_tx_proved_work,
            ),
            NativeMethod::new(
                MethodSig::new("txID", &[], &[ParamType::FixedBytes(32)]),
                native_tx_id,
            ),
            NativeMethod::new(
                MethodSig::new("txBlockRef", &[], &[ParamType::FixedBytes(8)]),
                native_tx_block_ref,
            ),
            NativeMethod::new(
                MethodSig::new("txExpiration", &[], &[ParamType::Uint(256)]),
                native_tx_expiration,
            ),
            NativeMethod::new(
                MethodSig::new("txGasPayer", &[], &[ParamType::Address]),
                native_tx_gas_payer,
            ),
            NativeMethod::new(
                MethodSig::new("txClauseIndex", &[], &[ParamType::Uint(32)]),
                native_tx_clause_index,
            ),
            NativeMethod::new(
                MethodSig::new("txClauseCount", &[], &[ParamType::Uint(32)]),
                native_tx_clause_count,
            ),
        ],
    )
}
