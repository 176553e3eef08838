// Copyright 2021-2023 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

//! The Params registry: a single global key→integer map holding governance
//! constants. Writable by the executor only; the executor address is itself
//! a record under `KEY_EXECUTOR_ADDRESS`.

use ethabi::{ParamType, Token};
use lazy_static::lazy_static;

use thor_shared::abi::{self, EventSig, MethodSig};
use thor_shared::keys::KEY_EXECUTOR_ADDRESS;
use thor_shared::{address_from_name, Address, Bytes32, TokenAmount};
use thor_state::{SlotMap, StateCursor};
use thor_vm::{Environment, NativeContract, NativeMethod, Result};

lazy_static! {
    pub static ref ADDRESS: Address = address_from_name(b"Params");
    static ref EVENT_SET: EventSig = EventSig::new(
        "Set",
        &[ParamType::FixedBytes(32)],
        &[ParamType::Uint(256)],
    );
}

const SLOT_VALUES: u64 = 0;

/// State layer over the registry's storage.
pub struct Params {
    values: SlotMap<Bytes32, TokenAmount>,
}

impl Default for Params {
    fn default() -> Self {
        Self::new()
    }
}

impl Params {
    pub fn new() -> Self {
        Self {
            values: SlotMap::new(*ADDRESS, SLOT_VALUES),
        }
    }

    pub fn get(&self, state: &dyn StateCursor, key: &Bytes32) -> thor_state::Result<TokenAmount> {
        self.values.get(state, key)
    }

    /// Unchecked write; authorization happens in the native method. Genesis
    /// setup uses this directly.
    pub fn set(
        &self,
        state: &mut dyn StateCursor,
        key: &Bytes32,
        value: &TokenAmount,
    ) -> thor_state::Result<()> {
        self.values.put(state, key, value)
    }

    /// The executor address, as recorded in the registry itself.
    pub fn executor(&self, state: &dyn StateCursor) -> thor_state::Result<Address> {
        let value = self.get(state, &KEY_EXECUTOR_ADDRESS)?;
        Ok(amount_to_address(&value))
    }

    /// A `u64`-valued parameter, saturating on oversized records.
    pub fn get_u64(&self, state: &dyn StateCursor, key: &Bytes32) -> thor_state::Result<u64> {
        let value = self.get(state, key)?;
        let uint = value.to_uint256();
        Ok(if uint > u64::MAX.into() {
            u64::MAX
        } else {
            uint.as_u64()
        })
    }
}

/// Params values are 256-bit words; addresses ride in the low 20 bytes.
pub fn address_to_amount(addr: &Address) -> TokenAmount {
    TokenAmount::from_bytes(addr.as_bytes())
}

pub fn amount_to_address(value: &TokenAmount) -> Address {
    let uint = value.to_uint256();
    let mut buf = [0u8; 32];
    uint.to_big_endian(&mut buf);
    Address::from_slice(&buf[12..])
}

/// Reverts unless the caller is the recorded executor.
pub fn require_executor(env: &mut Environment) -> Result<()> {
    let executor = Params::new().executor(env)?;
    env.require(
        !executor.is_zero() && env.caller() == executor,
        "builtin: executor required",
    )
}

fn native_get(env: &mut Environment) -> Result<Vec<Token>> {
    let key = abi::as_bytes32(&env.args()[0]);
    let value = Params::new().get(env, &key)?;
    Ok(vec![abi::token_amount(&value)])
}

fn native_set(env: &mut Environment) -> Result<Vec<Token>> {
    let key = abi::as_bytes32(&env.args()[0]);
    let value = abi::as_amount(&env.args()[1]);
    require_executor(env)?;
    Params::new().set(env, &key, &value)?;
    env.log(&EVENT_SET, &[abi::token_bytes32(key)], &[abi::token_amount(&value)])?;
    Ok(vec![])
}

fn native_executor(env: &mut Environment) -> Result<Vec<Token>> {
    let executor = Params::new().executor(env)?;
    Ok(vec![abi::token_address(executor)])
}

pub fn native_contract() -> NativeContract {
    NativeContract::new(
        "Params",
        *ADDRESS,
        vec![
            NativeMethod::new(
                MethodSig::new("executor", &[], &[ParamType::Address]),
                native_executor,
            ),
            NativeMethod::new(
                MethodSig::new(
                    "get",
                    &[ParamType::FixedBytes(32)],
                    &[ParamType::Uint(256)],
                ),
                native_get,
            ),
            NativeMethod::new(
                MethodSig::new(
                    "set",
                    &[ParamType::FixedBytes(32), ParamType::Uint(256)],
                    &[],
                ),
                native_set,
            ),
        ],
    )
}
