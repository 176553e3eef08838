// Copyright 2021-2023 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

use anyhow::anyhow;

use thor_shared::abi::{self, Log};
use thor_shared::{Address, BlockContext, ForkConfig, TxContext};
use thor_state::StateCursor;

use crate::chain::ChainLookup;
use crate::contract::ContractTable;
use crate::gas::PriceList;
use crate::{Environment, NativeError};

/// One CALL delivered to the bridge.
pub struct CallParams<'a> {
    pub state: &'a mut dyn StateCursor,
    pub chain: &'a dyn ChainLookup,
    pub block: &'a BlockContext,
    pub tx: &'a TxContext,
    pub caller: Address,
    pub to: Address,
    pub input: &'a [u8],
    pub gas: u64,
    pub price: &'a PriceList,
    pub fork: ForkConfig,
}

/// Outcome of a bridged CALL. Fatal conditions do not appear here; they
/// propagate as errors and abort the enclosing block execution.
#[derive(Debug)]
pub enum Execution {
    Success {
        output: Vec<u8>,
        logs: Vec<Log>,
        gas_used: u64,
    },
    /// State is rolled back by the caller; the gas already charged stays
    /// consumed. `data` is a Solidity-compatible revert payload.
    Reverted { data: Vec<u8>, gas_used: u64 },
}

impl Execution {
    pub fn gas_used(&self) -> u64 {
        match self {
            Execution::Success { gas_used, .. } => *gas_used,
            Execution::Reverted { gas_used, .. } => *gas_used,
        }
    }
}

/// Matches the CALL to a contract+selector, decodes arguments, runs the
/// method, and folds every recoverable failure into a VM revert.
pub fn dispatch(table: &ContractTable, params: CallParams<'_>) -> anyhow::Result<Execution> {
    let contract = table
        .find_contract(&params.to)
        .ok_or_else(|| anyhow!("no built-in registered at {:?}", params.to))?;

    let mut env = Environment::new(
        params.state,
        params.chain,
        params.block,
        params.tx,
        params.caller,
        params.to,
        params.gas,
        params.price,
        params.fork,
    );

    let (selector, arg_bytes) = match abi::split_input(params.input) {
        Ok(split) => split,
        Err(e) => return Ok(reverted(&env, NativeError::revert(e.to_string()))),
    };
    let method = match contract.find_method(selector) {
        Some(m) => m,
        None => {
            return Ok(reverted(
                &env,
                NativeError::revert(format!(
                    "{}: no method with selector {}",
                    contract.name,
                    hex::encode(selector)
                )),
            ))
        }
    };
    match method.sig.decode_input(arg_bytes) {
        Ok(args) => env.set_args(args),
        Err(e) => return Ok(reverted(&env, NativeError::revert(e.to_string()))),
    }

    match (method.body)(&mut env) {
        Ok(tokens) => {
            // An output the table cannot encode is a table bug, not input.
            let output = method.sig.encode_output(&tokens).map_err(|e| anyhow!(e))?;
            Ok(Execution::Success {
                output,
                logs: env.take_logs(),
                gas_used: env.gas_used(),
            })
        }
        Err(NativeError::Fatal(e)) => Err(e),
        Err(recoverable) => Ok(reverted(&env, recoverable)),
    }
}

fn reverted(env: &Environment<'_>, err: NativeError) -> Execution {
    let data = match err {
        NativeError::Revert(data) => data.to_payload(),
        // Out of gas reverts with no payload; the tracker has already pinned
        // gas_used to the limit.
        NativeError::OutOfGas => Vec::new(),
        NativeError::Fatal(_) => unreachable!("fatal errors propagate"),
    };
    Execution::Reverted {
        data,
        gas_used: env.gas_used(),
    }
}
