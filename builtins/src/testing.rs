// Copyright 2021-2023 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

//! Test harness for driving built-ins through the dispatch bridge against an
//! in-memory state.

use ethabi::Token;

use thor_shared::abi::Log;
use thor_shared::{Address, BlockContext, Bytes32, ForkConfig, TokenAmount, TxContext};
use thor_state::MemoryState;
use thor_vm::gas::PriceList;
use thor_vm::testing::TestChain;
use thor_vm::{dispatch, CallParams, Execution};

use crate::params::{address_to_amount, Params};

pub const TEST_GAS: u64 = 50_000_000;

pub struct TestEnv {
    pub state: MemoryState,
    pub chain: TestChain,
    pub block: BlockContext,
    pub tx: TxContext,
    pub price: PriceList,
    pub fork: ForkConfig,
    /// Logs of the most recent successful call.
    pub last_logs: Vec<Log>,
    pub last_gas_used: u64,
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl TestEnv {
    pub fn new() -> Self {
        Self {
            state: MemoryState::new(),
            chain: TestChain::new(),
            block: BlockContext::default(),
            tx: TxContext::default(),
            price: PriceList::default(),
            fork: ForkConfig::all_active(),
            last_logs: Vec::new(),
            last_gas_used: 0,
        }
    }

    /// Writes the executor address straight into params storage.
    pub fn set_executor(&mut self, executor: Address) {
        Params::new()
            .set(
                &mut self.state,
                &thor_shared::keys::KEY_EXECUTOR_ADDRESS,
                &address_to_amount(&executor),
            )
            .unwrap();
    }

    pub fn set_param(&mut self, key: &Bytes32, value: &TokenAmount) {
        Params::new().set(&mut self.state, key, value).unwrap();
    }

    pub fn fund(&mut self, addr: Address, tokens: TokenAmount) {
        use thor_state::StateCursor;
        self.state.set_balance(&addr, tokens).unwrap();
    }

    fn input(to: &Address, name: &str, args: &[Token]) -> Vec<u8> {
        let table = crate::contract_table();
        let contract = table
            .find_contract(to)
            .unwrap_or_else(|| panic!("no built-in at {:?}", to));
        let method = contract
            .methods()
            .iter()
            .find(|m| m.sig.name == name)
            .unwrap_or_else(|| panic!("{} has no method {}", contract.name, name));
        let mut input = method.sig.selector.to_vec();
        input.extend(ethabi::encode(args));
        input
    }

    pub fn execute(
        &mut self,
        caller: Address,
        to: Address,
        name: &str,
        args: &[Token],
    ) -> Execution {
        let table = crate::contract_table();
        let input = Self::input(&to, name, args);
        dispatch(
            &table,
            CallParams {
                state: &mut self.state,
                chain: &self.chain,
                block: &self.block,
                tx: &self.tx,
                caller,
                to,
                input: &input,
                gas: TEST_GAS,
                price: &self.price,
                fork: self.fork,
            },
        )
        .expect("fatal execution error")
    }

    /// Calls a method expecting success; returns the decoded output tuple.
    pub fn call(&mut self, caller: Address, to: Address, name: &str, args: &[Token]) -> Vec<Token> {
        let outputs = {
            let table = crate::contract_table();
            let contract = table.find_contract(&to).unwrap();
            let method = contract
                .methods()
                .iter()
                .find(|m| m.sig.name == name)
                .unwrap();
            method.sig.outputs.clone()
        };
        match self.execute(caller, to, name, args) {
            Execution::Success {
                output,
                logs,
                gas_used,
            } => {
                self.last_logs = logs;
                self.last_gas_used = gas_used;
                ethabi::decode(&outputs, &output).expect("output decodes against the table")
            }
            Execution::Reverted { data, .. } => panic!(
                "unexpected revert of {}: {:?}",
                name,
                thor_shared::abi::decode_error_string(&data).unwrap_or_else(|| hex::encode(&data))
            ),
        }
    }

    /// Calls a method expecting a revert; returns the revert payload.
    pub fn call_err(
        &mut self,
        caller: Address,
        to: Address,
        name: &str,
        args: &[Token],
    ) -> Vec<u8> {
        match self.execute(caller, to, name, args) {
            Execution::Success { .. } => panic!("expected {} to revert", name),
            Execution::Reverted { data, .. } => data,
        }
    }

    /// Asserts the revert carried the named custom error.
    pub fn assert_custom_error(payload: &[u8], name: &str) {
        assert_eq!(
            payload,
            ethabi::short_signature(name, &[]).to_vec(),
            "expected custom error {}",
            name
        );
    }
}
