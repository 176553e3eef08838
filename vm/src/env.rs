// Copyright 2021-2023 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

use std::cell::RefCell;

use ethabi::Token;

use thor_shared::abi::{EventSig, Log};
use thor_shared::{Address, BlockContext, Bytes32, ForkConfig, TokenAmount, TxContext};
use thor_state::{StateCursor, StateError};

use crate::chain::ChainLookup;
use crate::gas::{GasCharge, GasTracker, PriceList};
use crate::{NativeError, Result};

/// Everything a native method body sees.
///
/// The environment is also a [`StateCursor`]: every read charges `SLOAD`
/// (balance reads charge `GetBalance`) and every write charges `SSTORE`-set
/// or -reset depending on whether the prior slot was empty, before the
/// underlying cursor is touched. Method bodies therefore cannot forget to
/// meter storage.
pub struct Environment<'a> {
    state: &'a mut dyn StateCursor,
    chain: &'a dyn ChainLookup,
    block: &'a BlockContext,
    tx: &'a TxContext,
    caller: Address,
    to: Address,
    fork: ForkConfig,
    price: &'a PriceList,
    gas: RefCell<GasTracker>,
    args: Vec<Token>,
    logs: Vec<Log>,
}

impl<'a> Environment<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        state: &'a mut dyn StateCursor,
        chain: &'a dyn ChainLookup,
        block: &'a BlockContext,
        tx: &'a TxContext,
        caller: Address,
        to: Address,
        gas_limit: u64,
        price: &'a PriceList,
        fork: ForkConfig,
    ) -> Self {
        Self {
            state,
            chain,
            block,
            tx,
            caller,
            to,
            fork,
            price,
            gas: RefCell::new(GasTracker::new(gas_limit)),
            args: Vec::new(),
            logs: Vec::new(),
        }
    }

    pub fn block_context(&self) -> &BlockContext {
        self.block
    }

    pub fn tx_context(&self) -> &TxContext {
        self.tx
    }

    pub fn chain(&self) -> &dyn ChainLookup {
        self.chain
    }

    pub fn caller(&self) -> Address {
        self.caller
    }

    pub fn to(&self) -> Address {
        self.to
    }

    pub fn fork_config(&self) -> ForkConfig {
        self.fork
    }

    pub fn price_list(&self) -> &PriceList {
        self.price
    }

    /// Deducts from the remaining gas; underflow reverts with out-of-gas.
    pub fn use_gas(&self, amount: u64) -> Result<()> {
        self.gas
            .borrow_mut()
            .charge_gas(GasCharge::new("native", amount))
            .map_err(|_| NativeError::OutOfGas)
    }

    pub fn gas_used(&self) -> u64 {
        self.gas.borrow().gas_used()
    }

    /// The decoded argument tuple of the current call.
    pub fn args(&self) -> &[Token] {
        &self.args
    }

    pub(crate) fn set_args(&mut self, args: Vec<Token>) {
        self.args = args;
    }

    /// Reverts with an `Error(string)` payload unless `cond` holds.
    pub fn require(&self, cond: bool, msg: &str) -> Result<()> {
        if cond {
            Ok(())
        } else {
            Err(NativeError::revert(msg))
        }
    }

    /// Emits an event, charging the EVM-standard log gas.
    pub fn log(&mut self, event: &EventSig, indexed: &[Token], data: &[Token]) -> Result<()> {
        let entry = event.encode(self.to, indexed, data);
        let amount = self.price.log_gas
            + self.price.log_topic_gas * entry.topics.len() as u64
            + self.price.log_data_gas * entry.data.len() as u64;
        self.use_gas(amount)?;
        self.logs.push(entry);
        Ok(())
    }

    pub fn logs(&self) -> &[Log] {
        &self.logs
    }

    pub(crate) fn take_logs(&mut self) -> Vec<Log> {
        std::mem::take(&mut self.logs)
    }

    fn charge(&self, name: &'static str, amount: u64) -> thor_state::Result<()> {
        self.gas
            .borrow_mut()
            .charge_gas(GasCharge::new(name, amount))
            .map_err(|_| StateError::OutOfGas)
    }
}

impl StateCursor for Environment<'_> {
    fn get_balance(&self, addr: &Address) -> thor_state::Result<TokenAmount> {
        self.charge("get_balance", self.price.get_balance_gas)?;
        self.state.get_balance(addr)
    }

    fn set_balance(&mut self, addr: &Address, value: TokenAmount) -> thor_state::Result<()> {
        self.charge("set_balance", self.price.sstore_reset_gas)?;
        self.state.set_balance(addr, value)
    }

    fn get_storage(&self, addr: &Address, key: &Bytes32) -> thor_state::Result<Bytes32> {
        self.charge("sload", self.price.sload_gas)?;
        self.state.get_storage(addr, key)
    }

    fn set_storage(&mut self, addr: &Address, key: &Bytes32, value: Bytes32) -> thor_state::Result<()> {
        let prior_empty = self.state.get_raw_storage(addr, key)?.is_empty();
        let amount = if prior_empty {
            self.price.sstore_set_gas
        } else {
            self.price.sstore_reset_gas
        };
        self.charge("sstore", amount)?;
        self.state.set_storage(addr, key, value)
    }

    fn get_raw_storage(&self, addr: &Address, key: &Bytes32) -> thor_state::Result<Vec<u8>> {
        self.charge("sload", self.price.sload_gas)?;
        self.state.get_raw_storage(addr, key)
    }

    fn set_raw_storage(&mut self, addr: &Address, key: &Bytes32, value: Vec<u8>) -> thor_state::Result<()> {
        let prior_empty = self.state.get_raw_storage(addr, key)?.is_empty();
        let amount = if prior_empty {
            self.price.sstore_set_gas
        } else {
            self.price.sstore_reset_gas
        };
        self.charge("sstore", amount)?;
        self.state.set_raw_storage(addr, key, value)
    }

    fn get_code_hash(&self, addr: &Address) -> thor_state::Result<Bytes32> {
        self.charge("sload", self.price.sload_gas)?;
        self.state.get_code_hash(addr)
    }

    fn exists(&self, addr: &Address) -> thor_state::Result<bool> {
        self.charge("sload", self.price.sload_gas)?;
        self.state.exists(addr)
    }

    fn spawn(&self, root: &Bytes32) -> thor_state::Result<Box<dyn StateCursor>> {
        self.state.spawn(root)
    }
}
