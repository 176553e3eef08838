// Copyright 2021-2023 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

use ethabi::Token;

use thor_shared::abi::{MethodSelector, MethodSig};
use thor_shared::Address;

use crate::{Environment, Result};

/// A native method body. Receives the call environment with the decoded
/// arguments installed and returns the output tuple.
pub type MethodBody = fn(&mut Environment<'_>) -> Result<Vec<Token>>;

pub struct NativeMethod {
    pub sig: MethodSig,
    pub body: MethodBody,
}

impl NativeMethod {
    pub fn new(sig: MethodSig, body: MethodBody) -> Self {
        Self { sig, body }
    }
}

/// One built-in contract: its well-known address plus the selector table.
pub struct NativeContract {
    pub name: &'static str,
    pub address: Address,
    methods: Vec<NativeMethod>,
}

impl NativeContract {
    pub fn new(name: &'static str, address: Address, methods: Vec<NativeMethod>) -> Self {
        Self {
            name,
            address,
            methods,
        }
    }

    pub fn find_method(&self, selector: MethodSelector) -> Option<&NativeMethod> {
        self.methods.iter().find(|m| m.sig.selector == selector)
    }

    pub fn methods(&self) -> &[NativeMethod] {
        &self.methods
    }
}

/// Immutable dispatch table of every registered built-in, assembled once at
/// process init and passed to the bridge by reference. There is no mutable
/// global registry.
pub struct ContractTable {
    contracts: Vec<NativeContract>,
}

impl ContractTable {
    pub fn new(contracts: Vec<NativeContract>) -> Self {
        Self { contracts }
    }

    pub fn find_contract(&self, address: &Address) -> Option<&NativeContract> {
        self.contracts.iter().find(|c| c.address == *address)
    }

    pub fn contracts(&self) -> &[NativeContract] {
        &self.contracts
    }
}
