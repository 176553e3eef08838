// Copyright 2021-2023 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

//! The built-in contracts hosted at well-known addresses: the Params
//! governance registry, the Authority proposer roster, the Energy fee token,
//! the post-fork Staker, per-account Prototype metadata and the chain
//! Extension.
//!
//! Each module carries its state layer (typed slot accessors over a cursor)
//! plus the native methods the dispatch bridge binds to its address.

pub mod authority;
pub mod energy;
pub mod extension;
pub mod params;
pub mod prototype;
pub mod staker;
pub mod testing;

use thor_vm::ContractTable;

/// Assembles the immutable dispatch table of every built-in contract.
pub fn contract_table() -> ContractTable {
    ContractTable::new(vec![
        params::native_contract(),
        authority::native_contract(),
        energy::native_contract(),
        staker::native_contract(),
        prototype::native_contract(),
        extension::native_contract(),
    ])
}
