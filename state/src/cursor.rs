// Copyright 2021-2023 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

use thor_shared::{Address, Bytes32, TokenAmount};

use crate::Result;

/// One block's mutable view of the state trie.
///
/// A cursor is the only object authorized to mutate storage; it is passed by
/// reference downward and never shared across threads. Mutations against one
/// cursor are totally ordered by the caller.
pub trait StateCursor {
    /// Token (VET) balance of an account.
    fn get_balance(&self, addr: &Address) -> Result<TokenAmount>;
    fn set_balance(&mut self, addr: &Address, value: TokenAmount) -> Result<()>;

    /// 32-byte storage value, zero when absent.
    fn get_storage(&self, addr: &Address, key: &Bytes32) -> Result<Bytes32>;
    fn set_storage(&mut self, addr: &Address, key: &Bytes32, value: Bytes32) -> Result<()>;

    /// Ad-hoc structured blob at an externally supplied position; empty when
    /// absent. Zero values and absence are indistinguishable on chain.
    fn get_raw_storage(&self, addr: &Address, key: &Bytes32) -> Result<Vec<u8>>;
    fn set_raw_storage(&mut self, addr: &Address, key: &Bytes32, value: Vec<u8>) -> Result<()>;

    /// Hash of the account's code; zero for code-less accounts.
    fn get_code_hash(&self, addr: &Address) -> Result<Bytes32>;

    fn exists(&self, addr: &Address) -> Result<bool>;

    /// Read-only historical view rooted at an earlier block's state root.
    fn spawn(&self, root: &Bytes32) -> Result<Box<dyn StateCursor>>;
}
