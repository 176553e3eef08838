// Copyright 2021-2023 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

use std::collections::HashMap;

use thor_shared::{Address, Bytes32, TokenAmount};

use crate::{Result, StateCursor, StateError};

/// HashMap-backed cursor for tests and tooling.
///
/// `commit` labels the current contents with a root so `spawn` can hand out
/// historical views the way the real trie does.
#[derive(Clone, Default)]
pub struct MemoryState {
    balances: HashMap<Address, TokenAmount>,
    storage: HashMap<(Address, Bytes32), Vec<u8>>,
    code_hashes: HashMap<Address, Bytes32>,
    roots: HashMap<Bytes32, Snapshot>,
}

#[derive(Clone, Default)]
struct Snapshot {
    balances: HashMap<Address, TokenAmount>,
    storage: HashMap<(Address, Bytes32), Vec<u8>>,
    code_hashes: HashMap<Address, Bytes32>,
}

impl MemoryState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Labels the current contents as the state root of a block.
    pub fn commit(&mut self, root: Bytes32) {
        self.roots.insert(
            root,
            Snapshot {
                balances: self.balances.clone(),
                storage: self.storage.clone(),
                code_hashes: self.code_hashes.clone(),
            },
        );
    }

    /// Marks an account as carrying code, for `hasCode`-style queries.
    pub fn set_code_hash(&mut self, addr: Address, hash: Bytes32) {
        self.code_hashes.insert(addr, hash);
    }
}

impl StateCursor for MemoryState {
    fn get_balance(&self, addr: &Address) -> Result<TokenAmount> {
        Ok(self.balances.get(addr).cloned().unwrap_or_default())
    }

    fn set_balance(&mut self, addr: &Address, value: TokenAmount) -> Result<()> {
        if value.is_zero() {
            self.balances.remove(addr);
        } else {
            self.balances.insert(*addr, value);
        }
        Ok(())
    }

    fn get_storage(&self, addr: &Address, key: &Bytes32) -> Result<Bytes32> {
        let raw = self.get_raw_storage(addr, key)?;
        if raw.is_empty() {
            return Ok(Bytes32::zero());
        }
        let mut buf = [0u8; 32];
        let n = raw.len().min(32);
        buf[..n].copy_from_slice(&raw[..n]);
        Ok(Bytes32::from(buf))
    }

    fn set_storage(&mut self, addr: &Address, key: &Bytes32, value: Bytes32) -> Result<()> {
        let raw = if value.is_zero() {
            Vec::new()
        } else {
            value.as_bytes().to_vec()
        };
        self.set_raw_storage(addr, key, raw)
    }

    fn get_raw_storage(&self, addr: &Address, key: &Bytes32) -> Result<Vec<u8>> {
        Ok(self
            .storage
            .get(&(*addr, *key))
            .cloned()
            .unwrap_or_default())
    }

    fn set_raw_storage(&mut self, addr: &Address, key: &Bytes32, value: Vec<u8>) -> Result<()> {
        if value.is_empty() {
            self.storage.remove(&(*addr, *key));
        } else {
            self.storage.insert((*addr, *key), value);
        }
        Ok(())
    }

    fn get_code_hash(&self, addr: &Address) -> Result<Bytes32> {
        Ok(self.code_hashes.get(addr).copied().unwrap_or_default())
    }

    fn exists(&self, addr: &Address) -> Result<bool> {
        Ok(self.balances.contains_key(addr)
            || self.code_hashes.contains_key(addr)
            || self.storage.keys().any(|(a, _)| a == addr))
    }

    fn spawn(&self, root: &Bytes32) -> Result<Box<dyn StateCursor>> {
        let snap = self
            .roots
            .get(root)
            .ok_or(StateError::UnknownRoot(*root))?;
        Ok(Box::new(MemoryState {
            balances: snap.balances.clone(),
            storage: snap.storage.clone(),
            code_hashes: snap.code_hashes.clone(),
            roots: HashMap::new(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use thor_shared::address_from_name;

    use super::*;

    #[test]
    fn spawn_sees_committed_contents_only() {
        let mut state = MemoryState::new();
        let a = address_from_name(b"a");
        state.set_balance(&a, TokenAmount::from_whole(1)).unwrap();
        let root = Bytes32::from_low_u64_be(1);
        state.commit(root);
        state.set_balance(&a, TokenAmount::from_whole(9)).unwrap();

        let old = state.spawn(&root).unwrap();
        assert_eq!(old.get_balance(&a).unwrap(), TokenAmount::from_whole(1));
        assert_eq!(state.get_balance(&a).unwrap(), TokenAmount::from_whole(9));
    }

    #[test]
    fn spawn_unknown_root_fails() {
        let state = MemoryState::new();
        let result = state.spawn(&Bytes32::from_low_u64_be(7));
        assert!(matches!(result, Err(StateError::UnknownRoot(_))));
    }

    #[test]
    fn storage_bytes32_view() {
        let mut state = MemoryState::new();
        let a = address_from_name(b"c");
        let key = Bytes32::from_low_u64_be(5);
        assert_eq!(state.get_storage(&a, &key).unwrap(), Bytes32::zero());
        let value = Bytes32::from_low_u64_be(0xbeef);
        state.set_storage(&a, &key, value).unwrap();
        assert_eq!(state.get_storage(&a, &key).unwrap(), value);
        state.set_storage(&a, &key, Bytes32::zero()).unwrap();
        assert!(state.get_raw_storage(&a, &key).unwrap().is_empty());
    }
}
