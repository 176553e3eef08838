// Copyright 2021-2023 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

//! Typed views over a contract's storage. Each contract partitions its
//! storage into numbered slots; a slot holds a scalar, a hashed map, a
//! length-prefixed array, or an externally positioned blob.
//!
//! Gas accounting is not done here; callers charge before touching storage.

use std::marker::PhantomData;

use thor_shared::hash::blake2b256;
use thor_shared::{Address, Bytes32};

use crate::{Result, StateCursor, StorageValue};

fn slot_position(slot: u64) -> Bytes32 {
    Bytes32::from_low_u64_be(slot)
}

/// A single value at the slot's derived position.
pub struct Scalar<T> {
    addr: Address,
    pos: Bytes32,
    _marker: PhantomData<T>,
}

impl<T: StorageValue> Scalar<T> {
    pub fn new(addr: Address, slot: u64) -> Self {
        Self {
            addr,
            pos: slot_position(slot),
            _marker: PhantomData,
        }
    }

    pub fn get(&self, state: &dyn StateCursor) -> Result<T> {
        T::decode_value(&state.get_raw_storage(&self.addr, &self.pos)?)
    }

    pub fn put(&self, state: &mut dyn StateCursor, value: &T) -> Result<()> {
        state.set_raw_storage(&self.addr, &self.pos, value.encode_value())
    }
}

/// Key/value entries at `blake2b(slot ‖ key)`.
pub struct SlotMap<K, V> {
    addr: Address,
    pos: Bytes32,
    _marker: PhantomData<(K, V)>,
}

impl<K: StorageValue, V: StorageValue> SlotMap<K, V> {
    pub fn new(addr: Address, slot: u64) -> Self {
        Self {
            addr,
            pos: slot_position(slot),
            _marker: PhantomData,
        }
    }

    /// Derived storage position of `key`'s entry.
    pub fn position(&self, key: &K) -> Bytes32 {
        let encoded = key.encode_value();
        blake2b256(&[self.pos.as_bytes(), encoded.as_slice()])
    }

    pub fn get(&self, state: &dyn StateCursor, key: &K) -> Result<V> {
        V::decode_value(&state.get_raw_storage(&self.addr, &self.position(key))?)
    }

    pub fn put(&self, state: &mut dyn StateCursor, key: &K, value: &V) -> Result<()> {
        state.set_raw_storage(&self.addr, &self.position(key), value.encode_value())
    }
}

/// Length at the slot position, element `i` at `blake2b(slot ‖ i)`.
pub struct SlotArray<T> {
    addr: Address,
    pos: Bytes32,
    _marker: PhantomData<T>,
}

impl<T: StorageValue> SlotArray<T> {
    pub fn new(addr: Address, slot: u64) -> Self {
        Self {
            addr,
            pos: slot_position(slot),
            _marker: PhantomData,
        }
    }

    fn elem_position(&self, index: u64) -> Bytes32 {
        let index = index.to_be_bytes();
        blake2b256(&[self.pos.as_bytes(), index.as_slice()])
    }

    pub fn len(&self, state: &dyn StateCursor) -> Result<u64> {
        u64::decode_value(&state.get_raw_storage(&self.addr, &self.pos)?)
    }

    pub fn is_empty(&self, state: &dyn StateCursor) -> Result<bool> {
        Ok(self.len(state)? == 0)
    }

    /// Truncation helper; does not clear the abandoned element positions.
    pub fn set_len(&self, state: &mut dyn StateCursor, len: u64) -> Result<()> {
        state.set_raw_storage(&self.addr, &self.pos, len.encode_value())
    }

    pub fn get(&self, state: &dyn StateCursor, index: u64) -> Result<T> {
        T::decode_value(&state.get_raw_storage(&self.addr, &self.elem_position(index))?)
    }

    pub fn set(&self, state: &mut dyn StateCursor, index: u64, value: &T) -> Result<()> {
        state.set_raw_storage(&self.addr, &self.elem_position(index), value.encode_value())
    }

    pub fn append(&self, state: &mut dyn StateCursor, value: &T) -> Result<()> {
        let len = self.len(state)?;
        self.set(state, len, value)?;
        self.set_len(state, len + 1)
    }
}

/// A blob at an externally supplied position.
pub struct Raw<T> {
    addr: Address,
    pos: Bytes32,
    _marker: PhantomData<T>,
}

impl<T: StorageValue> Raw<T> {
    pub fn new(addr: Address, pos: Bytes32) -> Self {
        Self {
            addr,
            pos,
            _marker: PhantomData,
        }
    }

    pub fn get(&self, state: &dyn StateCursor) -> Result<T> {
        T::decode_value(&state.get_raw_storage(&self.addr, &self.pos)?)
    }

    pub fn put(&self, state: &mut dyn StateCursor, value: &T) -> Result<()> {
        state.set_raw_storage(&self.addr, &self.pos, value.encode_value())
    }
}

#[cfg(test)]
mod tests {
    use thor_shared::address_from_name;

    use super::*;
    use crate::MemoryState;

    #[test]
    fn scalar_round_trip() {
        let mut state = MemoryState::new();
        let contract = address_from_name(b"Params");
        let slot = Scalar::<u64>::new(contract, 0);
        assert_eq!(slot.get(&state).unwrap(), 0);
        slot.put(&mut state, &42).unwrap();
        assert_eq!(slot.get(&state).unwrap(), 42);
    }

    #[test]
    fn map_entries_do_not_collide() {
        let mut state = MemoryState::new();
        let contract = address_from_name(b"Energy");
        let map = SlotMap::<Address, u64>::new(contract, 1);
        let a = address_from_name(b"a");
        let b = address_from_name(b"b");
        map.put(&mut state, &a, &1).unwrap();
        map.put(&mut state, &b, &2).unwrap();
        assert_eq!(map.get(&state, &a).unwrap(), 1);
        assert_eq!(map.get(&state, &b).unwrap(), 2);
    }

    #[test]
    fn same_slot_different_flavor_is_disjoint_per_slot() {
        let mut state = MemoryState::new();
        let contract = address_from_name(b"Energy");
        let m1 = SlotMap::<Address, u64>::new(contract, 1);
        let m2 = SlotMap::<Address, u64>::new(contract, 2);
        let a = address_from_name(b"a");
        m1.put(&mut state, &a, &1).unwrap();
        assert_eq!(m2.get(&state, &a).unwrap(), 0);
    }

    #[test]
    fn array_append_get_truncate() {
        let mut state = MemoryState::new();
        let contract = address_from_name(b"Authority");
        let arr = SlotArray::<u64>::new(contract, 3);
        for v in [10, 20, 30] {
            arr.append(&mut state, &v).unwrap();
        }
        assert_eq!(arr.len(&state).unwrap(), 3);
        assert_eq!(arr.get(&state, 1).unwrap(), 20);
        arr.set(&mut state, 1, &21).unwrap();
        assert_eq!(arr.get(&state, 1).unwrap(), 21);
        arr.set_len(&mut state, 1).unwrap();
        assert_eq!(arr.len(&state).unwrap(), 1);
        assert_eq!(arr.get(&state, 0).unwrap(), 10);
    }

    #[test]
    fn zero_put_clears_the_entry() {
        let mut state = MemoryState::new();
        let contract = address_from_name(b"Params");
        let slot = Scalar::<u64>::new(contract, 0);
        slot.put(&mut state, &42).unwrap();
        slot.put(&mut state, &0).unwrap();
        let raw = state
            .get_raw_storage(&contract, &Bytes32::from_low_u64_be(0))
            .unwrap();
        assert!(raw.is_empty());
    }
}
