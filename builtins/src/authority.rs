// Copyright 2021-2023 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

//! The authority roster: an intrusive doubly-linked list of block-proposer
//! candidates keyed by node master, ordered by insertion. Eligibility is
//! backed by the endorsor's energy balance.

use ethabi::{ParamType, Token};
use lazy_static::lazy_static;
use rlp_derive::{RlpDecodable, RlpEncodable};

use thor_shared::abi::{self, EventSig, MethodSig};
use thor_shared::keys::{KEY_MAX_BLOCK_PROPOSERS, KEY_PROPOSER_ENDORSEMENT};
use thor_shared::{address_from_name, bytes32_from_label, Address, Bytes32};
use thor_state::{Scalar, SlotMap, StateCursor};
use thor_vm::{Environment, NativeContract, NativeMethod, Result as VmResult};

use crate::energy::Energy;
use crate::params::Params;

lazy_static! {
    pub static ref ADDRESS: Address = address_from_name(b"Authority");
    static ref EVENT_CANDIDATE: EventSig = EventSig::new(
        "Candidate",
        &[ParamType::Address],
        &[ParamType::FixedBytes(32)],
    );
}

const SLOT_HEAD: u64 = 0;
const SLOT_TAIL: u64 = 1;
const SLOT_ENTRIES: u64 = 2;
const SLOT_ACTIVE_COUNT: u64 = 3;

/// One roster entry. `listed` distinguishes a stored head/tail node (whose
/// link fields are zero) from an absent record.
#[derive(RlpEncodable, RlpDecodable, Clone, Debug, Default, PartialEq)]
pub struct Entry {
    pub listed: bool,
    pub endorsor: Address,
    pub identity: Bytes32,
    pub active: bool,
    pub prev: Address,
    pub next: Address,
}

pub struct Authority {
    head: Scalar<Address>,
    tail: Scalar<Address>,
    entries: SlotMap<Address, Entry>,
    active_count: Scalar<u64>,
}

impl Default for Authority {
    fn default() -> Self {
        Self::new()
    }
}

impl Authority {
    pub fn new() -> Self {
        Self {
            head: Scalar::new(*ADDRESS, SLOT_HEAD),
            tail: Scalar::new(*ADDRESS, SLOT_TAIL),
            entries: SlotMap::new(*ADDRESS, SLOT_ENTRIES),
            active_count: Scalar::new(*ADDRESS, SLOT_ACTIVE_COUNT),
        }
    }

    pub fn get(&self, state: &dyn StateCursor, master: &Address) -> thor_state::Result<Entry> {
        self.entries.get(state, master)
    }

    pub fn first(&self, state: &dyn StateCursor) -> thor_state::Result<Address> {
        self.head.get(state)
    }

    pub fn next(&self, state: &dyn StateCursor, master: &Address) -> thor_state::Result<Address> {
        Ok(self.entries.get(state, master)?.next)
    }

    pub fn active_count(&self, state: &dyn StateCursor) -> thor_state::Result<u64> {
        self.active_count.get(state)
    }

    /// Appends a candidate to the tail. False when the master is already
    /// listed or the roster is at the proposer cap.
    pub fn add(
        &self,
        state: &mut dyn StateCursor,
        master: &Address,
        endorsor: &Address,
        identity: &Bytes32,
        max_proposers: u64,
    ) -> thor_state::Result<bool> {
        if self.entries.get(state, master)?.listed {
            return Ok(false);
        }
        if self.active_count.get(state)? >= max_proposers {
            return Ok(false);
        }

        let tail = self.tail.get(state)?;
        let entry = Entry {
            listed: true,
            endorsor: *endorsor,
            identity: *identity,
            active: true,
            prev: tail,
            next: Address::zero(),
        };
        self.entries.put(state, master, &entry)?;

        if tail.is_zero() {
            self.head.put(state, master)?;
        } else {
            let mut prev = self.entries.get(state, &tail)?;
            prev.next = *master;
            self.entries.put(state, &tail, &prev)?;
        }
        self.tail.put(state, master)?;
        let new_active_count = self.active_count.get(state)? + 1;
        self.active_count.put(state, &new_active_count)?;
        Ok(true)
    }

    /// Unlinks and deletes a candidate. False when not listed. Deleting
    /// clears dedup state, so a later `add` of the same master succeeds.
    pub fn revoke(&self, state: &mut dyn StateCursor, master: &Address) -> thor_state::Result<bool> {
        let entry = self.entries.get(state, master)?;
        if !entry.listed {
            return Ok(false);
        }

        if entry.prev.is_zero() {
            self.head.put(state, &entry.next)?;
        } else {
            let mut prev = self.entries.get(state, &entry.prev)?;
            prev.next = entry.next;
            self.entries.put(state, &entry.prev, &prev)?;
        }
        if entry.next.is_zero() {
            self.tail.put(state, &entry.prev)?;
        } else {
            let mut next = self.entries.get(state, &entry.next)?;
            next.prev = entry.prev;
            self.entries.put(state, &entry.next, &next)?;
        }

        self.entries.put(state, master, &Entry::default())?;
        if entry.active {
            let new_active_count = self.active_count.get(state)? - 1;
            self.active_count.put(state, &new_active_count)?;
        }
        Ok(true)
    }

    /// Flips the active flag; used by the consensus caller when a proposer
    /// goes offline or comes back.
    pub fn set_active(
        &self,
        state: &mut dyn StateCursor,
        master: &Address,
        active: bool,
    ) -> thor_state::Result<bool> {
        let mut entry = self.entries.get(state, master)?;
        if !entry.listed || entry.active == active {
            return Ok(false);
        }
        entry.active = active;
        self.entries.put(state, master, &entry)?;
        let count = self.active_count.get(state)?;
        let count = if active { count + 1 } else { count - 1 };
        self.active_count.put(state, &count)?;
        Ok(true)
    }
}

fn emit_candidate(env: &mut Environment, master: Address, action: &[u8]) -> VmResult<()> {
    env.log(
        &EVENT_CANDIDATE,
        &[abi::token_address(master)],
        &[abi::token_bytes32(bytes32_from_label(action))],
    )
}

fn native_executor(env: &mut Environment) -> VmResult<Vec<Token>> {
    let executor = Params::new().executor(env)?;
    Ok(vec![abi::token_address(executor)])
}

fn native_add(env: &mut Environment) -> VmResult<Vec<Token>> {
    let master = abi::as_address(&env.args()[0]);
    let endorsor = abi::as_address(&env.args()[1]);
    let identity = abi::as_bytes32(&env.args()[2]);
    crate::params::require_executor(env)?;
    env.require(
        !master.is_zero() && !endorsor.is_zero() && !identity.is_zero(),
        "builtin: invalid candidate",
    )?;

    let max = Params::new().get_u64(env, &KEY_MAX_BLOCK_PROPOSERS)?;
    let added = Authority::new().add(env, &master, &endorsor, &identity, max)?;
    if added {
        emit_candidate(env, master, b"added")?;
    }
    Ok(vec![abi::token_bool(added)])
}

fn native_revoke(env: &mut Environment) -> VmResult<Vec<Token>> {
    let master = abi::as_address(&env.args()[0]);
    let authority = Authority::new();
    let entry = authority.get(env, &master)?;
    if !entry.listed {
        return Ok(vec![abi::token_bool(false)]);
    }

    // Anyone may revoke an under-endorsed candidate; the executor may revoke
    // unconditionally.
    let executor = Params::new().executor(env)?;
    if env.caller() != executor {
        let threshold = Params::new().get(env, &KEY_PROPOSER_ENDORSEMENT)?;
        let balance = Energy::new().balance_of(env, &entry.endorsor, env.block_context().time)?;
        env.require(balance < threshold, "builtin: candidate still endorsed")?;
    }

    let revoked = authority.revoke(env, &master)?;
    if revoked {
        emit_candidate(env, master, b"revoked")?;
    }
    Ok(vec![abi::token_bool(revoked)])
}

fn native_get(env: &mut Environment) -> VmResult<Vec<Token>> {
    let master = abi::as_address(&env.args()[0]);
    let entry = Authority::new().get(env, &master)?;
    Ok(vec![
        abi::token_bool(entry.listed),
        abi::token_address(entry.endorsor),
        abi::token_bytes32(entry.identity),
        abi::token_bool(entry.active),
    ])
}

fn native_first(env: &mut Environment) -> VmResult<Vec<Token>> {
    let head = Authority::new().first(env)?;
    Ok(vec![abi::token_address(head)])
}

fn native_next(env: &mut Environment) -> VmResult<Vec<Token>> {
    let master = abi::as_address(&env.args()[0]);
    let next = Authority::new().next(env, &master)?;
    Ok(vec![abi::token_address(next)])
}

pub fn native_contract() -> NativeContract {
    NativeContract::new(
        "Authority",
        *ADDRESS,
        vec![
            NativeMethod::new(
                MethodSig::new("executor", &[], &[ParamType::Address]),
                native_executor,
            ),
            NativeMethod::new(
                MethodSig::new(
                    "add",
                    &[
                        ParamType::Address,
                        ParamType::Address,
                        ParamType::FixedBytes(32),
                    ],
                    &[ParamType::Bool],
                ),
                native_add,
            ),
            NativeMethod::new(
                MethodSig::new("revoke", &[ParamType::Address], &[ParamType::Bool]),
                native_revoke,
            ),
            NativeMethod::new(
                MethodSig::new(
                    "get",
                    &[ParamType::Address],
                    &[
                        ParamType::Bool,
                        ParamType::Address,
                        ParamType::FixedBytes(32),
                        ParamType::Bool,
                    ],
                ),
                native_get,
            ),
            NativeMethod::new(
                MethodSig::new("first", &[], &[ParamType::Address]),
                native_first,
            ),
            NativeMethod::new(
                MethodSig::new("next", &[ParamType::Address], &[ParamType::Address]),
                native_next,
            ),
        ],
    )
}

#[cfg(test)]
mod tests {
    use thor_state::MemoryState;

    use super::*;

    fn m(label: &[u8]) -> Address {
        address_from_name(label)
    }

    fn add_three(state: &mut MemoryState) -> Authority {
        let authority = Authority::new();
        for label in [b"m1", b"m2", b"m3"] {
            let master = m(label);
            let endorsor = address_from_name(&[b'e', label[1]]);
            let identity = bytes32_from_label(&[b'i', label[1]]);
            assert!(authority
                .add(state, &master, &endorsor, &identity, 101)
                .unwrap());
        }
        authority
    }

    #[test]
    fn iteration_visits_each_entry_once() {
        let mut state = MemoryState::new();
        let authority = add_three(&mut state);

        let mut seen = Vec::new();
        let mut cursor = authority.first(&state).unwrap();
        while !cursor.is_zero() {
            assert!(!seen.contains(&cursor));
            seen.push(cursor);
            cursor = authority.next(&state, &cursor).unwrap();
        }
        assert_eq!(seen, vec![m(b"m1"), m(b"m2"), m(b"m3")]);
        assert_eq!(authority.active_count(&state).unwrap(), 3);
    }

    #[test]
    fn duplicate_add_fails() {
        let mut state = MemoryState::new();
        let authority = add_three(&mut state);
        assert!(!authority
            .add(
                &mut state,
                &m(b"m2"),
                &m(b"e9"),
                &bytes32_from_label(b"i9"),
                101
            )
            .unwrap());
    }

    #[test]
    fn proposer_cap_blocks_add() {
        let mut state = MemoryState::new();
        let authority = Authority::new();
        assert!(authority
            .add(&mut state, &m(b"m1"), &m(b"e1"), &bytes32_from_label(b"i1"), 1)
            .unwrap());
        assert!(!authority
            .add(&mut state, &m(b"m2"), &m(b"e2"), &bytes32_from_label(b"i2"), 1)
            .unwrap());
    }

    #[test]
    fn revoke_middle_relinks() {
        let mut state = MemoryState::new();
        let authority = add_three(&mut state);
        assert!(authority.revoke(&mut state, &m(b"m2")).unwrap());

        assert_eq!(authority.first(&state).unwrap(), m(b"m1"));
        assert_eq!(authority.next(&state, &m(b"m1")).unwrap(), m(b"m3"));
        assert!(!authority.get(&state, &m(b"m2")).unwrap().listed);
        assert_eq!(authority.active_count(&state).unwrap(), 2);
    }

    #[test]
    fn revoke_head_moves_head() {
        let mut state = MemoryState::new();
        let authority = add_three(&mut state);
        assert!(authority.revoke(&mut state, &m(b"m1")).unwrap());
        assert_eq!(authority.first(&state).unwrap(), m(b"m2"));
        assert!(authority.get(&state, &m(b"m2")).unwrap().prev.is_zero());
    }

    #[test]
    fn revoke_then_re_add_succeeds() {
        let mut state = MemoryState::new();
        let authority = add_three(&mut state);
        assert!(authority.revoke(&mut state, &m(b"m3")).unwrap());
        assert!(authority
            .add(
                &mut state,
                &m(b"m3"),
                &m(b"e3"),
                &bytes32_from_label(b"i3"),
                101
            )
            .unwrap());
        assert_eq!(authority.next(&state, &m(b"m2")).unwrap(), m(b"m3"));
    }

    #[test]
    fn revoke_last_leaves_empty_list() {
        let mut state = MemoryState::new();
        let authority = Authority::new();
        authority
            .add(&mut state, &m(b"m1"), &m(b"e1"), &bytes32_from_label(b"i1"), 101)
            .unwrap();
        authority.revoke(&mut state, &m(b"m1")).unwrap();
        assert!(authority.first(&state).unwrap().is_zero());
        assert_eq!(authority.active_count(&state).unwrap(), 0);
    }

    #[test]
    fn set_active_tracks_count() {
        let mut state = MemoryState::new();
        let authority = add_three(&mut state);
        assert!(authority.set_active(&mut state, &m(b"m2"), false).unwrap());
        assert_eq!(authority.active_count(&state).unwrap(), 2);
        // Idempotent flip reports false.
        assert!(!authority.set_active(&mut state, &m(b"m2"), false).unwrap());
        assert!(authority.set_active(&mut state, &m(b"m2"), true).unwrap());
        assert_eq!(authority.active_count(&state).unwrap(), 3);
    }
}
