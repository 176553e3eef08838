// Copyright 2021-2023 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

use rlp_derive::{RlpDecodable, RlpEncodable};

use thor_shared::{Address, BlockNum, TokenAmount};
use thor_state::{Scalar, SlotMap, StateCursor};

use super::ADDRESS;

/// Validator lifecycle. Zero doubles as "no record".
pub const STATUS_NONE: u8 = 0;
pub const STATUS_QUEUED: u8 = 1;
pub const STATUS_ACTIVE: u8 = 2;
pub const STATUS_SIGNALED_EXIT: u8 = 3;
pub const STATUS_EXITED: u8 = 4;

/// One validation, keyed by the node master address.
///
/// While the status is queued or active, the contract balance holds exactly
/// `stake + queued_stake` of the endorsor's tokens (plus every delegation's
/// stake). `weight` carries the multiplier-scaled delegations on top of the
/// own stake.
#[derive(RlpEncodable, RlpDecodable, Clone, Debug, Default, PartialEq)]
pub struct Validation {
    pub endorsor: Address,
    pub beneficiary: Address,
    pub stake: TokenAmount,
    pub queued_stake: TokenAmount,
    pub delegated_stake: TokenAmount,
    pub weight: TokenAmount,
    pub delegator_rewards: TokenAmount,
    pub status: u8,
    pub period: u32,
    pub start_period: u32,
    pub exit_block: BlockNum,
    pub completed_periods: u32,
    pub last_offline_block: BlockNum,
    pub prev: Address,
    pub next: Address,
}

impl Validation {
    pub fn exists(&self) -> bool {
        self.status != STATUS_NONE
    }

    pub fn locked_stake(&self) -> TokenAmount {
        self.stake.clone() + &self.queued_stake
    }
}

#[derive(RlpEncodable, RlpDecodable, Clone, Debug, Default, PartialEq)]
pub struct Delegation {
    pub validator: Address,
    pub stake: TokenAmount,
    pub multiplier: u8,
    pub status: u8,
    pub created_at: BlockNum,
}

impl Delegation {
    pub fn exists(&self) -> bool {
        self.status != STATUS_NONE
    }

    /// Multiplier-scaled contribution to the validator's weight.
    pub fn weight(&self) -> TokenAmount {
        TokenAmount::from_wei(self.stake.wei() * self.multiplier as u64 / 100u64)
    }
}

const SLOT_VALIDATIONS: u64 = 0;
const SLOT_DELEGATIONS: u64 = 1;
const SLOT_NEXT_DELEGATION_ID: u64 = 2;
const SLOT_ACTIVE_HEAD: u64 = 3;
const SLOT_ACTIVE_TAIL: u64 = 4;
const SLOT_QUEUED_HEAD: u64 = 5;
const SLOT_QUEUED_TAIL: u64 = 6;
const SLOT_TOTAL_STAKE: u64 = 7;
const SLOT_ACTIVE_STAKE: u64 = 8;
const SLOT_QUEUED_STAKE: u64 = 9;
const SLOT_ACTIVE_COUNT: u64 = 10;
const SLOT_QUEUED_COUNT: u64 = 11;
const SLOT_CURRENT_PERIOD: u64 = 12;

/// Which intrusive list a validation sits in.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Roster {
    Active,
    Queued,
}

pub struct Staker {
    pub validations: SlotMap<Address, Validation>,
    pub delegations: SlotMap<u64, Delegation>,
    pub next_delegation_id: Scalar<u64>,
    active_head: Scalar<Address>,
    active_tail: Scalar<Address>,
    queued_head: Scalar<Address>,
    queued_tail: Scalar<Address>,
    pub total_stake: Scalar<TokenAmount>,
    pub active_stake: Scalar<TokenAmount>,
    pub queued_stake: Scalar<TokenAmount>,
    pub active_count: Scalar<u64>,
    pub queued_count: Scalar<u64>,
    pub current_period: Scalar<u32>,
}

impl Default for Staker {
    fn default() -> Self {
        Self::new()
    }
}

impl Staker {
    pub fn new() -> Self {
        Self {
            validations: SlotMap::new(*ADDRESS, SLOT_VALIDATIONS),
            delegations: SlotMap::new(*ADDRESS, SLOT_DELEGATIONS),
            next_delegation_id: Scalar::new(*ADDRESS, SLOT_NEXT_DELEGATION_ID),
            active_head: Scalar::new(*ADDRESS, SLOT_ACTIVE_HEAD),
            active_tail: Scalar::new(*ADDRESS, SLOT_ACTIVE_TAIL),
            queued_head: Scalar::new(*ADDRESS, SLOT_QUEUED_HEAD),
            queued_tail: Scalar::new(*ADDRESS, SLOT_QUEUED_TAIL),
            total_stake: Scalar::new(*ADDRESS, SLOT_TOTAL_STAKE),
            active_stake: Scalar::new(*ADDRESS, SLOT_ACTIVE_STAKE),
            queued_stake: Scalar::new(*ADDRESS, SLOT_QUEUED_STAKE),
            active_count: Scalar::new(*ADDRESS, SLOT_ACTIVE_COUNT),
            queued_count: Scalar::new(*ADDRESS, SLOT_QUEUED_COUNT),
            current_period: Scalar::new(*ADDRESS, SLOT_CURRENT_PERIOD),
        }
    }

    fn head_of(&self, roster: Roster) -> &Scalar<Address> {
        match roster {
            Roster::Active => &self.active_head,
            Roster::Queued => &self.queued_head,
        }
    }

    fn tail_of(&self, roster: Roster) -> &Scalar<Address> {
        match roster {
            Roster::Active => &self.active_tail,
            Roster::Queued => &self.queued_tail,
        }
    }

    fn count_of(&self, roster: Roster) -> &Scalar<u64> {
        match roster {
            Roster::Active => &self.active_count,
            Roster::Queued => &self.queued_count,
        }
    }

    pub fn first(&self, state: &dyn StateCursor, roster: Roster) -> thor_state::Result<Address> {
        self.head_of(roster).get(state)
    }

    /// Appends the (already stored) validation to a roster's tail and
    /// rewrites its link fields.
    pub fn link(
        &self,
        state: &mut dyn StateCursor,
        roster: Roster,
        master: &Address,
        validation: &mut Validation,
    ) -> thor_state::Result<()> {
        let tail = self.tail_of(roster).get(state)?;
        validation.prev = tail;
        validation.next = Address::zero();
        self.validations.put(state, master, validation)?;

        if tail.is_zero() {
            self.head_of(roster).put(state, master)?;
        } else {
            let mut prev = self.validations.get(state, &tail)?;
            prev.next = *master;
            self.validations.put(state, &tail, &prev)?;
        }
        self.tail_of(roster).put(state, master)?;
        let count = self.count_of(roster).get(state)?;
        self.count_of(roster).put(state, &(count + 1))
    }

    /// Unlinks from a roster, leaving the record itself in place.
    pub fn unlink(
        &self,
        state: &mut dyn StateCursor,
        roster: Roster,
        master: &Address,
        validation: &mut Validation,
    ) -> thor_state::Result<()> {
        if validation.prev.is_zero() {
            self.head_of(roster).put(state, &validation.next)?;
        } else {
            let mut prev = self.validations.get(state, &validation.prev)?;
            prev.next = validation.next;
            self.validations.put(state, &validation.prev, &prev)?;
        }
        if validation.next.is_zero() {
            self.tail_of(roster).put(state, &validation.prev)?;
        } else {
            let mut next = self.validations.get(state, &validation.next)?;
            next.prev = validation.prev;
            self.validations.put(state, &validation.next, &next)?;
        }
        validation.prev = Address::zero();
        validation.next = Address::zero();
        self.validations.put(state, master, validation)?;
        let count = self.count_of(roster).get(state)?;
        self.count_of(roster).put(state, &(count - 1))
    }

    pub fn add_total(
        &self,
        state: &mut dyn StateCursor,
        which: &Scalar<TokenAmount>,
        delta: &TokenAmount,
    ) -> thor_state::Result<()> {
        let total = which.get(state)? + delta;
        which.put(state, &total)
    }

    pub fn sub_total(
        &self,
        state: &mut dyn StateCursor,
        which: &Scalar<TokenAmount>,
        delta: &TokenAmount,
    ) -> thor_state::Result<()> {
        let total = which.get(state)? - delta.clone();
        which.put(state, &total)
    }
}
