// Copyright 2021-2023 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

//! Per-account prototype metadata: the account master, per-contract credit
//! plans and user lists backing sponsored consumption, the sponsor set, and
//! historical balance queries.

use ethabi::{ParamType, Token};
use lazy_static::lazy_static;
use num_traits::Zero;
use rlp_derive::{RlpDecodable, RlpEncodable};

use thor_shared::abi::{self, EventSig, MethodSig};
use thor_shared::{address_from_name, bytes32_from_label, Address, BlockNum, BlockTime, TokenAmount};
use thor_state::{SlotMap, StateCursor};
use thor_vm::{ChainLookup, Environment, HeaderInfo, NativeContract, NativeMethod, Result as VmResult};

lazy_static! {
    pub static ref ADDRESS: Address = address_from_name(b"Prototype");
    static ref EVENT_MASTER: EventSig =
        EventSig::new("$Master", &[ParamType::Address], &[ParamType::Address]);
    static ref EVENT_CREDIT_PLAN: EventSig = EventSig::new(
        "$CreditPlan",
        &[ParamType::Address],
        &[ParamType::Uint(256), ParamType::Uint(256)],
    );
    static ref EVENT_USER: EventSig = EventSig::new(
        "$User",
        &[ParamType::Address, ParamType::Address],
        &[ParamType::FixedBytes(32)],
    );
    static ref EVENT_SPONSOR: EventSig = EventSig::new(
        "$Sponsor",
        &[ParamType::Address, ParamType::Address],
        &[ParamType::FixedBytes(32)],
    );
}

/// How far back the historical `balance`/`energy` queries may reach.
pub const MAX_BACK_TRACKING_BLOCK_NUMBER: BlockNum = 65_535;

const SLOT_MASTERS: u64 = 0;
const SLOT_CREDIT_PLANS: u64 = 1;
const SLOT_USERS: u64 = 2;
const SLOT_SPONSORS: u64 = 3;
const SLOT_CURRENT_SPONSOR: u64 = 4;

/// A sponsor's standing promise to every user of a contract.
#[derive(RlpEncodable, RlpDecodable, Clone, Debug, Default, PartialEq)]
pub struct CreditPlan {
    pub credit: TokenAmount,
    pub recovery_rate: TokenAmount,
}

/// Per-(contract, user) consumption state. `remaining` is the allowance left
/// as of `last_use`; it recovers linearly up to the plan's credit. A zero
/// `expiration` never expires.
#[derive(RlpEncodable, RlpDecodable, Clone, Debug, Default, PartialEq)]
pub struct UserRecord {
    pub remaining: TokenAmount,
    pub last_use: BlockTime,
    pub expiration: BlockTime,
}

#[derive(RlpEncodable, RlpDecodable, Clone, Debug, Default, PartialEq)]
struct AddressPair {
    a: Address,
    b: Address,
}

fn pair(a: &Address, b: &Address) -> AddressPair {
    AddressPair { a: *a, b: *b }
}

/// The time-decayed remaining allowance at `t`.
pub fn decayed_remaining(plan: &CreditPlan, user: &UserRecord, t: BlockTime) -> TokenAmount {
    if user.expiration != 0 && t >= user.expiration {
        return TokenAmount::zero();
    }
    let elapsed = t.saturating_sub(user.last_use);
    let recovered = user.remaining.clone() + plan.recovery_rate.clone() * elapsed;
    recovered.min(plan.credit.clone())
}

pub struct Prototype {
    masters: SlotMap<Address, Address>,
    credit_plans: SlotMap<Address, CreditPlan>,
    users: SlotMap<AddressPair, UserRecord>,
    sponsors: SlotMap<AddressPair, bool>,
    current_sponsors: SlotMap<Address, Address>,
}

impl Default for Prototype {
    fn default() -> Self {
        Self::new()
    }
}

impl Prototype {
    pub fn new() -> Self {
        Self {
            masters: SlotMap::new(*ADDRESS, SLOT_MASTERS),
            credit_plans: SlotMap::new(*ADDRESS, SLOT_CREDIT_PLANS),
            users: SlotMap::new(*ADDRESS, SLOT_USERS),
            sponsors: SlotMap::new(*ADDRESS, SLOT_SPONSORS),
            current_sponsors: SlotMap::new(*ADDRESS, SLOT_CURRENT_SPONSOR),
        }
    }

    /// The effective master: the stored one, or the account itself before a
    /// master was ever set.
    pub fn master_of(&self, state: &dyn StateCursor, addr: &Address) -> thor_state::Result<Address> {
        let stored = self.masters.get(state, addr)?;
        Ok(if stored.is_zero() { *addr } else { stored })
    }

    pub fn set_master(
        &self,
        state: &mut dyn StateCursor,
        addr: &Address,
        master: &Address,
    ) -> thor_state::Result<()> {
        self.masters.put(state, addr, master)
    }

    pub fn credit_plan(
        &self,
        state: &dyn StateCursor,
        contract: &Address,
    ) -> thor_state::Result<CreditPlan> {
        self.credit_plans.get(state, contract)
    }

    pub fn set_credit_plan(
        &self,
        state: &mut dyn StateCursor,
        contract: &Address,
        plan: &CreditPlan,
    ) -> thor_state::Result<()> {
        self.credit_plans.put(state, contract, plan)
    }

    pub fn user_record(
        &self,
        state: &dyn StateCursor,
        contract: &Address,
        user: &Address,
    ) -> thor_state::Result<UserRecord> {
        self.users.get(state, &pair(contract, user))
    }

    pub fn set_user_record(
        &self,
        state: &mut dyn StateCursor,
        contract: &Address,
        user: &Address,
        record: &UserRecord,
    ) -> thor_state::Result<()> {
        self.users.put(state, &pair(contract, user), record)
    }

    pub fn is_user(
        &self,
        state: &dyn StateCursor,
        contract: &Address,
        user: &Address,
    ) -> thor_state::Result<bool> {
        Ok(self.user_record(state, contract, user)? != UserRecord::default())
    }

    /// Registers a user with a full allowance under the current plan.
    pub fn add_user(
        &self,
        state: &mut dyn StateCursor,
        contract: &Address,
        user: &Address,
        t: BlockTime,
    ) -> thor_state::Result<()> {
        let plan = self.credit_plan(state, contract)?;
        self.set_user_record(
            state,
            contract,
            user,
            &UserRecord {
                remaining: plan.credit,
                last_use: t,
                expiration: 0,
            },
        )
    }

    pub fn remove_user(
        &self,
        state: &mut dyn StateCursor,
        contract: &Address,
        user: &Address,
    ) -> thor_state::Result<()> {
        self.set_user_record(state, contract, user, &UserRecord::default())
    }

    pub fn is_sponsor(
        &self,
        state: &dyn StateCursor,
        contract: &Address,
        sponsor: &Address,
    ) -> thor_state::Result<bool> {
        self.sponsors.get(state, &pair(contract, sponsor))
    }

    pub fn set_sponsor(
        &self,
        state: &mut dyn StateCursor,
        contract: &Address,
        sponsor: &Address,
        yes: bool,
    ) -> thor_state::Result<()> {
        self.sponsors.put(state, &pair(contract, sponsor), &yes)
    }

    pub fn current_sponsor(
        &self,
        state: &dyn StateCursor,
        contract: &Address,
    ) -> thor_state::Result<Address> {
        self.current_sponsors.get(state, contract)
    }

    pub fn select_sponsor(
        &self,
        state: &mut dyn StateCursor,
        contract: &Address,
        sponsor: &Address,
    ) -> thor_state::Result<()> {
        self.current_sponsors.put(state, contract, sponsor)
    }
}

fn require_master_of(env: &mut Environment, target: &Address) -> VmResult<()> {
    let master = Prototype::new().master_of(env, target)?;
    let caller = env.caller();
    env.require(caller == master, "builtin: master required")
}

/// The header backing a historical query, or `None` when the height is at or
/// beyond the current block (callers then read current state).
fn backtracked_header(env: &Environment, num: BlockNum) -> VmResult<Option<HeaderInfo>> {
    let current = env.block_context().number;
    if num >= current {
        return Ok(None);
    }
    let header = env.chain().header(num)?;
    Ok(header)
}

fn too_old(env: &Environment, num: BlockNum) -> bool {
    let current = env.block_context().number;
    num < current && current - num > MAX_BACK_TRACKING_BLOCK_NUMBER
}

fn native_master(env: &mut Environment) -> VmResult<Vec<Token>> {
    let target = abi::as_address(&env.args()[0]);
    let master = Prototype::new().master_of(env, &target)?;
    Ok(vec![abi::token_address(master)])
}

fn native_set_master(env: &mut Environment) -> VmResult<Vec<Token>> {
    let target = abi::as_address(&env.args()[0]);
    let new_master = abi::as_address(&env.args()[1]);
    require_master_of(env, &target)?;
    Prototype::new().set_master(env, &target, &new_master)?;
    env.log(
        &EVENT_MASTER,
        &[abi::token_address(target)],
        &[abi::token_address(new_master)],
    )?;
    Ok(vec![])
}

fn native_has_code(env: &mut Environment) -> VmResult<Vec<Token>> {
    let target = abi::as_address(&env.args()[0]);
    let hash = env.get_code_hash(&target)?;
    Ok(vec![abi::token_bool(!hash.is_zero())])
}

fn native_balance(env: &mut Environment) -> VmResult<Vec<Token>> {
    let target = abi::as_address(&env.args()[0]);
    let num = abi::as_block_num(&env.args()[1]);
    if too_old(env, num) {
        return Ok(vec![abi::token_amount(&TokenAmount::zero())]);
    }
    let balance = match backtracked_header(env, num)? {
        None => env.get_balance(&target)?,
        Some(header) => {
            env.use_gas(env.price_list().get_balance_gas)?;
            let old = env.spawn(&header.state_root)?;
            old.get_balance(&target)?
        }
    };
    Ok(vec![abi::token_amount(&balance)])
}

fn native_energy(env: &mut Environment) -> VmResult<Vec<Token>> {
    let target = abi::as_address(&env.args()[0]);
    let num = abi::as_block_num(&env.args()[1]);
    if too_old(env, num) {
        return Ok(vec![abi::token_amount(&TokenAmount::zero())]);
    }
    let energy = crate::energy::Energy::new();
    let balance = match backtracked_header(env, num)? {
        None => {
            let t = env.block_context().time;
            energy.balance_of(env, &target, t)?
        }
        Some(header) => {
            env.use_gas(env.price_list().sload_gas)?;
            let old = env.spawn(&header.state_root)?;
            energy.balance_of(old.as_ref(), &target, header.time)?
        }
    };
    Ok(vec![abi::token_amount(&balance)])
}

fn native_storage_for(env: &mut Environment) -> VmResult<Vec<Token>> {
    let target = abi::as_address(&env.args()[0]);
    let key = abi::as_bytes32(&env.args()[1]);
    let value = env.get_storage(&target, &key)?;
    Ok(vec![abi::token_bytes32(value)])
}

fn native_set_credit_plan(env: &mut Environment) -> VmResult<Vec<Token>> {
    let target = abi::as_address(&env.args()[0]);
    let credit = abi::as_amount(&env.args()[1]);
    let recovery_rate = abi::as_amount(&env.args()[2]);
    require_master_of(env, &target)?;
    Prototype::new().set_credit_plan(
        env,
        &target,
        &CreditPlan {
            credit: credit.clone(),
            recovery_rate: recovery_rate.clone(),
        },
    )?;
    env.log(
        &EVENT_CREDIT_PLAN,
        &[abi::token_address(target)],
        &[abi::token_amount(&credit), abi::token_amount(&recovery_rate)],
    )?;
    Ok(vec![])
}

fn native_credit_plan(env: &mut Environment) -> VmResult<Vec<Token>> {
    let target = abi::as_address(&env.args()[0]);
    let plan = Prototype::new().credit_plan(env, &target)?;
    Ok(vec![
        abi::token_amount(&plan.credit),
        abi::token_amount(&plan.recovery_rate),
    ])
}

fn native_is_user(env: &mut Environment) -> VmResult<Vec<Token>> {
    let target = abi::as_address(&env.args()[0]);
    let user = abi::as_address(&env.args()[1]);
    let is_user = Prototype::new().is_user(env, &target, &user)?;
    Ok(vec![abi::token_bool(is_user)])
}

fn native_add_user(env: &mut Environment) -> VmResult<Vec<Token>> {
    let target = abi::as_address(&env.args()[0]);
    let user = abi::as_address(&env.args()[1]);
    require_master_of(env, &target)?;
    let prototype = Prototype::new();
    let exists = prototype.is_user(env, &target, &user)?;
    env.require(!exists, "builtin: already a user")?;
    let t = env.block_context().time;
    prototype.add_user(env, &target, &user, t)?;
    env.log(
        &EVENT_USER,
        &[abi::token_address(target), abi::token_address(user)],
        &[abi::token_bytes32(bytes32_from_label(b"added"))],
    )?;
    Ok(vec![])
}

fn native_remove_user(env: &mut Environment) -> VmResult<Vec<Token>> {
    let target = abi::as_address(&env.args()[0]);
    let user = abi::as_address(&env.args()[1]);
    require_master_of(env, &target)?;
    let prototype = Prototype::new();
    let exists = prototype.is_user(env, &target, &user)?;
    env.require(exists, "builtin: not a user")?;
    prototype.remove_user(env, &target, &user)?;
    env.log(
        &EVENT_USER,
        &[abi::token_address(target), abi::token_address(user)],
        &[abi::token_bytes32(bytes32_from_label(b"removed"))],
    )?;
    Ok(vec![])
}

fn native_user_credit(env: &mut Environment) -> VmResult<Vec<Token>> {
    let target = abi::as_address(&env.args()[0]);
    let user = abi::as_address(&env.args()[1]);
    let prototype = Prototype::new();
    let record = prototype.user_record(env, &target, &user)?;
    if record == UserRecord::default() {
        return Ok(vec![abi::token_amount(&TokenAmount::zero())]);
    }
    let plan = prototype.credit_plan(env, &target)?;
    let remaining = decayed_remaining(&plan, &record, env.block_context().time);
    Ok(vec![abi::token_amount(&remaining)])
}

fn native_sponsor(env: &mut Environment) -> VmResult<Vec<Token>> {
    let target = abi::as_address(&env.args()[0]);
    let sponsor = env.caller();
    let prototype = Prototype::new();
    let already = prototype.is_sponsor(env, &target, &sponsor)?;
    env.require(!already, "builtin: already sponsored")?;
    prototype.set_sponsor(env, &target, &sponsor, true)?;
    env.log(
        &EVENT_SPONSOR,
        &[abi::token_address(target), abi::token_address(sponsor)],
        &[abi::token_bytes32(bytes32_from_label(b"sponsored"))],
    )?;
    Ok(vec![])
}

fn native_unsponsor(env: &mut Environment) -> VmResult<Vec<Token>> {
    let target = abi::as_address(&env.args()[0]);
    let sponsor = env.caller();
    let prototype = Prototype::new();
    let is_sponsor = prototype.is_sponsor(env, &target, &sponsor)?;
    env.require(is_sponsor, "builtin: not a sponsor")?;
    prototype.set_sponsor(env, &target, &sponsor, false)?;
    env.log(
        &EVENT_SPONSOR,
        &[abi::token_address(target), abi::token_address(sponsor)],
        &[abi::token_bytes32(bytes32_from_label(b"unsponsored"))],
    )?;
    Ok(vec![])
}

fn native_is_sponsor(env: &mut Environment) -> VmResult<Vec<Token>> {
    let target = abi::as_address(&env.args()[0]);
    let sponsor = abi::as_address(&env.args()[1]);
    let is_sponsor = Prototype::new().is_sponsor(env, &target, &sponsor)?;
    Ok(vec![abi::token_bool(is_sponsor)])
}

fn native_current_sponsor(env: &mut Environment) -> VmResult<Vec<Token>> {
    let target = abi::as_address(&env.args()[0]);
    let sponsor = Prototype::new().current_sponsor(env, &target)?;
    Ok(vec![abi::token_address(sponsor)])
}

fn native_select_sponsor(env: &mut Environment) -> VmResult<Vec<Token>> {
    let target = abi::as_address(&env.args()[0]);
    let sponsor = abi::as_address(&env.args()[1]);
    require_master_of(env, &target)?;
    let prototype = Prototype::new();
    let is_sponsor = prototype.is_sponsor(env, &target, &sponsor)?;
    env.require(is_sponsor, "builtin: not a sponsor")?;
    prototype.select_sponsor(env, &target, &sponsor)?;
    env.log(
        &EVENT_SPONSOR,
        &[abi::token_address(target), abi::token_address(sponsor)],
        &[abi::token_bytes32(bytes32_from_label(b"selected"))],
    )?;
    Ok(vec![])
}

pub fn native_contract() -> NativeContract {
    NativeContract::new(
        "Prototype",
        *ADDRESS,
        vec![
            NativeMethod::new(
                MethodSig::new("master", &[ParamType::Address], &[ParamType::Address]),
                native_master,
            ),
            NativeMethod::new(
                MethodSig::new("setMaster", &[ParamType::Address, ParamType::Address], &[]),
                native_set_master,
            ),
            NativeMethod::new(
                MethodSig::new("hasCode", &[ParamType::Address], &[ParamType::Bool]),
                native_has_code,
            ),
            NativeMethod::new(
                MethodSig::new(
                    "balance",
                    &[ParamType::Address, ParamType::Uint(256)],
                    &[ParamType::Uint(256)],
                ),
                native_balance,
            ),
            NativeMethod::new(
                MethodSig::new(
                    "energy",
                    &[ParamType::Address, ParamType::Uint(256)],
                    &[ParamType::Uint(256)],
                ),
                native_energy,
            ),
            NativeMethod::new(
                MethodSig::new(
                    "storageFor",
                    &[ParamType::Address, ParamType::FixedBytes(32)],
                    &[ParamType::FixedBytes(32)],
                ),
                native_storage_for,
            ),
            NativeMethod::new(
                MethodSig::new(
                    "setCreditPlan",
                    &[ParamType::Address, ParamType::Uint(256), ParamType::Uint(256)],
                    &[],
                ),
                native_set_credit_plan,
            ),
            NativeMethod::new(
                MethodSig::new(
                    "creditPlan",
                    &[ParamType::Address],
                    &[ParamType::Uint(256), ParamType::Uint(256)],
                ),
                native_credit_plan,
            ),
            NativeMethod::new(
                MethodSig::new(
                    "isUser",
                    &[ParamType::Address, ParamType::Address],
                    &[ParamType::Bool],
                ),
                native_is_user,
            ),
            NativeMethod::new(
                MethodSig::new("addUser", &[ParamType::Address, ParamType::Address], &[]),
                native_add_user,
            ),
            NativeMethod::new(
                MethodSig::new(
                    "removeUser",
                    &[ParamType::Address, ParamType::Address],
                    &[],
                ),
                native_remove_user,
            ),
            NativeMethod::new(
                MethodSig::new(
                    "userCredit",
                    &[ParamType::Address, ParamType::Address],
                    &[ParamType::Uint(256)],
                ),
                native_user_credit,
            ),
            NativeMethod::new(
                MethodSig::new("sponsor", &[ParamType::Address], &[]),
                native_sponsor,
            ),
            NativeMethod::new(
                MethodSig::new("unsponsor", &[ParamType::Address], &[]),
                native_unsponsor,
            ),
            NativeMethod::new(
                MethodSig::new(
                    "isSponsor",
                    &[ParamType::Address, ParamType::Address],
                    &[ParamType::Bool],
                ),
                native_is_sponsor,
            ),
            NativeMethod::new(
                MethodSig::new(
                    "currentSponsor",
                    &[ParamType::Address],
                    &[ParamType::Address],
                ),
                native_current_sponsor,
            ),
            NativeMethod::new(
                MethodSig::new(
                    "selectSponsor",
                    &[ParamType::Address, ParamType::Address],
                    &[],
                ),
                native_select_sponsor,
            ),
        ],
    )
}

#[cfg(test)]
mod tests {
    use thor_state::MemoryState;

    use super::*;

    #[test]
    fn master_defaults_to_self() {
        let state = MemoryState::new();
        let a = address_from_name(b"a");
        assert_eq!(Prototype::new().master_of(&state, &a).unwrap(), a);
    }

    #[test]
    fn set_master_round_trip() {
        let mut state = MemoryState::new();
        let a = address_from_name(b"a");
        let b = address_from_name(b"b");
        let prototype = Prototype::new();
        prototype.set_master(&mut state, &a, &b).unwrap();
        assert_eq!(prototype.master_of(&state, &a).unwrap(), b);
    }

    #[test]
    fn decay_caps_at_credit() {
        let plan = CreditPlan {
            credit: TokenAmount::from_wei(1_000u64),
            recovery_rate: TokenAmount::from_wei(10u64),
        };
        let user = UserRecord {
            remaining: TokenAmount::from_wei(500u64),
            last_use: 100,
            expiration: 0,
        };
        // 500 + 10·30 = 800
        assert_eq!(
            decayed_remaining(&plan, &user, 130),
            TokenAmount::from_wei(800u64)
        );
        // capped
        assert_eq!(
            decayed_remaining(&plan, &user, 100_000),
            TokenAmount::from_wei(1_000u64)
        );
    }

    #[test]
    fn expired_approval_is_worthless() {
        let plan = CreditPlan {
            credit: TokenAmount::from_wei(1_000u64),
            recovery_rate: TokenAmount::from_wei(10u64),
        };
        let user = UserRecord {
            remaining: TokenAmount::from_wei(1_000u64),
            last_use: 100,
            expiration: 200,
        };
        assert_eq!(decayed_remaining(&plan, &user, 199), plan.credit);
        assert_eq!(decayed_remaining(&plan, &user, 200), TokenAmount::zero());
        assert_eq!(decayed_remaining(&plan, &user, 5_000), TokenAmount::zero());
    }

    #[test]
    fn user_lifecycle() {
        let mut state = MemoryState::new();
        let prototype = Prototype::new();
        let contract = address_from_name(b"dapp");
        let user = address_from_name(b"u");
        prototype
            .set_credit_plan(
                &mut state,
                &contract,
                &CreditPlan {
                    credit: TokenAmount::from_wei(77u64),
                    recovery_rate: TokenAmount::zero(),
                },
            )
            .unwrap();

        assert!(!prototype.is_user(&state, &contract, &user).unwrap());
        prototype.add_user(&mut state, &contract, &user, 9).unwrap();
        assert!(prototype.is_user(&state, &contract, &user).unwrap());
        let record = prototype.user_record(&state, &contract, &user).unwrap();
        assert_eq!(record.remaining, TokenAmount::from_wei(77u64));
        assert_eq!(record.last_use, 9);

        prototype.remove_user(&mut state, &contract, &user).unwrap();
        assert!(!prototype.is_user(&state, &contract, &user).unwrap());
    }

    #[test]
    fn sponsor_selection() {
        let mut state = MemoryState::new();
        let prototype = Prototype::new();
        let contract = address_from_name(b"dapp");
        let s = address_from_name(b"S");
        prototype.set_sponsor(&mut state, &contract, &s, true).unwrap();
        assert!(prototype.is_sponsor(&state, &contract, &s).unwrap());
        assert!(prototype.current_sponsor(&state, &contract).unwrap().is_zero());
        prototype.select_sponsor(&mut state, &contract, &s).unwrap();
        assert_eq!(prototype.current_sponsor(&state, &contract).unwrap(), s);
    }
}
