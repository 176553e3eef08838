// Copyright 2021-2023 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

//! The post-fork staker: validator and delegation state machines driven by
//! block numbers and explicit user actions. Queued validations activate only
//! at period boundaries; exits settle the same way. Stake is locked in the
//! contract's own token balance for as long as a validation is live.

use ethabi::{ParamType, Token};
use lazy_static::lazy_static;
use num_traits::Zero;

use thor_shared::abi::{self, MethodSig};
use thor_shared::keys::{
    KEY_DELEGATOR_CONTRACT, KEY_HAYABUSA_TP, KEY_MAX_TOTAL_STAKE, KEY_MAX_VALIDATOR_STAKE,
    KEY_MIN_VALIDATOR_STAKE, KEY_STAKER_SWITCHES,
};
use thor_shared::{address_from_name, Address, BlockNum, BlockTime, ForkConfig, TokenAmount};
use thor_state::StateCursor;
use thor_vm::{Environment, NativeContract, NativeMethod, NativeError, Result};

use crate::energy::Energy;
use crate::params::{amount_to_address, Params};

pub use self::state::{
    Delegation, Roster, Staker, Validation, STATUS_ACTIVE, STATUS_EXITED, STATUS_NONE,
    STATUS_QUEUED, STATUS_SIGNALED_EXIT,
};

mod state;

lazy_static! {
    pub static ref ADDRESS: Address = address_from_name(b"Staker");
}

/// Bit 0 pauses delegator operations, bit 1 pauses staker operations.
pub const SWITCH_DELEGATOR_PAUSED: u64 = 0b01;
pub const SWITCH_STAKER_PAUSED: u64 = 0b10;

/// Validation periods a candidate may choose, in period units.
pub const ALLOWED_PERIODS: &[u32] = &[7, 30, 90, 180];

pub const MAX_MULTIPLIER: u8 = 200;

fn switches(state: &dyn StateCursor) -> thor_state::Result<u64> {
    Params::new().get_u64(state, &KEY_STAKER_SWITCHES)
}

fn require_staker_live(env: &mut Environment) -> Result<()> {
    if switches(env)? & SWITCH_STAKER_PAUSED != 0 {
        return Err(NativeError::custom("StakerPaused"));
    }
    Ok(())
}

fn require_delegator_live(env: &mut Environment) -> Result<()> {
    if switches(env)? & SWITCH_DELEGATOR_PAUSED != 0 {
        return Err(NativeError::custom("DelegatorPaused"));
    }
    Ok(())
}

/// Stake amounts must be positive whole-token multiples.
fn check_stake_amount(amount: &TokenAmount) -> Result<()> {
    if amount.is_zero() {
        return Err(NativeError::custom("StakeIsEmpty"));
    }
    if !amount.is_whole() {
        return Err(NativeError::custom("StakeIsNotMultipleOf1VET"));
    }
    Ok(())
}

/// Per-validator window plus the global cap.
fn check_stake_window(env: &mut Environment, locked: &TokenAmount, added: &TokenAmount) -> Result<()> {
    let params = Params::new();
    let min = params.get(env, &KEY_MIN_VALIDATOR_STAKE)?;
    let max = params.get(env, &KEY_MAX_VALIDATOR_STAKE)?;
    let after = locked.clone() + added;
    if after < min || (!max.is_zero() && after > max) {
        return Err(NativeError::custom("StakeIsOutOfRange"));
    }

    let max_total = params.get(env, &KEY_MAX_TOTAL_STAKE)?;
    if !max_total.is_zero() {
        let total = Staker::new().total_stake.get(env)?;
        if total + added.clone() > max_total {
            return Err(NativeError::custom("TotalStakeReachedMaxLimit"));
        }
    }
    Ok(())
}

/// Moves tokens from `from` into the contract's locked balance.
fn lock_stake(env: &mut Environment, from: &Address, amount: &TokenAmount) -> Result<()> {
    let balance = env.get_balance(from)?;
    env.require(balance >= *amount, "builtin: insufficient balance")?;
    env.set_balance(from, balance - amount.clone())?;
    let locked = env.get_balance(&ADDRESS)?;
    env.set_balance(&ADDRESS, locked + amount)?;
    Ok(())
}

/// Releases locked tokens back to `to`.
fn release_stake(state: &mut dyn StateCursor, to: &Address, amount: &TokenAmount) -> thor_state::Result<()> {
    let locked = state.get_balance(&ADDRESS)?;
    state.set_balance(&ADDRESS, locked - amount.clone())?;
    let balance = state.get_balance(to)?;
    state.set_balance(to, balance + amount)
}

fn require_endorsor(env: &Environment, validation: &Validation) -> Result<()> {
    if env.caller() != validation.endorsor {
        return Err(NativeError::custom("EndorsorRequired"));
    }
    Ok(())
}

fn require_delegator_contract(env: &mut Environment) -> Result<()> {
    let configured = amount_to_address(&Params::new().get(env, &KEY_DELEGATOR_CONTRACT)?);
    if configured.is_zero() || env.caller() != configured {
        return Err(NativeError::custom("OnlyDelegator"));
    }
    Ok(())
}

fn get_existing(env: &Environment, master: &Address) -> Result<Validation> {
    let validation = Staker::new().validations.get(env, master)?;
    if !validation.exists() {
        return Err(NativeError::revert("builtin: validation not found"));
    }
    Ok(validation)
}

/// The first period boundary at or after `block`, as a block number.
fn next_boundary(fork: &ForkConfig, tp: u32, block: BlockNum) -> BlockNum {
    if tp == 0 || block < fork.hayabusa {
        return block;
    }
    let offset = block - fork.hayabusa;
    fork.hayabusa + (offset / tp + 1) * tp
}

fn native_add_validation(env: &mut Environment) -> Result<Vec<Token>> {
    let master = abi::as_address(&env.args()[0]);
    let stake = abi::as_amount(&env.args()[1]);
    let period = abi::as_u64(&env.args()[2]) as u32;

    require_staker_live(env)?;
    check_stake_amount(&stake)?;
    if !ALLOWED_PERIODS.contains(&period) {
        return Err(NativeError::custom("InvalidPeriod"));
    }
    env.require(!master.is_zero(), "builtin: invalid master")?;

    let staker = Staker::new();
    let prior = staker.validations.get(env, &master)?;
    env.require(!prior.exists(), "builtin: validation exists")?;
    check_stake_window(env, &TokenAmount::zero(), &stake)?;

    let endorsor = env.caller();
    lock_stake(env, &endorsor, &stake)?;

    let mut validation = Validation {
        endorsor,
        queued_stake: stake.clone(),
        weight: stake.clone(),
        status: STATUS_QUEUED,
        period,
        ..Default::default()
    };
    staker.link(env, Roster::Queued, &master, &mut validation)?;
    staker.add_total(env, &staker.total_stake, &stake)?;
    staker.add_total(env, &staker.queued_stake, &stake)?;
    Ok(vec![])
}

fn native_increase_stake(env: &mut Environment) -> Result<Vec<Token>> {
    let master = abi::as_address(&env.args()[0]);
    let amount = abi::as_amount(&env.args()[1]);

    require_staker_live(env)?;
    check_stake_amount(&amount)?;
    let staker = Staker::new();
    let mut validation = get_existing(env, &master)?;
    require_endorsor(env, &validation)?;
    env.require(
        validation.status == STATUS_QUEUED || validation.status == STATUS_ACTIVE,
        "builtin: validation not adjustable",
    )?;
    check_stake_window(env, &validation.locked_stake(), &amount)?;

    let endorsor = validation.endorsor;
    lock_stake(env, &endorsor, &amount)?;
    validation.queued_stake += amount.clone();
    validation.weight += amount.clone();
    staker.validations.put(env, &master, &validation)?;
    staker.add_total(env, &staker.total_stake, &amount)?;
    staker.add_total(env, &staker.queued_stake, &amount)?;
    Ok(vec![])
}

fn native_decrease_stake(env: &mut Environment) -> Result<Vec<Token>> {
    let master = abi::as_address(&env.args()[0]);
    let amount = abi::as_amount(&env.args()[1]);

    require_staker_live(env)?;
    check_stake_amount(&amount)?;
    let staker = Staker::new();
    let mut validation = get_existing(env, &master)?;
    require_endorsor(env, &validation)?;
    env.require(
        validation.status == STATUS_QUEUED || validation.status == STATUS_ACTIVE,
        "builtin: validation not adjustable",
    )?;
    env.require(
        amount <= validation.queued_stake,
        "builtin: exceeds queued stake",
    )?;

    // The remainder must stay inside the window.
    let params = Params::new();
    let min = params.get(env, &KEY_MIN_VALIDATOR_STAKE)?;
    let after = validation.locked_stake() - amount.clone();
    if after < min {
        return Err(NativeError::custom("StakeIsOutOfRange"));
    }

    validation.queued_stake -= amount.clone();
    validation.weight -= amount.clone();
    staker.validations.put(env, &master, &validation)?;
    staker.sub_total(env, &staker.total_stake, &amount)?;
    staker.sub_total(env, &staker.queued_stake, &amount)?;
    let endorsor = validation.endorsor;
    release_stake(env, &endorsor, &amount)?;
    Ok(vec![])
}

fn native_signal_exit(env: &mut Environment) -> Result<Vec<Token>> {
    let master = abi::as_address(&env.args()[0]);

    require_staker_live(env)?;
    let staker = Staker::new();
    let mut validation = get_existing(env, &master)?;
    require_endorsor(env, &validation)?;
    env.require(
        validation.status == STATUS_QUEUED || validation.status == STATUS_ACTIVE,
        "builtin: validation not exitable",
    )?;

    let tp = Params::new().get_u64(env, &KEY_HAYABUSA_TP)? as u32;
    let block = env.block_context().number;
    let fork = env.fork_config();
    validation.status = STATUS_SIGNALED_EXIT;
    validation.exit_block = next_boundary(&fork, tp, block);
    staker.validations.put(env, &master, &validation)?;
    Ok(vec![])
}

fn native_withdraw_stake(env: &mut Environment) -> Result<Vec<Token>> {
    let master = abi::as_address(&env.args()[0]);

    require_staker_live(env)?;
    let staker = Staker::new();
    let mut validation = get_existing(env, &master)?;
    require_endorsor(env, &validation)?;
    env.require(
        validation.status == STATUS_EXITED,
        "builtin: validation not exited",
    )?;

    let refund = validation.locked_stake();
    let endorsor = validation.endorsor;
    // Delegations keep their stake locked; only the validator's own share
    // leaves. The record survives as a tombstone until every delegation is
    // withdrawn, then the master key becomes reusable.
    if validation.delegated_stake.is_zero() {
        staker.validations.put(env, &master, &Validation::default())?;
    } else {
        validation.stake = TokenAmount::zero();
        validation.queued_stake = TokenAmount::zero();
        validation.weight = TokenAmount::zero();
        staker.validations.put(env, &master, &validation)?;
    }
    release_stake(env, &endorsor, &refund)?;
    Ok(vec![abi::token_amount(&refund)])
}

fn native_set_beneficiary(env: &mut Environment) -> Result<Vec<Token>> {
    let master = abi::as_address(&env.args()[0]);
    let beneficiary = abi::as_address(&env.args()[1]);

    require_staker_live(env)?;
    let staker = Staker::new();
    let mut validation = get_existing(env, &master)?;
    require_endorsor(env, &validation)?;
    env.require(
        validation.status != STATUS_EXITED,
        "builtin: validation exited",
    )?;
    validation.beneficiary = beneficiary;
    staker.validations.put(env, &master, &validation)?;
    Ok(vec![])
}

fn native_add_delegation(env: &mut Environment) -> Result<Vec<Token>> {
    let master = abi::as_address(&env.args()[0]);
    let stake = abi::as_amount(&env.args()[1]);
    let multiplier = abi::as_u8(&env.args()[2]);

    require_delegator_live(env)?;
    require_delegator_contract(env)?;
    check_stake_amount(&stake)?;
    if multiplier == 0 || multiplier > MAX_MULTIPLIER {
        return Err(NativeError::custom("InvalidMultiplier"));
    }

    let staker = Staker::new();
    let mut validation = get_existing(env, &master)?;
    env.require(
        validation.status == STATUS_QUEUED || validation.status == STATUS_ACTIVE,
        "builtin: validation not accepting delegations",
    )?;

    let max_total = Params::new().get(env, &KEY_MAX_TOTAL_STAKE)?;
    if !max_total.is_zero() {
        let total = staker.total_stake.get(env)?;
        if total + stake.clone() > max_total {
            return Err(NativeError::custom("TotalStakeReachedMaxLimit"));
        }
    }

    let caller = env.caller();
    lock_stake(env, &caller, &stake)?;

    let id = staker.next_delegation_id.get(env)? + 1;
    staker.next_delegation_id.put(env, &id)?;
    let delegation = Delegation {
        validator: master,
        stake: stake.clone(),
        multiplier,
        status: STATUS_ACTIVE,
        created_at: env.block_context().number,
    };
    staker.delegations.put(env, &id, &delegation)?;

    validation.delegated_stake += stake.clone();
    validation.weight += delegation.weight();
    let status = validation.status;
    staker.validations.put(env, &master, &validation)?;

    staker.add_total(env, &staker.total_stake, &stake)?;
    if status == STATUS_ACTIVE {
        staker.add_total(env, &staker.active_stake, &stake)?;
    } else {
        staker.add_total(env, &staker.queued_stake, &stake)?;
    }
    Ok(vec![abi::token_u64(id)])
}

fn native_signal_delegation_exit(env: &mut Environment) -> Result<Vec<Token>> {
    let id = abi::as_u64(&env.args()[0]);

    require_delegator_live(env)?;
    require_delegator_contract(env)?;
    let staker = Staker::new();
    let mut delegation = staker.delegations.get(env, &id)?;
    env.require(delegation.exists(), "builtin: delegation not found")?;
    env.require(
        delegation.status == STATUS_ACTIVE,
        "builtin: delegation not exitable",
    )?;
    delegation.status = STATUS_SIGNALED_EXIT;
    staker.delegations.put(env, &id, &delegation)?;
    Ok(vec![])
}

fn native_withdraw_delegation(env: &mut Environment) -> Result<Vec<Token>> {
    let id = abi::as_u64(&env.args()[0]);

    require_delegator_live(env)?;
    require_delegator_contract(env)?;
    let staker = Staker::new();
    let delegation = staker.delegations.get(env, &id)?;
    env.require(delegation.exists(), "builtin: delegation not found")?;

    // Eligibility follows the validator: a delegation leaves freely once the
    // validator is gone, otherwise it must have signaled.
    let mut validation = staker.validations.get(env, &delegation.validator)?;
    let validator_live =
        validation.status == STATUS_QUEUED || validation.status == STATUS_ACTIVE;
    env.require(
        delegation.status == STATUS_SIGNALED_EXIT || !validator_live,
        "builtin: delegation not withdrawable",
    )?;

    staker.delegations.put(env, &id, &Delegation::default())?;
    if validation.exists() {
        validation.delegated_stake -= delegation.stake.clone();
        validation.weight -= delegation.weight();
        let tombstone = validation.status == STATUS_EXITED
            && validation.delegated_stake.is_zero()
            && validation.stake.is_zero()
            && validation.queued_stake.is_zero();
        if tombstone {
            staker
                .validations
                .put(env, &delegation.validator, &Validation::default())?;
        } else {
            staker
                .validations
                .put(env, &delegation.validator, &validation)?;
        }
        if validator_live {
            if validation.status == STATUS_ACTIVE {
                staker.sub_total(env, &staker.active_stake, &delegation.stake)?;
            } else {
                staker.sub_total(env, &staker.queued_stake, &delegation.stake)?;
            }
        }
    }
    // The released tokens always leave the locked total.
    staker.sub_total(env, &staker.total_stake, &delegation.stake)?;
    let caller = env.caller();
    release_stake(env, &caller, &delegation.stake)?;
    Ok(vec![abi::token_amount(&delegation.stake)])
}

fn native_get_validation(env: &mut Environment) -> Result<Vec<Token>> {
    let master = abi::as_address(&env.args()[0]);
    let v = Staker::new().validations.get(env, &master)?;
    Ok(vec![
        abi::token_address(v.endorsor),
        abi::token_amount(&v.stake),
        abi::token_amount(&v.weight),
        abi::token_amount(&v.queued_stake),
        Token::Uint((v.status as u64).into()),
        abi::token_address(v.beneficiary),
    ])
}

fn native_get_validation_period_details(env: &mut Environment) -> Result<Vec<Token>> {
    let master = abi::as_address(&env.args()[0]);
    let v = Staker::new().validations.get(env, &master)?;
    Ok(vec![
        abi::token_u64(v.period as u64),
        abi::token_u64(v.start_period as u64),
        abi::token_u64(v.exit_block as u64),
        abi::token_u64(v.completed_periods as u64),
        abi::token_u64(v.last_offline_block as u64),
    ])
}

fn native_get_validation_totals(env: &mut Environment) -> Result<Vec<Token>> {
    let master = abi::as_address(&env.args()[0]);
    let v = Staker::new().validations.get(env, &master)?;
    Ok(vec![
        abi::token_amount(&v.locked_stake()),
        abi::token_amount(&v.delegated_stake),
        abi::token_amount(&v.weight),
        abi::token_amount(&v.delegator_rewards),
    ])
}

fn native_get_delegation(env: &mut Environment) -> Result<Vec<Token>> {
    let id = abi::as_u64(&env.args()[0]);
    let d = Staker::new().delegations.get(env, &id)?;
    Ok(vec![
        abi::token_address(d.validator),
        abi::token_amount(&d.stake),
        Token::Uint((d.multiplier as u64).into()),
        Token::Uint((d.status as u64).into()),
        abi::token_u64(d.created_at as u64),
    ])
}

fn native_first_active(env: &mut Environment) -> Result<Vec<Token>> {
    let head = Staker::new().first(env, Roster::Active)?;
    Ok(vec![abi::token_address(head)])
}

fn native_first_queued(env: &mut Environment) -> Result<Vec<Token>> {
    let head = Staker::new().first(env, Roster::Queued)?;
    Ok(vec![abi::token_address(head)])
}

fn native_next(env: &mut Environment) -> Result<Vec<Token>> {
    let master = abi::as_address(&env.args()[0]);
    let v = Staker::new().validations.get(env, &master)?;
    Ok(vec![abi::token_address(v.next)])
}

fn native_total_stake(env: &mut Environment) -> Result<Vec<Token>> {
    let total = Staker::new().total_stake.get(env)?;
    Ok(vec![abi::token_amount(&total)])
}

fn native_active_stake(env: &mut Environment) -> Result<Vec<Token>> {
    let total = Staker::new().active_stake.get(env)?;
    Ok(vec![abi::token_amount(&total)])
}

fn native_queued_stake(env: &mut Environment) -> Result<Vec<Token>> {
    let total = Staker::new().queued_stake.get(env)?;
    Ok(vec![abi::token_amount(&total)])
}

fn native_get_delegators_rewards(env: &mut Environment) -> Result<Vec<Token>> {
    let master = abi::as_address(&env.args()[0]);
    let v = Staker::new().validations.get(env, &master)?;
    Ok(vec![abi::token_amount(&v.delegator_rewards)])
}

fn native_get_validations_num(env: &mut Environment) -> Result<Vec<Token>> {
    let staker = Staker::new();
    let active = staker.active_count.get(env)?;
    let queued = staker.queued_count.get(env)?;
    Ok(vec![abi::token_u64(active), abi::token_u64(queued)])
}

/// Settles a period boundary: folds queued stake into live validators,
/// activates the queue (unless the staker switch pauses it), finalizes
/// signaled exits whose exit block has passed. The packer calls this; the
/// period counter advances here.
pub fn on_period_boundary(
    state: &mut dyn StateCursor,
    block: BlockNum,
) -> thor_state::Result<()> {
    let staker = Staker::new();
    let period = staker.current_period.get(state)? + 1;
    staker.current_period.put(state, &period)?;
    let paused = switches(state)? & SWITCH_STAKER_PAUSED != 0;

    // Active roster: settle exits, then fold queued top-ups.
    let mut cursor = staker.first(state, Roster::Active)?;
    while !cursor.is_zero() {
        let mut v = staker.validations.get(state, &cursor)?;
        let next = v.next;
        if v.status == STATUS_SIGNALED_EXIT && v.exit_block <= block {
            staker.unlink(state, Roster::Active, &cursor, &mut v)?;
            v.status = STATUS_EXITED;
            v.completed_periods = period.saturating_sub(v.start_period);
            // Delegated stake stays in total_stake until each delegation is
            // withdrawn; it stops counting as active immediately.
            staker.sub_total(
                state,
                &staker.active_stake,
                &(v.stake.clone() + &v.delegated_stake),
            )?;
            staker.sub_total(state, &staker.queued_stake, &v.queued_stake)?;
            staker.sub_total(state, &staker.total_stake, &v.locked_stake())?;
            staker.validations.put(state, &cursor, &v)?;
        } else if !v.queued_stake.is_zero() {
            staker.add_total(state, &staker.active_stake, &v.queued_stake)?;
            staker.sub_total(state, &staker.queued_stake, &v.queued_stake)?;
            v.stake += std::mem::take(&mut v.queued_stake);
            staker.validations.put(state, &cursor, &v)?;
        }
        cursor = next;
    }

    // Queued roster: settle exits and promote the rest.
    let mut cursor = staker.first(state, Roster::Queued)?;
    while !cursor.is_zero() {
        let mut v = staker.validations.get(state, &cursor)?;
        let next = v.next;
        if v.status == STATUS_SIGNALED_EXIT && v.exit_block <= block {
            staker.unlink(state, Roster::Queued, &cursor, &mut v)?;
            v.status = STATUS_EXITED;
            staker.sub_total(
                state,
                &staker.queued_stake,
                &(v.locked_stake() + &v.delegated_stake),
            )?;
            staker.sub_total(state, &staker.total_stake, &v.locked_stake())?;
            staker.validations.put(state, &cursor, &v)?;
        } else if v.status == STATUS_QUEUED && !paused {
            staker.unlink(state, Roster::Queued, &cursor, &mut v)?;
            v.status = STATUS_ACTIVE;
            v.start_period = period;
            let promoted = v.locked_stake() + &v.delegated_stake;
            v.stake += std::mem::take(&mut v.queued_stake);
            staker.link(state, Roster::Active, &cursor, &mut v)?;
            staker.sub_total(state, &staker.queued_stake, &promoted)?;
            staker.add_total(state, &staker.active_stake, &promoted)?;
        }
        cursor = next;
    }
    Ok(())
}

/// Splits a block reward between the validator's beneficiary and its
/// delegators, weighted by `stake·multiplier/100`. Integer remainders favor
/// the validator so the credited sum always equals `reward`.
pub fn distribute_reward(
    state: &mut dyn StateCursor,
    t: BlockTime,
    master: &Address,
    reward: &TokenAmount,
) -> thor_state::Result<()> {
    if reward.is_zero() {
        return Ok(());
    }
    let staker = Staker::new();
    let mut v = staker.validations.get(state, master)?;
    if !v.exists() {
        log::warn!("reward for unknown validation {:?}", master);
        return Ok(());
    }

    let energy = Energy::new();
    let delegator_share = if v.weight.is_zero() || v.delegated_stake.is_zero() {
        TokenAmount::zero()
    } else {
        let delegated_weight = v.weight.clone() - v.locked_stake();
        TokenAmount::from_wei(reward.wei() * delegated_weight.wei() / v.weight.wei())
    };
    let validator_share = reward.clone() - delegator_share.clone();

    let recipient = if v.beneficiary.is_zero() {
        v.endorsor
    } else {
        v.beneficiary
    };
    energy.add(state, &recipient, t, &validator_share)?;

    if !delegator_share.is_zero() {
        let delegator_contract =
            amount_to_address(&Params::new().get(state, &KEY_DELEGATOR_CONTRACT)?);
        energy.add(state, &delegator_contract, t, &delegator_share)?;
        v.delegator_rewards += delegator_share;
        staker.validations.put(state, master, &v)?;
    }
    Ok(())
}

/// Consensus-side liveness bookkeeping.
pub fn report_offline(
    state: &mut dyn StateCursor,
    master: &Address,
    block: BlockNum,
) -> thor_state::Result<()> {
    let staker = Staker::new();
    let mut v = staker.validations.get(state, master)?;
    if v.exists() {
        v.last_offline_block = block;
        staker.validations.put(state, master, &v)?;
    }
    Ok(())
}

pub fn native_contract() -> NativeContract {
    NativeContract::new(
        "Staker",
        *ADDRESS,
        vec![
            NativeMethod::new(
                MethodSig::new(
                    "addValidation",
                    &[ParamType::Address, ParamType::Uint(256), ParamType::Uint(32)],
                    &[],
                ),
                native_add_validation,
            ),
            NativeMethod::new(
                MethodSig::new(
                    "increaseStake",
                    &[ParamType::Address, ParamType::Uint(256)],
                    &[],
                ),
                native_increase_stake,
            ),
            NativeMethod::new(
                MethodSig::new(
                    "decreaseStake",
                    &[ParamType::Address, ParamType::Uint(256)],
                    &[],
                ),
                native_decrease_stake,
            ),
            NativeMethod::new(
                MethodSig::new("withdrawStake", &[ParamType::Address], &[ParamType::Uint(256)]),
                native_withdraw_stake,
            ),
            NativeMethod::new(
                MethodSig::new("signalExit", &[ParamType::Address], &[]),
                native_signal_exit,
            ),
            NativeMethod::new(
                MethodSig::new(
                    "setBeneficiary",
                    &[ParamType::Address, ParamType::Address],
                    &[],
                ),
                native_set_beneficiary,
            ),
            NativeMethod::new(
                MethodSig::new(
                    "addDelegation",
                    &[ParamType::Address, ParamType::Uint(256), ParamType::Uint(8)],
                    &[ParamType::Uint(64)],
                ),
                native_add_delegation,
            ),
            NativeMethod::new(
                MethodSig::new(
                    "withdrawDelegation",
                    &[ParamType::Uint(64)],
                    &[ParamType::Uint(256)],
                ),
                native_withdraw_delegation,
            ),
            NativeMethod::new(
                MethodSig::new("signalDelegationExit", &[ParamType::Uint(64)], &[]),
                native_signal_delegation_exit,
            ),
            NativeMethod::new(
                MethodSig::new(
                    "getValidation",
                    &[ParamType::Address],
                    &[
                        ParamType::Address,
                        ParamType::Uint(256),
                        ParamType::Uint(256),
                        ParamType::Uint(256),
                        ParamType::Uint(8),
                        ParamType::Address,
                    ],
                ),
                native_get_validation,
            ),
            NativeMethod::new(
                MethodSig::new(
                    "getValidationPeriodDetails",
                    &[ParamType::Address],
                    &[
                        ParamType::Uint(32),
                        ParamType::Uint(32),
                        ParamType::Uint(32),
                        ParamType::Uint(32),
                        ParamType::Uint(32),
                    ],
                ),
                native_get_validation_period_details,
            ),
            NativeMethod::new(
                MethodSig::new(
                    "getValidationTotals",
                    &[ParamType::Address],
                    &[
                        ParamType::Uint(256),
                        ParamType::Uint(256),
                        ParamType::Uint(256),
                        ParamType::Uint(256),
                    ],
                ),
                native_get_validation_totals,
            ),
            NativeMethod::new(
                MethodSig::new(
                    "getDelegation",
                    &[ParamType::Uint(64)],
                    &[
                        ParamType::Address,
                        ParamType::Uint(256),
                        ParamType::Uint(8),
                        ParamType::Uint(8),
                        ParamType::Uint(32),
                    ],
                ),
                native_get_delegation,
            ),
            NativeMethod::new(
                MethodSig::new("firstActive", &[], &[ParamType::Address]),
                native_first_active,
            ),
            NativeMethod::new(
                MethodSig::new("firstQueued", &[], &[ParamType::Address]),
                native_first_queued,
            ),
            NativeMethod::new(
                MethodSig::new("next", &[ParamType::Address], &[ParamType::Address]),
                native_next,
            ),
            NativeMethod::new(
                MethodSig::new("totalStake", &[], &[ParamType::Uint(256)]),
                native_total_stake,
            ),
            NativeMethod::new(
                MethodSig::new("activeStake", &[], &[ParamType::Uint(256)]),
                native_active_stake,
            ),
            NativeMethod::new(
                MethodSig::new("queuedStake", &[], &[ParamType::Uint(256)]),
                native_queued_stake,
            ),
            NativeMethod::new(
                MethodSig::new(
                    "getDelegatorsRewards",
                    &[ParamType::Address],
                    &[ParamType::Uint(256)],
                ),
                native_get_delegators_rewards,
            ),
            NativeMethod::new(
                MethodSig::new(
                    "getValidationsNum",
                    &[],
                    &[ParamType::Uint(64), ParamType::Uint(64)],
                ),
                native_get_validations_num,
            ),
        ],
    )
}
