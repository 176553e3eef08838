// Copyright 2021-2023 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

//! The energy (VTHO) engine: per-account balances growing linearly with the
//! holder's token (VET) balance, global mint/burn counters, the VIP-180
//! token surface, and the sponsored-consumption payer resolution.

use ethabi::{ParamType, Token};
use lazy_static::lazy_static;
use num_bigint::BigInt;
use num_traits::Zero;
use rlp_derive::{RlpDecodable, RlpEncodable};

use thor_shared::abi::{self, EventSig, MethodSig};
use thor_shared::{address_from_name, Address, BlockTime, TokenAmount};
use thor_state::{Scalar, SlotArray, SlotMap, StateCursor};
use thor_vm::{Environment, NativeContract, NativeMethod, Result as VmResult};

use crate::prototype::Prototype;

lazy_static! {
    pub static ref ADDRESS: Address = address_from_name(b"Energy");
    static ref EVENT_TRANSFER: EventSig = EventSig::new(
        "Transfer",
        &[ParamType::Address, ParamType::Address],
        &[ParamType::Uint(256)],
    );
    static ref EVENT_APPROVAL: EventSig = EventSig::new(
        "Approval",
        &[ParamType::Address, ParamType::Address],
        &[ParamType::Uint(256)],
    );
}

pub const NAME: &str = "VeThor";
pub const SYMBOL: &str = "VTHO";
pub const DECIMALS: u8 = 18;

const SLOT_TOKEN_SUPPLY: u64 = 0;
const SLOT_TOTAL_ADD: u64 = 1;
const SLOT_TOTAL_SUB: u64 = 2;
const SLOT_RATES: u64 = 3;
const SLOT_ACCOUNTS: u64 = 4;
const SLOT_ALLOWANCES: u64 = 5;
const SLOT_SUPPLY_ACCOUNT: u64 = 6;

/// Per-account record. `balance` is the effective energy balance as of
/// `last_touch`; `token_balance` is the token holding at that instant, the
/// growth base until the next touch.
#[derive(RlpEncodable, RlpDecodable, Clone, Debug, Default, PartialEq)]
pub struct EnergyAccount {
    pub balance: TokenAmount,
    pub last_touch: BlockTime,
    pub token_balance: TokenAmount,
}

/// One step of the append-only growth-rate sequence; `since` values are
/// non-decreasing.
#[derive(RlpEncodable, RlpDecodable, Clone, Debug, Default, PartialEq)]
pub struct GrowthRate {
    pub rate: TokenAmount,
    pub since: BlockTime,
}

#[derive(RlpEncodable, RlpDecodable, Clone, Debug, Default, PartialEq)]
struct ApprovalKey {
    owner: Address,
    spender: Address,
}

pub struct Energy {
    token_supply: Scalar<TokenAmount>,
    total_add: Scalar<TokenAmount>,
    total_sub: Scalar<TokenAmount>,
    rates: SlotArray<GrowthRate>,
    accounts: SlotMap<Address, EnergyAccount>,
    allowances: SlotMap<ApprovalKey, TokenAmount>,
    supply_account: Scalar<EnergyAccount>,
}

impl Default for Energy {
    fn default() -> Self {
        Self::new()
    }
}

impl Energy {
    pub fn new() -> Self {
        Self {
            token_supply: Scalar::new(*ADDRESS, SLOT_TOKEN_SUPPLY),
            total_add: Scalar::new(*ADDRESS, SLOT_TOTAL_ADD),
            total_sub: Scalar::new(*ADDRESS, SLOT_TOTAL_SUB),
            rates: SlotArray::new(*ADDRESS, SLOT_RATES),
            accounts: SlotMap::new(*ADDRESS, SLOT_ACCOUNTS),
            allowances: SlotMap::new(*ADDRESS, SLOT_ALLOWANCES),
            supply_account: Scalar::new(*ADDRESS, SLOT_SUPPLY_ACCOUNT),
        }
    }

    /// Seeds the genesis supply figures and the first growth rate.
    pub fn initialize(
        &self,
        state: &mut dyn StateCursor,
        time: BlockTime,
        token_supply: TokenAmount,
        energy_supply: TokenAmount,
        rate: TokenAmount,
    ) -> thor_state::Result<()> {
        self.token_supply.put(state, &token_supply)?;
        self.supply_account.put(
            state,
            &EnergyAccount {
                balance: energy_supply,
                last_touch: time,
                token_balance: token_supply,
            },
        )?;
        self.append_rate(state, &GrowthRate { rate, since: time })
    }

    /// Appends to the growth-rate sequence. `since` must not go backwards.
    pub fn append_rate(
        &self,
        state: &mut dyn StateCursor,
        rate: &GrowthRate,
    ) -> thor_state::Result<()> {
        let len = self.rates.len(state)?;
        if len > 0 {
            let last = self.rates.get(state, len - 1)?;
            if rate.since < last.since {
                return Err(thor_state::StateError::Io(
                    "growth rate out of order".into(),
                ));
            }
        }
        self.rates.append(state, rate)
    }

    /// The balance-at-time formula: walk the rate sequence backwards from the
    /// latest entry, stopping at the first whose start does not postdate the
    /// account's last touch. Integer floor division.
    fn grown(
        &self,
        state: &dyn StateCursor,
        acc: &EnergyAccount,
        t: BlockTime,
    ) -> thor_state::Result<TokenAmount> {
        if t <= acc.last_touch || acc.token_balance.is_zero() {
            return Ok(acc.balance.clone());
        }
        let n = self.rates.len(state)?;
        let mut area = BigInt::zero();
        let mut next_since = BlockTime::MAX;
        for i in (0..n).rev() {
            let step = self.rates.get(state, i)?;
            let start = step.since.max(acc.last_touch);
            let end = t.min(next_since);
            if end > start {
                area += step.rate.wei() * BigInt::from(end - start);
            }
            if step.since <= acc.last_touch {
                break;
            }
            next_since = step.since;
        }
        let growth = acc.token_balance.wei() * area / BigInt::from(TokenAmount::PRECISION);
        Ok(TokenAmount::from_wei(acc.balance.wei() + growth))
    }

    pub fn balance_of(
        &self,
        state: &dyn StateCursor,
        addr: &Address,
        t: BlockTime,
    ) -> thor_state::Result<TokenAmount> {
        let acc = self.accounts.get(state, addr)?;
        self.grown(state, &acc, t)
    }

    /// Re-materializes the record to `t`: effective balance computed, touch
    /// stamped, growth base refreshed from the current token balance.
    fn materialize(
        &self,
        state: &dyn StateCursor,
        addr: &Address,
        t: BlockTime,
    ) -> thor_state::Result<EnergyAccount> {
        let acc = self.accounts.get(state, addr)?;
        let balance = self.grown(state, &acc, t)?;
        Ok(EnergyAccount {
            balance,
            last_touch: t,
            token_balance: state.get_balance(addr)?,
        })
    }

    pub fn add(
        &self,
        state: &mut dyn StateCursor,
        addr: &Address,
        t: BlockTime,
        amount: &TokenAmount,
    ) -> thor_state::Result<()> {
        if amount.is_zero() {
            return Ok(());
        }
        let mut acc = self.materialize(state, addr, t)?;
        acc.balance += amount;
        self.accounts.put(state, addr, &acc)?;
        let total = self.total_add.get(state)? + amount;
        self.total_add.put(state, &total)
    }

    /// False (and no write) when the pre-computed balance cannot cover
    /// `amount`.
    pub fn sub(
        &self,
        state: &mut dyn StateCursor,
        addr: &Address,
        t: BlockTime,
        amount: &TokenAmount,
    ) -> thor_state::Result<bool> {
        if amount.is_zero() {
            return Ok(true);
        }
        let mut acc = self.materialize(state, addr, t)?;
        if acc.balance < *amount {
            return Ok(false);
        }
        acc.balance -= amount.clone();
        self.accounts.put(state, addr, &acc)?;
        let total = self.total_sub.get(state)? + amount;
        self.total_sub.put(state, &total)?;
        Ok(true)
    }

    pub fn transfer(
        &self,
        state: &mut dyn StateCursor,
        from: &Address,
        to: &Address,
        t: BlockTime,
        amount: &TokenAmount,
    ) -> thor_state::Result<bool> {
        if !self.sub(state, from, t, amount)? {
            return Ok(false);
        }
        self.add(state, to, t, amount)?;
        Ok(true)
    }

    /// `growth(tokenSupply, t) + totalAdd − totalSub`.
    pub fn total_supply(
        &self,
        state: &dyn StateCursor,
        t: BlockTime,
    ) -> thor_state::Result<TokenAmount> {
        let supply = self.supply_account.get(state)?;
        let grown = self.grown(state, &supply, t)?;
        let added = self.total_add.get(state)?;
        let subbed = self.total_sub.get(state)?;
        Ok(grown + added - subbed)
    }

    /// `totalSub − totalAdd`; may be temporarily negative, the sign is kept.
    pub fn total_burned(&self, state: &dyn StateCursor) -> thor_state::Result<TokenAmount> {
        let added = self.total_add.get(state)?;
        let subbed = self.total_sub.get(state)?;
        Ok(subbed - added)
    }

    pub fn allowance(
        &self,
        state: &dyn StateCursor,
        owner: &Address,
        spender: &Address,
    ) -> thor_state::Result<TokenAmount> {
        self.allowances.get(
            state,
            &ApprovalKey {
                owner: *owner,
                spender: *spender,
            },
        )
    }

    pub fn approve(
        &self,
        state: &mut dyn StateCursor,
        owner: &Address,
        spender: &Address,
        amount: &TokenAmount,
    ) -> thor_state::Result<()> {
        self.allowances.put(
            state,
            &ApprovalKey {
                owner: *owner,
                spender: *spender,
            },
            amount,
        )
    }
}

/// Resolves who pays `amount` for a clause `contract ← caller` and performs
/// the deduction. Strategies in order: the contract's agreed supplier under a
/// valid consumption approval, the contract itself under the same approval,
/// then the caller's own balance. `None` when nobody could pay.
pub fn consume(
    state: &mut dyn StateCursor,
    t: BlockTime,
    contract: &Address,
    caller: &Address,
    amount: &TokenAmount,
) -> thor_state::Result<Option<Address>> {
    let energy = Energy::new();
    let prototype = Prototype::new();

    let plan = prototype.credit_plan(state, contract)?;
    let user = prototype.user_record(state, contract, caller)?;
    if user != Default::default() {
        let remaining = crate::prototype::decayed_remaining(&plan, &user, t);
        if remaining >= *amount {
            let mut payer = None;
            let sponsor = prototype.current_sponsor(state, contract)?;
            if !sponsor.is_zero()
                && prototype.is_sponsor(state, contract, &sponsor)?
                && energy.sub(state, &sponsor, t, amount)?
            {
                payer = Some(sponsor);
            } else if energy.sub(state, contract, t, amount)? {
                payer = Some(*contract);
            }
            if let Some(payer) = payer {
                prototype.set_user_record(
                    state,
                    contract,
                    caller,
                    &crate::prototype::UserRecord {
                        remaining: remaining - amount.clone(),
                        last_use: t,
                        expiration: user.expiration,
                    },
                )?;
                return Ok(Some(payer));
            }
        }
    }

    if energy.sub(state, caller, t, amount)? {
        return Ok(Some(*caller));
    }
    Ok(None)
}

fn block_time(env: &Environment) -> BlockTime {
    env.block_context().time
}

fn native_name(_env: &mut Environment) -> VmResult<Vec<Token>> {
    Ok(vec![abi::token_string(NAME)])
}

fn native_symbol(_env: &mut Environment) -> VmResult<Vec<Token>> {
    Ok(vec![abi::token_string(SYMBOL)])
}

fn native_decimals(_env: &mut Environment) -> VmResult<Vec<Token>> {
    Ok(vec![Token::Uint((DECIMALS as u64).into())])
}

fn native_total_supply(env: &mut Environment) -> VmResult<Vec<Token>> {
    let t = block_time(env);
    let supply = Energy::new().total_supply(env, t)?;
    Ok(vec![abi::token_amount(&supply)])
}

fn native_total_burned(env: &mut Environment) -> VmResult<Vec<Token>> {
    let burned = Energy::new().total_burned(env)?;
    // Negative differences encode as zero on the unsigned ABI surface.
    Ok(vec![abi::token_amount(&burned)])
}

fn native_balance_of(env: &mut Environment) -> VmResult<Vec<Token>> {
    let addr = abi::as_address(&env.args()[0]);
    let t = block_time(env);
    let balance = Energy::new().balance_of(env, &addr, t)?;
    Ok(vec![abi::token_amount(&balance)])
}

fn transfer_and_log(
    env: &mut Environment,
    from: Address,
    to: Address,
    amount: &TokenAmount,
) -> VmResult<()> {
    let t = block_time(env);
    let ok = Energy::new().transfer(env, &from, &to, t, amount)?;
    env.require(ok, "builtin: insufficient energy")?;
    env.log(
        &EVENT_TRANSFER,
        &[abi::token_address(from), abi::token_address(to)],
        &[abi::token_amount(amount)],
    )
}

fn native_transfer(env: &mut Environment) -> VmResult<Vec<Token>> {
    let to = abi::as_address(&env.args()[0]);
    let amount = abi::as_amount(&env.args()[1]);
    let from = env.caller();
    transfer_and_log(env, from, to, &amount)?;
    Ok(vec![abi::token_bool(true)])
}

fn native_transfer_from(env: &mut Environment) -> VmResult<Vec<Token>> {
    let from = abi::as_address(&env.args()[0]);
    let to = abi::as_address(&env.args()[1]);
    let amount = abi::as_amount(&env.args()[2]);

    let energy = Energy::new();
    let spender = env.caller();
    let allowance = energy.allowance(env, &from, &spender)?;
    env.require(allowance >= amount, "builtin: insufficient allowance")?;
    energy.approve(env, &from, &spender, &(allowance - amount.clone()))?;

    transfer_and_log(env, from, to, &amount)?;
    Ok(vec![abi::token_bool(true)])
}

fn native_approve(env: &mut Environment) -> VmResult<Vec<Token>> {
    let spender = abi::as_address(&env.args()[0]);
    let amount = abi::as_amount(&env.args()[1]);
    let owner = env.caller();
    Energy::new().approve(env, &owner, &spender, &amount)?;
    env.log(
        &EVENT_APPROVAL,
        &[abi::token_address(owner), abi::token_address(spender)],
        &[abi::token_amount(&amount)],
    )?;
    Ok(vec![abi::token_bool(true)])
}

fn native_allowance(env: &mut Environment) -> VmResult<Vec<Token>> {
    let owner = abi::as_address(&env.args()[0]);
    let spender = abi::as_address(&env.args()[1]);
    let allowance = Energy::new().allowance(env, &owner, &spender)?;
    Ok(vec![abi::token_amount(&allowance)])
}

/// Contract-initiated move: the caller must own `from`, directly or as its
/// master.
fn native_move(env: &mut Environment) -> VmResult<Vec<Token>> {
    let from = abi::as_address(&env.args()[0]);
    let to = abi::as_address(&env.args()[1]);
    let amount = abi::as_amount(&env.args()[2]);

    let caller = env.caller();
    if caller != from {
        let master = Prototype::new().master_of(env, &from)?;
        env.require(caller == master, "builtin: self or master required")?;
    }
    transfer_and_log(env, from, to, &amount)?;
    Ok(vec![abi::token_bool(true)])
}

pub fn native_contract() -> NativeContract {
    NativeContract::new(
        "Energy",
        *ADDRESS,
        vec![
            NativeMethod::new(MethodSig::new("name", &[], &[ParamType::String]), native_name),
            NativeMethod::new(
                MethodSig::new("symbol", &[], &[ParamType::String]),
                native_symbol,
            ),
            NativeMethod::new(
                MethodSig::new("decimals", &[], &[ParamType::Uint(8)]),
                native_decimals,
            ),
            NativeMethod::new(
                MethodSig::new("totalSupply", &[], &[ParamType::Uint(256)]),
                native_total_supply,
            ),
            NativeMethod::new(
                MethodSig::new("totalBurned", &[], &[ParamType::Uint(256)]),
                native_total_burned,
            ),
            NativeMethod::new(
                MethodSig::new("balanceOf", &[ParamType::Address], &[ParamType::Uint(256)]),
                native_balance_of,
            ),
            NativeMethod::new(
                MethodSig::new(
                    "transfer",
                    &[ParamType::Address, ParamType::Uint(256)],
                    &[ParamType::Bool],
                ),
                native_transfer,
            ),
            NativeMethod::new(
                MethodSig::new(
                    "transferFrom",
                    &[ParamType::Address, ParamType::Address, ParamType::Uint(256)],
                    &[ParamType::Bool],
                ),
                native_transfer_from,
            ),
            NativeMethod::new(
                MethodSig::new(
                    "approve",
                    &[ParamType::Address, ParamType::Uint(256)],
                    &[ParamType::Bool],
                ),
                native_approve,
            ),
            NativeMethod::new(
                MethodSig::new(
                    "allowance",
                    &[ParamType::Address, ParamType::Address],
                    &[ParamType::Uint(256)],
                ),
                native_allowance,
            ),
            NativeMethod::new(
                MethodSig::new(
                    "move",
                    &[ParamType::Address, ParamType::Address, ParamType::Uint(256)],
                    &[ParamType::Bool],
                ),
                native_move,
            ),
        ],
    )
}
