// Copyright 2021-2023 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

use crate::econ::TokenAmount;
use crate::{Address, BlockNum, BlockTime, Bytes32};

/// Block-level facts visible to native methods.
#[derive(Clone, Debug, Default)]
pub struct BlockContext {
    pub number: BlockNum,
    pub time: BlockTime,
    pub signer: Address,
    pub total_score: u64,
    pub base_fee: TokenAmount,
}

/// Transaction-level facts visible to native methods.
#[derive(Clone, Debug, Default)]
pub struct TxContext {
    pub id: Bytes32,
    pub origin: Address,
    pub gas_price: TokenAmount,
    pub gas_payer: Address,
    pub proved_work: TokenAmount,
    pub block_ref: [u8; 8],
    pub expiration: u32,
    pub clause_index: u32,
    pub clause_count: u32,
}

/// Fork schedule. Only the staking fork matters to this core; block numbers
/// at or above `hayabusa` run the post-fork staker rules.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ForkConfig {
    pub hayabusa: BlockNum,
}

impl ForkConfig {
    /// Every fork active from genesis.
    pub fn all_active() -> Self {
        Self { hayabusa: 0 }
    }

    pub fn is_hayabusa(&self, block: BlockNum) -> bool {
        block >= self.hayabusa
    }
}

impl Default for ForkConfig {
    fn default() -> Self {
        // Far-future fork point; callers configure the real schedule.
        Self {
            hayabusa: BlockNum::MAX,
        }
    }
}
