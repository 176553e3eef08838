// Copyright 2021-2023 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

//! Well-known keys of the Params registry. Each is the ascii label of the
//! governed constant, packed into a `Bytes32`.

use lazy_static::lazy_static;

use crate::{bytes32_from_label, Bytes32};

lazy_static! {
    /// Address allowed to write params and to manage the authority roster.
    pub static ref KEY_EXECUTOR_ADDRESS: Bytes32 = bytes32_from_label(b"executor-address");
    /// Minimum endorsor balance backing a proposer's eligibility.
    pub static ref KEY_PROPOSER_ENDORSEMENT: Bytes32 = bytes32_from_label(b"proposer-endorsement");
    /// Cap on active authority roster entries.
    pub static ref KEY_MAX_BLOCK_PROPOSERS: Bytes32 = bytes32_from_label(b"max-block-proposers");
    /// 2-bit pause switches for the staker (bit 0 delegator, bit 1 staker).
    pub static ref KEY_STAKER_SWITCHES: Bytes32 = bytes32_from_label(b"staker-switches");
    /// Staker period length in blocks after the fork point.
    pub static ref KEY_HAYABUSA_TP: Bytes32 = bytes32_from_label(b"hayabusa-tp");
    /// The contract allowed to manage delegations.
    pub static ref KEY_DELEGATOR_CONTRACT: Bytes32 = bytes32_from_label(b"delegator-contract");
    /// Per-validator stake window.
    pub static ref KEY_MIN_VALIDATOR_STAKE: Bytes32 = bytes32_from_label(b"min-validator-stake");
    pub static ref KEY_MAX_VALIDATOR_STAKE: Bytes32 = bytes32_from_label(b"max-validator-stake");
    /// Cap on stake across all validators.
    pub static ref KEY_MAX_TOTAL_STAKE: Bytes32 = bytes32_from_label(b"max-total-stake");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_distinct() {
        let keys = [
            *KEY_EXECUTOR_ADDRESS,
            *KEY_PROPOSER_ENDORSEMENT,
            *KEY_MAX_BLOCK_PROPOSERS,
            *KEY_STAKER_SWITCHES,
            *KEY_HAYABUSA_TP,
            *KEY_DELEGATOR_CONTRACT,
            *KEY_MIN_VALIDATOR_STAKE,
            *KEY_MAX_VALIDATOR_STAKE,
            *KEY_MAX_TOTAL_STAKE,
        ];
        for (i, a) in keys.iter().enumerate() {
            for b in &keys[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
