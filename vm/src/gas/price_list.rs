// Copyright 2021-2023 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

/// Gas schedule the built-in methods charge against.
///
/// The outer governance owns these numbers and may move them across forks;
/// the bridge treats them as opaque parameters.
#[derive(Clone, Debug)]
pub struct PriceList {
    /// Charged before every storage read.
    pub sload_gas: u64,
    /// Charged before writing a previously empty slot.
    pub sstore_set_gas: u64,
    /// Charged before overwriting a non-empty slot.
    pub sstore_reset_gas: u64,
    /// Charged before reading an account balance.
    pub get_balance_gas: u64,
    /// Base charge of a LOG plus per-topic and per-byte components.
    pub log_gas: u64,
    pub log_topic_gas: u64,
    pub log_data_gas: u64,
}

impl Default for PriceList {
    fn default() -> Self {
        Self {
            sload_gas: 200,
            sstore_set_gas: 20_000,
            sstore_reset_gas: 5_000,
            get_balance_gas: 400,
            log_gas: 375,
            log_topic_gas: 375,
            log_data_gas: 8,
        }
    }
}
