// Copyright 2021-2023 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

pub use self::price_list::PriceList;

mod price_list;

/// Single named gas charge.
pub struct GasCharge<'a> {
    pub name: &'a str,
    pub amount: u64,
}

impl<'a> GasCharge<'a> {
    pub fn new(name: &'a str, amount: u64) -> Self {
        Self { name, amount }
    }
}

/// Out-of-gas marker; the bridge turns it into a revert that consumes the
/// remaining gas.
#[derive(Debug, PartialEq, Eq)]
pub struct OutOfGas;

pub struct GasTracker {
    gas_available: u64,
    gas_used: u64,
}

impl GasTracker {
    pub fn new(gas_available: u64) -> Self {
        Self {
            gas_available,
            gas_used: 0,
        }
    }

    /// Safely consumes gas; on underflow the tracker pins `gas_used` to the
    /// limit and reports out of gas.
    pub fn charge_gas(&mut self, charge: GasCharge) -> Result<(), OutOfGas> {
        match self.gas_used.checked_add(charge.amount) {
            None => {
                log::trace!("gas overflow: {}", charge.name);
                self.gas_used = self.gas_available;
                Err(OutOfGas)
            }
            Some(used) if used > self.gas_available => {
                log::trace!("out of gas: {}", charge.name);
                self.gas_used = self.gas_available;
                Err(OutOfGas)
            }
            Some(used) => {
                log::trace!("charged {} gas: {}", charge.amount, charge.name);
                self.gas_used = used;
                Ok(())
            }
        }
    }

    pub fn gas_available(&self) -> u64 {
        self.gas_available
    }

    pub fn gas_used(&self) -> u64 {
        self.gas_used
    }

    pub fn gas_left(&self) -> u64 {
        self.gas_available - self.gas_used
    }
}
