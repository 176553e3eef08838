// Copyright 2021-2023 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

//! The native dispatch bridge: matches an EVM CALL against the table of
//! built-in contracts, meters gas, captures logs, and translates recoverable
//! failures into Solidity-shaped reverts at a single boundary.

pub mod chain;
pub mod gas;
pub mod testing;

mod contract;
mod dispatch;
mod env;
mod error;

pub use chain::{ChainLookup, HeaderInfo};
pub use contract::{ContractTable, MethodBody, NativeContract, NativeMethod};
pub use dispatch::{dispatch, CallParams, Execution};
pub use env::Environment;
pub use error::{ClassifyResult, NativeError, Result, RevertData};
