// Copyright 2021-2023 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

//! Concurrency utilities: a joinable task group ([`Goes`]), a broadcast
//! signal with strict created-before/created-after ordering ([`Signal`]),
//! and a bounded parallel fan-out ([`parallel`]).

mod goes;
mod parallel;
mod signal;

pub use goes::Goes;
pub use parallel::parallel;
pub use signal::{Signal, Waiter};
