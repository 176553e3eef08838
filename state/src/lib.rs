// Copyright 2021-2023 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

//! The state surface built-in contracts run against: an object-safe cursor
//! over one block's trie view, plus typed accessors partitioning a contract's
//! storage into numbered slots.

mod cursor;
mod memory;
mod slot;
mod value;

pub use cursor::StateCursor;
pub use memory::MemoryState;
pub use slot::{Raw, Scalar, SlotArray, SlotMap};
pub use value::StorageValue;

use thor_shared::Bytes32;

pub type Result<T> = std::result::Result<T, StateError>;

#[derive(thiserror::Error, Debug)]
pub enum StateError {
    /// The requested historical trie view is not available.
    #[error("state: unknown root {0:?}")]
    UnknownRoot(Bytes32),
    /// Storage bytes that do not decode as the statically-expected value.
    #[error("state: decode: {0}")]
    Decode(#[from] rlp::DecoderError),
    /// Underlying key/value I/O failure.
    #[error("state: {0}")]
    Io(String),
    /// A gas-charging cursor ran out of gas before touching storage.
    #[error("state: out of gas")]
    OutOfGas,
}
