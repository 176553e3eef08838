// Copyright 2021-2023 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

//! Test doubles shared by the contract crates' tests.

use thor_shared::{BlockNum, Bytes32};

use crate::chain::{ChainLookup, HeaderInfo};

/// In-memory chain: header `n` is `headers[n]`.
#[derive(Default)]
pub struct TestChain {
    headers: Vec<HeaderInfo>,
}

impl TestChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a header at the next height with a deterministic id.
    pub fn push_header(&mut self, mut header: HeaderInfo) -> Bytes32 {
        let number = self.headers.len() as BlockNum;
        header.number = number;
        if header.id.is_zero() {
            header.id = Bytes32::from_low_u64_be(0x1d_0000_0000 + number as u64);
        }
        let id = header.id;
        self.headers.push(header);
        id
    }

    pub fn head_number(&self) -> Option<BlockNum> {
        (self.headers.len() as BlockNum).checked_sub(1)
    }
}

impl ChainLookup for TestChain {
    fn header(&self, num: BlockNum) -> anyhow::Result<Option<HeaderInfo>> {
        Ok(self.headers.get(num as usize).cloned())
    }
}
