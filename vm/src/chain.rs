// Copyright 2021-2023 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

use thor_shared::{Address, BlockNum, BlockTime, Bytes32};

/// Facts of one finalized block header.
#[derive(Clone, Debug, Default)]
pub struct HeaderInfo {
    pub id: Bytes32,
    pub number: BlockNum,
    pub time: BlockTime,
    pub signer: Address,
    pub total_score: u64,
    pub state_root: Bytes32,
}

/// Header lookup over the chain this call executes on. An external
/// collaborator; failures here are fatal to the enclosing block.
pub trait ChainLookup {
    /// The header at `num`, or `None` past the chain head.
    fn header(&self, num: BlockNum) -> anyhow::Result<Option<HeaderInfo>>;
}
