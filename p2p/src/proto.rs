// Copyright 2021-2023 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

use async_trait::async_trait;

use crate::node::NodeId;

/// A higher-level protocol speaking over sessions. Declared once at
/// registration; the session layer enforces `max_msg_size` and serializes
/// request handling per peer.
#[async_trait]
pub trait Protocol: Send + Sync + 'static {
    fn name(&self) -> &'static str;
    fn version(&self) -> u32;

    /// Frames larger than this close the session.
    fn max_msg_size(&self) -> usize {
        2 * 1024 * 1024
    }

    /// Handles one remote request; the returned bytes become the response
    /// payload. An error demotes the peer's grade.
    async fn handle_request(
        &self,
        peer: NodeId,
        msg_code: u64,
        payload: Vec<u8>,
    ) -> anyhow::Result<Vec<u8>>;
}
