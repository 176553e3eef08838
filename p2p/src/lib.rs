// Copyright 2021-2023 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

//! Peer-to-peer plumbing: per-peer request/response sessions over framed
//! byte streams, the known/discovered/busy peer directory, and the
//! rate-limited background dialer feeding new peers into the session layer.

pub mod caches;
pub mod dialer;
pub mod frame;
pub mod metrics;
pub mod node;
pub mod proto;
pub mod session;

pub use dialer::{spawn_session_host, DialedPeer, Dialer, DialerConfig, PeerDirectory, Transport};
pub use frame::{DuplexStream, Msg};
pub use node::{NodeDescriptor, NodeId};
pub use proto::Protocol;
pub use session::{Session, SessionError, SessionStats};
