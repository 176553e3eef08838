// Copyright 2021-2023 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

//! The peer directory (known-good, discovered and busy node sets) and the
//! rate-limited background dialer that turns discovered nodes into live
//! sessions.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;

use crate::caches::{PriorityCache, RandomCache};
use crate::frame::DuplexStream;
use crate::metrics;
use crate::node::{NodeDescriptor, NodeId};
use crate::proto::Protocol;
use crate::session::Session;

/// Establishes the raw byte stream to a node. The production transport is
/// TCP; tests dial in-memory pipes.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    async fn dial(&self, node: &NodeDescriptor) -> anyhow::Result<Box<dyn DuplexStream>>;
}

/// The three named node sets. Mutexes are never held across I/O.
pub struct PeerDirectory {
    good: Mutex<PriorityCache>,
    discovered: Mutex<RandomCache>,
    busy: Mutex<HashSet<NodeId>>,
}

impl PeerDirectory {
    pub fn new(good_capacity: usize, discovered_capacity: usize) -> Self {
        Self {
            good: Mutex::new(PriorityCache::new(good_capacity)),
            discovered: Mutex::new(RandomCache::new(discovered_capacity)),
            busy: Mutex::new(HashSet::new()),
        }
    }

    /// Feeds one node from the discovery subsystem.
    pub fn note_discovered(&self, node: NodeDescriptor) {
        let mut discovered = self.discovered.lock();
        discovered.insert(node, &mut rand::thread_rng());
        metrics::DISCOVERED_NODES.set(discovered.len() as i64);
    }

    /// Picks a random discovered node that is not being dialed and moves it
    /// into the busy set.
    pub fn claim_dial_target(&self) -> Option<NodeDescriptor> {
        let mut discovered = self.discovered.lock();
        let mut busy = self.busy.lock();
        let node = discovered.pick_random_excluding(&busy, &mut rand::thread_rng())?;
        discovered.remove(&node.id);
        busy.insert(node.id);
        metrics::DISCOVERED_NODES.set(discovered.len() as i64);
        metrics::DIALING_NODES.inc();
        Some(node)
    }

    /// A failed dial frees the slot; discovery will re-feed the node if it
    /// is still alive.
    pub fn dial_failed(&self, node: &NodeDescriptor) {
        self.busy.lock().remove(&node.id);
        metrics::DIALING_NODES.dec();
    }

    /// The node stays busy for the session's lifetime.
    pub fn dial_succeeded(&self, _node: &NodeDescriptor) {
        metrics::DIALING_NODES.dec();
    }

    /// Session teardown returns the node to the good set, ranked by the
    /// session's weight.
    pub fn session_closed(&self, node: NodeDescriptor, weight: i64) {
        self.busy.lock().remove(&node.id);
        self.good.lock().insert(node, weight);
    }

    pub fn is_busy(&self, id: &NodeId) -> bool {
        self.busy.lock().contains(id)
    }

    pub fn good_snapshot(&self) -> Vec<NodeDescriptor> {
        self.good.lock().snapshot()
    }

    pub fn good_insert(&self, node: NodeDescriptor, weight: i64) {
        self.good.lock().insert(node, weight);
    }

    /// Persists the good set, heaviest first, as an RLP node list.
    pub fn save_good(&self, path: &Path) -> std::io::Result<()> {
        let nodes = self.good_snapshot();
        std::fs::write(path, crate::node::encode_nodes(&nodes))
    }

    /// Reseeds the good set from disk; missing files are an empty seed.
    pub fn load_good(&self, path: &Path) -> std::io::Result<usize> {
        let raw = match std::fs::read(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e),
        };
        let nodes = crate::node::decode_nodes(&raw)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
        let count = nodes.len();
        let mut good = self.good.lock();
        // Heaviest-first order makes the index a sensible seed priority.
        for (i, node) in nodes.into_iter().enumerate() {
            good.insert(node, (count - i) as i64);
        }
        Ok(count)
    }
}

#[derive(Clone, Debug)]
pub struct DialerConfig {
    /// Tick while within the first `fast_dials` attempts.
    pub fast_interval: Duration,
    pub slow_interval: Duration,
    pub fast_dials: u32,
}

impl Default for DialerConfig {
    fn default() -> Self {
        Self {
            fast_interval: Duration::from_millis(500),
            slow_interval: Duration::from_secs(10),
            fast_dials: 20,
        }
    }
}

/// An established peer handed off by the dialer.
pub struct DialedPeer {
    pub node: NodeDescriptor,
    pub stream: Box<dyn DuplexStream>,
}

pub struct Dialer {
    directory: Arc<PeerDirectory>,
    transport: Arc<dyn Transport>,
    config: DialerConfig,
}

impl Dialer {
    pub fn new(
        directory: Arc<PeerDirectory>,
        transport: Arc<dyn Transport>,
        config: DialerConfig,
    ) -> Self {
        Self {
            directory,
            transport,
            config,
        }
    }

    /// Pumps discovery output into the directory until the feed closes.
    pub fn spawn_discovery_pump(
        directory: Arc<PeerDirectory>,
        mut feed: mpsc::Receiver<NodeDescriptor>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(node) = feed.recv().await {
                directory.note_discovered(node);
            }
        })
    }

    /// Runs the dial loop until `shutdown` is notified, handing established
    /// peers to `peers_tx`. Dial attempts run off the ticker so a slow peer
    /// cannot stall the loop.
    pub fn spawn(self, peers_tx: mpsc::Sender<DialedPeer>, shutdown: Arc<Notify>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut dials: u32 = 0;
            loop {
                let interval = if dials < self.config.fast_dials {
                    self.config.fast_interval
                } else {
                    self.config.slow_interval
                };
                tokio::select! {
                    _ = tokio::time::sleep(interval) => {}
                    _ = shutdown.notified() => return,
                }

                let Some(node) = self.directory.claim_dial_target() else {
                    continue;
                };
                dials += 1;
                log::debug!("dialing {:?}", node);

                let directory = self.directory.clone();
                let transport = self.transport.clone();
                let peers_tx = peers_tx.clone();
                tokio::spawn(async move {
                    match transport.dial(&node).await {
                        Ok(stream) => {
                            directory.dial_succeeded(&node);
                            let _ = peers_tx.send(DialedPeer { node, stream }).await;
                        }
                        Err(e) => {
                            log::debug!("dial {:?} failed: {}", node, e);
                            directory.dial_failed(&node);
                        }
                    }
                });
            }
        })
    }
}

/// Turns dialed peers into sessions and returns each node to the good set
/// with its weight once the session ends. The session map is shared with
/// higher-level protocols.
pub fn spawn_session_host(
    directory: Arc<PeerDirectory>,
    proto: Arc<dyn Protocol>,
    mut peers_rx: mpsc::Receiver<DialedPeer>,
    sessions: Arc<Mutex<HashMap<NodeId, Arc<Session>>>>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(peer) = peers_rx.recv().await {
            let session = Arc::new(Session::spawn(peer.node.id, peer.stream, proto.clone()));
            sessions.lock().insert(peer.node.id, session.clone());
            metrics::CONNECTED_PEERS.set(sessions.lock().len() as i64);

            let directory = directory.clone();
            let sessions = sessions.clone();
            let node = peer.node;
            tokio::spawn(async move {
                session.closed().await;
                let weight = session.weight();
                sessions.lock().remove(&node.id);
                metrics::CONNECTED_PEERS.set(sessions.lock().len() as i64);
                directory.session_closed(node, weight);
            });
        }
    })
}
