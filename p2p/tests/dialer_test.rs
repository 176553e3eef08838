// Copyright 2021-2023 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::{mpsc, Notify};

use thor_p2p::{
    spawn_session_host, Dialer, DialerConfig, DuplexStream, NodeDescriptor, NodeId, PeerDirectory,
    Protocol, Session, Transport,
};
use thor_shared::Bytes32;

fn node(n: u8) -> NodeDescriptor {
    NodeDescriptor::new(
        Bytes32::repeat_byte(n),
        IpAddr::V4(Ipv4Addr::new(10, 0, 0, n)),
        30_303,
        11_235,
    )
}

struct EchoProto;

#[async_trait]
impl Protocol for EchoProto {
    fn name(&self) -> &'static str {
        "echo"
    }

    fn version(&self) -> u32 {
        1
    }

    async fn handle_request(
        &self,
        _peer: NodeId,
        _msg_code: u64,
        payload: Vec<u8>,
    ) -> anyhow::Result<Vec<u8>> {
        Ok(payload)
    }
}

/// Dials in-memory pipes; the remote side of each pipe answers as an echo
/// session.
struct MemTransport {
    reachable: Mutex<HashMap<NodeId, ()>>,
    remotes: Mutex<Vec<Session>>,
}

impl MemTransport {
    fn new(reachable: &[NodeId]) -> Self {
        Self {
            reachable: Mutex::new(reachable.iter().map(|id| (*id, ())).collect()),
            remotes: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Transport for MemTransport {
    async fn dial(&self, node: &NodeDescriptor) -> anyhow::Result<Box<dyn DuplexStream>> {
        if !self.reachable.lock().contains_key(&node.id) {
            anyhow::bail!("unreachable");
        }
        let (local, remote) = tokio::io::duplex(1 << 16);
        let session = Session::spawn(node.id, remote, Arc::new(EchoProto));
        self.remotes.lock().push(session);
        Ok(Box::new(local))
    }
}

fn fast_config() -> DialerConfig {
    DialerConfig {
        fast_interval: Duration::from_millis(10),
        slow_interval: Duration::from_secs(10),
        fast_dials: 20,
    }
}

#[tokio::test]
async fn dialer_establishes_sessions_from_discovered_nodes() {
    let directory = Arc::new(PeerDirectory::new(16, 16));
    let target = node(1);
    directory.note_discovered(target.clone());

    let transport = Arc::new(MemTransport::new(&[target.id]));
    let (peers_tx, mut peers_rx) = mpsc::channel(4);
    let shutdown = Arc::new(Notify::new());
    let handle = Dialer::new(directory.clone(), transport, fast_config())
        .spawn(peers_tx, shutdown.clone());

    let dialed = tokio::time::timeout(Duration::from_secs(5), peers_rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(dialed.node.id, target.id);
    // Claimed nodes stay busy while connected.
    assert!(directory.is_busy(&target.id));

    let session = Session::spawn(dialed.node.id, dialed.stream, Arc::new(EchoProto));
    let response = session.request(0, b"ping".to_vec()).await.unwrap();
    assert_eq!(response, b"ping");

    shutdown.notify_one();
    handle.await.unwrap();
}

#[tokio::test]
async fn failed_dials_release_the_busy_slot() {
    let directory = Arc::new(PeerDirectory::new(16, 16));
    let target = node(2);
    directory.note_discovered(target.clone());

    // Nothing is reachable.
    let transport = Arc::new(MemTransport::new(&[]));
    let (peers_tx, _peers_rx) = mpsc::channel(4);
    let shutdown = Arc::new(Notify::new());
    let handle = Dialer::new(directory.clone(), transport, fast_config())
        .spawn(peers_tx, shutdown.clone());

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(!directory.is_busy(&target.id));

    shutdown.notify_one();
    handle.await.unwrap();
}

#[tokio::test]
async fn session_host_returns_closed_peers_to_the_good_set() {
    let directory = Arc::new(PeerDirectory::new(16, 16));
    let target = node(3);
    directory.note_discovered(target.clone());

    let transport = Arc::new(MemTransport::new(&[target.id]));
    let (peers_tx, peers_rx) = mpsc::channel(4);
    let shutdown = Arc::new(Notify::new());
    let dialer_handle = Dialer::new(directory.clone(), transport.clone(), fast_config())
        .spawn(peers_tx, shutdown.clone());

    let sessions = Arc::new(Mutex::new(HashMap::new()));
    let host_handle = spawn_session_host(
        directory.clone(),
        Arc::new(EchoProto),
        peers_rx,
        sessions.clone(),
    );

    // Wait for the session to come up, then drop the remote end.
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while sessions.lock().is_empty() {
        assert!(tokio::time::Instant::now() < deadline);
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    transport.remotes.lock().drain(..).for_each(|s| s.close());

    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !sessions.lock().is_empty() {
        assert!(tokio::time::Instant::now() < deadline);
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(!directory.is_busy(&target.id));
    let good = directory.good_snapshot();
    assert_eq!(good.len(), 1);
    assert_eq!(good[0].id, target.id);

    shutdown.notify_one();
    dialer_handle.await.unwrap();
    drop(host_handle);
}

#[test]
fn good_nodes_persist_across_restarts() {
    let directory = PeerDirectory::new(16, 16);
    directory.good_insert(node(1), 30);
    directory.good_insert(node(2), 10);
    directory.good_insert(node(3), 20);

    let path = std::env::temp_dir().join(format!("thor-good-nodes-{}.rlp", std::process::id()));
    directory.save_good(&path).unwrap();

    let reloaded = PeerDirectory::new(16, 16);
    assert_eq!(reloaded.load_good(&path).unwrap(), 3);
    let ids: Vec<_> = reloaded
        .good_snapshot()
        .into_iter()
        .map(|n| n.id)
        .collect();
    assert_eq!(ids, vec![node(1).id, node(3).id, node(2).id]);
    std::fs::remove_file(&path).ok();
}

#[test]
fn loading_a_missing_cache_is_an_empty_seed() {
    let directory = PeerDirectory::new(4, 4);
    let path = std::env::temp_dir().join("thor-good-nodes-definitely-missing.rlp");
    assert_eq!(directory.load_good(&path).unwrap(), 0);
    assert!(directory.good_snapshot().is_empty());
}
