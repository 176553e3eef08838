// Copyright 2021-2023 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thor_p2p::{NodeId, Protocol, Session, SessionError};
use thor_shared::Bytes32;

const CODE_ECHO: u64 = 0;
const CODE_FAIL: u64 = 9;
const CODE_STALL: u64 = 10;

struct TestProto {
    max_msg_size: usize,
}

impl Default for TestProto {
    fn default() -> Self {
        Self {
            max_msg_size: 1 << 20,
        }
    }
}

#[async_trait]
impl Protocol for TestProto {
    fn name(&self) -> &'static str {
        "test"
    }

    fn version(&self) -> u32 {
        1
    }

    fn max_msg_size(&self) -> usize {
        self.max_msg_size
    }

    async fn handle_request(
        &self,
        _peer: NodeId,
        msg_code: u64,
        payload: Vec<u8>,
    ) -> anyhow::Result<Vec<u8>> {
        match msg_code {
            CODE_ECHO => {
                if payload == b"foo" {
                    Ok(b"bar".to_vec())
                } else {
                    Ok(payload)
                }
            }
            CODE_FAIL => anyhow::bail!("handler refuses"),
            CODE_STALL => {
                tokio::time::sleep(Duration::from_millis(400)).await;
                Ok(b"late".to_vec())
            }
            other => anyhow::bail!("unknown msg code {}", other),
        }
    }
}

fn peer_pair(proto_a: Arc<dyn Protocol>, proto_b: Arc<dyn Protocol>) -> (Session, Session) {
    let (sa, sb) = tokio::io::duplex(1 << 16);
    let a = Session::spawn(Bytes32::repeat_byte(0xaa), sa, proto_a);
    let b = Session::spawn(Bytes32::repeat_byte(0xbb), sb, proto_b);
    (a, b)
}

// A sends "foo", B's handler answers "bar".
#[tokio::test]
async fn request_resolves_with_the_handler_response() {
    let (a, _b) = peer_pair(
        Arc::new(TestProto::default()),
        Arc::new(TestProto::default()),
    );
    let response = a.request(CODE_ECHO, b"foo".to_vec()).await.unwrap();
    assert_eq!(response, b"bar");
}

#[tokio::test]
async fn failed_handler_demotes_and_returns_undecodable_response() {
    let (a, b) = peer_pair(
        Arc::new(TestProto::default()),
        Arc::new(TestProto::default()),
    );
    let err = a
        .request_rlp::<Vec<u8>, Vec<u8>>(CODE_FAIL, &b"x".to_vec())
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::Decode(_)));
    assert_eq!(b.stats().grade(), -1);
    assert!(b.weight() <= -1);
}

#[tokio::test]
async fn slow_handler_hits_the_deadline() {
    let (a, _b) = peer_pair(
        Arc::new(TestProto::default()),
        Arc::new(TestProto::default()),
    );
    let err = a
        .request_with_timeout(CODE_STALL, Vec::new(), Duration::from_millis(100))
        .await
        .unwrap_err();
    assert_eq!(err, SessionError::Deadline);
}

#[tokio::test]
async fn cancellation_surfaces_as_canceled() {
    let (a, _b) = peer_pair(
        Arc::new(TestProto::default()),
        Arc::new(TestProto::default()),
    );
    let err = a
        .request_with_cancel(
            CODE_STALL,
            Vec::new(),
            Duration::from_secs(30),
            tokio::time::sleep(Duration::from_millis(50)),
        )
        .await
        .unwrap_err();
    assert_eq!(err, SessionError::Canceled);
}

#[tokio::test]
async fn peer_close_fails_pending_requests() {
    let (a, b) = peer_pair(
        Arc::new(TestProto::default()),
        Arc::new(TestProto::default()),
    );
    let request = tokio::spawn(async move { a.request(CODE_STALL, Vec::new()).await });
    tokio::time::sleep(Duration::from_millis(50)).await;
    b.close();
    b.closed().await;
    let err = request.await.unwrap().unwrap_err();
    assert_eq!(err, SessionError::PeerDisconnected);
}

#[tokio::test]
async fn concurrent_requests_multiplex() {
    let (a, _b) = peer_pair(
        Arc::new(TestProto::default()),
        Arc::new(TestProto::default()),
    );
    let a = Arc::new(a);
    let mut handles = Vec::new();
    for i in 0..8u8 {
        let a = a.clone();
        handles.push(tokio::spawn(async move {
            let payload = vec![i; 4];
            let response = a.request(CODE_ECHO, payload.clone()).await.unwrap();
            assert_eq!(response, payload);
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }
}

#[tokio::test]
async fn oversized_frame_closes_the_session() {
    let (a, b) = peer_pair(
        Arc::new(TestProto::default()),
        Arc::new(TestProto { max_msg_size: 64 }),
    );
    let err = a
        .request_with_timeout(CODE_ECHO, vec![0u8; 4096], Duration::from_secs(5))
        .await
        .unwrap_err();
    assert_eq!(err, SessionError::PeerDisconnected);
    b.closed().await;
}

#[tokio::test]
async fn responses_settle_exactly_one_request() {
    let (a, _b) = peer_pair(
        Arc::new(TestProto::default()),
        Arc::new(TestProto::default()),
    );
    // Requests in sequence reuse the table without leaking entries.
    for _ in 0..4 {
        let response = a.request(CODE_ECHO, b"foo".to_vec()).await.unwrap();
        assert_eq!(response, b"bar");
    }
    assert_eq!(a.stats().grade(), 0);

    // A timed-out request drops its entry; the late response then matches
    // nothing and demotes the peer.
    let err = a
        .request_with_timeout(CODE_STALL, Vec::new(), Duration::from_millis(50))
        .await
        .unwrap_err();
    assert_eq!(err, SessionError::Deadline);
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(a.stats().grade(), -1);

    let response = a.request(CODE_ECHO, b"foo".to_vec()).await.unwrap();
    assert_eq!(response, b"bar");
}
