// Copyright 2021-2023 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

//! Per-peer request/response multiplexing over a framed duplex stream.
//!
//! Two tasks per session: a reader pumping inbound frames into a bounded op
//! channel (with an ack back, so handling is strictly serial), and an op
//! loop that owns the write half and the pending-request table. All
//! outbound frames are totally ordered through the op loop.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rlp::{Rlp, RlpStream};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch, Notify};

use crate::frame::{self, DuplexStream, FrameError, Msg};
use crate::node::NodeId;
use crate::proto::Protocol;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SessionError {
    #[error("session: peer disconnected")]
    PeerDisconnected,
    #[error("session: request timed out")]
    Deadline,
    #[error("session: request canceled")]
    Canceled,
    #[error("session: response decode: {0}")]
    Decode(String),
}

/// Quality bookkeeping feeding the peer directory's priority.
pub struct SessionStats {
    started_at: Instant,
    grade: AtomicI64,
}

impl SessionStats {
    fn new() -> Self {
        Self {
            started_at: Instant::now(),
            grade: AtomicI64::new(0),
        }
    }

    pub fn grade(&self) -> i64 {
        self.grade.load(Ordering::Relaxed)
    }

    pub fn demote(&self) {
        self.grade.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn duration(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// `durationMinutes + grade`; non-positive grades drag fresh sessions
    /// below older clean ones.
    pub fn weight(&self) -> i64 {
        self.duration().as_secs() as i64 / 60 + self.grade()
    }
}

/// The `[reqID, isResponse, payload]` tuple carried in each frame.
struct RequestFrame {
    req_id: u32,
    is_response: bool,
    payload: Vec<u8>,
}

impl RequestFrame {
    fn encode(&self) -> Vec<u8> {
        let mut s = RlpStream::new_list(3);
        s.append(&self.req_id)
            .append(&self.is_response)
            .append(&self.payload);
        s.out().to_vec()
    }

    fn decode(raw: &[u8]) -> Result<Self, rlp::DecoderError> {
        let rlp = Rlp::new(raw);
        Ok(Self {
            req_id: rlp.val_at(0)?,
            is_response: rlp.val_at(1)?,
            payload: rlp.val_at(2)?,
        })
    }
}

type Reply = oneshot::Sender<Result<Vec<u8>, SessionError>>;

enum Op {
    /// Local request: allocate an id, send the frame, remember the entry.
    Begin {
        msg_code: u64,
        payload: Vec<u8>,
        id_back: oneshot::Sender<Result<u32, SessionError>>,
        done: Reply,
    },
    /// Local request gave up; drop the entry.
    End { req_id: u32 },
    /// Frame from the wire; ack unblocks the reader.
    Inbound {
        msg_code: u64,
        frame: RequestFrame,
        ack: oneshot::Sender<()>,
    },
    /// The reader hit a framing error or the stream closed.
    ReaderGone,
}

struct Pending {
    msg_code: u64,
    done: Reply,
}

pub struct Session {
    peer: NodeId,
    op_tx: mpsc::Sender<Op>,
    stats: Arc<SessionStats>,
    shutdown: Arc<Notify>,
    closed_rx: watch::Receiver<bool>,
}

impl Session {
    /// Starts the two session tasks over an established stream.
    pub fn spawn<S: DuplexStream>(peer: NodeId, stream: S, proto: Arc<dyn Protocol>) -> Session {
        let (reader, writer) = frame::split(stream, proto.max_msg_size());
        let (op_tx, op_rx) = mpsc::channel(1);
        let stats = Arc::new(SessionStats::new());
        let shutdown = Arc::new(Notify::new());
        let (closed_tx, closed_rx) = watch::channel(false);

        tokio::spawn(read_loop(peer, reader, op_tx.clone()));
        tokio::spawn(op_loop(
            peer,
            writer,
            op_rx,
            proto,
            stats.clone(),
            shutdown.clone(),
            closed_tx,
        ));

        Session {
            peer,
            op_tx,
            stats,
            shutdown,
            closed_rx,
        }
    }

    pub fn peer(&self) -> NodeId {
        self.peer
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn weight(&self) -> i64 {
        self.stats.weight()
    }

    /// Sends a request and awaits its raw response payload with the default
    /// 30-second deadline.
    pub async fn request(&self, msg_code: u64, payload: Vec<u8>) -> Result<Vec<u8>, SessionError> {
        self.request_with_timeout(msg_code, payload, DEFAULT_REQUEST_TIMEOUT)
            .await
    }

    pub async fn request_with_timeout(
        &self,
        msg_code: u64,
        payload: Vec<u8>,
        timeout: Duration,
    ) -> Result<Vec<u8>, SessionError> {
        self.request_with_cancel(msg_code, payload, timeout, std::future::pending())
            .await
    }

    /// The general form: resolves with the response, `Deadline` after
    /// `timeout`, or `Canceled` as soon as `cancel` resolves. Either way the
    /// abandoned entry is dropped from the pending table.
    pub async fn request_with_cancel<C>(
        &self,
        msg_code: u64,
        payload: Vec<u8>,
        timeout: Duration,
        cancel: C,
    ) -> Result<Vec<u8>, SessionError>
    where
        C: std::future::Future<Output = ()>,
    {
        let (id_back_tx, id_back_rx) = oneshot::channel();
        let (done_tx, done_rx) = oneshot::channel();
        self.op_tx
            .send(Op::Begin {
                msg_code,
                payload,
                id_back: id_back_tx,
                done: done_tx,
            })
            .await
            .map_err(|_| SessionError::PeerDisconnected)?;
        let req_id = id_back_rx
            .await
            .map_err(|_| SessionError::PeerDisconnected)??;

        tokio::pin!(cancel);
        tokio::select! {
            outcome = tokio::time::timeout(timeout, done_rx) => match outcome {
                Ok(Ok(result)) => result,
                Ok(Err(_)) => Err(SessionError::PeerDisconnected),
                Err(_) => {
                    let _ = self.op_tx.send(Op::End { req_id }).await;
                    Err(SessionError::Deadline)
                }
            },
            _ = &mut cancel => {
                let _ = self.op_tx.send(Op::End { req_id }).await;
                Err(SessionError::Canceled)
            }
        }
    }

    /// Typed request: RLP-encodes the payload and decodes the response. A
    /// response that fails to decode demotes the session grade.
    pub async fn request_rlp<P, R>(&self, msg_code: u64, payload: &P) -> Result<R, SessionError>
    where
        P: rlp::Encodable,
        R: rlp::Decodable,
    {
        let raw = self
            .request(msg_code, rlp::encode(payload).to_vec())
            .await?;
        rlp::decode(&raw).map_err(|e| {
            self.stats.demote();
            SessionError::Decode(e.to_string())
        })
    }

    /// Tears the session down; pending requests fail with
    /// `PeerDisconnected`.
    pub fn close(&self) {
        self.shutdown.notify_waiters();
        self.shutdown.notify_one();
    }

    /// Resolves once both tasks have stopped.
    pub async fn closed(&self) {
        let mut rx = self.closed_rx.clone();
        while !*rx.borrow() {
            if rx.changed().await.is_err() {
                return;
            }
        }
    }
}

async fn read_loop<R>(peer: NodeId, mut reader: frame::MsgReader<R>, op_tx: mpsc::Sender<Op>)
where
    R: tokio::io::AsyncRead + Unpin,
{
    loop {
        match reader.read_msg().await {
            Ok(msg) => {
                let frame = match RequestFrame::decode(&msg.data) {
                    Ok(frame) => frame,
                    Err(e) => {
                        log::debug!("{:?}: malformed frame, closing: {}", peer, e);
                        let _ = op_tx.send(Op::ReaderGone).await;
                        return;
                    }
                };
                let (ack_tx, ack_rx) = oneshot::channel();
                if op_tx
                    .send(Op::Inbound {
                        msg_code: msg.code,
                        frame,
                        ack: ack_tx,
                    })
                    .await
                    .is_err()
                {
                    return;
                }
                // Serial handling: the next read waits for the op loop.
                if ack_rx.await.is_err() {
                    return;
                }
            }
            Err(FrameError::Closed) => {
                let _ = op_tx.send(Op::ReaderGone).await;
                return;
            }
            Err(e) => {
                log::debug!("{:?}: read failed, closing: {}", peer, e);
                let _ = op_tx.send(Op::ReaderGone).await;
                return;
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn op_loop<W>(
    peer: NodeId,
    mut writer: frame::MsgWriter<W>,
    mut op_rx: mpsc::Receiver<Op>,
    proto: Arc<dyn Protocol>,
    stats: Arc<SessionStats>,
    shutdown: Arc<Notify>,
    closed_tx: watch::Sender<bool>,
) where
    W: tokio::io::AsyncWrite + Unpin,
{
    let mut pending: HashMap<u32, Pending> = HashMap::new();

    loop {
        let op = tokio::select! {
            op = op_rx.recv() => match op {
                Some(op) => op,
                None => break,
            },
            _ = shutdown.notified() => break,
        };

        match op {
            Op::Begin {
                msg_code,
                payload,
                id_back,
                done,
            } => {
                let mut req_id: u32 = rand::random();
                while pending.contains_key(&req_id) {
                    req_id = rand::random();
                }
                let frame = RequestFrame {
                    req_id,
                    is_response: false,
                    payload,
                };
                if let Err(e) = writer
                    .write_msg(&Msg {
                        code: msg_code,
                        data: frame.encode(),
                    })
                    .await
                {
                    log::debug!("{:?}: write failed: {}", peer, e);
                    let _ = id_back.send(Err(SessionError::PeerDisconnected));
                    break;
                }
                pending.insert(req_id, Pending { msg_code, done });
                let _ = id_back.send(Ok(req_id));
            }
            Op::End { req_id } => {
                pending.remove(&req_id);
            }
            Op::Inbound {
                msg_code,
                frame,
                ack,
            } => {
                if frame.is_response {
                    match pending.remove(&frame.req_id) {
                        Some(entry) if entry.msg_code == msg_code => {
                            let _ = entry.done.send(Ok(frame.payload));
                        }
                        Some(entry) => {
                            // Mismatched code: the response is garbage and
                            // the peer pays for it.
                            log::debug!("{:?}: mismatched response code", peer);
                            stats.demote();
                            let _ = entry.done.send(Err(SessionError::Decode(
                                "mismatched response msg code".into(),
                            )));
                        }
                        None => {
                            stats.demote();
                        }
                    }
                } else {
                    // Stay stoppable while the handler runs.
                    let outcome = tokio::select! {
                        outcome = proto.handle_request(peer, msg_code, frame.payload) => outcome,
                        _ = shutdown.notified() => {
                            let _ = ack.send(());
                            break;
                        }
                    };
                    let payload = match outcome {
                        Ok(response) => response,
                        Err(e) => {
                            log::warn!("{:?}: request handler failed: {}", peer, e);
                            stats.demote();
                            Vec::new()
                        }
                    };
                    let response = RequestFrame {
                        req_id: frame.req_id,
                        is_response: true,
                        payload,
                    };
                    if let Err(e) = writer
                        .write_msg(&Msg {
                            code: msg_code,
                            data: response.encode(),
                        })
                        .await
                    {
                        log::debug!("{:?}: write failed: {}", peer, e);
                        let _ = ack.send(());
                        break;
                    }
                }
                let _ = ack.send(());
            }
            Op::ReaderGone => break,
        }
    }

    for (_, entry) in pending.drain() {
        let _ = entry.done.send(Err(SessionError::PeerDisconnected));
    }
    let _ = closed_tx.send(true);
    log::debug!("{:?}: session closed, weight {}", peer, stats.weight());
}
