// Copyright 2021-2023 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

//! Length-delimited message framing over any duplex byte stream. One stream
//! message is `[u32 length][rlp([code, data])]`.

use rlp::{Rlp, RlpStream};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Anything a session can ride on.
pub trait DuplexStream: AsyncRead + AsyncWrite + Send + Unpin + 'static {}
impl<T: AsyncRead + AsyncWrite + Send + Unpin + 'static> DuplexStream for T {}

#[derive(Error, Debug)]
pub enum FrameError {
    #[error("frame: stream closed")]
    Closed,
    #[error("frame: oversized message ({got} > {limit})")]
    Oversize { got: usize, limit: usize },
    #[error("frame: {0}")]
    Codec(#[from] rlp::DecoderError),
    #[error("frame: {0}")]
    Io(#[from] std::io::Error),
}

/// One stream message: an integer code plus an opaque payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Msg {
    pub code: u64,
    pub data: Vec<u8>,
}

pub struct MsgReader<R> {
    inner: R,
    max_msg_size: usize,
}

pub struct MsgWriter<W> {
    inner: W,
}

/// Splits a duplex stream into framed halves.
pub fn split<S: DuplexStream>(stream: S, max_msg_size: usize) -> (MsgReader<tokio::io::ReadHalf<S>>, MsgWriter<tokio::io::WriteHalf<S>>) {
    let (r, w) = tokio::io::split(stream);
    (
        MsgReader {
            inner: r,
            max_msg_size,
        },
        MsgWriter { inner: w },
    )
}

impl<R: AsyncRead + Unpin> MsgReader<R> {
    pub async fn read_msg(&mut self) -> Result<Msg, FrameError> {
        let mut len_buf = [0u8; 4];
        if let Err(e) = self.inner.read_exact(&mut len_buf).await {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                return Err(FrameError::Closed);
            }
            return Err(e.into());
        }
        let len = u32::from_be_bytes(len_buf) as usize;
        if len > self.max_msg_size {
            return Err(FrameError::Oversize {
                got: len,
                limit: self.max_msg_size,
            });
        }
        let mut buf = vec![0u8; len];
        self.inner.read_exact(&mut buf).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                FrameError::Closed
            } else {
                FrameError::Io(e)
            }
        })?;

        let rlp = Rlp::new(&buf);
        Ok(Msg {
            code: rlp.val_at(0)?,
            data: rlp.val_at(1)?,
        })
    }
}

impl<W: AsyncWrite + Unpin> MsgWriter<W> {
    pub async fn write_msg(&mut self, msg: &Msg) -> Result<(), FrameError> {
        let mut s = RlpStream::new_list(2);
        s.append(&msg.code).append(&msg.data);
        let body = s.out();
        self.inner
            .write_all(&(body.len() as u32).to_be_bytes())
            .await?;
        self.inner.write_all(&body).await?;
        self.inner.flush().await?;
        Ok(())
    }
}
