//! Async TCP client for the fmradio wire protocol.
//!
//! [`RadioClient`] sends requests and reads the frames the server pushes:
//! one full snapshot right after connecting, then a frame on every tick in
//! which something changed.
//!
//! ```no_run
//! # async fn demo() -> fmradio_core::Result<()> {
//! use std::time::Duration;
//! use fmradio_wire::RadioClient;
//!
//! let mut client = RadioClient::connect("127.0.0.1:9502").await?;
//! let snapshot = client.next_events(Duration::from_secs(1)).await?;
//! client.set_volume(8).await?;
//! # Ok(())
//! # }
//! ```

use std::net::SocketAddr;
use std::time::Duration;

use bytes::{Buf, BytesMut};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio::time::Instant;
use tracing::{debug, trace};

use fmradio_core::{Error, Result, SeekDirection};

use crate::protocol::{ClientEvent, DecodeResult, ServerEvent, decode_server_frame, encode_frame};

const READ_CHUNK: usize = 256;

/// A connection to an fmradio server.
#[derive(Debug)]
pub struct RadioClient {
    stream: TcpStream,
    buf: BytesMut,
    peer: SocketAddr,
}

impl RadioClient {
    /// Connect to a server.
    pub async fn connect(addr: impl ToSocketAddrs) -> Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;
        let peer = stream.peer_addr()?;
        debug!(%peer, "connected to radio server");
        Ok(RadioClient {
            stream,
            buf: BytesMut::with_capacity(READ_CHUNK),
            peer,
        })
    }

    /// Connect to a server, giving up after `timeout`.
    pub async fn connect_with_timeout(addr: impl ToSocketAddrs, timeout: Duration) -> Result<Self> {
        match tokio::time::timeout(timeout, Self::connect(addr)).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout),
        }
    }

    /// Address of the server.
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    /// Send `events` as one frame.
    pub async fn send(&mut self, events: &[ClientEvent]) -> Result<()> {
        let frame = encode_frame(events)?;
        self.send_raw(&frame).await
    }

    /// Send bytes as-is, without framing them.
    pub async fn send_raw(&mut self, bytes: &[u8]) -> Result<()> {
        trace!(peer = %self.peer, bytes = ?bytes, "sending");
        self.stream.write_all(bytes).await?;
        Ok(())
    }

    pub async fn set_volume(&mut self, volume: u8) -> Result<()> {
        self.send(&[ClientEvent::SetVolume(volume)]).await
    }

    pub async fn set_channel(&mut self, channel: u16) -> Result<()> {
        self.send(&[ClientEvent::SetChannel(channel)]).await
    }

    pub async fn seek(&mut self, direction: SeekDirection) -> Result<()> {
        let event = match direction {
            SeekDirection::Up => ClientEvent::SeekUp,
            SeekDirection::Down => ClientEvent::SeekDown,
        };
        self.send(&[event]).await
    }

    /// Wait for the next frame from the server and return its events.
    ///
    /// Returns [`Error::Timeout`] if no complete frame arrives within
    /// `timeout` (bytes of a partial frame are kept for the next call), and
    /// [`Error::ConnectionLost`] if the server closes the connection.
    pub async fn next_events(&mut self, timeout: Duration) -> Result<Vec<ServerEvent>> {
        let deadline = Instant::now() + timeout;
        loop {
            if let DecodeResult::Frame { events, consumed } = decode_server_frame(&self.buf)? {
                self.buf.advance(consumed);
                trace!(peer = %self.peer, ?events, "received frame");
                return Ok(events);
            }

            self.buf.reserve(READ_CHUNK);
            match tokio::time::timeout_at(deadline, self.stream.read_buf(&mut self.buf)).await {
                Ok(Ok(0)) => return Err(Error::ConnectionLost),
                Ok(Ok(_)) => {}
                Ok(Err(e)) => return Err(e.into()),
                Err(_) => return Err(Error::Timeout),
            }
        }
    }

    /// Close the connection.
    pub async fn close(mut self) -> Result<()> {
        self.stream.shutdown().await?;
        Ok(())
    }
}
