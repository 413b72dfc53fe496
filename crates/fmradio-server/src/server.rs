//! Connection multiplexer.
//!
//! [`RadioServer`] owns the listening socket and a fixed-size registry of
//! client connections, and drives them all from one loop:
//!
//! 1. Wait until the listener or any client is readable, bounded by the
//!    configured poll timeout.
//! 2. Accept at most one pending connection. If the registry is full the
//!    connection is closed without a word; otherwise the client gets the
//!    frame returned by [`SessionHandler::on_join`].
//! 3. For every readable client, append what is available to its receive
//!    buffer and decode as many complete frames as it holds. A malformed
//!    frame earns the client [`MALFORMED_FRAME`] and a closed connection.
//! 4. Run [`SessionHandler::on_tick`] and broadcast its frame.
//!
//! Nothing in the loop runs concurrently with anything else, so the handler
//! needs no locking.

use std::future::poll_fn;
use std::io;
use std::net::SocketAddr;
use std::task::Poll;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info, trace, warn};

use fmradio_core::{Error, Result};
use fmradio_wire::{DecodeResult, MALFORMED_FRAME, decode_frame};

use crate::config::ServerConfig;
use crate::handler::SessionHandler;
use crate::registry::{ClientId, ReceiveBuffer, SocketRegistry};
use crate::shutdown::ShutdownCoordinator;

/// Longest a single frame write may take before the client is dropped.
const SEND_TIMEOUT: Duration = Duration::from_millis(500);

/// One connected client.
#[derive(Debug)]
struct Client {
    stream: TcpStream,
    peer: SocketAddr,
    buffer: ReceiveBuffer,
}

/// What one readiness wait turned up.
#[derive(Debug, Default)]
struct Readiness {
    accepted: Option<io::Result<(TcpStream, SocketAddr)>>,
    clients: Vec<ClientId>,
}

/// A bound server, ready to [`run`](Self::run).
#[derive(Debug)]
pub struct RadioServer {
    listener: TcpListener,
    local_addr: SocketAddr,
    config: ServerConfig,
    clients: SocketRegistry<Client>,
}

impl RadioServer {
    /// Bind and listen on `config.socket_addr()`.
    ///
    /// Failing to bind is fatal and reported as [`Error::Bind`].
    pub async fn bind(config: ServerConfig) -> Result<Self> {
        config.validate()?;
        let addr = config.socket_addr();
        let listener = TcpListener::bind(addr).await.map_err(|source| Error::Bind {
            addr: addr.to_string(),
            source,
        })?;
        let local_addr = listener.local_addr()?;
        info!(%local_addr, max_clients = config.max_clients, "radio server listening");

        Ok(RadioServer {
            listener,
            local_addr,
            clients: SocketRegistry::with_capacity(config.max_clients),
            config,
        })
    }

    /// The address actually bound, useful with port 0.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Number of connected clients.
    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Serve clients until `shutdown` stops the loop.
    ///
    /// Returns the handler once every connection has been closed.
    pub async fn run<H: SessionHandler>(
        mut self,
        mut handler: H,
        shutdown: ShutdownCoordinator,
    ) -> Result<H> {
        while shutdown.is_running() {
            let ready = self.wait_ready().await;

            if let Some(accepted) = ready.accepted {
                self.accept(accepted, &mut handler).await;
            }

            for id in ready.clients {
                self.receive(id, &mut handler).await;
            }

            if let Some(frame) = handler.on_tick().await {
                self.broadcast(&frame, &mut handler).await;
            }
        }

        info!(clients = self.clients.len(), "radio server shutting down");
        shutdown.join().await;
        for (id, mut client) in self.clients.drain() {
            if let Err(e) = client.stream.shutdown().await {
                debug!(client = %id, error = %e, "shutdown on close failed");
            }
            handler.on_quit(id).await;
        }
        Ok(handler)
    }

    async fn wait_ready(&self) -> Readiness {
        let wait = poll_fn(|cx| {
            let accepted = match self.listener.poll_accept(cx) {
                Poll::Ready(result) => Some(result),
                Poll::Pending => None,
            };
            let clients: Vec<ClientId> = self
                .clients
                .iter()
                .filter(|(_, client)| client.stream.poll_read_ready(cx).is_ready())
                .map(|(id, _)| id)
                .collect();

            if accepted.is_none() && clients.is_empty() {
                Poll::Pending
            } else {
                Poll::Ready(Readiness { accepted, clients })
            }
        });

        tokio::time::timeout(self.config.poll_timeout, wait)
            .await
            .unwrap_or_default()
    }

    async fn accept<H: SessionHandler>(
        &mut self,
        accepted: io::Result<(TcpStream, SocketAddr)>,
        handler: &mut H,
    ) {
        let (stream, peer) = match accepted {
            Ok(conn) => conn,
            Err(e) => {
                error!(error = %e, "accept failed");
                return;
            }
        };
        if let Err(e) = stream.set_nodelay(true) {
            debug!(%peer, error = %e, "set_nodelay failed");
        }

        let client = Client {
            stream,
            peer,
            buffer: ReceiveBuffer::new(),
        };
        let id = match self.clients.add(client) {
            Ok(id) => id,
            Err(rejected) => {
                warn!(peer = %rejected.peer, "server full, closing connection");
                return;
            }
        };
        info!(client = %id, %peer, "client joined");

        let Some(frame) = handler.on_join(id).await else {
            return;
        };
        let sent = match self.clients.get_mut(id) {
            Some(client) => send_frame(&mut client.stream, &frame).await,
            None => Ok(()),
        };
        if let Err(e) = sent {
            warn!(client = %id, error = %e, "join frame not delivered");
            self.disconnect(id, handler).await;
        }
    }

    async fn receive<H: SessionHandler>(&mut self, id: ClientId, handler: &mut H) {
        let Some(client) = self.clients.get_mut(id) else {
            return;
        };

        match client.stream.try_read(client.buffer.spare_mut()) {
            Ok(0) => {
                self.disconnect(id, handler).await;
                return;
            }
            Ok(n) => client.buffer.advance(n),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => return,
            // Picked up again on the next iteration.
            Err(e) if e.kind() == io::ErrorKind::Interrupted => return,
            Err(e) => {
                debug!(client = %id, error = %e, "receive failed");
                self.disconnect(id, handler).await;
                return;
            }
        }
        trace!(client = %id, bytes = ?client.buffer.filled(), "received");

        let mut offset = 0;
        loop {
            match decode_frame(&client.buffer.filled()[offset..]) {
                Ok(DecodeResult::Frame { events, consumed }) => {
                    offset += consumed;
                    for event in events {
                        debug!(client = %id, %event, "client request");
                        handler.on_event(id, event).await;
                    }
                }
                Ok(DecodeResult::Incomplete) => break,
                Err(e) => {
                    warn!(client = %id, peer = %client.peer, error = %e, "malformed frame");
                    self.reject(id, handler).await;
                    return;
                }
            }
        }
        client.buffer.consume(offset);

        if client.buffer.is_full() {
            warn!(client = %id, peer = %client.peer, "receive buffer full without a complete frame");
            self.reject(id, handler).await;
        }
    }

    async fn broadcast<H: SessionHandler>(&mut self, frame: &[u8], handler: &mut H) {
        trace!(clients = self.clients.len(), bytes = ?frame, "broadcast");
        let mut failed = Vec::new();
        for (id, client) in self.clients.iter_mut() {
            if let Err(e) = send_frame(&mut client.stream, frame).await {
                warn!(client = %id, error = %e, "broadcast not delivered");
                failed.push(id);
            }
        }
        for id in failed {
            self.disconnect(id, handler).await;
        }
    }

    /// Send the malformed signal and close the connection.
    async fn reject<H: SessionHandler>(&mut self, id: ClientId, handler: &mut H) {
        if let Some(mut client) = self.clients.remove(id) {
            if let Err(e) = send_frame(&mut client.stream, &MALFORMED_FRAME).await {
                debug!(client = %id, error = %e, "malformed signal not delivered");
            }
            if let Err(e) = client.stream.shutdown().await {
                debug!(client = %id, error = %e, "shutdown failed");
            }
            info!(client = %id, peer = %client.peer, "client disconnected");
            handler.on_quit(id).await;
        }
    }

    async fn disconnect<H: SessionHandler>(&mut self, id: ClientId, handler: &mut H) {
        if let Some(client) = self.clients.remove(id) {
            info!(client = %id, peer = %client.peer, "client left");
            handler.on_quit(id).await;
        }
    }
}

async fn send_frame(stream: &mut TcpStream, frame: &[u8]) -> io::Result<()> {
    match tokio::time::timeout(SEND_TIMEOUT, stream.write_all(frame)).await {
        Ok(result) => result,
        Err(_) => Err(io::Error::new(io::ErrorKind::TimedOut, "send timed out")),
    }
}

/// Bind a server with `config` and run it until `shutdown` stops it.
pub async fn serve<H: SessionHandler>(
    config: ServerConfig,
    handler: H,
    shutdown: ShutdownCoordinator,
) -> Result<H> {
    RadioServer::bind(config).await?.run(handler, shutdown).await
}
