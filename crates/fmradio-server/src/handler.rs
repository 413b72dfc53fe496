//! Hook interface between the connection multiplexer and the session logic.

use async_trait::async_trait;
use fmradio_wire::ClientEvent;

use crate::registry::ClientId;

/// Callbacks invoked by [`RadioServer::run`](crate::RadioServer::run).
///
/// All hooks run on the server loop, one at a time: no two hooks ever
/// execute concurrently. Frames returned by the hooks are sent as-is.
#[async_trait]
pub trait SessionHandler: Send {
    /// A client sent `event`.
    async fn on_event(&mut self, client: ClientId, event: ClientEvent);

    /// A client connected. The returned frame is sent to that client only.
    async fn on_join(&mut self, client: ClientId) -> Option<Vec<u8>>;

    /// A client disconnected or was disconnected.
    async fn on_quit(&mut self, _client: ClientId) {}

    /// Called once per loop iteration. The returned frame is sent to every
    /// connected client.
    async fn on_tick(&mut self) -> Option<Vec<u8>>;
}
