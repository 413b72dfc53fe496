//! Fixed-capacity client registry and per-client receive buffers.
//!
//! Client ids run from 1 to the registry capacity. A freed id is handed out
//! again to the next connection; the lowest free id always wins.

use std::fmt;

/// Bytes a client may have buffered without completing a frame.
pub const RECEIVE_BUFFER_CAPACITY: usize = 128;

/// Identifier of a connected client, stable for the connection's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(usize);

impl ClientId {
    /// The numeric id, starting at 1.
    pub fn get(&self) -> usize {
        self.0
    }

    fn slot(&self) -> usize {
        self.0 - 1
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A fixed number of slots, each empty or holding one connection.
#[derive(Debug)]
pub struct SocketRegistry<C> {
    slots: Vec<Option<C>>,
    len: usize,
}

impl<C> SocketRegistry<C> {
    /// Create a registry with room for `capacity` connections.
    pub fn with_capacity(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        SocketRegistry { slots, len: 0 }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == self.slots.len()
    }

    /// Store `conn` in the lowest free slot.
    ///
    /// Hands `conn` back if every slot is taken.
    pub fn add(&mut self, conn: C) -> Result<ClientId, C> {
        match self.slots.iter().position(Option::is_none) {
            Some(slot) => {
                self.slots[slot] = Some(conn);
                self.len += 1;
                Ok(ClientId(slot + 1))
            }
            None => Err(conn),
        }
    }

    /// Free the slot of `id`, returning its connection.
    pub fn remove(&mut self, id: ClientId) -> Option<C> {
        let conn = self.slots.get_mut(id.slot())?.take();
        if conn.is_some() {
            self.len -= 1;
        }
        conn
    }

    pub fn get(&self, id: ClientId) -> Option<&C> {
        self.slots.get(id.slot())?.as_ref()
    }

    pub fn get_mut(&mut self, id: ClientId) -> Option<&mut C> {
        self.slots.get_mut(id.slot())?.as_mut()
    }

    /// Ids of all occupied slots, in ascending order.
    pub fn ids(&self) -> Vec<ClientId> {
        self.iter().map(|(id, _)| id).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ClientId, &C)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(slot, conn)| conn.as_ref().map(|c| (ClientId(slot + 1), c)))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (ClientId, &mut C)> {
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(|(slot, conn)| conn.as_mut().map(|c| (ClientId(slot + 1), c)))
    }

    /// Empty every slot, returning the connections.
    pub fn drain(&mut self) -> Vec<(ClientId, C)> {
        self.len = 0;
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(|(slot, conn)| conn.take().map(|c| (ClientId(slot + 1), c)))
            .collect()
    }
}

/// Bytes received from one client that have not been decoded yet.
#[derive(Debug, Clone)]
pub struct ReceiveBuffer {
    data: [u8; RECEIVE_BUFFER_CAPACITY],
    cursor: usize,
}

impl ReceiveBuffer {
    pub fn new() -> Self {
        ReceiveBuffer {
            data: [0; RECEIVE_BUFFER_CAPACITY],
            cursor: 0,
        }
    }

    /// Buffered bytes.
    pub fn filled(&self) -> &[u8] {
        &self.data[..self.cursor]
    }

    /// Free space after the buffered bytes.
    pub fn spare_mut(&mut self) -> &mut [u8] {
        &mut self.data[self.cursor..]
    }

    /// Mark `n` bytes of [`spare_mut`](Self::spare_mut) as filled.
    pub fn advance(&mut self, n: usize) {
        self.cursor = (self.cursor + n).min(RECEIVE_BUFFER_CAPACITY);
    }

    /// Drop the first `n` buffered bytes, moving the rest to the front.
    pub fn consume(&mut self, n: usize) {
        let n = n.min(self.cursor);
        self.data.copy_within(n..self.cursor, 0);
        self.cursor -= n;
    }

    pub fn clear(&mut self) {
        self.cursor = 0;
    }

    pub fn len(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.cursor == 0
    }

    pub fn is_full(&self) -> bool {
        self.cursor == RECEIVE_BUFFER_CAPACITY
    }
}

impl Default for ReceiveBuffer {
    fn default() -> Self {
        Self::new()
    }
}
