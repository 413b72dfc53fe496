//! Event encoder/decoder for the fmradio wire protocol.
//!
//! # Frame format
//!
//! ```text
//! [len:u8][event_id:u8][payload...][event_id:u8][payload...]...
//! ```
//!
//! - `len`: total frame length in bytes, including the length byte itself.
//! - Multi-byte integers are big-endian.
//! - Text payloads are a length byte followed by raw bytes, with no
//!   terminator.
//!
//! # Events
//!
//! | id | event        | direction        | payload               |
//! |----|--------------|------------------|-----------------------|
//! | 0  | malformed    | server to client | none                  |
//! | 1  | volume       | both             | `u8`                  |
//! | 2  | channel      | both             | `u16`                 |
//! | 3  | seek up      | client to server | none                  |
//! | 4  | seek down    | client to server | none                  |
//! | 5  | radio name   | server to client | `len:u8` + <= 8 bytes |
//! | 6  | radio text   | server to client | `len:u8` + <= 64 bytes|
//!
//! The malformed signal is always sent on its own as the literal two bytes
//! `01 00` ([`MALFORMED_FRAME`]), after which the server closes the
//! connection.

use std::fmt;

use bytes::{BufMut, BytesMut};

/// Error signal sent to a client whose frame could not be decoded.
pub const EVENT_MALFORMED: u8 = 0;
/// Volume request (client) or volume report (server).
pub const EVENT_VOLUME: u8 = 1;
/// Channel request (client) or channel report (server).
pub const EVENT_CHANNEL: u8 = 2;
/// Seek towards higher frequencies.
pub const EVENT_SEEK_UP: u8 = 3;
/// Seek towards lower frequencies.
pub const EVENT_SEEK_DOWN: u8 = 4;
/// Programme service name.
pub const EVENT_RADIO_NAME: u8 = 5;
/// Radio text.
pub const EVENT_RADIO_TEXT: u8 = 6;

/// Maximum length of a radio name payload.
pub const RADIO_NAME_MAX: usize = 8;
/// Maximum length of a radio text payload.
pub const RADIO_TEXT_MAX: usize = 64;

/// Largest frame expressible with a one-byte length prefix.
pub const MAX_FRAME_LEN: usize = u8::MAX as usize;

/// The literal malformed-frame signal.
pub const MALFORMED_FRAME: [u8; 2] = [0x01, EVENT_MALFORMED];

/// Why a frame could not be decoded (or encoded).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MalformedFrame {
    /// Declared frame length too small to hold an event id.
    #[error("invalid frame length {declared}")]
    InvalidLength { declared: u8 },

    /// Event id not defined by the protocol.
    #[error("unknown event id {id}")]
    UnknownEvent { id: u8 },

    /// Event id defined, but not valid in this direction.
    #[error("event id {id} not accepted in this direction")]
    WrongDirection { id: u8 },

    /// Frame ended inside an event's payload.
    #[error("event {id} truncated")]
    Truncated { id: u8 },

    /// Text payload longer than its field allows.
    #[error("text of event {id} is {len} bytes, max {max}")]
    TextTooLong { id: u8, len: usize, max: usize },

    /// Encoded frame would not fit the one-byte length prefix.
    #[error("frame of {len} bytes exceeds the 255-byte limit")]
    FrameTooLong { len: usize },
}

impl From<MalformedFrame> for fmradio_core::Error {
    fn from(err: MalformedFrame) -> Self {
        fmradio_core::Error::Protocol(err.to_string())
    }
}

/// Result of attempting to decode one frame from a byte buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeResult<E> {
    /// A complete frame was decoded.
    Frame {
        /// Events in the order they appear in the frame.
        events: Vec<E>,
        /// Number of bytes consumed from the input buffer.
        consumed: usize,
    },

    /// The buffer does not yet contain a complete frame. More data is needed.
    Incomplete,
}

/// An event that can be carried in a frame.
pub trait WireEvent: Sized {
    /// Bytes taken by the event id and payload.
    fn encoded_len(&self) -> usize;

    /// Append the event id and payload to `buf`.
    fn encode(&self, buf: &mut BytesMut);

    /// Decode one event from the start of `buf`, which begins at the event
    /// id. Returns the event and the number of bytes it occupied.
    fn decode_event(buf: &[u8]) -> Result<(Self, usize), MalformedFrame>;
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Requests sent by a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientEvent {
    SetVolume(u8),
    SetChannel(u16),
    SeekUp,
    SeekDown,
}

impl fmt::Display for ClientEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientEvent::SetVolume(v) => write!(f, "set volume {v}"),
            ClientEvent::SetChannel(c) => write!(f, "set channel {c}"),
            ClientEvent::SeekUp => write!(f, "seek up"),
            ClientEvent::SeekDown => write!(f, "seek down"),
        }
    }
}

impl WireEvent for ClientEvent {
    fn encoded_len(&self) -> usize {
        match self {
            ClientEvent::SetVolume(_) => 2,
            ClientEvent::SetChannel(_) => 3,
            ClientEvent::SeekUp | ClientEvent::SeekDown => 1,
        }
    }

    fn encode(&self, buf: &mut BytesMut) {
        match self {
            ClientEvent::SetVolume(v) => {
                buf.put_u8(EVENT_VOLUME);
                buf.put_u8(*v);
            }
            ClientEvent::SetChannel(c) => {
                buf.put_u8(EVENT_CHANNEL);
                buf.put_u16(*c);
            }
            ClientEvent::SeekUp => buf.put_u8(EVENT_SEEK_UP),
            ClientEvent::SeekDown => buf.put_u8(EVENT_SEEK_DOWN),
        }
    }

    fn decode_event(buf: &[u8]) -> Result<(Self, usize), MalformedFrame> {
        let (&id, payload) = buf
            .split_first()
            .ok_or(MalformedFrame::Truncated { id: EVENT_MALFORMED })?;
        match id {
            EVENT_VOLUME => Ok((ClientEvent::SetVolume(read_u8(id, payload)?), 2)),
            EVENT_CHANNEL => Ok((ClientEvent::SetChannel(read_u16(id, payload)?), 3)),
            EVENT_SEEK_UP => Ok((ClientEvent::SeekUp, 1)),
            EVENT_SEEK_DOWN => Ok((ClientEvent::SeekDown, 1)),
            EVENT_MALFORMED | EVENT_RADIO_NAME | EVENT_RADIO_TEXT => {
                Err(MalformedFrame::WrongDirection { id })
            }
            id => Err(MalformedFrame::UnknownEvent { id }),
        }
    }
}

/// Reports sent by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerEvent {
    Volume(u8),
    Channel(u16),
    RadioName(Vec<u8>),
    RadioText(Vec<u8>),
    /// The server rejected the client's last frame and is disconnecting.
    Malformed,
}

impl ServerEvent {
    /// A radio name event, truncated to 8 bytes.
    pub fn radio_name(name: &[u8]) -> Self {
        ServerEvent::RadioName(name[..name.len().min(RADIO_NAME_MAX)].to_vec())
    }

    /// A radio text event, truncated to 64 bytes.
    pub fn radio_text(text: &[u8]) -> Self {
        ServerEvent::RadioText(text[..text.len().min(RADIO_TEXT_MAX)].to_vec())
    }
}

impl fmt::Display for ServerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerEvent::Volume(v) => write!(f, "volume {v}"),
            ServerEvent::Channel(c) => write!(f, "channel {c}"),
            ServerEvent::RadioName(n) => write!(f, "radio name {:?}", String::from_utf8_lossy(n)),
            ServerEvent::RadioText(t) => write!(f, "radio text {:?}", String::from_utf8_lossy(t)),
            ServerEvent::Malformed => write!(f, "malformed"),
        }
    }
}

impl WireEvent for ServerEvent {
    fn encoded_len(&self) -> usize {
        match self {
            ServerEvent::Volume(_) => 2,
            ServerEvent::Channel(_) => 3,
            ServerEvent::RadioName(s) | ServerEvent::RadioText(s) => 2 + s.len(),
            ServerEvent::Malformed => 1,
        }
    }

    fn encode(&self, buf: &mut BytesMut) {
        match self {
            ServerEvent::Volume(v) => {
                buf.put_u8(EVENT_VOLUME);
                buf.put_u8(*v);
            }
            ServerEvent::Channel(c) => {
                buf.put_u8(EVENT_CHANNEL);
                buf.put_u16(*c);
            }
            ServerEvent::RadioName(s) => put_text(buf, EVENT_RADIO_NAME, s),
            ServerEvent::RadioText(s) => put_text(buf, EVENT_RADIO_TEXT, s),
            ServerEvent::Malformed => buf.put_u8(EVENT_MALFORMED),
        }
    }

    fn decode_event(buf: &[u8]) -> Result<(Self, usize), MalformedFrame> {
        let (&id, payload) = buf
            .split_first()
            .ok_or(MalformedFrame::Truncated { id: EVENT_MALFORMED })?;
        match id {
            EVENT_MALFORMED => Ok((ServerEvent::Malformed, 1)),
            EVENT_VOLUME => Ok((ServerEvent::Volume(read_u8(id, payload)?), 2)),
            EVENT_CHANNEL => Ok((ServerEvent::Channel(read_u16(id, payload)?), 3)),
            EVENT_RADIO_NAME => {
                let text = read_text(id, payload, RADIO_NAME_MAX)?;
                let used = 2 + text.len();
                Ok((ServerEvent::RadioName(text), used))
            }
            EVENT_RADIO_TEXT => {
                let text = read_text(id, payload, RADIO_TEXT_MAX)?;
                let used = 2 + text.len();
                Ok((ServerEvent::RadioText(text), used))
            }
            EVENT_SEEK_UP | EVENT_SEEK_DOWN => Err(MalformedFrame::WrongDirection { id }),
            id => Err(MalformedFrame::UnknownEvent { id }),
        }
    }
}

fn put_text(buf: &mut BytesMut, id: u8, text: &[u8]) {
    buf.put_u8(id);
    buf.put_u8(text.len() as u8);
    buf.put_slice(text);
}

fn read_u8(id: u8, payload: &[u8]) -> Result<u8, MalformedFrame> {
    payload
        .first()
        .copied()
        .ok_or(MalformedFrame::Truncated { id })
}

fn read_u16(id: u8, payload: &[u8]) -> Result<u16, MalformedFrame> {
    match payload {
        [hi, lo, ..] => Ok(u16::from_be_bytes([*hi, *lo])),
        _ => Err(MalformedFrame::Truncated { id }),
    }
}

fn read_text(id: u8, payload: &[u8], max: usize) -> Result<Vec<u8>, MalformedFrame> {
    let (&len, rest) = payload
        .split_first()
        .ok_or(MalformedFrame::Truncated { id })?;
    let len = len as usize;
    if len > max {
        return Err(MalformedFrame::TextTooLong { id, len, max });
    }
    rest.get(..len)
        .map(<[u8]>::to_vec)
        .ok_or(MalformedFrame::Truncated { id })
}

// ---------------------------------------------------------------------------
// Frames
// ---------------------------------------------------------------------------

/// Append one event to `buf`, returning the number of bytes written.
pub fn encode_event<E: WireEvent>(buf: &mut BytesMut, event: &E) -> usize {
    let before = buf.len();
    event.encode(buf);
    buf.len() - before
}

/// Encode `events` into a single frame.
///
/// # Example
///
/// ```
/// use fmradio_wire::protocol::{ClientEvent, encode_frame};
///
/// let frame = encode_frame(&[ClientEvent::SetChannel(1021)]).unwrap();
/// assert_eq!(frame, [0x04, 0x02, 0x03, 0xFD]);
/// ```
pub fn encode_frame<E: WireEvent>(events: &[E]) -> Result<Vec<u8>, MalformedFrame> {
    let len = 1 + events.iter().map(WireEvent::encoded_len).sum::<usize>();
    if len > MAX_FRAME_LEN {
        return Err(MalformedFrame::FrameTooLong { len });
    }
    if events.is_empty() {
        return Err(MalformedFrame::InvalidLength { declared: 1 });
    }

    let mut buf = BytesMut::with_capacity(len);
    buf.put_u8(len as u8);
    for event in events {
        encode_event(&mut buf, event);
    }
    Ok(buf.to_vec())
}

/// Attempt to decode one client frame from the start of `buf`.
///
/// Returns [`DecodeResult::Incomplete`] if `buf` holds fewer bytes than the
/// declared frame length. Any unknown or out-of-direction event id, or a
/// payload running past the end of the frame, is a [`MalformedFrame`].
///
/// # Example
///
/// ```
/// use fmradio_wire::protocol::{ClientEvent, DecodeResult, decode_frame};
///
/// let buf = [0x03, 0x01, 0x07, 0x02, 0x03];
/// match decode_frame(&buf).unwrap() {
///     DecodeResult::Frame { events, consumed } => {
///         assert_eq!(events, vec![ClientEvent::SetVolume(7)]);
///         assert_eq!(consumed, 3);
///     }
///     DecodeResult::Incomplete => panic!("expected Frame"),
/// }
/// ```
pub fn decode_frame(buf: &[u8]) -> Result<DecodeResult<ClientEvent>, MalformedFrame> {
    decode_events(buf)
}

/// Attempt to decode one server frame from the start of `buf`.
///
/// The literal malformed signal `01 00` decodes as a single
/// [`ServerEvent::Malformed`].
pub fn decode_server_frame(buf: &[u8]) -> Result<DecodeResult<ServerEvent>, MalformedFrame> {
    match buf {
        [0x01] => Ok(DecodeResult::Incomplete),
        [0x01, EVENT_MALFORMED, ..] => Ok(DecodeResult::Frame {
            events: vec![ServerEvent::Malformed],
            consumed: MALFORMED_FRAME.len(),
        }),
        _ => decode_events(buf),
    }
}

fn decode_events<E: WireEvent>(buf: &[u8]) -> Result<DecodeResult<E>, MalformedFrame> {
    let Some(&declared) = buf.first() else {
        return Ok(DecodeResult::Incomplete);
    };
    if declared < 2 {
        return Err(MalformedFrame::InvalidLength { declared });
    }

    let len = declared as usize;
    if buf.len() < len {
        return Ok(DecodeResult::Incomplete);
    }

    let mut body = &buf[1..len];
    let mut events = Vec::new();
    while !body.is_empty() {
        let (event, used) = E::decode_event(body)?;
        events.push(event);
        body = &body[used..];
    }

    Ok(DecodeResult::Frame {
        events,
        consumed: len,
    })
}
