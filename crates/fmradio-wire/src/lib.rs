//! fmradio-wire: Framed wire protocol and TCP client for fmradio.
//!
//! Clients and the server exchange length-prefixed frames, each carrying
//! one or more events:
//!
//! ```text
//! [len][id][payload][id][payload]...
//! ```
//!
//! `len` counts every byte of the frame including itself. See [`protocol`]
//! for the event table and [`client`] for an async client.

pub mod client;
pub mod protocol;

pub use client::RadioClient;
pub use protocol::{
    ClientEvent, DecodeResult, MALFORMED_FRAME, MAX_FRAME_LEN, MalformedFrame, ServerEvent,
    WireEvent, decode_frame, decode_server_frame, encode_event, encode_frame,
};
