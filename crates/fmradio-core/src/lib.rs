//! fmradio-core: Core traits, types, and error definitions for fmradio.
//!
//! This crate defines the hardware-agnostic abstractions shared by the RDS
//! decoder, the wire protocol, and the network server. Applications that
//! only need to talk about tuners and channels depend on these types without
//! pulling in the server stack.
//!
//! # Key types
//!
//! - [`Tuner`] -- the facade over an FM receiver peripheral
//! - [`RdsBlocks`] -- one raw RDS block quartet (A, B, C, D)
//! - [`SeekDirection`] / [`SeekOutcome`] -- station seek requests and results
//! - [`Error`] / [`Result`] -- error handling

pub mod error;
pub mod helpers;
pub mod tuner;
pub mod types;

// Re-export key types at crate root for ergonomic `use fmradio_core::*`.
pub use error::{Error, Result};
pub use helpers::{format_channel_mhz, signal_percent};
pub use tuner::Tuner;
pub use types::*;
