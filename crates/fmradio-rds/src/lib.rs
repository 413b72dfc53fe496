//! fmradio-rds: RDS group decoder for fmradio.
//!
//! The tuner delivers RDS data as quartets of 16-bit blocks (A, B, C, D).
//! [`RdsDecoder`] consumes those quartets one at a time and reassembles the
//! programme service name (group 0) and radio text (group 2). It performs no
//! I/O and never fails: inconsistent input only causes a resynchronization.
//!
//! # Example
//!
//! ```
//! use fmradio_rds::{RdsDecoder, RdsUpdate};
//!
//! let mut rds = RdsDecoder::new();
//! // Group 2B, offset 0, characters 'H' and carriage return.
//! let update = rds.decode([0xF201, 0x2800, 0xF201, 0x480D]);
//! assert_eq!(update, Some(RdsUpdate::TextCommitted));
//! assert_eq!(rds.radio_text(), b"H");
//! ```

pub mod decoder;
pub mod program_type;

pub use decoder::{DataType, RADIO_NAME_LEN, RADIO_TEXT_LEN, RdsDecoder, RdsUpdate};
pub use program_type::ProgramType;
