//! # fmradio -- Networked FM Radio Control
//!
//! `fmradio` exposes an FM tuner to any number of TCP clients. Clients set
//! the volume, tune or seek, and receive the station name and radio text
//! decoded from the broadcast's RDS subcarrier as they change.
//!
//! ## Quick Start
//!
//! ```no_run
//! use fmradio::server::{RadioSession, ServerBuilder, ShutdownCoordinator};
//! # use fmradio::Tuner;
//!
//! # async fn run(tuner: impl Tuner + 'static) -> fmradio::Result<()> {
//! let server = ServerBuilder::new().port(9502).bind().await?;
//! server
//!     .run(RadioSession::new(tuner), ShutdownCoordinator::install())
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! | Crate            | Purpose                                           |
//! |------------------|---------------------------------------------------|
//! | `fmradio-core`   | [`Tuner`] trait, shared types, errors             |
//! | `fmradio-rds`    | RDS group decoder                                 |
//! | `fmradio-wire`   | Framed wire protocol and async client             |
//! | `fmradio-server` | Connection multiplexer and session protocol       |
//! | **`fmradio`**    | This facade crate -- re-exports everything        |
//!
//! Hardware drivers implement [`Tuner`]; everything above it is
//! hardware-agnostic.

// Re-export everything from fmradio-core at the crate root.
pub use fmradio_core::*;

/// RDS decoder.
pub mod rds {
    pub use fmradio_rds::*;
}

/// Wire protocol and client.
pub mod wire {
    pub use fmradio_wire::*;
}

/// Server, session protocol and shutdown coordination.
pub mod server {
    pub use fmradio_server::*;
}
