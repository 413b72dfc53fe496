//! fmradio-server: Connection-multiplexing TCP server for fmradio.
//!
//! One [`RadioServer`] serves every client from a single loop. Client
//! requests, joins and periodic ticks are handed to a [`SessionHandler`];
//! [`RadioSession`] is the implementation that drives a
//! [`Tuner`](fmradio_core::Tuner) and broadcasts RDS metadata.
//!
//! ```no_run
//! use fmradio_server::{RadioSession, ServerConfig, ShutdownCoordinator, serve};
//! use fmradio_test_harness::SimulatedTuner;
//!
//! # async fn example() -> fmradio_core::Result<()> {
//! let session = RadioSession::new(SimulatedTuner::demo());
//! serve(ServerConfig::default(), session, ShutdownCoordinator::install()).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod handler;
pub mod registry;
pub mod server;
pub mod session;
pub mod shutdown;

pub use config::{ServerBuilder, ServerConfig};
pub use handler::SessionHandler;
pub use registry::{ClientId, RECEIVE_BUFFER_CAPACITY, ReceiveBuffer, SocketRegistry};
pub use server::{RadioServer, serve};
pub use session::{DEFAULT_TICK_INTERVAL, RadioSession};
pub use shutdown::{ShutdownCoordinator, ShutdownHandle};
