//! The `Tuner` trait -- facade over an FM receiver peripheral.
//!
//! The server never touches registers directly. Everything it needs from
//! the hardware goes through this trait: volume, channel, seek, signal
//! strength, and the latest RDS group. Register-level drivers and the
//! simulated tuner in `fmradio-test-harness` implement it.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{RdsBlocks, SeekDirection, SeekOutcome};

/// Asynchronous interface to an FM receiver.
///
/// Operations are expected to be fast (a few register round-trips) and are
/// not cancellable mid-flight. Any failure is reported as an error and
/// leaves the tuner in whatever state the hardware settled in.
#[async_trait]
pub trait Tuner: Send {
    /// Read the current volume step.
    async fn volume(&mut self) -> Result<u8>;

    /// Set the volume, clamping the request into the supported range.
    ///
    /// Returns the value actually applied.
    async fn set_volume(&mut self, volume: i32) -> Result<u8>;

    /// Read the current channel, in 100 kHz units.
    async fn channel(&mut self) -> Result<u16>;

    /// Tune to `channel` (100 kHz units).
    ///
    /// Returns the channel the tuner actually locked to, which may differ
    /// from the request when it falls between raster points or outside the
    /// band.
    async fn set_channel(&mut self, channel: u16) -> Result<u16>;

    /// Seek to the next station in `direction`, stopping at the band limit.
    async fn seek(&mut self, direction: SeekDirection) -> Result<SeekOutcome>;

    /// Read the latest RDS group.
    ///
    /// Returns `Ok(None)` when the decoder has no valid sync.
    async fn read_rds_blocks(&mut self) -> Result<Option<RdsBlocks>>;

    /// Read the received signal strength, in dBµV.
    async fn signal_strength(&mut self) -> Result<u8>;
}
