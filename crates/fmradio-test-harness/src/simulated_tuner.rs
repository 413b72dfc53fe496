//! Simulated tuner for deterministic testing without hardware.
//!
//! [`SimulatedTuner`] implements the [`Tuner`] trait over an in-memory
//! station table. It keeps a log of every operation and can be told to fail
//! specific operations, which lets session and server tests exercise the
//! peripheral-failure paths.
//!
//! # Example
//!
//! ```
//! use fmradio_test_harness::{SimulatedTuner, Station, TunerOp};
//!
//! let mut tuner = SimulatedTuner::new()
//!     .with_station(Station::new(1021, 60).with_name("TEST").with_text("Hello"));
//! tuner.fail(TunerOp::Seek);
//! ```

use std::collections::HashSet;
use std::fmt;

use async_trait::async_trait;
use tracing::trace;

use fmradio_core::{
    Band, ChannelSpacing, Error, RdsBlocks, Result, SeekDirection, SeekOutcome, Tuner,
    clamp_volume,
};

use crate::rds_groups::{ps_sequence, radio_text_sequence};

/// Signal strength reported when no station is on the current channel.
const NOISE_FLOOR: u8 = 6;

/// A broadcast station known to the simulated tuner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Station {
    /// Channel in 100 kHz units.
    pub channel: u16,
    /// Signal strength in dBµV.
    pub signal_strength: u8,
    /// Programme service name, if the station broadcasts RDS.
    pub name: Option<String>,
    /// Radio text, if the station broadcasts RDS.
    pub text: Option<String>,
}

impl Station {
    /// Create a station without RDS.
    pub fn new(channel: u16, signal_strength: u8) -> Self {
        Station {
            channel,
            signal_strength,
            name: None,
            text: None,
        }
    }

    /// Set the programme service name broadcast by this station.
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    /// Set the radio text broadcast by this station.
    pub fn with_text(mut self, text: &str) -> Self {
        self.text = Some(text.to_string());
        self
    }

    fn rds_cycle(&self) -> Vec<RdsBlocks> {
        let mut groups = Vec::new();
        if let Some(name) = &self.name {
            groups.extend(ps_sequence(name));
        }
        if let Some(text) = &self.text {
            groups.extend(radio_text_sequence(text));
        }
        groups
    }
}

/// Identifies one [`Tuner`] operation, for failure injection and the
/// operation log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TunerOp {
    Volume,
    SetVolume,
    Channel,
    SetChannel,
    Seek,
    ReadRds,
    SignalStrength,
}

impl fmt::Display for TunerOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TunerOp::Volume => "volume",
            TunerOp::SetVolume => "set_volume",
            TunerOp::Channel => "channel",
            TunerOp::SetChannel => "set_channel",
            TunerOp::Seek => "seek",
            TunerOp::ReadRds => "read_rds_blocks",
            TunerOp::SignalStrength => "signal_strength",
        };
        f.write_str(name)
    }
}

/// An in-memory [`Tuner`].
///
/// Starts at the bottom of the band with volume 0. Each call to
/// [`read_rds_blocks`](Tuner::read_rds_blocks) returns the next group of the
/// current station's RDS cycle (name groups, then radio text groups), or
/// `None` if the station does not broadcast RDS.
#[derive(Debug)]
pub struct SimulatedTuner {
    band: Band,
    spacing: ChannelSpacing,
    volume: u8,
    channel: u16,
    stations: Vec<Station>,
    rds_cycle: Vec<RdsBlocks>,
    rds_cursor: usize,
    failures: HashSet<TunerOp>,
    operations: Vec<TunerOp>,
}

impl SimulatedTuner {
    /// Create an empty tuner (no stations) on the European raster.
    pub fn new() -> Self {
        SimulatedTuner {
            band: Band::FM,
            spacing: ChannelSpacing::Europe,
            volume: 0,
            channel: Band::FM.start,
            stations: Vec::new(),
            rds_cycle: Vec::new(),
            rds_cursor: 0,
            failures: HashSet::new(),
            operations: Vec::new(),
        }
    }

    /// A tuner pre-loaded with a handful of stations, tuned to the first.
    pub fn demo() -> Self {
        let mut tuner = SimulatedTuner::new()
            .with_station(
                Station::new(885, 52)
                    .with_name("CLASSIC")
                    .with_text("Beethoven - Symphony No. 7 in A major"),
            )
            .with_station(
                Station::new(943, 38)
                    .with_name("NEWS 94")
                    .with_text("Traffic and weather every ten minutes"),
            )
            .with_station(Station::new(989, 21))
            .with_station(
                Station::new(1021, 64)
                    .with_name("ROCK FM")
                    .with_text("Now playing: the best rock on the dial"),
            );
        tuner.tune(885);
        tuner
    }

    /// Add a station.
    pub fn with_station(mut self, station: Station) -> Self {
        self.stations.push(station);
        self.stations.sort_by_key(|s| s.channel);
        let channel = self.channel;
        self.tune(channel);
        self
    }

    /// Use a different channel raster.
    pub fn with_spacing(mut self, spacing: ChannelSpacing) -> Self {
        self.spacing = spacing;
        self
    }

    /// Start at `volume` instead of 0.
    pub fn with_volume(mut self, volume: u8) -> Self {
        self.volume = clamp_volume(volume as i32);
        self
    }

    /// Start on `channel` instead of the bottom of the band.
    pub fn with_channel(mut self, channel: u16) -> Self {
        let channel = self.spacing.snap(self.band, channel);
        self.tune(channel);
        self
    }

    /// Replace the RDS groups of the current channel with a fixed script.
    ///
    /// The script is played in order and repeats until the next retune.
    pub fn set_rds_script(&mut self, groups: Vec<RdsBlocks>) {
        self.rds_cycle = groups;
        self.rds_cursor = 0;
    }

    /// Make every subsequent call of `op` fail with [`Error::Tuner`].
    pub fn fail(&mut self, op: TunerOp) {
        self.failures.insert(op);
    }

    /// Stop failing `op`.
    pub fn recover(&mut self, op: TunerOp) {
        self.failures.remove(&op);
    }

    /// All operations performed so far, in order.
    pub fn operations(&self) -> &[TunerOp] {
        &self.operations
    }

    /// Forget the operation log.
    pub fn clear_operations(&mut self) {
        self.operations.clear();
    }

    /// Current volume, without touching the operation log.
    pub fn current_volume(&self) -> u8 {
        self.volume
    }

    /// Current channel, without touching the operation log.
    pub fn current_channel(&self) -> u16 {
        self.channel
    }

    fn record(&mut self, op: TunerOp) -> Result<()> {
        trace!(%op, "simulated tuner operation");
        self.operations.push(op);
        if self.failures.contains(&op) {
            return Err(Error::Tuner(format!("simulated {op} failure")));
        }
        Ok(())
    }

    fn station(&self) -> Option<&Station> {
        self.stations.iter().find(|s| s.channel == self.channel)
    }

    fn tune(&mut self, channel: u16) {
        self.channel = channel;
        self.rds_cycle = self.station().map(Station::rds_cycle).unwrap_or_default();
        self.rds_cursor = 0;
    }
}

impl Default for SimulatedTuner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tuner for SimulatedTuner {
    async fn volume(&mut self) -> Result<u8> {
        self.record(TunerOp::Volume)?;
        Ok(self.volume)
    }

    async fn set_volume(&mut self, volume: i32) -> Result<u8> {
        self.record(TunerOp::SetVolume)?;
        self.volume = clamp_volume(volume);
        Ok(self.volume)
    }

    async fn channel(&mut self) -> Result<u16> {
        self.record(TunerOp::Channel)?;
        Ok(self.channel)
    }

    async fn set_channel(&mut self, channel: u16) -> Result<u16> {
        self.record(TunerOp::SetChannel)?;
        let channel = self.spacing.snap(self.band, channel);
        self.tune(channel);
        Ok(channel)
    }

    async fn seek(&mut self, direction: SeekDirection) -> Result<SeekOutcome> {
        self.record(TunerOp::Seek)?;
        let current = self.channel;
        let next = match direction {
            SeekDirection::Up => self.stations.iter().find(|s| s.channel > current),
            SeekDirection::Down => self.stations.iter().rev().find(|s| s.channel < current),
        }
        .map(|s| s.channel);

        match next {
            Some(channel) => {
                self.tune(channel);
                Ok(SeekOutcome {
                    channel,
                    found: true,
                })
            }
            None => Ok(SeekOutcome {
                channel: current,
                found: false,
            }),
        }
    }

    async fn read_rds_blocks(&mut self) -> Result<Option<RdsBlocks>> {
        self.record(TunerOp::ReadRds)?;
        if self.rds_cycle.is_empty() {
            return Ok(None);
        }
        let blocks = self.rds_cycle[self.rds_cursor];
        self.rds_cursor = (self.rds_cursor + 1) % self.rds_cycle.len();
        Ok(Some(blocks))
    }

    async fn signal_strength(&mut self) -> Result<u8> {
        self.record(TunerOp::SignalStrength)?;
        Ok(self
            .station()
            .map(|s| s.signal_strength)
            .unwrap_or(NOISE_FLOOR))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rds_groups::ps_group;

    fn two_stations() -> SimulatedTuner {
        SimulatedTuner::new()
            .with_station(Station::new(900, 40).with_name("ONE"))
            .with_station(Station::new(1000, 60))
    }

    #[tokio::test]
    async fn set_volume_clamps() {
        let mut tuner = SimulatedTuner::new();
        assert_eq!(tuner.set_volume(20).await.unwrap(), 15);
        assert_eq!(tuner.set_volume(-5).await.unwrap(), 0);
        assert_eq!(tuner.volume().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn set_channel_snaps_to_raster() {
        let mut tuner = SimulatedTuner::new().with_spacing(ChannelSpacing::America);
        assert_eq!(tuner.set_channel(1022).await.unwrap(), 1021);
        assert_eq!(tuner.channel().await.unwrap(), 1021);
    }

    #[tokio::test]
    async fn seek_up_and_down() {
        let mut tuner = two_stations();
        let up = tuner.seek(SeekDirection::Up).await.unwrap();
        assert_eq!(up, SeekOutcome { channel: 900, found: true });
        let up = tuner.seek(SeekDirection::Up).await.unwrap();
        assert_eq!(up.channel, 1000);
        let down = tuner.seek(SeekDirection::Down).await.unwrap();
        assert_eq!(down.channel, 900);
    }

    #[tokio::test]
    async fn seek_at_band_limit_reports_not_found() {
        let mut tuner = two_stations().with_channel(1000);
        let outcome = tuner.seek(SeekDirection::Up).await.unwrap();
        assert!(!outcome.found);
        assert_eq!(outcome.channel, 1000);
    }

    #[tokio::test]
    async fn rds_cycles_through_station_groups() {
        let mut tuner = two_stations().with_channel(900);
        let first = tuner.read_rds_blocks().await.unwrap();
        assert_eq!(first, Some(ps_group(0, *b"ON")));
        for _ in 0..3 {
            tuner.read_rds_blocks().await.unwrap();
        }
        // Name only: the cycle wraps after four groups.
        assert_eq!(tuner.read_rds_blocks().await.unwrap(), first);
    }

    #[tokio::test]
    async fn rds_none_without_station() {
        let mut tuner = two_stations();
        assert_eq!(tuner.read_rds_blocks().await.unwrap(), None);
    }

    #[tokio::test]
    async fn signal_strength_of_station_and_noise() {
        let mut tuner = two_stations().with_channel(1000);
        assert_eq!(tuner.signal_strength().await.unwrap(), 60);
        tuner.set_channel(950).await.unwrap();
        assert_eq!(tuner.signal_strength().await.unwrap(), NOISE_FLOOR);
    }

    #[tokio::test]
    async fn injected_failure_and_recovery() {
        let mut tuner = SimulatedTuner::new();
        tuner.fail(TunerOp::SetVolume);
        let err = tuner.set_volume(3).await.unwrap_err();
        assert!(matches!(err, Error::Tuner(_)));
        assert_eq!(tuner.current_volume(), 0);

        tuner.recover(TunerOp::SetVolume);
        assert_eq!(tuner.set_volume(3).await.unwrap(), 3);
        assert_eq!(
            tuner.operations(),
            &[TunerOp::SetVolume, TunerOp::SetVolume]
        );
    }
}
