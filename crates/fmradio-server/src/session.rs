//! Session protocol: what the server does with requests and on every tick.
//!
//! Requests from clients are not applied immediately. They are recorded as
//! pending changes and applied together on the next tick, whose frame then
//! reports the values the tuner actually settled on. Per tick at most one
//! tuning operation runs: an explicit channel wins over a seek, and seeking
//! up wins over seeking down.
//!
//! Radio name and text are broadcast only when they differ from what was
//! last sent. A joining client always receives the full current state.

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

use fmradio_core::{RdsBlocks, SeekDirection, Tuner};
use fmradio_rds::{DataType, ProgramType, RdsDecoder};
use fmradio_wire::{ClientEvent, ServerEvent, encode_frame};

use crate::handler::SessionHandler;
use crate::registry::ClientId;

/// Minimum time between two ticks, matching the tuner's RDS update rate.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(40);

#[derive(Debug, Default)]
struct PendingChanges {
    volume: Option<u8>,
    channel: Option<u16>,
    seek_up: bool,
    seek_down: bool,
}

/// Last radio name and text actually broadcast.
#[derive(Debug, Default)]
struct BroadcastDiff {
    radio_name: Vec<u8>,
    radio_text: Vec<u8>,
}

/// Session state shared by every client of one server.
#[derive(Debug)]
pub struct RadioSession<T> {
    tuner: T,
    rds: RdsDecoder,
    pending: PendingChanges,
    sent: BroadcastDiff,
    last_blocks: Option<RdsBlocks>,
    tick_interval: Duration,
    last_tick: Option<Instant>,
    data_type: DataType,
    program_type: ProgramType,
}

impl<T: Tuner> RadioSession<T> {
    pub fn new(tuner: T) -> Self {
        RadioSession {
            tuner,
            rds: RdsDecoder::new(),
            pending: PendingChanges::default(),
            sent: BroadcastDiff::default(),
            last_blocks: None,
            tick_interval: DEFAULT_TICK_INTERVAL,
            last_tick: None,
            data_type: DataType::Speech,
            program_type: ProgramType::None,
        }
    }

    /// Set the minimum time between ticks (default: 40ms).
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    pub fn tuner(&self) -> &T {
        &self.tuner
    }

    pub fn tuner_mut(&mut self) -> &mut T {
        &mut self.tuner
    }

    pub fn rds(&self) -> &RdsDecoder {
        &self.rds
    }

    pub fn into_tuner(self) -> T {
        self.tuner
    }

    /// Sleep off whatever is left of the tick interval.
    async fn pace(&mut self) {
        if let Some(last) = self.last_tick {
            tokio::time::sleep_until(last + self.tick_interval).await;
        }
        self.last_tick = Some(Instant::now());
    }

    async fn poll_rds(&mut self) {
        let blocks = match self.tuner.read_rds_blocks().await {
            Ok(Some(blocks)) => blocks,
            Ok(None) => return,
            Err(e) => {
                warn!(error = %e, "RDS read failed");
                return;
            }
        };
        if self.last_blocks == Some(blocks) {
            return;
        }
        self.last_blocks = Some(blocks);
        trace!(blocks = ?blocks, "RDS group");
        self.rds.decode(blocks);

        if self.rds.data_type() != self.data_type {
            self.data_type = self.rds.data_type();
            debug!(data_type = %self.data_type, "RDS data type changed");
        }
        if self.rds.program_type() != self.program_type {
            self.program_type = self.rds.program_type();
            debug!(program_type = %self.program_type, "RDS program type changed");
        }
    }

    async fn apply_pending(&mut self, events: &mut Vec<ServerEvent>) {
        let pending = std::mem::take(&mut self.pending);

        if let Some(volume) = pending.volume {
            match self.tuner.set_volume(volume as i32).await {
                Ok(applied) => {
                    debug!(volume = applied, "volume set");
                    events.push(ServerEvent::Volume(applied));
                }
                Err(e) => warn!(volume, error = %e, "set volume failed"),
            }
        }

        if let Some(channel) = pending.channel {
            self.tune(channel, events).await;
        } else if pending.seek_up {
            self.seek(SeekDirection::Up, events).await;
        } else if pending.seek_down {
            self.seek(SeekDirection::Down, events).await;
        }
    }

    async fn tune(&mut self, channel: u16, events: &mut Vec<ServerEvent>) {
        match self.tuner.set_channel(channel).await {
            Ok(applied) => {
                debug!(channel = applied, "channel set");
                events.push(ServerEvent::Channel(applied));
            }
            Err(e) => warn!(channel, error = %e, "set channel failed"),
        }
    }

    /// Seek, falling back to re-announcing the current channel.
    async fn seek(&mut self, direction: SeekDirection, events: &mut Vec<ServerEvent>) {
        let current = self.tuner.channel().await;
        match self.tuner.seek(direction).await {
            Ok(outcome) if outcome.found => {
                info!(%direction, channel = outcome.channel, "seek found station");
                events.push(ServerEvent::Channel(outcome.channel));
                return;
            }
            Ok(_) => warn!(%direction, "seek found no station"),
            Err(e) => warn!(%direction, error = %e, "seek failed"),
        }

        match current {
            Ok(channel) => self.tune(channel, events).await,
            Err(e) => warn!(error = %e, "unable to read current channel"),
        }
    }

    fn encode(events: &[ServerEvent]) -> Option<Vec<u8>> {
        match encode_frame(events) {
            Ok(frame) => Some(frame),
            Err(e) => {
                warn!(error = %e, "unable to encode frame");
                None
            }
        }
    }
}

#[async_trait]
impl<T: Tuner> SessionHandler for RadioSession<T> {
    async fn on_event(&mut self, _client: ClientId, event: ClientEvent) {
        match event {
            ClientEvent::SetVolume(volume) => self.pending.volume = Some(volume),
            ClientEvent::SetChannel(channel) => self.pending.channel = Some(channel),
            ClientEvent::SeekUp => self.pending.seek_up = true,
            ClientEvent::SeekDown => self.pending.seek_down = true,
        }
    }

    async fn on_join(&mut self, client: ClientId) -> Option<Vec<u8>> {
        let mut events = Vec::with_capacity(4);
        match self.tuner.volume().await {
            Ok(volume) => events.push(ServerEvent::Volume(volume)),
            Err(e) => warn!(%client, error = %e, "unable to read volume"),
        }
        match self.tuner.channel().await {
            Ok(channel) => events.push(ServerEvent::Channel(channel)),
            Err(e) => warn!(%client, error = %e, "unable to read channel"),
        }
        events.push(ServerEvent::radio_name(self.rds.radio_name()));
        events.push(ServerEvent::radio_text(self.rds.radio_text()));
        Self::encode(&events)
    }

    async fn on_tick(&mut self) -> Option<Vec<u8>> {
        self.pace().await;
        self.poll_rds().await;

        let mut events = Vec::new();
        self.apply_pending(&mut events).await;

        if self.rds.radio_name() != self.sent.radio_name.as_slice() {
            self.sent.radio_name = self.rds.radio_name().to_vec();
            events.push(ServerEvent::radio_name(&self.sent.radio_name));
        }
        if self.rds.radio_text() != self.sent.radio_text.as_slice() {
            self.sent.radio_text = self.rds.radio_text().to_vec();
            events.push(ServerEvent::radio_text(&self.sent.radio_text));
        }

        if events.is_empty() {
            return None;
        }
        debug!(?events, "broadcasting changes");
        Self::encode(&events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fmradio_test_harness::{SimulatedTuner, Station, TunerOp, ps_group, ps_sequence};
    use fmradio_wire::{DecodeResult, decode_server_frame};

    fn client() -> ClientId {
        let mut registry = crate::SocketRegistry::with_capacity(1);
        registry.add(()).unwrap()
    }

    fn session(tuner: SimulatedTuner) -> RadioSession<SimulatedTuner> {
        RadioSession::new(tuner).with_tick_interval(Duration::ZERO)
    }

    fn events(frame: Option<Vec<u8>>) -> Vec<ServerEvent> {
        let Some(frame) = frame else {
            return Vec::new();
        };
        match decode_server_frame(&frame).unwrap() {
            DecodeResult::Frame { events, consumed } => {
                assert_eq!(consumed, frame.len());
                events
            }
            DecodeResult::Incomplete => panic!("incomplete frame {frame:?}"),
        }
    }

    fn stations() -> SimulatedTuner {
        SimulatedTuner::new()
            .with_station(Station::new(900, 40))
            .with_station(Station::new(1000, 60))
            .with_channel(950)
    }

    #[tokio::test]
    async fn join_sends_full_snapshot() {
        let mut session = session(SimulatedTuner::new().with_volume(4));
        let snapshot = events(session.on_join(client()).await);
        assert_eq!(
            snapshot,
            vec![
                ServerEvent::Volume(4),
                ServerEvent::Channel(875),
                ServerEvent::RadioName(Vec::new()),
                ServerEvent::RadioText(Vec::new()),
            ]
        );
    }

    #[tokio::test]
    async fn join_ignores_broadcast_diff() {
        let tuner = SimulatedTuner::new()
            .with_station(Station::new(875, 50).with_name("TEST"));
        let mut session = session(tuner);
        for _ in 0..4 {
            session.on_tick().await;
        }
        // Already broadcast, so the next tick has nothing to say.
        assert_eq!(session.on_tick().await, None);

        let snapshot = events(session.on_join(client()).await);
        assert_eq!(snapshot.len(), 4);
        assert_eq!(snapshot[2], ServerEvent::RadioName(b"TEST    ".to_vec()));
    }

    #[tokio::test]
    async fn idle_tick_broadcasts_nothing() {
        let mut session = session(SimulatedTuner::new());
        assert_eq!(session.on_tick().await, None);
    }

    #[tokio::test]
    async fn volume_request_is_clamped_and_reported() {
        let mut session = session(SimulatedTuner::new());
        session.on_event(client(), ClientEvent::SetVolume(20)).await;
        assert_eq!(session.tuner().current_volume(), 0);

        assert_eq!(events(session.on_tick().await), vec![ServerEvent::Volume(15)]);
        assert_eq!(session.tuner().current_volume(), 15);
    }

    #[tokio::test]
    async fn later_request_overrides_earlier() {
        let mut session = session(SimulatedTuner::new());
        session.on_event(client(), ClientEvent::SetVolume(3)).await;
        session.on_event(client(), ClientEvent::SetVolume(7)).await;
        assert_eq!(events(session.on_tick().await), vec![ServerEvent::Volume(7)]);
        assert_eq!(
            session.tuner().operations(),
            &[TunerOp::ReadRds, TunerOp::SetVolume]
        );
    }

    #[tokio::test]
    async fn volume_and_channel_in_one_frame() {
        let mut session = session(SimulatedTuner::new());
        session.on_event(client(), ClientEvent::SetChannel(1021)).await;
        session.on_event(client(), ClientEvent::SetVolume(9)).await;
        assert_eq!(
            events(session.on_tick().await),
            vec![ServerEvent::Volume(9), ServerEvent::Channel(1021)]
        );
    }

    #[tokio::test]
    async fn channel_wins_over_seek() {
        let mut session = session(stations());
        session.on_event(client(), ClientEvent::SeekUp).await;
        session.on_event(client(), ClientEvent::SetChannel(1000)).await;
        assert_eq!(events(session.on_tick().await), vec![ServerEvent::Channel(1000)]);
        assert!(!session.tuner().operations().contains(&TunerOp::Seek));
    }

    #[tokio::test]
    async fn seek_up_wins_over_seek_down() {
        let mut session = session(stations());
        session.on_event(client(), ClientEvent::SeekDown).await;
        session.on_event(client(), ClientEvent::SeekUp).await;
        assert_eq!(events(session.on_tick().await), vec![ServerEvent::Channel(1000)]);
    }

    #[tokio::test]
    async fn seek_down_finds_station() {
        let mut session = session(stations());
        session.on_event(client(), ClientEvent::SeekDown).await;
        assert_eq!(events(session.on_tick().await), vec![ServerEvent::Channel(900)]);
        assert_eq!(session.tuner().current_channel(), 900);
    }

    #[tokio::test]
    async fn failed_seek_reannounces_current_channel() {
        let mut tuner = stations();
        tuner.fail(TunerOp::Seek);
        let mut session = session(tuner);
        session.on_event(client(), ClientEvent::SeekUp).await;
        assert_eq!(events(session.on_tick().await), vec![ServerEvent::Channel(950)]);
    }

    #[tokio::test]
    async fn seek_without_station_reannounces_current_channel() {
        let mut session = session(stations().with_channel(1000));
        session.on_event(client(), ClientEvent::SeekUp).await;
        assert_eq!(events(session.on_tick().await), vec![ServerEvent::Channel(1000)]);
        assert!(session.tuner().operations().contains(&TunerOp::SetChannel));
    }

    #[tokio::test]
    async fn tuner_failure_is_not_broadcast() {
        let mut tuner = SimulatedTuner::new();
        tuner.fail(TunerOp::SetVolume);
        let mut session = session(tuner);
        session.on_event(client(), ClientEvent::SetVolume(5)).await;
        assert_eq!(session.on_tick().await, None);

        // The request is not retried.
        session.tuner_mut().recover(TunerOp::SetVolume);
        assert_eq!(session.on_tick().await, None);
    }

    #[tokio::test]
    async fn radio_name_broadcast_once() {
        let tuner = SimulatedTuner::new()
            .with_station(Station::new(875, 50).with_name("TEST"));
        let mut session = session(tuner);

        let mut broadcasts = Vec::new();
        for _ in 0..8 {
            broadcasts.extend(events(session.on_tick().await));
        }
        assert_eq!(broadcasts, vec![ServerEvent::RadioName(b"TEST    ".to_vec())]);
        assert_eq!(session.rds().radio_name(), b"TEST    ");
    }

    #[tokio::test]
    async fn radio_text_broadcast_when_committed() {
        let tuner = SimulatedTuner::new()
            .with_station(Station::new(875, 50).with_text("Hi"));
        let mut session = session(tuner);
        assert_eq!(
            events(session.on_tick().await),
            vec![ServerEvent::RadioText(b"Hi".to_vec())]
        );
    }

    #[tokio::test]
    async fn repeated_quartets_are_decoded_once() {
        let name = ps_sequence("DUP");
        let mut tuner = SimulatedTuner::new();
        // Without duplicate suppression the second copy of offset 1 would
        // resynchronize the decoder and the name would never commit.
        tuner.set_rds_script(vec![name[0], name[1], name[1], name[2], name[3]]);
        let mut session = session(tuner);

        for _ in 0..5 {
            session.on_tick().await;
        }
        assert_eq!(session.rds().radio_name(), b"DUP     ");
    }

    #[tokio::test]
    async fn first_quartet_is_always_decoded() {
        let mut tuner = SimulatedTuner::new();
        tuner.set_rds_script(vec![ps_group(0, [0, 0])]);
        let mut session = session(tuner);
        session.on_tick().await;
        assert_eq!(session.last_blocks, Some(ps_group(0, [0, 0])));
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_are_paced() {
        let mut session = RadioSession::new(SimulatedTuner::new());
        let start = Instant::now();
        session.on_tick().await;
        session.on_tick().await;
        session.on_tick().await;
        assert!(start.elapsed() >= DEFAULT_TICK_INTERVAL * 2);
    }
}
