//! Band scan: seek through the band and rank stations by signal strength.

use std::time::Duration;

use fmradio::{Band, Result, SeekDirection, Tuner, signal_percent};
use tracing::{debug, warn};

/// Signal strength readings averaged per station.
pub const SIGNAL_SAMPLES: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScannedStation {
    pub channel: u16,
    /// Average signal strength as a percentage of the tuner's maximum.
    pub signal_percent: u8,
}

/// Tune to the bottom of `band` and seek up until the tuner wraps around,
/// finds nothing more, or fails. Stations are returned strongest first.
pub async fn scan_band<T: Tuner + ?Sized>(
    tuner: &mut T,
    band: Band,
    sample_interval: Duration,
) -> Result<Vec<ScannedStation>> {
    tuner.set_channel(band.start).await?;

    let mut previous = band.start;
    let mut stations = Vec::new();
    loop {
        let outcome = match tuner.seek(SeekDirection::Up).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(error = %e, "seek failed, ending scan");
                break;
            }
        };
        if !outcome.found || outcome.channel <= previous {
            break;
        }
        previous = outcome.channel;
        debug!(channel = outcome.channel, "sampling station");

        let mut total = 0u32;
        for _ in 0..SIGNAL_SAMPLES {
            total += tuner.signal_strength().await? as u32;
            tokio::time::sleep(sample_interval).await;
        }
        let average = (total / SIGNAL_SAMPLES) as u8;
        stations.push(ScannedStation {
            channel: outcome.channel,
            signal_percent: signal_percent(average),
        });
    }

    stations.sort_by(|a, b| b.signal_percent.cmp(&a.signal_percent));
    Ok(stations)
}
