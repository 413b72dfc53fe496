//! Core types used throughout fmradio.

use std::fmt;

/// One raw RDS group as read from the tuner: blocks A, B, C and D.
pub type RdsBlocks = [u16; 4];

/// Lowest volume step supported by the tuner.
pub const VOLUME_MIN: u8 = 0;

/// Highest volume step supported by the tuner.
pub const VOLUME_MAX: u8 = 15;

/// Maximum signal strength reported by the tuner, in dBµV.
pub const SIGNAL_STRENGTH_MAX: u8 = 75;

/// Clamp a requested volume into `[VOLUME_MIN, VOLUME_MAX]`.
pub fn clamp_volume(volume: i32) -> u8 {
    volume.clamp(VOLUME_MIN as i32, VOLUME_MAX as i32) as u8
}

/// Direction of a station seek.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeekDirection {
    /// Towards higher frequencies.
    Up,
    /// Towards lower frequencies.
    Down,
}

impl fmt::Display for SeekDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeekDirection::Up => write!(f, "up"),
            SeekDirection::Down => write!(f, "down"),
        }
    }
}

/// Result of a seek operation.
///
/// `found` is `false` when the tuner reached the band limit without locking
/// onto a station; `channel` is then wherever the tuner ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeekOutcome {
    /// Channel the tuner is on after the seek, in 100 kHz units.
    pub channel: u16,
    /// Whether a station was found.
    pub found: bool,
}

/// The FM broadcast band, in 100 kHz units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Band {
    /// Lowest tunable channel (inclusive).
    pub start: u16,
    /// Highest tunable channel (inclusive).
    pub end: u16,
}

impl Band {
    /// 87.5 MHz to 108.0 MHz.
    pub const FM: Band = Band {
        start: 875,
        end: 1080,
    };

    /// Returns `true` if `channel` lies inside the band.
    pub fn contains(&self, channel: u16) -> bool {
        (self.start..=self.end).contains(&channel)
    }
}

impl Default for Band {
    fn default() -> Self {
        Band::FM
    }
}

/// Channel raster used by the tuner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelSpacing {
    /// 100 kHz steps.
    #[default]
    Europe,
    /// 200 kHz steps.
    America,
}

impl ChannelSpacing {
    /// Step between adjacent channels, in 100 kHz units.
    pub fn step(&self) -> u16 {
        match self {
            ChannelSpacing::Europe => 1,
            ChannelSpacing::America => 2,
        }
    }

    /// Quantize `channel` onto this raster inside `band`.
    ///
    /// Out-of-band requests are pulled to the nearest band edge; in-band
    /// requests are rounded down to the previous raster point.
    pub fn snap(&self, band: Band, channel: u16) -> u16 {
        let channel = channel.clamp(band.start, band.end);
        let step = self.step();
        band.start + (channel - band.start) / step * step
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_volume_bounds() {
        assert_eq!(clamp_volume(20), VOLUME_MAX);
        assert_eq!(clamp_volume(-5), VOLUME_MIN);
        assert_eq!(clamp_volume(7), 7);
        assert_eq!(clamp_volume(15), 15);
    }

    #[test]
    fn seek_direction_display() {
        assert_eq!(SeekDirection::Up.to_string(), "up");
        assert_eq!(SeekDirection::Down.to_string(), "down");
    }

    #[test]
    fn band_contains() {
        assert!(Band::FM.contains(875));
        assert!(Band::FM.contains(1080));
        assert!(!Band::FM.contains(874));
        assert!(!Band::FM.contains(1081));
    }

    #[test]
    fn snap_europe_is_identity_in_band() {
        assert_eq!(ChannelSpacing::Europe.snap(Band::FM, 1021), 1021);
    }

    #[test]
    fn snap_america_rounds_down_to_odd_tenths() {
        // 87.5 + k * 0.2 MHz: 87.5, 87.7, ...
        assert_eq!(ChannelSpacing::America.snap(Band::FM, 878), 877);
        assert_eq!(ChannelSpacing::America.snap(Band::FM, 877), 877);
    }

    #[test]
    fn snap_clamps_out_of_band() {
        assert_eq!(ChannelSpacing::Europe.snap(Band::FM, 0), 875);
        assert_eq!(ChannelSpacing::Europe.snap(Band::FM, 2000), 1080);
    }
}
