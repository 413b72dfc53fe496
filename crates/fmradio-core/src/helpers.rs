//! Formatting and conversion helpers for FM receiver applications.

use crate::types::SIGNAL_STRENGTH_MAX;

/// Format a channel (100 kHz units) as a human-readable MHz string.
///
/// # Example
///
/// ```
/// use fmradio_core::format_channel_mhz;
///
/// assert_eq!(format_channel_mhz(875), "87.5 MHz");
/// assert_eq!(format_channel_mhz(1021), "102.1 MHz");
/// ```
pub fn format_channel_mhz(channel: u16) -> String {
    format!("{}.{} MHz", channel / 10, channel % 10)
}

/// Convert a raw signal strength reading (dBµV) to a percentage of the
/// tuner's maximum.
///
/// Readings above [`SIGNAL_STRENGTH_MAX`] saturate at 100.
pub fn signal_percent(rssi: u8) -> u8 {
    let rssi = rssi.min(SIGNAL_STRENGTH_MAX) as u32;
    (rssi * 100 / SIGNAL_STRENGTH_MAX as u32) as u8
}
