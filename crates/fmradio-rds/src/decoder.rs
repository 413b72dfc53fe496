//! Stateful RDS group decoder.
//!
//! # Block B layout
//!
//! ```text
//!  15..12   11    10   9..5    4    3    2..0
//! +-------+-----+----+-----+----+----+--------+
//! | group | ver | TP | PTY | *  | *  | offset |
//! +-------+-----+----+-----+----+----+--------+
//! ```
//!
//! In group 0 bit 4 is TA, bit 3 is M/S and bits 1..0 are the name offset.
//! In group 2 bit 4 is the text A/B flag and bits 3..0 are the text offset.
//!
//! Both fields are assembled in scratch buffers and committed only when their
//! offset sequence completes (or, for radio text, when a carriage return
//! arrives). Any offset other than the expected one discards the group and
//! restarts that field from offset 0.

use std::borrow::Cow;
use std::fmt;

use fmradio_core::RdsBlocks;
use tracing::trace;

use crate::program_type::ProgramType;

/// Length of the programme service name, in characters.
pub const RADIO_NAME_LEN: usize = 8;

/// Length of the radio text, in characters.
pub const RADIO_TEXT_LEN: usize = 64;

const VERSION_FLAG: u16 = 0x0800;
const TP_FLAG: u16 = 0x0400;
const TA_FLAG: u16 = 0x0010;
const MS_FLAG: u16 = 0x0008;

const GROUP_BASIC_TUNING: u8 = 0;
const GROUP_RADIO_TEXT: u8 = 2;

const LAST_NAME_OFFSET: u8 = 3;
const LAST_TEXT_OFFSET: u8 = 15;

const CARRIAGE_RETURN: u8 = 0x0D;

/// A field committed by [`RdsDecoder::decode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RdsUpdate {
    /// [`RdsDecoder::radio_name`] changed.
    NameCommitted,
    /// [`RdsDecoder::radio_text`] changed.
    TextCommitted,
}

/// Coarse classification of the current programme content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    /// A traffic announcement is on air (TA and TP both set).
    Traffic,
    /// Music.
    Music,
    /// Speech.
    Speech,
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Traffic => write!(f, "traffic"),
            DataType::Music => write!(f, "music"),
            DataType::Speech => write!(f, "speech"),
        }
    }
}

/// Reassembles the station name and radio text from RDS groups.
#[derive(Debug, Clone)]
pub struct RdsDecoder {
    radio_name: Vec<u8>,
    radio_text: Vec<u8>,
    name_scratch: [u8; RADIO_NAME_LEN],
    text_scratch: [u8; RADIO_TEXT_LEN],
    next_name_offset: u8,
    next_text_offset: u8,
    music: bool,
    traffic_announcement: bool,
    traffic_program: bool,
    program_type: ProgramType,
}

impl RdsDecoder {
    /// Create a decoder with empty name and text.
    pub fn new() -> Self {
        RdsDecoder {
            radio_name: Vec::new(),
            radio_text: Vec::new(),
            name_scratch: [0; RADIO_NAME_LEN],
            text_scratch: [0; RADIO_TEXT_LEN],
            next_name_offset: 0,
            next_text_offset: 0,
            music: false,
            traffic_announcement: false,
            traffic_program: false,
            program_type: ProgramType::None,
        }
    }

    /// Forget everything, e.g. after retuning to another station.
    pub fn reset(&mut self) {
        *self = RdsDecoder::new();
    }

    /// Feed one block quartet.
    ///
    /// Returns which field, if any, was committed by this group.
    pub fn decode(&mut self, blocks: RdsBlocks) -> Option<RdsUpdate> {
        let [_, b, c, d] = blocks;
        let group = (b >> 12) as u8;
        let version_b = b & VERSION_FLAG != 0;

        self.traffic_program = b & TP_FLAG != 0;
        self.program_type = ProgramType::from_code(((b >> 5) & 0x1F) as u8);

        match group {
            GROUP_BASIC_TUNING => self.decode_basic_tuning(b, d),
            GROUP_RADIO_TEXT => self.decode_radio_text(version_b, b, c, d),
            _ => {
                trace!(
                    group = %format_args!("{group}{}", if version_b { 'B' } else { 'A' }),
                    "ignoring unsupported RDS group"
                );
                None
            }
        }
    }

    fn decode_basic_tuning(&mut self, b: u16, d: u16) -> Option<RdsUpdate> {
        self.traffic_announcement = b & TA_FLAG != 0;
        self.music = b & MS_FLAG != 0;

        let offset = (b & 0x0003) as u8;
        if offset != self.next_name_offset {
            trace!(offset, expected = self.next_name_offset, "name offset mismatch");
            self.next_name_offset = 0;
            return None;
        }

        let pos = offset as usize * 2;
        self.name_scratch[pos..pos + 2].copy_from_slice(&d.to_be_bytes());

        if offset < LAST_NAME_OFFSET {
            self.next_name_offset = offset + 1;
            return None;
        }

        self.next_name_offset = 0;
        self.radio_name = take_field(&mut self.name_scratch);
        trace!(name = %String::from_utf8_lossy(&self.radio_name), "radio name committed");
        Some(RdsUpdate::NameCommitted)
    }

    fn decode_radio_text(&mut self, version_b: bool, b: u16, c: u16, d: u16) -> Option<RdsUpdate> {
        let offset = (b & 0x000F) as u8;
        if offset != self.next_text_offset {
            trace!(offset, expected = self.next_text_offset, "text offset mismatch");
            self.next_text_offset = 0;
            return None;
        }

        let [c0, c1] = c.to_be_bytes();
        let [d0, d1] = d.to_be_bytes();
        let quad = [c0, c1, d0, d1];
        // Version B carries block C as a PI repeat; only D holds text.
        let chars = if version_b { &quad[2..] } else { &quad[..] };

        let pos = offset as usize * chars.len();
        let written = &mut self.text_scratch[pos..pos + chars.len()];
        written.copy_from_slice(chars);

        if let Some(cr) = written.iter().position(|&ch| ch == CARRIAGE_RETURN) {
            self.text_scratch[pos + cr..].fill(0);
        } else if offset < LAST_TEXT_OFFSET {
            self.next_text_offset = offset + 1;
            return None;
        }

        self.next_text_offset = 0;
        self.radio_text = take_field(&mut self.text_scratch);
        trace!(text = %String::from_utf8_lossy(&self.radio_text), "radio text committed");
        Some(RdsUpdate::TextCommitted)
    }

    /// The last committed programme service name (at most 8 bytes).
    pub fn radio_name(&self) -> &[u8] {
        &self.radio_name
    }

    /// The last committed radio text (at most 64 bytes).
    pub fn radio_text(&self) -> &[u8] {
        &self.radio_text
    }

    /// [`radio_name`](Self::radio_name) for display.
    pub fn radio_name_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.radio_name)
    }

    /// [`radio_text`](Self::radio_text) for display.
    pub fn radio_text_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.radio_text)
    }

    pub fn data_type(&self) -> DataType {
        if self.traffic_announcement && self.traffic_program {
            DataType::Traffic
        } else if self.music {
            DataType::Music
        } else {
            DataType::Speech
        }
    }

    pub fn program_type(&self) -> ProgramType {
        self.program_type
    }

    pub fn traffic_program(&self) -> bool {
        self.traffic_program
    }

    pub fn traffic_announcement(&self) -> bool {
        self.traffic_announcement
    }

    pub fn music(&self) -> bool {
        self.music
    }
}

impl Default for RdsDecoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Copy a scratch buffer up to its first NUL and zero it.
fn take_field(scratch: &mut [u8]) -> Vec<u8> {
    let end = scratch.iter().position(|&b| b == 0).unwrap_or(scratch.len());
    let field = scratch[..end].to_vec();
    scratch.fill(0);
    field
}

#[cfg(test)]
mod tests {
    use super::*;
    use fmradio_test_harness::{
        PI_CODE, ps_group, ps_sequence, radio_text_group_a, radio_text_group_b,
        radio_text_sequence,
    };

    fn feed(rds: &mut RdsDecoder, groups: &[RdsBlocks]) -> Vec<Option<RdsUpdate>> {
        groups.iter().map(|&g| rds.decode(g)).collect()
    }

    #[test]
    fn name_commits_after_offset_three() {
        let mut rds = RdsDecoder::new();
        let updates = feed(
            &mut rds,
            &[
                ps_group(0, *b"TE"),
                ps_group(1, *b"ST"),
                ps_group(2, [0, 0]),
                ps_group(3, [0, 0]),
            ],
        );
        assert_eq!(updates, vec![None, None, None, Some(RdsUpdate::NameCommitted)]);
        assert_eq!(rds.radio_name(), b"TEST");
    }

    #[test]
    fn name_not_visible_until_complete() {
        let mut rds = RdsDecoder::new();
        feed(&mut rds, &ps_sequence("ROCK FM")[..3]);
        assert_eq!(rds.radio_name(), b"");
    }

    #[test]
    fn skipped_name_offset_resynchronizes() {
        let mut rds = RdsDecoder::new();
        let updates = feed(
            &mut rds,
            &[
                ps_group(0, *b"TE"),
                ps_group(2, *b"XX"),
                // Expected offset is back to 0, so 1 and 3 are discarded too.
                ps_group(1, *b"ST"),
                ps_group(3, *b"  "),
            ],
        );
        assert!(updates.iter().all(Option::is_none));
        assert_eq!(rds.radio_name(), b"");

        let updates = feed(&mut rds, &ps_sequence("FIP"));
        assert_eq!(updates[3], Some(RdsUpdate::NameCommitted));
        assert_eq!(rds.radio_name(), b"FIP     ");
    }

    #[test]
    fn text_with_early_carriage_return() {
        let mut rds = RdsDecoder::new();
        let update = rds.decode(radio_text_group_b(0, [b'H', 0x0D]));
        assert_eq!(update, Some(RdsUpdate::TextCommitted));
        assert_eq!(rds.radio_text(), b"H");
    }

    #[test]
    fn text_sequence_with_terminator() {
        let mut rds = RdsDecoder::new();
        let groups = radio_text_sequence("Hello world");
        let updates = feed(&mut rds, &groups);
        assert_eq!(updates.last(), Some(&Some(RdsUpdate::TextCommitted)));
        assert_eq!(rds.radio_text(), b"Hello world");
    }

    #[test]
    fn full_text_commits_at_offset_fifteen() {
        let text = "0123456789abcdef0123456789ABCDEF0123456789abcdef0123456789ABCDEF";
        let mut rds = RdsDecoder::new();
        let groups = radio_text_sequence(text);
        assert_eq!(groups.len(), 16);
        let updates = feed(&mut rds, &groups);
        assert!(updates[..15].iter().all(Option::is_none));
        assert_eq!(updates[15], Some(RdsUpdate::TextCommitted));
        assert_eq!(rds.radio_text(), text.as_bytes());
    }

    #[test]
    fn text_offset_mismatch_discards_progress() {
        let mut rds = RdsDecoder::new();
        rds.decode(radio_text_group_a(0, *b"Hell"));
        rds.decode(radio_text_group_a(2, *b"xxxx"));
        // Restart from offset 0: the earlier "Hell" is overwritten.
        rds.decode(radio_text_group_a(0, *b"Bye\r"));
        assert_eq!(rds.radio_text(), b"Bye");
    }

    #[test]
    fn committed_text_replaced_atomically() {
        let mut rds = RdsDecoder::new();
        feed(&mut rds, &radio_text_sequence("First"));
        assert_eq!(rds.radio_text(), b"First");

        feed(&mut rds, &radio_text_sequence("Second message")[..2]);
        assert_eq!(rds.radio_text(), b"First");
        feed(&mut rds, &radio_text_sequence("Second message")[2..]);
        assert_eq!(rds.radio_text(), b"Second message");
    }

    #[test]
    fn name_and_text_interleave() {
        let mut rds = RdsDecoder::new();
        let name = ps_sequence("NEWS");
        let text = radio_text_sequence("Hi");
        rds.decode(name[0]);
        rds.decode(name[1]);
        rds.decode(text[0]);
        rds.decode(name[2]);
        rds.decode(name[3]);
        assert_eq!(rds.radio_name(), b"NEWS    ");
        assert_eq!(rds.radio_text(), b"Hi");
    }

    #[test]
    fn data_type_from_flags() {
        let mut rds = RdsDecoder::new();
        assert_eq!(rds.data_type(), DataType::Speech);

        let mut music = ps_group(0, *b"AB");
        music[1] |= MS_FLAG;
        rds.decode(music);
        assert!(rds.music());
        assert_eq!(rds.data_type(), DataType::Music);

        let mut traffic = ps_group(1, *b"CD");
        traffic[1] |= MS_FLAG | TA_FLAG | TP_FLAG;
        rds.decode(traffic);
        assert!(rds.traffic_program());
        assert!(rds.traffic_announcement());
        assert_eq!(rds.data_type(), DataType::Traffic);

        // TA without TP is not a traffic announcement.
        let mut ta_only = ps_group(2, *b"EF");
        ta_only[1] |= TA_FLAG;
        rds.decode(ta_only);
        assert_eq!(rds.data_type(), DataType::Speech);
    }

    #[test]
    fn traffic_program_read_from_every_group() {
        let mut rds = RdsDecoder::new();
        let mut group = radio_text_group_a(0, *b"abcd");
        group[1] |= TP_FLAG;
        rds.decode(group);
        assert!(rds.traffic_program());
    }

    #[test]
    fn radio_text_bits_do_not_touch_music_flag() {
        let mut rds = RdsDecoder::new();
        // Offset 8 sets bit 3, where group 0 carries M/S.
        rds.decode(radio_text_group_a(8, *b"abcd"));
        assert!(!rds.music());
    }

    #[test]
    fn program_type_decoded() {
        let mut rds = RdsDecoder::new();
        let mut group = ps_group(0, *b"JZ");
        group[1] |= 14 << 5;
        rds.decode(group);
        assert_eq!(rds.program_type(), ProgramType::Jazz);
    }

    #[test]
    fn unsupported_group_is_ignored() {
        let mut rds = RdsDecoder::new();
        rds.decode(ps_group(0, *b"TE"));
        assert_eq!(rds.decode([PI_CODE, 0x4000, 0x1234, 0x5678]), None);
        // Name progress survives an unrelated group.
        rds.decode(ps_group(1, *b"ST"));
        rds.decode(ps_group(2, *b"  "));
        rds.decode(ps_group(3, *b"  "));
        assert_eq!(rds.radio_name(), b"TEST    ");
    }

    #[test]
    fn reset_clears_committed_fields() {
        let mut rds = RdsDecoder::new();
        feed(&mut rds, &ps_sequence("TEST"));
        rds.reset();
        assert_eq!(rds.radio_name(), b"");
    }
}
