//! Builders for raw RDS block quartets.
//!
//! Only the fields the decoder looks at are populated: the group type and
//! version in block B, the segment address, and the character payload.
//! Block A always carries [`PI_CODE`].
//!
//! ```
//! use fmradio_test_harness::rds_groups::{ps_group, ps_sequence};
//!
//! let groups = ps_sequence("TEST");
//! assert_eq!(groups.len(), 4);
//! assert_eq!(groups[0], ps_group(0, *b"TE"));
//! ```

use fmradio_core::RdsBlocks;

/// Program identification code placed in block A of every generated group.
pub const PI_CODE: u16 = 0xF201;

const GROUP_BASIC_TUNING: u16 = 0x0000;
const GROUP_RADIO_TEXT: u16 = 0x2000;
const VERSION_B: u16 = 0x0800;

/// Carriage return, the radio text terminator.
const CR: u8 = 0x0D;

fn pair(chars: [u8; 2]) -> u16 {
    ((chars[0] as u16) << 8) | chars[1] as u16
}

/// Group 0A carrying two programme service name characters at `offset`
/// (0..=3).
pub fn ps_group(offset: u8, chars: [u8; 2]) -> RdsBlocks {
    let b = GROUP_BASIC_TUNING | (offset as u16 & 0x0003);
    [PI_CODE, b, 0, pair(chars)]
}

/// Group 2A carrying four radio text characters at `offset` (0..=15).
pub fn radio_text_group_a(offset: u8, chars: [u8; 4]) -> RdsBlocks {
    let b = GROUP_RADIO_TEXT | (offset as u16 & 0x000F);
    [PI_CODE, b, pair([chars[0], chars[1]]), pair([chars[2], chars[3]])]
}

/// Group 2B carrying two radio text characters at `offset` (0..=15).
pub fn radio_text_group_b(offset: u8, chars: [u8; 2]) -> RdsBlocks {
    let b = GROUP_RADIO_TEXT | VERSION_B | (offset as u16 & 0x000F);
    [PI_CODE, b, PI_CODE, pair(chars)]
}

/// The four group 0A quartets spelling out `name`.
///
/// The name is space-padded (or truncated) to eight characters, as
/// broadcasters do.
pub fn ps_sequence(name: &str) -> Vec<RdsBlocks> {
    let mut padded = [b' '; 8];
    for (dst, src) in padded.iter_mut().zip(name.bytes()) {
        *dst = src;
    }

    padded
        .chunks_exact(2)
        .enumerate()
        .map(|(offset, chars)| ps_group(offset as u8, [chars[0], chars[1]]))
        .collect()
}

/// The group 2A quartets carrying `text`.
///
/// Texts shorter than 64 characters are terminated with a carriage return
/// so the receiver can commit them early; the final segment is
/// space-padded.
pub fn radio_text_sequence(text: &str) -> Vec<RdsBlocks> {
    let mut bytes: Vec<u8> = text.bytes().take(64).collect();
    if bytes.len() < 64 {
        bytes.push(CR);
    }
    while bytes.len() % 4 != 0 {
        bytes.push(b' ');
    }

    bytes
        .chunks_exact(4)
        .enumerate()
        .map(|(offset, c)| radio_text_group_a(offset as u8, [c[0], c[1], c[2], c[3]]))
        .collect()
}
