//! RDS programme type (PTY) codes.
//!
//! PTY is a 5-bit field in block B of every group. The code-to-label mapping
//! differs between the European RDS and North American RBDS standards; this
//! module uses the RBDS table.

use std::fmt;

/// Programme type announced by the station (RBDS table).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ProgramType {
    #[default]
    None,
    News,
    Information,
    Sports,
    Talk,
    Rock,
    ClassicRock,
    AdultHits,
    SoftRock,
    Top40,
    Country,
    Oldies,
    Soft,
    Nostalgia,
    Jazz,
    Classical,
    RhythmAndBlues,
    SoftRhythmAndBlues,
    ForeignLanguage,
    ReligiousMusic,
    ReligiousTalk,
    Personality,
    Public,
    College,
    /// Codes 24 to 28, reserved by the standard.
    Unassigned(u8),
    Weather,
    EmergencyTest,
    Emergency,
}

impl ProgramType {
    /// Map a PTY code to its programme type. Only the low 5 bits are used.
    pub fn from_code(code: u8) -> Self {
        match code & 0x1F {
            0 => ProgramType::None,
            1 => ProgramType::News,
            2 => ProgramType::Information,
            3 => ProgramType::Sports,
            4 => ProgramType::Talk,
            5 => ProgramType::Rock,
            6 => ProgramType::ClassicRock,
            7 => ProgramType::AdultHits,
            8 => ProgramType::SoftRock,
            9 => ProgramType::Top40,
            10 => ProgramType::Country,
            11 => ProgramType::Oldies,
            12 => ProgramType::Soft,
            13 => ProgramType::Nostalgia,
            14 => ProgramType::Jazz,
            15 => ProgramType::Classical,
            16 => ProgramType::RhythmAndBlues,
            17 => ProgramType::SoftRhythmAndBlues,
            18 => ProgramType::ForeignLanguage,
            19 => ProgramType::ReligiousMusic,
            20 => ProgramType::ReligiousTalk,
            21 => ProgramType::Personality,
            22 => ProgramType::Public,
            23 => ProgramType::College,
            29 => ProgramType::Weather,
            30 => ProgramType::EmergencyTest,
            31 => ProgramType::Emergency,
            n => ProgramType::Unassigned(n),
        }
    }

    /// The PTY code for this programme type.
    pub fn code(&self) -> u8 {
        match self {
            ProgramType::None => 0,
            ProgramType::News => 1,
            ProgramType::Information => 2,
            ProgramType::Sports => 3,
            ProgramType::Talk => 4,
            ProgramType::Rock => 5,
            ProgramType::ClassicRock => 6,
            ProgramType::AdultHits => 7,
            ProgramType::SoftRock => 8,
            ProgramType::Top40 => 9,
            ProgramType::Country => 10,
            ProgramType::Oldies => 11,
            ProgramType::Soft => 12,
            ProgramType::Nostalgia => 13,
            ProgramType::Jazz => 14,
            ProgramType::Classical => 15,
            ProgramType::RhythmAndBlues => 16,
            ProgramType::SoftRhythmAndBlues => 17,
            ProgramType::ForeignLanguage => 18,
            ProgramType::ReligiousMusic => 19,
            ProgramType::ReligiousTalk => 20,
            ProgramType::Personality => 21,
            ProgramType::Public => 22,
            ProgramType::College => 23,
            ProgramType::Unassigned(n) => *n,
            ProgramType::Weather => 29,
            ProgramType::EmergencyTest => 30,
            ProgramType::Emergency => 31,
        }
    }
}

impl fmt::Display for ProgramType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ProgramType::None => "None",
            ProgramType::News => "News",
            ProgramType::Information => "Information",
            ProgramType::Sports => "Sports",
            ProgramType::Talk => "Talk",
            ProgramType::Rock => "Rock",
            ProgramType::ClassicRock => "Classic Rock",
            ProgramType::AdultHits => "Adult Hits",
            ProgramType::SoftRock => "Soft Rock",
            ProgramType::Top40 => "Top 40",
            ProgramType::Country => "Country",
            ProgramType::Oldies => "Oldies",
            ProgramType::Soft => "Soft",
            ProgramType::Nostalgia => "Nostalgia",
            ProgramType::Jazz => "Jazz",
            ProgramType::Classical => "Classical",
            ProgramType::RhythmAndBlues => "Rhythm and Blues",
            ProgramType::SoftRhythmAndBlues => "Soft Rhythm and Blues",
            ProgramType::ForeignLanguage => "Foreign Language",
            ProgramType::ReligiousMusic => "Religious Music",
            ProgramType::ReligiousTalk => "Religious Talk",
            ProgramType::Personality => "Personality",
            ProgramType::Public => "Public",
            ProgramType::College => "College",
            ProgramType::Unassigned(n) => return write!(f, "Unassigned ({n})"),
            ProgramType::Weather => "Weather",
            ProgramType::EmergencyTest => "Emergency Test",
            ProgramType::Emergency => "Emergency",
        };
        f.write_str(label)
    }
}
