use serde::{Deserialize, Serialize};
use std::fmt;

/// PKZIP compression method of a single entry
///
/// Mapped one to one from the 16-bit method code in the entry header.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompressionMethod {
    /// 0, no compression
    Stored,
    /// 1, dynamic LZW used by PKZIP 0.9x
    Shrunk,
    /// 2 to 5, probabilistic compression with a factor of 1 to 4
    Reduced(u8),
    /// 6, sliding dictionary with Shannon-Fano trees used by PKZIP 1.x
    Imploded,
    /// 8, the modern default
    Deflated,
    /// 9, Deflate64
    EnhancedDeflated,
    /// Any other code, kept verbatim
    Reserved(u16),
}

impl CompressionMethod {
    /// Map a method code from an entry header
    pub fn from_code(code: u16) -> Self {
        match code {
            0 => Self::Stored,
            1 => Self::Shrunk,
            2..=5 => Self::Reduced((code - 1) as u8),
            6 => Self::Imploded,
            8 => Self::Deflated,
            9 => Self::EnhancedDeflated,
            other => Self::Reserved(other),
        }
    }

    /// The method code as stored in the entry header
    pub fn code(self) -> u16 {
        match self {
            Self::Stored => 0,
            Self::Shrunk => 1,
            Self::Reduced(factor) => u16::from(factor) + 1,
            Self::Imploded => 6,
            Self::Deflated => 8,
            Self::EnhancedDeflated => 9,
            Self::Reserved(code) => code,
        }
    }

    /// Returns true if deflate and store only tooling can decompress the entry
    pub fn is_standard(self) -> bool {
        matches!(self, Self::Stored | Self::Deflated)
    }

    /// Label used in listings and diagnostics
    pub fn name(self) -> &'static str {
        match self {
            Self::Stored => "Stored",
            Self::Shrunk => "Shrunk",
            Self::Reduced(_) => "Reduced",
            Self::Imploded => "Imploded",
            Self::Deflated => "Deflated",
            Self::EnhancedDeflated => "EnhancedDeflated",
            Self::Reserved(_) => "Reserved",
        }
    }
}

impl fmt::Display for CompressionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
