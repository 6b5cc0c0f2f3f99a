//! Wire-level building blocks shared by all codecs.

pub mod frame_errors;
pub mod types;

use std::fmt::Display;

/// Version of the native protocol a value is encoded for.
///
/// The version only matters for collections: protocol v1 and v2 encode
/// element counts and sizes on 2 bytes, later versions on 4 bytes.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Hash, Default)]
#[non_exhaustive]
pub enum ProtocolVersion {
    V1,
    V2,
    V3,
    #[default]
    V4,
    V5,
}

impl ProtocolVersion {
    /// All supported versions, oldest first.
    pub const ALL: [ProtocolVersion; 5] = [
        ProtocolVersion::V1,
        ProtocolVersion::V2,
        ProtocolVersion::V3,
        ProtocolVersion::V4,
        ProtocolVersion::V5,
    ];

    pub fn as_u8(self) -> u8 {
        match self {
            ProtocolVersion::V1 => 1,
            ProtocolVersion::V2 => 2,
            ProtocolVersion::V3 => 3,
            ProtocolVersion::V4 => 4,
            ProtocolVersion::V5 => 5,
        }
    }

    /// Whether collection sizes are encoded as 4-byte ints rather than 2-byte shorts.
    pub fn uses_int_collection_sizes(self) -> bool {
        self >= ProtocolVersion::V3
    }
}

impl TryFrom<u8> for ProtocolVersion {
    type Error = frame_errors::UnsupportedProtocolVersion;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(ProtocolVersion::V1),
            2 => Ok(ProtocolVersion::V2),
            3 => Ok(ProtocolVersion::V3),
            4 => Ok(ProtocolVersion::V4),
            5 => Ok(ProtocolVersion::V5),
            _ => Err(frame_errors::UnsupportedProtocolVersion(value)),
        }
    }
}

impl Display for ProtocolVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{}", self.as_u8())
    }
}
