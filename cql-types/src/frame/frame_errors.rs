use thiserror::Error;

/// A low level deserialization error.
///
/// Raised when reading the length-prefixed wire primitives fails.
#[derive(Error, Debug, Clone)]
#[non_exhaustive]
pub enum LowLevelDeserializationError {
    #[error(transparent)]
    IoError(std::sync::Arc<std::io::Error>),
    #[error(transparent)]
    TryFromIntError(#[from] std::num::TryFromIntError),
    #[error("Failed to deserialize length {0}: it is negative and not a null marker")]
    InvalidValueLength(i32),
    #[error("Too few bytes received: expected {expected}, received {received}")]
    TooFewBytesReceived { expected: usize, received: usize },
}

impl From<std::io::Error> for LowLevelDeserializationError {
    fn from(value: std::io::Error) -> Self {
        Self::IoError(std::sync::Arc::new(value))
    }
}

/// A low level serialization error.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum LowLevelSerializationError {
    #[error("Value of {0} bytes does not fit in its length prefix")]
    ValueTooBig(usize),
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Unsupported protocol version: {0}")]
pub struct UnsupportedProtocolVersion(pub u8);
