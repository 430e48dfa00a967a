//! Arena-specific error types.

use std::error::Error;
use std::fmt;

use osmbuf_core::ReadError;

/// Errors that can occur during arena operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArenaError {
    /// The buffer has no room for the requested bytes. Buffers are
    /// sized at megabyte scale, so a single record overflowing one is
    /// exceptional.
    CapacityExceeded {
        /// Number of bytes requested.
        requested: usize,
        /// Total capacity of the buffer in bytes.
        capacity: usize,
    },
}

impl fmt::Display for ArenaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CapacityExceeded {
                requested,
                capacity,
            } => {
                write!(
                    f,
                    "arena capacity exceeded: requested {requested} bytes, capacity {capacity} bytes"
                )
            }
        }
    }
}

impl Error for ArenaError {}

impl From<ArenaError> for ReadError {
    fn from(e: ArenaError) -> Self {
        match e {
            ArenaError::CapacityExceeded {
                requested,
                capacity,
            } => ReadError::Capacity {
                requested,
                capacity,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_to_read_error() {
        let e = ArenaError::CapacityExceeded {
            requested: 10,
            capacity: 5,
        };
        let r: ReadError = e.into();
        assert_eq!(
            r,
            ReadError::Capacity {
                requested: 10,
                capacity: 5
            }
        );
    }
}
