//! The error taxonomy for a reader run.
//!
//! Every error here is fatal for the run: there is no skip-and-continue.
//! Buffers already handed off before the failure remain valid and stay
//! the caller's responsibility.

use std::error::Error;
use std::fmt;

/// Content that cannot form a valid record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ValidationError {
    /// The member's `ref` attribute was missing or zero.
    MissingMemberRef,
    /// The member's `type` attribute was not node, way or relation.
    UnknownMemberType {
        /// The attribute value as found in the input.
        found: String,
    },
    /// A string field longer than its length prefix can record.
    StringTooLong {
        /// Which field overflowed.
        field: &'static str,
        /// Byte length including the terminator.
        length: usize,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingMemberRef => write!(f, "missing ref on relation member"),
            Self::UnknownMemberType { found } => {
                write!(f, "unknown type '{found}' on relation member")
            }
            Self::StringTooLong { field, length } => {
                write!(f, "{field} of {length} bytes exceeds the record limit")
            }
        }
    }
}

impl Error for ValidationError {}

/// Errors raised while reading a document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReadError {
    /// The root element had no version attribute, or an unsupported one.
    FormatVersion {
        /// The version found, if any.
        version: Option<String>,
    },
    /// The token stream was malformed: an unknown top-level element, a
    /// disallowed entity declaration, or an unparseable attribute value.
    Markup {
        /// What was wrong.
        reason: String,
    },
    /// Record content failed validation.
    Validation(ValidationError),
    /// A single record exceeded the fixed buffer capacity.
    Capacity {
        /// Number of bytes requested.
        requested: usize,
        /// Total buffer capacity in bytes.
        capacity: usize,
    },
    /// The consumer of finished buffers went away mid-run.
    Disconnected,
}

impl fmt::Display for ReadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FormatVersion { version: Some(v) } => {
                write!(f, "can not read file with version {v}")
            }
            Self::FormatVersion { version: None } => {
                write!(
                    f,
                    "can not read file without version (missing version attribute on osm element)"
                )
            }
            Self::Markup { reason } => write!(f, "XML parsing error: {reason}"),
            Self::Validation(e) => write!(f, "{e}"),
            Self::Capacity {
                requested,
                capacity,
            } => {
                write!(
                    f,
                    "record does not fit in buffer: requested {requested} bytes, capacity {capacity} bytes"
                )
            }
            Self::Disconnected => write!(f, "output channel disconnected"),
        }
    }
}

impl Error for ReadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ValidationError> for ReadError {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        let e = ReadError::FormatVersion {
            version: Some("0.5".into()),
        };
        assert_eq!(e.to_string(), "can not read file with version 0.5");

        let e = ReadError::Capacity {
            requested: 100,
            capacity: 64,
        };
        assert!(e.to_string().contains("requested 100 bytes"));
    }

    #[test]
    fn validation_wraps_with_source() {
        let e: ReadError = ValidationError::MissingMemberRef.into();
        assert!(e.source().is_some());
        assert_eq!(e.to_string(), "missing ref on relation member");
    }
}
