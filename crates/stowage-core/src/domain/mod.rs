//! Domain model: artifact identity and the crate-wide error type.

pub mod artifact;
pub mod error;

pub use artifact::{truncate_to_seconds, Artifact, NamingScheme, TIMESTAMP_FORMAT};
pub use error::{NameParseError, Result, StowageError};
