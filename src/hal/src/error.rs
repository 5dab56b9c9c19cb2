//! Error taxonomy shared by every layer of the stack.
//!
//! Producers construct the variant closest to the failure and return it
//! through `Result`; callers are not expected to recover except where a
//! specific fallback is documented (command arena growth, draw-piece
//! splitting, miter-to-bevel join fallback).

use thiserror::Error;

/// Errors reported by the tessellator, the command buffers and the backend.
#[derive(Debug, Error)]
pub enum Error {
    /// A required input was missing or malformed.
    #[error("invalid argument: {0}")]
    InvalidArg(&'static str),
    /// An operation was issued in a state that cannot accept it, such as a
    /// path command outside of a path.
    #[error("invalid state: {0}")]
    InvalidState(&'static str),
    /// An index exceeded a hard range, such as the 16-bit vertex index
    /// limit when piece splitting cannot resolve it.
    #[error("index out of range: {0}")]
    IndexOutOfRange(&'static str),
    /// Serialized data failed schema verification.
    #[error("format error: {0}")]
    Format(String),
    /// A named material, font or texture was not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// The operation is valid but not permitted right now, such as mapping
    /// a buffer that is already mapped or setting a fence twice.
    #[error("operation not permitted: {0}")]
    PermissionDenied(&'static str),
    /// The driver lacks a required capability.
    #[error("not supported: {0}")]
    NotSupported(&'static str),
    /// An underlying stream failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// A condition that indicates a bug in this library or the driver.
    #[error("internal error: {0}")]
    Internal(&'static str),
}

/// Convenience alias used across the crates.
pub type Result<T> = std::result::Result<T, Error>;
