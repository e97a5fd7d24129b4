//! Common error types for CipherFlow.

use thiserror::Error;

/// Top-level error type for CipherFlow operations.
///
/// Construction errors (`UnknownAlgorithm`, `InvalidKeyMaterial`,
/// `AllocationFailure`) prevent a session from starting at all. Update and
/// finalize errors abort the in-flight operation; the failed session must
/// be replaced, never reused. No error is retried automatically.
#[derive(Debug, Error)]
pub enum Error {
    /// Algorithm or hash name not recognized by the registry.
    ///
    /// Raised at construction, never at update or finalize.
    #[error("Unknown algorithm: {0}")]
    UnknownAlgorithm(String),

    /// Key or IV length unsuitable for the chosen algorithm.
    #[error("Invalid key material: {0}")]
    InvalidKeyMaterial(String),

    /// The provider failed to allocate or initialize a context.
    #[error("Context allocation failed: {0}")]
    AllocationFailure(String),

    /// Operation invoked on a session already finalized or disposed.
    ///
    /// This is a programming error in the caller and is always surfaced.
    #[error("Session is not active: {0}")]
    SessionNotActive(String),

    /// The provider rejected a cipher chunk.
    #[error("Cipher update failed: {0}")]
    CipherUpdateFailed(String),

    /// Cipher finalization failed, typically invalid padding or ciphertext.
    ///
    /// The session's context is already released when this surfaces.
    #[error("Cipher finalize failed: {0}")]
    CipherFinalizeFailed(String),

    /// The provider rejected an HMAC chunk.
    #[error("HMAC update failed: {0}")]
    HmacUpdateFailed(String),

    /// HMAC finalization failed.
    ///
    /// The session's context is already released when this surfaces.
    #[error("HMAC finalize failed: {0}")]
    HmacFinalizeFailed(String),

    /// Stream operation after the stream reached a terminal state.
    #[error("Stream is closed: {0}")]
    StreamClosed(String),

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using the common Error.
pub type Result<T> = std::result::Result<T, Error>;
