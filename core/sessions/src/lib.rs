//! Stateful cryptographic sessions for CipherFlow.
//!
//! This module provides:
//! - Incremental cipher sessions with block-aligned output bookkeeping
//! - Incremental HMAC sessions with fixed-length digests
//! - A push-based stream adapter bridging chunked input onto a session
//!
//! Every session follows the same lifecycle: constructed `Active`, updated
//! any number of times, then finalized or disposed exactly once. The
//! provider context behind a session is released exactly once on every
//! path, including errors.
//!
//! # Security Guarantees
//! - No key material or plaintext is ever logged
//! - A released context is unreachable; misuse fails with `SessionNotActive`

pub mod cipher;
pub mod hmac;
pub mod lifecycle;
pub mod stream;

pub use cipher::CipherSession;
pub use hmac::HmacSession;
pub use lifecycle::{Session, SessionState};
pub use stream::{SessionStream, StreamState};
