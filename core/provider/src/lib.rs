//! Cryptographic primitive provider for CipherFlow.
//!
//! This crate is the lowest layer of the stack: opaque cipher and HMAC
//! contexts with incremental update/finalize semantics, plus the immutable
//! registry that maps algorithm names to identifiers.
//!
//! Contexts are owned handles. Dropping a context releases it; the session
//! layer above decides *when* that happens and enforces that it happens
//! exactly once per operation.
//!
//! # Security Guarantees
//! - Staged plaintext (partial input blocks) is zeroized on drop
//! - Key and IV material is borrowed at construction and never retained
//! - Output is only ever written inside the caller-supplied buffer, and the
//!   returned length is the exact number of bytes written

pub mod cipher;
pub mod hmac;
pub mod registry;

pub use cipher::{CipherContext, Direction};
pub use hmac::HmacContext;
pub use registry::{lookup_cipher, lookup_hash, CipherAlgorithm, HashAlgorithm, BLOCK_SIZE};
