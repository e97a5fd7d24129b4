//! Shared session lifecycle contract.

use cipherflow_common::Result;

/// Lifecycle states of a session.
///
/// A session starts `Active` and leaves that state exactly once: through
/// `finalize` (producing final output) or `dispose` (abandoning the
/// operation). There is no way back; any operation on a non-active session
/// is a caller bug and fails with `SessionNotActive`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Active,
    Finalized,
    Disposed,
}

impl SessionState {
    pub fn is_active(&self) -> bool {
        matches!(self, SessionState::Active)
    }
}

/// Common contract implemented by every session type.
///
/// The stream adapter is generic over this trait, so cipher and HMAC
/// sessions can both sit behind the same chunk-driven pipeline. All
/// methods take `&mut self`: exclusive access per session is enforced by
/// the borrow checker, not by runtime locks.
pub trait Session {
    /// Feed a chunk of input; returns any output produced by it.
    fn update(&mut self, data: &[u8]) -> Result<Vec<u8>>;

    /// Flush final output and release the underlying context.
    ///
    /// The context is released whether or not finalization succeeds.
    fn finalize(&mut self) -> Result<Vec<u8>>;

    /// Release the underlying context without producing output.
    fn dispose(&mut self) -> Result<()>;

    /// Current lifecycle state.
    fn state(&self) -> SessionState;
}
