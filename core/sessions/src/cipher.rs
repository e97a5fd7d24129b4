//! Incremental block-cipher sessions.
//!
//! A [`CipherSession`] owns one provider context for one encrypt-or-decrypt
//! run and tracks `pending_len`: the number of input bytes accepted but not
//! yet confirmed emitted. That counter sizes every output buffer handed to
//! the provider (a conservative upper bound: streaming cipher output never
//! exceeds the input buffered so far) and determines the padded length of
//! the final block.

use tracing::{debug, trace};

use cipherflow_common::{Error, Result};
use cipherflow_provider::{lookup_cipher, CipherContext, Direction, BLOCK_SIZE};

use crate::lifecycle::{Session, SessionState};

/// One incremental encryption or decryption operation.
///
/// Lifecycle: construct → `update` any number of times → `finalize` once.
/// `dispose` abandons the operation early. Either way the provider context
/// is released exactly once; operations after that fail with
/// `SessionNotActive`.
pub struct CipherSession {
    ctx: Option<CipherContext>,
    state: SessionState,
    pending_len: usize,
}

impl CipherSession {
    /// Open an encryption session.
    ///
    /// # Errors
    /// - `UnknownAlgorithm` if `algorithm` is not in the registry
    /// - `InvalidKeyMaterial` if key or IV length is wrong for it
    /// - `AllocationFailure` if the provider context cannot be created
    pub fn encrypt(algorithm: &str, key: &[u8], iv: &[u8]) -> Result<Self> {
        Self::open(algorithm, Direction::Encrypt, key, iv)
    }

    /// Open a decryption session.
    ///
    /// # Errors
    /// Same as [`CipherSession::encrypt`].
    pub fn decrypt(algorithm: &str, key: &[u8], iv: &[u8]) -> Result<Self> {
        Self::open(algorithm, Direction::Decrypt, key, iv)
    }

    fn open(algorithm: &str, direction: Direction, key: &[u8], iv: &[u8]) -> Result<Self> {
        let id = lookup_cipher(algorithm)?;
        let ctx = CipherContext::new(id, direction, key, iv)?;
        debug!(algorithm, ?direction, "cipher session opened");
        Ok(Self {
            ctx: Some(ctx),
            state: SessionState::Active,
            pending_len: 0,
        })
    }

    /// Feed a chunk of input and collect whatever output is ready.
    ///
    /// May be called any number of times, with chunks of any size including
    /// empty ones. The returned length bears no fixed relation to the input
    /// length: a call may return nothing while a partial block is buffered,
    /// and a later call may return more than it fed.
    ///
    /// # Errors
    /// - `SessionNotActive` if the session was finalized or disposed
    /// - `CipherUpdateFailed` if the provider rejects the chunk; the
    ///   session stays active
    pub fn update(&mut self, data: &[u8]) -> Result<Vec<u8>> {
        if !self.state.is_active() {
            return Err(Error::SessionNotActive("update on a closed cipher session".to_string()));
        }
        self.pending_len += data.len();

        let mut out = vec![0u8; self.pending_len];
        let ctx = self
            .ctx
            .as_mut()
            .ok_or_else(|| Error::SessionNotActive("cipher context already released".to_string()))?;
        let n = ctx.update(data, &mut out)?;
        self.pending_len -= n;
        trace!(
            in_len = data.len(),
            out_len = n,
            pending = self.pending_len,
            "cipher update"
        );
        out.truncate(n);
        Ok(out)
    }

    /// Flush the final block and release the context.
    ///
    /// The output buffer is sized to `pending_len` rounded up to the block
    /// size, and at least one block: the provider's finalize step can emit
    /// a full padding block even when nothing is pending.
    ///
    /// # Postconditions
    /// - The context is released and the state is `Finalized`, on success
    ///   and on failure alike
    ///
    /// # Errors
    /// - `SessionNotActive` if already finalized or disposed
    /// - `CipherFinalizeFailed` on invalid padding or misaligned ciphertext
    pub fn finalize(&mut self) -> Result<Vec<u8>> {
        if !self.state.is_active() {
            return Err(Error::SessionNotActive("finalize on a closed cipher session".to_string()));
        }
        self.state = SessionState::Finalized;
        let ctx = self
            .ctx
            .take()
            .ok_or_else(|| Error::SessionNotActive("cipher context already released".to_string()))?;

        let rounded = self.pending_len.div_ceil(BLOCK_SIZE) * BLOCK_SIZE;
        let mut out = vec![0u8; rounded.max(BLOCK_SIZE)];
        self.pending_len = 0;

        // ctx is consumed here and dropped on the error path as well
        let n = ctx.finalize(&mut out)?;
        debug!(out_len = n, "cipher session finalized");
        out.truncate(n);
        Ok(out)
    }

    /// Release the context without producing output.
    ///
    /// For abandoning an in-progress operation. Disposing twice, or after
    /// finalize already released the context, is a caller bug and fails.
    ///
    /// # Errors
    /// - `SessionNotActive` if already finalized or disposed
    pub fn dispose(&mut self) -> Result<()> {
        if !self.state.is_active() {
            return Err(Error::SessionNotActive("dispose on a closed cipher session".to_string()));
        }
        self.state = SessionState::Disposed;
        self.ctx = None;
        self.pending_len = 0;
        debug!("cipher session disposed");
        Ok(())
    }

    /// Input bytes accepted but not yet emitted as output.
    pub fn pending_len(&self) -> usize {
        self.pending_len
    }

    pub fn state(&self) -> SessionState {
        self.state
    }
}

impl Session for CipherSession {
    fn update(&mut self, data: &[u8]) -> Result<Vec<u8>> {
        CipherSession::update(self, data)
    }

    fn finalize(&mut self) -> Result<Vec<u8>> {
        CipherSession::finalize(self)
    }

    fn dispose(&mut self) -> Result<()> {
        CipherSession::dispose(self)
    }

    fn state(&self) -> SessionState {
        CipherSession::state(self)
    }
}

/// Encrypt a complete buffer in one call.
///
/// Convenience wrapper over a session for when all data is available.
pub fn encrypt(algorithm: &str, key: &[u8], iv: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    let mut session = CipherSession::encrypt(algorithm, key, iv)?;
    let mut out = session.update(plaintext)?;
    out.extend(session.finalize()?);
    Ok(out)
}

/// Decrypt a complete buffer in one call.
pub fn decrypt(algorithm: &str, key: &[u8], iv: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
    let mut session = CipherSession::decrypt(algorithm, key, iv)?;
    let mut out = session.update(ciphertext)?;
    out.extend(session.finalize()?);
    Ok(out)
}
