//! Incremental keyed-hash sessions.

use tracing::{debug, trace};

use cipherflow_common::{Error, Result};
use cipherflow_provider::{lookup_hash, HmacContext};

use crate::lifecycle::{Session, SessionState};

/// One incremental HMAC computation.
///
/// Simpler than [`crate::CipherSession`]: updates produce no output and
/// there is no length bookkeeping beyond state validity. The digest length
/// is fixed by the hash algorithm at construction.
pub struct HmacSession {
    ctx: Option<HmacContext>,
    state: SessionState,
    digest_len: usize,
}

impl HmacSession {
    /// Open an HMAC session keyed for the given hash algorithm.
    ///
    /// # Errors
    /// - `UnknownAlgorithm` if `algorithm` is not in the registry
    /// - `AllocationFailure` if the provider context cannot be created
    pub fn new(algorithm: &str, key: &[u8]) -> Result<Self> {
        let id = lookup_hash(algorithm)?;
        let ctx = HmacContext::new(id, key)?;
        debug!(algorithm, digest_len = id.digest_len(), "hmac session opened");
        Ok(Self {
            ctx: Some(ctx),
            state: SessionState::Active,
            digest_len: id.digest_len(),
        })
    }

    /// Absorb a chunk of message data.
    ///
    /// # Errors
    /// - `SessionNotActive` if the session was finalized or disposed
    pub fn update(&mut self, data: &[u8]) -> Result<()> {
        let ctx = match (&self.state, self.ctx.as_mut()) {
            (SessionState::Active, Some(ctx)) => ctx,
            _ => {
                return Err(Error::SessionNotActive(
                    "update on a closed hmac session".to_string(),
                ))
            }
        };
        ctx.update(data);
        trace!(in_len = data.len(), "hmac update");
        Ok(())
    }

    /// Produce the digest and release the context.
    ///
    /// # Postconditions
    /// - The context is released and the state is `Finalized`, on success
    ///   and on failure alike
    ///
    /// # Errors
    /// - `SessionNotActive` if already finalized or disposed
    /// - `HmacFinalizeFailed` on provider error
    pub fn finalize(&mut self) -> Result<Vec<u8>> {
        if !self.state.is_active() {
            return Err(Error::SessionNotActive(
                "finalize on a closed hmac session".to_string(),
            ));
        }
        self.state = SessionState::Finalized;
        let ctx = self
            .ctx
            .take()
            .ok_or_else(|| Error::SessionNotActive("hmac context already released".to_string()))?;

        let mut out = vec![0u8; self.digest_len];
        let n = ctx.finalize(&mut out)?;
        debug!(out_len = n, "hmac session finalized");
        out.truncate(n);
        Ok(out)
    }

    /// Release the context without producing a digest.
    ///
    /// # Errors
    /// - `SessionNotActive` if already finalized or disposed
    pub fn dispose(&mut self) -> Result<()> {
        if !self.state.is_active() {
            return Err(Error::SessionNotActive(
                "dispose on a closed hmac session".to_string(),
            ));
        }
        self.state = SessionState::Disposed;
        self.ctx = None;
        debug!("hmac session disposed");
        Ok(())
    }

    /// Digest length in bytes, fixed at construction.
    pub fn digest_len(&self) -> usize {
        self.digest_len
    }

    pub fn state(&self) -> SessionState {
        self.state
    }
}

impl Session for HmacSession {
    fn update(&mut self, data: &[u8]) -> Result<Vec<u8>> {
        HmacSession::update(self, data)?;
        Ok(Vec::new())
    }

    fn finalize(&mut self) -> Result<Vec<u8>> {
        HmacSession::finalize(self)
    }

    fn dispose(&mut self) -> Result<()> {
        HmacSession::dispose(self)
    }

    fn state(&self) -> SessionState {
        HmacSession::state(self)
    }
}

/// Compute an HMAC over a complete message in one call.
pub fn digest(algorithm: &str, key: &[u8], message: &[u8]) -> Result<Vec<u8>> {
    let mut session = HmacSession::new(algorithm, key)?;
    session.update(message)?;
    session.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &[u8] = b"Jefe";
    const MSG: &[u8] = b"what do ya want for nothing?";

    #[test]
    fn test_known_vector_sha256() {
        let mac = digest("SHA256", KEY, MSG).unwrap();
        assert_eq!(
            hex::encode(&mac),
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn test_digest_length_fixed_per_algorithm() {
        for (name, len) in [
            ("MD5", 16),
            ("SHA", 20),
            ("SHA256", 32),
            ("SHA384", 48),
            ("SHA3_512", 64),
        ] {
            let session = HmacSession::new(name, KEY).unwrap();
            assert_eq!(session.digest_len(), len);
            let mac = digest(name, KEY, MSG).unwrap();
            assert_eq!(mac.len(), len, "digest length mismatch for {name}");
        }
    }

    #[test]
    fn test_chunked_matches_single_call() {
        let single = digest("SHA3_512", KEY, MSG).unwrap();

        let mut session = HmacSession::new("SHA3_512", KEY).unwrap();
        for chunk in MSG.chunks(3) {
            session.update(chunk).unwrap();
        }
        assert_eq!(session.finalize().unwrap(), single);
    }

    #[test]
    fn test_different_keys_differ() {
        let a = digest("SHA256", b"key-a", MSG).unwrap();
        let b = digest("SHA256", b"key-b", MSG).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_update_after_finalize_fails() {
        let mut session = HmacSession::new("SHA256", KEY).unwrap();
        session.update(MSG).unwrap();
        session.finalize().unwrap();
        assert!(matches!(
            session.update(MSG),
            Err(Error::SessionNotActive(_))
        ));
        assert!(matches!(
            session.finalize(),
            Err(Error::SessionNotActive(_))
        ));
    }

    #[test]
    fn test_dispose_contract() {
        let mut session = HmacSession::new("SHA256", KEY).unwrap();
        session.dispose().unwrap();
        assert_eq!(session.state(), SessionState::Disposed);
        assert!(matches!(session.dispose(), Err(Error::SessionNotActive(_))));
    }

    #[test]
    fn test_unknown_hash_name() {
        // lower case is not a registry spelling
        assert!(matches!(
            HmacSession::new("sha256", KEY),
            Err(Error::UnknownAlgorithm(_))
        ));
    }
}
