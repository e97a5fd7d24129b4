//! Push-based stream adaptation of sessions.
//!
//! [`SessionStream`] bridges a chunked byte source onto a [`Session`] so
//! callers can pipe arbitrary producers through a cryptographic operation
//! without manual buffering. Output produced by a chunk is written to the
//! downstream sink before the call returns, so a slow sink naturally
//! backpressures the producer: the next update cannot start until the
//! previous output was accepted.
//!
//! The adapter is an explicit state machine. A stream is `Open` until
//! exactly one of `finish` (end-of-input, finalizes the session) or
//! `abort` (abnormal termination, disposes it) moves it to a terminal
//! state. Calls after that fail fast with `StreamClosed` instead of being
//! silently ignored.

use std::io::{Read, Write};

use tracing::{debug, trace};

use cipherflow_common::{Error, Result};

use crate::lifecycle::Session;

/// Chunk size used by [`SessionStream::pump`] (64 KiB).
pub const PUMP_CHUNK_SIZE: usize = 64 * 1024;

/// States of a stream adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Open,
    Closed,
    Aborted,
}

/// Drives a session from pushed chunks, forwarding output to a sink.
///
/// Owns both exclusively for the stream's lifetime. Output chunks are
/// emitted in input order; the finalize output, if any, is always last.
pub struct SessionStream<S, W> {
    session: S,
    sink: W,
    state: StreamState,
}

impl<S: Session, W: Write> SessionStream<S, W> {
    pub fn new(session: S, sink: W) -> Self {
        Self {
            session,
            sink,
            state: StreamState::Open,
        }
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    /// Feed one input chunk.
    ///
    /// Any output it produces is written to the sink before returning.
    ///
    /// # Errors
    /// - `StreamClosed` if the stream already reached a terminal state
    /// - Session or sink errors terminate the stream; the session is
    ///   disposed and nothing further is emitted
    pub fn write(&mut self, chunk: &[u8]) -> Result<()> {
        self.ensure_open()?;
        let out = match self.session.update(chunk) {
            Ok(out) => out,
            Err(e) => {
                self.fail();
                return Err(e);
            }
        };
        trace!(in_len = chunk.len(), out_len = out.len(), "stream chunk");
        if !out.is_empty() {
            if let Err(e) = self.sink.write_all(&out) {
                self.fail();
                return Err(e.into());
            }
        }
        Ok(())
    }

    /// Signal end-of-input: finalize the session and emit the last chunk.
    ///
    /// The stream reaches `Closed` whether or not finalization succeeds;
    /// the session's context is released either way.
    ///
    /// # Errors
    /// - `StreamClosed` if already finished or aborted
    /// - `CipherFinalizeFailed`/`HmacFinalizeFailed` from the session
    pub fn finish(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.state = StreamState::Closed;
        let out = self.session.finalize()?;
        if !out.is_empty() {
            self.sink.write_all(&out)?;
        }
        self.sink.flush()?;
        debug!(out_len = out.len(), "stream finished");
        Ok(())
    }

    /// Abandon the stream: dispose the session without emitting output.
    ///
    /// Safe to call at any point while `Open`; deterministically releases
    /// the context.
    ///
    /// # Errors
    /// - `StreamClosed` if already finished or aborted
    pub fn abort(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.state = StreamState::Aborted;
        debug!("stream aborted");
        self.session.dispose()
    }

    /// Drive a reader to exhaustion through this stream, then finish.
    ///
    /// Returns the number of input bytes consumed. A read error aborts the
    /// stream (the session is disposed, not finalized) before propagating.
    pub fn pump<R: Read>(&mut self, mut reader: R) -> Result<u64> {
        let mut buf = vec![0u8; PUMP_CHUNK_SIZE];
        let mut total = 0u64;
        loop {
            let n = match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) => {
                    self.fail();
                    return Err(e.into());
                }
            };
            total += n as u64;
            self.write(&buf[..n])?;
        }
        self.finish()?;
        Ok(total)
    }

    /// Tear the adapter apart, returning the session and the sink.
    pub fn into_parts(self) -> (S, W) {
        (self.session, self.sink)
    }

    fn ensure_open(&self) -> Result<()> {
        match self.state {
            StreamState::Open => Ok(()),
            StreamState::Closed => Err(Error::StreamClosed(
                "stream already finished".to_string(),
            )),
            StreamState::Aborted => Err(Error::StreamClosed(
                "stream already aborted".to_string(),
            )),
        }
    }

    // Terminal transition for mid-stream failures. Dispose can only fail
    // if the session already left Active (e.g. a failed finalize released
    // the context); the stream error being surfaced takes precedence.
    fn fail(&mut self) {
        let _ = self.session.dispose();
        self.state = StreamState::Aborted;
        debug!("stream failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cipher::{self, CipherSession};
    use crate::hmac::{self, HmacSession};
    use std::io::Cursor;

    const KEY: &[u8] = b"12345678901234567890123456789012";
    const IV: &[u8] = b"1234567890123456";
    const ALGO: &str = "AES-256-CBC";

    fn encrypt_stream(sink: &mut Vec<u8>) -> SessionStream<CipherSession, &mut Vec<u8>> {
        SessionStream::new(CipherSession::encrypt(ALGO, KEY, IV).unwrap(), sink)
    }

    fn decrypt_stream(sink: &mut Vec<u8>) -> SessionStream<CipherSession, &mut Vec<u8>> {
        SessionStream::new(CipherSession::decrypt(ALGO, KEY, IV).unwrap(), sink)
    }

    #[test]
    fn test_byte_at_a_time_matches_single_call() {
        let mut sink = Vec::new();
        let mut stream = encrypt_stream(&mut sink);
        for byte in b"test" {
            stream.write(std::slice::from_ref(byte)).unwrap();
        }
        stream.finish().unwrap();
        assert_eq!(hex::encode(&sink), "24d31b1e41fc8c40e521531d67c72c20");
    }

    #[test]
    fn test_pump_round_trip() {
        let plaintext: Vec<u8> = (0..100_000u32).map(|i| i as u8).collect();

        let mut ciphertext = Vec::new();
        let mut stream = encrypt_stream(&mut ciphertext);
        let consumed = stream.pump(Cursor::new(&plaintext)).unwrap();
        assert_eq!(consumed, plaintext.len() as u64);
        assert_eq!(stream.state(), StreamState::Closed);
        drop(stream);

        let mut recovered = Vec::new();
        let mut stream = decrypt_stream(&mut recovered);
        stream.pump(Cursor::new(&ciphertext)).unwrap();
        drop(stream);
        assert_eq!(recovered, plaintext);
    }

    #[test]
    fn test_output_order_matches_input_order() {
        let plaintext = vec![0x5Au8; 100];
        let single = cipher::encrypt(ALGO, KEY, IV, &plaintext).unwrap();

        let mut sink = Vec::new();
        let mut stream = encrypt_stream(&mut sink);
        for chunk in plaintext.chunks(7) {
            stream.write(chunk).unwrap();
        }
        stream.finish().unwrap();
        drop(stream);
        assert_eq!(sink, single);
    }

    #[test]
    fn test_hmac_stream_emits_digest_at_finish() {
        let expected = hmac::digest("SHA256", b"Jefe", b"what do ya want for nothing?").unwrap();

        let mut sink = Vec::new();
        let mut stream = SessionStream::new(HmacSession::new("SHA256", b"Jefe").unwrap(), &mut sink);
        stream.write(b"what do ya want ").unwrap();
        assert!(stream.sink.is_empty()); // nothing until finish
        stream.write(b"for nothing?").unwrap();
        stream.finish().unwrap();
        drop(stream);
        assert_eq!(sink, expected);
    }

    #[test]
    fn test_write_after_finish_fails() {
        let mut sink = Vec::new();
        let mut stream = encrypt_stream(&mut sink);
        stream.write(b"data").unwrap();
        stream.finish().unwrap();
        assert!(matches!(stream.write(b"more"), Err(Error::StreamClosed(_))));
        assert!(matches!(stream.finish(), Err(Error::StreamClosed(_))));
    }

    #[test]
    fn test_write_after_abort_fails() {
        let mut sink = Vec::new();
        let mut stream = encrypt_stream(&mut sink);
        stream.write(b"data").unwrap();
        stream.abort().unwrap();
        assert_eq!(stream.state(), StreamState::Aborted);
        assert!(matches!(stream.write(b"more"), Err(Error::StreamClosed(_))));
        assert!(matches!(stream.abort(), Err(Error::StreamClosed(_))));
        drop(stream);
        // an aborted stream never emitted anything for the partial block
        assert!(sink.is_empty());
    }

    #[test]
    fn test_finalize_error_closes_stream() {
        let mut sink = Vec::new();
        let mut stream = decrypt_stream(&mut sink);
        stream.write(b"not a valid encrypted text").unwrap();
        assert!(matches!(
            stream.finish(),
            Err(Error::CipherFinalizeFailed(_))
        ));
        assert_eq!(stream.state(), StreamState::Closed);
        assert!(matches!(stream.write(b"x"), Err(Error::StreamClosed(_))));
    }

    #[test]
    fn test_abort_disposes_session() {
        let mut sink = Vec::new();
        let mut stream = encrypt_stream(&mut sink);
        stream.write(b"partial").unwrap();
        stream.abort().unwrap();
        let (session, _) = stream.into_parts();
        assert_eq!(session.state(), crate::SessionState::Disposed);
    }
}
