//! Incremental block-cipher contexts (AES-CBC with PKCS#7 padding).
//!
//! A [`CipherContext`] consumes input in arbitrary-sized pieces and emits
//! whole ciphertext/plaintext blocks as they become available:
//!
//! - Encryption stages up to one partial plaintext block between calls and
//!   emits every completed block immediately. Finalization pads the staged
//!   remainder and emits exactly one last block.
//! - Decryption additionally withholds the most recent *complete* block,
//!   because until end-of-input it may be the padded final block.
//!   Finalization decrypts the withheld block and strips the padding.
//!
//! Output is written into caller-supplied buffers; the returned count is
//! the exact number of bytes written. The context never writes beyond it.

use aes::{Aes128, Aes192, Aes256};
use cipher::block_padding::{Pkcs7, RawPadding};
use cipher::consts::U16;
use cipher::{Block, BlockCipher, BlockDecryptMut, BlockEncryptMut, BlockSizeUser, KeyInit, KeyIvInit};
use zeroize::Zeroize;

use cipherflow_common::{Error, Result};

use crate::registry::{CipherAlgorithm, BLOCK_SIZE};

/// Whether a cipher context encrypts or decrypts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Encrypt,
    Decrypt,
}

/// An opaque cipher context for one encrypt-or-decrypt run.
///
/// Dropping the context releases it; [`CipherContext::finalize`] consumes
/// it, so the type system rules out use after finalization.
pub struct CipherContext {
    inner: Inner,
}

impl core::fmt::Debug for CipherContext {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CipherContext").finish_non_exhaustive()
    }
}

enum Inner {
    EncAes128(CbcEnc<Aes128>),
    EncAes192(CbcEnc<Aes192>),
    EncAes256(CbcEnc<Aes256>),
    DecAes128(CbcDec<Aes128>),
    DecAes192(CbcDec<Aes192>),
    DecAes256(CbcDec<Aes256>),
}

impl CipherContext {
    /// Allocate and initialize a context with key, IV and direction.
    ///
    /// # Errors
    /// - `InvalidKeyMaterial` if the key or IV length does not match the
    ///   algorithm
    /// - `AllocationFailure` if the underlying cipher cannot be initialized
    pub fn new(
        algorithm: CipherAlgorithm,
        direction: Direction,
        key: &[u8],
        iv: &[u8],
    ) -> Result<Self> {
        if key.len() != algorithm.key_len() {
            return Err(Error::InvalidKeyMaterial(format!(
                "{} requires a {}-byte key, got {}",
                algorithm.name(),
                algorithm.key_len(),
                key.len()
            )));
        }
        if iv.len() != algorithm.iv_len() {
            return Err(Error::InvalidKeyMaterial(format!(
                "{} requires a {}-byte IV, got {}",
                algorithm.name(),
                algorithm.iv_len(),
                iv.len()
            )));
        }

        let inner = match (algorithm, direction) {
            (CipherAlgorithm::Aes128Cbc, Direction::Encrypt) => {
                Inner::EncAes128(CbcEnc::new(key, iv)?)
            }
            (CipherAlgorithm::Aes192Cbc, Direction::Encrypt) => {
                Inner::EncAes192(CbcEnc::new(key, iv)?)
            }
            (CipherAlgorithm::Aes256Cbc, Direction::Encrypt) => {
                Inner::EncAes256(CbcEnc::new(key, iv)?)
            }
            (CipherAlgorithm::Aes128Cbc, Direction::Decrypt) => {
                Inner::DecAes128(CbcDec::new(key, iv)?)
            }
            (CipherAlgorithm::Aes192Cbc, Direction::Decrypt) => {
                Inner::DecAes192(CbcDec::new(key, iv)?)
            }
            (CipherAlgorithm::Aes256Cbc, Direction::Decrypt) => {
                Inner::DecAes256(CbcDec::new(key, iv)?)
            }
        };
        Ok(Self { inner })
    }

    /// Consume `input` and write any completed blocks into `out`.
    ///
    /// Returns the number of bytes written, which may be zero (the input is
    /// being staged) and is never more than `input.len()` plus the bytes
    /// already staged.
    ///
    /// # Errors
    /// - `CipherUpdateFailed` if `out` is too small for the blocks that are
    ///   ready to be emitted
    pub fn update(&mut self, input: &[u8], out: &mut [u8]) -> Result<usize> {
        match &mut self.inner {
            Inner::EncAes128(s) => s.update(input, out),
            Inner::EncAes192(s) => s.update(input, out),
            Inner::EncAes256(s) => s.update(input, out),
            Inner::DecAes128(s) => s.update(input, out),
            Inner::DecAes192(s) => s.update(input, out),
            Inner::DecAes256(s) => s.update(input, out),
        }
    }

    /// Flush the final block, consuming the context.
    ///
    /// Encryption emits exactly one padded block. Decryption emits the
    /// unpadded remainder, which may be empty.
    ///
    /// # Errors
    /// - `CipherFinalizeFailed` if the accumulated ciphertext is not block
    ///   aligned, if the padding is invalid, or if `out` is too small
    pub fn finalize(self, out: &mut [u8]) -> Result<usize> {
        match self.inner {
            Inner::EncAes128(s) => s.finalize(out),
            Inner::EncAes192(s) => s.finalize(out),
            Inner::EncAes256(s) => s.finalize(out),
            Inner::DecAes128(s) => s.finalize(out),
            Inner::DecAes192(s) => s.finalize(out),
            Inner::DecAes256(s) => s.finalize(out),
        }
    }
}

/// Encrypting half: CBC mode plus a staged partial plaintext block.
struct CbcEnc<C>
where
    C: BlockEncryptMut + BlockCipher + BlockSizeUser<BlockSize = U16>,
{
    mode: cbc::Encryptor<C>,
    partial: [u8; BLOCK_SIZE],
    partial_len: usize,
}

impl<C> CbcEnc<C>
where
    C: BlockEncryptMut + BlockCipher + BlockSizeUser<BlockSize = U16> + KeyInit,
{
    fn new(key: &[u8], iv: &[u8]) -> Result<Self> {
        let mode = cbc::Encryptor::<C>::new_from_slices(key, iv)
            .map_err(|_| Error::AllocationFailure("cipher initialization failed".to_string()))?;
        Ok(Self {
            mode,
            partial: [0u8; BLOCK_SIZE],
            partial_len: 0,
        })
    }

    fn update(&mut self, input: &[u8], out: &mut [u8]) -> Result<usize> {
        let total = self.partial_len + input.len();
        let emit = total / BLOCK_SIZE * BLOCK_SIZE;
        if out.len() < emit {
            return Err(Error::CipherUpdateFailed(format!(
                "output buffer too small: need {}, have {}",
                emit,
                out.len()
            )));
        }
        if emit == 0 {
            self.partial[self.partial_len..total].copy_from_slice(input);
            self.partial_len = total;
            return Ok(0);
        }

        let mut written = 0;
        let mut offset = 0;
        let mut block = Block::<cbc::Encryptor<C>>::default();
        if self.partial_len > 0 {
            // Complete the staged block from the front of the input.
            let take = BLOCK_SIZE - self.partial_len;
            block[..self.partial_len].copy_from_slice(&self.partial[..self.partial_len]);
            block[self.partial_len..].copy_from_slice(&input[..take]);
            self.mode.encrypt_block_mut(&mut block);
            out[..BLOCK_SIZE].copy_from_slice(block.as_slice());
            written += BLOCK_SIZE;
            offset += take;
            self.partial_len = 0;
        }

        let remaining = &input[offset..];
        let full = remaining.len() / BLOCK_SIZE * BLOCK_SIZE;
        for chunk in remaining[..full].chunks_exact(BLOCK_SIZE) {
            block.copy_from_slice(chunk);
            self.mode.encrypt_block_mut(&mut block);
            out[written..written + BLOCK_SIZE].copy_from_slice(block.as_slice());
            written += BLOCK_SIZE;
        }

        let tail = &remaining[full..];
        self.partial[..tail.len()].copy_from_slice(tail);
        self.partial_len = tail.len();
        debug_assert_eq!(written, emit);
        Ok(written)
    }

    fn finalize(mut self, out: &mut [u8]) -> Result<usize> {
        if out.len() < BLOCK_SIZE {
            return Err(Error::CipherFinalizeFailed(format!(
                "output buffer too small: need {}, have {}",
                BLOCK_SIZE,
                out.len()
            )));
        }
        let mut buf = [0u8; BLOCK_SIZE];
        buf[..self.partial_len].copy_from_slice(&self.partial[..self.partial_len]);
        Pkcs7::raw_pad(&mut buf, self.partial_len);
        let mut block = Block::<cbc::Encryptor<C>>::clone_from_slice(&buf);
        buf.zeroize();
        self.mode.encrypt_block_mut(&mut block);
        out[..BLOCK_SIZE].copy_from_slice(block.as_slice());
        Ok(BLOCK_SIZE)
    }
}

impl<C> Drop for CbcEnc<C>
where
    C: BlockEncryptMut + BlockCipher + BlockSizeUser<BlockSize = U16>,
{
    fn drop(&mut self) {
        // staged bytes are plaintext
        self.partial.zeroize();
    }
}

/// Decrypting half: CBC mode plus the withheld trailing ciphertext block.
struct CbcDec<C>
where
    C: BlockDecryptMut + BlockCipher + BlockSizeUser<BlockSize = U16>,
{
    mode: cbc::Decryptor<C>,
    held: [u8; BLOCK_SIZE],
    held_len: usize,
}

impl<C> CbcDec<C>
where
    C: BlockDecryptMut + BlockCipher + BlockSizeUser<BlockSize = U16> + KeyInit,
{
    fn new(key: &[u8], iv: &[u8]) -> Result<Self> {
        let mode = cbc::Decryptor::<C>::new_from_slices(key, iv)
            .map_err(|_| Error::AllocationFailure("cipher initialization failed".to_string()))?;
        Ok(Self {
            mode,
            held: [0u8; BLOCK_SIZE],
            held_len: 0,
        })
    }

    fn update(&mut self, input: &[u8], out: &mut [u8]) -> Result<usize> {
        let total = self.held_len + input.len();
        let whole = total / BLOCK_SIZE;
        // The most recent complete block is withheld when the input is
        // block aligned: it may be the padded final block.
        let emit = if total % BLOCK_SIZE == 0 {
            whole.saturating_sub(1) * BLOCK_SIZE
        } else {
            whole * BLOCK_SIZE
        };
        if out.len() < emit {
            return Err(Error::CipherUpdateFailed(format!(
                "output buffer too small: need {}, have {}",
                emit,
                out.len()
            )));
        }
        if emit == 0 {
            self.held[self.held_len..total].copy_from_slice(input);
            self.held_len = total;
            return Ok(0);
        }

        let mut written = 0;
        let mut offset = 0;
        let mut block = Block::<cbc::Decryptor<C>>::default();
        if self.held_len > 0 {
            let take = BLOCK_SIZE - self.held_len;
            block[..self.held_len].copy_from_slice(&self.held[..self.held_len]);
            block[self.held_len..].copy_from_slice(&input[..take]);
            self.mode.decrypt_block_mut(&mut block);
            out[..BLOCK_SIZE].copy_from_slice(block.as_slice());
            written += BLOCK_SIZE;
            offset += take;
            self.held_len = 0;
        }

        let remaining = &input[offset..];
        let to_emit = emit - written;
        for chunk in remaining[..to_emit].chunks_exact(BLOCK_SIZE) {
            block.copy_from_slice(chunk);
            self.mode.decrypt_block_mut(&mut block);
            out[written..written + BLOCK_SIZE].copy_from_slice(block.as_slice());
            written += BLOCK_SIZE;
        }

        let tail = &remaining[to_emit..];
        self.held[..tail.len()].copy_from_slice(tail);
        self.held_len = tail.len();
        Ok(written)
    }

    fn finalize(mut self, out: &mut [u8]) -> Result<usize> {
        if self.held_len != BLOCK_SIZE {
            return Err(Error::CipherFinalizeFailed(if self.held_len == 0 {
                "missing final ciphertext block".to_string()
            } else {
                format!(
                    "ciphertext is not block aligned ({} trailing bytes)",
                    self.held_len
                )
            }));
        }
        let mut block = Block::<cbc::Decryptor<C>>::clone_from_slice(&self.held);
        self.mode.decrypt_block_mut(&mut block);
        let n = {
            let plain = Pkcs7::raw_unpad(block.as_slice())
                .map_err(|_| Error::CipherFinalizeFailed("invalid padding".to_string()))?;
            if out.len() < plain.len() {
                return Err(Error::CipherFinalizeFailed(format!(
                    "output buffer too small: need {}, have {}",
                    plain.len(),
                    out.len()
                )));
            }
            out[..plain.len()].copy_from_slice(plain);
            plain.len()
        };
        block.as_mut_slice().zeroize();
        Ok(n)
    }
}
