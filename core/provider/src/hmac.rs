//! Incremental keyed-hash (HMAC) contexts.
//!
//! Simpler than the cipher side: no staging, no padding, no intermediate
//! output. Data is absorbed on update and the fixed-length digest is
//! produced once at finalization.

use hmac::{Hmac, Mac};
use md5::Md5;
use sha1::Sha1;
use sha2::{Sha224, Sha256, Sha384, Sha512, Sha512_224, Sha512_256};
use sha3::{Sha3_224, Sha3_256, Sha3_384, Sha3_512};

use cipherflow_common::{Error, Result};

use crate::registry::HashAlgorithm;

/// An opaque HMAC context for one keyed-hash computation.
///
/// Dropping the context releases it; [`HmacContext::finalize`] consumes it.
pub struct HmacContext {
    inner: Inner,
}

#[allow(non_camel_case_types)]
enum Inner {
    Md5(Hmac<Md5>),
    Sha1(Hmac<Sha1>),
    Sha224(Hmac<Sha224>),
    Sha256(Hmac<Sha256>),
    Sha384(Hmac<Sha384>),
    Sha512(Hmac<Sha512>),
    Sha512_224(Hmac<Sha512_224>),
    Sha512_256(Hmac<Sha512_256>),
    Sha3_224(Hmac<Sha3_224>),
    Sha3_256(Hmac<Sha3_256>),
    Sha3_384(Hmac<Sha3_384>),
    Sha3_512(Hmac<Sha3_512>),
}

macro_rules! dispatch {
    ($inner:expr, $m:ident => $body:expr) => {
        match $inner {
            Inner::Md5($m) => $body,
            Inner::Sha1($m) => $body,
            Inner::Sha224($m) => $body,
            Inner::Sha256($m) => $body,
            Inner::Sha384($m) => $body,
            Inner::Sha512($m) => $body,
            Inner::Sha512_224($m) => $body,
            Inner::Sha512_256($m) => $body,
            Inner::Sha3_224($m) => $body,
            Inner::Sha3_256($m) => $body,
            Inner::Sha3_384($m) => $body,
            Inner::Sha3_512($m) => $body,
        }
    };
}

impl HmacContext {
    /// Allocate a context keyed for the given hash algorithm.
    ///
    /// HMAC accepts keys of any length (they are hashed or padded to the
    /// block size internally), so only provider initialization can fail.
    ///
    /// # Errors
    /// - `AllocationFailure` if the underlying MAC cannot be initialized
    pub fn new(algorithm: HashAlgorithm, key: &[u8]) -> Result<Self> {
        fn init_err(_: hmac::digest::InvalidLength) -> Error {
            Error::AllocationFailure("hmac initialization failed".to_string())
        }

        let inner = match algorithm {
            HashAlgorithm::Md5 => Inner::Md5(Hmac::new_from_slice(key).map_err(init_err)?),
            HashAlgorithm::Sha1 => Inner::Sha1(Hmac::new_from_slice(key).map_err(init_err)?),
            HashAlgorithm::Sha224 => Inner::Sha224(Hmac::new_from_slice(key).map_err(init_err)?),
            HashAlgorithm::Sha256 => Inner::Sha256(Hmac::new_from_slice(key).map_err(init_err)?),
            HashAlgorithm::Sha384 => Inner::Sha384(Hmac::new_from_slice(key).map_err(init_err)?),
            HashAlgorithm::Sha512 => Inner::Sha512(Hmac::new_from_slice(key).map_err(init_err)?),
            HashAlgorithm::Sha512_224 => {
                Inner::Sha512_224(Hmac::new_from_slice(key).map_err(init_err)?)
            }
            HashAlgorithm::Sha512_256 => {
                Inner::Sha512_256(Hmac::new_from_slice(key).map_err(init_err)?)
            }
            HashAlgorithm::Sha3_224 => {
                Inner::Sha3_224(Hmac::new_from_slice(key).map_err(init_err)?)
            }
            HashAlgorithm::Sha3_256 => {
                Inner::Sha3_256(Hmac::new_from_slice(key).map_err(init_err)?)
            }
            HashAlgorithm::Sha3_384 => {
                Inner::Sha3_384(Hmac::new_from_slice(key).map_err(init_err)?)
            }
            HashAlgorithm::Sha3_512 => {
                Inner::Sha3_512(Hmac::new_from_slice(key).map_err(init_err)?)
            }
        };
        Ok(Self { inner })
    }

    /// Absorb more message data.
    pub fn update(&mut self, data: &[u8]) {
        dispatch!(&mut self.inner, m => m.update(data));
    }

    /// Produce the digest, consuming the context.
    ///
    /// # Errors
    /// - `HmacFinalizeFailed` if `out` is smaller than the digest
    pub fn finalize(self, out: &mut [u8]) -> Result<usize> {
        let digest = dispatch!(self.inner, m => m.finalize().into_bytes().to_vec());
        if out.len() < digest.len() {
            return Err(Error::HmacFinalizeFailed(format!(
                "output buffer too small: need {}, have {}",
                digest.len(),
                out.len()
            )));
        }
        out[..digest.len()].copy_from_slice(&digest);
        Ok(digest.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // RFC 4231 test case 2
    const KEY: &[u8] = b"Jefe";
    const MSG: &[u8] = b"what do ya want for nothing?";

    #[test]
    fn test_hmac_sha256_known_vector() {
        let mut ctx = HmacContext::new(HashAlgorithm::Sha256, KEY).unwrap();
        ctx.update(MSG);
        let mut out = vec![0u8; 32];
        let n = ctx.finalize(&mut out).unwrap();
        assert_eq!(n, 32);
        assert_eq!(
            hex::encode(&out),
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn test_hmac_sha3_512_known_vector() {
        let mut ctx = HmacContext::new(HashAlgorithm::Sha3_512, KEY).unwrap();
        ctx.update(MSG);
        let mut out = vec![0u8; 64];
        let n = ctx.finalize(&mut out).unwrap();
        assert_eq!(n, 64);
        assert_eq!(
            hex::encode(&out),
            "5a4bfeab6166427c7a3647b747292b8384537cdb89afb3bf5665e4c5e709350b\
             287baec921fd7ca0ee7a0c31d022a95e1fc92ba9d77df883960275beb4e62024"
        );
    }

    #[test]
    fn test_hmac_md5_known_vector() {
        let mut ctx = HmacContext::new(HashAlgorithm::Md5, b"key").unwrap();
        ctx.update(b"The quick brown fox jumps over the lazy dog");
        let mut out = vec![0u8; 16];
        ctx.finalize(&mut out).unwrap();
        assert_eq!(hex::encode(&out), "80070713463e7749b90c2dc24911e275");
    }

    #[test]
    fn test_hmac_chunked_matches_single() {
        let mut one = HmacContext::new(HashAlgorithm::Sha256, KEY).unwrap();
        one.update(MSG);
        let mut a = vec![0u8; 32];
        one.finalize(&mut a).unwrap();

        let mut many = HmacContext::new(HashAlgorithm::Sha256, KEY).unwrap();
        for byte in MSG {
            many.update(std::slice::from_ref(byte));
        }
        let mut b = vec![0u8; 32];
        many.finalize(&mut b).unwrap();

        assert_eq!(a, b);
    }

    #[test]
    fn test_finalize_output_buffer_too_small() {
        let ctx = HmacContext::new(HashAlgorithm::Sha512, KEY).unwrap();
        let mut out = vec![0u8; 63];
        assert!(matches!(
            ctx.finalize(&mut out),
            Err(Error::HmacFinalizeFailed(_))
        ));
    }
}
