//! Algorithm name registry.
//!
//! Immutable, process-wide tables mapping algorithm name strings to the
//! identifiers the provider understands. Lookups are read-only; nothing is
//! registered at runtime.

use cipherflow_common::{Error, Result};

/// Block size in bytes for every cipher in the registry (AES family).
pub const BLOCK_SIZE: usize = 16;

/// Block ciphers the provider implements, all CBC mode with PKCS#7 padding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CipherAlgorithm {
    Aes128Cbc,
    Aes192Cbc,
    Aes256Cbc,
}

impl CipherAlgorithm {
    /// Required key length in bytes.
    pub fn key_len(&self) -> usize {
        match self {
            CipherAlgorithm::Aes128Cbc => 16,
            CipherAlgorithm::Aes192Cbc => 24,
            CipherAlgorithm::Aes256Cbc => 32,
        }
    }

    /// Required IV length in bytes (one block for CBC).
    pub fn iv_len(&self) -> usize {
        BLOCK_SIZE
    }

    /// Registry spelling of the algorithm name.
    pub fn name(&self) -> &'static str {
        match self {
            CipherAlgorithm::Aes128Cbc => "AES-128-CBC",
            CipherAlgorithm::Aes192Cbc => "AES-192-CBC",
            CipherAlgorithm::Aes256Cbc => "AES-256-CBC",
        }
    }
}

/// Hash functions the provider can key for HMAC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(non_camel_case_types)]
pub enum HashAlgorithm {
    Md5,
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
    Sha512_224,
    Sha512_256,
    Sha3_224,
    Sha3_256,
    Sha3_384,
    Sha3_512,
}

impl HashAlgorithm {
    /// Digest output length in bytes, fixed per algorithm.
    pub fn digest_len(&self) -> usize {
        match self {
            HashAlgorithm::Md5 => 16,
            HashAlgorithm::Sha1 => 20,
            HashAlgorithm::Sha224 => 28,
            HashAlgorithm::Sha256 => 32,
            HashAlgorithm::Sha384 => 48,
            HashAlgorithm::Sha512 => 64,
            HashAlgorithm::Sha512_224 => 28,
            HashAlgorithm::Sha512_256 => 32,
            HashAlgorithm::Sha3_224 => 28,
            HashAlgorithm::Sha3_256 => 32,
            HashAlgorithm::Sha3_384 => 48,
            HashAlgorithm::Sha3_512 => 64,
        }
    }

    /// Registry spelling of the hash name.
    pub fn name(&self) -> &'static str {
        match self {
            HashAlgorithm::Md5 => "MD5",
            HashAlgorithm::Sha1 => "SHA",
            HashAlgorithm::Sha224 => "SHA224",
            HashAlgorithm::Sha256 => "SHA256",
            HashAlgorithm::Sha384 => "SHA384",
            HashAlgorithm::Sha512 => "SHA512",
            HashAlgorithm::Sha512_224 => "SHA512_224",
            HashAlgorithm::Sha512_256 => "SHA512_256",
            HashAlgorithm::Sha3_224 => "SHA3_224",
            HashAlgorithm::Sha3_256 => "SHA3_256",
            HashAlgorithm::Sha3_384 => "SHA3_384",
            HashAlgorithm::Sha3_512 => "SHA3_512",
        }
    }
}

const CIPHERS: &[CipherAlgorithm] = &[
    CipherAlgorithm::Aes128Cbc,
    CipherAlgorithm::Aes192Cbc,
    CipherAlgorithm::Aes256Cbc,
];

const HASHES: &[HashAlgorithm] = &[
    HashAlgorithm::Md5,
    HashAlgorithm::Sha1,
    HashAlgorithm::Sha224,
    HashAlgorithm::Sha256,
    HashAlgorithm::Sha384,
    HashAlgorithm::Sha512,
    HashAlgorithm::Sha512_224,
    HashAlgorithm::Sha512_256,
    HashAlgorithm::Sha3_224,
    HashAlgorithm::Sha3_256,
    HashAlgorithm::Sha3_384,
    HashAlgorithm::Sha3_512,
];

/// Resolve a cipher name to its identifier.
///
/// # Errors
/// - Returns `UnknownAlgorithm` if the name is not in the registry
pub fn lookup_cipher(name: &str) -> Result<CipherAlgorithm> {
    CIPHERS
        .iter()
        .find(|c| c.name() == name)
        .copied()
        .ok_or_else(|| Error::UnknownAlgorithm(name.to_string()))
}

/// Resolve a hash name to its identifier.
///
/// # Errors
/// - Returns `UnknownAlgorithm` if the name is not in the registry
pub fn lookup_hash(name: &str) -> Result<HashAlgorithm> {
    HASHES
        .iter()
        .find(|h| h.name() == name)
        .copied()
        .ok_or_else(|| Error::UnknownAlgorithm(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_cipher_known() {
        assert_eq!(lookup_cipher("AES-256-CBC").unwrap(), CipherAlgorithm::Aes256Cbc);
        assert_eq!(lookup_cipher("AES-128-CBC").unwrap(), CipherAlgorithm::Aes128Cbc);
    }

    #[test]
    fn test_lookup_cipher_unknown() {
        let err = lookup_cipher("AES-256-GCM").unwrap_err();
        assert!(matches!(err, Error::UnknownAlgorithm(_)));
    }

    #[test]
    fn test_lookup_hash_known() {
        // "SHA" is the registry spelling for SHA-1
        assert_eq!(lookup_hash("SHA").unwrap(), HashAlgorithm::Sha1);
        assert_eq!(lookup_hash("SHA3_512").unwrap(), HashAlgorithm::Sha3_512);
    }

    #[test]
    fn test_lookup_hash_unknown() {
        assert!(matches!(
            lookup_hash("SHA999"),
            Err(Error::UnknownAlgorithm(_))
        ));
    }

    #[test]
    fn test_digest_lengths() {
        assert_eq!(HashAlgorithm::Md5.digest_len(), 16);
        assert_eq!(HashAlgorithm::Sha256.digest_len(), 32);
        assert_eq!(HashAlgorithm::Sha512_224.digest_len(), 28);
        assert_eq!(HashAlgorithm::Sha3_512.digest_len(), 64);
    }

    #[test]
    fn test_key_lengths() {
        assert_eq!(CipherAlgorithm::Aes128Cbc.key_len(), 16);
        assert_eq!(CipherAlgorithm::Aes192Cbc.key_len(), 24);
        assert_eq!(CipherAlgorithm::Aes256Cbc.key_len(), 32);
    }
}
