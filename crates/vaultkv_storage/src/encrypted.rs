//! Container encryption format.
//!
//! A sealed container is laid out as:
//!
//! ```text
//! magic (4) | version (2, LE) | header_len (4, LE) | header (JSON)
//!   | salt (16) | nonce (12) | ciphertext || tag (16)
//! ```
//!
//! ## Security Model
//!
//! - AES-256-GCM authenticated encryption
//! - A fresh random salt and nonce for every seal
//! - The key is derived from the passphrase and salt with HKDF-SHA256
//! - Everything before the nonce is bound as associated data, so the
//!   cleartext header cannot be altered without failing authentication
//! - Derived keys are zeroized on drop

use crate::backend::ContainerHeader;
use crate::error::{StorageError, StorageResult};
use aes_gcm::{
    aead::{generic_array::GenericArray, Aead, KeyInit, Payload},
    Aes256Gcm, Nonce,
};
use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Magic bytes at the start of every container.
pub const MAGIC: [u8; 4] = *b"VKV1";
/// Current container format version.
pub const FORMAT_VERSION: u16 = 1;
/// Size of AES-256 key in bytes.
pub const KEY_SIZE: usize = 32;
/// Size of GCM nonce in bytes.
pub const NONCE_SIZE: usize = 12;
/// Size of GCM authentication tag in bytes.
pub const TAG_SIZE: usize = 16;
/// Size of the key-derivation salt in bytes.
pub const SALT_SIZE: usize = 16;

/// magic (4) + version (2) + header length (4)
const PREAMBLE_SIZE: usize = 10;

/// HKDF context string.
const KDF_INFO: &[u8] = b"vaultkv-container-key-v1";

/// Encryption key derived from a passphrase.
///
/// The key is automatically zeroized when dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct EncryptionKey {
    bytes: [u8; KEY_SIZE],
}

impl EncryptionKey {
    /// Derives a key from a passphrase using HKDF-SHA256.
    ///
    /// An empty passphrase is accepted and still yields a salted key.
    ///
    /// # Security Note
    ///
    /// HKDF is a key derivation function, not a password hashing function.
    /// Low-entropy passphrases should be stretched by the application first.
    pub fn derive(passphrase: &[u8], salt: &[u8]) -> StorageResult<Self> {
        use hkdf::Hkdf;
        use sha2::Sha256;

        let hk = Hkdf::<Sha256>::new(Some(salt), passphrase);
        let mut bytes = [0u8; KEY_SIZE];
        hk.expand(KDF_INFO, &mut bytes)
            .map_err(|_| StorageError::Encryption("HKDF expand failed".to_string()))?;

        Ok(Self { bytes })
    }

    /// Returns the key as a byte slice.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }

    fn cipher(&self) -> Aes256Gcm {
        Aes256Gcm::new(GenericArray::from_slice(&self.bytes))
    }
}

impl std::fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptionKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Encrypts `plaintext` into a complete container.
///
/// # Errors
///
/// Returns an error if the header cannot be encoded or encryption fails.
pub fn seal(
    passphrase: &[u8],
    header: &ContainerHeader,
    plaintext: &[u8],
) -> StorageResult<Vec<u8>> {
    let header_bytes = serde_json::to_vec(header)
        .map_err(|e| StorageError::Encryption(format!("header encoding failed: {e}")))?;
    let header_len = u32::try_from(header_bytes.len())
        .map_err(|_| StorageError::Encryption("container header too large".to_string()))?;

    let mut salt = [0u8; SALT_SIZE];
    let mut nonce_bytes = [0u8; NONCE_SIZE];
    let mut rng = rand::thread_rng();
    rng.fill_bytes(&mut salt);
    rng.fill_bytes(&mut nonce_bytes);

    let mut sealed = Vec::with_capacity(
        PREAMBLE_SIZE + header_bytes.len() + SALT_SIZE + NONCE_SIZE + plaintext.len() + TAG_SIZE,
    );
    sealed.extend_from_slice(&MAGIC);
    sealed.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    sealed.extend_from_slice(&header_len.to_le_bytes());
    sealed.extend_from_slice(&header_bytes);
    sealed.extend_from_slice(&salt);

    let key = EncryptionKey::derive(passphrase, &salt)?;
    let ciphertext = key
        .cipher()
        .encrypt(
            Nonce::from_slice(&nonce_bytes),
            Payload {
                msg: plaintext,
                aad: &sealed,
            },
        )
        .map_err(|_| StorageError::Encryption("encryption error".to_string()))?;

    sealed.extend_from_slice(&nonce_bytes);
    sealed.extend(ciphertext);
    Ok(sealed)
}

/// Decrypts a container produced by [`seal`].
///
/// Returns the stored header and the plaintext.
///
/// # Errors
///
/// Returns [`StorageError::Corrupted`] for structurally invalid input and
/// [`StorageError::Encryption`] when authentication fails.
pub fn unseal(passphrase: &[u8], sealed: &[u8]) -> StorageResult<(ContainerHeader, Vec<u8>)> {
    let (header, aad_len) = parse_header(sealed)?;

    let body = &sealed[aad_len..];
    if body.len() < NONCE_SIZE + TAG_SIZE {
        return Err(StorageError::Corrupted("container truncated".to_string()));
    }

    let salt = &sealed[aad_len - SALT_SIZE..aad_len];
    let key = EncryptionKey::derive(passphrase, salt)?;
    let plaintext = key
        .cipher()
        .decrypt(
            Nonce::from_slice(&body[..NONCE_SIZE]),
            Payload {
                msg: &body[NONCE_SIZE..],
                aad: &sealed[..aad_len],
            },
        )
        .map_err(|_| {
            StorageError::Encryption(
                "authentication failed: wrong passphrase or tampered container".to_string(),
            )
        })?;

    Ok((header, plaintext))
}

/// Parses the cleartext header of a container.
///
/// Returns the header and the offset just past the salt, which is also the
/// length of the associated data.
///
/// # Errors
///
/// Returns [`StorageError::Corrupted`] if the preamble or header is invalid.
pub fn parse_header(sealed: &[u8]) -> StorageResult<(ContainerHeader, usize)> {
    if sealed.len() < PREAMBLE_SIZE {
        return Err(StorageError::Corrupted("container too short".to_string()));
    }
    if sealed[..4] != MAGIC {
        return Err(StorageError::Corrupted("bad container magic".to_string()));
    }

    let version = u16::from_le_bytes([sealed[4], sealed[5]]);
    if version != FORMAT_VERSION {
        return Err(StorageError::Corrupted(format!(
            "unsupported container version {version}"
        )));
    }

    let header_len = u32::from_le_bytes([sealed[6], sealed[7], sealed[8], sealed[9]]) as usize;
    let header_end = PREAMBLE_SIZE
        .checked_add(header_len)
        .ok_or_else(|| StorageError::Corrupted("header length overflow".to_string()))?;
    let salt_end = header_end + SALT_SIZE;
    if sealed.len() < salt_end {
        return Err(StorageError::Corrupted("container header truncated".to_string()));
    }

    let header = serde_json::from_slice(&sealed[PREAMBLE_SIZE..header_end])
        .map_err(|e| StorageError::Corrupted(format!("invalid container header: {e}")))?;

    Ok((header, salt_end))
}
