//! Password-based encryption of individual secrets.
//!
//! Each secret is encrypted independently with:
//! - PBKDF2-HMAC-SHA256, 100,000 iterations, 16-byte random salt
//! - AES-256-CBC with PKCS#7 padding and a 16-byte random IV
//!
//! Salt, IV and ciphertext are stored hex-encoded. A fresh salt and IV are drawn for
//! every call to [`encrypt`], so encrypting the same value twice never produces the
//! same entry. There is no authentication tag: a wrong password surfaces as a padding
//! error (or, rarely, as plaintext that is not UTF-8), both mapped to
//! [`CryptoError::DecryptionFailed`].

use aes::Aes256;
use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::RngCore;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;
use zeroize::Zeroizing;

/// Salt length in bytes.
pub const SALT_LEN: usize = 16;
/// IV length in bytes (one AES block).
pub const IV_LEN: usize = 16;
/// Derived key length in bytes.
pub const KEY_LEN: usize = 32;
/// PBKDF2 iteration count.
pub const PBKDF2_ITERATIONS: u32 = 100_000;

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// Cryptographic failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Wrong password or tampered ciphertext
    #[error("decryption failed: wrong master password or corrupted data")]
    DecryptionFailed,

    /// Stored fields are not valid hex or have the wrong length
    #[error("corrupt vault entry: {0}")]
    CorruptEntry(String),

    /// The OS random source failed
    #[error("random number generation failed: {0}")]
    RandomFailed(String),
}

/// One encrypted secret as stored in the vault file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedEntry {
    /// Hex-encoded 16-byte salt
    pub salt: String,
    /// Hex-encoded 16-byte IV
    pub iv: String,
    /// Hex-encoded ciphertext
    pub data: String,
}

/// Encrypt `plaintext` under a key derived from `password`.
pub fn encrypt(plaintext: &str, password: &str) -> Result<EncryptedEntry, CryptoError> {
    let mut salt = [0u8; SALT_LEN];
    let mut iv = [0u8; IV_LEN];
    fill_random(&mut salt)?;
    fill_random(&mut iv)?;

    let key = derive_key(password, &salt);
    let cipher = Aes256CbcEnc::new_from_slices(&key[..], &iv)
        .map_err(|e| CryptoError::CorruptEntry(e.to_string()))?;
    let ciphertext = cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());

    Ok(EncryptedEntry {
        salt: hex::encode(salt),
        iv: hex::encode(iv),
        data: hex::encode(ciphertext),
    })
}

/// Decrypt `entry` with `password`.
pub fn decrypt(entry: &EncryptedEntry, password: &str) -> Result<String, CryptoError> {
    let salt = decode_field("salt", &entry.salt, Some(SALT_LEN))?;
    let iv = decode_field("iv", &entry.iv, Some(IV_LEN))?;
    let ciphertext = decode_field("data", &entry.data, None)?;

    let key = derive_key(password, &salt);
    let cipher = Aes256CbcDec::new_from_slices(&key[..], &iv)
        .map_err(|e| CryptoError::CorruptEntry(e.to_string()))?;
    let plaintext = Zeroizing::new(
        cipher
            .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext)
            .map_err(|_| CryptoError::DecryptionFailed)?,
    );

    String::from_utf8(plaintext.to_vec()).map_err(|_| CryptoError::DecryptionFailed)
}

fn derive_key(password: &str, salt: &[u8]) -> Zeroizing<[u8; KEY_LEN]> {
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, PBKDF2_ITERATIONS, &mut key[..]);
    key
}

fn fill_random(buf: &mut [u8]) -> Result<(), CryptoError> {
    OsRng.try_fill_bytes(buf).map_err(|e| CryptoError::RandomFailed(e.to_string()))
}

fn decode_field(field: &str, value: &str, expected_len: Option<usize>) -> Result<Vec<u8>, CryptoError> {
    let bytes =
        hex::decode(value).map_err(|e| CryptoError::CorruptEntry(format!("{field}: {e}")))?;

    match expected_len {
        Some(len) if bytes.len() != len => Err(CryptoError::CorruptEntry(format!(
            "{field}: expected {len} bytes, got {}",
            bytes.len()
        ))),
        _ => Ok(bytes),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let entry = encrypt("ghp_secret_token", "hunter2").unwrap();
        assert_eq!(decrypt(&entry, "hunter2").unwrap(), "ghp_secret_token");
    }

    #[test]
    fn test_round_trip_empty_and_unicode() {
        for value in ["", "päss wörd ✓", &"x".repeat(100)] {
            let entry = encrypt(value, "pw").unwrap();
            assert_eq!(decrypt(&entry, "pw").unwrap(), value);
        }
    }

    #[test]
    fn test_wrong_password_fails() {
        let entry = encrypt("value", "right").unwrap();
        // CBC without a MAC can, very rarely, unpad garbage; it must then differ
        match decrypt(&entry, "wrong") {
            Err(CryptoError::DecryptionFailed) => {}
            Ok(plaintext) => assert_ne!(plaintext, "value"),
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_encryption_is_randomized() {
        let a = encrypt("same", "pw").unwrap();
        let b = encrypt("same", "pw").unwrap();
        assert_ne!(a.salt, b.salt);
        assert_ne!(a.iv, b.iv);
        assert_ne!(a.data, b.data);
    }

    #[test]
    fn test_entry_field_lengths() {
        let entry = encrypt("abc", "pw").unwrap();
        assert_eq!(entry.salt.len(), SALT_LEN * 2);
        assert_eq!(entry.iv.len(), IV_LEN * 2);
        // One block for a short plaintext
        assert_eq!(entry.data.len(), 32);
    }

    #[test]
    fn test_corrupt_hex_is_reported() {
        let mut entry = encrypt("abc", "pw").unwrap();
        entry.iv = "zz".to_string();
        assert!(matches!(decrypt(&entry, "pw"), Err(CryptoError::CorruptEntry(_))));

        let mut entry = encrypt("abc", "pw").unwrap();
        entry.salt = "00".to_string();
        assert!(matches!(decrypt(&entry, "pw"), Err(CryptoError::CorruptEntry(_))));
    }

    #[test]
    fn test_truncated_ciphertext_fails() {
        let mut entry = encrypt("abc", "pw").unwrap();
        entry.data.truncate(30);
        assert_eq!(decrypt(&entry, "pw"), Err(CryptoError::DecryptionFailed));
    }
}
