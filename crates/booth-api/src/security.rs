//! Session parameter decryption.
//!
//! QR routing parameters arrive AES-256-CBC encrypted and base64url
//! encoded (unpadded, so ciphertexts survive query strings without percent
//! escaping). Decryption happens here, server-side, with the key and IV
//! held in server environment variables; neither ever reaches a client.

use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use aes::Aes256;
use base64::engine::general_purpose::URL_SAFE_NO_PAD as BASE64;
use base64::Engine;
use thiserror::Error;

type Aes256CbcDec = cbc::Decryptor<Aes256>;
type Aes256CbcEnc = cbc::Encryptor<Aes256>;

/// Decryption failures. Deliberately uniform: callers surface them all as
/// the scan-to-begin state, without leaking which step failed.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("SESSION_KEY/SESSION_IV not configured: {0}")]
    Config(String),

    #[error("Ciphertext invalid")]
    Invalid,
}

/// AES-256-CBC session parameter codec.
#[derive(Clone)]
pub struct SessionCrypto {
    key: [u8; 32],
    iv: [u8; 16],
}

impl SessionCrypto {
    pub fn new(key: [u8; 32], iv: [u8; 16]) -> Self {
        Self { key, iv }
    }

    /// Load key material from `SESSION_KEY` / `SESSION_IV` (base64).
    pub fn from_env() -> Result<Self, CryptoError> {
        let key = decode_exact::<32>("SESSION_KEY")?;
        let iv = decode_exact::<16>("SESSION_IV")?;
        Ok(Self { key, iv })
    }

    /// Decrypt one base64-encoded parameter to a UTF-8 string.
    pub fn decrypt(&self, ciphertext_b64: &str) -> Result<String, CryptoError> {
        let ciphertext = BASE64
            .decode(ciphertext_b64.trim())
            .map_err(|_| CryptoError::Invalid)?;
        if ciphertext.is_empty() || ciphertext.len() % 16 != 0 {
            return Err(CryptoError::Invalid);
        }

        let plaintext = Aes256CbcDec::new(&self.key.into(), &self.iv.into())
            .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext)
            .map_err(|_| CryptoError::Invalid)?;

        String::from_utf8(plaintext).map_err(|_| CryptoError::Invalid)
    }

    /// Encrypt a value the way the QR generator does. Used by tests and by
    /// the QR provisioning tooling.
    pub fn encrypt(&self, plaintext: &str) -> String {
        let ciphertext = Aes256CbcEnc::new(&self.key.into(), &self.iv.into())
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());
        BASE64.encode(ciphertext)
    }
}

fn decode_exact<const N: usize>(var: &str) -> Result<[u8; N], CryptoError> {
    let raw = std::env::var(var).map_err(|_| CryptoError::Config(format!("{var} not set")))?;
    let bytes = BASE64
        .decode(raw.trim())
        .map_err(|_| CryptoError::Config(format!("{var} is not valid base64")))?;
    bytes
        .try_into()
        .map_err(|_| CryptoError::Config(format!("{var} must decode to {N} bytes")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn crypto() -> SessionCrypto {
        SessionCrypto::new([7u8; 32], [3u8; 16])
    }

    #[test]
    fn test_round_trip() {
        let crypto = crypto();
        for value in ["U129843", "true", "23", "4", ""] {
            let encrypted = crypto.encrypt(value);
            assert_eq!(crypto.decrypt(&encrypted).unwrap(), value);
        }
    }

    #[test]
    fn test_tampered_ciphertext_rejected() {
        let crypto = crypto();
        let mut encrypted = crypto.encrypt("U129843");
        // Flip a character somewhere in the body
        encrypted.replace_range(2..3, if &encrypted[2..3] == "A" { "B" } else { "A" });
        // Either padding breaks or the plaintext is garbage; both must error
        // or at least not equal the original
        match crypto.decrypt(&encrypted) {
            Ok(decrypted) => assert_ne!(decrypted, "U129843"),
            Err(CryptoError::Invalid) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_garbage_rejected() {
        let crypto = crypto();
        assert!(crypto.decrypt("not base64 at all!!").is_err());
        assert!(crypto.decrypt("QUJD").is_err()); // valid b64, not block-sized
    }

    #[test]
    fn test_wrong_key_fails() {
        let encrypted = crypto().encrypt("U129843");
        let other = SessionCrypto::new([8u8; 32], [3u8; 16]);
        match other.decrypt(&encrypted) {
            Ok(decrypted) => assert_ne!(decrypted, "U129843"),
            Err(_) => {}
        }
    }
}
