//! AES-256-GCM sealing of cookie values (the backend session token).
//! Output is hex(nonce || ciphertext).

use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, AeadCore, KeyInit, OsRng},
};
use thiserror::Error;

const NONCE_SIZE: usize = 12; // AES-GCM standard nonce size

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CookieCryptoError {
    #[error("Invalid hex: {0}")]
    InvalidHex(String),
    #[error("Session key must be 32 bytes (256 bits) long")]
    InvalidKeyLength,
    #[error("Sealed value is too short to contain a nonce")]
    TooShort,
    #[error("Sealing failed")]
    SealFailed,
    #[error("Opening failed")]
    OpenFailed,
    #[error("Invalid UTF-8 sequence")]
    InvalidUtf8,
}

fn cipher(key_hex: &str) -> Result<Aes256Gcm, CookieCryptoError> {
    let key_bytes = hex::decode(key_hex).map_err(|e| CookieCryptoError::InvalidHex(e.to_string()))?;
    if key_bytes.len() != 32 {
        return Err(CookieCryptoError::InvalidKeyLength);
    }
    Aes256Gcm::new_from_slice(&key_bytes).map_err(|_| CookieCryptoError::InvalidKeyLength)
}

pub fn seal(plain_text: &str, key_hex: &str) -> Result<String, CookieCryptoError> {
    let cipher = cipher(key_hex)?;
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let ciphertext = cipher
        .encrypt(&nonce, plain_text.as_bytes())
        .map_err(|_| CookieCryptoError::SealFailed)?;

    let mut sealed = nonce.to_vec();
    sealed.extend_from_slice(&ciphertext);
    Ok(hex::encode(sealed))
}

pub fn open(sealed_hex: &str, key_hex: &str) -> Result<String, CookieCryptoError> {
    let cipher = cipher(key_hex)?;
    let sealed = hex::decode(sealed_hex).map_err(|e| CookieCryptoError::InvalidHex(e.to_string()))?;
    if sealed.len() < NONCE_SIZE {
        return Err(CookieCryptoError::TooShort);
    }

    let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_SIZE);
    let plain = cipher
        .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
        .map_err(|_| CookieCryptoError::OpenFailed)?;

    String::from_utf8(plain).map_err(|_| CookieCryptoError::InvalidUtf8)
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f";

    #[test]
    fn test_seal_open_success() {
        let token = "eyJhbGciOiJIUzI1NiJ9.session";

        let sealed = seal(token, KEY).unwrap();
        assert_ne!(sealed, token);
        assert_eq!(open(&sealed, KEY).unwrap(), token);
    }

    #[test]
    fn test_open_with_wrong_key() {
        let other_key = "f1e1d1c1b1a191817161514131211101f0e0d0c0b0a090807060504030201000";
        let sealed = seal("token", KEY).unwrap();

        assert_eq!(open(&sealed, other_key), Err(CookieCryptoError::OpenFailed));
    }

    #[test]
    fn test_tampered_value_is_rejected() {
        let mut sealed = seal("token", KEY).unwrap();
        let last = sealed.pop().unwrap();
        sealed.push(if last == '0' { '1' } else { '0' });

        assert_eq!(open(&sealed, KEY), Err(CookieCryptoError::OpenFailed));
    }

    #[test]
    fn test_invalid_key_length() {
        assert_eq!(seal("token", "1234"), Err(CookieCryptoError::InvalidKeyLength));
        assert_eq!(open("00", "1234"), Err(CookieCryptoError::InvalidKeyLength));
    }

    #[test]
    fn test_invalid_input() {
        assert!(matches!(seal("token", "not-hex"), Err(CookieCryptoError::InvalidHex(_))));
        assert!(matches!(open("zz", KEY), Err(CookieCryptoError::InvalidHex(_))));
        assert_eq!(open("0011", KEY), Err(CookieCryptoError::TooShort));
    }
}
