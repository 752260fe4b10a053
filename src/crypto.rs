//! At-rest encryption for instructor GitHub tokens.

use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm, Nonce};
use hkdf::Hkdf;
use sha2::Sha256;

const HKDF_SALT: &[u8] = b"groupdesk-v1";
const HKDF_INFO: &[u8] = b"github-token-aes256gcm";
const NONCE_LEN: usize = 12;

fn cipher(key: &str) -> Result<Aes256Gcm, String> {
    let hk = Hkdf::<Sha256>::new(Some(HKDF_SALT), key.as_bytes());
    let mut okm = [0u8; 32];
    hk.expand(HKDF_INFO, &mut okm)
        .map_err(|e| format!("Key derivation failed: {e}"))?;
    Aes256Gcm::new_from_slice(&okm).map_err(|e| format!("Invalid key: {e}"))
}

/// Encrypts with AES-256-GCM. Output is the 12-byte nonce followed by the ciphertext.
pub fn encrypt(plaintext: &str, key: &str) -> Result<Vec<u8>, String> {
    let cipher = cipher(key)?;
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let ciphertext = cipher
        .encrypt(&nonce, plaintext.as_bytes())
        .map_err(|e| format!("Encryption failed: {e}"))?;

    let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    sealed.extend_from_slice(&nonce);
    sealed.extend_from_slice(&ciphertext);
    Ok(sealed)
}

pub fn decrypt(sealed: &[u8], key: &str) -> Result<String, String> {
    if sealed.len() <= NONCE_LEN {
        return Err("Ciphertext too short".to_string());
    }

    let (nonce, ciphertext) = sealed.split_at(NONCE_LEN);
    let plaintext = cipher(key)?
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|e| format!("Decryption failed: {e}"))?;

    String::from_utf8(plaintext).map_err(|e| format!("Invalid UTF-8: {e}"))
}
