//! Passphrase-based archive encryption.
//!
//! Envelope layout: `"v0:"` || salt (32 bytes) || nonce (12 bytes) ||
//! AES-256-GCM ciphertext with tag. The key is scrypt(passphrase, salt,
//! N=16384, r=8, p=1, 32 bytes). Salt and nonce are fresh per encryption.

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::{
    aead::{Aead, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use camino::Utf8Path;
use consul_snapshot_core::{Error, Passphrase, Result};
use std::fs::File;
use std::io::Read;
use zeroize::Zeroizing;

/// Marker at the start of every encrypted archive
pub const ENVELOPE_PREFIX: &[u8] = b"v0:";

/// Size of the scrypt salt in bytes
pub const SALT_LEN: usize = 32;

/// Size of the AES-GCM nonce in bytes (96 bits)
pub const NONCE_LEN: usize = 12;

const KEY_LEN: usize = 32;
const SCRYPT_LOG_N: u8 = 14;
const SCRYPT_R: u32 = 8;
const SCRYPT_P: u32 = 1;

const HEADER_LEN: usize = ENVELOPE_PREFIX.len() + SALT_LEN + NONCE_LEN;

/// Wraps `plaintext` in an encryption envelope.
pub fn encrypt(plaintext: &[u8], passphrase: &Passphrase) -> Result<Vec<u8>> {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce);

    let key = derive_key(passphrase, &salt).map_err(|e| Error::encrypt(e.to_string()))?;
    let cipher = Aes256Gcm::new_from_slice(key.as_slice())
        .map_err(|e| Error::encrypt(format!("failed to create cipher: {}", e)))?;
    let sealed = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext)
        .map_err(|e| Error::encrypt(format!("encryption failed: {}", e)))?;

    let mut out = Vec::with_capacity(HEADER_LEN + sealed.len());
    out.extend_from_slice(ENVELOPE_PREFIX);
    out.extend_from_slice(&salt);
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&sealed);
    Ok(out)
}

/// Opens an envelope produced by [`encrypt`].
///
/// A wrong passphrase and tampered data fail the same way, with
/// [`Error::Decrypt`].
pub fn decrypt(envelope: &[u8], passphrase: &Passphrase) -> Result<Vec<u8>> {
    if envelope.len() < HEADER_LEN || !has_envelope_prefix(envelope) {
        return Err(Error::Decrypt);
    }

    let (salt, rest) = envelope[ENVELOPE_PREFIX.len()..].split_at(SALT_LEN);
    let (nonce, sealed) = rest.split_at(NONCE_LEN);

    let key = derive_key(passphrase, salt).map_err(|_| Error::Decrypt)?;
    let cipher = Aes256Gcm::new_from_slice(key.as_slice()).map_err(|_| Error::Decrypt)?;
    cipher
        .decrypt(Nonce::from_slice(nonce), sealed)
        .map_err(|_| Error::Decrypt)
}

/// True if `data` starts with the envelope marker.
pub fn has_envelope_prefix(data: &[u8]) -> bool {
    data.starts_with(ENVELOPE_PREFIX)
}

/// Checks the first bytes of a file for the envelope marker.
///
/// This is a prefix check only; nothing is authenticated.
pub fn is_encrypted(path: &Utf8Path) -> Result<bool> {
    let mut head = Vec::with_capacity(ENVELOPE_PREFIX.len());
    File::open(path)?
        .take(ENVELOPE_PREFIX.len() as u64)
        .read_to_end(&mut head)?;
    Ok(has_envelope_prefix(&head))
}

fn derive_key(
    passphrase: &Passphrase,
    salt: &[u8],
) -> std::result::Result<Zeroizing<[u8; KEY_LEN]>, String> {
    let params = scrypt::Params::new(SCRYPT_LOG_N, SCRYPT_R, SCRYPT_P, KEY_LEN)
        .map_err(|e| format!("invalid scrypt parameters: {}", e))?;

    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    scrypt::scrypt(passphrase.as_bytes(), salt, &params, key.as_mut_slice())
        .map_err(|e| format!("key derivation failed: {}", e))?;
    Ok(key)
}
