//! Credential encryption.
//!
//! The login form expects email and password encrypted the way CryptoJS does
//! `AES.encrypt(plaintext, passphrase)`: the OpenSSL "salted" format.
//!
//! ```text
//! base64( "Salted__" || salt[8] || AES-256-CBC-PKCS7(key, iv, plaintext) )
//! ```
//!
//! `key` and `iv` are derived from the passphrase and salt with a single-round MD5
//! `EVP_BytesToKey`.
use aes::Aes256;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockEncryptMut, KeyIvInit};
use md5::{Digest, Md5};
use rand::Rng;

use crate::errors::KakaoLinkError;

type Aes256CbcEnc = cbc::Encryptor<Aes256>;

const SALT_MAGIC: &[u8; 8] = b"Salted__";
const SALT_LEN: usize = 8;
const KEY_LEN: usize = 32;
const IV_LEN: usize = 16;

/// Encrypts `plaintext` under `passphrase` with a fresh random salt.
pub fn encrypt(plaintext: &str, passphrase: &str) -> Result<String, KakaoLinkError> {
    let mut salt = [0u8; SALT_LEN];
    rand::rng().fill(&mut salt);
    encrypt_with_salt(plaintext, passphrase, &salt)
}

pub(crate) fn encrypt_with_salt(
    plaintext: &str,
    passphrase: &str,
    salt: &[u8; SALT_LEN],
) -> Result<String, KakaoLinkError> {
    let (key, iv) = derive_key_iv(passphrase.as_bytes(), salt);

    let ciphertext = Aes256CbcEnc::new_from_slices(&key, &iv)
        .map_err(|e| KakaoLinkError::Protocol(format!("cipher setup failed: {e}")))?
        .encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());

    let mut out = Vec::with_capacity(SALT_MAGIC.len() + SALT_LEN + ciphertext.len());
    out.extend_from_slice(SALT_MAGIC);
    out.extend_from_slice(salt);
    out.extend_from_slice(&ciphertext);
    Ok(STANDARD.encode(out))
}

/// OpenSSL `EVP_BytesToKey` with MD5 and one iteration.
fn derive_key_iv(passphrase: &[u8], salt: &[u8]) -> ([u8; KEY_LEN], [u8; IV_LEN]) {
    let mut material = Vec::with_capacity(KEY_LEN + IV_LEN + 16);
    let mut prev: Vec<u8> = Vec::new();

    while material.len() < KEY_LEN + IV_LEN {
        let mut hasher = Md5::new();
        hasher.update(&prev);
        hasher.update(passphrase);
        hasher.update(salt);
        prev = hasher.finalize().to_vec();
        material.extend_from_slice(&prev);
    }

    let mut key = [0u8; KEY_LEN];
    let mut iv = [0u8; IV_LEN];
    key.copy_from_slice(&material[..KEY_LEN]);
    iv.copy_from_slice(&material[KEY_LEN..KEY_LEN + IV_LEN]);
    (key, iv)
}
