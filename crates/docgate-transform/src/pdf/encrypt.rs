//! AES-256 password protection (standard security handler, V5/R6).
//!
//! Implements the PDF 2.0 standard security handler: the file encryption
//! key is random, the user and owner entries carry 48-byte hashes built
//! with the hardened iterated digest (Algorithm 2.B), and every string and
//! stream is encrypted with AES-256-CBC using a random, prepended IV. The
//! user and owner passwords are the same caller-supplied secret, matching
//! the gateway's protect contract.

use std::path::Path;

use aes::Aes256;
use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockEncrypt, BlockEncryptMut, KeyInit, KeyIvInit, block_padding::NoPadding};
use lopdf::{Object, ObjectId, dictionary};
use rand::RngCore;
use sha2::{Digest, Sha256, Sha384, Sha512};

use crate::error::{TransformError, TransformResult};
use crate::pdf::{load_document, save_document};

type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;
type Aes256CbcEnc = cbc::Encryptor<Aes256>;

/// Permission bits: all operations allowed, reserved bits set.
const PERMISSIONS: i64 = -4;
/// Passwords are UTF-8 and capped at 127 bytes for R6.
const MAX_PASSWORD_BYTES: usize = 127;

/// Encrypt `input` with AES-256 (R6), writing the protected document to
/// `output`. The same password is installed for the user and owner roles.
///
/// # Errors
///
/// Returns an error when the document cannot be parsed or written, or when
/// a stream's ciphertext cannot be produced.
pub fn encrypt_aes256(input: &Path, output: &Path, password: &str) -> TransformResult<()> {
    let mut document = load_document("encrypt.load", input)?;

    let mut password_bytes = password.as_bytes().to_vec();
    password_bytes.truncate(MAX_PASSWORD_BYTES);

    let mut file_key = [0u8; 32];
    rand::rng().fill_bytes(&mut file_key);

    // Algorithm 8: user entry.
    let user_validation_salt = random_bytes::<8>();
    let user_key_salt = random_bytes::<8>();
    let mut user_entry = Vec::with_capacity(48);
    user_entry.extend_from_slice(&hardened_hash(
        &password_bytes,
        &user_validation_salt,
        &[],
    ));
    user_entry.extend_from_slice(&user_validation_salt);
    user_entry.extend_from_slice(&user_key_salt);

    let user_key = hardened_hash(&password_bytes, &user_key_salt, &[]);
    let user_encrypted_key = aes256_cbc_no_padding(&user_key, &[0u8; 16], &file_key)?;

    // Algorithm 9: owner entry, bound to the full 48-byte user entry.
    let owner_validation_salt = random_bytes::<8>();
    let owner_key_salt = random_bytes::<8>();
    let mut owner_entry = Vec::with_capacity(48);
    owner_entry.extend_from_slice(&hardened_hash(
        &password_bytes,
        &owner_validation_salt,
        &user_entry,
    ));
    owner_entry.extend_from_slice(&owner_validation_salt);
    owner_entry.extend_from_slice(&owner_key_salt);

    let owner_key = hardened_hash(&password_bytes, &owner_key_salt, &user_entry);
    let owner_encrypted_key = aes256_cbc_no_padding(&owner_key, &[0u8; 16], &file_key)?;

    // Algorithm 10: Perms block, AES-256 ECB over one block.
    let perms = encrypt_perms_block(&file_key);

    // Encrypt every string and stream with the file key before the Encrypt
    // dictionary exists, so the dictionary itself stays plaintext.
    let ids: Vec<ObjectId> = document.objects.keys().copied().collect();
    for id in ids {
        if let Some(object) = document.objects.get_mut(&id) {
            let mut taken = std::mem::replace(object, Object::Null);
            encrypt_object(&file_key, &mut taken)?;
            *object = taken;
        }
    }

    let encrypt_id = document.add_object(dictionary! {
        "Filter" => "Standard",
        "V" => 5,
        "R" => 6,
        "Length" => 256,
        "O" => Object::String(owner_entry, lopdf::StringFormat::Hexadecimal),
        "U" => Object::String(user_entry, lopdf::StringFormat::Hexadecimal),
        "OE" => Object::String(owner_encrypted_key, lopdf::StringFormat::Hexadecimal),
        "UE" => Object::String(user_encrypted_key, lopdf::StringFormat::Hexadecimal),
        "Perms" => Object::String(perms.to_vec(), lopdf::StringFormat::Hexadecimal),
        "P" => Object::Integer(PERMISSIONS),
        "CF" => dictionary! {
            "StdCF" => dictionary! {
                "AuthEvent" => "DocOpen",
                "CFM" => "AESV3",
                "Length" => 32,
            },
        },
        "StmF" => "StdCF",
        "StrF" => "StdCF",
        "EncryptMetadata" => true,
    });
    document.trailer.set("Encrypt", Object::Reference(encrypt_id));

    let file_id = random_bytes::<16>();
    document.trailer.set(
        "ID",
        Object::Array(vec![
            Object::String(file_id.to_vec(), lopdf::StringFormat::Hexadecimal),
            Object::String(file_id.to_vec(), lopdf::StringFormat::Hexadecimal),
        ]),
    );
    document.version = "2.0".to_string();

    save_document("encrypt.save", &mut document, output)
}

/// Algorithm 2.B: the hardened iterated digest used by R6 for every
/// password-derived value.
fn hardened_hash(password: &[u8], salt: &[u8], user_data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(password);
    hasher.update(salt);
    hasher.update(user_data);
    let mut key: Vec<u8> = hasher.finalize().to_vec();

    let mut round = 0usize;
    loop {
        // K1 is (password || K || user data) repeated 64 times; its length is
        // a multiple of 64 bytes, so the unpadded AES-CBC below is exact.
        let chunk_len = password.len() + key.len() + user_data.len();
        let mut block = Vec::with_capacity(chunk_len * 64);
        for _ in 0..64 {
            block.extend_from_slice(password);
            block.extend_from_slice(&key);
            block.extend_from_slice(user_data);
        }

        let encrypted = aes128_cbc_no_padding(&key[..16], &key[16..32], &block);
        let modulus: u32 = encrypted[..16].iter().map(|b| u32::from(*b)).sum::<u32>() % 3;
        key = match modulus {
            0 => Sha256::digest(&encrypted).to_vec(),
            1 => Sha384::digest(&encrypted).to_vec(),
            _ => Sha512::digest(&encrypted).to_vec(),
        };

        round += 1;
        let last = usize::from(*encrypted.last().unwrap_or(&0));
        if round >= 64 && last <= round - 32 {
            break;
        }
    }

    let mut out = [0u8; 32];
    out.copy_from_slice(&key[..32]);
    out
}

fn aes128_cbc_no_padding(key: &[u8], iv: &[u8], data: &[u8]) -> Vec<u8> {
    let mut buffer = data.to_vec();
    let len = buffer.len();
    let cipher = Aes128CbcEnc::new(key.into(), iv.into());
    // Length is a multiple of 16 by construction; NoPadding cannot fail.
    cipher
        .encrypt_padded_mut::<NoPadding>(&mut buffer, len)
        .map(<[u8]>::len)
        .unwrap_or(len);
    buffer
}

fn aes256_cbc_no_padding(key: &[u8], iv: &[u8], data: &[u8]) -> TransformResult<Vec<u8>> {
    if !data.len().is_multiple_of(16) {
        return Err(TransformError::raster(
            "encrypt.cbc_block",
            "plaintext not block aligned",
        ));
    }
    let mut buffer = data.to_vec();
    let len = buffer.len();
    let cipher = Aes256CbcEnc::new(key.into(), iv.into());
    cipher
        .encrypt_padded_mut::<NoPadding>(&mut buffer, len)
        .map_err(|_| TransformError::raster("encrypt.cbc", "block encryption failed"))?;
    Ok(buffer)
}

/// AES-256-CBC with PKCS#7 padding and the random IV prepended, as required
/// for every encrypted string and stream under AESV3.
fn encrypt_payload(file_key: &[u8; 32], data: &[u8]) -> TransformResult<Vec<u8>> {
    let mut iv = [0u8; 16];
    rand::rng().fill_bytes(&mut iv);

    let padding = 16 - (data.len() % 16);
    let mut padded = data.to_vec();
    padded.extend(std::iter::repeat_n(padding as u8, padding));

    let ciphertext = aes256_cbc_no_padding(file_key, &iv, &padded)?;
    let mut out = Vec::with_capacity(16 + ciphertext.len());
    out.extend_from_slice(&iv);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

fn encrypt_perms_block(file_key: &[u8; 32]) -> [u8; 16] {
    let mut block = [0u8; 16];
    block[..4].copy_from_slice(&(PERMISSIONS as i32).to_le_bytes());
    block[4..8].copy_from_slice(&[0xFF, 0xFF, 0xFF, 0xFF]);
    block[8] = b'T';
    block[9..12].copy_from_slice(b"adb");
    rand::rng().fill_bytes(&mut block[12..16]);

    let cipher = Aes256::new(GenericArray::from_slice(file_key));
    let mut out = GenericArray::clone_from_slice(&block);
    cipher.encrypt_block(&mut out);
    let mut result = [0u8; 16];
    result.copy_from_slice(&out);
    result
}

fn encrypt_object(file_key: &[u8; 32], object: &mut Object) -> TransformResult<()> {
    match object {
        Object::String(bytes, _format) => {
            *bytes = encrypt_payload(file_key, bytes)?;
        }
        Object::Array(items) => {
            for item in items {
                encrypt_object(file_key, item)?;
            }
        }
        Object::Dictionary(dict) => {
            for (_, value) in dict.iter_mut() {
                encrypt_object(file_key, value)?;
            }
        }
        Object::Stream(stream) => {
            for (_, value) in stream.dict.iter_mut() {
                encrypt_object(file_key, value)?;
            }
            let encrypted = encrypt_payload(file_key, &stream.content)?;
            stream.set_content(encrypted);
            // The ciphertext must reach the file byte-for-byte.
            stream.allows_compression = false;
        }
        _ => {}
    }
    Ok(())
}

fn random_bytes<const N: usize>() -> [u8; N] {
    let mut out = [0u8; N];
    rand::rng().fill_bytes(&mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::rebuild::tests_support::blank_document;
    use anyhow::Result;
    use tempfile::TempDir;

    #[test]
    fn hardened_hash_is_deterministic_per_salt() {
        let first = hardened_hash(b"secret", b"saltsalt", &[]);
        let second = hardened_hash(b"secret", b"saltsalt", &[]);
        let other_salt = hardened_hash(b"secret", b"SALTSALT", &[]);
        assert_eq!(first, second);
        assert_ne!(first, other_salt);
        assert_eq!(first.len(), 32);
    }

    #[test]
    fn payload_encryption_prepends_iv_and_pads() -> TransformResult<()> {
        let key = [7u8; 32];
        let encrypted = encrypt_payload(&key, b"hello")?;
        assert_eq!(encrypted.len(), 16 + 16, "IV plus one padded block");
        let again = encrypt_payload(&key, b"hello")?;
        assert_ne!(encrypted, again, "fresh IV per payload");
        Ok(())
    }

    #[test]
    fn encrypted_document_carries_encrypt_dictionary() -> Result<()> {
        let dir = TempDir::new()?;
        let input = dir.path().join("in.pdf");
        std::fs::write(&input, blank_document(1))?;
        let output = dir.path().join("protected.pdf");

        encrypt_aes256(&input, &output, "hunter42")?;

        let bytes = std::fs::read(&output)?;
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.starts_with("%PDF-2.0"));
        assert!(text.contains("/Encrypt"));
        assert!(text.contains("/AESV3"));
        Ok(())
    }
}
