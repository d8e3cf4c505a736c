use crate::core::KrbUser;
use crate::error::{Error, Result};
use kerberos_asn1::EncryptionKey;
use kerberos_constants::{checksum_types, etypes};
use kerberos_crypto::{
    aes_hmac_sha1, checksum_hmac_md5, checksum_sha_aes, new_kerberos_cipher,
    rc4_hmac_md5, AesCipher, AesSizes, KerberosCipher, Key, Rc4Cipher,
};
use std::fmt;

/// Size of the confounder prepended to the plaintext by RC4-HMAC
const RC4_PREAMBLE_SIZE: usize = 8;

/// Kerberos key with the algorithm required to use it
pub struct Cipher {
    cipher: Box<dyn KerberosCipher>,
    key: Vec<u8>,
    kvno: Option<u32>,
}

impl Cipher {
    pub fn generate(
        user_key: &Key,
        user: &KrbUser,
        preferred_etype: Option<i32>,
    ) -> Result<Self> {
        let (cipher, key) =
            generate_cipher_and_key(user_key, user, preferred_etype)?;
        return Ok(Self::new(cipher, key));
    }

    pub fn new(cipher: Box<dyn KerberosCipher>, key: Vec<u8>) -> Self {
        return Self {
            cipher,
            key,
            kvno: None,
        };
    }

    /// Creates a cipher from the raw key sent by the KDC. The key version
    /// is the one of the ticket the key belongs to.
    pub fn load_key(etype: i32, key: &[u8], kvno: Option<u32>) -> Result<Self> {
        let cipher = new_kerberos_cipher(etype).map_err(|_| {
            Error::CryptoError(format!("Not supported etype: '{}'", etype))
        })?;

        let expected_size = key_size(etype);
        if key.len() != expected_size {
            return Err(Error::CryptoError(format!(
                "Invalid key of {} bytes for etype {}, expected {} bytes",
                key.len(),
                etype,
                expected_size
            )));
        }

        return Ok(Self {
            cipher,
            key: key.to_vec(),
            kvno,
        });
    }

    pub fn etype(&self) -> i32 {
        return self.cipher.etype();
    }

    pub fn kvno(&self) -> Option<u32> {
        return self.kvno;
    }

    pub fn key(&self) -> &[u8] {
        return &self.key;
    }

    pub fn encryption_key(&self) -> EncryptionKey {
        return EncryptionKey {
            keytype: self.etype(),
            keyvalue: self.key.clone(),
        };
    }

    pub fn encrypt(&self, key_usage: i32, plaintext: &[u8]) -> Vec<u8> {
        return self.cipher.encrypt(&self.key, key_usage, plaintext);
    }

    /// Encrypts with the given confounder instead of a random one, so the
    /// same input always produces the same ciphertext.
    pub fn encrypt_with_preamble(
        &self,
        key_usage: i32,
        plaintext: &[u8],
        preamble: &[u8],
    ) -> Vec<u8> {
        match self.aes_sizes() {
            Some(aes_sizes) => aes_hmac_sha1::encrypt(
                &self.key, key_usage, plaintext, preamble, &aes_sizes,
            ),
            None => {
                rc4_hmac_md5::encrypt(&self.key, key_usage, plaintext, preamble)
            }
        }
    }

    /// Size of the confounder required by `encrypt_with_preamble`
    pub fn preamble_size(&self) -> usize {
        match self.aes_sizes() {
            Some(aes_sizes) => aes_sizes.block_size(),
            None => RC4_PREAMBLE_SIZE,
        }
    }

    fn aes_sizes(&self) -> Option<AesSizes> {
        match self.etype() {
            etypes::AES128_CTS_HMAC_SHA1_96 => Some(AesSizes::Aes128),
            etypes::AES256_CTS_HMAC_SHA1_96 => Some(AesSizes::Aes256),
            _ => None,
        }
    }

    pub fn decrypt(&self, key_usage: i32, ciphertext: &[u8]) -> Result<Vec<u8>> {
        return self
            .cipher
            .decrypt(&self.key, key_usage, ciphertext)
            .map_err(|err| {
                Error::CryptoError(format!("Decryption error: {}", err))
            });
    }

    /// Keyed checksum associated to the etype of the key
    pub fn checksum(&self, key_usage: i32, text: &[u8]) -> Vec<u8> {
        match self.aes_sizes() {
            Some(aes_sizes) => {
                checksum_sha_aes(&self.key, key_usage, text, &aes_sizes)
            }
            None => checksum_hmac_md5(&self.key, key_usage, text),
        }
    }

    pub fn checksum_type(&self) -> i32 {
        match self.etype() {
            etypes::AES128_CTS_HMAC_SHA1_96 => {
                checksum_types::HMAC_SHA1_96_AES128
            }
            etypes::AES256_CTS_HMAC_SHA1_96 => {
                checksum_types::HMAC_SHA1_96_AES256
            }
            _ => checksum_types::HMAC_MD5,
        }
    }
}

impl fmt::Debug for Cipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cipher")
            .field("etype", &self.etype())
            .field("kvno", &self.kvno)
            .finish()
    }
}

fn key_size(etype: i32) -> usize {
    match etype {
        etypes::AES256_CTS_HMAC_SHA1_96 => 32,
        _ => 16,
    }
}

/// Helper to generate a cipher based on user credentials
/// and calculate the key when it is necessary
/// (in case of password)
pub fn generate_cipher_and_key(
    user_key: &Key,
    user: &KrbUser,
    preferred_etype: Option<i32>,
) -> Result<(Box<dyn KerberosCipher>, Vec<u8>)> {
    match user_key {
        Key::Secret(secret) => {
            let etype =
                preferred_etype.unwrap_or(etypes::AES256_CTS_HMAC_SHA1_96);
            let cipher = new_kerberos_cipher(etype).map_err(|_| {
                Error::CryptoError(format!("Unknown etype {}", etype))
            })?;
            let salt = cipher.generate_salt(&user.realm, &user.name);
            let key = cipher.generate_key_from_string(&secret, &salt);
            return Ok((cipher, key));
        }
        Key::RC4Key(key) => {
            let cipher = Rc4Cipher::new();
            return Ok((Box::new(cipher), key.to_vec()));
        }
        Key::AES128Key(key) => {
            let cipher = AesCipher::new(AesSizes::Aes128);
            return Ok((Box::new(cipher), key.to_vec()));
        }
        Key::AES256Key(key) => {
            let cipher = AesCipher::new(AesSizes::Aes256);
            return Ok((Box::new(cipher), key.to_vec()));
        }
    };
}
