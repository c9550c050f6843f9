//! RSA primitives used by the protocol.
//!
//! Keys travel as PEM text (PKCS#8 or PKCS#1). Payloads are encrypted with RSA-OAEP/SHA-256,
//! which fails the padding check under a wrong key or a corrupted ciphertext rather than
//! yielding a plausible plaintext. Signatures are RSASSA-PKCS1-v1_5/SHA-256, which is
//! deterministic, and are stored hex-encoded.

use crate::*;
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey};
use rsa::pkcs1v15::{Signature, SigningKey, VerifyingKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::signature::{SignatureEncoding, Signer, Verifier};
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;

/// An RSA private key, held only for the duration of a single operation.
#[derive(Clone)]
pub struct PrivateKey(RsaPrivateKey);

/// An RSA public key, as declared by a voter or a tally center.
#[derive(Clone, Debug, PartialEq)]
pub struct PublicKey(RsaPublicKey);

impl PrivateKey {
    /// Parse a PEM encoded private key.
    pub fn from_pem(bytes: &[u8]) -> Result<Self, KeyFormatError> {
        let pem = std::str::from_utf8(bytes).map_err(|_| KeyFormatError::NotPem)?;
        let pem = pem.trim();
        match RsaPrivateKey::from_pkcs8_pem(pem) {
            Ok(key) => Ok(PrivateKey(key)),
            Err(pkcs8_err) => RsaPrivateKey::from_pkcs1_pem(pem)
                .map(PrivateKey)
                .map_err(|_| KeyFormatError::PrivateKey(pkcs8_err.to_string())),
        }
    }

    /// Serialize as PKCS#8 PEM
    pub fn to_pem(&self) -> Result<String, CryptoError> {
        self.0
            .to_pkcs8_pem(LineEnding::LF)
            .map(|pem| pem.as_str().to_owned())
            .map_err(|e| CryptoError::KeyEncoding(e.to_string()))
    }

    /// Derive the matching public key
    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.0.to_public_key())
    }
}

impl From<RsaPrivateKey> for PrivateKey {
    fn from(key: RsaPrivateKey) -> Self {
        PrivateKey(key)
    }
}

impl PublicKey {
    /// Parse a PEM encoded public key.
    pub fn from_pem(bytes: &[u8]) -> Result<Self, KeyFormatError> {
        let pem = std::str::from_utf8(bytes).map_err(|_| KeyFormatError::NotPem)?;
        let pem = pem.trim();
        match RsaPublicKey::from_public_key_pem(pem) {
            Ok(key) => Ok(PublicKey(key)),
            Err(spki_err) => RsaPublicKey::from_pkcs1_pem(pem)
                .map(PublicKey)
                .map_err(|_| KeyFormatError::PublicKey(spki_err.to_string())),
        }
    }

    /// Serialize as SubjectPublicKeyInfo PEM
    pub fn to_pem(&self) -> Result<String, CryptoError> {
        self.0
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| CryptoError::KeyEncoding(e.to_string()))
    }
}

pub fn load_private_key(bytes: &[u8]) -> Result<PrivateKey, KeyFormatError> {
    PrivateKey::from_pem(bytes)
}

pub fn load_public_key(bytes: &[u8]) -> Result<PublicKey, KeyFormatError> {
    PublicKey::from_pem(bytes)
}

/// Encrypt a small payload so that only the holder of the matching private key can read it.
pub fn encrypt(payload: &[u8], public_key: &PublicKey) -> Result<Vec<u8>, CryptoError> {
    let mut rng = rand::thread_rng();
    public_key
        .0
        .encrypt(&mut rng, Oaep::new::<Sha256>(), payload)
        .map_err(CryptoError::EncryptionFailure)
}

/// Decrypt a payload produced by [`encrypt`].
///
/// A wrong key, a truncated or otherwise corrupted ciphertext all fail the OAEP check.
pub fn decrypt(ciphertext: &[u8], private_key: &PrivateKey) -> Result<Vec<u8>, CryptoError> {
    private_key
        .0
        .decrypt(Oaep::new::<Sha256>(), ciphertext)
        .map_err(|_| CryptoError::DecryptionFailure)
}

/// Sign a message, returning the hex encoded signature.
pub fn sign(message: &[u8], private_key: &PrivateKey) -> Result<String, CryptoError> {
    let signing_key = SigningKey::<Sha256>::new(private_key.0.clone());
    let signature = signing_key
        .try_sign(message)
        .map_err(|e| CryptoError::SigningFailure(e.to_string()))?;
    Ok(hex::encode(signature.to_bytes()))
}

/// Verify a hex encoded signature. Malformed signatures simply fail to verify.
pub fn verify(message: &[u8], signature: &str, public_key: &PublicKey) -> bool {
    let bytes = match hex::decode(signature) {
        Ok(bytes) => bytes,
        Err(_) => return false,
    };
    let signature = match Signature::try_from(bytes.as_slice()) {
        Ok(signature) => signature,
        Err(_) => return false,
    };
    let verifying_key = VerifyingKey::<Sha256>::new(public_key.0.clone());
    verifying_key.verify(message, &signature).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::KEYS;

    #[test]
    fn test_pem_round_trip() {
        let key = load_private_key(KEYS[0].private_pem.as_bytes()).unwrap();
        let public = load_public_key(KEYS[0].public_pem.as_bytes()).unwrap();
        assert_eq!(key.public_key(), public);

        let reparsed = load_private_key(key.to_pem().unwrap().as_bytes()).unwrap();
        assert_eq!(reparsed.public_key(), public);
        assert_eq!(
            load_public_key(public.to_pem().unwrap().as_bytes()).unwrap(),
            public
        );
    }

    #[test]
    fn test_pkcs1_keys() {
        use rsa::pkcs1::{EncodeRsaPrivateKey, EncodeRsaPublicKey};

        let key = load_private_key(KEYS[0].private_pem.as_bytes()).unwrap();
        let pkcs1_private = key.0.to_pkcs1_pem(LineEnding::LF).unwrap();
        let pkcs1_public = key.0.to_public_key().to_pkcs1_pem(LineEnding::LF).unwrap();

        let private = load_private_key(pkcs1_private.as_bytes()).unwrap();
        let public = load_public_key(pkcs1_public.as_bytes()).unwrap();
        assert_eq!(private.public_key(), public);
    }

    #[test]
    fn test_bad_keys() {
        assert!(load_private_key(b"not a key").is_err());
        assert!(load_public_key(b"not a key").is_err());
        assert!(load_private_key(&[0xff, 0xfe, 0x00]).is_err());

        // A public key is not a private key and vice versa
        assert!(load_private_key(KEYS[0].public_pem.as_bytes()).is_err());
        assert!(load_public_key(KEYS[0].private_pem.as_bytes()).is_err());
    }

    #[test]
    fn test_encrypt_decrypt() {
        let key = load_private_key(KEYS[0].private_pem.as_bytes()).unwrap();
        let ciphertext = encrypt(b"ABOLISH ICE", &key.public_key()).unwrap();
        assert_eq!(decrypt(&ciphertext, &key).unwrap(), b"ABOLISH ICE");

        // Randomized padding
        let again = encrypt(b"ABOLISH ICE", &key.public_key()).unwrap();
        assert_ne!(ciphertext, again);

        // Wrong key
        let bad_key = load_private_key(KEYS[1].private_pem.as_bytes()).unwrap();
        assert!(decrypt(&ciphertext, &bad_key).is_err());

        // Corrupted ciphertext
        let mut corrupted = ciphertext.clone();
        corrupted[10] ^= 0x01;
        assert!(decrypt(&corrupted, &key).is_err());
        assert!(decrypt(&ciphertext[1..], &key).is_err());
        assert!(decrypt(&[], &key).is_err());
    }

    #[test]
    fn test_payload_too_large() {
        let key = load_private_key(KEYS[0].private_pem.as_bytes()).unwrap();
        let payload = vec![7u8; 4096];
        assert!(matches!(
            encrypt(&payload, &key.public_key()),
            Err(CryptoError::EncryptionFailure(_))
        ));
    }

    #[test]
    fn test_signature() {
        let key = load_private_key(KEYS[0].private_pem.as_bytes()).unwrap();
        let public = key.public_key();

        let signature = sign(b"{\"1\":2}", &key).unwrap();
        assert!(verify(b"{\"1\":2}", &signature, &public));

        // Deterministic
        assert_eq!(signature, sign(b"{\"1\":2}", &key).unwrap());

        // Bad message
        assert!(!verify(b"{\"1\":3}", &signature, &public));

        // Bad public key
        let other = load_public_key(KEYS[1].public_pem.as_bytes()).unwrap();
        assert!(!verify(b"{\"1\":2}", &signature, &other));

        // Garbage signature
        assert!(!verify(b"{\"1\":2}", "zz", &public));
        assert!(!verify(b"{\"1\":2}", "00ff", &public));
    }
}
