//! Eligibility proof: the "master phrase" round trip.
//!
//! A voter proves that they hold the private key paired with the public key on file by
//! decrypting a fresh encryption of the shared master phrase. The resulting ciphertext is
//! stored as the voter's eligibility marker, which doubles as the "has voted" flag: a
//! marker that decrypts to the master phrase under the caller's key means the voter already
//! cast a ballot.
//!
//! This is a challenge/response check, not a zero-knowledge proof. It has no formal
//! soundness argument and does not hide timing. Anyone who learns the master phrase and a
//! voter's public key can mint a marker that locks that voter out until it is cleared.
//!
//! Clearing cuts the other way too. Under a wrong private key a genuine marker cannot be
//! told apart from a forged one, so a failed cast with the wrong key erases it. The cast
//! itself still fails with [`EligibilityError::InvalidPrivateKey`], but the voter's record
//! no longer shows a vote, and the real key holder can then cast a second ballot.

use crate::*;
use log::warn;

/// A voter, as provisioned at registration
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Voter {
    /// Unique identity, e.g. a passport number
    pub identity: String,

    /// PEM encoded public key
    pub public_key: String,

    #[serde(default, with = "hex_option")]
    pub eligibility_marker: Option<Vec<u8>>,
}

impl Voter {
    pub fn new(identity: &str, public_key: &str) -> Self {
        Voter {
            identity: identity.to_owned(),
            public_key: public_key.to_owned(),
            eligibility_marker: None,
        }
    }

    pub fn has_marker(&self) -> bool {
        self.eligibility_marker.is_some()
    }
}

/// The shared challenge payload. Never logged or displayed.
#[derive(Clone, PartialEq)]
pub struct MasterPhrase(String);

impl MasterPhrase {
    pub fn new(phrase: &str) -> Result<Self, ConfigError> {
        if phrase.is_empty() {
            return Err(ConfigError::EmptyMasterPhrase);
        }
        Ok(MasterPhrase(phrase.to_owned()))
    }

    /// Read the phrase from a file, ignoring trailing line endings
    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::MasterPhraseUnreadable(path.display().to_string(), e))?;
        Self::new(contents.trim_end_matches(&['\r', '\n'][..]))
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    fn matches(&self, decrypted: &[u8]) -> bool {
        self.as_bytes() == decrypted
    }
}

impl std::fmt::Debug for MasterPhrase {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str("MasterPhrase(..)")
    }
}

/// A successful eligibility proof
#[derive(Debug, Clone)]
pub struct EligibilityProof {
    /// The new marker to store alongside the cast ballot
    pub marker: Vec<u8>,

    /// The marker the proof was computed against; the commit must still observe it
    pub expected: Option<Vec<u8>>,
}

/// Prove that `private_key` pairs with the voter's stored public key and that the voter
/// has not voted yet.
///
/// A stored marker that does not decrypt to the master phrase under `private_key` is treated
/// as forged and cleared (only if it is still the stored value), after which the proof
/// continues as for a voter who never voted.
pub fn prove_eligibility<S: Store>(
    store: &S,
    voter: &Voter,
    private_key: &PrivateKey,
    master_phrase: &MasterPhrase,
) -> Result<EligibilityProof, EligibilityError> {
    if let Some(marker) = &voter.eligibility_marker {
        match decrypt(marker, private_key) {
            Ok(decrypted) if master_phrase.matches(&decrypted) => {
                return Err(EligibilityError::AlreadyVoted);
            }
            _ => {
                warn!(
                    "ballotbox: clearing unverifiable eligibility marker for voter {}",
                    voter.identity
                );
                store
                    .swap_marker(&voter.identity, Some(marker.as_slice()), None)
                    .map_err(|e| match e {
                        // Someone else replaced the marker first; let them win
                        StoreError::Conflict => EligibilityError::AlreadyVoted,
                        e => EligibilityError::Store(e),
                    })?;
            }
        }
    }

    let public_key = load_public_key(voter.public_key.as_bytes())
        .map_err(|_| EligibilityError::PublicKeyCorrupted)?;

    // A phrase too long for the key's OAEP capacity lands here, not in the voter record
    let marker = encrypt(master_phrase.as_bytes(), &public_key)
        .map_err(EligibilityError::EncryptionFailure)?;

    match decrypt(&marker, private_key) {
        Ok(decrypted) if master_phrase.matches(&decrypted) => Ok(EligibilityProof {
            marker,
            expected: None,
        }),
        _ => Err(EligibilityError::InvalidPrivateKey),
    }
}
