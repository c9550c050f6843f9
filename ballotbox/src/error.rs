use crate::*;

use thiserror::Error;

/// Key (de)serialization errors
#[derive(Debug, Error)]
pub enum KeyFormatError {
    #[error("ballotbox: key is not valid UTF-8 PEM")]
    NotPem,

    #[error("ballotbox: unable to parse private key: {0}")]
    PrivateKey(String),

    #[error("ballotbox: unable to parse public key: {0}")]
    PublicKey(String),
}

/// Errors from the asymmetric primitives
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("ballotbox: encryption failed: {0}")]
    EncryptionFailure(rsa::Error),

    #[error("ballotbox: decryption failed")]
    DecryptionFailure,

    #[error("ballotbox: signing failed: {0}")]
    SigningFailure(String),

    #[error("ballotbox: unable to encode key: {0}")]
    KeyEncoding(String),
}

/// Errors raised by the storage collaborator
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("ballotbox store: eligibility marker changed concurrently")]
    Conflict,

    #[error("ballotbox store: voting is closed")]
    VotingClosed,

    #[error("ballotbox store: voter {0} not found")]
    VoterNotFound(String),

    #[error("ballotbox store: JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("ballotbox store: lock poisoned")]
    Poisoned,
}

/// Outcomes of the eligibility proof that prevent a ballot from being cast
#[derive(Debug, Error)]
pub enum EligibilityError {
    #[error("ballotbox: this voter has already voted")]
    AlreadyVoted,

    #[error("ballotbox: private key does not match the voter's public key")]
    InvalidPrivateKey,

    #[error("ballotbox: the voter's stored public key is corrupted")]
    PublicKeyCorrupted,

    #[error("ballotbox: unable to encrypt the master phrase: {0}")]
    EncryptionFailure(CryptoError),

    #[error("ballotbox: {0}")]
    Store(#[from] StoreError),
}

/// Outcomes of casting a ballot
#[derive(Debug, Error)]
pub enum CastError {
    #[error("ballotbox: voting is closed")]
    VotingClosed,

    #[error("ballotbox: unknown voter {0}")]
    UnknownVoter(String),

    #[error("ballotbox: the supplied private key cannot be parsed: {0}")]
    KeyFormatError(KeyFormatError),

    #[error("ballotbox: the voter's stored public key is corrupted")]
    PublicKeyCorrupted,

    #[error("ballotbox: this voter has already voted")]
    AlreadyVoted,

    #[error("ballotbox: private key does not match the voter's public key")]
    InvalidPrivateKey,

    #[error("ballotbox: tally center {0} is unknown or has an unusable public key")]
    UnknownTallyCenterOrBadKey(TallyCenterId),

    #[error("ballotbox: encryption failed: {0}")]
    EncryptionFailure(CryptoError),

    #[error("ballotbox: {0}")]
    Store(StoreError),
}

impl From<EligibilityError> for CastError {
    fn from(e: EligibilityError) -> Self {
        match e {
            EligibilityError::AlreadyVoted => CastError::AlreadyVoted,
            EligibilityError::InvalidPrivateKey => CastError::InvalidPrivateKey,
            EligibilityError::PublicKeyCorrupted => CastError::PublicKeyCorrupted,
            EligibilityError::EncryptionFailure(e) => CastError::EncryptionFailure(e),
            EligibilityError::Store(e) => e.into(),
        }
    }
}

impl From<StoreError> for CastError {
    fn from(e: StoreError) -> Self {
        match e {
            // Another cast for the same voter committed first
            StoreError::Conflict => CastError::AlreadyVoted,
            StoreError::VotingClosed => CastError::VotingClosed,
            e => CastError::Store(e),
        }
    }
}

/// Outcomes of tallying a center
#[derive(Debug, Error)]
pub enum TallyError {
    #[error("ballotbox: unknown tally center {0}")]
    UnknownTallyCenter(TallyCenterId),

    #[error("ballotbox: the supplied private key cannot be parsed: {0}")]
    KeyFormatError(KeyFormatError),

    #[error("ballotbox: unable to decrypt a ballot for tally center {0}")]
    DecryptionFailure(TallyCenterId),

    #[error("ballotbox: private key does not match tally center {0}'s public key")]
    KeyMismatch(TallyCenterId),

    #[error("ballotbox: unable to sign the result: {0}")]
    SigningFailure(CryptoError),

    #[error("ballotbox: unable to encode the result: {0}")]
    Encoding(serde_json::Error),

    #[error("ballotbox: {0}")]
    Store(#[from] StoreError),
}

/// Integrity failures found while verifying published results
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("ballotbox: tally center {0} has more than one published result")]
    DuplicateResult(TallyCenterId),

    #[error("ballotbox: the result of tally center {0} has been tampered with")]
    Tampered(TallyCenterId),

    #[error("ballotbox: the signed result of tally center {0} cannot be decoded: {1}")]
    MalformedResult(TallyCenterId, serde_json::Error),

    #[error("ballotbox: adding the counts of tally center {0} overflows the totals")]
    CountOverflow(TallyCenterId),

    #[error("ballotbox: {0}")]
    Store(#[from] StoreError),
}

/// Errors loading process-wide settings
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("ballotbox: the master phrase is empty")]
    EmptyMasterPhrase,

    #[error("ballotbox: unable to read master phrase from {0}: {1}")]
    MasterPhraseUnreadable(String, std::io::Error),
}
