use crate::*;
use log::{debug, info};

pub type CandidateId = u32;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Candidate {
    pub id: CandidateId,
    pub name: String,
}

impl Candidate {
    pub fn new(id: CandidateId, name: &str) -> Self {
        Candidate {
            id,
            name: name.to_owned(),
        }
    }
}

/// An encrypted ballot. Append-only.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Vote {
    #[serde(with = "hex_bytes")]
    pub encrypted_vote: Vec<u8>,
    pub tally_center_id: TallyCenterId,
}

/// Encrypt a candidate id for a tally center
pub fn encrypt_vote(
    candidate_id: CandidateId,
    public_key: &PublicKey,
) -> Result<Vec<u8>, CryptoError> {
    encrypt(&candidate_id.to_be_bytes(), public_key)
}

/// Decrypt a ballot back to the candidate id
pub fn decrypt_vote(
    encrypted_vote: &[u8],
    private_key: &PrivateKey,
) -> Result<CandidateId, CryptoError> {
    let payload = decrypt(encrypted_vote, private_key)?;
    let bytes: [u8; 4] = payload
        .as_slice()
        .try_into()
        .map_err(|_| CryptoError::DecryptionFailure)?;
    Ok(CandidateId::from_be_bytes(bytes))
}

/// Cast a ballot for `candidate_id`, to be counted by tally center `tally_center_id`.
///
/// Checks run in a fixed order and the first failure is returned. Nothing is written on
/// failure, except that a forged eligibility marker may be cleared (see [`prove_eligibility`]).
/// The vote and the new marker are committed together, conditional on the marker the proof
/// observed, so concurrent casts for one voter yield at most one success.
pub fn cast_ballot<S: Store>(
    store: &S,
    master_phrase: &MasterPhrase,
    voter_identity: &str,
    private_key_pem: &[u8],
    candidate_id: CandidateId,
    tally_center_id: TallyCenterId,
) -> Result<(), CastError> {
    if store.has_results()? {
        return Err(CastError::VotingClosed);
    }

    let voter = store
        .get_voter(voter_identity)?
        .ok_or_else(|| CastError::UnknownVoter(voter_identity.to_owned()))?;

    let private_key = load_private_key(private_key_pem).map_err(CastError::KeyFormatError)?;

    let proof = prove_eligibility(store, &voter, &private_key, master_phrase)?;
    debug!("ballotbox: voter {} passed the eligibility proof", voter_identity);

    let center_key = store
        .get_tally_center(tally_center_id)?
        .and_then(|center| load_public_key(center.public_key.as_bytes()).ok())
        .ok_or(CastError::UnknownTallyCenterOrBadKey(tally_center_id))?;

    let encrypted_vote =
        encrypt_vote(candidate_id, &center_key).map_err(CastError::EncryptionFailure)?;

    let vote = Vote {
        encrypted_vote,
        tally_center_id,
    };
    store.commit_ballot(
        voter_identity,
        proof.expected.as_deref(),
        proof.marker,
        vote,
    )?;

    info!(
        "ballotbox: voter {} cast a ballot at tally center {}",
        voter_identity, tally_center_id
    );
    Ok(())
}
