use crate::*;
use log::info;
use std::collections::BTreeMap;

pub type TallyCenterId = u32;

/// Candidate id to number of votes, in ascending candidate order
pub type Counts = BTreeMap<CandidateId, u64>;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TallyCenter {
    pub id: TallyCenterId,
    pub name: String,

    /// PEM encoded public key. The private key is held by the center's operator only.
    pub public_key: String,
}

impl TallyCenter {
    pub fn new(id: TallyCenterId, name: &str, public_key: &str) -> Self {
        TallyCenter {
            id,
            name: name.to_owned(),
            public_key: public_key.to_owned(),
        }
    }
}

/// A signed, published result. Its presence closes voting everywhere.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TallyResult {
    pub tally_center_id: TallyCenterId,

    /// Canonical encoding of the counts; these exact bytes are signed
    pub result: String,

    /// Hex encoded signature over `result`
    pub signature: String,
}

/// Canonical encoding: compact JSON with keys in ascending numeric order.
pub fn encode_counts(counts: &Counts) -> Result<String, serde_json::Error> {
    serde_json::to_string(counts)
}

pub fn decode_counts(encoded: &str) -> Result<Counts, serde_json::Error> {
    serde_json::from_str(encoded)
}

/// Decrypt, count, sign and publish the ballots of one tally center.
///
/// A single ballot that fails to decrypt aborts the whole tally and nothing is written.
/// Tallying the same center twice publishes two results; verification rejects that.
pub fn tally<S: Store>(
    store: &S,
    tally_center_id: TallyCenterId,
    private_key_pem: &[u8],
) -> Result<TallyResult, TallyError> {
    let center = store
        .get_tally_center(tally_center_id)?
        .ok_or(TallyError::UnknownTallyCenter(tally_center_id))?;

    let private_key = load_private_key(private_key_pem).map_err(TallyError::KeyFormatError)?;

    let votes = store.votes_for_center(tally_center_id)?;
    let mut counts = Counts::new();
    for vote in &votes {
        let candidate_id = decrypt_vote(&vote.encrypted_vote, &private_key)
            .map_err(|_| TallyError::DecryptionFailure(tally_center_id))?;
        *counts.entry(candidate_id).or_insert(0) += 1;
    }

    // Only reachable with a wrong key when there was nothing to decrypt
    let declared_key = load_public_key(center.public_key.as_bytes()).ok();
    if declared_key.as_ref() != Some(&private_key.public_key()) {
        return Err(TallyError::KeyMismatch(tally_center_id));
    }

    let result = encode_counts(&counts).map_err(TallyError::Encoding)?;
    let signature = sign(result.as_bytes(), &private_key).map_err(TallyError::SigningFailure)?;

    let tally_result = TallyResult {
        tally_center_id,
        result,
        signature,
    };
    store.insert_result(tally_result.clone())?;

    info!(
        "ballotbox: tally center {} counted {} ballots",
        tally_center_id,
        votes.len()
    );
    Ok(tally_result)
}
