use crate::*;
use log::{debug, warn};
use std::collections::BTreeMap;
use std::fmt;

/// Votes for one candidate
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CandidateCount {
    pub candidate_id: CandidateId,

    /// `None` if the candidate id is not registered
    pub name: Option<String>,
    pub votes: u64,
}

impl fmt::Display for CandidateCount {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{}: {}", name, self.votes),
            None => write!(f, "unknown candidate #{}: {}", self.candidate_id, self.votes),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CenterResults {
    pub center_id: TallyCenterId,
    pub center_name: String,
    pub counts: Vec<CandidateCount>,
}

/// Verified results of every tally center, in center id order, with grand totals
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub struct Results {
    pub centers: Vec<CenterResults>,
    pub totals: Vec<CandidateCount>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Verification {
    /// Every center has published a single result with a valid signature
    Complete(Results),

    /// Some centers have not tallied yet. Not an error; try again later.
    Incomplete { missing: Vec<TallyCenterId> },
}

/// Check every published result against its center's public key and collect the counts.
///
/// Fails if any center published more than once, if any signature does not verify, or if
/// the signed counts do not fit the totals. In that case no counts are returned at all.
pub fn verify_and_collect<S: Store>(store: &S) -> Result<Verification, VerifyError> {
    let centers = store.tally_centers()?;

    let mut published = Vec::with_capacity(centers.len());
    for center in &centers {
        let mut results = store.results_for_center(center.id)?;
        if results.len() > 1 {
            return Err(VerifyError::DuplicateResult(center.id));
        }
        published.push(results.pop());
    }

    let missing: Vec<TallyCenterId> = centers
        .iter()
        .zip(&published)
        .filter(|(_, result)| result.is_none())
        .map(|(center, _)| center.id)
        .collect();
    if !missing.is_empty() {
        debug!("ballotbox: waiting on tally centers {:?}", missing);
        return Ok(Verification::Incomplete { missing });
    }

    let mut verified = Vec::with_capacity(centers.len());
    for (center, result) in centers.iter().zip(published.into_iter().flatten()) {
        let authentic = load_public_key(center.public_key.as_bytes())
            .map(|key| verify(result.result.as_bytes(), &result.signature, &key))
            .unwrap_or(false);
        if !authentic {
            warn!("ballotbox: signature check failed for tally center {}", center.id);
            return Err(VerifyError::Tampered(center.id));
        }
        let counts = decode_counts(&result.result)
            .map_err(|e| VerifyError::MalformedResult(center.id, e))?;
        verified.push((center, counts));
    }

    let names: BTreeMap<CandidateId, String> = store
        .candidates()?
        .into_iter()
        .map(|c| (c.id, c.name))
        .collect();
    let named = |candidate_id: CandidateId, votes: u64| CandidateCount {
        candidate_id,
        name: names.get(&candidate_id).cloned(),
        votes,
    };

    let mut results = Results::default();
    let mut totals = Counts::new();
    for (center, counts) in verified {
        for (&candidate_id, &votes) in &counts {
            let total = totals.entry(candidate_id).or_insert(0);
            *total = total
                .checked_add(votes)
                .ok_or(VerifyError::CountOverflow(center.id))?;
        }
        results.centers.push(CenterResults {
            center_id: center.id,
            center_name: center.name.clone(),
            counts: counts.into_iter().map(|(id, votes)| named(id, votes)).collect(),
        });
    }
    results.totals = totals.into_iter().map(|(id, votes)| named(id, votes)).collect();

    Ok(Verification::Complete(results))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::*;

    fn publish(store: &MemStore, center: TallyCenterId, key: usize, counts: &Counts) {
        let private_key = load_private_key(KEYS[key].private_pem.as_bytes()).unwrap();
        let result = encode_counts(counts).unwrap();
        let signature = sign(result.as_bytes(), &private_key).unwrap();
        store
            .insert_result(TallyResult {
                tally_center_id: center,
                result,
                signature,
            })
            .unwrap();
    }

    fn counts(pairs: &[(CandidateId, u64)]) -> Counts {
        pairs.iter().cloned().collect()
    }

    #[test]
    fn test_no_centers() {
        let store = MemStore::default();
        assert_eq!(
            verify_and_collect(&store).unwrap(),
            Verification::Complete(Results::default())
        );
    }

    #[test]
    fn test_incomplete() {
        let store = election();
        assert_eq!(
            verify_and_collect(&store).unwrap(),
            Verification::Incomplete {
                missing: vec![10, 20]
            }
        );

        publish(&store, 10, 2, &counts(&[(1, 4)]));
        assert_eq!(
            verify_and_collect(&store).unwrap(),
            Verification::Incomplete { missing: vec![20] }
        );
    }

    #[test]
    fn test_complete() {
        let store = election();
        publish(&store, 10, 2, &counts(&[(1, 4), (2, 1)]));
        publish(&store, 20, 3, &counts(&[(2, 5), (9, 2)]));

        let results = match verify_and_collect(&store).unwrap() {
            Verification::Complete(results) => results,
            other => panic!("unexpected {:?}", other),
        };

        assert_eq!(results.centers.len(), 2);
        assert_eq!(results.centers[0].center_name, "North");
        assert_eq!(
            results.centers[0].counts,
            vec![
                CandidateCount {
                    candidate_id: 1,
                    name: Some("Ada Lovelace".to_owned()),
                    votes: 4
                },
                CandidateCount {
                    candidate_id: 2,
                    name: Some("Grace Hopper".to_owned()),
                    votes: 1
                },
            ]
        );
        assert_eq!(results.centers[1].center_id, 20);

        let totals: Vec<(CandidateId, u64)> = results
            .totals
            .iter()
            .map(|c| (c.candidate_id, c.votes))
            .collect();
        assert_eq!(totals, vec![(1, 4), (2, 6), (9, 2)]);

        // Unregistered candidates are reported, not dropped
        let unknown = &results.totals[2];
        assert!(unknown.name.is_none());
        assert_eq!(unknown.to_string(), "unknown candidate #9: 2");
        assert_eq!(results.totals[1].to_string(), "Grace Hopper: 6");
    }

    #[test]
    fn test_tampered_result() {
        let store = election();
        publish(&store, 10, 2, &counts(&[(1, 4), (2, 1)]));
        publish(&store, 20, 3, &counts(&[(2, 5)]));

        store
            .with_results(|results| {
                let result = results.iter_mut().find(|r| r.tally_center_id == 20).unwrap();
                result.result = "{\"1\":500,\"2\":5}".to_owned();
            })
            .unwrap();

        assert!(matches!(
            verify_and_collect(&store),
            Err(VerifyError::Tampered(20))
        ));
    }

    #[test]
    fn test_signed_by_wrong_key() {
        let store = election();
        publish(&store, 10, 2, &counts(&[(1, 4)]));
        // Center 20's declared key is KEYS[3]
        publish(&store, 20, 4, &counts(&[(1, 4)]));

        assert!(matches!(
            verify_and_collect(&store),
            Err(VerifyError::Tampered(20))
        ));
    }

    #[test]
    fn test_corrupted_center_key() {
        let store = MemStore::default();
        store
            .add_tally_center(TallyCenter::new(1, "Broken", "not a key"))
            .unwrap();
        publish(&store, 1, 2, &counts(&[(1, 1)]));

        assert!(matches!(
            verify_and_collect(&store),
            Err(VerifyError::Tampered(1))
        ));
    }

    #[test]
    fn test_duplicate_result() {
        let store = election();
        publish(&store, 10, 2, &counts(&[(1, 4)]));
        publish(&store, 10, 2, &counts(&[(1, 4)]));

        // Reported even though center 20 has not tallied yet
        assert!(matches!(
            verify_and_collect(&store),
            Err(VerifyError::DuplicateResult(10))
        ));
    }

    #[test]
    fn test_totals_overflow() {
        let store = election();
        publish(&store, 10, 2, &counts(&[(1, u64::MAX)]));
        publish(&store, 20, 3, &counts(&[(1, 1)]));

        assert!(matches!(
            verify_and_collect(&store),
            Err(VerifyError::CountOverflow(20))
        ));

        // The largest count on its own is fine
        let store = election();
        publish(&store, 10, 2, &counts(&[(1, u64::MAX)]));
        publish(&store, 20, 3, &counts(&[(2, u64::MAX)]));
        assert!(matches!(
            verify_and_collect(&store),
            Ok(Verification::Complete(_))
        ));
    }

    #[test]
    fn test_malformed_result() {
        let store = MemStore::default();
        store
            .add_tally_center(TallyCenter::new(1, "Odd", &KEYS[2].public_pem))
            .unwrap();
        let private_key = load_private_key(KEYS[2].private_pem.as_bytes()).unwrap();
        let result = "[1, 2, 3]".to_owned();
        let signature = sign(result.as_bytes(), &private_key).unwrap();
        store
            .insert_result(TallyResult {
                tally_center_id: 1,
                result,
                signature,
            })
            .unwrap();

        assert!(matches!(
            verify_and_collect(&store),
            Err(VerifyError::MalformedResult(1, _))
        ));
    }
}
