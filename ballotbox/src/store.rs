use crate::*;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

/// Storage collaborator for voters, candidates, tally centers, votes and results.
///
/// Implementations must be safe to share between threads. The two marker writes are
/// compare-and-swap operations: they only apply if the voter's stored marker still equals
/// `expected`, and return [`StoreError::Conflict`] otherwise.
pub trait Store: Send + Sync {
    fn get_voter(&self, identity: &str) -> Result<Option<Voter>, StoreError>;

    fn get_candidate(&self, id: CandidateId) -> Result<Option<Candidate>, StoreError>;

    fn get_tally_center(&self, id: TallyCenterId) -> Result<Option<TallyCenter>, StoreError>;

    /// All candidates, ordered by id
    fn candidates(&self) -> Result<Vec<Candidate>, StoreError>;

    /// All tally centers, ordered by id
    fn tally_centers(&self) -> Result<Vec<TallyCenter>, StoreError>;

    fn votes_for_center(&self, id: TallyCenterId) -> Result<Vec<Vote>, StoreError>;

    fn results_for_center(&self, id: TallyCenterId) -> Result<Vec<TallyResult>, StoreError>;

    /// True once any tally center has published a result
    fn has_results(&self) -> Result<bool, StoreError>;

    /// Replace the voter's marker if it still equals `expected`.
    fn swap_marker(
        &self,
        identity: &str,
        expected: Option<&[u8]>,
        marker: Option<Vec<u8>>,
    ) -> Result<(), StoreError>;

    /// Append `vote` and set the voter's marker as a single unit.
    ///
    /// Fails with [`StoreError::Conflict`] if the marker no longer equals `expected`, and with
    /// [`StoreError::VotingClosed`] if a result has been published in the meantime.
    fn commit_ballot(
        &self,
        identity: &str,
        expected: Option<&[u8]>,
        marker: Vec<u8>,
        vote: Vote,
    ) -> Result<(), StoreError>;

    fn insert_result(&self, result: TallyResult) -> Result<(), StoreError>;
}

/// The complete contents of a store
#[derive(Serialize, Deserialize, Default, Clone, Debug)]
pub struct StoreState {
    #[serde(default)]
    pub voters: BTreeMap<String, Voter>,
    #[serde(default)]
    pub candidates: BTreeMap<CandidateId, Candidate>,
    #[serde(default)]
    pub tally_centers: BTreeMap<TallyCenterId, TallyCenter>,
    #[serde(default)]
    pub votes: Vec<Vote>,
    #[serde(default)]
    pub results: Vec<TallyResult>,
}

/// A simple store that keeps everything in memory behind a single mutex
#[derive(Default)]
pub struct MemStore {
    inner: Mutex<StoreState>,
}

impl MemStore {
    fn lock(&self) -> Result<MutexGuard<StoreState>, StoreError> {
        self.inner.lock().map_err(|_| StoreError::Poisoned)
    }

    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        let state: StoreState = serde_json::from_str(json)?;
        Ok(state.into())
    }

    pub fn to_json(&self) -> Result<String, StoreError> {
        let state = self.lock()?;
        Ok(serde_json::to_string_pretty(&*state)?)
    }

    /// A copy of the current contents
    pub fn snapshot(&self) -> Result<StoreState, StoreError> {
        Ok(self.lock()?.clone())
    }

    pub fn add_voter(&self, voter: Voter) -> Result<(), StoreError> {
        self.lock()?.voters.insert(voter.identity.clone(), voter);
        Ok(())
    }

    pub fn add_candidate(&self, candidate: Candidate) -> Result<(), StoreError> {
        self.lock()?.candidates.insert(candidate.id, candidate);
        Ok(())
    }

    pub fn add_tally_center(&self, center: TallyCenter) -> Result<(), StoreError> {
        self.lock()?.tally_centers.insert(center.id, center);
        Ok(())
    }

    /// Overwrite a voter's marker without any check
    pub fn set_marker(&self, identity: &str, marker: Option<Vec<u8>>) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        let voter = state
            .voters
            .get_mut(identity)
            .ok_or_else(|| StoreError::VoterNotFound(identity.to_owned()))?;
        voter.eligibility_marker = marker;
        Ok(())
    }

    /// Mutable access to the published results
    pub fn with_results<F: FnOnce(&mut Vec<TallyResult>)>(&self, f: F) -> Result<(), StoreError> {
        f(&mut self.lock()?.results);
        Ok(())
    }
}

impl From<StoreState> for MemStore {
    fn from(state: StoreState) -> Self {
        MemStore {
            inner: Mutex::new(state),
        }
    }
}

fn check_marker(voter: &Voter, expected: Option<&[u8]>) -> Result<(), StoreError> {
    if voter.eligibility_marker.as_deref() != expected {
        return Err(StoreError::Conflict);
    }
    Ok(())
}

impl Store for MemStore {
    fn get_voter(&self, identity: &str) -> Result<Option<Voter>, StoreError> {
        Ok(self.lock()?.voters.get(identity).cloned())
    }

    fn get_candidate(&self, id: CandidateId) -> Result<Option<Candidate>, StoreError> {
        Ok(self.lock()?.candidates.get(&id).cloned())
    }

    fn get_tally_center(&self, id: TallyCenterId) -> Result<Option<TallyCenter>, StoreError> {
        Ok(self.lock()?.tally_centers.get(&id).cloned())
    }

    fn candidates(&self) -> Result<Vec<Candidate>, StoreError> {
        Ok(self.lock()?.candidates.values().cloned().collect())
    }

    fn tally_centers(&self) -> Result<Vec<TallyCenter>, StoreError> {
        Ok(self.lock()?.tally_centers.values().cloned().collect())
    }

    fn votes_for_center(&self, id: TallyCenterId) -> Result<Vec<Vote>, StoreError> {
        let state = self.lock()?;
        Ok(state
            .votes
            .iter()
            .filter(|v| v.tally_center_id == id)
            .cloned()
            .collect())
    }

    fn results_for_center(&self, id: TallyCenterId) -> Result<Vec<TallyResult>, StoreError> {
        let state = self.lock()?;
        Ok(state
            .results
            .iter()
            .filter(|r| r.tally_center_id == id)
            .cloned()
            .collect())
    }

    fn has_results(&self) -> Result<bool, StoreError> {
        Ok(!self.lock()?.results.is_empty())
    }

    fn swap_marker(
        &self,
        identity: &str,
        expected: Option<&[u8]>,
        marker: Option<Vec<u8>>,
    ) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        let voter = state
            .voters
            .get_mut(identity)
            .ok_or_else(|| StoreError::VoterNotFound(identity.to_owned()))?;
        check_marker(voter, expected)?;
        voter.eligibility_marker = marker;
        Ok(())
    }

    fn commit_ballot(
        &self,
        identity: &str,
        expected: Option<&[u8]>,
        marker: Vec<u8>,
        vote: Vote,
    ) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        if !state.results.is_empty() {
            return Err(StoreError::VotingClosed);
        }
        let voter = state
            .voters
            .get_mut(identity)
            .ok_or_else(|| StoreError::VoterNotFound(identity.to_owned()))?;
        check_marker(voter, expected)?;
        voter.eligibility_marker = Some(marker);
        state.votes.push(vote);
        Ok(())
    }

    fn insert_result(&self, result: TallyResult) -> Result<(), StoreError> {
        self.lock()?.results.push(result);
        Ok(())
    }
}
