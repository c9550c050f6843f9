//! Shared test fixtures. Key generation is slow, so keys are generated once per test binary.

use crate::*;
use lazy_static::lazy_static;
use rsa::RsaPrivateKey;

pub struct TestKey {
    pub private_pem: String,
    pub public_pem: String,
}

impl TestKey {
    fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let key: PrivateKey = RsaPrivateKey::new(&mut rng, 1024).unwrap().into();
        TestKey {
            private_pem: key.to_pem().unwrap(),
            public_pem: key.public_key().to_pem().unwrap(),
        }
    }
}

lazy_static! {
    pub static ref KEYS: Vec<TestKey> = (0..6).map(|_| TestKey::generate()).collect();
}

pub const PHRASE: &str = "the quick brown fox votes once";

pub fn master_phrase() -> MasterPhrase {
    MasterPhrase::new(PHRASE).unwrap()
}

/// A store with voters "alice" (key 0) and "bob" (key 1), candidates 1 and 2,
/// and tally centers 10 (key 2) and 20 (key 3).
pub fn election() -> MemStore {
    let store = MemStore::default();
    store.add_voter(Voter::new("alice", &KEYS[0].public_pem)).unwrap();
    store.add_voter(Voter::new("bob", &KEYS[1].public_pem)).unwrap();
    store.add_candidate(Candidate::new(1, "Ada Lovelace")).unwrap();
    store.add_candidate(Candidate::new(2, "Grace Hopper")).unwrap();
    store
        .add_tally_center(TallyCenter::new(10, "North", &KEYS[2].public_pem))
        .unwrap();
    store
        .add_tally_center(TallyCenter::new(20, "South", &KEYS[3].public_pem))
        .unwrap();
    store
}
