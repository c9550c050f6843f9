use crate::config::Config;
use crate::exit_with;
use ballotbox::Store;

pub fn command_centers(config: &Config) {
    let store = config.load_store().unwrap_or_else(|e| exit_with(1, &e));
    let centers = store
        .tally_centers()
        .unwrap_or_else(|e| exit_with(1, &e.to_string()));
    for center in centers {
        println!("{}\t{}", center.id, center.name);
    }
}

pub fn command_candidates(config: &Config) {
    let store = config.load_store().unwrap_or_else(|e| exit_with(1, &e));
    let candidates = store
        .candidates()
        .unwrap_or_else(|e| exit_with(1, &e.to_string()));
    for candidate in candidates {
        println!("{}\t{}", candidate.id, candidate.name);
    }
}
