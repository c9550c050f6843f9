use crate::config::Config;
use crate::{exit_with, read_key};
use ballotbox::TallyError;

pub fn command_tally(matches: &clap::ArgMatches, config: &Config) {
    let center = crate::parse_id(matches.value_of("TALLY-CENTER"), "tally center");
    let private_key = read_key(matches.value_of("KEY-FILE").unwrap_or_default());

    let _lock = config.lock_state().unwrap_or_else(|e| exit_with(1, &e));
    let store = config.load_store().unwrap_or_else(|e| exit_with(1, &e));
    match ballotbox::tally(&store, center, &private_key) {
        Ok(result) => {
            config.save_store(&store).unwrap_or_else(|e| exit_with(1, &e));
            println!("Tally center {} published its result: {}", center, result.result);
        }
        Err(e) => exit_with(tally_exit_code(&e), &describe(&e)),
    }
}

pub fn describe(e: &TallyError) -> String {
    match e {
        TallyError::UnknownTallyCenter(center) => format!("No tally center has id {}.", center),
        TallyError::KeyFormatError(e) => {
            format!("The private key file is not a valid key ({}).", e)
        }
        TallyError::DecryptionFailure(center) => format!(
            "A ballot for tally center {} could not be decrypted with this key; \
             nothing was published.",
            center
        ),
        TallyError::KeyMismatch(center) => format!(
            "This private key does not belong to tally center {}; nothing was published.",
            center
        ),
        TallyError::SigningFailure(e) => format!("The result could not be signed ({}).", e),
        TallyError::Encoding(e) => format!("The result could not be encoded ({}).", e),
        TallyError::Store(e) => format!("Storage error: {}", e),
    }
}

pub fn tally_exit_code(e: &TallyError) -> i32 {
    match e {
        TallyError::UnknownTallyCenter(_) => 20,
        TallyError::KeyFormatError(_) => 21,
        TallyError::DecryptionFailure(_) => 22,
        TallyError::KeyMismatch(_) => 23,
        TallyError::SigningFailure(_) | TallyError::Encoding(_) | TallyError::Store(_) => 1,
    }
}
