use crate::config::Config;
use crate::{exit_with, load_master_phrase, read_key};
use ballotbox::CastError;

pub fn command_cast(matches: &clap::ArgMatches, config: &Config) {
    let voter = matches.value_of("VOTER").unwrap_or_default();
    let private_key = read_key(matches.value_of("KEY-FILE").unwrap_or_default());
    let candidate = crate::parse_id(matches.value_of("CANDIDATE"), "candidate");
    let center = crate::parse_id(matches.value_of("TALLY-CENTER"), "tally center");

    let master_phrase = load_master_phrase(config);

    // The state lock spans load to save, so concurrent casts see each other's markers. A forged
    // marker may have been cleared even on failure, so the state is always saved.
    let outcome = config
        .update_store(|store| {
            ballotbox::cast_ballot(
                store,
                &master_phrase,
                voter,
                &private_key,
                candidate,
                center,
            )
        })
        .unwrap_or_else(|e| exit_with(1, &e));

    match outcome {
        Ok(()) => println!("Your ballot has been cast."),
        Err(e) => exit_with(cast_exit_code(&e), &describe(&e)),
    }
}

/// A message a voter can act on
pub fn describe(e: &CastError) -> String {
    match e {
        CastError::VotingClosed => {
            "Voting is closed: results have already been published.".to_owned()
        }
        CastError::UnknownVoter(voter) => format!("No voter is registered as {}.", voter),
        CastError::KeyFormatError(e) => format!("The private key file is not a valid key ({}).", e),
        CastError::PublicKeyCorrupted => {
            "The public key on file for this voter is corrupted; contact the election authority."
                .to_owned()
        }
        CastError::AlreadyVoted => "You have already voted.".to_owned(),
        CastError::InvalidPrivateKey => {
            "This private key does not belong to this voter.".to_owned()
        }
        CastError::UnknownTallyCenterOrBadKey(center) => format!(
            "Tally center {} does not exist or has an unusable public key.",
            center
        ),
        CastError::EncryptionFailure(e) => format!(
            "Encryption failed ({}); the master phrase may be too long for the voter keys.",
            e
        ),
        CastError::Store(e) => format!("Storage error: {}", e),
    }
}

pub fn cast_exit_code(e: &CastError) -> i32 {
    match e {
        CastError::VotingClosed => 10,
        CastError::UnknownVoter(_) => 11,
        CastError::KeyFormatError(_) => 12,
        CastError::PublicKeyCorrupted => 13,
        CastError::AlreadyVoted => 14,
        CastError::InvalidPrivateKey => 15,
        CastError::UnknownTallyCenterOrBadKey(_) => 16,
        CastError::EncryptionFailure(_) => 17,
        CastError::Store(_) => 1,
    }
}
