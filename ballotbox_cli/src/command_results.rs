use crate::config::Config;
use crate::exit_with;
use ballotbox::{Results, Verification, VerifyError};

pub fn command_results(matches: &clap::ArgMatches, config: &Config) {
    let store = config.load_store().unwrap_or_else(|e| exit_with(1, &e));

    match ballotbox::verify_and_collect(&store) {
        Ok(Verification::Complete(results)) => {
            if matches.is_present("json") {
                match serde_json::to_string_pretty(&results) {
                    Ok(json) => println!("{}", json),
                    Err(e) => exit_with(1, &e.to_string()),
                }
            } else {
                print!("{}", render(&results));
            }
        }
        Ok(Verification::Incomplete { missing }) => {
            let missing: Vec<String> = missing.iter().map(|id| id.to_string()).collect();
            exit_with(
                2,
                &format!(
                    "Results are not available yet: waiting on tally centers {}.",
                    missing.join(", ")
                ),
            );
        }
        Err(e) => exit_with(verify_exit_code(&e), &describe(&e)),
    }
}

/// Per-center counts followed by the totals
pub fn render(results: &Results) -> String {
    let mut out = String::new();
    for center in &results.centers {
        out.push_str(&format!("{}\n", center.center_name));
        for count in &center.counts {
            out.push_str(&format!("{}\n", count));
        }
        out.push('\n');
    }
    out.push_str("Total votes:\n");
    for count in &results.totals {
        out.push_str(&format!("{}\n", count));
    }
    out
}

pub fn describe(e: &VerifyError) -> String {
    match e {
        VerifyError::DuplicateResult(center) => format!(
            "Tally center {} published more than one result; the results cannot be trusted.",
            center
        ),
        VerifyError::Tampered(center) => format!(
            "The result of tally center {} does not match its signature: \
             it has been tampered with.",
            center
        ),
        VerifyError::MalformedResult(center, e) => format!(
            "Tally center {} signed a result that cannot be read ({}).",
            center, e
        ),
        VerifyError::CountOverflow(center) => format!(
            "The counts signed by tally center {} are too large to add up.",
            center
        ),
        VerifyError::Store(e) => format!("Storage error: {}", e),
    }
}

pub fn verify_exit_code(e: &VerifyError) -> i32 {
    match e {
        VerifyError::DuplicateResult(_) => 30,
        VerifyError::Tampered(_) => 31,
        VerifyError::MalformedResult(..) => 32,
        VerifyError::CountOverflow(_) => 33,
        VerifyError::Store(_) => 1,
    }
}
