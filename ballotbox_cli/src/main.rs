use ballotbox::MasterPhrase;
use clap::{App, AppSettings, Arg, SubCommand};
use config::Config;
use log::{debug, LevelFilter};
use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::config::{Appender, Config as LogConfig, Root};
use log4rs::encode::pattern::PatternEncoder;

mod command_cast;
mod command_list;
mod command_results;
mod command_tally;
mod config;

fn main() {
    let matches = App::new("ballotbox")
        .version("0.1")
        .about("Casts encrypted ballots, tallies tally centers and verifies published results")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .arg(
            Arg::with_name("v")
                .short("v")
                .multiple(true)
                .help("Sets the level of verbosity"),
        )
        .arg(
            Arg::with_name("state")
                .long("state")
                .takes_value(true)
                .help("State file - can also be set with BALLOTBOX_STATE_PATH"),
        )
        .arg(
            Arg::with_name("master-phrase")
                .long("master-phrase")
                .takes_value(true)
                .help("Master phrase file - can also be set with BALLOTBOX_MASTER_PHRASE_FILE"),
        )
        .subcommand(
            SubCommand::with_name("cast")
                .about("Cast a ballot")
                .arg(Arg::with_name("VOTER").index(1).required(true).help("Voter identity"))
                .arg(
                    Arg::with_name("KEY-FILE")
                        .index(2)
                        .required(true)
                        .help("The voter's PEM private key"),
                )
                .arg(Arg::with_name("CANDIDATE").index(3).required(true).help("Candidate id"))
                .arg(
                    Arg::with_name("TALLY-CENTER")
                        .index(4)
                        .required(true)
                        .help("Tally center id"),
                ),
        )
        .subcommand(
            SubCommand::with_name("tally")
                .about("Decrypt, count and publish the signed result of a tally center")
                .arg(
                    Arg::with_name("TALLY-CENTER")
                        .index(1)
                        .required(true)
                        .help("Tally center id"),
                )
                .arg(
                    Arg::with_name("KEY-FILE")
                        .index(2)
                        .required(true)
                        .help("The tally center's PEM private key"),
                ),
        )
        .subcommand(
            SubCommand::with_name("results")
                .about("Verify every published result and show the counts")
                .arg(
                    Arg::with_name("json")
                        .long("json")
                        .help("Print the verified results as JSON"),
                ),
        )
        .subcommand(SubCommand::with_name("centers").about("List tally centers"))
        .subcommand(SubCommand::with_name("candidates").about("List candidates"))
        .get_matches();

    let level = match matches.occurrences_of("v") {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    if let Err(e) = init_logging(level) {
        eprintln!("ballotbox: unable to initialise logging: {}", e);
    }

    let config = Config::from_env().with_overrides(&matches);
    debug!("state file: {}", config.state_path.display());

    match matches.subcommand() {
        ("cast", Some(matches)) => command_cast::command_cast(matches, &config),
        ("tally", Some(matches)) => command_tally::command_tally(matches, &config),
        ("results", Some(matches)) => command_results::command_results(matches, &config),
        ("centers", Some(_)) => command_list::command_centers(&config),
        ("candidates", Some(_)) => command_list::command_candidates(&config),
        _ => {}
    }
}

fn init_logging(level: LevelFilter) -> Result<(), Box<dyn std::error::Error>> {
    let stderr = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new("{l:<5} {m}{n}")))
        .build();
    let config = LogConfig::builder()
        .appender(Appender::builder().build("stderr", Box::new(stderr)))
        .build(Root::builder().appender("stderr").build(level))?;
    log4rs::init_config(config)?;
    Ok(())
}

/// Print a message to stderr and exit with the given code
pub fn exit_with(code: i32, message: &str) -> ! {
    eprintln!("ballotbox: {}", message);
    std::process::exit(code);
}

pub fn read_key(path: &str) -> Vec<u8> {
    let path = config::expand(path);
    std::fs::read(&path).unwrap_or_else(|e| {
        exit_with(
            1,
            &format!("unable to read key file {}: {}", path.display(), e),
        )
    })
}

/// Candidate and tally center ids are both plain integers
pub fn parse_id(value: Option<&str>, what: &str) -> u32 {
    let value = value.unwrap_or_default();
    value
        .parse()
        .unwrap_or_else(|_| exit_with(1, &format!("invalid {} id: {}", what, value)))
}

pub fn load_master_phrase(config: &Config) -> MasterPhrase {
    MasterPhrase::from_file(&config.master_phrase_path)
        .unwrap_or_else(|e| exit_with(1, &e.to_string()))
}
