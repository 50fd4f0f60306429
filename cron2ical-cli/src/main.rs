use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use cron2ical::convert::{self, Job, DEFAULT_CALENDAR_NAME};
use tracing_subscriber::EnvFilter;

/// Writes every run of a crontab on one day to an iCalendar file.
#[derive(Debug, Parser)]
#[command(name = "cron2ical", version, about)]
struct Args {
    /// The crontab to read
    crontab: PathBuf,

    /// The calendar file to write. Its directory must exist.
    ical: PathBuf,

    /// The day to expand, as dd-mm-yyyy
    day: String,

    /// A file of substrings to remove from commands, one per line
    command_filter: Option<PathBuf>,

    /// Label event times with this time zone, like Europe/Berlin
    #[arg(long, value_name = "NAME")]
    tzid: Option<String>,

    /// The calendar's display name
    #[arg(long, value_name = "NAME", default_value = DEFAULT_CALENDAR_NAME)]
    name: String,

    /// Log more, once for info and twice for debug. RUST_LOG overrides this.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    let job = Job {
        crontab: args.crontab,
        ical: args.ical,
        day: args.day,
        command_filter: args.command_filter,
        calendar_name: args.name,
        tzid: args.tzid,
    };

    match convert::run(&job, &mut |line: &str| println!("{}", line)) {
        Ok(summary) => {
            tracing::debug!(entries = summary.entries.len(), "finished");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}
