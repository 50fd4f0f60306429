use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::schedule::CronParseError;

/// Everything that can stop a conversion. All of these are fatal.
#[derive(Debug, Error)]
pub enum Error {
    #[error("given date is invalid: {0:?} (expected dd-mm-yyyy)")]
    InvalidDate(String),

    #[error("given crontab file is not a file: {}", .0.display())]
    InvalidInputPath(PathBuf),

    #[error("given ical filename is in an invalid directory: {}", .0.display())]
    InvalidOutputPath(PathBuf),

    #[error("given command filter file is invalid: {}", .0.display())]
    InvalidFilterPath(PathBuf),

    #[error("line {line}: expected five schedule fields followed by a command: {text:?}")]
    MalformedLine { line: usize, text: String },

    #[error("line {line}: invalid schedule expression {expression:?}")]
    ScheduleExpression {
        line: usize,
        expression: String,
        #[source]
        source: CronParseError,
    },

    #[error("can't read crontab file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("can't write calendar to {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
