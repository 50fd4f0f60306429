//! Crontab lines and the command filter list.

use std::fs;
use std::path::Path;

use nom::{
    bytes::complete::take_till,
    character::complete::char,
    combinator::recognize,
    sequence::{terminated, tuple},
    IResult,
};
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::schedule::Cron;

/// Lines this short can't hold five fields and a command.
const MIN_LINE_LEN: usize = 10;

/// Substrings stripped out of every command before it becomes an event title.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterList(Vec<String>);

impl FilterList {
    /// Creates a filter list, dropping empty filters.
    pub fn new<I, S>(filters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(
            filters
                .into_iter()
                .map(Into::into)
                .filter(|filter: &String| !filter.is_empty())
                .collect(),
        )
    }

    /// Loads a filter list with one filter per line. Only line terminators are stripped, so a
    /// filter like `sudo ` keeps its trailing space.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::InvalidFilterPath(path.to_owned()));
        }
        let contents =
            fs::read_to_string(path).map_err(|_| Error::InvalidFilterPath(path.to_owned()))?;
        Ok(Self::new(contents.lines()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Removes every filter from the command until none of them occur, then trims it.
    pub fn apply(&self, command: &str) -> String {
        let mut command = command.to_owned();
        while let Some(filter) = self.iter().find(|filter| command.contains(filter)) {
            command = command.replace(filter, "");
        }
        command.trim().to_owned()
    }
}

/// One schedule line of a crontab.
#[derive(Debug, Clone)]
pub struct CrontabEntry {
    expression: String,
    schedule: Cron,
    command: String,
}

impl CrontabEntry {
    /// The schedule text as written in the crontab.
    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn schedule(&self) -> &Cron {
        &self.schedule
    }

    /// The filtered command, used as the event title.
    pub fn command(&self) -> &str {
        &self.command
    }
}

fn field(input: &str) -> IResult<&str, &str> {
    terminated(take_till(|c: char| c == ' '), char(' '))(input)
}

/// Splits a line at its fifth space. Returns the command and the schedule with that space.
fn schedule_fields(input: &str) -> IResult<&str, &str> {
    recognize(tuple((field, field, field, field, field)))(input)
}

/// `NAME=value` settings, like `MAILTO=ops@example.com`.
fn is_assignment(line: &str) -> bool {
    match line.split_once('=') {
        Some((name, _)) => {
            !name.is_empty()
                && !name.starts_with(|c: char| c.is_ascii_digit())
                && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    }
}

fn compile(number: usize, expression: &str) -> Result<Cron> {
    expression
        .parse()
        .map_err(|source| Error::ScheduleExpression {
            line: number,
            expression: expression.to_owned(),
            source,
        })
}

/// Parses line `number` (1-based) of a crontab.
///
/// Returns `None` for lines that hold no schedule: blank and short lines, comments, variable
/// assignments and `@reboot`.
pub fn parse_line(number: usize, raw: &str, filters: &FilterList) -> Result<Option<CrontabEntry>> {
    let line = raw.trim_matches(|c: char| matches!(c, ' ' | '\t' | '\r' | '\n'));
    if line.chars().count() <= MIN_LINE_LEN || line.starts_with('#') || is_assignment(line) {
        trace!(line = number, "skipping line");
        return Ok(None);
    }

    let (expression, command) = if line.starts_with('@') {
        let (nickname, command) = line
            .split_once(|c: char| c == ' ' || c == '\t')
            .ok_or_else(|| Error::MalformedLine {
                line: number,
                text: line.to_owned(),
            })?;
        if nickname.eq_ignore_ascii_case("@reboot") {
            debug!(line = number, "skipping @reboot entry");
            return Ok(None);
        }
        (nickname, command)
    } else {
        let (command, fields) = schedule_fields(line).map_err(|_| Error::MalformedLine {
            line: number,
            text: line.to_owned(),
        })?;
        (&fields[..fields.len() - 1], command)
    };

    let schedule = compile(number, expression)?;
    let command = filters.apply(command);
    debug!(line = number, expression, command = %command, "parsed crontab entry");

    Ok(Some(CrontabEntry {
        expression: expression.to_owned(),
        schedule,
        command,
    }))
}
