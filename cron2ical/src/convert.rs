//! Converts a crontab into a calendar of one day's runs.

use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime, TimeZone};
use tracing::{debug, info};

use crate::crontab::{parse_line, FilterList};
use crate::error::{Error, Result};
use crate::expand::{expand, DayWindow};
use crate::ical::Calendar;

/// The calendar name used when none is given.
pub const DEFAULT_CALENDAR_NAME: &str = "Cron calendar";

/// Receives the progress lines of a conversion.
pub trait Report {
    fn report(&mut self, line: &str);
}

impl<F: FnMut(&str)> Report for F {
    #[inline]
    fn report(&mut self, line: &str) {
        self(line)
    }
}

/// The arguments of one conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    /// The crontab to read.
    pub crontab: PathBuf,
    /// Where to write the calendar. Its directory must already exist.
    pub ical: PathBuf,
    /// The day to expand, as `dd-mm-yyyy`.
    pub day: String,
    /// A file of substrings to strip from commands, one per line.
    pub command_filter: Option<PathBuf>,
    pub calendar_name: String,
    /// Labels event times with this time zone.
    pub tzid: Option<String>,
}

impl Job {
    pub fn new(crontab: impl Into<PathBuf>, ical: impl Into<PathBuf>, day: impl Into<String>) -> Self {
        Self {
            crontab: crontab.into(),
            ical: ical.into(),
            day: day.into(),
            command_filter: None,
            calendar_name: DEFAULT_CALENDAR_NAME.to_owned(),
            tzid: None,
        }
    }
}

/// The number of events written for one crontab line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryCount {
    pub line: usize,
    pub command: String,
    pub events: usize,
}

/// What a finished conversion wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub entries: Vec<EntryCount>,
    pub total_events: usize,
}

/// The directory a file would be written to. A bare file name is in the current directory.
fn output_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    }
}

/// `DTSTAMP` is the start of the day in UTC. Days starting in a gap of the local time zone
/// keep their local midnight.
fn stamp(window: &DayWindow) -> NaiveDateTime {
    Local
        .from_local_datetime(&window.start())
        .earliest()
        .map(|start| start.naive_utc())
        .unwrap_or_else(|| window.start())
}

/// Runs a conversion, sending progress lines to `report`.
///
/// Arguments are checked in order: the day, the crontab, the output directory and the
/// filter file. Any invalid line stops the conversion before the calendar is written.
pub fn run<R: Report + ?Sized>(job: &Job, report: &mut R) -> Result<Summary> {
    let window: DayWindow = job.day.parse()?;

    if !job.crontab.is_file() {
        return Err(Error::InvalidInputPath(job.crontab.clone()));
    }
    if !output_dir(&job.ical).is_dir() {
        return Err(Error::InvalidOutputPath(job.ical.clone()));
    }
    let file =
        File::open(&job.crontab).map_err(|_| Error::InvalidInputPath(job.crontab.clone()))?;
    let filters = match &job.command_filter {
        Some(path) => FilterList::from_file(path)?,
        None => FilterList::default(),
    };
    debug!(day = %window.day(), filters = filters.len(), "converting crontab");

    let mut calendar = Calendar::new(job.calendar_name.as_str(), stamp(&window));
    if let Some(tzid) = &job.tzid {
        calendar = calendar.with_tzid(tzid.as_str());
    }

    let mut entries = Vec::new();
    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();
    let mut number = 0;
    loop {
        buf.clear();
        let read = reader
            .read_until(b'\n', &mut buf)
            .map_err(|source| Error::Read {
                path: job.crontab.clone(),
                source,
            })?;
        if read == 0 {
            break;
        }
        number += 1;

        // crontabs aren't always UTF-8, commonly in comments
        let line = String::from_utf8_lossy(&buf);
        let entry = match parse_line(number, &line, &filters)? {
            Some(entry) => entry,
            None => continue,
        };

        let before = calendar.len();
        for occurrence in expand(entry.schedule(), entry.command(), &window) {
            calendar.add_event(occurrence.start, occurrence.end, occurrence.title);
        }
        let events = calendar.len() - before;
        debug!(line = number, expression = entry.expression(), events, "expanded entry");

        report.report(&format!("{:>5} events for {}", events, entry.command()));
        entries.push(EntryCount {
            line: number,
            command: entry.command().to_owned(),
            events,
        });
    }

    let total_events = calendar.len();
    report.report("Done! Saving file ...");
    fs::write(&job.ical, calendar.to_string()).map_err(|source| Error::Write {
        path: job.ical.clone(),
        source,
    })?;
    info!(path = %job.ical.display(), events = total_events, "saved calendar");
    report.report(&format!(
        "Saved {} events to {}!",
        total_events,
        job.ical.display()
    ));

    Ok(Summary {
        entries,
        total_events,
    })
}
