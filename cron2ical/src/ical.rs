//! A minimal RFC 5545 calendar writer for timed events.

use core::fmt::{self, Display, Formatter, Write};

use chrono::NaiveDateTime;

/// Content lines longer than this many octets are folded.
const MAX_LINE_OCTETS: usize = 75;

const DATE_TIME_FORMAT: &str = "%Y%m%dT%H%M%S";

/// The `PRODID` of every calendar we write.
pub const PRODID: &str = concat!("-//cron2ical//cron2ical ", env!("CARGO_PKG_VERSION"), "//EN");

/// A calendar event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub uid: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub summary: String,
}

/// A calendar document. Events are written in the order they were added.
///
/// # Example
/// ```
/// use chrono::NaiveDate;
/// use cron2ical::ical::Calendar;
///
/// let start = NaiveDate::from_ymd_opt(2024, 9, 2).unwrap().and_hms_opt(9, 0, 0).unwrap();
/// let mut calendar = Calendar::new("Cron calendar", start);
/// calendar.add_event(start, start + chrono::Duration::minutes(1), "backup.sh");
///
/// let text = calendar.to_string();
/// assert!(text.contains("DTSTART:20240902T090000\r\n"));
/// assert!(text.contains("SUMMARY:backup.sh\r\n"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Calendar {
    name: String,
    tzid: Option<String>,
    stamp: NaiveDateTime,
    events: Vec<Event>,
}

impl Calendar {
    /// Creates an empty calendar. `stamp` is the `DTSTAMP` of every event, in UTC.
    pub fn new(name: impl Into<String>, stamp: NaiveDateTime) -> Self {
        Self {
            name: name.into(),
            tzid: None,
            stamp,
            events: Vec::new(),
        }
    }

    /// Labels event times with a time zone instead of writing floating local times.
    pub fn with_tzid(mut self, tzid: impl Into<String>) -> Self {
        self.tzid = Some(tzid.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tzid(&self) -> Option<&str> {
        self.tzid.as_deref()
    }

    /// Adds an event. Its UID is made from its start time and position, so the same events
    /// always get the same UIDs.
    pub fn add_event(&mut self, start: NaiveDateTime, end: NaiveDateTime, summary: &str) {
        let uid = format!(
            "{}-{}@cron2ical",
            start.format(DATE_TIME_FORMAT),
            self.events.len() + 1
        );
        self.events.push(Event {
            uid,
            start,
            end,
            summary: summary.to_owned(),
        });
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    fn write_date_time<W: Write>(
        &self,
        out: &mut W,
        name: &str,
        time: NaiveDateTime,
    ) -> fmt::Result {
        let line = match &self.tzid {
            Some(tzid) => format!(
                "{};TZID={}:{}",
                name,
                escape_param_value(tzid),
                time.format(DATE_TIME_FORMAT)
            ),
            None => format!("{}:{}", name, time.format(DATE_TIME_FORMAT)),
        };
        write_folded(out, &line)
    }
}

impl Display for Calendar {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write_folded(f, "BEGIN:VCALENDAR")?;
        write_folded(f, "VERSION:2.0")?;
        write_folded(f, &format!("PRODID:{}", PRODID))?;
        write_folded(f, "CALSCALE:GREGORIAN")?;
        write_folded(f, &format!("X-WR-CALNAME:{}", escape_text(&self.name)))?;

        let stamp = format!("DTSTAMP:{}Z", self.stamp.format(DATE_TIME_FORMAT));
        for event in &self.events {
            write_folded(f, "BEGIN:VEVENT")?;
            write_folded(f, &format!("UID:{}", event.uid))?;
            write_folded(f, &stamp)?;
            self.write_date_time(f, "DTSTART", event.start)?;
            self.write_date_time(f, "DTEND", event.end)?;
            write_folded(f, &format!("SUMMARY:{}", escape_text(&event.summary)))?;
            write_folded(f, "END:VEVENT")?;
        }

        write_folded(f, "END:VCALENDAR")
    }
}

/// Writes a content line ending in CRLF, folding it so no line is longer than
/// [`MAX_LINE_OCTETS`]. Lines are only split between characters.
fn write_folded<W: Write>(out: &mut W, line: &str) -> fmt::Result {
    let mut rest = line;
    let mut limit = MAX_LINE_OCTETS;
    while rest.len() > limit {
        let mut split = limit;
        while !rest.is_char_boundary(split) {
            split -= 1;
        }
        out.write_str(&rest[..split])?;
        out.write_str("\r\n ")?;
        rest = &rest[split..];
        // continuation lines start with a space
        limit = MAX_LINE_OCTETS - 1;
    }
    out.write_str(rest)?;
    out.write_str("\r\n")
}

/// Escapes a TEXT value.
pub fn escape_text(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => result.push_str("\\\\"),
            ',' => result.push_str("\\,"),
            ';' => result.push_str("\\;"),
            '\n' => result.push_str("\\n"),
            '\r' => {}
            _ => result.push(c),
        }
    }
    result
}

/// Quotes a parameter value if it holds a delimiter. Quotes and control characters can't be
/// written in parameter values at all, so they're dropped.
fn escape_param_value(s: &str) -> String {
    let value: String = s.chars().filter(|&c| c != '"' && !c.is_control()).collect();
    if value.contains(|c: char| matches!(c, ':' | ';' | ',')) {
        format!("\"{}\"", value)
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn time(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 9, 2)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn calendar() -> Calendar {
        let stamp = NaiveDate::from_ymd_opt(2024, 9, 1)
            .unwrap()
            .and_hms_opt(22, 0, 0)
            .unwrap();
        Calendar::new("Cron calendar", stamp)
    }

    fn folded(line: &str) -> String {
        let mut out = String::new();
        write_folded(&mut out, line).unwrap();
        out
    }

    #[test]
    fn empty_calendar() {
        let expected = format!(
            "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:{}\r\nCALSCALE:GREGORIAN\r\n\
             X-WR-CALNAME:Cron calendar\r\nEND:VCALENDAR\r\n",
            PRODID
        );
        assert_eq!(calendar().to_string(), expected);
        assert!(calendar().is_empty());
    }

    #[test]
    fn events() {
        let mut calendar = calendar();
        calendar.add_event(time(9, 0), time(9, 1), "backup.sh");
        calendar.add_event(time(9, 0), time(9, 1), "report.sh; mail");

        let text = calendar.to_string();
        let first = "BEGIN:VEVENT\r\n\
                     UID:20240902T090000-1@cron2ical\r\n\
                     DTSTAMP:20240901T220000Z\r\n\
                     DTSTART:20240902T090000\r\n\
                     DTEND:20240902T090100\r\n\
                     SUMMARY:backup.sh\r\n\
                     END:VEVENT\r\n";
        assert!(text.contains(first), "{}", text);
        assert!(text.contains("UID:20240902T090000-2@cron2ical\r\n"));
        assert!(text.contains("SUMMARY:report.sh\\; mail\r\n"));
        assert_eq!(text.matches("BEGIN:VEVENT").count(), 2);
        assert_eq!(calendar.len(), 2);
        assert_eq!(calendar.name(), "Cron calendar");

        let events = calendar.events();
        assert_eq!(events[0].uid, "20240902T090000-1@cron2ical");
        assert_eq!(events[1].summary, "report.sh; mail");
        assert_eq!(events[1].end, time(9, 1));
    }

    #[test]
    fn time_zones() {
        let mut calendar = calendar().with_tzid("Europe/Berlin");
        calendar.add_event(time(23, 59), time(23, 59) + Duration::minutes(1), "late.sh");

        let text = calendar.to_string();
        assert!(text.contains("DTSTART;TZID=Europe/Berlin:20240902T235900\r\n"));
        assert!(text.contains("DTEND;TZID=Europe/Berlin:20240903T000000\r\n"));
        assert_eq!(calendar.tzid(), Some("Europe/Berlin"));
    }

    #[test]
    fn escaping() {
        assert_eq!(escape_text("a, b; c\\d\r\ne"), "a\\, b\\; c\\\\d\\ne");
        assert_eq!(escape_param_value("Europe/Berlin"), "Europe/Berlin");
        assert_eq!(escape_param_value("Custom;Zone"), "\"Custom;Zone\"");
        assert_eq!(escape_param_value("Bad\"Zone\n"), "BadZone");
    }

    #[test]
    fn short_lines_are_not_folded() {
        let line = "X".repeat(MAX_LINE_OCTETS);
        assert_eq!(folded(&line), format!("{}\r\n", line));
    }

    #[test]
    fn long_lines_are_folded() {
        let line = format!("SUMMARY:{}", "x".repeat(200));
        let out = folded(&line);

        for physical in out.split_terminator("\r\n") {
            assert!(physical.len() <= MAX_LINE_OCTETS, "{:?}", physical);
        }
        assert_eq!(out.replace("\r\n ", ""), format!("{}\r\n", line));
    }

    #[test]
    fn folding_keeps_characters_whole() {
        let line = format!("SUMMARY:{}", "é".repeat(100));
        let out = folded(&line);

        for physical in out.split_terminator("\r\n") {
            assert!(physical.len() <= MAX_LINE_OCTETS);
        }
        // the first line has 8 ASCII octets and then two octets per character
        assert!(out.starts_with(&format!("SUMMARY:{}\r\n ", "é".repeat(33))));
        assert_eq!(out.replace("\r\n ", ""), format!("{}\r\n", line));
    }
}
