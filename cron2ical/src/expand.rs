//! Expands a schedule into its occurrences within one day.

use core::iter::FusedIterator;
use core::str::FromStr;

use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::error::Error;
use crate::schedule::Cron;

/// The format of day arguments, like `02-09-2024`.
pub const DAY_FORMAT: &str = "%d-%m-%Y";

/// A schedule that can be asked for its next occurrence.
///
/// Both methods must be monotonic: `next_from(t) >= t` and `next_after(t) > t`.
pub trait NextOccurrence {
    /// Returns the first occurrence at or after `start`.
    fn next_from(&self, start: NaiveDateTime) -> Option<NaiveDateTime>;

    /// Returns the first occurrence strictly after `start`.
    fn next_after(&self, start: NaiveDateTime) -> Option<NaiveDateTime>;
}

impl NextOccurrence for Cron {
    #[inline]
    fn next_from(&self, start: NaiveDateTime) -> Option<NaiveDateTime> {
        Cron::next_from(self, start)
    }

    #[inline]
    fn next_after(&self, start: NaiveDateTime) -> Option<NaiveDateTime> {
        Cron::next_after(self, start)
    }
}

impl<T: NextOccurrence + ?Sized> NextOccurrence for &T {
    #[inline]
    fn next_from(&self, start: NaiveDateTime) -> Option<NaiveDateTime> {
        (**self).next_from(start)
    }

    #[inline]
    fn next_after(&self, start: NaiveDateTime) -> Option<NaiveDateTime> {
        (**self).next_after(start)
    }
}

/// A single day, from midnight to the next midnight, exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DayWindow {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl DayWindow {
    /// Returns the window of the given day, or none if the next day can't be represented.
    pub fn for_day(day: NaiveDate) -> Option<Self> {
        Some(Self {
            start: day.and_hms_opt(0, 0, 0)?,
            end: day.succ_opt()?.and_hms_opt(0, 0, 0)?,
        })
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    pub fn day(&self) -> NaiveDate {
        self.start.date()
    }

    #[inline]
    pub fn contains(&self, time: NaiveDateTime) -> bool {
        self.start <= time && time < self.end
    }
}

impl FromStr for DayWindow {
    type Err = Error;

    /// Parses a `dd-mm-yyyy` day. Dates that don't exist, like `31-02-2024`, are rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(s.trim(), DAY_FORMAT)
            .ok()
            .and_then(Self::for_day)
            .ok_or_else(|| Error::InvalidDate(s.to_owned()))
    }
}

/// One run of a scheduled command. Each lasts a minute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occurrence<'a> {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub title: &'a str,
}

/// An iterator over the occurrences of a schedule within a day, in order.
#[derive(Debug)]
pub struct Occurrences<'a, S> {
    schedule: S,
    title: &'a str,
    end: NaiveDateTime,
    cursor: Option<NaiveDateTime>,
}

impl<S: Clone> Clone for Occurrences<'_, S> {
    fn clone(&self) -> Self {
        Self {
            schedule: self.schedule.clone(),
            ..*self
        }
    }
}

impl<'a, S: NextOccurrence> Iterator for Occurrences<'a, S> {
    type Item = Occurrence<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let start = self.cursor.take().filter(|&start| start < self.end)?;
        self.cursor = self.schedule.next_after(start);
        Some(Occurrence {
            start,
            end: start.checked_add_signed(Duration::minutes(1))?,
            title: self.title,
        })
    }
}

impl<S: NextOccurrence> FusedIterator for Occurrences<'_, S> {}

/// Returns every occurrence of the schedule in the window, titled `title`.
///
/// # Example
/// ```
/// use cron2ical::expand::{expand, DayWindow};
/// use cron2ical::schedule::Cron;
///
/// let cron: Cron = "0 9,17 * * *".parse().unwrap();
/// let day: DayWindow = "02-09-2024".parse().unwrap();
///
/// let starts: Vec<_> = expand(&cron, "backup.sh", &day)
///     .map(|occurrence| occurrence.start.format("%R").to_string())
///     .collect();
/// assert_eq!(starts, ["09:00", "17:00"]);
/// ```
pub fn expand<'a, S: NextOccurrence>(
    schedule: S,
    title: &'a str,
    window: &DayWindow,
) -> Occurrences<'a, S> {
    let cursor = schedule.next_from(window.start);
    Occurrences {
        schedule,
        title,
        end: window.end,
        cursor,
    }
}
