//! Turns a crontab into an iCalendar file listing every run on a given day.
//!
//! Each crontab line is split into its schedule and command ([`crontab`]), the schedule is
//! expanded into the minutes it fires within the day ([`expand`]), and each of those becomes a
//! one minute event titled with the command ([`ical`]). [`convert::run`] ties the steps
//! together.
//!
//! ```
//! use cron2ical::crontab::{parse_line, FilterList};
//! use cron2ical::expand::{expand, DayWindow};
//!
//! let filters = FilterList::new(vec!["sudo "]);
//! let entry = parse_line(1, "0 0 * * * sudo reboot", &filters).unwrap().unwrap();
//! let day: DayWindow = "02-09-2024".parse().unwrap();
//!
//! let occurrences: Vec<_> = expand(entry.schedule(), entry.command(), &day).collect();
//! assert_eq!(occurrences.len(), 1);
//! assert_eq!(occurrences[0].title, "reboot");
//! ```

pub mod convert;
pub mod crontab;
mod error;
pub mod expand;
pub mod ical;
pub mod schedule;

pub use self::error::{Error, Result};
pub use self::schedule::Cron;
