//! A crontab schedule evaluator.
//!
//! Expressions are matched against local wall-clock time ([`NaiveDateTime`]) with minute
//! precision. Each field is compiled into a bit-mask, so finding the next matching minute or
//! hour is a shift and a `trailing_zeros`.

pub mod parse;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Weekday};
use core::str::FromStr;

use self::parse::{CronExpr, DayOfMonthExpr, DayOfWeekExpr, Expr, Field, OrsExpr};
pub use self::parse::CronParseError;

/// How far ahead a search for the next matching time goes before giving up.
const SEARCH_YEARS: i32 = 400;

fn is_leap_year(year: i32) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

/// Returns the number of days in the month, 28-31
fn days_in_month(date: NaiveDate) -> u32 {
    match date.month() {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        _ if is_leap_year(date.year()) => 29,
        _ => 28,
    }
}

/// Returns the day of the month of the weekday closest to `day` in the month of `date`,
/// without leaving the month, or none if the month doesn't have that day.
fn nearest_weekday(date: NaiveDate, day: u32) -> Option<u32> {
    let last = days_in_month(date);
    let target = date.with_day(day)?;
    Some(match target.weekday() {
        Weekday::Sat if day == 1 => 3,
        Weekday::Sat => day - 1,
        Weekday::Sun if day == last => day - 2,
        Weekday::Sun => day + 1,
        _ => day,
    })
}

/// Sets a bit for every value the expressions cover.
fn ors_bits(exprs: Vec<OrsExpr>, field: &Field) -> u64 {
    exprs.into_iter().fold(0, |bits, expr| {
        let (start, end, step) = match expr {
            OrsExpr::One(value) => (value, value, 1),
            OrsExpr::Range(start, end) => (start, end, 1),
            OrsExpr::Step { start, end, step } => (start, end, step),
        };
        let step = usize::from(step);
        if start <= end {
            (start..=end)
                .step_by(step)
                .fold(bits, |bits, value| bits | (1u64 << value))
        } else {
            // ranges like FRI-MON wrap around the end of the field
            (start..=field.wraps_after)
                .chain(field.min..=end)
                .step_by(step)
                .fold(bits, |bits, value| bits | (1u64 << value))
        }
    })
}

/// Finds the first set bit at or above `from`.
macro_rules! next_set {
    ($bits:expr, $from:expr) => {{
        let bits = $bits;
        let from = $from;
        bits.checked_shr(from)
            .map(|shifted| shifted << from)
            .filter(|&cleared| cleared != 0)
            .map(|cleared| cleared.trailing_zeros())
    }};
}

trait TimePattern {
    /// A parsed time expression value
    type Expr;

    /// Compiles the expression into its most compressed form.
    fn compile(expr: Self::Expr) -> Self;
}

/// A bit-mask of all minutes in an hour set in a cron expression.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
struct Minutes(u64);
impl TimePattern for Minutes {
    type Expr = Expr;

    fn compile(expr: Expr) -> Self {
        match expr {
            Expr::All => Self(Self::ALL),
            Expr::Many(exprs) => Self(ors_bits(exprs, &parse::MINUTE)),
        }
    }
}
impl Minutes {
    const ALL: u64 = 0x0FFF_FFFF_FFFF_FFFF;

    #[inline]
    fn contains(self, minute: u32) -> bool {
        self.0 & (1 << minute) != 0
    }

    #[inline]
    fn next(self, from: u32) -> Option<u32> {
        next_set!(self.0, from)
    }
}

/// A bit-mask of all hours in a day set in a cron expression.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
struct Hours(u32);
impl TimePattern for Hours {
    type Expr = Expr;

    fn compile(expr: Expr) -> Self {
        match expr {
            Expr::All => Self(Self::ALL),
            Expr::Many(exprs) => Self(ors_bits(exprs, &parse::HOUR) as u32),
        }
    }
}
impl Hours {
    const ALL: u32 = 0x00FF_FFFF;

    #[inline]
    fn contains(self, hour: u32) -> bool {
        self.0 & (1 << hour) != 0
    }

    #[inline]
    fn next(self, from: u32) -> Option<u32> {
        next_set!(self.0, from)
    }
}

/// A bit-mask of all the months set in a cron expression. Bit 1 is January.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
struct Months(u16);
impl TimePattern for Months {
    type Expr = Expr;

    fn compile(expr: Expr) -> Self {
        match expr {
            Expr::All => Self(Self::ALL),
            Expr::Many(exprs) => Self(ors_bits(exprs, &parse::MONTH) as u16),
        }
    }
}
impl Months {
    const ALL: u16 = 0b1_1111_1111_1110;
    const LONG: u16 = 1 << 1 | 1 << 3 | 1 << 5 | 1 << 7 | 1 << 8 | 1 << 10 | 1 << 12;
    const THIRTY_DAYS: u16 = 1 << 4 | 1 << 6 | 1 << 9 | 1 << 11;

    #[inline]
    fn contains(self, month: u32) -> bool {
        self.0 & (1 << month) != 0
    }

    /// The length of the longest month set
    fn longest(self) -> u32 {
        if self.0 & Self::LONG != 0 {
            31
        } else if self.0 & Self::THIRTY_DAYS != 0 {
            30
        } else {
            29
        }
    }

    /// Returns the first day of the next matching month after the month of `date`.
    fn next_after(self, date: NaiveDate) -> Option<NaiveDate> {
        match next_set!(self.0, date.month() + 1) {
            Some(month) => NaiveDate::from_ymd_opt(date.year(), month, 1),
            None => NaiveDate::from_ymd_opt(date.year() + 1, next_set!(self.0, 1)?, 1),
        }
    }
}

/// The days of the month set in a cron expression.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
enum DaysOfMonth {
    /// A '*' expression
    Star,
    /// A bit-mask of days, bit 1 is the first of the month
    Pattern(u32),
    /// 'L'
    Last,
    /// 'LW'
    LastWeekday,
    /// A 'W' expression paired with its day
    ClosestWeekday(u32),
}
impl TimePattern for DaysOfMonth {
    type Expr = DayOfMonthExpr;

    fn compile(expr: DayOfMonthExpr) -> Self {
        match expr {
            DayOfMonthExpr::All => Self::Star,
            DayOfMonthExpr::Last => Self::Last,
            DayOfMonthExpr::LastWeekday => Self::LastWeekday,
            DayOfMonthExpr::ClosestWeekday(day) => Self::ClosestWeekday(u32::from(day)),
            DayOfMonthExpr::Many(exprs) => {
                Self::Pattern(ors_bits(exprs, &parse::DAY_OF_MONTH) as u32)
            }
        }
    }
}
impl DaysOfMonth {
    fn is_star(self) -> bool {
        matches!(self, Self::Star)
    }

    fn contains(self, date: NaiveDate) -> bool {
        match self {
            Self::Star => true,
            Self::Pattern(bits) => bits & (1 << date.day()) != 0,
            Self::Last => date.day() == days_in_month(date),
            Self::LastWeekday => nearest_weekday(date, days_in_month(date)) == Some(date.day()),
            Self::ClosestWeekday(day) => nearest_weekday(date, day) == Some(date.day()),
        }
    }
}

/// The days of the week set in a cron expression.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
enum DaysOfWeek {
    /// A '*' expression
    Star,
    /// A bit-mask of days, bit 0 is Sunday
    Pattern(u8),
    /// A day paired with 'L'
    Last(Weekday),
    /// A day paired with its '#' value
    Nth(Weekday, u8),
}
impl TimePattern for DaysOfWeek {
    type Expr = DayOfWeekExpr;

    fn compile(expr: DayOfWeekExpr) -> Self {
        match expr {
            DayOfWeekExpr::All => Self::Star,
            DayOfWeekExpr::Last(day) => Self::Last(day),
            DayOfWeekExpr::Nth(day, nth) => Self::Nth(day, nth),
            DayOfWeekExpr::Many(exprs) => {
                let bits = ors_bits(exprs, &parse::DAY_OF_WEEK) as u8;
                // 7 is another name for Sunday
                Self::Pattern((bits | bits >> 7) & 0b0111_1111)
            }
        }
    }
}
impl DaysOfWeek {
    fn is_star(self) -> bool {
        matches!(self, Self::Star)
    }

    fn contains(self, date: NaiveDate) -> bool {
        match self {
            Self::Star => true,
            Self::Pattern(bits) => bits & (1 << date.weekday().num_days_from_sunday()) != 0,
            Self::Last(day) => date.weekday() == day && date.day() + 7 > days_in_month(date),
            Self::Nth(day, nth) => date.weekday() == day && date.day0() / 7 + 1 == u32::from(nth),
        }
    }
}

/// A compiled crontab schedule. This can be used to check if a given time matches or to find
/// the next matching time.
///
/// # Example
/// ```
/// use chrono::NaiveDate;
/// use cron2ical::schedule::Cron;
///
/// let cron: Cron = "*/10 0 * OCT MON".parse().expect("Couldn't parse expression!");
///
/// // check if a given time is contained in an expression
/// let monday = NaiveDate::from_ymd_opt(2020, 10, 19).unwrap();
/// assert!(cron.contains(monday.and_hms_opt(0, 30, 0).unwrap()));
///
/// // find the next matching time
/// let next = cron.next_after(monday.and_hms_opt(0, 30, 0).unwrap());
/// assert_eq!(next, monday.and_hms_opt(0, 40, 0));
/// ```
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub struct Cron {
    minutes: Minutes,
    hours: Hours,
    dom: DaysOfMonth,
    months: Months,
    dow: DaysOfWeek,
}

impl FromStr for Cron {
    type Err = CronParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Cron::new)
    }
}

impl Cron {
    /// Simplifies the cron expression into a cron value.
    pub fn new(expr: CronExpr) -> Self {
        Self {
            minutes: TimePattern::compile(expr.minutes),
            hours: TimePattern::compile(expr.hours),
            dom: TimePattern::compile(expr.doms),
            months: TimePattern::compile(expr.months),
            dow: TimePattern::compile(expr.dows),
        }
    }

    /// Returns whether this cron value will ever match any given time.
    ///
    /// Some values can never match. If a value only matches days of the month that are beyond
    /// the length of every month it matches, it never matches.
    ///
    /// # Example
    /// ```
    /// use cron2ical::schedule::Cron;
    ///
    /// // February has a 29th day on leap years
    /// assert!("* * 29 2 *".parse::<Cron>().unwrap().any());
    ///
    /// // November does not have a 31st day
    /// assert!(!"* * 31 11 *".parse::<Cron>().unwrap().any());
    /// ```
    pub fn any(&self) -> bool {
        if !self.dow.is_star() {
            return true;
        }

        match self.dom {
            DaysOfMonth::Pattern(bits) => bits.trailing_zeros() <= self.months.longest(),
            DaysOfMonth::ClosestWeekday(day) => day <= self.months.longest(),
            _ => true,
        }
    }

    /// Returns whether this cron value matches the given time. Seconds are ignored.
    pub fn contains(&self, dt: NaiveDateTime) -> bool {
        self.minutes.contains(dt.minute())
            && self.hours.contains(dt.hour())
            && self.contains_date(dt.date())
    }

    /// Checks the month and both day fields. When both day fields are restricted, a day
    /// matching either one matches.
    fn contains_date(&self, date: NaiveDate) -> bool {
        if !self.months.contains(date.month()) {
            return false;
        }

        match (self.dom.is_star(), self.dow.is_star()) {
            (true, true) => true,
            (true, false) => self.dow.contains(date),
            (false, true) => self.dom.contains(date),
            (false, false) => self.dow.contains(date) || self.dom.contains(date),
        }
    }

    /// Returns the next time the cron will match including the given time.
    ///
    /// # Example
    /// ```
    /// use chrono::NaiveDate;
    /// use cron2ical::schedule::Cron;
    ///
    /// let cron = "*/10 * * * *".parse::<Cron>().unwrap();
    /// let time = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
    /// // the given time matches the expression, so we get the same time back
    /// assert_eq!(cron.next_from(time), Some(time));
    /// ```
    pub fn next_from(&self, start: NaiveDateTime) -> Option<NaiveDateTime> {
        self.find_next(minute_floor(start)?)
    }

    /// Returns the next time the cron will match after the given time.
    pub fn next_after(&self, start: NaiveDateTime) -> Option<NaiveDateTime> {
        let start = minute_floor(start)?.checked_add_signed(Duration::minutes(1))?;
        self.find_next(start)
    }

    /// Finds the next (current inclusive) matching time, or none if nothing matches in the
    /// next [`SEARCH_YEARS`] years.
    fn find_next(&self, start: NaiveDateTime) -> Option<NaiveDateTime> {
        if !self.any() {
            return None;
        }

        let midnight = NaiveTime::from_hms_opt(0, 0, 0)?;
        let limit = start.year().checked_add(SEARCH_YEARS)?;
        let mut date = start.date();
        let mut from = start.time();
        while date.year() <= limit {
            if !self.months.contains(date.month()) {
                date = self.months.next_after(date)?;
                from = midnight;
                continue;
            }

            if self.contains_date(date) {
                if let Some(time) = self.find_next_time(from) {
                    return Some(date.and_time(time));
                }
            }

            date = date.succ_opt()?;
            from = midnight;
        }

        None
    }

    /// Finds the next matching time of day (current inclusive), or none if no time later in
    /// the day matches.
    fn find_next_time(&self, start: NaiveTime) -> Option<NaiveTime> {
        let hour = start.hour();
        if self.hours.contains(hour) {
            if let Some(minute) = self.minutes.next(start.minute()) {
                return NaiveTime::from_hms_opt(hour, minute, 0);
            }
        }

        let hour = self.hours.next(hour + 1)?;
        let minute = self.minutes.next(0)?;
        NaiveTime::from_hms_opt(hour, minute, 0)
    }
}

#[inline]
fn minute_floor(dt: NaiveDateTime) -> Option<NaiveDateTime> {
    dt.with_second(0)?.with_nanosecond(0)
}
