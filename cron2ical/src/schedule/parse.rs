//! Parsers for five-field crontab schedule expressions.
//!
//! Fields are minute (0-59), hour (0-23), day of the month (1-31), month (1-12 or `JAN`-`DEC`)
//! and day of the week (0-7 or `SUN`-`SAT`, where both 0 and 7 are Sunday). The parsed
//! [`CronExpr`] keeps the expression as written; [`Cron`](super::Cron) compiles it into
//! bit-masks.

use chrono::Weekday;
use core::fmt::{self, Display, Formatter};
use core::str::FromStr;
use nom::{
    branch::alt,
    bytes::complete::{tag_no_case, take_while_m_n},
    character::complete::{char, digit1, space1},
    combinator::{all_consuming, cut, map, map_res, not, opt},
    multi::separated_nonempty_list,
    sequence::{preceded, separated_pair, terminated, tuple},
    IResult,
};

/// An error returned if an expression value is out of range of its field.
#[derive(Debug)]
pub struct ValueOutOfRangeError;

impl Display for ValueOutOfRangeError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        "The expression value is out range of valid values".fmt(f)
    }
}

impl std::error::Error for ValueOutOfRangeError {}

/// An error indicating that the provided cron expression failed to parse
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CronParseError(());

impl Display for CronParseError {
    #[inline]
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        "Failed to parse cron expression".fmt(f)
    }
}

impl std::error::Error for CronParseError {}

/// The bounds and names of one field of an expression.
#[derive(Debug)]
pub(crate) struct Field {
    pub(crate) min: u8,
    pub(crate) max: u8,
    /// The last value before a wrapping range starts again at `min`.
    pub(crate) wraps_after: u8,
    names: &'static [&'static str],
}

impl Field {
    #[inline]
    fn contains(&self, value: u8) -> bool {
        value >= self.min && value <= self.max
    }

    fn lookup(&self, name: &str) -> Option<u8> {
        self.names
            .iter()
            .position(|candidate| candidate.eq_ignore_ascii_case(name))
            .map(|index| index as u8 + self.min)
    }
}

pub(crate) static MINUTE: Field = Field {
    min: 0,
    max: 59,
    wraps_after: 59,
    names: &[],
};

pub(crate) static HOUR: Field = Field {
    min: 0,
    max: 23,
    wraps_after: 23,
    names: &[],
};

pub(crate) static DAY_OF_MONTH: Field = Field {
    min: 1,
    max: 31,
    wraps_after: 31,
    names: &[],
};

pub(crate) static MONTH: Field = Field {
    min: 1,
    max: 12,
    wraps_after: 12,
    names: &[
        "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
    ],
};

pub(crate) static DAY_OF_WEEK: Field = Field {
    min: 0,
    max: 7,
    // 7 is Sunday again
    wraps_after: 6,
    names: &["SUN", "MON", "TUE", "WED", "THU", "FRI", "SAT"],
};

static NTH_DAY: Field = Field {
    min: 1,
    max: 5,
    wraps_after: 5,
    names: &[],
};

/// Either one value, a range, or a step expression
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrsExpr {
    /// One value
    One(u8),
    /// A '-' character. The start may be greater than the end, in which case the range wraps
    /// around the end of the field.
    Range(u8, u8),
    /// A '/' character.
    Step {
        /// The start value. If the start value is '*', this is the min value of the field.
        start: u8,
        /// The end value. If the step expression does not specify one, this is the max value
        /// of the field.
        end: u8,
        /// The step value.
        step: u8,
    },
}

/// A generic expression that can take a '*' or many exprs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// A '*' character
    All,
    /// One or more values, ranges, or steps
    Many(Vec<OrsExpr>),
}

/// A day of the month expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DayOfMonthExpr {
    /// A '*' or '?' character
    All,
    /// An `L`, the last day of the month
    Last,
    /// An `LW`, the last weekday of the month
    LastWeekday,
    /// A 'W' expression, the weekday closest to the given day without leaving the month
    ClosestWeekday(u8),
    /// One or more values, ranges, or steps
    Many(Vec<OrsExpr>),
}

/// A day of the week expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DayOfWeekExpr {
    /// A '*' or '?' character
    All,
    /// A day followed by `L`, the last such day of the month
    Last(Weekday),
    /// A '#' expression, the nth such day of the month
    Nth(Weekday, u8),
    /// One or more values, ranges, or steps. Sunday may appear as 0 or 7.
    Many(Vec<OrsExpr>),
}

/// A parsed cron expression. This can be reduced into a [`Cron`](super::Cron) value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CronExpr {
    /// The minute part of the expression
    pub minutes: Expr,
    /// The hour part of the expression
    pub hours: Expr,
    /// The day of the month part of the expression
    pub doms: DayOfMonthExpr,
    /// The month part of the expression
    pub months: Expr,
    /// The day of the week part of the expression.
    pub dows: DayOfWeekExpr,
}

/// Nicknames accepted in place of the five fields.
const NICKNAMES: &[(&str, &str)] = &[
    ("@yearly", "0 0 1 1 *"),
    ("@annually", "0 0 1 1 *"),
    ("@monthly", "0 0 1 * *"),
    ("@weekly", "0 0 * * 0"),
    ("@daily", "0 0 * * *"),
    ("@midnight", "0 0 * * *"),
    ("@hourly", "0 * * * *"),
];

fn value(field: &'static Field) -> impl Fn(&str) -> IResult<&str, u8> {
    move |input: &str| {
        alt((
            map_res(digit1, move |digits: &str| {
                digits
                    .parse::<u8>()
                    .ok()
                    .filter(|&value| field.contains(value))
                    .ok_or(ValueOutOfRangeError)
            }),
            map_res(
                take_while_m_n(3, 3, |c: char| c.is_ascii_alphabetic()),
                move |name: &str| field.lookup(name).ok_or(ValueOutOfRangeError),
            ),
        ))(input)
    }
}

/// A step can't be zero and can't be wider than the field itself.
fn step(field: &'static Field) -> impl Fn(&str) -> IResult<&str, u8> {
    move |input: &str| {
        map_res(digit1, move |digits: &str| {
            digits
                .parse::<u8>()
                .ok()
                .filter(|&step| step >= 1 && step <= field.max - field.min)
                .ok_or(ValueOutOfRangeError)
        })(input)
    }
}

/// A '*' that isn't the start of a step expression.
fn star(input: &str) -> IResult<&str, char> {
    terminated(char('*'), not(char('/')))(input)
}

/// A parser that can parse a single value, a range of values, or a step expression
fn ors_expr(field: &'static Field) -> impl Fn(&str) -> IResult<&str, OrsExpr> {
    move |input: &str| {
        let (input, star) = opt(char('*'))(input)?;
        if star.is_some() {
            let (input, step) = preceded(char('/'), step(field))(input)?;
            return Ok((
                input,
                OrsExpr::Step {
                    start: field.min,
                    end: field.max,
                    step,
                },
            ));
        }

        let (input, start) = value(field)(input)?;
        let (input, end) = opt(preceded(char('-'), cut(value(field))))(input)?;
        let (input, step) = opt(preceded(char('/'), cut(step(field))))(input)?;

        let expr = match (end, step) {
            (None, None) => OrsExpr::One(start),
            (Some(end), None) => OrsExpr::Range(start, end),
            (end, Some(step)) => OrsExpr::Step {
                start,
                end: end.unwrap_or(field.max),
                step,
            },
        };
        Ok((input, expr))
    }
}

fn ors_exprs(field: &'static Field) -> impl Fn(&str) -> IResult<&str, Vec<OrsExpr>> {
    move |input: &str| separated_nonempty_list(char(','), ors_expr(field))(input)
}

/// A parser for fields without any special characters.
fn expr(field: &'static Field) -> impl Fn(&str) -> IResult<&str, Expr> {
    move |input: &str| {
        alt((
            map(star, |_| Expr::All),
            map(ors_exprs(field), Expr::Many),
        ))(input)
    }
}

#[inline]
fn minutes_expr(s: &str) -> IResult<&str, Expr> {
    expr(&MINUTE)(s)
}

#[inline]
fn hours_expr(s: &str) -> IResult<&str, Expr> {
    expr(&HOUR)(s)
}

#[inline]
fn months_expr(s: &str) -> IResult<&str, Expr> {
    expr(&MONTH)(s)
}

fn dom_expr(input: &str) -> IResult<&str, DayOfMonthExpr> {
    alt((
        map(tag_no_case("LW"), |_| DayOfMonthExpr::LastWeekday),
        map(tag_no_case("L"), |_| DayOfMonthExpr::Last),
        map(
            terminated(value(&DAY_OF_MONTH), tag_no_case("W")),
            DayOfMonthExpr::ClosestWeekday,
        ),
        map(alt((char('?'), star)), |_| DayOfMonthExpr::All),
        map(ors_exprs(&DAY_OF_MONTH), DayOfMonthExpr::Many),
    ))(input)
}

/// Maps a day of the week value, 0-7, to a weekday.
pub(crate) fn weekday_from_value(value: u8) -> Weekday {
    match value % 7 {
        0 => Weekday::Sun,
        1 => Weekday::Mon,
        2 => Weekday::Tue,
        3 => Weekday::Wed,
        4 => Weekday::Thu,
        5 => Weekday::Fri,
        _ => Weekday::Sat,
    }
}

fn weekday(input: &str) -> IResult<&str, Weekday> {
    map(value(&DAY_OF_WEEK), weekday_from_value)(input)
}

fn dow_expr(input: &str) -> IResult<&str, DayOfWeekExpr> {
    alt((
        map(terminated(weekday, tag_no_case("L")), DayOfWeekExpr::Last),
        map(
            separated_pair(weekday, char('#'), value(&NTH_DAY)),
            |(day, nth)| DayOfWeekExpr::Nth(day, nth),
        ),
        map(alt((char('?'), star)), |_| DayOfWeekExpr::All),
        map(ors_exprs(&DAY_OF_WEEK), DayOfWeekExpr::Many),
    ))(input)
}

impl FromStr for CronExpr {
    type Err = CronParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = if s.starts_with('@') {
            NICKNAMES
                .iter()
                .find(|(nickname, _)| nickname.eq_ignore_ascii_case(s))
                .map(|&(_, expr)| expr)
                .ok_or(CronParseError(()))?
        } else {
            s
        };

        let (_, expr) = all_consuming(map(
            tuple((
                minutes_expr,
                space1,
                hours_expr,
                space1,
                dom_expr,
                space1,
                months_expr,
                space1,
                dow_expr,
            )),
            |(minutes, _, hours, _, doms, _, months, _, dows)| CronExpr {
                minutes,
                hours,
                doms,
                months,
                dows,
            },
        ))(s)
        .map_err(|_| CronParseError(()))?;

        Ok(expr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn o(value: u8) -> OrsExpr {
        OrsExpr::One(value)
    }

    fn r(start: u8, end: u8) -> OrsExpr {
        OrsExpr::Range(start, end)
    }

    fn rs(start: u8, end: u8, step: u8) -> OrsExpr {
        OrsExpr::Step { start, end, step }
    }

    mod minutes {
        use super::*;

        #[test]
        fn all() {
            assert_eq!(minutes_expr("*"), Ok(("", Expr::All)))
        }

        #[test]
        fn only_match_first_star() {
            // the leftovers fail the next parser
            assert_eq!(minutes_expr("*,*"), Ok((",*", Expr::All)))
        }

        #[test]
        fn star_step() {
            assert_eq!(
                minutes_expr("*/5"),
                Ok(("", Expr::Many(vec![rs(0, 59, 5)])))
            )
        }

        #[test]
        fn values_ranges_and_steps() {
            assert_eq!(
                minutes_expr("0,5-10,10-30/3,30/3,*/20"),
                Ok((
                    "",
                    Expr::Many(vec![o(0), r(5, 10), rs(10, 30, 3), rs(30, 59, 3), rs(0, 59, 20)])
                ))
            )
        }

        #[test]
        fn overflow_range() {
            assert_eq!(minutes_expr("50-10"), Ok(("", Expr::Many(vec![r(50, 10)]))))
        }

        #[test]
        fn limits() {
            assert!(minutes_expr("60").is_err());
            assert!(minutes_expr("0-60").is_err());
            assert!(minutes_expr("0/60").is_err());
            assert!(minutes_expr("0/0").is_err());
            assert!(minutes_expr("*/0").is_err());
        }
    }

    mod months {
        use super::*;

        #[test]
        fn word_values() {
            assert_eq!(
                months_expr("jan,Mar-MAY,OCT/2"),
                Ok(("", Expr::Many(vec![o(1), r(3, 5), rs(10, 12, 2)])))
            )
        }

        #[test]
        fn limits() {
            assert!(months_expr("0").is_err());
            assert!(months_expr("13").is_err());
            assert!(months_expr("FOO").is_err());
        }
    }

    mod days_of_month {
        use super::*;

        #[test]
        fn all() {
            assert_eq!(dom_expr("*"), Ok(("", DayOfMonthExpr::All)));
            assert_eq!(dom_expr("?"), Ok(("", DayOfMonthExpr::All)));
        }

        #[test]
        fn last() {
            assert_eq!(dom_expr("L"), Ok(("", DayOfMonthExpr::Last)));
            assert_eq!(dom_expr("LW"), Ok(("", DayOfMonthExpr::LastWeekday)));
        }

        #[test]
        fn closest_weekday() {
            assert_eq!(dom_expr("15W"), Ok(("", DayOfMonthExpr::ClosestWeekday(15))));
        }

        #[test]
        fn values() {
            assert_eq!(
                dom_expr("1,15-20,*/10"),
                Ok(("", DayOfMonthExpr::Many(vec![o(1), r(15, 20), rs(1, 31, 10)])))
            );
        }

        #[test]
        fn limits() {
            assert!(dom_expr("0").is_err());
            assert!(dom_expr("32").is_err());
            assert!(dom_expr("32W").is_err());
        }
    }

    mod days_of_week {
        use super::*;

        #[test]
        fn all() {
            assert_eq!(dow_expr("*"), Ok(("", DayOfWeekExpr::All)));
            assert_eq!(dow_expr("?"), Ok(("", DayOfWeekExpr::All)));
        }

        #[test]
        fn sunday_is_zero_and_seven() {
            assert_eq!(dow_expr("0,7"), Ok(("", DayOfWeekExpr::Many(vec![o(0), o(7)]))));
        }

        #[test]
        fn word_values() {
            assert_eq!(
                dow_expr("MON-FRI,sun"),
                Ok(("", DayOfWeekExpr::Many(vec![r(1, 5), o(0)])))
            );
        }

        #[test]
        fn last() {
            assert_eq!(dow_expr("5L"), Ok(("", DayOfWeekExpr::Last(Weekday::Fri))));
            assert_eq!(dow_expr("FRIL"), Ok(("", DayOfWeekExpr::Last(Weekday::Fri))));
        }

        #[test]
        fn nth() {
            assert_eq!(dow_expr("1#2"), Ok(("", DayOfWeekExpr::Nth(Weekday::Mon, 2))));
            assert_eq!(dow_expr("7#1"), Ok(("", DayOfWeekExpr::Nth(Weekday::Sun, 1))));
            assert!(all_consuming(dow_expr)("1#6").is_err());
        }

        #[test]
        fn limits() {
            assert!(dow_expr("8").is_err());
            assert!(dow_expr("0/8").is_err());
        }
    }

    #[test]
    fn full_expression() {
        let expr: CronExpr = "*/15 9-17 * * MON-FRI".parse().unwrap();
        assert_eq!(expr.minutes, Expr::Many(vec![rs(0, 59, 15)]));
        assert_eq!(expr.hours, Expr::Many(vec![r(9, 17)]));
        assert_eq!(expr.doms, DayOfMonthExpr::All);
        assert_eq!(expr.months, Expr::All);
        assert_eq!(expr.dows, DayOfWeekExpr::Many(vec![r(1, 5)]));
    }

    #[test]
    fn tabs_and_repeated_spaces_separate_fields() {
        assert!("0  9\t* * 1".parse::<CronExpr>().is_ok());
    }

    #[test]
    fn nicknames() {
        assert_eq!(
            "@daily".parse::<CronExpr>(),
            "0 0 * * *".parse::<CronExpr>()
        );
        assert_eq!(
            "@Weekly".parse::<CronExpr>(),
            "0 0 * * 0".parse::<CronExpr>()
        );
        assert!("@reboot".parse::<CronExpr>().is_err());
    }

    #[test]
    fn rejects_wrong_field_counts() {
        assert!("* * * *".parse::<CronExpr>().is_err());
        assert!("* * * * * *".parse::<CronExpr>().is_err());
        assert!("".parse::<CronExpr>().is_err());
    }
}
