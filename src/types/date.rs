//! Calendar dates embedded in release issue titles.
//!
//! Release issues are titled with the date of the release in a fixed English
//! form, for example `Scheduled release for June 3rd, 2021`. This module owns
//! that textual format in both directions.

use std::fmt;

use chrono::{Datelike, Days, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// Literal prefix of every release issue title.
pub const RELEASE_TITLE_PREFIX: &str = "Scheduled release for ";

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const ORDINAL_SUFFIXES: [&str; 4] = ["st", "nd", "rd", "th"];

/// A calendar date written as `MMMM Do, YYYY` (e.g. `June 3rd, 2021`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScheduledDate(NaiveDate);

impl ScheduledDate {
    pub fn new(date: NaiveDate) -> Self {
        ScheduledDate(date)
    }

    /// Builds a date from its components, returning `None` for impossible dates.
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(ScheduledDate)
    }

    pub fn as_naive(&self) -> NaiveDate {
        self.0
    }

    /// Strictly parses `MMMM Do, YYYY`.
    ///
    /// The whole input must match: a full month name (any case), a one or two
    /// digit day followed by an ordinal suffix, `", "`, and exactly four year
    /// digits. Dates that do not exist in the calendar (e.g. `February 30th`)
    /// are rejected.
    ///
    /// # Examples
    ///
    /// ```
    /// use issue_bot::types::ScheduledDate;
    ///
    /// let date = ScheduledDate::parse("June 3rd, 2021").unwrap();
    /// assert_eq!(date, ScheduledDate::from_ymd(2021, 6, 3).unwrap());
    ///
    /// assert!(ScheduledDate::parse("June 3, 2021").is_none());
    /// assert!(ScheduledDate::parse("June 3rd, 21").is_none());
    /// assert!(ScheduledDate::parse("June 3rd, 2021 (tentative)").is_none());
    /// ```
    pub fn parse(text: &str) -> Option<Self> {
        let (month_word, rest) = text.split_once(' ')?;
        let month = parse_month(month_word)?;

        let (day_word, year_word) = rest.split_once(", ")?;
        let day = parse_ordinal_day(day_word)?;
        let year = parse_year(year_word)?;

        Self::from_ymd(year, month, day)
    }

    /// Parses a full release issue title (`Scheduled release for MMMM Do, YYYY`).
    pub fn parse_release_title(title: &str) -> Option<Self> {
        title
            .strip_prefix(RELEASE_TITLE_PREFIX)
            .and_then(Self::parse)
    }

    /// Returns the date `weeks` weeks later, or `None` past chrono's range.
    pub fn add_weeks(&self, weeks: u32) -> Option<Self> {
        self.add_days(u64::from(weeks) * 7)
    }

    pub fn add_days(&self, days: u64) -> Option<Self> {
        self.0.checked_add_days(Days::new(days)).map(ScheduledDate)
    }

    /// Formats as `MMMM Do, YYYY`.
    pub fn format(&self) -> String {
        format!(
            "{} {}, {:04}",
            month_name(self.0.month()),
            ordinal(self.0.day()),
            self.0.year()
        )
    }

    /// Formats as `dddd, MMMM Do, YYYY` (e.g. `Thursday, June 17th, 2021`).
    pub fn format_long(&self) -> String {
        format!("{}, {}", weekday_name(self.0.weekday()), self.format())
    }

    /// Formats as a release issue title.
    pub fn release_title(&self) -> String {
        format!("{}{}", RELEASE_TITLE_PREFIX, self.format())
    }
}

impl fmt::Display for ScheduledDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format())
    }
}

impl From<NaiveDate> for ScheduledDate {
    fn from(date: NaiveDate) -> Self {
        ScheduledDate(date)
    }
}

fn parse_month(word: &str) -> Option<u32> {
    MONTH_NAMES
        .iter()
        .position(|name| name.eq_ignore_ascii_case(word))
        .map(|idx| idx as u32 + 1)
}

fn parse_ordinal_day(word: &str) -> Option<u32> {
    let digits_len = word.bytes().take_while(u8::is_ascii_digit).count();
    if !(1..=2).contains(&digits_len) {
        return None;
    }

    let (digits, suffix) = word.split_at(digits_len);
    if !ORDINAL_SUFFIXES.contains(&suffix) {
        return None;
    }

    digits.parse().ok()
}

fn parse_year(word: &str) -> Option<i32> {
    if word.len() != 4 || !word.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    word.parse().ok()
}

fn month_name(month: u32) -> &'static str {
    MONTH_NAMES[(month as usize - 1) % 12]
}

fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// English ordinal for a day of the month (`1st`, `2nd`, `11th`, `23rd`).
fn ordinal(day: u32) -> String {
    let suffix = match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{day}{suffix}")
}
