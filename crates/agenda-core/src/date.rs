use std::fmt;

use chrono::{
  Datelike,
  Duration,
  NaiveDate,
  Weekday
};
use serde::{
  Deserialize,
  Deserializer,
  Serialize,
  Serializer
};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// A fully resolved calendar date.
///
/// Months are exposed 0-based
/// (`0` = January) to match the grid
/// and bucket keys; everything else is
/// delegated to [`NaiveDate`].
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
)]
pub struct CalendarDate(NaiveDate);

impl CalendarDate {
  /// `month` is 0-based.
  pub fn from_ymd(
    year: i32,
    month: u32,
    day: u32
  ) -> Option<Self> {
    NaiveDate::from_ymd_opt(
      year,
      month.checked_add(1)?,
      day
    )
    .map(Self)
  }

  pub fn parse(
    raw: &str
  ) -> Option<Self> {
    NaiveDate::parse_from_str(
      raw.trim(),
      DATE_FORMAT
    )
    .ok()
    .map(Self)
  }

  pub fn naive(self) -> NaiveDate {
    self.0
  }

  pub fn year(self) -> i32 {
    self.0.year()
  }

  /// 0-based month.
  pub fn month(self) -> u32 {
    self.0.month0()
  }

  pub fn day(self) -> u32 {
    self.0.day()
  }

  pub fn weekday(self) -> Weekday {
    self.0.weekday()
  }

  pub fn add_days(
    self,
    days: i64
  ) -> Self {
    Self(
      self
        .0
        .checked_add_signed(
          Duration::days(days)
        )
        .unwrap_or(self.0)
    )
  }

  /// Moves by whole months, clamping
  /// the day to the target month's
  /// length.
  pub fn shift_months(
    self,
    months: i32
  ) -> Self {
    let total = i64::from(self.year())
      * 12
      + i64::from(self.month())
      + i64::from(months);
    let Ok(year) =
      i32::try_from(total.div_euclid(12))
    else {
      return self;
    };
    let month =
      total.rem_euclid(12) as u32;
    let day = self
      .day()
      .min(days_in_month(year, month));

    Self::from_ymd(year, month, day)
      .unwrap_or(self)
  }

  pub fn shift_years(
    self,
    years: i32
  ) -> Self {
    let year =
      self.year().saturating_add(years);
    let month = self.month();
    let day = self
      .day()
      .min(days_in_month(year, month));

    Self::from_ymd(year, month, day)
      .unwrap_or(self)
  }

  pub fn first_of_month(self) -> Self {
    first_day_of_month(
      self.year(),
      self.month()
    )
  }

  pub fn last_of_month(self) -> Self {
    last_day_of_month(
      self.year(),
      self.month()
    )
  }

  pub fn start_of_week(
    self,
    week_start: Weekday
  ) -> Self {
    self.add_days(-i64::from(
      weekday_offset(
        self.weekday(),
        week_start
      )
    ))
  }

  pub fn format(
    self,
    pattern: &str
  ) -> String {
    self.0.format(pattern).to_string()
  }
}

impl From<NaiveDate> for CalendarDate {
  fn from(date: NaiveDate) -> Self {
    Self(date)
  }
}

impl fmt::Display for CalendarDate {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    write!(
      f,
      "{}",
      self.0.format(DATE_FORMAT)
    )
  }
}

impl Serialize for CalendarDate {
  fn serialize<S>(
    &self,
    serializer: S
  ) -> Result<S::Ok, S::Error>
  where
    S: Serializer
  {
    serializer.collect_str(self)
  }
}

impl<'de> Deserialize<'de>
  for CalendarDate
{
  fn deserialize<D>(
    deserializer: D
  ) -> Result<Self, D::Error>
  where
    D: Deserializer<'de>
  {
    let raw =
      String::deserialize(deserializer)?;
    Self::parse(&raw).ok_or_else(|| {
      serde::de::Error::custom(format!(
        "invalid date {raw:?}; \
         expected YYYY-MM-DD"
      ))
    })
  }
}

/// Days between `week_start` and
/// `weekday`, walking forward.
pub fn weekday_offset(
  weekday: Weekday,
  week_start: Weekday
) -> u32 {
  let day_idx =
    weekday.num_days_from_sunday();
  let start_idx =
    week_start.num_days_from_sunday();
  (7 + day_idx - start_idx) % 7
}

pub fn first_day_of_month(
  year: i32,
  month: u32
) -> CalendarDate {
  CalendarDate::from_ymd(year, month, 1)
    .unwrap_or(CalendarDate(
      NaiveDate::MIN
    ))
}

pub fn last_day_of_month(
  year: i32,
  month: u32
) -> CalendarDate {
  let (next_year, next_month) =
    if month >= 11 {
      (year.saturating_add(1), 0_u32)
    } else {
      (year, month + 1)
    };
  first_day_of_month(
    next_year, next_month
  )
  .add_days(-1)
}

pub fn days_in_month(
  year: i32,
  month: u32
) -> u32 {
  last_day_of_month(year, month).day()
}

pub fn parse_week_start(
  raw: &str
) -> Option<Weekday> {
  raw.trim().parse::<Weekday>().ok()
}

#[cfg(test)]
mod tests {
  use chrono::Weekday;

  use super::*;

  fn date(
    year: i32,
    month: u32,
    day: u32
  ) -> CalendarDate {
    CalendarDate::from_ymd(
      year, month, day
    )
    .expect("valid date")
  }

  #[test]
  fn months_are_zero_based() {
    let july = date(2025, 6, 1);
    assert_eq!(july.month(), 6);
    assert_eq!(
      july.to_string(),
      "2025-07-01"
    );
    assert!(
      CalendarDate::from_ymd(2025, 12, 1)
        .is_none()
    );
  }

  #[test]
  fn february_length_follows_leap_years(
  ) {
    assert_eq!(days_in_month(2024, 1), 29);
    assert_eq!(days_in_month(2025, 1), 28);
    assert_eq!(days_in_month(1900, 1), 28);
    assert_eq!(days_in_month(2000, 1), 29);
    assert_eq!(days_in_month(2025, 11), 31);
  }

  #[test]
  fn shift_months_clamps_to_month_end() {
    assert_eq!(
      date(2025, 2, 31).shift_months(-1),
      date(2025, 1, 28)
    );
    assert_eq!(
      date(2024, 0, 31).shift_months(1),
      date(2024, 1, 29)
    );
    assert_eq!(
      date(2025, 11, 15).shift_months(1),
      date(2026, 0, 15)
    );
    assert_eq!(
      date(2025, 0, 15).shift_months(-13),
      date(2023, 11, 15)
    );
  }

  #[test]
  fn shift_years_clamps_leap_day() {
    assert_eq!(
      date(2024, 1, 29).shift_years(1),
      date(2025, 1, 28)
    );
    assert_eq!(
      date(2024, 1, 29).shift_years(4),
      date(2028, 1, 29)
    );
  }

  #[test]
  fn start_of_week_honours_week_start() {
    let tuesday = date(2025, 6, 1);
    assert_eq!(
      tuesday.start_of_week(Weekday::Sun),
      date(2025, 5, 29)
    );
    assert_eq!(
      tuesday.start_of_week(Weekday::Mon),
      date(2025, 5, 30)
    );
    assert_eq!(
      tuesday.start_of_week(Weekday::Tue),
      tuesday
    );
  }

  #[test]
  fn parses_and_serializes_iso_dates() {
    let parsed =
      CalendarDate::parse(" 2025-07-15 ")
        .expect("parse date");
    assert_eq!(parsed, date(2025, 6, 15));
    assert!(
      CalendarDate::parse("15/07/2025")
        .is_none()
    );
    assert_eq!(
      serde_json::to_string(&parsed)
        .expect("serialize"),
      "\"2025-07-15\""
    );
    let back: CalendarDate =
      serde_json::from_str(
        "\"2025-07-15\""
      )
      .expect("deserialize");
    assert_eq!(back, parsed);
  }

  #[test]
  fn week_start_names_parse() {
    assert_eq!(
      parse_week_start("sunday"),
      Some(Weekday::Sun)
    );
    assert_eq!(
      parse_week_start("Mon"),
      Some(Weekday::Mon)
    );
    assert_eq!(
      parse_week_start("someday"),
      None
    );
  }
}
