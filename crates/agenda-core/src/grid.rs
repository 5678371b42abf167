use std::fmt;
use std::str::FromStr;

use chrono::Weekday;
use serde::Serialize;

use crate::bucket::{
  CellKey,
  bucketize_months
};
use crate::date::{
  CalendarDate,
  first_day_of_month,
  last_day_of_month,
  weekday_offset
};
use crate::error::InvalidViewModeError;
use crate::event::CalendarEvent;

/// Month grids always render as six
/// full weeks.
pub const MONTH_GRID_CELLS: usize = 42;

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Default,
  Serialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
  Day,
  Week,
  #[default]
  Month,
  Year
}

impl ViewMode {
  pub fn all() -> [Self; 4] {
    [
      Self::Day,
      Self::Week,
      Self::Month,
      Self::Year
    ]
  }

  pub fn as_key(self) -> &'static str {
    match self {
      | Self::Day => "day",
      | Self::Week => "week",
      | Self::Month => "month",
      | Self::Year => "year"
    }
  }

  pub fn label(self) -> &'static str {
    match self {
      | Self::Day => "Day",
      | Self::Week => "Week",
      | Self::Month => "Month",
      | Self::Year => "Year"
    }
  }
}

impl FromStr for ViewMode {
  type Err = InvalidViewModeError;

  fn from_str(
    raw: &str
  ) -> Result<Self, Self::Err> {
    let key =
      raw.trim().to_ascii_lowercase();
    Self::all()
      .into_iter()
      .find(|mode| mode.as_key() == key)
      .ok_or_else(|| {
        InvalidViewModeError::new(raw)
      })
  }
}

impl fmt::Display for ViewMode {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.write_str(self.as_key())
  }
}

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
)]
pub struct GridCell {
  pub date:              CalendarDate,
  pub in_current_period: bool,
  pub is_today:          bool
}

impl GridCell {
  fn new(
    date: CalendarDate,
    in_current_period: bool,
    today: CalendarDate
  ) -> Self {
    Self {
      date,
      in_current_period,
      is_today: date == today
    }
  }

  pub fn key(&self) -> CellKey {
    CellKey::Day(self.date)
  }
}

/// One month of the year layout with
/// its events already assigned.
#[derive(
  Debug, Clone, PartialEq, Serialize,
)]
pub struct MonthBucket {
  pub year:              i32,
  /// 0-based.
  pub month:             u32,
  pub first_day:         CalendarDate,
  pub in_current_period: bool,
  pub is_current_month:  bool,
  pub events:            Vec<CalendarEvent>
}

impl MonthBucket {
  pub fn key(&self) -> CellKey {
    CellKey::Month {
      year:  self.year,
      month: self.month
    }
  }
}

/// Inclusive span of dates.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
)]
pub struct DateRange {
  pub start: CalendarDate,
  pub end:   CalendarDate
}

impl DateRange {
  pub fn new(
    start: CalendarDate,
    end: CalendarDate
  ) -> Self {
    Self { start, end }
  }

  pub fn contains(
    &self,
    date: CalendarDate
  ) -> bool {
    date >= self.start
      && date <= self.end
  }

  pub fn dates(
    &self
  ) -> impl Iterator<Item = CalendarDate>
  {
    let end = self.end;
    std::iter::successors(
      Some(self.start)
        .filter(|start| *start <= end),
      move |date| {
        let next = date.add_days(1);
        (next > *date && next <= end)
          .then_some(next)
      }
    )
  }
}

#[derive(
  Debug, Clone, PartialEq, Serialize,
)]
#[serde(
  tag = "layout",
  content = "items",
  rename_all = "lowercase"
)]
pub enum Grid {
  Cells(Vec<GridCell>),
  Months(Vec<MonthBucket>)
}

impl Grid {
  /// Day cells; empty for the year
  /// layout.
  pub fn cells(&self) -> &[GridCell] {
    match self {
      | Self::Cells(cells) => cells,
      | Self::Months(_) => &[]
    }
  }

  pub fn months(
    &self
  ) -> &[MonthBucket] {
    match self {
      | Self::Cells(_) => &[],
      | Self::Months(months) => months
    }
  }

  pub fn len(&self) -> usize {
    match self {
      | Self::Cells(cells) => {
        cells.len()
      }
      | Self::Months(months) => {
        months.len()
      }
    }
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// First to last date the layout
  /// covers.
  pub fn span(
    &self
  ) -> Option<DateRange> {
    match self {
      | Self::Cells(cells) => {
        Some(DateRange::new(
          cells.first()?.date,
          cells.last()?.date
        ))
      }
      | Self::Months(months) => {
        let first = months.first()?;
        let last = months.last()?;
        Some(DateRange::new(
          first.first_day,
          last_day_of_month(
            last.year, last.month
          )
        ))
      }
    }
  }
}

#[tracing::instrument(level = "trace")]
pub fn build_month_grid(
  reference: CalendarDate,
  week_start: Weekday,
  today: CalendarDate
) -> Vec<GridCell> {
  let first = reference.first_of_month();
  let last = reference.last_of_month();
  let leading = weekday_offset(
    first.weekday(),
    week_start
  );
  let prev_last = first.add_days(-1);

  let mut cells =
    Vec::with_capacity(MONTH_GRID_CELLS);
  for back in (0..leading).rev() {
    cells.push(GridCell::new(
      prev_last
        .add_days(-i64::from(back)),
      false,
      today
    ));
  }
  for offset in 0..last.day() {
    cells.push(GridCell::new(
      first
        .add_days(i64::from(offset)),
      true,
      today
    ));
  }
  let mut next = last.add_days(1);
  while cells.len() < MONTH_GRID_CELLS
  {
    cells.push(GridCell::new(
      next, false, today
    ));
    next = next.add_days(1);
  }

  cells
}

#[tracing::instrument(level = "trace")]
pub fn build_week_grid(
  reference: CalendarDate,
  week_start: Weekday,
  today: CalendarDate
) -> Vec<GridCell> {
  let start =
    reference.start_of_week(week_start);
  (0_i64..7_i64)
    .map(|offset| {
      GridCell::new(
        start.add_days(offset),
        true,
        today
      )
    })
    .collect()
}

pub fn build_day_grid(
  reference: CalendarDate,
  today: CalendarDate
) -> Vec<GridCell> {
  vec![GridCell::new(
    reference, true, today
  )]
}

#[tracing::instrument(
  level = "trace",
  skip(events)
)]
pub fn build_year_grid(
  year: i32,
  events: &[CalendarEvent],
  today: CalendarDate
) -> Vec<MonthBucket> {
  let buckets =
    bucketize_months(events, year);

  (0_u32..12_u32)
    .map(|month| {
      let key =
        CellKey::Month { year, month };
      MonthBucket {
        year,
        month,
        first_day: first_day_of_month(
          year, month
        ),
        in_current_period: true,
        is_current_month: today.year()
          == year
          && today.month() == month,
        events: buckets
          .for_key(&key)
          .to_vec()
      }
    })
    .collect()
}

/// The layout for `mode`, anchored at
/// `reference`.
pub fn build_grid(
  mode: ViewMode,
  reference: CalendarDate,
  week_start: Weekday,
  today: CalendarDate,
  events: &[CalendarEvent]
) -> Grid {
  match mode {
    | ViewMode::Day => {
      Grid::Cells(build_day_grid(
        reference, today
      ))
    }
    | ViewMode::Week => {
      Grid::Cells(build_week_grid(
        reference, week_start, today
      ))
    }
    | ViewMode::Month => {
      Grid::Cells(build_month_grid(
        reference, week_start, today
      ))
    }
    | ViewMode::Year => {
      Grid::Months(build_year_grid(
        reference.year(),
        events,
        today
      ))
    }
  }
}

/// Dates that belong to the period
/// shown by `mode`, excluding month
/// grid padding.
pub fn period_range(
  mode: ViewMode,
  reference: CalendarDate,
  week_start: Weekday
) -> DateRange {
  match mode {
    | ViewMode::Day => {
      DateRange::new(
        reference, reference
      )
    }
    | ViewMode::Week => {
      let start = reference
        .start_of_week(week_start);
      DateRange::new(
        start,
        start.add_days(6)
      )
    }
    | ViewMode::Month => {
      DateRange::new(
        reference.first_of_month(),
        reference.last_of_month()
      )
    }
    | ViewMode::Year => {
      DateRange::new(
        first_day_of_month(
          reference.year(),
          0
        ),
        last_day_of_month(
          reference.year(),
          11
        )
      )
    }
  }
}
