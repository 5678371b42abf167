use serde::Serialize;
use tracing::debug;

use crate::clock::Clock;
use crate::date::CalendarDate;
use crate::error::InvalidViewModeError;
use crate::grid::ViewMode;

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
)]
pub enum Direction {
  Next,
  Previous
}

impl Direction {
  fn sign(self) -> i32 {
    match self {
      | Self::Next => 1,
      | Self::Previous => -1
    }
  }
}

/// What the calendar is anchored to.
/// Only the navigator functions below
/// produce new states.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
)]
pub struct ViewState {
  pub reference_date: CalendarDate,
  pub view_mode:      ViewMode
}

impl ViewState {
  pub fn new(
    reference_date: CalendarDate,
    view_mode: ViewMode
  ) -> Self {
    Self {
      reference_date,
      view_mode
    }
  }

  /// Today in month view.
  pub fn initial<C: Clock>(
    clock: &C
  ) -> Self {
    Self::new(
      clock.today(),
      ViewMode::default()
    )
  }
}

pub fn step(
  state: ViewState,
  direction: Direction
) -> ViewState {
  let sign = direction.sign();
  let current = state.reference_date;
  let reference_date =
    match state.view_mode {
      | ViewMode::Day => {
        current
          .add_days(i64::from(sign))
      }
      | ViewMode::Week => {
        current.add_days(i64::from(
          sign * 7
        ))
      }
      | ViewMode::Month => {
        current.shift_months(sign)
      }
      | ViewMode::Year => {
        current.shift_years(sign)
      }
    };

  debug!(
    mode = %state.view_mode,
    ?direction,
    from = %current,
    to = %reference_date,
    "calendar step"
  );
  ViewState {
    reference_date,
    ..state
  }
}

pub fn step_times(
  state: ViewState,
  direction: Direction,
  times: u32
) -> ViewState {
  (0..times).fold(state, |acc, _| {
    step(acc, direction)
  })
}

pub fn go_to_today<C: Clock>(
  state: ViewState,
  clock: &C
) -> ViewState {
  ViewState {
    reference_date: clock.today(),
    ..state
  }
}

/// Changes the view mode. Entering day
/// view from another mode with a
/// selected date re-anchors on that
/// date; every other switch keeps the
/// reference date.
pub fn switch_mode(
  state: ViewState,
  mode: ViewMode,
  selected: Option<CalendarDate>
) -> ViewState {
  let reference_date = match selected {
    | Some(date)
      if mode == ViewMode::Day
        && state.view_mode
          != ViewMode::Day =>
    {
      date
    }
    | _ => state.reference_date
  };

  ViewState {
    reference_date,
    view_mode: mode
  }
}

pub fn parse_mode(
  raw: &str
) -> Result<ViewMode, InvalidViewModeError>
{
  raw.parse()
}
