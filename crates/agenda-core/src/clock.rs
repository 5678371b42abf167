use chrono::Utc;
use chrono_tz::Tz;

use crate::date::CalendarDate;

/// Source of "today" for grid highlighting and `today()` navigation.
pub trait Clock {
    fn today(&self) -> CalendarDate;
}

/// Reads the wall clock and converts it into the configured timezone.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    timezone: Tz,
}

impl SystemClock {
    pub fn new(timezone: Tz) -> Self {
        Self { timezone }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new(chrono_tz::UTC)
    }
}

impl Clock for SystemClock {
    fn today(&self) -> CalendarDate {
        CalendarDate::from(Utc::now().with_timezone(&self.timezone).date_naive())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub CalendarDate);

impl Clock for FixedClock {
    fn today(&self) -> CalendarDate {
        self.0
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn today(&self) -> CalendarDate {
        (**self).today()
    }
}
