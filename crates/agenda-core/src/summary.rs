use std::collections::BTreeMap;

use chrono::Weekday;
use serde::Serialize;

use crate::date::CalendarDate;
use crate::event::{CalendarEvent, StatusTag};
use crate::grid::{DateRange, ViewMode, period_range};

/// Counts for the events that fall inside the active period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodSummary {
    pub range: DateRange,
    pub total: usize,
    pub critical: usize,
    pub confirmed: usize,
    pub pending: usize,
    pub published: usize,
    pub drafts: usize,
    pub capacity: u64,
    pub attendees: u64,
    pub by_kind: BTreeMap<String, usize>,
    pub by_category: BTreeMap<String, usize>,
}

impl PeriodSummary {
    fn empty(range: DateRange) -> Self {
        Self {
            range,
            total: 0,
            critical: 0,
            confirmed: 0,
            pending: 0,
            published: 0,
            drafts: 0,
            capacity: 0,
            attendees: 0,
            by_kind: BTreeMap::new(),
            by_category: BTreeMap::new(),
        }
    }

    fn push(&mut self, event: &CalendarEvent) {
        self.total = self.total.saturating_add(1);
        match event.status {
            StatusTag::Critical => self.critical = self.critical.saturating_add(1),
            StatusTag::Confirmed => self.confirmed = self.confirmed.saturating_add(1),
            StatusTag::Pending => self.pending = self.pending.saturating_add(1),
        }
        if event.published {
            self.published = self.published.saturating_add(1);
        } else {
            self.drafts = self.drafts.saturating_add(1);
        }
        self.capacity = self.capacity.saturating_add(u64::from(event.capacity));
        self.attendees = self.attendees.saturating_add(u64::from(event.attendees));
        *self.by_kind.entry(event.kind.clone()).or_default() += 1;
        *self.by_category.entry(event.category.clone()).or_default() += 1;
    }

    pub fn count_for(&self, status: StatusTag) -> usize {
        match status {
            StatusTag::Critical => self.critical,
            StatusTag::Confirmed => self.confirmed,
            StatusTag::Pending => self.pending,
        }
    }

    /// Seats taken across the period, 0.0 when nothing has capacity.
    pub fn occupancy(&self) -> f64 {
        if self.capacity == 0 {
            return 0.0;
        }
        self.attendees as f64 / self.capacity as f64
    }
}

pub fn summarize_period(
    events: &[CalendarEvent],
    mode: ViewMode,
    reference: CalendarDate,
    week_start: Weekday,
) -> PeriodSummary {
    let range = period_range(mode, reference, week_start);
    let mut summary = PeriodSummary::empty(range);

    for event in events.iter().filter(|event| range.contains(event.date)) {
        summary.push(event);
    }

    tracing::debug!(
        mode = %mode,
        start = %range.start,
        end = %range.end,
        total = summary.total,
        "period summarized"
    );
    summary
}

pub fn title_for_view(mode: ViewMode, reference: CalendarDate, week_start: Weekday) -> String {
    let period = match mode {
        ViewMode::Year => reference.year().to_string(),
        ViewMode::Month => reference.format("%B %Y"),
        ViewMode::Week => {
            let range = period_range(mode, reference, week_start);
            format!("{} - {}", range.start, range.end)
        }
        ViewMode::Day => reference.format("%A, %Y-%m-%d"),
    };
    format!("{} View {period}", mode.label())
}
