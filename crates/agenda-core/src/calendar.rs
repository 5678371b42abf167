use agenda_shared::{CenterId, RawEvent};
use chrono::Weekday;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::bucket::{Buckets, bucketize_grid};
use crate::clock::{Clock, SystemClock};
use crate::config::AgendaConfig;
use crate::date::CalendarDate;
use crate::error::{CalendarError, InvalidViewModeError};
use crate::event::{CalendarEvent, NormalizeReport, Normalizer, SkippedEvent};
use crate::grid::{Grid, GridCell, ViewMode, build_grid};
use crate::navigator::{self, Direction, ViewState};
use crate::source::EventSource;
use crate::summary::{PeriodSummary, summarize_period, title_for_view};
use crate::upcoming::upcoming;

/// Receives the user's picks from a rendered calendar.
pub trait CalendarListener {
    /// A day cell was chosen, e.g. to start creating an event there.
    fn date_activated(&mut self, _date: CalendarDate) {}

    /// An event chip was chosen, e.g. to open it for editing.
    fn event_activated(&mut self, _event: &CalendarEvent) {}
}

/// A calendar screen's worth of state: the normalized events, the view
/// state, and the grid and buckets computed from them.
///
/// Any change to the view state, the center scope or the events recomputes
/// the grid and buckets in full from the current state.
pub struct Calendar<C: Clock = SystemClock> {
    clock: C,
    week_start: Weekday,
    upcoming_limit: usize,
    normalizer: Normalizer,
    state: ViewState,
    center: Option<CenterId>,
    loaded: Vec<CalendarEvent>,
    events: Vec<CalendarEvent>,
    skipped: Vec<SkippedEvent>,
    grid: Grid,
    buckets: Buckets,
    listener: Option<Box<dyn CalendarListener>>,
}

impl Calendar<SystemClock> {
    pub fn from_config(config: &AgendaConfig) -> anyhow::Result<Self> {
        Self::new(config, SystemClock::new(config.timezone()))
    }
}

impl<C: Clock> Calendar<C> {
    pub fn new(config: &AgendaConfig, clock: C) -> anyhow::Result<Self> {
        let state = ViewState::initial(&clock);
        let mut calendar = Self {
            week_start: config.week_start(),
            upcoming_limit: config.policies.upcoming_limit,
            normalizer: Normalizer::from_config(config)?,
            state,
            center: config.center(),
            loaded: Vec::new(),
            events: Vec::new(),
            skipped: Vec::new(),
            grid: Grid::Cells(Vec::new()),
            buckets: Buckets::default(),
            listener: None,
            clock,
        };
        calendar.recompute();
        Ok(calendar)
    }

    pub fn with_state(mut self, state: ViewState) -> Self {
        self.transition(state);
        self
    }

    pub fn set_listener(&mut self, listener: Box<dyn CalendarListener>) {
        self.listener = Some(listener);
    }

    pub fn state(&self) -> ViewState {
        self.state
    }

    pub fn week_start(&self) -> Weekday {
        self.week_start
    }

    pub fn upcoming_limit(&self) -> usize {
        self.upcoming_limit
    }

    pub fn center(&self) -> Option<CenterId> {
        self.center
    }

    /// Events in the current center scope.
    pub fn events(&self) -> &[CalendarEvent] {
        &self.events
    }

    /// Inputs dropped by the last load, with the reason for each.
    pub fn skipped(&self) -> &[SkippedEvent] {
        &self.skipped
    }

    /// Replaces the event set. Returns the inputs that were rejected.
    #[tracing::instrument(skip_all, fields(raw = raw_events.len()))]
    pub fn load(&mut self, raw_events: &[RawEvent]) -> &[SkippedEvent] {
        let report = self.normalizer.normalize_all(raw_events);
        self.apply(report)
    }

    /// Replaces the event set from untyped records, skipping the ones that
    /// are not events.
    #[tracing::instrument(skip_all, fields(raw = records.len()))]
    pub fn load_records(&mut self, records: &[Value]) -> &[SkippedEvent] {
        let report = self.normalizer.normalize_records(records);
        self.apply(report)
    }

    /// Fetches and loads. On failure the previous events stay in place.
    pub fn refresh(&mut self, source: &dyn EventSource) -> Result<usize, CalendarError> {
        let records = source.fetch()?;
        Ok(self.load_records(&records).len())
    }

    /// Restricts every view to one center, or lifts the restriction.
    pub fn set_center(&mut self, center: Option<CenterId>) {
        if center != self.center {
            info!(center = ?center, "center scope changed");
        }
        self.center = center;
        self.filter_center();
        self.recompute();
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn buckets(&self) -> &Buckets {
        &self.buckets
    }

    pub fn buckets_for(&self, cell: &GridCell) -> &[CalendarEvent] {
        self.buckets.for_cell(cell)
    }

    pub fn next(&mut self) {
        self.transition(navigator::step(self.state, Direction::Next));
    }

    pub fn previous(&mut self) {
        self.transition(navigator::step(self.state, Direction::Previous));
    }

    pub fn step_by(&mut self, direction: Direction, times: u32) {
        self.transition(navigator::step_times(self.state, direction, times));
    }

    pub fn today(&mut self) {
        self.transition(navigator::go_to_today(self.state, &self.clock));
    }

    /// Switches mode from user input. Unknown modes leave the state as is.
    pub fn set_mode(&mut self, raw: &str) -> Result<ViewMode, InvalidViewModeError> {
        let mode = navigator::parse_mode(raw).inspect_err(|error| {
            warn!(%error, "rejected view mode");
        })?;
        self.switch_mode(mode, None);
        Ok(mode)
    }

    pub fn switch_mode(&mut self, mode: ViewMode, selected: Option<CalendarDate>) {
        self.transition(navigator::switch_mode(self.state, mode, selected));
    }

    pub fn activate_date(&mut self, date: CalendarDate) {
        debug!(%date, "date activated");
        if let Some(listener) = self.listener.as_mut() {
            listener.date_activated(date);
        }
    }

    pub fn activate_event(&mut self, id: &str) -> Result<(), CalendarError> {
        let event = self
            .events
            .iter()
            .find(|event| event.id == id)
            .ok_or_else(|| CalendarError::unknown_event(id))?;
        debug!(id, date = %event.date, "event activated");
        if let Some(listener) = self.listener.as_mut() {
            listener.event_activated(event);
        }
        Ok(())
    }

    /// Next events from the reference date on, capped by the configured
    /// limit.
    pub fn upcoming(&self) -> Vec<CalendarEvent> {
        self.upcoming_from(self.state.reference_date, self.upcoming_limit)
    }

    pub fn upcoming_from(&self, from: CalendarDate, limit: usize) -> Vec<CalendarEvent> {
        upcoming(&self.events, from, limit)
    }

    pub fn summary(&self) -> PeriodSummary {
        summarize_period(
            &self.events,
            self.state.view_mode,
            self.state.reference_date,
            self.week_start,
        )
    }

    pub fn title(&self) -> String {
        title_for_view(self.state.view_mode, self.state.reference_date, self.week_start)
    }

    fn apply(&mut self, report: NormalizeReport) -> &[SkippedEvent] {
        if !report.skipped.is_empty() {
            warn!(skipped = report.skipped.len(), "some events were rejected");
        }
        self.loaded = report.events;
        self.skipped = report.skipped;
        self.filter_center();
        self.recompute();
        &self.skipped
    }

    fn filter_center(&mut self) {
        self.events = match self.center {
            Some(center) => self
                .loaded
                .iter()
                .filter(|event| event.center == Some(center))
                .cloned()
                .collect(),
            None => self.loaded.clone(),
        };
    }

    fn transition(&mut self, next: ViewState) {
        if next != self.state {
            info!(
                mode = %next.view_mode,
                reference = %next.reference_date,
                "view state changed"
            );
        }
        self.state = next;
        self.recompute();
    }

    fn recompute(&mut self) {
        self.grid = build_grid(
            self.state.view_mode,
            self.state.reference_date,
            self.week_start,
            self.clock.today(),
            &self.events,
        );
        self.buckets = bucketize_grid(&self.events, &self.grid);
        debug!(
            cells = self.grid.len(),
            buckets = self.buckets.len(),
            events = self.buckets.event_count(),
            "calendar view recomputed"
        );
    }
}
