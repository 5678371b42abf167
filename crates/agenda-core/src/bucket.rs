use std::collections::HashMap;

use serde::Serialize;

use crate::date::CalendarDate;
use crate::event::CalendarEvent;
use crate::grid::{Grid, GridCell};

/// Exact-match key for a day cell or a month of the year layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum CellKey {
    Day(CalendarDate),
    Month { year: i32, month: u32 },
}

impl CellKey {
    pub fn month_of(date: CalendarDate) -> Self {
        Self::Month {
            year: date.year(),
            month: date.month(),
        }
    }
}

/// Events grouped per cell. Within a bucket, events keep the order they
/// had in the input list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Buckets {
    map: HashMap<CellKey, Vec<CalendarEvent>>,
}

impl Buckets {
    pub fn for_key(&self, key: &CellKey) -> &[CalendarEvent] {
        self.map.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn for_cell(&self, cell: &GridCell) -> &[CalendarEvent] {
        self.for_key(&cell.key())
    }

    /// Number of non-empty buckets.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn event_count(&self) -> usize {
        self.map.values().map(Vec::len).sum()
    }
}

/// Assigns events to day cells by exact date. Events on dates that no cell
/// covers are left out.
#[tracing::instrument(level = "debug", skip_all, fields(events = events.len(), cells = cells.len()))]
pub fn bucketize(events: &[CalendarEvent], cells: &[GridCell]) -> Buckets {
    let mut index: HashMap<CalendarDate, Vec<&CalendarEvent>> = HashMap::new();
    for event in events {
        index.entry(event.date).or_default().push(event);
    }

    let mut map = HashMap::with_capacity(index.len().min(cells.len()));
    for cell in cells {
        if let Some(matched) = index.remove(&cell.date) {
            map.insert(cell.key(), matched.into_iter().cloned().collect());
        }
    }

    Buckets { map }
}

/// Groups the events of `year` by `(year, month)`.
pub fn bucketize_months(events: &[CalendarEvent], year: i32) -> Buckets {
    let mut map: HashMap<CellKey, Vec<CalendarEvent>> = HashMap::new();
    for event in events.iter().filter(|event| event.date.year() == year) {
        map.entry(CellKey::month_of(event.date))
            .or_default()
            .push(event.clone());
    }
    Buckets { map }
}

pub fn bucketize_grid(events: &[CalendarEvent], grid: &Grid) -> Buckets {
    match grid {
        Grid::Cells(cells) => bucketize(events, cells),
        Grid::Months(months) => months
            .first()
            .map(|first| bucketize_months(events, first.year))
            .unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::Weekday;

    use super::*;
    use crate::config::AgendaConfig;
    use crate::event::Normalizer;
    use crate::grid::{build_month_grid, build_week_grid, build_year_grid};
    use agenda_shared::RawEvent;

    fn date(year: i32, month: u32, day: u32) -> CalendarDate {
        CalendarDate::from_ymd(year, month, day).expect("valid date")
    }

    fn events(dates: &[(&str, &str)]) -> Vec<CalendarEvent> {
        let normalizer = Normalizer::from_config(&AgendaConfig::default()).expect("config");
        dates
            .iter()
            .map(|(id, day)| {
                normalizer
                    .normalize(&RawEvent {
                        id: Some(id.to_string()),
                        date: Some(day.to_string()),
                        category: "Conciertos".to_string(),
                        capacity: Some(10),
                        ..RawEvent::default()
                    })
                    .expect("valid event")
            })
            .collect()
    }

    fn ids(events: &[CalendarEvent]) -> Vec<&str> {
        events.iter().map(|event| event.id.as_str()).collect()
    }

    #[test]
    fn matches_exact_dates_and_keeps_input_order() {
        let events = events(&[
            ("b", "2025-07-15"),
            ("a", "2025-07-15"),
            ("c", "2025-07-16"),
            ("d", "2024-07-15"),
        ]);
        let cells = build_month_grid(date(2025, 6, 1), Weekday::Sun, date(2025, 6, 1));
        let buckets = bucketize(&events, &cells);

        let fifteenth = cells
            .iter()
            .find(|cell| cell.date == date(2025, 6, 15))
            .expect("cell for the 15th");
        assert_eq!(ids(buckets.for_cell(fifteenth)), vec!["b", "a"]);
        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets.event_count(), 3);
        assert!(buckets.for_cell(&cells[0]).is_empty());
    }

    #[test]
    fn month_grid_buckets_partition_covered_events() {
        let events = events(&[
            ("before", "2025-06-28"),
            ("lead", "2025-06-30"),
            ("first", "2025-07-01"),
            ("last", "2025-07-31"),
            ("trail", "2025-08-09"),
            ("after", "2025-08-10"),
        ]);
        let cells = build_month_grid(date(2025, 6, 1), Weekday::Sun, date(2025, 6, 1));
        let buckets = bucketize(&events, &cells);

        let mut seen = cells
            .iter()
            .flat_map(|cell| ids(buckets.for_cell(cell)))
            .collect::<Vec<_>>();
        seen.sort_unstable();
        assert_eq!(seen, vec!["first", "last", "lead", "trail"]);
    }

    #[test]
    fn week_grid_ignores_events_outside_the_week() {
        let events = events(&[("mon", "2025-07-14"), ("next-sun", "2025-07-20")]);
        let cells = build_week_grid(date(2025, 6, 16), Weekday::Sun, date(2025, 6, 16));
        let buckets = bucketize(&events, &cells);
        assert_eq!(buckets.event_count(), 1);
        assert_eq!(ids(buckets.for_cell(&cells[1])), vec!["mon"]);
        assert!(cells.iter().all(|cell| cell.date != date(2025, 6, 20)));
    }

    #[test]
    fn year_buckets_match_on_year_and_month() {
        let events = events(&[
            ("jan", "2025-01-31"),
            ("jul-a", "2025-07-01"),
            ("jul-b", "2025-07-31"),
            ("old", "2024-07-04"),
        ]);
        let buckets = bucketize_months(&events, 2025);
        assert_eq!(
            ids(buckets.for_key(&CellKey::Month { year: 2025, month: 6 })),
            vec!["jul-a", "jul-b"]
        );
        assert_eq!(buckets.event_count(), 3);

        let months = build_year_grid(2025, &events, date(2025, 6, 1));
        assert_eq!(ids(&months[0].events), vec!["jan"]);
        assert_eq!(months.iter().map(|m| m.events.len()).sum::<usize>(), 3);
    }
}
