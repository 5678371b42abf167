use crate::date::CalendarDate;
use crate::event::CalendarEvent;

/// Events on or after `from`, earliest first, at most `limit` of them.
/// Events sharing a date keep their input order.
pub fn upcoming(events: &[CalendarEvent], from: CalendarDate, limit: usize) -> Vec<CalendarEvent> {
    let mut selected = events
        .iter()
        .filter(|event| event.date >= from)
        .collect::<Vec<_>>();
    selected.sort_by_key(|event| event.date);
    selected.into_iter().take(limit).cloned().collect()
}

#[cfg(test)]
mod tests {
    use agenda_shared::RawEvent;

    use super::*;
    use crate::config::AgendaConfig;
    use crate::event::Normalizer;

    fn event(id: &str, day: &str) -> CalendarEvent {
        Normalizer::from_config(&AgendaConfig::default())
            .expect("config")
            .normalize(&RawEvent {
                id: Some(id.to_string()),
                date: Some(day.to_string()),
                category: "Talleres".to_string(),
                capacity: Some(20),
                ..RawEvent::default()
            })
            .expect("valid event")
    }

    fn ids(events: &[CalendarEvent]) -> Vec<&str> {
        events.iter().map(|event| event.id.as_str()).collect()
    }

    fn from() -> CalendarDate {
        CalendarDate::from_ymd(2025, 6, 10).expect("valid date")
    }

    #[test]
    fn filters_sorts_and_caps() {
        let events = vec![
            event("late", "2025-08-01"),
            event("past", "2025-07-09"),
            event("first", "2025-07-10"),
            event("mid", "2025-07-20"),
        ];

        assert_eq!(ids(&upcoming(&events, from(), 2)), vec!["first", "mid"]);
        assert_eq!(ids(&upcoming(&events, from(), 10)), vec!["first", "mid", "late"]);
        assert!(upcoming(&events, from(), 0).is_empty());
    }

    #[test]
    fn ties_keep_input_order() {
        let events = vec![
            event("z", "2025-07-12"),
            event("early", "2025-07-11"),
            event("a", "2025-07-12"),
            event("m", "2025-07-12"),
        ];
        assert_eq!(ids(&upcoming(&events, from(), 4)), vec!["early", "z", "a", "m"]);
    }

    #[test]
    fn is_idempotent_and_never_returns_past_events() {
        let events = vec![
            event("a", "2025-07-01"),
            event("b", "2025-07-15"),
            event("c", "2025-07-10"),
        ];
        let first = upcoming(&events, from(), 5);
        let second = upcoming(&events, from(), 5);
        assert_eq!(first, second);
        assert!(first.iter().all(|event| event.date >= from()));
        assert_eq!(upcoming(&first, from(), 5), first);
    }
}
