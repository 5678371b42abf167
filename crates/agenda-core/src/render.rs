use std::io::{self, IsTerminal, Write};

use unicode_width::UnicodeWidthStr;

use crate::calendar::Calendar;
use crate::clock::Clock;
use crate::event::{CalendarEvent, SkippedEvent, StatusTag};
use crate::grid::{Grid, GridCell, MonthBucket};
use crate::summary::PeriodSummary;

const MONTH_CELL_WIDTH: usize = 7;

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    /// Colour is only emitted when asked for and stdout is a terminal.
    pub fn new(color: bool) -> Self {
        Self {
            color: color && io::stdout().is_terminal(),
        }
    }

    pub fn plain() -> Self {
        Self { color: false }
    }

    #[tracing::instrument(skip_all)]
    pub fn write_view<W: Write, C: Clock>(
        &self,
        out: &mut W,
        calendar: &Calendar<C>,
    ) -> anyhow::Result<()> {
        writeln!(out, "{}", calendar.title())?;
        writeln!(out)?;

        match calendar.grid() {
            Grid::Months(months) => self.write_year(out, months)?,
            Grid::Cells(cells) if cells.len() > 7 => self.write_month(out, calendar, cells)?,
            Grid::Cells(cells) => self.write_days(out, calendar, cells)?,
        }

        writeln!(out)?;
        self.write_summary(out, &calendar.summary())?;
        Ok(())
    }

    fn write_month<W: Write, C: Clock>(
        &self,
        out: &mut W,
        calendar: &Calendar<C>,
        cells: &[GridCell],
    ) -> anyhow::Result<()> {
        for cell in cells.iter().take(7) {
            write!(out, "{}", pad(&cell.date.format("%a"), MONTH_CELL_WIDTH))?;
        }
        writeln!(out)?;

        for week in cells.chunks(7) {
            for cell in week {
                let count = calendar.buckets_for(cell).len();
                let mut label = format!("{:>2}", cell.date.day());
                if count > 0 {
                    label.push_str(&format!(" +{count}"));
                }
                let padded = pad(&label, MONTH_CELL_WIDTH);
                let painted = if cell.is_today {
                    self.paint(&padded, "7")
                } else if !cell.in_current_period {
                    self.paint(&padded, "2")
                } else {
                    padded
                };
                write!(out, "{painted}")?;
            }
            writeln!(out)?;
        }
        Ok(())
    }

    fn write_days<W: Write, C: Clock>(
        &self,
        out: &mut W,
        calendar: &Calendar<C>,
        cells: &[GridCell],
    ) -> anyhow::Result<()> {
        for cell in cells {
            let events = calendar.buckets_for(cell);
            let heading = format!("{} ({})", cell.date.format("%a %Y-%m-%d"), events.len());
            if cell.is_today {
                writeln!(out, "{}", self.paint(&heading, "1"))?;
            } else {
                writeln!(out, "{heading}")?;
            }
            for event in events {
                write!(
                    out,
                    "  {}  {}  [{}]  {}/{}  {}",
                    event.time,
                    display_title(event),
                    event.kind,
                    event.attendees,
                    event.capacity,
                    self.paint_status(event.status)
                )?;
                if let Some(center) = event.center {
                    write!(out, "  @{}", center.as_key())?;
                }
                if !event.published {
                    write!(out, "  {}", self.paint("draft", "2"))?;
                }
                writeln!(out)?;
            }
        }
        Ok(())
    }

    fn write_year<W: Write>(&self, out: &mut W, months: &[MonthBucket]) -> anyhow::Result<()> {
        let headers = vec![
            "Month".to_string(),
            "Events".to_string(),
            "Critical".to_string(),
            "Seats".to_string(),
        ];
        let rows = months
            .iter()
            .map(|bucket| {
                let critical = bucket
                    .events
                    .iter()
                    .filter(|event| event.status == StatusTag::Critical)
                    .count();
                let attendees: u64 = bucket.events.iter().map(|e| u64::from(e.attendees)).sum();
                let capacity: u64 = bucket.events.iter().map(|e| u64::from(e.capacity)).sum();
                let name = bucket.first_day.format("%B");
                let name = if bucket.is_current_month {
                    self.paint(&name, "1")
                } else {
                    name
                };
                vec![
                    name,
                    bucket.events.len().to_string(),
                    critical.to_string(),
                    format!("{attendees}/{capacity}"),
                ]
            })
            .collect();

        write_table(out, headers, rows)
    }

    pub fn write_upcoming<W: Write>(
        &self,
        out: &mut W,
        events: &[CalendarEvent],
    ) -> anyhow::Result<()> {
        if events.is_empty() {
            writeln!(out, "No upcoming events.")?;
            return Ok(());
        }

        let headers = vec![
            "Date".to_string(),
            "Time".to_string(),
            "Title".to_string(),
            "Category".to_string(),
            "Seats".to_string(),
            "Price".to_string(),
            "Status".to_string(),
        ];
        let rows = events
            .iter()
            .map(|event| {
                vec![
                    event.date.to_string(),
                    event.time.clone(),
                    display_title(event).to_string(),
                    event.category.clone(),
                    format!("{}/{}", event.attendees, event.capacity),
                    display_price(event.price),
                    self.paint_status(event.status),
                ]
            })
            .collect();

        write_table(out, headers, rows)
    }

    pub fn write_skipped<W: Write>(
        &self,
        out: &mut W,
        skipped: &[SkippedEvent],
    ) -> anyhow::Result<()> {
        if skipped.is_empty() {
            return Ok(());
        }

        writeln!(
            out,
            "{}",
            self.paint(&format!("Skipped {} invalid event(s):", skipped.len()), "33")
        )?;
        for entry in skipped {
            writeln!(
                out,
                "  #{} {}: {}",
                entry.index + 1,
                entry.id.as_deref().unwrap_or("-"),
                entry.error
            )?;
        }
        Ok(())
    }

    pub fn write_summary<W: Write>(
        &self,
        out: &mut W,
        summary: &PeriodSummary,
    ) -> anyhow::Result<()> {
        writeln!(
            out,
            "{} event(s): {} critical, {} confirmed, {} pending; {} published, {} draft(s); \
             {}/{} seats ({:.0}%)",
            summary.total,
            summary.critical,
            summary.confirmed,
            summary.pending,
            summary.published,
            summary.drafts,
            summary.attendees,
            summary.capacity,
            summary.occupancy() * 100.0
        )?;
        Ok(())
    }

    fn paint_status(&self, status: StatusTag) -> String {
        let code = match status {
            StatusTag::Critical => "31",
            StatusTag::Confirmed => "32",
            StatusTag::Pending => "33",
        };
        self.paint(status.as_key(), code)
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn display_title(event: &CalendarEvent) -> &str {
    if event.title.trim().is_empty() {
        &event.category
    } else {
        &event.title
    }
}

fn display_price(price: f64) -> String {
    if price > 0.0 {
        format!("{price:.2}")
    } else {
        "free".to_string()
    }
}

fn pad(text: &str, width: usize) -> String {
    let visible = UnicodeWidthStr::width(text);
    format!("{text}{}", " ".repeat(width.saturating_sub(visible)))
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate().take(column_count) {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    for (header, width) in headers.iter().zip(&widths) {
        write!(writer, "{} ", pad(header, *width))?;
    }
    writeln!(writer)?;

    for width in &widths {
        write!(writer, "{:-<width$} ", "", width = *width)?;
    }
    writeln!(writer)?;

    for row in rows {
        for (cell, width) in row.iter().zip(&widths) {
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = width.saturating_sub(visible_width);
            write!(writer, "{}{} ", cell, " ".repeat(padding))?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}
