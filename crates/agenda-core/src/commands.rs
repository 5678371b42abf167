use std::io::Write;

use anyhow::anyhow;
use tracing::{info, instrument};

use crate::calendar::Calendar;
use crate::cli::Command;
use crate::clock::Clock;
use crate::date::CalendarDate;
use crate::grid::ViewMode;
use crate::navigator::Direction;
use crate::render::Renderer;

#[instrument(skip(calendar, renderer, out))]
pub fn dispatch<C: Clock, W: Write>(
    calendar: &mut Calendar<C>,
    renderer: &Renderer,
    command: Command,
    out: &mut W,
) -> anyhow::Result<()> {
    match command {
        Command::View {
            mode,
            next,
            previous,
            select,
        } => cmd_view(calendar, renderer, &mode, next, previous, select, out),
        Command::Upcoming { limit, from } => {
            info!("command upcoming");
            let from = from.unwrap_or(calendar.state().reference_date);
            let limit = limit.unwrap_or(calendar.upcoming_limit());
            renderer.write_upcoming(out, &calendar.upcoming_from(from, limit))?;
            renderer.write_skipped(out, calendar.skipped())
        }
        Command::Check => cmd_check(calendar, renderer, out),
    }
}

fn cmd_view<C: Clock, W: Write>(
    calendar: &mut Calendar<C>,
    renderer: &Renderer,
    mode: &str,
    next: u32,
    previous: u32,
    select: Option<CalendarDate>,
    out: &mut W,
) -> anyhow::Result<()> {
    info!(mode, next, previous, "command view");
    match select {
        Some(date) => {
            let mode: ViewMode = mode.parse()?;
            calendar.switch_mode(mode, Some(date));
        }
        None => {
            calendar.set_mode(mode)?;
        }
    }

    calendar.step_by(Direction::Next, next);
    calendar.step_by(Direction::Previous, previous);

    renderer.write_view(out, calendar)?;
    renderer.write_skipped(out, calendar.skipped())
}

fn cmd_check<C: Clock, W: Write>(
    calendar: &Calendar<C>,
    renderer: &Renderer,
    out: &mut W,
) -> anyhow::Result<()> {
    info!("command check");
    writeln!(out, "{} valid event(s)", calendar.events().len())?;
    renderer.write_skipped(out, calendar.skipped())?;

    let skipped = calendar.skipped().len();
    if skipped > 0 {
        return Err(anyhow!("{skipped} invalid event(s) in export"));
    }
    Ok(())
}
