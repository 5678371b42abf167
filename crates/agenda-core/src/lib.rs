pub mod bucket;
pub mod calendar;
pub mod cli;
pub mod clock;
pub mod commands;
pub mod config;
pub mod date;
pub mod error;
pub mod event;
pub mod grid;
pub mod navigator;
pub mod render;
pub mod source;
pub mod summary;
pub mod upcoming;

use std::ffi::OsString;
use std::io;

use anyhow::Context;
use clap::Parser;
use tracing::{
  debug,
  info
};

pub use calendar::{
  Calendar,
  CalendarListener
};
pub use date::CalendarDate;
pub use error::{
  CalendarError,
  InvalidEventError,
  InvalidViewModeError
};
pub use event::CalendarEvent;
pub use grid::{
  Grid,
  GridCell,
  ViewMode
};
pub use navigator::ViewState;

#[tracing::instrument(skip_all)]
pub fn run(
  raw_args: Vec<OsString>
) -> anyhow::Result<()> {
  let cli =
    cli::GlobalCli::parse_from(raw_args);

  cli::init_tracing(
    cli.verbose,
    cli.quiet
  )?;

  info!(
    verbose = cli.verbose,
    quiet = cli.quiet,
    "starting agenda CLI"
  );
  debug!(?cli.command, "parsed command");

  let config =
    config::AgendaConfig::load(
      cli.config.as_deref()
    )
    .context(
      "failed to load agenda config"
    )?;

  let mut calendar =
    Calendar::from_config(&config)?;
  if let Some(date) = cli.date {
    let mode =
      calendar.state().view_mode;
    calendar = calendar.with_state(
      ViewState::new(date, mode)
    );
  }

  if cli.center.is_some() {
    calendar.set_center(cli.center);
  }

  if let Some(path) = cli.events {
    let source =
      source::JsonFileSource::new(path);
    calendar
      .refresh(&source)
      .with_context(|| {
        format!(
          "failed to load events from \
           {}",
          source.path().display()
        )
      })?;
  }

  let renderer =
    render::Renderer::new(!cli.no_color);
  let mut out = io::stdout().lock();
  commands::dispatch(
    &mut calendar,
    &renderer,
    cli.command.unwrap_or_default(),
    &mut out
  )?;

  info!("done");
  Ok(())
}
