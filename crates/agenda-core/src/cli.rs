use std::io::IsTerminal;
use std::path::PathBuf;

use agenda_shared::CenterId;
use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

use crate::date::CalendarDate;

/// Log directives for this tool, in `RUST_LOG` syntax. Wins over `-v`/`-q`.
pub const LOG_ENV_VAR: &str = "AGENDA_LOG";

#[derive(Parser, Debug, Clone)]
#[command(
    name = "agenda",
    version,
    about = "Event calendar views for the cultural center backend"
)]
pub struct GlobalCli {
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count, global = true)]
    pub quiet: u8,

    /// Config file; defaults to $AGENDA_CONFIG or the user config dir.
    #[arg(long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// JSON export of events from the backend.
    #[arg(long = "events", global = true)]
    pub events: Option<PathBuf>,

    /// Reference date (YYYY-MM-DD); defaults to today.
    #[arg(long = "date", global = true, value_parser = parse_date_arg)]
    pub date: Option<CalendarDate>,

    /// Only show events at this center (santo-domingo, santiago).
    #[arg(long = "center", global = true, value_parser = parse_center_arg)]
    pub center: Option<CenterId>,

    #[arg(long = "no-color", global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Render a day, week, month or year view.
    View {
        #[arg(default_value = "month")]
        mode: String,

        /// Steps forward from the reference date.
        #[arg(long, default_value_t = 0)]
        next: u32,

        /// Steps back from the reference date.
        #[arg(long, default_value_t = 0)]
        previous: u32,

        /// Day to open when entering day view.
        #[arg(long, value_parser = parse_date_arg)]
        select: Option<CalendarDate>,
    },

    /// List the next events from the reference date.
    Upcoming {
        #[arg(long)]
        limit: Option<usize>,

        #[arg(long, value_parser = parse_date_arg)]
        from: Option<CalendarDate>,
    },

    /// Validate the event export and report rejected records.
    Check,
}

impl Default for Command {
    fn default() -> Self {
        Self::View {
            mode: "month".to_string(),
            next: 0,
            previous: 0,
            select: None,
        }
    }
}

fn parse_date_arg(raw: &str) -> Result<CalendarDate, String> {
    CalendarDate::parse(raw).ok_or_else(|| format!("expected YYYY-MM-DD, got {raw:?}"))
}

fn parse_center_arg(raw: &str) -> Result<CenterId, String> {
    CenterId::from_key(raw).ok_or_else(|| format!("unknown center {raw:?}"))
}

/// Verbosity from the flag counts; `-q` beats `-v`.
fn level_for(verbose: u8, quiet: u8) -> LevelFilter {
    match (quiet, verbose) {
        (2.., _) => LevelFilter::ERROR,
        (1, _) | (0, 0) => LevelFilter::WARN,
        (0, 1) => LevelFilter::INFO,
        (0, 2) => LevelFilter::DEBUG,
        (0, _) => LevelFilter::TRACE,
    }
}

fn log_filter(level: LevelFilter, directives: Option<&str>) -> anyhow::Result<EnvFilter> {
    let builder = EnvFilter::builder().with_default_directive(level.into());
    match directives.map(str::trim).filter(|raw| !raw.is_empty()) {
        Some(raw) => builder
            .parse(raw)
            .with_context(|| format!("invalid {LOG_ENV_VAR} filter {raw:?}")),
        None => Ok(builder.parse_lossy("")),
    }
}

/// Logs go to stderr so rendered views on stdout stay clean.
pub fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let directives = std::env::var(LOG_ENV_VAR).ok();
    let filter = log_filter(level_for(verbose, quiet), directives.as_deref())?;

    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose >= 2)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();

    if let Err(err) = installed {
        debug!(error = %err, "tracing already initialised");
    }
    Ok(())
}
