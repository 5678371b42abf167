use std::fs;
use std::path::{
  Path,
  PathBuf
};

use agenda_shared::CenterId;
use anyhow::Context;
use chrono::Weekday;
use chrono_tz::Tz;
use serde::Deserialize;
use tracing::{
  debug,
  info,
  warn
};

use crate::date::parse_week_start;
use crate::event::CategoryTable;

/// The defaults shipped with the
/// crate, kept in sync with
/// [`AgendaConfig::default`].
pub const DEFAULT_CONFIG_TOML: &str =
  include_str!("../agenda.toml");

const CONFIG_ENV_VAR: &str =
  "AGENDA_CONFIG";
const CONFIG_DIR_NAME: &str = "agenda";
const CONFIG_FILE_NAME: &str =
  "agenda.toml";
const DEFAULT_TIMEZONE: &str =
  "America/Santo_Domingo";

#[derive(
  Debug, Clone, PartialEq, Deserialize,
)]
pub struct AgendaConfig {
  #[serde(default)]
  pub version:    u32,
  #[serde(default)]
  pub timezone:   Option<String>,
  #[serde(default)]
  pub policies:   Policies,
  #[serde(default)]
  pub status:     StatusThresholds,
  #[serde(default)]
  pub categories: CategoryConfig
}

#[derive(
  Debug, Clone, PartialEq, Deserialize,
)]
pub struct Policies {
  #[serde(
    default = "default_week_start"
  )]
  pub week_start:     String,
  #[serde(
    default = "default_upcoming_limit"
  )]
  pub upcoming_limit: usize,
  /// Only show events held at this
  /// center; all centers when unset.
  #[serde(default)]
  pub center:         Option<String>
}

/// Occupancy ratios above which an
/// event is tagged critical or
/// confirmed.
#[derive(
  Debug, Clone, Copy, PartialEq, Deserialize,
)]
pub struct StatusThresholds {
  #[serde(
    default = "default_critical_above"
  )]
  pub critical_above:  f64,
  #[serde(
    default = "default_confirmed_above"
  )]
  pub confirmed_above: f64
}

#[derive(
  Debug, Clone, PartialEq, Deserialize,
)]
pub struct CategoryConfig {
  #[serde(
    default = "default_category_fallback"
  )]
  pub fallback: String,
  #[serde(
    default = "default_category_rules"
  )]
  pub rules:    Vec<CategoryRuleConfig>
}

#[derive(
  Debug, Clone, PartialEq, Deserialize,
)]
pub struct CategoryRuleConfig {
  pub pattern: String,
  pub kind:    String
}

fn default_week_start() -> String {
  "sunday".to_string()
}

fn default_upcoming_limit() -> usize {
  5
}

fn default_critical_above() -> f64 {
  0.9
}

fn default_confirmed_above() -> f64 {
  0.5
}

fn default_category_fallback()
-> String {
  "general".to_string()
}

fn default_category_rules()
-> Vec<CategoryRuleConfig> {
  [
    (
      "(?i)cine|cinema|film|pel[ií]cula",
      "cinema"
    ),
    (
      "(?i)concierto|concert|m[uú]sica",
      "concert"
    ),
    ("(?i)taller|workshop", "workshop"),
    (
      "(?i)charla|conferencia|talk",
      "talk"
    ),
    (
      r"(?i)exposici[oó]n|exhibi|\barte\b",
      "exhibition"
    ),
    (
      r"(?i)\b3d\b|inmersiv|immersive|\bvr\b",
      "immersive"
    )
  ]
  .into_iter()
  .map(|(pattern, kind)| {
    CategoryRuleConfig {
      pattern: pattern.to_string(),
      kind:    kind.to_string()
    }
  })
  .collect()
}

impl Default for AgendaConfig {
  fn default() -> Self {
    Self {
      version:    1,
      timezone:   Some(
        DEFAULT_TIMEZONE.to_string()
      ),
      policies:   Policies::default(),
      status:     StatusThresholds::default(
      ),
      categories: CategoryConfig::default(
      )
    }
  }
}

impl Default for Policies {
  fn default() -> Self {
    Self {
      week_start:     default_week_start(
      ),
      upcoming_limit:
        default_upcoming_limit(),
      center:         None
    }
  }
}

impl Default for StatusThresholds {
  fn default() -> Self {
    Self {
      critical_above:
        default_critical_above(),
      confirmed_above:
        default_confirmed_above()
    }
  }
}

impl Default for CategoryConfig {
  fn default() -> Self {
    Self {
      fallback:
        default_category_fallback(),
      rules: default_category_rules()
    }
  }
}

impl AgendaConfig {
  /// Loads the config from the first
  /// location that applies: explicit
  /// path, `AGENDA_CONFIG`, the user
  /// config dir. Falls back to the
  /// built-in defaults.
  #[tracing::instrument(skip(
    override_path
  ))]
  pub fn load(
    override_path: Option<&Path>
  ) -> anyhow::Result<Self> {
    match resolve_config_path(
      override_path
    ) {
      | Some(path) => {
        Self::from_file(&path)
      }
      | None => {
        info!(
          "no config file found; using \
           built-in defaults"
        );
        Ok(Self::default())
      }
    }
  }

  #[tracing::instrument]
  pub fn from_file(
    path: &Path
  ) -> anyhow::Result<Self> {
    let raw = fs::read_to_string(path)
      .with_context(|| {
        format!(
          "failed to read {}",
          path.display()
        )
      })?;
    let config =
      Self::from_toml_str(&raw)
        .with_context(|| {
          format!(
            "invalid config {}",
            path.display()
          )
        })?;
    info!(
      file = %path.display(),
      version = config.version,
      week_start = %config.policies.week_start,
      "loaded agenda config"
    );
    Ok(config)
  }

  pub fn from_toml_str(
    raw: &str
  ) -> anyhow::Result<Self> {
    let mut config =
      toml::from_str::<Self>(raw)
        .context(
          "failed parsing config toml"
        )?;
    config.sanitize();
    CategoryTable::from_config(
      &config.categories
    )?;
    Ok(config)
  }

  pub fn week_start(&self) -> Weekday {
    parse_week_start(
      &self.policies.week_start
    )
    .unwrap_or(Weekday::Sun)
  }

  pub fn center(
    &self
  ) -> Option<CenterId> {
    self
      .policies
      .center
      .as_deref()
      .and_then(CenterId::from_key)
  }

  pub fn timezone(&self) -> Tz {
    self
      .timezone
      .as_deref()
      .and_then(|raw| {
        parse_timezone(raw, "config")
      })
      .or_else(|| {
        parse_timezone(
          DEFAULT_TIMEZONE,
          "default"
        )
      })
      .unwrap_or(chrono_tz::UTC)
  }

  fn sanitize(&mut self) {
    if parse_week_start(
      &self.policies.week_start
    )
    .is_none()
    {
      warn!(
        week_start = %self.policies.week_start,
        "unknown week start; using sunday"
      );
      self.policies.week_start =
        default_week_start();
    }

    let unknown_center = self
      .policies
      .center
      .as_deref()
      .filter(|key| {
        CenterId::from_key(key).is_none()
      })
      .map(str::to_string);
    if let Some(center) = unknown_center
    {
      warn!(
        center = %center,
        "unknown center; showing all \
         centers"
      );
      self.policies.center = None;
    }

    if self.policies.upcoming_limit == 0
    {
      self.policies.upcoming_limit =
        default_upcoming_limit();
    }

    let status = self.status;
    let in_range = |value: f64| {
      (0.0..=1.0).contains(&value)
    };
    if !in_range(status.critical_above)
      || !in_range(
        status.confirmed_above
      )
      || status.confirmed_above
        > status.critical_above
    {
      warn!(
        critical_above =
          status.critical_above,
        confirmed_above =
          status.confirmed_above,
        "status thresholds out of \
         order; using defaults"
      );
      self.status =
        StatusThresholds::default();
    }

    if self
      .categories
      .fallback
      .trim()
      .is_empty()
    {
      self.categories.fallback =
        default_category_fallback();
    }
  }
}

fn resolve_config_path(
  override_path: Option<&Path>
) -> Option<PathBuf> {
  if let Some(path) = override_path {
    return Some(path.to_path_buf());
  }

  if let Ok(raw) =
    std::env::var(CONFIG_ENV_VAR)
  {
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
      debug!(
        path = %trimmed,
        "config path from environment"
      );
      return Some(PathBuf::from(
        trimmed
      ));
    }
  }

  let candidate = dirs::config_dir()?
    .join(CONFIG_DIR_NAME)
    .join(CONFIG_FILE_NAME);
  if candidate.exists() {
    return Some(candidate);
  }

  debug!(
    candidate = %candidate.display(),
    "user config file not found"
  );
  None
}

fn parse_timezone(
  raw: &str,
  source: &str
) -> Option<Tz> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    return None;
  }

  match trimmed.parse::<Tz>() {
    | Ok(tz) => Some(tz),
    | Err(error) => {
      tracing::error!(
        source,
        timezone = %trimmed,
        error = %error,
        "invalid timezone id"
      );
      None
    }
  }
}
