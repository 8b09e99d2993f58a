use std::fs;
use std::path::{
  Path,
  PathBuf
};

use anyhow::{
  Context,
  anyhow
};
use chrono::{
  NaiveDate,
  Weekday
};
use chrono_tz::Tz;
use serde::{
  Deserialize,
  Serialize
};
use tracing::{
  debug,
  info,
  warn
};

use crate::datetime::{
  today_in,
  week_start_from_name
};
use crate::interaction::GestureOverlap;
use crate::task::Category;

const CONFIG_ENV_VAR: &str =
  "ALMANAC_CONFIG";
const TIMEZONE_ENV_VAR: &str =
  "ALMANAC_TIMEZONE";
const CONFIG_DIR_NAME: &str = "almanac";
const CONFIG_FILE_NAME: &str =
  "almanac.toml";

fn default_week_start() -> String {
  "sunday".to_string()
}

#[derive(
  Debug,
  Clone,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
)]
#[serde(default)]
pub struct CalendarPolicies {
  pub week_start:      String,
  pub gesture_overlap: GestureOverlap
}

impl Default for CalendarPolicies {
  fn default() -> Self {
    Self {
      week_start:      default_week_start(
      ),
      gesture_overlap:
        GestureOverlap::default()
    }
  }
}

#[derive(
  Debug,
  Clone,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
)]
#[serde(default)]
pub struct CalendarConfig {
  pub timezone:         Option<String>,
  pub default_category: Category,
  pub policies:         CalendarPolicies,
  #[serde(skip)]
  pub loaded_from:      Option<PathBuf>
}

impl Default for CalendarConfig {
  fn default() -> Self {
    Self {
      timezone:         None,
      default_category: Category::ToDo,
      policies:
        CalendarPolicies::default(),
      loaded_from:      None
    }
  }
}

impl CalendarConfig {
  /// Loads from `override_path`,
  /// `$ALMANAC_CONFIG`, or the user
  /// config dir, in that order. Only an
  /// explicit path has to exist.
  #[tracing::instrument(skip(
    override_path
  ))]
  pub fn load(
    override_path: Option<&Path>
  ) -> anyhow::Result<Self> {
    let explicit =
      override_path.is_some();
    let mut cfg = match resolve_config_path(
      override_path
    ) {
      | Some(path) if path.exists() => {
        Self::load_file(&path)?
      }
      | Some(path) if explicit => {
        return Err(anyhow!(
          "config file not found: {}",
          path.display()
        ));
      }
      | Some(path) => {
        info!(
          file = %path.display(),
          "config file not found; \
           using defaults"
        );
        Self::default()
      }
      | None => {
        info!(
          "no config location \
           available; using defaults"
        );
        Self::default()
      }
    };

    if let Ok(raw) =
      std::env::var(TIMEZONE_ENV_VAR)
      && !raw.trim().is_empty()
    {
      debug!(
        timezone = %raw.trim(),
        "timezone overridden from \
         environment"
      );
      cfg.timezone =
        Some(raw.trim().to_string());
    }

    cfg.sanitize();
    Ok(cfg)
  }

  pub fn from_toml_str(
    raw: &str
  ) -> anyhow::Result<Self> {
    let mut cfg =
      toml::from_str::<Self>(raw)
        .context(
          "failed parsing calendar \
           config"
        )?;
    cfg.sanitize();
    Ok(cfg)
  }

  fn load_file(
    path: &Path
  ) -> anyhow::Result<Self> {
    let raw = fs::read_to_string(path)
      .with_context(|| {
        format!(
          "failed to read {}",
          path.display()
        )
      })?;
    let mut cfg =
      Self::from_toml_str(&raw)
        .with_context(|| {
          format!(
            "invalid config in {}",
            path.display()
          )
        })?;
    cfg.loaded_from =
      Some(path.to_path_buf());
    info!(
      file = %path.display(),
      week_start = %cfg.policies.week_start,
      overlap = ?cfg.policies.gesture_overlap,
      "loaded calendar config"
    );
    Ok(cfg)
  }

  /// Replaces unusable values with
  /// defaults instead of failing.
  pub fn sanitize(&mut self) {
    if week_start_from_name(
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

    if let Some(raw) =
      self.timezone.as_ref()
      && parse_timezone(raw).is_none()
    {
      warn!(
        timezone = %raw,
        "unknown timezone; using UTC"
      );
      self.timezone = None;
    }
  }

  #[must_use]
  pub fn week_start(&self) -> Weekday {
    week_start_from_name(
      &self.policies.week_start
    )
    .unwrap_or(Weekday::Sun)
  }

  #[must_use]
  pub fn gesture_overlap(
    &self
  ) -> GestureOverlap {
    self.policies.gesture_overlap
  }

  #[must_use]
  pub fn timezone(&self) -> Tz {
    self
      .timezone
      .as_deref()
      .and_then(parse_timezone)
      .unwrap_or(chrono_tz::UTC)
  }

  #[must_use]
  pub fn today(&self) -> NaiveDate {
    today_in(self.timezone())
  }
}

fn parse_timezone(raw: &str) -> Option<Tz> {
  raw.trim().parse::<Tz>().ok()
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
      return Some(PathBuf::from(
        trimmed
      ));
    }
  }

  dirs::config_dir().map(|dir| {
    dir
      .join(CONFIG_DIR_NAME)
      .join(CONFIG_FILE_NAME)
  })
}
