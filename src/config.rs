use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::Level;

use crate::isolate::Isolated;
use crate::poll::{step_constant, step_linear_double, Poll, Truthy};

/// Named step functions selectable from config.toml.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepFunction {
    #[default]
    Constant,
    Double,
}

impl StepFunction {
    pub fn as_fn(self) -> fn(Duration) -> Duration {
        match self {
            StepFunction::Constant => step_constant,
            StepFunction::Double => step_linear_double,
        }
    }
}

/// Poll parameters loaded from `~/.config/polling/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollSettings {
    /// Initial wait between attempts, in seconds (e.g. 0.25 = 250ms).
    pub step_secs: f64,
    /// "constant" (default) or "double".
    #[serde(default)]
    pub step_function: StepFunction,
    /// Soft deadline in seconds, checked between attempts.
    #[serde(default)]
    pub timeout_secs: Option<f64>,
    /// Maximum number of calls of the target.
    #[serde(default)]
    pub max_tries: Option<u32>,
    /// Poll until success or a fatal error. Excludes timeout_secs/max_tries.
    #[serde(default)]
    pub poll_forever: bool,
    /// Level for values passed to the success check ("debug", "info", ...).
    #[serde(default)]
    pub log: Option<String>,
    /// Level for ignored errors.
    #[serde(default)]
    pub log_error: Option<String>,
    /// Hard timeout in seconds for isolated polls.
    #[serde(default)]
    pub hard_timeout_secs: Option<f64>,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            step_secs: 1.0,
            step_function: StepFunction::Constant,
            timeout_secs: Some(30.0),
            max_tries: None,
            poll_forever: false,
            log: None,
            log_error: None,
            hard_timeout_secs: None,
        }
    }
}

fn secs(field: &str, value: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(value).with_context(|| format!("invalid {} = {}", field, value))
}

fn level(field: &str, value: &str) -> Result<Level> {
    value
        .parse::<Level>()
        .with_context(|| format!("invalid {} level {:?}", field, value))
}

impl PollSettings {
    /// Configure `poll` from these settings.
    pub fn apply<T, E>(&self, poll: Poll<T, E>) -> Result<Poll<T, E>> {
        let mut poll = poll
            .step(secs("step_secs", self.step_secs)?)
            .step_function(self.step_function.as_fn())
            .poll_forever(self.poll_forever);
        if let Some(t) = self.timeout_secs {
            poll = poll.timeout(secs("timeout_secs", t)?);
        }
        if let Some(n) = self.max_tries {
            poll = poll.max_tries(n);
        }
        if let Some(l) = &self.log {
            poll = poll.log(level("log", l)?);
        }
        if let Some(l) = &self.log_error {
            poll = poll.log_error(level("log_error", l)?);
        }
        Ok(poll)
    }

    /// A truthy-checking poll built from these settings.
    pub fn build<T: Truthy + 'static, E>(&self) -> Result<Poll<T, E>> {
        self.apply(Poll::new(Duration::ZERO))
    }

    /// Configure `poll` and wrap it for isolated runs, with the hard timeout
    /// set when `hard_timeout_secs` is present.
    pub fn isolated<T, E>(&self, poll: Poll<T, E>) -> Result<Isolated<T, E>> {
        let mut isolated = self.apply(poll)?.isolate();
        if let Some(t) = self.hard_timeout_secs {
            isolated = isolated.hard_timeout(secs("hard_timeout_secs", t)?);
        }
        Ok(isolated)
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("polling")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load settings from `path`.
pub fn load_from_path(path: &Path) -> Result<PollSettings> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let cfg: PollSettings = toml::from_str(&data)?;
    Ok(cfg)
}

/// Load `path`, writing the defaults there first if it does not exist.
pub fn load_or_init_at(path: &Path) -> Result<PollSettings> {
    if !path.exists() {
        let default_cfg = PollSettings::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from_path(path)
}

/// Load configuration from the XDG config dir, creating a default file if none exists.
pub fn load_or_init() -> Result<PollSettings> {
    load_or_init_at(&config_path()?)
}
