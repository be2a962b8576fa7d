//! Coordinator configuration.
//!
//! Values come from three layers, later ones winning:
//!
//! 1. Built-in defaults (see [`gradcheck_core::constants`])
//! 2. An optional TOML file
//! 3. `GRADCHECK_*` environment variables
//!
//! ```
//! use gradcheck_coordinator::CoordinatorConfig;
//!
//! let config: CoordinatorConfig = toml::from_str(r#"
//!     server_url = "http://10.0.0.5:5000"
//!     recognition_poll_ms = 2000
//! "#).unwrap();
//!
//! assert_eq!(config.recognition_poll_ms, 2000);
//! assert_eq!(config.countdown_ticks, 10);
//! assert!(config.validate().is_ok());
//! ```

use std::path::Path;
use std::time::Duration;

use gradcheck_core::{Error, Result, constants::*};
use serde::{Deserialize, Serialize};

/// Timing and collaborator settings for the coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// Base URL of the kiosk server.
    pub server_url: String,
    /// Timeout for each collaborator request.
    pub request_timeout_ms: u64,
    /// Recognition poll period for stations 1 and 2.
    pub recognition_poll_ms: u64,
    /// Code poll period while a handshake waits for the scanned code.
    pub code_poll_ms: u64,
    /// Give up waiting for the scanned code after this long.
    pub code_wait_max_secs: u64,
    /// Visible countdown length after a successful verification.
    pub countdown_ticks: u32,
    /// Length of one countdown tick.
    pub countdown_tick_ms: u64,
    /// How long a station 2 scan stays on screen.
    pub station2_dwell_ms: u64,
    /// Queue refresh period while the queue monitor is active.
    pub queue_refresh_ms: u64,
    /// Photo location template (`{id}`, `{name}`).
    pub photo_url_template: String,
    /// Ticket code location template (`{id}`, `{name}`).
    pub code_artifact_template: String,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            recognition_poll_ms: DEFAULT_RECOGNITION_POLL_MS,
            code_poll_ms: DEFAULT_CODE_POLL_MS,
            code_wait_max_secs: DEFAULT_CODE_WAIT_MAX_SECS,
            countdown_ticks: DEFAULT_COUNTDOWN_TICKS,
            countdown_tick_ms: DEFAULT_COUNTDOWN_TICK_MS,
            station2_dwell_ms: DEFAULT_STATION2_DWELL_MS,
            queue_refresh_ms: DEFAULT_QUEUE_REFRESH_MS,
            photo_url_template: DEFAULT_PHOTO_URL_TEMPLATE.to_string(),
            code_artifact_template: DEFAULT_CODE_ARTIFACT_TEMPLATE.to_string(),
        }
    }
}

impl CoordinatorConfig {
    /// Load a TOML file. Missing keys keep their defaults.
    ///
    /// # Errors
    /// Returns `Error::Io` if the file cannot be read and `Error::Config` if it
    /// is not valid TOML for this structure.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        toml::from_str(&text)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e.message())))
    }

    /// Apply `GRADCHECK_*` environment overrides.
    ///
    /// # Errors
    /// Returns `Error::Config` if a numeric variable does not parse.
    pub fn apply_env(mut self) -> Result<Self> {
        self.apply_vars(|key| std::env::var(key).ok())?;
        Ok(self)
    }

    fn apply_vars(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(url) = lookup("GRADCHECK_SERVER_URL") {
            self.server_url = url;
        }
        if let Some(template) = lookup("GRADCHECK_PHOTO_URL_TEMPLATE") {
            self.photo_url_template = template;
        }
        if let Some(template) = lookup("GRADCHECK_CODE_ARTIFACT_TEMPLATE") {
            self.code_artifact_template = template;
        }

        let numeric: [(&str, &mut u64); 7] = [
            ("GRADCHECK_REQUEST_TIMEOUT_MS", &mut self.request_timeout_ms),
            ("GRADCHECK_RECOGNITION_POLL_MS", &mut self.recognition_poll_ms),
            ("GRADCHECK_CODE_POLL_MS", &mut self.code_poll_ms),
            ("GRADCHECK_CODE_WAIT_MAX_SECS", &mut self.code_wait_max_secs),
            ("GRADCHECK_COUNTDOWN_TICK_MS", &mut self.countdown_tick_ms),
            ("GRADCHECK_STATION2_DWELL_MS", &mut self.station2_dwell_ms),
            ("GRADCHECK_QUEUE_REFRESH_MS", &mut self.queue_refresh_ms),
        ];
        for (key, slot) in numeric {
            if let Some(value) = lookup(key) {
                *slot = parse_var(key, &value)?;
            }
        }

        if let Some(value) = lookup("GRADCHECK_COUNTDOWN_TICKS") {
            self.countdown_ticks = parse_var("GRADCHECK_COUNTDOWN_TICKS", &value)?;
        }
        Ok(())
    }

    /// Check that every period is usable.
    ///
    /// # Errors
    /// Returns `Error::Config` for zero periods, an empty server URL, or a
    /// code wait shorter than a single code poll.
    pub fn validate(&self) -> Result<()> {
        if self.server_url.trim().is_empty() {
            return Err(Error::MissingConfig("server_url".to_string()));
        }

        let periods = [
            ("request_timeout_ms", self.request_timeout_ms),
            ("recognition_poll_ms", self.recognition_poll_ms),
            ("code_poll_ms", self.code_poll_ms),
            ("countdown_tick_ms", self.countdown_tick_ms),
            ("station2_dwell_ms", self.station2_dwell_ms),
            ("queue_refresh_ms", self.queue_refresh_ms),
        ];
        if let Some((name, _)) = periods.iter().find(|(_, value)| *value == 0) {
            return Err(Error::Config(format!("{name} must be greater than zero")));
        }

        if self.countdown_ticks == 0 {
            return Err(Error::Config(
                "countdown_ticks must be greater than zero".to_string(),
            ));
        }

        if self.code_wait_max_secs.saturating_mul(1000) < self.code_poll_ms {
            return Err(Error::Config(format!(
                "code_wait_max_secs ({}s) is shorter than one code poll ({}ms)",
                self.code_wait_max_secs, self.code_poll_ms
            )));
        }

        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn recognition_poll(&self) -> Duration {
        Duration::from_millis(self.recognition_poll_ms)
    }

    pub fn code_poll(&self) -> Duration {
        Duration::from_millis(self.code_poll_ms)
    }

    pub fn code_wait_max(&self) -> Duration {
        Duration::from_secs(self.code_wait_max_secs)
    }

    pub fn countdown_tick(&self) -> Duration {
        Duration::from_millis(self.countdown_tick_ms)
    }

    pub fn station2_dwell(&self) -> Duration {
        Duration::from_millis(self.station2_dwell_ms)
    }

    pub fn queue_refresh(&self) -> Duration {
        Duration::from_millis(self.queue_refresh_ms)
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("{key}={value} is not a valid number")))
}
