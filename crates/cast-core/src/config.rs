//! Email configuration consumed by the reply waiter.

use std::path::Path;
use std::time::Duration;

use cast_imap::Security;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default IMAP folder.
pub const DEFAULT_FOLDER: &str = "INBOX";
/// Default per-operation I/O timeout, in seconds.
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 60;
/// Default poll interval, in seconds.
pub const DEFAULT_POLL_INTERVAL_SECONDS: u64 = 5;
/// Poll interval bounds, in seconds.
pub const POLL_INTERVAL_BOUNDS: (u64, u64) = (3, 60);
/// Default wait ceiling, in minutes.
pub const DEFAULT_MAX_WAIT_MINUTES: u32 = 120;
/// Wait used when neither the caller nor the config names one, in minutes.
pub const FALLBACK_WAIT_MINUTES: u32 = 30;

/// Poll interval clamped to [`POLL_INTERVAL_BOUNDS`]; 0 means the default.
#[must_use]
pub fn clamp_poll_interval(seconds: u64) -> Duration {
    let seconds = match seconds {
        0 => DEFAULT_POLL_INTERVAL_SECONDS,
        s => s.clamp(POLL_INTERVAL_BOUNDS.0, POLL_INTERVAL_BOUNDS.1),
    };
    Duration::from_secs(seconds)
}

/// The `email` section of the configuration file.
///
/// Field names follow the on-disk keys. Zero values mean "use the default";
/// call [`EmailConfig::with_defaults`] to resolve them.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    /// IMAP server hostname.
    pub imap_host: String,
    /// IMAP server port; 0 picks the security mode's default.
    pub imap_port: u16,
    /// IMAP login name.
    pub imap_username: String,
    /// IMAP password.
    pub imap_password: String,
    /// Upgrade a plaintext connection with STARTTLS.
    pub imap_use_tls: bool,
    /// Connect with implicit TLS.
    pub imap_use_ssl: bool,
    /// Mailbox searched for replies.
    pub imap_folder: String,
    /// Per-operation I/O timeout, in seconds.
    pub imap_timeout_seconds: u64,
    /// Seconds between poll cycles.
    pub imap_poll_interval_seconds: u64,
    /// Wait used when the caller does not name one, in minutes.
    pub wait_for_response_default_minutes: u32,
    /// Longest wait a caller may request, in minutes.
    pub wait_for_response_max_minutes: u32,
    /// Body lines shown before truncating; 0 shows everything.
    pub wait_for_response_max_lines: i64,
    /// Include HTML parts in the extracted body.
    pub wait_for_response_full_layout: bool,
}

impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("imap_host", &self.imap_host)
            .field("imap_port", &self.imap_port)
            .field("imap_username", &self.imap_username)
            .field("imap_password", &"****")
            .field("imap_use_tls", &self.imap_use_tls)
            .field("imap_use_ssl", &self.imap_use_ssl)
            .field("imap_folder", &self.imap_folder)
            .field("imap_timeout_seconds", &self.imap_timeout_seconds)
            .field("imap_poll_interval_seconds", &self.imap_poll_interval_seconds)
            .field(
                "wait_for_response_default_minutes",
                &self.wait_for_response_default_minutes,
            )
            .field(
                "wait_for_response_max_minutes",
                &self.wait_for_response_max_minutes,
            )
            .field("wait_for_response_max_lines", &self.wait_for_response_max_lines)
            .field(
                "wait_for_response_full_layout",
                &self.wait_for_response_full_layout,
            )
            .finish()
    }
}

/// On-disk layout: other sections are ignored.
#[derive(Deserialize)]
struct ConfigFile {
    #[serde(default)]
    email: EmailConfig,
}

impl EmailConfig {
    /// Parses the `email` section out of a JSON configuration document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is not valid JSON or a field has
    /// the wrong type.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = serde_json::from_str(json)?;
        Ok(file.email)
    }

    /// Reads and parses a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Resolves zero values to their defaults.
    ///
    /// Idempotent. A host with neither security flag and no port is taken
    /// to mean implicit TLS on 993.
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        if self.imap_port == 0 {
            if self.imap_use_ssl {
                self.imap_port = 993;
            } else if self.imap_use_tls {
                self.imap_port = 143;
            } else if !self.imap_host.is_empty() {
                self.imap_use_ssl = true;
                self.imap_port = 993;
            }
        }
        if self.imap_folder.is_empty() {
            self.imap_folder = DEFAULT_FOLDER.to_string();
        }
        if self.imap_timeout_seconds == 0 {
            self.imap_timeout_seconds = DEFAULT_TIMEOUT_SECONDS;
        }
        if self.imap_poll_interval_seconds == 0 {
            self.imap_poll_interval_seconds = DEFAULT_POLL_INTERVAL_SECONDS;
        }
        if self.wait_for_response_max_minutes == 0 {
            self.wait_for_response_max_minutes = DEFAULT_MAX_WAIT_MINUTES;
        }
        if self.wait_for_response_max_lines < 0 {
            self.wait_for_response_max_lines = 0;
        }
        self
    }

    /// Names of the IMAP settings that are required but empty.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("imap_host", self.imap_host.is_empty()),
            ("imap_port", self.imap_port == 0),
            ("imap_username", self.imap_username.is_empty()),
            ("imap_password", self.imap_password.is_empty()),
        ]
        .into_iter()
        .filter_map(|(name, missing)| missing.then_some(name))
        .collect()
    }

    /// Wait to use for a request: the explicit value, else the configured
    /// default, else [`FALLBACK_WAIT_MINUTES`].
    #[must_use]
    pub fn resolve_wait_minutes(&self, requested: Option<u32>) -> u32 {
        requested.unwrap_or(if self.wait_for_response_default_minutes > 0 {
            self.wait_for_response_default_minutes
        } else {
            FALLBACK_WAIT_MINUTES
        })
    }

    /// Configured poll interval, see [`clamp_poll_interval`].
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        clamp_poll_interval(self.imap_poll_interval_seconds)
    }

    /// Deadline for each IMAP command and connection step; 0 means the default.
    #[must_use]
    pub fn io_timeout(&self) -> Duration {
        match self.imap_timeout_seconds {
            0 => Duration::from_secs(DEFAULT_TIMEOUT_SECONDS),
            s => Duration::from_secs(s),
        }
    }

    /// Connection security; SSL wins over STARTTLS when both are set.
    #[must_use]
    pub const fn security(&self) -> Security {
        if self.imap_use_ssl {
            Security::Implicit
        } else if self.imap_use_tls {
            Security::StartTls
        } else {
            Security::None
        }
    }

    /// Body line limit for display; 0 means unlimited.
    #[must_use]
    pub fn max_lines(&self) -> usize {
        usize::try_from(self.wait_for_response_max_lines).unwrap_or(0)
    }
}
