//! Where and how to connect.

use std::time::Duration;

/// Transport security.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Security {
    /// Plaintext throughout.
    None,
    /// Plaintext greeting, then STARTTLS before anything else.
    StartTls,
    /// TLS from the first byte.
    #[default]
    Implicit,
}

impl Security {
    /// 993 for implicit TLS, 143 otherwise.
    #[must_use]
    pub const fn default_port(self) -> u16 {
        if matches!(self, Self::Implicit) { 993 } else { 143 }
    }
}

/// Connection settings.
///
/// `timeout` bounds the dial plus TLS handshake, the greeting, and each
/// command exchange from the first byte sent to the tagged completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Server host name, also used for TLS verification.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Transport security.
    pub security: Security,
    /// Deadline per connection step or command.
    pub timeout: Duration,
}

impl Config {
    /// Settings on the usual port for `security`, with a 60 second timeout.
    #[must_use]
    pub fn new(host: impl Into<String>, security: Security) -> Self {
        Self {
            host: host.into(),
            port: security.default_port(),
            security,
            timeout: Duration::from_secs(60),
        }
    }

    /// Overrides the port; 0 keeps the default.
    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        if port != 0 {
            self.port = port;
        }
        self
    }

    /// Overrides the timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// `host:port`
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_follows_security() {
        assert_eq!(Config::new("h", Security::Implicit).port, 993);
        assert_eq!(Config::new("h", Security::StartTls).port, 143);
        assert_eq!(Config::new("h", Security::None).address(), "h:143");
    }

    #[test]
    fn test_zero_port_keeps_default() {
        let config = Config::new("imap.example.com", Security::Implicit).with_port(0);
        assert_eq!(config.port, 993);
        let config = config.with_port(1993).with_timeout(Duration::from_secs(5));
        assert_eq!(config.address(), "imap.example.com:1993");
        assert_eq!(config.timeout, Duration::from_secs(5));
    }
}
