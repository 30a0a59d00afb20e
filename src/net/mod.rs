//! Networking module
//!
//! This module handles the network side of a status query:
//! - The [`Target`] endpoint being queried
//! - The TCP exchange with the game server ([`client::StatusClient`])

pub mod client;

use std::fmt;

/// Default status port of an OpenTibia server
pub const DEFAULT_PORT: u16 = 7171;

/// Remote endpoint of a status query
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Target {
    host: String,
    port: u16,
}

impl Target {
    /// Create a target on the default port
    pub fn new(host: impl Into<String>) -> Self {
        Self::with_port(host, DEFAULT_PORT)
    }

    pub fn with_port(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Address in a form accepted by `TcpStream::connect`
    pub fn connect_addr(&self) -> (&str, u16) {
        // Bracketed IPv6 literals are accepted for convenience
        let host = self
            .host
            .strip_prefix('[')
            .and_then(|h| h.strip_suffix(']'))
            .unwrap_or(&self.host);
        (host, self.port)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') && !self.host.starts_with('[') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_port() {
        let target = Target::new("example.test");
        assert_eq!(target.port(), 7171);
        assert_eq!(target.to_string(), "example.test:7171");
    }

    #[test]
    fn test_ipv6_display_and_addr() {
        let target = Target::with_port("::1", 7172);
        assert_eq!(target.to_string(), "[::1]:7172");
        assert_eq!(target.connect_addr(), ("::1", 7172));

        let target = Target::with_port("[::1]", 7172);
        assert_eq!(target.to_string(), "[::1]:7172");
        assert_eq!(target.connect_addr(), ("::1", 7172));
    }
}
