//! Time source descriptors and their directive / locator forms.

use std::fmt;
use std::net::Ipv6Addr;

use url::form_urlencoded;

use crate::error::{SourceError, SourceResult};
use crate::options::PoolOptions;
use crate::{DIRECTIVE, NTP_PORT, NTP_SCHEME, NTS_KE_PORT, NTS_MARKER, NTS_SCHEME};

/// A plain NTP time source.
#[derive(Debug, Clone, PartialEq)]
pub struct NtpSource {
    host: String,
    port: Option<u16>,
    options: PoolOptions,
}

/// A time source using Network Time Security.
#[derive(Debug, Clone, PartialEq)]
pub struct NtsSource {
    host: String,
    ntsport: Option<u16>,
    options: PoolOptions,
}

/// One upstream time source, rendered as a single chrony `pool` directive.
#[derive(Debug, Clone, PartialEq)]
pub enum TimeSource {
    Ntp(NtpSource),
    Nts(NtsSource),
}

impl TimeSource {
    /// Creates a plain NTP source on the default port with no options.
    pub fn ntp(host: impl Into<String>) -> SourceResult<Self> {
        Ok(Self::Ntp(NtpSource {
            host: validate_host(host.into())?,
            port: None,
            options: PoolOptions::default(),
        }))
    }

    /// Creates an NTS source on the default key-exchange port with no options.
    pub fn nts(host: impl Into<String>) -> SourceResult<Self> {
        Ok(Self::Nts(NtsSource {
            host: validate_host(host.into())?,
            ntsport: None,
            options: PoolOptions::default(),
        }))
    }

    /// Sets the variant's port. The variant's default port is stored as unset.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        match &mut self {
            Self::Ntp(s) => s.port = (port != NTP_PORT).then_some(port),
            Self::Nts(s) => s.ntsport = (port != NTS_KE_PORT).then_some(port),
        }
        self
    }

    /// Replaces the tuning options after validating them.
    pub fn with_options(mut self, options: PoolOptions) -> SourceResult<Self> {
        options.validate()?;
        match &mut self {
            Self::Ntp(s) => s.options = options,
            Self::Nts(s) => s.options = options,
        }
        Ok(self)
    }

    #[must_use]
    pub fn host(&self) -> &str {
        match self {
            Self::Ntp(s) => &s.host,
            Self::Nts(s) => &s.host,
        }
    }

    /// The non-default port, if any: the NTP port for plain sources, the
    /// NTS-KE port for secure ones.
    #[must_use]
    pub fn port(&self) -> Option<u16> {
        match self {
            Self::Ntp(s) => s.port,
            Self::Nts(s) => s.ntsport,
        }
    }

    /// The port actually used, falling back to the variant's default.
    #[must_use]
    pub fn effective_port(&self) -> u16 {
        match self {
            Self::Ntp(s) => s.port.unwrap_or(NTP_PORT),
            Self::Nts(s) => s.ntsport.unwrap_or(NTS_KE_PORT),
        }
    }

    #[must_use]
    pub fn options(&self) -> &PoolOptions {
        match self {
            Self::Ntp(s) => &s.options,
            Self::Nts(s) => &s.options,
        }
    }

    /// Returns true for NTS sources.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        matches!(self, Self::Nts(_))
    }

    #[must_use]
    pub fn scheme(&self) -> &'static str {
        match self {
            Self::Ntp(_) => NTP_SCHEME,
            Self::Nts(_) => NTS_SCHEME,
        }
    }

    /// Renders the source as a chrony `pool` directive.
    ///
    /// Layout: `pool <host> [nts] [port|ntsport <n>] [<option> [<value>]]...`,
    /// with options in sorted name order.
    #[must_use]
    pub fn render(&self) -> String {
        let mut directive = format!("{DIRECTIVE} {}", self.host());
        match self {
            Self::Ntp(s) => {
                if let Some(port) = s.port {
                    directive.push_str(&format!(" port {port}"));
                }
            }
            Self::Nts(s) => {
                directive.push(' ');
                directive.push_str(NTS_MARKER);
                if let Some(port) = s.ntsport {
                    directive.push_str(&format!(" ntsport {port}"));
                }
            }
        }
        let options = self.options().render();
        if !options.is_empty() {
            directive.push(' ');
            directive.push_str(&options);
        }
        directive
    }

    /// Renders the canonical locator for this source.
    ///
    /// Flags are written as `name=true`; options appear in sorted name order.
    #[must_use]
    pub fn to_locator(&self) -> String {
        let host = match self.host().parse::<Ipv6Addr>() {
            Ok(addr) => format!("[{addr}]"),
            Err(_) => self.host().to_string(),
        };
        let mut locator = format!("{}://{host}", self.scheme());
        if let Some(port) = self.port() {
            locator.push_str(&format!(":{port}"));
        }
        let tokens = self.options().tokens();
        if !tokens.is_empty() {
            let mut query = form_urlencoded::Serializer::new(String::new());
            for token in &tokens {
                query.append_pair(token.name, token.value.as_deref().unwrap_or("true"));
            }
            locator.push('?');
            locator.push_str(&query.finish());
        }
        locator
    }
}

impl fmt::Display for TimeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Host names are case-insensitive and kept in lower case.
fn validate_host(host: String) -> SourceResult<String> {
    if host.is_empty() || host.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(SourceError::InvalidHost(host));
    }
    Ok(host.to_ascii_lowercase())
}
