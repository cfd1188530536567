//! Locator and directive parsing.

use std::collections::BTreeSet;

use url::{Host, Url};

use crate::error::{SourceError, SourceResult};
use crate::options::{field, OptionKind, PoolOptions};
use crate::source::TimeSource;
use crate::{DIRECTIVE, NTS_MARKER, NTP_SCHEME, NTS_SCHEME};

/// Parses a locator such as `ntp://example.com:1234?iburst=true` into a time source.
///
/// The scheme selects the variant (`ntp` or `nts`), the URL port becomes the
/// variant's port and every query parameter must name a pool option whose
/// type accepts the value.
pub fn parse(locator: &str) -> SourceResult<TimeSource> {
    let secure = if locator.starts_with(&format!("{NTP_SCHEME}://")) {
        false
    } else if locator.starts_with(&format!("{NTS_SCHEME}://")) {
        true
    } else {
        return Err(SourceError::UnsupportedScheme(locator.to_string()));
    };

    let url = Url::parse(locator).map_err(|source| SourceError::Url {
        locator: locator.to_string(),
        source,
    })?;
    reject_component(locator, "user info", !url.username().is_empty() || url.password().is_some())?;
    reject_component(locator, "path", !matches!(url.path(), "" | "/"))?;
    reject_component(locator, "fragment", url.fragment().is_some())?;

    let host = match url.host() {
        Some(Host::Domain(domain)) if !domain.is_empty() => domain.to_string(),
        Some(Host::Ipv4(addr)) => addr.to_string(),
        Some(Host::Ipv6(addr)) => addr.to_string(),
        _ => return Err(SourceError::MissingHost(locator.to_string())),
    };

    let mut options = PoolOptions::default();
    let mut seen = BTreeSet::new();
    for (name, value) in url.query_pairs() {
        if !seen.insert(name.to_string()) {
            return Err(SourceError::DuplicateOption(name.into_owned()));
        }
        options.set(&name, &value)?;
    }

    let source = if secure {
        TimeSource::nts(host)?
    } else {
        TimeSource::ntp(host)?
    };
    let source = match url.port() {
        Some(port) => source.with_port(port),
        None => source,
    };
    source.with_options(options)
}

/// Parses a comma-separated list of locators.
///
/// Entries are trimmed and empty entries skipped, so `""` yields an empty
/// list. The first invalid entry fails the whole call.
pub fn parse_sources(list: &str) -> SourceResult<Vec<TimeSource>> {
    list.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(parse)
        .collect()
}

/// Parses a `pool` directive produced by [`TimeSource::render`] back into a source.
pub fn parse_directive(line: &str) -> SourceResult<TimeSource> {
    let invalid = |reason: &str| SourceError::InvalidDirective {
        line: line.to_string(),
        reason: reason.to_string(),
    };

    let mut tokens = line.split_whitespace().peekable();
    if tokens.next() != Some(DIRECTIVE) {
        return Err(invalid("expected a pool directive"));
    }
    let host = tokens.next().ok_or_else(|| invalid("missing host"))?;
    let secure = tokens.next_if_eq(&NTS_MARKER).is_some();
    let port_keyword = if secure { "ntsport" } else { "port" };

    let mut port = None;
    let mut options = PoolOptions::default();
    let mut seen = BTreeSet::new();
    while let Some(name) = tokens.next() {
        if !seen.insert(name) {
            return Err(SourceError::DuplicateOption(name.to_string()));
        }
        if name == port_keyword {
            let raw = tokens.next().ok_or_else(|| invalid("missing port"))?;
            port = Some(raw.parse::<u16>().map_err(|_| invalid("invalid port"))?);
            continue;
        }
        let field = field(name).ok_or_else(|| SourceError::UnknownOption(name.to_string()))?;
        let raw = match field.kind {
            OptionKind::Flag => "true",
            _ => tokens
                .next()
                .ok_or_else(|| invalid(&format!("missing value for {name}")))?,
        };
        options.set(name, raw)?;
    }

    let source = if secure {
        TimeSource::nts(host)?
    } else {
        TimeSource::ntp(host)?
    };
    let source = match port {
        Some(port) => source.with_port(port),
        None => source,
    };
    source.with_options(options)
}

fn reject_component(locator: &str, component: &'static str, present: bool) -> SourceResult<()> {
    if present {
        return Err(SourceError::UnexpectedComponent {
            locator: locator.to_string(),
            component,
        });
    }
    Ok(())
}
