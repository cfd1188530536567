//! Configuration text assembly and change detection.

use chrony_source::TimeSource;

use crate::error::{ConfigError, ConfigResult};

/// Header marking a configuration file as written by the agent.
pub const CONFIG_HEADER: &str = "# This is managed by chrony-agent.\n# Do not edit.";

/// Directives appended after the sources in every generated file.
///
/// Version 1 of the static block. Changing it changes every generated file
/// and therefore restarts chrony on every managed host.
pub const STATIC_CONFIG: &str = "\
sourcedir /run/chrony-dhcp
sourcedir /etc/chrony/sources.d
keyfile /etc/chrony/chrony.keys
driftfile /var/lib/chrony/chrony.drift
ntsdumpdir /var/lib/chrony
logdir /var/log/chrony
maxupdateskew 100.0
rtcsync
makestep 1 3
leapsectz right/UTC
";

/// Builds the full chrony configuration file.
///
/// Sources are rendered one per line in the order given; the caller owns the
/// ordering policy. The header, source block and static block are joined by a
/// blank line, empty parts are dropped and leading whitespace is stripped.
pub fn new_config(sources: &[TimeSource], header: &str) -> ConfigResult<String> {
    if sources.is_empty() {
        return Err(ConfigError::NoSources);
    }
    let directives = sources
        .iter()
        .map(TimeSource::render)
        .collect::<Vec<_>>()
        .join("\n");
    let config = [header, directives.as_str(), STATIC_CONFIG]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n");
    Ok(config.trim_start().to_string())
}

/// Returns true if `new` differs from `current` by even one byte.
///
/// The comparison is textual on purpose: reordering sources restarts chrony
/// even when the result is semantically equivalent.
#[must_use]
pub fn needs_reload(new: &str, current: &str) -> bool {
    new != current
}

/// Returns true if the configuration carries the agent header.
#[must_use]
pub fn is_managed(config: &str) -> bool {
    config.contains(CONFIG_HEADER)
}
