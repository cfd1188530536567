//! Time sources for the chrony agent.
//!
//! A time source is configured as a URL-shaped locator:
//!
//! ```text
//! ntp://<host>[:<port>][?<option>=<value>&...]
//! nts://<host>[:<ntsport>][?<option>=<value>&...]
//! ```
//!
//! and rendered as one chrony `pool` directive:
//!
//! ```text
//! pool <host> [nts] [port <n>|ntsport <n>] [<option> [<value>]]...
//! ```
//!
//! Parsing is strict: unknown options, mistyped values, repeated options and
//! any URL component other than host, port and query are errors. Rendering is
//! a pure function of the descriptor and emits options in sorted name order,
//! so rendering the same sources twice yields byte-identical configuration.

mod codec;
mod error;
mod options;
mod source;

pub use codec::{parse, parse_directive, parse_sources};
pub use error::{SourceError, SourceResult};
pub use options::{OptionKind, OptionToken, PoolOptions};
pub use source::{NtpSource, NtsSource, TimeSource};

/// Locator scheme for plain NTP sources.
pub const NTP_SCHEME: &str = "ntp";
/// Locator scheme for NTS sources.
pub const NTS_SCHEME: &str = "nts";
/// chrony directive keyword emitted for every source.
pub const DIRECTIVE: &str = "pool";
/// Keyword marking a directive as NTS-enabled.
pub const NTS_MARKER: &str = "nts";
/// Default NTP port; not rendered.
pub const NTP_PORT: u16 = 123;
/// Default NTS key-exchange port; not rendered.
pub const NTS_KE_PORT: u16 = 4460;
