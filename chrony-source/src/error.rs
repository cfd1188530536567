//! Error types for time source parsing.

use thiserror::Error;

/// Result type for time source operations.
pub type SourceResult<T> = Result<T, SourceError>;

/// Errors raised while parsing locators or pool directives.
///
/// Parsing is all-or-nothing: any of these aborts the whole call and no
/// descriptor is produced.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The locator is not a well-formed URL.
    #[error("invalid time source url {locator:?}: {source}")]
    Url {
        locator: String,
        #[source]
        source: url::ParseError,
    },

    /// The locator does not start with `ntp://` or `nts://`.
    #[error("unsupported time source {0:?}: expected an ntp:// or nts:// url")]
    UnsupportedScheme(String),

    /// The locator has no host component.
    #[error("time source {0:?} has no host")]
    MissingHost(String),

    /// The host cannot appear in a directive.
    #[error("invalid time source host {0:?}")]
    InvalidHost(String),

    /// The locator carries user info, a path or a fragment.
    #[error("time source {locator:?} must not have a {component}")]
    UnexpectedComponent {
        locator: String,
        component: &'static str,
    },

    /// The option name is not part of the pool option table.
    #[error("unknown time source option: {0}")]
    UnknownOption(String),

    /// The option value does not convert to the option's type.
    #[error("invalid value {value:?} for time source option {option}: {reason}")]
    InvalidValue {
        option: String,
        value: String,
        reason: String,
    },

    /// The same option was supplied more than once.
    #[error("time source option {0} is given more than once")]
    DuplicateOption(String),

    /// A configuration line is not a pool directive this crate renders.
    #[error("invalid pool directive {line:?}: {reason}")]
    InvalidDirective { line: String, reason: String },
}
