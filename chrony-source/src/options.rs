//! Tuning options shared by every pool directive.
//!
//! The option set is described once by the `pool_options!` table below, which generates the
//! [`PoolOptions`] struct and a static field table sorted by option name.
//! Parsing, rendering and locator generation all walk that table, so the
//! emission order never depends on the order options were supplied in.
//!
//! Option reference: <https://chrony-project.org/doc/4.5/chrony.conf.html>

use crate::error::{SourceError, SourceResult};

/// The value shape of a pool option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    /// Present/absent keyword. Emitted bare when true, never when false.
    Flag,
    /// Signed integer, emitted as `name value`.
    Int,
    /// Finite floating point number, emitted as `name value`.
    Float,
    /// Single whitespace-free token, emitted as `name value`.
    Word,
}

pub(crate) struct OptionField {
    pub(crate) name: &'static str,
    pub(crate) kind: OptionKind,
    get: fn(&PoolOptions) -> Option<String>,
    set: fn(&mut PoolOptions, &str) -> Result<(), String>,
}

macro_rules! option_type {
    (Flag) => { bool };
    (Int) => { Option<i64> };
    (Float) => { Option<f64> };
    (Word) => { Option<String> };
}

macro_rules! option_get {
    (Flag, $v:expr) => { $v.then(String::new) };
    (Int, $v:expr) => { $v.map(|v| v.to_string()) };
    (Float, $v:expr) => { $v.map(format_float) };
    (Word, $v:expr) => { $v.clone() };
}

macro_rules! option_set {
    (Flag, $slot:expr, $raw:expr) => { $slot = parse_flag($raw)? };
    (Int, $slot:expr, $raw:expr) => { $slot = Some(parse_int($raw)?) };
    (Float, $slot:expr, $raw:expr) => { $slot = Some(parse_float($raw)?) };
    (Word, $slot:expr, $raw:expr) => { $slot = Some(parse_word($raw)?) };
}

macro_rules! pool_options {
    ($($name:ident: $kind:ident),* $(,)?) => {
        /// Optional tuning parameters of a chrony `pool` directive.
        ///
        /// Flags default to `false`, every other option to unset.
        #[derive(Debug, Clone, Default, PartialEq)]
        pub struct PoolOptions {
            $(pub $name: option_type!($kind),)*
        }

        pub(crate) static FIELDS: &[OptionField] = &[
            $(OptionField {
                name: stringify!($name),
                kind: OptionKind::$kind,
                get: |o| option_get!($kind, o.$name),
                set: |o, raw| {
                    option_set!($kind, o.$name, raw);
                    Ok(())
                },
            },)*
        ];
    };
}

// Keep this list sorted by name: it is the emission order.
pool_options! {
    asymmetry: Float,
    auto_offline: Flag,
    burst: Flag,
    certset: Word,
    extfield: Word,
    filter: Int,
    iburst: Flag,
    key: Word,
    maxdelay: Float,
    maxdelaydevratio: Float,
    maxdelayquant: Float,
    maxdelayratio: Float,
    maxpoll: Int,
    maxsamples: Int,
    maxsources: Int,
    mindelay: Float,
    minpoll: Int,
    minsamples: Int,
    minstratum: Int,
    noselect: Flag,
    offline: Flag,
    offset: Float,
    polltarget: Int,
    prefer: Flag,
    presend: Int,
    require: Flag,
    trust: Flag,
    version: Int,
    xleave: Flag,
}

/// A set option as it appears in a directive: the name and, for non-flags, the value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionToken {
    pub name: &'static str,
    pub value: Option<String>,
}

impl PoolOptions {
    /// Names of every supported option, in emission order.
    pub fn names() -> impl Iterator<Item = &'static str> {
        FIELDS.iter().map(|f| f.name)
    }

    /// Returns the value shape of an option, or `None` if the name is unknown.
    #[must_use]
    pub fn kind_of(name: &str) -> Option<OptionKind> {
        field(name).map(|f| f.kind)
    }

    /// Parses `raw` according to the option's type and stores it.
    ///
    /// `self` is left untouched on error.
    pub fn set(&mut self, name: &str, raw: &str) -> SourceResult<()> {
        let field = field(name).ok_or_else(|| SourceError::UnknownOption(name.to_string()))?;
        (field.set)(self, raw).map_err(|reason| SourceError::InvalidValue {
            option: name.to_string(),
            value: raw.to_string(),
            reason,
        })
    }

    /// Set options in sorted name order. Unset options and false flags are skipped.
    #[must_use]
    pub fn tokens(&self) -> Vec<OptionToken> {
        FIELDS
            .iter()
            .filter_map(|f| {
                (f.get)(self).map(|value| OptionToken {
                    name: f.name,
                    value: (f.kind != OptionKind::Flag).then_some(value),
                })
            })
            .collect()
    }

    /// Renders the options as the tail of a pool directive, e.g. `iburst minpoll 10`.
    #[must_use]
    pub fn render(&self) -> String {
        let mut parts = Vec::new();
        for token in self.tokens() {
            parts.push(token.name.to_string());
            if let Some(value) = token.value {
                parts.push(value);
            }
        }
        parts.join(" ")
    }

    /// Checks values that can be assigned directly through the public fields.
    pub fn validate(&self) -> SourceResult<()> {
        for field in FIELDS {
            let Some(value) = (field.get)(self) else {
                continue;
            };
            let reason = match field.kind {
                OptionKind::Float if !value.parse::<f64>().is_ok_and(f64::is_finite) => {
                    Some("value must be a finite number")
                }
                OptionKind::Word if parse_word(&value).is_err() => {
                    Some("value must be a single non-empty word")
                }
                _ => None,
            };
            if let Some(reason) = reason {
                return Err(SourceError::InvalidValue {
                    option: field.name.to_string(),
                    value,
                    reason: reason.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Returns true if no option is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        FIELDS.iter().all(|f| (f.get)(self).is_none())
    }
}

pub(crate) fn field(name: &str) -> Option<&'static OptionField> {
    FIELDS
        .binary_search_by(|f| f.name.cmp(name))
        .ok()
        .map(|idx| &FIELDS[idx])
}

const TRUTHY: &[&str] = &["true", "t", "yes", "y", "on", "1"];
const FALSY: &[&str] = &["false", "f", "no", "n", "off", "0"];

// Numbers and booleans ignore surrounding whitespace, so a `+` sign that
// form decoding turned into a space still parses.
fn parse_flag(raw: &str) -> Result<bool, String> {
    let lowered = raw.trim().to_ascii_lowercase();
    if TRUTHY.contains(&lowered.as_str()) {
        Ok(true)
    } else if FALSY.contains(&lowered.as_str()) {
        Ok(false)
    } else {
        Err("expected a boolean (true/false, yes/no, on/off, 1/0)".to_string())
    }
}

fn parse_int(raw: &str) -> Result<i64, String> {
    raw.trim()
        .parse::<i64>()
        .map_err(|e| format!("expected an integer: {e}"))
}

fn parse_float(raw: &str) -> Result<f64, String> {
    let value = raw
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("expected a number: {e}"))?;
    if !value.is_finite() {
        return Err("value must be a finite number".to_string());
    }
    Ok(value)
}

fn parse_word(raw: &str) -> Result<String, String> {
    if raw.is_empty() {
        return Err("value must not be empty".to_string());
    }
    if raw.chars().any(char::is_whitespace) {
        return Err("value must not contain whitespace".to_string());
    }
    Ok(raw.to_string())
}

/// Formats a float the way chrony examples write them: shortest round-trip
/// digits, with `.0` kept on integral values.
pub(crate) fn format_float(value: f64) -> String {
    let s = value.to_string();
    if s.contains('.') || !value.is_finite() {
        s
    } else {
        format!("{s}.0")
    }
}
