//! Closed error taxonomy: `Fatal`, `Sanity`, `Recoverable`, `Config`.
//!
//! Only `Recoverable` is caught inside stage loops; the other three propagate to
//! the top level and abort the process. Errors build on plain `anyhow`
//! (`anyhow::anyhow!`, `.map_err(|e| anyhow::anyhow!(...))`) with a `Severity`
//! tag layered on top so callers can tell the four kinds apart without
//! downcasting.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Fatal,
    Sanity,
    Recoverable,
    Config,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Fatal => "fatal",
            Severity::Sanity => "sanity",
            Severity::Recoverable => "recoverable",
            Severity::Config => "config",
        };
        write!(f, "{s}")
    }
}

/// A severity-tagged error. Stages match on `.severity` to decide whether to
/// abort or log-and-continue; everything else just bubbles this up via `?`.
#[derive(Debug)]
pub struct GraphStudyError {
    pub severity: Severity,
    pub source: anyhow::Error,
}

impl fmt::Display for GraphStudyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.severity, self.source)
    }
}

impl std::error::Error for GraphStudyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.source()
    }
}

impl GraphStudyError {
    pub fn fatal(msg: impl Into<String>) -> Self {
        Self {
            severity: Severity::Fatal,
            source: anyhow::anyhow!(msg.into()),
        }
    }

    pub fn sanity(msg: impl Into<String>) -> Self {
        Self {
            severity: Severity::Sanity,
            source: anyhow::anyhow!(msg.into()),
        }
    }

    pub fn recoverable(msg: impl Into<String>) -> Self {
        Self {
            severity: Severity::Recoverable,
            source: anyhow::anyhow!(msg.into()),
        }
    }

    /// `Config` errors carry filename/line-number context.
    pub fn config(msg: impl Into<String>, filename: &str, lineno: Option<usize>) -> Self {
        let text = match lineno {
            Some(n) => format!("{filename}:{n}: {}", msg.into()),
            None => format!("{filename}: {}", msg.into()),
        };
        Self {
            severity: Severity::Config,
            source: anyhow::anyhow!(text),
        }
    }

    pub fn is_recoverable(&self) -> bool {
        self.severity == Severity::Recoverable
    }
}

impl From<anyhow::Error> for GraphStudyError {
    fn from(source: anyhow::Error) -> Self {
        Self {
            severity: Severity::Fatal,
            source,
        }
    }
}

/// Parse a kebab-case enum token: lowercase, and look up the matching name.
pub fn parse_kebab_enum<T, I>(variants: I, token: &str, enum_name: &str) -> anyhow::Result<T>
where
    I: IntoIterator<Item = T>,
    T: Copy + NamedEnum,
{
    let canonical = token.trim().to_ascii_lowercase();
    variants
        .into_iter()
        .find(|v| v.enum_name() == canonical)
        .ok_or_else(|| anyhow::anyhow!("Enumerator {enum_name:?} has no value {token:?}"))
}

/// Trait bound used by `parse_kebab_enum`: any constant that knows its own
/// kebab-case name can be looked up generically.
pub trait NamedEnum {
    fn enum_name(&self) -> &'static str;
}

macro_rules! impl_named_enum {
    ($($t:ty),* $(,)?) => {
        $(
            impl NamedEnum for $t {
                fn enum_name(&self) -> &'static str {
                    (*self).name()
                }
            }
        )*
    };
}

impl_named_enum!(
    crate::constants::Generator,
    crate::constants::LayoutKind,
    crate::constants::InterKind,
    crate::constants::WorseKind,
    crate::constants::Prop,
    crate::constants::MetricKind,
    crate::constants::Action
);

/// Process-wide interrupt flag, flipped by the SIGINT handler installed in
/// `logging::init`. Stage loops poll this between iterations and between
/// subprocess invocations so a Ctrl-C lands between units of work rather than
/// mid-write.
static INTERRUPTED: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(false);

pub fn interrupted() -> bool {
    INTERRUPTED.load(std::sync::atomic::Ordering::Relaxed)
}

pub fn set_interrupted() {
    INTERRUPTED.store(true, std::sync::atomic::Ordering::Relaxed);
}
