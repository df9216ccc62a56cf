use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

/// Domain used when a [`Barrier`](crate::Barrier) is not given one explicitly.
pub const DEFAULT_DOMAIN: &str = "fault_barrier";

/// Numeric error code of a [`TranslatedError`].
///
/// Codes below 1000 are reserved for this crate. Work that raises a structured fault with
/// [`std::panic::panic_any`] may use any other value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct ErrorCode(pub i64);

impl ErrorCode {
    /// The work panicked.
    pub const PANIC: Self = Self(1);

    /// The work completed, but produced no value where one was required.
    pub const MISSING_VALUE: Self = Self(2);
}

impl fmt::Display for ErrorCode {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// A fault, captured and turned into data.
///
/// Produced by the catching functions of this crate when the work they run panics. The fields
/// mirror a conventional structured error: a domain naming the component that caught the fault,
/// a numeric code, a message and ordered key/value context.
///
/// Context keys filled in on interception, when the information is available:
///
/// | key            | value                                                        |
/// |----------------|--------------------------------------------------------------|
/// | `payload.kind` | `str`, `string`, `error`, `translated` or `opaque`           |
/// | `panic.file`   | source file of the panic                                     |
/// | `panic.line`   | line of the panic                                            |
/// | `panic.column` | column of the panic                                          |
/// | `thread.name`  | name of the panicking thread, `<unnamed>` if it has none     |
/// | `error.source` | source chain of a `Box<dyn Error>` payload, joined by `": "` |
/// | `backtrace`    | backtrace of the panic, if capture was enabled               |
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[error("{domain} ({code}): {message}")]
#[non_exhaustive]
pub struct TranslatedError {
    /// Category of the error.
    pub domain: Cow<'static, str>,
    /// Error code within the domain.
    pub code: ErrorCode,
    /// Human-readable description.
    pub message: String,
    /// Auxiliary information about the fault.
    pub context: BTreeMap<String, String>,
}

impl TranslatedError {
    /// Create an error with empty context.
    ///
    /// Mostly useful for raising a structured fault from inside the work:
    ///
    /// ```rust
    /// use fault_barrier::{catch, ErrorCode, TranslatedError};
    ///
    /// let err = catch(|| -> () {
    ///     std::panic::panic_any(TranslatedError::new("db", ErrorCode(1001), "pool exhausted"))
    /// })
    /// .unwrap_err();
    ///
    /// assert_eq!(err.domain, "db");
    /// assert_eq!(err.code, ErrorCode(1001));
    /// ```
    #[inline]
    pub fn new(
        domain: impl Into<Cow<'static, str>>,
        code: ErrorCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            domain: domain.into(),
            code,
            message: message.into(),
            context: BTreeMap::new(),
        }
    }

    /// Add a context entry, replacing any previous value under `key`.
    #[must_use]
    #[inline]
    pub fn with_context(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.context.insert(key.into(), value.to_string());
        self
    }

    /// Look up a context entry.
    #[must_use]
    #[inline]
    pub fn context(&self, key: &str) -> Option<&str> {
        self.context.get(key).map(String::as_str)
    }

    pub(crate) fn missing_value(domain: Cow<'static, str>) -> Self {
        Self::new(domain, ErrorCode::MISSING_VALUE, "work returned no value")
    }
}
