use super::{
    api::InFlightFault,
    backend::{ActiveBackend, Backend},
    capture::{self, Capture},
    error::{DEFAULT_DOMAIN, ErrorCode, TranslatedError},
    payload::{self, Description, Kind},
};
use std::any::Any;
use std::borrow::Cow;

/// Environment variable overriding [`Barrier::domain`] in [`Barrier::from_env`].
pub const DOMAIN_VAR: &str = "FAULT_BARRIER_DOMAIN";

/// Environment variable overriding [`Barrier::hook`] in [`Barrier::from_env`]: `quiet` or
/// `forward`.
pub const HOOK_VAR: &str = "FAULT_BARRIER_HOOK";

/// Environment variable overriding [`Barrier::backtrace`] in [`Barrier::from_env`]: `1`, `true`,
/// `yes` or `on` enable capture, `0`, `false`, `no` or `off` disable it.
pub const BACKTRACE_VAR: &str = "FAULT_BARRIER_BACKTRACE";

/// What happens to the previously installed panic hook for faults raised inside a barrier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[non_exhaustive]
pub enum HookMode {
    /// Don't call it. The fault is reported only through the returned error.
    #[default]
    Quiet,
    /// Call it as usual, which by default prints the panic message to stderr.
    Forward,
}

impl HookMode {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "quiet" => Some(Self::Quiet),
            "forward" => Some(Self::Forward),
            _ => None,
        }
    }
}

/// A configured fault barrier.
///
/// The free functions of this crate use [`Barrier::default()`]. Build a custom barrier to tag
/// errors with your own domain, to keep the usual panic report on stderr, or to capture
/// backtraces.
///
/// ```rust
/// use fault_barrier::{Barrier, ErrorCode, HookMode};
///
/// let barrier = Barrier::new().with_domain("plugin").with_hook(HookMode::Quiet);
/// let err = barrier.catch(|| -> u32 { panic!("bad state") }).unwrap_err();
///
/// assert_eq!(err.domain, "plugin");
/// assert_eq!(err.code, ErrorCode::PANIC);
/// assert_eq!(err.message, "bad state");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Barrier {
    domain: Cow<'static, str>,
    hook: HookMode,
    backtrace: bool,
}

impl Default for Barrier {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Barrier {
    /// A barrier with the default domain, quiet hook and no backtrace capture.
    #[must_use]
    #[inline]
    pub const fn new() -> Self {
        Self {
            domain: Cow::Borrowed(DEFAULT_DOMAIN),
            hook: HookMode::Quiet,
            backtrace: false,
        }
    }

    /// Read the configuration from `FAULT_BARRIER_*` environment variables.
    ///
    /// Unset variables keep their defaults. Unrecognized values are ignored with a warning.
    #[must_use]
    #[inline]
    pub fn from_env() -> Self {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Like [`Barrier::from_env`], but looks variables up with `lookup`.
    #[must_use]
    #[inline]
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut barrier = Self::new();
        if let Some(domain) = lookup(DOMAIN_VAR).filter(|domain| !domain.trim().is_empty()) {
            barrier.domain = Cow::Owned(domain.trim().to_owned());
        }
        if let Some(value) = lookup(HOOK_VAR) {
            match HookMode::parse(&value) {
                Some(hook) => barrier.hook = hook,
                None => ignored(HOOK_VAR, &value),
            }
        }
        if let Some(value) = lookup(BACKTRACE_VAR) {
            match parse_flag(&value) {
                Some(backtrace) => barrier.backtrace = backtrace,
                None => ignored(BACKTRACE_VAR, &value),
            }
        }
        barrier
    }

    /// Set the domain of produced errors.
    #[must_use]
    #[inline]
    pub fn with_domain(mut self, domain: impl Into<Cow<'static, str>>) -> Self {
        self.domain = domain.into();
        self
    }

    /// Set what happens to the previously installed panic hook.
    #[must_use]
    #[inline]
    pub const fn with_hook(mut self, hook: HookMode) -> Self {
        self.hook = hook;
        self
    }

    /// Enable or disable backtrace capture.
    ///
    /// When enabled, a backtrace is captured at the fault site regardless of `RUST_BACKTRACE` and
    /// stored under the `backtrace` context key.
    #[must_use]
    #[inline]
    pub const fn with_backtrace(mut self, backtrace: bool) -> Self {
        self.backtrace = backtrace;
        self
    }

    /// Domain of produced errors.
    #[must_use]
    #[inline]
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Treatment of the previously installed panic hook.
    #[must_use]
    #[inline]
    pub const fn hook(&self) -> HookMode {
        self.hook
    }

    /// Whether backtraces are captured.
    #[must_use]
    #[inline]
    pub const fn backtrace(&self) -> bool {
        self.backtrace
    }

    /// See [`intercept`](crate::intercept()).
    #[allow(clippy::missing_errors_doc)]
    #[inline]
    pub fn intercept<R>(
        &self,
        work: impl FnOnce() -> R,
    ) -> Result<R, (TranslatedError, InFlightFault)> {
        #[cfg(feature = "tracing")]
        tracing::debug!(domain = %self.domain, "entering fault barrier");

        let guard = capture::Guard::enter(self.hook, self.backtrace);
        let result = ActiveBackend::intercept(work);
        let capture = guard.leave();

        result.map_err(|payload| {
            let err = self.translate(&*payload, capture.clone());

            #[cfg(feature = "tracing")]
            tracing::warn!(
                domain = %err.domain,
                code = %err.code,
                file = err.context("panic.file"),
                line = err.context("panic.line"),
                "intercepted fault: {}",
                err.message
            );

            (err, InFlightFault::new(payload, capture))
        })
    }

    /// See [`catch`](crate::catch()).
    #[allow(clippy::missing_errors_doc)]
    #[inline]
    pub fn catch<R>(&self, work: impl FnOnce() -> R) -> Result<R, TranslatedError> {
        self.intercept(work).map_err(|(err, _)| err)
    }

    /// See [`run_catching`](crate::run_catching()).
    #[inline]
    pub fn run_catching<T>(
        &self,
        work: impl FnOnce() -> Option<T>,
        error: &mut Option<TranslatedError>,
    ) -> Option<T> {
        match self.catch(work) {
            Ok(value) => {
                *error = None;
                value
            }
            Err(err) => {
                *error = Some(err);
                None
            }
        }
    }

    /// See [`catch_value`](crate::catch_value()).
    #[allow(clippy::missing_errors_doc)]
    #[inline]
    pub fn catch_value<T>(&self, work: impl FnOnce() -> Option<T>) -> Result<T, TranslatedError> {
        self.catch(work)?
            .ok_or_else(|| TranslatedError::missing_value(self.domain.clone()))
    }

    fn translate(&self, payload: &(dyn Any + Send), capture: Option<Capture>) -> TranslatedError {
        // User `Display` impls run here; a panic from one of them must neither escape nor be
        // reported.
        let guard = capture::Guard::enter(HookMode::Quiet, false);
        let description = ActiveBackend::intercept(|| payload::describe(payload));
        drop(guard.leave());
        let description = description.unwrap_or_else(|nested| {
            payload::dispose(nested);
            Description::Message {
                kind: Kind::Opaque,
                message: payload::OPAQUE_MESSAGE.to_owned(),
                source: None,
            }
        });

        let (kind, mut err) = match description {
            Description::Translated(err) => (Kind::Translated, err),
            Description::Message {
                kind,
                message,
                source,
            } => {
                let mut err = TranslatedError::new(self.domain.clone(), ErrorCode::PANIC, message);
                if let Some(source) = source {
                    err.context.insert(String::from("error.source"), source);
                }
                (kind, err)
            }
        };

        // Structured faults keep whatever context they were raised with.
        let mut fill = |key: &str, value: String| {
            err.context.entry(key.to_owned()).or_insert(value);
        };
        fill("payload.kind", kind.as_str().to_owned());
        if let Some(capture) = capture {
            if let Some(file) = capture.file {
                fill("panic.file", file);
            }
            if let Some(line) = capture.line {
                fill("panic.line", line.to_string());
            }
            if let Some(column) = capture.column {
                fill("panic.column", column.to_string());
            }
            fill("thread.name", capture.thread);
            if let Some(backtrace) = capture.backtrace {
                fill("backtrace", backtrace);
            }
        }
        err
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
fn ignored(name: &str, value: &str) {
    #[cfg(feature = "tracing")]
    tracing::warn!(name, value, "ignoring unrecognized fault barrier setting");
}
