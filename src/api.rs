use super::{
    backend::{ActiveBackend, Backend},
    barrier::Barrier,
    capture::{self, Capture},
    error::TranslatedError,
    payload::{self, Payload},
};
use core::fmt;
use core::mem::ManuallyDrop;
use std::any::Any;

static DEFAULT: Barrier = Barrier::new();

/// Run `work` and turn a panic into an error.
///
/// If `work` returns a value, this function wraps it in [`Ok`].
///
/// If `work` panics, the panic is stopped here and translated into a [`TranslatedError`], wrapped
/// in [`Err`]. The error has [`ErrorCode::PANIC`](crate::ErrorCode::PANIC), the panic message as
/// its message, and the context described on [`TranslatedError`].
///
/// `work` is called exactly once, on the current thread. Whatever it did before panicking is not
/// undone. This function never panics itself, unless the crate is built with `panic = "abort"`,
/// in which case panics can't be caught at all.
///
/// # Example
///
/// ```rust
/// use fault_barrier::catch;
///
/// assert_eq!(catch(|| 42), Ok(42));
///
/// let v: Vec<u32> = Vec::new();
/// let err = catch(|| v[3]).unwrap_err();
/// assert!(err.message.starts_with("index out of bounds"));
/// ```
#[allow(clippy::missing_errors_doc)]
#[inline]
pub fn catch<R>(work: impl FnOnce() -> R) -> Result<R, TranslatedError> {
    DEFAULT.catch(work)
}

/// Run `work` and report a panic through an error slot.
///
/// This is the shape expected by callers that can't take a [`Result`], e.g. glue code that mirrors
/// an out-parameter convention:
///
/// - if `work` returns, its value is returned and `error` is set to [`None`];
/// - if `work` panics, [`None`] is returned and `error` is set to the translated error.
///
/// `work` may return [`None`] on purpose. That case can only be told apart from a panic by
/// looking at `error`, never by looking at the returned value.
///
/// # Example
///
/// ```rust
/// use fault_barrier::run_catching;
///
/// let mut error = None;
///
/// assert_eq!(run_catching(|| Some(42), &mut error), Some(42));
/// assert!(error.is_none());
///
/// assert_eq!(run_catching(|| None::<u32>, &mut error), None);
/// assert!(error.is_none());
///
/// assert_eq!(run_catching(|| -> Option<u32> { panic!("index out of range") }, &mut error), None);
/// assert_eq!(error.unwrap().message, "index out of range");
/// ```
#[inline]
pub fn run_catching<T>(
    work: impl FnOnce() -> Option<T>,
    error: &mut Option<TranslatedError>,
) -> Option<T> {
    DEFAULT.run_catching(work, error)
}

/// Run `work`, requiring it to produce a value.
///
/// Like [`catch`], but an intentional [`None`] from `work` is reported as an error too, with
/// [`ErrorCode::MISSING_VALUE`](crate::ErrorCode::MISSING_VALUE).
///
/// # Example
///
/// ```rust
/// use fault_barrier::{catch_value, ErrorCode};
///
/// assert_eq!(catch_value(|| "42".parse::<u32>().ok()), Ok(42));
///
/// let err = catch_value(|| "x".parse::<u32>().ok()).unwrap_err();
/// assert_eq!(err.code, ErrorCode::MISSING_VALUE);
/// ```
#[allow(clippy::missing_errors_doc)]
#[inline]
pub fn catch_value<T>(work: impl FnOnce() -> Option<T>) -> Result<T, TranslatedError> {
    DEFAULT.catch_value(work)
}

/// Begin fault handling.
///
/// If `work` returns a value, this function wraps it in [`Ok`].
///
/// If `work` panics, the translated error along with a handle to the original panic is returned in
/// [`Err`]. The handle can be used to inspect the payload or to let the panic continue.
///
/// If you always need to stop the panic, use [`catch`] instead. This function is mostly useful for
/// observing a fault on its way out.
///
/// # Example
///
/// ```rust
/// use fault_barrier::{catch, intercept};
///
/// fn logged<R>(work: impl FnOnce() -> R) -> R {
///     match intercept(work) {
///         Ok(x) => x,
///         Err((err, fault)) => {
///             eprintln!("passing through: {err}");
///             fault.resume()
///         }
///     }
/// }
///
/// let err = catch(|| logged(|| -> () { panic!("deep failure") })).unwrap_err();
/// assert_eq!(err.message, "deep failure");
/// ```
#[allow(clippy::missing_errors_doc)]
#[inline]
pub fn intercept<R>(work: impl FnOnce() -> R) -> Result<R, (TranslatedError, InFlightFault)> {
    DEFAULT.intercept(work)
}

/// Not-quite-handled fault.
///
/// This type is returned by [`intercept`] when a panic is stopped. At this point, you can either
/// drop the handle, which ends fault handling and brings you back to the sane land of [`Result`],
/// or call [`InFlightFault::resume`] to let the original panic continue unwinding.
///
/// Dropping the handle disposes of the panic payload. A payload whose destructor panics is leaked
/// instead of letting that panic escape.
// Type invariant: `payload` is initialized until the handle is dropped or consumed.
pub struct InFlightFault {
    payload: ManuallyDrop<Payload>,
    capture: Option<Capture>,
}

impl Drop for InFlightFault {
    /// Drop the payload, ending fault handling.
    #[inline]
    fn drop(&mut self) {
        // SAFETY: `payload` is initialized by the type invariant, and is never used again.
        let payload = unsafe { ManuallyDrop::take(&mut self.payload) };
        payload::dispose(payload);
    }
}

impl fmt::Debug for InFlightFault {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InFlightFault")
            .field("capture", &self.capture)
            .finish_non_exhaustive()
    }
}

impl InFlightFault {
    pub(crate) fn new(payload: Payload, capture: Option<Capture>) -> Self {
        Self {
            payload: ManuallyDrop::new(payload),
            capture,
        }
    }

    /// The original panic payload.
    #[must_use]
    #[inline]
    pub fn payload(&self) -> &(dyn Any + Send) {
        &**self.payload
    }

    /// Take ownership of the original panic payload.
    ///
    /// The caller becomes responsible for dropping it, which may panic.
    #[must_use]
    #[inline]
    pub fn into_payload(self) -> Payload {
        let mut this = ManuallyDrop::new(self);
        drop(this.capture.take());
        // SAFETY: `payload` is initialized by the type invariant. `this` is never dropped, so the
        // payload is not taken twice.
        unsafe { ManuallyDrop::take(&mut this.payload) }
    }

    /// Let the original panic continue unwinding.
    ///
    /// The panic hook is not invoked again. Location information of the original fault is handed
    /// over to the next enclosing barrier on this thread.
    #[inline]
    pub fn resume(mut self) -> ! {
        #[cfg(feature = "tracing")]
        tracing::trace!("resuming intercepted fault");

        if let Some(capture) = self.capture.take() {
            capture::restore(capture);
        }
        ActiveBackend::resume(self.into_payload())
    }
}
