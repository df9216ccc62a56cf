use super::{Backend, Payload};

/// Backend for `panic = "abort"` builds. Panics never unwind, so there is nothing to intercept.
pub struct ActiveBackend;

impl Backend for ActiveBackend {
    #[inline]
    fn intercept<Func: FnOnce() -> R, R>(func: Func) -> Result<R, Payload> {
        Ok(func())
    }

    #[inline]
    fn resume(payload: Payload) -> ! {
        std::panic::resume_unwind(payload)
    }
}
