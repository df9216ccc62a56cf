use super::{Backend, Payload};
use std::panic::{AssertUnwindSafe, catch_unwind, resume_unwind};

pub struct ActiveBackend;

impl Backend for ActiveBackend {
    #[inline]
    fn intercept<Func: FnOnce() -> R, R>(func: Func) -> Result<R, Payload> {
        // The barrier does not promise to restore broken invariants of whatever `func` touched,
        // only to stop the unwind, so unwind safety is not required of callers.
        catch_unwind(AssertUnwindSafe(func))
    }

    #[inline]
    fn resume(payload: Payload) -> ! {
        resume_unwind(payload)
    }
}
