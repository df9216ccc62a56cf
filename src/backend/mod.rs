use super::payload::Payload;

/// An unwinding backend.
///
/// Unwinding is the mechanism a panic uses to forcefully "return" through multiple call frames up
/// to the closest frame that intercepts it. The backend decides whether such a frame can exist at
/// all in the current build.
///
/// Backends treat payloads as opaque; translating them is done by the caller.
///
/// During unwinding, all destructors of locals must be run, as if `return` was called. Effects the
/// work had before the fault are kept as they are.
pub trait Backend {
    /// Run `func`, stopping any unwinding that escapes it.
    ///
    /// This function returns `Ok` if `func` returns normally, or `Err` with the panic payload if it
    /// panics (and the panic is not stopped by a nested interceptor). `func` is called exactly once.
    fn intercept<Func: FnOnce() -> R, R>(func: Func) -> Result<R, Payload>;

    /// Continue unwinding with a payload obtained from [`Backend::intercept`].
    ///
    /// Unlike `panic!`, this does not invoke the panic hook.
    fn resume(payload: Payload) -> !;
}

#[cfg(backend = "unwind")]
#[path = "unwind.rs"]
mod imp;

#[cfg(backend = "abort")]
#[path = "abort.rs"]
mod imp;

pub(crate) use imp::ActiveBackend;

#[cfg(all(test, backend = "unwind"))]
mod test {
    use super::*;

    #[test]
    fn intercept_ok() {
        let result = ActiveBackend::intercept(|| String::from("Hello, world!"));
        assert_eq!(result.unwrap(), "Hello, world!");
    }

    #[test]
    fn intercept_err() {
        let result =
            ActiveBackend::intercept::<_, ()>(|| std::panic::panic_any(String::from("Hello, world!")));
        let payload = result.unwrap_err();
        assert_eq!(payload.downcast_ref::<String>().unwrap(), "Hello, world!");
    }

    #[test]
    fn nested_intercept() {
        let result = ActiveBackend::intercept(|| {
            ActiveBackend::intercept::<_, ()>(|| panic!("Hello, world!"))
        });
        let payload = result.unwrap().unwrap_err();
        assert_eq!(*payload.downcast_ref::<&'static str>().unwrap(), "Hello, world!");
    }

    #[test]
    fn resume() {
        let result = ActiveBackend::intercept::<_, ()>(|| {
            let result = ActiveBackend::intercept::<_, ()>(|| panic!("Hello, world!"));
            ActiveBackend::resume(result.unwrap_err())
        });
        let payload = result.unwrap_err();
        assert_eq!(*payload.downcast_ref::<&'static str>().unwrap(), "Hello, world!");
    }

    #[test]
    fn destructors_are_run() {
        struct Dropper<'a>(&'a mut bool);
        impl Drop for Dropper<'_> {
            fn drop(&mut self) {
                *self.0 = true;
            }
        }

        let mut destructor_was_run = false;
        let result = ActiveBackend::intercept::<_, ()>(|| {
            let _dropper = Dropper(&mut destructor_was_run);
            panic!("Hello, world!");
        });
        assert!(result.is_err());
        assert!(destructor_was_run);
    }
}
