//! Per-thread capture of fault information that the panic payload does not carry.
//!
//! The payload only holds the message. Location, thread name and backtrace are only visible to the
//! panic hook, so a hook is installed once per process. It chains whatever hook was installed
//! before it and records the information into a thread-local slot, but only while the current
//! thread is inside a barrier. Outside barriers it defers to the previous hook untouched.

use super::barrier::HookMode;
use std::backtrace::Backtrace;
use std::cell::{Cell, RefCell};
use std::panic::{self, PanicHookInfo};
use std::sync::Once;
use std::thread;

/// Information recorded by the hook for the most recent fault on this thread.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Capture {
    pub file: Option<String>,
    pub line: Option<u32>,
    pub column: Option<u32>,
    pub thread: String,
    pub backtrace: Option<String>,
}

#[derive(Debug, Clone, Copy)]
struct Frame {
    hook: HookMode,
    backtrace: bool,
}

thread_local! {
    // Innermost barrier on this thread, if any.
    static FRAME: Cell<Option<Frame>> = const { Cell::new(None) };
    static CAPTURED: RefCell<Option<Capture>> = const { RefCell::new(None) };
}

static INSTALL: Once = Once::new();

fn install() {
    INSTALL.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| match FRAME.try_with(Cell::get).ok().flatten() {
            Some(frame) => {
                record(info, frame.backtrace);
                if frame.hook == HookMode::Forward {
                    previous(info);
                }
            }
            None => previous(info),
        }));
    });
}

fn record(info: &PanicHookInfo<'_>, backtrace: bool) {
    let location = info.location();
    let capture = Capture {
        file: location.map(|l| l.file().to_owned()),
        line: location.map(|l| l.line()),
        column: location.map(|l| l.column()),
        thread: thread::current().name().unwrap_or("<unnamed>").to_owned(),
        backtrace: backtrace.then(|| Backtrace::force_capture().to_string()),
    };
    restore(capture);
}

/// Marks the current thread as being inside a barrier until left.
///
/// Guards nest: leaving restores the enclosing barrier's settings. A capture still pending when
/// the guard is entered belongs to an enclosing fault that is unwinding right now (the guard was
/// entered from a destructor); it is set aside and put back on leave.
pub struct Guard {
    outer: Option<Frame>,
    pending: Option<Capture>,
    active: bool,
}

impl Guard {
    pub fn enter(hook: HookMode, backtrace: bool) -> Self {
        install();
        let outer = FRAME.replace(Some(Frame { hook, backtrace }));
        Self {
            outer,
            pending: take(),
            active: true,
        }
    }

    /// Leave the barrier, returning the capture of a fault raised inside it, if any.
    pub fn leave(mut self) -> Option<Capture> {
        self.exit()
    }

    fn exit(&mut self) -> Option<Capture> {
        if !self.active {
            return None;
        }
        self.active = false;
        FRAME.set(self.outer);
        let own = take();
        if let Some(pending) = self.pending.take() {
            restore(pending);
        }
        own
    }
}

impl Drop for Guard {
    #[inline]
    fn drop(&mut self) {
        drop(self.exit());
    }
}

/// Take the capture recorded for the latest fault on this thread.
///
/// Once the thread's locals are being torn down the slot may already be gone; there is nothing to
/// take then.
pub fn take() -> Option<Capture> {
    CAPTURED
        .try_with(|slot| slot.try_borrow_mut().ok().and_then(|mut slot| slot.take()))
        .ok()
        .flatten()
}

/// Store a capture for the next barrier up to collect.
///
/// Used by the hook, and to hand a capture along with a resumed panic. The slot is never borrowed
/// across a panic, but the hook must not panic, so a busy or destroyed slot is skipped.
pub fn restore(capture: Capture) {
    let _ = CAPTURED.try_with(|slot| {
        if let Ok(mut slot) = slot.try_borrow_mut() {
            *slot = Some(capture);
        }
    });
}
