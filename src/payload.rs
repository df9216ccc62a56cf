use super::error::TranslatedError;
use std::any::Any;
use std::error::Error;
use std::mem::ManuallyDrop;
use std::panic::{AssertUnwindSafe, catch_unwind};

pub type Payload = Box<dyn Any + Send + 'static>;

/// Which shape of panic payload a fault carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Str,
    String,
    Error,
    Translated,
    Opaque,
}

impl Kind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Str => "str",
            Self::String => "string",
            Self::Error => "error",
            Self::Translated => "translated",
            Self::Opaque => "opaque",
        }
    }
}

/// What could be read out of a payload without consuming it.
pub enum Description {
    Message {
        kind: Kind,
        message: String,
        source: Option<String>,
    },
    Translated(TranslatedError),
}

pub const OPAQUE_MESSAGE: &str = "panic with a non-string payload";

/// Read the message out of a panic payload.
///
/// `panic!` with a literal produces `&'static str`, with format arguments `String`.
/// `panic_any` can carry anything; errors and already translated faults are recognized,
/// everything else is opaque.
pub fn describe(payload: &(dyn Any + Send)) -> Description {
    if let Some(err) = payload.downcast_ref::<TranslatedError>() {
        return Description::Translated(err.clone());
    }
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        return message(Kind::Str, (*s).to_owned(), None);
    }
    if let Some(s) = payload.downcast_ref::<String>() {
        return message(Kind::String, s.clone(), None);
    }
    if let Some(err) = payload.downcast_ref::<Box<dyn Error + Send + Sync>>() {
        return message(Kind::Error, err.to_string(), source_chain(&**err));
    }
    if let Some(err) = payload.downcast_ref::<Box<dyn Error + Send>>() {
        return message(Kind::Error, err.to_string(), source_chain(&**err));
    }
    message(Kind::Opaque, OPAQUE_MESSAGE.to_owned(), None)
}

const fn message(kind: Kind, message: String, source: Option<String>) -> Description {
    Description::Message {
        kind,
        message,
        source,
    }
}

fn source_chain(err: &(dyn Error + 'static)) -> Option<String> {
    let mut chain = Vec::new();
    let mut cur = err.source();
    while let Some(err) = cur {
        chain.push(err.to_string());
        cur = err.source();
    }
    (!chain.is_empty()).then(|| chain.join(": "))
}

/// Drop a payload without letting a panicking destructor escape.
///
/// If the destructor panics, the second payload is leaked instead of dropped, since dropping it
/// could panic again.
pub fn dispose(payload: Payload) {
    if let Err(nested) = catch_unwind(AssertUnwindSafe(move || drop(payload))) {
        let _ = ManuallyDrop::new(nested);
    }
}
