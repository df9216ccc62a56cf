//! Fault barriers.
//!
//! A fault barrier runs a block of work and stops any panic that tries to unwind out of it,
//! handing the panic back as a structured [`TranslatedError`] instead. This is the glue needed
//! wherever unwinding must not cross a boundary: callbacks invoked from C or another runtime,
//! plugin entry points, host event loops, worker threads that must outlive their jobs.
//!
//!
//! # Usage
//!
//! Run work with [`catch`] to get a [`Result`], or with [`run_catching`] to report faults
//! through an out-parameter:
//!
//! ```rust
//! use fault_barrier::{catch, run_catching, ErrorCode};
//!
//! assert_eq!(catch(|| 42), Ok(42));
//!
//! let mut error = None;
//! let value = run_catching(|| -> Option<u32> { panic!("index out of range") }, &mut error);
//! assert_eq!(value, None);
//!
//! let error = error.unwrap();
//! assert_eq!(error.code, ErrorCode::PANIC);
//! assert_eq!(error.message, "index out of range");
//! ```
//!
//! [`catch_value`] additionally treats an intentional [`None`] as an error, and [`intercept`]
//! keeps the original panic around so it can be resumed after inspection. A [`Barrier`] carries
//! the configuration: the error domain, whether the usual panic report is still printed, and
//! whether backtraces are captured. [`Barrier::from_env`] reads it from `FAULT_BARRIER_*`
//! environment variables.
//!
//!
//! # Translation
//!
//! `&str` and `String` payloads, which is what `panic!` produces, become the error message.
//! `Box<dyn Error + Send + Sync>` payloads contribute their message and source chain. A
//! [`TranslatedError`] raised with [`std::panic::panic_any`] passes through with its own domain,
//! code and context. Any other payload is reported as opaque.
//!
//! Location, thread name and backtrace are recorded by a panic hook that this crate installs the
//! first time a barrier is entered. It chains the hook that was installed before it, and only acts
//! on panics raised inside a barrier. If the hook is replaced later, faults are still caught, but
//! without that context.
//!
//!
//! # Platform support
//!
//! Faults can only be stopped when the crate is built with `panic = "unwind"`. Under
//! `panic = "abort"` the barrier runs the work directly and a panic terminates the process. The
//! build script picks the matching backend; set `FAULT_BARRIER_BACKEND` to `unwind` or `abort` at
//! build time to override it.
//!
//!
//! # Logging
//!
//! With the default `tracing` feature, intercepted faults are reported as `WARN` events. The crate
//! never installs a subscriber.

#![warn(
    clippy::cargo,
    clippy::pedantic,
    clippy::missing_const_for_fn,
    clippy::arithmetic_side_effects,
    clippy::as_underscore,
    clippy::assertions_on_result_states,
    clippy::clone_on_ref_ptr,
    clippy::decimal_literal_representation,
    clippy::default_numeric_fallback,
    clippy::deref_by_slicing,
    clippy::else_if_without_else,
    clippy::empty_drop,
    clippy::empty_enum_variants_with_brackets,
    clippy::empty_structs_with_brackets,
    clippy::exhaustive_enums,
    clippy::format_push_string,
    clippy::infinite_loop,
    clippy::mem_forget, // use ManuallyDrop instead
    clippy::missing_assert_message,
    clippy::missing_inline_in_public_items,
    clippy::mixed_read_write_in_expression,
    clippy::multiple_unsafe_ops_per_block,
    clippy::pub_without_shorthand,
    clippy::redundant_type_annotations,
    clippy::rest_pat_in_fully_bound_structs,
    clippy::same_name_method,
    clippy::semicolon_inside_block,
    clippy::separated_literal_suffix,
    clippy::shadow_unrelated,
    clippy::string_lit_chars_any,
    clippy::string_to_string,
    clippy::tests_outside_test_module,
    clippy::try_err,
    clippy::undocumented_unsafe_blocks,
    clippy::unnecessary_safety_comment,
    clippy::unnecessary_safety_doc,
    clippy::unnecessary_self_imports,
    clippy::unneeded_field_pattern,
    clippy::unused_result_ok,
    clippy::wildcard_enum_match_arm,
)]

mod api;
mod backend;
mod barrier;
mod capture;
mod error;
mod payload;

pub use api::{catch, catch_value, intercept, run_catching, InFlightFault};
pub use barrier::{Barrier, HookMode, BACKTRACE_VAR, DOMAIN_VAR, HOOK_VAR};
pub use error::{ErrorCode, TranslatedError, DEFAULT_DOMAIN};
