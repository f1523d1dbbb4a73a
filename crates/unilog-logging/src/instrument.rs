//! Timing combinators
//!
//! Each wrapper measures the wrapped operation and logs one
//! `Performance: <name>` record with `duration_ms` and `status`. Failures are
//! logged at Error with the error text and handed back unchanged; panics are
//! logged and resumed.

use std::fmt::Display;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe, Location};
use std::time::{Duration, Instant};

use futures::FutureExt;
use unilog_core_types::schema::{FIELD_ERROR, FIELD_STATUS, STATUS_ERROR, STATUS_SUCCESS};

use crate::extras::Extras;
use crate::level::Level;
use crate::logger::UnifiedLogger;
use crate::record::{CallSite, ErrorDetails};
use crate::redaction::panic_message;

fn report_success(logger: &UnifiedLogger, name: &str, elapsed: Duration, callsite: CallSite) {
    logger.performance_at(
        Level::Info,
        name,
        elapsed,
        Extras::new().with(FIELD_STATUS, STATUS_SUCCESS),
        callsite,
        None,
    );
}

fn report_failure(
    logger: &UnifiedLogger,
    name: &str,
    elapsed: Duration,
    error: String,
    details: ErrorDetails,
    callsite: CallSite,
) {
    logger.performance_at(
        Level::Error,
        name,
        elapsed,
        Extras::new()
            .with(FIELD_STATUS, STATUS_ERROR)
            .with(FIELD_ERROR, error),
        callsite,
        Some(details),
    );
}

fn run<T, E, F>(logger: &UnifiedLogger, name: &str, callsite: CallSite, f: F) -> Result<T, E>
where
    E: Display,
    F: FnOnce() -> Result<T, E>,
{
    let started = Instant::now();
    let outcome = panic::catch_unwind(AssertUnwindSafe(f));
    let elapsed = started.elapsed();

    match outcome {
        Ok(Ok(value)) => {
            report_success(logger, name, elapsed, callsite);
            Ok(value)
        }
        Ok(Err(err)) => {
            report_failure(
                logger,
                name,
                elapsed,
                err.to_string(),
                ErrorDetails::from_display(&err),
                callsite,
            );
            Err(err)
        }
        Err(payload) => {
            let message = panic_message(&*payload);
            let details = ErrorDetails::from_panic(&message, None, None);
            report_failure(logger, name, elapsed, message, details, callsite);
            panic::resume_unwind(payload)
        }
    }
}

/// Run `f`, log its duration and outcome, and return its result unchanged
///
/// # Errors
///
/// Returns whatever error `f` returns.
#[track_caller]
pub fn with_timing<T, E, F>(logger: &UnifiedLogger, name: &str, f: F) -> Result<T, E>
where
    E: Display,
    F: FnOnce() -> Result<T, E>,
{
    let callsite = CallSite::from_location(Location::caller());
    run(logger, name, callsite, f)
}

/// Async counterpart of [`with_timing`]
///
/// Adds no suspension point of its own: only `future` is awaited.
#[track_caller]
pub fn with_timing_async<'a, T, E, Fut>(
    logger: &'a UnifiedLogger,
    name: &'a str,
    future: Fut,
) -> impl Future<Output = Result<T, E>> + 'a
where
    T: 'a,
    E: Display + 'a,
    Fut: Future<Output = Result<T, E>> + 'a,
{
    let callsite = CallSite::from_location(Location::caller());
    async move {
        let started = Instant::now();
        let outcome = AssertUnwindSafe(future).catch_unwind().await;
        let elapsed = started.elapsed();

        match outcome {
            Ok(Ok(value)) => {
                report_success(logger, name, elapsed, callsite);
                Ok(value)
            }
            Ok(Err(err)) => {
                report_failure(
                    logger,
                    name,
                    elapsed,
                    err.to_string(),
                    ErrorDetails::from_display(&err),
                    callsite,
                );
                Err(err)
            }
            Err(payload) => {
                let message = panic_message(&*payload);
                let details = ErrorDetails::from_panic(&message, None, None);
                report_failure(logger, name, elapsed, message, details, callsite);
                panic::resume_unwind(payload)
            }
        }
    }
}

/// Wrap `f` so every call is timed under `name`
#[track_caller]
pub fn timed<A, T, E, F>(
    logger: UnifiedLogger,
    name: impl Into<String>,
    f: F,
) -> impl Fn(A) -> Result<T, E>
where
    E: Display,
    F: Fn(A) -> Result<T, E>,
{
    let name = name.into();
    let callsite = CallSite::from_location(Location::caller());
    move |arg| run(&logger, &name, callsite.clone(), || f(arg))
}
