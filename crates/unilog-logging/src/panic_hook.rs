//! Panic reporting through the pipeline

use std::backtrace::{Backtrace, BacktraceStatus};
use std::panic;

use crate::extras::Extras;
use crate::level::Level;
use crate::logger::UnifiedLogger;
use crate::record::{CallSite, ErrorDetails};
use crate::redaction::panic_message;

/// Log every panic as a Critical record, then run the previously installed hook
///
/// The backtrace is included when `RUST_BACKTRACE` enables capture.
pub fn install_panic_hook(logger: UnifiedLogger) {
    let previous = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        let message = panic_message(info.payload());
        let callsite = info
            .location()
            .map(CallSite::from_location)
            .unwrap_or_else(CallSite::unknown);
        let backtrace = Backtrace::capture();
        let backtrace = (backtrace.status() == BacktraceStatus::Captured).then(|| backtrace.to_string());
        let details = ErrorDetails::from_panic(
            &message,
            info.location().map(|l| l.to_string()),
            backtrace,
        );

        logger.log_at_with(
            Level::Critical,
            &format!("panic: {message}"),
            Extras::new().with("thread", std::thread::current().name().unwrap_or("<unnamed>")),
            callsite,
            Some(details),
        );
        previous(info);
    }));
}
