//! Logging macros
//!
//! Unlike the facade's `#[track_caller]` methods, the macros know the
//! enclosing module path and function name.

/// Name of the enclosing function
#[macro_export]
macro_rules! function_name {
    () => {{
        fn f() {}
        fn type_name_of<T>(_: T) -> &'static str {
            ::std::any::type_name::<T>()
        }
        let name = type_name_of(f);
        let name = name.strip_suffix("::f").unwrap_or(name);
        let name = name.trim_end_matches("::{{closure}}");
        match name.rfind("::") {
            Some(idx) => &name[idx + 2..],
            None => name,
        }
    }};
}

/// Call site of the macro invocation
#[macro_export]
macro_rules! callsite {
    () => {
        $crate::CallSite::new(
            ::std::module_path!(),
            ::std::option::Option::Some($crate::function_name!()),
            ::std::option::Option::Some(::std::line!()),
        )
    };
}

/// Build an [`Extras`](crate::Extras) map
///
/// ```
/// # use unilog_logging::extras;
/// let extras = extras!("room" => "r1", "members" => 3);
/// assert_eq!(extras.len(), 2);
/// ```
#[macro_export]
macro_rules! extras {
    () => {
        $crate::Extras::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut extras = $crate::Extras::new();
        $(extras.insert($key, $value);)+
        extras
    }};
}

#[doc(hidden)]
#[macro_export]
macro_rules! __log_at {
    ($level:expr, $logger:expr, $msg:expr) => {
        $logger.log_at($level, &$msg, $crate::Extras::new(), $crate::callsite!())
    };
    ($level:expr, $logger:expr, $msg:expr, $($key:expr => $value:expr),+ $(,)?) => {
        $logger.log_at($level, &$msg, $crate::extras!($($key => $value),+), $crate::callsite!())
    };
}

/// ```
/// # use unilog_logging::{log_debug, test_capture::TestCapture};
/// let capture = TestCapture::new();
/// let logger = capture.logger();
/// log_debug!(logger, "cache miss", "key" => "k1");
/// assert_eq!(capture.json_records()[0]["context"]["key"], "k1");
/// ```
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)+) => { $crate::__log_at!($crate::Level::Debug, $($arg)+) };
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)+) => { $crate::__log_at!($crate::Level::Info, $($arg)+) };
}

#[macro_export]
macro_rules! log_warning {
    ($($arg:tt)+) => { $crate::__log_at!($crate::Level::Warning, $($arg)+) };
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)+) => { $crate::__log_at!($crate::Level::Error, $($arg)+) };
}

#[macro_export]
macro_rules! log_critical {
    ($($arg:tt)+) => { $crate::__log_at!($crate::Level::Critical, $($arg)+) };
}

/// Log the start of an operation
///
/// ```
/// # use unilog_logging::{log_op_start, test_capture::TestCapture};
/// let capture = TestCapture::new();
/// let logger = capture.logger();
/// log_op_start!(logger, "join_room", "room" => "r1");
/// capture.assert_event_exists("join_room", "start");
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($logger:expr, $op:expr $(, $key:expr => $value:expr)* $(,)?) => {
        $logger.log_at(
            $crate::Level::Info,
            $op,
            $crate::extras!(
                $crate::schema::FIELD_OP => $op,
                $crate::schema::FIELD_EVENT => $crate::schema::EVENT_START
                $(, $key => $value)*
            ),
            $crate::callsite!(),
        )
    };
}

/// Log the successful end of an operation
#[macro_export]
macro_rules! log_op_end {
    ($logger:expr, $op:expr, duration_ms = $duration:expr $(, $key:expr => $value:expr)* $(,)?) => {
        $logger.log_at(
            $crate::Level::Info,
            $op,
            $crate::extras!(
                $crate::schema::FIELD_OP => $op,
                $crate::schema::FIELD_EVENT => $crate::schema::EVENT_END,
                $crate::schema::FIELD_DURATION_MS => $duration
                $(, $key => $value)*
            ),
            $crate::callsite!(),
        )
    };
}

/// Log a failed operation with its error attached
#[macro_export]
macro_rules! log_op_error {
    ($logger:expr, $op:expr, $err:expr, duration_ms = $duration:expr $(, $key:expr => $value:expr)* $(,)?) => {{
        let err = &$err;
        $logger.log_at_with(
            $crate::Level::Error,
            $op,
            $crate::extras!(
                $crate::schema::FIELD_OP => $op,
                $crate::schema::FIELD_EVENT => $crate::schema::EVENT_END_ERROR,
                $crate::schema::FIELD_DURATION_MS => $duration,
                $crate::schema::FIELD_ERROR => err.to_string()
                $(, $key => $value)*
            ),
            $crate::callsite!(),
            ::std::option::Option::Some($crate::ErrorDetails::from_display(err)),
        )
    }};
}
