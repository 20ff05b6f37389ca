//! Logging macros for the key resolver and stores.
//!
//! Each macro takes a [`Logger`](crate::Logger) (or anything that derefs to
//! one, such as `Arc<Logger>`) followed by `format!` style arguments. The
//! message is tagged with the logger's component and CA instance. Arguments
//! are not formatted when the level is filtered out, so SKIs and subjects can
//! be hex-encoded inline.
//!
//! ```ignore
//! log_debug!(self.logger, "resolving private key for '{}'", cert.subject());
//! ```

#[doc(hidden)]
#[macro_export]
macro_rules! __abeca_log {
    ($level:ident, $method:ident, $logger:expr, $($arg:tt)+) => {{
        if ::log::log_enabled!(::log::Level::$level) {
            ($logger).$method(::std::format_args!($($arg)+));
        }
    }};
}

#[macro_export]
macro_rules! log_debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::__abeca_log!(Debug, debug_args, $logger, $($arg)+)
    };
}

#[macro_export]
macro_rules! log_info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::__abeca_log!(Info, info_args, $logger, $($arg)+)
    };
}

#[macro_export]
macro_rules! log_warn {
    ($logger:expr, $($arg:tt)+) => {
        $crate::__abeca_log!(Warn, warn_args, $logger, $($arg)+)
    };
}

#[macro_export]
macro_rules! log_error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::__abeca_log!(Error, error_args, $logger, $($arg)+)
    };
}
