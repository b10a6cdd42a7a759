//! Internal test modules.

mod buffer_tests;
#[cfg(feature = "logger")]
mod logger_tests;
mod sink_tests;
mod target_tests;
