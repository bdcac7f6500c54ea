// LogSift - app/mod.rs
//
// Application layer: the log session, its worker and debouncer, and the
// log-manager boundary.
// Dependencies: core layer.
// Must NOT depend on: platform specifics.

pub mod debounce;
pub mod dispatch;
pub mod log_manager;
pub mod session;
