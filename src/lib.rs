// LogSift - lib.rs
//
// Library entry point. The `logsift` binary in `main.rs` is a thin CLI over
// this surface; embedders drive `app::session::LogSession` directly.

pub mod app;
pub mod core;
pub mod platform;
pub mod util;
