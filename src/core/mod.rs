// LogSift - core/mod.rs
//
// Core business logic layer.
// Dependencies: chrono, serde, rayon.
// Must NOT depend on: platform, app, or any I/O.

pub mod criteria;
pub mod filter;
pub mod model;
