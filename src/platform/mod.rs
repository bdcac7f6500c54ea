// LogSift - platform/mod.rs
//
// Platform abstraction layer: config/data directories, config.toml, and the
// on-disk day-file store.
// Dependencies: directories, toml, serde_json; core and app for the types the
// store and config hand back.

pub mod config;
pub mod store;
